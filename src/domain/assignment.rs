use nonempty::NonEmpty;
use uuid::Uuid;

/// Writable page height in pixels that vertical rule sizes are scaled to.
const PAGE_CONTENT_HEIGHT_PX: u32 = 1000;

/// Approximate exported size of a single page, in kilobytes.
const KB_PER_PAGE: u32 = 150;

/// An assignment: cover page metadata plus an ordered sequence of content
/// pages.
///
/// The page sequence is never empty. A freshly created assignment has exactly
/// one empty page, and the last remaining page cannot be removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub(crate) id: String,
    pub(crate) cover: Cover,
    pub(crate) max_file_size_mb: u32,
    pub(crate) pages_needed: u32,
    pub(crate) pages: NonEmpty<String>,
    pub(crate) created_at: i64,
    pub(crate) updated_at: i64,
}

/// The fields rendered on the cover page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cover {
    /// Assignment number, e.g. `01`.
    pub number: String,
    /// Assignment title.
    pub name: String,
    /// Course name.
    pub course_name: String,
    /// Course code.
    pub course_code: String,
    /// Student name ("Submitted By").
    pub student_name: String,
    /// Student identifier.
    pub student_id: String,
    /// Semester. Stored but not rendered.
    pub semester: String,
    /// Teacher name ("Submitted To").
    pub teacher_name: String,
    /// Submission date, free text.
    pub submission_date: String,
    /// University name shown as the cover heading.
    pub university_name: String,
    /// Accent colour of the page border, `#RRGGBB`.
    pub border_color: Option<String>,
    /// Additional label/value rows appended to the cover table.
    pub rows: Option<Vec<CoverRow>>,
}

/// An extra label/value row on the cover table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverRow {
    /// Row label.
    pub label: String,
    /// Row value.
    pub value: String,
}

impl CoverRow {
    /// Create a new cover row.
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// The user-supplied fields for a new assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentDraft {
    /// Cover fields.
    pub cover: Cover,
    /// Export size ceiling in megabytes.
    pub max_file_size_mb: u32,
}

/// Which side of the vertical bar a block of answer lines sits on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Side {
    /// Lines to the left of the bar.
    Left,
    /// Lines to the right of the bar.
    #[default]
    Right,
}

/// Errors from page and cover-row operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PageError {
    /// The index does not refer to an existing page.
    #[error("page {index} does not exist (assignment has {count} pages)")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The number of pages.
        count: usize,
    },
    /// The last remaining page cannot be removed.
    #[error("cannot remove the last page of an assignment")]
    LastPage,
    /// The index does not refer to an existing cover row.
    #[error("cover row {0} does not exist")]
    NoSuchCoverRow(usize),
}

/// Estimate how many pages fit within a size ceiling.
///
/// This is advisory only.
#[must_use]
pub const fn estimate_pages(max_file_size_mb: u32) -> u32 {
    max_file_size_mb.saturating_mul(1024) / KB_PER_PAGE
}

impl Assignment {
    /// Create a new assignment with a single empty page.
    ///
    /// `now` is the wall-clock time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn new(draft: AssignmentDraft, now: i64) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), draft, now)
    }

    pub(crate) fn with_id(id: String, draft: AssignmentDraft, now: i64) -> Self {
        Self {
            id,
            cover: draft.cover,
            max_file_size_mb: draft.max_file_size_mb,
            pages_needed: estimate_pages(draft.max_file_size_mb),
            pages: NonEmpty::new(String::new()),
            created_at: now,
            updated_at: now,
        }
    }

    /// The unique identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The cover fields.
    #[must_use]
    pub const fn cover(&self) -> &Cover {
        &self.cover
    }

    /// Mutable access to the cover fields.
    pub const fn cover_mut(&mut self) -> &mut Cover {
        &mut self.cover
    }

    /// The assignment title.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.cover.name
    }

    /// Creation time, in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Last update time, in milliseconds since the Unix epoch.
    #[must_use]
    pub const fn updated_at(&self) -> i64 {
        self.updated_at
    }

    /// Record a modification at `now`.
    pub const fn touch(&mut self, now: i64) {
        self.updated_at = now;
    }

    /// The export size ceiling, in megabytes.
    #[must_use]
    pub const fn max_file_size_mb(&self) -> u32 {
        self.max_file_size_mb
    }

    /// The advisory page estimate derived from the size ceiling.
    #[must_use]
    pub const fn pages_needed(&self) -> u32 {
        self.pages_needed
    }

    /// Change the size ceiling, recomputing the page estimate.
    pub const fn set_max_file_size(&mut self, max_file_size_mb: u32) {
        self.max_file_size_mb = max_file_size_mb;
        self.pages_needed = estimate_pages(max_file_size_mb);
    }

    /// The content pages, in order.
    pub fn pages(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(String::as_str)
    }

    /// The number of content pages. Always at least one.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// The markup of page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn page(&self, index: usize) -> Result<&str, PageError> {
        self.pages
            .get(index)
            .map(String::as_str)
            .ok_or(PageError::OutOfRange {
                index,
                count: self.pages.len(),
            })
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut String, PageError> {
        let count = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(PageError::OutOfRange { index, count })
    }

    /// Replace the markup of page `index` wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn set_page(&mut self, index: usize, markup: String) -> Result<(), PageError> {
        *self.page_mut(index)? = markup;
        Ok(())
    }

    /// Append an empty page, returning its index.
    pub fn add_page(&mut self) -> usize {
        self.pages.push(String::new());
        self.pages.len() - 1
    }

    /// Remove page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page, or
    /// [`PageError::LastPage`] if it is the only page.
    pub fn remove_page(&mut self, index: usize) -> Result<String, PageError> {
        let count = self.pages.len();
        if index >= count {
            return Err(PageError::OutOfRange { index, count });
        }

        let mut pages: Vec<String> = self.pages.clone().into();
        let removed = pages.remove(index);
        self.pages = NonEmpty::from_vec(pages).ok_or(PageError::LastPage)?;
        Ok(removed)
    }

    fn append_to_page(&mut self, index: usize, markup: &str) -> Result<(), PageError> {
        self.page_mut(index)?.push_str(markup);
        Ok(())
    }

    fn last_page_mut(&mut self) -> &mut String {
        self.pages.last_mut()
    }

    /// Append a question heading block to the last page.
    pub fn append_question(&mut self) {
        self.last_page_mut().push_str(
            r#"<div style="font-weight: bold; font-size: 18pt; margin-top: 10px; margin-bottom: 5px;">Q. [Type Here]</div>"#,
        );
    }

    /// Append an answer block to the last page.
    pub fn append_answer(&mut self) {
        self.last_page_mut()
            .push_str(r#"<div style="margin-bottom: 10px;"><strong>Ans:</strong> </div>"#);
    }

    /// Append an empty bordered table to page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn insert_table(&mut self, index: usize, rows: usize, cols: usize) -> Result<(), PageError> {
        let cell = r#"<td style="border: 1px solid #000; padding: 4px; min-width: 50px;">&nbsp;</td>"#;
        let row = format!("<tr>{}</tr>", cell.repeat(cols));
        let table = format!(
            r#"<table style="width: 100%; border-collapse: collapse; margin-bottom: 1em; border: 1px solid #000;"><tbody>{}</tbody></table><p>&nbsp;</p>"#,
            row.repeat(rows)
        );
        self.append_to_page(index, &table)
    }

    /// Append a horizontal rule marker to page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn insert_horizontal_rule(&mut self, index: usize) -> Result<(), PageError> {
        self.append_to_page(
            index,
            r#"<hr class="horizontal-line" style="border-top: 2px solid black; margin: 10px 0;">"#,
        )
    }

    /// Append a vertical rule marker to page `index`.
    ///
    /// `size` is in twelfths of the page height and is clamped to `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn insert_vertical_rule(&mut self, index: usize, size: u32) -> Result<(), PageError> {
        let height = rule_height(size);
        let markup = format!(
            r#"<span class="vertical-line" style="display: inline-block; border-left: 2px solid black; height: {height}px; margin: 0 10px; vertical-align: middle;">&nbsp;</span>"#
        );
        self.append_to_page(index, &markup)
    }

    /// Append `count` numbered answer lines beside a vertical bar.
    ///
    /// `size` is the block height in twelfths of the page, clamped to
    /// `1..=12`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn insert_answer_lines(
        &mut self,
        index: usize,
        size: u32,
        count: usize,
        side: Side,
    ) -> Result<(), PageError> {
        let height = rule_height(size);
        let lines: String = (1..=count)
            .map(|n| format!("<div>{n}. ________________________</div>"))
            .collect();
        let lines = format!(
            r#"<div style="display: flex; flex-direction: column; justify-content: space-around; width: 100%; height: 100%; padding: 0 10px;">{lines}</div>"#
        );
        let bar = r#"<div style="width: 2px; background-color: black; height: 100%;"></div>"#;
        let (first, second) = match side {
            Side::Left => (lines.as_str(), bar),
            Side::Right => (bar, lines.as_str()),
        };
        let markup = format!(
            r#"<div style="display: flex; height: {height}px; align-items: stretch; margin: 10px 0;">{first}{second}</div><p>&nbsp;</p>"#
        );
        self.append_to_page(index, &markup)
    }

    /// Append an inline image to page `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::OutOfRange`] if there is no such page.
    pub fn insert_image(&mut self, index: usize, data_uri: &str) -> Result<(), PageError> {
        let markup = format!(
            r#"<img src="{}" style="max-width: 100%; display: block; margin: 0 auto;">"#,
            data_uri.replace('"', "&quot;")
        );
        self.append_to_page(index, &markup)
    }

    /// The extra cover rows (empty if none were ever added).
    #[must_use]
    pub fn cover_rows(&self) -> &[CoverRow] {
        self.cover.rows.as_deref().unwrap_or_default()
    }

    /// Append an extra cover row.
    pub fn add_cover_row(&mut self, row: CoverRow) {
        self.cover.rows.get_or_insert_with(Vec::new).push(row);
    }

    /// Replace cover row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NoSuchCoverRow`] if there is no such row.
    pub fn update_cover_row(&mut self, index: usize, row: CoverRow) -> Result<(), PageError> {
        let slot = self
            .cover
            .rows
            .as_mut()
            .and_then(|rows| rows.get_mut(index))
            .ok_or(PageError::NoSuchCoverRow(index))?;
        *slot = row;
        Ok(())
    }

    /// Remove cover row `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PageError::NoSuchCoverRow`] if there is no such row.
    pub fn remove_cover_row(&mut self, index: usize) -> Result<CoverRow, PageError> {
        match self.cover.rows.as_mut() {
            Some(rows) if index < rows.len() => Ok(rows.remove(index)),
            _ => Err(PageError::NoSuchCoverRow(index)),
        }
    }
}

fn rule_height(size: u32) -> u32 {
    size.clamp(1, 12) * PAGE_CONTENT_HEIGHT_PX / 12
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn assignment() -> Assignment {
        let draft = AssignmentDraft {
            cover: Cover {
                number: "01".to_string(),
                name: "Data Structures".to_string(),
                ..Cover::default()
            },
            max_file_size_mb: 5,
        };
        Assignment::new(draft, 1_000)
    }

    #[test]
    fn new_assignment_has_one_empty_page() {
        let assignment = assignment();
        assert_eq!(assignment.page_count(), 1);
        assert_eq!(assignment.page(0).unwrap(), "");
        assert_eq!(assignment.created_at(), assignment.updated_at());
    }

    #[test]
    fn new_assignments_have_distinct_ids() {
        assert_ne!(assignment().id(), assignment().id());
    }

    #[test]
    fn cannot_remove_the_last_page() {
        let mut assignment = assignment();
        assert_eq!(assignment.remove_page(0), Err(PageError::LastPage));
        assert_eq!(assignment.page_count(), 1);
    }

    #[test]
    fn page_count_never_drops_below_one() {
        let mut assignment = assignment();
        assignment.add_page();
        assignment.add_page();
        assert_eq!(assignment.page_count(), 3);

        for _ in 0..5 {
            let _ = assignment.remove_page(0);
            assert!(assignment.page_count() >= 1);
        }
        assert_eq!(assignment.page_count(), 1);
    }

    #[test]
    fn remove_page_returns_removed_markup() {
        let mut assignment = assignment();
        let index = assignment.add_page();
        assignment.set_page(index, "second".to_string()).unwrap();

        assert_eq!(assignment.remove_page(index).unwrap(), "second");
        assert_eq!(assignment.page_count(), 1);
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let mut assignment = assignment();
        assert_eq!(
            assignment.set_page(3, String::new()),
            Err(PageError::OutOfRange { index: 3, count: 1 })
        );
        assert!(assignment.remove_page(1).is_err());
    }

    #[test]
    fn question_and_answer_go_to_the_last_page() {
        let mut assignment = assignment();
        assignment.add_page();
        assignment.append_question();
        assignment.append_answer();

        assert_eq!(assignment.page(0).unwrap(), "");
        let last = assignment.page(1).unwrap();
        assert!(last.contains("Q. [Type Here]"));
        assert!(last.ends_with("<strong>Ans:</strong> </div>"));
    }

    #[test]
    fn table_has_requested_shape() {
        let mut assignment = assignment();
        assignment.insert_table(0, 2, 3).unwrap();

        let page = assignment.page(0).unwrap();
        assert_eq!(page.matches("<tr>").count(), 2);
        assert_eq!(page.matches("<td").count(), 6);
    }

    #[test_case(0, 83; "clamped up to one twelfth")]
    #[test_case(6, 500; "half page")]
    #[test_case(12, 1000; "full page")]
    #[test_case(40, 1000; "clamped down to full page")]
    fn vertical_rule_height_scales_with_size(size: u32, expected: u32) {
        let mut assignment = assignment();
        assignment.insert_vertical_rule(0, size).unwrap();
        assert!(
            assignment
                .page(0)
                .unwrap()
                .contains(&format!("height: {expected}px"))
        );
    }

    #[test]
    fn answer_lines_put_bar_on_requested_side() {
        let mut left = assignment();
        left.insert_answer_lines(0, 6, 3, Side::Left).unwrap();
        let page = left.page(0).unwrap();
        assert!(page.contains("3. ____"));
        assert!(page.find("1. ____").unwrap() < page.find("width: 2px").unwrap());

        let mut right = assignment();
        right.insert_answer_lines(0, 6, 3, Side::Right).unwrap();
        let page = right.page(0).unwrap();
        assert!(page.find("1. ____").unwrap() > page.find("width: 2px").unwrap());
    }

    #[test]
    fn cover_rows_can_be_edited() {
        let mut assignment = assignment();
        assert!(assignment.cover_rows().is_empty());

        assignment.add_cover_row(CoverRow::new("Section", "B"));
        assignment.add_cover_row(CoverRow::new("Group", "4"));
        assignment
            .update_cover_row(0, CoverRow::new("Section", "C"))
            .unwrap();
        assert_eq!(assignment.remove_cover_row(1).unwrap().label, "Group");

        assert_eq!(assignment.cover_rows(), &[CoverRow::new("Section", "C")]);
        assert_eq!(
            assignment.remove_cover_row(5),
            Err(PageError::NoSuchCoverRow(5))
        );
    }

    #[test_case(5, 34; "default ceiling")]
    #[test_case(0, 0; "no ceiling")]
    #[test_case(1, 6; "one megabyte")]
    fn page_estimate_follows_size_ceiling(mb: u32, expected: u32) {
        assert_eq!(estimate_pages(mb), expected);
    }

    #[test]
    fn changing_size_ceiling_updates_estimate() {
        let mut assignment = assignment();
        assert_eq!(assignment.pages_needed(), 34);
        assignment.set_max_file_size(10);
        assert_eq!(assignment.pages_needed(), 68);
    }
}
