//! Page layout of an exported assignment.
//!
//! An export has two sections: a cover page carrying the university heading
//! and a table of submission details, and the body, one page per content page
//! under a repeating header and a page-numbered footer. Both sections share a
//! double page border in the assignment's accent colour.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    document::{
        Alignment, Block, Border, BorderStyle, Document, Field, PageBorder, PageSetup, Paragraph,
        Run, RunStyle, Section, Table, TableCell, TableRow, TextRun,
    },
    transform,
};
use crate::domain::{Assignment, Config, markup};

/// Page margin on every side, in twips.
const PAGE_MARGIN: u32 = 700;

const PAGE_BORDER_SIZE: u32 = 24;
const PAGE_BORDER_SPACE: u32 = 15;

const COVER_BORDER_COLOR: &str = "D97706";
const COVER_LABEL_FILL: &str = "BFDBFE";
const COVER_VALUE_FILL: &str = "DBEAFE";
const COVER_LABEL_WIDTH: u32 = 30;
const COVER_VALUE_WIDTH: u32 = 70;

const EMBLEM: &str = "●";
const EMBLEM_COLOR: &str = "4ADE80";
const HEADING_UNDERLINE_COLOR: &str = "16A34A";

/// The label used for extra cover rows that have none.
const EXTRA_ROW_LABEL: &str = "Extra";

/// Suffix of every exported file name.
const FILE_SUFFIX: &str = "_Assignment.docx";

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// The suggested file name for an export of the assignment titled `name`.
#[must_use]
pub fn file_name(name: &str) -> String {
    format!("{}{FILE_SUFFIX}", WHITESPACE.replace_all(name, "_"))
}

/// Lay out `assignment` as a document.
///
/// Cover fields left empty fall back to the defaults in `config`.
#[must_use]
pub fn layout(assignment: &Assignment, config: &Config) -> Document {
    let border_color = assignment
        .cover()
        .border_color
        .as_deref()
        .and_then(markup::parse_color)
        .unwrap_or_else(|| config.border_hex());
    let page = PageSetup {
        margin: PAGE_MARGIN,
        border: Some(PageBorder {
            line: Border {
                style: BorderStyle::Double,
                size: PAGE_BORDER_SIZE,
                color: border_color,
            },
            space: PAGE_BORDER_SPACE,
        }),
    };

    Document {
        sections: vec![
            cover_section(assignment, config, page.clone()),
            body_section(assignment, page),
        ],
    }
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn cover_section(assignment: &Assignment, config: &Config, page: PageSetup) -> Section {
    let cover = assignment.cover();
    let university = or_default(&cover.university_name, &config.university_name);

    let blocks = vec![
        Paragraph::empty().spaced_after(2000).into(),
        Paragraph::new(vec![TextRun::new(EMBLEM).size(200).color(EMBLEM_COLOR).into()])
            .aligned(Alignment::Center)
            .spaced_after(400)
            .into(),
        Paragraph::new(vec![
            TextRun::new(university)
                .bold()
                .size(48)
                .underlined(HEADING_UNDERLINE_COLOR)
                .into(),
        ])
        .aligned(Alignment::Center)
        .spaced_after(200)
        .into(),
        Paragraph::empty().spaced_after(1200).into(),
        Block::Table(cover_table(assignment, config)),
    ];

    Section {
        page,
        header: None,
        footer: None,
        blocks,
    }
}

/// The table of submission details on the cover page.
#[must_use]
pub fn cover_table(assignment: &Assignment, config: &Config) -> Table {
    let cover = assignment.cover();
    let course = format!("{} ({})", cover.course_name, cover.course_code);

    let mut rows = vec![
        cover_row("Submitted By:", &cover.student_name),
        cover_row("Student I.D:", &cover.student_id),
        cover_row("Course:", &course),
        cover_row("Submitted To:", &cover.teacher_name),
        cover_row(
            "Date:",
            or_default(&cover.submission_date, &config.default_date),
        ),
    ];
    rows.extend(
        assignment
            .cover_rows()
            .iter()
            .map(|row| cover_row(or_default(&row.label, EXTRA_ROW_LABEL), &row.value)),
    );

    Table { rows }
}

fn cover_row(label: &str, value: &str) -> TableRow {
    let border = Border {
        style: BorderStyle::Single,
        size: 4,
        color: COVER_BORDER_COLOR.to_string(),
    };
    let cell = |text: TextRun, width_percent, fill: &str| TableCell {
        paragraphs: vec![Paragraph::new(vec![text.into()]).aligned(Alignment::Center)],
        width_percent,
        fill: Some(fill.to_string()),
        border: Some(border.clone()),
        vertical_center: true,
    };

    TableRow {
        cells: vec![
            cell(
                TextRun::new(label).bold(),
                COVER_LABEL_WIDTH,
                COVER_LABEL_FILL,
            ),
            cell(
                TextRun::new(or_default(value, " ")),
                COVER_VALUE_WIDTH,
                COVER_VALUE_FILL,
            ),
        ],
    }
}

fn body_section(assignment: &Assignment, page: PageSetup) -> Section {
    let header = Paragraph::new(vec![
        TextRun::new(format!("Assignment: {}", assignment.cover().number))
            .bold()
            .size(28)
            .into(),
    ])
    .aligned(Alignment::Center);

    let footer_style = RunStyle {
        size: 20,
        ..RunStyle::default()
    };
    let footer = Paragraph::new(vec![
        TextRun::new("Page ").size(20).into(),
        Run::Field(Field::Page, footer_style.clone()),
        TextRun::new(" of ").size(20).into(),
        Run::Field(Field::NumPages, footer_style),
    ])
    .aligned(Alignment::Center);

    Section {
        page,
        header: Some(header),
        footer: Some(footer),
        blocks: body_blocks(assignment),
    }
}

/// The body content: every page's paragraphs, each page after the first
/// starting on a new page.
#[must_use]
pub fn body_blocks(assignment: &Assignment) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for (index, page) in assignment.pages().enumerate() {
        if index > 0 {
            blocks.push(
                Paragraph::new(vec![Run::Break])
                    .with_page_break_before()
                    .into(),
            );
        }
        blocks.extend(transform::page_paragraphs(page).into_iter().map(Block::from));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{AssignmentDraft, Cover, CoverRow};

    fn assignment() -> Assignment {
        Assignment::new(
            AssignmentDraft {
                cover: Cover {
                    number: "02".to_string(),
                    name: "Heat Engines".to_string(),
                    course_name: "Thermodynamics".to_string(),
                    course_code: "ME-210".to_string(),
                    student_name: "Nimra".to_string(),
                    student_id: "F21-0042".to_string(),
                    teacher_name: "Dr. Khan".to_string(),
                    ..Cover::default()
                },
                max_file_size_mb: 5,
            },
            0,
        )
    }

    fn cell_text(row: &TableRow, cell: usize) -> String {
        row.cells[cell].paragraphs[0]
            .text_runs()
            .map(|run| run.text.as_str())
            .collect()
    }

    #[test_case("Heat Engines", "Heat_Engines_Assignment.docx"; "single spaces")]
    #[test_case("Lab  Report\t3", "Lab_Report_3_Assignment.docx"; "whitespace runs")]
    #[test_case("Essay", "Essay_Assignment.docx"; "no whitespace")]
    fn names_exported_file(name: &str, expected: &str) {
        assert_eq!(file_name(name), expected);
    }

    #[test]
    fn cover_rows_follow_fixed_order() {
        let mut assignment = assignment();
        assignment.add_cover_row(CoverRow::new("", "B"));
        assignment.add_cover_row(CoverRow::new("Group", ""));

        let table = cover_table(&assignment, &Config::default());
        let rows: Vec<_> = table
            .rows
            .iter()
            .map(|row| (cell_text(row, 0), cell_text(row, 1)))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("Submitted By:".to_string(), "Nimra".to_string()),
                ("Student I.D:".to_string(), "F21-0042".to_string()),
                ("Course:".to_string(), "Thermodynamics (ME-210)".to_string()),
                ("Submitted To:".to_string(), "Dr. Khan".to_string()),
                ("Date:".to_string(), "Spring 2025".to_string()),
                ("Extra".to_string(), "B".to_string()),
                ("Group".to_string(), " ".to_string()),
            ]
        );
    }

    #[test]
    fn cover_cells_are_styled() {
        let table = cover_table(&assignment(), &Config::default());
        let [label, value] = &table.rows[0].cells[..] else {
            panic!("expected two cells");
        };

        assert_eq!(label.width_percent, 30);
        assert_eq!(label.fill.as_deref(), Some("BFDBFE"));
        assert!(label.paragraphs[0].text_runs().all(|run| run.style.bold));
        assert_eq!(value.width_percent, 70);
        assert_eq!(value.fill.as_deref(), Some("DBEAFE"));
        assert_eq!(value.border.as_ref().unwrap().color, "D97706");
        assert!(value.vertical_center);
    }

    #[test]
    fn border_colour_falls_back_to_config() {
        let mut assignment = assignment();
        let document = layout(&assignment, &Config::default());
        let border = document.sections[0].page.border.as_ref().unwrap();
        assert_eq!(border.line.color, "16A34A");
        assert_eq!(border.line.style, BorderStyle::Double);

        assignment.cover_mut().border_color = Some("#2563EB".to_string());
        let document = layout(&assignment, &Config::default());
        for section in &document.sections {
            assert_eq!(section.page.border.as_ref().unwrap().line.color, "2563EB");
        }
    }

    #[test_case("red"; "named colour")]
    #[test_case("#12345"; "five digits")]
    #[test_case("#GGGGGG"; "not hex")]
    fn unreadable_border_colour_falls_back_to_config(color: &str) {
        let mut assignment = assignment();
        assignment.cover_mut().border_color = Some(color.to_string());
        let mut config = Config::default();
        config.border_color = "#2563eb".to_string();

        let document = layout(&assignment, &config);
        for section in &document.sections {
            assert_eq!(section.page.border.as_ref().unwrap().line.color, "2563EB");
        }
    }

    #[test]
    fn university_heading_falls_back_to_config() {
        let document = layout(&assignment(), &Config::default());
        let Block::Paragraph(heading) = &document.sections[0].blocks[2] else {
            panic!("expected the heading paragraph");
        };
        let run = heading.text_runs().next().unwrap();
        assert_eq!(run.text, "RAYNEX UNIVERSITY");
        assert!(run.style.bold);
        assert_eq!(run.style.size, 48);
    }

    #[test]
    fn empty_page_exports_one_body_paragraph() {
        let document = layout(&assignment(), &Config::default());
        let body = &document.sections[1];
        assert_eq!(body.blocks, vec![Block::Paragraph(Paragraph::empty())]);
    }

    #[test]
    fn later_pages_start_with_a_page_break() {
        let mut assignment = assignment();
        assignment.set_page(0, "<p>one</p>".to_string()).unwrap();
        let second = assignment.add_page();
        assignment.set_page(second, "<p>two</p>".to_string()).unwrap();

        let blocks = body_blocks(&assignment);
        assert_eq!(blocks.len(), 3);
        let Block::Paragraph(separator) = &blocks[1] else {
            panic!("expected a separator paragraph");
        };
        assert!(separator.page_break_before);
        assert_eq!(separator.runs, vec![Run::Break]);
    }

    #[test]
    fn body_has_numbered_header_and_footer() {
        let document = layout(&assignment(), &Config::default());
        let body = &document.sections[1];

        let header = body.header.as_ref().unwrap();
        assert_eq!(header.text_runs().next().unwrap().text, "Assignment: 02");

        let footer = body.footer.as_ref().unwrap();
        let fields: Vec<_> = footer
            .runs
            .iter()
            .filter_map(|run| match run {
                Run::Field(field, _) => Some(*field),
                _ => None,
            })
            .collect();
        assert_eq!(fields, vec![Field::Page, Field::NumPages]);
    }
}
