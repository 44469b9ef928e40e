//! A word-processor document model.
//!
//! Just enough of the structure of a paginated document to express an
//! exported assignment: sections with page setup and repeating header/footer,
//! paragraphs of styled runs, and simple bordered tables. The model knows
//! nothing about any file format; see [`super::docx`] for serialization.

/// The typeface used for every run.
pub const FONT: &str = "Inter";

/// Default run size in half-points (12 pt).
pub const DEFAULT_SIZE: u32 = 24;

/// Default run colour.
pub const DEFAULT_COLOR: &str = "000000";

/// A complete document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Sections, each starting on a new page.
    pub sections: Vec<Section>,
}

impl Document {
    /// Every image run in the document, in order of appearance.
    pub fn images(&self) -> impl Iterator<Item = &ImageRun> {
        self.sections
            .iter()
            .flat_map(|section| &section.blocks)
            .flat_map(Block::paragraphs)
            .flat_map(|paragraph| &paragraph.runs)
            .filter_map(|run| match run {
                Run::Image(image) => Some(image),
                _ => None,
            })
    }
}

/// A run of pages sharing a page setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Margins and border.
    pub page: PageSetup,
    /// Repeated at the top of every page of the section.
    pub header: Option<Paragraph>,
    /// Repeated at the bottom of every page of the section.
    pub footer: Option<Paragraph>,
    /// Body content.
    pub blocks: Vec<Block>,
}

/// Page geometry and decoration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSetup {
    /// Margin on every side, in twips.
    pub margin: u32,
    /// Border drawn around every page.
    pub border: Option<PageBorder>,
}

/// A page border.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageBorder {
    /// The line.
    pub line: Border,
    /// Distance from the text, in points.
    pub space: u32,
}

/// A border line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Border {
    /// Line style.
    pub style: BorderStyle,
    /// Width in eighths of a point.
    pub size: u32,
    /// Colour as six hex digits.
    pub color: String,
}

/// The line style of a border.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderStyle {
    /// A single line.
    Single,
    /// Two parallel lines.
    Double,
}

/// Horizontal alignment of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Centred.
    Center,
    /// Justified on both sides.
    Justified,
}

/// A block-level item in a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// A paragraph.
    Paragraph(Paragraph),
    /// A table.
    Table(Table),
}

impl Block {
    /// All paragraphs in this block, including those inside table cells.
    pub fn paragraphs(&self) -> Box<dyn Iterator<Item = &Paragraph> + '_> {
        match self {
            Self::Paragraph(paragraph) => Box::new(std::iter::once(paragraph)),
            Self::Table(table) => Box::new(
                table
                    .rows
                    .iter()
                    .flat_map(|row| &row.cells)
                    .flat_map(|cell| &cell.paragraphs),
            ),
        }
    }
}

impl From<Paragraph> for Block {
    fn from(paragraph: Paragraph) -> Self {
        Self::Paragraph(paragraph)
    }
}

impl From<Table> for Block {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

/// A paragraph of runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Content.
    pub runs: Vec<Run>,
    /// Horizontal alignment; `None` inherits the default.
    pub alignment: Option<Alignment>,
    /// Space after the paragraph, in twips.
    pub spacing_after: Option<u32>,
    /// Whether the paragraph always starts a new page.
    pub page_break_before: bool,
}

impl Paragraph {
    /// A paragraph with the given runs.
    #[must_use]
    pub const fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            alignment: None,
            spacing_after: None,
            page_break_before: false,
        }
    }

    /// An empty paragraph.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Set the alignment.
    #[must_use]
    pub const fn aligned(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Set the space after the paragraph.
    #[must_use]
    pub const fn spaced_after(mut self, twips: u32) -> Self {
        self.spacing_after = Some(twips);
        self
    }

    /// Force the paragraph onto a new page.
    #[must_use]
    pub const fn with_page_break_before(mut self) -> Self {
        self.page_break_before = true;
        self
    }

    /// The text runs of the paragraph.
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.runs.iter().filter_map(|run| match run {
            Run::Text(text) => Some(text),
            _ => None,
        })
    }
}

/// An inline item in a paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    /// Styled text.
    Text(TextRun),
    /// A line break.
    Break,
    /// An embedded picture.
    Image(ImageRun),
    /// A field the word processor fills in.
    Field(Field, RunStyle),
}

impl From<TextRun> for Run {
    fn from(run: TextRun) -> Self {
        Self::Text(run)
    }
}

/// Character formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStyle {
    /// Bold.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Single underline, optionally in its own colour.
    pub underline: Option<Underline>,
    /// Colour as six hex digits.
    pub color: String,
    /// Size in half-points.
    pub size: u32,
}

impl Default for RunStyle {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            underline: None,
            color: DEFAULT_COLOR.to_string(),
            size: DEFAULT_SIZE,
        }
    }
}

/// A single underline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Underline {
    /// Colour of the line; `None` follows the text colour.
    pub color: Option<String>,
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// The text.
    pub text: String,
    /// Formatting.
    pub style: RunStyle,
}

impl TextRun {
    /// Plain text in the default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    /// Make the run bold.
    #[must_use]
    pub const fn bold(mut self) -> Self {
        self.style.bold = true;
        self
    }

    /// Set the size in half-points.
    #[must_use]
    pub const fn size(mut self, half_points: u32) -> Self {
        self.style.size = half_points;
        self
    }

    /// Set the colour.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.style.color = color.into();
        self
    }

    /// Underline the run in the given colour.
    #[must_use]
    pub fn underlined(mut self, color: impl Into<String>) -> Self {
        self.style.underline = Some(Underline {
            color: Some(color.into()),
        });
        self
    }
}

/// A word-processor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The current page number.
    Page,
    /// The total number of pages.
    NumPages,
}

/// The encoding of an embedded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// PNG.
    Png,
    /// JPEG.
    Jpeg,
    /// GIF.
    Gif,
    /// Windows bitmap.
    Bmp,
}

impl ImageFormat {
    /// The format named by a data-URI media type such as `image/png`.
    #[must_use]
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        match media_type.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// The file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// The MIME content type.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// An embedded picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRun {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Encoding of `data`.
    pub format: ImageFormat,
    /// Display width in pixels.
    pub width: u32,
    /// Display height in pixels.
    pub height: u32,
}

/// A table spanning the full text width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Rows.
    pub rows: Vec<TableRow>,
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Cells.
    pub cells: Vec<TableCell>,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Content.
    pub paragraphs: Vec<Paragraph>,
    /// Share of the table width, in percent.
    pub width_percent: u32,
    /// Background colour as six hex digits.
    pub fill: Option<String>,
    /// Border on all four sides.
    pub border: Option<Border>,
    /// Whether content is centred vertically.
    pub vertical_center: bool,
}
