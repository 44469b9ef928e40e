//! Translation of page markup into document paragraphs.
//!
//! The markup tree is walked depth-first. Each element derives a new
//! [`StyleContext`] from the one it was handed and passes copies down to its
//! children, so formatting never leaks from a child back to its siblings or
//! its parent.

use base64ct::{Base64, Encoding};

use super::document::{
    Alignment, ImageFormat, ImageRun, Paragraph, Run, RunStyle, TextRun, Underline,
};
use crate::domain::markup::{self, Element, Image, Node};

/// Space after each body paragraph, in twips.
const PARAGRAPH_SPACING: u32 = 200;

/// Run size for question blocks, in half-points (14 pt).
const QUESTION_SIZE: u32 = 28;

/// Image size when the markup does not record one, in pixels.
const DEFAULT_IMAGE_WIDTH: u32 = 400;
const DEFAULT_IMAGE_HEIGHT: u32 = 300;

/// Images are never exported larger than this in either dimension.
const MAX_IMAGE_DIMENSION: u32 = 600;

const QUESTION_MARKER: &str = "Q.";
const ANSWER_MARKER: &str = "Ans:";

/// The formatting in effect at a point of the markup tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleContext {
    /// Bold is active.
    pub bold: bool,
    /// Italic is active.
    pub italic: bool,
    /// Underline is active.
    pub underline: bool,
    /// Text colour override.
    pub color: Option<String>,
    /// Size override in half-points.
    pub size: Option<u32>,
}

impl StyleContext {
    /// The context for the children of `element`.
    ///
    /// Formatting turned on by a tag or an inline declaration stays on for the
    /// whole subtree. Blocks whose text starts with a question marker are
    /// forced bold at question size; answer blocks are forced bold.
    #[must_use]
    pub fn descend(mut self, element: &Element) -> Self {
        let style = &element.style;

        if matches!(element.tag.as_str(), "b" | "strong") || style.bold == Some(true) {
            self.bold = true;
        }
        if matches!(element.tag.as_str(), "i" | "em") || style.italic == Some(true) {
            self.italic = true;
        }
        if element.tag == "u" || style.underline == Some(true) {
            self.underline = true;
        }

        let font_color = (element.tag == "font")
            .then(|| element.attr("color").and_then(markup::parse_color))
            .flatten();
        if let Some(color) = style.color.clone().or(font_color) {
            self.color = Some(color);
        }
        if let Some(size) = style.size {
            self.size = Some(size);
        }

        let text = element_text(element);
        let text = text.trim();
        if text.starts_with(QUESTION_MARKER) {
            self.bold = true;
            self.size = Some(QUESTION_SIZE);
        }
        if text.starts_with(ANSWER_MARKER) {
            self.bold = true;
        }

        self
    }

    fn run_style(&self) -> RunStyle {
        let defaults = RunStyle::default();
        RunStyle {
            bold: self.bold,
            italic: self.italic,
            underline: self.underline.then(Underline::default),
            color: self.color.clone().unwrap_or(defaults.color),
            size: self.size.unwrap_or(defaults.size),
        }
    }
}

fn element_text(element: &Element) -> String {
    markup::plain_text(&element.children)
}

/// Convert one page of markup into body paragraphs.
///
/// Every top-level node becomes its own justified paragraph; whitespace-only
/// text between blocks is dropped, as are nodes that produce no runs. The
/// result always holds at least one paragraph.
#[must_use]
pub fn page_paragraphs(page: &str) -> Vec<Paragraph> {
    let mut paragraphs: Vec<Paragraph> = markup::parse(page)
        .iter()
        .filter(|node| !matches!(node, Node::Text(text) if text.trim().is_empty()))
        .map(|node| runs(node, StyleContext::default()))
        .filter(|runs| !runs.is_empty())
        .map(|runs| {
            Paragraph::new(runs)
                .aligned(Alignment::Justified)
                .spaced_after(PARAGRAPH_SPACING)
        })
        .collect();

    if paragraphs.is_empty() {
        paragraphs.push(Paragraph::empty());
    }
    paragraphs
}

/// The runs produced by `node` under `context`.
#[must_use]
pub fn runs(node: &Node, context: StyleContext) -> Vec<Run> {
    let mut out = Vec::new();
    walk(node, context, &mut out);
    out
}

fn walk(node: &Node, context: StyleContext, out: &mut Vec<Run>) {
    match node {
        Node::Text(text) => {
            if !text.trim().is_empty() || text == " " {
                out.push(Run::Text(TextRun {
                    text: text.clone(),
                    style: context.run_style(),
                }));
            }
        }
        Node::LineBreak => out.push(Run::Break),
        Node::Image(image) => {
            if let Some(run) = image_run(image) {
                out.push(Run::Image(run));
            }
        }
        Node::Table(_) => tracing::debug!("skipping table in page content"),
        Node::Element(element) => {
            let context = context.descend(element);
            for child in &element.children {
                walk(child, context.clone(), out);
            }
        }
    }
}

/// Decode an inline image.
///
/// Only base64 data URIs with a recognised media type are embedded. Anything
/// else, including an empty payload, yields `None`.
#[must_use]
pub fn image_run(image: &Image) -> Option<ImageRun> {
    let Some(uri) = image.src.strip_prefix("data:") else {
        tracing::debug!("skipping image without a data URI");
        return None;
    };
    if !uri.starts_with("image") {
        tracing::debug!("skipping data URI that is not an image");
        return None;
    }
    let (header, payload) = uri.split_once(',')?;

    let media_type = header.split(';').next().unwrap_or_default();
    let Some(format) = ImageFormat::from_media_type(media_type) else {
        tracing::debug!("skipping image of unsupported type '{media_type}'");
        return None;
    };

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = match Base64::decode_vec(&payload) {
        Ok(data) if !data.is_empty() => data,
        Ok(_) => return None,
        Err(e) => {
            tracing::debug!("skipping undecodable image: {e}");
            return None;
        }
    };

    Some(ImageRun {
        data,
        format,
        width: dimension(image.width, DEFAULT_IMAGE_WIDTH),
        height: dimension(image.height, DEFAULT_IMAGE_HEIGHT),
    })
}

fn dimension(recorded: Option<u32>, default: u32) -> u32 {
    recorded
        .filter(|px| *px > 0)
        .unwrap_or(default)
        .min(MAX_IMAGE_DIMENSION)
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    /// A 1x1 transparent PNG.
    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn text_runs(paragraph: &Paragraph) -> Vec<(&str, &RunStyle)> {
        paragraph
            .text_runs()
            .map(|run| (run.text.as_str(), &run.style))
            .collect()
    }

    fn image_runs(paragraphs: &[Paragraph]) -> Vec<&ImageRun> {
        paragraphs
            .iter()
            .flat_map(|p| &p.runs)
            .filter_map(|run| match run {
                Run::Image(image) => Some(image),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn style_does_not_leak_to_siblings() {
        let paragraphs = page_paragraphs("<div><b>A<i>B</i></b>C</div>");
        assert_eq!(paragraphs.len(), 1);

        let runs = text_runs(&paragraphs[0]);
        assert_eq!(runs.len(), 3);

        let (a, a_style) = runs[0];
        assert_eq!(a, "A");
        assert!(a_style.bold && !a_style.italic);

        let (b, b_style) = runs[1];
        assert_eq!(b, "B");
        assert!(b_style.bold && b_style.italic);

        let (c, c_style) = runs[2];
        assert_eq!(c, "C");
        assert!(!c_style.bold && !c_style.italic);
    }

    #[test_case(""; "empty string")]
    #[test_case("   \n "; "whitespace only")]
    #[test_case("<div></div>"; "empty block")]
    #[test_case("<table><tr><td>x</td></tr></table>"; "only a table")]
    fn empty_page_yields_one_paragraph(page: &str) {
        let paragraphs = page_paragraphs(page);
        assert_eq!(paragraphs, vec![Paragraph::empty()]);
    }

    #[test]
    fn deeply_nested_markup_exports() {
        let paragraphs = page_paragraphs(&("<b>".repeat(10_000) + "x"));
        assert_eq!(paragraphs.len(), 1);

        let runs = text_runs(&paragraphs[0]);
        assert_eq!(runs.len(), 1);
        let (text, style) = runs[0];
        assert_eq!(text, "x");
        assert!(style.bold);
    }

    #[test]
    fn question_blocks_are_bold_and_enlarged() {
        let paragraphs = page_paragraphs("<div>Q. What is entropy?</div>");
        let (_, style) = text_runs(&paragraphs[0])[0];
        assert!(style.bold);
        assert_eq!(style.size, QUESTION_SIZE);
    }

    #[test]
    fn question_heuristic_ignores_leading_whitespace() {
        let paragraphs = page_paragraphs("<p>  <span>Q. 2</span></p>");
        let runs = text_runs(&paragraphs[0]);
        assert!(runs.iter().all(|(_, style)| style.bold));
    }

    #[test]
    fn answer_blocks_are_bold_at_normal_size() {
        let paragraphs = page_paragraphs("<div>Ans: it rises</div>");
        let (_, style) = text_runs(&paragraphs[0])[0];
        assert!(style.bold);
        assert_eq!(style.size, RunStyle::default().size);
    }

    #[test]
    fn ordinary_blocks_are_plain() {
        let paragraphs = page_paragraphs("<div>Quite ordinary.</div>");
        let (_, style) = text_runs(&paragraphs[0])[0];
        assert_eq!(style, &RunStyle::default());
    }

    #[test]
    fn inline_declarations_activate_formatting() {
        let page = r#"<div><span style="font-weight: 700; font-style: italic; text-decoration: underline; color: #1d4ed8; font-size: 16pt">styled</span></div>"#;
        let paragraphs = page_paragraphs(page);
        let (_, style) = text_runs(&paragraphs[0])[0];

        assert!(style.bold && style.italic);
        assert_eq!(style.underline, Some(Underline::default()));
        assert_eq!(style.color, "1D4ED8");
        assert_eq!(style.size, 32);
    }

    #[test]
    fn font_element_colour_is_applied() {
        let paragraphs = page_paragraphs(r##"<p><font color="#f00">red</font> text</p>"##);
        let runs = text_runs(&paragraphs[0]);
        assert_eq!(runs[0].1.color, "FF0000");
        assert_eq!(runs[1].1.color, "000000");
    }

    #[test]
    fn each_top_level_node_is_a_justified_paragraph() {
        let paragraphs = page_paragraphs("<div>one</div>\n<p>two</p>stray<b>bold</b>");
        assert_eq!(paragraphs.len(), 4);
        assert!(paragraphs.iter().all(|p| {
            p.alignment == Some(Alignment::Justified) && p.spacing_after == Some(PARAGRAPH_SPACING)
        }));
    }

    #[test]
    fn whitespace_runs_are_kept_only_as_single_spaces() {
        let paragraphs = page_paragraphs("<p><b>a</b> <i>b</i><u>c</u>\n  <b>d</b></p>");
        let texts: Vec<_> = text_runs(&paragraphs[0]).iter().map(|(t, _)| *t).collect();
        assert_eq!(texts, vec!["a", " ", "b", "c", "d"]);
    }

    #[test]
    fn line_breaks_become_break_runs() {
        let paragraphs = page_paragraphs("<div>one<br>two</div>");
        assert!(matches!(paragraphs[0].runs[1], Run::Break));
    }

    #[test]
    fn non_data_uri_image_is_skipped() {
        let paragraphs = page_paragraphs(r#"<p><img src="https://example.com/a.png">caption</p>"#);
        assert!(image_runs(&paragraphs).is_empty());
        assert_eq!(text_runs(&paragraphs[0])[0].0, "caption");
    }

    #[test_case("data:image/png;base64,"; "empty payload")]
    #[test_case("data:image/png;base64,!!!"; "invalid base64")]
    #[test_case("data:image/png;base64"; "missing comma")]
    #[test_case("data:text/plain;base64,aGk="; "not an image")]
    #[test_case("data:image/svg+xml;base64,aGk="; "unsupported type")]
    fn malformed_images_are_skipped(src: &str) {
        let page = format!(r#"<p><img src="{src}"></p>"#);
        assert!(image_runs(&page_paragraphs(&page)).is_empty());
    }

    #[test]
    fn data_uri_image_is_embedded_with_defaults() {
        let page = format!(r#"<p><img src="data:image/png;base64,{PIXEL}"></p>"#);
        let paragraphs = page_paragraphs(&page);
        let images = image_runs(&paragraphs);

        assert_eq!(images.len(), 1);
        assert_eq!(images[0].format, ImageFormat::Png);
        assert_eq!(&images[0].data[1..4], b"PNG");
        assert_eq!((images[0].width, images[0].height), (400, 300));
    }

    #[test]
    fn image_size_is_clamped() {
        let page = format!(
            r#"<p><img src="data:image/png;base64,{PIXEL}" width="1200" style="height: 250px"></p>"#
        );
        let paragraphs = page_paragraphs(&page);
        let image = image_runs(&paragraphs)[0];
        assert_eq!((image.width, image.height), (600, 250));
    }
}
