//! The markup content model of a page.
//!
//! Page content is stored as a markup fragment string. This module parses
//! that string into a tree of [`Node`]s, renders the tree back to markup and
//! to plain text, and extracts the inline style hints the exporter needs.
//!
//! The parser never fails. Unknown constructs degrade to text, stray closing
//! tags are ignored and unclosed elements are closed at the end of the input.
//! Nesting deeper than [`MAX_DEPTH`] is flattened.

use std::fmt::Write as _;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "br", "img", "hr", "input", "meta", "link", "wbr", "col", "source", "area",
];

/// Elements that start a new line in the plain-text rendering.
const BLOCK_ELEMENTS: &[&str] = &[
    "div", "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "tr", "table", "hr",
    "blockquote", "pre",
];

/// Elements whose content is never rendered.
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Deepest element nesting kept in the tree. Tags opened below this depth are
/// dropped and their content joins the innermost kept element.
pub const MAX_DEPTH: usize = 64;

/// A node in a page's markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A run of text (entities already decoded).
    Text(String),
    /// An inline image.
    Image(Image),
    /// An explicit line break.
    LineBreak,
    /// A table of cells.
    Table(Table),
    /// Any other element, including the decorative rule markers.
    Element(Element),
}

/// A single `name="value"` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Lowercased attribute name.
    pub name: String,
    /// Decoded attribute value (empty for bare attributes).
    pub value: String,
}

/// An inline image, usually carrying its bytes as a data URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// The `src` attribute.
    pub src: String,
    /// Recorded width in pixels, from the `width` attribute or style.
    pub width: Option<u32>,
    /// Recorded height in pixels, from the `height` attribute or style.
    pub height: Option<u32>,
    /// All attributes, in source order.
    pub attrs: Vec<Attribute>,
}

/// A table element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Attributes of the `<table>` element.
    pub attrs: Vec<Attribute>,
    /// Rows in document order, flattened out of any row groups.
    pub rows: Vec<Row>,
}

/// A table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Attributes of the `<tr>` element.
    pub attrs: Vec<Attribute>,
    /// Cells of the row.
    pub cells: Vec<Cell>,
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Whether this is a header (`<th>`) cell.
    pub header: bool,
    /// Attributes of the cell element.
    pub attrs: Vec<Attribute>,
    /// Cell content.
    pub children: Vec<Node>,
}

/// A generic element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes, in source order.
    pub attrs: Vec<Attribute>,
    /// Style hints parsed from the `style` attribute.
    pub style: StyleHints,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// Formatting information declared inline on an element.
///
/// Only the declarations that affect export are kept. `None` means the
/// element does not declare the property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleHints {
    /// `font-weight: bold` or a numeric weight of 600 and above.
    pub bold: Option<bool>,
    /// `font-style: italic` (or `oblique`).
    pub italic: Option<bool>,
    /// `text-decoration` containing `underline`.
    pub underline: Option<bool>,
    /// Text colour as six upper-case hex digits without a leading `#`.
    pub color: Option<String>,
    /// Font size in half-points.
    pub size: Option<u32>,
    /// Declared width in pixels.
    pub width: Option<u32>,
    /// Declared height in pixels.
    pub height: Option<u32>,
}

impl StyleHints {
    /// Parse a CSS declaration list such as `font-weight: bold; color: red`.
    #[must_use]
    pub fn parse(declarations: &str) -> Self {
        let mut hints = Self::default();

        for declaration in declarations.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            let lower = value.to_ascii_lowercase();

            match property.as_str() {
                "font-weight" => {
                    let bold = match lower.as_str() {
                        "bold" | "bolder" => true,
                        other => other.parse::<u32>().is_ok_and(|weight| weight >= 600),
                    };
                    hints.bold = Some(bold);
                }
                "font-style" => {
                    hints.italic = Some(lower == "italic" || lower == "oblique");
                }
                "text-decoration" | "text-decoration-line" => {
                    hints.underline = Some(lower.contains("underline"));
                }
                "color" => hints.color = parse_color(&lower),
                "font-size" => hints.size = parse_font_size(&lower),
                "width" => hints.width = parse_pixels(&lower),
                "height" => hints.height = parse_pixels(&lower),
                _ => {}
            }
        }

        hints
    }
}

/// Parse a CSS colour into six upper-case hex digits.
///
/// Accepts `#rgb`, `#rrggbb` and `rgb(r, g, b)`; named colours are not
/// supported.
#[must_use]
pub fn parse_color(value: &str) -> Option<String> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        return match hex.len() {
            6 => Some(hex.to_ascii_uppercase()),
            3 => Some(
                hex.chars()
                    .flat_map(|c| [c, c])
                    .collect::<String>()
                    .to_ascii_uppercase(),
            ),
            _ => None,
        };
    }

    let inner = value
        .strip_prefix("rgb(")
        .or_else(|| value.strip_prefix("rgba("))?
        .strip_suffix(')')?;
    let channels: Vec<u8> = inner
        .split(',')
        .take(3)
        .map(|channel| channel.trim().parse::<u8>().ok())
        .collect::<Option<_>>()?;
    if channels.len() != 3 {
        return None;
    }
    Some(format!(
        "{:02X}{:02X}{:02X}",
        channels[0], channels[1], channels[2]
    ))
}

/// Parse a CSS font size into half-points. `pt` and `px` units are supported.
fn parse_font_size(value: &str) -> Option<u32> {
    if let Some(points) = value.strip_suffix("pt") {
        let points: f32 = points.trim().parse().ok()?;
        return Some((points * 2.0).round() as u32);
    }
    if let Some(pixels) = value.strip_suffix("px") {
        let pixels: f32 = pixels.trim().parse().ok()?;
        // 1px = 0.75pt = 1.5 half-points
        return Some((pixels * 1.5).round() as u32);
    }
    None
}

fn parse_pixels(value: &str) -> Option<u32> {
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f32>().ok().map(|px| px.round() as u32)
}

impl Element {
    /// The value of the named attribute, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        find_attr(&self.attrs, name)
    }

    /// Whether the element's `class` attribute lists `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Whether this is a block-level element.
    #[must_use]
    pub fn is_block(&self) -> bool {
        BLOCK_ELEMENTS.contains(&self.tag.as_str())
    }
}

fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|attr| attr.name == name)
        .map(|attr| attr.value.as_str())
}

impl Node {
    /// Render this node (and its descendants) as plain text.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        write_plain_text(std::slice::from_ref(self), &mut out);
        out
    }
}

/// Parse a markup fragment into a list of top-level nodes.
#[must_use]
pub fn parse(markup: &str) -> Vec<Node> {
    let raw = Tokenizer::new(markup).run();
    raw.into_iter().filter_map(lower).collect()
}

/// Render nodes back to a markup fragment.
#[must_use]
pub fn to_markup(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_markup(node, &mut out);
    }
    out
}

/// Render nodes as plain text, the way a browser's `innerText` would
/// approximately present them.
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    write_plain_text(nodes, &mut out);
    out
}

fn write_plain_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::LineBreak => out.push('\n'),
            Node::Image(_) => {}
            Node::Table(table) => {
                for row in &table.rows {
                    for (i, cell) in row.cells.iter().enumerate() {
                        if i > 0 {
                            out.push('\t');
                        }
                        write_plain_text(&cell.children, out);
                    }
                    out.push('\n');
                }
            }
            Node::Element(element) => {
                write_plain_text(&element.children, out);
                if element.is_block() && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
        }
    }
}

fn write_attrs(attrs: &[Attribute], out: &mut String) {
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        if !attr.value.is_empty() {
            out.push_str("=\"");
            escape_into(&attr.value, true, out);
            out.push('"');
        }
    }
}

fn write_markup(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => escape_into(text, false, out),
        Node::LineBreak => out.push_str("<br>"),
        Node::Image(image) => {
            out.push_str("<img");
            write_attrs(&image.attrs, out);
            out.push('>');
        }
        Node::Table(table) => {
            out.push_str("<table");
            write_attrs(&table.attrs, out);
            out.push_str("><tbody>");
            for row in &table.rows {
                out.push_str("<tr");
                write_attrs(&row.attrs, out);
                out.push('>');
                for cell in &row.cells {
                    let tag = if cell.header { "th" } else { "td" };
                    let _ = write!(out, "<{tag}");
                    write_attrs(&cell.attrs, out);
                    out.push('>');
                    for child in &cell.children {
                        write_markup(child, out);
                    }
                    let _ = write!(out, "</{tag}>");
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody></table>");
        }
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            write_attrs(&element.attrs, out);
            out.push('>');
            if VOID_ELEMENTS.contains(&element.tag.as_str()) {
                return;
            }
            for child in &element.children {
                write_markup(child, out);
            }
            let _ = write!(out, "</{}>", element.tag);
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            c => out.push(c),
        }
    }
}

/// Decode the character references in `text`.
#[must_use]
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_entity(&rest[1..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "nbsp" => '\u{a0}',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "rsquo" => '’',
        "lsquo" => '‘',
        "ldquo" => '“',
        "rdquo" => '”',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        _ => return None,
    };
    Some(c)
}

/// Intermediate tree produced by the tokenizer, before elements with special
/// meaning are lowered to their own [`Node`] variants.
#[derive(Debug)]
enum RawNode {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<Attribute>,
        children: Vec<RawNode>,
    },
}

struct OpenElement {
    tag: String,
    attrs: Vec<Attribute>,
    children: Vec<RawNode>,
}

struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
    root: Vec<RawNode>,
    stack: Vec<OpenElement>,
    /// Tags opened past [`MAX_DEPTH`], awaiting their closing tags.
    flattened: Vec<String>,
}

impl<'a> Tokenizer<'a> {
    const fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            root: Vec::new(),
            stack: Vec::new(),
            flattened: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<RawNode> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            let Some(lt) = rest.find('<') else {
                self.push_text(rest);
                self.pos = self.src.len();
                break;
            };
            if lt > 0 {
                self.push_text(&rest[..lt]);
                self.pos += lt;
                continue;
            }
            self.markup_declaration();
        }

        while let Some(open) = self.stack.pop() {
            self.close(open);
        }
        self.root
    }

    fn current_children(&mut self) -> &mut Vec<RawNode> {
        match self.stack.last_mut() {
            Some(open) => &mut open.children,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let text = decode_entities(raw);
        let children = self.current_children();
        if let Some(RawNode::Text(previous)) = children.last_mut() {
            previous.push_str(&text);
        } else {
            children.push(RawNode::Text(text));
        }
    }

    fn close(&mut self, open: OpenElement) {
        let element = RawNode::Element {
            tag: open.tag,
            attrs: open.attrs,
            children: open.children,
        };
        self.current_children().push(element);
    }

    /// Handle the construct starting at a `<`.
    fn markup_declaration(&mut self) {
        let rest = &self.src[self.pos..];

        if rest.starts_with("<!--") {
            self.pos += rest.find("-->").map_or(rest.len(), |end| end + 3);
            return;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            self.pos += rest.find('>').map_or(rest.len(), |end| end + 1);
            return;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let end = after.find('>').unwrap_or(after.len());
            let name = after[..end].trim().to_ascii_lowercase();
            self.pos += 2 + (end + 1).min(after.len());
            self.close_tag(&name);
            return;
        }
        if rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            self.open_tag();
            return;
        }

        self.push_text("<");
        self.pos += 1;
    }

    fn close_tag(&mut self, name: &str) {
        if self.flattened.last().is_some_and(|tag| tag == name) {
            self.flattened.pop();
            return;
        }
        let Some(index) = self.stack.iter().rposition(|open| open.tag == name) else {
            tracing::trace!("ignoring stray closing tag </{name}>");
            return;
        };
        self.flattened.clear();
        while self.stack.len() > index {
            if let Some(open) = self.stack.pop() {
                self.close(open);
            }
        }
    }

    fn open_tag(&mut self) {
        let bytes = self.src.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() && !is_tag_delimiter(bytes[i]) {
            i += 1;
        }
        let tag = self.src[self.pos + 1..i].to_ascii_lowercase();

        let mut attrs = Vec::new();
        let mut self_closing = false;
        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }
            match bytes[i] {
                b'>' => {
                    i += 1;
                    break;
                }
                b'/' => {
                    i += 1;
                    if bytes.get(i) == Some(&b'>') {
                        self_closing = true;
                        i += 1;
                        break;
                    }
                }
                _ => {
                    let (attr, next) = self.attribute(i);
                    attrs.push(attr);
                    i = next;
                }
            }
        }
        self.pos = i;

        if VOID_ELEMENTS.contains(&tag.as_str()) || self_closing {
            self.current_children().push(RawNode::Element {
                tag,
                attrs,
                children: Vec::new(),
            });
        } else if self.stack.len() >= MAX_DEPTH {
            tracing::trace!("flattening <{tag}> nested past depth {MAX_DEPTH}");
            self.flattened.push(tag);
        } else {
            self.stack.push(OpenElement {
                tag,
                attrs,
                children: Vec::new(),
            });
        }
    }

    /// Parse one attribute starting at byte `start`, returning it and the
    /// index just past it.
    fn attribute(&self, start: usize) -> (Attribute, usize) {
        let bytes = self.src.as_bytes();
        let mut i = start;
        while i < bytes.len() && !is_tag_delimiter(bytes[i]) && bytes[i] != b'=' {
            i += 1;
        }
        // always consume at least one byte so malformed input makes progress
        if i == start {
            i += 1;
        }
        let name = self.src[start..i].to_ascii_lowercase();

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            return (
                Attribute {
                    name,
                    value: String::new(),
                },
                i,
            );
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let (raw, next) = match bytes.get(j) {
            Some(&quote @ (b'"' | b'\'')) => {
                let body = &self.src[j + 1..];
                let end = body.find(quote as char).unwrap_or(body.len());
                (&body[..end], (j + 1 + end + 1).min(self.src.len()))
            }
            _ => {
                let mut k = j;
                while k < bytes.len() && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                    k += 1;
                }
                (&self.src[j..k], k)
            }
        };

        (
            Attribute {
                name,
                value: decode_entities(raw),
            },
            next,
        )
    }
}

const fn is_tag_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'>' || byte == b'/'
}

/// Convert a raw node into its typed representation.
fn lower(raw: RawNode) -> Option<Node> {
    let (tag, attrs, children) = match raw {
        RawNode::Text(text) => return Some(Node::Text(text)),
        RawNode::Element {
            tag,
            attrs,
            children,
        } => (tag, attrs, children),
    };

    if DROPPED_ELEMENTS.contains(&tag.as_str()) {
        return None;
    }

    let style = find_attr(&attrs, "style")
        .map(StyleHints::parse)
        .unwrap_or_default();

    let node = match tag.as_str() {
        "br" => Node::LineBreak,
        "img" => {
            let src = find_attr(&attrs, "src").unwrap_or_default().to_string();
            let width = find_attr(&attrs, "width")
                .and_then(parse_pixels)
                .or(style.width);
            let height = find_attr(&attrs, "height")
                .and_then(parse_pixels)
                .or(style.height);
            Node::Image(Image {
                src,
                width,
                height,
                attrs,
            })
        }
        "table" => {
            let mut rows = Vec::new();
            collect_rows(children, &mut rows);
            Node::Table(Table { attrs, rows })
        }
        _ => Node::Element(Element {
            tag,
            attrs,
            style,
            children: children.into_iter().filter_map(lower).collect(),
        }),
    };
    Some(node)
}

/// Gather the rows of a table, looking through row groups.
fn collect_rows(children: Vec<RawNode>, rows: &mut Vec<Row>) {
    for child in children {
        let RawNode::Element {
            tag,
            attrs,
            children,
        } = child
        else {
            continue;
        };
        match tag.as_str() {
            "tr" => rows.push(Row {
                attrs,
                cells: children.into_iter().filter_map(lower_cell).collect(),
            }),
            "thead" | "tbody" | "tfoot" => collect_rows(children, rows),
            _ => {}
        }
    }
}

fn lower_cell(raw: RawNode) -> Option<Cell> {
    let RawNode::Element {
        tag,
        attrs,
        children,
    } = raw
    else {
        return None;
    };
    let header = match tag.as_str() {
        "td" => false,
        "th" => true,
        _ => return None,
    };
    Some(Cell {
        header,
        attrs,
        children: children.into_iter().filter_map(lower).collect(),
    })
}

/// Collect every text node, in document order.
pub(crate) fn text_nodes<'a>(nodes: &'a [Node], out: &mut Vec<&'a str>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(text),
            Node::Element(element) => text_nodes(&element.children, out),
            Node::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    text_nodes(&cell.children, out);
                }
            }
            Node::Image(_) | Node::LineBreak => {}
        }
    }
}

/// Collect mutable references to every text node, in document order.
pub(crate) fn text_nodes_mut<'a>(nodes: &'a mut [Node], out: &mut Vec<&'a mut String>) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push(text),
            Node::Element(element) => text_nodes_mut(&mut element.children, out),
            Node::Table(table) => {
                for row in &mut table.rows {
                    for cell in &mut row.cells {
                        text_nodes_mut(&mut cell.children, out);
                    }
                }
            }
            Node::Image(_) | Node::LineBreak => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn element(node: &Node) -> &Element {
        match node {
            Node::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    #[test]
    fn parses_nested_elements() {
        let nodes = parse("<div><b>A<i>B</i></b>C</div>");
        assert_eq!(nodes.len(), 1);

        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.children.len(), 2);
        assert_eq!(element(&div.children[0]).tag, "b");
        assert_eq!(div.children[1], Node::Text("C".to_string()));
    }

    #[test]
    fn empty_input_has_no_nodes() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn unclosed_elements_close_at_end() {
        let nodes = parse("<div><b>bold");
        let div = element(&nodes[0]);
        let b = element(&div.children[0]);
        assert_eq!(b.children, vec![Node::Text("bold".to_string())]);
    }

    #[test]
    fn stray_closing_tag_is_ignored() {
        let nodes = parse("a</span>b");
        assert_eq!(nodes, vec![Node::Text("ab".to_string())]);
    }

    #[test]
    fn mismatched_closing_tag_closes_inner_elements() {
        let nodes = parse("<div><b>x</div>y");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], Node::Text("y".to_string()));
    }

    fn depth(nodes: &[Node]) -> usize {
        let mut deepest = 0;
        let mut pending: Vec<(&Node, usize)> = nodes.iter().map(|node| (node, 1)).collect();
        while let Some((node, level)) = pending.pop() {
            deepest = deepest.max(level);
            if let Node::Element(element) = node {
                pending.extend(element.children.iter().map(|child| (child, level + 1)));
            }
        }
        deepest
    }

    #[test]
    fn deep_nesting_is_flattened() {
        let markup = "<b>".repeat(10_000) + "x" + &"</b>".repeat(10_000) + "y";
        let nodes = parse(&markup);

        assert_eq!(depth(&nodes), MAX_DEPTH + 1);
        assert_eq!(plain_text(&nodes), "xy");
        assert_eq!(nodes.last(), Some(&Node::Text("y".to_string())));
    }

    #[test]
    fn closing_an_outer_element_discards_flattened_tags() {
        let markup = "<div>".to_string() + &"<i>".repeat(MAX_DEPTH) + "x</div></i>y";
        let nodes = parse(&markup);

        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[0]).tag, "div");
        assert_eq!(nodes[1], Node::Text("y".to_string()));
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            parse("a<!-- hidden -->b"),
            vec![Node::Text("ab".to_string())]
        );
    }

    #[test_case("&amp;", "&"; "ampersand")]
    #[test_case("&lt;b&gt;", "<b>"; "angle brackets")]
    #[test_case("&nbsp;", "\u{a0}"; "non-breaking space")]
    #[test_case("&#65;&#x42;", "AB"; "numeric references")]
    #[test_case("AT&T", "AT&T"; "bare ampersand")]
    #[test_case("&bogus;", "&bogus;"; "unknown entity")]
    fn decodes_entities(input: &str, expected: &str) {
        assert_eq!(decode_entities(input), expected);
    }

    #[test]
    fn parses_attributes() {
        let nodes = parse(r#"<span class="a b" data-x=1 hidden style='color: #f00'>x</span>"#);
        let span = element(&nodes[0]);
        assert!(span.has_class("b"));
        assert_eq!(span.attr("data-x"), Some("1"));
        assert_eq!(span.attr("hidden"), Some(""));
        assert_eq!(span.style.color.as_deref(), Some("FF0000"));
    }

    #[test]
    fn lowers_images_with_dimensions() {
        let nodes = parse(r#"<img src="data:image/png;base64,AAAA" width="120" style="height: 80px">"#);
        let Node::Image(image) = &nodes[0] else {
            panic!("expected image");
        };
        assert_eq!(image.src, "data:image/png;base64,AAAA");
        assert_eq!(image.width, Some(120));
        assert_eq!(image.height, Some(80));
    }

    #[test]
    fn lowers_tables_through_row_groups() {
        let nodes = parse("<table><tbody><tr><td>a</td><th>b</th></tr></tbody></table>");
        let Node::Table(table) = &nodes[0] else {
            panic!("expected table");
        };
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].cells.len(), 2);
        assert!(table.rows[0].cells[1].header);
    }

    #[test]
    fn line_breaks_are_void() {
        let nodes = parse("a<br>b<br/>c");
        assert_eq!(
            nodes,
            vec![
                Node::Text("a".to_string()),
                Node::LineBreak,
                Node::Text("b".to_string()),
                Node::LineBreak,
                Node::Text("c".to_string()),
            ]
        );
    }

    #[test]
    fn scripts_are_dropped() {
        assert_eq!(
            parse("a<script>alert(1)</script>b"),
            vec![Node::Text("a".to_string()), Node::Text("b".to_string())]
        );
    }

    #[test]
    fn markup_round_trips_through_the_tree() {
        let source = r#"<div style="font-weight: bold">Q. one &amp; two</div><hr class="horizontal-line"><p>x<br>y&nbsp;</p>"#;
        assert_eq!(to_markup(&parse(source)), source);
    }

    #[test]
    fn plain_text_separates_blocks() {
        let nodes = parse("<div>Hello world</div><div>Second line</div>tail");
        assert_eq!(plain_text(&nodes), "Hello world\nSecond line\ntail");
    }

    #[test]
    fn style_hints_parse_weights_and_sizes() {
        let hints = StyleHints::parse(
            "font-weight: 700; font-style: italic; text-decoration: underline; font-size: 18pt",
        );
        assert_eq!(hints.bold, Some(true));
        assert_eq!(hints.italic, Some(true));
        assert_eq!(hints.underline, Some(true));
        assert_eq!(hints.size, Some(36));
    }

    #[test_case("#16a34a", Some("16A34A"); "six digit hex")]
    #[test_case("#abc", Some("AABBCC"); "three digit hex")]
    #[test_case("rgb(255, 0, 16)", Some("FF0010"); "rgb function")]
    #[test_case("red", None; "named colour")]
    #[test_case("#12345", None; "bad length")]
    fn parses_colors(input: &str, expected: Option<&str>) {
        assert_eq!(parse_color(input).as_deref(), expected);
    }
}
