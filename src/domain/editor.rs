//! The editable surface of a single content page.
//!
//! [`PageEditor`] owns the autocomplete popup state and talks to the actual
//! editing surface only through the [`EditorSurface`] capability, so it can be
//! driven by a browser binding, a terminal UI, or the in-memory
//! [`MarkupSurface`] used by the CLI and the tests.

use std::time::{Duration, Instant};

use super::{
    autocomplete::{self, AutocompleteIndex, VOCABULARY},
    markup::{self, Node},
};

/// How long a dismissed-on-blur popup lingers, so that a pointer selection
/// made as focus leaves still registers.
pub const BLUR_GRACE: Duration = Duration::from_millis(200);

/// Identifies a text node within a surface, by document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextNodeId(pub usize);

/// The text node holding the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaretContext {
    /// The text node.
    pub node: TextNodeId,
    /// The full content of the text node.
    pub text: String,
    /// Byte offset of the caret within `text`.
    pub offset: usize,
}

/// A span within a single text node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRange {
    /// The text node.
    pub node: TextNodeId,
    /// Byte offset of the start of the span.
    pub start: usize,
    /// Byte offset just past the end of the span.
    pub end: usize,
}

/// Visual coordinates on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Horizontal offset.
    pub left: f32,
    /// Vertical offset.
    pub top: f32,
}

/// The capabilities the page editor needs from an editing surface.
pub trait EditorSurface {
    /// The surface's current markup.
    fn markup(&self) -> String;

    /// Replace the surface's content with `markup`.
    fn set_markup(&mut self, markup: &str);

    /// The text node holding the caret, or `None` if the caret sits at an
    /// element boundary.
    fn caret_context(&self) -> Option<CaretContext>;

    /// Replace `range` with `text` and collapse the caret to just after the
    /// inserted text.
    fn replace_range(&mut self, range: &TextRange, text: &str);

    /// The surface's plain-text rendering.
    fn plain_text(&self) -> String;

    /// Where the caret is drawn, if it is visible.
    fn caret_position(&self) -> Option<Position>;
}

/// Keys the editor reacts to while the suggestion popup is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Highlight the previous suggestion.
    Up,
    /// Highlight the next suggestion.
    Down,
    /// Commit the highlighted suggestion.
    Enter,
    /// Commit the highlighted suggestion.
    Tab,
    /// Close the popup.
    Escape,
}

/// What the editor did with a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The key was not consumed; the surface should handle it normally.
    Ignored,
    /// The key changed the popup state only.
    Handled,
    /// A suggestion was committed; the page's new markup is attached.
    Committed(String),
}

/// The open suggestion popup.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Suggestions, in display order.
    pub suggestions: Vec<String>,
    /// Index of the highlighted suggestion.
    pub selected: usize,
    /// Where the popup is anchored.
    pub position: Position,
    /// The token span a committed suggestion replaces.
    pub range: TextRange,
}

/// Editor state for one content page.
#[derive(Debug)]
pub struct PageEditor<S> {
    surface: S,
    vocabulary: Vec<String>,
    popup: Option<Popup>,
    dismiss_at: Option<Instant>,
}

impl<S: EditorSurface> PageEditor<S> {
    /// Create an editor over `surface` using the default vocabulary.
    pub fn new(surface: S) -> Self {
        Self::with_vocabulary(surface, VOCABULARY.iter().map(ToString::to_string).collect())
    }

    /// Create an editor over `surface` with a custom vocabulary.
    pub const fn with_vocabulary(surface: S, vocabulary: Vec<String>) -> Self {
        Self {
            surface,
            vocabulary,
            popup: None,
            dismiss_at: None,
        }
    }

    /// The underlying surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the underlying surface.
    pub const fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// The open popup, if any.
    pub const fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    /// The current suggestions (empty when the popup is closed).
    pub fn suggestions(&self) -> &[String] {
        self.popup
            .as_ref()
            .map(|popup| popup.suggestions.as_slice())
            .unwrap_or_default()
    }

    /// Bring the surface in line with the stored page markup.
    ///
    /// The surface is only rewritten when the stored markup differs from
    /// what it already shows, so that a no-op update does not disturb an edit
    /// in progress. Returns whether the surface was rewritten.
    pub fn render(&mut self, stored: &str) -> bool {
        if self.surface.markup() == stored {
            return false;
        }
        self.surface.set_markup(stored);
        self.popup = None;
        true
    }

    /// Handle a local edit.
    ///
    /// Returns the full updated markup, which the caller stores as the page's
    /// new content, and recomputes the suggestions.
    pub fn on_input(&mut self) -> String {
        self.dismiss_at = None;
        self.refresh_suggestions();
        self.surface.markup()
    }

    fn refresh_suggestions(&mut self) {
        self.popup = self.compute_popup();
    }

    fn compute_popup(&self) -> Option<Popup> {
        let caret = self.surface.caret_context()?;
        let start = autocomplete::token_start(&caret.text, caret.offset);
        let token = &caret.text[start..caret.offset];
        if token.chars().count() < autocomplete::MIN_TOKEN_LEN {
            return None;
        }

        let suggestions = AutocompleteIndex::build(&self.vocabulary, &self.surface.plain_text(), token)
            .suggest(token);
        if suggestions.is_empty() {
            return None;
        }

        let position = self.surface.caret_position()?;
        Some(Popup {
            suggestions,
            selected: 0,
            position,
            range: TextRange {
                node: caret.node,
                start,
                end: caret.offset,
            },
        })
    }

    /// Handle a key press.
    pub fn on_key(&mut self, key: Key) -> KeyOutcome {
        let Some(popup) = self.popup.as_mut() else {
            return KeyOutcome::Ignored;
        };
        let count = popup.suggestions.len();

        match key {
            Key::Down => {
                popup.selected = (popup.selected + 1) % count;
                KeyOutcome::Handled
            }
            Key::Up => {
                popup.selected = (popup.selected + count - 1) % count;
                KeyOutcome::Handled
            }
            Key::Enter | Key::Tab => {
                let selected = popup.selected;
                self.select(selected).map_or(KeyOutcome::Handled, KeyOutcome::Committed)
            }
            Key::Escape => {
                self.popup = None;
                KeyOutcome::Handled
            }
        }
    }

    /// Commit suggestion `index`, as when it is clicked.
    ///
    /// Replaces the token with the suggestion, closes the popup and returns the
    /// page's new markup. Returns `None` if no popup is open or the index is
    /// out of range.
    pub fn select(&mut self, index: usize) -> Option<String> {
        if index >= self.popup.as_ref()?.suggestions.len() {
            return None;
        }
        let popup = self.popup.take()?;
        self.surface.replace_range(&popup.range, &popup.suggestions[index]);
        self.dismiss_at = None;
        Some(self.surface.markup())
    }

    /// Handle the surface losing focus at `now`.
    ///
    /// The popup is not closed immediately; it closes on the first
    /// [`tick`](Self::tick) after [`BLUR_GRACE`] has elapsed.
    pub fn on_blur(&mut self, now: Instant) {
        if self.popup.is_some() {
            self.dismiss_at = Some(now + BLUR_GRACE);
        }
    }

    /// Advance time to `now`, closing the popup if a blur dismissal is due.
    pub fn tick(&mut self, now: Instant) {
        if self.dismiss_at.is_some_and(|due| now >= due) {
            self.popup = None;
            self.dismiss_at = None;
        }
    }
}

/// Where the caret of a [`MarkupSurface`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Caret {
    /// Inside text node `node`, at byte `offset`.
    Text { node: usize, offset: usize },
    /// At an element boundary.
    Boundary,
}

/// An in-memory [`EditorSurface`] over a parsed markup tree.
#[derive(Debug, Clone)]
pub struct MarkupSurface {
    nodes: Vec<Node>,
    caret: Caret,
}

impl MarkupSurface {
    /// Create a surface showing `markup`, with the caret at an element
    /// boundary.
    #[must_use]
    pub fn new(markup: &str) -> Self {
        Self {
            nodes: markup::parse(markup),
            caret: Caret::Boundary,
        }
    }

    fn text_node(&self, index: usize) -> Option<&str> {
        let mut texts = Vec::new();
        markup::text_nodes(&self.nodes, &mut texts);
        texts.get(index).copied()
    }

    fn text_node_mut(&mut self, index: usize) -> Option<&mut String> {
        let mut texts = Vec::new();
        markup::text_nodes_mut(&mut self.nodes, &mut texts);
        texts.into_iter().nth(index)
    }

    fn text_node_count(&self) -> usize {
        let mut texts = Vec::new();
        markup::text_nodes(&self.nodes, &mut texts);
        texts.len()
    }

    /// Place the caret in text node `node` at byte `offset`.
    ///
    /// Offsets past the end of the node, or not on a character boundary, are
    /// moved back to the nearest valid position. A missing node leaves the
    /// caret at an element boundary.
    pub fn place_caret(&mut self, node: TextNodeId, offset: usize) {
        let caret = match self.text_node(node.0) {
            Some(text) => {
                let mut offset = offset.min(text.len());
                while !text.is_char_boundary(offset) {
                    offset -= 1;
                }
                Caret::Text {
                    node: node.0,
                    offset,
                }
            }
            None => Caret::Boundary,
        };
        self.caret = caret;
    }

    /// Put the caret at the end of the last text node.
    pub fn caret_to_end(&mut self) {
        let caret = self
            .text_node_count()
            .checked_sub(1)
            .and_then(|node| {
                let offset = self.text_node(node)?.len();
                Some(Caret::Text { node, offset })
            })
            .unwrap_or(Caret::Boundary);
        self.caret = caret;
    }

    /// Move the caret to an element boundary.
    pub const fn caret_to_boundary(&mut self) {
        self.caret = Caret::Boundary;
    }

    /// Insert `text` at the caret, as if it were typed.
    ///
    /// Typing at an element boundary starts a new text node at the end of the
    /// content.
    pub fn type_text(&mut self, text: &str) {
        if let Caret::Text { node, offset } = self.caret {
            let target = self.text_node_mut(node);
            if let Some(target) = target {
                target.insert_str(offset, text);
                self.caret = Caret::Text {
                    node,
                    offset: offset + text.len(),
                };
                return;
            }
        }

        self.nodes.push(Node::Text(text.to_string()));
        self.caret_to_end();
    }
}

impl EditorSurface for MarkupSurface {
    fn markup(&self) -> String {
        markup::to_markup(&self.nodes)
    }

    fn set_markup(&mut self, markup: &str) {
        self.nodes = markup::parse(markup);
        self.caret = Caret::Boundary;
    }

    fn caret_context(&self) -> Option<CaretContext> {
        let Caret::Text { node, offset } = self.caret else {
            return None;
        };
        let text = self.text_node(node)?.to_string();
        Some(CaretContext {
            node: TextNodeId(node),
            text,
            offset,
        })
    }

    fn replace_range(&mut self, range: &TextRange, text: &str) {
        let Some(target) = self.text_node_mut(range.node.0) else {
            return;
        };
        let end = range.end.min(target.len());
        let start = range.start.min(end);
        target.replace_range(start..end, text);
        self.caret = Caret::Text {
            node: range.node.0,
            offset: start + text.len(),
        };
    }

    fn plain_text(&self) -> String {
        markup::plain_text(&self.nodes)
    }

    /// Text-cell coordinates: the column within the caret's text node and the
    /// node's ordinal.
    fn caret_position(&self) -> Option<Position> {
        let context = self.caret_context()?;
        let column = context.text[..context.offset].chars().count();
        Some(Position {
            left: column as f32,
            top: context.node.0 as f32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(markup: &str, vocabulary: &[&str]) -> PageEditor<MarkupSurface> {
        let mut surface = MarkupSurface::new(markup);
        surface.caret_to_end();
        PageEditor::with_vocabulary(
            surface,
            vocabulary.iter().map(ToString::to_string).collect(),
        )
    }

    fn type_and_input(editor: &mut PageEditor<MarkupSurface>, text: &str) -> String {
        editor.surface_mut().type_text(text);
        editor.on_input()
    }

    #[test]
    fn typing_offers_suggestions() {
        let mut editor = editor("<div>Say </div>", &["Hello", "Help"]);
        let markup = type_and_input(&mut editor, "He");

        assert_eq!(markup, "<div>Say He</div>");
        assert_eq!(editor.suggestions(), &["Hello", "Help"]);
        assert_eq!(editor.popup().unwrap().selected, 0);
    }

    #[test]
    fn short_token_has_no_popup() {
        let mut editor = editor("<div>Say </div>", &["Hello"]);
        type_and_input(&mut editor, "H");
        assert!(editor.popup().is_none());
    }

    #[test]
    fn caret_at_boundary_has_no_popup() {
        let mut editor = editor("<div>He</div>", &["Hello"]);
        editor.surface_mut().caret_to_boundary();
        editor.on_input();
        assert!(editor.popup().is_none());
    }

    #[test]
    fn arrows_cycle_circularly() {
        let mut editor = editor("", &["Hello", "Help", "Helm"]);
        type_and_input(&mut editor, "He");

        assert_eq!(editor.on_key(Key::Up), KeyOutcome::Handled);
        assert_eq!(editor.popup().unwrap().selected, 2);
        editor.on_key(Key::Down);
        assert_eq!(editor.popup().unwrap().selected, 0);
        editor.on_key(Key::Down);
        assert_eq!(editor.popup().unwrap().selected, 1);
    }

    #[test]
    fn enter_commits_highlighted_suggestion() {
        let mut editor = editor("<p>Say </p>", &["Hello", "Help"]);
        type_and_input(&mut editor, "He");
        editor.on_key(Key::Down);

        let outcome = editor.on_key(Key::Enter);
        assert_eq!(outcome, KeyOutcome::Committed("<p>Say Help</p>".to_string()));
        assert!(editor.popup().is_none());

        // the caret sits just after the inserted word
        editor.surface_mut().type_text("!");
        assert_eq!(editor.surface().markup(), "<p>Say Help!</p>");
    }

    #[test]
    fn tab_commits_only_the_token_span() {
        let mut editor = editor("<p>one </p>", &["twofold"]);
        type_and_input(&mut editor, "tw");
        assert_eq!(
            editor.on_key(Key::Tab),
            KeyOutcome::Committed("<p>one twofold</p>".to_string())
        );
    }

    #[test]
    fn escape_dismisses_without_changes() {
        let mut editor = editor("", &["Hello"]);
        let before = type_and_input(&mut editor, "He");

        assert_eq!(editor.on_key(Key::Escape), KeyOutcome::Handled);
        assert!(editor.popup().is_none());
        assert_eq!(editor.surface().markup(), before);
    }

    #[test]
    fn keys_are_ignored_without_popup() {
        let mut editor = editor("", &["Hello"]);
        assert_eq!(editor.on_key(Key::Enter), KeyOutcome::Ignored);
    }

    #[test]
    fn blur_dismisses_after_grace_period() {
        let mut editor = editor("", &["Hello"]);
        type_and_input(&mut editor, "He");

        let now = Instant::now();
        editor.on_blur(now);
        editor.tick(now + Duration::from_millis(50));
        assert!(editor.popup().is_some());

        editor.tick(now + BLUR_GRACE);
        assert!(editor.popup().is_none());
    }

    #[test]
    fn pointer_selection_during_grace_period_commits() {
        let mut editor = editor("", &["Hello", "Help"]);
        type_and_input(&mut editor, "He");

        let now = Instant::now();
        editor.on_blur(now);
        assert_eq!(editor.select(1), Some("Help".to_string()));

        editor.tick(now + BLUR_GRACE);
        assert_eq!(editor.surface().markup(), "Help");
    }

    #[test]
    fn render_skips_identical_markup() {
        let mut editor = editor("<div>text</div>", &["Hello"]);
        assert!(!editor.render("<div>text</div>"));

        // the caret survives a no-op render
        editor.surface_mut().type_text("s");
        assert_eq!(editor.surface().markup(), "<div>texts</div>");

        assert!(editor.render("<div>other</div>"));
        assert_eq!(editor.surface().markup(), "<div>other</div>");
    }

    #[test]
    fn page_words_are_suggested() {
        let mut editor = editor("<div>Photosynthesis is vital.</div><div></div>", &[]);
        editor.surface_mut().caret_to_end();
        type_and_input(&mut editor, " Pho");
        assert_eq!(editor.suggestions(), &["Photosynthesis"]);
    }
}
