use std::path::Path;

use assignment::{
    Store,
    domain::editor::{EditorSurface as _, MarkupSurface, PageEditor},
};
use clap::Parser;
use tracing::instrument;

use super::{find, terminal::Colorize, update};

#[derive(Debug, Parser)]
#[command(about = "Suggest completions for a word typed at the end of a page")]
pub struct Suggest {
    /// The assignment id (or a unique prefix of it)
    id: String,

    /// The page index, starting from 0
    page: usize,

    /// The partial word to complete
    word: String,

    /// Accept suggestion N and save the completed page
    ///
    /// The page is saved as the editor re-renders it: comments are dropped
    /// and markup such as `<br/>` is normalised.
    #[arg(long, value_name = "N")]
    accept: Option<usize>,
}

impl Suggest {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = Store::open(root);
        let assignment = find(&store, &self.id)?;
        let id = assignment.id().to_string();
        let page = assignment.page(self.page)?;

        let mut editor = PageEditor::new(MarkupSurface::new(page));
        let surface = editor.surface_mut();
        surface.caret_to_end();
        let needs_space = surface
            .caret_context()
            .is_some_and(|caret| !caret.text.is_empty() && !caret.text.ends_with(char::is_whitespace));
        if needs_space {
            surface.type_text(" ");
        }
        surface.type_text(&self.word);
        editor.on_input();

        let suggestions = editor.suggestions();
        if suggestions.is_empty() {
            println!("{}", format!("No suggestions for '{}'", self.word).dim());
            return Ok(());
        }
        for (index, suggestion) in suggestions.iter().enumerate() {
            println!("  {} {suggestion}", format!("[{index}]").info());
        }

        if let Some(accept) = self.accept {
            let chosen = suggestions.get(accept).cloned();
            let Some(markup) = editor.select(accept) else {
                anyhow::bail!("There is no suggestion {accept}");
            };
            update(root, &id, |a| Ok(a.set_page(self.page, markup)?))?;
            println!(
                "{}",
                format!(
                    "✅ Completed '{}' as '{}' on page {}",
                    self.word,
                    chosen.unwrap_or_default(),
                    self.page
                )
                .success()
            );
        }
        Ok(())
    }
}
