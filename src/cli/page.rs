use std::{
    fs,
    io::{self, Read as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use assignment::domain::Side;
use tracing::instrument;

use super::{terminal::Colorize, update};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Append an empty page
    Add {
        /// The assignment id (or a unique prefix of it)
        id: String,
    },

    /// Remove a page
    ///
    /// The last remaining page cannot be removed.
    Remove {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
    },

    /// Replace a page's markup
    ///
    /// The markup is read from --file, or from standard input when neither
    /// --markup nor --file is given.
    Set {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
        /// The new markup
        #[arg(long, conflicts_with = "file")]
        markup: Option<String>,
        /// A file holding the new markup
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Append a question heading to the last page
    Question {
        /// The assignment id (or a unique prefix of it)
        id: String,
    },

    /// Append an answer block to the last page
    Answer {
        /// The assignment id (or a unique prefix of it)
        id: String,
    },

    /// Append a horizontal rule
    Rule {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
    },

    /// Append a vertical rule
    Vline {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
        /// Height in twelfths of the page (1-12)
        #[arg(long, default_value_t = 6)]
        size: u32,
    },

    /// Append an empty table
    Table {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
        /// Number of rows
        #[arg(long, default_value_t = 3)]
        rows: usize,
        /// Number of columns
        #[arg(long, default_value_t = 3)]
        cols: usize,
    },

    /// Append numbered answer lines beside a vertical bar
    Lines {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
        /// Height in twelfths of the page (1-12)
        #[arg(long, default_value_t = 6)]
        size: u32,
        /// Number of lines
        #[arg(long, default_value_t = 5)]
        count: usize,
        /// Put the lines left of the bar instead of right
        #[arg(long)]
        left: bool,
    },

    /// Append a picture
    Image {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The page index, starting from 0
        page: usize,
        /// A PNG, JPEG, GIF or BMP file
        path: PathBuf,
    },
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Add { id } => {
                let index = update(root, &id, |a| Ok(a.add_page()))?;
                println!("{}", format!("✅ Added page {index}").success());
            }
            Self::Remove { id, page } => {
                update(root, &id, |a| Ok(a.remove_page(page)?))?;
                println!("{}", format!("✅ Removed page {page}").success());
            }
            Self::Set {
                id,
                page,
                markup,
                file,
            } => {
                let markup = match (markup, file) {
                    (Some(markup), _) => markup,
                    (None, Some(file)) => fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?,
                    (None, None) => {
                        let mut markup = String::new();
                        io::stdin().read_to_string(&mut markup)?;
                        markup
                    }
                };
                update(root, &id, |a| Ok(a.set_page(page, markup)?))?;
                println!("{}", format!("✅ Updated page {page}").success());
            }
            Self::Question { id } => {
                update(root, &id, |a| {
                    a.append_question();
                    Ok(())
                })?;
                println!("{}", "✅ Added a question".success());
            }
            Self::Answer { id } => {
                update(root, &id, |a| {
                    a.append_answer();
                    Ok(())
                })?;
                println!("{}", "✅ Added an answer".success());
            }
            Self::Rule { id, page } => {
                update(root, &id, |a| Ok(a.insert_horizontal_rule(page)?))?;
                println!("{}", format!("✅ Added a rule to page {page}").success());
            }
            Self::Vline { id, page, size } => {
                update(root, &id, |a| Ok(a.insert_vertical_rule(page, size)?))?;
                println!(
                    "{}",
                    format!("✅ Added a vertical rule to page {page}").success()
                );
            }
            Self::Table {
                id,
                page,
                rows,
                cols,
            } => {
                update(root, &id, |a| Ok(a.insert_table(page, rows, cols)?))?;
                println!(
                    "{}",
                    format!("✅ Added a {rows}x{cols} table to page {page}").success()
                );
            }
            Self::Lines {
                id,
                page,
                size,
                count,
                left,
            } => {
                let side = if left { Side::Left } else { Side::Right };
                update(root, &id, |a| {
                    Ok(a.insert_answer_lines(page, size, count, side)?)
                })?;
                println!(
                    "{}",
                    format!("✅ Added {count} answer lines to page {page}").success()
                );
            }
            Self::Image { id, page, path } => {
                let data_uri = data_uri(&path)?;
                update(root, &id, |a| Ok(a.insert_image(page, &data_uri)?))?;
                println!(
                    "{}",
                    format!("✅ Added {} to page {page}", path.display()).success()
                );
            }
        }
        Ok(())
    }
}

/// Read a picture file into a base64 data URI.
fn data_uri(path: &Path) -> anyhow::Result<String> {
    use base64ct::{Base64, Encoding as _};

    let media_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        _ => anyhow::bail!(
            "Unsupported picture type '{}' (expected png, jpeg, gif or bmp)",
            path.display()
        ),
    };
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(format!(
        "data:{media_type};base64,{}",
        Base64::encode_string(&bytes)
    ))
}
