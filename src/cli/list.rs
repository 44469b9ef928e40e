use std::path::Path;

use assignment::{Assignment, Store};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::instrument;

use super::terminal::{Colorize, is_narrow, terminal_width, truncate};

/// Command arguments for `assign list`.
#[derive(Debug, Parser, Default)]
#[command(about = "List assignments")]
pub struct List {
    /// Sort field (default: updated, newest first).
    #[arg(long, value_enum, default_value_t)]
    sort: SortField,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,

    /// Case-insensitive substring match against title and course.
    #[arg(long)]
    contains: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum SortField {
    #[default]
    Updated,
    Created,
    Name,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Serialize)]
struct Entry<'a> {
    id: &'a str,
    number: &'a str,
    name: &'a str,
    course: String,
    pages: usize,
    pages_needed: u32,
    created: String,
    updated: String,
}

impl<'a> Entry<'a> {
    fn new(assignment: &'a Assignment) -> Self {
        let cover = assignment.cover();
        Self {
            id: assignment.id(),
            number: &cover.number,
            name: &cover.name,
            course: course(assignment),
            pages: assignment.page_count(),
            pages_needed: assignment.pages_needed(),
            created: timestamp(assignment.created_at()),
            updated: timestamp(assignment.updated_at()),
        }
    }
}

fn course(assignment: &Assignment) -> String {
    let cover = assignment.cover();
    match (cover.course_name.is_empty(), cover.course_code.is_empty()) {
        (_, true) => cover.course_name.clone(),
        (true, false) => cover.course_code.clone(),
        (false, false) => format!("{} ({})", cover.course_name, cover.course_code),
    }
}

fn timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|time| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

impl List {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = Store::open(root);

        let needle = self.contains.as_deref().map(str::to_lowercase);
        let mut assignments: Vec<&Assignment> = store
            .list()
            .iter()
            .filter(|assignment| {
                needle.as_ref().is_none_or(|needle| {
                    assignment.name().to_lowercase().contains(needle)
                        || course(assignment).to_lowercase().contains(needle)
                })
            })
            .collect();

        match self.sort {
            SortField::Updated => {
                assignments.sort_by_key(|a| std::cmp::Reverse(a.updated_at()));
            }
            SortField::Created => {
                assignments.sort_by_key(|a| std::cmp::Reverse(a.created_at()));
            }
            SortField::Name => assignments.sort_by_cached_key(|a| a.name().to_lowercase()),
        }

        let entries: Vec<Entry> = assignments.into_iter().map(Entry::new).collect();

        match self.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            }
            OutputFormat::Table if self.quiet => {
                for entry in &entries {
                    println!("{}\t{}", entry.id, entry.name);
                }
            }
            OutputFormat::Table => Self::output_table(&entries),
        }
        Ok(())
    }

    fn output_table(entries: &[Entry]) {
        if entries.is_empty() {
            println!("No assignments yet. Create one with 'assign create --name <NAME>'.");
            return;
        }

        if is_narrow() {
            for entry in entries {
                println!("{} {}", short_id(entry.id).info(), entry.name);
                println!("  {}", entry.course.dim());
            }
            return;
        }

        // id, number and page columns take a fixed 32 columns
        let width = usize::from(terminal_width().unwrap_or(100));
        let flexible = width.saturating_sub(32).max(20);
        let name_width = flexible * 3 / 5;
        let course_width = flexible - name_width;

        println!(
            "{}",
            format!(
                "{:<8}  {:<4}  {:<name_width$}  {:<course_width$}  {:>5}  {}",
                "ID", "NO.", "NAME", "COURSE", "PAGES", "UPDATED"
            )
            .heading()
        );
        for entry in entries {
            println!(
                "{}  {:<4}  {:<name_width$}  {:<course_width$}  {:>5}  {}",
                short_id(entry.id).info(),
                truncate(entry.number, 4),
                truncate(entry.name, name_width),
                truncate(&entry.course, course_width),
                entry.pages,
                entry.updated.dim(),
            );
        }
        println!();
        println!("{}", format!("{} assignment(s)", entries.len()).dim());
    }
}

/// The first eight characters of an id, enough to address it in commands.
fn short_id(id: &str) -> String {
    format!("{:<8}", id.chars().take(8).collect::<String>())
}
