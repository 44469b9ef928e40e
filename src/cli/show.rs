use std::path::Path;

use assignment::{Assignment, Store, domain::markup, storage::AssignmentRecord};
use clap::Parser;
use tracing::instrument;

use super::{
    find,
    terminal::{Colorize, truncate},
};

/// Length of the page previews in pretty output.
const PREVIEW_LEN: usize = 72;

#[derive(Debug, Parser)]
#[command(about = "Display an assignment's cover details and pages")]
pub struct Show {
    /// The assignment id (or a unique prefix of it)
    id: String,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,

    /// Print the full markup of every page
    #[arg(long)]
    with_content: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let store = Store::open(root);
        let assignment = find(&store, &self.id)?;

        match self.output {
            OutputFormat::Pretty => self.output_pretty(assignment),
            OutputFormat::Json => {
                let record = AssignmentRecord::from(assignment.clone());
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Ok(())
    }

    fn output_pretty(&self, assignment: &Assignment) {
        let cover = assignment.cover();

        println!("{}", format!("# {}", assignment.name()).heading());
        println!("{}\n", assignment.id().dim());

        println!("{}", "Cover".dim());
        let fields = [
            ("Number", cover.number.as_str()),
            ("Course", cover.course_name.as_str()),
            ("Code", cover.course_code.as_str()),
            ("Student", cover.student_name.as_str()),
            ("Student ID", cover.student_id.as_str()),
            ("Semester", cover.semester.as_str()),
            ("Teacher", cover.teacher_name.as_str()),
            ("Date", cover.submission_date.as_str()),
            ("University", cover.university_name.as_str()),
            ("Border", cover.border_color.as_deref().unwrap_or_default()),
        ];
        for (label, value) in fields.iter().filter(|(_, value)| !value.is_empty()) {
            println!("  {:<11} {value}", format!("{label}:"));
        }
        for (index, row) in assignment.cover_rows().iter().enumerate() {
            println!("  [{index}] {}: {}", row.label, row.value);
        }

        println!("\n{}", "Pages".dim());
        println!(
            "  {} of an estimated {} (limit {} MB)",
            assignment.page_count(),
            assignment.pages_needed(),
            assignment.max_file_size_mb()
        );
        for (index, page) in assignment.pages().enumerate() {
            if self.with_content {
                println!("\n{}", format!("--- page {index} ---").info());
                println!("{page}");
            } else {
                let text = markup::plain_text(&markup::parse(page));
                let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
                let preview = if text.is_empty() {
                    "(empty)".dim()
                } else {
                    truncate(&text, PREVIEW_LEN)
                };
                println!("  [{index}] {preview}");
            }
        }
    }
}
