use std::path::Path;

use assignment::{Cover, CoverRow};
use tracing::instrument;

use super::{terminal::Colorize, update};

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Change cover fields
    ///
    /// Only the fields given are changed. Pass an empty string to clear one.
    Set(Fields),

    /// Append an extra row to the cover table
    RowAdd {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The row label (shown as 'Extra' if empty)
        label: String,
        /// The row value
        #[arg(default_value = "")]
        value: String,
    },

    /// Replace an extra row of the cover table
    RowSet {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The row index, starting from 0
        row: usize,
        /// The row label
        label: String,
        /// The row value
        #[arg(default_value = "")]
        value: String,
    },

    /// Remove an extra row from the cover table
    RowRemove {
        /// The assignment id (or a unique prefix of it)
        id: String,
        /// The row index, starting from 0
        row: usize,
    },
}

#[derive(Debug, clap::Args)]
pub struct Fields {
    /// The assignment id (or a unique prefix of it)
    id: String,

    /// The assignment title
    #[arg(long)]
    name: Option<String>,

    /// The assignment number
    #[arg(long)]
    number: Option<String>,

    /// The course name
    #[arg(long)]
    course_name: Option<String>,

    /// The course code
    #[arg(long)]
    course_code: Option<String>,

    /// The student's name
    #[arg(long)]
    student_name: Option<String>,

    /// The student's ID
    #[arg(long)]
    student_id: Option<String>,

    /// The semester
    #[arg(long)]
    semester: Option<String>,

    /// Who the assignment is submitted to
    #[arg(long = "teacher")]
    teacher_name: Option<String>,

    /// The submission date
    #[arg(long = "date")]
    submission_date: Option<String>,

    /// The university name
    #[arg(long)]
    university: Option<String>,

    /// The page border colour (empty to use the configured colour)
    #[arg(long, value_parser = super::border_color)]
    border_color: Option<String>,

    /// The maximum export size in MB
    #[arg(long = "max-size")]
    max_file_size_mb: Option<u32>,
}

impl Fields {
    /// Write the given fields into `cover`, returning how many were given.
    fn apply(self, cover: &mut Cover) -> usize {
        let mut changed = 0;
        let mut set = |field: &mut String, value: Option<String>| {
            if let Some(value) = value {
                *field = value;
                changed += 1;
            }
        };

        set(&mut cover.name, self.name);
        set(&mut cover.number, self.number);
        set(&mut cover.course_name, self.course_name);
        set(&mut cover.course_code, self.course_code);
        set(&mut cover.student_name, self.student_name);
        set(&mut cover.student_id, self.student_id);
        set(&mut cover.semester, self.semester);
        set(&mut cover.teacher_name, self.teacher_name);
        set(&mut cover.submission_date, self.submission_date);
        set(&mut cover.university_name, self.university);

        if let Some(color) = self.border_color {
            cover.border_color = Some(color).filter(|c| !c.is_empty());
            changed += 1;
        }
        changed
    }
}

impl Command {
    #[instrument(level = "debug", skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Set(mut fields) => {
                let id = std::mem::take(&mut fields.id);
                let max_size = fields.max_file_size_mb.take();
                let changed = update(root, &id, |a| {
                    let mut changed = fields.apply(a.cover_mut());
                    if let Some(max_size) = max_size {
                        a.set_max_file_size(max_size);
                        changed += 1;
                    }
                    Ok(changed)
                })?;
                if changed == 0 {
                    println!("{}", "Nothing to change".dim());
                } else {
                    println!("{}", format!("✅ Updated {changed} field(s)").success());
                }
            }
            Self::RowAdd { id, label, value } => {
                update(root, &id, |a| {
                    a.add_cover_row(CoverRow::new(label, value));
                    Ok(())
                })?;
                println!("{}", "✅ Added a cover row".success());
            }
            Self::RowSet {
                id,
                row,
                label,
                value,
            } => {
                update(root, &id, |a| {
                    Ok(a.update_cover_row(row, CoverRow::new(label, value))?)
                })?;
                println!("{}", format!("✅ Updated cover row {row}").success());
            }
            Self::RowRemove { id, row } => {
                let removed = update(root, &id, |a| Ok(a.remove_cover_row(row)?))?;
                println!(
                    "{}",
                    format!("✅ Removed cover row '{}'", removed.label).success()
                );
            }
        }
        Ok(())
    }
}
