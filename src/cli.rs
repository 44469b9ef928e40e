use std::{
    fs,
    path::{Path, PathBuf},
    process,
    time::Duration,
};

mod cover;
mod init;
mod list;
mod page;
mod show;
mod suggest;
mod terminal;

use anyhow::Context as _;
use assignment::{
    Assignment, AssignmentDraft, Config, Cover, Store,
    domain::{
        calculator::{CalcKey, Calculator},
        credential::{self, Argon2Verifier, Credentials},
        markup,
    },
    export,
    storage::DeleteError,
};
use clap::ArgAction;
use indicatif::ProgressBar;
use list::List;
use show::Show;
use suggest::Suggest;
use terminal::Colorize;
use tracing::instrument;

/// Name of the configuration file in the data directory.
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The directory holding the configuration and the assignment store
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(&self.root)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Set up the account and default settings
    Init(init::Command),

    /// Check a username and password against the account
    Login(Login),

    /// Create a new assignment
    Create(Create),

    /// List assignments (default)
    List(List),

    /// Show an assignment's cover details and pages
    Show(Show),

    /// Delete an assignment
    ///
    /// Deleting requires the account password.
    Delete(Delete),

    /// Edit the content pages of an assignment
    #[command(subcommand)]
    Page(page::Command),

    /// Edit the cover page of an assignment
    #[command(subcommand)]
    Cover(cover::Command),

    /// Suggest completions for a word typed at the end of a page
    Suggest(Suggest),

    /// Export an assignment as a Word document
    Export(Export),

    /// Evaluate an arithmetic expression
    Calc(Calc),
}

impl Command {
    fn run(self, root: &Path) -> anyhow::Result<()> {
        match self {
            Self::Init(command) => command.run(root)?,
            Self::Login(command) => command.run(root)?,
            Self::Create(command) => command.run(root)?,
            Self::List(command) => command.run(root)?,
            Self::Show(command) => command.run(root)?,
            Self::Delete(command) => command.run(root)?,
            Self::Page(command) => command.run(root)?,
            Self::Cover(command) => command.run(root)?,
            Self::Suggest(command) => command.run(root)?,
            Self::Export(command) => command.run(root)?,
            Self::Calc(command) => command.run(),
        }
        Ok(())
    }
}

fn load_config(root: &Path) -> Config {
    Config::load_or_default(&root.join(CONFIG_FILE))
}

/// Milliseconds since the Unix epoch.
fn now() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Look up an assignment by id or unique id prefix.
fn find<'a>(store: &'a Store, id: &str) -> anyhow::Result<&'a Assignment> {
    store
        .find(id)
        .ok_or_else(|| anyhow::anyhow!("No assignment matches '{id}'"))
}

/// Apply `edit` to the assignment matching `id`, then save it.
fn update<T>(
    root: &Path,
    id: &str,
    edit: impl FnOnce(&mut Assignment) -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut store = Store::open(root);
    let mut assignment = find(&store, id)?.clone();
    let output = edit(&mut assignment)?;
    assignment.touch(now());
    store.save(assignment)?;
    Ok(output)
}

/// Where an export named `file_name` is written inside `out`.
///
/// Path separators and drive colons in the name are replaced so the file
/// always lands directly in `out`.
fn output_path(out: &Path, file_name: &str) -> PathBuf {
    out.join(file_name.replace(['/', '\\', ':'], "_"))
}

/// Parse a `--border-color` value into `#RRGGBB`. An empty value is kept.
fn border_color(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Ok(String::new());
    }
    markup::parse_color(value)
        .map(|hex| format!("#{hex}"))
        .ok_or_else(|| format!("'{value}' is not a colour (expected #rgb, #rrggbb or rgb(r, g, b))"))
}

fn prompt_username(username: Option<String>) -> anyhow::Result<String> {
    match username {
        Some(username) => Ok(username),
        None => Ok(dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?),
    }
}

fn prompt_password(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?),
    }
}

#[derive(Debug, clap::Parser)]
pub struct Login {
    /// The account username (prompted for if omitted)
    #[arg(long, short)]
    username: Option<String>,

    /// The account password (prompted for if omitted)
    #[arg(long, short)]
    password: Option<String>,
}

impl Login {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let verifier = Argon2Verifier::from_config(&config)
            .context("No account is set up. Run 'assign init' first")?;

        let credentials = Credentials::new(
            prompt_username(self.username)?,
            prompt_password(self.password)?,
        );

        match credential::login(&verifier, &credentials) {
            Ok(session) => {
                println!(
                    "{}",
                    format!("✅ Logged in as {}", session.username()).success()
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e.to_string().warning());
                process::exit(1);
            }
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Create {
    /// The assignment title
    #[arg(long, short)]
    name: String,

    /// The assignment number, shown in the page header
    #[arg(long, default_value = "")]
    number: String,

    /// The course name
    #[arg(long, default_value = "")]
    course_name: String,

    /// The course code
    #[arg(long, default_value = "")]
    course_code: String,

    /// The student's name (defaults to the configured name)
    #[arg(long)]
    student_name: Option<String>,

    /// The student's ID (defaults to the configured ID)
    #[arg(long)]
    student_id: Option<String>,

    /// The semester
    #[arg(long, default_value = "")]
    semester: String,

    /// Who the assignment is submitted to
    #[arg(long = "teacher", default_value = "")]
    teacher_name: String,

    /// The submission date (defaults to the configured date at export)
    #[arg(long = "date")]
    submission_date: Option<String>,

    /// The university name (defaults to the configured name at export)
    #[arg(long)]
    university: Option<String>,

    /// The page border colour, such as '#2563EB'
    #[arg(long, value_parser = border_color)]
    border_color: Option<String>,

    /// The maximum export size in MB, used to estimate the page count
    #[arg(long = "max-size")]
    max_file_size_mb: Option<u32>,
}

impl Create {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let mut store = Store::open(root);

        let cover = Cover {
            number: self.number,
            name: self.name,
            course_name: self.course_name,
            course_code: self.course_code,
            student_name: self
                .student_name
                .unwrap_or_else(|| config.student_name.clone()),
            student_id: self.student_id.unwrap_or_else(|| config.student_id.clone()),
            semester: self.semester,
            teacher_name: self.teacher_name,
            submission_date: self.submission_date.unwrap_or_default(),
            university_name: self.university.unwrap_or_default(),
            border_color: self.border_color.filter(|color| !color.is_empty()),
            rows: None,
        };
        let draft = AssignmentDraft {
            cover,
            max_file_size_mb: self.max_file_size_mb.unwrap_or(config.max_file_size_mb),
        };

        let assignment = Assignment::new(draft, now());
        let id = assignment.id().to_string();
        let pages_needed = assignment.pages_needed();
        store.save(assignment)?;

        println!("Created assignment {id}");
        println!(
            "{}",
            format!("  Estimated length: {pages_needed} page(s)").dim()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Delete {
    /// The assignment id (or a unique prefix of it)
    id: String,

    /// The account password (prompted for if omitted)
    #[arg(long, short)]
    password: Option<String>,
}

impl Delete {
    #[instrument(skip(self))]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let mut store = Store::open(root);

        let assignment = find(&store, &self.id)?;
        let id = assignment.id().to_string();
        let name = assignment.name().to_string();

        let verifier = Argon2Verifier::from_config(&config)
            .context("No account is set up. Run 'assign init' first")?;
        let password = prompt_password(self.password)?;

        match store.delete_confirmed(&id, &password, &verifier) {
            Ok(true) => {
                println!("{}", format!("✅ Deleted '{name}'").success());
                Ok(())
            }
            Ok(false) => anyhow::bail!("No assignment matches '{id}'"),
            Err(DeleteError::IncorrectPassword) => {
                eprintln!("{}", "Incorrect password. Nothing was deleted.".warning());
                process::exit(1);
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, clap::Parser)]
pub struct Export {
    /// The assignment id (or a unique prefix of it)
    id: String,

    /// The directory to write the document to
    #[arg(long, short, default_value = ".")]
    out: PathBuf,
}

impl Export {
    #[instrument]
    fn run(self, root: &Path) -> anyhow::Result<()> {
        let config = load_config(root);
        let store = Store::open(root);
        let assignment = find(&store, &self.id)?;

        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!("Exporting '{}'", assignment.name()));
        spinner.enable_steady_tick(Duration::from_millis(80));
        let result = export::export(assignment, &config);
        spinner.finish_and_clear();
        let document = result?;

        let limit = u64::from(assignment.max_file_size_mb()) * 1024 * 1024;
        let size = document.bytes.len() as u64;
        if limit > 0 && size > limit {
            tracing::warn!(
                "export is {size} bytes, over the {} MB limit",
                assignment.max_file_size_mb()
            );
        }

        fs::create_dir_all(&self.out)
            .with_context(|| format!("Failed to create {}", self.out.display()))?;
        let path = output_path(&self.out, &document.file_name);
        fs::write(&path, &document.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        println!(
            "{}",
            format!("✅ Exported to {}", path.display()).success()
        );
        Ok(())
    }
}

#[derive(Debug, clap::Parser)]
pub struct Calc {
    /// The expression, such as '2 ^ 10' or 'sqrt(2) * 3!'
    #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
    expression: Vec<String>,
}

impl Calc {
    #[instrument]
    fn run(self) {
        let mut calculator = Calculator::default();
        calculator.press(CalcKey::Insert(self.expression.join(" ")));
        calculator.press(CalcKey::Equals);

        if calculator.history().is_empty() {
            eprintln!("{}", calculator.result().warning());
            process::exit(1);
        }
        println!("{}", calculator.result());
    }
}
