use std::{fs, path::Path};

use assignment::{Config, domain::credential};
use tracing::instrument;

use super::{CONFIG_FILE, prompt_username, terminal::Colorize};

#[derive(Debug, clap::Parser)]
pub struct Command {
    /// The account username (prompted for if omitted)
    #[arg(long, short)]
    username: Option<String>,

    /// The account password (prompted for if omitted)
    #[arg(long, short)]
    password: Option<String>,

    /// The university named on cover pages
    #[arg(long)]
    university: Option<String>,

    /// The student name filled into new assignments
    #[arg(long)]
    student_name: Option<String>,

    /// The student ID filled into new assignments
    #[arg(long)]
    student_id: Option<String>,

    /// Replace an existing account
    #[arg(long)]
    force: bool,
}

impl Command {
    #[instrument(skip(self))]
    pub fn run(self, root: &Path) -> anyhow::Result<()> {
        let config_path = root.join(CONFIG_FILE);
        let mut config = Config::load_or_default(&config_path);
        if config.password_hash().is_some() && !self.force {
            anyhow::bail!(
                "An account is already set up in {} (use --force to replace it)",
                config_path.display()
            );
        }

        let username = prompt_username(self.username)?;
        let password = match self.password {
            Some(password) => password,
            None => dialoguer::Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?,
        };
        if password.is_empty() {
            anyhow::bail!("The password must not be empty");
        }

        let hash = credential::hash_password(&password)?;
        config.set_account(username.clone(), hash);
        if let Some(university) = self.university {
            config.university_name = university;
        }
        if let Some(student_name) = self.student_name {
            config.student_name = student_name;
        }
        if let Some(student_id) = self.student_id {
            config.student_id = student_id;
        }

        fs::create_dir_all(root)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {e}", root.display()))?;
        config
            .save(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to write {CONFIG_FILE}: {e}"))?;

        println!(
            "{}",
            format!("✅ Account '{username}' set up in {}", root.display()).success()
        );
        println!("  Created: {CONFIG_FILE}");
        println!();
        println!("Next steps:");
        println!("  assign create --name \"Your First Assignment\"");

        Ok(())
    }
}
