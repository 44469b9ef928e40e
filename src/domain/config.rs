use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::markup::parse_color;

/// Settings for an assignment repository.
///
/// Holds the account used to authorise logins and destructive operations,
/// and the defaults applied to newly created assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The account name accepted at login.
    pub username: String,

    /// The Argon2 PHC string of the account password.
    ///
    /// When absent, logins and confirmed deletions always fail.
    password_hash: Option<String>,

    /// University name shown on the cover page.
    pub university_name: String,

    /// Page border colour, as `#rrggbb`.
    pub border_color: String,

    /// Submission date used when an assignment does not set one.
    pub default_date: String,

    /// The default size budget, in megabytes, of new assignments.
    pub max_file_size_mb: u32,

    /// Student name prefilled on new assignments.
    pub student_name: String,

    /// Student ID prefilled on new assignments.
    pub student_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            username: String::new(),
            password_hash: None,
            university_name: default_university_name(),
            border_color: default_border_color(),
            default_date: default_date(),
            max_file_size_mb: default_max_file_size_mb(),
            student_name: String::new(),
            student_id: String::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration, falling back to the defaults if it cannot be
    /// read.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::debug!("using default configuration: {e}");
            Self::default()
        })
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// The stored password hash, if an account has been set up.
    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Sets the account, replacing any previous one.
    ///
    /// `password_hash` must be a PHC string, as produced by
    /// [`hash_password`](crate::domain::credential::hash_password).
    pub fn set_account(&mut self, username: String, password_hash: String) {
        self.username = username;
        self.password_hash = Some(password_hash);
    }

    /// The border colour as six upper-case hex digits, as written into
    /// documents. An unreadable colour falls back to the default.
    #[must_use]
    pub fn border_hex(&self) -> String {
        parse_color(&self.border_color)
            .or_else(|| parse_color(&default_border_color()))
            .unwrap_or_default()
    }
}

fn default_university_name() -> String {
    "RAYNEX UNIVERSITY".to_string()
}

fn default_border_color() -> String {
    "#16A34A".to_string()
}

fn default_date() -> String {
    "Spring 2025".to_string()
}

const fn default_max_file_size_mb() -> u32 {
    5
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default)]
        username: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        password_hash: Option<String>,

        #[serde(default = "default_university_name")]
        university_name: String,

        #[serde(default = "default_border_color")]
        border_color: String,

        #[serde(default = "default_date")]
        default_date: String,

        /// Size budget in megabytes; each megabyte is worth roughly seven
        /// pages.
        #[serde(default = "default_max_file_size_mb")]
        max_file_size_mb: u32,

        #[serde(default, skip_serializing_if = "String::is_empty")]
        student_name: String,

        #[serde(default, skip_serializing_if = "String::is_empty")]
        student_id: String,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                username,
                password_hash,
                university_name,
                border_color,
                default_date,
                max_file_size_mb,
                student_name,
                student_id,
            } => Self {
                username,
                password_hash,
                university_name,
                border_color,
                default_date,
                max_file_size_mb,
                student_name,
                student_id,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            username: config.username,
            password_hash: config.password_hash,
            university_name: config.university_name,
            border_color: config.border_color,
            default_date: config.default_date,
            max_file_size_mb: config.max_file_size_mb,
            student_name: config.student_name,
            student_id: config.student_id,
        }
    }
}
