//! Per-repository configuration.
//!
//! `.quire.yaml` at the repository root records who is acting and where the
//! issue files live. It is itself a record, tagged `!config`, so it is read
//! and written by the same codec as the project files.

use crate::error::ConfigError;
use quire_record::{
    FieldSlot, FieldSpec, FieldValues, Node, Prompter, Record, RecordState, Schema, Slot,
};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = ".quire.yaml";

/// Directory holding the project and issue files, relative to the root.
pub const DEFAULT_ISSUE_DIR: &str = "bugs";

/// Environment variable that overrides the configured actor.
pub const USER_ENV: &str = "QUIRE_USER";

/// Maximum directory depth to traverse when searching for the repository root.
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// The user and layout settings of one repository.
#[derive(Debug, Default)]
pub struct Config {
    state: RecordState,
    name: Slot<String>,
    email: Slot<String>,
    issue_dir: Slot<String>,
}

static SCHEMA: LazyLock<Schema<Config>> = LazyLock::new(|| {
    Schema::build([
        FieldSpec::new("name")
            .prompt("Your name")
            .default_generator(|_, _| Ok(login_name().map_or(Value::Null, Value::from))),
        FieldSpec::new("email")
            .prompt("Your email address")
            .default_generator(|_, _| Ok(default_email().map_or(Value::Null, Value::from))),
        FieldSpec::new("issue_dir").ask(false).default(DEFAULT_ISSUE_DIR),
    ])
    .expect("config schema declares unique fields")
});

fn login_name() -> Option<String> {
    ["USER", "USERNAME"]
        .into_iter()
        .find_map(|var| std::env::var(var).ok())
        .filter(|name| !name.trim().is_empty())
}

fn default_email() -> Option<String> {
    let host = std::env::var("HOSTNAME")
        .ok()
        .filter(|host| !host.trim().is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    login_name().map(|user| format!("{user}@{host}"))
}

impl Config {
    /// Configuration for `name <email>` with the default issue directory.
    ///
    /// # Errors
    ///
    /// Returns an error if a value is empty.
    pub fn new(name: &str, email: &str) -> Result<Self, ConfigError> {
        Ok(quire_record::construct(
            &FieldValues::new().with("name", name).with("email", email),
            &(),
        )?)
    }

    /// Ask the operator for their name and email.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt fails.
    pub fn create_interactively(prompter: &mut dyn Prompter) -> Result<Self, ConfigError> {
        Ok(quire_record::construct_interactively(
            prompter,
            &(),
            &FieldValues::new(),
            None,
        )?)
    }

    /// The user's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.get().map_or("", String::as_str)
    }

    /// The user's email address.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.get().map_or("", String::as_str)
    }

    /// Issue directory, relative to the repository root.
    #[must_use]
    pub fn issue_dir(&self) -> &str {
        self.issue_dir.get().map_or(DEFAULT_ISSUE_DIR, String::as_str)
    }

    /// `Name <email>`.
    #[must_use]
    pub fn user(&self) -> String {
        format!("{} <{}>", self.name(), self.email())
    }

    /// The identity recorded in change logs: [`USER_ENV`] when set, else [`Config::user`].
    #[must_use]
    pub fn actor(&self) -> String {
        std::env::var(USER_ENV)
            .ok()
            .filter(|user| !user.trim().is_empty())
            .unwrap_or_else(|| self.user())
    }

    /// Absolute issue directory for a repository rooted at `root`.
    #[must_use]
    pub fn issue_path(&self, root: &Path) -> PathBuf {
        root.join(self.issue_dir())
    }

    /// Read the configuration of the repository rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or does not decode.
    pub async fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE_NAME);
        let decoded = quire_record::decode_file::<Self>(&path).await?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(decoded.record)
    }

    /// Write the configuration into the repository rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&mut self, root: &Path) -> Result<(), ConfigError> {
        quire_record::encode_file(self, root.join(CONFIG_FILE_NAME)).await?;
        self.mark_clean();
        Ok(())
    }

    /// Find the repository root above `start` and load its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if no configuration file exists in
    /// `start` or its parents.
    pub async fn locate(start: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let root = find_root(start).ok_or_else(|| ConfigError::NotFound {
            start: start.to_path_buf(),
            file: CONFIG_FILE_NAME,
        })?;
        let config = Self::load(&root).await?;
        Ok((root, config))
    }
}

/// Find the repository root by searching up the directory tree.
///
/// Starts from the given directory and traverses parent directories until
/// one containing [`CONFIG_FILE_NAME`] is found, the filesystem root is
/// reached, or the maximum traversal depth is exceeded.
#[must_use]
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(CONFIG_FILE_NAME).is_file() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}

impl Node for Config {
    fn record_type(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }
}

impl Record for Config {
    type Context = ();
    const TYPE_NAME: &'static str = "Config";

    fn schema() -> &'static Schema<Self> {
        &SCHEMA
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn slot(&self, field: &str) -> Option<&dyn FieldSlot> {
        Some(match field {
            "name" => &self.name,
            "email" => &self.email,
            "issue_dir" => &self.issue_dir,
            _ => return None,
        })
    }

    fn slot_mut(&mut self, field: &str) -> Option<&mut dyn FieldSlot> {
        Some(match field {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "issue_dir" => &mut self.issue_dir,
            _ => return None,
        })
    }

    fn validate(&self) -> quire_record::Result<()> {
        if self.issue_dir().trim().is_empty() {
            return Err(quire_record::Error::invalid(
                Self::TYPE_NAME,
                "issue_dir must not be empty",
            ));
        }
        Ok(())
    }
}
