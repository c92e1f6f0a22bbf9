//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that locates the repository, loads
//! its configuration and project, and saves the project back after a
//! command has changed it.
//!
//! # Example
//!
//! ```no_run
//! use quire::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut app = App::from_directory(Path::new(".")).await?;
//!     let actor = app.actor();
//!     app.project_mut().issue_for_mut("core-1")?.start_work(&actor, None)?;
//!     app.save().await?;
//!     Ok(())
//! }
//! ```

use crate::config::Config;
use crate::domain::Project;
use crate::error::Result;
use crate::storage::{FileBackend, FileStore, ProjectStore, SaveReport};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Application context for CLI operations.
///
/// The project is loaded once when the context is created. Commands mutate
/// it in memory and call [`App::save`] to write what changed.
#[derive(Debug)]
pub struct App {
    root: PathBuf,
    config: Config,
    store: FileStore,
    project: Project,
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree to find `.quire.yaml`, loads the
    /// configuration and then the project from the issue directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No quire repository is found in the directory tree
    /// - The configuration cannot be loaded
    /// - The project or one of its issues cannot be loaded
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let (root, config) = Config::locate(working_dir).await?;
        let store = FileStore::new(FileBackend::new(config.issue_path(&root)));
        let loaded = store.load().await?;
        for warning in &loaded.warnings {
            warn!(path = %warning.path.display(), "{}", warning.warning.description());
        }
        Ok(Self {
            root,
            config,
            store,
            project: loaded.project,
        })
    }

    /// The repository root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Who to record in change logs.
    #[must_use]
    pub fn actor(&self) -> String {
        self.config.actor()
    }

    /// The loaded project.
    #[must_use]
    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The loaded project, for mutation.
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    /// Write the changes made since loading.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written or removed.
    pub async fn save(&mut self) -> Result<SaveReport> {
        self.store.save(&mut self.project).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::init;
    use crate::domain::{Component, Issue};
    use quire_record::FieldValues;
    use tempfile::TempDir;

    async fn initialized() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("core").unwrap()).unwrap();
        init::init(
            temp_dir.path(),
            Config::new("Ann", "ann@example.com").unwrap(),
            project,
        )
        .await
        .unwrap();
        temp_dir
    }

    #[tokio::test]
    async fn test_app_from_initialized_directory() {
        let temp_dir = initialized().await;

        let app = App::from_directory(temp_dir.path()).await.unwrap();

        assert_eq!(app.project().name(), "demo");
        assert_eq!(app.config().user(), "Ann <ann@example.com>");
        assert_eq!(app.root(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_app_from_subdirectory() {
        let temp_dir = initialized().await;
        let sub_dir = temp_dir.path().join("src").join("lib");
        std::fs::create_dir_all(&sub_dir).unwrap();

        let app = App::from_directory(&sub_dir).await.unwrap();
        assert_eq!(app.root(), temp_dir.path());
    }

    #[tokio::test]
    async fn test_app_from_uninitialized_directory() {
        let temp_dir = TempDir::new().unwrap();

        let err = App::from_directory(temp_dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("quire init"));
    }

    #[tokio::test]
    async fn test_app_save_writes_new_issue() {
        let temp_dir = initialized().await;
        let mut app = App::from_directory(temp_dir.path()).await.unwrap();
        let context = app.project().issue_context("Ann <ann@example.com>");
        let issue = Issue::create(
            &FieldValues::new()
                .with("title", "Crash on empty input")
                .with("desc", "")
                .with("type", "bugfix"),
            &context,
            None,
        )
        .unwrap();
        app.project_mut().add_issue(issue).unwrap();

        let report = app.save().await.unwrap();
        assert_eq!(report.issues_written.len(), 1);

        let reloaded = App::from_directory(temp_dir.path()).await.unwrap();
        assert_eq!(reloaded.project().issues()[0].name(), "core-1");
    }
}
