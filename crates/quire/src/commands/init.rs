//! Implementation of the `init` command.
//!
//! Initializing a repository writes `.quire.yaml` at its root and an empty
//! project into the configured issue directory.

use crate::config::{CONFIG_FILE_NAME, Config};
use crate::domain::Project;
use crate::error::{ConfigError, Result};
use crate::storage::{FileBackend, FileStore, PROJECT_FILE_NAME, ProjectStore};
use std::path::{Path, PathBuf};
use tracing::info;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created configuration file
    pub config_file: PathBuf,
    /// Path to the created issue directory
    pub issue_dir: PathBuf,
    /// Path to the created project file
    pub project_file: PathBuf,
    /// Name of the new project
    pub project: String,
}

/// Initialize a new quire repository in the given directory.
///
/// # Arguments
///
/// * `root` - The repository root, where `.quire.yaml` will be created
/// * `config` - Who is acting and where the issue files go
/// * `project` - The project to store, usually with its components
///
/// # Errors
///
/// Returns an error if:
/// - The directory already has a `.quire.yaml`
/// - File system operations fail
pub async fn init(root: &Path, mut config: Config, mut project: Project) -> Result<InitResult> {
    let config_file = root.join(CONFIG_FILE_NAME);
    if config_file.exists() {
        return Err(ConfigError::AlreadyInitialized(config_file).into());
    }

    let issue_dir = config.issue_path(root);
    tokio::fs::create_dir_all(&issue_dir)
        .await
        .map_err(ConfigError::from)?;

    config.save(root).await?;
    FileStore::new(FileBackend::new(&issue_dir))
        .save(&mut project)
        .await?;

    info!(root = %root.display(), project = project.name(), "initialized repository");
    Ok(InitResult {
        config_file,
        project_file: issue_dir.join(PROJECT_FILE_NAME),
        issue_dir,
        project: project.name().to_string(),
    })
}

/// Check if a directory has been initialized with quire.
///
/// Returns `true` if the directory contains a `.quire.yaml`.
#[must_use]
pub fn is_initialized(root: &Path) -> bool {
    root.join(CONFIG_FILE_NAME).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Component;
    use crate::storage;
    use tempfile::TempDir;

    fn demo_project() -> Project {
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("core").unwrap()).unwrap();
        project
    }

    fn config() -> Config {
        Config::new("Ann", "ann@example.com").unwrap()
    }

    // ========== Init Command Tests ==========

    #[tokio::test]
    async fn test_init_creates_repository_layout() {
        let temp_dir = TempDir::new().unwrap();

        let result = init(temp_dir.path(), config(), demo_project())
            .await
            .unwrap();

        assert!(result.config_file.is_file());
        assert!(result.issue_dir.is_dir());
        assert!(result.project_file.is_file());
        assert_eq!(result.issue_dir, temp_dir.path().join("bugs"));
        assert_eq!(result.project, "demo");
    }

    #[tokio::test]
    async fn test_init_project_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let result = init(temp_dir.path(), config(), demo_project())
            .await
            .unwrap();

        let loaded = storage::load(&result.issue_dir).await.unwrap();
        assert_eq!(loaded.project.name(), "demo");
        assert_eq!(loaded.project.components().len(), 1);
        assert!(loaded.project.issues().is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();

        init(temp_dir.path(), config(), demo_project())
            .await
            .unwrap();

        let result = init(temp_dir.path(), config(), demo_project()).await;
        let err_msg = result.unwrap_err().to_string().to_lowercase();
        assert!(err_msg.contains("already initialized"));
    }

    // ========== Utility Function Tests ==========

    #[tokio::test]
    async fn test_is_initialized() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_initialized(temp_dir.path()));

        init(temp_dir.path(), config(), demo_project())
            .await
            .unwrap();
        assert!(is_initialized(temp_dir.path()));
    }
}
