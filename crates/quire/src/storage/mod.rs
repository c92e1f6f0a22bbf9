//! File-backed persistence for the entity graph.
//!
//! A project is stored as one descriptor file, [`PROJECT_FILE_NAME`], plus
//! one `issue-<id>.yaml` per issue, all in the same directory. File names
//! depend only on ids, so version control sees stable paths across runs.
//!
//! Saving is incremental: the project file is rewritten only when the
//! project or a record stored inside it (a release or component) is dirty,
//! and only dirty issues are rewritten. Every write replaces the whole file.
//!
//! # Backends
//!
//! [`Store`] holds the load/save logic and talks to a [`Backend`] that reads
//! and writes named text files:
//!
//! - [`FileBackend`]: a directory on disk, with atomic replacement
//! - [`MemoryBackend`]: a map in memory, for tests and embedding
//!
//! # Example
//!
//! ```no_run
//! use quire::storage::{ProjectStore, StorageBackend, create_storage};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_storage(StorageBackend::File("bugs".into()));
//!     let mut loaded = store.load().await?;
//!     let issue = loaded.project.issue_for_mut("core-1")?;
//!     issue.start_work("Ann <ann@example.com>", None)?;
//!     let report = store.save(&mut loaded.project).await?;
//!     assert_eq!(report.issues_written.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::domain::{Issue, Project};
use crate::error::{PersistenceError, Result};
use async_trait::async_trait;
use quire_record::{Decoded, DecodeWarning, Node};
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

/// Name of the project descriptor file.
pub const PROJECT_FILE_NAME: &str = "project.yaml";

static ISSUE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^issue-(\w+)\.yaml$").expect("issue file pattern is valid"));

/// File name of the issue with this id.
#[must_use]
pub fn issue_file_name(id: &str) -> String {
    format!("issue-{id}.yaml")
}

/// Named text files in one directory.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Where a file lives, for messages.
    fn path_of(&self, name: &str) -> PathBuf;

    /// Contents of a file, or `None` if it does not exist.
    async fn read(&self, name: &str) -> io::Result<Option<String>>;

    /// Replace a file's contents.
    async fn write(&self, name: &str, contents: &str) -> quire_record::Result<()>;

    /// Remove a file. Returns whether it existed.
    async fn remove(&self, name: &str) -> io::Result<bool>;

    /// Names of all files.
    async fn list(&self) -> io::Result<Vec<String>>;
}

/// A decode repair, with the file it happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// The file.
    pub path: PathBuf,
    /// What was repaired.
    pub warning: DecodeWarning,
}

/// A loaded project and the repairs made while loading it.
#[derive(Debug)]
pub struct LoadedProject {
    /// The project with its issues attached, clean.
    pub project: Project,
    /// Unknown keys skipped and collections repaired, per file.
    pub warnings: Vec<LoadWarning>,
}

/// What a save wrote and removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Whether the project file was rewritten.
    pub project_written: bool,
    /// Ids of the issues whose files were rewritten.
    pub issues_written: Vec<String>,
    /// Ids of the issues whose files were removed.
    pub issues_deleted: Vec<String>,
}

impl SaveReport {
    /// True when nothing was written or removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.project_written && self.issues_written.is_empty() && self.issues_deleted.is_empty()
    }
}

/// Loads and saves a whole project.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Read the project file and every issue file, and attach the issues.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::MissingProject`] if there is no project
    /// file, and [`PersistenceError::Load`] if a file does not decode as
    /// the expected record type.
    async fn load(&self) -> Result<LoadedProject>;

    /// Write what changed since the last load or save, remove the files
    /// of dropped issues, and mark everything clean.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::Write`] or [`PersistenceError::Remove`].
    /// Files written before the failure stay written.
    async fn save(&self, project: &mut Project) -> Result<SaveReport>;
}

/// Where a [`create_storage`] store keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// A directory on disk.
    File(PathBuf),
    /// An empty in-memory directory.
    InMemory,
}

/// Create a store for the given backend.
#[must_use]
pub fn create_storage(backend: StorageBackend) -> Box<dyn ProjectStore> {
    match backend {
        StorageBackend::File(dir) => Box::new(Store::new(FileBackend::new(dir))),
        StorageBackend::InMemory => Box::new(Store::new(MemoryBackend::new())),
    }
}

/// Load the project stored in `dir`.
///
/// # Errors
///
/// As [`ProjectStore::load`].
pub async fn load(dir: &Path) -> Result<LoadedProject> {
    Store::new(FileBackend::new(dir)).load().await
}

/// The store over a backend.
#[derive(Debug)]
pub struct Store<B> {
    backend: B,
}

/// A store over a directory on disk.
pub type FileStore = Store<FileBackend>;

/// A store held in memory.
pub type MemoryStore = Store<MemoryBackend>;

impl<B: Backend> Store<B> {
    /// A store over `backend`.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Read a file that must exist. A missing project file is reported as
    /// such; a missing issue file (removed after listing) is a load error.
    async fn read_required(&self, name: &str) -> Result<(PathBuf, String)> {
        let path = self.backend.path_of(name);
        let source = match self.backend.read(name).await {
            Ok(Some(text)) => return Ok((path, text)),
            Ok(None) if name == PROJECT_FILE_NAME => {
                return Err(PersistenceError::MissingProject(path).into());
            }
            Ok(None) => io::Error::new(io::ErrorKind::NotFound, "file disappeared after listing"),
            Err(source) => source,
        };
        Err(PersistenceError::Load {
            source: quire_record::Error::Read {
                path: path.clone(),
                source,
            },
            path,
        }
        .into())
    }

    async fn load_issues(&self, warnings: &mut Vec<LoadWarning>) -> Result<Vec<Issue>> {
        let dir = self.backend.path_of("");
        let mut names = self
            .backend
            .list()
            .await
            .map_err(|source| PersistenceError::List { path: dir, source })?;
        names.retain(|name| ISSUE_FILE.is_match(name));
        names.sort();

        let mut issues = Vec::with_capacity(names.len());
        for name in names {
            let (path, text) = self.read_required(&name).await?;
            let Decoded {
                record: issue,
                warnings: found,
            } = decode_at::<Issue>(&path, &text)?;
            if issue_file_name(issue.id()) != name {
                warn!(path = %path.display(), id = issue.id(), "issue file name does not match its id");
            }
            warnings.extend(found.into_iter().map(|warning| LoadWarning {
                path: path.clone(),
                warning,
            }));
            issues.push(issue);
        }
        Ok(issues)
    }
}

fn decode_at<R: quire_record::Record>(path: &Path, text: &str) -> Result<Decoded<R>> {
    quire_record::decode(text).map_err(|e| {
        PersistenceError::Load {
            path: path.to_path_buf(),
            source: e.at_path(path),
        }
        .into()
    })
}

#[async_trait]
impl<B: Backend> ProjectStore for Store<B> {
    async fn load(&self) -> Result<LoadedProject> {
        let (path, text) = self.read_required(PROJECT_FILE_NAME).await?;
        let Decoded {
            record: mut project,
            warnings: found,
        } = decode_at::<Project>(&path, &text)?;
        let mut warnings: Vec<LoadWarning> = found
            .into_iter()
            .map(|warning| LoadWarning {
                path: path.clone(),
                warning,
            })
            .collect();

        let issues = self.load_issues(&mut warnings).await?;
        let count = issues.len();
        project.attach_issues(issues)?;
        debug!(project = project.name(), issues = count, "loaded project");
        Ok(LoadedProject { project, warnings })
    }

    async fn save(&self, project: &mut Project) -> Result<SaveReport> {
        let mut report = SaveReport::default();

        if quire_record::file_is_dirty(&*project) {
            let path = self.backend.path_of(PROJECT_FILE_NAME);
            let text = quire_record::encode(&mut *project).map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;
            self.backend
                .write(PROJECT_FILE_NAME, &text)
                .await
                .map_err(|source| PersistenceError::Write { path, source })?;
            report.project_written = true;
        }

        for issue in project.issues_mut() {
            if !issue.is_dirty() {
                continue;
            }
            let name = issue_file_name(issue.id());
            let path = self.backend.path_of(&name);
            let text = quire_record::encode(&mut *issue).map_err(|source| PersistenceError::Write {
                path: path.clone(),
                source,
            })?;
            self.backend
                .write(&name, &text)
                .await
                .map_err(|source| PersistenceError::Write { path, source })?;
            debug!(issue = issue.name(), "wrote issue");
            report.issues_written.push(issue.id().to_string());
        }

        let deleted: Vec<String> = project
            .deleted_issues()
            .iter()
            .map(|issue| issue.id().to_string())
            .collect();
        for id in deleted {
            let name = issue_file_name(&id);
            match self.backend.remove(&name).await {
                Ok(true) => debug!(id = %id, "removed issue file"),
                Ok(false) => debug!(id = %id, "issue was never saved; nothing to remove"),
                Err(source) => {
                    return Err(PersistenceError::Remove {
                        path: self.backend.path_of(&name),
                        source,
                    }
                    .into());
                }
            }
            report.issues_deleted.push(id);
        }

        project.mark_saved();
        debug!(
            project_written = report.project_written,
            issues_written = report.issues_written.len(),
            issues_deleted = report.issues_deleted.len(),
            "saved project"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Component;
    use crate::error::Error;

    /// Lists one issue file more than it can read.
    struct VanishingBackend {
        inner: MemoryBackend,
    }

    #[async_trait]
    impl Backend for VanishingBackend {
        fn path_of(&self, name: &str) -> PathBuf {
            self.inner.path_of(name)
        }

        async fn read(&self, name: &str) -> io::Result<Option<String>> {
            self.inner.read(name).await
        }

        async fn write(&self, name: &str, contents: &str) -> quire_record::Result<()> {
            self.inner.write(name, contents).await
        }

        async fn remove(&self, name: &str) -> io::Result<bool> {
            self.inner.remove(name).await
        }

        async fn list(&self) -> io::Result<Vec<String>> {
            let mut names = self.inner.list().await?;
            names.push(issue_file_name("gone"));
            Ok(names)
        }
    }

    #[test]
    fn issue_file_names_match_pattern() {
        let name = issue_file_name("0123abcd");
        assert_eq!(name, "issue-0123abcd.yaml");
        assert!(ISSUE_FILE.is_match(&name));
        assert!(!ISSUE_FILE.is_match(PROJECT_FILE_NAME));
        assert!(!ISSUE_FILE.is_match("issue-0123abcd.yaml.tmp"));
    }

    #[test]
    fn empty_report() {
        assert!(SaveReport::default().is_empty());
        let report = SaveReport {
            project_written: true,
            ..SaveReport::default()
        };
        assert!(!report.is_empty());
    }

    #[tokio::test]
    async fn vanished_issue_file_is_a_load_error() {
        let store = Store::new(VanishingBackend {
            inner: MemoryBackend::new(),
        });
        let mut project = Project::new("demo").unwrap();
        project.add_component(Component::new("core").unwrap()).unwrap();
        store.save(&mut project).await.unwrap();

        let err = store.load().await.unwrap_err();
        match err {
            Error::Persistence(PersistenceError::Load { path, source }) => {
                assert_eq!(path, PathBuf::from(issue_file_name("gone")));
                assert!(matches!(
                    source,
                    quire_record::Error::Read { ref source, .. }
                        if source.kind() == io::ErrorKind::NotFound
                ));
            }
            other => panic!("expected a load error, got {other:?}"),
        }
    }
}
