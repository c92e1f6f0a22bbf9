//! Directory-on-disk backend.

use super::Backend;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Files in one directory, replaced atomically on write.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// A backend over `dir`. The directory is not created until written to.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn path_of(&self, name: &str) -> PathBuf {
        if name.is_empty() {
            self.dir.clone()
        } else {
            self.dir.join(name)
        }
    }

    async fn read(&self, name: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.dir.join(name)).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, name: &str, contents: &str) -> quire_record::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        quire_record::write_atomic(self.dir.join(name), contents.as_bytes()).await
    }

    async fn remove(&self, name: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list(&self) -> io::Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_files_read_as_none() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("bugs"));

        assert_eq!(backend.read("project.yaml").await.unwrap(), None);
        assert!(!backend.remove("project.yaml").await.unwrap());
        assert!(backend.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn write_creates_directory_and_replaces_contents() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().join("bugs"));

        backend.write("a.yaml", "first").await.unwrap();
        backend.write("a.yaml", "second").await.unwrap();

        assert_eq!(backend.read("a.yaml").await.unwrap().as_deref(), Some("second"));
        assert_eq!(backend.list().await.unwrap(), vec!["a.yaml".to_string()]);
        assert!(backend.remove("a.yaml").await.unwrap());
        assert!(backend.list().await.unwrap().is_empty());
    }
}
