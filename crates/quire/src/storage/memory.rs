//! In-memory backend.

use super::Backend;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use tokio::sync::Mutex;

/// A directory held in a map, shared behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: Mutex<BTreeMap<String, String>>,
}

impl MemoryBackend {
    /// An empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of every file, by name.
    pub async fn snapshot(&self) -> BTreeMap<String, String> {
        self.files.lock().await.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn path_of(&self, name: &str) -> PathBuf {
        PathBuf::from(name)
    }

    async fn read(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.files.lock().await.get(name).cloned())
    }

    async fn write(&self, name: &str, contents: &str) -> quire_record::Result<()> {
        self.files
            .lock()
            .await
            .insert(name.to_string(), contents.to_string());
        Ok(())
    }

    async fn remove(&self, name: &str) -> io::Result<bool> {
        Ok(self.files.lock().await.remove(name).is_some())
    }

    async fn list(&self) -> io::Result<Vec<String>> {
        Ok(self.files.lock().await.keys().cloned().collect())
    }
}
