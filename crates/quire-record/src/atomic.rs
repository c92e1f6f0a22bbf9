//! Whole-file replacement.
//!
//! Record files are never updated in place. The new contents are written to
//! a sibling with a `.tmp` extension, flushed, and renamed over the target,
//! so a crash leaves either the old file or the new one.

use crate::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Replace the file at `path` with `contents`.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be written or the rename
/// fails. On failure the original file is untouched and the temporary file
/// is removed on a best-effort basis.
pub async fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, contents).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// `issue-x.yaml` becomes `issue-x.yaml.tmp`; a bare `name` becomes `name.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file(temp_path: &Path, contents: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::create(temp_path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case::yaml("/bugs/project.yaml", "/bugs/project.yaml.tmp")]
    #[case::bare("/bugs/project", "/bugs/project.tmp")]
    #[case::relative("issue-ab12.yaml", "issue-ab12.yaml.tmp")]
    fn temp_path_appends_tmp(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(make_temp_path(Path::new(path)), Path::new(expected));
    }

    #[tokio::test]
    async fn replaces_existing_contents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("project.yaml");
        tokio::fs::write(&target, "old: true\n").await.unwrap();

        write_atomic(&target, b"new: true\n").await.unwrap();

        let contents = tokio::fs::read_to_string(&target).await.unwrap();
        assert_eq!(contents, "new: true\n");
        assert!(!dir.path().join("project.yaml.tmp").exists());
    }

    #[tokio::test]
    async fn missing_directory_fails_without_leaving_temp_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("absent").join("project.yaml");

        assert!(write_atomic(&target, b"x").await.is_err());
        assert!(!target.exists());
    }
}
