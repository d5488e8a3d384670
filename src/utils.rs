//! File system helpers.

use crate::error::{HarvestError, Result};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a scratch file so
/// permission problems surface before any page is fetched.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| HarvestError::io(path, e))?;
    let scratch = path.join("..__write_check__");
    fs::write(&scratch, b"")
        .await
        .map_err(|e| HarvestError::io(&scratch, e))?;
    let _ = fs::remove_file(&scratch).await;
    info!("Output directory is writable");
    Ok(())
}

/// Directory a file path will be written into; `.` for bare file names.
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b");
        ensure_writable_dir(&target).await.unwrap();
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir(Path::new("recipes.json")), Path::new("."));
        assert_eq!(parent_dir(Path::new("out/recipes.json")), Path::new("out"));
    }
}
