//! Output writers for the harvested collection.
//!
//! # Submodules
//!
//! - [`json`]: writes and reads back the `recipes.json` collection
//! - [`images`]: downloads one `<id>.jpg` per recipe
//!
//! Both write through [`write_atomic`]: the bytes land in a sibling `.tmp`
//! file that is renamed over the destination once complete, so an
//! interrupted run never leaves a truncated file behind.
//!
//! ```text
//! recipes.json
//! imgs/
//! ├── 1429.jpg
//! ├── 1430.jpg
//! └── ...
//! ```

pub mod images;
pub mod json;

use crate::error::{HarvestError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Write `bytes` to `path` via a temporary sibling and a rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);
    if let Err(e) = fs::write(&tmp, bytes).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(HarvestError::io(&tmp, e));
    }
    fs::rename(&tmp, path)
        .await
        .map_err(|e| HarvestError::io(path, e))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
