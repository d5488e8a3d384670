//! JSON collection output.
//!
//! The collection is a single flat array of [`Recipe`] records, UTF-8 with
//! non-ASCII text left unescaped, regenerated from scratch on every run.

use super::write_atomic;
use crate::error::{HarvestError, Result};
use crate::models::Recipe;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `recipes` and replace the file at `path`.
///
/// # Arguments
///
/// * `recipes` - Records to write, already in identifier order
/// * `path` - Destination file; missing parent directories are created
///
/// # Returns
///
/// `Ok(())` once the new file has been renamed into place. A failed write
/// leaves any previous collection untouched.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = recipes.len()))]
pub async fn write_recipes(recipes: &[Recipe], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| HarvestError::io(parent, e))?;
    }
    let json = serde_json::to_vec(recipes)?;
    write_atomic(path, &json).await?;
    info!("Wrote recipe collection");
    Ok(())
}

/// Read a collection previously written by [`write_recipes`].
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn read_recipes(path: &Path) -> Result<Vec<Recipe>> {
    let bytes = fs::read(path).await.map_err(|e| HarvestError::io(path, e))?;
    let recipes: Vec<Recipe> = serde_json::from_slice(&bytes)?;
    info!(count = recipes.len(), "Read recipe collection");
    Ok(recipes)
}
