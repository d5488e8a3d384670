//! Recipe photo downloader.
//!
//! Reads nothing but the collection: every record with an image URL gets its
//! photo written to `<image_dir>/<id>.jpg`. Files that already exist are
//! fetched and replaced again.

use super::write_atomic;
use crate::error::{HarvestError, Result};
use crate::fetch::PageSource;
use crate::harvest::{PoolOptions, RunReport, run_pool};
use crate::models::Recipe;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Destination file for a recipe's photo.
pub fn image_path(image_dir: &Path, id: u32) -> PathBuf {
    image_dir.join(format!("{id}.jpg"))
}

/// Download the photo of every recipe that has one.
///
/// # Arguments
///
/// * `source` - Where image bytes are fetched from
/// * `recipes` - Collection read back from the harvest phase
/// * `image_dir` - Directory receiving `<id>.jpg` files, created if missing
/// * `opts` - Worker count and failure policy
///
/// # Returns
///
/// A [`RunReport`] with the written paths in identifier order. Records with
/// an empty `img_url` are skipped with a warning and appear in neither list.
#[instrument(level = "info", skip_all, fields(dir = %image_dir.display(), count = recipes.len()))]
pub async fn download_images<S: PageSource>(
    source: &S,
    recipes: &[Recipe],
    image_dir: &Path,
    opts: PoolOptions,
) -> Result<RunReport<PathBuf>> {
    fs::create_dir_all(image_dir)
        .await
        .map_err(|e| HarvestError::io(image_dir, e))?;

    let urls: HashMap<u32, &str> = recipes
        .iter()
        .filter(|r| {
            let has_url = !r.img_url.trim().is_empty();
            if !has_url {
                warn!(id = r.id, "Recipe has no image URL; skipping");
            }
            has_url
        })
        .map(|r| (r.id, r.img_url.as_str()))
        .collect();
    let mut ids: Vec<u32> = urls.keys().copied().collect();
    ids.sort_unstable();

    let urls = &urls;
    run_pool(&ids, opts, |id| async move {
        let url = urls
            .get(&id)
            .copied()
            .ok_or_else(|| HarvestError::missing("image url"))?;
        let bytes = source.fetch_bytes(url).await?;
        let path = image_path(image_dir, id);
        write_atomic(&path, &bytes).await?;
        info!(id, bytes = bytes.len(), path = %path.display(), "Saved image");
        Ok::<_, HarvestError>(path)
    })
    .await
}
