//! Listing-page indexer.
//!
//! Each category listing page links its recipes like
//! `<div class="recipe_item"><p class="text"><a href="/recipe/detail/1469/">野菜の肉巻き</a></p></div>`.
//! The identifier is the second-to-last path segment of the link target.

use super::text_of;
use crate::config::SiteConfig;
use crate::error::{HarvestError, Result};
use crate::fetch::PageSource;
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument};

static ENTRY_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.recipe_item p.text a").expect("valid entry link selector"));

/// Extract every recipe identifier linked from one listing page.
///
/// A page without a single entry link is a structural mismatch: the site
/// layout changed or the page number is past the end.
pub fn extract_ids(document: &Html) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for link in document.select(&ENTRY_LINK) {
        let href = link
            .value()
            .attr("href")
            .ok_or_else(|| HarvestError::missing(format!("href on entry link {:?}", text_of(link))))?;
        ids.push(id_from_href(href)?);
    }
    if ids.is_empty() {
        return Err(HarvestError::missing("div.recipe_item p.text a"));
    }
    Ok(ids)
}

fn id_from_href(href: &str) -> Result<u32> {
    let segments: Vec<&str> = href.split('/').collect();
    let candidate = segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .copied()
        .unwrap_or_default();
    candidate.parse().map_err(|_| HarvestError::Parse {
        field: "recipe id",
        text: href.to_string(),
    })
}

/// Walk the configured listing pages and collect recipe identifiers.
///
/// # Arguments
///
/// * `source` - Where listing pages are fetched from
/// * `site` - Base URL, listing path template and page range
///
/// # Returns
///
/// The sorted, deduplicated union of identifiers across all pages.
///
/// # Errors
///
/// Any page failure aborts the walk, including a page with no entry links.
#[instrument(level = "info", skip_all, fields(pages = ?site.listing_pages))]
pub async fn collect_ids<S: PageSource>(source: &S, site: &SiteConfig) -> Result<Vec<u32>> {
    let mut ids = Vec::new();
    for page in site.listing_pages.iter() {
        let url = site.listing_url(page);
        let document = source.fetch_document(&url).await?;
        let page_ids = extract_ids(&document)?;
        debug!(page, count = page_ids.len(), %url, "Indexed listing page");
        ids.extend(page_ids);
    }

    let ids: Vec<u32> = ids.into_iter().sorted_unstable().dedup().collect();
    info!(count = ids.len(), "Collected recipe identifiers");
    Ok(ids)
}
