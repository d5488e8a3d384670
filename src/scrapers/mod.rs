//! Scrapers for the two page kinds of the recipe site.
//!
//! Harvesting follows a two-phase pattern:
//!
//! 1. **Indexing** ([`listing`]): walk the paginated category listing and
//!    collect recipe identifiers from the entry links
//! 2. **Extraction** ([`detail`]): turn one detail page into a [`Recipe`]
//!
//! Both work on an already parsed [`scraper::Html`] document; fetching is the
//! job of [`crate::fetch::PageSource`].
//!
//! [`Recipe`]: crate::models::Recipe

pub mod detail;
pub mod listing;

use scraper::ElementRef;

/// Concatenated text content of an element.
pub(crate) fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect()
}
