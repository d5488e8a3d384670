//! Versioned harvesting configuration.
//!
//! The site origin, URL templates, page ranges, extraction patterns and the
//! ingredient-name substitution table all live in one YAML document. A copy of
//! `config/cook4me.yaml` is embedded in the binary and used unless `--config`
//! points somewhere else. The document is loaded once at start-up and handed
//! to each component explicitly.

use crate::error::{HarvestError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// The only schema version this build understands.
pub const CONFIG_VERSION: u32 = 1;

const EMBEDDED_CONFIG: &str = include_str!("../config/cook4me.yaml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarvestConfig {
    pub version: u32,
    pub site: SiteConfig,
    pub extract: ExtractConfig,
    pub normalizer: NormalizerConfig,
}

/// Where to fetch from.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Origin every path and image source is resolved against.
    pub base_url: String,
    /// Listing page path, `{page}` is replaced by the page number.
    pub listing_path: String,
    /// Detail page path, `{id}` is replaced by the recipe identifier.
    pub detail_path: String,
    pub listing_pages: IdRange,
    /// Identifiers harvested when the CLI names none.
    pub default_ids: IdRange,
}

/// Half-open `start..end` range of page numbers or identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdRange {
    pub start: u32,
    pub end: u32,
}

impl IdRange {
    pub fn iter(&self) -> std::ops::Range<u32> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Field-level parsing conventions of the detail pages.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractConfig {
    /// Separates a label from its value in the summary list, e.g. `ジャンル：和風`.
    pub field_separator: char,
    /// Everything from this character on is dropped from the comment.
    pub comment_terminator: char,
    /// Precedes an uppercase marking in an ingredient name.
    pub marking_marker: char,
    /// One capture group: preparation minutes.
    pub prep_duration_pattern: String,
    /// One capture group: number of people served.
    pub yield_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Rule {
    pub from: String,
    pub to: String,
}

/// Substitution data for ingredient names.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NormalizerConfig {
    /// Collapses a double parenthetical into one.
    pub joiner: Rule,
    /// Maps alternate bracket characters onto the canonical style.
    pub brackets: Vec<Rule>,
    /// Known misspellings and variant spellings, applied in order.
    pub replacements: Vec<Rule>,
}

impl HarvestConfig {
    /// The configuration shipped with the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_CONFIG)
    }

    /// Load from `path`, or fall back to the embedded document.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p).map_err(|e| HarvestError::io(p, e))?;
                Self::from_yaml(&text)?
            }
            None => Self::embedded()?,
        };
        info!(
            version = config.version,
            base_url = %config.site.base_url,
            replacements = config.normalizer.replacements.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: HarvestConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(HarvestError::InvalidConfig(format!(
                "unsupported config version {} (expected {CONFIG_VERSION})",
                self.version
            )));
        }
        self.site.base()?;
        if !self.site.listing_path.contains("{page}") {
            return Err(HarvestError::InvalidConfig(
                "site.listing_path must contain {page}".into(),
            ));
        }
        if !self.site.detail_path.contains("{id}") {
            return Err(HarvestError::InvalidConfig(
                "site.detail_path must contain {id}".into(),
            ));
        }
        if self.site.listing_pages.is_empty() {
            return Err(HarvestError::InvalidConfig("site.listing_pages is empty".into()));
        }
        if self.site.default_ids.is_empty() {
            return Err(HarvestError::InvalidConfig("site.default_ids is empty".into()));
        }
        compile_pattern("extract.prep_duration_pattern", &self.extract.prep_duration_pattern)?;
        compile_pattern("extract.yield_pattern", &self.extract.yield_pattern)?;

        let n = &self.normalizer;
        let mut rules = std::iter::once(&n.joiner)
            .chain(n.brackets.iter())
            .chain(n.replacements.iter());
        if let Some(bad) = rules.find(|r| r.from.is_empty()) {
            return Err(HarvestError::InvalidConfig(format!(
                "normalizer rule with empty `from` (to = {:?})",
                bad.to
            )));
        }
        Ok(())
    }
}

impl SiteConfig {
    pub fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|source| HarvestError::InvalidUrl {
            url: self.base_url.clone(),
            source,
        })
    }

    pub fn listing_url(&self, page: u32) -> String {
        self.join_path(&self.listing_path.replace("{page}", &page.to_string()))
    }

    pub fn detail_url(&self, id: u32) -> String {
        self.join_path(&self.detail_path.replace("{id}", &id.to_string()))
    }

    fn join_path(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Compile a pattern that must expose exactly one capture group.
pub fn compile_pattern(name: &str, pattern: &str) -> Result<Regex> {
    let re = Regex::new(pattern)
        .map_err(|e| HarvestError::InvalidConfig(format!("{name}: {e}")))?;
    if re.captures_len() != 2 {
        return Err(HarvestError::InvalidConfig(format!(
            "{name} must have exactly one capture group"
        )));
    }
    Ok(re)
}
