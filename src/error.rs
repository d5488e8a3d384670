//! Error taxonomy for the harvesting pipeline.
//!
//! Every stage returns [`HarvestError`]. Per-record failures are wrapped in
//! [`HarvestError::Record`] so the run summary can name the offending
//! identifier.

use std::path::PathBuf;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Errors that can occur while harvesting recipes.
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// A page or image could not be fetched.
    #[error("network error fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// An expected markup element or attribute is absent.
    #[error("structural mismatch: {what}")]
    StructuralMismatch { what: String },

    /// Numeric text did not match the expected pattern.
    #[error("cannot parse {field} from {text:?}")]
    Parse { field: &'static str, text: String },

    /// An ingredient name opens a parenthetical that never closes.
    #[error("unbalanced parenthesis in ingredient name {name:?}")]
    UnbalancedParenthesis { name: String },

    /// An ingredient name continues after its parenthetical, e.g. `塩（少々）適量`.
    #[error("text after parenthetical in ingredient name {name:?}")]
    TextAfterParenthetical { name: String },

    /// A file could not be read, written or renamed.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A run finished with per-record failures.
    #[error("{failed} of {total} records failed")]
    Incomplete { failed: usize, total: usize },

    /// A failure tied to one recipe identifier.
    #[error("recipe {id}: {source}")]
    Record {
        id: u32,
        #[source]
        source: Box<HarvestError>,
    },
}

impl HarvestError {
    pub fn missing(what: impl Into<String>) -> Self {
        HarvestError::StructuralMismatch { what: what.into() }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HarvestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Identifier of the recipe this error belongs to, if any.
    pub fn record_id(&self) -> Option<u32> {
        match self {
            HarvestError::Record { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Attach a recipe identifier to this error.
    pub fn for_record(self, id: u32) -> Self {
        match self {
            already @ HarvestError::Record { .. } => already,
            other => HarvestError::Record {
                id,
                source: Box::new(other),
            },
        }
    }
}
