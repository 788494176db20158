// Scraper error taxonomy: fetch failures and parse failures. Lookup misses are not errors.

use std::path::PathBuf;

/// Errors that fail a single scraper. Other scrapers and the system snapshot are unaffected.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// HTTP transport failure, including the request timeout.
    #[error("fetch failed: HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed: cannot read {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed JSON document, or one whose top level is not an object.
    #[error("parse failed: invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// Raw pattern or filter pattern rejected when the scraper was built.
    #[error("parse failed: invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
}

impl ScrapeError {
    pub fn is_fetch(&self) -> bool {
        matches!(self, ScrapeError::Http(_) | ScrapeError::File { .. })
    }

    pub fn is_parse(&self) -> bool {
        !self.is_fetch()
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
