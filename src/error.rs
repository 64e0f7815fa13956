//! Error types for catalog generation and enrichment

use std::fmt;

/// Unified error type for API, cache and I/O operations
#[derive(Debug)]
pub enum CatalogError {
    /// HTTP request failed (network error, timeout, etc.)
    Network(reqwest::Error),
    /// Failed to parse JSON response
    Parse(serde_json::Error),
    /// HTTP error status code
    HttpStatus(reqwest::StatusCode),
    /// File I/O error
    Io(std::io::Error),
    /// CSV parsing error
    Csv(csv::Error),
    /// Network or disk error while populating the image cache
    ImageDownloadFailed(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Network(e) => write!(f, "Network error: {}", e),
            CatalogError::Parse(e) => write!(f, "Parse error: {}", e),
            CatalogError::HttpStatus(status) => write!(f, "HTTP error: {}", status),
            CatalogError::Io(e) => write!(f, "I/O error: {}", e),
            CatalogError::Csv(e) => write!(f, "CSV error: {}", e),
            CatalogError::ImageDownloadFailed(detail) => {
                write!(f, "Image download failed: {}", detail)
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Network(e) => Some(e),
            CatalogError::Parse(e) => Some(e),
            CatalogError::Io(e) => Some(e),
            CatalogError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err)
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<csv::Error> for CatalogError {
    fn from(err: csv::Error) -> Self {
        CatalogError::Csv(err)
    }
}

/// Result alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Why a collection entry could not be enriched with an image.
///
/// Every per-entry failure inside the enrichment pipeline collapses to one
/// of these; none of them abort the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailReason {
    /// Basic energy cards have no entry in the external catalog
    NotEnrichable,
    /// The set/console name could not be mapped to a set code
    SetNotFound(String),
    /// No card in the set matched the entry's name/number
    CardNotFound(String),
    /// The card matched but its image could not be downloaded
    ImageDownloadFailed(String),
    /// The entry's resolution chain exceeded its allotted time
    Timeout,
}

impl fmt::Display for FailReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailReason::NotEnrichable => write!(f, "not enrichable (basic energy)"),
            FailReason::SetNotFound(name) => write!(f, "set not found: {}", name),
            FailReason::CardNotFound(name) => write!(f, "card not found: {}", name),
            FailReason::ImageDownloadFailed(detail) => {
                write!(f, "image download failed: {}", detail)
            }
            FailReason::Timeout => write!(f, "timed out"),
        }
    }
}

