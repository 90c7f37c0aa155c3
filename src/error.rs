//! Error types shared across the scanner.
//!
//! Field-level recognition problems are never errors; they become
//! [`FieldResult`](crate::scan::FieldResult) sentinels. The types here cover
//! infrastructure failures: the engine pool, the OCR process, catalog data and
//! screen capture.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Failed to encode image for OCR: {0}")]
    ImageEncode(#[from] image::ImageError),
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("OCR resource not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Timed out waiting for an OCR engine after {0}ms")]
    Timeout(u64),
    #[error("Engine checkout cancelled")]
    Cancelled,
    #[error("Engine pool is closed")]
    Closed,
    #[error("Failed to create OCR engine: {0}")]
    Engine(#[from] OcrError),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Required catalog entry '{0}' is missing")]
    MissingEntry(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("Invalid text pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Could not read item count from '{0}'")]
    MalformedCount(String),
    #[error("Screen capture failed: {0}")]
    Capture(String),
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Whether the whole session must stop rather than just the current card.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::Catalog(_)
                | ScanError::Cancelled
                | ScanError::Capture(_)
                | ScanError::Pool(PoolError::Closed | PoolError::Cancelled)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_entry_is_fatal() {
        let err = ScanError::from(CatalogError::MissingEntry("traveler".into()));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Required catalog entry 'traveler' is missing");
    }

    #[test]
    fn test_engine_failure_is_not_fatal() {
        assert!(!ScanError::from(OcrError::Engine("boom".into())).is_fatal());
        assert!(!ScanError::from(PoolError::Timeout(50)).is_fatal());
        assert!(ScanError::from(PoolError::Closed).is_fatal());
    }
}
