#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Published sheet fetching, CSV parsing, and last-wins data loading.
//!
//! Each place rows can come from implements the [`SheetSource`] trait.
//! [`loader::DataLoader`] turns a source into a converted
//! [`sheet_map_sheet_models::FeatureCollection`], dropping results of loads
//! that were overtaken by a newer one.

pub mod csv_rows;
pub mod loader;
pub mod sheets;

use std::path::Path;

use async_trait::async_trait;
use sheet_map_convert::ConvertError;
use sheet_map_sheet_models::RawRow;

/// Errors retrieving the source document.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    Status {
        /// Response status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The source URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The document is not valid CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error reading a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document has no header row.
    #[error("Document contains no header row")]
    NoHeader,
}

/// A failed load: the fetch failed or the rows could not be converted.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Retrieving the document failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The rows could not be converted.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Trait that every origin of sheet rows implements.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Returns an identifier for log messages (id, URL, or path).
    fn id(&self) -> &str;

    /// Retrieves and parses every row of the document.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if retrieval or parsing fails.
    async fn fetch_rows(&self) -> Result<Vec<RawRow>, FetchError>;
}

/// Picks a source for a data source identifier.
///
/// `http(s)://` identifiers are fetched as CSV URLs, identifiers naming an
/// existing file or ending in `.csv` are read from disk, and anything else
/// is treated as a published sheet id.
#[must_use]
pub fn source_for(identifier: &str) -> Box<dyn SheetSource> {
    let identifier = identifier.trim();
    let lower = identifier.to_ascii_lowercase();

    if lower.starts_with("http://") || lower.starts_with("https://") {
        Box::new(sheets::CsvUrl::new(identifier))
    } else if lower.ends_with(".csv") || Path::new(identifier).is_file() {
        Box::new(sheets::CsvFile::new(identifier))
    } else {
        Box::new(sheets::PublishedSheet::new(identifier))
    }
}
