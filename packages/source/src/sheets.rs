//! Concrete [`SheetSource`] implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use sheet_map_sheet_models::RawRow;

use crate::csv_rows::parse_csv;
use crate::{FetchError, SheetSource};

/// Base URL of published Google Sheets documents.
const PUBLISHED_SHEET_BASE: &str = "https://docs.google.com/spreadsheets/d/e/";

async fn fetch_csv(client: &reqwest::Client, url: &str) -> Result<Vec<RawRow>, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_owned(),
        });
    }
    let bytes = response.bytes().await?;
    log::debug!("Downloaded {} bytes from {url}", bytes.len());
    parse_csv(&bytes)
}

/// A sheet published to the web, addressed by its publication id.
#[derive(Debug, Clone)]
pub struct PublishedSheet {
    id: String,
    gid: Option<String>,
    client: reqwest::Client,
}

impl PublishedSheet {
    /// Creates a source for the published document `id` (the `2PACX-...`
    /// token of a "publish to web" link).
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_owned(),
            gid: None,
            client: reqwest::Client::new(),
        }
    }

    /// Selects a tab of the document by its `gid`.
    #[must_use]
    pub fn with_gid(mut self, gid: &str) -> Self {
        self.gid = Some(gid.to_owned());
        self
    }

    /// The CSV export URL of the document.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if the id cannot form a URL.
    pub fn csv_url(&self) -> Result<url::Url, FetchError> {
        let mut url = url::Url::parse(PUBLISHED_SHEET_BASE)?
            .join(&format!("{}/pub", self.id))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("output", "csv");
            if let Some(gid) = &self.gid {
                query.append_pair("gid", gid);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl SheetSource for PublishedSheet {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, FetchError> {
        let url = self.csv_url()?;
        log::info!("Fetching published sheet {}", self.id);
        fetch_csv(&self.client, url.as_str()).await
    }
}

/// Any URL serving CSV text.
#[derive(Debug, Clone)]
pub struct CsvUrl {
    url: String,
    client: reqwest::Client,
}

impl CsvUrl {
    /// Creates a source for `url`.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SheetSource for CsvUrl {
    fn id(&self) -> &str {
        &self.url
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, FetchError> {
        log::info!("Fetching CSV from {}", self.url);
        fetch_csv(&self.client, &self.url).await
    }
}

/// A CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFile {
    id: String,
    path: PathBuf,
}

impl CsvFile {
    /// Creates a source reading `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            id: path.display().to_string(),
            path,
        }
    }
}

#[async_trait]
impl SheetSource for CsvFile {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, FetchError> {
        let bytes = tokio::fs::read(&self.path).await?;
        parse_csv(&bytes)
    }
}

/// Rows that are already parsed, bypassing any fetch.
#[derive(Debug, Clone)]
pub struct InMemory {
    id: String,
    rows: Vec<RawRow>,
}

impl InMemory {
    /// Wraps already-parsed rows.
    #[must_use]
    pub fn new(id: &str, rows: Vec<RawRow>) -> Self {
        Self {
            id: id.to_owned(),
            rows,
        }
    }

    /// Parses CSV text up front.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the text is not valid CSV.
    pub fn from_csv(id: &str, text: &str) -> Result<Self, FetchError> {
        Ok(Self::new(id, parse_csv(text.as_bytes())?))
    }
}

#[async_trait]
impl SheetSource for InMemory {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch_rows(&self) -> Result<Vec<RawRow>, FetchError> {
        Ok(self.rows.clone())
    }
}
