//! Where the raw corpus export comes from.
//!
//! The cache only needs "give me the export text", so the origin sits behind
//! the [`CorpusSource`] trait:
//!
//! | Source | Use |
//! |--------|-----|
//! | [`HttpCorpusSource`] | production: GET `base_url + export_path` |
//! | [`FileCorpusSource`] | offline use and CLI tests |
//! | [`StaticCorpusSource`] | in-memory text for tests and embedding |
//!
//! Custom sources implement the trait and are handed to
//! [`crate::cache::CorpusCache::new`].

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::CorpusConfig;

/// A provider of the raw export text.
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Human-readable origin, used in logs and `/status`.
    fn describe(&self) -> String;

    /// Fetch the full export. Any error is treated as a failed load by the
    /// cache; it never reaches a search caller.
    async fn fetch(&self) -> Result<String>;
}

/// Fetches the export over HTTP(S).
pub struct HttpCorpusSource {
    client: reqwest::Client,
    url: String,
}

impl HttpCorpusSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("context-ranker/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CorpusSource for HttpCorpusSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("{} returned {}", self.url, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", self.url))
    }
}

/// Reads the export from a local file.
pub struct FileCorpusSource {
    path: PathBuf,
}

impl FileCorpusSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CorpusSource for FileCorpusSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<String> {
        tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read corpus file: {}", self.path.display()))
    }
}

/// Serves fixed text.
pub struct StaticCorpusSource {
    text: String,
}

impl StaticCorpusSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl CorpusSource for StaticCorpusSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Build the source named by `[corpus]`.
pub fn source_from_config(corpus: &CorpusConfig) -> Result<Box<dyn CorpusSource>> {
    if let Some(path) = &corpus.file {
        return Ok(Box::new(FileCorpusSource::new(path.clone())));
    }
    match corpus.export_url() {
        Some(url) => Ok(Box::new(HttpCorpusSource::new(url, corpus.timeout())?)),
        None => bail!("No corpus source configured"),
    }
}
