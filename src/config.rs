//! TOML configuration.
//!
//! Every section and every field has a default, so an empty file is a valid
//! configuration apart from the corpus location: exactly one of
//! `corpus.base_url` or `corpus.file` must be set.
//!
//! ```toml
//! [corpus]
//! base_url = "https://build.avax.network"
//! export_path = "/llms-full.txt"
//! ttl_secs = 3600
//!
//! [retrieval]
//! max_results = 25
//!
//! [server]
//! bind = "127.0.0.1:7341"
//! ```
//!
//! The environment variable `CONTEXT_RANKER_BASE_URL` overrides
//! `corpus.base_url`, and takes precedence over `corpus.file`.

use anyhow::{bail, Context, Result};
use context_ranker_core::curate::CurationParams;
use context_ranker_core::search::SearchParams;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `corpus.base_url`.
pub const BASE_URL_ENV: &str = "CONTEXT_RANKER_BASE_URL";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Where the export comes from and how long an epoch lives.
#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Origin serving the export, e.g. `https://build.avax.network`.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_export_path")]
    pub export_path: String,
    /// Local export file, used instead of `base_url`.
    #[serde(default)]
    pub file: Option<PathBuf>,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum delay between two failed fetch attempts.
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            export_path: default_export_path(),
            file: None,
            ttl_secs: default_ttl_secs(),
            timeout_secs: default_timeout_secs(),
            retry_after_secs: default_retry_after_secs(),
        }
    }
}

impl CorpusConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_after(&self) -> Duration {
        Duration::from_secs(self.retry_after_secs)
    }

    /// Full export URL, if an HTTP origin is configured.
    pub fn export_url(&self) -> Option<String> {
        self.base_url.as_ref().map(|base| {
            format!(
                "{}/{}",
                base.trim_end_matches('/'),
                self.export_path.trim_start_matches('/')
            )
        })
    }
}

fn default_export_path() -> String {
    "/llms-full.txt".to_string()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_retry_after_secs() -> u64 {
    60
}

/// Curation tuning plus the prompt context size.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_threshold_ratio")]
    pub threshold_ratio: f64,
    #[serde(default = "default_min_threshold")]
    pub min_threshold: f64,
    #[serde(default = "default_diversity_head")]
    pub diversity_head: usize,
    #[serde(default = "default_section_cap")]
    pub section_cap: usize,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Results inlined into the prompt by `/context`; the rest become links.
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
    /// Maximum index hits scored per query. Unset scores every match.
    #[serde(default)]
    pub candidate_limit: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let curation = CurationParams::default();
        Self {
            threshold_ratio: curation.threshold_ratio,
            min_threshold: curation.min_threshold,
            diversity_head: curation.diversity_head,
            section_cap: curation.section_cap,
            max_results: curation.max_results,
            context_limit: default_context_limit(),
            candidate_limit: None,
        }
    }
}

impl RetrievalConfig {
    pub fn curation(&self) -> CurationParams {
        CurationParams {
            threshold_ratio: self.threshold_ratio,
            min_threshold: self.min_threshold,
            diversity_head: self.diversity_head,
            section_cap: self.section_cap,
            max_results: self.max_results,
        }
    }

    /// Search parameters for one request.
    pub fn search_params(&self, limit: Option<usize>, explain: bool) -> SearchParams {
        SearchParams {
            curation: self.curation(),
            candidate_limit: self.candidate_limit,
            limit,
            explain,
        }
    }
}

fn default_threshold_ratio() -> f64 {
    CurationParams::default().threshold_ratio
}
fn default_min_threshold() -> f64 {
    CurationParams::default().min_threshold
}
fn default_diversity_head() -> usize {
    CurationParams::default().diversity_head
}
fn default_section_cap() -> usize {
    CurationParams::default().section_cap
}
fn default_max_results() -> usize {
    CurationParams::default().max_results
}
fn default_context_limit() -> usize {
    12
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

/// Read, override from the environment, and validate a config file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let base_url = std::env::var(BASE_URL_ENV).ok();
    parse_config(&content, base_url)
}

/// Parse and validate config text. A non-empty `base_url_override` replaces
/// `corpus.base_url` and disables `corpus.file`.
pub fn parse_config(content: &str, base_url_override: Option<String>) -> Result<Config> {
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if let Some(url) = base_url_override.filter(|u| !u.trim().is_empty()) {
        config.corpus.base_url = Some(url);
        config.corpus.file = None;
    }

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let corpus = &config.corpus;
    match (&corpus.base_url, &corpus.file) {
        (Some(_), Some(_)) => bail!("corpus.base_url and corpus.file are mutually exclusive"),
        (None, None) => bail!(
            "No corpus configured: set corpus.base_url, corpus.file, or {}",
            BASE_URL_ENV
        ),
        (Some(url), None) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            bail!("corpus.base_url must be an http(s) URL, got '{}'", url)
        }
        _ => {}
    }
    if corpus.ttl_secs == 0 {
        bail!("corpus.ttl_secs must be > 0");
    }
    if corpus.timeout_secs == 0 {
        bail!("corpus.timeout_secs must be > 0");
    }

    let retrieval = &config.retrieval;
    if !(0.0..=1.0).contains(&retrieval.threshold_ratio) {
        bail!("retrieval.threshold_ratio must be in [0.0, 1.0]");
    }
    if retrieval.min_threshold < 0.0 {
        bail!("retrieval.min_threshold must be >= 0");
    }
    if retrieval.section_cap < 1 {
        bail!("retrieval.section_cap must be >= 1");
    }
    if retrieval.max_results < 1 {
        bail!("retrieval.max_results must be >= 1");
    }
    if retrieval.context_limit < 1 {
        bail!("retrieval.context_limit must be >= 1");
    }
    if retrieval.candidate_limit == Some(0) {
        bail!("retrieval.candidate_limit must be >= 1");
    }

    Ok(())
}
