//! Corpus epochs and the single-flight rebuild cache.
//!
//! An [`Epoch`] is one fetched export: its parsed documents and the index
//! built over them. The two are built together and published together, so
//! index ordinals always refer to the epoch's own document list.
//!
//! [`CorpusCache`] owns the current epoch:
//!
//! - **fresh** (younger than the TTL): returned under a read lock;
//! - **stale**: one caller wins the build lock and rebuilds, every other
//!   caller gets the stale epoch without waiting;
//! - **missing** (cold start): callers queue on the build lock and re-check,
//!   so concurrent cold starts trigger one fetch.
//!
//! A failed fetch is logged and never returned as an error. The stale epoch
//! stays published (or an empty epoch is returned if none was ever built),
//! and no new fetch is attempted until `retry_after` has elapsed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use context_ranker_core::corpus::parse_export;
use context_ranker_core::index::DocIndex;
use context_ranker_core::models::{Document, SearchResultItem};
use context_ranker_core::search::{self, SearchParams};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::config::CorpusConfig;
use crate::source::CorpusSource;

/// One published corpus snapshot.
pub struct Epoch {
    /// Monotonic build number; `0` is the empty placeholder.
    pub number: u64,
    pub documents: Vec<Document>,
    /// `None` when the index failed to build; searches then score every
    /// document.
    pub index: Option<DocIndex>,
    pub built_at: Instant,
    pub built_at_utc: Option<DateTime<Utc>>,
}

impl Epoch {
    fn empty(now: Instant) -> Self {
        Self {
            number: 0,
            documents: Vec::new(),
            index: None,
            built_at: now,
            built_at_utc: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn search(&self, query: &str, params: &SearchParams) -> Vec<SearchResultItem> {
        search::search(&self.documents, self.index.as_ref(), query, params)
    }
}

#[derive(Default)]
struct BuildState {
    last_number: u64,
    last_failure: Option<Instant>,
}

/// Process-wide owner of the current [`Epoch`].
pub struct CorpusCache {
    source: Box<dyn CorpusSource>,
    ttl: Duration,
    retry_after: Duration,
    current: RwLock<Option<Arc<Epoch>>>,
    build: Mutex<BuildState>,
    fetch_attempts: AtomicU64,
}

impl CorpusCache {
    pub fn new(source: Box<dyn CorpusSource>, ttl: Duration, retry_after: Duration) -> Self {
        Self {
            source,
            ttl,
            retry_after,
            current: RwLock::new(None),
            build: Mutex::new(BuildState::default()),
            fetch_attempts: AtomicU64::new(0),
        }
    }

    pub fn from_config(source: Box<dyn CorpusSource>, corpus: &CorpusConfig) -> Self {
        Self::new(source, corpus.ttl(), corpus.retry_after())
    }

    pub fn source(&self) -> String {
        self.source.describe()
    }

    pub fn fetch_attempts(&self) -> u64 {
        self.fetch_attempts.load(Ordering::Relaxed)
    }

    /// The published epoch, without triggering a load.
    pub async fn current(&self) -> Option<Arc<Epoch>> {
        self.current.read().await.clone()
    }

    /// Load the corpus as of now.
    pub async fn load(&self) -> Arc<Epoch> {
        self.get_or_rebuild(Instant::now()).await
    }

    /// Return the epoch valid at `now`, rebuilding it if it is missing or
    /// older than the TTL.
    pub async fn get_or_rebuild(&self, now: Instant) -> Arc<Epoch> {
        if let Some(epoch) = self.current().await {
            if self.is_fresh(&epoch, now) {
                return epoch;
            }
            let Ok(mut state) = self.build.try_lock() else {
                return epoch;
            };
            let epoch = self.current().await.unwrap_or(epoch);
            if self.is_fresh(&epoch, now) || self.cooling_down(&state, now) {
                return epoch;
            }
            return self.rebuild(&mut state, now).await.unwrap_or(epoch);
        }

        let mut state = self.build.lock().await;
        if let Some(epoch) = self.current().await {
            return epoch;
        }
        if self.cooling_down(&state, now) {
            return Arc::new(Epoch::empty(now));
        }
        self.rebuild(&mut state, now)
            .await
            .unwrap_or_else(|| Arc::new(Epoch::empty(now)))
    }

    fn is_fresh(&self, epoch: &Epoch, now: Instant) -> bool {
        now.saturating_duration_since(epoch.built_at) < self.ttl
    }

    fn cooling_down(&self, state: &BuildState, now: Instant) -> bool {
        state
            .last_failure
            .is_some_and(|failed| now.saturating_duration_since(failed) < self.retry_after)
    }

    /// Fetch, parse and index a new epoch. Must be called with the build
    /// lock held.
    async fn rebuild(&self, state: &mut BuildState, now: Instant) -> Option<Arc<Epoch>> {
        self.fetch_attempts.fetch_add(1, Ordering::Relaxed);

        let built = match self.source.fetch().await {
            Ok(raw) => build_epoch(raw).await,
            Err(err) => Err(err),
        };

        match built {
            Ok((documents, index)) => {
                state.last_number += 1;
                state.last_failure = None;
                let epoch = Arc::new(Epoch {
                    number: state.last_number,
                    documents,
                    index,
                    built_at: now,
                    built_at_utc: Some(Utc::now()),
                });
                *self.current.write().await = Some(epoch.clone());
                info!(
                    epoch = epoch.number,
                    documents = epoch.documents.len(),
                    indexed = epoch.has_index(),
                    source = %self.source.describe(),
                    "corpus epoch published"
                );
                Some(epoch)
            }
            Err(err) => {
                state.last_failure = Some(now);
                warn!(
                    source = %self.source.describe(),
                    error = %format!("{:#}", err),
                    retry_after_secs = self.retry_after.as_secs(),
                    "corpus load failed"
                );
                None
            }
        }
    }
}

/// Parse and index off the async runtime.
async fn build_epoch(raw: String) -> Result<(Vec<Document>, Option<DocIndex>)> {
    tokio::task::spawn_blocking(move || {
        let documents = parse_export(&raw);
        let index = match DocIndex::build(&documents) {
            Ok(index) => Some(index),
            Err(err) => {
                warn!(error = %format!("{:#}", err), "index build failed, scoring full corpus");
                None
            }
        };
        (documents, index)
    })
    .await
    .context("Epoch build task failed")
}
