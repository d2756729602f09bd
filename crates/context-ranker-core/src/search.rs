//! The ranking pipeline: analyze → retrieve → score → curate.
//!
//! Operates on one epoch's documents and (optional) index, with no I/O. The
//! calling application owns the epoch cache and passes both in.
//!
//! # Pipeline
//!
//! 1. Analyze the query ([`crate::analyzer::analyze`]). No terms → no results.
//! 2. Retrieve candidates from the index. Without an index every document is
//!    a candidate with index relevance `0.0`. If every index query tier fails
//!    there are no candidates.
//! 3. Score each candidate ([`crate::scorer::score`]).
//! 4. Curate ([`crate::curate::curate`]): sort, threshold, diversify.
//! 5. Apply the caller's `limit`, if any.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzer::analyze;
use crate::curate::{curate, CurationParams};
use crate::index::DocIndex;
use crate::models::{Document, QueryAnalysis, ScoredCandidate, SearchResultItem};
use crate::scorer::score;

/// Retrieval tuning parameters, decoupled from application config.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub curation: CurationParams,
    /// Maximum index hits to consider. `None` considers every match.
    pub candidate_limit: Option<usize>,
    /// Truncate the curated list to this many results.
    pub limit: Option<usize>,
    /// If true, populate the score breakdown on each result.
    pub explain: bool,
}

/// Search one epoch. Never fails: every failure mode degrades to fewer (or
/// zero) results.
pub fn search(
    documents: &[Document],
    index: Option<&DocIndex>,
    query: &str,
    params: &SearchParams,
) -> Vec<SearchResultItem> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    let analysis = analyze(query);
    let ranked = rank(documents, index, &analysis, params);

    let limit = params.limit.unwrap_or(usize::MAX);
    ranked
        .iter()
        .take(limit)
        .map(|c| SearchResultItem::from_candidate(c, params.explain))
        .collect()
}

/// Score and curate candidates for an already analyzed query.
pub fn rank<'a>(
    documents: &'a [Document],
    index: Option<&DocIndex>,
    analysis: &QueryAnalysis,
    params: &SearchParams,
) -> Vec<ScoredCandidate<'a>> {
    if analysis.filtered_terms.is_empty() {
        return Vec::new();
    }

    let scored: Vec<ScoredCandidate<'a>> = candidates(documents, index, analysis, params)
        .into_iter()
        .map(|(document, index_score)| {
            let breakdown = score(document, index_score, analysis);
            ScoredCandidate {
                document,
                index_score,
                final_score: breakdown.total,
                breakdown,
            }
        })
        .collect();

    let total = scored.len();
    let curated = curate(scored, &params.curation);
    debug!(
        query = %analysis.query,
        intent = analysis.intent.as_str(),
        candidates = total,
        results = curated.len(),
        "ranked query"
    );
    curated
}

fn candidates<'a>(
    documents: &'a [Document],
    index: Option<&DocIndex>,
    analysis: &QueryAnalysis,
    params: &SearchParams,
) -> Vec<(&'a Document, f64)> {
    let Some(index) = index else {
        debug!(documents = documents.len(), "no index, scoring full corpus");
        return documents.iter().map(|d| (d, 0.0)).collect();
    };

    let limit = params.candidate_limit.unwrap_or(documents.len());
    match index.search(analysis, limit) {
        Ok(hits) => hits
            .into_iter()
            .filter_map(|hit| documents.get(hit.ordinal).map(|d| (d, hit.score)))
            .collect(),
        Err(err) => {
            warn!(query = %analysis.query, error = %err, "all index query tiers failed");
            Vec::new()
        }
    }
}

/// A supplementary link listed after the prompt context.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelatedLink {
    pub title: String,
    pub url: String,
}

/// Ranked results split the way the chat endpoint consumes them.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Best results, inlined into the prompt.
    pub context: Vec<SearchResultItem>,
    /// Remaining results, listed as links only.
    pub related: Vec<RelatedLink>,
}

/// Split ranked results into the first `context_limit` prompt items and
/// the remaining related links.
pub fn context_bundle(mut results: Vec<SearchResultItem>, context_limit: usize) -> ContextBundle {
    let split = context_limit.min(results.len());
    let rest = results.split_off(split);
    ContextBundle {
        context: results,
        related: rest
            .into_iter()
            .map(|r| RelatedLink {
                title: r.title,
                url: r.url,
            })
            .collect(),
    }
}
