//! Core data models shared by the ranking pipeline.
//!
//! A [`Document`] lives for one cache epoch. Everything else here is created
//! per query and dropped once the ranked list is returned.

use serde::Serialize;

/// One documentation section parsed from the corpus export.
///
/// `id` is the document's ordinal within its epoch. It doubles as the index
/// reference and must not be persisted beyond a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub headings: Vec<String>,
}

impl Document {
    /// Ordinal position of this document within its epoch.
    pub fn ordinal(&self) -> Option<usize> {
        self.id.parse().ok()
    }

    /// Top-level section of the document's url path (`/academy/x` → `academy`).
    pub fn section(&self) -> &str {
        crate::corpus::url_section(&self.url)
    }
}

/// Coarse classification of what a query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntentType {
    Definition,
    Tutorial,
    Troubleshooting,
    FeatureCheck,
    Comparison,
    Requirements,
    Faucet,
    #[default]
    General,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Definition => "definition",
            IntentType::Tutorial => "tutorial",
            IntentType::Troubleshooting => "troubleshooting",
            IntentType::FeatureCheck => "feature-check",
            IntentType::Comparison => "comparison",
            IntentType::Requirements => "requirements",
            IntentType::Faucet => "faucet",
            IntentType::General => "general",
        }
    }
}

/// Result of analyzing a raw query string.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueryAnalysis {
    /// Lowercased, trimmed query text.
    pub query: String,
    /// Whitespace-split lowercase terms.
    pub raw_terms: Vec<String>,
    /// Terms with stop-words removed (falls back to `raw_terms` when empty).
    pub filtered_terms: Vec<String>,
    /// Filtered terms that appear in the importance keyword set.
    pub required_terms: Vec<String>,
    pub intent: IntentType,
    pub main_subject: Option<String>,
}

impl QueryAnalysis {
    pub fn is_required(&self, term: &str) -> bool {
        self.required_terms.iter().any(|t| t == term)
    }
}

/// Per-factor breakdown of a candidate's final score.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreBreakdown {
    /// Raw relevance reported by the index (0.0 when the index was bypassed).
    pub index_score: f64,
    /// `index_score × 20`.
    pub base: f64,
    pub headings: f64,
    pub url: f64,
    pub title: f64,
    pub definition: f64,
    pub code_blocks: f64,
    pub freshness: f64,
    pub section: f64,
    /// `0.5`, `1.3`, or `1.0` depending on content length.
    pub length_multiplier: f64,
    pub total: f64,
}

/// A candidate document with its scores for one query.
#[derive(Debug, Clone)]
pub struct ScoredCandidate<'a> {
    pub document: &'a Document,
    pub index_score: f64,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// A ranked result, shaped for the chat endpoint and the HTTP API.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub headings: Vec<String>,
    pub score: f64,
    /// Scoring breakdown (populated when `explain` is requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ScoreBreakdown>,
}

impl SearchResultItem {
    pub fn from_candidate(candidate: &ScoredCandidate<'_>, explain: bool) -> Self {
        let doc = candidate.document;
        Self {
            id: doc.id.clone(),
            title: doc.title.clone(),
            url: doc.url.clone(),
            content: doc.content.clone(),
            headings: doc.headings.clone(),
            score: candidate.final_score,
            explain: explain.then_some(candidate.breakdown),
        }
    }
}
