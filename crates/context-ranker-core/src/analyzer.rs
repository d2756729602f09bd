//! Query analysis: term extraction, intent classification, importance tagging.
//!
//! # Intent rules
//!
//! Every rule in [`INTENT_RULES`] is evaluated, in order, against the
//! lowercased query. Each match overwrites the intent (and, depending on the
//! rule, the subject) set by earlier matches, so the last matching rule wins.
//! A query matching no rule is [`IntentType::General`].

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::models::{IntentType, QueryAnalysis};
use crate::synonyms;

/// Articles, prepositions, interrogatives and auxiliaries dropped from queries.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "am", "to", "of", "in", "on",
    "at", "for", "with", "by", "from", "about", "into", "onto", "over", "as", "and", "or",
    "what", "how", "why", "when", "where", "which", "who", "whom", "whose", "do", "does", "did",
    "can", "could", "should", "would", "will", "i", "me", "my", "we", "our", "you", "your",
    "it", "its", "this", "that", "these", "those", "there", "please",
];

/// Terms that bias the index query when present. Synonym keys are always
/// included.
const IMPORTANCE_KEYWORDS: &[&str] = &[
    "deploy", "create", "error", "l1", "validator", "icm", "ictt", "subnet", "node",
    "staking", "token", "bridge", "contract", "wallet", "faucet", "precompile", "evm",
    "install", "configure", "upgrade", "fee", "gas", "consensus", "warp", "relayer",
    "teleporter", "avalanchego", "cli", "rpc", "api",
];

/// How a matching rule updates the main subject.
#[derive(Debug, Clone, Copy)]
enum Subject {
    /// Leave the subject set by earlier rules untouched.
    Keep,
    /// Use the first non-empty capture group, if any.
    Capture,
    /// Force a fixed subject.
    Fixed(&'static str),
}

struct IntentRule {
    intent: IntentType,
    pattern: Regex,
    subject: Subject,
}

impl IntentRule {
    fn new(intent: IntentType, pattern: &str, subject: Subject) -> Self {
        Self {
            intent,
            pattern: Regex::new(pattern).expect("intent pattern is a valid regex"),
            subject,
        }
    }
}

static INTENT_RULES: LazyLock<Vec<IntentRule>> = LazyLock::new(|| {
    use IntentType::*;
    vec![
        IntentRule::new(
            Definition,
            r"\bwhat\s+(?:is|are)\s+(?:an?\s+|the\s+)?(.+)",
            Subject::Capture,
        ),
        IntentRule::new(
            Tutorial,
            r"\bhow\s+(?:to|do\s+i|can\s+i|do\s+you|should\s+i)\s+(.+)",
            Subject::Capture,
        ),
        IntentRule::new(
            Tutorial,
            r"^(.+?)\s+(?:tutorials?|guides?|examples?)\b",
            Subject::Capture,
        ),
        IntentRule::new(
            Troubleshooting,
            r"\b(?:errors?|issues?|problems?|troubleshoot\w*|fail\w*|not\s+working)\b",
            Subject::Keep,
        ),
        IntentRule::new(
            FeatureCheck,
            r"^(?:does|do|can|is\s+there|are\s+there)\b.*\b(?:support\w*|have|allow\w*|enable\w*|possible)\b",
            Subject::Keep,
        ),
        IntentRule::new(
            Comparison,
            r"\b(?:difference|differences|differ|compare|comparison|versus|vs\.?)(?:\s|$)",
            Subject::Keep,
        ),
        IntentRule::new(
            Requirements,
            r"^(.+?)\s+(?:(?:hardware|system|minimum)\s+)?(?:requirements?|specifications?|specs|prerequisites?)\b",
            Subject::Capture,
        ),
        IntentRule::new(
            Requirements,
            r"\b(?:requirements?|specifications?|specs|prerequisites?)\b(?:\s+(?:for|of|to)\s+(?:an?\s+|the\s+)?(.+))?",
            Subject::Capture,
        ),
        IntentRule::new(
            Faucet,
            r"\b(?:faucet|testnet\s+(?:tokens?|avax|funds)|test\s+(?:tokens?|avax)|free\s+(?:tokens?|avax))\b",
            Subject::Fixed("faucet"),
        ),
    ]
});

fn first_capture(captures: &Captures<'_>) -> Option<String> {
    captures
        .iter()
        .skip(1)
        .flatten()
        .map(|m| clean_subject(m.as_str()))
        .find(|s| !s.is_empty())
}

/// Trim trailing punctuation and leading stop words (`what are the node`
/// → `node`).
fn clean_subject(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!')
        .split_whitespace()
        .skip_while(|word| STOP_WORDS.contains(&normalize_term(word)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip punctuation around a term (`icm?` → `icm`) while keeping inner
/// characters such as hyphens (`c-chain`).
fn normalize_term(term: &str) -> &str {
    term.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Classify the query's intent and main subject.
pub fn classify(query: &str) -> (IntentType, Option<String>) {
    let mut intent = IntentType::General;
    let mut subject: Option<String> = None;

    for rule in INTENT_RULES.iter() {
        let Some(captures) = rule.pattern.captures(query) else {
            continue;
        };
        intent = rule.intent;
        match rule.subject {
            Subject::Keep => {}
            Subject::Capture => {
                if let Some(captured) = first_capture(&captures) {
                    subject = Some(captured);
                }
            }
            Subject::Fixed(fixed) => subject = Some(fixed.to_string()),
        }
    }

    (intent, subject)
}

fn is_important(term: &str) -> bool {
    IMPORTANCE_KEYWORDS.contains(&term) || synonyms::keys().any(|key| key == term)
}

/// Analyze a raw query string.
///
/// An empty or whitespace-only query yields an analysis with no terms.
pub fn analyze(raw_query: &str) -> QueryAnalysis {
    let query = raw_query.trim().to_lowercase();

    let raw_terms: Vec<String> = query.split_whitespace().map(str::to_string).collect();

    let mut filtered_terms: Vec<String> = raw_terms
        .iter()
        .map(|t| normalize_term(t))
        .filter(|t| !t.is_empty() && !STOP_WORDS.contains(t))
        .map(str::to_string)
        .collect();
    if filtered_terms.is_empty() {
        filtered_terms = raw_terms.clone();
    }

    let mut required_terms: Vec<String> = Vec::new();
    for term in &filtered_terms {
        if is_important(term) && !required_terms.contains(term) {
            required_terms.push(term.clone());
        }
    }

    let (intent, main_subject) = classify(&query);

    QueryAnalysis {
        query,
        raw_terms,
        filtered_terms,
        required_terms,
        intent,
        main_subject,
    }
}
