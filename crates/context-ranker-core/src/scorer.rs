//! Multi-factor candidate scoring.
//!
//! The final score starts from index relevance and adds heuristic boosts.
//! The two length multipliers apply last, to the cumulative score.
//!
//! | Factor | Effect |
//! |--------|--------|
//! | index relevance | `× 20` |
//! | query term in headings | `+20` per term |
//! | query term in url | `+25` per term |
//! | title equals query / contains query | `+300` / `+150` |
//! | definition intent and "what is …" in content | `+30` |
//! | fenced code blocks | `+15` per pair, at most `+60` |
//! | recency marker in content | `+20` |
//! | integration / academy / guide query in matching section | `+100` each |
//! | content shorter than 500 chars | `× 0.5` |
//! | content longer than 3000 chars | `× 1.3` |

use std::sync::LazyLock;

use regex::Regex;

use crate::corpus::url_section;
use crate::models::{Document, IntentType, QueryAnalysis, ScoreBreakdown};

pub const INDEX_WEIGHT: f64 = 20.0;
pub const HEADING_TERM_BOOST: f64 = 20.0;
pub const URL_TERM_BOOST: f64 = 25.0;
pub const EXACT_TITLE_BOOST: f64 = 300.0;
pub const PARTIAL_TITLE_BOOST: f64 = 150.0;
pub const DEFINITION_BOOST: f64 = 30.0;
pub const CODE_BLOCK_BOOST: f64 = 15.0;
pub const CODE_BLOCK_CAP: f64 = 60.0;
pub const FRESHNESS_BOOST: f64 = 20.0;
pub const SECTION_BOOST: f64 = 100.0;

pub const SHORT_CONTENT_CHARS: usize = 500;
pub const LONG_CONTENT_CHARS: usize = 3000;
pub const SHORT_CONTENT_MULTIPLIER: f64 = 0.5;
pub const LONG_CONTENT_MULTIPLIER: f64 = 1.3;

const RECENCY_MARKERS: &[&str] = &["2024", "2023", "recent", "latest", "new", "updated"];

/// `(query keyword, url section)` pairs for the section bonus.
const SECTION_KEYWORDS: &[(&str, &str)] = &[
    ("integration", "integrations"),
    ("academy", "academy"),
    ("guide", "guides"),
];

static DEFINITION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"what is \w+").expect("definition pattern is valid"));

/// Score one candidate document against an analyzed query.
pub fn score(document: &Document, index_score: f64, analysis: &QueryAnalysis) -> ScoreBreakdown {
    let title = document.title.to_lowercase();
    let url = document.url.to_lowercase();
    let content = document.content.to_lowercase();
    let headings = document.headings.join(" ").to_lowercase();
    let terms = &analysis.filtered_terms;

    let base = index_score * INDEX_WEIGHT;

    let heading_matches = terms.iter().filter(|t| headings.contains(t.as_str())).count();
    let url_matches = terms.iter().filter(|t| url.contains(t.as_str())).count();

    let title_bonus = if analysis.query.is_empty() {
        0.0
    } else if title == analysis.query {
        EXACT_TITLE_BOOST
    } else if title.contains(&analysis.query) {
        PARTIAL_TITLE_BOOST
    } else {
        0.0
    };

    let definition = if analysis.intent == IntentType::Definition
        && DEFINITION_PATTERN.is_match(&content)
    {
        DEFINITION_BOOST
    } else {
        0.0
    };

    let code_pairs = (content.matches("```").count() / 2) as f64;
    let code_blocks = (code_pairs * CODE_BLOCK_BOOST).min(CODE_BLOCK_CAP);

    let freshness = if RECENCY_MARKERS.iter().any(|m| content.contains(m)) {
        FRESHNESS_BOOST
    } else {
        0.0
    };

    let section = url_section(&url);
    let section_bonus = SECTION_KEYWORDS
        .iter()
        .filter(|(keyword, target)| analysis.query.contains(keyword) && section == *target)
        .count() as f64
        * SECTION_BOOST;

    let additive = base
        + heading_matches as f64 * HEADING_TERM_BOOST
        + url_matches as f64 * URL_TERM_BOOST
        + title_bonus
        + definition
        + code_blocks
        + freshness
        + section_bonus;

    let length_multiplier = length_multiplier(document.content.chars().count());

    ScoreBreakdown {
        index_score,
        base,
        headings: heading_matches as f64 * HEADING_TERM_BOOST,
        url: url_matches as f64 * URL_TERM_BOOST,
        title: title_bonus,
        definition,
        code_blocks,
        freshness,
        section: section_bonus,
        length_multiplier,
        total: additive * length_multiplier,
    }
}

/// Multiplier for a content length in characters. Bounds are strict.
pub fn length_multiplier(chars: usize) -> f64 {
    if chars < SHORT_CONTENT_CHARS {
        SHORT_CONTENT_MULTIPLIER
    } else if chars > LONG_CONTENT_CHARS {
        LONG_CONTENT_MULTIPLIER
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;

    fn doc(title: &str, url: &str, content: &str, headings: &[&str]) -> Document {
        Document {
            id: "0".to_string(),
            title: title.to_string(),
            url: url.to_string(),
            content: content.to_string(),
            headings: headings.iter().map(|h| h.to_string()).collect(),
        }
    }

    /// Neutral filler: no recency markers, no code, no query terms.
    fn filler(chars: usize) -> String {
        "z".repeat(chars)
    }

    #[test]
    fn test_base_only() {
        let d = doc("Zeta", "/docs/zeta", &filler(1000), &[]);
        let s = score(&d, 2.5, &analyze("icm"));
        assert_eq!(s.base, 50.0);
        assert_eq!(s.total, 50.0);
        assert_eq!(s.length_multiplier, 1.0);
    }

    #[test]
    fn test_heading_and_url_terms() {
        let d = doc("Zeta", "/docs/icm/deploy", &filler(1000), &["ICM basics", "Deploy"]);
        let s = score(&d, 0.0, &analyze("deploy icm"));
        assert_eq!(s.headings, 40.0);
        assert_eq!(s.url, 50.0);
        assert_eq!(s.total, 90.0);
    }

    #[test]
    fn test_title_exact_beats_partial() {
        let exact = doc("ICM Overview", "/docs/x", &filler(1000), &[]);
        let partial = doc("The ICM Overview Page", "/docs/x", &filler(1000), &[]);
        let q = analyze("ICM overview");
        assert_eq!(score(&exact, 0.0, &q).title, EXACT_TITLE_BOOST);
        assert_eq!(score(&partial, 0.0, &q).title, PARTIAL_TITLE_BOOST);
    }

    #[test]
    fn test_definition_requires_intent_and_pattern() {
        let content = format!("What is Teleporter? {}", filler(1000));
        let d = doc("Zeta", "/docs/x", &content, &[]);
        assert_eq!(score(&d, 0.0, &analyze("what is teleporter")).definition, DEFINITION_BOOST);
        assert_eq!(score(&d, 0.0, &analyze("teleporter setup")).definition, 0.0);
    }

    #[test]
    fn test_code_blocks_capped() {
        let two = format!("```a```\n```b```\n{}", filler(1000));
        let many = format!("{}{}", "```x```".repeat(10), filler(1000));
        let q = analyze("zeta");
        assert_eq!(score(&doc("T", "/d", &two, &[]), 0.0, &q).code_blocks, 30.0);
        assert_eq!(score(&doc("T", "/d", &many, &[]), 0.0, &q).code_blocks, CODE_BLOCK_CAP);
    }

    #[test]
    fn test_freshness_marker() {
        let d = doc("T", "/d", &format!("Updated for Durango. {}", filler(1000)), &[]);
        assert_eq!(score(&d, 0.0, &analyze("zeta")).freshness, FRESHNESS_BOOST);
    }

    #[test]
    fn test_section_bonus_per_keyword() {
        let content = filler(1000);
        let academy = doc("T", "/academy/course", &content, &[]);
        let guides = doc("T", "/guides/x", &content, &[]);
        let q = analyze("academy course guide");
        assert_eq!(score(&academy, 0.0, &q).section, SECTION_BOOST);
        assert_eq!(score(&guides, 0.0, &q).section, SECTION_BOOST);
        assert_eq!(score(&guides, 0.0, &analyze("academy")).section, 0.0);

        let integrations = doc("T", "https://host/integrations/x", &content, &[]);
        assert_eq!(
            score(&integrations, 0.0, &analyze("wallet integration")).section,
            SECTION_BOOST
        );
    }

    #[test]
    fn test_length_multipliers_apply_to_whole_score() {
        let q = analyze("icm");
        let short = doc("T", "/docs/icm", &filler(499), &[]);
        let long = doc("T", "/docs/icm", &filler(3001), &[]);
        assert_eq!(score(&short, 1.0, &q).total, (20.0 + 25.0) * 0.5);
        assert_eq!(score(&long, 1.0, &q).total, (20.0 + 25.0) * 1.3);
    }

    #[test]
    fn test_length_boundaries_are_strict() {
        assert_eq!(length_multiplier(499), 0.5);
        assert_eq!(length_multiplier(500), 1.0);
        assert_eq!(length_multiplier(3000), 1.0);
        assert_eq!(length_multiplier(3001), 1.3);
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // 500 two-byte characters is 1000 bytes but still no modifier.
        let d = doc("T", "/d", &"é".repeat(500), &[]);
        assert_eq!(score(&d, 0.0, &analyze("zeta")).length_multiplier, 1.0);
    }
}
