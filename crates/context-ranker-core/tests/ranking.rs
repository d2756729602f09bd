//! End-to-end ranking behavior over parsed exports.

use std::collections::HashMap;

use context_ranker_core::analyzer::analyze;
use context_ranker_core::corpus::parse_export;
use context_ranker_core::curate::CurationParams;
use context_ranker_core::index::DocIndex;
use context_ranker_core::models::{Document, IntentType};
use context_ranker_core::search::{search, SearchParams};

fn block(title: &str, url: &str, body: &str) -> String {
    format!("# {}\nURL: {}\n{}\n\n", title, url, body)
}

fn padding(words: usize) -> String {
    vec!["lorem"; words].join(" ")
}

fn build(export: &str) -> (Vec<Document>, DocIndex) {
    let docs = parse_export(export);
    let index = DocIndex::build(&docs).expect("index builds");
    (docs, index)
}

#[test]
fn test_definition_query_prefers_dedicated_page() {
    let export = [
        block(
            "Validator Setup",
            "/docs/nodes/validator-setup",
            "Install the node, sync, then stake. Later you can experiment with icm.",
        ),
        block(
            "ICM Overview",
            "/docs/cross-chain/icm-overview",
            "ICM is Interchain Messaging, the protocol blockchains use to talk.",
        ),
    ]
    .concat();
    let (docs, index) = build(&export);

    let analysis = analyze("what is icm");
    assert_eq!(analysis.intent, IntentType::Definition);
    assert_eq!(analysis.main_subject.as_deref(), Some("icm"));

    let results = search(&docs, Some(&index), "what is icm", &SearchParams::default());
    let icm = results.iter().position(|r| r.title == "ICM Overview");
    let validator = results.iter().position(|r| r.title == "Validator Setup");
    assert_eq!(icm, Some(0));
    if let Some(v) = validator {
        assert!(v > 0);
    }
}

#[test]
fn test_synonyms_reach_documents_without_literal_term() {
    let filler = padding(120);
    let export = [
        block(
            "Launch a Subnet",
            "/docs/tooling/launch-subnet",
            &format!("Deploy a subnet with the CLI step by step. {}", filler),
        ),
        block(
            "Layer1 Chains",
            "/docs/quick-start/layer1",
            &format!("A layer1 is a sovereign network. {}", filler),
        ),
        block(
            "Wallet Basics",
            "/docs/wallets/basics",
            &format!("Store keys safely. {}", filler),
        ),
    ]
    .concat();
    let (docs, index) = build(&export);
    assert!(docs.iter().all(|d| !d.content.to_lowercase().contains("l1")));

    let results = search(&docs, Some(&index), "l1 deploy tutorial", &SearchParams::default());
    let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
    assert!(titles.contains(&"Launch a Subnet"), "got {:?}", titles);
    assert!(titles.contains(&"Layer1 Chains"), "got {:?}", titles);
    assert!(!titles.contains(&"Wallet Basics"));
}

fn sectioned_export() -> String {
    let sections = ["docs", "academy", "guides", "integrations"];
    let mut export = String::new();
    for (s, section) in sections.iter().enumerate() {
        for i in 0..12 {
            let body = format!(
                "Validator notes part {} for {}. {}",
                i,
                section,
                padding(20 + (i * 37 + s * 11) % 700)
            );
            export.push_str(&block(
                &format!("Validator {} {}", section, i),
                &format!("/{}/validator-{}", section, i),
                &body,
            ));
        }
    }
    export
}

#[test]
fn test_results_sorted_thresholded_and_diverse() {
    let (docs, index) = build(&sectioned_export());
    let params = SearchParams::default();
    let results = search(&docs, Some(&index), "validator", &params);

    assert!(!results.is_empty());
    assert!(results.len() <= params.curation.max_results);

    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let threshold = params.curation.threshold(results[0].score);
    assert!(results.iter().all(|r| r.score >= threshold));

    let mut per_section: HashMap<String, usize> = HashMap::new();
    for r in results.iter().skip(params.curation.diversity_head) {
        let section = r.url.trim_start_matches('/').split('/').next().unwrap().to_string();
        *per_section.entry(section).or_insert(0) += 1;
    }
    assert!(per_section.values().all(|n| *n <= params.curation.section_cap));
}

#[test]
fn test_repeated_queries_are_deterministic() {
    let (docs, index) = build(&sectioned_export());
    let params = SearchParams::default();
    let first = search(&docs, Some(&index), "validator academy guide", &params);
    for _ in 0..3 {
        let again = search(&docs, Some(&index), "validator academy guide", &params);
        let a: Vec<(&str, f64)> = first.iter().map(|r| (r.id.as_str(), r.score)).collect();
        let b: Vec<(&str, f64)> = again.iter().map(|r| (r.id.as_str(), r.score)).collect();
        assert_eq!(a, b);
    }
}

#[test]
fn test_custom_curation_params() {
    let (docs, index) = build(&sectioned_export());
    let params = SearchParams {
        curation: CurationParams {
            max_results: 6,
            ..CurationParams::default()
        },
        ..SearchParams::default()
    };
    let results = search(&docs, Some(&index), "validator", &params);
    assert!(results.len() <= 6);
}

#[test]
fn test_stop_word_only_query_is_empty_not_error() {
    let (docs, index) = build(&sectioned_export());
    let results = search(&docs, Some(&index), "what is the", &SearchParams::default());
    assert!(results.is_empty());
}
