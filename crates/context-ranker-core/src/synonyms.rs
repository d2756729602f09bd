//! Domain synonym table.
//!
//! Maps Avalanche vocabulary to related terms. The table is applied at index
//! time by [`expand_text`], which appends expansions to a document's text so
//! that a query for `l1` also reaches sections that only say `subnet`. The
//! keys double as importance keywords in the query analyzer.
//!
//! The table is static; changing vocabulary requires a new release.

use std::sync::LazyLock;

use regex::Regex;

/// Ordered `term → expansions` table. Order determines the order in which
/// expansions are appended.
pub const SYNONYMS: &[(&str, &[&str])] = &[
    ("l1", &["subnet", "layer1", "blockchain"]),
    ("subnet", &["l1", "layer1", "blockchain"]),
    ("layer1", &["l1", "subnet"]),
    ("icm", &["interchain messaging", "teleporter", "cross-chain messaging"]),
    ("teleporter", &["icm", "interchain messaging"]),
    ("interchain messaging", &["icm", "teleporter"]),
    ("ictt", &["interchain token transfer", "token bridge", "bridge"]),
    ("interchain token transfer", &["ictt", "token bridge"]),
    ("evm", &["ethereum virtual machine", "subnet-evm", "smart contract"]),
    ("c-chain", &["contract chain", "evm"]),
    ("p-chain", &["platform chain", "validator", "staking"]),
    ("x-chain", &["exchange chain", "avm"]),
    ("validator", &["node", "staking", "validation"]),
    ("staking", &["validator", "stake", "delegation"]),
    ("avax", &["avalanche", "token"]),
    ("avalanchego", &["node", "client"]),
    ("precompile", &["stateful precompile", "evm extension"]),
    ("faucet", &["testnet tokens", "test avax", "fuji"]),
    ("fuji", &["testnet", "faucet"]),
    ("vm", &["virtual machine"]),
    ("rpc", &["api", "endpoint"]),
    ("cli", &["avalanche-cli", "command line"]),
    ("hypersdk", &["vm", "virtual machine"]),
];

struct SynonymPattern {
    matcher: Regex,
    expansions: &'static [&'static str],
}

static PATTERNS: LazyLock<Vec<SynonymPattern>> = LazyLock::new(|| {
    SYNONYMS
        .iter()
        .map(|(term, expansions)| SynonymPattern {
            matcher: Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term)))
                .expect("synonym key is an escaped literal"),
            expansions,
        })
        .collect()
});

/// Expansion terms for a single term, or an empty slice if it has none.
pub fn expand(term: &str) -> &'static [&'static str] {
    let lowered = term.to_lowercase();
    SYNONYMS
        .iter()
        .find(|(key, _)| *key == lowered)
        .map(|(_, expansions)| *expansions)
        .unwrap_or(&[])
}

/// Every synonym key, in table order.
pub fn keys() -> impl Iterator<Item = &'static str> {
    SYNONYMS.iter().map(|(key, _)| *key)
}

/// Append the expansions of every key found in `text` (word-boundary,
/// case-insensitive). The original text is always preserved in front.
pub fn expand_text(text: &str) -> String {
    let mut expanded = text.to_string();
    for pattern in PATTERNS.iter() {
        if pattern.matcher.is_match(text) {
            for term in pattern.expansions {
                expanded.push(' ');
                expanded.push_str(term);
            }
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_lookup() {
        assert_eq!(expand("l1"), &["subnet", "layer1", "blockchain"]);
        assert_eq!(expand("ICM")[1], "teleporter");
        assert!(expand("kubernetes").is_empty());
    }

    #[test]
    fn test_expand_text_is_additive() {
        let text = "Deploy your Subnet today";
        let expanded = expand_text(text);
        assert!(expanded.starts_with(text));
        assert!(expanded.contains(" l1"));
        assert!(expanded.contains(" layer1"));
    }

    #[test]
    fn test_expand_text_respects_word_boundaries() {
        // "evm" inside "subnetevm" or "l1" inside "l10n" must not expand.
        let text = "subnetevm l10n";
        assert_eq!(expand_text(text), text);
    }

    #[test]
    fn test_expand_text_hyphenated_and_multiword_keys() {
        let expanded = expand_text("Bridge assets to the C-Chain with Interchain Messaging");
        assert!(expanded.contains("contract chain"));
        assert!(expanded.contains(" icm"));
    }

    #[test]
    fn test_each_key_applied_once() {
        let expanded = expand_text("icm icm icm");
        assert_eq!(expanded.matches("teleporter").count(), 1);
    }

    #[test]
    fn test_keys_are_lowercase_and_unique() {
        let all: Vec<&str> = keys().collect();
        for key in &all {
            assert_eq!(*key, key.to_lowercase());
        }
        let mut dedup = all.clone();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), all.len());
    }
}
