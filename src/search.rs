//! Search entry points over the cached corpus, plus the CLI printers.
//!
//! [`search_content`] is what every caller goes through: it loads the
//! current epoch (rebuilding it if stale) and runs the ranking pipeline from
//! `context-ranker-core` against it. It never fails; an unavailable corpus
//! simply yields no results.

use anyhow::Result;
use context_ranker_core::analyzer::analyze;
use context_ranker_core::models::SearchResultItem;
use context_ranker_core::search::SearchParams;
use std::collections::BTreeMap;

use crate::cache::CorpusCache;
use crate::config::Config;
use crate::source::source_from_config;

const EXCERPT_CHARS: usize = 160;

/// Ranked results for `query`, best first.
pub async fn search_content(
    cache: &CorpusCache,
    query: &str,
    params: &SearchParams,
) -> Vec<SearchResultItem> {
    let epoch = cache.load().await;
    epoch.search(query, params)
}

fn cache_for(config: &Config) -> Result<CorpusCache> {
    let source = source_from_config(&config.corpus)?;
    Ok(CorpusCache::from_config(source, &config.corpus))
}

fn excerpt(content: &str) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}

/// `ctxr search`: print ranked results.
pub async fn run_search(
    config: &Config,
    query: &str,
    limit: Option<usize>,
    explain: bool,
) -> Result<()> {
    let cache = cache_for(config)?;
    let params = config.retrieval.search_params(limit, explain);
    let results = search_content(&cache, query, &params).await;

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, result.score, result.title);
        println!("    url: {}", result.url);
        if !result.headings.is_empty() {
            println!("    headings: {}", result.headings.join(" | "));
        }
        println!("    excerpt: \"{}\"", excerpt(&result.content));
        if let Some(b) = &result.explain {
            println!(
                "    explain: index={:.3} base={:.1} headings={:.0} url={:.0} title={:.0} \
                 definition={:.0} code={:.0} fresh={:.0} section={:.0} x{:.1}",
                b.index_score,
                b.base,
                b.headings,
                b.url,
                b.title,
                b.definition,
                b.code_blocks,
                b.freshness,
                b.section,
                b.length_multiplier
            );
        }
        println!("    id: {}", result.id);
        println!();
    }

    Ok(())
}

/// `ctxr analyze`: print the query analysis as JSON. Needs no corpus.
pub fn run_analyze(query: &str) -> Result<()> {
    let analysis = analyze(query);
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

/// `ctxr inspect`: load the corpus once and summarize the epoch.
pub async fn run_inspect(config: &Config) -> Result<()> {
    let cache = cache_for(config)?;
    let epoch = cache.load().await;

    println!("source: {}", cache.source());
    if epoch.number == 0 {
        println!("status: unavailable (load failed, see log)");
        return Ok(());
    }

    let built = epoch
        .built_at_utc
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_default();
    println!("epoch: {}", epoch.number);
    println!("built: {}", built);
    println!("documents: {}", epoch.documents.len());
    println!("index: {}", if epoch.has_index() { "yes" } else { "no" });

    let mut sections: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &epoch.documents {
        *sections.entry(doc.section()).or_insert(0) += 1;
    }
    if !sections.is_empty() {
        println!("sections:");
        for (section, count) in sections {
            let name = if section.is_empty() { "(root)" } else { section };
            println!("    {:<24} {}", name, count);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticCorpusSource;
    use std::time::Duration;

    #[test]
    fn test_excerpt_flattens_and_truncates() {
        assert_eq!(excerpt("a\n\n b   c"), "a b c");
        let long = "word ".repeat(100);
        let cut = excerpt(&long);
        assert!(cut.ends_with('…'));
        assert!(cut.chars().count() <= EXCERPT_CHARS + 1);
    }

    #[tokio::test]
    async fn test_search_content_loads_corpus() {
        let cache = CorpusCache::new(
            Box::new(StaticCorpusSource::new(
                "# ICM Overview\nURL: /docs/cross-chain/icm\nICM is Interchain Messaging.\n",
            )),
            Duration::from_secs(60),
            Duration::from_secs(60),
        );
        let results = search_content(&cache, "icm", &SearchParams::default()).await;
        assert_eq!(results.len(), 1);
        assert_eq!(cache.fetch_attempts(), 1);

        assert!(search_content(&cache, "", &SearchParams::default())
            .await
            .is_empty());
        assert_eq!(cache.fetch_attempts(), 1);
    }
}
