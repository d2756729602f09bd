//! Weighted inverted index over one corpus epoch.
//!
//! Built in RAM with tantivy. Four fields are indexed with the boosts below;
//! title, headings and content are synonym-expanded first (see
//! [`crate::synonyms::expand_text`]). All fields share the `docs_en` analyzer:
//! split on non-alphanumerics, lowercase, drop stop-words, English stemming.
//!
//! | Field | Boost |
//! |-------|-------|
//! | `title` | 15 |
//! | `headings` | 10 |
//! | `content` | 5 |
//! | `url` | 2 |
//!
//! # Query fallback
//!
//! [`DocIndex::search`] tries, in order:
//!
//! 1. an advanced query string across all fields with field boosts, where
//!    importance terms carry an extra `^2` boost;
//! 2. a simplified query over `content` only, with query syntax stripped;
//! 3. one term query per search term, merged by document (best score kept).
//!
//! The first tier that executes wins. Only when all three fail does the call
//! return an error.

use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED,
};
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer, TokenStream,
};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::debug;

use crate::analyzer::STOP_WORDS;
use crate::models::{Document, QueryAnalysis};
use crate::synonyms;

/// Name under which the document analyzer is registered.
pub const DOCS_TOKENIZER: &str = "docs_en";

pub const TITLE_BOOST: f32 = 15.0;
pub const HEADINGS_BOOST: f32 = 10.0;
pub const CONTENT_BOOST: f32 = 5.0;
pub const URL_BOOST: f32 = 2.0;

/// Extra weight for importance terms in the advanced query.
const REQUIRED_TERM_BOOST: f32 = 2.0;

const WRITER_MEMORY_BYTES: usize = 50_000_000;

/// A document reference returned by the index, best-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    /// Position of the document in the slice the index was built from.
    pub ordinal: usize,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct IndexFields {
    ordinal: Field,
    title: Field,
    headings: Field,
    content: Field,
    url: Field,
}

impl IndexFields {
    fn weighted(&self) -> [(Field, f32); 4] {
        [
            (self.title, TITLE_BOOST),
            (self.headings, HEADINGS_BOOST),
            (self.content, CONTENT_BOOST),
            (self.url, URL_BOOST),
        ]
    }
}

fn build_schema() -> (Schema, IndexFields) {
    let mut builder = Schema::builder();
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(DOCS_TOKENIZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let text = TextOptions::default().set_indexing_options(indexing);

    let fields = IndexFields {
        ordinal: builder.add_u64_field("ordinal", STORED),
        title: builder.add_text_field("title", text.clone()),
        headings: builder.add_text_field("headings", text.clone()),
        content: builder.add_text_field("content", text.clone()),
        url: builder.add_text_field("url", text),
    };
    (builder.build(), fields)
}

/// The analyzer shared by indexing and query tokenization.
pub fn docs_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(
            STOP_WORDS.iter().map(|w| w.to_string()),
        ))
        .filter(Stemmer::new(Language::English))
        .build()
}

/// Replace query-syntax characters with spaces.
fn sanitize_term(term: &str) -> String {
    term.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

fn by_score_then_ordinal(a: &IndexHit, b: &IndexHit) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then(a.ordinal.cmp(&b.ordinal))
}

/// In-memory inverted index for one corpus epoch.
pub struct DocIndex {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
    analyzer: TextAnalyzer,
}

impl DocIndex {
    /// Build an index over `documents`. Hit ordinals refer to positions in
    /// this slice.
    pub fn build(documents: &[Document]) -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let analyzer = docs_analyzer();
        index.tokenizers().register(DOCS_TOKENIZER, analyzer.clone());

        let mut writer: IndexWriter = index
            .writer_with_num_threads(1, WRITER_MEMORY_BYTES)
            .context("Failed to create index writer")?;

        for (ordinal, document) in documents.iter().enumerate() {
            writer.add_document(doc!(
                fields.ordinal => ordinal as u64,
                fields.title => synonyms::expand_text(&document.title),
                fields.headings => synonyms::expand_text(&document.headings.join("\n")),
                fields.content => synonyms::expand_text(&document.content),
                fields.url => document.url.clone(),
            ))?;
        }
        writer.commit().context("Failed to commit index")?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .context("Failed to open index reader")?;

        Ok(Self {
            index,
            reader,
            fields,
            analyzer,
        })
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retrieve up to `limit` documents for the analyzed query.
    pub fn search(&self, analysis: &QueryAnalysis, limit: usize) -> Result<Vec<IndexHit>> {
        if analysis.filtered_terms.is_empty() {
            return Ok(Vec::new());
        }
        let limit = limit.max(1);

        self.advanced_query(analysis, limit)
            .or_else(|err| {
                debug!(error = %err, "advanced query failed, trying simplified query");
                self.simple_query(analysis, limit)
            })
            .or_else(|err| {
                debug!(error = %err, "simplified query failed, trying per-term queries");
                self.per_term_queries(analysis, limit)
            })
    }

    /// Tier 1: weighted multi-field query string.
    fn advanced_query(&self, analysis: &QueryAnalysis, limit: usize) -> Result<Vec<IndexHit>> {
        let clauses: Vec<String> = analysis
            .filtered_terms
            .iter()
            .map(|term| {
                if analysis.is_required(term) {
                    format!("{}^{}", term, REQUIRED_TERM_BOOST)
                } else {
                    term.clone()
                }
            })
            .collect();
        let query_text = clauses.join(" ");

        let mut parser = QueryParser::for_index(
            &self.index,
            self.fields.weighted().iter().map(|(f, _)| *f).collect(),
        );
        for (field, boost) in self.fields.weighted() {
            parser.set_field_boost(field, boost);
        }

        let query = parser
            .parse_query(&query_text)
            .with_context(|| format!("Advanced query rejected: {}", query_text))?;
        self.collect(query.as_ref(), limit)
    }

    /// Tier 2: plain terms against `content` only.
    fn simple_query(&self, analysis: &QueryAnalysis, limit: usize) -> Result<Vec<IndexHit>> {
        let query_text = analysis
            .filtered_terms
            .iter()
            .map(|t| sanitize_term(t))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if query_text.is_empty() {
            bail!("No searchable terms after sanitizing");
        }

        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        let query = parser
            .parse_query(&query_text)
            .with_context(|| format!("Simplified query rejected: {}", query_text))?;
        self.collect(query.as_ref(), limit)
    }

    /// Tier 3: one boolean term query per search term, merged by document.
    fn per_term_queries(&self, analysis: &QueryAnalysis, limit: usize) -> Result<Vec<IndexHit>> {
        let mut best: HashMap<usize, f64> = HashMap::new();
        let mut last_err = None;

        for term in &analysis.filtered_terms {
            let tokens = self.tokenize(term);
            if tokens.is_empty() {
                continue;
            }
            match self.collect(&self.term_query(&tokens), limit) {
                Ok(hits) => {
                    for hit in hits {
                        let score = best.entry(hit.ordinal).or_insert(hit.score);
                        if hit.score > *score {
                            *score = hit.score;
                        }
                    }
                }
                Err(err) => {
                    debug!(term = %term, error = %err, "term query failed");
                    last_err = Some(err);
                }
            }
        }

        if best.is_empty() {
            if let Some(err) = last_err {
                return Err(err.context("All per-term queries failed"));
            }
        }

        let mut hits: Vec<IndexHit> = best
            .into_iter()
            .map(|(ordinal, score)| IndexHit { ordinal, score })
            .collect();
        hits.sort_by(by_score_then_ordinal);
        hits.truncate(limit);
        Ok(hits)
    }

    fn term_query(&self, tokens: &[String]) -> BooleanQuery {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for (field, boost) in self.fields.weighted() {
            for token in tokens {
                let term = Term::from_field_text(field, token);
                let query = TermQuery::new(term, IndexRecordOption::WithFreqs);
                clauses.push((Occur::Should, Box::new(BoostQuery::new(Box::new(query), boost))));
            }
        }
        BooleanQuery::new(clauses)
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut tokens = Vec::new();
        while stream.advance() {
            tokens.push(stream.token().text.clone());
        }
        tokens
    }

    fn collect(&self, query: &dyn Query, limit: usize) -> Result<Vec<IndexHit>> {
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: TantivyDocument = searcher.doc(address)?;
            let ordinal = stored
                .get_first(self.fields.ordinal)
                .and_then(|v| v.as_u64())
                .context("Indexed document is missing its ordinal")?;
            hits.push(IndexHit {
                ordinal: ordinal as usize,
                score: f64::from(score),
            });
        }
        hits.sort_by(by_score_then_ordinal);
        Ok(hits)
    }
}
