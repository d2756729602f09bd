//! # Context Ranker Core
//!
//! Pure ranking logic for Context Ranker: corpus parsing, the synonym table,
//! the weighted inverted index, query analysis, scoring, and result curation.
//!
//! This crate contains no tokio, network, or filesystem I/O. The calling
//! application owns fetching the corpus export and caching each epoch; this
//! crate turns an export into [`models::Document`]s and ranks them for a query.
//!
//! ```text
//! export ──▶ corpus::parse_export ──▶ index::DocIndex::build
//!                                           │
//! query ──▶ analyzer::analyze ──▶ candidates ┴─▶ scorer ──▶ curate ──▶ results
//! ```

pub mod analyzer;
pub mod corpus;
pub mod curate;
pub mod index;
pub mod models;
pub mod scorer;
pub mod search;
pub mod synonyms;
