//! # Context Ranker
//!
//! Query-aware retrieval over a flat documentation export.
//!
//! The export (one text file of blank-line-delimited sections) is fetched,
//! parsed, indexed and cached as an epoch. Each query is analyzed for intent,
//! matched against a synonym-expanded index, re-scored with documentation
//! heuristics and curated into a short, section-diverse list ready to feed a
//! chat prompt.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │ CorpusSource│──▶│ CorpusCache │──▶│    Epoch     │
//! │ HTTP / File │   │ TTL, single │   │ docs + index │
//! └─────────────┘   │   flight    │   └──────┬───────┘
//!                   └─────────────┘          │
//!                      ┌─────────────────────┤
//!                      ▼                     ▼
//!                 ┌──────────┐         ┌──────────┐
//!                 │   CLI    │         │   HTTP   │
//!                 │  (ctxr)  │         │  (axum)  │
//!                 └──────────┘         └──────────┘
//! ```
//!
//! The ranking pipeline itself (analyzer, index, scorer, curator) lives in
//! the `context-ranker-core` crate and performs no I/O.
//!
//! ## Quick Start
//!
//! ```bash
//! ctxr inspect                       # fetch and summarize the corpus
//! ctxr search "what is icm"          # ranked results
//! ctxr search "l1 deploy" --explain  # with score breakdown
//! ctxr analyze "how do I run a validator"
//! ctxr serve                         # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`source`] | Export origins (HTTP, file, static) |
//! | [`cache`] | Corpus epochs and single-flight rebuilds |
//! | [`search`] | Search entry point and CLI printers |
//! | [`server`] | HTTP API |

pub mod cache;
pub mod config;
pub mod search;
pub mod server;
pub mod source;
