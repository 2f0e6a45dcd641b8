//! # QA Corpus
//!
//! Curation tooling for FAQ, reverse-prompt and generic QA training
//! documents.
//!
//! Documents are shaped and validated on the client, posted in batches to
//! an HTTP server, validated again, and stored in SQLite. The server also
//! answers taxonomy queries (distinct contexts and categories) and
//! aggregate token statistics.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Form/Shaper │──▶│ HTTP server │──▶│  SQLite  │
//! │  (submit)   │   │  validate   │   │ qa_pairs │
//! └─────────────┘   └──────┬──────┘   └────┬─────┘
//!                          │               │
//!                          ▼               ▼
//!                   taxonomy/stats     corpus CLI
//! ```
//!
//! The document model, validator, shaper and [`Store`](qa_corpus_core::store::Store)
//! trait live in `qa-corpus-core`; this crate adds the SQLite backend, the
//! server, the HTTP client and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`db`] | SQLite connection lifecycle |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite `Store` implementation |
//! | [`ingest`] | Batch validation and insertion |
//! | [`server`] | HTTP API |
//! | [`client`] | HTTP client for a running server |
//! | [`submit`] | File-driven batch submission |
//! | [`get`], [`stats`], [`taxonomy`] | Read-only CLI commands |

pub mod client;
pub mod config;
pub mod db;
pub mod get;
pub mod ingest;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
pub mod stats;
pub mod submit;
pub mod taxonomy;
