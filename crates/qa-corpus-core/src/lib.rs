//! # QA Corpus Core
//!
//! Store-agnostic logic for QA Corpus: document models, token estimation,
//! validation, client-side shaping, statistics, and the store trait.
//!
//! This crate contains no tokio runtime, sqlx, HTTP, or filesystem I/O.
//! The same validator runs in the shaper (before submission) and in the
//! server (on receipt).

pub mod models;
pub mod shaper;
pub mod stats;
pub mod store;
pub mod tokens;
pub mod validate;
