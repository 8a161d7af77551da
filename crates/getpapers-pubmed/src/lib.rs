//! getpapers PubMed - find papers with non-academic authors
//!
//! Searches PubMed through NCBI E-utilities, fetches article metadata in
//! concurrent rate-limited batches and keeps the papers that have at least
//! one author with a commercial affiliation.
//!
//! # Features
//!
//! - One esearch with server-side history, then paged efetch calls
//! - Shared rolling-window rate limiter across all workers
//! - Streaming XML parsing with quick-xml, per-article fault tolerance
//! - Keyword heuristics for academic vs. commercial affiliations
//!
//! # Example
//!
//! ```ignore
//! use getpapers_core::ProgressContext;
//! use getpapers_pubmed::{Config, run};
//!
//! let config = Config {
//!     email: Some("me@example.org".into()),
//!     max_results: 100,
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, "cancer AND 2023[dp]", &ProgressContext::new())?;
//! println!("{} of {} papers match", summary.papers.len(), summary.fetched);
//! ```

pub mod classify;
pub mod config;
pub mod eutils;
pub mod fetcher;
pub mod model;
pub mod parser;
pub mod retriever;
pub mod runner;
pub mod transform;

#[cfg(test)]
mod testing;

// Re-exports
pub use classify::{Classification, classify_authors, filter_non_academic};
pub use config::Config;
pub use eutils::{EntrezApi, EutilsClient, HistorySession, SearchResult};
pub use fetcher::{Batch, BatchFetcher};
pub use model::{Author, Paper};
pub use retriever::Retriever;
pub use runner::{Summary, run, run_with};
