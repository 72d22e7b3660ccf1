//! # site-enricher - Website Enrichment Pipeline for Rust
//!
//! This crate takes a list of websites and derives structured metadata for
//! each one: the CMS or framework it is built with, the industries it likely
//! belongs to, its most frequent topic words and its brand colors. Every
//! signal is computed with deterministic rules and the site itself is the only
//! host contacted.
//!
//! ## Features
//!
//! - Single-attempt page fetching with timeout, user agent and optional
//!   global rate limit
//! - HTML content extraction that skips navigation, scripts and other noise
//! - Rule-based classifiers:
//!   - Platform detection from HTML signatures
//!   - Industry scoring from weighted keyword lists
//!   - Tag extraction with rank-decayed confidence
//!   - Brand color selection from meta tags and CSS
//! - Injectable rule tables, loadable from JSON
//! - Bounded-concurrency orchestration where a failing row never aborts the run
//! - CSV input and output with passthrough columns
//!
//! ## Example
//!
//! ```rust,no_run
//! use site_enricher::pipeline::EnrichJob;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let job = EnrichJob::new("sites.csv", "enriched.csv");
//!     let rows = job.load()?;
//!
//!     let summary = job.run(rows, None).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

mod error;

pub mod classifier;
pub mod extractor;
pub mod fetcher;
pub mod pipeline;
pub mod table;

pub use error::{Error, Result};
