//! Obex - Observable Extraction
//!
//! Runs a configurable set of pattern matchers over unstructured text (log
//! lines, email bodies, crawled pages) and turns the hits into typed,
//! deduplicated observables carrying tags and processing directives for a
//! downstream analysis pipeline.

pub mod cli;
pub mod config;
pub mod error;
pub mod indicators;
pub mod observables;
pub mod patterns;

pub use error::{ObexError, Result};
pub use observables::{
    ContentScanner, ExtractionResult, MatcherGroup, MetadataPolicy, ObservableKind,
    ObservableRecord,
};
pub use patterns::{Extractor, PatternMatcher};
