//! Observable extraction
//!
//! This module provides:
//! - `ObservableKind` and the `ObservableRecord` submitted downstream
//! - `MatcherGroup`, which runs matchers and deduplicates their hits per kind
//! - `ContentScanner`, an extract-then-read wrapper over a group
//! - URL de-fang repair applied before deduplication

mod group;
mod kind;
pub mod normalize;
mod record;
mod scanner;

pub use group::{ExtractionResult, MatcherGroup, MetadataPolicy};
pub use kind::ObservableKind;
pub use normalize::fang;
pub use record::ObservableRecord;
pub use scanner::ContentScanner;
