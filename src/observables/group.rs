//! Matcher group orchestration
//!
//! Runs every registered matcher over a document, normalizes and deduplicates
//! the hits per kind, and tracks the tags and directives for each value.

use crate::error::Result;
use crate::observables::{normalize, ObservableKind, ObservableRecord};
use crate::patterns::{MatchersConfig, PatternMatcher};
use ahash::HashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// How tags and directives combine when several matchers yield the same value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataPolicy {
    /// The last matcher (in registration order) to produce a value owns its metadata
    #[default]
    LastWins,
    /// Ordered, duplicate-free union across all contributing matchers
    Merge,
}

/// Ordered collection of matchers applied together
#[derive(Debug, Clone, Default)]
pub struct MatcherGroup {
    matchers: Vec<PatternMatcher>,
    default_tags: Vec<String>,
    policy: MetadataPolicy,
    max_input_bytes: Option<usize>,
}

impl MatcherGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group whose tags apply to matchers registered without tags of their own
    pub fn with_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            default_tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Build a group from matcher definitions
    pub fn from_config(config: &MatchersConfig) -> Result<Self> {
        let mut group = Self::with_tags(config.default_tags.iter().cloned());
        for matcher in config.compile()? {
            group.add(matcher);
        }
        tracing::debug!("Compiled {} matchers", group.len());
        Ok(group)
    }

    pub fn with_policy(mut self, policy: MetadataPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound the number of bytes scanned per document
    pub fn with_max_input_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_input_bytes = limit;
        self
    }

    /// Register a matcher; it runs after every matcher registered before it
    pub fn add(&mut self, mut matcher: PatternMatcher) -> &mut Self {
        matcher.kind = matcher.kind.canonical();
        if matcher.tags.is_empty() {
            matcher.tags = self.default_tags.clone();
        }
        self.matchers.push(matcher);
        self
    }

    pub fn matchers(&self) -> &[PatternMatcher] {
        &self.matchers
    }

    pub fn policy(&self) -> MetadataPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Run all matchers over `text`
    ///
    /// Every call builds a fresh result; the group itself is never mutated, so
    /// one group can serve concurrent extractions.
    pub fn extract(&self, text: &str) -> ExtractionResult {
        let text = self.bounded(text);
        let mut result = ExtractionResult::default();

        // Registered kinds appear even when nothing matched
        for matcher in &self.matchers {
            result.by_kind.entry(matcher.kind.clone()).or_default();
        }

        for matcher in &self.matchers {
            let raw = matcher.extract(text);
            tracing::debug!("{} matcher yielded {} raw values", matcher.kind, raw.len());

            for value in raw {
                let trimmed = value.trim();
                let value = if matcher.kind.is_url() {
                    normalize::fang(trimmed)
                } else {
                    trimmed.to_string()
                };

                result
                    .by_kind
                    .entry(matcher.kind.clone())
                    .or_default()
                    .insert(value.clone());
                result.record_metadata(value, matcher, self.policy);
            }
        }

        result
    }

    fn bounded<'a>(&self, text: &'a str) -> &'a str {
        match self.max_input_bytes {
            Some(limit) if text.len() > limit => {
                let mut end = limit;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                tracing::warn!(
                    "Input of {} bytes truncated to {} bytes before extraction",
                    text.len(),
                    end
                );
                &text[..end]
            }
            _ => text,
        }
    }
}

/// Outcome of one [`MatcherGroup::extract`] call
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    by_kind: BTreeMap<ObservableKind, BTreeSet<String>>,
    tags: HashMap<String, Vec<String>>,
    directives: HashMap<String, Vec<String>>,
    records: OnceLock<Vec<ObservableRecord>>,
}

impl ExtractionResult {
    fn record_metadata(&mut self, value: String, matcher: &PatternMatcher, policy: MetadataPolicy) {
        match policy {
            MetadataPolicy::LastWins => {
                self.tags.insert(value.clone(), matcher.tags.clone());
                self.directives.insert(value, matcher.directives.clone());
            }
            MetadataPolicy::Merge => {
                merge_into(self.tags.entry(value.clone()).or_default(), &matcher.tags);
                merge_into(self.directives.entry(value).or_default(), &matcher.directives);
            }
        }
    }

    /// Observables ready for submission, ordered by kind then value
    ///
    /// Materialized on first call and cached for the life of this result.
    pub fn observables(&self) -> &[ObservableRecord] {
        self.records.get_or_init(|| self.materialize())
    }

    /// Deduplicated values per registered kind
    pub fn observables_by_kind(&self) -> &BTreeMap<ObservableKind, BTreeSet<String>> {
        &self.by_kind
    }

    /// Values for one kind, or `None` if no matcher of that kind is registered
    pub fn values(&self, kind: &ObservableKind) -> Option<&BTreeSet<String>> {
        match kind {
            ObservableKind::Other(name) => self.by_kind.get(&ObservableKind::from(name.as_str())),
            known => self.by_kind.get(known),
        }
    }

    pub fn tags_for(&self, value: &str) -> Option<&[String]> {
        self.tags.get(value).map(Vec::as_slice)
    }

    pub fn directives_for(&self, value: &str) -> Option<&[String]> {
        self.directives.get(value).map(Vec::as_slice)
    }

    /// Number of unique (kind, value) pairs
    pub fn len(&self) -> usize {
        self.by_kind.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_observables(mut self) -> Vec<ObservableRecord> {
        match self.records.take() {
            Some(records) => records,
            None => self.materialize(),
        }
    }

    fn materialize(&self) -> Vec<ObservableRecord> {
        self.by_kind
            .iter()
            .flat_map(|(kind, values)| {
                values.iter().map(move |value| ObservableRecord {
                    kind: kind.clone(),
                    value: value.clone(),
                    tags: self.tags.get(value).cloned().unwrap_or_default(),
                    directives: self.directives.get(value).cloned().unwrap_or_default(),
                })
            })
            .collect()
    }
}

fn merge_into(existing: &mut Vec<String>, incoming: &[String]) {
    for item in incoming {
        if !existing.contains(item) {
            existing.push(item.clone());
        }
    }
}
