//! Pattern matchers and the extractor capability they are built on

use crate::error::{ObexError, Result};
use crate::observables::ObservableKind;
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Default delimiter for capture-join extraction
pub const DEFAULT_DELIMITER: &str = "_";

/// Reference to a capture group, by position or by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CaptureRef {
    Index(usize),
    Name(String),
}

impl From<usize> for CaptureRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for CaptureRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl fmt::Display for CaptureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{}", index),
            Self::Name(name) => write!(f, "{}", name),
        }
    }
}

/// How raw strings are pulled out of a match
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Every non-overlapping whole-pattern match, left to right
    FindAll,
    /// First match only; the listed groups joined with `delimiter`
    CaptureJoin {
        groups: Vec<CaptureRef>,
        delimiter: String,
    },
}

/// Per-document extraction failure. Never escapes a `PatternMatcher`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("capture group {index} out of range (pattern has {available} groups)")]
    GroupOutOfRange { index: usize, available: usize },

    #[error("no capture group named '{0}'")]
    UnknownGroupName(String),

    #[error("capture group {0} did not participate in the match")]
    GroupNotMatched(CaptureRef),

    #[error("{0}")]
    Custom(String),
}

/// Capability every matcher implementation satisfies
///
/// Implement this for extraction logic that is not a plain find-all or
/// ordered capture join, then register it with [`PatternMatcher::custom`].
pub trait Extractor: Send + Sync + fmt::Debug {
    fn extract(&self, text: &str) -> std::result::Result<Vec<String>, ExtractionError>;

    /// Short human-readable description, used for listings
    fn describe(&self) -> String {
        "custom".to_string()
    }
}

/// Regex flags a caller may toggle per matcher
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
    pub ignore_whitespace: bool,
}

impl PatternFlags {
    fn compile(&self, pattern: &str) -> std::result::Result<Regex, regex::Error> {
        RegexBuilder::new(pattern)
            .case_insensitive(self.case_insensitive)
            .multi_line(self.multi_line)
            .dot_matches_new_line(self.dot_matches_new_line)
            .ignore_whitespace(self.ignore_whitespace)
            .build()
    }
}

/// Built-in regex extractor
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    regex: Regex,
    mode: ExtractionMode,
}

impl RegexExtractor {
    pub fn new(regex: Regex, mode: ExtractionMode) -> Self {
        Self { regex, mode }
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn mode(&self) -> &ExtractionMode {
        &self.mode
    }

    fn group<'t>(
        &self,
        caps: &Captures<'t>,
        group: &CaptureRef,
    ) -> std::result::Result<&'t str, ExtractionError> {
        let found = match group {
            CaptureRef::Index(index) => {
                let available = self.regex.captures_len();
                if *index >= available {
                    return Err(ExtractionError::GroupOutOfRange {
                        index: *index,
                        available,
                    });
                }
                caps.get(*index)
            }
            CaptureRef::Name(name) => {
                if !self.regex.capture_names().flatten().any(|n| n == name) {
                    return Err(ExtractionError::UnknownGroupName(name.clone()));
                }
                caps.name(name)
            }
        };

        found
            .map(|m| m.as_str())
            .ok_or_else(|| ExtractionError::GroupNotMatched(group.clone()))
    }

    /// Group references that cannot exist in this pattern
    fn dangling_groups(&self) -> Vec<&CaptureRef> {
        let ExtractionMode::CaptureJoin { groups, .. } = &self.mode else {
            return Vec::new();
        };
        groups
            .iter()
            .filter(|group| match group {
                CaptureRef::Index(index) => *index >= self.regex.captures_len(),
                CaptureRef::Name(name) => !self.regex.capture_names().flatten().any(|n| n == name),
            })
            .collect()
    }
}

impl Extractor for RegexExtractor {
    fn extract(&self, text: &str) -> std::result::Result<Vec<String>, ExtractionError> {
        match &self.mode {
            ExtractionMode::FindAll => Ok(self
                .regex
                .find_iter(text)
                .map(|m| m.as_str().to_string())
                .collect()),
            ExtractionMode::CaptureJoin { groups, delimiter } => {
                let Some(caps) = self.regex.captures(text) else {
                    return Ok(Vec::new());
                };

                let parts = groups
                    .iter()
                    .map(|group| self.group(&caps, group))
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                Ok(vec![parts.join(delimiter)])
            }
        }
    }

    fn describe(&self) -> String {
        match &self.mode {
            ExtractionMode::FindAll => format!("find_all /{}/", self.regex.as_str()),
            ExtractionMode::CaptureJoin { groups, delimiter } => {
                let groups: Vec<String> = groups.iter().map(|g| g.to_string()).collect();
                format!(
                    "capture_join [{}] {:?} /{}/",
                    groups.join(","),
                    delimiter,
                    self.regex.as_str()
                )
            }
        }
    }
}

/// One registered matcher: an extractor plus the metadata stamped on its hits
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pub kind: ObservableKind,
    pub tags: Vec<String>,
    pub directives: Vec<String>,
    extractor: Arc<dyn Extractor>,
}

impl PatternMatcher {
    /// Start building a regex matcher
    pub fn builder(pattern: impl Into<String>, kind: impl Into<ObservableKind>) -> MatcherBuilder {
        MatcherBuilder::new(pattern, kind)
    }

    /// Whole-match matcher with default flags
    pub fn find_all(pattern: &str, kind: impl Into<ObservableKind>) -> Result<Self> {
        Self::builder(pattern, kind).build()
    }

    /// Register a caller-supplied extractor
    pub fn custom(kind: impl Into<ObservableKind>, extractor: impl Extractor + 'static) -> Self {
        Self {
            kind: kind.into().canonical(),
            tags: Vec::new(),
            directives: Vec::new(),
            extractor: Arc::new(extractor),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives = directives.into_iter().map(Into::into).collect();
        self
    }

    /// Extract raw values from text
    ///
    /// Extraction failures are logged and degrade to no results so one bad
    /// document cannot abort a batch.
    pub fn extract(&self, text: &str) -> Vec<String> {
        match self.extractor.extract(text) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!("{} matcher produced no results: {}", self.kind, e);
                Vec::new()
            }
        }
    }

    pub fn describe(&self) -> String {
        self.extractor.describe()
    }
}

/// Builder for regex-backed [`PatternMatcher`]s
#[derive(Debug, Clone)]
pub struct MatcherBuilder {
    pattern: String,
    kind: ObservableKind,
    flags: PatternFlags,
    capture_groups: Option<Vec<CaptureRef>>,
    delimiter: String,
    tags: Vec<String>,
    directives: Vec<String>,
}

impl MatcherBuilder {
    fn new(pattern: impl Into<String>, kind: impl Into<ObservableKind>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: kind.into().canonical(),
            flags: PatternFlags::default(),
            capture_groups: None,
            delimiter: DEFAULT_DELIMITER.to_string(),
            tags: Vec::new(),
            directives: Vec::new(),
        }
    }

    pub fn flags(mut self, flags: PatternFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn case_insensitive(mut self, yes: bool) -> Self {
        self.flags.case_insensitive = yes;
        self
    }

    /// Switch to capture-join extraction over the given groups
    pub fn capture_groups<I, G>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<CaptureRef>,
    {
        self.capture_groups = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives = directives.into_iter().map(Into::into).collect();
        self
    }

    /// Compile the pattern. Invalid syntax fails here, never at extraction time.
    pub fn build(self) -> Result<PatternMatcher> {
        let regex = self
            .flags
            .compile(&self.pattern)
            .map_err(|e| ObexError::InvalidPattern {
                kind: self.kind.to_string(),
                message: e.to_string(),
            })?;

        let mode = match self.capture_groups {
            None => ExtractionMode::FindAll,
            Some(groups) => ExtractionMode::CaptureJoin {
                groups,
                delimiter: self.delimiter,
            },
        };

        let extractor = RegexExtractor::new(regex, mode);
        for group in extractor.dangling_groups() {
            tracing::warn!(
                "{} matcher references capture group {} which does not exist in /{}/",
                self.kind,
                group,
                extractor.regex().as_str()
            );
        }

        Ok(PatternMatcher {
            kind: self.kind,
            tags: self.tags,
            directives: self.directives,
            extractor: Arc::new(extractor),
        })
    }
}
