//! Configuration-driven pattern matchers
//!
//! This module provides:
//! - The `Extractor` capability and the built-in `RegexExtractor`
//! - `PatternMatcher`, a compiled pattern plus the tags and directives it stamps
//! - Matcher definition files (`[[matcher]]` tables) compiled into matchers
//!
//! Patterns live in configuration (see config-templates/matchers.toml), not in code.

mod matcher;

pub use matcher::{
    CaptureRef, ExtractionError, ExtractionMode, Extractor, MatcherBuilder, PatternFlags,
    PatternMatcher, RegexExtractor, DEFAULT_DELIMITER,
};

use crate::error::{ObexError, Result};
use crate::observables::ObservableKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

/// Matcher definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(rename = "type")]
    pub kind: ObservableKind,
    pub pattern: String,
    #[serde(default)]
    pub flags: PatternFlags,
    /// Groups to join; absent means find-all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_groups: Option<Vec<CaptureRef>>,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub directives: Vec<String>,
    #[serde(default)]
    pub description: String,
}

/// Matcher definitions file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchersConfig {
    /// Tags for matchers that declare none of their own
    #[serde(default)]
    pub default_tags: Vec<String>,
    #[serde(default)]
    pub matcher: Vec<MatcherConfig>,
}

impl MatchersConfig {
    /// Load matcher definitions from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ObexError::Io {
            source: e,
            context: format!("Failed to read matchers file: {:?}", path),
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Compile every definition, failing on the first invalid pattern
    pub fn compile(&self) -> Result<Vec<PatternMatcher>> {
        self.matcher
            .iter()
            .enumerate()
            .map(|(idx, cfg)| {
                cfg.compile().map_err(|e| match e {
                    ObexError::InvalidPattern { kind, message } => ObexError::InvalidPattern {
                        kind,
                        message: format!("matcher #{}: {}", idx, message),
                    },
                    other => other,
                })
            })
            .collect()
    }
}

impl MatcherConfig {
    pub fn compile(&self) -> Result<PatternMatcher> {
        let mut builder = PatternMatcher::builder(self.pattern.as_str(), self.kind.clone())
            .flags(self.flags)
            .delimiter(self.delimiter.as_str())
            .tags(self.tags.iter().cloned())
            .directives(self.directives.iter().cloned());

        if let Some(groups) = &self.capture_groups {
            builder = builder.capture_groups(groups.iter().cloned());
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MATCHERS: &str = r#"
default_tags = ["phish"]

[[matcher]]
type = "url"
pattern = 'hxxps?://[^\s"<>]+'
flags = { case_insensitive = true }
tags = ["defanged"]
directives = ["crawl"]

[[matcher]]
type = "email_conversation"
pattern = 'From:\s*(\S+@\S+)\s+To:\s*(\S+@\S+)'
capture_groups = [1, 2]
delimiter = "|"

[[matcher]]
type = "ticket"
pattern = '(?P<queue>[A-Z]+)-(?P<num>\d+)'
capture_groups = ["num", "queue"]
"#;

    #[test]
    fn test_parse_matchers_file() {
        let config = MatchersConfig::from_toml(MATCHERS).unwrap();

        assert_eq!(config.default_tags, vec!["phish"]);
        assert_eq!(config.matcher.len(), 3);
        assert_eq!(config.matcher[0].kind, ObservableKind::Url);
        assert!(config.matcher[0].flags.case_insensitive);
        assert_eq!(config.matcher[0].capture_groups, None);
        assert_eq!(config.matcher[0].delimiter, "_");
        assert_eq!(
            config.matcher[1].capture_groups,
            Some(vec![CaptureRef::Index(1), CaptureRef::Index(2)])
        );
        assert_eq!(
            config.matcher[2].capture_groups,
            Some(vec![CaptureRef::from("num"), CaptureRef::from("queue")])
        );
        assert_eq!(
            config.matcher[2].kind,
            ObservableKind::Other("ticket".to_string())
        );
    }

    #[test]
    fn test_compile_matchers() {
        let matchers = MatchersConfig::from_toml(MATCHERS).unwrap().compile().unwrap();

        assert_eq!(matchers.len(), 3);
        assert_eq!(
            matchers[0].extract("see HXXPS://evil.example/a now"),
            vec!["HXXPS://evil.example/a"]
        );
        assert_eq!(
            matchers[1].extract("From: a@x.com To: b@y.com"),
            vec!["a@x.com|b@y.com"]
        );
        assert_eq!(matchers[2].extract("SEC-42"), vec!["42_SEC"]);
        assert_eq!(matchers[0].directives, vec!["crawl"]);
    }

    #[test]
    fn test_compile_reports_matcher_index() {
        let config = MatchersConfig::from_toml(
            r#"
[[matcher]]
type = "ipv4"
pattern = '\d+'

[[matcher]]
type = "url"
pattern = '(broken'
"#,
        )
        .unwrap();

        match config.compile() {
            Err(ObexError::InvalidPattern { kind, message }) => {
                assert_eq!(kind, "url");
                assert!(message.starts_with("matcher #1:"));
            }
            other => panic!("expected invalid pattern, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file_is_valid() {
        let config = MatchersConfig::from_toml("").unwrap();
        assert!(config.matcher.is_empty());
        assert!(config.compile().unwrap().is_empty());
    }
}
