//! Configuration management for obex
//!
//! Handles loading, validation, environment overrides and profiles for the
//! engine settings. Matcher definitions live in their own file referenced by
//! `patterns.matchers_file`.

use crate::error::{ObexError, Result};
use crate::observables::{MatcherGroup, MetadataPolicy};
use crate::patterns::MatchersConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

mod validator;

pub use validator::ConfigValidator;

/// Schema version this build understands
pub const SCHEMA_VERSION: &str = "1.0.0";

/// File names inside the obex config directory
pub const CONFIG_FILE: &str = "config.toml";
pub const MATCHERS_FILE: &str = "matchers.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "_meta")]
    pub meta: MetaConfig,
    pub engine: EngineConfig,
    pub patterns: PatternsConfig,
    #[serde(default)]
    pub profiles: HashMap<String, ProfileOverrides>,
}

/// Metadata about the configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaConfig {
    pub schema_version: String,
    #[serde(default = "current_timestamp")]
    pub created_at: String,
    #[serde(default = "current_timestamp")]
    pub last_modified: String,
}

fn current_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Extraction engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub metadata_policy: MetadataPolicy,
    /// Per-document scan limit such as "10MB"; unset scans everything
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_input_size: Option<String>,
    /// Tags for matchers that declare none, when the matchers file sets no defaults
    #[serde(default)]
    pub default_tags: Vec<String>,
}

/// Pattern configuration - path to the matcher definitions file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternsConfig {
    pub matchers_file: PathBuf,
}

/// Profile-specific configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_policy: Option<MetadataPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_input_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matchers_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ObexError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ObexError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        ConfigValidator::validate(&config)?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ObexError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Load configuration with a specific profile applied
    pub fn load_with_profile(path: &Path, profile: &str) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_profile(profile)?;
        ConfigValidator::validate(&config)?;
        Ok(config)
    }

    /// Apply a profile's overrides to the configuration
    pub fn apply_profile(&mut self, profile: &str) -> Result<()> {
        let overrides = self
            .profiles
            .get(profile)
            .cloned()
            .ok_or_else(|| ObexError::Config(format!("Unknown profile: {}", profile)))?;

        if let Some(policy) = overrides.metadata_policy {
            self.engine.metadata_policy = policy;
        }
        if let Some(size) = overrides.max_input_size {
            self.engine.max_input_size = Some(size);
        }
        if let Some(file) = overrides.matchers_file {
            self.patterns.matchers_file = file;
        }
        Ok(())
    }

    /// Apply environment variable overrides
    /// Environment variables in format: OBEX_SECTION__KEY=value
    pub fn apply_env_overrides(&mut self) {
        for (key, value) in std::env::vars() {
            if let Some(config_key) = key.strip_prefix("OBEX_") {
                if let Err(e) = self.set_value_from_env(config_key, &value) {
                    tracing::warn!("Failed to apply env override {}: {}", key, e);
                }
            }
        }
    }

    fn set_value_from_env(&mut self, path: &str, value: &str) -> Result<()> {
        match path {
            "ENGINE__METADATA_POLICY" => {
                self.engine.metadata_policy = match value {
                    "last_wins" => MetadataPolicy::LastWins,
                    "merge" => MetadataPolicy::Merge,
                    _ => {
                        return Err(ObexError::InvalidConfigValue {
                            path: path.to_string(),
                            message: format!(
                                "Expected 'last_wins' or 'merge', got '{}'",
                                value
                            ),
                        })
                    }
                };
            }
            "ENGINE__MAX_INPUT_SIZE" => {
                if parse_size(value).is_none() {
                    return Err(ObexError::InvalidConfigValue {
                        path: path.to_string(),
                        message: format!("Cannot parse '{}' as a size", value),
                    });
                }
                self.engine.max_input_size = Some(value.to_string());
            }
            "PATTERNS__MATCHERS_FILE" => {
                self.patterns.matchers_file = PathBuf::from(value);
            }
            _ => {
                tracing::warn!("Ignoring unknown env config key: OBEX_{}", path);
            }
        }
        Ok(())
    }

    /// Scan limit in bytes, if one is configured
    pub fn max_input_bytes(&self) -> Result<Option<usize>> {
        match &self.engine.max_input_size {
            None => Ok(None),
            Some(size) => parse_size(size)
                .map(Some)
                .ok_or_else(|| ObexError::InvalidConfigValue {
                    path: "engine.max_input_size".to_string(),
                    message: format!("Invalid size format: {}", size),
                }),
        }
    }

    /// Compile the configured matchers into a ready-to-use group
    pub fn build_group(&self) -> Result<MatcherGroup> {
        self.group_from_file(&self.patterns.matchers_file)
    }

    /// Compile matchers from `path` using this configuration's engine settings
    pub fn group_from_file(&self, path: &Path) -> Result<MatcherGroup> {
        let path = expand_path(path)?;
        let mut matchers = MatchersConfig::from_file(&path)?;
        if matchers.default_tags.is_empty() {
            matchers.default_tags = self.engine.default_tags.clone();
        }

        let group = MatcherGroup::from_config(&matchers)?
            .with_policy(self.engine.metadata_policy)
            .with_max_input_bytes(self.max_input_bytes()?);

        tracing::info!("Loaded {} matchers from {:?}", group.len(), path);
        Ok(group)
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = config_dir()
            .ok_or_else(|| ObexError::Config("Cannot determine config directory".to_string()))?;

        Ok(config_dir.join(CONFIG_FILE))
    }
}

/// Platform config directory for obex (`~/.config/obex` on Linux)
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("obex"))
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = config_dir().unwrap_or_else(|| PathBuf::from("~/.config/obex"));

        Self {
            meta: MetaConfig {
                schema_version: SCHEMA_VERSION.to_string(),
                created_at: current_timestamp(),
                last_modified: current_timestamp(),
            },
            engine: EngineConfig {
                metadata_policy: MetadataPolicy::LastWins,
                max_input_size: Some("10MB".to_string()),
                default_tags: Vec::new(),
            },
            patterns: PatternsConfig {
                matchers_file: config_dir.join(MATCHERS_FILE),
            },
            profiles: HashMap::new(),
        }
    }
}

/// Parse sizes like "512", "64KB", "10MB", "1GB" (binary multiples)
pub fn parse_size(s: &str) -> Option<usize> {
    let s = s.trim().to_uppercase();
    let (digits, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1usize << 30)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1 << 20)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1 << 10)
    } else if let Some(n) = s.strip_suffix('B') {
        (n, 1)
    } else {
        (s.as_str(), 1)
    };

    digits.trim().parse::<usize>().ok()?.checked_mul(multiplier)
}

/// Expand a leading `~/` to the home directory
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let path_str = path
        .to_str()
        .ok_or_else(|| ObexError::Config("Invalid path encoding".to_string()))?;

    if let Some(stripped) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| ObexError::Config("Cannot determine home directory".to_string()))?;
        Ok(home.join(stripped))
    } else {
        Ok(path.to_path_buf())
    }
}
