use crate::config::{parse_size, Config, SCHEMA_VERSION};
use crate::error::{ObexError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration, collecting every problem found
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_engine(config, &mut errors);
        Self::validate_patterns(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ObexError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_engine(config: &Config, errors: &mut Vec<ValidationError>) {
        if let Some(size) = &config.engine.max_input_size {
            match parse_size(size) {
                None => errors.push(ValidationError::new(
                    "engine.max_input_size",
                    format!("Invalid size format: {}", size),
                )),
                Some(0) => errors.push(ValidationError::new(
                    "engine.max_input_size",
                    "Max input size must be greater than 0",
                )),
                Some(_) => {}
            }
        }

        if config.engine.default_tags.iter().any(|t| t.trim().is_empty()) {
            errors.push(ValidationError::new(
                "engine.default_tags",
                "Tags cannot be empty",
            ));
        }
    }

    fn validate_patterns(config: &Config, errors: &mut Vec<ValidationError>) {
        // Existence is checked when the matchers are loaded; paths may still need ~ expansion
        if config.patterns.matchers_file.as_os_str().is_empty() {
            errors.push(ValidationError::new(
                "patterns.matchers_file",
                "Matchers file path cannot be empty",
            ));
        }

        for (name, profile) in &config.profiles {
            if let Some(size) = &profile.max_input_size {
                if parse_size(size).unwrap_or(0) == 0 {
                    errors.push(ValidationError::new(
                        format!("profiles.{}.max_input_size", name),
                        format!("Invalid size: {}", size),
                    ));
                }
            }
        }
    }
}
