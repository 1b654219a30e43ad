//! Configuration validation module

use crate::config::{
    CacheSettings, ContractValidationConfig, DiscoveryConfig, LoggingConfig,
    SecurityVerificationConfig,
};
use tracing_subscriber::EnvFilter;

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Cache configuration error: {message}")]
    Cache { message: String },

    #[error("Security verification configuration error: {message}")]
    Security { message: String },

    #[error("Discovery configuration error: {message}")]
    Discovery { message: String },

    #[error("Logging configuration error: {message}")]
    Logging { message: String },
}

impl ValidationError {
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::Security {
            message: message.into(),
        }
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }
}

impl Validate for CacheSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_seconds == 0 {
            return Err(ValidationError::cache(
                "Contract cache TTL must be greater than 0 seconds",
            ));
        }
        Ok(())
    }
}

impl Validate for SecurityVerificationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("heuristic_confidence", self.heuristic_confidence),
            (
                "substring_match_min_confidence",
                self.substring_match_min_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::security(format!(
                    "{name} must be between 0.0 and 1.0, got: {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Validate for DiscoveryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.candidates.is_empty() {
            return Err(ValidationError::discovery(
                "At least one contract candidate path is required",
            ));
        }
        if let Some(absolute) = self.candidates.iter().find(|c| c.starts_with('/')) {
            return Err(ValidationError::discovery(format!(
                "Contract candidates must be relative paths, got: {absolute}"
            )));
        }
        Ok(())
    }
}

/// Level names accepted as a bare filter directive
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !matches!(self.format.as_str(), "json" | "pretty" | "compact") {
            return Err(ValidationError::logging(format!(
                "Logging format must be one of json, pretty, compact; got: {}",
                self.format
            )));
        }

        // A bare word would otherwise parse as a target name
        let level = self.level.trim();
        if !level.contains(['=', ',']) && !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str())
        {
            return Err(ValidationError::logging(format!(
                "Logging level must be one of {}; got: {level}",
                LOG_LEVELS.join(", ")
            )));
        }

        EnvFilter::try_new(level).map_err(|e| {
            ValidationError::logging(format!("Invalid logging level '{level}': {e}"))
        })?;
        Ok(())
    }
}

impl Validate for ContractValidationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        self.cache.validate()?;
        self.security.validate()?;
        self.discovery.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
