//! Configuration for contract validation

pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::Path;

pub use validation::{Validate, ValidationError};

use crate::infrastructure::cache::DEFAULT_CONTRACT_TTL_SECS;

/// Top-level contract validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractValidationConfig {
    pub cache: CacheSettings,
    pub security: SecurityVerificationConfig,
    pub discovery: DiscoveryConfig,
    pub validation: ValidationSettings,
    pub logging: LoggingConfig,
}

/// Parsed contract cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: DEFAULT_CONTRACT_TTL_SECS,
        }
    }
}

/// Thresholds used when matching detected security patterns to contract schemes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityVerificationConfig {
    /// Confidence assigned to patterns inferred from function names alone
    pub heuristic_confidence: f64,
    /// Minimum confidence for a substring (non-exact) scheme match
    pub substring_match_min_confidence: f64,
}

impl Default for SecurityVerificationConfig {
    fn default() -> Self {
        Self {
            heuristic_confidence: 0.7,
            substring_match_min_confidence: 0.7,
        }
    }
}

/// Where to look for a contract inside a project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Relative paths probed in order; the first existing file wins
    pub candidates: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let mut candidates = Vec::new();
        for dir in ["", "api/", "docs/", "spec/"] {
            for name in ["openapi", "swagger"] {
                for ext in ["yaml", "yml", "json"] {
                    candidates.push(format!("{dir}{name}.{ext}"));
                }
            }
        }
        Self { candidates }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Implementation path prefixes that are never validated (e.g. `/internal`)
    pub exclude_paths: Vec<String>,
    /// Run the source heuristics for auth, validation and error handling
    pub api_layer_checks: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl ContractValidationConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/contract").required(false));

        if let Ok(env) = std::env::var("ENV") {
            builder = builder.add_source(
                config::File::with_name(&format!("config/contract.{}", env)).required(false),
            );
        }

        builder =
            builder.add_source(config::Environment::with_prefix("VULNERA_CONTRACT").separator("__"));

        let config: ContractValidationConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load a single configuration file, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let config: ContractValidationConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ContractValidationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.ttl_seconds, 300);
        assert_eq!(config.discovery.candidates[0], "openapi.yaml");
        assert!(config.discovery.candidates.contains(&"spec/swagger.json".to_string()));
    }

    #[test]
    fn loads_partial_toml_with_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[cache]\nttl_seconds = 60\n\n[validation]\nexclude_paths = [\"/internal\"]"
        )
        .unwrap();

        let config = ContractValidationConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache.ttl_seconds, 60);
        assert_eq!(config.validation.exclude_paths, vec!["/internal".to_string()]);
        assert_eq!(config.security.heuristic_confidence, 0.7);
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[security]\nsubstring_match_min_confidence = 1.5").unwrap();

        let err = ContractValidationConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(_)));
    }
}
