//! Verifies that contract security requirements are enforced in code

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::config::SecurityVerificationConfig;
use crate::domain::entities::{ContractEndpoint, Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::FindingSeverity;
use crate::infrastructure::ast::{AstAnalyzer, TreeSitterAstAnalyzer, language_for_path};

use super::detectors::{AstPatternDetector, FunctionNameDetector, SecurityDetector, SourceUnit};
use super::fallback::metadata_fallback;
use super::matching::matches_scheme;
use super::security_pointer;

/// Runs the detector chain over an endpoint's source and matches the result
/// against the schemes its contract operation requires.
pub struct SecurityVerifier {
    detectors: Vec<Box<dyn SecurityDetector>>,
    min_substring_confidence: f64,
}

impl SecurityVerifier {
    pub fn new(analyzer: Arc<dyn AstAnalyzer>, config: &SecurityVerificationConfig) -> Self {
        Self {
            detectors: vec![
                Box::new(AstPatternDetector::new(analyzer.clone())),
                Box::new(FunctionNameDetector::new(
                    analyzer,
                    config.heuristic_confidence,
                )),
            ],
            min_substring_confidence: config.substring_match_min_confidence,
        }
    }

    /// Custom detector chain, run in the given order
    pub fn with_detectors(
        detectors: Vec<Box<dyn SecurityDetector>>,
        min_substring_confidence: f64,
    ) -> Self {
        Self {
            detectors,
            min_substring_confidence,
        }
    }

    #[instrument(skip_all, fields(endpoint = %endpoint.label()))]
    pub fn validate_security(
        &self,
        endpoint: &ImplementedEndpoint,
        contract_endpoint: &ContractEndpoint,
        cancel: &CancellationToken,
    ) -> Result<Vec<Finding>, ContractError> {
        let required = contract_endpoint.required_schemes();
        if required.is_empty() {
            return Ok(Vec::new());
        }

        ensure_active(cancel)?;
        let code = match std::fs::read_to_string(&endpoint.source_file) {
            Ok(code) => code,
            Err(e) => {
                warn!(
                    error = %e,
                    file = %endpoint.source_file.display(),
                    "Endpoint source unreadable, falling back to metadata"
                );
                return Ok(metadata_fallback(endpoint, contract_endpoint, &required));
            }
        };

        let language = language_for_path(&endpoint.source_file);
        let source = SourceUnit {
            path: &endpoint.source_file,
            code: &code,
            language: &language,
        };

        let mut patterns = Vec::new();
        for detector in &self.detectors {
            ensure_active(cancel)?;
            match detector.detect(&source) {
                Ok(found) => {
                    debug!(detector = detector.name(), patterns = found.len(), "Detector finished");
                    patterns.extend(found);
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        detector = detector.name(),
                        file = %endpoint.source_file.display(),
                        "Source analysis failed, falling back to metadata"
                    );
                    return Ok(metadata_fallback(endpoint, contract_endpoint, &required));
                }
            }
        }

        let location = endpoint.source_file.display().to_string();
        let mut findings = Vec::new();
        for scheme in &required {
            ensure_active(cancel)?;
            if matches_scheme(&patterns, scheme, self.min_substring_confidence) {
                continue;
            }

            findings.push(
                Finding::mismatch(
                    FindingSeverity::Critical,
                    &location,
                    format!(
                        "Security scheme '{}' required by contract but not detected in code for endpoint {}",
                        scheme,
                        endpoint.label()
                    ),
                    security_pointer(contract_endpoint, scheme),
                )
                .with_fix(format!(
                    "Add security scheme '{}' implementation to endpoint {}",
                    scheme,
                    endpoint.label()
                ))
                .with_detail("validation_method", "ast_analysis")
                .with_detail("scheme", scheme.clone())
                .with_detail("detected_patterns", patterns.len().to_string()),
            );
        }

        Ok(findings)
    }
}

impl Default for SecurityVerifier {
    fn default() -> Self {
        Self::new(
            Arc::new(TreeSitterAstAnalyzer::new()),
            &SecurityVerificationConfig::default(),
        )
    }
}
