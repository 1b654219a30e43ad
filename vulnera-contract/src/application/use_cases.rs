//! Contract validation use cases

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::config::{ContractValidationConfig, ValidationSettings};
use crate::domain::entities::{Finding, ImplementedEndpoint};
use crate::domain::errors::{ContractError, ensure_active};
use crate::domain::value_objects::{FindingSeverity, SpecVersion};
use crate::infrastructure::analyzers::ApiLayerAnalyzer;
use crate::infrastructure::ast::TreeSitterAstAnalyzer;
use crate::infrastructure::cache::ContractCache;
use crate::infrastructure::security::SecurityVerifier;
use crate::infrastructure::validation::DeepValidator;

/// Result of validating a set of endpoints against one contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub contract_path: PathBuf,
    pub spec_version: SpecVersion,
    pub findings: Vec<Finding>,
    /// Contract integrity score, 0..=100
    pub score: u8,
    pub endpoints_checked: usize,
    pub endpoints_excluded: usize,
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Report for a project without a contract
    pub fn empty() -> Self {
        Self {
            contract_path: PathBuf::new(),
            spec_version: SpecVersion::Unknown,
            findings: Vec::new(),
            score: 100,
            endpoints_checked: 0,
            endpoints_excluded: 0,
            duration_ms: 0,
        }
    }

    pub fn count_by_severity(&self, severity: FindingSeverity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

/// Validate implemented endpoints against a contract file
pub struct ValidateContractUseCase {
    cache: Arc<ContractCache>,
    validator: DeepValidator,
    settings: ValidationSettings,
}

impl ValidateContractUseCase {
    pub fn new(
        cache: Arc<ContractCache>,
        validator: DeepValidator,
        settings: ValidationSettings,
    ) -> Self {
        Self {
            cache,
            validator,
            settings,
        }
    }

    pub fn with_config(cache: Arc<ContractCache>, config: &ContractValidationConfig) -> Self {
        let security =
            SecurityVerifier::new(Arc::new(TreeSitterAstAnalyzer::new()), &config.security);
        Self::new(
            cache,
            DeepValidator::new(Arc::new(security)),
            config.validation.clone(),
        )
    }

    #[instrument(skip(self, endpoints, cancel), fields(spec_path = %spec_path.display(), endpoints = endpoints.len()))]
    pub fn execute(
        &self,
        spec_path: &Path,
        endpoints: &[ImplementedEndpoint],
        cancel: &CancellationToken,
    ) -> Result<ValidationReport, ContractError> {
        let start_time = Instant::now();
        info!("Starting contract validation");

        let contract = self.cache.get_or_parse(spec_path, cancel).map_err(|e| {
            if !e.is_cancelled() {
                error!(
                    error = %e,
                    file = %spec_path.display(),
                    "Failed to load contract"
                );
            }
            e
        })?;

        let mut findings = Vec::new();
        let mut checked = 0;
        let mut excluded = 0;

        for endpoint in endpoints {
            ensure_active(cancel)?;

            if self.is_excluded(&endpoint.path) {
                excluded += 1;
                continue;
            }
            checked += 1;

            findings.extend(
                self.validator
                    .validate_endpoint_against_contract(endpoint, &contract, cancel)?,
            );
            if self.settings.api_layer_checks {
                findings.extend(ApiLayerAnalyzer::analyze(endpoint));
            }
        }

        if excluded > 0 {
            debug!(excluded_count = excluded, "Applied path exclusions");
        }

        let score = contract_integrity_score(&findings);
        info!(
            finding_count = findings.len(),
            score = score,
            "Contract validation completed"
        );

        Ok(ValidationReport {
            contract_path: contract.source_location.clone(),
            spec_version: contract.spec_version,
            findings,
            score,
            endpoints_checked: checked,
            endpoints_excluded: excluded,
            duration_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.settings
            .exclude_paths
            .iter()
            .any(|excluded| excluded == "*" || path.starts_with(excluded.as_str()))
    }
}

/// 100 minus 25 per critical, 15 per high, 5 per medium and 1 per low, floored at 0
pub fn contract_integrity_score(findings: &[Finding]) -> u8 {
    let deduction: i32 = findings
        .iter()
        .map(|finding| match finding.severity {
            FindingSeverity::Critical => 25,
            FindingSeverity::High => 15,
            FindingSeverity::Medium => 5,
            FindingSeverity::Low => 1,
            FindingSeverity::Info => 0,
        })
        .sum();

    (100_i32 - deduction).max(0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: FindingSeverity) -> Finding {
        Finding::mismatch(severity, "users.go", "issue", "#/paths")
    }

    #[test]
    fn score_deductions() {
        assert_eq!(contract_integrity_score(&[]), 100);
        assert_eq!(
            contract_integrity_score(&[
                finding(FindingSeverity::High),
                finding(FindingSeverity::Medium),
                finding(FindingSeverity::Low),
                finding(FindingSeverity::Info),
            ]),
            79
        );
        assert_eq!(
            contract_integrity_score(&vec![finding(FindingSeverity::Critical); 5]),
            0
        );
    }
}
