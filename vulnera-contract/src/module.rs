//! Contract validation module implementation

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::use_cases::{ValidateContractUseCase, ValidationReport};
use crate::config::{ContractValidationConfig, DiscoveryConfig};
use crate::domain::entities::ImplementedEndpoint;
use crate::domain::errors::ContractError;
use crate::infrastructure::cache::ContractCache;

/// Input for one validation run
#[derive(Debug, Clone)]
pub struct ContractValidationRequest {
    /// Project directory; used for contract discovery and as the base for a
    /// relative `contract_path`
    pub project_root: PathBuf,
    /// Explicit contract file, skipping discovery
    pub contract_path: Option<PathBuf>,
    pub endpoints: Vec<ImplementedEndpoint>,
}

/// Errors from [`ContractValidationModule::execute`]
#[derive(Debug, thiserror::Error)]
pub enum ModuleExecutionError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("Validation task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Contract validation analysis module
pub struct ContractValidationModule {
    use_case: Arc<ValidateContractUseCase>,
    cache: Arc<ContractCache>,
    discovery: DiscoveryConfig,
}

impl ContractValidationModule {
    pub fn new() -> Self {
        Self::with_config(&ContractValidationConfig::default())
    }

    pub fn with_config(config: &ContractValidationConfig) -> Self {
        let cache = Arc::new(ContractCache::with_ttl(Duration::from_secs(
            config.cache.ttl_seconds,
        )));
        Self {
            use_case: Arc::new(ValidateContractUseCase::with_config(cache.clone(), config)),
            cache,
            discovery: config.discovery.clone(),
        }
    }

    /// Shared contract cache, for invalidation by the caller
    pub fn cache(&self) -> &Arc<ContractCache> {
        &self.cache
    }

    /// First configured candidate that exists under `project_root`
    pub fn discover_contract(&self, project_root: &Path) -> Option<PathBuf> {
        self.discovery
            .candidates
            .iter()
            .map(|candidate| project_root.join(candidate))
            .find(|path| path.is_file())
    }

    /// Validate the request's endpoints on the blocking pool.
    ///
    /// Dropping the future does not stop the work; cancel `cancel` instead.
    pub async fn execute(
        &self,
        request: ContractValidationRequest,
        cancel: CancellationToken,
    ) -> Result<ValidationReport, ModuleExecutionError> {
        if !request.project_root.is_dir() {
            return Err(ModuleExecutionError::InvalidConfig(format!(
                "Project root does not exist: {}",
                request.project_root.display()
            )));
        }

        let contract_path = match &request.contract_path {
            Some(path) => Some(request.project_root.join(path)),
            None => self.discover_contract(&request.project_root),
        };

        let Some(contract_path) = contract_path else {
            info!(
                project_root = %request.project_root.display(),
                "No API contract found, skipping contract validation"
            );
            return Ok(ValidationReport::empty());
        };
        debug!(contract = %contract_path.display(), "Using API contract");

        let use_case = self.use_case.clone();
        let endpoints = request.endpoints;
        let report = tokio::task::spawn_blocking(move || {
            use_case.execute(&contract_path, &endpoints, &cancel)
        })
        .await??;

        Ok(report)
    }
}

impl Default for ContractValidationModule {
    fn default() -> Self {
        Self::new()
    }
}
