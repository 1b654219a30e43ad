//! Vulnera Contract - API contract conformance checking
//!
//! This crate checks implemented HTTP endpoints against their published
//! OpenAPI 3.x or Swagger 2.0 contract and reports structural mismatches as
//! findings.
//!
//! # Modules
//!
//! - [`config`]: Typed configuration loaded from TOML files and environment variables
//! - [`domain`]: Contracts, implemented endpoints, findings and errors
//! - [`application`]: The batch validation use case and its report
//! - [`infrastructure`]: Loader, cache, matcher, validators and the security verifier
//! - [`logging`]: Structured logging with tracing
//!
//! # Pipeline
//!
//! ```text
//! spec file ──► ContractCache ──► ContractLoader ──► Contract
//!                                                       │
//! ImplementedEndpoint ──► DeepValidator ◄───────────────┘
//!                            ├─ parameters
//!                            ├─ request body
//!                            ├─ responses
//!                            └─ SecurityVerifier (AST → function names → metadata)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tokio_util::sync::CancellationToken;
//! use vulnera_contract::{ContractValidationModule, ContractValidationRequest, ImplementedEndpoint};
//!
//! let module = ContractValidationModule::new();
//! let report = module
//!     .execute(
//!         ContractValidationRequest {
//!             project_root: "./service".into(),
//!             contract_path: None,
//!             endpoints: vec![ImplementedEndpoint::new("GET", "/users/:id", "handlers/users.go")],
//!         },
//!         CancellationToken::new(),
//!     )
//!     .await?;
//! ```
//!
//! # Configuration
//!
//! Environment variables use the `VULNERA_CONTRACT__` prefix with double
//! underscore separators:
//!
//! ```bash
//! VULNERA_CONTRACT__CACHE__TTL_SECONDS=600
//! VULNERA_CONTRACT__SECURITY__SUBSTRING_MATCH_MIN_CONFIDENCE=0.8
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod module;

pub use module::*;

pub use application::use_cases::{ValidateContractUseCase, ValidationReport};
pub use config::ContractValidationConfig;
pub use domain::{
    Contract, ContractEndpoint, ContractError, Finding, FindingSeverity, FindingType,
    ImplementedEndpoint,
};
pub use infrastructure::{ContractCache, ContractLoader, DeepValidator, SecurityVerifier};
pub use logging::init_tracing;
