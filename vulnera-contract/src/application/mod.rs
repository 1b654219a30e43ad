//! Application layer for contract validation

pub mod use_cases;

pub use use_cases::{ValidateContractUseCase, ValidationReport, contract_integrity_score};
