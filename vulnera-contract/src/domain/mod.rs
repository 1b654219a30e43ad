//! Domain layer for contract validation

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::{Contract, ContractEndpoint, Finding, ImplementedEndpoint};
pub use errors::{ContractError, ensure_active};
pub use value_objects::*;
