//! Structural validation of implemented endpoints against a contract

pub mod deep_validator;
pub mod parameters;
pub mod request_body;
pub mod responses;

pub use deep_validator::DeepValidator;
pub use parameters::validate_parameters;
pub use request_body::validate_request_body;
pub use responses::validate_responses;
