//! OpenAPI/Swagger contract parsing

pub mod contract_loader;
pub mod document;
mod extract;
pub mod openapi_v3;
pub mod schema_resolver;
pub mod swagger_v2;

pub use contract_loader::ContractLoader;
pub use document::{ResolveError, SpecDocument};
pub use openapi_v3::OpenApiV3Adapter;
pub use schema_resolver::SchemaRefResolver;
pub use swagger_v2::{Swagger2Adapter, Swagger2Spec};
