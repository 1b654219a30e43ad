//! Contract-independent source analyzers

pub mod api_layer_analyzer;

pub use api_layer_analyzer::*;
