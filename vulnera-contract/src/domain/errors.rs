//! Contract validation errors

use std::path::PathBuf;

/// Errors surfaced by the loader, cache and validators
///
/// Structural mismatches are never errors; they are reported as findings.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Failed to parse contract {file}: {message}")]
    Parse { message: String, file: String },

    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Contract validation cancelled")]
    Cancelled,
}

impl ContractError {
    pub fn parse(message: impl Into<String>, file: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            file: file.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ContractError::Cancelled)
    }
}

/// Return `Err(Cancelled)` if the token has fired
pub fn ensure_active(cancel: &tokio_util::sync::CancellationToken) -> Result<(), ContractError> {
    if cancel.is_cancelled() {
        Err(ContractError::Cancelled)
    } else {
        Ok(())
    }
}
