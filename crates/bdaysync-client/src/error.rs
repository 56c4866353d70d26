//! Client error types and the process exit policy.

use bdaysync_providers::ProviderError;
use thiserror::Error;

use crate::engine::SyncError;
use crate::secret::SecretError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to resolve secret: {0}")]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exit status for a finished command.
///
/// Any error is fatal and maps to 1. A sync that ran to completion exits 0
/// even when some entries failed; those are reported in the output.
pub fn exit_code<T>(result: &ClientResult<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
