use thiserror::Error;

use crate::gateway::AuthError;
use crate::storage::StorageError;

/// Failures surfaced by mutating session operations
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to serialize user snapshot: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Superseded by a newer session operation")]
    Superseded,
}

impl SessionError {
    /// The gateway failure behind this error, if any
    pub fn auth(&self) -> Option<&AuthError> {
        match self {
            Self::Auth(e) => Some(e),
            _ => None,
        }
    }
}
