use thiserror::Error;

use crate::gateway::AuthError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// Main error type for Rapport
#[derive(Error, Debug)]
pub enum RapportError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not signed in")]
    NotSignedIn,
}

impl From<AuthError> for RapportError {
    fn from(e: AuthError) -> Self {
        Self::Session(SessionError::Auth(e))
    }
}

impl RapportError {
    /// Process exit code for the shell
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Session(SessionError::Auth(AuthError::NetworkFailure(_))) => 3,
            Self::Session(SessionError::Auth(_)) => 2,
            _ => 1,
        }
    }
}
