use thiserror::Error;

/// Failures of a single auth round trip
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session token was rejected")]
    Unauthorized,

    #[error("An account with this email already exists")]
    Conflict,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    NetworkFailure(String),
}

impl AuthError {
    /// Whether the failure says nothing about the credentials themselves
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NetworkFailure(_))
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(e: reqwest::Error) -> Self {
        Self::NetworkFailure(e.to_string())
    }
}
