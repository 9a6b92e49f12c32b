use async_trait::async_trait;

use super::AuthError;
use crate::models::User;

/// Stateless request layer in front of the remote auth service
///
/// Each call is exactly one request/response round trip. Implementations do
/// not retry or cache; the session controller decides how to chain calls.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for an opaque session token
    async fn login(&self, identifier: &str, secret: &str) -> Result<String, AuthError>;

    /// Resolve a token to the account it belongs to
    async fn fetch_profile(&self, token: &str) -> Result<User, AuthError>;

    /// Create an account. Does not yield a session.
    async fn register(&self, email: &str, secret: &str, full_name: &str)
        -> Result<(), AuthError>;
}
