// Gateway module for the remote auth service - follows the Train Station Pattern
// All external access must go through this gateway

mod error;
mod http;
mod traits;

pub use error::AuthError;
pub use http::HttpAuthGateway;
pub use traits::AuthGateway;
