// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

mod user;

pub use user::{Credentials, Registration, User};
