// Gateway module for credential storage - follows the Train Station Pattern
// All external access must go through this gateway

mod error;
mod file_store;
mod memory;
mod traits;

pub use error::StorageError;
pub use file_store::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use traits::{validate_key, CredentialStore};

#[cfg(test)]
pub use traits::MockCredentialStore;
