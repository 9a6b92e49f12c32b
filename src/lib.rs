pub mod app;
pub mod cli;
pub mod constants;
pub mod gateway;
pub mod models;
pub mod session;
pub mod storage;
pub mod utils;

pub use app::{load_config, AppContext, Config};
pub use gateway::{AuthError, AuthGateway, HttpAuthGateway};
pub use models::User;
pub use session::{Phase, Session, SessionController, SessionError, SessionStore, Subscription};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StorageError};
pub use utils::RapportError;
