/// Session management module - Gateway

mod controller;
mod error;
mod state;
mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::SessionController;
pub use error::SessionError;
pub use state::{Phase, Session, SessionUpdate};
pub use store::{SessionStore, Subscription};
