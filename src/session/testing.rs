use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::{oneshot, Notify};

use crate::gateway::{AuthError, AuthGateway};
use crate::models::User;

/// One recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Login(String),
    FetchProfile(String),
    Register(String),
}

enum Reply<T> {
    Ready(Result<T, AuthError>),
    Held(oneshot::Receiver<Result<T, AuthError>>),
}

/// Gateway double answering from per-operation queues
///
/// An empty queue answers with a network failure. Profile replies can be held
/// open to stage races against other operations.
#[derive(Default)]
pub(crate) struct ScriptedGateway {
    logins: Mutex<VecDeque<Result<String, AuthError>>>,
    profiles: Mutex<VecDeque<Reply<User>>>,
    registrations: Mutex<VecDeque<Result<(), AuthError>>>,
    calls: Mutex<Vec<Call>>,
    profile_started: Notify,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_login(&self, result: Result<String, AuthError>) {
        self.logins.lock().push_back(result);
    }

    pub(crate) fn push_profile(&self, result: Result<User, AuthError>) {
        self.profiles.lock().push_back(Reply::Ready(result));
    }

    /// Queue a profile reply that resolves when the returned sender fires
    pub(crate) fn hold_profile(&self) -> oneshot::Sender<Result<User, AuthError>> {
        let (tx, rx) = oneshot::channel();
        self.profiles.lock().push_back(Reply::Held(rx));
        tx
    }

    pub(crate) fn push_register(&self, result: Result<(), AuthError>) {
        self.registrations.lock().push_back(result);
    }

    /// Resolves once a profile request has been issued
    pub(crate) async fn profile_requested(&self) {
        self.profile_started.notified().await;
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn unscripted<T>() -> Result<T, AuthError> {
        Err(AuthError::NetworkFailure("unscripted call".to_string()))
    }
}

#[async_trait]
impl AuthGateway for ScriptedGateway {
    async fn login(&self, identifier: &str, _secret: &str) -> Result<String, AuthError> {
        self.calls.lock().push(Call::Login(identifier.to_string()));
        let next = self.logins.lock().pop_front();
        next.unwrap_or_else(Self::unscripted)
    }

    async fn fetch_profile(&self, token: &str) -> Result<User, AuthError> {
        self.calls.lock().push(Call::FetchProfile(token.to_string()));
        let next = self.profiles.lock().pop_front();
        self.profile_started.notify_one();

        match next {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Held(rx)) => rx.await.unwrap_or_else(|_| Self::unscripted()),
            None => Self::unscripted(),
        }
    }

    async fn register(
        &self,
        email: &str,
        _secret: &str,
        _full_name: &str,
    ) -> Result<(), AuthError> {
        self.calls.lock().push(Call::Register(email.to_string()));
        let next = self.registrations.lock().pop_front();
        next.unwrap_or_else(Self::unscripted)
    }
}
