use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::state::{Phase, Session, SessionUpdate};
use super::store::SessionStore;
use super::SessionError;
use crate::constants::{TOKEN_KEY, USER_KEY};
use crate::gateway::{AuthError, AuthGateway};
use crate::models::User;
use crate::storage::{CredentialStore, StorageError};

/// Bookkeeping for operations that span an await
///
/// Every operation takes a generation when it starts. Once an operation
/// writes its outcome, that generation is settled and every older operation
/// is stale. An operation that fails without writing anything settles
/// nothing, so it cannot cancel an older one still in flight.
#[derive(Debug, Default)]
struct Generations {
    next: u64,
    settled: u64,
    in_flight: BTreeSet<u64>,
}

impl Generations {
    fn begin(&mut self) -> u64 {
        self.next += 1;
        self.in_flight.insert(self.next);
        self.next
    }

    fn is_current(&self, generation: u64) -> bool {
        generation > self.settled
    }

    fn settle(&mut self, generation: u64) {
        self.settled = self.settled.max(generation);
        self.in_flight.remove(&generation);
    }

    fn finish(&mut self, generation: u64) {
        self.in_flight.remove(&generation);
    }

    /// Whether an operation that can still write is in flight
    fn busy(&self) -> bool {
        self.in_flight.range(self.settled + 1..).next().is_some()
    }
}

/// An operation in flight; dropping it, cancellation included, takes it off
/// the books
struct Operation<'a> {
    controller: &'a SessionController,
    generation: u64,
}

impl Drop for Operation<'_> {
    fn drop(&mut self) {
        self.controller.finish(self.generation);
    }
}

/// Orchestrates the session lifecycle over the store, credentials and gateway
///
/// Results of an async call are only written back while no newer operation
/// has written its own outcome, so a verification that resolves after a
/// logout is discarded instead of resurrecting the old session. The check
/// and the write happen under the same lock.
pub struct SessionController {
    store: SessionStore,
    credentials: Arc<dyn CredentialStore>,
    gateway: Arc<dyn AuthGateway>,
    generations: ReentrantMutex<RefCell<Generations>>,
    clear_on_network_failure: bool,
}

impl SessionController {
    pub fn new(
        store: SessionStore,
        credentials: Arc<dyn CredentialStore>,
        gateway: Arc<dyn AuthGateway>,
    ) -> Self {
        Self {
            store,
            credentials,
            gateway,
            generations: ReentrantMutex::new(RefCell::new(Generations::default())),
            clear_on_network_failure: true,
        }
    }

    /// Whether a bootstrap verification that fails only because the server
    /// is unreachable still signs the user out (the default)
    pub fn with_clear_on_network_failure(mut self, clear: bool) -> Self {
        self.clear_on_network_failure = clear;
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn session(&self) -> Session {
        self.store.snapshot()
    }

    /// Persisted bearer token for authenticating other API requests
    pub fn token(&self) -> Result<Option<String>, StorageError> {
        self.credentials.get(TOKEN_KEY)
    }

    fn begin(&self) -> Operation<'_> {
        let generation = self.generations.lock().borrow_mut().begin();
        Operation {
            controller: self,
            generation,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generations.lock().borrow().is_current(generation)
    }

    /// Settle `generation`; returns whether other live operations remain
    fn settle(&self, generation: u64) -> bool {
        let guard = self.generations.lock();
        let mut generations = guard.borrow_mut();
        generations.settle(generation);
        generations.busy()
    }

    /// Retire `generation` without settling; returns whether other live
    /// operations remain
    fn finish(&self, generation: u64) -> bool {
        let guard = self.generations.lock();
        let mut generations = guard.borrow_mut();
        generations.finish(generation);
        generations.busy()
    }

    /// Run `write` only if no newer outcome has been settled
    fn commit<T>(&self, generation: u64, write: impl FnOnce() -> T) -> Option<T> {
        let guard = self.generations.lock();
        let settled = guard.borrow().settled;
        if generation <= settled {
            debug!(
                "Discarding result of session operation {} (settled through {})",
                generation, settled
            );
            return None;
        }
        Some(write())
    }

    /// Write the outcome of `generation`. `write` is told whether other
    /// operations are still in flight, for the loading flag.
    fn resolve<T>(&self, generation: u64, write: impl FnOnce(bool) -> T) -> Option<T> {
        self.commit(generation, || {
            let busy = self.settle(generation);
            write(busy)
        })
    }

    /// Read the cached snapshot. A malformed snapshot is removed and treated
    /// as absent.
    fn cached_user(&self) -> Option<User> {
        let raw = match self.credentials.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Could not read cached user: {}", e);
                return None;
            }
        };

        let user = User::from_snapshot(&raw);
        if user.is_none() {
            warn!("Discarding malformed cached user snapshot");
            if let Err(e) = self.credentials.remove(USER_KEY) {
                warn!("Could not remove malformed user snapshot: {}", e);
            }
        }
        user
    }

    fn clear_credentials(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.credentials.remove(key) {
                error!("Failed to remove stored {}: {}", key, e);
            }
        }
    }

    fn sign_out(&self, busy: bool) -> Session {
        self.clear_credentials();
        self.store.update(SessionUpdate::signed_out().loading(busy))
    }

    /// Load the cached identity, publish it optimistically, then confirm it
    /// against the server
    ///
    /// Never fails: any verification failure resets to unauthenticated.
    pub async fn bootstrap(&self) -> Session {
        let operation = self.begin();
        let generation = operation.generation;

        let cached = self.cached_user();
        let phase = if cached.is_some() {
            Phase::Tentative
        } else {
            Phase::Bootstrapping
        };
        self.commit(generation, || {
            self.store.update(
                SessionUpdate::new()
                    .user(cached.clone())
                    .loading(true)
                    .phase(phase),
            )
        });

        let token = match self.credentials.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read stored token: {}", e);
                None
            }
        };

        let Some(token) = token else {
            debug!("No stored token, starting unauthenticated");
            self.resolve(generation, |busy| self.sign_out(busy));
            return self.store.snapshot();
        };

        match self.gateway.fetch_profile(&token).await {
            Ok(user) => {
                self.resolve(generation, |busy| {
                    match user.to_snapshot() {
                        Ok(snapshot) => {
                            if let Err(e) = self.credentials.set(USER_KEY, &snapshot) {
                                warn!("Could not persist verified user: {}", e);
                            }
                        }
                        Err(e) => warn!("Could not serialize verified user: {}", e),
                    }
                    info!("Session verified for user {}", user.id);
                    self.store
                        .update(SessionUpdate::confirmed(user).loading(busy))
                });
            }
            Err(e) if e.is_transient() && !self.clear_on_network_failure => {
                warn!("Session verification unavailable, keeping cached identity: {}", e);
                let phase = if cached.is_some() {
                    Phase::Tentative
                } else {
                    Phase::Unauthenticated
                };
                self.resolve(generation, |busy| {
                    self.store
                        .update(SessionUpdate::new().loading(busy).phase(phase))
                });
            }
            Err(e) => {
                warn!("Session verification failed, signing out: {}", e);
                self.resolve(generation, |busy| self.sign_out(busy));
            }
        }

        self.store.snapshot()
    }

    /// Exchange credentials for a token, then load the profile it belongs to
    ///
    /// On failure the previous session is left as it was. `is_loading`
    /// returns to false unless another operation is still in flight.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<User, SessionError> {
        let operation = self.begin();
        self.login_as(&operation, identifier, secret).await
    }

    async fn login_as(
        &self,
        operation: &Operation<'_>,
        identifier: &str,
        secret: &str,
    ) -> Result<User, SessionError> {
        let generation = operation.generation;
        self.commit(generation, || {
            self.store.update(SessionUpdate::new().loading(true))
        });

        let token = match self.gateway.login(identifier, secret).await {
            Ok(token) => token,
            Err(e) => return Err(self.fail(generation, e)),
        };
        if !self.is_current(generation) {
            return Err(SessionError::Superseded);
        }

        let user = match self.gateway.fetch_profile(&token).await {
            Ok(user) => user,
            Err(e) => return Err(self.fail(generation, e)),
        };

        let persisted = self.commit(generation, || {
            let persisted = self.persist(&token, &user);
            match &persisted {
                Ok(()) => {
                    let busy = self.settle(generation);
                    self.store
                        .update(SessionUpdate::confirmed(user.clone()).loading(busy));
                }
                Err(_) => {
                    let busy = self.finish(generation);
                    self.store.update(SessionUpdate::new().loading(busy));
                }
            }
            persisted
        });

        match persisted {
            Some(Ok(())) => {
                info!("Logged in as user {}", user.id);
                Ok(user)
            }
            Some(Err(e)) => Err(e),
            None => Err(SessionError::Superseded),
        }
    }

    /// Retire a failed operation and clear the loading flag unless another
    /// operation is still in flight
    fn fail(&self, generation: u64, e: AuthError) -> SessionError {
        debug!("Session operation {} failed: {}", generation, e);
        self.commit(generation, || {
            let busy = self.finish(generation);
            self.store.update(SessionUpdate::new().loading(busy))
        });
        SessionError::Auth(e)
    }

    /// Persist `token` and `user` together
    ///
    /// If either write fails the previous entries are put back.
    fn persist(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let snapshot = user.to_snapshot()?;
        let previous_token = self.credentials.get(TOKEN_KEY)?;
        let previous_user = self.credentials.get(USER_KEY)?;

        let written = self
            .credentials
            .set(TOKEN_KEY, token)
            .and_then(|()| self.credentials.set(USER_KEY, &snapshot));

        if let Err(e) = written {
            self.restore(TOKEN_KEY, previous_token.as_deref());
            self.restore(USER_KEY, previous_user.as_deref());
            return Err(e.into());
        }
        Ok(())
    }

    fn restore(&self, key: &str, previous: Option<&str>) {
        let restored = match previous {
            Some(value) => self.credentials.set(key, value),
            None => self.credentials.remove(key),
        };
        if let Err(e) = restored {
            error!("Failed to restore stored {}: {}", key, e);
        }
    }

    /// Create an account, then log in with the same credentials
    ///
    /// A failed registration never attempts the login.
    pub async fn register(
        &self,
        email: &str,
        secret: &str,
        full_name: &str,
    ) -> Result<User, SessionError> {
        let operation = self.begin();
        let generation = operation.generation;
        self.commit(generation, || {
            self.store.update(SessionUpdate::new().loading(true))
        });

        if let Err(e) = self.gateway.register(email, secret, full_name).await {
            return Err(self.fail(generation, e));
        }
        if !self.is_current(generation) {
            return Err(SessionError::Superseded);
        }

        info!("Registered new account, logging in");
        self.login_as(&operation, email, secret).await
    }

    /// Forget the session: remove both stored entries and publish signed out
    ///
    /// Every operation still in flight becomes stale. Calling it repeatedly
    /// is harmless.
    pub fn logout(&self) -> Session {
        let operation = self.begin();
        info!("Logging out");
        self.resolve(operation.generation, |busy| self.sign_out(busy))
            .unwrap_or_else(|| self.store.snapshot())
    }

    /// Mark the current user as Pro locally, mirroring an entitlement change
    /// already made server-side
    ///
    /// Returns `None` without touching anything when nobody is signed in.
    pub fn upgrade_to_pro(&self) -> Result<Option<User>, SessionError> {
        let _generations = self.generations.lock();

        let Some(mut user) = self.store.snapshot().user else {
            debug!("Upgrade requested with no user signed in");
            return Ok(None);
        };

        user.is_pro = true;
        self.credentials.set(USER_KEY, &user.to_snapshot()?)?;
        self.store
            .update(SessionUpdate::new().user(Some(user.clone())));

        info!("User {} upgraded to Pro", user.id);
        Ok(Some(user))
    }
}
