use crate::models::User;

/// How far the current identity has been verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Process start, nothing read yet
    #[default]
    Bootstrapping,
    /// Cached snapshot published before the server confirmed it
    Tentative,
    /// Identity confirmed by the server in this process
    Confirmed,
    Unauthenticated,
}

/// Snapshot of the session as seen by consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub is_loading: bool,
    pub phase: Phase,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            is_loading: true,
            phase: Phase::Bootstrapping,
        }
    }
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_pro(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_pro)
    }

    /// True while the identity is still the unverified cached one
    pub fn is_tentative(&self) -> bool {
        self.phase == Phase::Tentative
    }
}

/// Partial update merged into the session; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionUpdate {
    user: Option<Option<User>>,
    is_loading: Option<bool>,
    phase: Option<Phase>,
}

impl SessionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: Option<User>) -> Self {
        self.user = Some(user);
        self
    }

    pub fn loading(mut self, is_loading: bool) -> Self {
        self.is_loading = Some(is_loading);
        self
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phase = Some(phase);
        self
    }

    /// Terminal unauthenticated state
    pub fn signed_out() -> Self {
        Self::new()
            .user(None)
            .loading(false)
            .phase(Phase::Unauthenticated)
    }

    /// Server-confirmed identity, loading finished
    pub fn confirmed(user: User) -> Self {
        Self::new()
            .user(Some(user))
            .loading(false)
            .phase(Phase::Confirmed)
    }

    pub(crate) fn apply(self, session: &mut Session) {
        if let Some(user) = self.user {
            session.user = user;
        }
        if let Some(is_loading) = self.is_loading {
            session.is_loading = is_loading;
        }
        if let Some(phase) = self.phase {
            session.phase = phase;
        }
    }
}
