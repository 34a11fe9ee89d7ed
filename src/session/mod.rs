//! Per-user session state.
//!
//! A [`Session`] is an explicit handle: the dispatcher loads it through the
//! [`SessionManager`], hands it to every guard and to the handler (via
//! [`Request::session`](crate::Request::session)), then saves it once the
//! response is known. Nothing reads session state from anywhere else.
//!
//! Cloning a `Session` is cheap and every clone observes the same state, so a
//! handler that logs a user in is seen by the dispatcher when it saves.

mod manager;
mod store;

pub use manager::SessionManager;
pub use store::{MemoryStore, SessionStore, StoreError};

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::middleware::csrf::generate_token;

// ── Role ──────────────────────────────────────────────────────────────────────

/// The marketplace role attached to a session.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Guest,
    Expeditor,
    Courier,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guest     => "guest",
            Self::Expeditor => "expeditor",
            Self::Courier   => "courier",
            Self::Admin     => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guest"     => Ok(Self::Guest),
            "expeditor" => Ok(Self::Expeditor),
            "courier"   => Ok(Self::Courier),
            "admin"     => Ok(Self::Admin),
            other       => Err(UnknownRole(other.to_owned())),
        }
    }
}

// ── SessionId / SessionData ───────────────────────────────────────────────────

/// Opaque session identifier carried in the session cookie.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh random identifier (UUID v4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the store persists for one session.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_role: Role,
    pub csrf_token: Option<String>,
}

// ── Session ───────────────────────────────────────────────────────────────────

/// Shared handle to the current request's session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<State>>,
}

struct State {
    id: SessionId,
    data: SessionData,
    /// The client presented `id` in its cookie.
    from_cookie: bool,
    /// `data` differs from what the store holds.
    changed: bool,
    destroyed: bool,
    /// Id replaced by [`Session::cycle_id`], still to be removed from the store.
    previous: Option<SessionId>,
}

impl Session {
    /// A new, empty session that has not been stored yet.
    pub fn new() -> Self {
        Self::from_state(SessionId::generate(), SessionData::default(), false)
    }

    /// A session the store already knows about.
    pub(crate) fn restore(id: SessionId, data: SessionData) -> Self {
        Self::from_state(id, data, true)
    }

    fn from_state(id: SessionId, data: SessionData, from_cookie: bool) -> Self {
        let state = State { id, data, from_cookie, changed: false, destroyed: false, previous: None };
        Self { inner: Arc::new(Mutex::new(state)) }
    }

    // Guards and handlers never hold the lock across an await, so a poisoned
    // mutex only means a panic mid-update; the data is still usable.
    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> SessionId {
        self.state().id.clone()
    }

    /// Snapshot of the stored attributes.
    pub fn data(&self) -> SessionData {
        self.state().data.clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.state().data.user_id.clone()
    }

    pub fn role(&self) -> Role {
        self.state().data.user_role
    }

    /// `true` when a non-empty `user_id` is present.
    pub fn is_authenticated(&self) -> bool {
        self.state().data.user_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Returns the session's CSRF token, minting and storing one on first use.
    ///
    /// Repeated calls return the same value until [`rotate_csrf_token`](Self::rotate_csrf_token)
    /// or the end of the session.
    pub fn csrf_token(&self) -> String {
        let mut state = self.state();
        if let Some(token) = &state.data.csrf_token {
            return token.clone();
        }
        let token = generate_token();
        state.data.csrf_token = Some(token.clone());
        state.changed = true;
        token
    }

    /// The stored CSRF token, without minting one.
    pub fn existing_csrf_token(&self) -> Option<String> {
        self.state().data.csrf_token.clone()
    }

    /// Replaces the CSRF token unconditionally and returns the new value.
    pub fn rotate_csrf_token(&self) -> String {
        let token = generate_token();
        let mut state = self.state();
        state.data.csrf_token = Some(token.clone());
        state.changed = true;
        token
    }

    /// Records a successful login and moves the session to a fresh id.
    ///
    /// The CSRF token survives so forms rendered before login stay valid.
    pub fn log_in(&self, user_id: impl Into<String>, role: Role) {
        {
            let mut state = self.state();
            state.data.user_id = Some(user_id.into());
            state.data.user_role = role;
            state.changed = true;
        }
        self.cycle_id();
    }

    /// Clears every attribute and marks the session for removal on save.
    pub fn log_out(&self) {
        let mut state = self.state();
        state.data = SessionData::default();
        state.destroyed = true;
        state.changed = true;
    }

    /// Issues a new id for the same data; the old record is removed on save.
    pub fn cycle_id(&self) {
        let mut state = self.state();
        let old = std::mem::replace(&mut state.id, SessionId::generate());
        if state.from_cookie && state.previous.is_none() {
            state.previous = Some(old);
        }
        state.from_cookie = false;
        state.changed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Hands the unsaved changes to the manager and marks them as saved.
    pub(crate) fn take_pending(&self) -> Option<Pending> {
        let mut state = self.state();
        if !state.changed {
            return None;
        }
        let pending = Pending {
            id: state.id.clone(),
            data: state.data.clone(),
            from_cookie: state.from_cookie,
            destroyed: state.destroyed,
            previous: state.previous.take(),
        };
        state.changed = false;
        state.from_cookie = true;
        Some(pending)
    }
}

/// Changes a [`SessionManager`] must write through to the store.
pub(crate) struct Pending {
    pub(crate) id: SessionId,
    pub(crate) data: SessionData,
    pub(crate) from_cookie: bool,
    pub(crate) destroyed: bool,
    pub(crate) previous: Option<SessionId>,
}

impl Default for Session {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Session")
            .field("id", &state.id)
            .field("user_id", &state.data.user_id)
            .field("user_role", &state.data.user_role)
            .field("destroyed", &state.destroyed)
            .finish_non_exhaustive()
    }
}
