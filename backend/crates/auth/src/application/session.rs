//! Session Handle and Manager
//!
//! `SessionManager::start` resolves the request's session (strict mode,
//! fixation defense, fingerprint binding) and hands back a `Session`, a
//! cheap cloneable handle that lives in request extensions for the rest of
//! the request. `SessionManager::commit` writes the outcome back to the
//! store and tells the caller which `Set-Cookie` to emit.
//!
//! Store failures never reach the client: a failed load starts a fresh
//! session and a failed write is logged.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde_json::Value;

use platform::client::ClientFingerprint;
use platform::cookie::CookieConfig;
use platform::crypto::constant_time_eq;

use crate::application::config::SessionConfig;
use crate::domain::entity::session::{
    AUTHENTICATED_KEY, SessionData, SessionId, SessionRecord, USERNAME_KEY,
};
use crate::domain::repository::SessionStore;

// ============================================================================
// Session handle
// ============================================================================

#[derive(Debug)]
struct SessionState {
    id: SessionId,
    data: SessionData,
    /// No record existed for this request's cookie
    is_new: bool,
    /// ID differs from the one the client sent
    id_changed: bool,
    /// Superseded IDs to delete on commit
    retired: Vec<SessionId>,
    destroyed: bool,
}

impl SessionState {
    fn fresh() -> Self {
        Self {
            id: SessionId::generate(),
            data: SessionData::default(),
            is_new: true,
            id_changed: true,
            retired: Vec::new(),
            destroyed: false,
        }
    }

    fn resumed(record: SessionRecord) -> Self {
        Self {
            id: record.id,
            data: record.data,
            is_new: false,
            id_changed: false,
            retired: Vec::new(),
            destroyed: false,
        }
    }

    fn rotate(&mut self, delete_old: bool) {
        let old = std::mem::replace(&mut self.id, SessionId::generate());
        if delete_old && !self.is_new {
            self.retired.push(old);
        }
        self.id_changed = true;
    }
}

/// Per-request session handle
///
/// Clones share state. Writes after `destroy` are accepted but never
/// persisted.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn from_state(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// A fresh session that is not tied to any store
    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::from_state(SessionState::fresh())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the raw session data
    pub(crate) fn with_data<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        f(&mut self.lock().data)
    }

    pub fn id(&self) -> SessionId {
        self.lock().id.clone()
    }

    /// Whether the session is active (not destroyed)
    pub fn is_started(&self) -> bool {
        !self.lock().destroyed
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().data.values.get(key).cloned()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.lock().data.values.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.lock().data.values.get(key).and_then(Value::as_bool)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().data.values.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.lock().data.values.remove(key)
    }

    /// Present and not null
    pub fn has(&self, key: &str) -> bool {
        self.lock()
            .data
            .values
            .get(key)
            .is_some_and(|value| !value.is_null())
    }

    /// Snapshot of all application values
    pub fn all(&self) -> BTreeMap<String, Value> {
        self.lock().data.values.clone()
    }

    /// Wipe application values and flash; system fields survive
    pub fn clear(&self) {
        self.lock().data.clear_application_keys();
    }

    /// Wipe everything and delete the session on commit
    pub fn destroy(&self) {
        let mut state = self.lock();
        state.data = SessionData::default();
        state.destroyed = true;
    }

    /// Move the session to a new ID, keeping its data.
    ///
    /// With `delete_old` every superseded ID is deleted on commit, so
    /// repeated calls within one request still leave a single valid ID.
    pub fn regenerate(&self, delete_old: bool) -> SessionId {
        let mut state = self.lock();
        state.rotate(delete_old);
        state.data.regenerated_at = Some(Utc::now().timestamp());
        tracing::debug!(session = state.id.short(), "Session ID regenerated");
        state.id.clone()
    }

    /// Store a value readable exactly once
    pub fn flash(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().data.flash.insert(key.into(), value.into());
    }

    /// Read and remove a flash value
    pub fn get_flash(&self, key: &str) -> Option<Value> {
        self.lock().data.flash.remove(key)
    }

    pub fn has_flash(&self, key: &str) -> bool {
        self.lock().data.flash.contains_key(key)
    }

    /// `authenticated` is exactly `true`
    pub fn is_authenticated(&self) -> bool {
        self.get_bool(AUTHENTICATED_KEY) == Some(true)
    }

    pub fn username(&self) -> Option<String> {
        self.get_str(USERNAME_KEY)
    }

    /// Mark the session as belonging to `username`
    pub fn authenticate(&self, username: &str) {
        let mut state = self.lock();
        state
            .data
            .values
            .insert(AUTHENTICATED_KEY.to_string(), Value::Bool(true));
        state
            .data
            .values
            .insert(USERNAME_KEY.to_string(), Value::from(username));
    }

    #[cfg(test)]
    pub(crate) fn csrf_token(&self) -> Option<crate::domain::entity::CsrfToken> {
        self.lock().data.csrf.clone()
    }

    #[cfg(test)]
    pub(crate) fn fingerprint(&self) -> Option<String> {
        self.lock().data.fingerprint.clone()
    }
}

// ============================================================================
// Session manager
// ============================================================================

/// Loads sessions at the start of a request and persists them at the end
pub struct SessionManager<S> {
    store: Arc<S>,
    config: Arc<SessionConfig>,
}

impl<S> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S> SessionManager<S>
where
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(store: Arc<S>, config: Arc<SessionConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn cookie(&self) -> CookieConfig {
        self.config.cookie()
    }

    /// Resolve the session for a request
    pub async fn start(
        &self,
        cookie_value: Option<&str>,
        fingerprint: &ClientFingerprint,
    ) -> Session {
        let now = Utc::now().timestamp();

        let record = match cookie_value.map(|raw| (raw, SessionId::parse(raw))) {
            Some((_, Some(id))) => match self.store.load(&id).await {
                Ok(Some(record)) => Some(record),
                Ok(None) => {
                    tracing::debug!("Unknown or expired session ID, starting fresh session");
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, "Session store load failed, starting fresh session");
                    None
                }
            },
            Some((raw, None)) => {
                tracing::debug!(len = raw.len(), "Malformed session cookie ignored");
                None
            }
            None => None,
        };

        let mut state = match record {
            Some(record) => SessionState::resumed(record),
            None => SessionState::fresh(),
        };

        self.prevent_fixation(&mut state, now);

        let current = fingerprint.hash_hex();
        match state.data.fingerprint.as_deref() {
            None => state.data.fingerprint = Some(current),
            Some(stored) if constant_time_eq(stored.as_bytes(), current.as_bytes()) => {}
            Some(_) => {
                tracing::warn!(
                    session = state.id.short(),
                    user_agent = %fingerprint.user_agent,
                    "Session fingerprint mismatch, discarding session"
                );

                let mut retired = std::mem::take(&mut state.retired);
                if !state.is_new {
                    retired.push(state.id.clone());
                }

                state = SessionState::fresh();
                state.retired = retired;
                state.data.regenerated_at = Some(now);
                state.data.fingerprint = Some(current);
            }
        }

        Session::from_state(state)
    }

    fn prevent_fixation(&self, state: &mut SessionState, now: i64) {
        if !state
            .data
            .needs_rotation_at(now, self.config.rotation_interval())
        {
            return;
        }

        // A fresh ID was just minted server-side; only stamp it
        if !state.is_new {
            state.rotate(true);
            tracing::debug!(session = state.id.short(), "Session ID rotated");
        }
        state.data.regenerated_at = Some(now);
    }

    /// Persist the session; returns the `Set-Cookie` value to send, if any
    pub async fn commit(&self, session: &Session) -> Option<String> {
        let (id, data, retired, destroyed, send_cookie) = {
            let mut state = session.lock();
            let send_cookie = state.is_new || state.id_changed;
            state.is_new = false;
            state.id_changed = false;
            (
                state.id.clone(),
                state.data.clone(),
                std::mem::take(&mut state.retired),
                state.destroyed,
                send_cookie,
            )
        };

        for old in retired.iter().filter(|old| **old != id) {
            if let Err(e) = self.store.delete(old).await {
                tracing::error!(error = %e, session = old.short(), "Failed to delete retired session");
            }
        }

        let cookie = self.config.cookie();

        if destroyed {
            if let Err(e) = self.store.delete(&id).await {
                tracing::error!(error = %e, session = id.short(), "Failed to delete destroyed session");
            }
            return Some(cookie.build_delete_cookie());
        }

        let record = SessionRecord::new(id, data, self.config.lifetime());
        if let Err(e) = self.store.save(&record).await {
            tracing::error!(error = %e, session = record.id.short(), "Failed to save session");
        }

        send_cookie.then(|| cookie.build_set_cookie(record.id.as_str()))
    }
}
