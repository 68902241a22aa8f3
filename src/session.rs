//! Per-session key/value store.
//!
//! Every user session owns exactly one [`SessionState`], shared by reference
//! with the host and every head app through a [`SessionHandle`]. Stores are
//! keyed by [`SessionId`] inside a [`SessionRegistry`] that outlives the
//! per-rerun host object graph.
//!
//! Execution is single-threaded per session, so the handle is an
//! `Rc<RefCell<_>>` and no locking is involved.

use crate::error::{HydraError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

// ============================================================================
// Reserved Keys
// ============================================================================

/// App selected before the current one.
pub const PREVIOUS_APP: &str = "previous_app";
/// Currently active app, or the home id.
pub const SELECTED_APP: &str = "selected_app";
/// Pending navigation target, consumed once per reconciliation pass.
pub const OTHER_NAV_APP: &str = "other_nav_app";
/// 1 keeps app keys across app switches, 0 clears them.
pub const PRESERVE_STATE: &str = "preserve_state";
/// Integer access level.
pub const ALLOW_ACCESS: &str = "allow_access";
/// Username granted access, or null.
pub const CURRENT_USER: &str = "current_user";
/// Whether the one-time login callback already ran.
pub const LOGGED_IN: &str = "logged_in";
/// Opaque access token, reset with the login state.
pub const ACCESS_HASH: &str = "access_hash";

/// Keys owned by the navigation core. They survive cross-app clearing.
pub const RESERVED_KEYS: &[&str] = &[
    PREVIOUS_APP,
    SELECTED_APP,
    OTHER_NAV_APP,
    PRESERVE_STATE,
    ALLOW_ACCESS,
    CURRENT_USER,
    LOGGED_IN,
    ACCESS_HASH,
];

/// Returns true if `key` is one of the [`RESERVED_KEYS`].
pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Name to default value pairs used to seed a new store.
pub type SessionDefaults = BTreeMap<String, Value>;

/// Shared reference to one session's store.
pub type SessionHandle = Rc<RefCell<SessionState>>;

// ============================================================================
// Session Identity
// ============================================================================

/// Identity of one user session as resolved by the host framework.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Session State
// ============================================================================

/// Attribute bag for one session.
///
/// Reading an absent key through [`SessionState::get`] fails with
/// [`HydraError::MissingKey`]; use [`SessionState::get_opt`] for optional
/// attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    values: BTreeMap<String, Value>,
    defaults: SessionDefaults,
}

impl SessionState {
    /// Create a store seeded with `defaults`.
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
        }
    }

    pub fn get(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| HydraError::MissingKey(key.to_string()))
    }

    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    // ------------------------------------------------------------------------
    // Navigation keys
    // ------------------------------------------------------------------------

    pub fn previous_app(&self) -> Option<String> {
        self.opt_string(PREVIOUS_APP)
    }

    pub fn set_previous_app(&mut self, app: Option<&str>) {
        self.set_opt_string(PREVIOUS_APP, app);
    }

    pub fn selected_app(&self) -> Option<String> {
        self.opt_string(SELECTED_APP)
    }

    pub fn set_selected_app(&mut self, app: Option<&str>) {
        self.set_opt_string(SELECTED_APP, app);
    }

    pub fn other_nav_app(&self) -> Option<String> {
        self.opt_string(OTHER_NAV_APP)
    }

    pub fn set_other_nav_app(&mut self, app: Option<&str>) {
        self.set_opt_string(OTHER_NAV_APP, app);
    }

    /// Read the pending navigation target and reset it to null in one step.
    pub fn take_other_nav_app(&mut self) -> Option<String> {
        let pending = self.other_nav_app();
        self.values.insert(OTHER_NAV_APP.to_string(), Value::Null);
        pending
    }

    pub fn preserve_state(&self) -> bool {
        self.values.get(PRESERVE_STATE).is_some_and(is_truthy)
    }

    // ------------------------------------------------------------------------
    // Access keys
    // ------------------------------------------------------------------------

    /// Access level coerced to an integer.
    ///
    /// Numbers are truncated, booleans map to 0/1 and numeric strings are
    /// parsed. Anything else is an [`HydraError::InvalidSessionValue`].
    pub fn allow_access(&self) -> Result<i64> {
        let invalid = || HydraError::InvalidSessionValue {
            key: ALLOW_ACCESS.to_string(),
            expected: "integer access level",
        };
        match self.get(ALLOW_ACCESS)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(invalid),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    pub fn set_allow_access(&mut self, level: i64) {
        self.set(ALLOW_ACCESS, level);
    }

    pub fn current_user(&self) -> Option<String> {
        self.opt_string(CURRENT_USER)
    }

    pub fn set_current_user(&mut self, user: Option<&str>) {
        self.set_opt_string(CURRENT_USER, user);
    }

    pub fn logged_in(&self) -> bool {
        self.values.get(LOGGED_IN).is_some_and(is_truthy)
    }

    pub fn set_logged_in(&mut self, logged_in: bool) {
        self.set(LOGGED_IN, logged_in);
    }

    pub fn set_access_hash(&mut self, hash: Option<&str>) {
        self.set_opt_string(ACCESS_HASH, hash);
    }

    // ------------------------------------------------------------------------
    // Clearing
    // ------------------------------------------------------------------------

    /// Drop every non-reserved key, then re-seed the non-reserved defaults.
    ///
    /// Returns the number of keys that were dropped.
    pub fn clear_app_state(&mut self) -> usize {
        let before = self.values.len();
        self.values.retain(|key, _| is_reserved_key(key));
        let removed = before - self.values.len();

        for (key, value) in &self.defaults {
            if !is_reserved_key(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
        removed
    }

    fn opt_string(&self, key: &str) -> Option<String> {
        match self.values.get(key)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn set_opt_string(&mut self, key: &str, value: Option<&str>) {
        let value = value.map_or(Value::Null, |v| Value::String(v.to_string()));
        self.values.insert(key.to_string(), value);
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ============================================================================
// Registry
// ============================================================================

struct SessionEntry {
    handle: SessionHandle,
    created_at: DateTime<Utc>,
    last_seen: DateTime<Utc>,
}

/// Summary of one live session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// One store per session identity.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the store for `id`, creating it from `defaults` if needed.
    ///
    /// An existing store is returned untouched: defaults are only applied on
    /// creation. A missing identity is fatal for the current rerun.
    pub fn get_or_create(
        &mut self,
        id: Option<&SessionId>,
        defaults: &SessionDefaults,
    ) -> Result<SessionHandle> {
        let id = id.ok_or(HydraError::MissingSession)?;
        let now = Utc::now();

        let entry = self.sessions.entry(id.clone()).or_insert_with(|| {
            tracing::info!(session = %id, keys = defaults.len(), "creating session store");
            SessionEntry {
                handle: Rc::new(RefCell::new(SessionState::new(defaults.clone()))),
                created_at: now,
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Ok(Rc::clone(&entry.handle))
    }

    /// Tear down the store for `id`. Returns whether a store existed.
    pub fn end_session(&mut self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::info!(session = %id, "ended session");
        }
        removed
    }

    /// End every session not seen within `max_idle`.
    pub fn prune_idle(&mut self, max_idle: Duration) -> usize {
        self.prune_seen_before(Utc::now() - max_idle)
    }

    /// End every session whose last access is older than `cutoff`.
    pub fn prune_seen_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, entry| entry.last_seen >= cutoff);
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            tracing::info!(pruned, "pruned idle sessions");
        }
        pruned
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn sessions(&self) -> Vec<SessionInfo> {
        let mut infos: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|(id, entry)| SessionInfo {
                id: id.clone(),
                created_at: entry.created_at,
                last_seen: entry.last_seen,
            })
            .collect();
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        infos
    }
}
