//! # Callback Correlation Table
//!
//! Correlates an opaque token sent to the script runtime with the native
//! completion action waiting for its answer.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     CALLBACK CORRELATION                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Native side                    Table                 Script runtime    │
//! │  ───────────                    ─────                 ──────────────    │
//! │                                                                         │
//! │  register(action) ──────────► insert(token, action)                     │
//! │        │                                                                │
//! │        └── token ─────────────────────────────────► { __callbackId }    │
//! │                                                             │           │
//! │                                                             ▼           │
//! │  action(value) ◄──────────── remove(token) ◄──── __callback [id, value] │
//! │                                                                         │
//! │  A second __callback for the same token finds nothing: no-op + warn.   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! One `parking_lot::Mutex` guards the map. `register` inserts and
//! `resolve` removes under that lock, so a token is never observed
//! mid-insertion and can be taken at most once. Actions run after the lock
//! is released.
//!
//! There is no expiry at this layer: an action that is never resolved stays
//! in the table until [`CallbackTable::teardown`]. [`CallbackTable::oldest_pending_age`]
//! exposes how long the oldest entry has been waiting so hosts can spot leaks.

mod waiter;

pub use waiter::Waiter;

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::time::{elapsed_since, now_timestamp_millis};

/// A one-argument completion procedure.
pub type CallbackAction = Box<dyn FnOnce(Value) + Send + 'static>;

/// Outcome of [`CallbackTable::resolve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The action was found, removed, and invoked
    Delivered,
    /// No entry for this token (never registered, already resolved, or torn down)
    Unknown,
}

impl Resolution {
    /// Whether an action was invoked
    pub fn is_delivered(self) -> bool {
        self == Resolution::Delivered
    }
}

struct CallbackEntry {
    action: CallbackAction,
    registered_at: i64,
}

/// Table of pending completion actions keyed by token.
#[derive(Default)]
pub struct CallbackTable {
    entries: Mutex<HashMap<String, CallbackEntry>>,
}

impl CallbackTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `action` under a fresh token and return the token.
    pub fn register<F>(&self, action: F) -> String
    where
        F: FnOnce(Value) + Send + 'static,
    {
        let entry = CallbackEntry {
            action: Box::new(action),
            registered_at: now_timestamp_millis(),
        };

        let mut entries = self.entries.lock();
        let mut token = Uuid::new_v4().to_string();
        while entries.contains_key(&token) {
            token = Uuid::new_v4().to_string();
        }
        entries.insert(token.clone(), entry);
        let pending = entries.len();
        drop(entries);

        tracing::debug!(%token, pending, "Registered callback");
        token
    }

    /// Take the entry for `token` and invoke it with `value`.
    ///
    /// Unknown tokens are logged and ignored.
    pub fn resolve(&self, token: &str, value: Value) -> Resolution {
        let entry = self.entries.lock().remove(token);

        match entry {
            Some(entry) => {
                (entry.action)(value);
                tracing::debug!(%token, "Resolved callback");
                Resolution::Delivered
            }
            None => {
                tracing::warn!(
                    %token,
                    "Cannot record a JavaScript callback, callback does not exist (too late or already resolved?)"
                );
                Resolution::Unknown
            }
        }
    }

    /// Register a waiter that a native thread can block on.
    pub fn register_waiter(&self) -> (String, Waiter) {
        let (completer, waiter) = waiter::pair();
        let token = self.register(move |value| completer.complete(value));
        (token.clone(), waiter.with_token(token))
    }

    /// Register a oneshot channel for async hosts.
    ///
    /// The receiver errors if the entry is dropped at teardown.
    pub fn register_oneshot(&self) -> (String, oneshot::Receiver<Value>) {
        let (tx, rx) = oneshot::channel();
        let token = self.register(move |value| {
            // Receiver may have given up already.
            let _ = tx.send(value);
        });
        (token, rx)
    }

    /// Whether `token` is still pending
    pub fn contains(&self, token: &str) -> bool {
        self.entries.lock().contains_key(token)
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no entries are pending
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// How long the oldest pending entry has been waiting
    pub fn oldest_pending_age(&self) -> Option<Duration> {
        self.entries
            .lock()
            .values()
            .map(|entry| entry.registered_at)
            .min()
            .map(elapsed_since)
    }

    /// Drop every pending entry without invoking it.
    ///
    /// Returns how many entries were discarded.
    pub fn teardown(&self) -> usize {
        let drained: Vec<CallbackEntry> = {
            let mut entries = self.entries.lock();
            entries.drain().map(|(_, entry)| entry).collect()
        };

        let count = drained.len();
        if count > 0 {
            tracing::info!(count, "Discarding unresolved callbacks at teardown");
        }
        // Dropped outside the lock: waiters wake up as their completers go away.
        drop(drained);
        count
    }
}

impl std::fmt::Debug for CallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackTable")
            .field("pending", &self.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
