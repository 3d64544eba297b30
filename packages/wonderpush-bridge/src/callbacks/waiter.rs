//! Blocking waiters for native threads that need the script's answer
//! before returning to the SDK.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde_json::Value;

use crate::error::{Error, Result};

enum SlotState {
    Pending,
    Filled(Value),
    Dropped,
}

struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl Slot {
    fn settle(&self, next: SlotState) {
        let mut state = self.state.lock();
        if matches!(*state, SlotState::Pending) {
            *state = next;
            self.ready.notify_all();
        }
    }
}

/// Write half, moved into the table entry.
///
/// Dropping it unfilled (teardown) marks the slot as dropped.
pub(super) struct Completer {
    slot: Option<Arc<Slot>>,
}

impl Completer {
    pub(super) fn complete(mut self, value: Value) {
        if let Some(slot) = self.slot.take() {
            slot.settle(SlotState::Filled(value));
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.settle(SlotState::Dropped);
        }
    }
}

/// Read half of a registered waiter.
pub struct Waiter {
    token: String,
    slot: Arc<Slot>,
}

pub(super) fn pair() -> (Completer, Waiter) {
    let slot = Arc::new(Slot {
        state: Mutex::new(SlotState::Pending),
        ready: Condvar::new(),
    });
    (
        Completer { slot: Some(slot.clone()) },
        Waiter { token: String::new(), slot },
    )
}

impl Waiter {
    pub(super) fn with_token(mut self, token: String) -> Self {
        self.token = token;
        self
    }

    /// The token this waiter is registered under
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Block until the token is resolved or `timeout` elapses.
    ///
    /// A timeout does not remove the table entry; a late resolution lands
    /// in a slot nobody reads anymore.
    pub fn wait(self, timeout: Duration) -> Result<Value> {
        let deadline = Instant::now() + timeout;
        let mut state = self.slot.state.lock();

        loop {
            match std::mem::replace(&mut *state, SlotState::Pending) {
                SlotState::Filled(value) => return Ok(value),
                SlotState::Dropped => {
                    *state = SlotState::Dropped;
                    return Err(Error::CallbackDropped(self.token));
                }
                SlotState::Pending => {}
            }

            if self.slot.ready.wait_until(&mut state, deadline).timed_out() {
                // Last look: the value may have landed right at the deadline.
                return match std::mem::replace(&mut *state, SlotState::Dropped) {
                    SlotState::Filled(value) => Ok(value),
                    _ => Err(Error::CallbackTimeout(self.token)),
                };
            }
        }
    }
}
