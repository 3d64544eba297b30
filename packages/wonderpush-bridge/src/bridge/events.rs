//! # Bridge Events
//!
//! Pushes native events to the script runtime over the channel registered
//! by `__setEventForwarder`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          EVENT FORWARDING                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  SDK / host            EventForwarder                Script runtime     │
//! │  ──────────            ──────────────                ──────────────     │
//! │                                                                         │
//! │  emit(event) ──► forwarder attached? ──yes──► sink(ok(event).keep())    │
//! │                          │                                              │
//! │                          no                                             │
//! │                          ▼                                              │
//! │                  pending queue (bounded, oldest dropped)                │
//! │                          │                                              │
//! │                  attach(sink) ──────── flush in order ──►               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sinks are always called without the forwarder's lock held.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{PluginResult, ScriptCallback};
use crate::sdk::JsonObject;

/// Native-to-script event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeEvent {
    /// The user opened a notification
    NotificationOpen {
        /// Notification payload
        notification: Value,
        /// Notification type, `"data"` for silent notifications
        #[serde(rename = "notificationType")]
        notification_type: Option<String>,
    },
    /// A notification button invoked a registered callback
    RegisteredCallback {
        /// Registered callback name
        method: String,
        /// Argument configured on the button
        arg: Option<String>,
    },
}

impl BridgeEvent {
    /// Event type tag
    pub fn event_type(&self) -> &'static str {
        match self {
            BridgeEvent::NotificationOpen { .. } => "notificationOpen",
            BridgeEvent::RegisteredCallback { .. } => "registeredCallback",
        }
    }

    /// JSON form sent to the script runtime
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build a notification object from string extras.
///
/// Values that look like a JSON object (`{...}`) are parsed; values that fail
/// to parse stay strings.
pub fn notification_from_extras<I, K>(extras: I) -> JsonObject
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    extras
        .into_iter()
        .map(|(key, value)| {
            let key = key.into();
            let value = match value {
                Value::String(s) if s.starts_with('{') && s.ends_with('}') => {
                    match serde_json::from_str::<Value>(&s) {
                        Ok(parsed @ Value::Object(_)) => parsed,
                        Ok(_) | Err(_) => {
                            tracing::debug!(field = %key, "Seemingly JSON notification field did not parse");
                            Value::String(s)
                        }
                    }
                }
                other => other,
            };
            (key, value)
        })
        .collect()
}

struct ForwarderState {
    sink: Option<ScriptCallback>,
    pending: VecDeque<BridgeEvent>,
    dropped: u64,
    // While set, one thread owns delivery of `pending` and new events queue behind it.
    flushing: bool,
}

/// Delivers events to the script runtime, buffering until it is ready.
pub struct EventForwarder {
    state: Mutex<ForwarderState>,
    capacity: usize,
}

impl EventForwarder {
    /// Create a forwarder buffering at most `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(ForwarderState {
                sink: None,
                pending: VecDeque::new(),
                dropped: 0,
                flushing: false,
            }),
            capacity,
        }
    }

    /// Attach the script channel and flush buffered events. Returns how many were flushed.
    ///
    /// Replaces any previous channel. Events emitted during the flush, even
    /// from inside the channel, are delivered after the buffered ones.
    pub fn attach(&self, sink: ScriptCallback) -> usize {
        {
            let mut state = self.state.lock();
            state.sink = Some(sink);
            if state.dropped > 0 {
                tracing::warn!(dropped = state.dropped, "Events were dropped before the forwarder attached");
                state.dropped = 0;
            }
            if state.flushing {
                // The running flush picks up the new channel.
                return 0;
            }
            state.flushing = true;
        }

        let flushed = self.flush();
        tracing::debug!(flushed, "Event forwarder attached");
        flushed
    }

    fn flush(&self) -> usize {
        let mut flushed = 0;
        loop {
            let (sink, event) = {
                let mut state = self.state.lock();
                let next = match state.sink.clone() {
                    Some(sink) => state.pending.pop_front().map(|event| (sink, event)),
                    None => None,
                };
                match next {
                    Some(next) => next,
                    None => {
                        state.flushing = false;
                        return flushed;
                    }
                }
            };
            sink(PluginResult::ok(event.to_json()).keep());
            flushed += 1;
        }
    }

    /// Detach the script channel. Later events are buffered again.
    pub fn detach(&self) -> Option<ScriptCallback> {
        self.state.lock().sink.take()
    }

    /// Send an event, or buffer it. Returns whether a channel is attached to receive it.
    pub fn emit(&self, event: BridgeEvent) -> bool {
        let sink = {
            let mut state = self.state.lock();
            match state.sink.clone() {
                Some(_) if state.flushing => {
                    state.pending.push_back(event);
                    return true;
                }
                Some(sink) => sink,
                None => {
                    if self.capacity == 0 {
                        state.dropped += 1;
                        return false;
                    }
                    if state.pending.len() >= self.capacity {
                        state.pending.pop_front();
                        state.dropped += 1;
                    }
                    tracing::debug!(event = event.event_type(), "Buffering event until a forwarder attaches");
                    state.pending.push_back(event);
                    return false;
                }
            }
        };

        sink(PluginResult::ok(event.to_json()).keep());
        true
    }

    /// Whether a script channel is attached
    pub fn is_attached(&self) -> bool {
        self.state.lock().sink.is_some()
    }

    /// Events waiting for a forwarder
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Drop the channel and every buffered event
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.sink = None;
        state.pending.clear();
        state.dropped = 0;
    }
}

impl std::fmt::Debug for EventForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("EventForwarder")
            .field("attached", &state.sink.is_some())
            .field("pending", &state.pending.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
