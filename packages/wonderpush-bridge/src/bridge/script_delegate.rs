//! # Script Delegate
//!
//! A [`PushDelegate`] that asks the script runtime.
//!
//! The SDK calls the delegate synchronously, but the script answers through
//! a later `__callback` command. The delegate registers a waiter in the
//! callback table, sends the question with the waiter's token, and blocks
//! the calling native thread until the answer arrives or the delegate
//! timeout elapses. On timeout the original URL is used.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use super::types::{PluginResult, ScriptCallback};
use crate::callbacks::CallbackTable;
use crate::sdk::PushDelegate;

/// Shared slot holding the script delegate's channel, if one is set.
pub type DelegateLink = Arc<RwLock<Option<ScriptCallback>>>;

/// Message sent on the delegate channel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum DelegateCall {
    /// Which URL should be opened instead of `url`
    UrlForDeepLink {
        /// Token to answer with through `__callback`
        #[serde(rename = "__callbackId")]
        callback_id: String,
        /// URL the SDK is about to open
        url: String,
    },
    /// A notification was opened
    OnNotificationOpened {
        /// Notification payload
        notification: Value,
        /// Button index, `-1` for the notification body
        #[serde(rename = "buttonIndex")]
        button_index: i32,
    },
    /// A notification was received
    OnNotificationReceived {
        /// Notification payload
        notification: Value,
    },
}

impl DelegateCall {
    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Delegate installed in the SDK by `setDelegate [true]`
pub struct ScriptDelegate {
    link: DelegateLink,
    callbacks: Arc<CallbackTable>,
    timeout: Duration,
}

impl ScriptDelegate {
    /// Create a delegate answering through `link`
    pub fn new(link: DelegateLink, callbacks: Arc<CallbackTable>, timeout: Duration) -> Self {
        Self { link, callbacks, timeout }
    }

    fn channel(&self) -> Option<ScriptCallback> {
        self.link.read().clone()
    }

    fn notify(&self, call: DelegateCall) {
        if let Some(channel) = self.channel() {
            channel(PluginResult::ok(call.to_json()).keep());
        }
    }
}

impl PushDelegate for ScriptDelegate {
    fn url_for_deep_link(&self, url: &str) -> Option<String> {
        let Some(channel) = self.channel() else {
            return Some(url.to_string());
        };

        // Register before sending: the answer may arrive on this very thread.
        let (token, waiter) = self.callbacks.register_waiter();
        channel(
            PluginResult::ok(
                DelegateCall::UrlForDeepLink {
                    callback_id: token,
                    url: url.to_string(),
                }
                .to_json(),
            )
            .keep(),
        );

        match waiter.wait(self.timeout) {
            Ok(Value::String(replacement)) => Some(replacement),
            // An explicit null answer means "open nothing", unlike a missing answer.
            Ok(Value::Null) => None,
            Ok(other) => {
                tracing::error!(
                    value = %other,
                    "urlForDeepLink expected a string from JavaScript"
                );
                Some(url.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Script delegate did not answer, keeping the original URL");
                Some(url.to_string())
            }
        }
    }

    fn on_notification_opened(&self, notification: &Value, button_index: i32) {
        self.notify(DelegateCall::OnNotificationOpened {
            notification: notification.clone(),
            button_index,
        });
    }

    fn on_notification_received(&self, notification: &Value) {
        self.notify(DelegateCall::OnNotificationReceived {
            notification: notification.clone(),
        });
    }
}

impl std::fmt::Debug for ScriptDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptDelegate")
            .field("attached", &self.link.read().is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn delegate_with(answer: Option<Value>, timeout: Duration) -> (ScriptDelegate, Arc<CallbackTable>) {
        let callbacks = Arc::new(CallbackTable::new());
        let table = callbacks.clone();
        let channel: ScriptCallback = Arc::new(move |result: PluginResult| {
            if let (Some(answer), Some(token)) = (&answer, result.message["__callbackId"].as_str()) {
                table.resolve(token, answer.clone());
            }
        });
        let link: DelegateLink = Arc::new(RwLock::new(Some(channel)));
        (ScriptDelegate::new(link, callbacks.clone(), timeout), callbacks)
    }

    #[test]
    fn test_call_json_shape() {
        let call = DelegateCall::UrlForDeepLink { callback_id: "t1".into(), url: "app://a".into() };
        assert_eq!(
            call.to_json(),
            json!({"method": "urlForDeepLink", "__callbackId": "t1", "url": "app://a"})
        );
    }

    #[test]
    fn test_no_link_passes_through() {
        let link: DelegateLink = Arc::new(RwLock::new(None));
        let delegate = ScriptDelegate::new(link, Arc::new(CallbackTable::new()), Duration::from_secs(1));
        assert_eq!(delegate.url_for_deep_link("app://x").as_deref(), Some("app://x"));
    }

    #[test]
    fn test_string_answer_replaces_url() {
        let (delegate, callbacks) = delegate_with(Some(json!("app://other")), Duration::from_secs(1));
        assert_eq!(delegate.url_for_deep_link("app://x").as_deref(), Some("app://other"));
        assert!(callbacks.is_empty());
    }

    #[test]
    fn test_null_answer_opens_nothing() {
        let (delegate, _) = delegate_with(Some(Value::Null), Duration::from_secs(1));
        assert_eq!(delegate.url_for_deep_link("app://x"), None);
    }

    #[test]
    fn test_wrong_type_falls_back() {
        let (delegate, _) = delegate_with(Some(json!(42)), Duration::from_secs(1));
        assert_eq!(delegate.url_for_deep_link("app://x").as_deref(), Some("app://x"));
    }

    #[test]
    fn test_timeout_falls_back_and_leaves_entry() {
        let (delegate, callbacks) = delegate_with(None, Duration::from_millis(20));
        assert_eq!(delegate.url_for_deep_link("app://x").as_deref(), Some("app://x"));
        // No expiry at the table layer.
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks.teardown(), 1);
    }

    #[test]
    fn test_answer_from_another_thread() {
        let callbacks = Arc::new(CallbackTable::new());
        let table = callbacks.clone();
        let channel: ScriptCallback = Arc::new(move |result: PluginResult| {
            let token = result.message["__callbackId"].as_str().map(str::to_string);
            let table = table.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                if let Some(token) = token {
                    table.resolve(&token, json!("app://late-but-in-time"));
                }
            });
        });
        let link: DelegateLink = Arc::new(RwLock::new(Some(channel)));
        let delegate = ScriptDelegate::new(link, callbacks, Duration::from_secs(5));

        assert_eq!(
            delegate.url_for_deep_link("app://x").as_deref(),
            Some("app://late-but-in-time")
        );
    }
}
