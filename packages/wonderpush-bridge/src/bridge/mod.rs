//! # Plugin Bridge
//!
//! The native half of the script plugin. A [`Bridge`] owns the SDK handle,
//! the callback table, the event forwarder and the script-delegate link;
//! there is no global state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          BRIDGE ARCHITECTURE                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Script runtime                                                         │
//! │     │  dispatch(action, "[args]", callback?)                            │
//! │     ▼                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                       Dispatcher                                │   │
//! │  │  parse args ─► route action ─► validate ─► PushSdk call         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │     │                   │                        │                      │
//! │     ▼                   ▼                        ▼                      │
//! │  __callback       __setEventForwarder       setDelegate                 │
//! │  CallbackTable    EventForwarder            ScriptDelegate ──► SDK      │
//! │     ▲                   │                        │                      │
//! │     │                   ▼                        ▼                      │
//! │     └──── token ◄── script channel ◄──── DelegateCall { __callbackId }  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every command returns its [`PluginResult`] directly. The optional
//! [`ScriptCallback`] is only retained by commands that keep a channel open
//! (`__setEventForwarder`, `setDelegate`).

mod dispatch_core;
mod dispatch_delegate;
mod dispatch_installation;
mod dispatch_locale;
mod dispatch_notifications;
mod dispatch_preferences;
mod dispatch_privacy;
mod dispatcher;
mod events;
mod script_delegate;
mod types;

pub use dispatcher::{is_key_allowed, ALLOWED_KEY_PREFIXES};
pub use events::{notification_from_extras, BridgeEvent, EventForwarder};
pub use script_delegate::{DelegateCall, DelegateLink, ScriptDelegate};
pub use types::{PluginResult, ScriptCallback, Status};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::callbacks::{CallbackTable, Resolution};
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::lifecycle::LifecycleForwarder;
use crate::sdk::{JsonObject, PushSdk};

/// Native side of the plugin
pub struct Bridge {
    sdk: Arc<dyn PushSdk>,
    callbacks: Arc<CallbackTable>,
    events: EventForwarder,
    delegate_link: DelegateLink,
    config: BridgeConfig,
    torn_down: AtomicBool,
}

impl Bridge {
    /// Create a bridge around `sdk`.
    ///
    /// Reports the integrator, enables SDK logging when configured, and
    /// initializes the SDK when `auto_init` is set and both credentials
    /// are present.
    pub fn new(sdk: Arc<dyn PushSdk>, config: BridgeConfig) -> Result<Self> {
        sdk.set_integrator(&config.integrator)?;
        if config.logging {
            sdk.set_logging(true)?;
        }
        if config.auto_init {
            match config.credentials() {
                Some((client_id, client_secret)) => {
                    sdk.initialize(client_id, client_secret)?;
                    tracing::info!(client_id, "SDK auto-initialized");
                }
                None => {
                    tracing::warn!("Auto-init is enabled but CLIENT_ID or CLIENT_SECRET is missing");
                }
            }
        }

        tracing::info!(integrator = %config.integrator, "WonderPush bridge created");
        Ok(Self {
            sdk,
            callbacks: Arc::new(CallbackTable::new()),
            events: EventForwarder::new(config.event_buffer_capacity),
            delegate_link: Arc::new(RwLock::new(None)),
            config,
            torn_down: AtomicBool::new(false),
        })
    }

    /// The SDK this bridge forwards to
    pub fn sdk(&self) -> &Arc<dyn PushSdk> {
        &self.sdk
    }

    /// The callback correlation table
    pub fn callbacks(&self) -> &Arc<CallbackTable> {
        &self.callbacks
    }

    /// The event forwarder
    pub fn events(&self) -> &EventForwarder {
        &self.events
    }

    /// Configuration the bridge was created with
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Forwarder for application and notification-center callbacks
    pub fn lifecycle(&self) -> LifecycleForwarder {
        LifecycleForwarder::new(self.sdk.clone())
    }

    /// Whether a script delegate is attached
    pub fn has_script_delegate(&self) -> bool {
        self.delegate_link.read().is_some()
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Run a command without a script callback
    pub fn dispatch(&self, action: &str, args_json: &str) -> PluginResult {
        self.dispatch_with_callback(action, args_json, None)
    }

    /// Run a command whose arguments are a JSON array
    pub fn dispatch_with_callback(
        &self,
        action: &str,
        args_json: &str,
        callback: Option<ScriptCallback>,
    ) -> PluginResult {
        match dispatcher::json_parse(args_json) {
            Ok(args) => self.dispatch_args(action, &args, callback),
            Err((code, message)) => PluginResult::error(code, message),
        }
    }

    /// Run a command with already-parsed arguments
    pub fn dispatch_args(
        &self,
        action: &str,
        args: &[Value],
        callback: Option<ScriptCallback>,
    ) -> PluginResult {
        if self.is_torn_down() {
            return PluginResult::from(Error::TornDown);
        }

        match dispatcher::dispatch(self, action, args, callback.as_ref()) {
            Ok(result) => result,
            Err((code, message)) => {
                tracing::debug!(action, code, %message, "Command failed");
                PluginResult::error(code, message)
            }
        }
    }

    /// Resolve a callback token, as `__callback` does
    pub fn resolve_callback(&self, token: &str, value: Value) -> Resolution {
        self.callbacks.resolve(token, value)
    }

    // ------------------------------------------------------------------
    // Native events
    // ------------------------------------------------------------------

    /// A notification was opened. Returns whether the event was delivered now.
    ///
    /// Dropped once the bridge is torn down.
    pub fn notification_opened(&self, notification: JsonObject, notification_type: Option<String>) -> bool {
        if self.is_torn_down() {
            return false;
        }
        self.events.emit(BridgeEvent::NotificationOpen {
            notification: Value::Object(notification),
            notification_type,
        })
    }

    /// A notification was opened, with its payload as platform extras.
    ///
    /// Empty extras produce no event.
    pub fn notification_opened_from_extras<I, K>(&self, extras: I, notification_type: Option<String>) -> bool
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let notification = notification_from_extras(extras);
        if notification.is_empty() {
            return false;
        }
        self.notification_opened(notification, notification_type)
    }

    /// A notification button invoked a registered callback
    pub fn registered_callback(&self, method: &str, arg: Option<String>) -> bool {
        if self.is_torn_down() {
            return false;
        }
        self.events.emit(BridgeEvent::RegisteredCallback {
            method: method.to_string(),
            arg,
        })
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Whether [`Bridge::teardown`] ran
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Detach every script channel and discard pending callbacks without
    /// invoking them. Returns how many callbacks were discarded.
    ///
    /// Later commands fail with [`Error::TornDown`]. Idempotent.
    pub fn teardown(&self) -> usize {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return 0;
        }

        if let Some(age) = self.callbacks.oldest_pending_age() {
            tracing::warn!(
                pending = self.callbacks.len(),
                oldest_ms = age.as_millis() as u64,
                "Tearing down with unresolved callbacks"
            );
        }

        if self.delegate_link.write().take().is_some() {
            if let Err(e) = self.sdk.set_delegate(None) {
                tracing::warn!(error = %e, "Failed to remove the script delegate");
            }
        }
        self.events.clear();
        let discarded = self.callbacks.teardown();
        tracing::info!(discarded, "WonderPush bridge torn down");
        discarded
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("callbacks", &self.callbacks)
            .field("events", &self.events)
            .field("script_delegate", &self.has_script_delegate())
            .field("torn_down", &self.is_torn_down())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::MemorySdk;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    fn memory_bridge() -> (Bridge, Arc<MemorySdk>) {
        let sdk = Arc::new(MemorySdk::new());
        let config = BridgeConfig {
            client_id: Some("client".into()),
            client_secret: Some("secret".into()),
            delegate_timeout: Duration::from_millis(200),
            ..Default::default()
        };
        let bridge = Bridge::new(sdk.clone(), config).unwrap();
        (bridge, sdk)
    }

    fn collector() -> (ScriptCallback, Arc<Mutex<Vec<PluginResult>>>) {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        let callback: ScriptCallback = Arc::new(move |result: PluginResult| sink.lock().push(result));
        (callback, received)
    }

    #[test]
    fn test_new_reports_integrator_and_auto_initializes() {
        let (_bridge, sdk) = memory_bridge();
        assert!(sdk.integrator().unwrap().starts_with("wonderpush-rust-bridge-"));
        assert!(sdk.is_initialized().unwrap());
    }

    #[test]
    fn test_auto_init_without_credentials_only_warns() {
        let sdk = Arc::new(MemorySdk::new());
        let _bridge = Bridge::new(sdk.clone(), BridgeConfig::default()).unwrap();
        assert!(!sdk.is_initialized().unwrap());
    }

    #[test]
    fn test_logging_flag_reaches_sdk() {
        let sdk = Arc::new(MemorySdk::new());
        let config = BridgeConfig { logging: true, ..Default::default() };
        let _bridge = Bridge::new(sdk.clone(), config).unwrap();
        assert!(sdk.logging());
    }

    #[test]
    fn test_unknown_action() {
        let (bridge, _) = memory_bridge();
        let result = bridge.dispatch("launchRockets", "[]");
        assert_eq!(result.error_code(), Some(404));
    }

    #[test]
    fn test_invalid_json_args() {
        let (bridge, _) = memory_bridge();
        assert_eq!(bridge.dispatch("getUserId", "{").error_code(), Some(200));
    }

    #[test]
    fn test_core_getters() {
        let (bridge, _) = memory_bridge();
        assert_eq!(bridge.dispatch("getUserId", "[]").message, Value::Null);
        assert!(bridge.dispatch("setUserId", r#"["alice"]"#).is_ok());
        assert_eq!(bridge.dispatch("getUserId", "[]").message, json!("alice"));
        assert!(bridge.dispatch("setUserId", "[null]").is_ok());
        assert_eq!(bridge.dispatch("getUserId", "[]").message, Value::Null);

        assert_eq!(bridge.dispatch("isReady", "").message, json!(true));
        assert!(bridge.dispatch("getInstallationId", "[]").message.is_string());
        assert_eq!(bridge.dispatch("setUserId", "[42]").error_code(), Some(202));
    }

    #[test]
    fn test_initialize_missing_secret() {
        let sdk = Arc::new(MemorySdk::new());
        let bridge = Bridge::new(sdk, BridgeConfig::default()).unwrap();
        let result = bridge.dispatch("initialize", r#"["client"]"#);
        assert_eq!(result.error_code(), Some(201));
        assert_eq!(result.message["message"], "Missing clientSecret");
    }

    #[test]
    fn test_sdk_errors_pass_through() {
        let sdk = Arc::new(MemorySdk::new());
        let bridge = Bridge::new(sdk, BridgeConfig::default()).unwrap();
        // Tags need an initialized SDK.
        let result = bridge.dispatch("addTag", r#"["a"]"#);
        assert_eq!(result.error_code(), Some(Error::NotInitialized.code()));
    }

    #[test]
    fn test_track_event_validation() {
        let (bridge, sdk) = memory_bridge();
        assert_eq!(bridge.dispatch("trackEvent", r#"[""]"#).error_code(), Some(202));
        assert_eq!(
            bridge.dispatch("trackEvent", r#"["buy", {"price": 3}]"#).error_code(),
            Some(203)
        );
        assert!(bridge.dispatch("trackEvent", r#"["buy", {"float_price": 3.5}]"#).is_ok());
        assert!(bridge.dispatch("trackEvent", r#"["view"]"#).is_ok());

        let events = sdk.tracked_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].attributes.as_ref().unwrap()["float_price"], 3.5);
    }

    #[test]
    fn test_tags_accept_string_or_array() {
        let (bridge, _) = memory_bridge();
        assert!(bridge.dispatch("addTag", r#"["a"]"#).is_ok());
        assert!(bridge.dispatch("addTag", r#"[["b", 3, "c"]]"#).is_ok());
        assert_eq!(bridge.dispatch("getTags", "[]").message, json!(["a", "b", "c"]));

        assert!(bridge.dispatch("removeTag", r#"[["a", "c"]]"#).is_ok());
        assert_eq!(bridge.dispatch("hasTag", r#"["b"]"#).message, json!(true));
        assert_eq!(bridge.dispatch("hasTag", r#"["a"]"#).message, json!(false));
    }

    #[test]
    fn test_property_value_is_wrapped() {
        let (bridge, _) = memory_bridge();
        assert_eq!(
            bridge.dispatch("getPropertyValue", r#"["string_color"]"#).message,
            json!({"__wrapped": null})
        );
        bridge.dispatch("setProperty", r#"["string_color", "red"]"#);
        assert_eq!(
            bridge.dispatch("getPropertyValue", r#"["string_color"]"#).message,
            json!({"__wrapped": "red"})
        );
    }

    #[test]
    fn test_put_properties_checks_keys() {
        let (bridge, _) = memory_bridge();
        assert_eq!(
            bridge.dispatch("putProperties", r#"[{"age": 3}]"#).error_code(),
            Some(203)
        );
        assert_eq!(
            bridge
                .dispatch("putInstallationCustomProperties", r#"[{"age": 3}]"#)
                .error_code(),
            Some(203)
        );
        assert!(bridge.dispatch("putProperties", r#"[{"int_age": 3}]"#).is_ok());
        assert_eq!(
            bridge.dispatch("getProperties", "[]").message,
            json!({"int_age": 3})
        );
    }

    #[test]
    fn test_subscription_and_privacy() {
        let (bridge, _) = memory_bridge();
        assert!(bridge.dispatch("subscribeToNotifications", "[true]").is_ok());
        assert_eq!(
            bridge.dispatch("isSubscribedToNotifications", "[]").message,
            json!(true)
        );
        assert_eq!(
            bridge.dispatch("setNotificationEnabled", r#"["yes"]"#).error_code(),
            Some(202)
        );
        assert!(bridge.dispatch("setUserConsent", "[false]").is_ok());
        assert_eq!(bridge.dispatch("getUserConsent", "[]").message, json!(false));
        assert!(bridge.dispatch("setGeolocation", "[48.8, 2.3]").is_ok());
        assert_eq!(bridge.dispatch("setGeolocation", "[48.8]").error_code(), Some(201));
    }

    #[test]
    fn test_locale_overrides() {
        let (bridge, _) = memory_bridge();
        assert!(bridge.dispatch("setCountry", r#"["fr"]"#).is_ok());
        assert_eq!(bridge.dispatch("getCountry", "[]").message, json!("FR"));
        assert!(bridge.dispatch("setCountry", "[null]").is_ok());
        assert_eq!(bridge.dispatch("getCountry", "[]").message, Value::Null);
        assert!(bridge.dispatch("setTimeZone", r#"["Europe/Paris"]"#).is_ok());
        assert_eq!(bridge.dispatch("getTimeZone", "[]").message, json!("Europe/Paris"));
    }

    #[test]
    fn test_user_preferences() {
        let (bridge, _) = memory_bridge();
        assert_eq!(
            bridge.dispatch("UserPreferences_getDefaultChannelId", "[]").message,
            json!("default")
        );
        assert!(bridge
            .dispatch(
                "UserPreferences_setChannels",
                r#"[[{"id": "news", "importance": 3}, {"name": "no id"}]]"#
            )
            .is_ok());
        assert_eq!(
            bridge.dispatch("UserPreferences_getChannel", r#"["news"]"#).message,
            json!({"id": "news", "importance": 3})
        );
        assert_eq!(
            bridge.dispatch("UserPreferences_getChannelGroup", r#"["none"]"#).message,
            Value::Null
        );
        assert!(bridge.dispatch("UserPreferences_removeChannel", r#"["news"]"#).is_ok());
        assert_eq!(
            bridge.dispatch("UserPreferences_getChannel", r#"["news"]"#).message,
            Value::Null
        );
    }

    #[test]
    fn test_event_forwarder_flushes_buffered_events() {
        let (bridge, _) = memory_bridge();
        assert!(!bridge.registered_callback("onCta", Some("x".into())));
        let mut notification = JsonObject::new();
        notification.insert("alert".into(), json!("hi"));
        assert!(!bridge.notification_opened(notification, None));

        assert_eq!(
            bridge.dispatch("__setEventForwarder", "[]").error_code(),
            Some(204)
        );

        let (sink, received) = collector();
        let reply = bridge.dispatch_with_callback("__setEventForwarder", "[]", Some(sink));
        assert!(reply.is_ok());
        assert!(reply.keep_callback);

        let received = received.lock();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].message["type"], "registeredCallback");
        assert_eq!(received[1].message["type"], "notificationOpen");
    }

    #[test]
    fn test_empty_extras_produce_no_event() {
        let (bridge, _) = memory_bridge();
        let extras: Vec<(String, Value)> = Vec::new();
        assert!(!bridge.notification_opened_from_extras(extras, None));
        assert_eq!(bridge.events().pending_len(), 0);
    }

    #[test]
    fn test_callback_with_unknown_token_still_succeeds() {
        let (bridge, _) = memory_bridge();
        assert!(bridge.dispatch("__callback", r#"["nope", "x"]"#).is_ok());
        assert_eq!(bridge.dispatch("__callback", "[]").error_code(), Some(201));
    }

    #[test]
    fn test_callback_resolves_registered_token_once() {
        let (bridge, _) = memory_bridge();
        let hits = Arc::new(Mutex::new(Vec::new()));
        let sink = hits.clone();
        let token = bridge.callbacks().register(move |v| sink.lock().push(v));

        let args = json!([token, {"ok": true}]).to_string();
        assert!(bridge.dispatch("__callback", &args).is_ok());
        assert!(bridge.dispatch("__callback", &args).is_ok());
        assert_eq!(*hits.lock(), vec![json!({"ok": true})]);
    }

    #[test]
    fn test_script_delegate_round_trip() {
        let (bridge, sdk) = memory_bridge();
        let bridge = Arc::new(bridge);

        // The script answers every urlForDeepLink by rewriting the scheme.
        let weak = Arc::downgrade(&bridge);
        let channel: ScriptCallback = Arc::new(move |call: PluginResult| {
            let (Some(bridge), Some(token)) = (weak.upgrade(), call.message["__callbackId"].as_str()) else {
                return;
            };
            let url = call.message["url"].as_str().unwrap_or_default().replace("http:", "https:");
            bridge.dispatch("__callback", &json!([token, url]).to_string());
        });

        let reply = bridge.dispatch_with_callback("setDelegate", "[true]", Some(channel));
        assert!(reply.keep_callback);
        assert!(sdk.has_delegate());

        assert_eq!(
            sdk.open_deep_link("http://example.com").as_deref(),
            Some("https://example.com")
        );
        assert!(bridge.callbacks().is_empty());

        assert!(bridge.dispatch("setDelegate", "[false]").is_ok());
        assert!(!sdk.has_delegate());
        assert!(!bridge.has_script_delegate());
    }

    #[test]
    fn test_silent_script_delegate_times_out() {
        let (bridge, sdk) = memory_bridge();
        let (channel, calls) = collector();
        bridge.dispatch_with_callback("setDelegate", "[true]", Some(channel));

        assert_eq!(sdk.open_deep_link("app://x").as_deref(), Some("app://x"));
        assert_eq!(calls.lock()[0].message["method"], "urlForDeepLink");
        assert_eq!(bridge.callbacks().len(), 1);
    }

    #[test]
    fn test_notification_response_reaches_script_delegate() {
        let (bridge, sdk) = memory_bridge();
        let (channel, calls) = collector();
        bridge.dispatch_with_callback("setDelegate", "[true]", Some(channel));

        let response = crate::lifecycle::NotificationResponse {
            action_identifier: crate::lifecycle::NotificationResponse::DEFAULT_ACTION.into(),
            user_info: JsonObject::new(),
        };
        bridge.lifecycle().did_receive_notification_response(&response).unwrap();
        let calls = calls.lock();
        assert_eq!(calls[0].message["method"], "onNotificationOpened");
        assert_eq!(calls[0].message["buttonIndex"], -1);
    }

    #[test]
    fn test_teardown() {
        let (bridge, _) = memory_bridge();
        let (_token, waiter) = bridge.callbacks().register_waiter();
        bridge.callbacks().register(|_| panic!("must not run at teardown"));

        assert_eq!(bridge.teardown(), 2);
        assert!(matches!(
            waiter.wait(Duration::from_secs(1)),
            Err(Error::CallbackDropped(_))
        ));
        assert_eq!(bridge.dispatch("getUserId", "[]").error_code(), Some(102));
        assert_eq!(bridge.teardown(), 0);
    }

    #[test]
    fn test_events_after_teardown_are_dropped() {
        let (bridge, _) = memory_bridge();
        bridge.teardown();

        let mut notification = JsonObject::new();
        notification.insert("alert".into(), json!("late"));
        assert!(!bridge.notification_opened(notification, None));
        assert!(!bridge.registered_callback("onCta", None));
        assert_eq!(bridge.events().pending_len(), 0);
    }
}
