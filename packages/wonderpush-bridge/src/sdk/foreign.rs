//! # Foreign SDK
//!
//! A [`PushSdk`] whose every call is forwarded to a host-provided transport.
//! Used when the real SDK lives on the other side of a language boundary
//! (Swift or Kotlin): the host receives the plugin's method name and a
//! positional JSON argument array, and answers with the SDK's result.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{json, Value};

use super::{Channel, ChannelGroup, JsonObject, PushDelegate, PushSdk};
use crate::error::{Error, Result};
use crate::lifecycle::{NotificationResponse, PresentationOptions};

/// Host-side entry point: `(method, args) -> result`
pub type SdkTransport = Arc<dyn Fn(&str, Vec<Value>) -> Result<Value> + Send + Sync>;

/// Forwards SDK calls to the host
pub struct ForeignSdk {
    transport: SdkTransport,
    delegate: RwLock<Option<Arc<dyn PushDelegate>>>,
}

impl ForeignSdk {
    /// Create from a transport
    pub fn new(transport: SdkTransport) -> Self {
        Self {
            transport,
            delegate: RwLock::new(None),
        }
    }

    /// Delegate currently installed, so the host can route SDK questions to it
    pub fn delegate(&self) -> Option<Arc<dyn PushDelegate>> {
        self.delegate.read().clone()
    }

    fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        tracing::trace!(method, "Forwarding SDK call");
        (self.transport)(method, args)
    }

    fn call_unit(&self, method: &str, args: Vec<Value>) -> Result<()> {
        self.call(method, args).map(|_| ())
    }

    fn call_bool(&self, method: &str) -> Result<bool> {
        match self.call(method, Vec::new())? {
            Value::Bool(b) => Ok(b),
            Value::Null => Ok(false),
            other => Err(unexpected(method, "a boolean", &other)),
        }
    }

    fn call_opt_string(&self, method: &str, args: Vec<Value>) -> Result<Option<String>> {
        match self.call(method, args)? {
            Value::String(s) => Ok(Some(s)),
            Value::Null => Ok(None),
            other => Err(unexpected(method, "a string", &other)),
        }
    }

    fn call_object(&self, method: &str, args: Vec<Value>) -> Result<JsonObject> {
        match self.call(method, args)? {
            Value::Object(obj) => Ok(obj),
            Value::Null => Ok(JsonObject::new()),
            other => Err(unexpected(method, "an object", &other)),
        }
    }
}

fn unexpected(method: &str, expected: &str, got: &Value) -> Error {
    Error::DeserializationError(format!("{} returned {} instead of {}", method, got, expected))
}

fn opt(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

impl PushSdk for ForeignSdk {
    fn set_integrator(&self, integrator: &str) -> Result<()> {
        self.call_unit("setIntegrator", vec![json!(integrator)])
    }

    fn initialize(&self, client_id: &str, client_secret: &str) -> Result<()> {
        self.call_unit("initialize", vec![json!(client_id), json!(client_secret)])
    }

    fn initialize_and_remember_credentials(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<()> {
        self.call_unit(
            "initializeAndRememberCredentials",
            vec![opt(client_id), opt(client_secret)],
        )
    }

    fn remembered_client_id(&self) -> Result<Option<String>> {
        self.call_opt_string("getRememberedClientId", Vec::new())
    }

    fn is_initialized(&self) -> Result<bool> {
        self.call_bool("isInitialized")
    }

    fn is_ready(&self) -> Result<bool> {
        self.call_bool("isReady")
    }

    fn set_user_id(&self, user_id: Option<&str>) -> Result<()> {
        self.call_unit("setUserId", vec![opt(user_id)])
    }

    fn set_logging(&self, enabled: bool) -> Result<()> {
        self.call_unit("setLogging", vec![json!(enabled)])
    }

    fn set_delegate(&self, delegate: Option<Arc<dyn PushDelegate>>) -> Result<()> {
        let enabled = delegate.is_some();
        *self.delegate.write() = delegate;
        self.call_unit("setDelegate", vec![json!(enabled)])
    }

    fn user_id(&self) -> Result<Option<String>> {
        self.call_opt_string("getUserId", Vec::new())
    }

    fn installation_id(&self) -> Result<Option<String>> {
        self.call_opt_string("getInstallationId", Vec::new())
    }

    fn device_id(&self) -> Result<Option<String>> {
        self.call_opt_string("getDeviceId", Vec::new())
    }

    fn push_token(&self) -> Result<Option<String>> {
        self.call_opt_string("getPushToken", Vec::new())
    }

    fn access_token(&self) -> Result<Option<String>> {
        self.call_opt_string("getAccessToken", Vec::new())
    }

    fn track_event(&self, event_type: &str, attributes: Option<&JsonObject>) -> Result<()> {
        let mut args = vec![json!(event_type)];
        if let Some(attributes) = attributes {
            args.push(Value::Object(attributes.clone()));
        }
        self.call_unit("trackEvent", args)
    }

    fn add_tags(&self, tags: &[String]) -> Result<()> {
        self.call_unit("addTag", vec![json!(tags)])
    }

    fn remove_tags(&self, tags: &[String]) -> Result<()> {
        self.call_unit("removeTag", vec![json!(tags)])
    }

    fn remove_all_tags(&self) -> Result<()> {
        self.call_unit("removeAllTags", Vec::new())
    }

    fn tags(&self) -> Result<Vec<String>> {
        match self.call("getTags", Vec::new())? {
            Value::Array(items) => Ok(items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(unexpected("getTags", "an array", &other)),
        }
    }

    fn has_tag(&self, tag: &str) -> Result<bool> {
        match self.call("hasTag", vec![json!(tag)])? {
            Value::Bool(b) => Ok(b),
            other => Err(unexpected("hasTag", "a boolean", &other)),
        }
    }

    fn set_property(&self, field: &str, value: Value) -> Result<()> {
        self.call_unit("setProperty", vec![json!(field), value])
    }

    fn unset_property(&self, field: &str) -> Result<()> {
        self.call_unit("unsetProperty", vec![json!(field)])
    }

    fn add_property(&self, field: &str, value: Value) -> Result<()> {
        self.call_unit("addProperty", vec![json!(field), value])
    }

    fn remove_property(&self, field: &str, value: Value) -> Result<()> {
        self.call_unit("removeProperty", vec![json!(field), value])
    }

    fn property_value(&self, field: &str) -> Result<Value> {
        self.call("getPropertyValue", vec![json!(field)])
    }

    fn property_values(&self, field: &str) -> Result<Vec<Value>> {
        match self.call("getPropertyValues", vec![json!(field)])? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => Err(unexpected("getPropertyValues", "an array", &other)),
        }
    }

    fn properties(&self) -> Result<JsonObject> {
        self.call_object("getProperties", Vec::new())
    }

    fn put_properties(&self, properties: &JsonObject) -> Result<()> {
        self.call_unit("putProperties", vec![Value::Object(properties.clone())])
    }

    fn installation_custom_properties(&self) -> Result<JsonObject> {
        self.call_object("getInstallationCustomProperties", Vec::new())
    }

    fn put_installation_custom_properties(&self, custom: &JsonObject) -> Result<()> {
        self.call_unit(
            "putInstallationCustomProperties",
            vec![Value::Object(custom.clone())],
        )
    }

    fn subscribe_to_notifications(&self, fallback_to_settings: bool) -> Result<()> {
        self.call_unit("subscribeToNotifications", vec![json!(fallback_to_settings)])
    }

    fn is_subscribed_to_notifications(&self) -> Result<bool> {
        self.call_bool("isSubscribedToNotifications")
    }

    fn unsubscribe_from_notifications(&self) -> Result<()> {
        self.call_unit("unsubscribeFromNotifications", Vec::new())
    }

    fn notification_enabled(&self) -> Result<bool> {
        self.call_bool("getNotificationEnabled")
    }

    fn set_notification_enabled(&self, enabled: bool) -> Result<()> {
        self.call_unit("setNotificationEnabled", vec![json!(enabled)])
    }

    fn user_consent(&self) -> Result<bool> {
        self.call_bool("getUserConsent")
    }

    fn set_user_consent(&self, consent: bool) -> Result<()> {
        self.call_unit("setUserConsent", vec![json!(consent)])
    }

    fn clear_all_data(&self) -> Result<()> {
        self.call_unit("clearAllData", Vec::new())
    }

    fn clear_events_history(&self) -> Result<()> {
        self.call_unit("clearEventsHistory", Vec::new())
    }

    fn clear_preferences(&self) -> Result<()> {
        self.call_unit("clearPreferences", Vec::new())
    }

    fn download_all_data(&self) -> Result<()> {
        self.call_unit("downloadAllData", Vec::new())
    }

    fn enable_geolocation(&self) -> Result<()> {
        self.call_unit("enableGeolocation", Vec::new())
    }

    fn disable_geolocation(&self) -> Result<()> {
        self.call_unit("disableGeolocation", Vec::new())
    }

    fn set_geolocation(&self, latitude: f64, longitude: f64) -> Result<()> {
        self.call_unit("setGeolocation", vec![json!(latitude), json!(longitude)])
    }

    fn country(&self) -> Result<Option<String>> {
        self.call_opt_string("getCountry", Vec::new())
    }

    fn set_country(&self, country: Option<&str>) -> Result<()> {
        self.call_unit("setCountry", vec![opt(country)])
    }

    fn currency(&self) -> Result<Option<String>> {
        self.call_opt_string("getCurrency", Vec::new())
    }

    fn set_currency(&self, currency: Option<&str>) -> Result<()> {
        self.call_unit("setCurrency", vec![opt(currency)])
    }

    fn locale(&self) -> Result<Option<String>> {
        self.call_opt_string("getLocale", Vec::new())
    }

    fn set_locale(&self, locale: Option<&str>) -> Result<()> {
        self.call_unit("setLocale", vec![opt(locale)])
    }

    fn time_zone(&self) -> Result<Option<String>> {
        self.call_opt_string("getTimeZone", Vec::new())
    }

    fn set_time_zone(&self, time_zone: Option<&str>) -> Result<()> {
        self.call_unit("setTimeZone", vec![opt(time_zone)])
    }

    fn default_channel_id(&self) -> Result<String> {
        Ok(self
            .call_opt_string("UserPreferences_getDefaultChannelId", Vec::new())?
            .unwrap_or_else(|| super::DEFAULT_CHANNEL_ID.to_string()))
    }

    fn set_default_channel_id(&self, id: &str) -> Result<()> {
        self.call_unit("UserPreferences_setDefaultChannelId", vec![json!(id)])
    }

    fn channel_group(&self, id: &str) -> Result<Option<ChannelGroup>> {
        let value = self.call("UserPreferences_getChannelGroup", vec![json!(id)])?;
        Ok(ChannelGroup::from_json(&value))
    }

    fn channel(&self, id: &str) -> Result<Option<Channel>> {
        let value = self.call("UserPreferences_getChannel", vec![json!(id)])?;
        Ok(Channel::from_json(&value))
    }

    fn set_channel_groups(&self, groups: Vec<ChannelGroup>) -> Result<()> {
        let groups: Vec<Value> = groups.iter().map(ChannelGroup::to_json).collect();
        self.call_unit("UserPreferences_setChannelGroups", vec![Value::Array(groups)])
    }

    fn set_channels(&self, channels: Vec<Channel>) -> Result<()> {
        let channels: Vec<Value> = channels.iter().map(Channel::to_json).collect();
        self.call_unit("UserPreferences_setChannels", vec![Value::Array(channels)])
    }

    fn put_channel_group(&self, group: ChannelGroup) -> Result<()> {
        self.call_unit("UserPreferences_putChannelGroup", vec![group.to_json()])
    }

    fn put_channel(&self, channel: Channel) -> Result<()> {
        self.call_unit("UserPreferences_putChannel", vec![channel.to_json()])
    }

    fn remove_channel_group(&self, id: &str) -> Result<()> {
        self.call_unit("UserPreferences_removeChannelGroup", vec![json!(id)])
    }

    fn remove_channel(&self, id: &str) -> Result<()> {
        self.call_unit("UserPreferences_removeChannel", vec![json!(id)])
    }

    fn did_finish_launching(&self, launch_options: &JsonObject) -> Result<bool> {
        let handled = self.call(
            "application:didFinishLaunchingWithOptions:",
            vec![Value::Object(launch_options.clone())],
        )?;
        Ok(handled.as_bool().unwrap_or(false))
    }

    fn did_receive_remote_notification(&self, user_info: &JsonObject) -> Result<()> {
        self.call_unit(
            "application:didReceiveRemoteNotification:",
            vec![Value::Object(user_info.clone())],
        )
    }

    fn did_receive_local_notification(&self, user_info: &JsonObject) -> Result<()> {
        self.call_unit(
            "application:didReceiveLocalNotification:",
            vec![Value::Object(user_info.clone())],
        )
    }

    fn did_register_for_remote_notifications(&self, device_token: &[u8]) -> Result<()> {
        self.call_unit(
            "application:didRegisterForRemoteNotificationsWithDeviceToken:",
            vec![json!(hex::encode(device_token))],
        )
    }

    fn did_fail_to_register_for_remote_notifications(&self, error: &str) -> Result<()> {
        self.call_unit(
            "application:didFailToRegisterForRemoteNotificationsWithError:",
            vec![json!(error)],
        )
    }

    fn did_become_active(&self) -> Result<()> {
        self.call_unit("applicationDidBecomeActive:", Vec::new())
    }

    fn did_enter_background(&self) -> Result<()> {
        self.call_unit("applicationDidEnterBackground:", Vec::new())
    }

    fn will_present_notification(&self, notification: &JsonObject) -> Result<PresentationOptions> {
        let value = self.call(
            "userNotificationCenter:willPresentNotification:",
            vec![Value::Object(notification.clone())],
        )?;
        if value.is_null() {
            return Ok(PresentationOptions::none());
        }
        serde_json::from_value(value).map_err(Error::from)
    }

    fn did_receive_notification_response(&self, response: &NotificationResponse) -> Result<()> {
        let response = serde_json::to_value(response)?;
        self.call_unit(
            "userNotificationCenter:didReceiveNotificationResponse:",
            vec![response],
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
