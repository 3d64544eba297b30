//! # In-Memory SDK
//!
//! A [`PushSdk`] that keeps installation state in memory. Used for
//! development, demos and tests; it makes no network calls.
//!
//! Property semantics follow the SDK's documented behavior:
//! - `add_property` turns the field into an array and appends missing values
//! - `remove_property` removes matching values
//! - `property_value` returns the first value of an array
//! - `put_properties` merges, a `null` value removes the key

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Channel, ChannelGroup, JsonObject, PushDelegate, PushSdk, DEFAULT_CHANNEL_ID};
use crate::error::{Error, Result};
use crate::lifecycle::{is_notification_for_wonderpush, NotificationResponse, PresentationOptions};

/// An event recorded by [`PushSdk::track_event`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedEvent {
    /// Event type
    pub event_type: String,
    /// Custom attributes
    pub attributes: Option<JsonObject>,
    /// Unix milliseconds
    pub tracked_at: i64,
}

#[derive(Default)]
struct MemoryState {
    integrator: Option<String>,
    client_id: Option<String>,
    remembered_client_id: Option<String>,
    logging: bool,
    user_id: Option<String>,
    installation_id: Option<String>,
    access_token: Option<String>,
    push_token: Option<String>,
    subscribed: bool,
    consent: bool,
    tags: BTreeSet<String>,
    properties: JsonObject,
    events: Vec<TrackedEvent>,
    geolocation_enabled: bool,
    geolocation: Option<(f64, f64)>,
    country: Option<String>,
    currency: Option<String>,
    locale: Option<String>,
    time_zone: Option<String>,
    default_channel_id: Option<String>,
    channel_groups: HashMap<String, ChannelGroup>,
    channels: HashMap<String, Channel>,
    active: bool,
}

/// In-memory push SDK
pub struct MemorySdk {
    device_id: String,
    state: RwLock<MemoryState>,
    delegate: RwLock<Option<Arc<dyn PushDelegate>>>,
}

impl MemorySdk {
    /// Create an uninitialized SDK with consent given
    pub fn new() -> Self {
        Self {
            device_id: Uuid::new_v4().to_string(),
            state: RwLock::new(MemoryState {
                consent: true,
                geolocation_enabled: true,
                ..Default::default()
            }),
            delegate: RwLock::new(None),
        }
    }

    /// Events tracked so far
    pub fn tracked_events(&self) -> Vec<TrackedEvent> {
        self.state.read().events.clone()
    }

    /// Fixed location, if any
    pub fn geolocation(&self) -> Option<(f64, f64)> {
        self.state.read().geolocation
    }

    /// Whether device location may be read
    pub fn geolocation_enabled(&self) -> bool {
        self.state.read().geolocation_enabled
    }

    /// Integrator string reported by the bridge
    pub fn integrator(&self) -> Option<String> {
        self.state.read().integrator.clone()
    }

    /// Whether native logging is on
    pub fn logging(&self) -> bool {
        self.state.read().logging
    }

    /// Whether the application is in the foreground
    pub fn is_active(&self) -> bool {
        self.state.read().active
    }

    /// Whether a delegate is installed
    pub fn has_delegate(&self) -> bool {
        self.delegate.read().is_some()
    }

    /// Simulate opening a deep link: the delegate decides the final URL.
    pub fn open_deep_link(&self, url: &str) -> Option<String> {
        // Clone out so the delegate runs without our lock.
        let delegate = self.delegate.read().clone();
        match delegate {
            Some(delegate) => delegate.url_for_deep_link(url),
            None => Some(url.to_string()),
        }
    }

    fn installation_state(&self) -> Result<parking_lot::RwLockWriteGuard<'_, MemoryState>> {
        let state = self.state.write();
        if state.client_id.is_none() {
            return Err(Error::NotInitialized);
        }
        Ok(state)
    }
}

impl Default for MemorySdk {
    fn default() -> Self {
        Self::new()
    }
}

fn values_of(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn clean_tags(tags: &[String]) -> impl Iterator<Item = String> + '_ {
    tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).map(str::to_string)
}

impl PushSdk for MemorySdk {
    fn set_integrator(&self, integrator: &str) -> Result<()> {
        self.state.write().integrator = Some(integrator.to_string());
        Ok(())
    }

    fn initialize(&self, client_id: &str, client_secret: &str) -> Result<()> {
        if client_id.is_empty() {
            return Err(Error::InvalidArgument("clientId must not be empty".into()));
        }
        if client_secret.is_empty() {
            return Err(Error::InvalidArgument("clientSecret must not be empty".into()));
        }

        let mut state = self.state.write();
        if state.client_id.as_deref() == Some(client_id) {
            return Ok(());
        }
        state.client_id = Some(client_id.to_string());
        state.installation_id = Some(Uuid::new_v4().simple().to_string());
        state.access_token = Some(Uuid::new_v4().simple().to_string());
        tracing::info!(client_id, "In-memory SDK initialized");
        Ok(())
    }

    fn initialize_and_remember_credentials(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<()> {
        match (client_id, client_secret) {
            (Some(id), Some(secret)) => {
                self.initialize(id, secret)?;
                self.state.write().remembered_client_id = Some(id.to_string());
            }
            _ => {
                // Forgetting credentials.
                self.state.write().remembered_client_id = None;
            }
        }
        Ok(())
    }

    fn remembered_client_id(&self) -> Result<Option<String>> {
        Ok(self.state.read().remembered_client_id.clone())
    }

    fn is_initialized(&self) -> Result<bool> {
        Ok(self.state.read().client_id.is_some())
    }

    fn is_ready(&self) -> Result<bool> {
        let state = self.state.read();
        Ok(state.client_id.is_some() && state.access_token.is_some())
    }

    fn set_user_id(&self, user_id: Option<&str>) -> Result<()> {
        let mut state = self.state.write();
        let user_id = user_id.filter(|id| !id.is_empty()).map(str::to_string);
        if state.user_id == user_id {
            return Ok(());
        }
        state.user_id = user_id;
        // Each user has its own installation and access token.
        if state.client_id.is_some() {
            state.installation_id = Some(Uuid::new_v4().simple().to_string());
            state.access_token = Some(Uuid::new_v4().simple().to_string());
        }
        Ok(())
    }

    fn set_logging(&self, enabled: bool) -> Result<()> {
        self.state.write().logging = enabled;
        Ok(())
    }

    fn set_delegate(&self, delegate: Option<Arc<dyn PushDelegate>>) -> Result<()> {
        *self.delegate.write() = delegate;
        Ok(())
    }

    fn user_id(&self) -> Result<Option<String>> {
        Ok(self.state.read().user_id.clone())
    }

    fn installation_id(&self) -> Result<Option<String>> {
        Ok(self.state.read().installation_id.clone())
    }

    fn device_id(&self) -> Result<Option<String>> {
        Ok(Some(self.device_id.clone()))
    }

    fn push_token(&self) -> Result<Option<String>> {
        Ok(self.state.read().push_token.clone())
    }

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.state.read().access_token.clone())
    }

    fn track_event(&self, event_type: &str, attributes: Option<&JsonObject>) -> Result<()> {
        let mut state = self.installation_state()?;
        if !state.consent {
            tracing::debug!(event_type, "Dropping event without user consent");
            return Ok(());
        }
        state.events.push(TrackedEvent {
            event_type: event_type.to_string(),
            attributes: attributes.cloned(),
            tracked_at: crate::time::now_timestamp_millis(),
        });
        Ok(())
    }

    fn add_tags(&self, tags: &[String]) -> Result<()> {
        let mut state = self.installation_state()?;
        state.tags.extend(clean_tags(tags));
        Ok(())
    }

    fn remove_tags(&self, tags: &[String]) -> Result<()> {
        let mut state = self.installation_state()?;
        for tag in clean_tags(tags) {
            state.tags.remove(&tag);
        }
        Ok(())
    }

    fn remove_all_tags(&self) -> Result<()> {
        self.installation_state()?.tags.clear();
        Ok(())
    }

    fn tags(&self) -> Result<Vec<String>> {
        Ok(self.state.read().tags.iter().cloned().collect())
    }

    fn has_tag(&self, tag: &str) -> Result<bool> {
        Ok(self.state.read().tags.contains(tag))
    }

    fn set_property(&self, field: &str, value: Value) -> Result<()> {
        let mut state = self.installation_state()?;
        if value.is_null() {
            state.properties.remove(field);
        } else {
            state.properties.insert(field.to_string(), value);
        }
        Ok(())
    }

    fn unset_property(&self, field: &str) -> Result<()> {
        self.installation_state()?.properties.remove(field);
        Ok(())
    }

    fn add_property(&self, field: &str, value: Value) -> Result<()> {
        let mut state = self.installation_state()?;
        let mut current = state.properties.get(field).map(values_of).unwrap_or_default();
        for item in values_of(&value) {
            if !current.contains(&item) {
                current.push(item);
            }
        }
        state.properties.insert(field.to_string(), Value::Array(current));
        Ok(())
    }

    fn remove_property(&self, field: &str, value: Value) -> Result<()> {
        let mut state = self.installation_state()?;
        let removed = values_of(&value);
        let Some(existing) = state.properties.get(field) else {
            return Ok(());
        };
        let remaining: Vec<Value> = values_of(existing)
            .into_iter()
            .filter(|item| !removed.contains(item))
            .collect();
        if remaining.is_empty() {
            state.properties.remove(field);
        } else {
            state.properties.insert(field.to_string(), Value::Array(remaining));
        }
        Ok(())
    }

    fn property_value(&self, field: &str) -> Result<Value> {
        let state = self.state.read();
        Ok(state
            .properties
            .get(field)
            .map(|value| values_of(value).into_iter().next().unwrap_or(Value::Null))
            .unwrap_or(Value::Null))
    }

    fn property_values(&self, field: &str) -> Result<Vec<Value>> {
        Ok(self.state.read().properties.get(field).map(values_of).unwrap_or_default())
    }

    fn properties(&self) -> Result<JsonObject> {
        Ok(self.state.read().properties.clone())
    }

    fn put_properties(&self, properties: &JsonObject) -> Result<()> {
        let mut state = self.installation_state()?;
        for (key, value) in properties {
            if value.is_null() {
                state.properties.remove(key);
            } else {
                state.properties.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }

    fn installation_custom_properties(&self) -> Result<JsonObject> {
        self.properties()
    }

    fn put_installation_custom_properties(&self, custom: &JsonObject) -> Result<()> {
        self.put_properties(custom)
    }

    fn subscribe_to_notifications(&self, fallback_to_settings: bool) -> Result<()> {
        let mut state = self.installation_state()?;
        state.subscribed = true;
        if state.push_token.is_none() {
            state.push_token = Some(Uuid::new_v4().simple().to_string());
        }
        tracing::debug!(fallback_to_settings, "Subscribed to notifications");
        Ok(())
    }

    fn is_subscribed_to_notifications(&self) -> Result<bool> {
        Ok(self.state.read().subscribed)
    }

    fn unsubscribe_from_notifications(&self) -> Result<()> {
        self.installation_state()?.subscribed = false;
        Ok(())
    }

    fn notification_enabled(&self) -> Result<bool> {
        self.is_subscribed_to_notifications()
    }

    fn set_notification_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.subscribe_to_notifications(false)
        } else {
            self.unsubscribe_from_notifications()
        }
    }

    fn user_consent(&self) -> Result<bool> {
        Ok(self.state.read().consent)
    }

    fn set_user_consent(&self, consent: bool) -> Result<()> {
        self.state.write().consent = consent;
        Ok(())
    }

    fn clear_all_data(&self) -> Result<()> {
        let mut state = self.state.write();
        let integrator = state.integrator.take();
        *state = MemoryState {
            integrator,
            consent: state.consent,
            geolocation_enabled: true,
            ..Default::default()
        };
        Ok(())
    }

    fn clear_events_history(&self) -> Result<()> {
        self.state.write().events.clear();
        Ok(())
    }

    fn clear_preferences(&self) -> Result<()> {
        let mut state = self.state.write();
        state.tags.clear();
        state.properties.clear();
        Ok(())
    }

    fn download_all_data(&self) -> Result<()> {
        let state = self.state.read();
        tracing::info!(
            events = state.events.len(),
            properties = state.properties.len(),
            tags = state.tags.len(),
            "Exporting installation data"
        );
        Ok(())
    }

    fn enable_geolocation(&self) -> Result<()> {
        self.state.write().geolocation_enabled = true;
        Ok(())
    }

    fn disable_geolocation(&self) -> Result<()> {
        let mut state = self.state.write();
        state.geolocation_enabled = false;
        state.geolocation = None;
        Ok(())
    }

    fn set_geolocation(&self, latitude: f64, longitude: f64) -> Result<()> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidArgument(format!(
                "Location out of range: {}, {}",
                latitude, longitude
            )));
        }
        let mut state = self.state.write();
        state.geolocation_enabled = false;
        state.geolocation = Some((latitude, longitude));
        Ok(())
    }

    fn country(&self) -> Result<Option<String>> {
        Ok(self.state.read().country.clone())
    }

    fn set_country(&self, country: Option<&str>) -> Result<()> {
        self.state.write().country = country.map(str::to_uppercase);
        Ok(())
    }

    fn currency(&self) -> Result<Option<String>> {
        Ok(self.state.read().currency.clone())
    }

    fn set_currency(&self, currency: Option<&str>) -> Result<()> {
        self.state.write().currency = currency.map(str::to_uppercase);
        Ok(())
    }

    fn locale(&self) -> Result<Option<String>> {
        Ok(self.state.read().locale.clone())
    }

    fn set_locale(&self, locale: Option<&str>) -> Result<()> {
        self.state.write().locale = locale.map(|l| l.replace('-', "_"));
        Ok(())
    }

    fn time_zone(&self) -> Result<Option<String>> {
        Ok(self.state.read().time_zone.clone())
    }

    fn set_time_zone(&self, time_zone: Option<&str>) -> Result<()> {
        self.state.write().time_zone = time_zone.map(str::to_string);
        Ok(())
    }

    fn default_channel_id(&self) -> Result<String> {
        Ok(self
            .state
            .read()
            .default_channel_id
            .clone()
            .unwrap_or_else(|| DEFAULT_CHANNEL_ID.to_string()))
    }

    fn set_default_channel_id(&self, id: &str) -> Result<()> {
        self.state.write().default_channel_id = Some(id.to_string());
        Ok(())
    }

    fn channel_group(&self, id: &str) -> Result<Option<ChannelGroup>> {
        Ok(self.state.read().channel_groups.get(id).cloned())
    }

    fn channel(&self, id: &str) -> Result<Option<Channel>> {
        Ok(self.state.read().channels.get(id).cloned())
    }

    fn set_channel_groups(&self, groups: Vec<ChannelGroup>) -> Result<()> {
        let mut state = self.state.write();
        state.channel_groups = groups.into_iter().map(|g| (g.id.clone(), g)).collect();
        Ok(())
    }

    fn set_channels(&self, channels: Vec<Channel>) -> Result<()> {
        let mut state = self.state.write();
        state.channels = channels.into_iter().map(|c| (c.id.clone(), c)).collect();
        Ok(())
    }

    fn put_channel_group(&self, group: ChannelGroup) -> Result<()> {
        self.state.write().channel_groups.insert(group.id.clone(), group);
        Ok(())
    }

    fn put_channel(&self, channel: Channel) -> Result<()> {
        self.state.write().channels.insert(channel.id.clone(), channel);
        Ok(())
    }

    fn remove_channel_group(&self, id: &str) -> Result<()> {
        self.state.write().channel_groups.remove(id);
        Ok(())
    }

    fn remove_channel(&self, id: &str) -> Result<()> {
        self.state.write().channels.remove(id);
        Ok(())
    }

    fn did_register_for_remote_notifications(&self, device_token: &[u8]) -> Result<()> {
        self.state.write().push_token = Some(hex::encode(device_token));
        Ok(())
    }

    fn did_become_active(&self) -> Result<()> {
        self.state.write().active = true;
        Ok(())
    }

    fn did_enter_background(&self) -> Result<()> {
        self.state.write().active = false;
        Ok(())
    }

    fn will_present_notification(&self, notification: &JsonObject) -> Result<PresentationOptions> {
        if is_notification_for_wonderpush(notification) {
            Ok(PresentationOptions::all())
        } else {
            Ok(PresentationOptions::none())
        }
    }

    fn did_receive_notification_response(&self, response: &NotificationResponse) -> Result<()> {
        let delegate = self.delegate.read().clone();
        if let Some(delegate) = delegate {
            delegate.on_notification_opened(&Value::Object(response.user_info.clone()), -1);
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn initialized() -> MemorySdk {
        let sdk = MemorySdk::new();
        sdk.initialize("client", "secret").unwrap();
        sdk
    }

    #[test]
    fn test_requires_initialization() {
        let sdk = MemorySdk::new();
        assert!(!sdk.is_ready().unwrap());
        assert_eq!(sdk.add_tags(&["a".into()]), Err(Error::NotInitialized));
        assert!(sdk.installation_id().unwrap().is_none());
    }

    #[test]
    fn test_initialize_validates_credentials() {
        let sdk = MemorySdk::new();
        assert!(matches!(sdk.initialize("", "secret"), Err(Error::InvalidArgument(_))));
        sdk.initialize("client", "secret").unwrap();
        assert!(sdk.is_ready().unwrap());
        assert!(sdk.installation_id().unwrap().is_some());
    }

    #[test]
    fn test_changing_user_wipes_access_token() {
        let sdk = initialized();
        let before = sdk.access_token().unwrap();
        sdk.set_user_id(Some("alice")).unwrap();
        assert_ne!(sdk.access_token().unwrap(), before);

        // Same user again is a no-op.
        let token = sdk.access_token().unwrap();
        sdk.set_user_id(Some("alice")).unwrap();
        assert_eq!(sdk.access_token().unwrap(), token);
    }

    #[test]
    fn test_tags() {
        let sdk = initialized();
        sdk.add_tags(&["b".into(), " a ".into(), "".into()]).unwrap();
        assert_eq!(sdk.tags().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(sdk.has_tag("a").unwrap());

        sdk.remove_tags(&["a".into()]).unwrap();
        assert!(!sdk.has_tag("a").unwrap());

        sdk.remove_all_tags().unwrap();
        assert!(sdk.tags().unwrap().is_empty());
    }

    #[test]
    fn test_array_properties() {
        let sdk = initialized();
        sdk.set_property("string_color", json!("red")).unwrap();
        sdk.add_property("string_color", json!(["blue", "red"])).unwrap();
        assert_eq!(
            sdk.property_values("string_color").unwrap(),
            vec![json!("red"), json!("blue")]
        );
        assert_eq!(sdk.property_value("string_color").unwrap(), json!("red"));

        sdk.remove_property("string_color", json!("red")).unwrap();
        assert_eq!(sdk.property_value("string_color").unwrap(), json!("blue"));

        sdk.remove_property("string_color", json!("blue")).unwrap();
        assert_eq!(sdk.property_value("string_color").unwrap(), Value::Null);
        assert!(sdk.property_values("string_color").unwrap().is_empty());
    }

    #[test]
    fn test_put_properties_merges_and_removes() {
        let sdk = initialized();
        sdk.put_properties(json!({"int_age": 30, "string_name": "Ann"}).as_object().unwrap())
            .unwrap();
        sdk.put_properties(json!({"int_age": null}).as_object().unwrap()).unwrap();

        let props = sdk.properties().unwrap();
        assert!(!props.contains_key("int_age"));
        assert_eq!(props["string_name"], "Ann");
        assert_eq!(sdk.installation_custom_properties().unwrap(), props);
    }

    #[test]
    fn test_events_respect_consent() {
        let sdk = initialized();
        sdk.track_event("purchase", None).unwrap();
        sdk.set_user_consent(false).unwrap();
        sdk.track_event("ignored", None).unwrap();

        let events = sdk.tracked_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "purchase");

        sdk.clear_events_history().unwrap();
        assert!(sdk.tracked_events().is_empty());
    }

    #[test]
    fn test_subscription() {
        let sdk = initialized();
        assert!(sdk.push_token().unwrap().is_none());
        sdk.set_notification_enabled(true).unwrap();
        assert!(sdk.is_subscribed_to_notifications().unwrap());
        assert!(sdk.push_token().unwrap().is_some());
        sdk.unsubscribe_from_notifications().unwrap();
        assert!(!sdk.notification_enabled().unwrap());
    }

    #[test]
    fn test_geolocation() {
        let sdk = MemorySdk::new();
        assert!(sdk.set_geolocation(91.0, 0.0).is_err());
        sdk.set_geolocation(48.85, 2.35).unwrap();
        assert_eq!(sdk.geolocation(), Some((48.85, 2.35)));
        assert!(!sdk.geolocation_enabled());
        sdk.disable_geolocation().unwrap();
        assert_eq!(sdk.geolocation(), None);
    }

    #[test]
    fn test_clear_all_data_keeps_integrator() {
        let sdk = initialized();
        sdk.set_integrator("test-integrator").unwrap();
        sdk.add_tags(&["x".into()]).unwrap();
        sdk.clear_all_data().unwrap();

        assert!(!sdk.is_initialized().unwrap());
        assert!(sdk.tags().unwrap().is_empty());
        assert_eq!(sdk.integrator().as_deref(), Some("test-integrator"));
    }

    #[test]
    fn test_channels() {
        let sdk = MemorySdk::new();
        assert_eq!(sdk.default_channel_id().unwrap(), "default");

        sdk.put_channel(Channel::new("alerts", None)).unwrap();
        assert!(sdk.channel("alerts").unwrap().is_some());
        sdk.set_channels(vec![Channel::new("news", None)]).unwrap();
        assert!(sdk.channel("alerts").unwrap().is_none());
        sdk.remove_channel("news").unwrap();
        assert!(sdk.channel("news").unwrap().is_none());
    }

    #[test]
    fn test_remember_credentials() {
        let sdk = MemorySdk::new();
        sdk.initialize_and_remember_credentials(Some("client"), Some("secret"))
            .unwrap();
        assert_eq!(sdk.remembered_client_id().unwrap().as_deref(), Some("client"));

        sdk.initialize_and_remember_credentials(None, None).unwrap();
        assert!(sdk.remembered_client_id().unwrap().is_none());
    }

    #[test]
    fn test_deep_link_without_delegate_passes_through() {
        let sdk = MemorySdk::new();
        assert_eq!(sdk.open_deep_link("app://x").as_deref(), Some("app://x"));
    }
}
