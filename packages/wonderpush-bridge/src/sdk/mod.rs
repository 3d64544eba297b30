//! # Push SDK
//!
//! The native push-notification SDK is an opaque collaborator. [`PushSdk`]
//! names every operation the bridge forwards to it; the bridge never
//! interprets results beyond converting them to JSON.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PUSH SDK SURFACE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Initialization   initialize, set_user_id, is_ready, set_logging,      │
//! │                   set_delegate, remembered credentials                  │
//! │  Core info        user_id, installation_id, device_id, push_token,     │
//! │                   access_token                                          │
//! │  Installation     track_event, tags, properties, custom properties     │
//! │  Subscription     subscribe / unsubscribe, notification_enabled        │
//! │  Privacy          user_consent, clear_*, download_all_data             │
//! │  Geo & locale     geolocation, country, currency, locale, time zone    │
//! │  Preferences      channels and channel groups (Android only)           │
//! │  Lifecycle        application and notification-center callbacks        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations:
//! - [`MemorySdk`]: in-memory, for development and tests
//! - [`ForeignSdk`]: forwards each call to a host-provided transport

mod channels;
mod delegate;
mod foreign;
mod memory;

pub use channels::{Channel, ChannelGroup, DEFAULT_CHANNEL_ID};
pub use delegate::{PassThroughDelegate, PushDelegate};
pub use foreign::{ForeignSdk, SdkTransport};
pub use memory::{MemorySdk, TrackedEvent};

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::lifecycle::{NotificationResponse, PresentationOptions};

/// JSON object used for properties and event attributes
pub type JsonObject = Map<String, Value>;

/// Operations exposed by the native push SDK.
///
/// User-preference methods default to the behavior of platforms without
/// notification channels. Lifecycle hooks default to no-ops.
pub trait PushSdk: Send + Sync {
    // ------------------------------------------------------------------
    // Initialization
    // ------------------------------------------------------------------

    /// Identify the wrapper in use
    fn set_integrator(&self, integrator: &str) -> Result<()> {
        let _ = integrator;
        Ok(())
    }

    /// Initialize with application credentials
    fn initialize(&self, client_id: &str, client_secret: &str) -> Result<()>;

    /// Initialize and persist credentials for later launches
    fn initialize_and_remember_credentials(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> Result<()>;

    /// Client id persisted by `initialize_and_remember_credentials`
    fn remembered_client_id(&self) -> Result<Option<String>>;

    /// Whether `initialize` has been called
    fn is_initialized(&self) -> Result<bool>;

    /// Whether the SDK is initialized and holds an access token
    fn is_ready(&self) -> Result<bool>;

    /// Set or clear the user id
    fn set_user_id(&self, user_id: Option<&str>) -> Result<()>;

    /// Toggle native SDK logging
    fn set_logging(&self, enabled: bool) -> Result<()>;

    /// Install or remove the delegate
    fn set_delegate(&self, delegate: Option<Arc<dyn PushDelegate>>) -> Result<()>;

    // ------------------------------------------------------------------
    // Core information
    // ------------------------------------------------------------------

    /// Current user id
    fn user_id(&self) -> Result<Option<String>>;
    /// Current installation id
    fn installation_id(&self) -> Result<Option<String>>;
    /// Device identifier
    fn device_id(&self) -> Result<Option<String>>;
    /// Push token, `None` when not opted in
    fn push_token(&self) -> Result<Option<String>>;
    /// Access token, `None` until initialized
    fn access_token(&self) -> Result<Option<String>>;

    // ------------------------------------------------------------------
    // Installation data and events
    // ------------------------------------------------------------------

    /// Track a custom event
    fn track_event(&self, event_type: &str, attributes: Option<&JsonObject>) -> Result<()>;
    /// Add tags to the installation
    fn add_tags(&self, tags: &[String]) -> Result<()>;
    /// Remove tags from the installation
    fn remove_tags(&self, tags: &[String]) -> Result<()>;
    /// Remove every tag
    fn remove_all_tags(&self) -> Result<()>;
    /// All tags, sorted
    fn tags(&self) -> Result<Vec<String>>;
    /// Whether the tag is set
    fn has_tag(&self, tag: &str) -> Result<bool>;
    /// Replace a property value
    fn set_property(&self, field: &str, value: Value) -> Result<()>;
    /// Remove a property
    fn unset_property(&self, field: &str) -> Result<()>;
    /// Add values to an array property
    fn add_property(&self, field: &str, value: Value) -> Result<()>;
    /// Remove values from an array property
    fn remove_property(&self, field: &str, value: Value) -> Result<()>;
    /// First value of a property, `Null` when unset
    fn property_value(&self, field: &str) -> Result<Value>;
    /// All values of a property
    fn property_values(&self, field: &str) -> Result<Vec<Value>>;
    /// All properties
    fn properties(&self) -> Result<JsonObject>;
    /// Merge properties; `null` values remove
    fn put_properties(&self, properties: &JsonObject) -> Result<()>;
    /// Installation custom properties
    fn installation_custom_properties(&self) -> Result<JsonObject>;
    /// Merge installation custom properties
    fn put_installation_custom_properties(&self, custom: &JsonObject) -> Result<()>;

    // ------------------------------------------------------------------
    // Push notification handling
    // ------------------------------------------------------------------

    /// Prompt for and enable notifications
    fn subscribe_to_notifications(&self, fallback_to_settings: bool) -> Result<()>;
    /// Whether the user is subscribed
    fn is_subscribed_to_notifications(&self) -> Result<bool>;
    /// Disable notifications
    fn unsubscribe_from_notifications(&self) -> Result<()>;
    /// Legacy accessor for the subscription state
    fn notification_enabled(&self) -> Result<bool>;
    /// Legacy setter for the subscription state
    fn set_notification_enabled(&self, enabled: bool) -> Result<()>;

    // ------------------------------------------------------------------
    // Privacy
    // ------------------------------------------------------------------

    /// Whether the user gave consent
    fn user_consent(&self) -> Result<bool>;
    /// Give or revoke consent
    fn set_user_consent(&self, consent: bool) -> Result<()>;
    /// Remove all local and remote data
    fn clear_all_data(&self) -> Result<()>;
    /// Remove tracked events
    fn clear_events_history(&self) -> Result<()>;
    /// Remove tags and properties
    fn clear_preferences(&self) -> Result<()>;
    /// Export all data
    fn download_all_data(&self) -> Result<()>;

    // ------------------------------------------------------------------
    // Geolocation, country, currency, locale, time zone
    // ------------------------------------------------------------------

    /// Let the SDK read device location
    fn enable_geolocation(&self) -> Result<()>;
    /// Stop reading device location
    fn disable_geolocation(&self) -> Result<()>;
    /// Set a fixed location
    fn set_geolocation(&self, latitude: f64, longitude: f64) -> Result<()>;
    /// Country override
    fn country(&self) -> Result<Option<String>>;
    /// Set or clear the country override
    fn set_country(&self, country: Option<&str>) -> Result<()>;
    /// Currency override
    fn currency(&self) -> Result<Option<String>>;
    /// Set or clear the currency override
    fn set_currency(&self, currency: Option<&str>) -> Result<()>;
    /// Locale override
    fn locale(&self) -> Result<Option<String>>;
    /// Set or clear the locale override
    fn set_locale(&self, locale: Option<&str>) -> Result<()>;
    /// Time zone override
    fn time_zone(&self) -> Result<Option<String>>;
    /// Set or clear the time zone override
    fn set_time_zone(&self, time_zone: Option<&str>) -> Result<()>;

    // ------------------------------------------------------------------
    // User preferences (notification channels)
    // ------------------------------------------------------------------

    /// Default channel id
    fn default_channel_id(&self) -> Result<String> {
        Ok(DEFAULT_CHANNEL_ID.to_string())
    }

    /// Set the default channel id
    fn set_default_channel_id(&self, id: &str) -> Result<()> {
        let _ = id;
        Ok(())
    }

    /// Look up a channel group
    fn channel_group(&self, id: &str) -> Result<Option<ChannelGroup>> {
        let _ = id;
        Ok(None)
    }

    /// Look up a channel
    fn channel(&self, id: &str) -> Result<Option<Channel>> {
        let _ = id;
        Ok(None)
    }

    /// Replace all channel groups
    fn set_channel_groups(&self, groups: Vec<ChannelGroup>) -> Result<()> {
        let _ = groups;
        Ok(())
    }

    /// Replace all channels
    fn set_channels(&self, channels: Vec<Channel>) -> Result<()> {
        let _ = channels;
        Ok(())
    }

    /// Create or update a channel group
    fn put_channel_group(&self, group: ChannelGroup) -> Result<()> {
        let _ = group;
        Ok(())
    }

    /// Create or update a channel
    fn put_channel(&self, channel: Channel) -> Result<()> {
        let _ = channel;
        Ok(())
    }

    /// Remove a channel group
    fn remove_channel_group(&self, id: &str) -> Result<()> {
        let _ = id;
        Ok(())
    }

    /// Remove a channel
    fn remove_channel(&self, id: &str) -> Result<()> {
        let _ = id;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Application lifecycle
    // ------------------------------------------------------------------

    /// Application finished launching. Returns whether the SDK handled a launch notification.
    fn did_finish_launching(&self, launch_options: &JsonObject) -> Result<bool> {
        let _ = launch_options;
        Ok(false)
    }

    /// A remote notification arrived
    fn did_receive_remote_notification(&self, user_info: &JsonObject) -> Result<()> {
        let _ = user_info;
        Ok(())
    }

    /// A local notification arrived
    fn did_receive_local_notification(&self, user_info: &JsonObject) -> Result<()> {
        let _ = user_info;
        Ok(())
    }

    /// The OS issued a device token
    fn did_register_for_remote_notifications(&self, device_token: &[u8]) -> Result<()> {
        let _ = device_token;
        Ok(())
    }

    /// The OS failed to issue a device token
    fn did_fail_to_register_for_remote_notifications(&self, error: &str) -> Result<()> {
        let _ = error;
        Ok(())
    }

    /// Application became active
    fn did_become_active(&self) -> Result<()> {
        Ok(())
    }

    /// Application entered background
    fn did_enter_background(&self) -> Result<()> {
        Ok(())
    }

    // ------------------------------------------------------------------
    // Notification center
    // ------------------------------------------------------------------

    /// A notification is about to be shown in the foreground
    fn will_present_notification(&self, notification: &JsonObject) -> Result<PresentationOptions> {
        let _ = notification;
        Ok(PresentationOptions::default())
    }

    /// The user acted on a notification
    fn did_receive_notification_response(&self, response: &NotificationResponse) -> Result<()> {
        let _ = response;
        Ok(())
    }
}
