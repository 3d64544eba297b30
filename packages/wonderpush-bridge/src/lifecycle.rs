//! # Native Lifecycle Forwarding
//!
//! Application-delegate and notification-center callbacks, forwarded one to
//! one to the SDK. Hosts that let the SDK swizzle its own delegates do not
//! need this; hosts that keep their own delegates call these methods from
//! them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sdk::{JsonObject, PushSdk};

/// Key marking a payload as sent by WonderPush
pub const WONDERPUSH_PAYLOAD_KEY: &str = "_wp";

/// How a notification is shown while the application is in the foreground
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationOptions {
    /// Update the badge
    pub badge: bool,
    /// Play the sound
    pub sound: bool,
    /// Show the banner
    pub alert: bool,
}

impl PresentationOptions {
    /// Show everything
    pub fn all() -> Self {
        Self { badge: true, sound: true, alert: true }
    }

    /// Show nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Bitmask in `UNNotificationPresentationOptions` layout (badge=1, sound=2, alert=4)
    pub fn bits(&self) -> u32 {
        (self.badge as u32) | ((self.sound as u32) << 1) | ((self.alert as u32) << 2)
    }
}

/// Action the user took on a notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Action identifier, the default action when the notification body was tapped
    pub action_identifier: String,
    /// Notification payload
    pub user_info: JsonObject,
}

impl NotificationResponse {
    /// Identifier the OS uses for a tap on the notification body
    pub const DEFAULT_ACTION: &'static str = "com.apple.UNNotificationDefaultActionIdentifier";

    /// Whether the body (not a button) was tapped
    pub fn is_default_action(&self) -> bool {
        self.action_identifier == Self::DEFAULT_ACTION
    }
}

/// Whether a payload was sent by WonderPush
pub fn is_notification_for_wonderpush(user_info: &JsonObject) -> bool {
    user_info
        .get(WONDERPUSH_PAYLOAD_KEY)
        .map_or(false, |value| value.is_object())
}

/// Whether a payload is a silent data notification
pub fn is_data_notification(user_info: &JsonObject) -> bool {
    user_info
        .get(WONDERPUSH_PAYLOAD_KEY)
        .and_then(|wp| wp.get("type"))
        .and_then(|t| t.as_str())
        == Some("data")
}

/// Forwards lifecycle callbacks to the SDK
#[derive(Clone)]
pub struct LifecycleForwarder {
    sdk: Arc<dyn PushSdk>,
}

impl LifecycleForwarder {
    /// Create a forwarder
    pub fn new(sdk: Arc<dyn PushSdk>) -> Self {
        Self { sdk }
    }

    // ------------------------------------------------------------------
    // Application delegate
    // ------------------------------------------------------------------

    /// `application:didFinishLaunchingWithOptions:`
    pub fn did_finish_launching(&self, launch_options: &JsonObject) -> Result<bool> {
        tracing::debug!("Forwarding didFinishLaunching");
        self.sdk.did_finish_launching(launch_options)
    }

    /// `application:didReceiveRemoteNotification:`
    pub fn did_receive_remote_notification(&self, user_info: &JsonObject) -> Result<()> {
        tracing::debug!(
            for_wonderpush = is_notification_for_wonderpush(user_info),
            "Forwarding remote notification"
        );
        self.sdk.did_receive_remote_notification(user_info)
    }

    /// `application:didReceiveLocalNotification:`
    pub fn did_receive_local_notification(&self, user_info: &JsonObject) -> Result<()> {
        self.sdk.did_receive_local_notification(user_info)
    }

    /// `application:didRegisterForRemoteNotificationsWithDeviceToken:`
    pub fn did_register_for_remote_notifications(&self, device_token: &[u8]) -> Result<()> {
        tracing::debug!(len = device_token.len(), "Forwarding device token");
        self.sdk.did_register_for_remote_notifications(device_token)
    }

    /// `application:didFailToRegisterForRemoteNotificationsWithError:`
    pub fn did_fail_to_register_for_remote_notifications(&self, error: &str) -> Result<()> {
        tracing::warn!(error, "Remote notification registration failed");
        self.sdk.did_fail_to_register_for_remote_notifications(error)
    }

    /// `applicationDidBecomeActive:`
    pub fn did_become_active(&self) -> Result<()> {
        self.sdk.did_become_active()
    }

    /// `applicationDidEnterBackground:`
    pub fn did_enter_background(&self) -> Result<()> {
        self.sdk.did_enter_background()
    }

    // ------------------------------------------------------------------
    // Notification center delegate
    // ------------------------------------------------------------------

    /// `userNotificationCenter:willPresentNotification:withCompletionHandler:`
    pub fn will_present_notification(&self, notification: &JsonObject) -> Result<PresentationOptions> {
        self.sdk.will_present_notification(notification)
    }

    /// `userNotificationCenter:didReceiveNotificationResponse:withCompletionHandler:`
    pub fn did_receive_notification_response(&self, response: &NotificationResponse) -> Result<()> {
        tracing::debug!(action = %response.action_identifier, "Forwarding notification response");
        self.sdk.did_receive_notification_response(response)
    }
}

impl std::fmt::Debug for LifecycleForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleForwarder").finish_non_exhaustive()
    }
}

// ============================================================================
// TESTS
// ============================================================================
