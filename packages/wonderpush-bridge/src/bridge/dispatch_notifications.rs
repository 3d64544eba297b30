//! Dispatch handlers for the push subscription state.

use serde_json::Value;

use super::dispatcher::{from_error, ok_json, ok_success, require_bool, DResult};
use crate::sdk::PushSdk;

/// Args: `[fallbackToSettings?]`
pub fn subscribe(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let fallback_to_settings = match args.first() {
        None | Some(Value::Null) => false,
        Some(_) => require_bool(args, 0, "fallbackToSettings")?,
    };
    sdk.subscribe_to_notifications(fallback_to_settings)
        .map_err(from_error)?;
    ok_success()
}

pub fn is_subscribed(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Bool(
        sdk.is_subscribed_to_notifications().map_err(from_error)?,
    ))
}

pub fn unsubscribe(sdk: &dyn PushSdk) -> DResult {
    sdk.unsubscribe_from_notifications().map_err(from_error)?;
    ok_success()
}

pub fn get_notification_enabled(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Bool(sdk.notification_enabled().map_err(from_error)?))
}

/// Args: `[enabled]`
pub fn set_notification_enabled(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let enabled = require_bool(args, 0, "enabled")?;
    sdk.set_notification_enabled(enabled).map_err(from_error)?;
    ok_success()
}
