//! # Command Dispatcher
//!
//! Routes a plugin action name and its positional JSON arguments to the
//! matching handler. Called from [`Bridge::dispatch`](super::Bridge::dispatch).
//!
//! Handler implementations live in domain sub-modules:
//!   - `dispatch_delegate`      : `__callback`, `__setEventForwarder`, `setDelegate`
//!   - `dispatch_core`          : initialization and core information
//!   - `dispatch_installation`  : events, tags, properties
//!   - `dispatch_notifications` : subscription state
//!   - `dispatch_privacy`       : consent, data management, geolocation
//!   - `dispatch_locale`        : country, currency, locale, time zone
//!   - `dispatch_preferences`   : `UserPreferences_*` channel management
//!
//! Returns `Ok(PluginResult)` on success, `Err((error_code, message))` on failure.

use serde_json::{Map, Value};

use super::types::{PluginResult, ScriptCallback};
use super::Bridge;
use crate::error::Error;

pub type DResult = Result<PluginResult, (i32, String)>;

/// Prefixes accepted for custom property and event attribute keys
pub const ALLOWED_KEY_PREFIXES: [&str; 12] = [
    "byte_", "short_", "int_", "long_", "float_", "double_", "bool_", "string_", "date_",
    "geoloc_", "object_", "ignore_",
];

// ============================================================================
// HELPERS  (shared by the domain modules)
// ============================================================================

/// SDK errors keep the SDK's code; everything else uses the bridge code.
pub fn from_error(e: Error) -> (i32, String) {
    (e.reported_code(), e.to_string())
}

pub fn json_parse(args: &str) -> Result<Vec<Value>, (i32, String)> {
    if args.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(args) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(Value::Null) => Ok(Vec::new()),
        Ok(other) => Err(from_error(Error::InvalidJson(format!(
            "expected an argument array, got {}",
            other
        )))),
        Err(e) => Err(from_error(Error::InvalidJson(e.to_string()))),
    }
}

pub fn arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a Value, (i32, String)> {
    args.get(index)
        .ok_or_else(|| from_error(Error::MissingArgument(name.to_string())))
}

fn invalid(name: &str, expected: &str) -> (i32, String) {
    from_error(Error::InvalidArgument(format!("{} must be {}", name, expected)))
}

pub fn require_str<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str, (i32, String)> {
    arg(args, index, name)?
        .as_str()
        .ok_or_else(|| invalid(name, "a string"))
}

/// A string or `null`; a missing argument counts as `null`.
pub fn opt_str<'a>(args: &'a [Value], index: usize, name: &str) -> Result<Option<&'a str>, (i32, String)> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(invalid(name, "a string or null")),
    }
}

pub fn require_bool(args: &[Value], index: usize, name: &str) -> Result<bool, (i32, String)> {
    arg(args, index, name)?
        .as_bool()
        .ok_or_else(|| invalid(name, "a boolean"))
}

pub fn require_f64(args: &[Value], index: usize, name: &str) -> Result<f64, (i32, String)> {
    arg(args, index, name)?
        .as_f64()
        .ok_or_else(|| invalid(name, "a number"))
}

pub fn require_object<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a Map<String, Value>, (i32, String)> {
    arg(args, index, name)?
        .as_object()
        .ok_or_else(|| invalid(name, "an object"))
}

/// An object, `null`, or absent.
pub fn opt_object<'a>(
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<Option<&'a Map<String, Value>>, (i32, String)> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(obj)) => Ok(Some(obj)),
        Some(_) => Err(invalid(name, "an object")),
    }
}

pub fn require_array<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a [Value], (i32, String)> {
    arg(args, index, name)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| invalid(name, "an array"))
}

/// Whether a custom key carries one of the allowed type prefixes
pub fn is_key_allowed(key: &str) -> bool {
    ALLOWED_KEY_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

pub fn check_allowed_keys(obj: &Map<String, Value>) -> Result<(), (i32, String)> {
    match obj.keys().find(|key| !is_key_allowed(key)) {
        Some(key) => Err(from_error(Error::InvalidPropertyKey(key.clone()))),
        None => Ok(()),
    }
}

pub fn ok_json(v: Value) -> DResult {
    Ok(PluginResult::ok(v))
}

pub fn ok_success() -> DResult {
    Ok(PluginResult::ok_empty())
}

pub fn ok_opt_string(v: Option<String>) -> DResult {
    ok_json(v.map_or(Value::Null, Value::String))
}

// ============================================================================
// MAIN DISPATCHER
// ============================================================================

use super::dispatch_core;
use super::dispatch_delegate;
use super::dispatch_installation;
use super::dispatch_locale;
use super::dispatch_notifications;
use super::dispatch_preferences;
use super::dispatch_privacy;

pub fn dispatch(
    bridge: &Bridge,
    action: &str,
    args: &[Value],
    callback: Option<&ScriptCallback>,
) -> DResult {
    let sdk = bridge.sdk.as_ref();

    match action {
        // ── Internal ────────────────────────────────────────────────
        "__callback" => dispatch_delegate::callback(bridge, args),
        "__setEventForwarder" => dispatch_delegate::set_event_forwarder(bridge, callback),

        // ── Initialization ──────────────────────────────────────────
        "initialize" => dispatch_core::initialize(sdk, args),
        "initializeAndRememberCredentials" => {
            dispatch_core::initialize_and_remember_credentials(sdk, args)
        }
        "getRememberedClientId" => dispatch_core::get_remembered_client_id(sdk),
        "isInitialized" => dispatch_core::is_initialized(sdk),
        "isReady" => dispatch_core::is_ready(sdk),
        "setUserId" => dispatch_core::set_user_id(sdk, args),
        "setLogging" => dispatch_core::set_logging(sdk, args),
        "setDelegate" => dispatch_delegate::set_delegate(bridge, args, callback),

        // ── Core information ────────────────────────────────────────
        "getUserId" => dispatch_core::get_user_id(sdk),
        "getInstallationId" => dispatch_core::get_installation_id(sdk),
        "getDeviceId" => dispatch_core::get_device_id(sdk),
        "getPushToken" => dispatch_core::get_push_token(sdk),
        "getAccessToken" => dispatch_core::get_access_token(sdk),

        // ── Installation data and events ────────────────────────────
        "trackEvent" => dispatch_installation::track_event(sdk, args),
        "addTag" => dispatch_installation::add_tag(sdk, args),
        "removeTag" => dispatch_installation::remove_tag(sdk, args),
        "removeAllTags" => dispatch_installation::remove_all_tags(sdk),
        "getTags" => dispatch_installation::get_tags(sdk),
        "hasTag" => dispatch_installation::has_tag(sdk, args),
        "setProperty" => dispatch_installation::set_property(sdk, args),
        "unsetProperty" => dispatch_installation::unset_property(sdk, args),
        "addProperty" => dispatch_installation::add_property(sdk, args),
        "removeProperty" => dispatch_installation::remove_property(sdk, args),
        "getPropertyValue" => dispatch_installation::get_property_value(sdk, args),
        "getPropertyValues" => dispatch_installation::get_property_values(sdk, args),
        "getProperties" => dispatch_installation::get_properties(sdk),
        "putProperties" => dispatch_installation::put_properties(sdk, args),
        "getInstallationCustomProperties" => {
            dispatch_installation::get_installation_custom_properties(sdk)
        }
        "putInstallationCustomProperties" => {
            dispatch_installation::put_installation_custom_properties(sdk, args)
        }

        // ── Push notification handling ──────────────────────────────
        "subscribeToNotifications" => dispatch_notifications::subscribe(sdk, args),
        "isSubscribedToNotifications" => dispatch_notifications::is_subscribed(sdk),
        "unsubscribeFromNotifications" => dispatch_notifications::unsubscribe(sdk),
        "getNotificationEnabled" => dispatch_notifications::get_notification_enabled(sdk),
        "setNotificationEnabled" => dispatch_notifications::set_notification_enabled(sdk, args),

        // ── Privacy ─────────────────────────────────────────────────
        "getUserConsent" => dispatch_privacy::get_user_consent(sdk),
        "setUserConsent" => dispatch_privacy::set_user_consent(sdk, args),
        "clearAllData" => dispatch_privacy::clear_all_data(sdk),
        "clearEventsHistory" => dispatch_privacy::clear_events_history(sdk),
        "clearPreferences" => dispatch_privacy::clear_preferences(sdk),
        "downloadAllData" => dispatch_privacy::download_all_data(sdk),

        // ── Geolocation ─────────────────────────────────────────────
        "enableGeolocation" => dispatch_privacy::enable_geolocation(sdk),
        "disableGeolocation" => dispatch_privacy::disable_geolocation(sdk),
        "setGeolocation" => dispatch_privacy::set_geolocation(sdk, args),

        // ── Country, currency, locale, time zone ────────────────────
        "getCountry" => dispatch_locale::get_country(sdk),
        "setCountry" => dispatch_locale::set_country(sdk, args),
        "getCurrency" => dispatch_locale::get_currency(sdk),
        "setCurrency" => dispatch_locale::set_currency(sdk, args),
        "getLocale" => dispatch_locale::get_locale(sdk),
        "setLocale" => dispatch_locale::set_locale(sdk, args),
        "getTimeZone" => dispatch_locale::get_time_zone(sdk),
        "setTimeZone" => dispatch_locale::set_time_zone(sdk, args),

        // ── User preferences ────────────────────────────────────────
        "UserPreferences_getDefaultChannelId" => dispatch_preferences::get_default_channel_id(sdk),
        "UserPreferences_setDefaultChannelId" => {
            dispatch_preferences::set_default_channel_id(sdk, args)
        }
        "UserPreferences_getChannelGroup" => dispatch_preferences::get_channel_group(sdk, args),
        "UserPreferences_getChannel" => dispatch_preferences::get_channel(sdk, args),
        "UserPreferences_setChannelGroups" => dispatch_preferences::set_channel_groups(sdk, args),
        "UserPreferences_setChannels" => dispatch_preferences::set_channels(sdk, args),
        "UserPreferences_putChannelGroup" => dispatch_preferences::put_channel_group(sdk, args),
        "UserPreferences_putChannel" => dispatch_preferences::put_channel(sdk, args),
        "UserPreferences_removeChannelGroup" => {
            dispatch_preferences::remove_channel_group(sdk, args)
        }
        "UserPreferences_removeChannel" => dispatch_preferences::remove_channel(sdk, args),

        _ => Err(from_error(Error::UnknownAction(action.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_parse() {
        assert_eq!(json_parse("").unwrap(), Vec::<Value>::new());
        assert_eq!(json_parse("null").unwrap(), Vec::<Value>::new());
        assert_eq!(json_parse(r#"["a", 1]"#).unwrap(), vec![json!("a"), json!(1)]);
        assert_eq!(json_parse(r#"{"a": 1}"#).unwrap_err().0, 200);
        assert_eq!(json_parse("[").unwrap_err().0, 200);
    }

    #[test]
    fn test_positional_helpers() {
        let args = vec![json!("x"), json!(true), Value::Null, json!(2.5)];
        assert_eq!(require_str(&args, 0, "name").unwrap(), "x");
        assert!(require_bool(&args, 1, "flag").unwrap());
        assert_eq!(opt_str(&args, 2, "opt").unwrap(), None);
        assert_eq!(opt_str(&args, 9, "opt").unwrap(), None);
        assert_eq!(require_f64(&args, 3, "n").unwrap(), 2.5);

        let (code, message) = require_str(&args, 7, "clientId").unwrap_err();
        assert_eq!(code, 201);
        assert_eq!(message, "Missing clientId");
        assert_eq!(require_bool(&args, 0, "flag").unwrap_err().0, 202);
    }

    #[test]
    fn test_key_prefixes() {
        assert!(is_key_allowed("string_name"));
        assert!(is_key_allowed("geoloc_home"));
        assert!(!is_key_allowed("name"));
        assert!(!is_key_allowed("String_name"));

        let bad = json!({"int_age": 3, "color": "red"});
        let (code, message) = check_allowed_keys(bad.as_object().unwrap()).unwrap_err();
        assert_eq!(code, 203);
        assert!(message.contains("\"color\""));
    }
}
