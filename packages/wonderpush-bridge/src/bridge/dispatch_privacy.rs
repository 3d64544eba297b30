//! Dispatch handlers for user consent, data management and geolocation.

use serde_json::Value;

use super::dispatcher::{from_error, ok_json, ok_success, require_bool, require_f64, DResult};
use crate::sdk::PushSdk;

pub fn get_user_consent(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Bool(sdk.user_consent().map_err(from_error)?))
}

/// Args: `[consent]`
pub fn set_user_consent(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let consent = require_bool(args, 0, "consent")?;
    sdk.set_user_consent(consent).map_err(from_error)?;
    ok_success()
}

pub fn clear_all_data(sdk: &dyn PushSdk) -> DResult {
    tracing::info!("Clearing all SDK data");
    sdk.clear_all_data().map_err(from_error)?;
    ok_success()
}

pub fn clear_events_history(sdk: &dyn PushSdk) -> DResult {
    sdk.clear_events_history().map_err(from_error)?;
    ok_success()
}

pub fn clear_preferences(sdk: &dyn PushSdk) -> DResult {
    sdk.clear_preferences().map_err(from_error)?;
    ok_success()
}

pub fn download_all_data(sdk: &dyn PushSdk) -> DResult {
    sdk.download_all_data().map_err(from_error)?;
    ok_success()
}

pub fn enable_geolocation(sdk: &dyn PushSdk) -> DResult {
    sdk.enable_geolocation().map_err(from_error)?;
    ok_success()
}

pub fn disable_geolocation(sdk: &dyn PushSdk) -> DResult {
    sdk.disable_geolocation().map_err(from_error)?;
    ok_success()
}

/// Args: `[latitude, longitude]`
pub fn set_geolocation(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let latitude = require_f64(args, 0, "latitude")?;
    let longitude = require_f64(args, 1, "longitude")?;
    sdk.set_geolocation(latitude, longitude).map_err(from_error)?;
    ok_success()
}
