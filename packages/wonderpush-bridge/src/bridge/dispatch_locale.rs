//! Dispatch handlers for country, currency, locale and time zone overrides.
//!
//! Setters accept a string, or `null` to go back to the device value.

use serde_json::Value;

use super::dispatcher::{from_error, ok_opt_string, ok_success, opt_str, DResult};
use crate::sdk::PushSdk;

pub fn get_country(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.country().map_err(from_error)?)
}

pub fn set_country(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    sdk.set_country(opt_str(args, 0, "country")?)
        .map_err(from_error)?;
    ok_success()
}

pub fn get_currency(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.currency().map_err(from_error)?)
}

pub fn set_currency(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    sdk.set_currency(opt_str(args, 0, "currency")?)
        .map_err(from_error)?;
    ok_success()
}

pub fn get_locale(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.locale().map_err(from_error)?)
}

pub fn set_locale(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    sdk.set_locale(opt_str(args, 0, "locale")?)
        .map_err(from_error)?;
    ok_success()
}

pub fn get_time_zone(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.time_zone().map_err(from_error)?)
}

pub fn set_time_zone(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    sdk.set_time_zone(opt_str(args, 0, "timeZone")?)
        .map_err(from_error)?;
    ok_success()
}
