//! Dispatch handlers for initialization and core information.

use serde_json::Value;

use super::dispatcher::{
    from_error, ok_json, ok_opt_string, ok_success, opt_str, require_bool, require_str, DResult,
};
use crate::sdk::PushSdk;

/// Args: `[clientId, clientSecret]`
pub fn initialize(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let client_id = require_str(args, 0, "clientId")?;
    let client_secret = require_str(args, 1, "clientSecret")?;
    sdk.initialize(client_id, client_secret).map_err(from_error)?;
    tracing::info!(client_id, "SDK initialized from script");
    ok_success()
}

/// Args: `[clientId|null, clientSecret|null]`. Nulls forget remembered credentials.
pub fn initialize_and_remember_credentials(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let client_id = opt_str(args, 0, "clientId")?;
    let client_secret = opt_str(args, 1, "clientSecret")?;
    sdk.initialize_and_remember_credentials(client_id, client_secret)
        .map_err(from_error)?;
    ok_success()
}

pub fn get_remembered_client_id(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.remembered_client_id().map_err(from_error)?)
}

pub fn is_initialized(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Bool(sdk.is_initialized().map_err(from_error)?))
}

pub fn is_ready(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Bool(sdk.is_ready().map_err(from_error)?))
}

/// Args: `[userId|null]`
pub fn set_user_id(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let user_id = opt_str(args, 0, "userId")?;
    sdk.set_user_id(user_id).map_err(from_error)?;
    ok_success()
}

/// Args: `[enabled]`
pub fn set_logging(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let enabled = require_bool(args, 0, "enabled")?;
    sdk.set_logging(enabled).map_err(from_error)?;
    ok_success()
}

pub fn get_user_id(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.user_id().map_err(from_error)?)
}

pub fn get_installation_id(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.installation_id().map_err(from_error)?)
}

pub fn get_device_id(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.device_id().map_err(from_error)?)
}

pub fn get_push_token(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.push_token().map_err(from_error)?)
}

pub fn get_access_token(sdk: &dyn PushSdk) -> DResult {
    ok_opt_string(sdk.access_token().map_err(from_error)?)
}
