//! Dispatch handlers for the bridge's own channels: callback resolution,
//! the event forwarder and the script delegate.
//!
//! Both channel commands reply with `keep_callback` so the script callback
//! stays registered for later messages.

use std::sync::Arc;

use serde_json::Value;

use super::dispatcher::{from_error, ok_success, require_bool, require_str, DResult};
use super::script_delegate::ScriptDelegate;
use super::types::{PluginResult, ScriptCallback};
use super::Bridge;
use crate::error::Error;

/// Args: `[callbackId, value]`
///
/// Unknown or already-resolved tokens are logged by the table and still
/// reply with success.
pub fn callback(bridge: &Bridge, args: &[Value]) -> DResult {
    let token = require_str(args, 0, "callbackId")?;
    let value = args.get(1).cloned().unwrap_or(Value::Null);
    bridge.callbacks.resolve(token, value);
    ok_success()
}

/// Args: `[]`. Requires a callback; buffered events are flushed into it.
pub fn set_event_forwarder(bridge: &Bridge, callback: Option<&ScriptCallback>) -> DResult {
    let callback = callback
        .ok_or_else(|| from_error(Error::MissingCallback("__setEventForwarder".into())))?;
    bridge.events.attach(callback.clone());
    Ok(PluginResult::ok_empty().keep())
}

/// Args: `[enabled]`. Enabling requires a callback, which becomes the delegate channel.
pub fn set_delegate(bridge: &Bridge, args: &[Value], callback: Option<&ScriptCallback>) -> DResult {
    let enabled = require_bool(args, 0, "enabled")?;

    if enabled {
        let callback =
            callback.ok_or_else(|| from_error(Error::MissingCallback("setDelegate".into())))?;
        *bridge.delegate_link.write() = Some(callback.clone());
        let delegate = ScriptDelegate::new(
            bridge.delegate_link.clone(),
            bridge.callbacks.clone(),
            bridge.config.delegate_timeout,
        );
        bridge
            .sdk
            .set_delegate(Some(Arc::new(delegate)))
            .map_err(from_error)?;
        tracing::debug!("Script delegate installed");
    } else {
        bridge.sdk.set_delegate(None).map_err(from_error)?;
        *bridge.delegate_link.write() = None;
        tracing::debug!("Script delegate removed");
    }

    Ok(PluginResult::ok_empty().keep())
}
