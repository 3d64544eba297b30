//! Dispatch handlers for `UserPreferences_*` notification channel management.
//!
//! Only Android has channels; other SDKs answer with the trait defaults.
//! Entries that are not valid channel objects are skipped, as the native
//! plugin does.

use serde_json::Value;

use super::dispatcher::{
    from_error, ok_json, ok_success, require_array, require_object, require_str, DResult,
};
use crate::sdk::{Channel, ChannelGroup, PushSdk};

pub fn get_default_channel_id(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::String(sdk.default_channel_id().map_err(from_error)?))
}

/// Args: `[id]`
pub fn set_default_channel_id(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let id = require_str(args, 0, "id")?;
    sdk.set_default_channel_id(id).map_err(from_error)?;
    ok_success()
}

/// Args: `[id]`. Returns the group, or `null`.
pub fn get_channel_group(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let id = require_str(args, 0, "id")?;
    let group = sdk.channel_group(id).map_err(from_error)?;
    ok_json(group.map_or(Value::Null, |g| g.to_json()))
}

/// Args: `[id]`. Returns the channel, or `null`.
pub fn get_channel(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let id = require_str(args, 0, "id")?;
    let channel = sdk.channel(id).map_err(from_error)?;
    ok_json(channel.map_or(Value::Null, |c| c.to_json()))
}

/// Args: `[[group, ...]]`
pub fn set_channel_groups(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let groups: Vec<ChannelGroup> = require_array(args, 0, "channelGroups")?
        .iter()
        .filter_map(ChannelGroup::from_json)
        .collect();
    sdk.set_channel_groups(groups).map_err(from_error)?;
    ok_success()
}

/// Args: `[[channel, ...]]`
pub fn set_channels(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let channels: Vec<Channel> = require_array(args, 0, "channels")?
        .iter()
        .filter_map(Channel::from_json)
        .collect();
    sdk.set_channels(channels).map_err(from_error)?;
    ok_success()
}

/// Args: `[group]`
pub fn put_channel_group(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    require_object(args, 0, "channelGroup")?;
    match ChannelGroup::from_json(&args[0]) {
        Some(group) => sdk.put_channel_group(group).map_err(from_error)?,
        None => tracing::warn!("Ignoring channel group without an id"),
    }
    ok_success()
}

/// Args: `[channel]`
pub fn put_channel(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    require_object(args, 0, "channel")?;
    match Channel::from_json(&args[0]) {
        Some(channel) => sdk.put_channel(channel).map_err(from_error)?,
        None => tracing::warn!("Ignoring channel without an id"),
    }
    ok_success()
}

/// Args: `[id]`
pub fn remove_channel_group(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let id = require_str(args, 0, "id")?;
    sdk.remove_channel_group(id).map_err(from_error)?;
    ok_success()
}

/// Args: `[id]`
pub fn remove_channel(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let id = require_str(args, 0, "id")?;
    sdk.remove_channel(id).map_err(from_error)?;
    ok_success()
}
