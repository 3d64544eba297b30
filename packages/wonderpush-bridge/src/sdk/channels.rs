//! # Notification Channels
//!
//! User-preference types for notification channels and channel groups.
//! Only Android honours them; other platforms answer with defaults.
//!
//! Parsing is lenient: a field with an unexpected type is treated as absent,
//! and only `id` is required.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Channel id used when nothing else is configured
pub const DEFAULT_CHANNEL_ID: &str = "default";

/// A group of notification channels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelGroup {
    /// Group identifier
    pub id: String,
    /// User-visible name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A notification channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct Channel {
    /// Channel identifier
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bypass_dnd: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_badge: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub importance: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lights: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_color: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_pattern: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockscreen_visibility: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibrate_in_silent_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_only: Option<bool>,
}

impl ChannelGroup {
    /// Create a group with only an id
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }

    /// Parse leniently from a JSON object. `None` without a string `id`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: opt_string(obj, "id")?,
            name: opt_string(obj, "name"),
        })
    }

    /// JSON view
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

impl Channel {
    /// Create a channel with only an id and optional group
    pub fn new(id: impl Into<String>, group_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            group_id,
            ..Default::default()
        }
    }

    /// Parse leniently from a JSON object. `None` without a string `id`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: opt_string(obj, "id")?,
            group_id: opt_string(obj, "groupId"),
            name: opt_string(obj, "name"),
            description: opt_string(obj, "description"),
            bypass_dnd: opt_bool(obj, "bypassDnd"),
            show_badge: opt_bool(obj, "showBadge"),
            importance: opt_i32(obj, "importance"),
            lights: opt_bool(obj, "lights"),
            light_color: opt_i32(obj, "lightColor"),
            vibrate: opt_bool(obj, "vibrate"),
            vibration_pattern: opt_long_array(obj, "vibrationPattern"),
            sound: opt_bool(obj, "sound"),
            sound_uri: opt_string(obj, "soundUri"),
            lockscreen_visibility: opt_i32(obj, "lockscreenVisibility"),
            vibrate_in_silent_mode: opt_bool(obj, "vibrateInSilentMode"),
            color: opt_i32(obj, "color"),
            local_only: opt_bool(obj, "localOnly"),
        })
    }

    /// JSON view
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

// ============================================================================
// LENIENT FIELD ACCESS
// ============================================================================

fn opt_string(obj: &Map<String, Value>, field: &str) -> Option<String> {
    obj.get(field).and_then(Value::as_str).map(str::to_string)
}

fn opt_bool(obj: &Map<String, Value>, field: &str) -> Option<bool> {
    obj.get(field).and_then(Value::as_bool)
}

fn opt_i32(obj: &Map<String, Value>, field: &str) -> Option<i32> {
    let value = obj.get(field)?;
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f as i64))
        .map(|n| n as i32)
}

// Any non-numeric item invalidates the whole pattern.
fn opt_long_array(obj: &Map<String, Value>, field: &str) -> Option<Vec<i64>> {
    obj.get(field)?
        .as_array()?
        .iter()
        .map(|item| item.as_i64().or_else(|| item.as_f64().map(|f| f as i64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_group_requires_id() {
        assert!(ChannelGroup::from_json(&json!({"name": "News"})).is_none());
        assert!(ChannelGroup::from_json(&json!("news")).is_none());

        let group = ChannelGroup::from_json(&json!({"id": "news", "name": "News"})).unwrap();
        assert_eq!(group.id, "news");
        assert_eq!(group.name.as_deref(), Some("News"));
    }

    #[test]
    fn test_channel_lenient_fields() {
        let channel = Channel::from_json(&json!({
            "id": "promo",
            "groupId": "marketing",
            "importance": 4.0,
            "lights": "yes",
            "vibrationPattern": [0, 250, 250, 250],
            "soundUri": "content://sounds/ding",
        }))
        .unwrap();

        assert_eq!(channel.group_id.as_deref(), Some("marketing"));
        assert_eq!(channel.importance, Some(4));
        assert_eq!(channel.lights, None);
        assert_eq!(channel.vibration_pattern, Some(vec![0, 250, 250, 250]));
        assert_eq!(channel.sound_uri.as_deref(), Some("content://sounds/ding"));
    }

    #[test]
    fn test_bad_vibration_pattern_is_dropped() {
        let channel = Channel::from_json(&json!({
            "id": "promo",
            "vibrationPattern": [0, "long"],
        }))
        .unwrap();
        assert_eq!(channel.vibration_pattern, None);
    }

    #[test]
    fn test_channel_json_skips_absent_fields() {
        let json = Channel::new("alerts", Some("main".into())).to_json();
        assert_eq!(json, json!({"id": "alerts", "groupId": "main"}));
    }
}
