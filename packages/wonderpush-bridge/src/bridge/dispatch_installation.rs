//! Dispatch handlers for events, tags and properties.
//!
//! Custom-property objects only accept keys carrying a type prefix
//! (`string_`, `int_`, ...); the SDK relies on the prefix to type the value.

use serde_json::{json, Value};

use super::dispatcher::{
    arg, check_allowed_keys, from_error, ok_json, ok_success, opt_object, require_object,
    require_str, DResult,
};
use crate::error::Error;
use crate::sdk::PushSdk;

/// Args: `[type, attributes?]`
pub fn track_event(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let event_type = require_str(args, 0, "type")?;
    if event_type.is_empty() {
        return Err(from_error(Error::InvalidArgument("missing event type".into())));
    }
    let attributes = opt_object(args, 1, "attributes")?;
    if let Some(attributes) = attributes {
        check_allowed_keys(attributes)?;
    }
    sdk.track_event(event_type, attributes).map_err(from_error)?;
    ok_success()
}

// A single string or an array; non-string items are skipped.
fn tag_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(tag) => vec![tag.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Args: `[tag | [tags]]`
pub fn add_tag(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let tags = tag_list(arg(args, 0, "tag")?);
    if !tags.is_empty() {
        sdk.add_tags(&tags).map_err(from_error)?;
    }
    ok_success()
}

/// Args: `[tag | [tags]]`
pub fn remove_tag(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let tags = tag_list(arg(args, 0, "tag")?);
    if !tags.is_empty() {
        sdk.remove_tags(&tags).map_err(from_error)?;
    }
    ok_success()
}

pub fn remove_all_tags(sdk: &dyn PushSdk) -> DResult {
    sdk.remove_all_tags().map_err(from_error)?;
    ok_success()
}

pub fn get_tags(sdk: &dyn PushSdk) -> DResult {
    ok_json(json!(sdk.tags().map_err(from_error)?))
}

/// Args: `[tag]`
pub fn has_tag(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let tag = require_str(args, 0, "tag")?;
    ok_json(Value::Bool(sdk.has_tag(tag).map_err(from_error)?))
}

/// Args: `[field, value]`
pub fn set_property(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    let value = args.get(1).cloned().unwrap_or(Value::Null);
    sdk.set_property(field, value).map_err(from_error)?;
    ok_success()
}

/// Args: `[field]`
pub fn unset_property(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    sdk.unset_property(field).map_err(from_error)?;
    ok_success()
}

/// Args: `[field, value | [values]]`
pub fn add_property(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    let value = arg(args, 1, "value")?.clone();
    sdk.add_property(field, value).map_err(from_error)?;
    ok_success()
}

/// Args: `[field, value | [values]]`
pub fn remove_property(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    let value = arg(args, 1, "value")?.clone();
    sdk.remove_property(field, value).map_err(from_error)?;
    ok_success()
}

/// Args: `[field]`
///
/// Returns: `{ "__wrapped": value }` so that a `null` value still reaches
/// the success callback as an object.
pub fn get_property_value(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    let value = sdk.property_value(field).map_err(from_error)?;
    ok_json(json!({ "__wrapped": value }))
}

/// Args: `[field]`
pub fn get_property_values(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let field = require_str(args, 0, "field")?;
    ok_json(Value::Array(sdk.property_values(field).map_err(from_error)?))
}

pub fn get_properties(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Object(sdk.properties().map_err(from_error)?))
}

/// Args: `[properties]`
pub fn put_properties(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let properties = require_object(args, 0, "properties")?;
    check_allowed_keys(properties)?;
    sdk.put_properties(properties).map_err(from_error)?;
    ok_success()
}

pub fn get_installation_custom_properties(sdk: &dyn PushSdk) -> DResult {
    ok_json(Value::Object(
        sdk.installation_custom_properties().map_err(from_error)?,
    ))
}

/// Args: `[customProperties]`
pub fn put_installation_custom_properties(sdk: &dyn PushSdk, args: &[Value]) -> DResult {
    let custom = require_object(args, 0, "customProperties")?;
    check_allowed_keys(custom)?;
    sdk.put_installation_custom_properties(custom)
        .map_err(from_error)?;
    ok_success()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list() {
        assert_eq!(tag_list(&json!("a")), vec!["a".to_string()]);
        assert_eq!(
            tag_list(&json!(["a", 1, null, "b"])),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(tag_list(&json!(5)).is_empty());
    }
}
