//! Reply types shared by the dispatcher and the script channel.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Error;

/// Outcome reported to the script runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The success callback fires
    Ok,
    /// The error callback fires
    Error,
}

/// Reply to a dispatched command, or a message pushed on a kept channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginResult {
    /// Which script callback fires
    pub status: Status,
    /// Payload: the SDK's result, or `{ code, message }` on error
    pub message: Value,
    /// Keep the script callback registered for further messages
    pub keep_callback: bool,
}

impl PluginResult {
    /// Success with a payload
    pub fn ok(message: Value) -> Self {
        Self { status: Status::Ok, message, keep_callback: false }
    }

    /// Success without a payload
    pub fn ok_empty() -> Self {
        Self::ok(Value::Null)
    }

    /// Failure with a code and message
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: json!({ "code": code, "message": message.into() }),
            keep_callback: false,
        }
    }

    /// Keep the receiving callback alive
    pub fn keep(mut self) -> Self {
        self.keep_callback = true;
        self
    }

    /// Whether this is a success
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// Error code, for failures
    pub fn error_code(&self) -> Option<i32> {
        match self.status {
            Status::Ok => None,
            Status::Error => self.message["code"].as_i64().map(|c| c as i32),
        }
    }
}

impl From<Error> for PluginResult {
    fn from(e: Error) -> Self {
        Self::error(e.reported_code(), e.to_string())
    }
}

/// Channel back to a script callback.
///
/// Called once for a plain command; called repeatedly when a result is
/// sent with `keep_callback`.
pub type ScriptCallback = Arc<dyn Fn(PluginResult) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_payload() {
        let result = PluginResult::error(404, "Unknown action: nope");
        assert!(!result.is_ok());
        assert_eq!(result.error_code(), Some(404));
        assert_eq!(result.message["message"], "Unknown action: nope");
    }

    #[test]
    fn test_sdk_error_keeps_its_code() {
        let result = PluginResult::from(Error::Sdk { code: 12, message: "denied".into() });
        assert_eq!(result.error_code(), Some(12));
        assert_eq!(result.message["message"], "denied");
    }

    #[test]
    fn test_keep() {
        let result = PluginResult::ok_empty().keep();
        assert!(result.is_ok());
        assert!(result.keep_callback);
        assert_eq!(result.error_code(), None);
    }
}
