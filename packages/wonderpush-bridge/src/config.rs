//! # Bridge Configuration
//!
//! Settings read once when the bridge is created. Hosts usually fill them
//! from the plugin variables declared at install time.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// How long the script delegate has to answer an SDK question
pub const DEFAULT_DELEGATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Events kept while no forwarder is attached
pub const DEFAULT_EVENT_BUFFER_CAPACITY: usize = 64;

/// Bridge configuration
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Integrator string reported to the SDK
    pub integrator: String,
    /// Upper bound on a script-delegate round trip
    pub delegate_timeout: Duration,
    /// Enable native SDK logging at startup
    pub logging: bool,
    /// Events buffered before the script attaches its forwarder
    pub event_buffer_capacity: usize,
    /// Client id used for automatic initialization
    pub client_id: Option<String>,
    /// Client secret used for automatic initialization
    pub client_secret: Option<String>,
    /// Initialize the SDK when the bridge is created
    pub auto_init: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            integrator: format!("wonderpush-rust-bridge-{}", crate::version()),
            delegate_timeout: DEFAULT_DELEGATE_TIMEOUT,
            logging: false,
            event_buffer_capacity: DEFAULT_EVENT_BUFFER_CAPACITY,
            client_id: None,
            client_secret: None,
            auto_init: true,
        }
    }
}

impl BridgeConfig {
    /// Build from plugin variables (`CLIENT_ID`, `CLIENT_SECRET`, `AUTO_INIT`, `LOGGING`).
    ///
    /// Unknown variables are ignored. Empty credentials count as absent.
    pub fn from_plugin_variables(vars: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        config.client_id = non_empty(vars.get("CLIENT_ID"));
        config.client_secret = non_empty(vars.get("CLIENT_SECRET"));
        if let Some(value) = vars.get("AUTO_INIT") {
            config.auto_init = parse_flag("AUTO_INIT", value)?;
        }
        if let Some(value) = vars.get("LOGGING") {
            config.logging = parse_flag("LOGGING", value)?;
        }

        Ok(config)
    }

    /// Parse from a JSON object with camelCase keys, as sent by a foreign host.
    ///
    /// Missing keys keep their defaults; `delegateTimeoutMs` is in milliseconds.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidConfig("expected a JSON object".into()))?;
        let mut config = Self::default();

        if let Some(integrator) = obj.get("integrator").and_then(|v| v.as_str()) {
            config.integrator = integrator.to_string();
        }
        if let Some(ms) = obj.get("delegateTimeoutMs") {
            let ms = ms
                .as_u64()
                .ok_or_else(|| Error::InvalidConfig("delegateTimeoutMs must be a positive integer".into()))?;
            config.delegate_timeout = Duration::from_millis(ms);
        }
        if let Some(logging) = obj.get("logging").and_then(|v| v.as_bool()) {
            config.logging = logging;
        }
        if let Some(capacity) = obj.get("eventBufferCapacity").and_then(|v| v.as_u64()) {
            config.event_buffer_capacity = capacity as usize;
        }
        if let Some(auto_init) = obj.get("autoInit").and_then(|v| v.as_bool()) {
            config.auto_init = auto_init;
        }
        config.client_id = obj.get("clientId").and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(str::to_string);
        config.client_secret = obj.get("clientSecret").and_then(|v| v.as_str()).filter(|s| !s.is_empty()).map(str::to_string);

        Ok(config)
    }

    /// Both credentials, when present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(Error::InvalidConfig(format!("{} must be a boolean, got \"{}\"", name, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(config.integrator.starts_with("wonderpush-rust-bridge-"));
        assert_eq!(config.delegate_timeout, Duration::from_secs(3));
        assert!(config.auto_init);
        assert!(!config.logging);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_plugin_variables() {
        let config = BridgeConfig::from_plugin_variables(&vars(&[
            ("CLIENT_ID", "abc"),
            ("CLIENT_SECRET", "xyz"),
            ("AUTO_INIT", "false"),
            ("LOGGING", "TRUE"),
            ("OTHER", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.credentials(), Some(("abc", "xyz")));
        assert!(!config.auto_init);
        assert!(config.logging);
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let config = BridgeConfig::from_plugin_variables(&vars(&[("CLIENT_ID", "  ")])).unwrap();
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_invalid_flag() {
        let result = BridgeConfig::from_plugin_variables(&vars(&[("AUTO_INIT", "maybe")]));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_json() {
        let config = BridgeConfig::from_json(
            r#"{"delegateTimeoutMs": 250, "logging": true, "clientId": "id", "clientSecret": "s"}"#,
        )
        .unwrap();
        assert_eq!(config.delegate_timeout, Duration::from_millis(250));
        assert!(config.logging);
        assert_eq!(config.credentials(), Some(("id", "s")));

        assert!(BridgeConfig::from_json("[]").is_err());
        assert!(BridgeConfig::from_json(r#"{"delegateTimeoutMs": -1}"#).is_err());
    }
}
