//! # WonderPush Bridge
//!
//! Native half of the WonderPush script plugin: forwards commands from an
//! embedded script runtime to the push-notification SDK, forwards SDK events
//! back, and correlates asynchronous script answers with the native code
//! waiting for them.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      WONDERPUSH BRIDGE MODULES                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         Script runtime                           │  │
//! │  └───────────────┬──────────────────────────────────▲───────────────┘  │
//! │       commands   │                                  │ replies, events  │
//! │                  ▼                                  │                  │
//! │  ┌──────────────────────────────────────────────────┴───────────────┐  │
//! │  │                           Bridge                                 │  │
//! │  │                                                                  │  │
//! │  │  - Dispatcher      (flat action surface)                         │  │
//! │  │  - EventForwarder  (notificationOpen, registeredCallback)        │  │
//! │  │  - ScriptDelegate  (urlForDeepLink round trips)                  │  │
//! │  └───────┬───────────────────────┬──────────────────────────────────┘  │
//! │          │                       │                                     │
//! │          ▼                       ▼                                     │
//! │  ┌──────────────┐       ┌─────────────────┐      ┌──────────────────┐ │
//! │  │   PushSdk    │       │  CallbackTable  │      │    Lifecycle     │ │
//! │  │              │       │                 │      │                  │ │
//! │  │ - MemorySdk  │       │ - register      │      │ - app delegate   │ │
//! │  │ - ForeignSdk │       │ - resolve once  │      │ - notification   │ │
//! │  │              │       │ - teardown      │      │   center         │ │
//! │  └──────────────┘       └─────────────────┘      └──────────────────┘ │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`callbacks`] - Callback correlation table
//! - [`sdk`] - Push SDK trait, delegate trait, channels, in-memory and foreign SDKs
//! - [`bridge`] - Command dispatch, events and the script delegate
//! - [`lifecycle`] - Application and notification-center forwarding
//! - [`config`] - Bridge configuration and plugin variables
//! - `ffi` - C API for Swift/Kotlin hosts (feature `ffi`)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wonderpush_bridge::{Bridge, BridgeConfig, MemorySdk};
//!
//! let bridge = Bridge::new(Arc::new(MemorySdk::new()), BridgeConfig::default())?;
//! bridge.dispatch("initialize", r#"["clientId", "clientSecret"]"#);
//! let reply = bridge.dispatch("getInstallationId", "[]");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod bridge;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod sdk;
/// Wall-clock helpers for diagnostics.
pub mod time;

#[cfg(feature = "ffi")]
pub mod ffi;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use bridge::{Bridge, BridgeEvent, PluginResult, ScriptCallback};
pub use callbacks::{CallbackTable, Resolution, Waiter};
pub use config::BridgeConfig;
pub use error::{Error, Result};
pub use lifecycle::{LifecycleForwarder, NotificationResponse, PresentationOptions};
pub use sdk::{ForeignSdk, MemorySdk, PassThroughDelegate, PushDelegate, PushSdk};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of the bridge
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Returns build information for debugging
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        #[cfg(target_os = "ios")]
        target: "ios",
        #[cfg(target_os = "android")]
        target: "android",
        #[cfg(target_os = "macos")]
        target: "macos",
        #[cfg(target_os = "linux")]
        target: "linux",
        #[cfg(target_os = "windows")]
        target: "windows",
        #[cfg(not(any(
            target_os = "ios",
            target_os = "android",
            target_os = "macos",
            target_os = "linux",
            target_os = "windows"
        )))]
        target: "unknown",
        profile: if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
    }
}

/// Build information for debugging
#[derive(Debug, Clone)]
pub struct BuildInfo {
    /// Crate version
    pub version: &'static str,
    /// Target operating system
    pub target: &'static str,
    /// Build profile (debug/release)
    pub profile: &'static str,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_build_info() {
        let info = build_info();
        assert_eq!(info.version, version());
    }
}
