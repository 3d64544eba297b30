//! # Push Delegate
//!
//! Capability injected into the SDK for tighter integration. Every method
//! has a default, so an empty `impl PushDelegate for X {}` is a valid
//! pass-through delegate.

use serde_json::Value;

/// Lets application code customize SDK behavior at runtime.
pub trait PushDelegate: Send + Sync {
    /// Called before the SDK opens a deep link.
    ///
    /// Return the URL to open instead, or `None` to open nothing.
    /// The default keeps `url` unchanged.
    fn url_for_deep_link(&self, url: &str) -> Option<String> {
        Some(url.to_string())
    }

    /// A notification was opened, by tapping it or one of its buttons.
    fn on_notification_opened(&self, notification: &Value, button_index: i32) {
        let _ = (notification, button_index);
    }

    /// A notification was received while the application was running.
    fn on_notification_received(&self, notification: &Value) {
        let _ = notification;
    }
}

/// Delegate that changes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughDelegate;

impl PushDelegate for PassThroughDelegate {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rewriter;

    impl PushDelegate for Rewriter {
        fn url_for_deep_link(&self, url: &str) -> Option<String> {
            Some(url.replace("http://", "https://"))
        }
    }

    #[test]
    fn test_pass_through_keeps_url() {
        let delegate = PassThroughDelegate;
        assert_eq!(
            delegate.url_for_deep_link("app://home").as_deref(),
            Some("app://home")
        );
    }

    #[test]
    fn test_override_single_method() {
        let delegate = Rewriter;
        assert_eq!(
            delegate.url_for_deep_link("http://example.com").as_deref(),
            Some("https://example.com")
        );
        // The other hooks keep their no-op defaults.
        delegate.on_notification_received(&serde_json::json!({}));
    }
}
