//! # Error Handling
//!
//! Error types for the WonderPush bridge.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Bridge Lifecycle Errors                                           │
//! │  │   ├── NotInitialized        - SDK not initialized yet               │
//! │  │   ├── AlreadyInitialized    - SDK already initialized               │
//! │  │   ├── TornDown              - Bridge was torn down                  │
//! │  │   └── InvalidConfig         - Bad plugin variable                   │
//! │  │                                                                      │
//! │  ├── Argument Errors                                                   │
//! │  │   ├── InvalidJson           - Argument array is not JSON            │
//! │  │   ├── MissingArgument       - Required positional arg absent        │
//! │  │   ├── InvalidArgument       - Positional arg has the wrong type     │
//! │  │   ├── InvalidPropertyKey    - Custom key without a type prefix      │
//! │  │   ├── MissingCallback       - Command needs a keep-alive channel    │
//! │  │   └── UnknownAction         - No such command                       │
//! │  │                                                                      │
//! │  ├── SDK Errors                                                        │
//! │  │   ├── Sdk                   - Error reported by the native SDK      │
//! │  │   └── SdkUnavailable        - Native SDK could not be reached       │
//! │  │                                                                      │
//! │  ├── Callback Errors                                                   │
//! │  │   ├── CallbackTimeout       - Script did not answer in time         │
//! │  │   └── CallbackDropped       - Entry discarded at teardown           │
//! │  │                                                                      │
//! │  └── Internal Errors                                                   │
//! │      ├── Internal                                                      │
//! │      ├── SerializationError                                            │
//! │      └── DeserializationError                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Flow Across the Bridge
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Native SDK                 Bridge                      Script runtime  │
//! │  ──────────────────────────────────────────────────────────────────     │
//! │                                                                         │
//! │  Error::Sdk { code, msg } ──► PluginResult::Error ──► errorCb(...)     │
//! │                               { code, message }                         │
//! │                                                                         │
//! │  SDK errors keep the SDK's own code; every other error uses code().     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bridge
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ========================================================================
    // Bridge Lifecycle Errors (100-199)
    // ========================================================================

    /// The SDK has not been initialized
    #[error("WonderPush has not been initialized. Call initialize() first.")]
    NotInitialized,

    /// The SDK has already been initialized
    #[error("WonderPush has already been initialized.")]
    AlreadyInitialized,

    /// The bridge was torn down and no longer accepts commands
    #[error("The bridge has been torn down.")]
    TornDown,

    /// A plugin variable could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ========================================================================
    // Argument Errors (200-299)
    // ========================================================================

    /// The argument array is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A required positional argument is missing
    #[error("Missing {0}")]
    MissingArgument(String),

    /// A positional argument has the wrong type
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A custom property key does not carry an allowed type prefix
    #[error("The key \"{0}\" is not allowed. Allowed prefixes for keys are: byte_, short_, int_, long_, float_, double_, bool_, string_, date_, geoloc_, object_, ignore_")]
    InvalidPropertyKey(String),

    /// The command must be dispatched with a script callback
    #[error("Action {0} requires a callback channel")]
    MissingCallback(String),

    /// No handler is registered for the action
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    // ========================================================================
    // SDK Errors (300-399)
    // ========================================================================

    /// Error reported by the native SDK, carried unchanged
    #[error("{message}")]
    Sdk {
        /// SDK-defined error code
        code: i32,
        /// SDK-defined error message
        message: String,
    },

    /// The native SDK could not be reached
    #[error("SDK unavailable: {0}")]
    SdkUnavailable(String),

    // ========================================================================
    // Callback Errors (400-499)
    // ========================================================================

    /// The script runtime did not resolve the token in time
    #[error("Timed out while waiting for a JavaScript callback: {0}")]
    CallbackTimeout(String),

    /// The entry was discarded before being resolved
    #[error("Callback was dropped before being resolved: {0}")]
    CallbackDropped(String),

    // ========================================================================
    // Internal Errors (900-999)
    // ========================================================================

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl Error {
    /// Get the error code reported across the bridge
    ///
    /// Error codes are organized by category:
    /// - 100-199: Bridge lifecycle
    /// - 200-299: Arguments
    /// - 300-399: SDK
    /// - 400-499: Callbacks
    /// - 900-999: Internal
    ///
    /// `UnknownAction` keeps 404 to match the dispatcher's "no such method".
    pub fn code(&self) -> i32 {
        match self {
            // Lifecycle (100-199)
            Error::NotInitialized => 100,
            Error::AlreadyInitialized => 101,
            Error::TornDown => 102,
            Error::InvalidConfig(_) => 103,

            // Arguments (200-299)
            Error::InvalidJson(_) => 200,
            Error::MissingArgument(_) => 201,
            Error::InvalidArgument(_) => 202,
            Error::InvalidPropertyKey(_) => 203,
            Error::MissingCallback(_) => 204,
            Error::UnknownAction(_) => 404,

            // SDK (300-399)
            Error::Sdk { .. } => 300,
            Error::SdkUnavailable(_) => 301,

            // Callbacks (400-499)
            Error::CallbackTimeout(_) => 410,
            Error::CallbackDropped(_) => 411,

            // Internal (900-999)
            Error::Internal(_) => 900,
            Error::SerializationError(_) => 902,
            Error::DeserializationError(_) => 903,
        }
    }

    /// The code the script runtime sees.
    ///
    /// SDK errors keep their own code; everything else uses [`Error::code`].
    pub fn reported_code(&self) -> i32 {
        match self {
            Error::Sdk { code, .. } => *code,
            other => other.code(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying
    /// or by user action.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::NotInitialized | Error::SdkUnavailable(_) | Error::CallbackTimeout(_)
        )
    }

    /// Check if this error was caused by the caller's arguments
    pub fn is_argument_error(&self) -> bool {
        (200..300).contains(&self.code())
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// FFI ERROR REPRESENTATION
// ============================================================================

/// FFI-friendly error representation
#[derive(Debug, Clone)]
pub struct FfiError {
    /// Numeric error code
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the error is recoverable
    pub recoverable: bool,
}

impl From<Error> for FfiError {
    fn from(err: Error) -> Self {
        Self {
            code: err.reported_code(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
