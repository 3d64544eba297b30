//! # FFI Bindings
//!
//! C API for Swift and Kotlin hosts that embed the bridge.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         FFI ARCHITECTURE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Swift/Kotlin plugin host                                               │
//! │     │  wonderpush_bridge_call(handle, action, args, callback)           │
//! │     ▼                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                BridgeHandle (one per plugin)                    │   │
//! │  │                                                                 │   │
//! │  │  Bridge ──► ForeignSdk ──► SdkCallFn(method, "[args]")          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │     │                                              │                    │
//! │     ▼                                              ▼                    │
//! │  FfiResult (direct reply)          {"result": v} | {"error": {...}}     │
//! │  ResultCallbackFn (kept channels)          native WonderPush SDK        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every function returns an `FfiResult` with the error code and message.
//! SDK errors keep the SDK's own code. Strings handed to the host are freed
//! with `wonderpush_free_string`, results with `wonderpush_free_result`.

mod c_api;
mod types;

pub use c_api::*;
pub use types::*;
