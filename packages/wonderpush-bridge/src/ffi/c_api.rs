//! # C API
//!
//! C-compatible FFI functions for Swift and Kotlin hosts.
//!
//! All functions follow the naming convention: `wonderpush_bridge_<action>`.
//! A host creates one [`BridgeHandle`] per plugin instance and passes it to
//! every other call; there is no global state.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::sync::Arc;

use serde_json::{json, Value};

use super::types::*;
use crate::bridge::{Bridge, PluginResult, ScriptCallback, Status};
use crate::config::BridgeConfig;
use crate::error::{Error, FfiError, Result};
use crate::sdk::ForeignSdk;

// ============================================================================
// HOST CALLBACK TYPES
// ============================================================================

/// Host SDK entry point.
///
/// Receives the method name and a JSON argument array. Returns either null
/// (no result) or a JSON string `{"result": value}` or
/// `{"error": {"code": n, "message": "..."}}`.
pub type SdkCallFn =
    extern "C" fn(user_data: *mut c_void, method: *const c_char, args_json: *const c_char) -> *mut c_char;

/// Releases a string returned by [`SdkCallFn`]
pub type SdkFreeFn = extern "C" fn(user_data: *mut c_void, ptr: *mut c_char);

/// Receives a command reply.
///
/// `status` is 1 for success and 0 for error. `message_json` is only valid
/// for the duration of the call.
pub type ResultCallbackFn =
    extern "C" fn(user_data: *mut c_void, status: i32, message_json: *const c_char, keep_callback: i32);

/// Opaque handle owning one bridge
pub struct BridgeHandle {
    bridge: Bridge,
    sdk: Arc<ForeignSdk>,
}

#[derive(Clone, Copy)]
struct HostSdk {
    call: SdkCallFn,
    free: Option<SdkFreeFn>,
    user_data: UserData,
}

impl HostSdk {
    fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let method = CString::new(method).map_err(|e| Error::Internal(e.to_string()))?;
        let args = CString::new(serde_json::to_string(&args)?).map_err(|e| Error::Internal(e.to_string()))?;

        let reply = (self.call)(self.user_data.ptr(), method.as_ptr(), args.as_ptr());
        if reply.is_null() {
            return Ok(Value::Null);
        }

        // SAFETY: the host returns a valid NUL-terminated string or null.
        let text = unsafe { CStr::from_ptr(reply) }.to_str().map(str::to_string);
        if let Some(free) = self.free {
            free(self.user_data.ptr(), reply);
        }
        let text = text.map_err(|e| Error::DeserializationError(e.to_string()))?;
        parse_host_reply(&text)
    }
}

fn parse_host_reply(text: &str) -> Result<Value> {
    let mut reply: Value =
        serde_json::from_str(text).map_err(|e| Error::DeserializationError(e.to_string()))?;

    if let Some(error) = reply.get("error") {
        return Err(Error::Sdk {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default() as i32,
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        });
    }

    match reply.get_mut("result") {
        Some(value) => Ok(value.take()),
        None => Err(Error::DeserializationError(format!(
            "host reply has neither result nor error: {}",
            text
        ))),
    }
}

fn script_callback(callback: ResultCallbackFn, user_data: UserData) -> ScriptCallback {
    Arc::new(move |result: PluginResult| {
        let status = match result.status {
            Status::Ok => 1,
            Status::Error => 0,
        };
        let message = into_c_string(result.message.to_string());
        callback(user_data.ptr(), status, message, result.keep_callback as i32);
        // SAFETY: allocated just above and only lent to the host.
        unsafe { wonderpush_free_string(message) };
    })
}

/// Reply of an entry point; errors short-circuit with `?`.
type FfiOutcome = std::result::Result<FfiResult, FfiResult>;

fn finish(outcome: FfiOutcome) -> FfiResult {
    outcome.unwrap_or_else(|e| e)
}

unsafe fn handle_ref<'a>(handle: *const BridgeHandle) -> std::result::Result<&'a BridgeHandle, FfiResult> {
    handle
        .as_ref()
        .ok_or_else(|| to_ffi_error(Error::NotInitialized))
}

/// A string argument that may be null. Invalid UTF-8 is an error, never "absent".
unsafe fn opt_arg(ptr: *const c_char, name: &str) -> std::result::Result<Option<String>, FfiResult> {
    cstr_to_string(ptr).map_err(|e| {
        to_ffi_error(Error::InvalidArgument(format!("{} is not valid UTF-8: {}", name, e)))
    })
}

unsafe fn required_arg(ptr: *const c_char, name: &str) -> std::result::Result<String, FfiResult> {
    opt_arg(ptr, name)?.ok_or_else(|| to_ffi_error(Error::MissingArgument(name.to_string())))
}

fn to_ffi_error(e: Error) -> FfiResult {
    let e = FfiError::from(e);
    FfiResult::err(e.code, e.message)
}

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Create a bridge forwarding to a host SDK
///
/// # Arguments
/// * `sdk_call` - Host SDK entry point (required)
/// * `sdk_free` - Releases strings returned by `sdk_call` (null if the host keeps ownership)
/// * `sdk_user_data` - Passed back to `sdk_call` and `sdk_free`
/// * `config_json` - Bridge configuration as JSON (null for defaults)
/// * `out_handle` - Receives the new handle on success
///
/// # Safety
/// `config_json` must be null or a valid C string and `out_handle` must be
/// a valid pointer. `sdk_user_data` must be usable from any thread.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_new(
    sdk_call: Option<SdkCallFn>,
    sdk_free: Option<SdkFreeFn>,
    sdk_user_data: *mut c_void,
    config_json: *const c_char,
    out_handle: *mut *mut BridgeHandle,
) -> FfiResult {
    finish((|| -> FfiOutcome {
        if out_handle.is_null() {
            return Err(to_ffi_error(Error::MissingArgument("out_handle".into())));
        }
        let call = sdk_call.ok_or_else(|| to_ffi_error(Error::MissingArgument("sdk_call".into())))?;

        let config = match opt_arg(config_json, "config")? {
            Some(json) => BridgeConfig::from_json(&json).map_err(to_ffi_error)?,
            None => BridgeConfig::default(),
        };

        let host = HostSdk {
            call,
            free: sdk_free,
            user_data: UserData(sdk_user_data),
        };
        let sdk = Arc::new(ForeignSdk::new(Arc::new(move |method: &str, args: Vec<Value>| {
            host.invoke(method, args)
        })));

        let bridge = Bridge::new(sdk.clone(), config).map_err(to_ffi_error)?;
        *out_handle = Box::into_raw(Box::new(BridgeHandle { bridge, sdk }));
        Ok(FfiResult::ok_empty())
    })())
}

/// Tear the bridge down: detach script channels and discard pending callbacks
///
/// Returns `{"discarded": n}`.
///
/// # Safety
/// `handle` must be null or a pointer returned by [`wonderpush_bridge_new`].
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_teardown(handle: *const BridgeHandle) -> FfiResult {
    match handle_ref(handle) {
        Ok(h) => FfiResult::ok(json!({ "discarded": h.bridge.teardown() }).to_string()),
        Err(e) => e,
    }
}

/// Free a bridge handle, tearing it down first
///
/// # Safety
/// `handle` must be null or a pointer returned by [`wonderpush_bridge_new`],
/// and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_free(handle: *mut BridgeHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Get the bridge version. Free with `wonderpush_free_string`.
#[no_mangle]
pub extern "C" fn wonderpush_bridge_version() -> *mut c_char {
    into_c_string(crate::version().to_string())
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Run a script command
///
/// The reply is returned directly. `callback` is only retained by commands
/// that keep a channel open (`__setEventForwarder`, `setDelegate`).
/// A null `args_json` means no arguments.
///
/// # Safety
/// `handle` must come from [`wonderpush_bridge_new`]; `action` and
/// `args_json` must be null or valid C strings. `callback_user_data` must be
/// usable from any thread until the bridge is freed.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_call(
    handle: *const BridgeHandle,
    action: *const c_char,
    args_json: *const c_char,
    callback: Option<ResultCallbackFn>,
    callback_user_data: *mut c_void,
) -> FfiResult {
    finish((|| -> FfiOutcome {
        let h = handle_ref(handle)?;
        let action = required_arg(action, "action")?;
        let args = opt_arg(args_json, "args")?.unwrap_or_else(|| "[]".to_string());
        let callback = callback.map(|cb| script_callback(cb, UserData(callback_user_data)));

        Ok(FfiResult::from_plugin_result(
            h.bridge.dispatch_with_callback(&action, &args, callback),
        ))
    })())
}

/// Resolve a callback token with a JSON value
///
/// Returns `{"delivered": bool}`. A null `value_json` resolves with `null`.
///
/// # Safety
/// `handle` must come from [`wonderpush_bridge_new`]; `token` and
/// `value_json` must be null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_resolve(
    handle: *const BridgeHandle,
    token: *const c_char,
    value_json: *const c_char,
) -> FfiResult {
    finish((|| -> FfiOutcome {
        let h = handle_ref(handle)?;
        let token = required_arg(token, "token")?;
        let value = match opt_arg(value_json, "value")? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| to_ffi_error(Error::InvalidJson(e.to_string())))?,
            None => Value::Null,
        };

        let delivered = h.bridge.resolve_callback(&token, value).is_delivered();
        Ok(FfiResult::ok(json!({ "delivered": delivered }).to_string()))
    })())
}

// ============================================================================
// EVENTS
// ============================================================================

/// A notification was opened
///
/// Returns `{"delivered": bool}`; undelivered events stay buffered.
///
/// # Safety
/// `handle` must come from [`wonderpush_bridge_new`]; the strings must be
/// null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_notification_opened(
    handle: *const BridgeHandle,
    notification_json: *const c_char,
    notification_type: *const c_char,
) -> FfiResult {
    finish((|| -> FfiOutcome {
        let h = handle_ref(handle)?;
        let json = required_arg(notification_json, "notification")?;
        let notification_type = opt_arg(notification_type, "notification_type")?;
        let notification = match serde_json::from_str::<Value>(&json) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => {
                return Err(to_ffi_error(Error::InvalidArgument(
                    "notification must be an object".into(),
                )))
            }
            Err(e) => return Err(to_ffi_error(Error::InvalidJson(e.to_string()))),
        };

        let delivered = h.bridge.notification_opened(notification, notification_type);
        Ok(FfiResult::ok(json!({ "delivered": delivered }).to_string()))
    })())
}

/// A notification button invoked a registered callback
///
/// Returns `{"delivered": bool}`.
///
/// # Safety
/// `handle` must come from [`wonderpush_bridge_new`]; the strings must be
/// null or valid C strings.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_registered_callback(
    handle: *const BridgeHandle,
    method: *const c_char,
    arg: *const c_char,
) -> FfiResult {
    finish((|| -> FfiOutcome {
        let h = handle_ref(handle)?;
        let method = required_arg(method, "method")?;
        let arg = opt_arg(arg, "arg")?;

        let delivered = h.bridge.registered_callback(&method, arg);
        Ok(FfiResult::ok(json!({ "delivered": delivered }).to_string()))
    })())
}

/// Ask the installed delegate which URL to open for a deep link
///
/// Blocks until the script answers or the delegate timeout elapses, so it
/// must not be called from the thread that delivers script replies.
/// Returns null when the link should not be opened, including when `url`
/// is null or not valid UTF-8. Free the result with `wonderpush_free_string`.
///
/// # Safety
/// `handle` must come from [`wonderpush_bridge_new`]; `url` must be null or
/// a valid C string.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_bridge_url_for_deep_link(
    handle: *const BridgeHandle,
    url: *const c_char,
) -> *mut c_char {
    let Some(h) = handle.as_ref() else {
        return std::ptr::null_mut();
    };
    let url = match cstr_to_string(url) {
        Ok(Some(url)) => url,
        Ok(None) => return std::ptr::null_mut(),
        Err(e) => {
            tracing::warn!(error = %e, "Deep link URL is not valid UTF-8");
            return std::ptr::null_mut();
        }
    };

    let target = match h.sdk.delegate() {
        Some(delegate) => delegate.url_for_deep_link(&url),
        None => Some(url),
    };
    target.map_or(std::ptr::null_mut(), into_c_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static SET_USER_ID_CALLS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn fake_sdk(_: *mut c_void, method: *const c_char, _args: *const c_char) -> *mut c_char {
        let method = unsafe { CStr::from_ptr(method) }.to_str().unwrap();
        let reply = match method {
            "setUserId" => {
                SET_USER_ID_CALLS.fetch_add(1, Ordering::SeqCst);
                return std::ptr::null_mut();
            }
            "getInstallationId" => r#"{"result":"inst-1"}"#,
            "getUserId" => r#"{"error":{"code":7,"message":"not allowed"}}"#,
            "getPushToken" => r#"{"unexpected":true}"#,
            _ => return std::ptr::null_mut(),
        };
        CString::new(reply).unwrap().into_raw()
    }

    extern "C" fn fake_free(_: *mut c_void, ptr: *mut c_char) {
        drop(unsafe { CString::from_raw(ptr) });
    }

    extern "C" fn count_replies(user_data: *mut c_void, status: i32, _: *const c_char, keep: i32) {
        let counter = unsafe { &*(user_data as *const AtomicUsize) };
        if status == 1 && keep == 1 {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn new_handle() -> *mut BridgeHandle {
        let mut handle = std::ptr::null_mut();
        let result = unsafe {
            wonderpush_bridge_new(
                Some(fake_sdk),
                Some(fake_free),
                std::ptr::null_mut(),
                std::ptr::null(),
                &mut handle,
            )
        };
        assert_eq!(result.success, 1);
        unsafe { wonderpush_free_result(result) };
        assert!(!handle.is_null());
        handle
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn data(result: &FfiResult) -> Value {
        serde_json::from_str(CStr::from_ptr(result.data).to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_parse_host_reply() {
        assert_eq!(parse_host_reply(r#"{"result":[1]}"#).unwrap(), json!([1]));
        assert_eq!(parse_host_reply(r#"{"result":null}"#).unwrap(), Value::Null);
        match parse_host_reply(r#"{"error":{"code":42,"message":"nope"}}"#) {
            Err(Error::Sdk { code, message }) => {
                assert_eq!(code, 42);
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(parse_host_reply("{}"), Err(Error::DeserializationError(_))));
        assert!(matches!(parse_host_reply("nope"), Err(Error::DeserializationError(_))));
    }

    #[test]
    fn test_call_forwards_to_host() {
        let handle = new_handle();
        let action = c("getInstallationId");
        let args = c("[]");

        unsafe {
            let result = wonderpush_bridge_call(handle, action.as_ptr(), args.as_ptr(), None, std::ptr::null_mut());
            assert_eq!(result.success, 1);
            assert_eq!(data(&result), json!("inst-1"));
            wonderpush_free_result(result);
            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_sdk_error_keeps_its_code() {
        let handle = new_handle();
        let action = c("getUserId");

        unsafe {
            let result = wonderpush_bridge_call(handle, action.as_ptr(), std::ptr::null(), None, std::ptr::null_mut());
            assert_eq!(result.success, 0);
            assert_eq!(result.error_code, 7);
            assert_eq!(CStr::from_ptr(result.error_message).to_str().unwrap(), "not allowed");
            wonderpush_free_result(result);

            let action = c("getPushToken");
            let result = wonderpush_bridge_call(handle, action.as_ptr(), std::ptr::null(), None, std::ptr::null_mut());
            assert_eq!(result.error_code, 903);
            wonderpush_free_result(result);

            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_event_forwarder_receives_buffered_event() {
        let handle = new_handle();
        let counter = AtomicUsize::new(0);
        let notification = c(r#"{"_wp":{"n":"1"}}"#);
        let action = c("__setEventForwarder");

        unsafe {
            let opened = wonderpush_bridge_notification_opened(handle, notification.as_ptr(), std::ptr::null());
            assert_eq!(data(&opened), json!({ "delivered": false }));
            wonderpush_free_result(opened);

            let result = wonderpush_bridge_call(
                handle,
                action.as_ptr(),
                std::ptr::null(),
                Some(count_replies),
                &counter as *const AtomicUsize as *mut c_void,
            );
            assert_eq!(result.success, 1);
            wonderpush_free_result(result);
            assert_eq!(counter.load(Ordering::SeqCst), 1);

            let method = c("onButton");
            let fired = wonderpush_bridge_registered_callback(handle, method.as_ptr(), std::ptr::null());
            assert_eq!(data(&fired), json!({ "delivered": true }));
            wonderpush_free_result(fired);
            assert_eq!(counter.load(Ordering::SeqCst), 2);

            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_resolve_unknown_token() {
        let handle = new_handle();
        let token = c("missing");
        let value = c("\"x\"");

        unsafe {
            let result = wonderpush_bridge_resolve(handle, token.as_ptr(), value.as_ptr());
            assert_eq!(data(&result), json!({ "delivered": false }));
            wonderpush_free_result(result);

            let bad = c("{");
            let result = wonderpush_bridge_resolve(handle, token.as_ptr(), bad.as_ptr());
            assert_eq!(result.error_code, 200);
            wonderpush_free_result(result);

            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_deep_link_passes_through_without_delegate() {
        let handle = new_handle();
        let url = c("app://home");

        unsafe {
            let target = wonderpush_bridge_url_for_deep_link(handle, url.as_ptr());
            assert_eq!(CStr::from_ptr(target).to_str().unwrap(), "app://home");
            wonderpush_free_string(target);
            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_teardown_then_call_fails() {
        let handle = new_handle();
        let action = c("getInstallationId");

        unsafe {
            let result = wonderpush_bridge_teardown(handle);
            assert_eq!(data(&result), json!({ "discarded": 0 }));
            wonderpush_free_result(result);

            let result = wonderpush_bridge_call(handle, action.as_ptr(), std::ptr::null(), None, std::ptr::null_mut());
            assert_eq!(result.error_code, 102);
            wonderpush_free_result(result);

            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_invalid_utf8_is_rejected_not_defaulted() {
        let handle = new_handle();
        let action = c("setUserId");
        let args = CString::new(b"[\"user-\xff\"]".to_vec()).unwrap();
        let token = c("token");
        let bad_value = CString::new(b"\"app://\xff\"".to_vec()).unwrap();
        let notification = c(r#"{"alert":"hi"}"#);
        let bad_type = CString::new(vec![0xc3u8, 0x28]).unwrap();

        unsafe {
            let result = wonderpush_bridge_call(handle, action.as_ptr(), args.as_ptr(), None, std::ptr::null_mut());
            assert_eq!(result.success, 0);
            assert_eq!(result.error_code, 202);
            wonderpush_free_result(result);
            assert_eq!(SET_USER_ID_CALLS.load(Ordering::SeqCst), 0);

            let result = wonderpush_bridge_resolve(handle, token.as_ptr(), bad_value.as_ptr());
            assert_eq!(result.error_code, 202);
            wonderpush_free_result(result);

            let result = wonderpush_bridge_notification_opened(handle, notification.as_ptr(), bad_type.as_ptr());
            assert_eq!(result.error_code, 202);
            wonderpush_free_result(result);

            wonderpush_bridge_free(handle);
        }
    }

    #[test]
    fn test_invalid_utf8_config_creates_no_bridge() {
        let config = CString::new(b"{\"clientId\":\"\xff\"}".to_vec()).unwrap();
        let mut handle: *mut BridgeHandle = std::ptr::null_mut();

        unsafe {
            let result = wonderpush_bridge_new(
                Some(fake_sdk),
                Some(fake_free),
                std::ptr::null_mut(),
                config.as_ptr(),
                &mut handle,
            );
            assert_eq!(result.success, 0);
            assert_eq!(result.error_code, 202);
            wonderpush_free_result(result);
        }
        assert!(handle.is_null());
    }

    #[test]
    fn test_null_handle() {
        unsafe {
            let result = wonderpush_bridge_teardown(std::ptr::null());
            assert_eq!(result.success, 0);
            assert_eq!(result.error_code, 100);
            wonderpush_free_result(result);
            assert!(wonderpush_bridge_url_for_deep_link(std::ptr::null(), std::ptr::null()).is_null());
        }
    }
}
