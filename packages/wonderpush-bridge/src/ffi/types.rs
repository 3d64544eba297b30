//! # FFI Types
//!
//! C-compatible types for the bridge's C API.

use std::ffi::{c_void, CStr, CString};
use std::os::raw::c_char;
use std::str::Utf8Error;

use crate::bridge::PluginResult;

/// FFI-safe result type
///
/// Used to return results across the FFI boundary.
#[repr(C)]
pub struct FfiResult {
    /// Success flag (1 = success, 0 = error)
    pub success: i32,
    /// Error code (0 if success)
    pub error_code: i32,
    /// Error message (null if success)
    pub error_message: *mut c_char,
    /// Result data as JSON (null if error)
    pub data: *mut c_char,
}

impl FfiResult {
    /// Create a successful result with data
    pub fn ok(data: String) -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: into_c_string(data),
        }
    }

    /// Create a successful result without data
    pub fn ok_empty() -> Self {
        Self {
            success: 1,
            error_code: 0,
            error_message: std::ptr::null_mut(),
            data: std::ptr::null_mut(),
        }
    }

    /// Create an error result
    pub fn err(code: i32, message: String) -> Self {
        Self {
            success: 0,
            error_code: code,
            error_message: into_c_string(message),
            data: std::ptr::null_mut(),
        }
    }

    /// Create from a Rust Result
    pub fn from_result<T: ToString>(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Self::ok(value.to_string()),
            Err(e) => Self::err(e.reported_code(), e.to_string()),
        }
    }

    /// Create from a command reply; `data` holds the reply payload as JSON
    pub fn from_plugin_result(result: PluginResult) -> Self {
        match result.error_code() {
            None => Self::ok(result.message.to_string()),
            Some(code) => {
                let message = result.message["message"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                Self::err(code, message)
            }
        }
    }
}

/// Opaque host pointer handed back on every call.
///
/// The host guarantees the pointee may be used from any thread.
#[derive(Clone, Copy)]
pub(crate) struct UserData(pub(crate) *mut c_void);

impl UserData {
    pub(crate) fn ptr(self) -> *mut c_void {
        self.0
    }
}

unsafe impl Send for UserData {}
unsafe impl Sync for UserData {}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Move a Rust string to a C string owned by the caller.
///
/// Interior NUL bytes are removed.
pub fn into_c_string(s: String) -> *mut c_char {
    let s = if s.contains('\0') { s.replace('\0', "") } else { s };
    CString::new(s).unwrap_or_default().into_raw()
}

/// Convert a C string to a Rust String
///
/// Null gives `Ok(None)`; invalid UTF-8 is an error.
///
/// # Safety
/// The caller must ensure the pointer is null or valid and null-terminated.
pub unsafe fn cstr_to_string(ptr: *const c_char) -> Result<Option<String>, Utf8Error> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr).to_str().map(|s| Some(s.to_string()))
}

/// Free a C string allocated by Rust
///
/// # Safety
/// The pointer must have been allocated by Rust using CString::into_raw().
#[no_mangle]
pub unsafe extern "C" fn wonderpush_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Free an FfiResult
///
/// # Safety
/// The FfiResult must have been created by Rust FFI functions.
#[no_mangle]
pub unsafe extern "C" fn wonderpush_free_result(result: FfiResult) {
    if !result.error_message.is_null() {
        drop(CString::from_raw(result.error_message));
    }
    if !result.data.is_null() {
        drop(CString::from_raw(result.data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn read(ptr: *mut c_char) -> String {
        CStr::from_ptr(ptr).to_str().unwrap().to_string()
    }

    #[test]
    fn test_interior_nul_is_removed() {
        let ptr = into_c_string("a\0b".to_string());
        unsafe {
            assert_eq!(read(ptr), "ab");
            wonderpush_free_string(ptr);
        }
    }

    #[test]
    fn test_cstr_null_and_invalid_utf8_differ() {
        let valid = CString::new("héllo").unwrap();
        let invalid = CString::new(vec![b'a', 0xff]).unwrap();
        unsafe {
            assert_eq!(cstr_to_string(std::ptr::null()), Ok(None));
            assert_eq!(cstr_to_string(valid.as_ptr()), Ok(Some("héllo".to_string())));
            assert!(cstr_to_string(invalid.as_ptr()).is_err());
        }
    }

    #[test]
    fn test_from_plugin_result() {
        let ok = FfiResult::from_plugin_result(PluginResult::ok(serde_json::json!({"a": 1})));
        assert_eq!(ok.success, 1);
        unsafe {
            assert_eq!(read(ok.data), r#"{"a":1}"#);
            wonderpush_free_result(ok);
        }

        let err = FfiResult::from_plugin_result(PluginResult::error(404, "Unknown action: x"));
        assert_eq!(err.success, 0);
        assert_eq!(err.error_code, 404);
        assert!(err.data.is_null());
        unsafe {
            assert_eq!(read(err.error_message), "Unknown action: x");
            wonderpush_free_result(err);
        }
    }
}
