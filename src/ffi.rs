//! FFI bindings for Conscient
//!
//! This module provides C-compatible functions for calling the engine from
//! mobile and desktop hosts. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `conscient_free_string`.
//!
//! The stateful engine runs over an in-memory store; hosts persist it by
//! saving the state document and loading it back on the next launch.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::ConscientEngine;
use crate::error::EngineError;
use crate::scoring::PostScorer;
use crate::storage::MemoryStore;
use crate::types::{InteractionMetrics, Post};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize `value` into a newly allocated C string, or record the error
fn json_to_cstr<T: Serialize + ?Sized>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&EngineError::from(e).to_string());
            ptr::null_mut()
        }
    }
}

fn parse_post(json: &str) -> Result<Post, EngineError> {
    Ok(serde_json::from_str(json)?)
}

/// NULL selects the simulated viewing sample
unsafe fn parse_interaction(ptr: *const c_char) -> Result<InteractionMetrics, EngineError> {
    if ptr.is_null() {
        return Ok(InteractionMetrics::simulated());
    }
    match cstr_to_string(ptr) {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Err(EngineError::EncodingError(
            "interaction is not valid UTF-8".to_string(),
        )),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze one viewing of a post with the default rules.
///
/// # Safety
/// - `post_json` must be a valid null-terminated C string.
/// - `interaction_json` must be a valid null-terminated C string or NULL
///   (NULL uses the simulated viewing sample).
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_analyze(
    post_json: *const c_char,
    interaction_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let post_str = match cstr_to_string(post_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid post string pointer");
            return ptr::null_mut();
        }
    };

    let analysis = parse_post(&post_str).and_then(|post| {
        let interaction = parse_interaction(interaction_json)?;
        Ok(PostScorer::default().analyze(&post, &interaction))
    });

    match analysis {
        Ok(result) => json_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to a ConscientEngine
pub struct ConscientEngineHandle {
    engine: ConscientEngine<MemoryStore>,
    config: EngineConfig,
}

/// Create a new engine with an empty state.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns a pointer to a newly allocated engine.
/// - Must be freed with `conscient_engine_free`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_new(
    config_json: *const c_char,
) -> *mut ConscientEngineHandle {
    clear_last_error();

    let config = if config_json.is_null() {
        Ok(EngineConfig::default())
    } else {
        match cstr_to_string(config_json) {
            Some(json) => EngineConfig::from_json(&json),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    let built = config.and_then(|config| {
        let engine = ConscientEngine::new(MemoryStore::new(), config.clone())?;
        Ok(ConscientEngineHandle { engine, config })
    });

    match built {
        Ok(handle) => Box::into_raw(Box::new(handle)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_free(engine: *mut ConscientEngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Analyze a viewing and fold it into the engine state.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - `post_json` must be a valid null-terminated C string.
/// - `interaction_json` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_process(
    engine: *mut ConscientEngineHandle,
    post_json: *const c_char,
    interaction_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    let handle = &mut *engine;

    let post_str = match cstr_to_string(post_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid post string pointer");
            return ptr::null_mut();
        }
    };

    let processed = parse_post(&post_str).and_then(|post| {
        let interaction = parse_interaction(interaction_json)?;
        handle.engine.process(&post, &interaction)
    });

    match processed {
        Ok(result) => json_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the profile snapshot (vulnerability, distortion, pattern, history size).
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_profile(
    engine: *const ConscientEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    json_to_cstr(&(*engine).engine.snapshot())
}

/// Get the pattern graph, with placeholder points when nothing is recorded.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_pattern(
    engine: *const ConscientEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    json_to_cstr(&(*engine).engine.pattern_graph())
}

/// Get the analysis history, oldest first.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_history(
    engine: *const ConscientEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    json_to_cstr(&(*engine).engine.history())
}

/// Reset the event log, profiles and pattern. History is kept.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - Returns 0 on success, non-zero on error.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_reset(engine: *mut ConscientEngineHandle) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    match (*engine).engine.reset_data() {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Export the engine state document.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - Returns a newly allocated string that must be freed with `conscient_free_string`.
/// - Returns NULL on error; call `conscient_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_save_state(
    engine: *const ConscientEngineHandle,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }

    match (*engine).engine.gateway().store().to_json() {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&EngineError::from(e).to_string());
            ptr::null_mut()
        }
    }
}

/// Replace the engine state with a previously exported document.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `conscient_engine_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error. On error the state is unchanged.
#[no_mangle]
pub unsafe extern "C" fn conscient_engine_load_state(
    engine: *mut ConscientEngineHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }

    let handle = &mut *engine;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    let loaded = MemoryStore::from_json(&json_str)
        .map_err(EngineError::from)
        .and_then(|store| ConscientEngine::new(store, handle.config.clone()));

    match loaded {
        Ok(engine) => {
            handle.engine = engine;
            0
        }
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Conscient functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Conscient function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn conscient_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Conscient function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn conscient_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn conscient_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalysisResult, IntegratedPattern, ProfileSnapshot};
    use std::ffi::CString;

    fn sample_post_json() -> CString {
        CString::new(
            r#"{
            "id": "post-2",
            "type": "video",
            "title": "This ONE trick will ruin your exam score — watch now!",
            "text": "Teachers hate this.",
            "thumbnail": { "saturation": 0.9, "faces": 1, "expression": "shocked" },
            "audioFlag": { "high_tension": true, "speechRate": 1.3 },
            "punctuationIntensity": 2,
            "capsIntensity": 1,
            "clickbaitWords": ["one trick", "ruin", "watch now"],
            "timestamp": 1700000000000,
            "biasScore": 0.8
        }"#,
        )
        .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        conscient_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_analyze() {
        let post = sample_post_json();

        unsafe {
            let json = take_string(conscient_analyze(post.as_ptr(), ptr::null()));
            let result: AnalysisResult = serde_json::from_str(&json).unwrap();

            assert_eq!(result.post_id, "post-2");
            assert_eq!(result.influence_vector.fear, 1.0);
            assert_eq!(result.response_vector.clickbait_response, 1.0);
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let engine = conscient_engine_new(ptr::null());
            assert!(!engine.is_null());

            let post = sample_post_json();
            let interaction = CString::new(r#"{"dwellTimeMs": 7000, "openCount": 2}"#).unwrap();
            take_string(conscient_engine_process(
                engine,
                post.as_ptr(),
                interaction.as_ptr(),
            ));

            let history = take_string(conscient_engine_history(engine));
            let history: Vec<AnalysisResult> = serde_json::from_str(&history).unwrap();
            assert_eq!(history.len(), 1);

            let pattern = take_string(conscient_engine_pattern(engine));
            let pattern: Vec<IntegratedPattern> = serde_json::from_str(&pattern).unwrap();
            assert_eq!(pattern.len(), 1);

            // Export and load into a fresh engine
            let state = conscient_engine_save_state(engine);
            assert!(!state.is_null());

            let engine2 = conscient_engine_new(ptr::null());
            assert_eq!(conscient_engine_load_state(engine2, state), 0);
            conscient_free_string(state);

            let a = take_string(conscient_engine_profile(engine));
            let b = take_string(conscient_engine_profile(engine2));
            let a: ProfileSnapshot = serde_json::from_str(&a).unwrap();
            let b: ProfileSnapshot = serde_json::from_str(&b).unwrap();
            assert_eq!(a, b);

            assert_eq!(conscient_engine_reset(engine2), 0);
            let reset = take_string(conscient_engine_profile(engine2));
            let reset: ProfileSnapshot = serde_json::from_str(&reset).unwrap();
            assert!(reset.pattern.is_empty());
            assert_eq!(reset.history_len, 1);

            conscient_engine_free(engine);
            conscient_engine_free(engine2);
        }
    }

    #[test]
    fn test_ffi_invalid_config() {
        unsafe {
            let config = CString::new(r#"{"smoothing_alpha": 0}"#).unwrap();
            let engine = conscient_engine_new(config.as_ptr());
            assert!(engine.is_null());

            let error = CStr::from_ptr(conscient_last_error()).to_str().unwrap();
            assert!(error.contains("smoothing_alpha"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = conscient_analyze(invalid.as_ptr(), ptr::null());
            assert!(result.is_null());

            let error = conscient_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            assert_eq!(conscient_engine_reset(ptr::null_mut()), -1);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = CStr::from_ptr(conscient_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
