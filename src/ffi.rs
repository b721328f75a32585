//! FFI interface for embedding the extractor in a host program
//!
//! Schemas go in and records come out as JSON. The returned strings are owned
//! by Rust and must be released with `free_extraction_result`.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use crate::error::Error;
use crate::extractors::extract_bytes;
use crate::schema::ExtractionSchema;

/// Result struct returned to the host
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON array of records (null-terminated), or null on failure
    pub json_ptr: *mut c_char,
    /// Error message (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Extract records from HTML with a JSON schema.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `schema_json` - Schema document (null-terminated)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `schema_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_records_ffi(
    html_ptr: *const c_char,
    html_len: usize,
    schema_json: *const c_char,
) -> ExtractionResultFFI {
    let html: &[u8] = if html_ptr.is_null() || html_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(html_ptr as *const u8, html_len)
    };

    if schema_json.is_null() {
        return make_error_result("Schema JSON is null");
    }
    let schema_str = match CStr::from_ptr(schema_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in schema JSON"),
    };

    into_ffi_result(run_extraction(html, schema_str))
}

/// Free an ExtractionResultFFI returned by extract_records_ffi
///
/// # Safety
/// - `result` must have been returned by `extract_records_ffi`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn run_extraction(html: &[u8], schema_json: &str) -> Result<String, Error> {
    let schema = ExtractionSchema::from_json(schema_json)?;
    let result = extract_bytes(html, &schema)?;
    Ok(result.to_json()?)
}

fn into_ffi_result(outcome: Result<String, Error>) -> ExtractionResultFFI {
    match outcome {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&e.to_string()),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_ptr = CString::new(msg.replace('\0', " "))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut());
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{"name": "cards", "baseSelector": "article", "fields": [
        {"name": "title", "selector": "h2 a", "type": "text"},
        {"name": "url", "selector": "h2 a", "type": "attribute", "attribute": "href"}
    ]}"#;

    fn call(html: &[u8], schema: &str) -> (Option<String>, Option<String>) {
        let schema = CString::new(schema).unwrap();
        unsafe {
            let result = extract_records_ffi(html.as_ptr() as *const c_char, html.len(), schema.as_ptr());
            let json = (!result.json_ptr.is_null())
                .then(|| CStr::from_ptr(result.json_ptr).to_string_lossy().into_owned());
            let error = (!result.error_ptr.is_null())
                .then(|| CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned());
            free_extraction_result(result);
            (json, error)
        }
    }

    #[test]
    fn test_ffi_extracts_records() {
        let html = br#"<article><h2><a href="/p/1">Gel</a></h2></article><article><h2>None</h2></article>"#;
        let (json, error) = call(html, SCHEMA);

        assert_eq!(error, None);
        assert_eq!(
            json.as_deref(),
            Some(r#"[{"title":"Gel","url":"/p/1"},{"title":null,"url":null}]"#)
        );
    }

    #[test]
    fn test_ffi_empty_html() {
        let (json, error) = call(b"", SCHEMA);
        assert_eq!(json.as_deref(), Some("[]"));
        assert_eq!(error, None);
    }

    #[test]
    fn test_ffi_reports_schema_errors() {
        let schema = r#"{"baseSelector": "article", "fields": [
            {"name": "url", "selector": "a", "type": "attribute"}
        ]}"#;
        let (json, error) = call(b"<article></article>", schema);

        assert_eq!(json, None);
        assert!(error.unwrap().contains("names no attribute"));
    }

    #[test]
    fn test_ffi_reports_invalid_utf8() {
        let (json, error) = call(b"<article>\xC3\x28</article>", SCHEMA);
        assert_eq!(json, None);
        assert!(error.unwrap().contains("not valid UTF-8"));
    }

    #[test]
    fn test_ffi_serialize_failure_is_an_error() {
        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let result = into_ffi_result(Err(Error::Serialize(json_err)));

        assert!(result.json_ptr.is_null());
        let error = unsafe { CStr::from_ptr(result.error_ptr) }
            .to_string_lossy()
            .into_owned();
        assert!(error.starts_with("failed to serialize records"));
        unsafe { free_extraction_result(result) };
    }
}
