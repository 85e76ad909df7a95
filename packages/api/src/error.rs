//! Standard error response body.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use yatube::FieldErrors;

/// The JSON body returned for all error responses.
///
/// ```json
/// { "error": "following: This field is required.", "code": "validation_failed",
///   "fields": { "following": ["This field is required."] } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Human-readable description of the problem.
    pub error: String,

    /// Machine-readable error code.
    ///
    /// | `code` | HTTP status |
    /// |--------|------------|
    /// | `invalid_json` | 400 |
    /// | `validation_failed` | 400 |
    /// | `not_authenticated` | 401 |
    /// | `token_not_valid` | 401 |
    /// | `forbidden` | 403 |
    /// | `not_found` | 404 |
    /// | `internal_error` | 500 |
    pub code: String,

    /// Per-field messages; present only for validation failures. Messages not
    /// tied to one field are listed under `non_field_errors`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a static code and message.
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            error: error.into(),
            fields: BTreeMap::new(),
        }
    }

    /// A `validation_failed` body carrying every field message.
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            code: codes::VALIDATION_FAILED.into(),
            error: errors.to_string(),
            fields: errors.into_inner(),
        }
    }
}

/// Well-known error codes.
pub mod codes {
    pub const INVALID_JSON: &str = "invalid_json";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_AUTHENTICATED: &str = "not_authenticated";
    pub const TOKEN_NOT_VALID: &str = "token_not_valid";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const METHOD_NOT_ALLOWED: &str = "method_not_allowed";
    pub const INTERNAL_ERROR: &str = "internal_error";
}
