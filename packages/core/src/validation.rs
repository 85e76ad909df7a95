use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Key under which messages that do not belong to a single field are filed.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

pub const USERNAME_MAX_LEN: usize = 150;
pub const TITLE_MAX_LEN: usize = 200;
pub const SLUG_MAX_LEN: usize = 50;

/// A single field failing validation.
///
/// The `Display` text is the user-facing message placed in the error body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("This field is required.")]
    Required,

    #[error("This field may not be blank.")]
    Blank,

    #[error("This field may not be null.")]
    Null,

    #[error("Ensure this field has no more than {0} characters.")]
    TooLong(usize),

    #[error("Enter a valid \"slug\" consisting of letters, numbers, underscores or hyphens.")]
    InvalidSlug,

    #[error(
        "Enter a valid username. This value may contain only letters, numbers, \
         and @/./+/-/_ characters."
    )]
    InvalidUsername,
}

/// Accumulates validation messages per field, so a response can report every
/// problem at once instead of the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding one message for one field.
    pub fn single(field: &str, message: impl std::fmt::Display) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// A set holding one message that is not tied to a field.
    pub fn non_field(message: impl std::fmt::Display) -> Self {
        Self::single(NON_FIELD_ERRORS, message)
    }

    pub fn add(&mut self, field: &str, message: impl std::fmt::Display) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    /// Record the error of `result` under `field`, returning the value on
    /// success.
    pub fn check<T>(&mut self, field: &str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.add(field, e);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                if field == NON_FIELD_ERRORS {
                    f.write_str(message)?;
                } else {
                    write!(f, "{field}: {message}")?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

/// Unwrap a required input value.
pub fn require<T>(value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or(ValidationError::Required)
}

/// Post and comment bodies: anything except an empty or whitespace-only string.
pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::Blank);
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::Blank);
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(ValidationError::TooLong(USERNAME_MAX_LEN));
    }
    if !USERNAME_RE.is_match(username) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    validate_text(title)?;
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(ValidationError::TooLong(TITLE_MAX_LEN));
    }
    Ok(())
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.is_empty() {
        return Err(ValidationError::Blank);
    }
    if slug.chars().count() > SLUG_MAX_LEN {
        return Err(ValidationError::TooLong(SLUG_MAX_LEN));
    }
    if !SLUG_RE.is_match(slug) {
        return Err(ValidationError::InvalidSlug);
    }
    Ok(())
}

/// `^[\w.@+-]+$` (Unicode word characters)
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("invalid username regex"));

/// `^[-a-zA-Z0-9_]+$`
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("invalid slug regex"));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(validate_text(""), Err(ValidationError::Blank));
        assert_eq!(validate_text("   \n"), Err(ValidationError::Blank));
        assert_eq!(validate_text("hello"), Ok(()));
    }

    #[test]
    fn usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.l+i-c_e@x").is_ok());
        assert_eq!(validate_username("al ice"), Err(ValidationError::InvalidUsername));
        assert_eq!(validate_username(""), Err(ValidationError::Blank));
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        assert_eq!(
            validate_username(&long),
            Err(ValidationError::TooLong(USERNAME_MAX_LEN))
        );
    }

    #[test]
    fn slugs() {
        assert!(validate_slug("rust-lang_2024").is_ok());
        assert_eq!(validate_slug("no spaces"), Err(ValidationError::InvalidSlug));
        assert_eq!(validate_slug("кириллица"), Err(ValidationError::InvalidSlug));
    }

    #[test]
    fn titles() {
        assert!(validate_title("Cats").is_ok());
        assert_eq!(validate_title(" "), Err(ValidationError::Blank));
        let long = "t".repeat(TITLE_MAX_LEN + 1);
        assert_eq!(validate_title(&long), Err(ValidationError::TooLong(TITLE_MAX_LEN)));
    }

    #[test]
    fn field_errors_collect_per_field() {
        let mut errors = FieldErrors::new();
        assert!(errors.check("text", validate_text("ok")).is_some());
        assert!(errors.check::<String>("text", require(None)).is_none());
        errors.add(NON_FIELD_ERRORS, "You cannot follow yourself.");

        assert_eq!(errors.get("text"), Some(&["This field is required.".to_string()][..]));
        assert_eq!(
            errors.to_string(),
            "You cannot follow yourself.; text: This field is required."
        );
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn empty_field_errors_are_ok() {
        assert_eq!(FieldErrors::new().into_result(), Ok(()));
    }
}
