use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::RegisterForm;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"));

/// Syntactic email check. Runs before any credential lookup so a malformed
/// identifier is reported as a field error, not an authentication failure.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// FieldError
///
/// One validation outcome for one form field. Each variant carries its own
/// user-facing message; the Display text is exactly what the form renders
/// next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("This field is required.")]
    Required,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Field must be equal to {0}")]
    Mismatch(&'static str),
    #[error("Email is already in use.")]
    EmailInUse,
    #[error("Username is already in use.")]
    UsernameInUse,
    #[error("Name is already in use.")]
    NameInUse,
}

/// Per-field validation results for one form submission. Field order is
/// preserved so errors render in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(&'static str, FieldError)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, error: FieldError) {
        self.errors.push((field, error));
    }

    /// First error recorded for `field`, if any.
    pub fn field(&self, field: &str) -> Option<&FieldError> {
        self.errors
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, error)| error)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(&'static str, FieldError)> {
        self.errors.iter()
    }
}

/// Presence check shared by the simple admin forms.
pub fn validate_presence(fields: &[(&'static str, &str)]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for &(name, value) in fields {
        if value.trim().is_empty() {
            errors.push(name, FieldError::Required);
        }
    }
    errors
}

/// Format-level validation of the registration form. Store-level uniqueness
/// errors are appended later by the registration flow, after the insert
/// attempt reports a constraint violation.
pub fn validate_registration(form: &RegisterForm) -> ValidationErrors {
    let mut errors = validate_presence(&[
        ("email", &form.email),
        ("username", &form.username),
        ("first_name", &form.first_name),
        ("last_name", &form.last_name),
        ("password", &form.password),
        ("confirm_password", &form.confirm_password),
    ]);

    if !form.email.trim().is_empty() && !is_valid_email(form.email.trim()) {
        errors.push("email", FieldError::InvalidEmail);
    }

    if form.password != form.confirm_password {
        errors.push("password", FieldError::Mismatch("confirm_password"));
    }

    errors
}
