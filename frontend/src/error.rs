use std::collections::BTreeMap;
use thiserror::Error;

use shared::PayloadValidationError;

/// Field name to user-facing message
pub type FieldErrors = BTreeMap<String, String>;

/// Errors surfaced by the form core. None of them are fatal to the host
/// application; every variant leaves the draft in a retryable state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("Reference lookup failed: {0}")]
    ReferenceFetch(String),

    #[error("Please complete the required fields")]
    StepValidation(FieldErrors),

    #[error("Some fields have invalid values")]
    FormatValidation(FieldErrors),

    #[error("Submission failed: {0}")]
    SubmissionRejected(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Field '{0}' is not a list field")]
    NotAListField(String),

    #[error("Field '{0}' holds a list and cannot be set as a single value")]
    NotAScalarField(String),

    #[error("Could not count existing records: {0}")]
    CountUnavailable(String),

    #[error("Missing parent link {0}")]
    MissingLinkage(&'static str),

    #[error("Submit is only available on the last step")]
    NotOnLastStep,

    #[error("The form has already been closed")]
    ModalClosed,

    #[error("You are not signed in")]
    NotAuthenticated,

    #[error("Invalid record: {0}")]
    Payload(#[from] PayloadValidationError),
}

impl FormError {
    /// Per-field messages carried by validation failures
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            FormError::StepValidation(errors) | FormError::FormatValidation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Failures inside the HTTP client
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}
