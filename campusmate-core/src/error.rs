//! Error types for the Campusmate registry core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering catalog construction, enablement persistence, and parameter
//! form validation.

/// Top-level error type for the Campusmate core library.
#[derive(Debug, thiserror::Error)]
pub enum CampusError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Enablement error: {0}")]
    Enablement(#[from] EnablementError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Construction-time catalog invariant violations. These are fatal:
/// a malformed catalog must abort initialization rather than surface
/// at query time.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate command trigger: {trigger}")]
    DuplicateTrigger { trigger: String },

    #[error("Duplicate parameter '{param}' in command '{trigger}'")]
    DuplicateParam { trigger: String, param: String },

    #[error("Parameter '{param}' in command '{trigger}' requires non-empty options")]
    EmptyOptions { trigger: String, param: String },

    #[error("Parameter '{param}' in command '{trigger}' does not take options")]
    UnexpectedOptions { trigger: String, param: String },
}

/// Errors from reading the persisted plugin enablement record.
///
/// These are never propagated to suggestion rendering; the store recovers
/// with the configured fail policy and logs the failure.
#[derive(Debug, thiserror::Error)]
pub enum EnablementError {
    #[error("Failed to read enablement record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt enablement record: {message}")]
    Corrupt { message: String },
}

/// Errors from the parameter form state machine.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("Required parameter missing: {param}")]
    MissingRequired { param: String },

    #[error("Unknown parameter: {param}")]
    UnknownParam { param: String },

    #[error("Parameter '{param}' is not a tristate parameter")]
    NotTristate { param: String },

    #[error("Parameter '{param}' is a tristate parameter; use cycle_tristate")]
    Tristate { param: String },

    #[error("Unknown option '{option}' for parameter '{param}'")]
    UnknownOption { param: String, option: String },

    #[error("Invalid value for parameter '{param}': {reason}")]
    TypeMismatch { param: String, reason: String },

    #[error("Invalid form transition: {from} -> {to}")]
    InvalidState { from: &'static str, to: &'static str },
}

/// A type alias for results using the top-level `CampusError`.
pub type Result<T> = std::result::Result<T, CampusError>;
