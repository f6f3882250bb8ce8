use thiserror::Error;

/// Validation failures for a shorten batch. The first one encountered aborts
/// the whole batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShortenError {
    #[error("Invalid URL format for: {0}")]
    InvalidUrl(String),

    #[error("Validity must be a positive number for: {0}")]
    InvalidValidity(String),

    #[error("Custom shortcode must be alphanumeric: {0}")]
    InvalidCodeFormat(String),

    #[error("Shortcode \"{0}\" is already taken.")]
    CodeTaken(String),

    #[error("Failed to generate a unique short code after {0} attempts")]
    GenerationExhausted(usize),
}
