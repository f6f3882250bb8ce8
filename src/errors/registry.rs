use thiserror::Error;

/// Errors raised by the alias registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A record with this short code already exists
    #[error("Short code '{0}' already exists")]
    DuplicateCode(String),

    /// No record carries this short code
    #[error("No alias with short code '{0}'")]
    NotFound(String),
}
