use std::io::Error as IoError;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub mod config;
pub mod registry;
pub mod shorten;
pub mod store;

pub use config::ConfigError;
pub use registry::RegistryError;
pub use shorten::ShortenError;
pub use store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    // Service-level domain errors
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Conflict error: {0}")]
    Conflict(String),
    #[error("Not found error: {0}")]
    NotFound(String),
    #[error("Expired error: {0}")]
    Expired(String),
    #[error("Internal error: {0}")]
    Internal(String),
    // Infrastructure/system errors
    #[error("Server error: {0}")]
    Server(#[from] IoError),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Logger error: {0}")]
    Logger(String),
}

impl AppError {
    fn error_type(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION ERROR",
            AppError::Conflict(_) => "CONFLICT ERROR",
            AppError::NotFound(_) => "NOT FOUND ERROR",
            AppError::Expired(_) => "EXPIRED ERROR",
            AppError::Internal(_) => "INTERNAL ERROR",
            AppError::Server(_) => "SERVER ERROR",
            AppError::Config(_) => "CONFIGURATION ERROR",
            AppError::Logger(_) => "LOGGER ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::Expired(msg)
            | AppError::Internal(msg)
            | AppError::Config(msg)
            | AppError::Logger(msg) => msg.clone(),
            AppError::Server(e) => e.to_string(),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => AppError::NotFound(err.to_string()),
            RegistryError::DuplicateCode(_) => AppError::Conflict(err.to_string()),
        }
    }
}

impl From<ShortenError> for AppError {
    fn from(err: ShortenError) -> Self {
        match err {
            ShortenError::CodeTaken(_) => AppError::Conflict(err.to_string()),
            ShortenError::GenerationExhausted(_) => AppError::Internal(err.to_string()),
            ShortenError::InvalidUrl(_)
            | ShortenError::InvalidValidity(_)
            | ShortenError::InvalidCodeFormat(_) => AppError::Validation(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Flatten field errors into a single string
        let message = errors
            .field_errors()
            .iter()
            .map(|(field, errs)| {
                let reasons = errs
                    .iter()
                    .map(|e| e.message.clone().unwrap_or_else(|| "invalid".into()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}: {}", field, reasons)
            })
            .collect::<Vec<_>>()
            .join("; ");
        AppError::Validation(message)
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Expired(_) => StatusCode::GONE,
            AppError::Internal(_)
            | AppError::Server(_)
            | AppError::Config(_)
            | AppError::Logger(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.message();
        let message = if message.is_empty() {
            "An error occurred".to_string()
        } else {
            message
        };

        let code = self.status_code().as_u16();
        HttpResponse::build(self.status_code()).json(json!({
            "type": self.error_type(),
            "message": message,
            "status_code": code,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_errors_map_to_status() {
        let err = AppError::from(ShortenError::InvalidUrl("nope".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = AppError::from(ShortenError::CodeTaken("abc123".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err = AppError::from(ShortenError::GenerationExhausted(10));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_registry_not_found_keeps_message() {
        let err = AppError::from(RegistryError::NotFound("zzz".into()));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.message(), "No alias with short code 'zzz'");
    }

    #[test]
    fn test_message_with_colon_is_not_split() {
        let err = AppError::from(ShortenError::InvalidUrl("http//bad".into()));
        assert_eq!(err.message(), "Invalid URL format for: http//bad");
        assert_eq!(err.error_type(), "VALIDATION ERROR");
    }

    #[test]
    fn test_code_format_message_names_the_code() {
        let err = AppError::from(ShortenError::InvalidCodeFormat("ab-c!".into()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Custom shortcode must be alphanumeric: ab-c!");
    }
}
