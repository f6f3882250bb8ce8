use serde_json::Value as JsonValue;
use url::Url;
use validator::ValidationError;

/// Validates that a URL string is absolute: it must parse and carry a host.
/// Any scheme is accepted.
pub fn validate_url(url_str: &str) -> Result<(), ValidationError> {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.host().is_none() {
                let mut err = ValidationError::new("url_host");
                err.message = Some("URL must have a scheme and host".into());
                return Err(err);
            }

            Ok(())
        }
        Err(_) => Err(ValidationError::new("Invalid URL format")),
    }
}

/// Validates that a custom short code is non-empty and ASCII alphanumeric
pub fn validate_custom_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() {
        let mut err = ValidationError::new("custom_code_length");
        err.message = Some("Custom shortcode cannot be empty".into());
        return Err(err);
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("custom_code_charset");
        err.message = Some("Custom shortcode can only contain letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Reads a validity window in minutes.
///
/// Absent or `null` yields `default`. A positive integer, given either as a
/// JSON number or as a string holding one, is accepted as long as it fits in
/// a `u32`. Everything else is rejected.
pub fn parse_validity_minutes(
    raw: Option<&JsonValue>,
    default: u32,
) -> Result<u32, ValidationError> {
    let minutes = match raw {
        None | Some(JsonValue::Null) => return Ok(default),
        Some(JsonValue::Number(n)) => n.as_u64(),
        Some(JsonValue::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match minutes.and_then(|m| u32::try_from(m).ok()) {
        Some(m) if m > 0 => Ok(m),
        _ => {
            let mut err = ValidationError::new("validity_minutes");
            err.message = Some("Validity must be a positive whole number of minutes".into());
            Err(err)
        }
    }
}
