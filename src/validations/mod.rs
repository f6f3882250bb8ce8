mod alias;

pub use alias::{parse_validity_minutes, validate_custom_code, validate_url};
