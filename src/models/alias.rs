// src/models/alias.rs - Pure data structures
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::Validate;

/// Referrer recorded when the caller supplies none
pub const DIRECT_REFERRER: &str = "Direct";

/// One entry of a shorten batch, as submitted by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShortenRequest {
    /// The long URL to alias; blank entries are skipped
    #[serde(default)]
    pub url: String,

    /// Optional user-chosen short code
    #[serde(default)]
    pub custom_code: Option<String>,

    /// Validity in minutes, either a JSON number or a numeric string
    #[serde(default)]
    pub validity_minutes: Option<JsonValue>,
}

// DTO for submitting a batch of shorten requests
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenBatchDto {
    #[validate(length(min = 1, message = "At least one URL entry is required"))]
    pub urls: Vec<ShortenRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AliasQueryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A single resolution of an alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer_source: String,
}

impl ClickEvent {
    /// Builds an event, falling back to [`DIRECT_REFERRER`] for a missing or blank referrer
    pub fn new(timestamp: DateTime<Utc>, referrer: Option<&str>) -> Self {
        let referrer_source = referrer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DIRECT_REFERRER)
            .to_string();

        Self {
            timestamp,
            referrer_source,
        }
    }
}

/// Represents a shortened URL alias in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRecord {
    /// The original, long URL that was shortened
    pub original_url: String,

    /// The code that identifies this alias, unique across the registry
    pub short_code: String,

    /// Public URL of the alias, `<origin>/<short_code>`
    pub short_url: String,

    /// When this alias was created
    pub created_at: DateTime<Utc>,

    /// When this alias stops being valid
    pub expires_at: DateTime<Utc>,

    /// Number of recorded clicks, always equal to `click_events.len()`
    #[serde(default)]
    pub click_count: u64,

    /// Click history in the order the clicks were recorded
    #[serde(default)]
    pub click_events: Vec<ClickEvent>,
}

impl AliasRecord {
    /// Creates a fresh record with no clicks. `validity_minutes` must be positive.
    pub fn new(
        original_url: String,
        short_code: String,
        origin: &str,
        created_at: DateTime<Utc>,
        validity_minutes: u32,
    ) -> Self {
        let short_url = format!("{}/{}", origin.trim_end_matches('/'), short_code);

        Self {
            original_url,
            short_code,
            short_url,
            created_at,
            expires_at: created_at + Duration::minutes(i64::from(validity_minutes)),
            click_count: 0,
            click_events: Vec::new(),
        }
    }

    /// Checks if the alias has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Appends a click and bumps the counter in one step
    pub(crate) fn push_click(&mut self, event: ClickEvent) {
        self.click_events.push(event);
        self.click_count = self.click_events.len() as u64;
    }
}
