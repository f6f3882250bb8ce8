// src/services/resolver.rs - Turns inbound short paths into redirects
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::errors::RegistryError;
use crate::models::{AliasRecord, ClickEvent};
use crate::repositories::AliasRegistry;

/// What an inbound short path resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The alias exists; a click has already been recorded
    Redirect(String),
    /// No alias carries this code
    NotFound,
    /// The alias exists but its window has closed. Only produced when expiry
    /// is enforced; no click is recorded.
    Expired {
        code: String,
        expired_at: DateTime<Utc>,
    },
}

pub struct RedirectResolver {
    registry: Arc<AliasRegistry>,
    enforce_expiry: bool,
}

impl RedirectResolver {
    pub fn new(registry: Arc<AliasRegistry>, enforce_expiry: bool) -> Self {
        Self {
            registry,
            enforce_expiry,
        }
    }

    /// Resolves `path` (with or without its leading `/`) at `now`.
    ///
    /// On `Redirect` the click `{now, referrer or "Direct"}` is recorded before
    /// the outcome is returned.
    pub fn resolve(
        &self,
        path: &str,
        referrer: Option<&str>,
        now: DateTime<Utc>,
    ) -> ResolutionOutcome {
        let code = path.strip_prefix('/').unwrap_or(path);
        if code.is_empty() {
            return ResolutionOutcome::NotFound;
        }

        let Some(record) = self.registry.find_by_code(code) else {
            debug!("No alias for code '{}'", code);
            return ResolutionOutcome::NotFound;
        };

        if self.enforce_expiry && record.is_expired(now) {
            info!("Alias '{}' expired at {}", code, record.expires_at);
            return ResolutionOutcome::Expired {
                code: record.short_code,
                expired_at: record.expires_at,
            };
        }

        match self.registry.record_click(code, ClickEvent::new(now, referrer)) {
            Ok(updated) => {
                info!("Redirecting '{}' to '{}'", code, updated.original_url);
                ResolutionOutcome::Redirect(updated.original_url)
            }
            Err(_) => ResolutionOutcome::NotFound,
        }
    }

    /// Records a click without redirecting, returning the updated record.
    ///
    /// ### Errors
    /// * `RegistryError::NotFound` - If no alias carries this code
    pub fn register_click(
        &self,
        code: &str,
        referrer: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AliasRecord, RegistryError> {
        self.registry
            .record_click(code, ClickEvent::new(now, referrer))
    }
}
