// src/services/shortener.rs - Business logic for creating aliases
use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use crate::config::ShortenerConfig;
use crate::errors::{RegistryError, ShortenError};
use crate::models::{AliasRecord, ShortenRequest};
use crate::repositories::AliasRegistry;
use crate::utils::id_generator::CodeGenerator;
use crate::validations::{parse_validity_minutes, validate_custom_code, validate_url};

type Result<T> = std::result::Result<T, ShortenError>;

/// Validates shorten batches and turns them into alias records, all or nothing
pub struct ShortenService {
    registry: Arc<AliasRegistry>,
    generator: Arc<dyn CodeGenerator>,
    origin: String,
    default_validity_minutes: u32,
    max_generation_attempts: usize,
}

impl ShortenService {
    pub fn new(
        registry: Arc<AliasRegistry>,
        generator: Arc<dyn CodeGenerator>,
        settings: &ShortenerConfig,
    ) -> Self {
        Self {
            registry,
            generator,
            origin: settings.base_url.trim_end_matches('/').to_string(),
            default_validity_minutes: settings.default_validity_minutes,
            max_generation_attempts: settings.max_generation_attempts,
        }
    }

    /// Processes a batch stamped with the current time
    pub fn process(&self, batch: &[ShortenRequest]) -> Result<Vec<AliasRecord>> {
        self.process_at(batch, Utc::now())
    }

    /// Validates every request in order and, if all pass, registers the new
    /// records in one step. Blank URLs are skipped. The first failure aborts
    /// the batch and nothing is written.
    pub fn process_at(
        &self,
        batch: &[ShortenRequest],
        now: DateTime<Utc>,
    ) -> Result<Vec<AliasRecord>> {
        let mut assigned: HashSet<String> = HashSet::new();
        let mut records = Vec::with_capacity(batch.len());

        for request in batch {
            let url = request.url.trim();
            if url.is_empty() {
                continue;
            }

            if validate_url(url).is_err() {
                return Err(ShortenError::InvalidUrl(url.to_string()));
            }

            let validity_minutes =
                parse_validity_minutes(request.validity_minutes.as_ref(), self.default_validity_minutes)
                    .map_err(|_| ShortenError::InvalidValidity(url.to_string()))?;

            let custom_code = request
                .custom_code
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty());

            let short_code = match custom_code {
                Some(code) => self.claim_custom_code(code, &assigned)?,
                None => self.generate_free_code(&assigned)?,
            };

            assigned.insert(short_code.clone());
            records.push(AliasRecord::new(
                url.to_string(),
                short_code,
                &self.origin,
                now,
                validity_minutes,
            ));
        }

        // Another batch may have claimed a code since validation ran
        self.registry
            .create_all(records.clone())
            .map_err(|e| match e {
                RegistryError::DuplicateCode(code) | RegistryError::NotFound(code) => {
                    warn!("Short code '{}' was claimed concurrently", code);
                    ShortenError::CodeTaken(code)
                }
            })?;

        info!("Created {} aliases", records.len());
        Ok(records)
    }

    fn claim_custom_code(&self, code: &str, assigned: &HashSet<String>) -> Result<String> {
        if validate_custom_code(code).is_err() {
            return Err(ShortenError::InvalidCodeFormat(code.to_string()));
        }

        if assigned.contains(code) || self.registry.exists(code) {
            return Err(ShortenError::CodeTaken(code.to_string()));
        }

        Ok(code.to_string())
    }

    fn generate_free_code(&self, assigned: &HashSet<String>) -> Result<String> {
        for attempt in 1..=self.max_generation_attempts {
            let candidate = self.generator.generate();
            if !assigned.contains(&candidate) && !self.registry.exists(&candidate) {
                if attempt > 1 {
                    debug!("Found free short code after {} attempts", attempt);
                }
                return Ok(candidate);
            }
        }

        Err(ShortenError::GenerationExhausted(
            self.max_generation_attempts,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockall::Sequence;
    use serde_json::json;

    use crate::store::MemoryStore;
    use crate::utils::id_generator::{MockCodeGenerator, RandomCodeGenerator};

    fn settings() -> ShortenerConfig {
        ShortenerConfig {
            base_url: "http://sho.rt/".into(),
            ..ShortenerConfig::default()
        }
    }

    fn registry() -> Arc<AliasRegistry> {
        Arc::new(AliasRegistry::load(Arc::new(MemoryStore::default())))
    }

    fn random_service(registry: Arc<AliasRegistry>) -> ShortenService {
        ShortenService::new(registry, Arc::new(RandomCodeGenerator::default()), &settings())
    }

    fn request(url: &str) -> ShortenRequest {
        ShortenRequest {
            url: url.into(),
            ..Default::default()
        }
    }

    fn with_code(url: &str, code: &str) -> ShortenRequest {
        ShortenRequest {
            custom_code: Some(code.into()),
            ..request(url)
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_single_generated_alias() {
        let registry = registry();
        let service = random_service(registry.clone());

        let batch = [ShortenRequest {
            validity_minutes: Some(json!(30)),
            ..request("https://example.com")
        }];
        let created = service.process_at(&batch, now()).unwrap();

        assert_eq!(created.len(), 1);
        let record = &created[0];
        assert_eq!(record.original_url, "https://example.com");
        assert_eq!(record.short_code.len(), 6);
        assert!(record.short_code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(record.short_url, format!("http://sho.rt/{}", record.short_code));
        assert_eq!(record.click_count, 0);
        assert_eq!(record.created_at, now());
        assert_eq!(
            (record.expires_at - record.created_at).num_milliseconds(),
            30 * 60_000
        );
        assert!(registry.exists(&record.short_code));
    }

    #[test]
    fn test_default_validity_applies() {
        let service = random_service(registry());
        let created = service.process_at(&[request("https://a.io")], now()).unwrap();
        assert_eq!((created[0].expires_at - created[0].created_at).num_minutes(), 30);
    }

    #[test]
    fn test_blank_urls_are_skipped_and_order_kept() {
        let service = random_service(registry());
        let batch = [
            with_code("https://one.io", "first"),
            request("   "),
            with_code(" https://two.io ", "second"),
            request(""),
        ];

        let created = service.process_at(&batch, now()).unwrap();
        let codes: Vec<_> = created.iter().map(|r| r.short_code.as_str()).collect();
        assert_eq!(codes, ["first", "second"]);
        assert_eq!(created[1].original_url, "https://two.io");
    }

    #[test]
    fn test_custom_code_taken_in_registry() {
        let registry = registry();
        let service = random_service(registry.clone());
        service
            .process_at(&[with_code("https://example.com", "abc123")], now())
            .unwrap();

        let batch = [request("https://ok.io"), with_code("https://b.io", "abc123")];
        let err = service.process_at(&batch, now()).unwrap_err();

        assert_eq!(err, ShortenError::CodeTaken("abc123".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_custom_code_taken_within_batch() {
        let registry = registry();
        let service = random_service(registry.clone());

        let batch = [with_code("https://a.io", "same"), with_code("https://b.io", "same")];
        assert_eq!(
            service.process_at(&batch, now()).unwrap_err(),
            ShortenError::CodeTaken("same".into())
        );
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_invalid_request_aborts_whole_batch() {
        let registry = registry();
        let service = random_service(registry.clone());

        let batch = [request("https://valid.io"), request("not a url")];
        assert_eq!(
            service.process_at(&batch, now()).unwrap_err(),
            ShortenError::InvalidUrl("not a url".into())
        );
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_first_error_wins() {
        let service = random_service(registry());
        let batch = [
            ShortenRequest {
                validity_minutes: Some(json!("0")),
                ..request("https://a.io")
            },
            request("broken"),
        ];

        assert_eq!(
            service.process_at(&batch, now()).unwrap_err(),
            ShortenError::InvalidValidity("https://a.io".into())
        );
    }

    #[test]
    fn test_invalid_custom_code_format() {
        let service = random_service(registry());
        assert_eq!(
            service
                .process_at(&[with_code("https://a.io", "no-dash")], now())
                .unwrap_err(),
            ShortenError::InvalidCodeFormat("no-dash".into())
        );
    }

    #[test]
    fn test_blank_custom_code_generates() {
        let service = random_service(registry());
        let created = service
            .process_at(&[with_code("https://a.io", "  ")], now())
            .unwrap();
        assert_eq!(created[0].short_code.len(), 6);
    }

    #[test]
    fn test_generated_code_resamples_on_collision() {
        let registry = registry();
        let seed = random_service(registry.clone());
        seed.process_at(&[with_code("https://taken.io", "AAAAAA")], now())
            .unwrap();

        let mut generator = MockCodeGenerator::new();
        let mut seq = Sequence::new();
        // Registry collision, then a fresh code, then a repeat of that code
        // within the batch, then another fresh one.
        for code in ["AAAAAA", "BBBBBB", "BBBBBB", "CCCCCC"] {
            generator
                .expect_generate()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move || code.to_string());
        }

        let service = ShortenService::new(registry.clone(), Arc::new(generator), &settings());
        let created = service
            .process_at(&[request("https://a.io"), request("https://b.io")], now())
            .unwrap();

        let codes: Vec<_> = created.iter().map(|r| r.short_code.as_str()).collect();
        assert_eq!(codes, ["BBBBBB", "CCCCCC"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_generation_gives_up_after_cap() {
        let registry = registry();
        let seed = random_service(registry.clone());
        seed.process_at(&[with_code("https://taken.io", "stuck1")], now())
            .unwrap();

        let mut generator = MockCodeGenerator::new();
        generator
            .expect_generate()
            .times(4)
            .returning(|| "stuck1".to_string());

        let config = ShortenerConfig {
            max_generation_attempts: 4,
            ..settings()
        };
        let service = ShortenService::new(registry.clone(), Arc::new(generator), &config);

        assert_eq!(
            service.process_at(&[request("https://a.io")], now()).unwrap_err(),
            ShortenError::GenerationExhausted(4)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_code_claimed_after_validation_aborts_batch() {
        let registry = registry();

        // Another writer takes "raced" while the batch is still being validated
        let racer = registry.clone();
        let mut generator = MockCodeGenerator::new();
        generator.expect_generate().times(1).returning(move || {
            racer
                .create(AliasRecord::new(
                    "https://other.io".into(),
                    "raced".into(),
                    "http://sho.rt",
                    now(),
                    30,
                ))
                .unwrap();
            "fresh1".to_string()
        });

        let service = ShortenService::new(registry.clone(), Arc::new(generator), &settings());
        let batch = [with_code("https://a.io", "raced"), request("https://b.io")];

        assert_eq!(
            service.process_at(&batch, now()).unwrap_err(),
            ShortenError::CodeTaken("raced".into())
        );
        assert_eq!(registry.len(), 1);
        assert!(!registry.exists("fresh1"));
        assert_eq!(registry.find_by_code("raced").unwrap().original_url, "https://other.io");
    }

    #[test]
    fn test_empty_batch_creates_nothing() {
        let registry = registry();
        let service = random_service(registry.clone());
        assert!(service.process_at(&[], now()).unwrap().is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_codes_unique_across_large_batches() {
        let registry = registry();
        let service = random_service(registry.clone());

        let batch: Vec<_> = (0..50)
            .map(|i| request(&format!("https://example.com/{}", i)))
            .collect();
        let created = service.process(&batch).unwrap();

        let distinct: HashSet<_> = created.iter().map(|r| r.short_code.clone()).collect();
        assert_eq!(distinct.len(), 50);
        assert_eq!(registry.len(), 50);
    }
}
