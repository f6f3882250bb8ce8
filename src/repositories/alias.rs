// src/repositories/alias.rs - Alias records and their persistence
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use log::{debug, warn};
use parking_lot::RwLock;

use crate::errors::RegistryError;
use crate::models::{AliasRecord, ClickEvent};
use crate::store::AliasStore;

type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Default)]
struct RegistryInner {
    /// Records in insertion order
    records: Vec<AliasRecord>,
    /// short code -> position in `records`
    index: HashMap<String, usize>,
}

impl RegistryInner {
    fn insert(&mut self, record: AliasRecord) {
        self.index
            .insert(record.short_code.clone(), self.records.len());
        self.records.push(record);
    }
}

/// Owns every alias record and enforces registry-wide uniqueness of short
/// codes. All mutations run under a single lock, and the snapshot is saved to
/// the store before the lock is released.
pub struct AliasRegistry {
    inner: RwLock<RegistryInner>,
    store: Arc<dyn AliasStore>,
}

impl AliasRegistry {
    /// Builds the registry from whatever the store holds. A failed load starts
    /// empty.
    pub fn load(store: Arc<dyn AliasStore>) -> Self {
        let loaded = store.load().unwrap_or_else(|e| {
            warn!("Failed to load aliases from store, starting empty: {}", e);
            Vec::new()
        });

        let mut inner = RegistryInner::default();
        for mut record in loaded {
            if inner.index.contains_key(&record.short_code) {
                warn!(
                    "Dropping stored alias with duplicate short code '{}'",
                    record.short_code
                );
                continue;
            }

            let clicks = record.click_events.len() as u64;
            if record.click_count != clicks {
                warn!(
                    "Alias '{}' stored click_count {} but {} click events, using {}",
                    record.short_code, record.click_count, clicks, clicks
                );
                record.click_count = clicks;
            }

            inner.insert(record);
        }

        debug!("Alias registry loaded with {} records", inner.records.len());

        Self {
            inner: RwLock::new(inner),
            store,
        }
    }

    /// True iff a record with this code exists
    pub fn exists(&self, code: &str) -> bool {
        self.inner.read().index.contains_key(code)
    }

    /// Inserts one record.
    ///
    /// ### Errors
    /// * `RegistryError::DuplicateCode` - If the code is already taken
    pub fn create(&self, record: AliasRecord) -> Result<()> {
        self.create_all(vec![record])
    }

    /// Inserts several records as one step: either all of them land or none do.
    ///
    /// ### Errors
    /// * `RegistryError::DuplicateCode` - If any code is already taken, or
    ///   appears twice in `records`
    pub fn create_all(&self, records: Vec<AliasRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write();

        let mut incoming = HashSet::with_capacity(records.len());
        for record in &records {
            let code = record.short_code.as_str();
            if inner.index.contains_key(code) || !incoming.insert(code) {
                return Err(RegistryError::DuplicateCode(code.to_string()));
            }
        }

        for record in records {
            debug!("Registering alias '{}'", record.short_code);
            inner.insert(record);
        }

        self.persist(&inner.records);
        Ok(())
    }

    pub fn find_by_code(&self, code: &str) -> Option<AliasRecord> {
        let inner = self.inner.read();
        inner.index.get(code).map(|&i| inner.records[i].clone())
    }

    /// Appends `event` to the record's history and bumps its click count,
    /// returning the updated record.
    ///
    /// ### Errors
    /// * `RegistryError::NotFound` - If no record has this code
    pub fn record_click(&self, code: &str, event: ClickEvent) -> Result<AliasRecord> {
        let mut inner = self.inner.write();

        let position = *inner
            .index
            .get(code)
            .ok_or_else(|| RegistryError::NotFound(code.to_string()))?;

        let record = &mut inner.records[position];
        record.push_click(event);
        let updated = record.clone();

        self.persist(&inner.records);
        Ok(updated)
    }

    /// Snapshot of every record in insertion order
    pub fn all_records(&self) -> Vec<AliasRecord> {
        self.inner.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    // Store failures cost durability only, so they are logged and swallowed
    fn persist(&self, records: &[AliasRecord]) {
        if let Err(e) = self.store.save(records) {
            warn!("Failed to save {} aliases to store: {}", records.len(), e);
        }
    }
}
