use std::{
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Arc,
};

use log::{debug, info, warn};
use parking_lot::Mutex;

#[cfg(test)]
use mockall::automock;

use crate::config::{StoreBackend, StoreConfig};
use crate::errors::StoreError;
use crate::models::AliasRecord;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent home of the alias snapshot. The registry loads it once at
/// startup and saves the full snapshot after every mutation.
#[cfg_attr(test, automock)]
pub trait AliasStore: Send + Sync {
    /// Reads every stored record, in insertion order
    fn load(&self) -> StoreResult<Vec<AliasRecord>>;

    /// Replaces the stored snapshot with `records`
    fn save(&self, records: &[AliasRecord]) -> StoreResult<()>;
}

/// Build the store selected by configuration
pub fn connect(config: &StoreConfig) -> Arc<dyn AliasStore> {
    match config.backend {
        StoreBackend::File => {
            info!("Using JSON file store at {}", config.path.display());
            Arc::new(JsonFileStore::new(&config.path))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store, aliases will not survive a restart");
            Arc::new(MemoryStore::default())
        }
    }
}

/// Keeps the snapshot as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "aliases.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn corrupt_path(&self) -> PathBuf {
        self.sibling_path(".corrupt")
    }
}

impl AliasStore for JsonFileStore {
    fn load(&self) -> StoreResult<Vec<AliasRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Store file {} does not exist yet", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                // Keep the unreadable snapshot aside so the next save cannot clobber it
                let aside = self.corrupt_path();
                match fs::rename(&self.path, &aside) {
                    Ok(()) => warn!("Moved unreadable store file to {}", aside.display()),
                    Err(re) => warn!(
                        "Could not move unreadable store file {}: {}",
                        self.path.display(),
                        re
                    ),
                }
                Err(e.into())
            }
        }
    }

    fn save(&self, records: &[AliasRecord]) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec(records)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} aliases to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Holds the last saved snapshot in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<AliasRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<AliasRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

impl AliasStore for MemoryStore {
    fn load(&self) -> StoreResult<Vec<AliasRecord>> {
        Ok(self.records.lock().clone())
    }

    fn save(&self, records: &[AliasRecord]) -> StoreResult<()> {
        *self.records.lock() = records.to_vec();
        Ok(())
    }
}
