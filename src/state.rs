use crate::calendar::{validate_instance, EventInstance};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

// Maximum allowed size for state files to prevent DoS attacks (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
const MAX_ITEMS: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    LimitExceeded(String),
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),
    #[error("Invalid stored event: {0}")]
    InvalidRecord(String),
}

/// Durable home of the event collection.
///
/// `load` never fails: a missing slot and unreadable or malformed content
/// both come back as an empty collection.
pub trait EventStorage {
    fn load(&self) -> Vec<EventInstance>;
    fn save(&mut self, events: &[EventInstance]) -> Result<(), StorageError>;
}

/// Turns a storage key into a safe file stem.
pub fn slot_file_name(key: &str) -> Result<String, StorageError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    let stem: String = key
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect();
    let stem = stem.trim_start_matches('.');
    if stem.is_empty() {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(format!("{}.json", stem))
}

fn decode_events(json_value: serde_json::Value) -> Result<Vec<EventInstance>, StorageError> {
    // Count elements to prevent DoS attacks
    if let Some(array) = json_value.as_array() {
        if array.len() > MAX_ITEMS {
            return Err(StorageError::LimitExceeded(format!(
                "Too many items in storage (maximum {})",
                MAX_ITEMS
            )));
        }
    }
    let events: Vec<EventInstance> = serde_json::from_value(json_value)?;
    check_records(&events)?;
    Ok(events)
}

/// Stored records must each be valid and carry distinct ids.
fn check_records(events: &[EventInstance]) -> Result<(), StorageError> {
    let mut seen = HashSet::with_capacity(events.len());
    for event in events {
        validate_instance(event).map_err(|e| StorageError::InvalidRecord(e.to_string()))?;
        if !seen.insert(event.id.as_str()) {
            return Err(StorageError::InvalidRecord(format!("duplicate id '{}'", event.id)));
        }
    }
    Ok(())
}

fn check_item_count(events: &[EventInstance]) -> Result<(), StorageError> {
    if events.len() > MAX_ITEMS {
        return Err(StorageError::LimitExceeded(format!(
            "Refusing to store {} events (maximum {})",
            events.len(),
            MAX_ITEMS
        )));
    }
    Ok(())
}

/// One JSON file per storage key inside a state directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(state_dir: &Path, key: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(state_dir)?;
        let path = state_dir.join(slot_file_name(key)?);
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn try_load(&self) -> Result<Vec<EventInstance>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        // Check file size before loading to prevent DoS attacks
        let metadata = fs::metadata(&self.path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(StorageError::LimitExceeded("File size exceeds security limits".to_string()));
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let json_value: serde_json::Value = serde_json::from_reader(reader)?;
        decode_events(json_value)
    }
}

impl EventStorage for JsonFileStorage {
    fn load(&self) -> Vec<EventInstance> {
        match self.try_load() {
            Ok(events) => {
                debug!("Loaded {} events from {}", events.len(), self.path.display());
                events
            }
            Err(e) => {
                warn!("Ignoring unreadable event data in {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&mut self, events: &[EventInstance]) -> Result<(), StorageError> {
        check_item_count(events)?;
        // Write beside the slot and rename over it so a failed write keeps the last save.
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, events)?;
            writer.flush()?;
        }
        temp.persist(&self.path).map_err(|e| StorageError::Io(e.error))?;
        debug!("Saved {} events to {}", events.len(), self.path.display());
        Ok(())
    }
}

/// In-process key/value slots holding serialized collections.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    key: String,
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string(), slots: HashMap::new() }
    }

    /// Seeds the slot for `key` with raw content.
    pub fn with_slot(mut self, key: &str, raw: &str) -> Self {
        self.slots.insert(key.to_string(), raw.to_string());
        self
    }

    /// Raw serialized content of the active slot.
    pub fn raw(&self) -> Option<&str> {
        self.slots.get(&self.key).map(String::as_str)
    }
}

impl EventStorage for MemoryStorage {
    fn load(&self) -> Vec<EventInstance> {
        let Some(raw) = self.raw() else {
            return Vec::new();
        };
        match serde_json::from_str(raw).map_err(StorageError::from).and_then(decode_events) {
            Ok(events) => events,
            Err(e) => {
                warn!("Ignoring malformed event data in slot '{}': {}", self.key, e);
                Vec::new()
            }
        }
    }

    fn save(&mut self, events: &[EventInstance]) -> Result<(), StorageError> {
        check_item_count(events)?;
        let raw = serde_json::to_string(events)?;
        self.slots.insert(self.key.clone(), raw);
        Ok(())
    }
}
