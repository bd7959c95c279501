//! Persisted Preference Store
//!
//! A small typed key/value store standing in for the host's profile
//! preferences. Writes are grouped into a [`PrefBatch`] so that related
//! keys (e.g. a payload and its timestamp) land together or not at all.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Preference store errors
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("Preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A single stored preference value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrefValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PrefValue {
    fn from(value: bool) -> Self {
        PrefValue::Bool(value)
    }
}

impl From<i64> for PrefValue {
    fn from(value: i64) -> Self {
        PrefValue::Int(value)
    }
}

impl From<String> for PrefValue {
    fn from(value: String) -> Self {
        PrefValue::Text(value)
    }
}

impl From<&str> for PrefValue {
    fn from(value: &str) -> Self {
        PrefValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PrefOp {
    Set(String, PrefValue),
    Remove(String),
}

/// Ordered group of writes applied atomically
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefBatch {
    ops: Vec<PrefOp>,
}

impl PrefBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        self.ops.push(PrefOp::Set(key.into(), value.into()));
        self
    }

    pub fn remove(mut self, key: impl Into<String>) -> Self {
        self.ops.push(PrefOp::Remove(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    fn apply_to<M: PrefMap>(self, map: &mut M) {
        for op in self.ops {
            match op {
                PrefOp::Set(key, value) => map.put(key, value),
                PrefOp::Remove(key) => map.delete(&key),
            }
        }
    }
}

trait PrefMap {
    fn put(&mut self, key: String, value: PrefValue);
    fn delete(&mut self, key: &str);
}

impl PrefMap for HashMap<String, PrefValue> {
    fn put(&mut self, key: String, value: PrefValue) {
        self.insert(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.remove(key);
    }
}

impl PrefMap for BTreeMap<String, PrefValue> {
    fn put(&mut self, key: String, value: PrefValue) {
        self.insert(key, value);
    }

    fn delete(&mut self, key: &str) {
        self.remove(key);
    }
}

/// Preference store trait
#[trait_variant::make(PreferenceStore: Send)]
pub trait LocalPreferenceStore {
    /// Read a single key
    async fn get(&self, key: &str) -> Result<Option<PrefValue>, PrefsError>;

    /// Apply every write in `batch`, durably, as one unit
    async fn commit(&self, batch: PrefBatch) -> Result<(), PrefsError>;
}

/// In-memory store, for tests and hosts that persist elsewhere
#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: Mutex<HashMap<String, PrefValue>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> HashMap<String, PrefValue> {
        self.values.lock().clone()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<PrefValue>, PrefsError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn commit(&self, batch: PrefBatch) -> Result<(), PrefsError> {
        batch.apply_to(&mut *self.values.lock());
        Ok(())
    }
}

/// JSON file store that survives process restarts
///
/// Each commit rewrites the whole file through a temporary sibling and a
/// rename, so a crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    values: tokio::sync::Mutex<BTreeMap<String, PrefValue>>,
}

impl JsonFilePreferenceStore {
    /// Open (or lazily create) the store at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, PrefsError> {
        let path = path.as_ref().to_path_buf();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "Opened preference file");

        Ok(Self {
            path,
            values: tokio::sync::Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<PrefValue>, PrefsError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn commit(&self, batch: PrefBatch) -> Result<(), PrefsError> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut values = self.values.lock().await;
        let mut next = values.clone();
        batch.apply_to(&mut next);

        let bytes = serde_json::to_vec_pretty(&next)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        // Memory only moves forward once the file is on disk
        *values = next;
        Ok(())
    }
}
