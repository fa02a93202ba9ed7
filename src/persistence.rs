//! Durable layout state
//!
//! This module defines the key-value [`Backend`] trait the engine persists
//! through, two backends, and [`PersistenceStore`], which maps the engine's
//! position and viewport records onto backend keys.
//!
//! Storage problems never reach the caller: the store logs them and behaves
//! as if the record were absent, so a broken disk costs the saved layout and
//! nothing else.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::viewport::{ViewKind, Viewport};

/// Errors that can occur while reading or writing a backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backend refused the operation
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Result type for backend operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Saved position of one node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersistedPosition {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub pinned: bool,
}

impl PersistedPosition {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Saved positions keyed by node ID
pub type PositionMap = BTreeMap<String, PersistedPosition>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewportState {
    pan_x: f32,
    pan_y: f32,
    zoom: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ViewportRecord {
    viewport: ViewportState,
}

/// A string key-value store
///
/// Backends are responsible for:
/// - Returning `Ok(None)` for keys that were never written
/// - Replacing a key's value atomically where the medium allows it
pub trait Backend {
    /// Read the value stored under `key`
    fn read(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn write(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-memory backend, for hosts without durable storage and for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir` (created lazily on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' => '_',
                c => c,
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> StoreResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Reads and writes the engine's durable records through a [`Backend`]
///
/// Keys are namespaced so several graphs can share one backend:
/// `<ns>.positions` and `<ns>.viewport.<view>`.
pub struct PersistenceStore {
    backend: Box<dyn Backend>,
    namespace: String,
}

impl PersistenceStore {
    pub fn new(backend: Box<dyn Backend>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            namespace: namespace.into(),
        }
    }

    /// Store backed by memory only
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), "graph")
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Key holding the position map
    pub fn positions_key(&self) -> String {
        format!("{}.positions", self.namespace)
    }

    /// Key holding the viewport record for `view`
    pub fn viewport_key(&self, view: ViewKind) -> String {
        format!("{}.viewport.{}", self.namespace, view.as_str())
    }

    /// Load saved node positions
    ///
    /// Returns `None` when nothing is stored or the record is unreadable.
    /// Individual malformed entries are dropped; the rest are kept.
    pub fn load_positions(&self) -> Option<PositionMap> {
        let raw = self.read_logged(&self.positions_key())?;
        let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(key = %self.positions_key(), error = %e, "ignoring malformed position map");
                return None;
            }
        };

        let positions = entries
            .into_iter()
            .filter_map(
                |(id, value)| match serde_json::from_value::<PersistedPosition>(value) {
                    Ok(p) if p.is_finite() => Some((id, p)),
                    Ok(_) => {
                        debug!(%id, "dropping non-finite saved position");
                        None
                    }
                    Err(e) => {
                        debug!(%id, error = %e, "dropping malformed saved position");
                        None
                    }
                },
            )
            .collect();
        Some(positions)
    }

    /// Save the full position map, replacing the previous one
    ///
    /// Returns whether the write reached the backend.
    pub fn save_positions(&mut self, positions: &PositionMap) -> bool {
        let key = self.positions_key();
        self.write_logged(&key, positions)
    }

    /// Load the saved viewport for `view`, clamped to that view's zoom range
    pub fn load_viewport(&self, view: ViewKind) -> Option<Viewport> {
        let key = self.viewport_key(view);
        let raw = self.read_logged(&key)?;
        let record: ViewportRecord = match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                warn!(%key, error = %e, "ignoring malformed viewport record");
                return None;
            }
        };
        let ViewportState { pan_x, pan_y, zoom } = record.viewport;
        if !(pan_x.is_finite() && pan_y.is_finite() && zoom.is_finite() && zoom > 0.0) {
            warn!(%key, "ignoring non-finite viewport record");
            return None;
        }
        Some(Viewport::with_state(view, pan_x, pan_y, zoom))
    }

    /// Save the viewport under its own view kind
    pub fn save_viewport(&mut self, viewport: &Viewport) -> bool {
        let key = self.viewport_key(viewport.kind());
        let record = ViewportRecord {
            viewport: ViewportState {
                pan_x: viewport.pan_x,
                pan_y: viewport.pan_y,
                zoom: viewport.zoom,
            },
        };
        self.write_logged(&key, &record)
    }

    fn read_logged(&self, key: &str) -> Option<String> {
        match self.backend.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(%key, error = %e, "failed to read layout state");
                None
            }
        }
    }

    fn write_logged<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string_pretty(value)
            .map_err(StoreError::from)
            .and_then(|json| self.backend.write(key, &json));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(%key, error = %e, "failed to write layout state");
                false
            }
        }
    }
}
