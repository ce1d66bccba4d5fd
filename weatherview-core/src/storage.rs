//! Last-known coordinates, kept as two string entries (`latitude`, `longitude`).
//!
//! Entries are written when a position lookup succeeds and read on startup.
//! Nothing here ever deletes them.

use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{config::project_dirs, model::Coordinates};

pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";

/// String key/value store shared across sessions.
pub trait CoordinateStore: Send + Sync + Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Both entries present and numeric, else `None`.
pub fn load_coordinates(store: &dyn CoordinateStore) -> Option<Coordinates> {
    let latitude = store.get(LATITUDE_KEY)?.trim().parse::<f64>().ok()?;
    let longitude = store.get(LONGITUDE_KEY)?.trim().parse::<f64>().ok()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some(Coordinates::new(latitude, longitude))
}

pub fn save_coordinates(store: &dyn CoordinateStore, coords: Coordinates) -> Result<()> {
    store.set(LATITUDE_KEY, &coords.latitude.to_string())?;
    store.set(LONGITUDE_KEY, &coords.longitude.to_string())?;
    Ok(())
}

/// In-process store; forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_coordinates(coords: Coordinates) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(LATITUDE_KEY.into(), coords.latitude.to_string());
            entries.insert(LONGITUDE_KEY.into(), coords.longitude.to_string());
        }
        store
    }
}

impl CoordinateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Store backed by a small TOML file in the platform data directory.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/location.toml`.
    pub fn default_location() -> Result<Self> {
        Ok(Self::new(project_dirs()?.data_dir().join("location.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read location file: {}", self.path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse location file: {}", self.path.display()))
    }
}

impl CoordinateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        match self.read_entries() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                tracing::warn!("Ignoring unreadable location file: {e:#}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("location file lock poisoned"))?;

        // A corrupt file is replaced rather than blocking new writes.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(key.to_owned(), value.to_owned());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }
        let toml = toml::to_string(&entries).context("Failed to serialize location entries")?;
        fs::write(&self.path, toml)
            .with_context(|| format!("Failed to write location file: {}", self.path.display()))
    }
}
