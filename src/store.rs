use crate::{
    config::SessionConfig,
    error::{Result, StoreError},
    session::Phase,
    stats::Statistics,
};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use std::{
    cell::RefCell,
    collections::HashMap,
    fs, io,
    path::PathBuf,
    rc::Rc,
};

pub const SESSION_KEY: &str = "session";
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Raw key-value stores
// ============================================================================

/// Fallible string storage. Callers go through [`Persistence`], which turns
/// every failure into a logged degrade.
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// One pretty-printed JSON file per key inside a data directory.
#[derive(Clone, Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for JsonDirStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                key: key.into(),
                source,
            }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let io_err = |source| StoreError::Io {
            key: key.into(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io_err)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }
}

/// In-memory store. Clones share contents, and writes can be made to fail
/// to exercise the degrade path.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().entries.get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.inner
            .borrow_mut()
            .entries
            .insert(key.into(), value.into());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_writes {
            return Err(StoreError::ReadOnly);
        }
        inner.entries.insert(key.into(), value.into());
        inner.writes += 1;
        Ok(())
    }
}

// ============================================================================
// Persistence adapter
// ============================================================================

/// Typed, never-failing facade over a [`KeyValueStore`].
pub struct Persistence {
    store: Box<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    /// Returns `default` if the key is absent, unreadable, or malformed.
    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let raw = match self.store.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default,
            Err(e) => {
                warn!("Failed to read {key}, using defaults: {e}");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(source) => {
                let e = StoreError::Json {
                    key: key.into(),
                    source,
                };
                warn!("{e}; using defaults");
                default
            }
        }
    }

    /// Best effort. Returns whether the value reached the store.
    pub fn save<T: Serialize>(&mut self, key: &str, value: &T) -> bool {
        let raw = match serde_json::to_string_pretty(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize {key}: {e}");
                return false;
            }
        };

        match self.store.write(key, &raw) {
            Ok(()) => {
                debug!("Saved {key}");
                true
            }
            Err(e) => {
                warn!("Failed to save {key}, keeping state in memory only: {e}");
                false
            }
        }
    }
}

// ============================================================================
// Persisted record
// ============================================================================

/// On-disk shape of the session. Every field has a named default and unknown
/// fields are ignored, so older and newer files both load. A field holding a
/// value of the wrong shape falls back to its own default without taking the
/// rest of the record with it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    #[serde(default = "defaults::version", deserialize_with = "lenient")]
    pub version: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub config: SessionConfig,
    #[serde(default, deserialize_with = "lenient")]
    pub completed_today: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub current_streak: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub longest_streak: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub total_focus_minutes: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub cycle_position: u32,
    #[serde(default, deserialize_with = "lenient")]
    pub phase: Phase,
    #[serde(default, deserialize_with = "lenient")]
    pub last_reset_date_key: String,
    #[serde(default, deserialize_with = "lenient")]
    pub weekly_sessions: [u32; 7],
    #[serde(default, deserialize_with = "lenient")]
    pub week_key: String,
}

mod defaults {
    pub fn version() -> u32 {
        super::SCHEMA_VERSION
    }
}

/// Accepts any JSON value and keeps it only if it has the field's type.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        warn!("Discarding stored value {value}: {e}");
        T::default()
    }))
}

impl Default for PersistedRecord {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            config: SessionConfig::default(),
            completed_today: 0,
            current_streak: 0,
            longest_streak: 0,
            total_focus_minutes: 0,
            cycle_position: 0,
            phase: Phase::Work,
            last_reset_date_key: String::new(),
            weekly_sessions: [0; 7],
            week_key: String::new(),
        }
    }
}

impl PersistedRecord {
    pub fn new(config: &SessionConfig, stats: &Statistics, phase: Phase, cycle_position: u32) -> Self {
        Self {
            version: SCHEMA_VERSION,
            config: config.clone(),
            completed_today: stats.completed_today,
            current_streak: stats.current_streak,
            longest_streak: stats.longest_streak,
            total_focus_minutes: stats.total_focus_minutes,
            cycle_position,
            phase,
            last_reset_date_key: stats.last_reset_date_key.clone(),
            weekly_sessions: stats.weekly_sessions,
            week_key: stats.week_key.clone(),
        }
    }

    /// Repairs values that parse but break invariants.
    pub fn normalized(mut self) -> Self {
        if self.version > SCHEMA_VERSION {
            warn!(
                "Session record has schema version {}, newer than {}; reading best effort",
                self.version, SCHEMA_VERSION
            );
        }
        self.version = SCHEMA_VERSION;

        if let Err(e) = self.config.validate() {
            warn!("Stored config rejected ({e}); using defaults");
            self.config = SessionConfig::default();
        }

        let cycle = self.config.sessions_before_long_break;
        if self.cycle_position >= cycle {
            self.cycle_position = cycle - 1;
        }
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            completed_today: self.completed_today,
            current_streak: self.current_streak,
            longest_streak: self.longest_streak,
            total_focus_minutes: self.total_focus_minutes,
            weekly_sessions: self.weekly_sessions,
            last_reset_date_key: self.last_reset_date_key.clone(),
            week_key: self.week_key.clone(),
        }
    }
}
