use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::strategy::{Strategy, Weights};

pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Operator-tunable selection and failover settings.
///
/// Serializes to the persisted settings blob:
///
/// ```json
/// {
///   "strategy": "balanced",
///   "failoverEnabled": true,
///   "weights": { "latency": 40.0, "reliability": 30.0, "load": 20.0, "geo": 10.0 },
///   "failureThreshold": 3,
///   "checkInterval": 60,
///   "notifyFailover": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorSettings {
    pub strategy: Strategy,
    pub failover_enabled: bool,
    pub weights: Weights,
    /// Consecutive failures of the current node before a failover is
    /// attempted. Always >= 1.
    pub failure_threshold: u32,
    /// Seconds between health-check ticks.
    pub check_interval: u64,
    pub notify_failover: bool,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            strategy: Strategy::Balanced,
            failover_enabled: true,
            weights: Strategy::Balanced.preset(),
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            check_interval: DEFAULT_CHECK_INTERVAL_SECS,
            notify_failover: true,
        }
    }
}

impl SelectorSettings {
    /// Clamps out-of-range values. Applied to everything read from a store.
    pub fn sanitized(mut self) -> Self {
        self.failure_threshold = self.failure_threshold.max(1);
        self.check_interval = self.check_interval.max(1);
        self
    }
}

/// Where the operator's settings survive process restarts.
///
/// `load` returning `Ok(None)` means nothing was persisted yet. The engine
/// treats any `Err` as "use the defaults" and logs a warning; stores never
/// crash the selector.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<Option<SelectorSettings>>;
    fn save(&self, settings: &SelectorSettings) -> Result<()>;
}

/// JSON file-backed store.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<Option<SelectorSettings>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let settings: SelectorSettings = serde_json::from_str(&raw)?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &SelectorSettings) -> Result<()> {
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Option<SelectorSettings>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<SelectorSettings>> {
        Ok(self.inner.lock().clone())
    }

    fn save(&self, settings: &SelectorSettings) -> Result<()> {
        *self.inner.lock() = Some(settings.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SelectorSettings::default();
        assert_eq!(settings.strategy, Strategy::Balanced);
        assert!(settings.failover_enabled);
        assert_eq!(settings.weights, Strategy::Balanced.preset());
        assert_eq!(settings.failure_threshold, 3);
        assert_eq!(settings.check_interval, 60);
        assert!(settings.notify_failover);
    }

    #[test]
    fn test_blob_field_names() {
        let blob = serde_json::to_value(SelectorSettings::default()).unwrap();
        let obj = blob.as_object().unwrap();
        for field in [
            "strategy",
            "failoverEnabled",
            "weights",
            "failureThreshold",
            "checkInterval",
            "notifyFailover",
        ] {
            assert!(obj.contains_key(field), "missing field {}", field);
        }
        assert_eq!(blob["strategy"], "balanced");
        assert_eq!(blob["weights"]["latency"], 40.0);
    }

    #[test]
    fn test_blob_round_trip() {
        let mut settings = SelectorSettings::default();
        settings.strategy = Strategy::Fastest;
        settings.weights = Strategy::Fastest.preset();
        settings.failure_threshold = 5;
        settings.check_interval = 300;
        settings.notify_failover = false;

        let raw = serde_json::to_string(&settings).unwrap();
        let parsed: SelectorSettings = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_blob_fills_defaults() {
        // older blobs may miss fields; serde(default) fills them in
        let parsed: SelectorSettings =
            serde_json::from_str(r#"{"strategy":"reliable"}"#).unwrap();
        assert_eq!(parsed.strategy, Strategy::Reliable);
        assert_eq!(parsed.failure_threshold, 3);
        assert!(parsed.failover_enabled);
    }

    #[test]
    fn test_sanitized_clamps_threshold() {
        let mut settings = SelectorSettings::default();
        settings.failure_threshold = 0;
        settings.check_interval = 0;
        let settings = settings.sanitized();
        assert_eq!(settings.failure_threshold, 1);
        assert_eq!(settings.check_interval, 1);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        let mut settings = SelectorSettings::default();
        settings.failure_threshold = 2;
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("settings.json"));
        assert!(store.load().unwrap().is_none());

        let mut settings = SelectorSettings::default();
        settings.strategy = Strategy::LoadBalance;
        settings.weights = Strategy::LoadBalance.preset();
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn test_file_store_malformed_blob_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();

        let store = JsonFileStore::new(path);
        // the store reports the error; the engine falls back to defaults
        assert!(store.load().is_err());
    }
}
