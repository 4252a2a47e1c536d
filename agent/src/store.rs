use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::errors::StoreError;
use crate::model::{DeviceConfig, SensorData};

pub const KEY_IDENTITY: &str = "identity";
pub const KEY_ACTIVE_INTERVAL_MS: &str = "active_interval_ms";
pub const KEY_IDLE_INTERVAL_MS: &str = "idle_interval_ms";
pub const KEY_BATTERY_LOW_THRESHOLD: &str = "battery_low_threshold";
pub const KEY_FUEL_LOW_THRESHOLD: &str = "fuel_low_threshold";
pub const KEY_HUMIDITY_HIGH_THRESHOLD: &str = "humidity_high_threshold";
pub const KEY_SMOOTHING_ALPHA_FUEL: &str = "smoothing_alpha_fuel";
pub const KEY_SMOOTHING_ALPHA_BATTERY: &str = "smoothing_alpha_battery";
pub const KEY_ENABLED: &str = "enabled";
pub const KEY_MILEAGE: &str = "mileage";

const DEFAULT_IDENTITY: &str = "ZACNJBBB1LPL49421";
const DEFAULT_ACTIVE_INTERVAL_MS: u64 = 10_000;
const DEFAULT_IDLE_INTERVAL_MS: u64 = 1_800_000;
const DEFAULT_BATTERY_LOW_THRESHOLD: f64 = 11.5;
const DEFAULT_FUEL_LOW_THRESHOLD: f64 = 10.0;
const DEFAULT_HUMIDITY_HIGH_THRESHOLD: f64 = 80.0;
const DEFAULT_SMOOTHING_ALPHA_FUEL: f64 = 0.1;
const DEFAULT_SMOOTHING_ALPHA_BATTERY: f64 = 0.3;
const DEFAULT_MILEAGE: u64 = 120_000;

/// Durable key/value map. Reads fall back to a caller-supplied default when
/// the key is absent (first boot) or holds an unreadable value.
pub trait KvStore {
    fn get_value(&self, key: &str) -> Option<&Value>;
    fn put_value(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_value(key) {
            Some(value) => serde_json::from_value(value.clone()).unwrap_or(default),
            None => default,
        }
    }

    fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        self.put_value(key, serde_json::to_value(value)?)
    }
}

/// JSON-file backed store. Every write rewrites the whole map through a
/// temp file and rename, so a crash mid-write leaves the previous snapshot.
pub struct FileStore {
    path: PathBuf,
    map: BTreeMap<String, Value>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no existing store, starting from defaults");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, map })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&self.map)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KvStore for FileStore {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    fn put_value(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value);
        self.persist()
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: BTreeMap<String, Value>,
}

impl KvStore for MemoryStore {
    fn get_value(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    fn put_value(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }
}

pub fn load_device_config<S: KvStore>(store: &S) -> DeviceConfig {
    let config = DeviceConfig {
        identity: store.get(KEY_IDENTITY, DEFAULT_IDENTITY.to_string()),
        active_interval_ms: store.get(KEY_ACTIVE_INTERVAL_MS, DEFAULT_ACTIVE_INTERVAL_MS),
        idle_interval_ms: store.get(KEY_IDLE_INTERVAL_MS, DEFAULT_IDLE_INTERVAL_MS),
        battery_low_threshold: store.get(KEY_BATTERY_LOW_THRESHOLD, DEFAULT_BATTERY_LOW_THRESHOLD),
        fuel_low_threshold: store.get(KEY_FUEL_LOW_THRESHOLD, DEFAULT_FUEL_LOW_THRESHOLD),
        humidity_high_threshold: store.get(
            KEY_HUMIDITY_HIGH_THRESHOLD,
            DEFAULT_HUMIDITY_HIGH_THRESHOLD,
        ),
        smoothing_alpha_fuel: store.get(KEY_SMOOTHING_ALPHA_FUEL, DEFAULT_SMOOTHING_ALPHA_FUEL),
        smoothing_alpha_battery: store.get(
            KEY_SMOOTHING_ALPHA_BATTERY,
            DEFAULT_SMOOTHING_ALPHA_BATTERY,
        ),
        enabled: store.get(KEY_ENABLED, true),
    };

    info!(
        identity = %config.identity,
        active_interval_ms = config.active_interval_ms,
        idle_interval_ms = config.idle_interval_ms,
        battery_low_threshold = config.battery_low_threshold,
        fuel_low_threshold = config.fuel_low_threshold,
        humidity_high_threshold = config.humidity_high_threshold,
        smoothing_alpha_fuel = config.smoothing_alpha_fuel,
        smoothing_alpha_battery = config.smoothing_alpha_battery,
        enabled = config.enabled,
        "device configuration loaded"
    );

    config
}

pub fn save_device_config<S: KvStore>(
    store: &mut S,
    config: &DeviceConfig,
) -> Result<(), StoreError> {
    store.put(KEY_IDENTITY, &config.identity)?;
    store.put(KEY_ACTIVE_INTERVAL_MS, &config.active_interval_ms)?;
    store.put(KEY_IDLE_INTERVAL_MS, &config.idle_interval_ms)?;
    store.put(KEY_BATTERY_LOW_THRESHOLD, &config.battery_low_threshold)?;
    store.put(KEY_FUEL_LOW_THRESHOLD, &config.fuel_low_threshold)?;
    store.put(KEY_HUMIDITY_HIGH_THRESHOLD, &config.humidity_high_threshold)?;
    store.put(KEY_SMOOTHING_ALPHA_FUEL, &config.smoothing_alpha_fuel)?;
    store.put(KEY_SMOOTHING_ALPHA_BATTERY, &config.smoothing_alpha_battery)?;
    store.put(KEY_ENABLED, &config.enabled)?;
    info!("configuration saved");
    Ok(())
}

pub fn save_mileage<S: KvStore>(store: &mut S, mileage: u64) -> Result<(), StoreError> {
    store.put(KEY_MILEAGE, &mileage)
}

/// Sensor state on boot: mileage comes from the store, everything else
/// starts from fixed seeds and settles through smoothing.
pub fn initial_sensor_data<S: KvStore>(store: &S) -> SensorData {
    let mileage = store.get(KEY_MILEAGE, DEFAULT_MILEAGE);
    if mileage != DEFAULT_MILEAGE {
        info!(mileage, "restored odometer from store");
    }
    SensorData {
        fuel_level: 85.0,
        humidity: 40.0,
        battery_voltage: 12.6,
        mileage,
        engine_running: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_miss_returns_default() {
        let store = MemoryStore::default();
        assert_eq!(store.get("missing", 42u64), 42);
        assert_eq!(store.get("missing", "fallback".to_string()), "fallback");
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::default();
        store.put("mileage", &120_050u64).unwrap();
        assert_eq!(store.get("mileage", 0u64), 120_050);
    }

    #[test]
    fn test_wrong_type_falls_back_to_default() {
        let mut store = MemoryStore::default();
        store.put("mileage", &"not-a-number").unwrap();
        assert_eq!(store.get("mileage", 7u64), 7);
    }

    #[test]
    fn test_first_boot_defaults() {
        let store = MemoryStore::default();
        let config = load_device_config(&store);

        assert_eq!(config.identity, DEFAULT_IDENTITY);
        assert_eq!(config.active_interval_ms, 10_000);
        assert_eq!(config.idle_interval_ms, 1_800_000);
        assert_eq!(config.battery_low_threshold, 11.5);
        assert_eq!(config.fuel_low_threshold, 10.0);
        assert_eq!(config.humidity_high_threshold, 80.0);
        assert!(config.enabled);

        let data = initial_sensor_data(&store);
        assert_eq!(data.mileage, DEFAULT_MILEAGE);
        assert!(!data.engine_running);
    }

    #[test]
    fn test_config_save_load_roundtrip() {
        let mut store = MemoryStore::default();
        let mut config = load_device_config(&store);
        config.identity = "VIN-42".to_string();
        config.active_interval_ms = 5_000;
        config.enabled = false;

        save_device_config(&mut store, &config).unwrap();
        assert_eq!(load_device_config(&store), config);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let path = std::env::temp_dir().join(format!("agent-store-{}.json", uuid::Uuid::new_v4()));

        {
            let mut store = FileStore::open(&path).unwrap();
            store.put(KEY_MILEAGE, &120_051u64).unwrap();
            store.put(KEY_IDENTITY, &"VIN-REOPEN").unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get(KEY_MILEAGE, 0u64), 120_051);
        assert_eq!(store.get(KEY_IDENTITY, String::new()), "VIN-REOPEN");

        let _ = fs::remove_file(&path);
    }
}
