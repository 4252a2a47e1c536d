use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::AlertCode;

/// Device configuration, persisted key-by-key and reconciled against the
/// server copy on every sync round.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    pub identity: String,
    pub active_interval_ms: u64,
    pub idle_interval_ms: u64,
    pub battery_low_threshold: f64,
    pub fuel_low_threshold: f64,
    pub humidity_high_threshold: f64,
    pub smoothing_alpha_fuel: f64,
    pub smoothing_alpha_battery: f64,
    pub enabled: bool,
}

/// Current sensed state. Mileage never decreases except through a
/// server-authoritative forward correction.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorData {
    pub fuel_level: f64,
    pub humidity: f64,
    pub battery_voltage: f64,
    pub mileage: u64,
    pub engine_running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Periodic,
    EngineStart,
    EngineStop,
}

/// One outbound telemetry report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub identity: String,
    pub timestamp: DateTime<Utc>,
    pub mileage: u64,
    pub fuel_level: f64,
    pub humidity: f64,
    pub battery_voltage: f64,
    pub engine_running: bool,
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<AlertCode>,
}

/// Sparse server-proposed configuration. Absent fields are `None`; a field
/// sent as zero deserializes as `Some(0)` and is rejected by validation,
/// never silently treated as "not sent".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialConfig {
    pub identity: Option<String>,
    pub active_interval_ms: Option<u64>,
    pub idle_interval_ms: Option<u64>,
    pub battery_low_threshold: Option<f64>,
    pub fuel_low_threshold: Option<f64>,
    pub humidity_high_threshold: Option<f64>,
    pub smoothing: Option<SmoothingPatch>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SmoothingPatch {
    pub fuel: Option<f64>,
    pub battery: Option<f64>,
}

/// Envelope of the sync endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<SyncSnapshot>,
}

/// Server-authoritative snapshot for one device identity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSnapshot {
    pub identity: Option<String>,
    pub mileage: u64,
    pub config: Option<PartialConfig>,
}
