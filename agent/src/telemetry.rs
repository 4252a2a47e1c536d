use chrono::Utc;
use tracing::{debug, info, warn};

use crate::alerts;
use crate::errors::TransportError;
use crate::model::{DeviceConfig, EventType, SensorData, TelemetryEvent};
use crate::transport::Transport;

pub fn build_event(
    event_type: EventType,
    data: &SensorData,
    config: &DeviceConfig,
) -> TelemetryEvent {
    TelemetryEvent {
        identity: config.identity.clone(),
        timestamp: Utc::now(),
        mileage: data.mileage,
        fuel_level: data.fuel_level,
        humidity: data.humidity,
        battery_voltage: data.battery_voltage,
        engine_running: data.engine_running,
        event_type,
        alert: alerts::evaluate(data, config),
    }
}

/// Assemble and send one telemetry event. Returns false when emission was
/// suppressed (device disabled). No retry on failure; the next scheduled
/// report is the recovery path.
pub async fn report<T: Transport>(
    transport: &T,
    event_type: EventType,
    data: &SensorData,
    config: &DeviceConfig,
) -> Result<bool, TransportError> {
    if !config.enabled {
        debug!("device disabled, suppressing telemetry");
        return Ok(false);
    }

    let event = build_event(event_type, data, config);
    if let Some(alert) = event.alert {
        warn!(?alert, "alert condition active");
    }

    transport.send_telemetry(&event).await?;
    info!(
        event_type = ?event.event_type,
        mileage = event.mileage,
        fuel_level = event.fuel_level,
        battery_voltage = event.battery_voltage,
        "telemetry sent"
    );
    Ok(true)
}
