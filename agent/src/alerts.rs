use serde::{Deserialize, Serialize};

use crate::model::{DeviceConfig, SensorData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCode {
    #[serde(rename = "LOW_BATTERY_WARNING")]
    LowBattery,
    #[serde(rename = "LOW_FUEL_WARNING")]
    LowFuel,
    #[serde(rename = "HIGH_HUMIDITY_WARNING")]
    HighHumidity,
}

/// At most one alert per evaluation. Battery takes precedence over fuel,
/// fuel over humidity; conditions further down the list are dropped even
/// when simultaneously true, so every telemetry payload is single-cause.
pub fn evaluate(data: &SensorData, config: &DeviceConfig) -> Option<AlertCode> {
    if data.battery_voltage < config.battery_low_threshold {
        return Some(AlertCode::LowBattery);
    }
    if data.fuel_level < config.fuel_low_threshold {
        return Some(AlertCode::LowFuel);
    }
    if data.humidity > config.humidity_high_threshold {
        return Some(AlertCode::HighHumidity);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DeviceConfig {
        DeviceConfig {
            identity: "VIN-123".to_string(),
            active_interval_ms: 10_000,
            idle_interval_ms: 1_800_000,
            battery_low_threshold: 11.5,
            fuel_low_threshold: 10.0,
            humidity_high_threshold: 80.0,
            smoothing_alpha_fuel: 0.1,
            smoothing_alpha_battery: 0.3,
            enabled: true,
        }
    }

    fn healthy() -> SensorData {
        SensorData {
            fuel_level: 50.0,
            humidity: 40.0,
            battery_voltage: 12.6,
            mileage: 120_000,
            engine_running: false,
        }
    }

    #[test]
    fn test_no_alert_when_all_nominal() {
        assert_eq!(evaluate(&healthy(), &config()), None);
    }

    #[test]
    fn test_low_battery_alone() {
        let mut data = healthy();
        data.battery_voltage = 11.4;
        assert_eq!(evaluate(&data, &config()), Some(AlertCode::LowBattery));
    }

    #[test]
    fn test_low_fuel_alone() {
        let mut data = healthy();
        data.fuel_level = 9.9;
        assert_eq!(evaluate(&data, &config()), Some(AlertCode::LowFuel));
    }

    #[test]
    fn test_high_humidity_alone() {
        let mut data = healthy();
        data.humidity = 80.1;
        assert_eq!(evaluate(&data, &config()), Some(AlertCode::HighHumidity));
    }

    #[test]
    fn test_battery_wins_over_all() {
        let mut data = healthy();
        data.battery_voltage = 11.0;
        data.fuel_level = 5.0;
        data.humidity = 95.0;
        assert_eq!(evaluate(&data, &config()), Some(AlertCode::LowBattery));
    }

    #[test]
    fn test_fuel_wins_over_humidity() {
        let mut data = healthy();
        data.fuel_level = 5.0;
        data.humidity = 95.0;
        assert_eq!(evaluate(&data, &config()), Some(AlertCode::LowFuel));
    }

    #[test]
    fn test_threshold_boundaries_are_strict() {
        let mut data = healthy();
        data.battery_voltage = 11.5;
        data.fuel_level = 10.0;
        data.humidity = 80.0;
        assert_eq!(evaluate(&data, &config()), None);
    }
}
