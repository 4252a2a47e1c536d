use rand::Rng;
use tracing::debug;

use crate::model::{DeviceConfig, SensorData};
use crate::scheduler::interval_elapsed;

/// Raw samples are produced at most once per this window, regardless of how
/// fast the control loop ticks.
pub const SAMPLE_INTERVAL_MS: u64 = 1_000;
/// One odometer unit per this much engine-on time.
pub const ODOMETER_STEP_MS: u64 = 30_000;

const FUEL_BURN_PER_SAMPLE: f64 = 0.02;
const BATTERY_RUNNING_V: f64 = 14.2;
const BATTERY_IDLE_V: f64 = 12.5;
const HUMIDITY_BASE: f64 = 50.0;

pub fn smooth(prev: f64, raw: f64, alpha: f64) -> f64 {
    alpha * raw + (1.0 - alpha) * prev
}

/// Synthetic sensor source. Holds only its own sample timers; the sensed
/// values live in `SensorData`.
#[derive(Debug, Default)]
pub struct SensorModel {
    last_sample_ms: Option<u64>,
    last_odometer_ms: u64,
}

impl SensorModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the simulation to `now_ms`. Returns true when the odometer
    /// moved, in which case the caller persists the new mileage before the
    /// next tick reads it back.
    pub fn advance(
        &mut self,
        data: &mut SensorData,
        config: &DeviceConfig,
        now_ms: u64,
        rng: &mut impl Rng,
    ) -> bool {
        if let Some(last) = self.last_sample_ms {
            if !interval_elapsed(now_ms, last, SAMPLE_INTERVAL_MS) {
                return false;
            }
        }
        self.last_sample_ms = Some(now_ms);

        let mut raw_fuel = data.fuel_level;
        if data.engine_running && raw_fuel > 0.0 {
            raw_fuel -= FUEL_BURN_PER_SAMPLE;
        }

        let raw_voltage = if data.engine_running {
            BATTERY_RUNNING_V + rng.gen_range(-0.5..0.5)
        } else {
            BATTERY_IDLE_V - rng.gen_range(0.0..0.05)
        };

        let raw_humidity = HUMIDITY_BASE + rng.gen_range(-10.0..10.0);

        data.fuel_level = smooth(data.fuel_level, raw_fuel, config.smoothing_alpha_fuel).max(0.0);
        data.battery_voltage = smooth(
            data.battery_voltage,
            raw_voltage,
            config.smoothing_alpha_battery,
        );
        data.humidity = raw_humidity;

        if data.engine_running && interval_elapsed(now_ms, self.last_odometer_ms, ODOMETER_STEP_MS)
        {
            data.mileage += 1;
            self.last_odometer_ms = now_ms;
            debug!(mileage = data.mileage, "odometer advanced");
            return true;
        }

        false
    }
}
