use tracing::{info, warn};

use crate::model::{DeviceConfig, PartialConfig};

// Numeric proposals within these bands of the current value are treated as
// floating-point noise and never persisted.
const EPS_BATTERY_THRESHOLD: f64 = 0.01;
const EPS_FUEL_THRESHOLD: f64 = 0.1;
const EPS_HUMIDITY_THRESHOLD: f64 = 0.1;
const EPS_ALPHA: f64 = 0.01;

fn valid_threshold(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

fn valid_alpha(v: f64) -> bool {
    v.is_finite() && v > 0.0 && v <= 1.0
}

/// Merge a sparse server proposal into the local config, field by field.
/// A proposed value lands only if it is present, inside its domain, and
/// differs from the current value beyond the field's epsilon; anything else
/// is ignored without touching the prior value. Returns whether anything
/// changed — the caller persists on change.
pub fn merge(config: &mut DeviceConfig, proposed: &PartialConfig) -> bool {
    let mut changed = false;

    if let Some(identity) = &proposed.identity {
        if !identity.is_empty() && *identity != config.identity {
            // Re-provisioning: the device will sync against a different
            // server record from here on.
            warn!(from = %config.identity, to = %identity, "identity reassigned by server");
            config.identity = identity.clone();
            changed = true;
        }
    }

    if let Some(v) = proposed.active_interval_ms {
        if v > 0 && v != config.active_interval_ms {
            info!(from = config.active_interval_ms, to = v, "active interval updated");
            config.active_interval_ms = v;
            changed = true;
        }
    }

    if let Some(v) = proposed.idle_interval_ms {
        if v > 0 && v != config.idle_interval_ms {
            info!(from = config.idle_interval_ms, to = v, "idle interval updated");
            config.idle_interval_ms = v;
            changed = true;
        }
    }

    if let Some(v) = proposed.battery_low_threshold {
        if valid_threshold(v) && (v - config.battery_low_threshold).abs() > EPS_BATTERY_THRESHOLD {
            info!(from = config.battery_low_threshold, to = v, "battery threshold updated");
            config.battery_low_threshold = v;
            changed = true;
        }
    }

    if let Some(v) = proposed.fuel_low_threshold {
        if valid_threshold(v) && (v - config.fuel_low_threshold).abs() > EPS_FUEL_THRESHOLD {
            info!(from = config.fuel_low_threshold, to = v, "fuel threshold updated");
            config.fuel_low_threshold = v;
            changed = true;
        }
    }

    if let Some(v) = proposed.humidity_high_threshold {
        if valid_threshold(v) && (v - config.humidity_high_threshold).abs() > EPS_HUMIDITY_THRESHOLD
        {
            info!(from = config.humidity_high_threshold, to = v, "humidity threshold updated");
            config.humidity_high_threshold = v;
            changed = true;
        }
    }

    if let Some(smoothing) = &proposed.smoothing {
        if let Some(v) = smoothing.fuel {
            if valid_alpha(v) && (v - config.smoothing_alpha_fuel).abs() > EPS_ALPHA {
                info!(from = config.smoothing_alpha_fuel, to = v, "fuel smoothing updated");
                config.smoothing_alpha_fuel = v;
                changed = true;
            }
        }
        if let Some(v) = smoothing.battery {
            if valid_alpha(v) && (v - config.smoothing_alpha_battery).abs() > EPS_ALPHA {
                info!(from = config.smoothing_alpha_battery, to = v, "battery smoothing updated");
                config.smoothing_alpha_battery = v;
                changed = true;
            }
        }
    }

    if let Some(enabled) = proposed.enabled {
        if enabled != config.enabled {
            info!(from = config.enabled, to = enabled, "device enabled flag updated");
            config.enabled = enabled;
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SmoothingPatch;

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

    #[test]
    fn test_empty_proposal_changes_nothing() {
        let mut local = config();
        assert!(!merge(&mut local, &PartialConfig::default()));
        assert_eq!(local, config());
    }

    #[test]
    fn test_within_epsilon_is_noise() {
        let mut local = config();
        let proposed = PartialConfig {
            fuel_low_threshold: Some(10.05),
            battery_low_threshold: Some(11.505),
            humidity_high_threshold: Some(80.05),
            ..Default::default()
        };

        assert!(!merge(&mut local, &proposed));
        assert_eq!(local, config());
    }

    #[test]
    fn test_real_change_is_applied() {
        let mut local = config();
        let proposed = PartialConfig {
            fuel_low_threshold: Some(5.0),
            ..Default::default()
        };

        assert!(merge(&mut local, &proposed));
        assert_eq!(local.fuel_low_threshold, 5.0);
    }

    #[test]
    fn test_out_of_domain_fields_are_ignored() {
        let mut local = config();
        let proposed = PartialConfig {
            active_interval_ms: Some(0),
            idle_interval_ms: Some(0),
            battery_low_threshold: Some(-1.0),
            fuel_low_threshold: Some(f64::NAN),
            smoothing: Some(SmoothingPatch {
                fuel: Some(1.5),
                battery: Some(0.0),
            }),
            ..Default::default()
        };

        assert!(!merge(&mut local, &proposed));
        assert_eq!(local, config());
    }

    #[test]
    fn test_invalid_field_never_aborts_the_rest() {
        let mut local = config();
        let proposed = PartialConfig {
            active_interval_ms: Some(0),
            idle_interval_ms: Some(600_000),
            ..Default::default()
        };

        assert!(merge(&mut local, &proposed));
        assert_eq!(local.active_interval_ms, 10_000);
        assert_eq!(local.idle_interval_ms, 600_000);
    }

    #[test]
    fn test_intervals_compare_exactly() {
        let mut local = config();
        let same = PartialConfig {
            active_interval_ms: Some(10_000),
            ..Default::default()
        };
        assert!(!merge(&mut local, &same));

        let different = PartialConfig {
            active_interval_ms: Some(10_001),
            ..Default::default()
        };
        assert!(merge(&mut local, &different));
        assert_eq!(local.active_interval_ms, 10_001);
    }

    #[test]
    fn test_alpha_domain_boundary() {
        let mut local = config();
        let proposed = PartialConfig {
            smoothing: Some(SmoothingPatch {
                fuel: Some(1.0),
                battery: None,
            }),
            ..Default::default()
        };

        // 1.0 is inside (0, 1]
        assert!(merge(&mut local, &proposed));
        assert_eq!(local.smoothing_alpha_fuel, 1.0);
    }

    #[test]
    fn test_identity_reassignment() {
        let mut local = config();
        let proposed = PartialConfig {
            identity: Some("VIN-999".to_string()),
            ..Default::default()
        };

        assert!(merge(&mut local, &proposed));
        assert_eq!(local.identity, "VIN-999");

        let empty = PartialConfig {
            identity: Some(String::new()),
            ..Default::default()
        };
        assert!(!merge(&mut local, &empty));
        assert_eq!(local.identity, "VIN-999");
    }

    #[test]
    fn test_enabled_flag_strict_inequality() {
        let mut local = config();
        let same = PartialConfig {
            enabled: Some(true),
            ..Default::default()
        };
        assert!(!merge(&mut local, &same));

        let flip = PartialConfig {
            enabled: Some(false),
            ..Default::default()
        };
        assert!(merge(&mut local, &flip));
        assert!(!local.enabled);
    }
}
