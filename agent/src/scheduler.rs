use crate::model::{DeviceConfig, EventType};

/// Elapsed-time check against a monotonic millisecond counter. A counter
/// that moved backwards (wraparound) counts as "interval elapsed" instead of
/// producing a bogus negative delta.
pub fn interval_elapsed(now_ms: u64, since_ms: u64, interval_ms: u64) -> bool {
    now_ms < since_ms || now_ms - since_ms >= interval_ms
}

/// Actions decided for one tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    /// The ignition input saw its active edge; caller flips `engine_running`.
    pub engine_toggled: bool,
    pub report: Option<EventType>,
    pub sync_due: bool,
}

/// Timer and edge state for the cooperative control loop. Holds named
/// deadlines compared against a single sampled "now" per tick; the sensed
/// engine state itself lives in `SensorData`.
#[derive(Debug)]
pub struct Scheduler {
    sync_interval_ms: u64,
    // Ignition input is active-low; idle level is high.
    last_input_level: bool,
    last_report_ms: u64,
    last_sync_ms: u64,
}

impl Scheduler {
    pub fn new(sync_interval_ms: u64) -> Self {
        Self {
            sync_interval_ms,
            last_input_level: true,
            last_report_ms: 0,
            last_sync_ms: 0,
        }
    }

    /// Decide what this tick does. `input_level` is the raw ignition level
    /// (high = released); `engine_running` is the state before this tick.
    ///
    /// The report interval is chosen from the post-toggle engine state, so a
    /// state change adopts the new cadence on the same tick, and a toggle
    /// always produces an immediate transition event with a timer reset.
    pub fn plan(
        &mut self,
        now_ms: u64,
        input_level: bool,
        engine_running: bool,
        config: &DeviceConfig,
    ) -> TickPlan {
        let mut plan = TickPlan::default();

        let falling_edge = self.last_input_level && !input_level;
        self.last_input_level = input_level;

        let engine = if falling_edge {
            !engine_running
        } else {
            engine_running
        };

        if falling_edge {
            plan.engine_toggled = true;
            plan.report = Some(if engine {
                EventType::EngineStart
            } else {
                EventType::EngineStop
            });
            self.last_report_ms = now_ms;
        } else {
            let interval = if engine {
                config.active_interval_ms
            } else {
                config.idle_interval_ms
            };
            if interval_elapsed(now_ms, self.last_report_ms, interval) {
                plan.report = Some(EventType::Periodic);
                self.last_report_ms = now_ms;
            }
        }

        // Independent cadence; resets when due, regardless of sync outcome.
        if interval_elapsed(now_ms, self.last_sync_ms, self.sync_interval_ms) {
            plan.sync_due = true;
            self.last_sync_ms = now_ms;
        }

        plan
    }
}
