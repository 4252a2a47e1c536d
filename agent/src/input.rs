/// One digital input line, sampled once per tick. Active-low: a high level
/// means released, low means pressed.
pub trait DigitalInput {
    fn sample(&mut self, now_ms: u64) -> bool;
}

/// Synthetic ignition button standing in for the real momentary switch:
/// holds the line low for a short pulse at the end of every period, which
/// the scheduler sees as one falling edge per period.
#[derive(Debug)]
pub struct SimulatedIgnition {
    period_ms: u64,
    pulse_ms: u64,
}

impl SimulatedIgnition {
    pub fn new(period_ms: u64, pulse_ms: u64) -> Self {
        Self {
            period_ms,
            pulse_ms,
        }
    }
}

impl DigitalInput for SimulatedIgnition {
    fn sample(&mut self, now_ms: u64) -> bool {
        if self.period_ms == 0 {
            // Disabled: engine stays in whatever state it booted in
            return true;
        }
        now_ms % self.period_ms < self.period_ms.saturating_sub(self.pulse_ms)
    }
}
