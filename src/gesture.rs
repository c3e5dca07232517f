//! Shake gesture recognition.
//!
//! [`ShakeDetector`] is a pure recognizer fed accelerometer samples by the
//! platform's sensor glue. When it reports a shake, the glue relays the event
//! into the coordinator's command channel so gesture handling is serialized
//! with every other command.

use std::collections::VecDeque;

const EARTH_GRAVITY: f32 = 9.80665;

/// Minimum g-force a sample must exceed to count as a shake movement.
const SHAKE_THRESHOLD_G: f32 = 2.7;
/// Movements above the threshold must land within this window.
const SHAKE_WINDOW_MS: u64 = 500;
/// Movements required within the window to report a shake.
const SHAKES_REQUIRED: usize = 3;
/// Quiet period after a reported shake.
const COOLDOWN_MS: u64 = 1000;

/// One accelerometer reading, in m/s^2, with a monotonic timestamp.
#[derive(Debug, Clone, Copy)]
pub struct AccelSample {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub at_millis: u64,
}

impl AccelSample {
    /// Total acceleration expressed in multiples of earth gravity.
    pub fn g_force(&self) -> f32 {
        let gx = self.x / EARTH_GRAVITY;
        let gy = self.y / EARTH_GRAVITY;
        let gz = self.z / EARTH_GRAVITY;
        (gx * gx + gy * gy + gz * gz).sqrt()
    }
}

/// Threshold-and-window shake recognizer.
#[derive(Debug, Default)]
pub struct ShakeDetector {
    movements: VecDeque<u64>,
    last_shake_at: Option<u64>,
}

impl ShakeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sample; returns true when a shake is recognized.
    pub fn on_sample(&mut self, sample: AccelSample) -> bool {
        if let Some(last) = self.last_shake_at {
            if sample.at_millis.saturating_sub(last) < COOLDOWN_MS {
                return false;
            }
        }

        if sample.g_force() <= SHAKE_THRESHOLD_G {
            return false;
        }

        self.movements.push_back(sample.at_millis);
        while let Some(&oldest) = self.movements.front() {
            if sample.at_millis.saturating_sub(oldest) > SHAKE_WINDOW_MS {
                self.movements.pop_front();
            } else {
                break;
            }
        }

        if self.movements.len() >= SHAKES_REQUIRED {
            self.movements.clear();
            self.last_shake_at = Some(sample.at_millis);
            return true;
        }
        false
    }

    /// Forget any partial movement history.
    pub fn reset(&mut self) {
        self.movements.clear();
        self.last_shake_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jolt(at_millis: u64) -> AccelSample {
        // ~3.2 g along one axis
        AccelSample {
            x: 31.5,
            y: 0.0,
            z: 0.0,
            at_millis,
        }
    }

    fn rest(at_millis: u64) -> AccelSample {
        AccelSample {
            x: 0.0,
            y: 0.0,
            z: EARTH_GRAVITY,
            at_millis,
        }
    }

    #[test]
    fn test_three_jolts_within_window_trigger_shake() {
        let mut d = ShakeDetector::new();
        assert!(!d.on_sample(jolt(0)));
        assert!(!d.on_sample(jolt(100)));
        assert!(d.on_sample(jolt(200)));
    }

    #[test]
    fn test_resting_device_never_triggers() {
        let mut d = ShakeDetector::new();
        for t in 0..50 {
            assert!(!d.on_sample(rest(t * 20)));
        }
    }

    #[test]
    fn test_spread_out_jolts_do_not_trigger() {
        let mut d = ShakeDetector::new();
        assert!(!d.on_sample(jolt(0)));
        assert!(!d.on_sample(jolt(700)));
        assert!(!d.on_sample(jolt(1400)));
    }

    #[test]
    fn test_cooldown_suppresses_immediate_retrigger() {
        let mut d = ShakeDetector::new();
        d.on_sample(jolt(0));
        d.on_sample(jolt(100));
        assert!(d.on_sample(jolt(200)));

        // still inside the cooldown window
        assert!(!d.on_sample(jolt(300)));
        assert!(!d.on_sample(jolt(400)));
        assert!(!d.on_sample(jolt(500)));

        // after cooldown a fresh burst is needed and recognized
        assert!(!d.on_sample(jolt(1300)));
        assert!(!d.on_sample(jolt(1400)));
        assert!(d.on_sample(jolt(1500)));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut d = ShakeDetector::new();
        d.on_sample(jolt(0));
        d.on_sample(jolt(100));
        d.reset();
        assert!(!d.on_sample(jolt(200)));
    }
}
