use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduler configuration: work-size bounds and the per-frame budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Unit count that measurements are normalized to.
    pub reference_units: u32,
    /// Smallest unit size the scheduler will choose.
    pub min_units: u32,
    /// Largest unit size the scheduler will choose.
    pub max_units: u32,
    /// Wall-clock time background work may take per frame, in milliseconds.
    pub target_ms: f64,
    /// Relative deviation a candidate must exceed before it is adopted.
    pub hysteresis: f64,
    /// Unit size before the first measurement.
    pub initial_units: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reference_units: 16,
            min_units: 4,
            max_units: 16,
            target_ms: 500.0,
            hysteresis: 0.2,
            initial_units: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error("unit bounds must satisfy 1 <= min <= max, got {min}..{max}")]
    InvalidBounds { min: u32, max: u32 },
    #[error("reference unit count must be positive")]
    ZeroReference,
    #[error("target budget must be a positive number of milliseconds, got {0}")]
    InvalidTarget(f64),
    #[error("hysteresis must be in [0, 1), got {0}")]
    InvalidHysteresis(f64),
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.min_units == 0 || self.min_units > self.max_units {
            return Err(ScheduleError::InvalidBounds {
                min: self.min_units,
                max: self.max_units,
            });
        }
        if self.reference_units == 0 {
            return Err(ScheduleError::ZeroReference);
        }
        if !self.target_ms.is_finite() || self.target_ms <= 0.0 {
            return Err(ScheduleError::InvalidTarget(self.target_ms));
        }
        if !(0.0..1.0).contains(&self.hysteresis) {
            return Err(ScheduleError::InvalidHysteresis(self.hysteresis));
        }
        Ok(())
    }
}

/// Outcome of one [`StepScheduler::observe`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// The measurement was unusable; nothing changed.
    Skipped,
    /// The candidate stayed inside the hysteresis band.
    Kept { units: u32, candidate: u32 },
    /// The unit size changed.
    Resized { from: u32, to: u32 },
}

/// Chooses how many units of background work to run next frame.
///
/// Only `unit_size` persists between frames. Each observation affects the
/// next invocation only.
#[derive(Debug, Clone)]
pub struct StepScheduler {
    config: SchedulerConfig,
    unit_size: u32,
}

impl StepScheduler {
    pub fn new(config: SchedulerConfig) -> Result<Self, ScheduleError> {
        config.validate()?;
        let unit_size = config.initial_units.clamp(config.min_units, config.max_units);
        Ok(Self { config, unit_size })
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Units to run on the next invocation.
    pub fn unit_size(&self) -> u32 {
        self.unit_size
    }

    /// Size the next invocation would get for a run of `prev_units` taking
    /// `t_ms`, before hysteresis. `None` when the measurement is unusable.
    pub fn candidate(&self, prev_units: u32, t_ms: f64) -> Option<u32> {
        if prev_units == 0 || !t_ms.is_finite() || t_ms <= 0.0 {
            return None;
        }
        let reference = f64::from(self.config.reference_units);
        let full_t = t_ms / f64::from(prev_units) * reference;
        let next = (reference * self.config.target_ms / full_t).round();
        let next = next.clamp(f64::from(self.config.min_units), f64::from(self.config.max_units));
        Some(next as u32)
    }

    /// Feed back the duration of the invocation that just ran `prev_units` units.
    pub fn observe(&mut self, prev_units: u32, t_ms: f64) -> ScheduleDecision {
        let Some(candidate) = self.candidate(prev_units, t_ms) else {
            tracing::warn!(prev_units, t_ms, "unusable timing, scheduler skipped");
            return ScheduleDecision::Skipped;
        };
        let current = f64::from(self.unit_size);
        let upper = current * (1.0 + self.config.hysteresis);
        let lower = current * (1.0 - self.config.hysteresis);
        let c = f64::from(candidate);
        if c > upper || c < lower {
            let from = self.unit_size;
            self.unit_size = candidate;
            tracing::debug!(from, to = candidate, t_ms, "unit size resized");
            ScheduleDecision::Resized {
                from,
                to: candidate,
            }
        } else {
            ScheduleDecision::Kept {
                units: self.unit_size,
                candidate,
            }
        }
    }

    /// [`observe`](Self::observe) with a [`Duration`].
    pub fn observe_duration(&mut self, prev_units: u32, elapsed: Duration) -> ScheduleDecision {
        self.observe(prev_units, elapsed.as_secs_f64() * 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> StepScheduler {
        StepScheduler::new(SchedulerConfig::default()).unwrap()
    }

    #[test]
    fn config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.reference_units, 16);
        assert_eq!((config.min_units, config.max_units), (4, 16));
        assert_eq!(config.target_ms, 500.0);
        assert_eq!(scheduler().unit_size(), 16);
    }

    #[test]
    fn slow_run_halves_units() {
        let mut s = scheduler();
        let decision = s.observe(16, 1000.0);
        assert_eq!(decision, ScheduleDecision::Resized { from: 16, to: 8 });
        assert_eq!(s.unit_size(), 8);
    }

    #[test]
    fn small_deviation_is_ignored() {
        let mut s = scheduler();
        // 16 * 500 / 571 = 14.01 -> 14, within 20% of 16.
        let decision = s.observe(16, 571.0);
        assert_eq!(
            decision,
            ScheduleDecision::Kept {
                units: 16,
                candidate: 14
            }
        );
        assert_eq!(s.unit_size(), 16);
    }

    #[test]
    fn candidate_is_bounded() {
        let s = scheduler();
        assert_eq!(s.candidate(16, 0.001), Some(16));
        assert_eq!(s.candidate(16, 1e9), Some(4));
    }

    #[test]
    fn unusable_measurements_skip() {
        let mut s = scheduler();
        s.observe(16, 1000.0);
        for (units, t) in [(0, 100.0), (8, 0.0), (8, -5.0), (8, f64::NAN), (8, f64::INFINITY)] {
            assert_eq!(s.observe(units, t), ScheduleDecision::Skipped);
            assert_eq!(s.unit_size(), 8);
        }
    }

    #[test]
    fn duration_input_matches_millis() {
        let mut s = scheduler();
        let decision = s.observe_duration(16, Duration::from_secs(1));
        assert_eq!(decision, ScheduleDecision::Resized { from: 16, to: 8 });
    }

    #[test]
    fn converges_and_stabilizes() {
        for k in [5.0, 20.0, 40.0, 50.0, 62.5, 100.0, 300.0] {
            let mut s = scheduler();
            let mut changes = 0;
            for _ in 0..20 {
                let units = s.unit_size();
                if matches!(s.observe(units, units as f64 * k), ScheduleDecision::Resized { .. }) {
                    changes += 1;
                }
            }
            assert!(changes <= 2, "k={k}: {changes} changes");

            // Stable from here on.
            let settled = s.unit_size();
            for _ in 0..10 {
                let units = s.unit_size();
                assert!(!matches!(
                    s.observe(units, units as f64 * k),
                    ScheduleDecision::Resized { .. }
                ));
            }
            assert_eq!(s.unit_size(), settled);

            let ideal = (500.0 / k).round().clamp(4.0, 16.0);
            let u = settled as f64;
            assert!(ideal >= u * 0.8 && ideal <= u * 1.2, "k={k}: settled {settled}, ideal {ideal}");
        }
    }

    #[test]
    fn rejects_bad_config() {
        let bad = SchedulerConfig {
            min_units: 10,
            max_units: 5,
            ..SchedulerConfig::default()
        };
        assert!(matches!(
            StepScheduler::new(bad),
            Err(ScheduleError::InvalidBounds { min: 10, max: 5 })
        ));
        let bad = SchedulerConfig {
            target_ms: 0.0,
            ..SchedulerConfig::default()
        };
        assert!(StepScheduler::new(bad).is_err());
        let bad = SchedulerConfig {
            hysteresis: 1.5,
            ..SchedulerConfig::default()
        };
        assert!(StepScheduler::new(bad).is_err());
    }

    #[test]
    fn initial_units_are_clamped() {
        let s = StepScheduler::new(SchedulerConfig {
            initial_units: 100,
            ..SchedulerConfig::default()
        })
        .unwrap();
        assert_eq!(s.unit_size(), 16);
    }
}
