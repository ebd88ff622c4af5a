//! Frame-budget scheduling for background work.
//!
//! # Invariants
//! - `unit_size` stays within the configured bounds.
//! - A measurement only ever affects the next invocation.
//! - Unusable measurements leave the unit size untouched.

mod budget;
mod window;

pub use budget::{ScheduleDecision, ScheduleError, SchedulerConfig, StepScheduler};
pub use window::TimingWindow;

pub fn crate_info() -> &'static str {
    "orbitview-schedule v0.1.0"
}
