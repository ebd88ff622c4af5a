use std::collections::VecDeque;
use std::time::Duration;

/// Rolling window of recent durations for instrumentation.
#[derive(Debug, Clone)]
pub struct TimingWindow {
    history: VecDeque<Duration>,
    capacity: usize,
}

impl TimingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(dt);
    }

    pub fn last(&self) -> Option<Duration> {
        self.history.back().copied()
    }

    pub fn average(&self) -> Duration {
        if self.history.is_empty() {
            return Duration::ZERO;
        }
        self.history.iter().sum::<Duration>() / self.history.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.history.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.history.iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        self.history.len()
    }

    /// Rate implied by the most recent sample, `None` before the first
    /// sample or when it took no measurable time.
    pub fn fps(&self) -> Option<f64> {
        let last = self.last()?.as_secs_f64();
        (last > 0.0).then(|| 1.0 / last)
    }
}

impl Default for TimingWindow {
    fn default() -> Self {
        Self::new(60)
    }
}
