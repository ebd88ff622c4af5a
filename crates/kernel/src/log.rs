use std::fmt;
use std::time::Duration;

use orbitview_schedule::TimingWindow;

use crate::traits::WorkReport;

/// Running record of background work and render timings for display.
#[derive(Debug, Clone, Default)]
pub struct TrainLog {
    steps: u64,
    last_increment: u32,
    loss: Option<f32>,
    learning_rate: f32,
    train_time: TimingWindow,
    infer_time: TimingWindow,
    mesh_time: Option<Duration>,
}

impl TrainLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_training(&mut self, units: u32, report: &WorkReport, elapsed: Duration) {
        self.steps += u64::from(units);
        self.last_increment = units;
        if report.loss.is_some() {
            self.loss = report.loss;
        }
        self.learning_rate = report.learning_rate;
        self.train_time.record(elapsed);
    }

    pub fn record_render(&mut self, elapsed: Duration) {
        self.infer_time.record(elapsed);
    }

    pub fn record_mesh(&mut self, elapsed: Duration) {
        self.mesh_time = Some(elapsed);
    }

    /// Cumulative units of background work run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn last_increment(&self) -> u32 {
        self.last_increment
    }

    pub fn loss(&self) -> Option<f32> {
        self.loss
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn train_time(&self) -> &TimingWindow {
        &self.train_time
    }

    pub fn infer_time(&self) -> &TimingWindow {
        &self.infer_time
    }

    pub fn mesh_time(&self) -> Option<Duration> {
        self.mesh_time
    }

    /// `step = N (+k), loss = x, lr = y`
    pub fn progress_line(&self) -> String {
        let loss = self
            .loss
            .map_or_else(|| "n/a".to_string(), |l| format!("{l:.4}"));
        format!(
            "step = {:5} (+{:2}), loss = {loss}, lr = {:.5}",
            self.steps, self.last_increment, self.learning_rate
        )
    }

    pub fn train_time_line(&self) -> String {
        timing_line(&self.train_time)
    }

    pub fn infer_time_line(&self) -> String {
        timing_line(&self.infer_time)
    }
}

fn timing_line(window: &TimingWindow) -> String {
    match (window.last(), window.fps()) {
        (Some(t), Some(fps)) => format!("{:.4}ms ({} FPS)", t.as_secs_f64() * 1000.0, fps.round() as u64),
        (Some(t), None) => format!("{:.4}ms", t.as_secs_f64() * 1000.0),
        (None, _) => "no data".to_string(),
    }
}

impl fmt::Display for TrainLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.progress_line())?;
        writeln!(f, "train time: {}", self.train_time_line())?;
        write!(f, "infer time: {}", self.infer_time_line())
    }
}
