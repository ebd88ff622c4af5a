//! Viewer kernel: camera, display state, scheduling and the per-frame loop.
//!
//! # Invariants
//! - All state mutations flow through explicit `Viewer` operations.
//! - `dirty` is cleared only by a completed render.
//! - A missing mesh is "nothing to do", never an error.
//! - Background work measurements only affect the next frame.

pub mod config;
mod log;
mod seed;
mod state;
mod summary;
pub mod traits;
mod viewer;

pub use config::{ConfigError, ViewerConfig};
pub use log::TrainLog;
pub use seed::{MeshSeeds, SeedSequence, splitmix64};
pub use state::FrameState;
pub use summary::ViewerSummary;
pub use traits::{
    ExportError, IdleTrainer, MeshExporter, MeshSource, NullPresenter, Presenter, SourceError,
    TrainError, Trainer, WorkReport,
};
pub use viewer::{FrameReport, Viewer, ViewerError};

pub fn crate_info() -> &'static str {
    "orbitview-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
