//! Collaborators the viewer drives but does not implement.

use std::path::Path;
use std::time::Duration;

use orbitview_common::{ColorBuffer, Mesh, MeshError, TextureError};

use crate::seed::MeshSeeds;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("mesh producer failed: {0}")]
    Failed(String),
    #[error("produced mesh is invalid: {0}")]
    InvalidMesh(#[from] MeshError),
    #[error("produced texture is invalid: {0}")]
    InvalidTexture(#[from] TextureError),
}

#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("training step failed: {0}")]
    Failed(String),
    #[error("training left the mesh invalid: {0}")]
    InvalidMesh(#[from] MeshError),
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding failed: {0}")]
    Encode(String),
}

/// Produces a mesh from a pair of seeds.
pub trait MeshSource {
    fn produce_mesh(&mut self, seeds: MeshSeeds) -> Result<Mesh, SourceError>;
}

/// What one invocation of background work reports back.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorkReport {
    /// Objective after the run; `None` when there was nothing to work on.
    pub loss: Option<f32>,
    pub learning_rate: f32,
    /// The trainer's own timing. When absent the viewer measures wall-clock time.
    pub elapsed: Option<Duration>,
}

/// Runs `units` atomic steps of background work, possibly editing the mesh.
pub trait Trainer {
    fn run(&mut self, units: u32, mesh: Option<&mut Mesh>) -> Result<WorkReport, TrainError>;
}

/// Display surface receiving the current color buffer every frame.
pub trait Presenter {
    fn present(&mut self, buffer: &ColorBuffer);
}

impl<F: FnMut(&ColorBuffer)> Presenter for F {
    fn present(&mut self, buffer: &ColorBuffer) {
        self(buffer)
    }
}

/// Presenter that discards frames, for headless loops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn present(&mut self, _buffer: &ColorBuffer) {}
}

/// Trainer that does nothing, for shells without background work.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleTrainer;

impl Trainer for IdleTrainer {
    fn run(&mut self, _units: u32, _mesh: Option<&mut Mesh>) -> Result<WorkReport, TrainError> {
        Ok(WorkReport::default())
    }
}

/// Serializes a mesh to disk.
pub trait MeshExporter {
    fn export(&mut self, mesh: &Mesh, path: &Path) -> Result<(), ExportError>;
}
