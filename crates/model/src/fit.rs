use glam::Vec3;
use orbitview_common::Mesh;
use orbitview_kernel::{TrainError, Trainer, WorkReport};
use serde::{Deserialize, Serialize};

use crate::shape::HarmonicShape;

/// Step size, decay and smoothing for [`ShapeFitter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    pub learning_rate: f32,
    /// Multiplied into the learning rate after every unit.
    pub decay: f32,
    /// Laplacian smoothing weight per unit, in [0, 1].
    pub smoothing: f32,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            decay: 0.995,
            smoothing: 0.05,
        }
    }
}

/// Background workload that pulls mesh vertices toward a seeded target shape.
///
/// Each unit is one gradient step on the mean squared radial error followed
/// by a Laplacian smoothing pass. Normals are recomputed after every run.
#[derive(Debug, Clone)]
pub struct ShapeFitter {
    target: HarmonicShape,
    config: FitConfig,
    learning_rate: f32,
    steps: u64,
    neighbors: Vec<Vec<u32>>,
    topology_key: (usize, usize),
}

impl ShapeFitter {
    pub fn new(target_seed: u64, config: FitConfig) -> Self {
        Self::with_target(HarmonicShape::from_seed(target_seed), config)
    }

    pub fn with_target(target: HarmonicShape, config: FitConfig) -> Self {
        Self {
            target,
            learning_rate: config.learning_rate,
            config,
            steps: 0,
            neighbors: Vec::new(),
            topology_key: (0, 0),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Mean squared radial distance between `mesh` and the target.
    pub fn loss(&self, mesh: &Mesh) -> f32 {
        if mesh.vertices.is_empty() {
            return 0.0;
        }
        let total: f32 = mesh
            .vertices
            .iter()
            .map(|&v| {
                let e = v.length() - self.target.radius(v);
                e * e
            })
            .sum();
        total / mesh.vertices.len() as f32
    }

    fn refresh_neighbors(&mut self, mesh: &Mesh) {
        let key = (mesh.vertex_count(), mesh.face_count());
        if key == self.topology_key && self.neighbors.len() == mesh.vertex_count() {
            return;
        }
        let mut neighbors = vec![Vec::new(); mesh.vertex_count()];
        for &[a, b, c] in &mesh.faces {
            for (i, j) in [(a, b), (b, c), (c, a)] {
                neighbors[i as usize].push(j);
                neighbors[j as usize].push(i);
            }
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        self.neighbors = neighbors;
        self.topology_key = key;
    }

    fn step(&mut self, mesh: &mut Mesh) {
        let lr = self.learning_rate;
        for v in &mut mesh.vertices {
            let r = v.length();
            if r <= f32::EPSILON {
                continue;
            }
            let dir = *v / r;
            let err = r - self.target.radius(dir);
            // Per-vertex gradient of e², independent of vertex count.
            *v = dir * (r - lr * 2.0 * err);
        }

        let w = self.config.smoothing.clamp(0.0, 1.0);
        if w > 0.0 {
            let current = mesh.vertices.clone();
            for (v, adj) in mesh.vertices.iter_mut().zip(&self.neighbors) {
                if adj.is_empty() {
                    continue;
                }
                let mean = adj.iter().map(|&j| current[j as usize]).sum::<Vec3>() / adj.len() as f32;
                *v = v.lerp(mean, w);
            }
        }

        self.steps += 1;
        self.learning_rate *= self.config.decay;
    }
}

impl Trainer for ShapeFitter {
    fn run(&mut self, units: u32, mesh: Option<&mut Mesh>) -> Result<WorkReport, TrainError> {
        let Some(mesh) = mesh else {
            return Ok(WorkReport {
                loss: None,
                learning_rate: self.learning_rate,
                elapsed: None,
            });
        };
        mesh.validate()?;
        self.refresh_neighbors(mesh);
        for _ in 0..units {
            self.step(mesh);
        }
        mesh.compute_vertex_normals();
        let loss = self.loss(mesh);
        if !loss.is_finite() {
            return Err(TrainError::Failed(format!("loss diverged after {} steps", self.steps)));
        }
        tracing::trace!(units, loss, lr = self.learning_rate, "fit step");
        Ok(WorkReport {
            loss: Some(loss),
            learning_rate: self.learning_rate,
            elapsed: None,
        })
    }
}
