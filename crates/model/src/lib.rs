//! Seeded procedural meshes and the shape-fitting background workload.

mod fit;
mod procedural;
mod shape;

pub use fit::{FitConfig, ShapeFitter};
pub use procedural::{ProceduralConfig, ProceduralSource, albedo, sphere};
pub use shape::{HarmonicShape, angles, direction};

pub fn crate_info() -> &'static str {
    "orbitview-model v0.1.0"
}
