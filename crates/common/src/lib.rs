//! Shared types for the orbitview viewer.
//!
//! # Invariants
//! - A `Mesh` that passed `validate` has every face index inside its attribute array.
//! - Unit vectors derived from interpolated data go through `safe_normalize`.
//! - Color buffers are row-major, three `f32` channels per pixel.

mod buffer;
mod mesh;
mod texture;
mod types;

pub use buffer::ColorBuffer;
pub use mesh::{FaceAttribute, Mesh, MeshError, NORMALIZE_EPS, safe_normalize};
pub use texture::{Texture, TextureError};
pub use types::{LightDirection, ShadingMode, ShadingModeParseError};

pub fn crate_info() -> &'static str {
    "orbitview-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
