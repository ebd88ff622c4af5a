//! Orbit camera and software rendering pipeline.
//!
//! # Invariants
//! - Rendering never mutates the camera or the mesh.
//! - Identical camera, mesh and options give a bit-identical image.
//! - Every shading mode sees the same coverage for the same camera and mesh.

pub mod antialias;
mod camera;
pub mod raster;
mod renderer;
pub mod shading;

pub use camera::{
    CameraError, DEFAULT_FAR, DEFAULT_NEAR, MIN_RADIUS, ORBIT_DEGREES_PER_UNIT, OrbitCamera,
    PAN_SENSITIVITY, ZOOM_BASE,
};
pub use raster::{Fragment, RasterBuffer, RasterStats};
pub use renderer::{DebugTextRenderer, RenderError, RenderOptions, Renderer, SoftwareRenderer};

pub fn crate_info() -> &'static str {
    "orbitview-render v0.1.0"
}
