use std::path::PathBuf;

use orbitview_common::ShadingMode;

/// A high-level request that any shell (desktop, CLI, tests) can produce.
///
/// The viewer consumes actions, never raw input events. Camera and option
/// actions mark the frame dirty when they change state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Rotate about the orbit center by a pointer delta in pixels.
    Orbit { dx: f32, dy: f32 },
    /// Translate the orbit center by a pointer delta in pixels.
    Pan { dx: f32, dy: f32 },
    /// Wheel steps; positive moves closer.
    Zoom(f32),
    SetShading(ShadingMode),
    /// Light polar angle in degrees.
    SetLightTheta(f32),
    /// Light azimuth in degrees.
    SetLightPhi(f32),
    SetAmbient(f32),
    /// Vertical field of view in degrees.
    SetFovy(f32),
    ToggleTraining,
    /// Replace the mesh with one from freshly drawn seeds.
    GenerateMesh,
    /// Write the current mesh to the given `.obj` path.
    ExportMesh(PathBuf),
    Resize { width: u32, height: u32 },
    /// No-op (used for input that has no binding).
    Noop,
}

impl Action {
    /// Whether the action only touches the camera.
    pub fn is_camera(&self) -> bool {
        matches!(
            self,
            Self::Orbit { .. } | Self::Pan { .. } | Self::Zoom(_) | Self::SetFovy(_) | Self::Resize { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_actions_are_classified() {
        assert!(Action::Orbit { dx: 1.0, dy: 0.0 }.is_camera());
        assert!(Action::Zoom(1.0).is_camera());
        assert!(!Action::SetShading(ShadingMode::Depth).is_camera());
        assert!(!Action::ToggleTraining.is_camera());
    }

    #[test]
    fn export_carries_path() {
        let a = Action::ExportMesh(PathBuf::from("out/mesh.obj"));
        assert!(matches!(a, Action::ExportMesh(ref p) if p.ends_with("mesh.obj")));
    }
}
