use std::fmt;

use glam::{Mat4, Quat, Vec3};
use orbitview_common::{ColorBuffer, ShadingMode};
use orbitview_render::Renderer;

use crate::seed::MeshSeeds;
use crate::viewer::Viewer;

/// Read-only snapshot of the viewer for debug readouts.
#[derive(Debug, Clone)]
pub struct ViewerSummary {
    pub width: u32,
    pub height: u32,
    pub mode: ShadingMode,
    pub radius: f32,
    pub fovy: f32,
    pub center: Vec3,
    pub eye: Vec3,
    pub rotation: Quat,
    pub pose: Mat4,
    pub training: bool,
    pub dirty: bool,
    pub unit_size: u32,
    pub steps: u64,
    pub faces: Option<usize>,
    pub seeds: Option<MeshSeeds>,
}

impl ViewerSummary {
    pub fn capture<R: Renderer<Output = ColorBuffer>>(viewer: &Viewer<R>) -> Self {
        let camera = viewer.camera();
        Self {
            width: camera.width(),
            height: camera.height(),
            mode: viewer.state().mode(),
            radius: camera.radius(),
            fovy: camera.fovy(),
            center: camera.center(),
            eye: camera.eye(),
            rotation: camera.rotation(),
            pose: camera.pose(),
            training: viewer.training_enabled(),
            dirty: viewer.is_dirty(),
            unit_size: viewer.scheduler().unit_size(),
            steps: viewer.log().steps(),
            faces: viewer.mesh().map(|m| m.face_count()),
            seeds: viewer.seeds(),
        }
    }
}

impl fmt::Display for ViewerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Viewer: {}x{} mode={} training={} dirty={} units={} steps={}",
            self.width, self.height, self.mode, self.training, self.dirty, self.unit_size, self.steps
        )?;
        match (self.faces, self.seeds) {
            (Some(faces), Some(seeds)) => writeln!(f, "Mesh: faces={faces} {seeds}")?,
            (Some(faces), None) => writeln!(f, "Mesh: faces={faces}")?,
            (None, _) => writeln!(f, "Mesh: none")?,
        }
        writeln!(
            f,
            "Camera: radius={:.3} fovy={:.1} center=({:.3}, {:.3}, {:.3}) eye=({:.3}, {:.3}, {:.3})",
            self.radius,
            self.fovy,
            self.center.x,
            self.center.y,
            self.center.z,
            self.eye.x,
            self.eye.y,
            self.eye.z
        )?;
        write!(f, "Pose:")?;
        for row in 0..4 {
            let r = self.pose.row(row);
            write!(f, "\n  [{:8.4} {:8.4} {:8.4} {:8.4}]", r.x, r.y, r.z, r.w)?;
        }
        Ok(())
    }
}
