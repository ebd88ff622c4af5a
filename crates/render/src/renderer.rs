use std::fmt::Write as _;

use orbitview_common::{ColorBuffer, LightDirection, Mesh, MeshError, ShadingMode};

use crate::camera::OrbitCamera;
use crate::raster::{Projected, RasterBuffer, RasterStats, rasterize};
use crate::shading::{Frame, Lighting, shade};

/// Shading selection and lighting for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    pub mode: ShadingMode,
    pub light: LightDirection,
    /// Fraction of albedo that survives with no direct light, in [0, 1].
    pub ambient_ratio: f32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: ShadingMode::Lambertian,
            light: LightDirection::default(),
            ambient_ratio: 0.5,
        }
    }
}

impl RenderOptions {
    fn lighting(&self) -> Lighting {
        Lighting {
            light: self.light,
            ambient_ratio: self.ambient_ratio,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("mesh rejected: {0}")]
    InvalidMesh(#[from] MeshError),
}

/// Renderer-agnostic interface.
///
/// Renderers read the camera, the mesh and the options, and never mutate any
/// of them. The same inputs always produce the same output.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `mesh` as seen by `camera`.
    fn render(
        &self,
        camera: &OrbitCamera,
        mesh: &Mesh,
        options: &RenderOptions,
    ) -> Result<Self::Output, RenderError>;
}

/// CPU rasterizer producing a [`ColorBuffer`] at the camera's viewport size.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareRenderer;

impl SoftwareRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Validate, project and rasterize without shading.
    pub fn rasterize(
        &self,
        camera: &OrbitCamera,
        mesh: &Mesh,
    ) -> Result<(Projected, RasterBuffer, RasterStats), RenderError> {
        mesh.validate()?;
        let projected = Projected::new(
            camera.view_projection(),
            &mesh.vertices,
            camera.width(),
            camera.height(),
        );
        let (raster, stats) = rasterize(&projected, &mesh.faces);
        Ok((projected, raster, stats))
    }
}

impl Renderer for SoftwareRenderer {
    type Output = ColorBuffer;

    fn render(
        &self,
        camera: &OrbitCamera,
        mesh: &Mesh,
        options: &RenderOptions,
    ) -> Result<ColorBuffer, RenderError> {
        let (projected, raster, stats) = self.rasterize(camera, mesh)?;
        if options.mode.needs_normals() && mesh.normals.is_none() {
            tracing::debug!(mode = %options.mode, "mesh has no normals, shading with a zero normal");
        }
        if options.mode.needs_albedo() && mesh.uv.is_none() {
            tracing::debug!(mode = %options.mode, "mesh has no UVs, albedo is white");
        }
        let frame = Frame {
            mesh,
            raster: &raster,
            projected: &projected,
        };
        let pixels = shade(frame, options.mode, options.lighting());
        tracing::debug!(
            mode = %options.mode,
            width = camera.width(),
            height = camera.height(),
            covered = raster.covered_pixels(),
            triangles = stats.triangles_drawn,
            clipped = stats.triangles_clipped,
            "rendered frame"
        );
        Ok(ColorBuffer::from_pixels(camera.width(), camera.height(), &pixels))
    }
}

/// Text renderer describing the camera and mesh instead of drawing them.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(
        &self,
        camera: &OrbitCamera,
        mesh: &Mesh,
        options: &RenderOptions,
    ) -> Result<String, RenderError> {
        mesh.validate()?;
        let mut out = String::new();
        let eye = camera.eye();
        let center = camera.center();
        let _ = writeln!(
            out,
            "=== Frame {}x{} mode={} ===",
            camera.width(),
            camera.height(),
            options.mode
        );
        let _ = writeln!(
            out,
            "Mesh: vertices={} faces={} uv={} normals={}",
            mesh.vertex_count(),
            mesh.face_count(),
            mesh.uv.is_some(),
            mesh.normals.is_some()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.3}, {:.3}, {:.3}) center=({:.3}, {:.3}, {:.3}) radius={:.3} fovy={:.1}",
            eye.x, eye.y, eye.z, center.x, center.y, center.z, camera.radius(), camera.fovy()
        );
        let [fx, fy, cx, cy] = camera.intrinsics();
        let _ = writeln!(out, "Intrinsics: fx={fx:.2} fy={fy:.2} cx={cx:.1} cy={cy:.1}");
        let _ = writeln!(
            out,
            "Light: theta={:.1} phi={:.1} ambient={:.2}",
            options.light.theta, options.light.phi, options.ambient_ratio
        );
        if let Some((lo, hi)) = mesh.bounds() {
            let _ = writeln!(
                out,
                "Bounds: ({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                lo.x, lo.y, lo.z, hi.x, hi.y, hi.z
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use orbitview_common::{FaceAttribute, Texture};

    /// Unit cube with per-face UVs and flat normals.
    fn cube() -> Mesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        let mut uvs = Vec::new();
        let mut uv_faces = Vec::new();
        let mut normals = Vec::new();
        let mut normal_faces = Vec::new();
        let axes = [Vec3::X, Vec3::Y, Vec3::Z];
        for (i, &n) in axes.iter().enumerate() {
            for sign in [1.0f32, -1.0] {
                let normal = n * sign;
                let u = axes[(i + 1) % 3];
                let v = normal.cross(u);
                let base = vertices.len() as u32;
                for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    vertices.push((normal + u * a + v * b) * 0.5);
                    uvs.push(Vec2::new((a + 1.0) * 0.5, (b + 1.0) * 0.5));
                }
                let ni = normals.len() as u32;
                normals.push(normal);
                for tri in [[0, 1, 2], [0, 2, 3]] {
                    faces.push(tri.map(|k| base + k));
                    uv_faces.push(tri.map(|k| base + k));
                    normal_faces.push([ni; 3]);
                }
            }
        }
        let texture = Texture::from_fn(8, 8, |u, v| Vec3::new(u, v, 0.5)).unwrap();
        Mesh::new(vertices, faces)
            .with_uv(FaceAttribute::new(uvs, uv_faces))
            .with_normals(FaceAttribute::new(normals, normal_faces))
            .with_albedo(texture)
    }

    fn camera() -> OrbitCamera {
        let mut cam = OrbitCamera::new(48, 32, 3.0, 50.0).unwrap();
        cam.orbit(400.0, 300.0);
        cam
    }

    fn render(mesh: &Mesh, options: &RenderOptions) -> ColorBuffer {
        SoftwareRenderer::new()
            .render(&camera(), mesh, options)
            .unwrap()
    }

    fn options(mode: ShadingMode) -> RenderOptions {
        RenderOptions {
            mode,
            light: LightDirection::new(60.0, 30.0),
            ambient_ratio: 0.3,
        }
    }

    #[test]
    fn output_matches_viewport() {
        let buf = render(&cube(), &RenderOptions::default());
        assert_eq!((buf.width(), buf.height()), (48, 32));
        assert_eq!(buf.as_slice().len(), 48 * 32 * 3);
    }

    #[test]
    fn rendering_is_deterministic() {
        let mesh = cube();
        for mode in ShadingMode::ALL {
            let a = render(&mesh, &options(mode));
            let b = render(&mesh, &options(mode));
            assert_eq!(a.digest(), b.digest(), "{mode}");
        }
    }

    #[test]
    fn albedo_ignores_normals_and_light() {
        let mesh = cube();
        let reference = render(&mesh, &options(ShadingMode::Albedo));

        let mut flipped = mesh.clone();
        if let Some(normals) = &mut flipped.normals {
            for n in &mut normals.values {
                *n = -*n;
            }
        }
        let mut bare = mesh.clone();
        bare.normals = None;
        let relit = RenderOptions {
            mode: ShadingMode::Albedo,
            light: LightDirection::new(170.0, 290.0),
            ambient_ratio: 0.9,
        };

        for (mesh, opts) in [
            (&flipped, options(ShadingMode::Albedo)),
            (&bare, options(ShadingMode::Albedo)),
            (&mesh, relit),
        ] {
            let image = render(mesh, &opts);
            assert_eq!(image.as_slice(), reference.as_slice());
        }
    }

    #[test]
    fn modes_produce_different_images() {
        let mesh = cube();
        let images: Vec<_> = ShadingMode::ALL
            .iter()
            .map(|&m| render(&mesh, &options(m)).digest())
            .collect();
        for i in 0..images.len() {
            for j in i + 1..images.len() {
                assert_ne!(images[i], images[j]);
            }
        }
    }

    #[test]
    fn full_ambient_lambertian_equals_albedo() {
        let mesh = cube();
        let mut lit = options(ShadingMode::Lambertian);
        lit.ambient_ratio = 1.0;
        let a = render(&mesh, &lit);
        let b = render(&mesh, &options(ShadingMode::Albedo));
        assert!(a.same_pixels(&b));
    }

    #[test]
    fn depth_ignores_light() {
        let mesh = cube();
        let a = render(&mesh, &options(ShadingMode::Depth));
        let mut other = options(ShadingMode::Depth);
        other.light = LightDirection::new(170.0, 250.0);
        other.ambient_ratio = 0.9;
        assert!(a.same_pixels(&render(&mesh, &other)));
    }

    #[test]
    fn coverage_is_shared_by_all_modes() {
        let mesh = cube();
        let (_, raster, _) = SoftwareRenderer::new().rasterize(&camera(), &mesh).unwrap();
        let depth = render(&mesh, &options(ShadingMode::Depth));
        let normal = render(&mesh, &options(ShadingMode::Normal));
        let mut covered = 0;
        for y in 0..32 {
            for x in 0..48 {
                if raster.get(x, y).is_some() {
                    covered += 1;
                    assert_ne!(normal.pixel(x, y), Vec3::splat(0.5));
                } else {
                    assert_eq!(depth.pixel(x, y), Vec3::ZERO);
                    assert_eq!(normal.pixel(x, y), Vec3::splat(0.5));
                }
            }
        }
        assert!(covered > 0);
    }

    #[test]
    fn colors_stay_in_unit_range() {
        let mesh = cube();
        for mode in [ShadingMode::Albedo, ShadingMode::Lambertian] {
            let buf = render(&mesh, &options(mode));
            assert!(buf.as_slice().iter().all(|c| (0.0..=1.0).contains(c)), "{mode}");
        }
    }

    #[test]
    fn invalid_mesh_is_rejected() {
        let mut mesh = cube();
        mesh.faces[3] = [0, 1, 999];
        let err = SoftwareRenderer::new()
            .render(&camera(), &mesh, &RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidMesh(_)));
    }

    #[test]
    fn empty_mesh_renders_background() {
        let mesh = Mesh::new(Vec::new(), Vec::new());
        let buf = render(&mesh, &options(ShadingMode::Albedo));
        assert!(buf.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn debug_renderer_describes_frame() {
        let out = DebugTextRenderer::new()
            .render(&camera(), &cube(), &RenderOptions::default())
            .unwrap();
        assert!(out.contains("48x32"));
        assert!(out.contains("mode=lambertian"));
        assert!(out.contains("faces=12"));
        assert!(out.contains("fx="));
    }
}
