use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use orbitview_common::{FaceAttribute, Mesh, Texture};
use orbitview_kernel::{MeshSeeds, MeshSource, SeedSequence, SourceError};
use serde::{Deserialize, Serialize};

use crate::shape::{HarmonicShape, direction, unit};

/// Tessellation and texture resolution for [`ProceduralSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProceduralConfig {
    /// Latitude bands between the poles, at least 2.
    pub rings: u32,
    /// Longitude slices around the axis, at least 3.
    pub segments: u32,
    pub texture_size: u32,
}

impl Default for ProceduralConfig {
    fn default() -> Self {
        Self {
            rings: 48,
            segments: 96,
            texture_size: 256,
        }
    }
}

/// Seeded mesh producer: a displaced UV sphere with a procedural albedo.
///
/// The geometry seed picks the displacement, the texture seed the albedo.
/// Seam and pole vertices are shared in the position topology and
/// duplicated in the UV topology.
#[derive(Debug, Clone, Default)]
pub struct ProceduralSource {
    config: ProceduralConfig,
}

impl ProceduralSource {
    pub fn new(config: ProceduralConfig) -> Self {
        Self {
            config: ProceduralConfig {
                rings: config.rings.max(2),
                segments: config.segments.max(3),
                texture_size: config.texture_size.max(1),
            },
        }
    }

    pub fn config(&self) -> &ProceduralConfig {
        &self.config
    }

    pub fn build(&self, seeds: MeshSeeds) -> Result<Mesh, SourceError> {
        let shape = HarmonicShape::from_seed(seeds.geo);
        let mut mesh = sphere(self.config.rings, self.config.segments, &shape)
            .with_albedo(albedo(seeds.tex, self.config.texture_size)?);
        mesh.compute_vertex_normals();
        mesh.validate()?;
        tracing::debug!(
            %seeds,
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "procedural mesh built"
        );
        Ok(mesh)
    }
}

impl MeshSource for ProceduralSource {
    fn produce_mesh(&mut self, seeds: MeshSeeds) -> Result<Mesh, SourceError> {
        self.build(seeds)
    }
}

/// UV sphere scaled per vertex by `shape`.
pub fn sphere(rings: u32, segments: u32, shape: &HarmonicShape) -> Mesh {
    let pos_index = |r: u32, s: u32| -> u32 {
        if r == 0 {
            0
        } else if r == rings {
            1 + (rings - 1) * segments
        } else {
            1 + (r - 1) * segments + s % segments
        }
    };
    let uv_index = |r: u32, s: u32| r * (segments + 1) + s;

    let mut vertices = Vec::with_capacity(((rings - 1) * segments + 2) as usize);
    vertices.push(Vec3::Y * shape.radius_at(0.0, 0.0));
    for r in 1..rings {
        let theta = PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = TAU * s as f32 / segments as f32;
            vertices.push(direction(theta, phi) * shape.radius_at(theta, phi));
        }
    }
    vertices.push(Vec3::NEG_Y * shape.radius_at(PI, 0.0));

    let mut uvs = Vec::with_capacity(((rings + 1) * (segments + 1)) as usize);
    for r in 0..=rings {
        for s in 0..=segments {
            uvs.push(Vec2::new(s as f32 / segments as f32, r as f32 / rings as f32));
        }
    }

    let mut faces = Vec::new();
    let mut uv_faces = Vec::new();
    for r in 0..rings {
        for s in 0..segments {
            let corners = [(r, s), (r, s + 1), (r + 1, s), (r + 1, s + 1)];
            let [a, c, b, d] = corners;
            // Outward winding; pole bands keep one triangle per slice.
            if r != 0 {
                faces.push([pos_index(a.0, a.1), pos_index(c.0, c.1), pos_index(b.0, b.1)]);
                uv_faces.push([uv_index(a.0, a.1), uv_index(c.0, c.1), uv_index(b.0, b.1)]);
            }
            if r != rings - 1 {
                faces.push([pos_index(c.0, c.1), pos_index(d.0, d.1), pos_index(b.0, b.1)]);
                uv_faces.push([uv_index(c.0, c.1), uv_index(d.0, d.1), uv_index(b.0, b.1)]);
            }
        }
    }

    Mesh::new(vertices, faces).with_uv(FaceAttribute::new(uvs, uv_faces))
}

/// Seeded two-tone albedo with banding and a soft checker.
pub fn albedo(seed: u64, size: u32) -> Result<Texture, SourceError> {
    let mut rng = SeedSequence::new(seed);
    let mut color = || Vec3::new(unit(&mut rng), unit(&mut rng), unit(&mut rng)) * 0.8 + 0.1;
    let base = color();
    let accent = color();
    let freq_u = 2.0 + (rng.next_u64() % 6) as f32;
    let freq_v = 1.0 + (rng.next_u64() % 4) as f32;
    let phase = unit(&mut rng) * TAU;
    let checker = 4 + (rng.next_u64() % 12) as u32;

    let texture = Texture::from_fn(size, size, |u, v| {
        let bands = 0.5 + 0.5 * (TAU * freq_u * u + phase).sin() * (TAU * freq_v * v).cos();
        let cu = (u * checker as f32) as u32;
        let cv = (v * checker as f32) as u32;
        let tile = if (cu + cv) % 2 == 0 { 1.0 } else { 0.85 };
        base.lerp(accent, bands) * tile
    })?;
    Ok(texture)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> ProceduralSource {
        ProceduralSource::new(ProceduralConfig {
            rings: 8,
            segments: 12,
            texture_size: 16,
        })
    }

    fn seeds(geo: u64, tex: u64) -> MeshSeeds {
        MeshSeeds { geo, tex }
    }

    #[test]
    fn topology_counts() {
        let mesh = small().build(seeds(1, 2)).unwrap();
        // (rings - 1) * segments ring vertices plus two poles.
        assert_eq!(mesh.vertex_count(), 7 * 12 + 2);
        // Two triangles per quad, one per slice in each pole band.
        assert_eq!(mesh.face_count(), 2 * 8 * 12 - 2 * 12);
        let uv = mesh.uv.as_ref().unwrap();
        assert_eq!(uv.values.len(), 9 * 13);
        assert_eq!(uv.faces.len(), mesh.face_count());
    }

    #[test]
    fn deterministic_per_seed() {
        let a = small().build(seeds(5, 6)).unwrap();
        let b = small().build(seeds(5, 6)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seeds_control_geometry_and_texture_separately() {
        let base = small().build(seeds(5, 6)).unwrap();
        let new_tex = small().build(seeds(5, 7)).unwrap();
        let new_geo = small().build(seeds(8, 6)).unwrap();
        assert_eq!(base.vertices, new_tex.vertices);
        assert_ne!(base.albedo, new_tex.albedo);
        assert_ne!(base.vertices, new_geo.vertices);
        assert_eq!(base.albedo, new_geo.albedo);
    }

    #[test]
    fn normals_point_outward() {
        let mesh = small().build(seeds(3, 3)).unwrap();
        let normals = mesh.normals.as_ref().unwrap();
        for (v, n) in mesh.vertices.iter().zip(&normals.values) {
            assert!(v.normalize().dot(*n) > 0.0, "vertex {v} normal {n}");
        }
    }

    #[test]
    fn plain_sphere_has_unit_radius() {
        let mesh = sphere(6, 10, &HarmonicShape::sphere());
        for v in &mesh.vertices {
            assert!((v.length() - 1.0).abs() < 1e-5);
        }
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn texture_colors_in_range() {
        let tex = albedo(99, 32).unwrap();
        assert!(tex
            .texels()
            .iter()
            .all(|t| t.min_element() >= 0.0 && t.max_element() <= 1.0));
    }

    #[test]
    fn minimum_tessellation_is_enforced() {
        let source = ProceduralSource::new(ProceduralConfig {
            rings: 0,
            segments: 1,
            texture_size: 0,
        });
        let mesh = source.build(seeds(0, 0)).unwrap();
        assert!(mesh.face_count() > 0);
    }
}
