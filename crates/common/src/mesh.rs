use glam::{Vec2, Vec3};

use crate::texture::Texture;

/// Floor applied to the squared length before normalizing.
pub const NORMALIZE_EPS: f32 = 1e-20;

/// `v / sqrt(max(eps, |v|²))`. Never divides by zero; a zero vector stays zero.
pub fn safe_normalize(v: Vec3) -> Vec3 {
    v / v.length_squared().max(NORMALIZE_EPS).sqrt()
}

/// Errors from mesh validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MeshError {
    #[error("{attribute} face {face} references index {index}, but only {len} values exist")]
    IndexOutOfRange {
        attribute: &'static str,
        face: usize,
        index: u32,
        len: usize,
    },
    #[error("{attribute} has {actual} faces, expected {expected} to match positions")]
    FaceCountMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("vertex {0} has a non-finite position")]
    NonFiniteVertex(usize),
}

/// A per-corner attribute with its own index topology.
///
/// `faces[i]` selects the three values used by the corners of position face `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceAttribute<T> {
    pub values: Vec<T>,
    pub faces: Vec<[u32; 3]>,
}

impl<T: Copy> FaceAttribute<T> {
    pub fn new(values: Vec<T>, faces: Vec<[u32; 3]>) -> Self {
        Self { values, faces }
    }

    /// The three corner values of face `face`. Assumes a validated mesh.
    pub fn corners(&self, face: usize) -> [T; 3] {
        let [a, b, c] = self.faces[face];
        [
            self.values[a as usize],
            self.values[b as usize],
            self.values[c as usize],
        ]
    }
}

/// Triangle mesh with optional UV and normal attributes and an albedo texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<[u32; 3]>,
    pub uv: Option<FaceAttribute<Vec2>>,
    pub normals: Option<FaceAttribute<Vec3>>,
    pub albedo: Texture,
}

impl Mesh {
    /// A mesh with positions only and a white albedo.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            faces,
            uv: None,
            normals: None,
            albedo: Texture::solid(Vec3::ONE),
        }
    }

    pub fn with_uv(mut self, uv: FaceAttribute<Vec2>) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_normals(mut self, normals: FaceAttribute<Vec3>) -> Self {
        self.normals = Some(normals);
        self
    }

    pub fn with_albedo(mut self, albedo: Texture) -> Self {
        self.albedo = albedo;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check every index against its attribute array and every position for finiteness.
    pub fn validate(&self) -> Result<(), MeshError> {
        if let Some(i) = self.vertices.iter().position(|v| !v.is_finite()) {
            return Err(MeshError::NonFiniteVertex(i));
        }
        check_faces("positions", &self.faces, self.vertices.len())?;
        if let Some(uv) = &self.uv {
            check_attribute("uv", uv, self.faces.len())?;
        }
        if let Some(normals) = &self.normals {
            check_attribute("normals", normals, self.faces.len())?;
        }
        Ok(())
    }

    /// Replace normals with area-weighted vertex normals sharing the position topology.
    pub fn compute_vertex_normals(&mut self) {
        let mut acc = vec![Vec3::ZERO; self.vertices.len()];
        for face in &self.faces {
            let [a, b, c] = (*face).map(|i| i as usize);
            let (Some(&pa), Some(&pb), Some(&pc)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            else {
                continue;
            };
            // Unnormalized: length is twice the face area.
            let n = (pb - pa).cross(pc - pa);
            acc[a] += n;
            acc[b] += n;
            acc[c] += n;
        }
        let values = acc.into_iter().map(safe_normalize).collect();
        self.normals = Some(FaceAttribute::new(values, self.faces.clone()));
    }

    /// Axis-aligned bounds of the positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.vertices.first()?;
        Some(
            self.vertices
                .iter()
                .fold((first, first), |(lo, hi), &v| (lo.min(v), hi.max(v))),
        )
    }
}

fn check_attribute<T>(
    attribute: &'static str,
    attr: &FaceAttribute<T>,
    expected_faces: usize,
) -> Result<(), MeshError> {
    if attr.faces.len() != expected_faces {
        return Err(MeshError::FaceCountMismatch {
            attribute,
            expected: expected_faces,
            actual: attr.faces.len(),
        });
    }
    check_faces(attribute, &attr.faces, attr.values.len())
}

fn check_faces(attribute: &'static str, faces: &[[u32; 3]], len: usize) -> Result<(), MeshError> {
    for (face, tri) in faces.iter().enumerate() {
        if let Some(&index) = tri.iter().find(|&&i| i as usize >= len) {
            return Err(MeshError::IndexOutOfRange {
                attribute,
                face,
                index,
                len,
            });
        }
    }
    Ok(())
}
