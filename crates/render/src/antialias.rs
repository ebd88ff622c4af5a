//! Analytic silhouette antialiasing.
//!
//! For every horizontally or vertically adjacent pixel pair whose visible
//! triangles differ, find the silhouette edge of the front triangle that
//! crosses the segment between the two pixel centers and blend the two
//! colors by how far along the segment the crossing lies. Pixels that do not
//! straddle a silhouette are left alone.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::raster::{Fragment, Projected, RasterBuffer, edge};

#[derive(Debug, Clone, Copy, Default)]
struct EdgeUse {
    faces: u32,
    front_facing: u32,
    unknown: u32,
}

/// Mesh edges that can form a visible outline in the current projection.
///
/// An edge qualifies when it borders one face, more than two faces, a face
/// clipped away entirely by the near plane, or two faces of opposite screen
/// winding. Faces cut by the near plane take the winding of their visible part.
#[derive(Debug, Clone, Default)]
pub struct Silhouettes {
    edges: HashMap<(u32, u32), EdgeUse>,
}

impl Silhouettes {
    pub fn build(projected: &Projected, faces: &[[u32; 3]]) -> Self {
        let mut edges: HashMap<(u32, u32), EdgeUse> = HashMap::with_capacity(faces.len() * 3 / 2);
        for &face in faces {
            let area = projected.signed_area(face);
            for (a, b) in face_edges(face) {
                let entry = edges.entry(key(a, b)).or_default();
                entry.faces += 1;
                match area {
                    Some(area) if area > 0.0 => entry.front_facing += 1,
                    Some(_) => {}
                    None => entry.unknown += 1,
                }
            }
        }
        Self { edges }
    }

    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.edges.get(&key(a, b)).is_some_and(|e| {
            e.faces != 2 || e.unknown > 0 || e.front_facing == 1
        })
    }

    pub fn len(&self) -> usize {
        self.edges
            .keys()
            .filter(|&&(a, b)| self.contains(a, b))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn key(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

fn face_edges([a, b, c]: [u32; 3]) -> [(u32, u32); 3] {
    [(a, b), (b, c), (c, a)]
}

/// Blend `image` (row-major, one color per pixel) across silhouette edges.
///
/// All adjustments are computed against the unmodified image and applied
/// together, so the result does not depend on pair traversal order.
pub fn antialias(
    image: &mut [Vec3],
    raster: &RasterBuffer,
    projected: &Projected,
    faces: &[[u32; 3]],
) {
    let (width, height) = (raster.width(), raster.height());
    debug_assert_eq!(image.len(), width as usize * height as usize);
    if width == 0 || height == 0 {
        return;
    }

    let silhouettes = Silhouettes::build(projected, faces);
    if silhouettes.is_empty() {
        return;
    }
    let mut delta = vec![Vec3::ZERO; image.len()];
    let mut blended = 0usize;

    for y in 0..height {
        for x in 0..width {
            if x + 1 < width {
                blended += blend_pair(
                    image, &mut delta, raster, projected, faces, &silhouettes, (x, y), (x + 1, y),
                ) as usize;
            }
            if y + 1 < height {
                blended += blend_pair(
                    image, &mut delta, raster, projected, faces, &silhouettes, (x, y), (x, y + 1),
                ) as usize;
            }
        }
    }

    for (px, d) in image.iter_mut().zip(delta) {
        *px += d;
    }
    tracing::trace!(pairs = blended, silhouettes = silhouettes.len(), "antialias");
}

#[allow(clippy::too_many_arguments)]
fn blend_pair(
    image: &[Vec3],
    delta: &mut [Vec3],
    raster: &RasterBuffer,
    projected: &Projected,
    faces: &[[u32; 3]],
    silhouettes: &Silhouettes,
    a: (u32, u32),
    b: (u32, u32),
) -> bool {
    let fa = raster.get(a.0, a.1);
    let fb = raster.get(b.0, b.1);
    if fa.map(|f| f.triangle) == fb.map(|f| f.triangle) {
        return false;
    }

    let (front, back, frag): ((u32, u32), (u32, u32), &Fragment) = match (fa, fb) {
        (Some(f), None) => (a, b, f),
        (None, Some(f)) => (b, a, f),
        (Some(f), Some(g)) if f.depth <= g.depth => (a, b, f),
        (Some(_), Some(g)) => (b, a, g),
        (None, None) => return false,
    };

    let pf = center(front);
    let pb = center(back);
    let Some(t) = crossing(projected, faces[frag.triangle as usize], silhouettes, pf, pb) else {
        return false;
    };

    let w = raster.width() as usize;
    let fi = front.1 as usize * w + front.0 as usize;
    let bi = back.1 as usize * w + back.0 as usize;
    let (cf, cb) = (image[fi], image[bi]);
    if t < 0.5 {
        delta[fi] += (cb - cf) * (0.5 - t);
    } else {
        delta[bi] += (cf - cb) * (t - 0.5);
    }
    true
}

/// Parameter along `pf -> pb` where a silhouette edge of `face` is crossed.
fn crossing(
    projected: &Projected,
    face: [u32; 3],
    silhouettes: &Silhouettes,
    pf: Vec2,
    pb: Vec2,
) -> Option<f32> {
    for (i, j) in face_edges(face) {
        // Edges reaching past the near plane have no usable screen position.
        if !silhouettes.contains(i, j) || !projected.in_front(i) || !projected.in_front(j) {
            continue;
        }
        let e0 = projected.screen_xy(i);
        let e1 = projected.screen_xy(j);
        let df = edge(e0, e1, pf);
        let db = edge(e0, e1, pb);
        // Both centers on the same side, or the segment lies on the edge line.
        if df * db > 0.0 || df == db {
            continue;
        }
        let t = df / (df - db);
        let hit = pf.lerp(pb, t);
        let dir = e1 - e0;
        let s = (hit - e0).dot(dir) / dir.length_squared();
        if (0.0..=1.0).contains(&s) && t.is_finite() {
            return Some(t.clamp(0.0, 1.0));
        }
    }
    None
}

fn center((x, y): (u32, u32)) -> Vec2 {
    Vec2::new(x as f32 + 0.5, y as f32 + 0.5)
}
