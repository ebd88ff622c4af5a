//! Triangle rasterization into a per-pixel fragment record.
//!
//! Pixel `(x, y)` samples its center `(x + 0.5, y + 0.5)`. Row 0 corresponds
//! to NDC `y = -1`; with the Y-flipped projection that is the top of the view.
//!
//! Triangles are clipped against the near plane (`z = -w`) in clip space
//! before rasterization. A clipped triangle becomes a fan of sub-triangles
//! whose corners carry weights over the original three corners, so
//! fragments still report barycentrics of the source face.

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Clip-space `w` below this is treated as behind the eye.
const MIN_CLIP_W: f32 = 1e-5;
/// Screen-space doubled area below which a triangle produces no coverage.
const MIN_SCREEN_AREA: f32 = 1e-12;

/// Vertices transformed for one frame.
#[derive(Debug, Clone)]
pub struct Projected {
    /// Homogeneous clip-space positions.
    pub clip: Vec<Vec4>,
    /// Pixel-space x, y and NDC depth. Meaningless unless [`Projected::in_front`].
    pub screen: Vec<Vec3>,
    pub width: u32,
    pub height: u32,
}

impl Projected {
    pub fn new(mvp: Mat4, vertices: &[Vec3], width: u32, height: u32) -> Self {
        let clip: Vec<Vec4> = vertices.iter().map(|v| mvp * v.extend(1.0)).collect();
        let screen = clip.iter().map(|&c| to_screen(c, width, height)).collect();
        Self {
            clip,
            screen,
            width,
            height,
        }
    }

    /// Whether the vertex lies on the visible side of the near plane.
    pub fn in_front(&self, vertex: u32) -> bool {
        inside(self.clip[vertex as usize])
    }

    pub fn screen_xy(&self, vertex: u32) -> Vec2 {
        self.screen[vertex as usize].truncate()
    }

    /// Doubled signed screen area of the part of a face in front of the near
    /// plane, `None` if nothing of it remains.
    ///
    /// The sign gives the screen winding of the visible part, which for a
    /// planar face is the winding of the whole face.
    pub fn signed_area(&self, face: [u32; 3]) -> Option<f32> {
        if face.iter().all(|&v| self.in_front(v)) {
            let [a, b, c] = face.map(|v| self.screen_xy(v));
            return Some(edge(a, b, c));
        }
        let polygon = clip_near(face.map(|v| self.clip[v as usize]));
        if polygon.len() < 3 {
            return None;
        }
        let pts: Vec<Vec2> = polygon
            .iter()
            .map(|v| to_screen(v.clip, self.width, self.height).truncate())
            .collect();
        Some((1..pts.len() - 1).map(|i| edge(pts[0], pts[i], pts[i + 1])).sum())
    }
}

fn to_screen(clip: Vec4, width: u32, height: u32) -> Vec3 {
    let ndc = clip.truncate() / clip.w;
    Vec3::new(
        (ndc.x + 1.0) * 0.5 * width as f32,
        (ndc.y + 1.0) * 0.5 * height as f32,
        ndc.z,
    )
}

fn inside(c: Vec4) -> bool {
    near_distance(c) >= 0.0 && eye_distance(c) >= 0.0
}

fn near_distance(c: Vec4) -> f32 {
    c.z + c.w
}

fn eye_distance(c: Vec4) -> f32 {
    c.w - MIN_CLIP_W
}

/// Barycentric weights of a triangle's own corners.
const UNIT_BARY: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

/// Corner of a clipped polygon and its weights over the source triangle.
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vec4,
    bary: Vec3,
}

/// Sutherland-Hodgman against the near plane, then against `w = MIN_CLIP_W`.
///
/// The second plane only bites for clip positions that no perspective
/// projection produces, but keeps the divide by `w` finite.
fn clip_near(corners: [Vec4; 3]) -> Vec<ClipVertex> {
    let polygon: Vec<ClipVertex> = corners
        .into_iter()
        .zip(UNIT_BARY)
        .map(|(clip, bary)| ClipVertex { clip, bary })
        .collect();
    let polygon = clip_polygon(&polygon, near_distance);
    clip_polygon(&polygon, eye_distance)
}

fn clip_polygon(polygon: &[ClipVertex], distance: fn(Vec4) -> f32) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, &a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let (da, db) = (distance(a.clip), distance(b.clip));
        if da >= 0.0 {
            out.push(a);
        }
        if (da >= 0.0) != (db >= 0.0) {
            let t = da / (da - db);
            out.push(ClipVertex {
                clip: a.clip.lerp(b.clip, t),
                bary: a.bary.lerp(b.bary, t),
            });
        }
    }
    out
}

/// Nearest surface seen through one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    /// Index into the mesh's face list.
    pub triangle: u32,
    /// Perspective-correct barycentric weights of the three corners.
    pub bary: Vec3,
    /// Clip-space depth `z / w`, in [-1, 1].
    pub depth: f32,
}

/// Per-pixel rasterizer output; `None` means no coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    fragments: Vec<Option<Fragment>>,
}

impl RasterBuffer {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fragments: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&Fragment> {
        self.fragments[self.index(x, y)].as_ref()
    }

    pub fn fragments(&self) -> &[Option<Fragment>] {
        &self.fragments
    }

    pub fn covered_pixels(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_some()).count()
    }

    /// Coverage mask, row-major.
    pub fn coverage(&self) -> Vec<bool> {
        self.fragments.iter().map(Option::is_some).collect()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Counters from one rasterization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    /// Triangles with at least some coverage candidate, clipped ones included.
    pub triangles_drawn: usize,
    /// Triangles cut by the near plane and drawn as a fan.
    pub triangles_clipped: usize,
    /// Triangles entirely behind the near plane.
    pub triangles_behind: usize,
    pub triangles_degenerate: usize,
}

/// Corner of a triangle handed to the scan loop.
#[derive(Debug, Clone, Copy)]
struct Corner {
    screen: Vec3,
    inv_w: f32,
    /// Weights over the source face's corners.
    bary: Vec3,
}

/// Rasterize `faces` with a nearest-depth test.
///
/// Both windings are drawn. Parts of triangles behind the near plane are
/// clipped away, fragments outside the depth range are discarded, and on
/// equal depth the earlier face wins.
pub fn rasterize(projected: &Projected, faces: &[[u32; 3]]) -> (RasterBuffer, RasterStats) {
    let (width, height) = (projected.width, projected.height);
    let mut raster = RasterBuffer::empty(width, height);
    let mut stats = RasterStats::default();
    if width == 0 || height == 0 {
        return (raster, stats);
    }

    for (tri, &face) in faces.iter().enumerate() {
        let tri = tri as u32;
        if face.iter().all(|&v| projected.in_front(v)) {
            let corners = std::array::from_fn(|i| {
                let v = face[i] as usize;
                Corner {
                    screen: projected.screen[v],
                    inv_w: 1.0 / projected.clip[v].w,
                    bary: UNIT_BARY[i],
                }
            });
            if scan(&mut raster, tri, corners) {
                stats.triangles_drawn += 1;
            } else {
                stats.triangles_degenerate += 1;
            }
            continue;
        }

        let polygon = clip_near(face.map(|v| projected.clip[v as usize]));
        if polygon.len() < 3 {
            stats.triangles_behind += 1;
            continue;
        }
        let corners: Vec<Corner> = polygon
            .iter()
            .map(|v| Corner {
                screen: to_screen(v.clip, width, height),
                inv_w: 1.0 / v.clip.w,
                bary: v.bary,
            })
            .collect();
        let mut drawn = false;
        for i in 1..corners.len() - 1 {
            drawn |= scan(&mut raster, tri, [corners[0], corners[i], corners[i + 1]]);
        }
        if drawn {
            stats.triangles_drawn += 1;
            stats.triangles_clipped += 1;
        } else {
            stats.triangles_degenerate += 1;
        }
    }

    tracing::trace!(
        drawn = stats.triangles_drawn,
        clipped = stats.triangles_clipped,
        behind = stats.triangles_behind,
        degenerate = stats.triangles_degenerate,
        "rasterized"
    );
    (raster, stats)
}

/// Scan one screen triangle into `raster` as face `tri`. Returns `false`
/// for a degenerate triangle.
fn scan(raster: &mut RasterBuffer, tri: u32, corners: [Corner; 3]) -> bool {
    let (width, height) = (raster.width, raster.height);
    let [p0, p1, p2] = corners.map(|c| c.screen.truncate());
    let area = edge(p0, p1, p2);
    if !area.is_finite() || area.abs() < MIN_SCREEN_AREA {
        return false;
    }
    let z = Vec3::new(corners[0].screen.z, corners[1].screen.z, corners[2].screen.z);
    let inv_w = Vec3::new(corners[0].inv_w, corners[1].inv_w, corners[2].inv_w);

    let lo = p0.min(p1).min(p2);
    let hi = p0.max(p1).max(p2);
    if hi.x < 0.0 || hi.y < 0.0 || lo.x > width as f32 || lo.y > height as f32 {
        return true;
    }
    let max_x = (width - 1) as f32;
    let max_y = (height - 1) as f32;
    let x0 = lo.x.floor().clamp(0.0, max_x) as u32;
    let x1 = hi.x.ceil().clamp(0.0, max_x) as u32;
    let y0 = lo.y.floor().clamp(0.0, max_y) as u32;
    let y1 = hi.y.ceil().clamp(0.0, max_y) as u32;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let c = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let b = Vec3::new(edge(p1, p2, c), edge(p2, p0, c), edge(p0, p1, c)) / area;
            if b.min_element() < 0.0 {
                continue;
            }
            let depth = b.dot(z);
            if !(-1.0..=1.0).contains(&depth) {
                continue;
            }
            let slot = &mut raster.fragments[y as usize * width as usize + x as usize];
            if slot.is_some_and(|f| f.depth <= depth) {
                continue;
            }
            let q = b * inv_w;
            let w = q / q.element_sum();
            let bary = corners[0].bary * w.x + corners[1].bary * w.y + corners[2].bary * w.z;
            *slot = Some(Fragment {
                triangle: tri,
                bary,
                depth,
            });
        }
    }
    true
}

/// Doubled signed area of `(a, b, c)`; positive when counter-clockwise in pixel axes.
pub fn edge(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Screen-aligned triangle built directly in clip space with w = 1.
    fn projected(points: &[Vec3], width: u32, height: u32) -> Projected {
        Projected::new(Mat4::IDENTITY, points, width, height)
    }

    #[test]
    fn full_screen_quad_covers_everything() {
        let pts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let p = projected(&pts, 8, 6);
        let (raster, stats) = rasterize(&p, &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(raster.covered_pixels(), 48);
        assert_eq!(stats.triangles_drawn, 2);
    }

    #[test]
    fn both_windings_are_drawn() {
        let pts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let p = projected(&pts, 4, 4);
        let (ccw, _) = rasterize(&p, &[[0, 1, 2]]);
        let (cw, _) = rasterize(&p, &[[0, 2, 1]]);
        assert_eq!(ccw.coverage(), cw.coverage());
        assert!(ccw.covered_pixels() > 0);
    }

    #[test]
    fn nearer_triangle_wins() {
        let pts = [
            Vec3::new(-1.0, -1.0, 0.5),
            Vec3::new(3.0, -1.0, 0.5),
            Vec3::new(-1.0, 3.0, 0.5),
            Vec3::new(-1.0, -1.0, -0.5),
            Vec3::new(3.0, -1.0, -0.5),
            Vec3::new(-1.0, 3.0, -0.5),
        ];
        let p = projected(&pts, 4, 4);
        let (raster, _) = rasterize(&p, &[[0, 1, 2], [3, 4, 5]]);
        let frag = raster.get(1, 1).unwrap();
        assert_eq!(frag.triangle, 1);
        assert!((frag.depth + 0.5).abs() < 1e-6);
    }

    #[test]
    fn out_of_depth_range_is_discarded() {
        let pts = [
            Vec3::new(-1.0, -1.0, 1.5),
            Vec3::new(3.0, -1.0, 1.5),
            Vec3::new(-1.0, 3.0, 1.5),
        ];
        let (raster, _) = rasterize(&projected(&pts, 4, 4), &[[0, 1, 2]]);
        assert_eq!(raster.covered_pixels(), 0);
    }

    #[test]
    fn degenerate_triangle_has_no_coverage() {
        let pts = [Vec3::ZERO, Vec3::new(0.5, 0.5, 0.0), Vec3::new(1.0, 1.0, 0.0)];
        let (raster, stats) = rasterize(&projected(&pts, 4, 4), &[[0, 1, 2]]);
        assert_eq!(raster.covered_pixels(), 0);
        assert_eq!(stats.triangles_degenerate, 1);
    }

    fn from_clip(clip: Vec<Vec4>, width: u32, height: u32) -> Projected {
        let screen = clip.iter().map(|&c| to_screen(c, width, height)).collect();
        Projected {
            clip,
            screen,
            width,
            height,
        }
    }

    #[test]
    fn fully_behind_eye_is_skipped() {
        let clip = vec![
            Vec4::new(0.0, 0.0, 0.0, -1.0),
            Vec4::new(1.0, 0.0, 0.0, -1.0),
            Vec4::new(0.0, 1.0, 0.0, -2.0),
        ];
        let (raster, stats) = rasterize(&from_clip(clip, 4, 4), &[[0, 1, 2]]);
        assert_eq!(raster.covered_pixels(), 0);
        assert_eq!(stats.triangles_behind, 1);
        assert_eq!(stats.triangles_drawn, 0);
    }

    #[test]
    fn near_plane_cuts_triangle() {
        // Corner 2 sits past the near plane (z < -w); the rest is drawn.
        let clip = vec![
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, -3.0, 1.0),
        ];
        let p = from_clip(clip, 8, 8);
        let (raster, stats) = rasterize(&p, &[[0, 1, 2]]);
        assert_eq!(stats.triangles_clipped, 1);
        assert_eq!(stats.triangles_drawn, 1);
        // z reaches -1 halfway up, so only the lower rows are covered.
        assert!(raster.get(4, 0).is_some());
        assert!(raster.get(4, 6).is_none());
        for frag in raster.fragments().iter().flatten() {
            assert!((frag.bary.element_sum() - 1.0).abs() < 1e-5);
            assert!(frag.bary.min_element() >= -1e-6);
            assert!(frag.depth >= -1.0);
        }
    }

    #[test]
    fn clipped_fragments_keep_source_barycentrics() {
        let clip = vec![
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, -3.0, 1.0),
        ];
        let (raster, _) = rasterize(&from_clip(clip, 8, 8), &[[0, 1, 2]]);
        // Center of pixel (4, 0) is NDC (0.125, -0.875); with w = 1 the
        // weights over the uncut triangle are affine in screen space.
        let bary = raster.get(4, 0).unwrap().bary;
        let expected = Vec3::new(0.40625, 0.53125, 0.0625);
        assert!(bary.abs_diff_eq(expected, 1e-5), "{bary}");
    }

    #[test]
    fn ground_plane_through_the_eye_is_drawn() {
        // The far corner sits behind the camera at z = 3.
        let camera = crate::OrbitCamera::new(64, 64, 3.0, 50.0).unwrap();
        let pts = [
            Vec3::new(-1.0, -0.5, 0.0),
            Vec3::new(1.0, -0.5, 0.0),
            Vec3::new(0.0, -0.5, 10.0),
        ];
        let p = Projected::new(camera.view_projection(), &pts, 64, 64);
        let (raster, stats) = rasterize(&p, &[[0, 1, 2]]);
        assert!(raster.covered_pixels() > 0);
        assert_eq!(stats.triangles_clipped, 1);
        assert!(p.signed_area([0, 1, 2]).is_some());
    }

    #[test]
    fn face_index_survives_the_fan() {
        let clip = vec![
            Vec4::new(5.0, 5.0, 0.0, 1.0),
            Vec4::new(6.0, 5.0, 0.0, 1.0),
            Vec4::new(5.0, 6.0, 0.0, 1.0),
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, -3.0, 1.0),
        ];
        let (raster, stats) = rasterize(&from_clip(clip, 8, 8), &[[0, 1, 2], [3, 4, 5]]);
        assert_eq!(stats.triangles_clipped, 1);
        assert_eq!(raster.get(4, 0).unwrap().triangle, 1);
    }

    #[test]
    fn barycentrics_sum_to_one() {
        let pts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.2),
            Vec3::new(-1.0, 1.0, -0.2),
        ];
        let (raster, _) = rasterize(&projected(&pts, 16, 16), &[[0, 1, 2]]);
        for frag in raster.fragments().iter().flatten() {
            assert!((frag.bary.element_sum() - 1.0).abs() < 1e-5);
            assert!(frag.bary.min_element() >= 0.0);
        }
    }

    #[test]
    fn row_zero_is_negative_ndc_y() {
        // Triangle confined to the lower half of NDC (y < 0).
        let pts = [
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(0.0, -0.1, 0.0),
        ];
        let (raster, _) = rasterize(&projected(&pts, 8, 8), &[[0, 1, 2]]);
        assert!(raster.get(4, 0).is_some());
        assert!(raster.get(4, 7).is_none());
    }
}
