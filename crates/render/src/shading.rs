//! Per-pixel shading passes over a rasterized frame.

use std::ops::{Add, Mul};

use glam::{Vec2, Vec3};
use orbitview_common::{FaceAttribute, LightDirection, Mesh, ShadingMode, safe_normalize};

use crate::antialias::antialias;
use crate::raster::{Fragment, Projected, RasterBuffer};

/// Everything a shading pass reads.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub mesh: &'a Mesh,
    pub raster: &'a RasterBuffer,
    pub projected: &'a Projected,
}

/// Lighting parameters for [`ShadingMode::Lambertian`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub light: LightDirection,
    pub ambient_ratio: f32,
}

/// Run the pass for `mode`, one color per pixel, row-major.
pub fn shade(frame: Frame<'_>, mode: ShadingMode, lighting: Lighting) -> Vec<Vec3> {
    match mode {
        ShadingMode::Depth => depth(frame.raster),
        ShadingMode::Albedo => albedo(frame),
        ShadingMode::Normal => normal(frame),
        ShadingMode::Lambertian => lambertian(frame, lighting),
    }
}

/// Barycentric blend of the three corner values of the fragment's face.
pub fn interpolate<T>(attr: &FaceAttribute<T>, frag: &Fragment) -> T
where
    T: Copy + Mul<f32, Output = T> + Add<Output = T>,
{
    let [a, b, c] = attr.corners(frag.triangle as usize);
    a * frag.bary.x + b * frag.bary.y + c * frag.bary.z
}

/// Raw clip-space depth replicated to three channels; background is 0.
pub fn depth(raster: &RasterBuffer) -> Vec<Vec3> {
    raster
        .fragments()
        .iter()
        .map(|f| f.map_or(Vec3::ZERO, |f| Vec3::splat(f.depth)))
        .collect()
}

/// Texture color, antialiased and clamped to [0, 1]; background is black.
///
/// A mesh without UVs shades white wherever it covers.
pub fn albedo(frame: Frame<'_>) -> Vec<Vec3> {
    let mesh = frame.mesh;
    let mut image: Vec<Vec3> = frame
        .raster
        .fragments()
        .iter()
        .map(|f| match (f, &mesh.uv) {
            (None, _) => Vec3::ZERO,
            (Some(_), None) => Vec3::ONE,
            (Some(f), Some(uv)) => {
                let coord: Vec2 = interpolate(uv, f);
                mesh.albedo.sample_bilinear(coord)
            }
        })
        .collect();
    antialias(&mut image, frame.raster, frame.projected, &mesh.faces);
    clamp_all(&mut image);
    image
}

/// Unit surface normals; background and meshes without normals get zero.
fn normal_field(frame: Frame<'_>) -> Vec<Vec3> {
    let Some(normals) = &frame.mesh.normals else {
        return vec![Vec3::ZERO; frame.raster.fragments().len()];
    };
    frame
        .raster
        .fragments()
        .iter()
        .map(|f| f.map_or(Vec3::ZERO, |f| safe_normalize(interpolate(normals, &f))))
        .collect()
}

/// Normals mapped from [-1, 1] to [0, 1]. Not antialiased.
pub fn normal(frame: Frame<'_>) -> Vec<Vec3> {
    normal_field(frame)
        .into_iter()
        .map(|n| (n + Vec3::ONE) * 0.5)
        .collect()
}

/// `albedo * (ambient + (1 - ambient) * max(0, n . l))`, clamped.
pub fn lambertian(frame: Frame<'_>, lighting: Lighting) -> Vec<Vec3> {
    let l = lighting.light.to_vector();
    let a = lighting.ambient_ratio;
    let mut image = albedo(frame);
    for (px, n) in image.iter_mut().zip(normal_field(frame)) {
        let lit = a + (1.0 - a) * n.dot(l).max(0.0);
        *px = (*px * lit).clamp(Vec3::ZERO, Vec3::ONE);
    }
    image
}

fn clamp_all(image: &mut [Vec3]) {
    for px in image {
        *px = px.clamp(Vec3::ZERO, Vec3::ONE);
    }
}
