use glam::{Vec2, Vec3};

/// Errors from texture construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextureError {
    #[error("texture must be at least 1x1, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("texture {width}x{height} expects {expected} texels, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// RGB texture with linear `f32` texels, row-major, row 0 at `v = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    texels: Vec<Vec3>,
}

impl Texture {
    pub fn new(width: u32, height: u32, texels: Vec<Vec3>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::Empty { width, height });
        }
        let expected = width as usize * height as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// A 1x1 texture of the given color.
    pub fn solid(color: Vec3) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// Build a texture by evaluating `f(u, v)` at every texel center.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(f32, f32) -> Vec3) -> Result<Self, TextureError> {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                let u = (x as f32 + 0.5) / width as f32;
                let v = (y as f32 + 0.5) / height as f32;
                texels.push(f(u, v));
            }
        }
        Self::new(width, height, texels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texels(&self) -> &[Vec3] {
        &self.texels
    }

    pub fn texel(&self, x: u32, y: u32) -> Vec3 {
        self.texels[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear sample with wrap addressing. Texel centers sit at half-integer
    /// positions, so `uv = (0.5 / w, 0.5 / h)` returns texel (0, 0) exactly.
    ///
    /// Non-finite coordinates sample the origin instead of producing NaN.
    pub fn sample_bilinear(&self, uv: Vec2) -> Vec3 {
        let uv = if uv.is_finite() { uv } else { Vec2::ZERO };
        // Reduce to one period before scaling; huge coordinates would
        // otherwise saturate the integer casts below.
        let uv = uv - uv.floor();
        let x = uv.x * self.width as f32 - 0.5;
        let y = uv.y * self.height as f32 - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;

        let xi0 = wrap(x0 as i64, self.width);
        let xi1 = wrap(x0 as i64 + 1, self.width);
        let yi0 = wrap(y0 as i64, self.height);
        let yi1 = wrap(y0 as i64 + 1, self.height);

        let top = self.texel(xi0, yi0).lerp(self.texel(xi1, yi0), fx);
        let bottom = self.texel(xi0, yi1).lerp(self.texel(xi1, yi1), fx);
        top.lerp(bottom, fy)
    }
}

fn wrap(i: i64, size: u32) -> u32 {
    i.rem_euclid(size as i64) as u32
}
