use glam::Vec3;
use sha2::{Digest, Sha256};

/// Rendered image: `height` rows of `width` RGB pixels, row-major, `f32` channels.
///
/// Values are nominally in [0, 1]; depth output is stored raw and may leave
/// that range, so conversions to bytes clamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBuffer {
    width: u32,
    height: u32,
    data: Vec<f32>,
    revision: u64,
}

impl ColorBuffer {
    /// A black buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, Vec3::ZERO)
    }

    pub fn filled(width: u32, height: u32, color: Vec3) -> Self {
        let len = width as usize * height as usize;
        let mut data = Vec::with_capacity(len * 3);
        for _ in 0..len {
            data.extend_from_slice(&color.to_array());
        }
        Self {
            width,
            height,
            data,
            revision: 0,
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: &[Vec3]) -> Self {
        debug_assert_eq!(pixels.len(), width as usize * height as usize);
        let data = pixels.iter().flat_map(|p| p.to_array()).collect();
        Self {
            width,
            height,
            data,
            revision: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Counter bumped by the owner every time the contents are replaced.
    /// Presenters use it to skip re-uploading an unchanged image.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Flat `height * width * 3` view.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec3 {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        Vec3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    /// Same pixels regardless of revision.
    pub fn same_pixels(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data == other.data
    }

    /// RGBA8 bytes, clamped to [0, 1] and fully opaque.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data.len() / 3 * 4);
        for px in self.data.chunks_exact(3) {
            out.extend(px.iter().map(|&c| to_byte(c)));
            out.push(u8::MAX);
        }
        out
    }

    /// RGB8 bytes, clamped to [0, 1].
    pub fn to_rgb8(&self) -> Vec<u8> {
        self.data.iter().map(|&c| to_byte(c)).collect()
    }

    /// SHA-256 over dimensions and raw channel bits, hex encoded.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.width.to_le_bytes());
        hasher.update(self.height.to_le_bytes());
        for c in &self.data {
            hasher.update(c.to_bits().to_le_bytes());
        }
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

fn to_byte(c: f32) -> u8 {
    if c.is_nan() {
        return 0;
    }
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_black() {
        let buf = ColorBuffer::new(4, 3);
        assert_eq!(buf.as_slice().len(), 4 * 3 * 3);
        assert!(buf.as_slice().iter().all(|&c| c == 0.0));
    }

    #[test]
    fn pixel_addressing_is_row_major() {
        let mut pixels = vec![Vec3::ZERO; 6];
        pixels[4] = Vec3::new(0.1, 0.2, 0.3);
        let buf = ColorBuffer::from_pixels(3, 2, &pixels);
        assert_eq!(buf.pixel(1, 1), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(buf.pixel(1, 0), Vec3::ZERO);
    }

    #[test]
    fn bytes_are_clamped() {
        let buf = ColorBuffer::from_pixels(2, 1, &[Vec3::new(-1.0, 0.5, 2.0), Vec3::ONE]);
        assert_eq!(buf.to_rgba8(), vec![0, 128, 255, 255, 255, 255, 255, 255]);
        assert_eq!(buf.to_rgb8().len(), 6);
    }

    #[test]
    fn digest_tracks_contents_not_revision() {
        let mut a = ColorBuffer::filled(2, 2, Vec3::splat(0.25));
        let b = ColorBuffer::filled(2, 2, Vec3::splat(0.25));
        a.set_revision(7);
        assert_eq!(a.digest(), b.digest());
        assert!(a.same_pixels(&b));
        assert_ne!(a.digest(), ColorBuffer::new(2, 2).digest());
    }
}
