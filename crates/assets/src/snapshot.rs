use std::path::Path;

use image::{ExtendedColorType, ImageFormat};
use orbitview_common::{ColorBuffer, Texture};

use crate::AssetError;

/// Save a rendered frame as an 8-bit RGB PNG, channels clamped to [0, 1].
pub fn write_png(buffer: &ColorBuffer, path: impl AsRef<Path>) -> Result<(), AssetError> {
    let path = path.as_ref();
    image::save_buffer_with_format(
        path,
        &buffer.to_rgb8(),
        buffer.width(),
        buffer.height(),
        ExtendedColorType::Rgb8,
        ImageFormat::Png,
    )?;
    tracing::debug!(path = %path.display(), width = buffer.width(), height = buffer.height(), "png written");
    Ok(())
}

/// Save a texture as an 8-bit RGB PNG. Row 0 of the texture is the top row.
pub fn write_texture_png(texture: &Texture, path: impl AsRef<Path>) -> Result<(), AssetError> {
    let bytes: Vec<u8> = texture
        .texels()
        .iter()
        .flat_map(|t| t.to_array())
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    image::save_buffer_with_format(
        path.as_ref(),
        &bytes,
        texture.width(),
        texture.height(),
        ExtendedColorType::Rgb8,
        ImageFormat::Png,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn frame_round_trips_through_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let buffer = ColorBuffer::from_pixels(
            2,
            1,
            &[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 2.0, -1.0)],
        );
        write_png(&buffer, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (2, 1));
        assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0]);
    }

    #[test]
    fn texture_rows_keep_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");
        let tex = Texture::new(1, 2, vec![Vec3::ONE, Vec3::ZERO]).unwrap();
        write_texture_png(&tex, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(img.get_pixel(0, 1).0, [0, 0, 0]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("frame.png");
        assert!(write_png(&ColorBuffer::new(1, 1), &path).is_err());
    }
}
