//! File output: Wavefront OBJ export of meshes and PNG snapshots.
//!
//! An export writes three files side by side: `<stem>.obj`, `<stem>.mtl`
//! and `<stem>_albedo.png`. Positions, UVs and normals keep their own
//! index topologies, so seam vertices survive the round trip.

mod obj;
mod snapshot;

pub use obj::{ObjExporter, ObjFiles, export_obj, write_mtl, write_obj};
pub use snapshot::{write_png, write_texture_png};

use orbitview_kernel::ExportError;

/// Errors from asset output.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("export path has no file name: {0}")]
    NoFileName(std::path::PathBuf),
}

impl From<AssetError> for ExportError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::Io(e) => ExportError::Io(e),
            other => ExportError::Encode(other.to_string()),
        }
    }
}

pub fn crate_info() -> &'static str {
    "orbitview-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }

    #[test]
    fn io_errors_stay_io() {
        let err: ExportError = AssetError::Io(std::io::Error::other("disk")).into();
        assert!(matches!(err, ExportError::Io(_)));
        let err: ExportError = AssetError::NoFileName("/".into()).into();
        assert!(matches!(err, ExportError::Encode(_)));
    }
}
