use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use orbitview_common::Mesh;
use orbitview_kernel::{ExportError, MeshExporter};

use crate::AssetError;
use crate::snapshot::write_texture_png;

const MATERIAL: &str = "albedo";

/// Paths written by one [`export_obj`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjFiles {
    pub obj: PathBuf,
    pub mtl: PathBuf,
    pub texture: PathBuf,
}

impl ObjFiles {
    fn beside(path: &Path) -> Result<Self, AssetError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AssetError::NoFileName(path.to_path_buf()))?;
        Ok(Self {
            obj: path.with_extension("obj"),
            mtl: path.with_file_name(format!("{stem}.mtl")),
            texture: path.with_file_name(format!("{stem}_albedo.png")),
        })
    }
}

/// Write `mesh` as OBJ + MTL + albedo PNG next to `path`.
pub fn export_obj(mesh: &Mesh, path: impl AsRef<Path>) -> Result<ObjFiles, AssetError> {
    let files = ObjFiles::beside(path.as_ref())?;
    let name = |p: &Path| p.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_owned();

    let mut out = BufWriter::new(File::create(&files.obj)?);
    write_obj(mesh, Some(&name(&files.mtl)), &mut out)?;
    out.flush()?;

    let mut out = BufWriter::new(File::create(&files.mtl)?);
    write_mtl(&name(&files.texture), &mut out)?;
    out.flush()?;

    write_texture_png(&mesh.albedo, &files.texture)?;

    tracing::info!(
        obj = %files.obj.display(),
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "mesh exported"
    );
    Ok(files)
}

/// Serialize `mesh` as Wavefront OBJ.
///
/// UVs are written with `v` flipped, since OBJ puts `v = 0` at the bottom of
/// the image while [`orbitview_common::Texture`] puts row 0 at `v = 0`.
pub fn write_obj(mesh: &Mesh, mtl: Option<&str>, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "# orbitview mesh")?;
    if let Some(mtl) = mtl {
        writeln!(out, "mtllib {mtl}")?;
    }
    for v in &mesh.vertices {
        writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
    }
    if let Some(uv) = &mesh.uv {
        for t in &uv.values {
            writeln!(out, "vt {} {}", t.x, 1.0 - t.y)?;
        }
    }
    if let Some(normals) = &mesh.normals {
        for n in &normals.values {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
    }
    if mtl.is_some() {
        writeln!(out, "usemtl {MATERIAL}")?;
    }

    let uv_faces = mesh.uv.as_ref().map(|a| &a.faces);
    let normal_faces = mesh.normals.as_ref().map(|a| &a.faces);
    for (i, face) in mesh.faces.iter().enumerate() {
        write!(out, "f")?;
        for corner in 0..3 {
            let v = face[corner] + 1;
            let t = uv_faces.map(|f| f[i][corner] + 1);
            let n = normal_faces.map(|f| f[i][corner] + 1);
            match (t, n) {
                (Some(t), Some(n)) => write!(out, " {v}/{t}/{n}")?,
                (Some(t), None) => write!(out, " {v}/{t}")?,
                (None, Some(n)) => write!(out, " {v}//{n}")?,
                (None, None) => write!(out, " {v}")?,
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Material library with a single diffuse texture.
pub fn write_mtl(texture: &str, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "newmtl {MATERIAL}")?;
    writeln!(out, "Ka 0 0 0")?;
    writeln!(out, "Kd 1 1 1")?;
    writeln!(out, "Ks 0 0 0")?;
    writeln!(out, "illum 1")?;
    writeln!(out, "map_Kd {texture}")?;
    Ok(())
}

/// [`MeshExporter`] writing OBJ bundles to disk.
#[derive(Debug, Default, Clone)]
pub struct ObjExporter {
    last: Option<ObjFiles>,
}

impl ObjExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files written by the most recent successful export.
    pub fn last(&self) -> Option<&ObjFiles> {
        self.last.as_ref()
    }
}

impl MeshExporter for ObjExporter {
    fn export(&mut self, mesh: &Mesh, path: &Path) -> Result<(), ExportError> {
        self.last = Some(export_obj(mesh, path)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};
    use orbitview_common::{FaceAttribute, Texture};

    fn quad() -> Mesh {
        let mut mesh = Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
        .with_uv(FaceAttribute::new(
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            vec![[0, 1, 2], [0, 2, 3]],
        ))
        .with_albedo(Texture::new(2, 1, vec![Vec3::ONE, Vec3::X]).unwrap());
        mesh.compute_vertex_normals();
        mesh
    }

    fn obj_text(mesh: &Mesh, mtl: Option<&str>) -> String {
        let mut out = Vec::new();
        write_obj(mesh, mtl, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn obj_lists_every_attribute() {
        let text = obj_text(&quad(), Some("mesh.mtl"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 4);
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 4);
        assert!(text.contains("mtllib mesh.mtl"));
        assert!(text.contains("f 1/1/1 2/2/2 3/3/3"));
    }

    #[test]
    fn uv_v_is_flipped() {
        let text = obj_text(&quad(), None);
        let vts: Vec<&str> = text.lines().filter(|l| l.starts_with("vt ")).collect();
        assert_eq!(vts[0], "vt 0 1");
        assert_eq!(vts[2], "vt 1 0");
    }

    #[test]
    fn bare_mesh_writes_position_only_faces() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]);
        let text = obj_text(&mesh, None);
        assert!(text.contains("f 1 2 3"));
        assert!(!text.contains("usemtl"));
    }

    #[test]
    fn split_topologies_keep_their_own_indices() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]).with_uv(
            FaceAttribute::new(vec![Vec2::ZERO; 6], vec![[3, 4, 5]]),
        );
        assert!(obj_text(&mesh, None).contains("f 1/4 2/5 3/6"));
    }

    #[test]
    fn export_writes_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = export_obj(&quad(), dir.path().join("mesh.obj")).unwrap();
        assert_eq!(files.mtl, dir.path().join("mesh.mtl"));
        assert_eq!(files.texture, dir.path().join("mesh_albedo.png"));

        let mtl = std::fs::read_to_string(&files.mtl).unwrap();
        assert!(mtl.contains("map_Kd mesh_albedo.png"));
        let img = image::open(&files.texture).unwrap();
        assert_eq!((img.width(), img.height()), (2, 1));
    }

    #[test]
    fn exporter_remembers_last_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let mut exporter = ObjExporter::new();
        exporter.export(&quad(), &dir.path().join("out.obj")).unwrap();
        assert!(exporter.last().unwrap().obj.exists());
    }

    #[test]
    fn path_without_stem_is_rejected() {
        assert!(matches!(
            export_obj(&quad(), Path::new("/")),
            Err(AssetError::NoFileName(_))
        ));
    }
}
