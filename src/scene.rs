//! glTF scene import.
//!
//! Flattens a glTF document into world-space mesh data ready for GPU
//! upload: positions, normals, indices, a per-primitive base color and
//! overall scene bounds. No GPU types live here, so the CLI can reuse
//! the loader for offline inspection.

use std::path::Path;

use glam::{Mat4, Quat, Vec3};

use crate::util::{Error, Result};

/// One flattened mesh primitive with its world transform.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    /// Node-chain transform, local to world.
    pub transform: Mat4,
    /// Base color factor of the primitive's PBR material.
    pub base_color: [f32; 4],
}

/// A loaded scene: flattened primitives plus traversal counts.
#[derive(Debug, Clone, Default)]
pub struct SceneData {
    pub meshes: Vec<MeshData>,
    pub node_count: usize,
    pub mesh_count: usize,
}

impl SceneData {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.positions.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.indices.len() / 3).sum()
    }

    /// World-space axis-aligned bounds, `None` for an empty scene.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;
        for mesh in &self.meshes {
            for p in &mesh.positions {
                let world = mesh.transform.transform_point3(Vec3::from(*p));
                min = min.min(world);
                max = max.max(world);
                any = true;
            }
        }
        any.then_some((min, max))
    }

    /// Center and radius enclosing the scene; unit sphere when empty.
    pub fn bounding_sphere(&self) -> (Vec3, f32) {
        match self.bounds() {
            Some((min, max)) => ((min + max) * 0.5, (max - min).length() * 0.5),
            None => (Vec3::ZERO, 1.0),
        }
    }
}

/// Import a .gltf/.glb file and flatten every scene in the document.
pub fn load_gltf(path: &Path) -> Result<SceneData> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("gltf") | Some("glb") => {}
        _ => return Err(Error::UnsupportedFormat(path.to_path_buf())),
    }

    let (document, buffers, _images) = gltf::import(path)?;

    let mut scene = SceneData::default();
    for doc_scene in document.scenes() {
        for node in doc_scene.nodes() {
            process_node(&node, &buffers, Mat4::IDENTITY, &mut scene)?;
        }
    }

    if scene.meshes.is_empty() {
        return Err(Error::invalid(format!(
            "no mesh primitives in {}",
            path.display()
        )));
    }

    tracing::info!(
        nodes = scene.node_count,
        meshes = scene.mesh_count,
        vertices = scene.vertex_count(),
        triangles = scene.triangle_count(),
        "loaded glTF scene from {}",
        path.display()
    );
    Ok(scene)
}

fn process_node(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    parent: Mat4,
    out: &mut SceneData,
) -> Result<()> {
    let (translation, rotation, scale) = node.transform().decomposed();
    let local = Mat4::from_scale_rotation_translation(
        Vec3::from(scale),
        Quat::from_array(rotation),
        Vec3::from(translation),
    );
    let world = parent * local;
    out.node_count += 1;

    if let Some(mesh) = node.mesh() {
        out.mesh_count += 1;
        let mesh_name = mesh.name().unwrap_or("unnamed").to_string();

        for primitive in mesh.primitives() {
            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| Error::MissingPositions(mesh_name.clone()))?
                .collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(idx) => idx.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let normals: Vec<[f32; 3]> = match reader.read_normals() {
                Some(n) => n.collect(),
                None => accumulate_normals(&positions, &indices),
            };

            let base_color = primitive
                .material()
                .pbr_metallic_roughness()
                .base_color_factor();

            tracing::debug!(
                vertices = positions.len(),
                indices = indices.len(),
                "primitive in mesh '{}'",
                mesh_name
            );

            out.meshes.push(MeshData {
                name: mesh_name.clone(),
                positions,
                normals,
                indices,
                transform: world,
                base_color,
            });
        }
    }

    for child in node.children() {
        process_node(&child, buffers, world, out)?;
    }
    Ok(())
}

/// Area-weighted vertex normals for primitives that ship without them.
fn accumulate_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from(positions[a]);
        let pb = Vec3::from(positions[b]);
        let pc = Vec3::from(positions[c]);
        // Cross product length carries the face area weighting.
        let n = (pb - pa).cross(pc - pa);
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals
        .into_iter()
        .map(|n| n.normalize_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Triangle (0,0,0) (1,0,0) (0,1,0) as little-endian f32 vec3s.
    const TRIANGLE_B64: &str = "AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA";

    fn minimal_gltf() -> String {
        format!(
            r#"{{
  "asset": {{"version": "2.0"}},
  "scene": 0,
  "scenes": [{{"nodes": [0]}}],
  "nodes": [{{"mesh": 0, "translation": [2.0, 0.0, 0.0]}}],
  "meshes": [{{"name": "tri", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}],
  "buffers": [{{"uri": "data:application/octet-stream;base64,{TRIANGLE_B64}", "byteLength": 36}}],
  "bufferViews": [{{"buffer": 0, "byteOffset": 0, "byteLength": 36}}],
  "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                  "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}}]
}}"#
        )
    }

    fn write_asset(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("tri.gltf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(minimal_gltf().as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let scene = load_gltf(&write_asset(&dir)).unwrap();

        assert_eq!(scene.meshes.len(), 1);
        assert_eq!(scene.node_count, 1);
        assert_eq!(scene.vertex_count(), 3);
        assert_eq!(scene.triangle_count(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.name, "tri");
        // No index accessor: sequential fallback.
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        // No normals: accumulated fallback, all +Z for this winding.
        for n in &mesh.normals {
            assert!((Vec3::from(*n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_node_transform_reaches_bounds() {
        let dir = tempfile::tempdir().unwrap();
        let scene = load_gltf(&write_asset(&dir)).unwrap();
        let (min, max) = scene.bounds().unwrap();
        // Node translation (2,0,0) shifts the unit triangle.
        assert!((min.x - 2.0).abs() < 1e-6);
        assert!((max.x - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file() {
        let err = load_gltf(Path::new("/nonexistent/model.gltf")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.obj");
        std::fs::write(&path, b"o cube").unwrap();
        let err = load_gltf(&path).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_accumulate_normals_flat_quad() {
        let positions = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        let normals = accumulate_normals(&positions, &indices);
        for n in normals {
            assert!((Vec3::from(n) - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_empty_scene_sphere() {
        let scene = SceneData::default();
        let (center, radius) = scene.bounding_sphere();
        assert_eq!(center, Vec3::ZERO);
        assert_eq!(radius, 1.0);
    }
}
