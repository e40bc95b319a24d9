//! Model decoding
//!
//! Turns raw asset bytes into meshes and materials. Binary glTF is the
//! primary format; Wavefront OBJ is supported for simple untextured models.
//! glTF node transforms are baked into the vertex data so the rest of the
//! engine only deals in flat object lists.

use cgmath::{InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};

use crate::error::ViewerError;
use crate::gfx::resources::Material;
use crate::session::ModelFormat;

use super::object::Mesh;
use super::vertex::Vertex3D;

/// One decoded primitive group: a mesh plus the material it was authored
/// with, if any.
pub struct DecodedPrimitive {
    pub mesh: Mesh,
    pub material: Option<Material>,
}

/// Decodes a model buffer into primitive groups.
///
/// `name` seeds material names so registered materials stay unique per
/// model.
pub fn decode_model(
    name: &str,
    format: ModelFormat,
    bytes: &[u8],
) -> Result<Vec<DecodedPrimitive>, ViewerError> {
    let primitives = match format {
        ModelFormat::Glb => decode_glb(name, bytes)?,
        ModelFormat::Obj => decode_obj(name, bytes)?,
    };
    if primitives.is_empty() {
        return Err(ViewerError::ModelDecode {
            name: name.to_string(),
            reason: "model contains no triangle geometry".to_string(),
        });
    }
    Ok(primitives)
}

fn decode_error(name: &str, reason: impl ToString) -> ViewerError {
    ViewerError::ModelDecode {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn decode_glb(name: &str, bytes: &[u8]) -> Result<Vec<DecodedPrimitive>, ViewerError> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|e| decode_error(name, e))?;

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| decode_error(name, "no scene in glTF document"))?;

    let mut primitives = Vec::new();
    for node in scene.nodes() {
        decode_node(name, &node, Matrix4::identity(), &buffers, &mut primitives)?;
    }
    Ok(primitives)
}

fn decode_node(
    name: &str,
    node: &gltf::Node,
    parent_transform: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<DecodedPrimitive>,
) -> Result<(), ViewerError> {
    let local: Matrix4<f32> = node.transform().matrix().into();
    let transform = parent_transform * local;

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d.0[..]));

            let positions: Vec<[f32; 3]> = reader
                .read_positions()
                .ok_or_else(|| decode_error(name, "primitive has no positions"))?
                .collect();
            let normals: Option<Vec<[f32; 3]>> =
                reader.read_normals().map(|normals| normals.collect());
            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };
            validate_indices(name, &indices, positions.len())?;

            let vertices = bake_transform(&positions, normals.as_deref(), &indices, transform);

            let pbr = primitive.material().pbr_metallic_roughness();
            let material = Material::new(
                &format!("{}_{}", name, out.len()),
                pbr.base_color_factor(),
                pbr.metallic_factor(),
                pbr.roughness_factor(),
            );

            out.push(DecodedPrimitive {
                mesh: Mesh::from_vertices(vertices, indices.clone()),
                material: Some(material),
            });
        }
    }

    for child in node.children() {
        decode_node(name, &child, transform, buffers, out)?;
    }
    Ok(())
}

/// Triangle primitives must carry whole triangles with in-range indices;
/// a malformed container is a decode error, not a panic.
fn validate_indices(name: &str, indices: &[u32], vertex_count: usize) -> Result<(), ViewerError> {
    if indices.len() % 3 != 0 {
        return Err(decode_error(
            name,
            format!("index count {} is not a multiple of 3", indices.len()),
        ));
    }
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(decode_error(
            name,
            format!("index {bad} exceeds vertex count {vertex_count}"),
        ));
    }
    Ok(())
}

/// Applies the accumulated node transform to positions and normals. When
/// normals are absent they are derived from the transformed faces.
fn bake_transform(
    positions: &[[f32; 3]],
    normals: Option<&[[f32; 3]]>,
    indices: &[u32],
    transform: Matrix4<f32>,
) -> Vec<Vertex3D> {
    let transformed: Vec<[f32; 3]> = positions
        .iter()
        .map(|p| {
            let v = transform * Vector4::new(p[0], p[1], p[2], 1.0);
            [v.x, v.y, v.z]
        })
        .collect();

    let normals: Vec<[f32; 3]> = match normals {
        Some(normals) if normals.len() == positions.len() => normals
            .iter()
            .map(|n| {
                let v = transform * Vector4::new(n[0], n[1], n[2], 0.0);
                let v = Vector3::new(v.x, v.y, v.z);
                let v = if v.magnitude2() > 0.0 {
                    v.normalize()
                } else {
                    Vector3::unit_y()
                };
                [v.x, v.y, v.z]
            })
            .collect(),
        _ => {
            let flat: Vec<f32> = transformed.iter().flatten().copied().collect();
            Mesh::calculate_face_normals(&flat, indices)
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        }
    };

    transformed
        .into_iter()
        .zip(normals)
        .map(|(position, normal)| Vertex3D { position, normal })
        .collect()
}

fn decode_obj(name: &str, bytes: &[u8]) -> Result<Vec<DecodedPrimitive>, ViewerError> {
    let mut reader = std::io::BufReader::new(std::io::Cursor::new(bytes));
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        // Material libraries are not bundled with the assets.
        |_path| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| decode_error(name, e))?;

    let mut primitives = Vec::new();
    for model in models {
        if model.mesh.positions.is_empty() {
            continue;
        }
        let normals = if model.mesh.normals.len() == model.mesh.positions.len() {
            model.mesh.normals.clone()
        } else {
            Mesh::calculate_face_normals(&model.mesh.positions, &model.mesh.indices)
        };
        primitives.push(DecodedPrimitive {
            mesh: Mesh::new(model.mesh.positions, normals, model.mesh.indices),
            material: None,
        });
    }
    Ok(primitives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::object::Aabb;

    const CUBE_OBJ: &str = "\
v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
v 0 0 1\nv 1 0 1\nv 1 1 1\nv 0 1 1\n\
f 1 2 3 4\nf 5 8 7 6\nf 1 5 6 2\nf 2 6 7 3\nf 3 7 8 4\nf 5 1 4 8\n";

    #[test]
    fn test_decode_obj_cube() {
        let primitives =
            decode_model("cube", ModelFormat::Obj, CUBE_OBJ.as_bytes()).unwrap();
        assert_eq!(primitives.len(), 1);

        let mesh = &primitives[0].mesh;
        assert_eq!(mesh.vertex_count, 8);
        // 6 quad faces triangulated: 12 triangles.
        assert_eq!(mesh.index_count, 36);
        assert_eq!(
            mesh.aabb(),
            Aabb {
                min: [0.0, 0.0, 0.0],
                max: [1.0, 1.0, 1.0]
            }
        );
    }

    #[test]
    fn test_decode_rejects_empty_geometry() {
        let result = decode_model("empty", ModelFormat::Obj, b"# nothing here\n");
        assert!(matches!(result, Err(ViewerError::ModelDecode { .. })));
    }

    #[test]
    fn test_decode_rejects_garbage_glb() {
        let result = decode_model("junk", ModelFormat::Glb, b"not a glb container");
        assert!(matches!(result, Err(ViewerError::ModelDecode { .. })));
    }

    #[test]
    fn test_malformed_index_streams_are_decode_errors() {
        // Truncated triangle.
        assert!(matches!(
            validate_indices("m", &[0, 1], 3),
            Err(ViewerError::ModelDecode { .. })
        ));
        // Index past the vertex count.
        assert!(matches!(
            validate_indices("m", &[0, 1, 3], 3),
            Err(ViewerError::ModelDecode { .. })
        ));
        assert!(validate_indices("m", &[0, 1, 2], 3).is_ok());
        assert!(validate_indices("m", &[], 0).is_ok());
    }

    #[test]
    fn test_bake_transform_translates_positions_not_normals() {
        let positions = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let normals = [[0.0, 0.0, 1.0]; 3];
        let transform = Matrix4::from_translation(Vector3::new(5.0, 0.0, 0.0));

        let vertices = bake_transform(&positions, Some(&normals), &[0, 1, 2], transform);
        assert_eq!(vertices[0].position, [5.0, 0.0, 0.0]);
        assert_eq!(vertices[0].normal, [0.0, 0.0, 1.0]);
    }
}
