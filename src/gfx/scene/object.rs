//! Meshes, bounding boxes and renderable objects.

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use crate::gfx::resources::MaterialId;

use super::vertex::Vertex3D;

/// Axis-aligned bounding box in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: [f32::INFINITY; 3],
            max: [f32::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0]
    }

    pub fn from_vertices(vertices: &[Vertex3D]) -> Self {
        let mut aabb = Self::empty();
        for vertex in vertices {
            for axis in 0..3 {
                aabb.min[axis] = aabb.min[axis].min(vertex.position[axis]);
                aabb.max[axis] = aabb.max[axis].max(vertex.position[axis]);
            }
        }
        aabb
    }

    pub fn union(&self, other: &Aabb) -> Self {
        let mut merged = *self;
        for axis in 0..3 {
            merged.min[axis] = merged.min[axis].min(other.min[axis]);
            merged.max[axis] = merged.max[axis].max(other.max[axis]);
        }
        merged
    }

    pub fn center(&self) -> Vector3<f32> {
        Vector3::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        )
    }

    /// Largest edge length of the box.
    pub fn max_extent(&self) -> f32 {
        (self.max[0] - self.min[0])
            .max(self.max[1] - self.min[1])
            .max(self.max[2] - self.min[2])
    }
}

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    pub vertex_count: u32,
    pub index_count: u32,
}

impl Mesh {
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }
        Self::from_vertices(vertices, indices)
    }

    pub fn from_vertices(vertices: Vec<Vertex3D>, indices: Vec<u32>) -> Self {
        let vertex_count = vertices.len() as u32;
        let index_count = indices.len() as u32;
        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            vertex_count,
            index_count,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_vertices(&self.vertices)
    }

    /// Area-weighted smooth normals for sources that ship without them.
    /// Trailing indices that do not form a whole triangle are ignored.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let vertex_count = positions.len() / 3;
        let mut normals = vec![0.0; positions.len()];

        for triangle in indices.chunks_exact(3) {
            let i0 = triangle[0] as usize;
            let i1 = triangle[1] as usize;
            let i2 = triangle[2] as usize;

            let v0 = [
                positions[i0 * 3],
                positions[i0 * 3 + 1],
                positions[i0 * 3 + 2],
            ];
            let v1 = [
                positions[i1 * 3],
                positions[i1 * 3 + 1],
                positions[i1 * 3 + 2],
            ];
            let v2 = [
                positions[i2 * 3],
                positions[i2 * 3 + 1],
                positions[i2 * 3 + 2],
            ];

            let edge1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
            let edge2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

            let face_normal = [
                edge1[1] * edge2[2] - edge1[2] * edge2[1],
                edge1[2] * edge2[0] - edge1[0] * edge2[2],
                edge1[0] * edge2[1] - edge1[1] * edge2[0],
            ];

            for &vertex_idx in &[i0, i1, i2] {
                normals[vertex_idx * 3] += face_normal[0];
                normals[vertex_idx * 3 + 1] += face_normal[1];
                normals[vertex_idx * 3 + 2] += face_normal[2];
            }
        }

        for i in 0..vertex_count {
            let length = (normals[i * 3].powi(2)
                + normals[i * 3 + 1].powi(2)
                + normals[i * 3 + 2].powi(2))
            .sqrt();
            if length > 0.0 {
                normals[i * 3] /= length;
                normals[i * 3 + 1] /= length;
                normals[i * 3 + 2] /= length;
            }
        }

        normals
    }

    /// Uploads vertex and index buffers if they do not exist yet.
    pub fn ensure_gpu_buffers(&mut self, device: &wgpu::Device) {
        if self.vertex_buffer.is_none() {
            self.vertex_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertex Buffer"),
                    contents: bytemuck::cast_slice(&self.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                },
            ));
        }
        if self.index_buffer.is_none() {
            self.index_buffer = Some(device.create_buffer_init(
                &wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Index Buffer"),
                    contents: bytemuck::cast_slice(&self.indices),
                    usage: wgpu::BufferUsages::INDEX,
                },
            ));
        }
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.vertex_buffer.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&wgpu::Buffer> {
        self.index_buffer.as_ref()
    }
}

/// GPU-side per-object resources, created lazily by the render engine.
pub struct ObjectGpuResources {
    pub transform_buffer: wgpu::Buffer,
    pub transform_bind_group: wgpu::BindGroup,
}

/// A named renderable with its meshes and model transform.
pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub material_id: Option<MaterialId>,
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Matrix4::identity(),
            material_id: None,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn with_material(mut self, material_id: MaterialId) -> Self {
        self.material_id = Some(material_id);
        self
    }

    /// Union bounding box over all meshes, in untransformed model space.
    pub fn aabb(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::empty(), |acc, mesh| acc.union(&mesh.aabb()))
    }
}

/// Transform that recenters and rescales `aabb` to fit a unit cube at the
/// origin. Degenerate boxes map to the identity.
pub fn unit_cube_transform(aabb: &Aabb) -> Matrix4<f32> {
    if aabb.is_empty() {
        return Matrix4::identity();
    }
    let extent = aabb.max_extent();
    if extent <= 0.0 {
        return Matrix4::from_translation(-aabb.center());
    }
    let scale = 1.0 / extent;
    Matrix4::from_scale(scale) * Matrix4::from_translation(-aabb.center())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn quad_mesh() -> Mesh {
        // 2 x 4 x 1 box corners offset from the origin.
        Mesh::new(
            vec![
                1.0, 0.0, 0.0, //
                3.0, 0.0, 0.0, //
                3.0, 4.0, 1.0, //
                1.0, 4.0, 1.0,
            ],
            vec![
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0, //
                0.0, 0.0, 1.0,
            ],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[test]
    fn test_aabb_from_mesh() {
        let aabb = quad_mesh().aabb();
        assert_eq!(aabb.min, [1.0, 0.0, 0.0]);
        assert_eq!(aabb.max, [3.0, 4.0, 1.0]);
        assert_eq!(aabb.max_extent(), 4.0);
    }

    #[test]
    fn test_unit_cube_transform_centers_and_scales() {
        let object = Object::new("quad", vec![quad_mesh()]);
        let transform = unit_cube_transform(&object.aabb());

        // The box center maps to the origin.
        let center = object.aabb().center();
        let mapped = transform * Vector4::new(center.x, center.y, center.z, 1.0);
        assert!(mapped.x.abs() < 1e-6 && mapped.y.abs() < 1e-6 && mapped.z.abs() < 1e-6);

        // The longest edge maps to length 1.
        let corner_min = transform * Vector4::new(1.0, 0.0, 0.0, 1.0);
        let corner_max = transform * Vector4::new(1.0, 4.0, 0.0, 1.0);
        assert!(((corner_max.y - corner_min.y) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unit_cube_transform_degenerate_box() {
        assert_eq!(unit_cube_transform(&Aabb::empty()), Matrix4::identity());
    }

    #[test]
    fn test_face_normals_skip_trailing_partial_triangle() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        // One whole triangle plus a dangling index pair.
        let indices = vec![0, 1, 2, 0, 1];
        let normals = Mesh::calculate_face_normals(&positions, &indices);
        assert_eq!(normals.len(), positions.len());
        assert!((normals[2] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_calculated_normals_are_unit_length() {
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices = vec![0, 1, 2];
        let normals = Mesh::calculate_face_normals(&positions, &indices);
        for normal in normals.chunks_exact(3) {
            let length = (normal[0].powi(2) + normal[1].powi(2) + normal[2].powi(2)).sqrt();
            assert!((length - 1.0).abs() < 1e-5);
            // Flat triangle in the XY plane: normals face +Z.
            assert!((normal[2] - 1.0).abs() < 1e-5);
        }
    }
}
