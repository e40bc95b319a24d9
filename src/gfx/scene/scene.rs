//! Scene container
//!
//! Holds the displayed model's objects, the material library, the orbit
//! camera and the lighting configuration. A scene displays at most one
//! model at a time: loading a new one replaces all objects and their
//! materials.

use cgmath::Vector3;

use crate::error::ViewerError;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::resources::{DirectionalLight, MaterialManager};
use crate::session::ModelFormat;

use super::decode::decode_model;
use super::object::{unit_cube_transform, Aabb, Object};

/// Default image-based-lighting intensity, photometric.
pub const DEFAULT_IBL_INTENSITY: f32 = 30_000.0;

pub struct Scene {
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager,
    pub camera_manager: CameraManager,
    pub light: DirectionalLight,
    pub ibl_intensity: f32,
    frame_time_nanos: u64,
}

impl Scene {
    pub fn new(aspect: f32) -> Self {
        let camera = OrbitCamera::new(2.5, 0.3, 0.0, Vector3::new(0.0, 0.0, 0.0), aspect);
        let controller = CameraController::new(0.005, 0.2);

        Self {
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
            camera_manager: CameraManager::new(camera, controller),
            light: DirectionalLight::default(),
            ibl_intensity: DEFAULT_IBL_INTENSITY,
            frame_time_nanos: 0,
        }
    }

    /// Decodes a model buffer and replaces the displayed objects and their
    /// materials. On decode failure the scene is left untouched.
    pub fn replace_model(
        &mut self,
        name: &str,
        format: ModelFormat,
        bytes: &[u8],
    ) -> Result<(), ViewerError> {
        let primitives = decode_model(name, format, bytes)?;

        self.objects.clear();
        self.material_manager.clear_model_materials();

        for (index, primitive) in primitives.into_iter().enumerate() {
            let mut object = Object::new(format!("{}_{}", name, index), vec![primitive.mesh]);
            if let Some(material) = primitive.material {
                object.material_id = Some(material.name.clone());
                self.material_manager.add_material(material);
            }
            self.objects.push(object);
        }
        Ok(())
    }

    /// Union bounding box over all displayed objects, in model space.
    pub fn model_aabb(&self) -> Aabb {
        self.objects
            .iter()
            .fold(Aabb::empty(), |acc, object| acc.union(&object.aabb()))
    }

    /// Rescales and recenters the displayed model to fit a unit cube at the
    /// origin, and resets the camera to its default framing.
    pub fn frame_model(&mut self) {
        let transform = unit_cube_transform(&self.model_aabb());
        for object in &mut self.objects {
            object.transform = transform;
        }
        self.camera_manager.camera.reset_to_default();
    }

    /// Per-frame update: records the frame timestamp and refreshes the
    /// camera uniform.
    pub fn update(&mut self, frame_time_nanos: u64) {
        self.frame_time_nanos = frame_time_nanos;
        self.camera_manager.camera.update_view_proj();
    }

    /// Monotonic timestamp of the current frame, measured from surface
    /// attach. Available to time-dependent effects.
    pub fn frame_time_nanos(&self) -> u64 {
        self.frame_time_nanos
    }

    /// Total (vertices, triangles) across displayed objects, for the stats
    /// overlay.
    pub fn geometry_stats(&self) -> (u32, u32) {
        let mut vertices = 0;
        let mut triangles = 0;
        for object in &self.objects {
            for mesh in &object.meshes {
                vertices += mesh.vertex_count;
                triangles += mesh.index_count / 3;
            }
        }
        (vertices, triangles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TRIANGLES_OBJ: &str = "\
v 0 0 0\nv 2 0 0\nv 0 4 0\n\
v 10 0 0\nv 12 0 0\nv 10 4 0\n\
f 1 2 3\nf 4 5 6\n";

    #[test]
    fn test_replace_model_swaps_objects() {
        let mut scene = Scene::new(1.0);
        scene
            .replace_model("first", ModelFormat::Obj, TWO_TRIANGLES_OBJ.as_bytes())
            .unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "first_0");

        scene
            .replace_model("second", ModelFormat::Obj, TWO_TRIANGLES_OBJ.as_bytes())
            .unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "second_0");
    }

    #[test]
    fn test_failed_replace_keeps_scene() {
        let mut scene = Scene::new(1.0);
        scene
            .replace_model("model", ModelFormat::Obj, TWO_TRIANGLES_OBJ.as_bytes())
            .unwrap();

        assert!(scene
            .replace_model("broken", ModelFormat::Obj, b"# no geometry\n")
            .is_err());
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].name, "model_0");
    }

    #[test]
    fn test_frame_model_fits_unit_cube() {
        let mut scene = Scene::new(1.0);
        scene
            .replace_model("model", ModelFormat::Obj, TWO_TRIANGLES_OBJ.as_bytes())
            .unwrap();
        scene.frame_model();

        // Longest extent (x: 0..12) maps to length 1, centered on the origin.
        let transform = scene.objects[0].transform;
        let min = transform * cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);
        let max = transform * cgmath::Vector4::new(12.0, 0.0, 0.0, 1.0);
        assert!(((max.x - min.x) - 1.0).abs() < 1e-5);
        assert!((min.x + max.x).abs() < 1e-5);
    }

    #[test]
    fn test_update_records_frame_time() {
        let mut scene = Scene::new(1.0);
        scene.update(5_000_000);
        assert_eq!(scene.frame_time_nanos(), 5_000_000);
        scene.update(7_500_000);
        assert_eq!(scene.frame_time_nanos(), 7_500_000);
    }

    #[test]
    fn test_geometry_stats() {
        let mut scene = Scene::new(1.0);
        scene
            .replace_model("model", ModelFormat::Obj, TWO_TRIANGLES_OBJ.as_bytes())
            .unwrap();
        assert_eq!(scene.geometry_stats(), (6, 2));
    }
}
