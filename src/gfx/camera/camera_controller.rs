use crate::session::{PointerEvent, TouchPhase};

use super::orbit_camera::OrbitCamera;

/// Translates pointer interactions into orbit camera motion.
///
/// Mouse and touch share one path: press (or touch start) begins a drag,
/// motion while dragging orbits (or pans while shift is held), scroll and
/// pinch zoom. Positions arrive in physical pixels and deltas are derived
/// here, so the controller works the same for hosts that only report
/// absolute positions.
pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    is_dragging: bool,
    shift_held: bool,
    last_position: Option<(f32, f32)>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            is_dragging: false,
            shift_held: false,
            last_position: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.is_dragging
    }

    pub fn process_pointer(&mut self, event: PointerEvent, camera: &mut OrbitCamera) {
        match event {
            PointerEvent::Pressed => {
                self.is_dragging = true;
            }
            PointerEvent::Released => {
                self.is_dragging = false;
                self.last_position = None;
            }
            PointerEvent::Moved { x, y } => {
                self.drag_to(x, y, camera);
            }
            PointerEvent::Scroll { delta } => {
                camera.add_distance(-delta * self.zoom_speed);
            }
            PointerEvent::Pinch { delta } => {
                // Pinch out (positive delta) zooms in.
                camera.add_distance(-delta * self.zoom_speed * 10.0);
            }
            PointerEvent::Touch { phase, x, y } => match phase {
                TouchPhase::Started => {
                    self.is_dragging = true;
                    self.last_position = Some((x, y));
                }
                TouchPhase::Moved => {
                    self.drag_to(x, y, camera);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.is_dragging = false;
                    self.last_position = None;
                }
            },
            PointerEvent::Modifiers { shift } => {
                self.shift_held = shift;
            }
        }
    }

    fn drag_to(&mut self, x: f32, y: f32, camera: &mut OrbitCamera) {
        let last = self.last_position.replace((x, y));
        if !self.is_dragging {
            return;
        }
        if let Some((last_x, last_y)) = last {
            let dx = x - last_x;
            let dy = y - last_y;
            if self.shift_held {
                // The camera moves against the pointer, so the model
                // appears to follow it.
                camera.pan((-dx * self.rotate_speed, dy * self.rotate_speed));
            } else {
                camera.add_yaw(-dx * self.rotate_speed);
                camera.add_pitch(dy * self.rotate_speed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3, Zero};

    fn camera() -> OrbitCamera {
        OrbitCamera::new(2.5, 0.0, 0.0, Vector3::zero(), 1.0)
    }

    #[test]
    fn test_motion_without_press_does_not_orbit() {
        let mut controller = CameraController::new(0.01, 0.2);
        let mut camera = camera();
        let yaw = camera.yaw;

        controller.process_pointer(PointerEvent::Moved { x: 10.0, y: 10.0 }, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 50.0, y: 30.0 }, &mut camera);
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn test_drag_orbits_camera() {
        let mut controller = CameraController::new(0.01, 0.2);
        let mut camera = camera();

        controller.process_pointer(PointerEvent::Moved { x: 10.0, y: 10.0 }, &mut camera);
        controller.process_pointer(PointerEvent::Pressed, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 30.0, y: 25.0 }, &mut camera);

        assert!(camera.yaw != 0.0);
        assert!(camera.pitch != 0.0);
        assert!(controller.is_dragging());
    }

    #[test]
    fn test_release_resets_drag_anchor() {
        let mut controller = CameraController::new(0.01, 0.2);
        let mut camera = camera();

        controller.process_pointer(PointerEvent::Pressed, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 10.0, y: 0.0 }, &mut camera);
        controller.process_pointer(PointerEvent::Released, &mut camera);
        let yaw = camera.yaw;

        // A fresh drag far away must not apply the jump as a delta.
        controller.process_pointer(PointerEvent::Pressed, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 500.0, y: 0.0 }, &mut camera);
        assert_eq!(camera.yaw, yaw);
    }

    #[test]
    fn test_shift_drag_pans_instead_of_orbiting() {
        let mut controller = CameraController::new(0.01, 0.2);
        let mut camera = camera();

        controller.process_pointer(PointerEvent::Modifiers { shift: true }, &mut camera);
        controller.process_pointer(PointerEvent::Pressed, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 0.0, y: 0.0 }, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 40.0, y: 20.0 }, &mut camera);

        assert_eq!(camera.yaw, 0.0);
        assert_eq!(camera.pitch, 0.0);
        assert!(camera.target.magnitude() > 0.0);

        // Releasing shift mid-drag switches back to orbiting.
        controller.process_pointer(PointerEvent::Modifiers { shift: false }, &mut camera);
        controller.process_pointer(PointerEvent::Moved { x: 60.0, y: 20.0 }, &mut camera);
        assert!(camera.yaw != 0.0);
    }

    #[test]
    fn test_touch_drag_and_pinch() {
        let mut controller = CameraController::new(0.01, 0.2);
        let mut camera = camera();
        let distance = camera.distance;

        controller.process_pointer(
            PointerEvent::Touch {
                phase: TouchPhase::Started,
                x: 100.0,
                y: 100.0,
            },
            &mut camera,
        );
        controller.process_pointer(
            PointerEvent::Touch {
                phase: TouchPhase::Moved,
                x: 120.0,
                y: 100.0,
            },
            &mut camera,
        );
        assert!(camera.yaw != 0.0);

        controller.process_pointer(PointerEvent::Pinch { delta: 0.5 }, &mut camera);
        assert!(camera.distance < distance);
    }
}
