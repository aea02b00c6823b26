//! Orbit camera controller
//!
//! Keeps the camera on a sphere around a target point and always looking at
//! it. The azimuth advances with elapsed time, so the camera position is a
//! pure function of the frame clock.

use scene_engine::foundation::math::{constants::PI, Vec3};
use scene_engine::render::Camera;

/// Closest the polar angle may get to either pole
const POLE_MARGIN: f32 = 0.01;

/// Camera controller orbiting a fixed target
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitController {
    target: Vec3,
    radius: f32,
    min_radius: f32,
    max_radius: f32,
    /// Angle from the +Y axis, in radians
    polar: f32,
    /// Angle around the +Y axis measured from +Z, in radians
    azimuth: f32,
    /// Auto-rotation speed in radians per second
    speed: f32,
}

impl OrbitController {
    /// Orbit `target` at `radius`, starting on the +Z side at the target's height
    pub fn new(target: Vec3, radius: f32) -> Self {
        let radius = radius.max(f32::EPSILON);
        Self {
            target,
            radius,
            min_radius: radius * 0.1,
            max_radius: radius * 10.0,
            polar: PI / 2.0,
            azimuth: 0.0,
            speed: 0.0,
        }
    }

    /// Start from an existing camera position
    pub fn from_position(target: Vec3, position: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.norm();
        let mut controller = Self::new(target, radius);
        if radius > f32::EPSILON {
            controller.polar = (offset.y / radius).clamp(-1.0, 1.0).acos();
            controller.azimuth = offset.x.atan2(offset.z);
        }
        controller.clamp_polar();
        controller
    }

    /// Set the auto-rotation speed in radians per second
    pub fn with_speed(mut self, radians_per_second: f32) -> Self {
        self.speed = radians_per_second;
        self
    }

    /// Set the zoom limits
    pub fn with_radius_limits(mut self, min: f32, max: f32) -> Self {
        self.min_radius = min.max(f32::EPSILON);
        self.max_radius = max.max(self.min_radius);
        self.radius = self.radius.clamp(self.min_radius, self.max_radius);
        self
    }

    /// Rotate by the given angles; the polar angle stays clear of the poles
    pub fn rotate(&mut self, delta_azimuth: f32, delta_polar: f32) {
        self.azimuth += delta_azimuth;
        self.polar += delta_polar;
        self.clamp_polar();
    }

    /// Scale the distance to the target; `factor < 1` moves closer
    pub fn zoom(&mut self, factor: f32) {
        if factor > 0.0 {
            self.radius = (self.radius * factor).clamp(self.min_radius, self.max_radius);
        }
    }

    /// Current distance to the target
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Orbit target
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Camera position after `elapsed_secs` of auto-rotation
    pub fn position_at(&self, elapsed_secs: f32) -> Vec3 {
        let azimuth = self.azimuth + self.speed * elapsed_secs;
        let (sin_polar, cos_polar) = self.polar.sin_cos();
        let (sin_azimuth, cos_azimuth) = azimuth.sin_cos();

        self.target
            + Vec3::new(
                self.radius * sin_polar * sin_azimuth,
                self.radius * cos_polar,
                self.radius * sin_polar * cos_azimuth,
            )
    }

    /// Move `camera` to its orbit position and aim it at the target
    pub fn apply(&self, camera: &mut Camera, elapsed_secs: f32) {
        camera.transform.position = self.position_at(elapsed_secs);
        camera.look_at(self.target, Vec3::y());
    }

    fn clamp_polar(&mut self) {
        self.polar = self.polar.clamp(POLE_MARGIN, PI - POLE_MARGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use scene_engine::scene::SceneGraph;

    #[test]
    fn test_starts_on_positive_z() {
        let controller = OrbitController::new(Vec3::zeros(), 2.0);
        assert_relative_eq!(controller.position_at(0.0), Vec3::new(0.0, 0.0, 2.0), epsilon = 1e-6);
    }

    #[test]
    fn test_auto_rotation_is_a_function_of_elapsed_time() {
        let controller = OrbitController::new(Vec3::new(1.0, 0.0, 0.0), 2.0).with_speed(PI / 2.0);

        // Quarter turn after one second puts the camera on +X of the target
        assert_relative_eq!(controller.position_at(1.0), Vec3::new(3.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(controller.position_at(4.0), controller.position_at(0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_from_position_round_trips() {
        let target = Vec3::new(0.0, 1.0, 0.0);
        let position = Vec3::new(3.0, 4.0, -2.0);
        let controller = OrbitController::from_position(target, position);

        assert_relative_eq!(controller.position_at(0.0), position, epsilon = 1e-5);
    }

    #[test]
    fn test_zoom_and_rotation_are_clamped() {
        let mut controller = OrbitController::new(Vec3::zeros(), 10.0).with_radius_limits(5.0, 20.0);
        controller.zoom(0.1);
        assert_relative_eq!(controller.radius(), 5.0);
        controller.zoom(100.0);
        assert_relative_eq!(controller.radius(), 20.0);
        controller.zoom(-1.0);
        assert_relative_eq!(controller.radius(), 20.0);

        controller.rotate(0.0, 10.0);
        let position = controller.position_at(0.0);
        assert!(position.y > -20.0 && position.x.is_finite());
    }

    #[test]
    fn test_apply_aims_camera_at_target() {
        let scene = SceneGraph::new();
        let mut camera = Camera::default();
        let controller = OrbitController::new(Vec3::zeros(), 5.0).with_speed(1.0);
        controller.apply(&mut camera, 0.7);

        // The target sits on the camera's forward axis (-Z in view space)
        let view_target = camera.view_matrix(&scene).transform_point(&Vec3::zeros().into());
        assert_relative_eq!(view_target.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(view_target.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(view_target.z, -5.0, epsilon = 1e-4);
    }
}
