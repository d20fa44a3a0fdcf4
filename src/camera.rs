//! First-person fly camera.
//!
//! Mouse motion turns the camera; movement keys walk it on the ground plane.
//! Angles are kept in degrees, the forward vector is derived from them.

use glam::{Mat4, Vec3};

/// Vertical field of view in degrees.
pub const FOV_Y_DEGREES: f32 = 70.0;
const Z_NEAR: f32 = 0.01;
const Z_FAR: f32 = 100.0;
const PITCH_LIMIT: f32 = 89.0;

/// Walking direction relative to the camera's heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

/// Position and heading handed to the particle field each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    pub position: Vec3,
    /// Unit look direction.
    pub forward: Vec3,
}

impl CameraView {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::NEG_Z)
    }
}

/// Fly camera driven by mouse look and WASD walking.
#[derive(Debug, Clone)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Heading in degrees; -90 looks down -Z.
    pub yaw: f32,
    /// Elevation in degrees, clamped to ±89.
    pub pitch: f32,
    /// Walking speed in units per second.
    pub speed: f32,
    /// Degrees of rotation per pixel of mouse motion.
    pub sensitivity: f32,
    forward: Vec3,
}

impl FlyCamera {
    /// Camera at `position` looking down -Z.
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            yaw: -90.0,
            pitch: 0.0,
            speed: 7.5,
            sensitivity: 0.1,
            forward: Vec3::NEG_Z,
        };
        camera.update_forward();
        camera
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sensitivity(mut self, sensitivity: f32) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Unit look direction.
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Turn by a mouse delta in pixels. Moving the mouse down (positive
    /// `dy` in window coordinates) looks down.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.update_forward();
    }

    /// Walk for `dt` seconds. Movement stays on the XZ plane regardless of
    /// pitch.
    pub fn walk(&mut self, direction: Direction, dt: f32) {
        let flat = Vec3::new(self.forward.x, 0.0, self.forward.z).normalize_or_zero();
        let right = flat.cross(Vec3::Y).normalize_or_zero();
        let step = self.speed * dt;
        match direction {
            Direction::Forward => self.position += flat * step,
            Direction::Backward => self.position -= flat * step,
            Direction::Left => self.position -= right * step,
            Direction::Right => self.position += right * step,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.forward, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEGREES.to_radians(), aspect, Z_NEAR, Z_FAR)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection(aspect) * self.view_matrix()
    }

    pub fn view(&self) -> CameraView {
        CameraView::new(self.position, self.forward)
    }

    fn update_forward(&mut self) {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        self.forward = Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize();
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 1.6, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = FlyCamera::default();
        assert!((camera.forward() - Vec3::NEG_Z).length() < EPS);
        assert_eq!(camera.position, Vec3::new(0.0, 1.6, 0.0));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = FlyCamera::default();
        camera.look(0.0, -10_000.0);
        assert_eq!(camera.pitch, 89.0);
        camera.look(0.0, 10_000.0);
        assert_eq!(camera.pitch, -89.0);
        assert!((camera.forward().length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_walk_ignores_pitch() {
        let mut camera = FlyCamera::default().with_speed(1.0);
        camera.look(0.0, -400.0); // look up 40 degrees
        camera.walk(Direction::Forward, 1.0);
        assert!((camera.position.y - 1.6).abs() < EPS);
        assert!((camera.position.z - -1.0).abs() < EPS);
    }

    #[test]
    fn test_strafe_right_is_positive_x() {
        let mut camera = FlyCamera::new(Vec3::ZERO).with_speed(2.0);
        camera.walk(Direction::Right, 0.5);
        assert!((camera.position - Vec3::X).length() < EPS);
        camera.walk(Direction::Left, 0.5);
        assert!(camera.position.length() < EPS);
    }

    #[test]
    fn test_turn_right_faces_positive_x() {
        let mut camera = FlyCamera::default();
        camera.look(900.0, 0.0); // +90 degrees of yaw
        assert!((camera.forward() - Vec3::X).length() < 1e-4);
    }
}
