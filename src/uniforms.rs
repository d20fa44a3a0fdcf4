//! Uniform blocks and instance records shared with the WGSL shaders.
//!
//! Each struct mirrors a `struct` in `src/shaders/` field for field. WGSL
//! aligns `vec3<f32>` to 16 bytes, so every `vec3` here is followed by a
//! scalar that fills the fourth lane instead of explicit padding.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::camera::CameraView;
use crate::weather::LayerFrame;

/// Per-draw block for static meshes (`mesh.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub model: [[f32; 4]; 4],
}

impl MeshUniforms {
    pub fn new(view_proj: Mat4, model: Mat4) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        }
    }
}

/// Per-layer block for the precipitation shaders (`rain.wgsl`, `snow.wgsl`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ParticleUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Last frame's view-projection; rain tails are projected with it.
    pub prev_view_proj: [[f32; 4]; 4],
    /// Wrapped offset of the layer.
    pub offset: [f32; 3],
    pub box_size: f32,
    pub camera_pos: [f32; 3],
    /// Seconds of fall a streak tail trails behind its head.
    pub streak_length: f32,
    pub camera_forward: [f32; 3],
    /// Snow flake half-size in world units.
    pub point_size: f32,
    pub velocity: [f32; 3],
    pub _pad: f32,
    pub color: [f32; 4],
}

impl ParticleUniforms {
    pub fn new(
        view_proj: Mat4,
        prev_view_proj: Mat4,
        camera: CameraView,
        frame: LayerFrame,
        box_size: f32,
    ) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            prev_view_proj: prev_view_proj.to_cols_array_2d(),
            offset: frame.offset.to_array(),
            box_size,
            camera_pos: camera.position.to_array(),
            streak_length: 0.02,
            camera_forward: camera.forward.to_array(),
            point_size: 0.03,
            velocity: frame.velocity.to_array(),
            _pad: 0.0,
            color: [0.7, 0.75, 0.85, 0.6],
        }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color.to_array();
        self
    }

    pub fn with_streak_length(mut self, seconds: f32) -> Self {
        self.streak_length = seconds;
        self
    }

    pub fn with_point_size(mut self, size: f32) -> Self {
        self.point_size = size;
        self
    }
}

/// Block for the emitted sparks (`sparks.wgsl`). Sparks are already in world
/// space, so only the camera and billboard size are needed.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SparkUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub size: f32,
    pub aspect: f32,
    pub _pad: [f32; 2],
}

impl SparkUniforms {
    pub fn new(view_proj: Mat4, color: Vec4, size: f32, aspect: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            color: color.to_array(),
            size,
            aspect,
            _pad: [0.0; 2],
        }
    }
}

/// Per-instance record for the Voronoi cones (`voronoi.wgsl`), read from an
/// instance-stepped vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ConeInstance {
    /// Site position in NDC.
    pub offset: [f32; 2],
    pub _pad: [f32; 2],
    pub color: [f32; 4],
}

impl ConeInstance {
    pub fn new(offset: Vec2, color: Vec3) -> Self {
        Self {
            offset: offset.to_array(),
            _pad: [0.0; 2],
            color: color.extend(1.0).to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_blocks_are_16_byte_multiples() {
        assert_eq!(size_of::<MeshUniforms>(), 128);
        assert_eq!(size_of::<ParticleUniforms>(), 208);
        assert_eq!(size_of::<SparkUniforms>(), 96);
        assert_eq!(size_of::<ConeInstance>(), 32);
    }

    #[test]
    fn test_particle_uniforms_carry_frame() {
        let frame = LayerFrame {
            offset: Vec3::new(1.0, 2.0, 3.0),
            velocity: Vec3::new(0.5, -8.0, 0.0),
        };
        let camera = CameraView::new(Vec3::Y, Vec3::NEG_Z);
        let u = ParticleUniforms::new(Mat4::IDENTITY, Mat4::IDENTITY, camera, frame, 30.0)
            .with_streak_length(0.05);
        assert_eq!(u.offset, [1.0, 2.0, 3.0]);
        assert_eq!(u.velocity, [0.5, -8.0, 0.0]);
        assert_eq!(u.box_size, 30.0);
        assert_eq!(u.camera_forward, [0.0, 0.0, -1.0]);
        assert_eq!(u.streak_length, 0.05);

        // offset sits right after the two matrices
        let bytes = bytemuck::bytes_of(&u);
        let offset: &[f32] = bytemuck::cast_slice(&bytes[128..140]);
        assert_eq!(offset, &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cone_instances_are_opaque() {
        let u = ConeInstance::new(Vec2::new(-0.5, 0.25), Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(u.color, [0.1, 0.2, 0.3, 1.0]);
        assert_eq!(u.offset, [-0.5, 0.25]);
    }
}
