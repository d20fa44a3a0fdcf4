//! Fixed-capacity particle storage for box-wrapped fields.
//!
//! A [`ParticlePool`] is generated once and never mutated afterwards: all
//! apparent motion comes from the offset uniform computed by
//! [`PrecipitationField`](crate::PrecipitationField). The vertex data is laid
//! out so it can be uploaded to a vertex buffer as-is.

use glam::Vec3;
use serde::Deserialize;

use crate::spawn::{BoxPlacement, SpawnContext};

/// How each logical particle is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolLayout {
    /// One position per particle, drawn as points/sprites.
    Points,
    /// A head and a tail position per particle, drawn as line segments.
    /// Both start at the same position.
    #[default]
    Streaks,
}

impl PoolLayout {
    /// Number of stored positions per logical particle.
    #[inline]
    pub fn vertices_per_particle(self) -> usize {
        match self {
            PoolLayout::Points => 1,
            PoolLayout::Streaks => 2,
        }
    }
}

/// Immutable pool of particle base positions.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    layout: PoolLayout,
    box_size: f32,
    placement: BoxPlacement,
    vertices: Box<[Vec3]>,
}

impl ParticlePool {
    /// Sample `count` particles uniformly inside the cube described by
    /// `box_size` and `placement`.
    ///
    /// Coordinates are independent; duplicate positions are allowed.
    pub fn generate(
        count: usize,
        box_size: f32,
        placement: BoxPlacement,
        layout: PoolLayout,
        ctx: &mut SpawnContext,
    ) -> Self {
        let per = layout.vertices_per_particle();
        let mut vertices = Vec::with_capacity(count * per);
        for _ in 0..count {
            let p = ctx.random_in_box(placement, box_size);
            vertices.extend(std::iter::repeat(p).take(per));
        }

        log::debug!(
            "generated {} particles ({:?}, box {}, {:?})",
            count,
            layout,
            box_size,
            placement
        );

        Self {
            layout,
            box_size,
            placement,
            vertices: vertices.into_boxed_slice(),
        }
    }

    /// Number of logical particles.
    #[inline]
    pub fn particle_count(&self) -> usize {
        self.vertices.len() / self.layout.vertices_per_particle()
    }

    /// Number of stored positions (twice the particle count for streaks).
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn layout(&self) -> PoolLayout {
        self.layout
    }

    #[inline]
    pub fn box_size(&self) -> f32 {
        self.box_size
    }

    #[inline]
    pub fn placement(&self) -> BoxPlacement {
        self.placement
    }

    /// Base position of particle `index` (its head for streaks).
    pub fn head(&self, index: usize) -> Option<Vec3> {
        self.vertices
            .get(index * self.layout.vertices_per_particle())
            .copied()
    }

    /// Tail position of particle `index`; equal to the head for points.
    pub fn tail(&self, index: usize) -> Option<Vec3> {
        let per = self.layout.vertices_per_particle();
        self.vertices.get(index * per + per - 1).copied()
    }

    /// All stored positions in draw order.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Raw bytes for a one-shot vertex buffer upload.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Distance in bytes between consecutive logical particles.
    #[inline]
    pub fn particle_stride(&self) -> u64 {
        (self.layout.vertices_per_particle() * std::mem::size_of::<Vec3>()) as u64
    }
}
