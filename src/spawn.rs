//! Random sampling for particle and site initialization.
//!
//! Everything that needs randomness at setup time (pool positions, layer
//! jitter, Voronoi site colours) draws from a [`SpawnContext`] so a run can
//! be reproduced from a single seed.

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

/// Where the pool's sampling cube sits relative to the origin.
///
/// Either choice produces the same picture once the wrap transform is
/// applied; `Offset` matches fields whose shader expects strictly positive
/// base coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxPlacement {
    /// Cube `[-box/2, box/2)` on every axis.
    #[default]
    Centered,
    /// Cube `[box, 2*box)` on every axis.
    Offset,
}

impl BoxPlacement {
    /// Lower and upper bound of the sampling range for a cube of side `box_size`.
    pub fn range(self, box_size: f32) -> (f32, f32) {
        match self {
            BoxPlacement::Centered => (-box_size / 2.0, box_size / 2.0),
            BoxPlacement::Offset => (box_size, 2.0 * box_size),
        }
    }

    /// Whether `p` lies inside the sampling cube (upper bound inclusive, to
    /// tolerate rounding at the edge).
    pub fn contains(self, box_size: f32, p: Vec3) -> bool {
        let (min, max) = self.range(box_size);
        p.cmpge(Vec3::splat(min)).all() && p.cmple(Vec3::splat(max)).all()
    }
}

/// Source of setup-time randomness.
///
/// ```ignore
/// let mut ctx = SpawnContext::seeded(7);
/// let p = ctx.random_in_box(BoxPlacement::Centered, 30.0);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Context with a fixed seed; identical seeds give identical sequences.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Context seeded from the wall clock, different on every run.
    pub fn from_clock() -> Self {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::seeded(seed)
    }

    /// Context for an optional seed, falling back to the clock.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_clock(),
        }
    }

    /// Random f32 between 0.0 and 1.0.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`. Returns `min` for an empty range.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    /// Random point with each coordinate drawn independently from `[min, max)`.
    pub fn random_in_cube(&mut self, min: f32, max: f32) -> Vec3 {
        Vec3::new(
            self.random_range(min, max),
            self.random_range(min, max),
            self.random_range(min, max),
        )
    }

    /// Random point inside the sampling cube for `placement`.
    pub fn random_in_box(&mut self, placement: BoxPlacement, box_size: f32) -> Vec3 {
        let (min, max) = placement.range(box_size);
        self.random_in_cube(min, max)
    }

    /// Small random offset in the XY plane, each axis in `[-radius, radius)`.
    pub fn jitter(&mut self, radius: f32) -> Vec2 {
        Vec2::new(
            self.random_range(-radius, radius),
            self.random_range(-radius, radius),
        )
    }

    /// Random RGB color (each channel 0-1).
    pub fn random_color(&mut self) -> Vec3 {
        Vec3::new(self.rng.gen(), self.rng.gen(), self.rng.gen())
    }
}
