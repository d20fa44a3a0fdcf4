//! # precip
//!
//! Small GPU scenes built around a box-wrapped particle field: rain and snow
//! that follow a fly camera through an endless volume, a ring emitter for
//! sparks, and a Voronoi diagram drawn with depth-tested cones.
//!
//! ## Quick Start
//!
//! ```ignore
//! use precip::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     init_logging(LoggingConfig::default());
//!     WeatherSimulation::new()
//!         .with_particle_count(10_000)
//!         .with_box_size(30.0)
//!         .with_mode(Precipitation::Snow)
//!         .run()
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Box-wrapped fields
//!
//! A [`ParticlePool`] is sampled once inside a cube and uploaded once. Motion
//! comes entirely from an accumulated offset per [`Layer`]: wind and gravity
//! are integrated on the CPU, then folded into `[0, box)` relative to the
//! camera by [`wrap_offset`]. The vertex shader adds the wrapped offset to
//! every base position and wraps again, so the field always surrounds the
//! viewer no matter how far the accumulator or the camera travel.
//!
//! ```ignore
//! let mut ctx = SpawnContext::seeded(1);
//! let pool = ParticlePool::generate(1000, 30.0, BoxPlacement::Centered, PoolLayout::Streaks, &mut ctx);
//! let mut field = PrecipitationField::new(pool, params);
//! field.simulate(elapsed, dt);
//! let offset = field.wrapped_offset(0, camera.view());
//! ```
//!
//! ### Emission
//!
//! [`ParticleRing`] is the other way to feed particles: a fixed ring where
//! each `emit` overwrites the oldest slot. Only the spans written since the
//! last upload are sent to the GPU.
//!
//! ### Voronoi
//!
//! [`VoronoiDiagram`] holds cone sites in NDC. Each site is drawn as the same
//! cone seen from above; depth testing keeps the nearest apex, which is the
//! Voronoi cell.
//!
//! ## Controls
//!
//! | Scene | Keys |
//! |-------|------|
//! | Weather | WASD / arrows walk, mouse looks, `1` rain, `2` snow, `P` pause, left mouse sparks, `Esc` quit |
//! | Voronoi | left click adds a site, `1` colour, `2` distance, `3` distance × colour, `Esc` quit |

pub mod camera;
pub mod config;
pub mod emitter;
pub mod error;
pub mod gpu;
pub mod input;
pub mod logging;
pub mod mesh;
pub mod particles;
pub mod shader;
pub mod simulation;
pub mod spawn;
pub mod time;
pub mod uniforms;
pub mod voronoi;
pub mod weather;

pub use bytemuck;
pub use camera::{CameraView, Direction, FlyCamera};
pub use config::{VoronoiConfig, WeatherConfig, WindowConfig};
pub use emitter::ParticleRing;
pub use error::{ConfigError, GpuError, SimulationError};
pub use glam::{Mat4, Vec2, Vec3, Vec4};
pub use logging::{init_logging, LoggingConfig};
pub use particles::{ParticlePool, PoolLayout};
pub use simulation::{Control, VoronoiSimulation, WeatherSimulation};
pub use spawn::{BoxPlacement, SpawnContext};
pub use voronoi::{ConeSite, ShadeMode, VoronoiDiagram};
pub use weather::{
    wrap_offset, FieldParams, Layer, LayerFrame, Precipitation, PrecipitationField, Wind,
};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use precip::prelude::*;
/// ```
///
/// This imports:
/// - [`WeatherSimulation`] and [`VoronoiSimulation`] - the scene builders
/// - [`PrecipitationField`], [`ParticlePool`], [`ParticleRing`] - the particle field
/// - [`FlyCamera`], [`Input`], [`Time`] - frame-loop state
/// - [`Vec2`], [`Vec3`], [`Vec4`], [`Mat4`] - glam math types
pub mod prelude {
    pub use crate::camera::{CameraView, Direction, FlyCamera};
    pub use crate::config::{VoronoiConfig, WeatherConfig, WindowConfig};
    pub use crate::emitter::ParticleRing;
    pub use crate::error::{ConfigError, GpuError, SimulationError};
    pub use crate::input::{Input, KeyCode, MouseButton};
    pub use crate::logging::{init_logging, LoggingConfig};
    pub use crate::particles::{ParticlePool, PoolLayout};
    pub use crate::simulation::{Control, VoronoiSimulation, WeatherSimulation};
    pub use crate::spawn::{BoxPlacement, SpawnContext};
    pub use crate::time::Time;
    pub use crate::voronoi::{ShadeMode, VoronoiDiagram};
    pub use crate::weather::{FieldParams, Precipitation, PrecipitationField, Wind};
    pub use crate::{Mat4, Vec2, Vec3, Vec4};
}
