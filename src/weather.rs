//! Box-wrapped precipitation.
//!
//! The field never moves individual particles. Each frame it grows an
//! offset accumulator (wind sideways, gravity down), and at draw time the
//! accumulator is folded into `[0, box)` around the viewer. The shader adds
//! the folded offset to every base position and wraps again, so drops that
//! leave one face of the box re-enter through the opposite face and the
//! cloud follows the camera without any per-particle writes.
//!
//! ```ignore
//! let pool = ParticlePool::generate(10_000, 30.0, BoxPlacement::Centered, PoolLayout::Streaks, &mut ctx);
//! let mut field = PrecipitationField::new(pool, FieldParams::default());
//!
//! // every frame
//! field.simulate(time.elapsed(), time.delta());
//! for frame in field.frames(camera.view()) {
//!     // upload frame.offset / frame.velocity as uniforms and draw the pool
//! }
//! ```

use glam::{Vec2, Vec3};
use serde::Deserialize;

use crate::camera::CameraView;
use crate::particles::ParticlePool;
use crate::spawn::SpawnContext;

/// Fraction of the rain fall rate used for snow.
pub const SNOW_GRAVITY_SCALE: f32 = 0.2;

/// Presentation mode. Only the fall rate and the shading differ; pool and
/// accumulation are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precipitation {
    #[default]
    Rain,
    Snow,
}

impl Precipitation {
    pub fn name(self) -> &'static str {
        match self {
            Precipitation::Rain => "rain",
            Precipitation::Snow => "snow",
        }
    }
}

/// Horizontal wind as a function of elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wind {
    Calm,
    /// Constant velocity on the XZ plane (`x` → X, `y` → Z).
    Steady(Vec2),
    /// Velocity rotating around the vertical axis:
    /// `strength * (sin(f*t), cos(f*t))`.
    Gusting { strength: f32, frequency: f32 },
}

impl Wind {
    /// XZ velocity at `elapsed` seconds.
    pub fn velocity(&self, elapsed: f32) -> Vec2 {
        match *self {
            Wind::Calm => Vec2::ZERO,
            Wind::Steady(v) => v,
            Wind::Gusting {
                strength,
                frequency,
            } => {
                let phase = elapsed * frequency;
                Vec2::new(phase.sin(), phase.cos()) * strength
            }
        }
    }
}

impl Default for Wind {
    fn default() -> Self {
        Wind::Gusting {
            strength: 5.0,
            frequency: 1.0,
        }
    }
}

/// Physical parameters of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Side length of the wrap cube.
    pub box_size: f32,
    /// Rain fall rate in units per second.
    pub gravity: f32,
    pub wind: Wind,
    /// Multiplier applied to `gravity` in snow mode.
    pub snow_gravity_scale: f32,
}

impl FieldParams {
    /// Effective fall rate for `mode`.
    pub fn fall_rate(&self, mode: Precipitation) -> f32 {
        match mode {
            Precipitation::Rain => self.gravity,
            Precipitation::Snow => self.gravity * self.snow_gravity_scale,
        }
    }
}

impl Default for FieldParams {
    fn default() -> Self {
        Self {
            box_size: 30.0,
            gravity: 8.0,
            wind: Wind::default(),
            snow_gravity_scale: SNOW_GRAVITY_SCALE,
        }
    }
}

/// One independently drifting copy of the pool.
///
/// Layers multiply the apparent density: each is drawn from the same
/// vertex buffer with its own offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub wind_factor: f32,
    pub gravity_factor: f32,
    offset: Vec3,
}

impl Layer {
    pub fn new(wind_factor: f32, gravity_factor: f32) -> Self {
        Self {
            wind_factor,
            gravity_factor,
            offset: Vec3::ZERO,
        }
    }

    /// Accumulated, unwrapped drift since creation.
    #[inline]
    pub fn offset(&self) -> Vec3 {
        self.offset
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Draw parameters for one layer in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerFrame {
    /// Wrapped offset, every component in `[0, box)`.
    pub offset: Vec3,
    /// Current drift velocity, used to stretch streaks.
    pub velocity: Vec3,
}

/// Particle pool plus the drift state that animates it.
#[derive(Debug, Clone)]
pub struct PrecipitationField {
    pool: ParticlePool,
    params: FieldParams,
    mode: Precipitation,
    layers: Vec<Layer>,
    elapsed: f32,
}

impl PrecipitationField {
    /// Field with a single layer in rain mode.
    ///
    /// A non-positive or non-finite `box_size` falls back to the pool's box,
    /// or to the default box if that is unusable too.
    pub fn new(pool: ParticlePool, mut params: FieldParams) -> Self {
        if !usable_box(params.box_size) {
            let fallback = if usable_box(pool.box_size()) {
                pool.box_size()
            } else {
                FieldParams::default().box_size
            };
            log::warn!(
                "box size {} is not positive, using {}",
                params.box_size,
                fallback
            );
            params.box_size = fallback;
        }
        Self {
            pool,
            params,
            mode: Precipitation::Rain,
            layers: vec![Layer::default()],
            elapsed: 0.0,
        }
    }

    pub fn with_mode(mut self, mode: Precipitation) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the layers with `count` layers whose factors are drawn from
    /// the given ranges. A count of zero keeps a single neutral layer.
    pub fn with_jittered_layers(
        mut self,
        count: usize,
        wind_range: (f32, f32),
        gravity_range: (f32, f32),
        ctx: &mut SpawnContext,
    ) -> Self {
        self.layers = (0..count.max(1))
            .map(|_| {
                Layer::new(
                    ctx.random_range(wind_range.0, wind_range.1),
                    ctx.random_range(gravity_range.0, gravity_range.1),
                )
            })
            .collect();
        self
    }

    /// Advance every layer by `dt` seconds. `elapsed` drives the wind.
    ///
    /// The accumulators are not bounded; only their wrapped value is used.
    pub fn simulate(&mut self, elapsed: f32, dt: f32) {
        self.elapsed = elapsed;
        let wind = self.params.wind.velocity(elapsed);
        let fall = self.params.fall_rate(self.mode);
        for layer in &mut self.layers {
            layer.offset.x += wind.x * layer.wind_factor * dt;
            layer.offset.z += wind.y * layer.wind_factor * dt;
            layer.offset.y -= fall * layer.gravity_factor * dt;
        }
    }

    /// Switch presentation mode. Returns `true` if the mode changed.
    pub fn set_mode(&mut self, mode: Precipitation) -> bool {
        if self.mode == mode {
            return false;
        }
        log::info!("{} is being rendered", mode.name());
        self.mode = mode;
        true
    }

    #[inline]
    pub fn mode(&self) -> Precipitation {
        self.mode
    }

    #[inline]
    pub fn pool(&self) -> &ParticlePool {
        &self.pool
    }

    #[inline]
    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn box_size(&self) -> f32 {
        self.params.box_size
    }

    /// Elapsed time passed to the last `simulate` call.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Current drift velocity of `layer`.
    pub fn layer_velocity(&self, layer: &Layer) -> Vec3 {
        let wind = self.params.wind.velocity(self.elapsed) * layer.wind_factor;
        let fall = self.params.fall_rate(self.mode) * layer.gravity_factor;
        Vec3::new(wind.x, -fall, wind.y)
    }

    /// Wrapped offset of layer `index` for the given viewer.
    pub fn wrapped_offset(&self, index: usize, camera: CameraView) -> Option<Vec3> {
        self.layers
            .get(index)
            .map(|layer| wrap_offset(layer.offset, camera, self.params.box_size))
    }

    /// Draw parameters for every layer.
    pub fn frames(&self, camera: CameraView) -> impl Iterator<Item = LayerFrame> + '_ {
        self.layers.iter().map(move |layer| LayerFrame {
            offset: wrap_offset(layer.offset, camera, self.params.box_size),
            velocity: self.layer_velocity(layer),
        })
    }
}

fn usable_box(box_size: f32) -> bool {
    box_size.is_finite() && box_size > 0.0
}

/// Fold `value` into `[0, box_size)`. A box that is not positive yields 0.
///
/// `rem_euclid` can round up to exactly `box_size` for tiny negative inputs;
/// that case maps to 0.
#[inline]
pub fn wrap_scalar(value: f32, box_size: f32) -> f32 {
    if !usable_box(box_size) {
        return 0.0;
    }
    let r = value.rem_euclid(box_size);
    if r >= box_size {
        0.0
    } else {
        r
    }
}

/// Component-wise [`wrap_scalar`].
#[inline]
pub fn wrap_vec3(v: Vec3, box_size: f32) -> Vec3 {
    Vec3::new(
        wrap_scalar(v.x, box_size),
        wrap_scalar(v.y, box_size),
        wrap_scalar(v.z, box_size),
    )
}

/// Re-centre an accumulated offset on the viewer and fold it into the box:
/// `mod(offset - camera_pos - forward*box/2 - box/2, box)`.
pub fn wrap_offset(offset: Vec3, camera: CameraView, box_size: f32) -> Vec3 {
    let half = box_size / 2.0;
    wrap_vec3(
        offset - camera.position - camera.forward * half - Vec3::splat(half),
        box_size,
    )
}

/// Where the shader places a base position for a given wrapped offset.
///
/// The result always lies in the cube of side `box_size` centred half a box
/// ahead of the camera.
pub fn world_position(base: Vec3, wrapped: Vec3, camera: CameraView, box_size: f32) -> Vec3 {
    let half = box_size / 2.0;
    wrap_vec3(base + wrapped, box_size) + camera.position + camera.forward * half
        - Vec3::splat(half)
}
