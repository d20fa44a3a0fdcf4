//! JSON configuration for the two scenes.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! {
//!     "particle_count": 20000,
//!     "wind": { "gusting": { "strength": 3.0, "frequency": 0.5 } },
//!     "mode": "snow"
//! }
//! ```
//!
//! Loading always validates; a config that made it out of [`WeatherConfig::load`]
//! can be handed to the simulation as is.

use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::particles::PoolLayout;
use crate::spawn::BoxPlacement;
use crate::voronoi::ShadeMode;
use crate::weather::{FieldParams, Precipitation, Wind, SNOW_GRAVITY_SCALE};

/// Window title and initial logical size.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::invalid(
                "window",
                format!("size must be non-zero, got {}x{}", self.width, self.height),
            ));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "precip".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Settings for the weather scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherConfig {
    pub window: WindowConfig,
    /// Logical particles in the shared pool.
    pub particle_count: usize,
    pub box_size: f32,
    pub placement: BoxPlacement,
    /// `streaks` stores a head and tail per particle for motion-blurred
    /// rain. `points` halves the pool for snow-only scenes; rain is then
    /// drawn as flakes.
    pub pool_layout: PoolLayout,
    /// Rain fall rate in units per second.
    pub gravity: f32,
    pub snow_gravity_scale: f32,
    pub wind: Wind,
    /// Copies of the pool drawn with their own drift.
    pub layers: usize,
    pub layer_wind_range: (f32, f32),
    pub layer_gravity_range: (f32, f32),
    pub mode: Precipitation,
    /// Seconds of motion a rain streak spans.
    pub streak_length: f32,
    pub snow_flake_size: f32,
    /// Fixed seed for reproducible pools; `None` seeds from the clock.
    pub seed: Option<u64>,
    pub frame_interval_ms: u64,
    pub camera_speed: f32,
    pub mouse_sensitivity: f32,
    pub spark_capacity: usize,
    pub sparks_per_frame: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::titled("precip: weather"),
            particle_count: 10_000,
            box_size: 30.0,
            placement: BoxPlacement::Centered,
            pool_layout: PoolLayout::Streaks,
            gravity: 8.0,
            snow_gravity_scale: SNOW_GRAVITY_SCALE,
            wind: Wind::default(),
            layers: 20,
            layer_wind_range: (0.2, 0.6),
            layer_gravity_range: (0.875, 1.125),
            mode: Precipitation::Rain,
            streak_length: 0.04,
            snow_flake_size: 0.03,
            seed: None,
            frame_interval_ms: 20,
            camera_speed: 7.5,
            mouse_sensitivity: 0.1,
            spark_capacity: 4096,
            sparks_per_frame: 16,
        }
    }
}

impl WeatherConfig {
    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        if self.particle_count == 0 {
            return Err(ConfigError::invalid("particle_count", "must be at least 1"));
        }
        if !(self.box_size > 0.0) || !self.box_size.is_finite() {
            return Err(ConfigError::invalid(
                "box_size",
                format!("must be a positive number, got {}", self.box_size),
            ));
        }
        if !(self.gravity >= 0.0) {
            return Err(ConfigError::invalid(
                "gravity",
                format!("must not be negative, got {}", self.gravity),
            ));
        }
        if !(self.snow_gravity_scale > 0.0 && self.snow_gravity_scale <= 1.0) {
            return Err(ConfigError::invalid(
                "snow_gravity_scale",
                format!("must be in (0, 1], got {}", self.snow_gravity_scale),
            ));
        }
        check_range("layer_wind_range", self.layer_wind_range)?;
        check_range("layer_gravity_range", self.layer_gravity_range)?;
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::invalid("frame_interval_ms", "must be at least 1"));
        }
        if self.spark_capacity == 0 {
            return Err(ConfigError::invalid("spark_capacity", "must be at least 1"));
        }
        Ok(())
    }

    pub fn field_params(&self) -> FieldParams {
        FieldParams {
            box_size: self.box_size,
            gravity: self.gravity,
            wind: self.wind,
            snow_gravity_scale: self.snow_gravity_scale,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// Settings for the Voronoi scene.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoronoiConfig {
    pub window: WindowConfig,
    pub cone_segments: u32,
    /// Cone rim radius in NDC; large enough to cover the screen by default.
    pub cone_radius: f32,
    pub max_sites: usize,
    pub mode: ShadeMode,
    pub seed: Option<u64>,
    pub frame_interval_ms: u64,
}

impl Default for VoronoiConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                title: "precip: voronoi".to_string(),
                width: 800,
                height: 800,
            },
            cone_segments: 64,
            cone_radius: 3.0,
            max_sites: 256,
            mode: ShadeMode::Color,
            seed: None,
            frame_interval_ms: 20,
        }
    }
}

impl VoronoiConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = load_json(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.window.validate()?;
        if self.cone_segments < 3 {
            return Err(ConfigError::invalid(
                "cone_segments",
                format!("a cone needs at least 3 segments, got {}", self.cone_segments),
            ));
        }
        if !(self.cone_radius > 0.0) {
            return Err(ConfigError::invalid(
                "cone_radius",
                format!("must be positive, got {}", self.cone_radius),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::invalid("frame_interval_ms", "must be at least 1"));
        }
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("loaded config from {}", path.display());
    Ok(serde_json::from_str(&text)?)
}

fn check_range(field: &'static str, (min, max): (f32, f32)) -> Result<(), ConfigError> {
    if !(min <= max) {
        return Err(ConfigError::invalid(
            field,
            format!("empty range [{}, {}]", min, max),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_defaults_are_valid() {
        assert!(WeatherConfig::default().validate().is_ok());
        assert!(VoronoiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = WeatherConfig::from_json(
            r#"{
                "particle_count": 500,
                "mode": "snow",
                "wind": { "steady": [1.0, -2.0] },
                "layer_wind_range": [1.0, 3.0]
            }"#,
        )
        .unwrap();
        assert_eq!(config.particle_count, 500);
        assert_eq!(config.mode, Precipitation::Snow);
        assert_eq!(config.wind, Wind::Steady(Vec2::new(1.0, -2.0)));
        assert_eq!(config.layer_wind_range, (1.0, 3.0));
        assert_eq!(config.box_size, 30.0);
        assert_eq!(config.frame_interval(), Duration::from_millis(20));
    }

    #[test]
    fn test_pool_layout_parses() {
        assert_eq!(WeatherConfig::default().pool_layout, PoolLayout::Streaks);
        let config = WeatherConfig::from_json(r#"{ "pool_layout": "points" }"#).unwrap();
        assert_eq!(config.pool_layout, PoolLayout::Points);
        assert!(matches!(
            WeatherConfig::from_json(r#"{ "pool_layout": "lines" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_wind_variants_parse() {
        let calm = WeatherConfig::from_json(r#"{ "wind": "calm" }"#).unwrap();
        assert_eq!(calm.wind, Wind::Calm);
        let gusting = WeatherConfig::from_json(
            r#"{ "wind": { "gusting": { "strength": 2.0, "frequency": 0.5 } } }"#,
        )
        .unwrap();
        assert_eq!(
            gusting.wind,
            Wind::Gusting {
                strength: 2.0,
                frequency: 0.5
            }
        );
    }

    fn rejected_field(json: &str) -> &'static str {
        match WeatherConfig::from_json(json) {
            Err(ConfigError::Invalid { field, .. }) => field,
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert_eq!(rejected_field(r#"{ "particle_count": 0 }"#), "particle_count");
        assert_eq!(rejected_field(r#"{ "box_size": 0.0 }"#), "box_size");
        assert_eq!(rejected_field(r#"{ "box_size": -4.0 }"#), "box_size");
        assert_eq!(rejected_field(r#"{ "gravity": -1.0 }"#), "gravity");
        assert_eq!(rejected_field(r#"{ "snow_gravity_scale": 0.0 }"#), "snow_gravity_scale");
        assert_eq!(rejected_field(r#"{ "snow_gravity_scale": 1.5 }"#), "snow_gravity_scale");
        assert_eq!(rejected_field(r#"{ "frame_interval_ms": 0 }"#), "frame_interval_ms");
        assert_eq!(rejected_field(r#"{ "layer_gravity_range": [2.0, 1.0] }"#), "layer_gravity_range");
        assert_eq!(rejected_field(r#"{ "window": { "width": 0 } }"#), "window");
    }

    #[test]
    fn test_unknown_fields_and_bad_json() {
        assert!(matches!(
            WeatherConfig::from_json(r#"{ "particle_cuont": 5 }"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            WeatherConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_voronoi_needs_three_segments() {
        match VoronoiConfig::from_json(r#"{ "cone_segments": 2 }"#) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "cone_segments"),
            other => panic!("expected Invalid, got {:?}", other),
        }
        let ok = VoronoiConfig::from_json(r#"{ "mode": "distance_color" }"#).unwrap();
        assert_eq!(ok.mode, ShadeMode::DistanceColor);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = WeatherConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_field_params_follow_config() {
        let config = WeatherConfig {
            gravity: 4.0,
            box_size: 12.0,
            ..Default::default()
        };
        let params = config.field_params();
        assert_eq!(params.gravity, 4.0);
        assert_eq!(params.box_size, 12.0);
        assert_eq!(params.snow_gravity_scale, SNOW_GRAVITY_SCALE);
    }
}
