//! Scene builders and runners.
//!
//! Each scene is split in two: a state struct that owns everything the frame
//! loop mutates (field, camera, input, time) and can be stepped without a
//! window, and a winit application that owns the window and GPU resources
//! and feeds events into the state.
//!
//! ```ignore
//! WeatherSimulation::new()
//!     .with_particle_count(20_000)
//!     .with_mode(Precipitation::Snow)
//!     .run()?;
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{Mat4, Vec3};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::camera::{Direction, FlyCamera};
use crate::config::{VoronoiConfig, WeatherConfig, WindowConfig};
use crate::emitter::ParticleRing;
use crate::error::{ConfigError, SimulationError};
use crate::gpu::{GpuContext, MeshRenderer, VoronoiRenderer, WeatherRenderer, WeatherStyle};
use crate::input::{Input, KeyCode, MouseButton};
use crate::mesh;
use crate::particles::ParticlePool;
use crate::spawn::SpawnContext;
use crate::time::Time;
use crate::voronoi::{ConeSite, ShadeMode, VoronoiDiagram};
use crate::weather::{Precipitation, PrecipitationField, Wind};

const SKY: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.12,
    a: 1.0,
};
const PAPER: wgpu::Color = wgpu::Color::WHITE;

/// Where sparks appear, in front of the camera.
const SPARK_DISTANCE: f32 = 2.0;
const SPARK_SPREAD: f32 = 0.3;
/// How often the weather window title shows a fresh frame rate.
const TITLE_REFRESH_FRAMES: u64 = 25;
/// Parked sparks sit beyond the far plane until first emitted.
const PARKED_SPARK: Vec3 = Vec3::new(0.0, -1000.0, 0.0);

/// What the frame loop should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Exit,
}

// ---------------------------------------------------------------------------
// Weather
// ---------------------------------------------------------------------------

/// Builder for the weather scene.
#[derive(Debug, Clone)]
pub struct WeatherSimulation {
    config: WeatherConfig,
    style: WeatherStyle,
}

impl WeatherSimulation {
    pub fn new() -> Self {
        Self::from_config(WeatherConfig::default())
    }

    /// Start from a loaded configuration. The streak and flake sizes in the
    /// config override the default style.
    pub fn from_config(config: WeatherConfig) -> Self {
        let style = WeatherStyle {
            streak_length: config.streak_length,
            flake_size: config.snow_flake_size,
            ..WeatherStyle::default()
        };
        Self { config, style }
    }

    pub fn with_particle_count(mut self, count: usize) -> Self {
        self.config.particle_count = count;
        self
    }

    pub fn with_box_size(mut self, box_size: f32) -> Self {
        self.config.box_size = box_size;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.config.gravity = gravity;
        self
    }

    pub fn with_wind(mut self, wind: Wind) -> Self {
        self.config.wind = wind;
        self
    }

    pub fn with_layers(mut self, layers: usize) -> Self {
        self.config.layers = layers;
        self
    }

    pub fn with_mode(mut self, mode: Precipitation) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.config.frame_interval_ms = interval.as_millis().max(1) as u64;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.window.title = title.into();
        self
    }

    pub fn with_style(mut self, style: WeatherStyle) -> Self {
        self.style = style;
        self
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }

    /// Validate the configuration and build the frame-loop state.
    pub fn build_state(&self) -> Result<WeatherState, ConfigError> {
        WeatherState::new(&self.config)
    }

    /// Open a window and run until it is closed or Escape is pressed.
    pub fn run(self) -> Result<(), SimulationError> {
        let state = self.build_state()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::WaitUntil(state.time.next_deadline()));

        let mut app = WeatherApp {
            state,
            window_config: self.config.window,
            style: self.style,
            window: None,
            gpu: None,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        app.error.take().map_or(Ok(()), Err)
    }
}

impl Default for WeatherSimulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the weather frame loop mutates.
pub struct WeatherState {
    pub field: PrecipitationField,
    pub sparks: ParticleRing,
    pub camera: FlyCamera,
    pub input: Input,
    pub time: Time,
    spawn: SpawnContext,
    sparks_per_frame: usize,
    prev_view_proj: Option<Mat4>,
}

impl WeatherState {
    pub fn new(config: &WeatherConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut spawn = SpawnContext::new(config.seed);
        let pool = ParticlePool::generate(
            config.particle_count,
            config.box_size,
            config.placement,
            config.pool_layout,
            &mut spawn,
        );
        let field = PrecipitationField::new(pool, config.field_params())
            .with_mode(config.mode)
            .with_jittered_layers(
                config.layers,
                config.layer_wind_range,
                config.layer_gravity_range,
                &mut spawn,
            );

        log::info!(
            "{} is being rendered: {} particles, {} layers, box {}",
            config.mode.name(),
            config.particle_count,
            field.layers().len(),
            config.box_size
        );

        Ok(Self {
            field,
            sparks: ParticleRing::filled(config.spark_capacity, PARKED_SPARK),
            camera: FlyCamera::default()
                .with_speed(config.camera_speed)
                .with_sensitivity(config.mouse_sensitivity),
            input: Input::new(),
            time: Time::with_frame_interval(config.frame_interval()),
            spawn,
            sparks_per_frame: config.sparks_per_frame,
            prev_view_proj: None,
        })
    }

    /// Advance one frame on the wall clock.
    pub fn step(&mut self) -> Control {
        let (elapsed, dt) = self.time.update();
        self.advance(elapsed, dt)
    }

    /// Apply this frame's input, then advance the field to `elapsed`.
    pub fn advance(&mut self, elapsed: f32, dt: f32) -> Control {
        if self.input.key_pressed(KeyCode::Escape) {
            return Control::Exit;
        }

        // the last mode key pressed this frame wins
        let mode = self
            .input
            .pressed_keys()
            .filter_map(|key| match key {
                KeyCode::Key1 => Some(Precipitation::Rain),
                KeyCode::Key2 => Some(Precipitation::Snow),
                _ => None,
            })
            .last();
        if let Some(mode) = mode {
            self.field.set_mode(mode);
        }
        if self.input.key_pressed(KeyCode::P) {
            let paused = self.time.toggle_pause();
            log::info!("{}", if paused { "paused" } else { "resumed" });
        }

        let motion = self.input.mouse_motion();
        if motion != glam::Vec2::ZERO {
            self.camera.look(motion.x, motion.y);
        }
        for (keys, direction) in [
            ([KeyCode::W, KeyCode::Up], Direction::Forward),
            ([KeyCode::S, KeyCode::Down], Direction::Backward),
            ([KeyCode::A, KeyCode::Left], Direction::Left),
            ([KeyCode::D, KeyCode::Right], Direction::Right),
        ] {
            if keys.iter().any(|k| self.input.key_held(*k)) {
                self.camera.walk(direction, dt);
            }
        }

        if self.input.mouse_held(MouseButton::Left) {
            let source = self.camera.position + self.camera.forward() * SPARK_DISTANCE;
            self.sparks
                .emit_burst(source, self.sparks_per_frame, SPARK_SPREAD, &mut self.spawn);
        }

        self.field.simulate(elapsed, dt);
        self.input.begin_frame();
        Control::Continue
    }

    /// Window title text: scene name, mode, frame rate and pause state.
    pub fn status_line(&self, title: &str) -> String {
        format!(
            "{} | {} | {:.0} fps{}",
            title,
            self.field.mode().name(),
            self.time.fps(),
            if self.time.is_paused() { " | paused" } else { "" }
        )
    }

    /// Record this frame's view-projection and return the previous one
    /// (this frame's on the first call).
    pub fn swap_view_proj(&mut self, view_proj: Mat4) -> Mat4 {
        self.prev_view_proj.replace(view_proj).unwrap_or(view_proj)
    }
}

struct WeatherGpu {
    ctx: GpuContext,
    scene: MeshRenderer,
    weather: WeatherRenderer,
}

struct WeatherApp {
    state: WeatherState,
    window_config: WindowConfig,
    style: WeatherStyle,
    window: Option<Arc<Window>>,
    gpu: Option<WeatherGpu>,
    /// Setup failure to report once the event loop returns.
    error: Option<SimulationError>,
}

impl WeatherApp {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let window = create_window(event_loop, &self.window_config)?;
        grab_cursor(&window);

        let size = window.inner_size();
        self.state.input.set_window_size(size.width, size.height);

        let ctx = pollster::block_on(GpuContext::new(window.clone()))?;
        let scene = MeshRenderer::new(&ctx, &mesh::weather_scene())?;
        let weather = WeatherRenderer::new(&ctx, &self.state.field, &self.state.sparks, self.style)?;

        self.window = Some(window);
        self.gpu = Some(WeatherGpu {
            ctx,
            scene,
            weather,
        });
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if self.state.step() == Control::Exit {
            event_loop.exit();
            return;
        }
        if self.state.time.frame() % TITLE_REFRESH_FRAMES == 0 {
            if let Some(window) = &self.window {
                window.set_title(&self.state.status_line(&self.window_config.title));
            }
        }

        let aspect = gpu.ctx.aspect();
        let view_proj = self.state.camera.view_projection(aspect);
        let prev_view_proj = self.state.swap_view_proj(view_proj);

        gpu.scene.update(&gpu.ctx.queue, view_proj, self.state.time.elapsed());
        gpu.weather.update(
            &gpu.ctx.queue,
            &self.state.field,
            self.state.camera.view(),
            view_proj,
            prev_view_proj,
            aspect,
        );
        gpu.weather
            .upload_sparks(&gpu.ctx.queue, &mut self.state.sparks);

        match gpu.ctx.begin_frame() {
            Ok(mut frame) => {
                {
                    let mut pass = gpu.ctx.begin_pass(&mut frame, SKY);
                    gpu.scene.draw(&mut pass);
                    gpu.weather.draw(&mut pass, self.state.field.mode());
                }
                gpu.ctx.finish_frame(frame);
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.ctx.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("surface error: {:?}", e),
        }
    }
}

impl ApplicationHandler for WeatherApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.state.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.ctx.resize(size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _id: DeviceId, event: DeviceEvent) {
        self.state.input.handle_device_event(&event);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        pace(event_loop, self.window.as_deref(), &self.state.time);
    }
}

// ---------------------------------------------------------------------------
// Voronoi
// ---------------------------------------------------------------------------

/// Builder for the Voronoi scene.
#[derive(Debug, Clone)]
pub struct VoronoiSimulation {
    config: VoronoiConfig,
}

impl VoronoiSimulation {
    pub fn new() -> Self {
        Self::from_config(VoronoiConfig::default())
    }

    pub fn from_config(config: VoronoiConfig) -> Self {
        Self { config }
    }

    pub fn with_mode(mut self, mode: ShadeMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn with_cone_segments(mut self, segments: u32) -> Self {
        self.config.cone_segments = segments;
        self
    }

    pub fn config(&self) -> &VoronoiConfig {
        &self.config
    }

    pub fn build_state(&self) -> Result<VoronoiState, ConfigError> {
        VoronoiState::new(&self.config)
    }

    pub fn run(self) -> Result<(), SimulationError> {
        let state = self.build_state()?;

        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::WaitUntil(state.time.next_deadline()));

        let mut app = VoronoiApp {
            state,
            config: self.config,
            window: None,
            gpu: None,
            error: None,
        };
        event_loop.run_app(&mut app)?;

        app.error.take().map_or(Ok(()), Err)
    }
}

impl Default for VoronoiSimulation {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the Voronoi frame loop mutates.
pub struct VoronoiState {
    pub diagram: VoronoiDiagram,
    pub input: Input,
    pub time: Time,
    spawn: SpawnContext,
}

impl VoronoiState {
    pub fn new(config: &VoronoiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            diagram: VoronoiDiagram::new(config.cone_radius)
                .with_max_sites(config.max_sites)
                .with_mode(config.mode),
            input: Input::new(),
            time: Time::with_frame_interval(config.frame_interval()),
            spawn: SpawnContext::new(config.seed),
        })
    }

    /// Apply this frame's input. Returns the control decision and the site
    /// added by a click, with its index, if any.
    pub fn step(&mut self) -> (Control, Option<(usize, ConeSite)>) {
        self.time.update();

        if self.input.key_pressed(KeyCode::Escape) {
            return (Control::Exit, None);
        }

        let mode = self
            .input
            .pressed_keys()
            .filter_map(KeyCode::digit)
            .filter_map(ShadeMode::from_digit)
            .last();
        if let Some(mode) = mode {
            self.diagram.set_mode(mode);
        }

        let added = if self.input.mouse_pressed(MouseButton::Left) {
            self.diagram
                .add_site_at_cursor(
                    self.input.mouse_position(),
                    self.input.window_size(),
                    &mut self.spawn,
                )
                .map(|site| (self.diagram.len() - 1, site))
        } else {
            None
        };

        self.input.begin_frame();
        (Control::Continue, added)
    }
}

struct VoronoiGpu {
    ctx: GpuContext,
    cones: VoronoiRenderer,
}

struct VoronoiApp {
    state: VoronoiState,
    config: VoronoiConfig,
    window: Option<Arc<Window>>,
    gpu: Option<VoronoiGpu>,
    error: Option<SimulationError>,
}

impl VoronoiApp {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), SimulationError> {
        let window = create_window(event_loop, &self.config.window)?;
        let size = window.inner_size();
        self.state.input.set_window_size(size.width, size.height);

        let ctx = pollster::block_on(GpuContext::new(window.clone()))?;
        let cone = mesh::cone(self.config.cone_segments, self.config.cone_radius);
        let cones = VoronoiRenderer::new(&ctx, &cone, self.config.max_sites)?;

        self.window = Some(window);
        self.gpu = Some(VoronoiGpu { ctx, cones });
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let (control, added) = self.state.step();
        if control == Control::Exit {
            event_loop.exit();
            return;
        }
        if let Some((index, site)) = added {
            gpu.cones.write_site(&gpu.ctx.queue, index, &site);
        }

        match gpu.ctx.begin_frame() {
            Ok(mut frame) => {
                {
                    let mut pass = gpu.ctx.begin_pass(&mut frame, PAPER);
                    gpu.cones
                        .draw(&mut pass, self.state.diagram.mode(), self.state.diagram.len());
                }
                gpu.ctx.finish_frame(frame);
            }
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.ctx.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("surface error: {:?}", e),
        }
    }
}

impl ApplicationHandler for VoronoiApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        self.state.input.handle_event(&event);
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.ctx.resize(size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        pace(event_loop, self.window.as_deref(), &self.state.time);
    }
}

// ---------------------------------------------------------------------------

fn create_window(
    event_loop: &ActiveEventLoop,
    config: &WindowConfig,
) -> Result<Arc<Window>, SimulationError> {
    let attrs = Window::default_attributes()
        .with_title(config.title.as_str())
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
    Ok(Arc::new(event_loop.create_window(attrs)?))
}

/// Hide the cursor and keep it in the window for mouse look. Platforms
/// support different grab modes, so fall back from locked to confined.
fn grab_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("could not grab cursor: {}", e);
    }
    window.set_cursor_visible(false);
}

/// Request a redraw once the frame interval has elapsed and sleep until the
/// next deadline otherwise.
fn pace(event_loop: &ActiveEventLoop, window: Option<&Window>, time: &Time) {
    let Some(window) = window else {
        return;
    };
    if time.frame_due(Instant::now()) {
        window.request_redraw();
    }
    event_loop.set_control_flow(ControlFlow::WaitUntil(time.next_deadline()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::PoolLayout;
    use glam::Vec2;

    fn weather_state() -> WeatherState {
        let config = WeatherConfig {
            particle_count: 200,
            layers: 3,
            seed: Some(42),
            wind: Wind::Calm,
            spark_capacity: 8,
            sparks_per_frame: 3,
            ..Default::default()
        };
        WeatherState::new(&config).unwrap()
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = WeatherSimulation::new().with_particle_count(0).build_state();
        assert!(matches!(result, Err(ConfigError::Invalid { field: "particle_count", .. })));
    }

    #[test]
    fn test_builder_applies_settings() {
        let sim = WeatherSimulation::new()
            .with_particle_count(123)
            .with_layers(4)
            .with_seed(9)
            .with_mode(Precipitation::Snow)
            .with_frame_interval(Duration::from_millis(16));
        let state = sim.build_state().unwrap();
        assert_eq!(state.field.pool().particle_count(), 123);
        assert_eq!(state.field.layers().len(), 4);
        assert_eq!(state.field.mode(), Precipitation::Snow);
        assert_eq!(state.time.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_number_keys_switch_mode() {
        let mut state = weather_state();
        state.input.press_key(KeyCode::Key2);
        state.advance(0.0, 0.0);
        assert_eq!(state.field.mode(), Precipitation::Snow);

        // still held: no new edge, mode unchanged
        state.advance(0.02, 0.02);
        state.input.release_key(KeyCode::Key2);
        state.input.press_key(KeyCode::Key1);
        state.advance(0.04, 0.02);
        assert_eq!(state.field.mode(), Precipitation::Rain);
    }

    #[test]
    fn test_last_mode_key_in_a_frame_wins() {
        let mut state = weather_state();
        state.input.press_key(KeyCode::Key2);
        state.input.press_key(KeyCode::Key1);
        state.advance(0.0, 0.0);
        assert_eq!(state.field.mode(), Precipitation::Rain);

        state.input.release_key(KeyCode::Key1);
        state.input.release_key(KeyCode::Key2);
        state.input.press_key(KeyCode::Key1);
        state.input.press_key(KeyCode::Key2);
        state.advance(0.02, 0.02);
        assert_eq!(state.field.mode(), Precipitation::Snow);
    }

    #[test]
    fn test_status_line_reports_mode_and_pause() {
        let mut state = weather_state();
        let line = state.status_line("precip");
        assert!(line.starts_with("precip | rain | "), "{}", line);
        assert!(line.ends_with(" fps"), "{}", line);

        state.input.press_key(KeyCode::P);
        state.input.press_key(KeyCode::Key2);
        state.advance(0.0, 0.0);
        let line = state.status_line("precip");
        assert!(line.contains("| snow |"), "{}", line);
        assert!(line.ends_with("| paused"), "{}", line);
    }

    #[test]
    fn test_points_pool_from_config() {
        let config = WeatherConfig {
            particle_count: 50,
            pool_layout: PoolLayout::Points,
            seed: Some(1),
            ..Default::default()
        };
        let state = WeatherState::new(&config).unwrap();
        assert_eq!(state.field.pool().layout(), PoolLayout::Points);
        assert_eq!(state.field.pool().vertex_count(), 50);
    }

    #[test]
    fn test_escape_exits() {
        let mut state = weather_state();
        assert_eq!(state.advance(0.0, 0.0), Control::Continue);
        state.input.press_key(KeyCode::Escape);
        assert_eq!(state.advance(0.0, 0.0), Control::Exit);
    }

    #[test]
    fn test_walking_and_looking() {
        let mut state = weather_state();
        let start = state.camera.position;
        state.input.press_key(KeyCode::W);
        state.advance(0.1, 0.1);
        assert!(state.camera.position.z < start.z);
        assert_eq!(state.camera.position.y, start.y);

        state.input.release_key(KeyCode::W);
        state.input.add_motion(Vec2::new(900.0, 0.0));
        state.advance(0.2, 0.1);
        assert!((state.camera.forward() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_holding_left_mouse_emits_sparks() {
        let mut state = weather_state();
        assert!(state.sparks.slots().iter().all(|s| *s == PARKED_SPARK));
        state.input.press_button(MouseButton::Left);
        state.advance(0.0, 0.0);
        assert_eq!(state.sparks.cursor(), 3);
        state.advance(0.02, 0.02);
        state.advance(0.04, 0.02);
        // 9 emissions into 8 slots wraps once
        assert_eq!(state.sparks.cursor(), 1);
        let spans: Vec<_> = state.sparks.drain_dirty().collect();
        assert_eq!(spans, vec![0..8]);
    }

    #[test]
    fn test_field_advances_with_time() {
        let mut state = weather_state();
        for step in 1..=50 {
            state.advance(step as f32 * 0.02, 0.02);
        }
        let layer = state.field.layers()[0];
        let expected = -8.0 * layer.gravity_factor;
        assert!((layer.offset().y - expected).abs() < 1e-3);
    }

    #[test]
    fn test_prev_view_proj_lags_one_frame() {
        let mut state = weather_state();
        let a = Mat4::from_translation(Vec3::X);
        let b = Mat4::from_translation(Vec3::Y);
        assert_eq!(state.swap_view_proj(a), a);
        assert_eq!(state.swap_view_proj(b), a);
        assert_eq!(state.swap_view_proj(b), b);
    }

    #[test]
    fn test_voronoi_click_and_digits() {
        let config = VoronoiConfig {
            seed: Some(3),
            ..Default::default()
        };
        let mut state = VoronoiState::new(&config).unwrap();
        state.input.set_window_size(800, 800);
        state.input.move_cursor(Vec2::new(400.0, 400.0));
        state.input.press_button(MouseButton::Left);
        state.input.press_key(KeyCode::Key3);

        let (control, added) = state.step();
        assert_eq!(control, Control::Continue);
        let (index, site) = added.unwrap();
        assert_eq!(index, 0);
        assert!(site.offset.length() < 1e-6);
        assert_eq!(state.diagram.mode(), ShadeMode::DistanceColor);

        // button still held: no second site
        let (_, added) = state.step();
        assert!(added.is_none());
        assert_eq!(state.diagram.len(), 1);
    }

    #[test]
    fn test_voronoi_last_shade_key_wins() {
        let config = VoronoiConfig {
            seed: Some(4),
            ..Default::default()
        };
        let mut state = VoronoiState::new(&config).unwrap();
        state.input.press_key(KeyCode::Key3);
        state.input.press_key(KeyCode::Key1);
        state.step();
        assert_eq!(state.diagram.mode(), ShadeMode::Color);

        state.input.release_key(KeyCode::Key1);
        state.input.release_key(KeyCode::Key3);
        state.input.press_key(KeyCode::Key1);
        state.input.press_key(KeyCode::Key2);
        state.step();
        assert_eq!(state.diagram.mode(), ShadeMode::Distance);
    }
}
