//! Integration tests for the box-wrapped precipitation field and the
//! emission ring, through the public API only.

use precip::prelude::*;
use precip::weather::{world_position, wrap_offset};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn params(wind: Wind) -> FieldParams {
    FieldParams {
        box_size: 30.0,
        gravity: 8.0,
        wind,
        snow_gravity_scale: 0.2,
    }
}

fn field(count: usize, wind: Wind, seed: u64) -> PrecipitationField {
    let mut ctx = SpawnContext::seeded(seed);
    let pool = ParticlePool::generate(
        count,
        30.0,
        BoxPlacement::Centered,
        PoolLayout::Streaks,
        &mut ctx,
    );
    PrecipitationField::new(pool, params(wind))
}

// ============================================================================
// Wrapping
// ============================================================================

#[test]
fn test_wrapped_offset_stays_in_box_for_long_runs() {
    let mut field = field(16, Wind::default(), 1);
    let mut camera = FlyCamera::default();
    let mut elapsed = 0.0;

    // 100k frames at 50 fps: the accumulator ends far outside the box.
    for frame in 0..100_000 {
        elapsed += 0.02;
        field.simulate(elapsed, 0.02);
        if frame % 997 == 0 {
            camera.walk(Direction::Forward, 0.5);
            camera.look(13.0, 0.0);
            let w = field.wrapped_offset(0, camera.view()).unwrap();
            assert!(
                w.cmpge(Vec3::ZERO).all() && w.cmplt(Vec3::splat(30.0)).all(),
                "frame {}: {:?}",
                frame,
                w
            );
        }
    }
    assert!(field.layers()[0].offset().y < -10_000.0);
}

#[test]
fn test_wrap_handles_arbitrary_offsets() {
    let mut rng = SmallRng::seed_from_u64(0xC0FFEE);
    for _ in 0..10_000 {
        let offset = Vec3::new(
            rng.gen_range(-1.0e6..1.0e6),
            rng.gen_range(-1.0e6..1.0e6),
            rng.gen_range(-1.0e-3..1.0e-3),
        );
        let camera = CameraView::new(
            Vec3::new(
                rng.gen_range(-500.0..500.0),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-500.0..500.0),
            ),
            Vec3::new(rng.gen_range(-1.0..1.0), 0.0, rng.gen_range(-1.0..1.0)).normalize_or_zero(),
        );
        let box_size = rng.gen_range(1.0..100.0);
        let w = wrap_offset(offset, camera, box_size);
        assert!(w.cmpge(Vec3::ZERO).all(), "{:?}", w);
        assert!(w.cmplt(Vec3::splat(box_size)).all(), "{:?} box {}", w, box_size);
    }
}

#[test]
fn test_particles_surround_the_camera() {
    let mut field = field(500, Wind::default(), 2);
    let mut camera = FlyCamera::default();
    for step in 1..=200 {
        field.simulate(step as f32 * 0.02, 0.02);
        camera.walk(Direction::Forward, 0.02);
    }

    let view = camera.view();
    let centre = view.position + view.forward * 15.0;
    let wrapped = field.wrapped_offset(0, view).unwrap();
    for i in 0..field.pool().particle_count() {
        let p = world_position(field.pool().head(i).unwrap(), wrapped, view, 30.0);
        let d = (p - centre).abs().max_element();
        assert!(d <= 15.0 + 1e-3, "particle {} is {} from the box centre", i, d);
    }
}

// ============================================================================
// Free fall
// ============================================================================

#[test]
fn test_fifty_steps_fall_eight_units() {
    let mut field = field(10, Wind::Calm, 3);
    for step in 1..=50 {
        field.simulate(step as f32 * 0.02, 0.02);
    }
    let offset = field.layers()[0].offset();
    assert!((offset.y + 8.0).abs() < 1e-4, "y = {}", offset.y);

    let camera = FlyCamera::default();
    let wrapped = field.wrapped_offset(0, camera.view()).unwrap();
    let expected = (-8.0f32 - camera.position.y - 15.0).rem_euclid(30.0);
    assert!((wrapped.y - expected).abs() < 1e-3);
    assert!(wrapped.y >= 0.0 && wrapped.y < 30.0);
}

#[test]
fn test_snow_only_changes_vertical_drift() {
    let wind = Wind::Gusting {
        strength: 3.0,
        frequency: 0.7,
    };
    let mut rain = field(10, wind, 4);
    let mut snow = field(10, wind, 4).with_mode(Precipitation::Snow);

    for step in 1..=300 {
        let t = step as f32 * 0.02;
        rain.simulate(t, 0.02);
        snow.simulate(t, 0.02);
        let (r, s) = (rain.layers()[0].offset(), snow.layers()[0].offset());
        assert_eq!(r.x, s.x);
        assert_eq!(r.z, s.z);
    }

    let (r, s) = (rain.layers()[0].offset(), snow.layers()[0].offset());
    assert!((s.y - r.y * 0.2).abs() < 1e-3, "rain {} snow {}", r.y, s.y);
}

#[test]
fn test_mode_switch_keeps_the_pool() {
    let mut field = field(64, Wind::default(), 5);
    let before = field.pool().vertices().to_vec();
    field.simulate(0.5, 0.02);
    assert!(field.set_mode(Precipitation::Snow));
    field.simulate(0.52, 0.02);
    assert!(field.set_mode(Precipitation::Rain));
    assert_eq!(field.pool().vertices(), &before[..]);
}

// ============================================================================
// Pool generation
// ============================================================================

#[test]
fn test_pool_has_exact_count_in_bounds() {
    let mut ctx = SpawnContext::seeded(6);
    for placement in [BoxPlacement::Centered, BoxPlacement::Offset] {
        for layout in [PoolLayout::Points, PoolLayout::Streaks] {
            let pool = ParticlePool::generate(1234, 30.0, placement, layout, &mut ctx);
            assert_eq!(pool.particle_count(), 1234);
            assert_eq!(
                pool.vertex_count(),
                1234 * layout.vertices_per_particle()
            );
            assert!(pool.vertices().iter().all(|p| placement.contains(30.0, *p)));
        }
    }
}

#[test]
fn test_streaks_start_with_zero_length() {
    let mut ctx = SpawnContext::seeded(7);
    let pool = ParticlePool::generate(
        100,
        10.0,
        BoxPlacement::Centered,
        PoolLayout::Streaks,
        &mut ctx,
    );
    for i in 0..100 {
        assert_eq!(pool.head(i), pool.tail(i));
    }
}

// ============================================================================
// Emission ring
// ============================================================================

#[test]
fn test_three_emissions_into_two_slots() {
    let mut ring = ParticleRing::new(2);
    let p0 = Vec3::new(1.0, 0.0, 0.0);
    let p1 = Vec3::new(2.0, 0.0, 0.0);
    let p2 = Vec3::new(3.0, 0.0, 0.0);
    ring.emit(p0);
    ring.emit(p1);
    ring.emit(p2);
    assert_eq!(ring.slots(), &[p2, p1]);
    assert_eq!(ring.cursor(), 1);
}

#[test]
fn test_full_lap_writes_every_slot_once() {
    let capacity = 37;
    let mut ring = ParticleRing::new(capacity);
    let written: Vec<usize> = (0..capacity)
        .map(|i| ring.emit(Vec3::splat(i as f32 + 1.0)))
        .collect();
    assert_eq!(written, (0..capacity).collect::<Vec<_>>());
    assert!(ring.slots().iter().all(|p| *p != Vec3::ZERO));

    let before = ring.slots().to_vec();
    assert_eq!(ring.emit(Vec3::splat(-1.0)), 0);
    assert_eq!(ring.get(0), Some(Vec3::splat(-1.0)));
    assert_eq!(&ring.slots()[1..], &before[1..]);
}

// ============================================================================
// Frame loop
// ============================================================================

#[test]
fn test_weather_state_from_json_config() {
    let config = WeatherConfig::from_json(
        r#"{
            "particle_count": 300,
            "layers": 2,
            "seed": 11,
            "mode": "snow",
            "wind": "calm"
        }"#,
    )
    .unwrap();
    let mut state = WeatherSimulation::from_config(config).build_state().unwrap();
    assert_eq!(state.field.pool().particle_count(), 300);
    assert_eq!(state.field.mode(), Precipitation::Snow);

    for step in 1..=10 {
        assert_eq!(state.advance(step as f32 * 0.02, 0.02), Control::Continue);
    }
    for layer in state.field.layers() {
        assert_eq!(layer.offset().x, 0.0);
        assert!(layer.offset().y < 0.0);
    }
}
