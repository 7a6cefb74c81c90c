//! End-to-end scenarios driven through the public `Engine` API.

use std::f32::consts::FRAC_PI_2;

use orrery::generator::PointSet;
use orrery::particle::{slot_target, target_index, SlotTarget};
use orrery::prelude::*;
use orrery::time::rotation_angle;

const DT: f32 = 1.0 / 60.0;

fn engine(count: usize) -> Engine {
    let config = EngineConfig::default().with_particle_count(count).with_seed(42);
    let mut engine = Engine::new(config).unwrap();
    engine.resize(800, 600);
    engine.update(DT, 12.0);
    engine
}

fn run(engine: &mut Engine, ticks: usize) {
    for _ in 0..ticks {
        engine.update(DT, 12.0);
    }
}

fn phases(events: &[TransitionEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|e| match e {
            TransitionEvent::PhaseChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect()
}

#[test]
fn ten_particles_wrap_over_three_points() {
    for slot in 0..10 {
        assert_eq!(target_index(slot, 3), Some(slot % 3));
        assert_eq!(slot_target(slot, 3, 0, SlotPolicy::Wrap), Some(SlotTarget::Main(slot % 3)));
    }

    let mut engine = engine(10);
    let points = [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 2.0, 0.0)];
    engine.set_point_set(ShapeId::Monogram, PointSet::from_positions(points));
    engine.request_shape(ShapeId::Monogram);
    run(&mut engine, 600);

    let screens: Vec<Vec2> = engine.pool().iter().map(|p| p.screen).collect();
    for (slot, screen) in screens.iter().enumerate() {
        assert!(
            screen.distance(screens[slot % 3]) < 0.05,
            "slot {slot} did not land on point {}",
            slot % 3
        );
    }
    assert!(screens[0].distance(screens[1]) > 5.0);
    assert!(screens[1].distance(screens[2]) > 5.0);
}

#[test]
fn repeated_group_request_is_a_noop() {
    let mut engine = engine(200);
    engine.request_shape(ShapeGroup::Contact);
    run(&mut engine, 30);
    let _ = engine.drain_events();
    let dwell = engine.machine().dwell();
    let before = engine.status();

    engine.request_shape(ShapeGroup::Contact);
    assert_eq!(engine.machine().dwell(), dwell);
    assert_eq!(engine.status(), before);

    engine.update(DT, 12.0);
    assert!(engine.drain_events().is_empty());
    assert!(engine.machine().dwell() > dwell);
    assert_eq!(engine.status().active, ShapeId::Email);
}

#[test]
fn quarter_day_is_quarter_turn() {
    assert!((rotation_angle(6.0) - FRAC_PI_2).abs() < 1e-6);

    let mut engine = engine(50);
    engine.update(DT, 6.0);
    assert_eq!(engine.status().hours, 6.0);
}

#[test]
fn explosion_ramps_from_zero() {
    let mut engine = engine(200);
    engine.request_shape(ShapeId::Monogram);
    run(&mut engine, 10);
    assert_eq!(engine.status().intensity, 0.0);

    engine.request_shape(ShapeId::Code);
    assert_eq!(engine.status().phase, Phase::Exploding);
    engine.update(DT, 12.0);
    assert!((engine.status().intensity - 0.12).abs() < 1e-6);

    let mut last = engine.status().intensity;
    while engine.status().phase == Phase::Exploding {
        engine.update(DT, 12.0);
        let now = engine.status().intensity;
        assert!(now > last);
        last = now;
    }
    assert_eq!(engine.status().phase, Phase::Hang);
    assert!(last > 1.1);
}

#[test]
fn shape_switch_visits_each_phase_once() {
    let mut engine = engine(300);
    engine.request_shape(ShapeId::Monogram);
    run(&mut engine, 30);
    let _ = engine.drain_events();

    engine.request_shape(ShapeId::Developer);
    let mut events = engine.drain_events();
    let mut active_before_hang = Vec::new();
    for _ in 0..1000 {
        if engine.status().phase != Phase::Hang {
            active_before_hang.push((engine.status().phase, engine.status().active));
        }
        engine.update(DT, 12.0);
        events.extend(engine.drain_events());
        if engine.status().phase == Phase::Idle {
            break;
        }
    }

    assert_eq!(
        phases(&events),
        vec![Phase::Exploding, Phase::Hang, Phase::Imploding, Phase::Idle]
    );
    let swaps = events
        .iter()
        .filter(|e| matches!(e, TransitionEvent::Swapped { .. }))
        .count();
    assert_eq!(swaps, 1);
    // Before the hang the old shape is still active; after it the new one is.
    for (phase, active) in active_before_hang {
        match phase {
            Phase::Exploding => assert_eq!(active, ShapeId::Monogram),
            Phase::Imploding | Phase::Idle => assert_eq!(active, ShapeId::Developer),
            Phase::Hang => unreachable!(),
        }
    }
}

#[test]
fn round_trip_reproduces_ordering() {
    let mut engine = engine(400);
    let ordering = engine.library().get(ShapeId::Monogram).points().to_vec();

    engine.request_shape(ShapeId::Monogram);
    run(&mut engine, 600);
    let first: Vec<Vec2> = engine.pool().iter().map(|p| p.screen).collect();

    engine.request_shape(ShapeRequest::Home);
    run(&mut engine, 300);
    engine.request_shape(ShapeId::Monogram);
    run(&mut engine, 600);
    let second: Vec<Vec2> = engine.pool().iter().map(|p| p.screen).collect();

    assert_eq!(engine.library().get(ShapeId::Monogram).points(), ordering.as_slice());
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(a.distance(*b) < 0.05);
    }
}

#[test]
fn morph_stays_bounded() {
    let mut engine = engine(200);
    for request in [
        ShapeRequest::Shape(ShapeId::Email),
        ShapeRequest::Home,
        ShapeRequest::Group(ShapeGroup::Hobbies),
        ShapeRequest::Shape(ShapeId::Bug),
    ] {
        engine.request_shape(request);
        for _ in 0..200 {
            engine.update(DT, 12.0);
            let morph = engine.status().morph;
            assert!((0.0..=1.0).contains(&morph));
        }
    }
}

#[test]
fn snapshot_renders_planet() {
    let mut engine = engine(2000);
    run(&mut engine, 5);
    let mut surface = RasterSurface::new(800, 600);
    engine.render(&mut surface).unwrap();
    assert_eq!(surface.frames(), 1);

    let bg = engine.draw_list().background;
    let bg = Vec3::new(bg[0], bg[1], bg[2]);
    let covered = (0..600)
        .flat_map(|y| (0..800).map(move |x| (x, y)))
        .filter(|&(x, y)| surface.pixel(x, y).unwrap().distance(bg) > 0.01)
        .count();
    assert!(covered > 100);
}
