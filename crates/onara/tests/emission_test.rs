//! Integration test for burst emission through the public session API.
//!
//! Drives a seeded [`Session`] on a simulated clock and checks the
//! per-point counts, the re-entrancy guard, spawn selection and cleanup.

use std::time::Duration;

use onara::core::{EffectSettings, Pattern, Point, SpawnMode, RING_RADIUS};
use onara::effects::{EffectRecord, EffectSinks, Recorder, SoundId, SoundPolicy};
use onara::{AutoPosition, AutoSettings, BurstOutcome, EventBus, OnaraConfig, SceneEvent, Session};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn started(seed: u64) -> (Session, Recorder) {
    let recorder = Recorder::new();
    let config = OnaraConfig {
        seed: Some(seed),
        ..OnaraConfig::default()
    };
    let mut session = Session::new(config, EffectSinks::recording(&recorder));
    session.start(Duration::ZERO).unwrap();
    (session, recorder)
}

fn points_of(outcome: &BurstOutcome) -> Vec<u32> {
    match outcome {
        BurstOutcome::Started { points, .. } => points.clone(),
        other => panic!("expected a burst, got {other:?}"),
    }
}

#[test]
fn test_every_pattern_emits_capped_count_per_point() {
    for pattern in Pattern::ALL {
        for count in [1, 8, 15, 40] {
            let (mut session, _) = started(7);
            let second = session.add_spawn_point(Point::new(50.0, 50.0)).unwrap();
            let first = session.spawn_points()[0].id;
            session.set_effect(EffectSettings {
                pattern,
                count,
                ..EffectSettings::default()
            });

            session.tap(200.0, 200.0, ms(1000)).unwrap();
            session.advance(ms(2500));

            let expected = count.min(15) as usize;
            assert_eq!(session.particles_from(first), expected, "{pattern:?} x {count}");
            assert_eq!(session.particles_from(second), expected, "{pattern:?} x {count}");
        }
    }
}

#[test]
fn test_ring_lands_on_fixed_radius() {
    let (mut session, _) = started(3);
    session.set_effect(EffectSettings {
        pattern: Pattern::Ring,
        count: 12,
        ..EffectSettings::default()
    });
    session.tap(10.0, 10.0, ms(1000)).unwrap();

    // Ring has no stagger
    assert_eq!(session.particle_count(), 12);
    for live in session.particles() {
        let spec = &live.particle.spec;
        let d = spec.origin.distance_to(spec.target);
        assert!((d - RING_RADIUS).abs() < 1e-3, "distance {d}");
    }
}

#[test]
fn test_overlapping_calls_give_one_burst() {
    let (mut session, recorder) = started(1);
    let first = session.burst_at(Point::new(1.0, 1.0), ms(1000), SoundPolicy::Current).unwrap();
    let second = session.burst_at(Point::new(1.0, 1.0), ms(1100), SoundPolicy::Current).unwrap();

    assert!(matches!(first, BurstOutcome::Started { .. }));
    assert_eq!(second, BurstOutcome::Busy);
    assert!(session.is_emitting());
    assert_eq!(recorder.sounds().len(), 1);

    session.advance(ms(1300));
    assert!(!session.is_emitting());
    let third = session.burst_at(Point::new(1.0, 1.0), ms(1300), SoundPolicy::Current).unwrap();
    assert!(matches!(third, BurstOutcome::Started { .. }));
    assert_eq!(session.stats().busy, 1);
}

#[test]
fn test_sequential_mode_cycles_points() {
    let (mut session, _) = started(1);
    let a = session.spawn_points()[0].id;
    let b = session.add_spawn_point(Point::new(10.0, 10.0)).unwrap();
    let c = session.add_spawn_point(Point::new(20.0, 20.0)).unwrap();
    session.set_spawn_mode(SpawnMode::Sequential);

    let fired: Vec<Vec<u32>> = (0..4)
        .map(|i| points_of(&session.tap(0.0, 0.0, ms(1000 + i * 1000)).unwrap()))
        .collect();
    assert_eq!(fired, vec![vec![a], vec![b], vec![c], vec![a]]);
}

#[test]
fn test_sequential_mode_follows_spawn_point_edits() {
    let (mut session, _) = started(1);
    let a = session.spawn_points()[0].id;
    let b = session.add_spawn_point(Point::new(10.0, 10.0)).unwrap();
    let c = session.add_spawn_point(Point::new(20.0, 20.0)).unwrap();
    session.set_spawn_mode(SpawnMode::Sequential);

    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(1000)).unwrap()), vec![a]);
    session.set_spawn_active(a, false).unwrap();
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(2000)).unwrap()), vec![b]);
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(3000)).unwrap()), vec![c]);

    session.set_spawn_active(a, true).unwrap();
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(4000)).unwrap()), vec![a]);
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(5000)).unwrap()), vec![b]);
    session.remove_spawn_point(a).unwrap();
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(6000)).unwrap()), vec![c]);
    assert_eq!(points_of(&session.tap(0.0, 0.0, ms(7000)).unwrap()), vec![b]);
}

#[test]
fn test_random_mix_with_one_point_always_fires_it() {
    let (mut session, _) = started(11);
    let only = session.spawn_points()[0].id;
    session.set_spawn_mode(SpawnMode::RandomMix);

    for i in 0..20 {
        let outcome = session.tap(0.0, 0.0, ms(1000 + i * 1000)).unwrap();
        assert_eq!(points_of(&outcome), vec![only]);
    }
}

#[test]
fn test_store_is_empty_after_all_timers() {
    let (mut session, _) = started(5);
    let mut effect = EffectSettings {
        pattern: Pattern::Bubble,
        count: 15,
        ..EffectSettings::default()
    };
    effect.options.trail = true;
    session.set_effect(effect);
    session.add_spawn_point(Point::new(300.0, 300.0)).unwrap();

    session.tap(0.0, 0.0, ms(1000)).unwrap();
    session.advance(ms(2000));
    assert!(session.particle_count() > 0);

    while let Some(next) = session.next_deadline() {
        session.advance(next);
    }
    assert_eq!(session.particle_count(), 0);
    assert_eq!(session.pending_timers(), 0);
    let stats = session.store_stats();
    assert_eq!(stats.added, stats.expired);
}

#[test]
fn test_stale_guard_lets_next_burst_through() {
    let (mut session, _) = started(1);
    let small1: SoundId = "small1".parse().unwrap();
    session.set_burst_count(small1, 5);
    session.set_effect(EffectSettings {
        burst_interval_ms: 1000,
        ..EffectSettings::default()
    });

    assert!(matches!(session.tap(0.0, 0.0, ms(1000)).unwrap(), BurstOutcome::Started { .. }));
    assert_eq!(session.tap(0.0, 0.0, ms(1500)).unwrap(), BurstOutcome::Busy);
    // Held for a full second: reset and fire
    assert!(matches!(session.tap(0.0, 0.0, ms(2000)).unwrap(), BurstOutcome::Started { .. }));
}

#[test]
fn test_repeats_follow_clip_burst_count() {
    let (mut session, _) = started(1);
    let small1: SoundId = "small1".parse().unwrap();
    assert_eq!(session.set_burst_count(small1, 9), 5);
    session.set_burst_count(small1, 3);

    let outcome = session.tap(0.0, 0.0, ms(1000)).unwrap();
    assert!(matches!(outcome, BurstOutcome::Started { particles: 24, .. }));

    // Guard held for two intervals plus the release delay
    session.advance(ms(1000 + 2 * 400 + 299));
    assert!(session.is_emitting());
    session.advance(ms(1000 + 2 * 400 + 300));
    assert!(!session.is_emitting());
}

#[test]
fn test_empty_set_recovers_with_emergency_point() {
    let (mut session, recorder) = started(1);
    session.remove_all_spawn_points();
    recorder.clear();

    let outcome = session.tap(0.0, 0.0, ms(1000)).unwrap();
    let BurstOutcome::EmergencySpawn(id) = outcome else {
        panic!("expected an emergency point, got {outcome:?}");
    };
    assert_eq!(session.spawn_points().len(), 1);
    assert_eq!(session.spawn_points()[0].id, id);
    assert_eq!(session.particle_count(), 0);
    assert!(recorder.records().is_empty());
    assert!(!session.is_emitting());

    assert!(matches!(session.tap(0.0, 0.0, ms(2000)).unwrap(), BurstOutcome::Started { .. }));
}

#[test]
fn test_inactive_points_emit_nothing() {
    let (mut session, recorder) = started(1);
    session.deactivate_all();
    assert_eq!(session.tap(0.0, 0.0, ms(1000)).unwrap(), BurstOutcome::NoActivePoints);
    assert!(!session.is_emitting());
    assert!(recorder.records().is_empty());

    session.activate_all();
    assert!(matches!(session.tap(0.0, 0.0, ms(2000)).unwrap(), BurstOutcome::Started { .. }));
}

#[test]
fn test_auto_emitter_fires_on_interval() {
    let (mut session, _) = started(9);
    session.set_auto(AutoSettings {
        enabled: true,
        interval_secs: 1,
        position: AutoPosition::Center,
        sound_policy: SoundPolicy::AllRandom,
    });

    session.advance(ms(3500));
    let stats = session.stats();
    assert_eq!(stats.auto_ticks, 3);
    assert_eq!(stats.bursts, 3);

    session.set_auto(AutoSettings::default());
    session.advance(ms(10_000));
    assert_eq!(session.stats().auto_ticks, 3);
}

#[test]
fn test_scene_events_describe_a_burst() {
    let bus = EventBus::new(4096);
    let events = bus.receiver();
    let recorder = Recorder::new();
    let config = OnaraConfig {
        seed: Some(2),
        ..OnaraConfig::default()
    };
    let mut session =
        Session::new(config, EffectSinks::recording(&recorder)).with_events(bus.sender());
    session.start(Duration::ZERO).unwrap();
    session.tap(0.0, 0.0, ms(1000)).unwrap();
    session.advance(ms(10_000));

    let scene = events.drain();
    let count = |f: fn(&SceneEvent) -> bool| scene.iter().filter(|e| f(e)).count();
    assert_eq!(count(|e| matches!(e, SceneEvent::SpawnPointAdded { .. })), 1);
    assert_eq!(count(|e| matches!(e, SceneEvent::BurstStarted { particles: 8, .. })), 1);
    assert_eq!(count(|e| matches!(e, SceneEvent::SoundPlayed { .. })), 1);
    assert_eq!(count(|e| matches!(e, SceneEvent::ParticleAdded { .. })), 8);
    assert_eq!(count(|e| matches!(e, SceneEvent::ParticleRemoved { .. })), 8);
    assert_eq!(count(|e| matches!(e, SceneEvent::GuardReleased { .. })), 1);
    assert!(matches!(recorder.records()[0], EffectRecord::Sound { .. }));
}
