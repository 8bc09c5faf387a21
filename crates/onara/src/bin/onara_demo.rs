//! # ONARA Headless Demo
//!
//! Fires one burst per pattern on a simulated clock, then drives a short
//! real-time run through the tokio runtime, and prints what happened.
//!
//! Run with: `cargo run --bin onara_demo [config.toml]`

use std::time::Duration;

use onara::core::{EffectSettings, Pattern, Point, SpawnMode};
use onara::effects::{EffectSinks, Recorder, SoundPolicy};
use onara::{
    BurstOutcome, OnaraConfig, Runtime, SceneEvent, Session, SessionError, SessionResult,
    SharedSession,
};

fn load_config() -> SessionResult<OnaraConfig> {
    match std::env::args().nth(1) {
        Some(path) => OnaraConfig::from_file(path),
        None => Ok(OnaraConfig {
            seed: Some(0x0DA5A),
            ..OnaraConfig::default()
        }),
    }
}

/// One burst per pattern, each on a quiet session clock.
fn pattern_tour(config: &OnaraConfig) -> SessionResult<()> {
    let recorder = Recorder::new();
    let mut session = Session::new(config.clone(), EffectSinks::recording(&recorder));
    let events = session.subscribe();
    let first = session.start(Duration::ZERO)?;
    let second = session.add_spawn_point(Point::new(80.0, 600.0))?;
    session.set_spawn_mode(SpawnMode::Simultaneous);

    println!("┌────────────┬───────────┬──────────┬──────────┬──────────┐");
    println!("│ pattern    │ planned   │ point #{first} │ point #{second} │ live     │");
    println!("├────────────┼───────────┼──────────┼──────────┼──────────┤");

    let mut now = Duration::from_secs(1);
    for pattern in Pattern::ALL {
        let mut effect = EffectSettings {
            pattern,
            count: 10,
            ..config.effect
        };
        effect.options.trail = pattern == Pattern::Bubble;
        session.set_effect(effect);

        let outcome = session.tap(195.0, 300.0, now)?;
        let planned = match outcome {
            BurstOutcome::Started { particles, .. } => particles,
            other => {
                println!("│ {:<10} │ {other:?}", pattern.name());
                continue;
            }
        };

        // Let every stagger fire, then look
        session.advance(now + Duration::from_millis(1500));
        println!(
            "│ {:<10} │ {:>9} │ {:>8} │ {:>8} │ {:>8} │",
            pattern.name(),
            planned,
            session.particles_from(first),
            session.particles_from(second),
            session.particle_count(),
        );

        // Drain everything before the next pattern
        now += Duration::from_secs(15);
        session.advance(now);
    }
    println!("└────────────┴───────────┴──────────┴──────────┴──────────┘");

    let stats = session.stats();
    let store = session.store_stats();
    let scene = events.drain();
    let pops = scene
        .iter()
        .filter(|e| matches!(e, SceneEvent::BubblePopped { .. }))
        .count();
    println!();
    println!("Bursts:          {}", stats.bursts);
    println!("Particles:       {} primary, {} pop puffs", stats.particles_spawned, stats.pop_puffs);
    println!("Bubbles popped:  {pops}");
    println!("Store:           added {}, expired {}, peak {}", store.added, store.expired, store.peak);
    println!("Live at end:     {}", session.particle_count());
    println!("Sounds played:   {:?}", recorder.sounds());
    println!("Scene events:    {}", scene.len());
    Ok(())
}

/// A few taps through the tokio driver in real time.
async fn realtime_run(config: OnaraConfig) -> SessionResult<()> {
    let recorder = Recorder::new();
    let mut session = Session::new(config, EffectSinks::recording(&recorder));
    session.start(Duration::ZERO)?;
    session.set_effect(EffectSettings {
        pattern: Pattern::Ring,
        duration: 0.5,
        ..EffectSettings::default()
    });
    let shared = SharedSession::new(session);

    let (runtime, handle) = Runtime::new(shared.clone());
    let driver = tokio::spawn(runtime.run());

    let first = handle.tap(100.0, 100.0).await?;
    let busy = handle.burst(Point::new(100.0, 100.0), SoundPolicy::AllRandom).await?;
    tokio::time::sleep(Duration::from_millis(400)).await;
    let third = handle.tap(300.0, 200.0).await?;
    drop(handle);

    let report = driver
        .await
        .map_err(|err| SessionError::Runtime(std::io::Error::other(err)))?;
    println!();
    println!("Real-time run:");
    println!("  first tap:   {first:?}");
    println!("  overlapping: {busy:?}");
    println!("  third tap:   {third:?}");
    println!("  {report:?}");
    println!("  sounds:      {:?}", recorder.sounds());
    Ok(())
}

fn main() -> SessionResult<()> {
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║                   ONARA PATTERN TOUR                     ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let config = load_config()?;
    pattern_tour(&config)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    runtime.block_on(realtime_run(config))
}
