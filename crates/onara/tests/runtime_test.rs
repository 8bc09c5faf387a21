//! Integration test for the tokio driver.
//!
//! Runs on a paused clock so timer deadlines resolve instantly and
//! deterministically.

use std::time::Duration;

use onara::core::{EffectSettings, Pattern, Point};
use onara::effects::{EffectSinks, Recorder, SoundPolicy};
use onara::{BurstOutcome, OnaraConfig, Runtime, Session, SessionError, SharedSession};

fn shared(recorder: &Recorder) -> SharedSession {
    let config = OnaraConfig {
        seed: Some(4),
        ..OnaraConfig::default()
    };
    let mut session = Session::new(config, EffectSinks::recording(recorder));
    session.start(Duration::ZERO).unwrap();
    session.set_effect(EffectSettings {
        pattern: Pattern::Ring,
        duration: 1.0,
        ..EffectSettings::default()
    });
    SharedSession::new(session)
}

#[tokio::test(start_paused = true)]
async fn test_runtime_drains_after_handles_drop() {
    let recorder = Recorder::new();
    let session = shared(&recorder);
    let (runtime, handle) = Runtime::new(session.clone());
    let driver = tokio::spawn(runtime.run());

    let outcome = handle.tap(100.0, 100.0).await.unwrap();
    assert!(matches!(outcome, BurstOutcome::Started { particles: 8, .. }));
    assert_eq!(session.particle_count(), 8);

    let busy = handle
        .burst(Point::new(5.0, 5.0), SoundPolicy::Current)
        .await
        .unwrap();
    assert_eq!(busy, BurstOutcome::Busy);

    drop(handle);
    let report = driver.await.unwrap();
    assert_eq!(report.live_particles, 0);
    assert_eq!(report.inputs, 2);
    assert!(report.elapsed >= Duration::from_secs(1));
    assert!(!session.is_emitting());
    assert_eq!(recorder.sounds().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_guard_releases_on_timer() {
    let recorder = Recorder::new();
    let session = shared(&recorder);
    let (runtime, handle) = Runtime::new(session.clone());
    let driver = tokio::spawn(runtime.run());

    handle.tap(10.0, 10.0).await.unwrap();
    assert!(session.is_emitting());

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(!session.is_emitting());
    let again = handle.tap(20.0, 20.0).await.unwrap();
    assert!(matches!(again, BurstOutcome::Started { .. }));

    handle.shutdown().await.unwrap();
    let report = driver.await.unwrap();
    assert_eq!(report.inputs, 2);
}

#[tokio::test(start_paused = true)]
async fn test_handle_fails_after_shutdown() {
    let recorder = Recorder::new();
    let (runtime, handle) = Runtime::new(shared(&recorder));
    let driver = tokio::spawn(runtime.run());

    handle.shutdown().await.unwrap();
    driver.await.unwrap();
    assert!(matches!(
        handle.tap(1.0, 1.0).await,
        Err(SessionError::ChannelClosed)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_reload_clears_fault() {
    let recorder = Recorder::new();
    let session = shared(&recorder);
    let (runtime, handle) = Runtime::new(session.clone());
    let driver = tokio::spawn(runtime.run());

    session.with(|s| {
        s.set_effect(EffectSettings {
            size: 500.0,
            ..EffectSettings::default()
        });
    });
    assert!(matches!(
        handle.tap(1.0, 1.0).await,
        Err(SessionError::Core(_))
    ));
    assert!(session.with(|s| s.is_faulted()));

    session.with(|s| s.set_effect(EffectSettings::default()));
    handle.reload().await.unwrap();
    let outcome = handle.tap(1.0, 1.0).await.unwrap();
    assert!(matches!(outcome, BurstOutcome::Started { .. }));

    drop(handle);
    assert_eq!(driver.await.unwrap().live_particles, 0);
}
