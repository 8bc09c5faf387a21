//! # Session
//!
//! The application root. Owns the settings, the spawn points, the particle
//! store, the scheduler, the timer queue and the effect sinks, and turns
//! taps and clock advances into scheduler calls.
//!
//! Time is an offset from the session epoch. Tests call [`Session::advance`]
//! with explicit times; the runtime driver calls it from tokio timers.
//!
//! ## Timer actions
//!
//! | Action | Effect |
//! |--------|--------|
//! | spawn | insert a planned particle (and queue its pop) |
//! | pop | release puffs from a live bubble |
//! | release guard | let the next burst through |
//! | auto tick | autonomous burst, then reschedule |

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use onara_core::{
    plan_pop_puffs, Color, ColorSettings, CoreError, DisplaySettings, EffectSettings,
    OutputMode, Outputs, ParticleId, ParticleKind, ParticleSpec, Point, SpawnMode, SpawnPoint,
    SpawnPointId, SpawnPointSet, Viewport,
};
use onara_effects::{
    play_with_fallback, vibrate, EffectSinks, ShakeProfile, Shaker, SoundId, SoundLibrary,
    SoundPolicy, SoundSettings, PLAYBACK_VOLUME, PREVIEW_VOLUME,
};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info, warn};

use crate::auto::{AutoEmitter, AutoSettings};
use crate::config::OnaraConfig;
use crate::error::{SessionError, SessionResult};
use crate::events::{EventBus, EventReceiver, EventSender, SceneEvent};
use crate::scheduler::{BurstInput, Emission, EmissionScheduler, ScheduledBurst};
use crate::store::{LiveParticle, ParticleStore};
use crate::timer::TimerQueue;

/// Taps closer together than this are ignored.
pub const TAP_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
enum TimerAction {
    Spawn {
        spec: ParticleSpec,
        pop_after: Option<Duration>,
    },
    Pop(ParticleId),
    ReleaseGuard(u64),
    AutoTick(u64),
}

/// Why a tap produced nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Spawn-edit mode is on; taps edit spawn points instead.
    EditMode,
    /// Within [`TAP_DEBOUNCE`] of the previous tap.
    Debounced,
    /// NaN or infinite coordinates.
    NonFinite,
    /// [`Session::start`] was never called.
    NotStarted,
}

/// What a tap or auto tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BurstOutcome {
    /// A burst started.
    Started {
        /// Burst sequence number.
        burst: u64,
        /// Firing spawn points.
        points: Vec<SpawnPointId>,
        /// Primary particles scheduled (all repeats).
        particles: usize,
        /// Clip played, if sound was on and it started.
        sound: Option<String>,
    },
    /// Another burst holds the guard.
    Busy,
    /// No spawn point existed; one was created, nothing emitted.
    EmergencySpawn(SpawnPointId),
    /// No spawn point is active.
    NoActivePoints,
    /// Filtered before reaching the scheduler.
    Ignored(IgnoreReason),
}

/// Session counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Taps received.
    pub taps: u64,
    /// Bursts started.
    pub bursts: u64,
    /// Calls dropped by the guard.
    pub busy: u64,
    /// Taps filtered out.
    pub ignored: u64,
    /// Primary particles created.
    pub particles_spawned: u64,
    /// Pop puffs created.
    pub pop_puffs: u64,
    /// Auto ticks fired.
    pub auto_ticks: u64,
    /// Faults raised.
    pub faults: u64,
}

/// The headless application.
pub struct Session {
    config: OnaraConfig,
    points: SpawnPointSet,
    store: ParticleStore,
    timers: TimerQueue<TimerAction>,
    scheduler: EmissionScheduler,
    library: SoundLibrary,
    sinks: EffectSinks,
    shaker: Shaker,
    auto: AutoEmitter,
    rng: ChaCha8Rng,
    events: Option<EventSender>,
    started: bool,
    spawn_edit: bool,
    sound_on: bool,
    faulted: bool,
    last_tap: Option<Duration>,
    now: Duration,
    stats: SessionStats,
}

impl Session {
    /// Creates a session. Nothing happens until [`Session::start`].
    #[must_use]
    pub fn new(config: OnaraConfig, sinks: EffectSinks) -> Self {
        let config = config.clamped();
        let seed = config.seed.unwrap_or_else(clock_seed);
        info!(seed, "session created");
        Self {
            library: SoundLibrary::with_settings(&config.sound),
            auto: AutoEmitter::new(config.auto),
            sound_on: config.sound.enabled,
            config,
            points: SpawnPointSet::new(),
            store: ParticleStore::new(),
            timers: TimerQueue::new(),
            scheduler: EmissionScheduler::new(),
            sinks,
            shaker: Shaker::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            events: None,
            started: false,
            spawn_edit: false,
            faulted: false,
            last_tap: None,
            now: Duration::ZERO,
            stats: SessionStats::default(),
        }
    }

    /// Opens a scene event channel sized by `event_capacity` and returns
    /// its receiving end. Replaces any earlier sender.
    pub fn subscribe(&mut self) -> EventReceiver {
        let bus = EventBus::new(self.config.event_capacity);
        self.events = Some(bus.sender());
        bus.receiver()
    }

    /// Publishes scene events to `sender`.
    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Starts the session: adds the first spawn point at the bottom center
    /// and arms the auto emitter.
    ///
    /// # Errors
    ///
    /// Fails only if the viewport yields a non-finite spawn position.
    pub fn start(&mut self, now: Duration) -> SessionResult<SpawnPointId> {
        self.now = self.now.max(now);
        self.started = true;
        let at = self.config.viewport.default_spawn();
        let id = self.add_spawn_point(at)?;
        self.arm_auto(self.config.auto);
        info!(id, "session started");
        Ok(id)
    }

    /// True once [`Session::start`] ran.
    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.started
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    /// Handles a tap at `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Faulted`] while faulted, or the planning error
    /// that faulted the session.
    pub fn tap(&mut self, x: f32, y: f32, now: Duration) -> SessionResult<BurstOutcome> {
        self.advance(now);
        self.stats.taps += 1;

        if self.faulted {
            debug!("tap rejected, session faulted");
            return Err(SessionError::Faulted);
        }
        let reason = if !self.started {
            Some(IgnoreReason::NotStarted)
        } else if self.spawn_edit {
            Some(IgnoreReason::EditMode)
        } else if self
            .last_tap
            .is_some_and(|last| now.saturating_sub(last) < TAP_DEBOUNCE)
        {
            Some(IgnoreReason::Debounced)
        } else if !Point::new(x, y).is_finite() {
            warn!(x, y, "non-finite tap skipped");
            Some(IgnoreReason::NonFinite)
        } else {
            None
        };
        if let Some(reason) = reason {
            self.stats.ignored += 1;
            return Ok(BurstOutcome::Ignored(reason));
        }

        self.last_tap = Some(now);
        let policy = self.config.sound.tap_policy();
        self.burst_at(Point::new(x, y), now, policy)
    }

    /// Runs the scheduler directly, bypassing tap filtering.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Faulted`] while faulted. A planning failure
    /// faults the session and is returned.
    pub fn burst_at(
        &mut self,
        at: Point,
        now: Duration,
        sound_policy: SoundPolicy,
    ) -> SessionResult<BurstOutcome> {
        self.advance(now);
        if self.faulted {
            return Err(SessionError::Faulted);
        }
        if !at.is_finite() {
            warn!(x = at.x, y = at.y, "non-finite burst position skipped");
            return Ok(BurstOutcome::Ignored(IgnoreReason::NonFinite));
        }

        let outputs = Outputs::resolve(self.config.output_mode, &self.config.display, self.sound_on);
        let input = BurstInput {
            at,
            now,
            effect: &self.config.effect,
            colors: &self.config.colors,
            outputs,
            spawn_mode: self.config.spawn_mode,
            viewport: self.config.viewport,
            library: &self.library,
            sound: &self.config.sound,
            sound_policy,
        };

        match self.scheduler.emit(&input, &mut self.points, &mut self.rng) {
            Ok(Emission::Started(burst)) => Ok(self.execute(burst, now)),
            Ok(Emission::Busy) => {
                self.stats.busy += 1;
                Ok(BurstOutcome::Busy)
            }
            Ok(Emission::EmergencySpawn(id)) => {
                if let Some(point) = self.points.get(id) {
                    self.publish(SceneEvent::SpawnPointAdded {
                        id,
                        position: point.position(),
                    });
                }
                Ok(BurstOutcome::EmergencySpawn(id))
            }
            Ok(Emission::NoActivePoints) => Ok(BurstOutcome::NoActivePoints),
            Err(err) => {
                self.fault(&err);
                Err(SessionError::Core(err))
            }
        }
    }

    fn execute(&mut self, burst: ScheduledBurst, now: Duration) -> BurstOutcome {
        self.stats.bursts += 1;

        let sound = if burst.outputs.sound {
            let played = play_with_fallback(self.sinks.sound.as_mut(), &burst.sound.id.url(), PLAYBACK_VOLUME);
            if let Some(url) = &played {
                self.publish(SceneEvent::SoundPlayed { url: url.clone() });
            }
            played
        } else {
            None
        };

        if burst.outputs.vibration {
            let strength = self.config.display.vibration_strength;
            if let Some(pattern) = vibrate(self.sinks.haptic.as_mut(), strength, &mut self.rng) {
                self.publish(SceneEvent::Vibrated {
                    pattern: pattern.to_vec(),
                });
            }
        }

        if burst.outputs.shake {
            let profile = ShakeProfile::for_strength(self.config.display.shake_strength, &mut self.rng);
            if self.shaker.shake(self.sinks.shake.as_mut(), profile, now) {
                self.publish(SceneEvent::Shaken {
                    intensity: profile.intensity,
                    duration: profile.duration,
                });
            }
        }

        let particles = burst.plan.len();
        for planned in burst.plan.particles {
            self.timers.schedule(
                now + planned.delay,
                TimerAction::Spawn {
                    spec: planned.spec,
                    pop_after: planned.pop_after,
                },
            );
        }
        self.timers.schedule(burst.release_at, TimerAction::ReleaseGuard(burst.id));

        self.publish(SceneEvent::BurstStarted {
            burst: burst.id,
            points: burst.points.clone(),
            particles,
        });

        // Zero-delay particles appear immediately
        self.advance(now);

        BurstOutcome::Started {
            burst: burst.id,
            points: burst.points,
            particles,
            sound,
        }
    }

    fn fault(&mut self, err: &CoreError) {
        error!(%err, "burst generation failed, session faulted");
        self.faulted = true;
        self.stats.faults += 1;
        self.publish(SceneEvent::Faulted {
            message: err.to_string(),
        });
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Runs every timer due at `now` and sweeps expired particles.
    ///
    /// Times earlier than the last advance are treated as the last advance.
    pub fn advance(&mut self, now: Duration) {
        let now = now.max(self.now);
        while let Some((due, action)) = self.timers.pop_next_due(now) {
            self.sweep(due);
            self.run(action, due);
        }
        self.sweep(now);
        self.now = now;
    }

    fn sweep(&mut self, now: Duration) {
        for id in self.store.sweep(now) {
            self.publish(SceneEvent::ParticleRemoved { id });
        }
    }

    fn run(&mut self, action: TimerAction, at: Duration) {
        match action {
            TimerAction::Spawn { spec, pop_after } => {
                let id = self.store.add(spec, at);
                self.stats.particles_spawned += 1;
                self.publish(SceneEvent::ParticleAdded { id, at });
                if let Some(after) = pop_after {
                    self.timers.schedule(at + after, TimerAction::Pop(id));
                }
            }
            TimerAction::Pop(id) => self.pop(id, at),
            TimerAction::ReleaseGuard(burst) => {
                if self.scheduler.release(burst) {
                    self.publish(SceneEvent::GuardReleased { burst });
                }
            }
            TimerAction::AutoTick(generation) => self.auto_tick(generation, at),
        }
    }

    fn pop(&mut self, id: ParticleId, at: Duration) {
        let Some(live) = self.store.get(id) else {
            debug!(%id, "bubble gone before pop");
            return;
        };
        let position = live.particle.position_at(live.age(at));
        let options = live.particle.spec.options;
        let puffs = plan_pop_puffs(position, options, &mut self.rng);
        let count = puffs.len();
        for puff in puffs {
            let puff_id = self.store.add(puff, at);
            self.stats.pop_puffs += 1;
            self.publish(SceneEvent::ParticleAdded { id: puff_id, at });
        }
        self.publish(SceneEvent::BubblePopped {
            id,
            position,
            puffs: count,
        });
    }

    fn auto_tick(&mut self, generation: u64, at: Duration) {
        if !self.auto.accepts(generation) {
            return;
        }
        self.stats.auto_ticks += 1;
        let target = self.auto.fire(&self.config.viewport, &mut self.rng);
        let policy = self.auto.settings().sound_policy;

        if !self.faulted {
            self.now = at;
            match self.burst_at(target, at, policy) {
                Ok(outcome) => debug!(?outcome, "auto burst"),
                Err(err) => warn!(%err, "auto burst failed"),
            }
        }
        if let Some((due, generation)) = self.auto.next_tick(at) {
            self.timers.schedule(due, TimerAction::AutoTick(generation));
        }
    }

    /// Earliest pending timer or expiry.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.timers.next_due(), self.store.next_expiry()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Last time passed to [`Session::advance`].
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    // =========================================================================
    // Fault handling
    // =========================================================================

    /// True after a burst failed, until [`Session::reload`].
    #[must_use]
    pub const fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Clears particles, timers, the guard and the fault flag.
    ///
    /// Spawn points and settings survive; the auto emitter is re-armed.
    pub fn reload(&mut self) {
        for live in self.store.iter() {
            if let Some(events) = &self.events {
                events.send(SceneEvent::ParticleRemoved { id: live.particle.id });
            }
        }
        self.store.clear();
        self.timers.clear();
        self.scheduler.reset();
        self.faulted = false;
        self.last_tap = None;
        self.arm_auto(*self.auto.settings());
        info!("session reloaded");
    }

    // =========================================================================
    // Spawn points
    // =========================================================================

    /// Adds a spawn point in the current main color.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] for NaN or infinite input.
    pub fn add_spawn_point(&mut self, at: Point) -> SessionResult<SpawnPointId> {
        let id = self.points.add(at, self.config.colors.main_color.clone())?;
        self.publish(SceneEvent::SpawnPointAdded { id, position: at });
        Ok(id)
    }

    /// Moves a spawn point.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id or a non-finite position.
    pub fn move_spawn_point(&mut self, id: SpawnPointId, to: Point) -> SessionResult<()> {
        Ok(self.points.move_to(id, to)?)
    }

    /// Recolors a spawn point.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id.
    pub fn set_spawn_color(&mut self, id: SpawnPointId, color: Color) -> SessionResult<()> {
        Ok(self.points.set_color(id, color)?)
    }

    /// Enables or disables a spawn point.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id.
    pub fn set_spawn_active(&mut self, id: SpawnPointId, active: bool) -> SessionResult<()> {
        Ok(self.points.set_active(id, active)?)
    }

    /// Enables every spawn point.
    pub fn activate_all(&mut self) {
        self.points.set_all_active(true);
    }

    /// Disables every spawn point.
    pub fn deactivate_all(&mut self) {
        self.points.set_all_active(false);
    }

    /// Deletes a spawn point.
    ///
    /// # Errors
    ///
    /// Fails for an unknown id.
    pub fn remove_spawn_point(&mut self, id: SpawnPointId) -> SessionResult<()> {
        self.points.remove(id)?;
        self.publish(SceneEvent::SpawnPointRemoved { id });
        Ok(())
    }

    /// Deletes every spawn point.
    pub fn remove_all_spawn_points(&mut self) {
        let ids: Vec<_> = self.points.all().iter().map(|p| p.id).collect();
        self.points.clear();
        for id in ids {
            self.publish(SceneEvent::SpawnPointRemoved { id });
        }
    }

    /// All spawn points.
    #[must_use]
    pub fn spawn_points(&self) -> &[SpawnPoint] {
        self.points.all()
    }

    /// Turns spawn-edit mode on or off. Taps are ignored while it is on.
    pub fn set_spawn_edit(&mut self, on: bool) {
        self.spawn_edit = on;
    }

    /// True in spawn-edit mode.
    #[must_use]
    pub const fn is_spawn_edit(&self) -> bool {
        self.spawn_edit
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Current configuration.
    #[must_use]
    pub const fn config(&self) -> &OnaraConfig {
        &self.config
    }

    /// Replaces the burst settings. They are validated when the next burst
    /// starts; out-of-range values fault the session.
    pub fn set_effect(&mut self, effect: EffectSettings) {
        self.config.effect = effect;
    }

    /// Replaces the colors.
    pub fn set_colors(&mut self, colors: ColorSettings) {
        self.config.colors = colors;
    }

    /// Replaces the output toggles.
    pub fn set_display(&mut self, display: DisplaySettings) {
        self.config.display = display;
    }

    /// Sets the output mode.
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.config.output_mode = mode;
    }

    /// Sets the spawn selection mode.
    pub fn set_spawn_mode(&mut self, mode: SpawnMode) {
        self.config.spawn_mode = mode;
    }

    /// Sets the viewport (affects emergency and auto positions).
    ///
    /// # Errors
    ///
    /// Rejects a non-finite or non-positive size and keeps the old one.
    pub fn set_viewport(&mut self, viewport: Viewport) -> SessionResult<()> {
        if let Err(err) = viewport.validate() {
            warn!(%err, "viewport rejected");
            return Err(err.into());
        }
        self.config.viewport = viewport;
        Ok(())
    }

    /// Replaces the sound preferences and rebuilds the catalogue.
    pub fn set_sound(&mut self, sound: SoundSettings) {
        self.library = SoundLibrary::with_settings(&sound);
        self.sound_on = sound.enabled;
        self.config.sound = sound;
    }

    /// Sets one clip's burst count (clamped to 1-5).
    pub fn set_burst_count(&mut self, id: SoundId, count: u32) -> u32 {
        let count = self.library.set_burst_count(id, count);
        self.config.sound.burst_counts.insert(id, count);
        count
    }

    /// Mutes or unmutes.
    pub fn set_sound_on(&mut self, on: bool) {
        self.sound_on = on;
    }

    /// Plays a clip at preview volume. Returns the URL that started.
    pub fn preview_sound(&mut self, id: SoundId) -> Option<String> {
        play_with_fallback(self.sinks.sound.as_mut(), &id.url(), PREVIEW_VOLUME)
    }

    /// Reconfigures the auto emitter; queued ticks of the old setup are void.
    pub fn set_auto(&mut self, settings: AutoSettings) {
        self.config.auto = settings;
        self.arm_auto(settings);
    }

    fn arm_auto(&mut self, settings: AutoSettings) {
        if let Some((due, generation)) = self.auto.configure(settings, self.now) {
            self.timers.schedule(due, TimerAction::AutoTick(generation));
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Live particles in insertion order.
    pub fn particles(&self) -> impl Iterator<Item = &LiveParticle> {
        self.store.iter()
    }

    /// Number of live particles.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.store.len()
    }

    /// Live particles emitted by one spawn point (pop puffs excluded).
    #[must_use]
    pub fn particles_from(&self, id: SpawnPointId) -> usize {
        self.store
            .iter()
            .filter(|p| p.particle.spec.spawn_point == Some(id) && p.particle.spec.kind != ParticleKind::PopPuff)
            .count()
    }

    /// True while a burst holds the re-entrancy guard.
    #[must_use]
    pub const fn is_emitting(&self) -> bool {
        self.scheduler.is_emitting()
    }

    /// Pending timer actions.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Particle store counters.
    #[must_use]
    pub const fn store_stats(&self) -> crate::store::StoreStats {
        self.store.stats()
    }

    fn publish(&self, event: SceneEvent) {
        if let Some(events) = &self.events {
            events.send(event);
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("now", &self.now)
            .field("spawn_points", &self.points.len())
            .field("particles", &self.store.len())
            .field("timers", &self.timers.len())
            .field("emitting", &self.scheduler.is_emitting())
            .field("faulted", &self.faulted)
            .finish_non_exhaustive()
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

/// A session behind a mutex, shared between the runtime and callers.
#[derive(Clone, Debug)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    /// Wraps a session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Runs `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut Session) -> T) -> T {
        f(&mut self.inner.lock())
    }

    /// See [`Session::tap`].
    ///
    /// # Errors
    ///
    /// As [`Session::tap`].
    pub fn tap(&self, x: f32, y: f32, now: Duration) -> SessionResult<BurstOutcome> {
        self.inner.lock().tap(x, y, now)
    }

    /// See [`Session::advance`].
    pub fn advance(&self, now: Duration) {
        self.inner.lock().advance(now);
    }

    /// See [`Session::next_deadline`].
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.lock().next_deadline()
    }

    /// See [`Session::particle_count`].
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.inner.lock().particle_count()
    }

    /// See [`Session::is_emitting`].
    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.inner.lock().is_emitting()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use onara_core::Pattern;
    use onara_effects::Recorder;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn session() -> (Session, Recorder) {
        let recorder = Recorder::new();
        let config = OnaraConfig {
            seed: Some(1),
            ..OnaraConfig::default()
        };
        let mut session = Session::new(config, EffectSinks::recording(&recorder));
        session.start(Duration::ZERO).unwrap();
        (session, recorder)
    }

    #[test]
    fn test_start_adds_bottom_center_point() {
        let (session, _) = session();
        let viewport = session.config().viewport;
        assert_eq!(session.spawn_points().len(), 1);
        assert_eq!(session.spawn_points()[0].position(), viewport.default_spawn());
    }

    #[test]
    fn test_tap_before_start_is_ignored() {
        let mut session = Session::new(OnaraConfig::default(), EffectSinks::silent());
        assert_eq!(
            session.tap(10.0, 10.0, Duration::ZERO).unwrap(),
            BurstOutcome::Ignored(IgnoreReason::NotStarted)
        );
    }

    #[test]
    fn test_tap_spawns_staggered_particles() {
        let (mut session, recorder) = session();
        let outcome = session.tap(100.0, 100.0, ms(1000)).unwrap();
        let BurstOutcome::Started { particles, .. } = outcome else {
            panic!("expected a burst, got {outcome:?}");
        };
        assert_eq!(particles, 8);
        // Normal pattern: index 0 at once, then every 20ms
        assert_eq!(session.particle_count(), 1);
        session.advance(ms(1000 + 7 * 20));
        assert_eq!(session.particle_count(), 8);
        assert_eq!(recorder.sounds(), vec!["/sounds/small1.mp3".to_string()]);
    }

    #[test]
    fn test_debounce_and_edit_mode() {
        let (mut session, _) = session();
        assert!(matches!(
            session.tap(1.0, 1.0, ms(1000)).unwrap(),
            BurstOutcome::Started { .. }
        ));
        assert_eq!(
            session.tap(1.0, 1.0, ms(1299)).unwrap(),
            BurstOutcome::Ignored(IgnoreReason::Debounced)
        );

        session.set_spawn_edit(true);
        assert_eq!(
            session.tap(1.0, 1.0, ms(3000)).unwrap(),
            BurstOutcome::Ignored(IgnoreReason::EditMode)
        );
    }

    #[test]
    fn test_non_finite_tap_is_skipped() {
        let (mut session, _) = session();
        assert_eq!(
            session.tap(f32::NAN, 1.0, ms(1000)).unwrap(),
            BurstOutcome::Ignored(IgnoreReason::NonFinite)
        );
        assert!(!session.is_faulted());
    }

    #[test]
    fn test_fault_and_reload() {
        let (mut session, _) = session();
        let mut effect = EffectSettings::default();
        effect.duration = 60.0;
        session.set_effect(effect);

        assert!(matches!(
            session.tap(1.0, 1.0, ms(1000)),
            Err(SessionError::Core(CoreError::OutOfRange { name: "duration", .. }))
        ));
        assert!(session.is_faulted());
        assert!(matches!(session.tap(1.0, 1.0, ms(5000)), Err(SessionError::Faulted)));

        session.set_effect(EffectSettings::default());
        session.reload();
        assert!(!session.is_faulted());
        assert!(matches!(
            session.tap(1.0, 1.0, ms(9000)).unwrap(),
            BurstOutcome::Started { .. }
        ));
    }

    #[test]
    fn test_bubble_trail_pops_puffs() {
        let (mut session, _) = session();
        let mut effect = EffectSettings {
            pattern: Pattern::Bubble,
            count: 4,
            ..EffectSettings::default()
        };
        effect.options.trail = true;
        session.set_effect(effect);

        session.tap(1.0, 1.0, ms(1000)).unwrap();
        // Every pop lands before 1000 + 150 + 0.7 * 3000
        session.advance(ms(3300));
        let stats = session.stats();
        assert_eq!(stats.particles_spawned, 4);
        assert!((4..=8).contains(&stats.pop_puffs));
    }

    #[test]
    fn test_output_mode_vibration_only() {
        let (mut session, recorder) = session();
        session.set_output_mode(OutputMode::VibrationOnly);
        session.set_display(DisplaySettings {
            vibration: true,
            ..DisplaySettings::default()
        });

        let outcome = session.tap(1.0, 1.0, ms(1000)).unwrap();
        assert!(matches!(outcome, BurstOutcome::Started { particles: 0, sound: None, .. }));
        assert!(recorder.sounds().is_empty());
        assert_eq!(recorder.records().len(), 1);
    }

    #[test]
    fn test_muted_session_plays_nothing() {
        let (mut session, recorder) = session();
        session.set_sound_on(false);
        session.tap(1.0, 1.0, ms(1000)).unwrap();
        assert!(recorder.sounds().is_empty());
        assert_eq!(session.particle_count(), 1);
    }

    #[test]
    fn test_bad_viewport_is_rejected() {
        let (mut session, _) = session();
        let before = session.config().viewport;
        assert!(matches!(
            session.set_viewport(Viewport::new(f32::NAN, 800.0)),
            Err(SessionError::Core(CoreError::OutOfRange { .. }))
        ));
        assert!(session.set_viewport(Viewport::new(-5.0, 800.0)).is_err());
        assert_eq!(session.config().viewport, before);

        session.remove_all_spawn_points();
        let outcome = session.tap(1.0, 1.0, ms(1000)).unwrap();
        assert!(matches!(outcome, BurstOutcome::EmergencySpawn(_)));
        assert!(!session.is_faulted());

        session.set_viewport(Viewport::new(200.0, 400.0)).unwrap();
        session.remove_all_spawn_points();
        let BurstOutcome::EmergencySpawn(id) = session.tap(1.0, 1.0, ms(2000)).unwrap() else {
            panic!("expected an emergency point");
        };
        let point = session.spawn_points().iter().find(|p| p.id == id).unwrap();
        assert_eq!(point.position(), Point::new(100.0, 300.0));
    }

    #[test]
    fn test_bad_viewport_in_config_falls_back() {
        let config = OnaraConfig {
            seed: Some(1),
            viewport: Viewport::new(f32::NAN, 0.0),
            ..OnaraConfig::default()
        };
        let mut session = Session::new(config, EffectSinks::silent());
        assert_eq!(session.config().viewport, Viewport::default());
        session.start(Duration::ZERO).unwrap();
        assert!(matches!(
            session.tap(1.0, 1.0, ms(1000)).unwrap(),
            BurstOutcome::Started { .. }
        ));
    }

    #[test]
    fn test_subscribe_uses_configured_capacity() {
        let config = OnaraConfig {
            seed: Some(1),
            event_capacity: 4,
            ..OnaraConfig::default()
        };
        let mut session = Session::new(config, EffectSinks::silent());
        let events = session.subscribe();
        session.start(Duration::ZERO).unwrap();
        session.tap(1.0, 1.0, ms(1000)).unwrap();
        session.advance(ms(2000));

        assert_eq!(events.pending_count(), 4);
        assert!(matches!(events.try_recv(), Some(SceneEvent::SpawnPointAdded { .. })));
        assert_eq!(events.drain().len(), 3);
    }

    #[test]
    fn test_preview_uses_preview_volume() {
        let (mut session, recorder) = session();
        let id: SoundId = "big4".parse().unwrap();
        assert_eq!(session.preview_sound(id).as_deref(), Some("/sounds/big4.mp3"));
        assert!(matches!(
            recorder.records()[0],
            onara_effects::EffectRecord::Sound { volume, .. } if (volume - PREVIEW_VOLUME).abs() < f32::EPSILON
        ));
    }
}
