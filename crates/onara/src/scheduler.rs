//! # Particle Emission Scheduler
//!
//! Turns one interaction into a scheduled burst:
//!
//! 1. **Guard** - drop the call if a burst is still in flight (stale
//!    guards older than [`STALE_GUARD_AFTER`] are reset first)
//! 2. **Spawn set** - with no spawn points at all, create the emergency
//!    point and stop
//! 3. **Selection** - pick firing points from the active ones
//! 4. **Sound** - pick the clip; its burst count is the repeat count
//! 5. **Plan** - compute every particle and its delay
//!
//! The scheduler only decides. The session executes the plan on its timer
//! queue and releases the guard at [`ScheduledBurst::release_at`].

use std::time::Duration;

use onara_core::{
    plan_burst, BurstPlan, BurstRequest, ColorSettings, CoreResult, EffectSettings, Outputs,
    Point, SpawnMode, SpawnPointId, SpawnPointSet, SpawnSelector, Viewport,
};
use onara_effects::{Sound, SoundLibrary, SoundPolicy, SoundSettings};
use rand::Rng;
use tracing::{debug, info, warn};

/// The guard stays held this long after the last repeat starts.
pub const GUARD_RELEASE_DELAY: Duration = Duration::from_millis(300);
/// A guard held at least this long is reset by the next call.
pub const STALE_GUARD_AFTER: Duration = Duration::from_secs(1);

/// Re-entrancy flag for bursts.
///
/// A guard older than [`STALE_GUARD_AFTER`] is taken over even when the
/// holder's repeat chain (`burst_count * burst_interval`) is still running,
/// so a long chain can overlap the next burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurstGuard {
    held: Option<(u64, Duration)>,
}

impl BurstGuard {
    /// Takes the guard for `burst` at `now`.
    ///
    /// Returns `false` if another burst holds it and is not stale.
    pub fn try_acquire(&mut self, burst: u64, now: Duration) -> bool {
        if let Some((holder, since)) = self.held {
            if now.saturating_sub(since) < STALE_GUARD_AFTER {
                return false;
            }
            warn!(holder, held_ms = now.saturating_sub(since).as_millis() as u64, "stale burst guard reset");
        }
        self.held = Some((burst, now));
        true
    }

    /// Releases the guard if `burst` still holds it.
    pub fn release(&mut self, burst: u64) -> bool {
        match self.held {
            Some((holder, _)) if holder == burst => {
                self.held = None;
                true
            }
            _ => false,
        }
    }

    /// Releases unconditionally.
    pub fn reset(&mut self) {
        self.held = None;
    }

    /// True while a burst holds the guard.
    #[must_use]
    pub const fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// Burst holding the guard.
    #[must_use]
    pub fn holder(&self) -> Option<u64> {
        self.held.map(|(burst, _)| burst)
    }
}

/// Everything a burst reads, captured when it starts.
#[derive(Clone, Copy, Debug)]
pub struct BurstInput<'a> {
    /// Interaction position.
    pub at: Point,
    /// Session time.
    pub now: Duration,
    /// Burst shape.
    pub effect: &'a EffectSettings,
    /// Colors.
    pub colors: &'a ColorSettings,
    /// Resolved outputs.
    pub outputs: Outputs,
    /// Firing point selection.
    pub spawn_mode: SpawnMode,
    /// For the emergency spawn point.
    pub viewport: Viewport,
    /// Sound catalogue.
    pub library: &'a SoundLibrary,
    /// Sound preferences.
    pub sound: &'a SoundSettings,
    /// Clip selection.
    pub sound_policy: SoundPolicy,
}

/// A burst the session must now execute.
#[derive(Clone, Debug)]
pub struct ScheduledBurst {
    /// Sequence number; also the guard token.
    pub id: u64,
    /// Firing spawn points.
    pub points: Vec<SpawnPointId>,
    /// Clip for this burst (played only if `outputs.sound`).
    pub sound: Sound,
    /// What the burst produces.
    pub outputs: Outputs,
    /// Particles to create. Empty when smoke is off.
    pub plan: BurstPlan,
    /// When the guard must be released.
    pub release_at: Duration,
}

/// Result of one scheduler call.
#[derive(Clone, Debug)]
pub enum Emission {
    /// Burst accepted.
    Started(ScheduledBurst),
    /// Dropped: another burst holds the guard.
    Busy,
    /// No spawn points existed; this one was created instead.
    EmergencySpawn(SpawnPointId),
    /// Spawn points exist but none is active.
    NoActivePoints,
}

/// Guard, selection cursor and burst counter.
#[derive(Debug, Default)]
pub struct EmissionScheduler {
    guard: BurstGuard,
    selector: SpawnSelector,
    next_burst: u64,
}

impl EmissionScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a burst is in flight.
    #[must_use]
    pub const fn is_emitting(&self) -> bool {
        self.guard.is_held()
    }

    /// The re-entrancy guard.
    #[must_use]
    pub const fn guard(&self) -> &BurstGuard {
        &self.guard
    }

    /// Releases the guard held by `burst`.
    pub fn release(&mut self, burst: u64) -> bool {
        let released = self.guard.release(burst);
        if released {
            debug!(burst, "burst guard released");
        }
        released
    }

    /// Drops the guard and the sequential cursor.
    pub fn reset(&mut self) {
        self.guard.reset();
        self.selector = SpawnSelector::new();
    }

    /// Runs one scheduler call.
    ///
    /// # Errors
    ///
    /// Fails when the plan cannot be computed (out-of-range settings or a
    /// non-finite coordinate). The guard is released before returning.
    pub fn emit<R: Rng + ?Sized>(
        &mut self,
        input: &BurstInput<'_>,
        points: &mut SpawnPointSet,
        rng: &mut R,
    ) -> CoreResult<Emission> {
        let burst = self.next_burst + 1;
        if !self.guard.try_acquire(burst, input.now) {
            debug!(holder = ?self.guard.holder(), "burst dropped, guard held");
            return Ok(Emission::Busy);
        }
        self.next_burst = burst;

        if points.is_empty() {
            self.guard.release(burst);
            return match points.add(input.viewport.default_spawn(), input.colors.main_color.clone()) {
                Ok(id) => {
                    info!(id, "no spawn points, emergency point added");
                    Ok(Emission::EmergencySpawn(id))
                }
                Err(err) => {
                    warn!(%err, "emergency spawn point skipped");
                    Ok(Emission::NoActivePoints)
                }
            };
        }

        let active: Vec<_> = points.active().cloned().collect();
        if active.is_empty() {
            self.guard.release(burst);
            debug!("no active spawn points");
            return Ok(Emission::NoActivePoints);
        }

        let firing = self.selector.select(input.spawn_mode, &active, rng);
        let sound = input.library.pick(input.sound, input.sound_policy, rng);
        let repeats = sound.burst_count.max(1);

        let plan = if input.outputs.smoke {
            let request = BurstRequest {
                tap: input.at,
                settings: input.effect,
                colors: input.colors,
                points: &firing,
                repeats,
            };
            match plan_burst(&request, rng) {
                Ok(plan) => plan,
                Err(err) => {
                    self.guard.release(burst);
                    return Err(err);
                }
            }
        } else {
            BurstPlan::default()
        };

        let interval = Duration::from_millis(u64::from(input.effect.burst_interval_ms));
        let release_at = input.now + interval * (repeats - 1) + GUARD_RELEASE_DELAY;

        debug!(
            burst,
            pattern = input.effect.pattern.name(),
            points = firing.len(),
            particles = plan.len(),
            repeats,
            "burst planned"
        );

        Ok(Emission::Started(ScheduledBurst {
            id: burst,
            points: firing.iter().map(|p| p.id).collect(),
            sound,
            outputs: input.outputs,
            plan,
            release_at,
        }))
    }
}
