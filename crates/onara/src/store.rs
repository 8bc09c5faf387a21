//! # Particle Lifecycle Store
//!
//! The live particle set. Every insertion schedules the particle's removal
//! at `now + lifetime` in the same call, so the store drains by itself once
//! input stops.

use std::time::Duration;

use onara_core::{Particle, ParticleId, ParticleSpec};
use tracing::trace;

use crate::timer::TimerQueue;

/// A particle plus its lifecycle timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveParticle {
    /// The particle.
    pub particle: Particle,
    /// Session time of insertion.
    pub born: Duration,
    /// Session time of scheduled removal.
    pub expires: Duration,
}

impl LiveParticle {
    /// Time alive at `now`.
    #[must_use]
    pub fn age(&self, now: Duration) -> Duration {
        now.saturating_sub(self.born)
    }
}

/// Store counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Particles ever inserted.
    pub added: u64,
    /// Particles removed by expiry.
    pub expired: u64,
    /// Particles removed explicitly.
    pub removed: u64,
    /// Largest live count seen.
    pub peak: usize,
}

/// Append/remove list of live particles with expiry timers.
#[derive(Debug, Default)]
pub struct ParticleStore {
    live: Vec<LiveParticle>,
    expiries: TimerQueue<ParticleId>,
    next_id: u64,
    stats: StoreStats,
}

impl ParticleStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a particle at `now` and schedules its removal.
    pub fn add(&mut self, spec: ParticleSpec, now: Duration) -> ParticleId {
        self.next_id += 1;
        let id = ParticleId(self.next_id);
        let expires = now + spec.lifetime;
        self.expiries.schedule(expires, id);
        self.live.push(LiveParticle {
            particle: spec.into_particle(id),
            born: now,
            expires,
        });

        self.stats.added += 1;
        self.stats.peak = self.stats.peak.max(self.live.len());
        trace!(%id, ?expires, "particle added");
        id
    }

    /// Removes every particle whose expiry is due at `now`.
    ///
    /// Returns the ids removed, in expiry order.
    pub fn sweep(&mut self, now: Duration) -> Vec<ParticleId> {
        let mut removed = Vec::new();
        for (_, id) in self.expiries.pop_due(now) {
            // Explicitly removed particles leave a dangling timer
            if self.take(id).is_some() {
                self.stats.expired += 1;
                removed.push(id);
            }
        }
        removed
    }

    /// Removes a particle before its expiry.
    pub fn remove(&mut self, id: ParticleId) -> Option<LiveParticle> {
        let taken = self.take(id);
        if taken.is_some() {
            self.stats.removed += 1;
        }
        taken
    }

    fn take(&mut self, id: ParticleId) -> Option<LiveParticle> {
        let index = self.live.iter().position(|p| p.particle.id == id)?;
        Some(self.live.remove(index))
    }

    /// Looks up a live particle.
    #[must_use]
    pub fn get(&self, id: ParticleId) -> Option<&LiveParticle> {
        self.live.iter().find(|p| p.particle.id == id)
    }

    /// Live particles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LiveParticle> {
        self.live.iter()
    }

    /// Number of live particles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True if no particle is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Earliest pending expiry.
    #[must_use]
    pub fn next_expiry(&self) -> Option<Duration> {
        self.expiries.next_due()
    }

    /// Counters.
    #[must_use]
    pub const fn stats(&self) -> StoreStats {
        self.stats
    }

    /// Drops every particle and timer. Ids keep counting upward.
    pub fn clear(&mut self) {
        self.live.clear();
        self.expiries.clear();
    }
}
