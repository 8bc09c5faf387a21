//! # Scene Event Bus
//!
//! The session publishes what happened; a renderer (or the demo report)
//! drains it.
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │   Session   │─────>│   Bounded   │─────>│  Renderer   │
//! │  (advance)  │      │   Channel   │      │   (drain)   │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Sending never blocks the session: when the channel is full the event is
//! dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use onara_core::{ParticleId, Point, SpawnPointId};
use tracing::trace;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Something the renderer may care about.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneEvent {
    // =========================================================================
    // Particles
    // =========================================================================
    /// A particle became visible.
    ParticleAdded {
        /// Particle id.
        id: ParticleId,
        /// Session time.
        at: Duration,
    },

    /// A particle expired or was removed.
    ParticleRemoved {
        /// Particle id.
        id: ParticleId,
    },

    /// A bubble popped into puffs.
    BubblePopped {
        /// The bubble.
        id: ParticleId,
        /// Where it popped.
        position: Point,
        /// Puffs released.
        puffs: usize,
    },

    // =========================================================================
    // Bursts
    // =========================================================================
    /// A burst was accepted and planned.
    BurstStarted {
        /// Burst sequence number.
        burst: u64,
        /// Spawn points firing.
        points: Vec<SpawnPointId>,
        /// Primary particles planned (all repeats).
        particles: usize,
    },

    /// The re-entrancy guard was released.
    GuardReleased {
        /// Burst that held it.
        burst: u64,
    },

    /// Burst generation failed; taps are rejected until reload.
    Faulted {
        /// Error text.
        message: String,
    },

    // =========================================================================
    // Effects
    // =========================================================================
    /// A clip started.
    SoundPlayed {
        /// Clip URL.
        url: String,
    },

    /// A vibration pattern started.
    Vibrated {
        /// On/off durations in ms.
        pattern: Vec<u32>,
    },

    /// A screen shake started.
    Shaken {
        /// Peak offset in pixels.
        intensity: f32,
        /// Animation length.
        duration: Duration,
    },

    // =========================================================================
    // Spawn points
    // =========================================================================
    /// A spawn point was created (by the user or as an emergency point).
    SpawnPointAdded {
        /// New id.
        id: SpawnPointId,
        /// Position.
        position: Point,
    },

    /// A spawn point was deleted.
    SpawnPointRemoved {
        /// Removed id.
        id: SpawnPointId,
    },
}

/// Owns both ends of a bounded scene channel.
pub struct EventBus {
    sender: Sender<SceneEvent>,
    receiver: Receiver<SceneEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a sender handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a paired sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Handle for publishing events.
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: Sender<SceneEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Publishes an event without blocking.
    ///
    /// Returns `false` if it was dropped (channel full or no receiver).
    #[inline]
    pub fn send(&self, event: SceneEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event) | TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                trace!(?event, "scene event dropped");
                false
            }
        }
    }

    /// Events dropped so far by any sender of this bus.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle for consuming events.
#[derive(Clone, Debug)]
pub struct EventReceiver {
    receiver: Receiver<SceneEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    #[inline]
    pub fn drain(&self) -> Vec<SceneEvent> {
        self.receiver.try_iter().collect()
    }

    /// Takes one pending event.
    #[inline]
    pub fn try_recv(&self) -> Option<SceneEvent> {
        self.receiver.try_recv().ok()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// True if anything is pending.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let (sender, receiver) = EventBus::create_pair(8);
        assert!(sender.send(SceneEvent::ParticleRemoved { id: ParticleId(3) }));
        assert!(receiver.has_events());

        match receiver.try_recv() {
            Some(SceneEvent::ParticleRemoved { id }) => assert_eq!(id, ParticleId(3)),
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let (sender, receiver) = EventBus::create_pair(2);
        for i in 0..5 {
            let _ = sender.send(SceneEvent::GuardReleased { burst: i });
        }
        assert_eq!(sender.dropped(), 3);
        assert_eq!(receiver.drain().len(), 2);
        assert!(!receiver.has_events());
    }
}
