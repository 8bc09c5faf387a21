//! # Real-Time Driver
//!
//! Drives a [`SharedSession`] from tokio timers. The loop sleeps until the
//! earlier of the next session deadline and the next input message, then
//! advances the session to the current time.
//!
//! ```text
//!   RuntimeHandle ──(mpsc)──> Runtime::run ──advance(now)──> Session
//!                                  │
//!                                  └── sleep_until(next_deadline)
//! ```
//!
//! When every handle is dropped the driver switches the auto emitter off,
//! lets the remaining timers fire and returns once the session is idle.

use std::future::pending;
use std::time::Duration;

use onara_core::Point;
use onara_effects::SoundPolicy;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::auto::AutoSettings;
use crate::error::{SessionError, SessionResult};
use crate::session::{BurstOutcome, Session, SharedSession};

/// Input queue depth.
pub const INPUT_CAPACITY: usize = 64;

type Reply = oneshot::Sender<SessionResult<BurstOutcome>>;

enum Input {
    Tap { x: f32, y: f32, reply: Reply },
    Burst { at: Point, policy: SoundPolicy, reply: Reply },
    Reload,
    Shutdown,
}

/// Summary returned when the driver stops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Times the loop woke up.
    pub wakeups: u64,
    /// Input messages handled.
    pub inputs: u64,
    /// Session time at exit.
    pub elapsed: Duration,
    /// Particles still live at exit (0 unless shut down early).
    pub live_particles: usize,
}

/// Sends input to a running [`Runtime`].
#[derive(Clone, Debug)]
pub struct RuntimeHandle {
    tx: mpsc::Sender<Input>,
}

impl RuntimeHandle {
    /// Taps at `(x, y)` at the driver's current time.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] if the driver stopped, or
    /// whatever [`crate::Session::tap`] returned.
    pub async fn tap(&self, x: f32, y: f32) -> SessionResult<BurstOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Tap { x, y, reply }).await?;
        rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Fires a burst at `at`, bypassing tap filtering.
    ///
    /// # Errors
    ///
    /// As [`RuntimeHandle::tap`].
    pub async fn burst(&self, at: Point, policy: SoundPolicy) -> SessionResult<BurstOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Input::Burst { at, policy, reply }).await?;
        rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Clears a faulted session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] if the driver stopped.
    pub async fn reload(&self) -> SessionResult<()> {
        self.send(Input::Reload).await
    }

    /// Stops the driver without draining.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ChannelClosed`] if the driver already stopped.
    pub async fn shutdown(&self) -> SessionResult<()> {
        self.send(Input::Shutdown).await
    }

    async fn send(&self, input: Input) -> SessionResult<()> {
        self.tx.send(input).await.map_err(|_| SessionError::ChannelClosed)
    }
}

/// The driver loop.
pub struct Runtime {
    session: SharedSession,
    rx: mpsc::Receiver<Input>,
    epoch: Instant,
}

impl Runtime {
    /// Creates a driver whose epoch is "now"; session time 0 maps to it.
    #[must_use]
    pub fn new(session: SharedSession) -> (Self, RuntimeHandle) {
        let (tx, rx) = mpsc::channel(INPUT_CAPACITY);
        let runtime = Self {
            session,
            rx,
            epoch: Instant::now(),
        };
        (runtime, RuntimeHandle { tx })
    }

    /// Session time of the driver.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    /// Runs until shut down, or until every handle is dropped and the
    /// session has no pending deadline.
    pub async fn run(mut self) -> RunReport {
        let mut report = RunReport::default();
        let mut open = true;
        info!("runtime started");

        loop {
            self.session.advance(self.elapsed());
            let deadline = self.session.next_deadline();
            if !open && deadline.is_none() {
                break;
            }

            let epoch = self.epoch;
            let wake = async move {
                match deadline {
                    Some(at) => sleep_until(epoch + at).await,
                    None => pending::<()>().await,
                }
            };

            tokio::select! {
                input = self.rx.recv(), if open => match input {
                    Some(Input::Shutdown) => {
                        debug!("runtime shutdown requested");
                        break;
                    }
                    Some(input) => {
                        report.inputs += 1;
                        self.handle(input);
                    }
                    None => {
                        debug!("all handles dropped, draining");
                        open = false;
                        self.session.with(|s| {
                            let auto = AutoSettings {
                                enabled: false,
                                ..s.config().auto
                            };
                            s.set_auto(auto);
                        });
                    }
                },
                () = wake => {
                    report.wakeups += 1;
                }
            }
        }

        report.elapsed = self.elapsed();
        self.session.advance(report.elapsed);
        report.live_particles = self.session.particle_count();
        info!(?report, "runtime stopped");
        report
    }

    fn handle(&self, input: Input) {
        let now = self.elapsed();
        match input {
            Input::Tap { x, y, reply } => {
                let _ = reply.send(self.session.tap(x, y, now));
            }
            Input::Burst { at, policy, reply } => {
                let _ = reply.send(self.session.with(|s| s.burst_at(at, now, policy)));
            }
            Input::Reload => self.session.with(Session::reload),
            Input::Shutdown => {}
        }
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("elapsed", &self.elapsed())
            .finish_non_exhaustive()
    }
}
