//! Single-slot phase timer for Cardczar room actors.
//!
//! A room has at most one pending deadline at a time: the automatic
//! transition out of its current phase. Arming a new deadline supersedes
//! the old one, and every deadline carries the generation number the room
//! stored alongside it, so a firing that raced with a newer arm can be told
//! apart by the receiver.
//!
//! # Idle mode
//!
//! With nothing armed, [`PhaseTimer::wait`] pends forever. Rooms sitting
//! in the lobby or with timers switched off simply never wake up from it.
//!
//! # Integration
//!
//! The timer sits inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands, re-arm */ }
//!         fired = timer.wait() => {
//!             /* apply fired.key if fired.generation is still current */
//!         }
//!     }
//! }
//! ```
//!
//! `wait` is cancel-safe: dropping the future before it resolves leaves
//! the pending deadline in place.

use std::fmt;
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Fired deadline
// ---------------------------------------------------------------------------

/// A deadline that came due, returned by [`PhaseTimer::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired<K> {
    /// What the deadline was armed for.
    pub key: K,
    /// The generation it was armed with.
    pub generation: u64,
    /// How far past the deadline the timer actually woke.
    pub late_by: Duration,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerMetrics {
    pub total_armed: u64,
    pub total_fired: u64,
    /// Deadlines replaced by a newer `arm` before they fired.
    pub total_superseded: u64,
    pub total_cancelled: u64,
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Pending<K> {
    key: K,
    generation: u64,
    deadline: Instant,
}

/// One pending deadline per room. One `PhaseTimer` per room actor.
pub struct PhaseTimer<K> {
    pending: Option<Pending<K>>,
    metrics: TimerMetrics,
}

impl<K: Clone + fmt::Debug> PhaseTimer<K> {
    pub fn new() -> Self {
        Self {
            pending: None,
            metrics: TimerMetrics::default(),
        }
    }

    /// Arms an absolute deadline, replacing whatever was pending. Any
    /// grace period is the caller's to add.
    pub fn arm_at(&mut self, key: K, generation: u64, deadline: Instant) -> Instant {
        if let Some(old) = self.pending.take() {
            self.metrics.total_superseded += 1;
            trace!(key = ?old.key, generation = old.generation, "deadline superseded");
        }
        debug!(
            ?key,
            generation,
            in_ms = deadline.saturating_duration_since(Instant::now()).as_millis() as u64,
            "deadline armed"
        );
        self.pending = Some(Pending {
            key,
            generation,
            deadline,
        });
        self.metrics.total_armed += 1;
        deadline
    }

    /// Drops the pending deadline. Returns whether there was one.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(old) => {
                self.metrics.total_cancelled += 1;
                trace!(key = ?old.key, generation = old.generation, "deadline cancelled");
                true
            }
            None => false,
        }
    }

    /// Waits for the pending deadline and disarms the timer. Pends forever
    /// when nothing is armed.
    pub async fn wait(&mut self) -> Fired<K> {
        let Some(deadline) = self.pending.as_ref().map(|p| p.deadline) else {
            return std::future::pending().await;
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let Some(pending) = self.pending.take() else {
            return std::future::pending().await;
        };
        self.metrics.total_fired += 1;
        trace!(key = ?pending.key, generation = pending.generation, "deadline fired");

        Fired {
            key: pending.key,
            generation: pending.generation,
            late_by: now.saturating_duration_since(deadline),
        }
    }

    /// Generation of the pending deadline, if any.
    pub fn generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.generation)
    }

    pub fn metrics(&self) -> &TimerMetrics {
        &self.metrics
    }
}

impl<K: Clone + fmt::Debug> Default for PhaseTimer<K> {
    fn default() -> Self {
        Self::new()
    }
}
