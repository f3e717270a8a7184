//! One-shot deadline timer for cinerate room actors.
//!
//! A room arms the timer when it hands the deal to a new dealer; if the
//! dealer acts before the deadline, the room disarms it. Each arm returns
//! a generation number, and [`RoundTimer::fired`] reports the generation
//! that expired, so a deadline superseded by a later `arm` or a `disarm`
//! can never be mistaken for a live one.
//!
//! # Integration
//!
//! Designed to sit inside a room actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         generation = timer.fired() => {
//!             /* deadline elapsed, dealer forfeits */
//!         }
//!     }
//! }
//! ```
//!
//! When unarmed, `fired` pends forever — `select!` simply never takes
//! that branch, and the actor stays purely event-driven.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::debug;

/// A re-armable one-shot timer with generation tracking.
#[derive(Debug, Default)]
pub struct RoundTimer {
    deadline: Option<Instant>,
    generation: u64,
}

impl RoundTimer {
    /// Creates a new, unarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timer to fire after `delay`, superseding any pending
    /// deadline. Returns the generation of this arming.
    pub fn arm(&mut self, delay: Duration) -> u64 {
        self.generation += 1;
        self.deadline = Some(Instant::now() + delay);
        debug!(generation = self.generation, ?delay, "timer armed");
        self.generation
    }

    /// Cancels any pending deadline.
    ///
    /// Idempotent. The generation still advances, so a `fired` result
    /// raced against this call identifies itself as stale.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            self.generation += 1;
            debug!(generation = self.generation, "timer disarmed");
        }
    }

    /// Whether a deadline is currently pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The generation of the most recent arm or disarm.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for the pending deadline and returns its generation.
    ///
    /// Pends forever while unarmed. Firing disarms the timer, so a
    /// deadline is delivered at most once.
    pub async fn fired(&mut self) -> u64 {
        let Some(deadline) = self.deadline else {
            // Never completes; select! handles other branches.
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;
        self.deadline = None;
        debug!(generation = self.generation, "timer fired");
        self.generation
    }
}
