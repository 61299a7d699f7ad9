use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::time::{Instant, sleep_until};

/// How a cancellable animation step ended. Cancellation is ordinary control
/// flow for a superseded update generation, not a failure, so it is a value
/// callers check rather than an error they catch.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

impl Outcome {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

/// Token for one update generation's lifetime.
///
/// Every task started for a generation holds a clone and checks it at each
/// suspension point; once the next accepted snapshot cancels the scope the
/// task simply stops advancing. The flag only ever goes from active to
/// inactive.
#[derive(Debug, Clone)]
pub struct UpdateScope {
    generation: u64,
    active: Arc<AtomicBool>,
}

impl UpdateScope {
    pub fn new(generation: u64) -> Self {
        Self {
            generation,
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Sleeps until `deadline`, then reports whether the scope survived the
    /// hold. The sleep itself is never interrupted; cancellation is observed
    /// at resumption.
    pub async fn hold_until(&self, deadline: Instant) -> Outcome {
        sleep_until(deadline).await;
        if self.is_active() {
            Outcome::Completed
        } else {
            Outcome::Cancelled
        }
    }
}
