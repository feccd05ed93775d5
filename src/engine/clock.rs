use std::collections::BTreeSet;

/// Token identifying one requested frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CancelHandle(pub u64);

/// Display-refresh clock.
///
/// The scheduler requests at most one frame at a time while it has live work and cancels the
/// request once nothing is left. When a requested frame fires, the embedder calls
/// [`Scheduler::tick`](crate::Scheduler::tick).
pub trait FrameClock {
    /// Ask for the next display refresh.
    fn request_frame(&mut self) -> CancelHandle;

    /// Withdraw a request. Cancelling a fired or unknown handle is a no-op.
    fn cancel(&mut self, handle: CancelHandle);
}

/// Clock driven by hand, for tests and offline simulation.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    next: u64,
    pending: BTreeSet<u64>,
    requested: u64,
}

impl ManualClock {
    /// Create a clock with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding frame requests.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Total requests ever made.
    pub fn requested(&self) -> u64 {
        self.requested
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&mut self) -> CancelHandle {
        self.next += 1;
        self.requested += 1;
        self.pending.insert(self.next);
        CancelHandle(self.next)
    }

    fn cancel(&mut self, handle: CancelHandle) {
        self.pending.remove(&handle.0);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/clock.rs"]
mod tests;
