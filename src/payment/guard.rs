use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::CheckoutError;

/// Re-entrant submission lock for order placement. A compare-and-set flag,
/// `Arc`-shared so its storage outlives whatever transient state drives the
/// widget: a callback arriving after the caller is gone still sees it.
#[derive(Debug, Default)]
pub struct PlacementGuard {
    in_flight: AtomicBool,
}

impl PlacementGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Arms the guard. Must be called before yielding to any asynchronous
    /// work. Fails when an attempt is already in flight.
    pub fn try_begin(self: &Arc<Self>) -> Result<PlacementPermit, CheckoutError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(PlacementPermit {
                guard: Arc::clone(self),
            })
        } else {
            Err(CheckoutError::AlreadyInFlight)
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }
}

/// Proof that this caller holds the placement lock. Consumed exactly once:
/// `release` on every failed terminal outcome, `complete` when the flow ends
/// successfully (the flag intentionally stays set; the session is over).
#[must_use]
#[derive(Debug)]
pub struct PlacementPermit {
    guard: Arc<PlacementGuard>,
}

impl PlacementPermit {
    pub fn release(self) {
        self.guard.in_flight.store(false, Ordering::Release);
    }

    pub fn complete(self) {}
}
