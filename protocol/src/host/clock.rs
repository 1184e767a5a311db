//! Slot clock.
//!
//! Time on a Pledge ledger is a `u64` slot counter. Deadlines are slot
//! numbers, not wall-clock timestamps, so two nodes replaying the same
//! calls at the same slots always agree.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// A slot number.
pub type Slot = u64;

/// Errors from moving a clock.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClockError {
    #[error("clock cannot move backwards: current slot {current}, requested {requested}")]
    Regression { current: Slot, requested: Slot },
}

/// Source of the current slot.
///
/// Implementations must never return a smaller slot than a previous call.
pub trait SlotClock {
    fn current_slot(&self) -> Slot;
}

impl<C: SlotClock + ?Sized> SlotClock for &C {
    fn current_slot(&self) -> Slot {
        (**self).current_slot()
    }
}

impl<C: SlotClock + ?Sized> SlotClock for Arc<C> {
    fn current_slot(&self) -> Slot {
        (**self).current_slot()
    }
}

/// A clock that only moves when told to.
///
/// Nodes drive it from their slot ticker; tests drive it by hand. Interior
/// mutability lets one `Arc<ManualClock>` be shared between the ticker
/// task and request handlers.
#[derive(Debug, Default)]
pub struct ManualClock {
    slot: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Slot) -> Self {
        Self {
            slot: AtomicU64::new(start),
        }
    }

    /// Advance by `slots`, saturating at `u64::MAX`. Returns the new slot.
    pub fn advance(&self, slots: u64) -> Slot {
        let previous = self
            .slot
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |s| {
                Some(s.saturating_add(slots))
            })
            .unwrap_or_else(|s| s);
        previous.saturating_add(slots)
    }

    /// Jump to an absolute slot.
    ///
    /// # Errors
    ///
    /// [`ClockError::Regression`] if `slot` is behind the current slot.
    pub fn advance_to(&self, slot: Slot) -> Result<Slot, ClockError> {
        self.slot
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (slot >= current).then_some(slot)
            })
            .map(|_| slot)
            .map_err(|current| ClockError::Regression {
                current,
                requested: slot,
            })
    }
}

impl SlotClock for ManualClock {
    fn current_slot(&self) -> Slot {
        self.slot.load(Ordering::SeqCst)
    }
}
