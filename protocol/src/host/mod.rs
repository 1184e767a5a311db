//! # Host Environment
//!
//! The two things the crowdfunding ledger needs from the outside world and
//! must not own itself:
//!
//! - **clock**: a monotonically non-decreasing slot counter.
//! - **bank**: balances that value moves between, with atomic transfers.
//!
//! Both are exposed as traits ([`SlotClock`], [`ValueTransfer`]) so the
//! ledger can run against a real node or a test fixture unchanged.

pub mod bank;
pub mod clock;

pub use bank::{Account, Bank, BankCheckpoint, TransferError, ValueTransfer};
pub use clock::{ClockError, ManualClock, Slot, SlotClock};
