//! # Pledge Contracts
//!
//! The time-bounded, all-or-nothing crowdfunding ledger and the machinery
//! that drives it from signed calls:
//!
//! - **crowdfund**: the campaign record, contribution table and the four
//!   transitions (`contribute`, `withdraw`, `refund`, `finalize`).
//! - **host**: the [`Host`] contract a campaign runs against, and the
//!   [`Runtime`] that implements it over a slot clock and a bank.
//! - **instruction**: the wire instruction set carried inside a signed call.
//! - **processor**: authenticates, dispatches and persists.
//! - **store**: campaign persistence, in memory or on sled.
//!
//! ## Design Principles
//!
//! 1. All monetary operations use checked arithmetic. Overflow fails the
//!    call; it never wraps.
//! 2. State changes strictly precede outbound transfers, and a failed
//!    transfer restores the prior state.
//! 3. Deadlines are slots, read once per call from the host. Wall-clock time
//!    is informational only.
//! 4. Every public type is serializable (serde) for wire transport and
//!    persistent storage.

pub mod crowdfund;
pub mod host;
pub mod instruction;
pub mod processor;
pub mod store;

pub use crowdfund::{
    Campaign, CampaignEvent, CampaignId, ContributionEntry, CrowdfundError, ErrorKind, Phase,
};
pub use host::{Host, Runtime};
pub use instruction::{Instruction, InstructionError};
pub use processor::{ProcessError, Processor, Receipt};
pub use store::{CampaignStore, MemoryStore, SledStore, StoreError};
