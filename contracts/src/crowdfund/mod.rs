//! # Crowdfunding Ledger
//!
//! One [`Campaign`] per fundraiser. A campaign accepts pledges until its
//! deadline slot, then resolves into exactly one outcome:
//!
//! ```text
//!                 contribute
//!                  ┌──────┐
//!                  ▼      │
//!   create ──▶ [Active] ──┘
//!                  │ now >= deadline
//!                  ▼
//!             [Resolving] ── refund (goal missed, per contributor)
//!              │        │
//!   withdraw   │        │  finalize
//!  (goal met)  ▼        ▼  (goal missed)
//!     [ClosedSuccess]  [ClosedFailure] ── refund still allowed
//! ```
//!
//! Pledged value sits in a per-campaign custody account derived from the
//! campaign id; no private key exists for it, so only this ledger moves it.

mod campaign;
mod contributions;
mod error;
mod events;

pub use campaign::{Campaign, CampaignId, Phase};
pub use contributions::{ContributionEntry, ContributionTable};
pub use error::{CrowdfundError, ErrorKind};
pub use events::CampaignEvent;
