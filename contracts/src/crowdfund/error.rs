//! Ledger errors.

use std::fmt;

use pledge_protocol::host::{Slot, TransferError};
use serde::Serialize;
use thiserror::Error;

/// Every way a campaign operation can be refused.
///
/// A refused operation leaves the campaign exactly as it was.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrowdfundError {
    /// Construction-time misconfiguration.
    #[error("invalid campaign parameters: {reason}")]
    InvalidParameters { reason: &'static str },

    #[error("caller is not the campaign owner")]
    NotOwner,

    /// The operation needs the deadline to have passed.
    #[error("campaign is still active: deadline slot {deadline}, current slot {now}")]
    CampaignStillActive { deadline: Slot, now: Slot },

    /// The operation needs the deadline not to have passed.
    #[error("campaign ended at slot {deadline}, current slot {now}")]
    CampaignEnded { deadline: Slot, now: Slot },

    #[error("campaign is finalized and no longer accepts contributions")]
    CampaignFinalized,

    #[error("campaign is already finalized")]
    AlreadyFinalized,

    #[error("goal not reached: raised {raised} of {goal}")]
    GoalNotReached { raised: u64, goal: u64 },

    #[error("goal was reached; refunds are not available")]
    GoalWasReached,

    #[error("contribution amount must be positive")]
    ZeroContribution,

    #[error("caller has no contribution to refund")]
    NoContribution,

    /// Accumulating the amount would overflow `u64`.
    #[error("amount overflow")]
    AmountOverflow,

    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),
}

/// Coarse classification of [`CrowdfundError`], stable across wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameters,
    AccessDenied,
    TimingViolation,
    StateViolation,
    AmountViolation,
    TransferFailure,
}

impl CrowdfundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameters { .. } => ErrorKind::InvalidParameters,
            Self::NotOwner => ErrorKind::AccessDenied,
            Self::CampaignStillActive { .. } | Self::CampaignEnded { .. } => {
                ErrorKind::TimingViolation
            }
            Self::CampaignFinalized
            | Self::AlreadyFinalized
            | Self::GoalNotReached { .. }
            | Self::GoalWasReached => ErrorKind::StateViolation,
            Self::ZeroContribution | Self::NoContribution | Self::AmountOverflow => {
                ErrorKind::AmountViolation
            }
            Self::TransferFailed(_) => ErrorKind::TransferFailure,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidParameters => "invalid_parameters",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::TimingViolation => "timing_violation",
            ErrorKind::StateViolation => "state_violation",
            ErrorKind::AmountViolation => "amount_violation",
            ErrorKind::TransferFailure => "transfer_failure",
        };
        f.write_str(s)
    }
}
