//! # Instruction Set
//!
//! The operations a signed call can carry, encoded with bincode into the
//! call's payload. Fixed-width integers, trailing bytes rejected, and a hard
//! size limit, so a payload decodes to exactly one instruction or fails.

use bincode::Options;
use pledge_protocol::config::MAX_CALL_PAYLOAD_BYTES;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crowdfund::CampaignId;

#[derive(Debug, Error)]
pub enum InstructionError {
    #[error("malformed instruction: {0}")]
    Malformed(#[from] bincode::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Open a campaign owned by the caller.
    Create { goal: u64, duration: u64 },
    Contribute { campaign: CampaignId, amount: u64 },
    /// Owner only, after the deadline, goal met.
    Withdraw { campaign: CampaignId },
    /// After the deadline, goal missed.
    Refund { campaign: CampaignId },
    /// Close a failed campaign. Anyone may call it.
    Finalize { campaign: CampaignId },
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_CALL_PAYLOAD_BYTES as u64)
        .reject_trailing_bytes()
}

impl Instruction {
    pub fn encode(&self) -> Result<Vec<u8>, InstructionError> {
        Ok(codec().serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, InstructionError> {
        Ok(codec().deserialize(bytes)?)
    }

    /// The campaign this instruction targets; `None` for `Create`.
    pub fn campaign(&self) -> Option<CampaignId> {
        match self {
            Self::Create { .. } => None,
            Self::Contribute { campaign, .. }
            | Self::Withdraw { campaign }
            | Self::Refund { campaign }
            | Self::Finalize { campaign } => Some(*campaign),
        }
    }

    /// Short name, used as a metrics label and log field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Contribute { .. } => "contribute",
            Self::Withdraw { .. } => "withdraw",
            Self::Refund { .. } => "refund",
            Self::Finalize { .. } => "finalize",
        }
    }
}
