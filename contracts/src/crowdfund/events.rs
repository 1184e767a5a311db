//! Notifications emitted by campaign transitions.
//!
//! Every successful state change emits exactly one primary event carrying
//! the acting identity and amount, so contribution history can be rebuilt
//! from the event stream alone.

use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::Slot;
use serde::{Deserialize, Serialize};

use super::campaign::CampaignId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CampaignEvent {
    Created {
        campaign: CampaignId,
        owner: AccountId,
        goal: u64,
        deadline: Slot,
    },
    Contributed {
        campaign: CampaignId,
        contributor: AccountId,
        amount: u64,
        total_raised: u64,
    },
    /// Informational only; success is always re-evaluated live.
    GoalReached {
        campaign: CampaignId,
        total_raised: u64,
    },
    Withdrawn {
        campaign: CampaignId,
        owner: AccountId,
        amount: u64,
    },
    Refunded {
        campaign: CampaignId,
        contributor: AccountId,
        amount: u64,
    },
    Finalized {
        campaign: CampaignId,
        total_raised: u64,
    },
}

impl CampaignEvent {
    pub fn campaign(&self) -> CampaignId {
        match self {
            Self::Created { campaign, .. }
            | Self::Contributed { campaign, .. }
            | Self::GoalReached { campaign, .. }
            | Self::Withdrawn { campaign, .. }
            | Self::Refunded { campaign, .. }
            | Self::Finalized { campaign, .. } => *campaign,
        }
    }

    /// Short event name, used as a metrics label and log field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Contributed { .. } => "contributed",
            Self::GoalReached { .. } => "goal_reached",
            Self::Withdrawn { .. } => "withdrawn",
            Self::Refunded { .. } => "refunded",
            Self::Finalized { .. } => "finalized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledge_protocol::crypto::Keypair;

    #[test]
    fn json_is_tagged() {
        let campaign = CampaignId::new();
        let event = CampaignEvent::Refunded {
            campaign,
            contributor: Keypair::generate().account_id(),
            amount: 30,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "refunded");
        assert_eq!(json["amount"], 30);
        assert_eq!(json["campaign"], campaign.to_string());
        assert_eq!(event.campaign(), campaign);
        assert_eq!(event.name(), "refunded");
    }
}
