//! # Campaign Record and Transition Engine
//!
//! A [`Campaign`] holds its immutable parameters (owner, goal, deadline),
//! the aggregate state (total raised, total refunded, finalized) and its
//! own [`ContributionTable`]. All mutation goes through the four
//! transitions below; each one reads the slot from the [`Host`] exactly
//! once and either applies fully or leaves the campaign untouched.
//!
//! ## Ordering
//!
//! Every value-moving transition updates state **before** asking the host
//! to transfer, and restores the prior state if the transfer fails. A
//! reentrant call made from inside a transfer therefore always observes the
//! post-transition state.
//!
//! ## Finalize and refunds
//!
//! `finalize` closes the failure path for bookkeeping only. It does not
//! block refunds: contributors to a failed campaign can claim before or
//! after it is called. `refund` reports `AlreadyFinalized` only for a
//! campaign closed by a withdrawal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pledge_protocol::config::CUSTODY_DOMAIN;
use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::Slot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::contributions::{ContributionEntry, ContributionTable};
use super::error::CrowdfundError;
use super::events::CampaignEvent;
use crate::host::Host;

// ---------------------------------------------------------------------------
// CampaignId
// ---------------------------------------------------------------------------

/// Unique campaign identifier (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(Uuid);

#[allow(clippy::new_without_default)]
impl CampaignId {
    /// A fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Account holding the campaign's pledged value. Derived from the id
    /// alone, so it is known before the campaign is loaded.
    pub fn custody(&self) -> AccountId {
        AccountId::derive(CUSTODY_DOMAIN, self.as_bytes())
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for CampaignId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase, derived from the record and the current slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Before the deadline. Contributions accepted.
    Active,
    /// At or after the deadline, not yet finalized.
    Resolving,
    /// Finalized by the owner's withdrawal.
    ClosedSuccess,
    /// Finalized on the failure path. Refunds remain open.
    ClosedFailure,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Active => write!(f, "Active"),
            Phase::Resolving => write!(f, "Resolving"),
            Phase::ClosedSuccess => write!(f, "ClosedSuccess"),
            Phase::ClosedFailure => write!(f, "ClosedFailure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Campaign
// ---------------------------------------------------------------------------

/// One crowdfunding campaign.
///
/// Fields are private: the only way to change a campaign is through its
/// transitions, which keep `total_raised - total_refunded` equal to the sum
/// of outstanding contribution entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    id: CampaignId,
    owner: AccountId,
    goal: u64,
    deadline: Slot,
    total_raised: u64,
    total_refunded: u64,
    finalized: bool,
    created_slot: Slot,
    /// Wall-clock creation time. Never consulted for deadlines.
    created_at: DateTime<Utc>,
    contributions: ContributionTable,
}

impl Campaign {
    /// Open a campaign owned by `owner` that accepts pledges for `duration`
    /// slots from now.
    ///
    /// # Errors
    ///
    /// [`CrowdfundError::InvalidParameters`] if `goal` or `duration` is zero,
    /// or the deadline would overflow the slot counter.
    pub fn create<H: Host + ?Sized>(
        host: &mut H,
        owner: AccountId,
        goal: u64,
        duration: u64,
    ) -> Result<Self, CrowdfundError> {
        if goal == 0 {
            return Err(CrowdfundError::InvalidParameters {
                reason: "goal must be positive",
            });
        }
        if duration == 0 {
            return Err(CrowdfundError::InvalidParameters {
                reason: "duration must be positive",
            });
        }
        let now = host.current_slot();
        let deadline = now
            .checked_add(duration)
            .ok_or(CrowdfundError::InvalidParameters {
                reason: "deadline overflows the slot counter",
            })?;

        let campaign = Self {
            id: CampaignId::new(),
            owner,
            goal,
            deadline,
            total_raised: 0,
            total_refunded: 0,
            finalized: false,
            created_slot: now,
            created_at: Utc::now(),
            contributions: ContributionTable::default(),
        };

        host.emit(CampaignEvent::Created {
            campaign: campaign.id,
            owner,
            goal,
            deadline,
        });
        info!(campaign = %campaign.id, %owner, goal, deadline, slot = now, "campaign created");
        Ok(campaign)
    }

    // -- Reads --------------------------------------------------------------

    pub fn id(&self) -> CampaignId {
        self.id
    }

    pub fn owner(&self) -> &AccountId {
        &self.owner
    }

    pub fn goal(&self) -> u64 {
        self.goal
    }

    pub fn deadline(&self) -> Slot {
        self.deadline
    }

    pub fn total_raised(&self) -> u64 {
        self.total_raised
    }

    pub fn total_refunded(&self) -> u64 {
        self.total_refunded
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn created_slot(&self) -> Slot {
        self.created_slot
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Amount currently recorded for `contributor`.
    pub fn contribution_of(&self, contributor: &AccountId) -> u64 {
        self.contributions.amount_of(contributor)
    }

    pub fn contribution_entry(&self, contributor: &AccountId) -> Option<&ContributionEntry> {
        self.contributions.get(contributor)
    }

    pub fn contributors(&self) -> &ContributionTable {
        &self.contributions
    }

    /// Account holding this campaign's pledged value.
    pub fn custody(&self) -> AccountId {
        self.id.custody()
    }

    /// `total_raised >= goal`. Live, never cached.
    pub fn is_successful(&self) -> bool {
        self.total_raised >= self.goal
    }

    pub fn phase(&self, now: Slot) -> Phase {
        match (self.finalized, self.is_successful()) {
            (true, true) => Phase::ClosedSuccess,
            (true, false) => Phase::ClosedFailure,
            (false, _) if now < self.deadline => Phase::Active,
            (false, _) => Phase::Resolving,
        }
    }

    /// What the custody account should hold right now.
    pub fn expected_holdings(&self) -> u64 {
        if self.finalized && self.is_successful() {
            0
        } else {
            self.total_raised - self.total_refunded
        }
    }

    // -- Transitions --------------------------------------------------------

    /// Pledge `amount` from `caller` into custody.
    ///
    /// Emits `Contributed`, and `GoalReached` when this pledge carries
    /// `total_raised` from below the goal to at or above it.
    pub fn contribute<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        caller: &AccountId,
        amount: u64,
    ) -> Result<(), CrowdfundError> {
        let now = host.current_slot();
        if amount == 0 {
            return Err(self.reject("contribute", CrowdfundError::ZeroContribution));
        }
        if now >= self.deadline {
            return Err(self.reject(
                "contribute",
                CrowdfundError::CampaignEnded {
                    deadline: self.deadline,
                    now,
                },
            ));
        }
        if self.finalized {
            return Err(self.reject("contribute", CrowdfundError::CampaignFinalized));
        }

        let new_entry = self
            .contributions
            .amount_of(caller)
            .checked_add(amount)
            .ok_or(CrowdfundError::AmountOverflow);
        let new_total = self
            .total_raised
            .checked_add(amount)
            .ok_or(CrowdfundError::AmountOverflow);
        let (new_entry, new_total) = match (new_entry, new_total) {
            (Ok(entry), Ok(total)) => (entry, total),
            (Err(e), _) | (_, Err(e)) => return Err(self.reject("contribute", e)),
        };

        let prior_entry = self.contributions.get(caller).cloned();
        let prior_total = self.total_raised;
        let was_successful = self.is_successful();

        self.contributions.set_amount(caller, new_entry);
        self.total_raised = new_total;

        if let Err(e) = host.transfer(caller, &self.custody(), amount) {
            self.contributions.restore(caller, prior_entry);
            self.total_raised = prior_total;
            warn!(campaign = %self.id, %caller, amount, error = %e, "contribution transfer failed, rolled back");
            return Err(e.into());
        }

        host.emit(CampaignEvent::Contributed {
            campaign: self.id,
            contributor: *caller,
            amount,
            total_raised: self.total_raised,
        });
        info!(campaign = %self.id, %caller, amount, total_raised = self.total_raised, slot = now, "contribution accepted");

        if !was_successful && self.is_successful() {
            host.emit(CampaignEvent::GoalReached {
                campaign: self.id,
                total_raised: self.total_raised,
            });
            info!(campaign = %self.id, total_raised = self.total_raised, goal = self.goal, "goal reached");
        }
        Ok(())
    }

    /// Pay everything raised to the owner. Success path only.
    ///
    /// Returns the amount paid out.
    pub fn withdraw<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        caller: &AccountId,
    ) -> Result<u64, CrowdfundError> {
        let now = host.current_slot();
        if *caller != self.owner {
            return Err(self.reject("withdraw", CrowdfundError::NotOwner));
        }
        if now < self.deadline {
            return Err(self.reject(
                "withdraw",
                CrowdfundError::CampaignStillActive {
                    deadline: self.deadline,
                    now,
                },
            ));
        }
        if self.finalized {
            return Err(self.reject("withdraw", CrowdfundError::AlreadyFinalized));
        }
        if !self.is_successful() {
            return Err(self.reject(
                "withdraw",
                CrowdfundError::GoalNotReached {
                    raised: self.total_raised,
                    goal: self.goal,
                },
            ));
        }

        self.finalized = true;
        let amount = self.total_raised;

        if let Err(e) = host.transfer(&self.custody(), &self.owner, amount) {
            self.finalized = false;
            warn!(campaign = %self.id, amount, error = %e, "withdrawal transfer failed, rolled back");
            return Err(e.into());
        }

        host.emit(CampaignEvent::Withdrawn {
            campaign: self.id,
            owner: self.owner,
            amount,
        });
        info!(campaign = %self.id, owner = %self.owner, amount, slot = now, "funds withdrawn");
        Ok(amount)
    }

    /// Return `caller`'s pledge. Failure path only, once per entry.
    ///
    /// Returns the amount refunded.
    pub fn refund<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        caller: &AccountId,
    ) -> Result<u64, CrowdfundError> {
        let now = host.current_slot();
        if now < self.deadline {
            return Err(self.reject(
                "refund",
                CrowdfundError::CampaignStillActive {
                    deadline: self.deadline,
                    now,
                },
            ));
        }
        if self.is_successful() {
            return Err(self.reject("refund", CrowdfundError::GoalWasReached));
        }
        if self.phase(now) == Phase::ClosedSuccess {
            return Err(self.reject("refund", CrowdfundError::AlreadyFinalized));
        }
        let amount = self.contributions.amount_of(caller);
        if amount == 0 {
            return Err(self.reject("refund", CrowdfundError::NoContribution));
        }
        let new_refunded = match self.total_refunded.checked_add(amount) {
            Some(total) => total,
            None => return Err(self.reject("refund", CrowdfundError::AmountOverflow)),
        };

        let prior_entry = self.contributions.get(caller).cloned();
        let prior_refunded = self.total_refunded;

        self.contributions.claim(caller);
        self.total_refunded = new_refunded;

        if let Err(e) = host.transfer(&self.custody(), caller, amount) {
            self.contributions.restore(caller, prior_entry);
            self.total_refunded = prior_refunded;
            warn!(campaign = %self.id, %caller, amount, error = %e, "refund transfer failed, rolled back");
            return Err(e.into());
        }

        host.emit(CampaignEvent::Refunded {
            campaign: self.id,
            contributor: *caller,
            amount,
        });
        info!(campaign = %self.id, %caller, amount, slot = now, "contribution refunded");
        Ok(amount)
    }

    /// Close a failed campaign. Moves no funds and leaves refunds open.
    pub fn finalize<H: Host + ?Sized>(&mut self, host: &mut H) -> Result<(), CrowdfundError> {
        let now = host.current_slot();
        if now < self.deadline {
            return Err(self.reject(
                "finalize",
                CrowdfundError::CampaignStillActive {
                    deadline: self.deadline,
                    now,
                },
            ));
        }
        if self.finalized {
            return Err(self.reject("finalize", CrowdfundError::AlreadyFinalized));
        }
        if self.is_successful() {
            return Err(self.reject("finalize", CrowdfundError::GoalWasReached));
        }

        self.finalized = true;
        host.emit(CampaignEvent::Finalized {
            campaign: self.id,
            total_raised: self.total_raised,
        });
        info!(campaign = %self.id, total_raised = self.total_raised, slot = now, "campaign finalized");
        Ok(())
    }

    fn reject(&self, op: &'static str, err: CrowdfundError) -> CrowdfundError {
        debug!(campaign = %self.id, op, error = %err, "operation rejected");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Runtime;
    use pledge_protocol::crypto::Keypair;
    use pledge_protocol::host::Bank;

    fn account() -> AccountId {
        Keypair::generate().account_id()
    }

    fn open(bank: &mut Bank, owner: AccountId, goal: u64, duration: u64) -> Campaign {
        Campaign::create(&mut Runtime::at_slot(0, bank), owner, goal, duration).unwrap()
    }

    #[test]
    fn create_sets_parameters() {
        let mut bank = Bank::new();
        let owner = account();
        let mut rt = Runtime::at_slot(5, &mut bank);
        let c = Campaign::create(&mut rt, owner, 100, 10).unwrap();
        assert_eq!(c.owner(), &owner);
        assert_eq!(c.goal(), 100);
        assert_eq!(c.deadline(), 15);
        assert_eq!(c.created_slot(), 5);
        assert_eq!(c.total_raised(), 0);
        assert!(!c.finalized());
        assert_eq!(c.phase(5), Phase::Active);
        assert!(matches!(rt.events(), [CampaignEvent::Created { goal: 100, deadline: 15, .. }]));
    }

    #[test]
    fn create_rejects_bad_parameters() {
        let mut bank = Bank::new();
        let mut rt = Runtime::at_slot(u64::MAX - 1, &mut bank);
        for (goal, duration) in [(0, 10), (100, 0), (100, 2)] {
            let err = Campaign::create(&mut rt, account(), goal, duration).unwrap_err();
            assert!(matches!(err, CrowdfundError::InvalidParameters { .. }));
        }
        assert!(rt.events().is_empty());
    }

    #[test]
    fn custody_is_stable_and_unique() {
        let mut bank = Bank::new();
        let owner = account();
        let a = open(&mut bank, owner, 1, 1);
        let b = open(&mut bank, owner, 1, 1);
        assert_eq!(a.custody(), a.custody());
        assert_ne!(a.custody(), b.custody());
        assert_ne!(a.custody(), owner);
    }

    #[test]
    fn contribute_accumulates_and_moves_value() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, account(), 50, 10);

        let mut rt = Runtime::at_slot(1, &mut bank);
        c.contribute(&mut rt, &x, 20).unwrap();
        c.contribute(&mut rt, &x, 15).unwrap();
        assert_eq!(rt.events().len(), 2);
        drop(rt);

        assert_eq!(c.contribution_of(&x), 35);
        assert_eq!(c.total_raised(), 35);
        assert_eq!(bank.balance(&x), 65);
        assert_eq!(bank.balance(&c.custody()), 35);
    }

    #[test]
    fn goal_reached_emitted_once_on_crossing() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 1_000).unwrap();
        let mut c = open(&mut bank, account(), 100, 10);

        let mut rt = Runtime::at_slot(1, &mut bank);
        c.contribute(&mut rt, &x, 99).unwrap();
        c.contribute(&mut rt, &x, 1).unwrap();
        c.contribute(&mut rt, &x, 50).unwrap();
        let reached = rt
            .events()
            .iter()
            .filter(|e| matches!(e, CampaignEvent::GoalReached { .. }))
            .count();
        assert_eq!(reached, 1);
        assert!(matches!(
            rt.events()[2],
            CampaignEvent::GoalReached {
                total_raised: 100,
                ..
            }
        ));
    }

    #[test]
    fn contribute_guard_order() {
        let mut bank = Bank::new();
        let x = account();
        let mut c = open(&mut bank, account(), 100, 10);

        // Zero amount is reported even after the deadline.
        let mut rt = Runtime::at_slot(10, &mut bank);
        assert_eq!(
            c.contribute(&mut rt, &x, 0),
            Err(CrowdfundError::ZeroContribution)
        );
        assert_eq!(
            c.contribute(&mut rt, &x, 1),
            Err(CrowdfundError::CampaignEnded {
                deadline: 10,
                now: 10
            })
        );
    }

    #[test]
    fn contribute_overflow_fails_closed() {
        let mut bank = Bank::new();
        let (x, y) = (account(), account());
        bank.deposit(&x, u64::MAX).unwrap();
        let mut c = open(&mut bank, account(), 10, 10);
        let mut rt = Runtime::at_slot(1, &mut bank);
        c.contribute(&mut rt, &x, u64::MAX).unwrap();
        let before = c.clone();
        assert_eq!(
            c.contribute(&mut rt, &y, 1),
            Err(CrowdfundError::AmountOverflow)
        );
        assert_eq!(c, before);
    }

    #[test]
    fn contribute_rolls_back_on_transfer_failure() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 5).unwrap();
        let mut c = open(&mut bank, account(), 10, 10);
        let before = c.clone();

        let mut rt = Runtime::at_slot(1, &mut bank);
        let err = c.contribute(&mut rt, &x, 6).unwrap_err();
        assert!(matches!(err, CrowdfundError::TransferFailed(_)));
        assert!(rt.events().is_empty());
        assert_eq!(c, before);
        assert!(c.contribution_entry(&x).is_none());
    }

    #[test]
    fn withdraw_guards() {
        let mut bank = Bank::new();
        let (owner, x) = (account(), account());
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, owner, 50, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 20)
            .unwrap();

        let mut early = Runtime::at_slot(9, &mut bank);
        assert_eq!(
            c.withdraw(&mut early, &x),
            Err(CrowdfundError::NotOwner)
        );
        assert_eq!(
            c.withdraw(&mut early, &owner),
            Err(CrowdfundError::CampaignStillActive {
                deadline: 10,
                now: 9
            })
        );
        let mut late = Runtime::at_slot(10, &mut bank);
        assert_eq!(
            c.withdraw(&mut late, &owner),
            Err(CrowdfundError::GoalNotReached {
                raised: 20,
                goal: 50
            })
        );
        assert!(!c.finalized());
    }

    #[test]
    fn withdraw_rolls_back_when_owner_frozen() {
        let mut bank = Bank::new();
        let (owner, x) = (account(), account());
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, owner, 50, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 60)
            .unwrap();
        bank.set_frozen(&owner, true);
        let before = c.clone();

        let err = c
            .withdraw(&mut Runtime::at_slot(10, &mut bank), &owner)
            .unwrap_err();
        assert!(matches!(err, CrowdfundError::TransferFailed(_)));
        assert_eq!(c, before);
        assert_eq!(bank.balance(&c.custody()), 60);

        bank.set_frozen(&owner, false);
        assert_eq!(
            c.withdraw(&mut Runtime::at_slot(11, &mut bank), &owner),
            Ok(60)
        );
        assert_eq!(c.phase(11), Phase::ClosedSuccess);
        assert_eq!(c.expected_holdings(), 0);
    }

    #[test]
    fn refund_rolls_back_when_contributor_frozen() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, account(), 500, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 40)
            .unwrap();
        bank.set_frozen(&x, true);
        let before = c.clone();

        let err = c
            .refund(&mut Runtime::at_slot(10, &mut bank), &x)
            .unwrap_err();
        assert!(matches!(err, CrowdfundError::TransferFailed(_)));
        assert_eq!(c, before);

        bank.set_frozen(&x, false);
        assert_eq!(c.refund(&mut Runtime::at_slot(10, &mut bank), &x), Ok(40));
        assert_eq!(
            c.contribution_entry(&x),
            Some(&ContributionEntry {
                amount: 0,
                claimed: true
            })
        );
        assert_eq!(c.total_refunded(), 40);
        assert_eq!(c.total_raised(), 40);
        assert_eq!(bank.balance(&x), 100);
    }

    #[test]
    fn refund_guards() {
        let mut bank = Bank::new();
        let (x, stranger) = (account(), account());
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, account(), 500, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 40)
            .unwrap();

        assert!(matches!(
            c.refund(&mut Runtime::at_slot(9, &mut bank), &x),
            Err(CrowdfundError::CampaignStillActive { .. })
        ));
        assert_eq!(
            c.refund(&mut Runtime::at_slot(10, &mut bank), &stranger),
            Err(CrowdfundError::NoContribution)
        );
    }

    #[test]
    fn finalize_guards_and_keeps_refunds_open() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, account(), 500, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 40)
            .unwrap();

        assert!(matches!(
            c.finalize(&mut Runtime::at_slot(3, &mut bank)),
            Err(CrowdfundError::CampaignStillActive { .. })
        ));
        let mut rt = Runtime::at_slot(10, &mut bank);
        c.finalize(&mut rt).unwrap();
        assert_eq!(c.finalize(&mut rt), Err(CrowdfundError::AlreadyFinalized));
        assert_eq!(c.phase(10), Phase::ClosedFailure);

        assert_eq!(c.refund(&mut rt, &x), Ok(40));
        assert_eq!(c.refund(&mut rt, &x), Err(CrowdfundError::NoContribution));
        assert_eq!(c.expected_holdings(), 0);
    }

    #[test]
    fn finalize_rejected_on_success() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 100).unwrap();
        let mut c = open(&mut bank, account(), 10, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 10)
            .unwrap();
        assert_eq!(
            c.finalize(&mut Runtime::at_slot(10, &mut bank)),
            Err(CrowdfundError::GoalWasReached)
        );
    }

    #[test]
    fn campaign_id_parses_its_display() {
        let id = CampaignId::new();
        assert_eq!(id.to_string().parse::<CampaignId>().unwrap(), id);
        assert_eq!(CampaignId::from_bytes(*id.as_bytes()), id);
        assert!("not-a-uuid".parse::<CampaignId>().is_err());
    }

    #[test]
    fn bincode_roundtrip_preserves_table() {
        let mut bank = Bank::new();
        let x = account();
        bank.deposit(&x, 10).unwrap();
        let mut c = open(&mut bank, account(), 10, 10);
        c.contribute(&mut Runtime::at_slot(1, &mut bank), &x, 7)
            .unwrap();
        let bytes = bincode::serialize(&c).unwrap();
        let back: Campaign = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.contribution_of(&x), 7);
    }
}
