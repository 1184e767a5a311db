//! Per-contributor pledge records.

use std::collections::BTreeMap;

use pledge_protocol::crypto::AccountId;
use serde::{Deserialize, Serialize};

/// One contributor's cumulative pledge.
///
/// Created on first contribution and never removed. A refund zeroes
/// `amount` and sets `claimed`, so a paid-out entry stays distinguishable
/// from one that never existed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionEntry {
    pub amount: u64,
    pub claimed: bool,
}

/// Contributor identity → [`ContributionEntry`], owned by one campaign.
///
/// A `BTreeMap` so serialized campaigns are byte-for-byte deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionTable {
    entries: BTreeMap<AccountId, ContributionEntry>,
}

impl ContributionTable {
    pub fn get(&self, contributor: &AccountId) -> Option<&ContributionEntry> {
        self.entries.get(contributor)
    }

    /// Recorded amount for `contributor`; zero if absent or claimed.
    pub fn amount_of(&self, contributor: &AccountId) -> u64 {
        self.entries.get(contributor).map_or(0, |e| e.amount)
    }

    /// Overwrite the pledged amount, creating the entry if needed.
    pub(crate) fn set_amount(&mut self, contributor: &AccountId, amount: u64) {
        self.entries.entry(*contributor).or_default().amount = amount;
    }

    /// Zero the entry and mark it claimed. Returns the amount it held.
    pub(crate) fn claim(&mut self, contributor: &AccountId) -> u64 {
        match self.entries.get_mut(contributor) {
            Some(entry) => {
                entry.claimed = true;
                std::mem::take(&mut entry.amount)
            }
            None => 0,
        }
    }

    /// Put an entry back the way it was before a failed call.
    pub(crate) fn restore(&mut self, contributor: &AccountId, prior: Option<ContributionEntry>) {
        match prior {
            Some(entry) => {
                self.entries.insert(*contributor, entry);
            }
            None => {
                self.entries.remove(contributor);
            }
        }
    }

    /// Sum of all outstanding amounts. `u128` so the sum cannot overflow.
    pub fn outstanding(&self) -> u128 {
        self.entries.values().map(|e| u128::from(e.amount)).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
