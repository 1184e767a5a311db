//! # Campaign Stores
//!
//! Where campaigns live between calls. [`MemoryStore`] for tests and
//! throwaway nodes; [`SledStore`] keeps them in a `campaigns` tree of the
//! node's [`LedgerDb`], keyed by the 16 UUID bytes, bincode values.
//!
//! A commit carries the campaign together with the bank accounts the call
//! changed. [`SledStore`] writes both in one transaction, so after a crash
//! the disk holds either the whole call or none of it.

use std::collections::BTreeMap;

use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::Account;
use pledge_protocol::storage::{DbError, LedgerDb};
use sled::transaction::{TransactionError, TransactionResult};
use sled::{Transactional, Tree};
use thiserror::Error;

use crate::crowdfund::{Campaign, CampaignId};

const CAMPAIGNS_TREE: &str = "campaigns";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] DbError),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Campaign persistence.
pub trait CampaignStore {
    fn get(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError>;

    /// Insert or overwrite `campaign` and persist `accounts` with it,
    /// all or nothing.
    fn commit(
        &mut self,
        campaign: &Campaign,
        accounts: &[(AccountId, Account)],
    ) -> Result<(), StoreError>;

    /// Every campaign, ordered by id.
    fn list(&self) -> Result<Vec<Campaign>, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Campaigns only. Accounts stay in the caller's in-memory bank.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    campaigns: BTreeMap<CampaignId, Campaign>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CampaignStore for MemoryStore {
    fn get(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        Ok(self.campaigns.get(id).cloned())
    }

    fn commit(
        &mut self,
        campaign: &Campaign,
        _accounts: &[(AccountId, Account)],
    ) -> Result<(), StoreError> {
        self.campaigns.insert(campaign.id(), campaign.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Campaign>, StoreError> {
        Ok(self.campaigns.values().cloned().collect())
    }

    fn len(&self) -> usize {
        self.campaigns.len()
    }
}

// ---------------------------------------------------------------------------
// SledStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SledStore {
    campaigns: Tree,
    accounts: Tree,
}

impl SledStore {
    pub fn open(db: &LedgerDb) -> Result<Self, StoreError> {
        Ok(Self {
            campaigns: db.open_tree(CAMPAIGNS_TREE)?,
            accounts: db.accounts_tree().clone(),
        })
    }
}

fn decode(bytes: &[u8]) -> Result<Campaign, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

impl CampaignStore for SledStore {
    fn get(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        match self.campaigns.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn commit(
        &mut self,
        campaign: &Campaign,
        accounts: &[(AccountId, Account)],
    ) -> Result<(), StoreError> {
        let id = campaign.id();
        let record =
            bincode::serialize(campaign).map_err(|e| StoreError::Serialization(e.to_string()))?;
        let encoded = accounts
            .iter()
            .map(|(account_id, account)| {
                Ok((*account_id, LedgerDb::encode_account(account)?))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        let result: TransactionResult<(), ()> =
            (&self.campaigns, &self.accounts).transaction(|(campaigns, accounts)| {
                campaigns.insert(id.as_bytes().as_slice(), record.as_slice())?;
                for (account_id, bytes) in &encoded {
                    accounts.insert(account_id.as_bytes().as_slice(), bytes.as_slice())?;
                }
                Ok(())
            });
        result.map_err(|e| match e {
            TransactionError::Storage(e) => StoreError::Sled(e),
            TransactionError::Abort(()) => {
                StoreError::Serialization("campaign commit aborted".to_string())
            }
        })
    }

    fn list(&self) -> Result<Vec<Campaign>, StoreError> {
        let mut campaigns = Vec::with_capacity(self.campaigns.len());
        for entry in self.campaigns.iter() {
            let (_key, value) = entry?;
            campaigns.push(decode(&value)?);
        }
        Ok(campaigns)
    }

    fn len(&self) -> usize {
        self.campaigns.len()
    }
}
