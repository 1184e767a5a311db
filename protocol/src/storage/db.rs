//! # LedgerDb: Persistent Storage Engine
//!
//! The persistence layer for a Pledge node, built on sled's embedded
//! key-value store. Bank balances and the slot counter live here; campaign
//! records live in a tree the contracts crate opens through
//! [`LedgerDb::open_tree`].
//!
//! ## Tree Layout
//!
//! | Tree        | Key                  | Value              |
//! |-------------|----------------------|--------------------|
//! | `accounts`  | account id (32B)     | `bincode(Account)` |
//! | `metadata`  | key (UTF-8)          | value (bytes)      |
//!
//! ## Atomicity
//!
//! A call that moves value changes a campaign record and two accounts.
//! Those writes must land together, so the campaign store commits them in
//! one sled transaction over its own tree and [`LedgerDb::accounts_tree`],
//! encoding accounts with [`LedgerDb::encode_account`].

use sled::{Db, Tree};
use std::path::Path;

use crate::crypto::AccountId;
use crate::host::{Account, Bank, Slot};

// ---------------------------------------------------------------------------
// Error Type
// ---------------------------------------------------------------------------

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Well-known key in the `metadata` tree for the last slot a node reached.
const META_LATEST_SLOT: &[u8] = b"latest_slot";

// ---------------------------------------------------------------------------
// LedgerDb
// ---------------------------------------------------------------------------

/// Persistent storage for a node's bank and clock.
///
/// sled trees are safe to share across threads; `LedgerDb` is cheap to
/// clone and every clone sees the same data.
#[derive(Debug, Clone)]
pub struct LedgerDb {
    db: Db,
    accounts: Tree,
    metadata: Tree,
}

impl LedgerDb {
    /// Open or create a database at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// A throwaway database removed when the last handle drops.
    pub fn open_temporary() -> DbResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> DbResult<Self> {
        let accounts = db.open_tree("accounts")?;
        let metadata = db.open_tree("metadata")?;
        Ok(Self {
            db,
            accounts,
            metadata,
        })
    }

    /// Open a named sled tree from the underlying database.
    ///
    /// Lets higher layers keep their own keyspace in the same database
    /// instance. The tree is created if it doesn't exist.
    pub fn open_tree(&self, name: &str) -> DbResult<Tree> {
        Ok(self.db.open_tree(name)?)
    }

    // -- Account operations -------------------------------------------------

    /// The `accounts` tree, keyed by the 32 account id bytes.
    pub fn accounts_tree(&self) -> &Tree {
        &self.accounts
    }

    /// On-disk form of one account.
    pub fn encode_account(account: &Account) -> DbResult<Vec<u8>> {
        bincode::serialize(account).map_err(|e| DbError::Serialization(e.to_string()))
    }

    /// Write a single account outside any campaign commit (faucet grants).
    pub fn put_account(&self, id: &AccountId, account: &Account) -> DbResult<()> {
        self.accounts
            .insert(id.as_bytes(), Self::encode_account(account)?)?;
        Ok(())
    }

    /// Rebuild the bank from the `accounts` tree.
    pub fn load_bank(&self) -> DbResult<Bank> {
        let mut accounts = Vec::with_capacity(self.accounts.len());
        for entry in self.accounts.iter() {
            let (key, value) = entry?;
            let bytes: [u8; 32] = key
                .as_ref()
                .try_into()
                .map_err(|_| DbError::Serialization("invalid account key".to_string()))?;
            let account: Account =
                bincode::deserialize(&value).map_err(|e| DbError::Serialization(e.to_string()))?;
            accounts.push((AccountId::from_bytes(bytes), account));
        }
        Ok(Bank::from_accounts(accounts))
    }

    // -- Metadata operations ------------------------------------------------

    /// The last slot recorded with [`LedgerDb::put_slot`], if any.
    pub fn get_slot(&self) -> DbResult<Option<Slot>> {
        match self.metadata.get(META_LATEST_SLOT)? {
            Some(bytes) => {
                let slot = u64::from_be_bytes(
                    bytes
                        .as_ref()
                        .try_into()
                        .map_err(|_| DbError::Serialization("invalid slot bytes".to_string()))?,
                );
                Ok(Some(slot))
            }
            None => Ok(None),
        }
    }

    pub fn put_slot(&self, slot: Slot) -> DbResult<()> {
        self.metadata.insert(META_LATEST_SLOT, &slot.to_be_bytes())?;
        Ok(())
    }

    // -- Utility operations -------------------------------------------------

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Block until all buffered writes are durable.
    pub fn flush(&self) -> DbResult<()> {
        self.db.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::host::ValueTransfer;

    #[test]
    fn open_temporary_database() {
        let db = LedgerDb::open_temporary().expect("should create temp db");
        assert_eq!(db.account_count(), 0);
        assert_eq!(db.get_slot().unwrap(), None);
    }

    #[test]
    fn put_account_overwrites() {
        let db = LedgerDb::open_temporary().unwrap();
        let id = Keypair::generate().account_id();
        let mut account = Account {
            balance: 500,
            nonce: 3,
            frozen: true,
        };
        db.put_account(&id, &account).unwrap();
        account.balance = 20;
        db.put_account(&id, &account).unwrap();

        assert_eq!(db.account_count(), 1);
        assert_eq!(db.load_bank().unwrap().account(&id), Some(&account));
    }

    #[test]
    fn bank_roundtrip() {
        let db = LedgerDb::open_temporary().unwrap();
        let (a, b) = (
            Keypair::generate().account_id(),
            Keypair::generate().account_id(),
        );
        let mut bank = Bank::new();
        bank.deposit(&a, 1_000).unwrap();
        bank.transfer(&a, &b, 250).unwrap();
        bank.bump_nonce(&a);

        for (id, account) in bank.accounts_of(&[a, b]) {
            db.put_account(&id, &account).unwrap();
        }
        let loaded = db.load_bank().unwrap();
        assert_eq!(loaded.balance(&a), 750);
        assert_eq!(loaded.balance(&b), 250);
        assert_eq!(loaded.nonce(&a), 1);
        assert_eq!(loaded.total_supply(), 1_000);
    }

    #[test]
    fn slot_tracking() {
        let db = LedgerDb::open_temporary().unwrap();
        db.put_slot(42).unwrap();
        assert_eq!(db.get_slot().unwrap(), Some(42));
        db.put_slot(43).unwrap();
        assert_eq!(db.get_slot().unwrap(), Some(43));
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let id = Keypair::generate().account_id();
        {
            let db = LedgerDb::open(dir.path()).unwrap();
            let account = Account {
                balance: 77,
                ..Account::default()
            };
            db.put_account(&id, &account).unwrap();
            db.put_slot(9).unwrap();
            db.flush().unwrap();
        }
        let db = LedgerDb::open(dir.path()).unwrap();
        assert_eq!(db.load_bank().unwrap().balance(&id), 77);
        assert_eq!(db.get_slot().unwrap(), Some(9));
    }

    #[test]
    fn encoded_accounts_load_back() {
        let db = LedgerDb::open_temporary().unwrap();
        let id = Keypair::generate().account_id();
        let account = Account {
            balance: 12,
            nonce: 1,
            frozen: false,
        };
        let bytes = LedgerDb::encode_account(&account).unwrap();
        db.accounts_tree().insert(id.as_bytes(), bytes).unwrap();
        assert_eq!(db.load_bank().unwrap().account(&id), Some(&account));
    }

    #[test]
    fn extra_trees_are_independent() {
        let db = LedgerDb::open_temporary().unwrap();
        let tree = db.open_tree("campaigns").unwrap();
        tree.insert(b"k", b"v".to_vec()).unwrap();
        assert_eq!(db.account_count(), 0);
        assert_eq!(tree.len(), 1);
    }
}
