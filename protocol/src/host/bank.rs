//! # Bank
//!
//! Native-value balances for every account a ledger touches: contributors,
//! campaign owners and campaign custody accounts alike.
//!
//! The bank enforces two things and nothing else:
//!
//! 1. A debit never exceeds the available balance, and a credit never
//!    overflows `u64`.
//! 2. A transfer is all-or-nothing. Every check runs before either side is
//!    mutated, so a failed transfer leaves both balances untouched.
//!
//! Frozen accounts can neither send nor receive. Nothing in a running node
//! freezes accounts; the flag exists so tests can make a transfer fail on
//! demand and exercise rollback.
//!
//! A [`BankCheckpoint`] records a few accounts before a call touches them,
//! so the call can be undone without copying the whole table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::AccountId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a value movement was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient funds in {account}: available {available}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        available: u64,
        requested: u64,
    },

    #[error("balance overflow in {account}: current {current}, credit {credit}")]
    Overflow {
        account: AccountId,
        current: u64,
        credit: u64,
    },

    #[error("account {0} is frozen")]
    AccountFrozen(AccountId),
}

/// Anything value can be moved through.
pub trait ValueTransfer {
    /// Move `amount` from `from` to `to`, atomically.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u64)
        -> Result<(), TransferError>;
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Per-account state held by the bank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Spendable balance in base units.
    pub balance: u64,

    /// Number of signed calls this account has had accepted. The next call
    /// must carry exactly this value.
    pub nonce: u64,

    /// Frozen accounts reject both debits and credits.
    pub frozen: bool,
}

// ---------------------------------------------------------------------------
// Checkpoint
// ---------------------------------------------------------------------------

/// Prior state of selected accounts. `None` marks an account that did not
/// exist yet and is removed again on restore.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BankCheckpoint {
    accounts: Vec<(AccountId, Option<Account>)>,
}

// ---------------------------------------------------------------------------
// Bank
// ---------------------------------------------------------------------------

/// In-memory balance table. Persistence is [`LedgerDb`]'s job.
///
/// [`LedgerDb`]: crate::storage::LedgerDb
#[derive(Clone, Debug, Default)]
pub struct Bank {
    accounts: HashMap<AccountId, Account>,
}

impl Bank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a bank from persisted accounts.
    pub fn from_accounts(accounts: impl IntoIterator<Item = (AccountId, Account)>) -> Self {
        Self {
            accounts: accounts.into_iter().collect(),
        }
    }

    pub fn account(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.get(id)
    }

    /// All known accounts, in no particular order.
    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Account)> {
        self.accounts.iter()
    }

    /// Balance of `id`; unknown accounts hold zero.
    pub fn balance(&self, id: &AccountId) -> u64 {
        self.accounts.get(id).map_or(0, |a| a.balance)
    }

    /// Expected nonce for the next call from `id`.
    pub fn nonce(&self, id: &AccountId) -> u64 {
        self.accounts.get(id).map_or(0, |a| a.nonce)
    }

    /// Mint `amount` into `id`. Returns the new balance.
    ///
    /// # Errors
    ///
    /// [`TransferError::AccountFrozen`] or [`TransferError::Overflow`].
    pub fn deposit(&mut self, id: &AccountId, amount: u64) -> Result<u64, TransferError> {
        let account = self.accounts.entry(*id).or_default();
        if account.frozen {
            return Err(TransferError::AccountFrozen(*id));
        }
        let new_balance = account
            .balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow {
                account: *id,
                current: account.balance,
                credit: amount,
            })?;
        account.balance = new_balance;
        Ok(new_balance)
    }

    /// Increment the nonce of `id` after one of its calls was accepted.
    pub fn bump_nonce(&mut self, id: &AccountId) -> u64 {
        let account = self.accounts.entry(*id).or_default();
        account.nonce = account.nonce.saturating_add(1);
        account.nonce
    }

    pub fn set_frozen(&mut self, id: &AccountId, frozen: bool) {
        self.accounts.entry(*id).or_default().frozen = frozen;
    }

    /// Record `ids` as they are now.
    pub fn checkpoint(&self, ids: &[AccountId]) -> BankCheckpoint {
        let mut accounts: Vec<(AccountId, Option<Account>)> = Vec::with_capacity(ids.len());
        for id in ids {
            if !accounts.iter().any(|(seen, _)| seen == id) {
                accounts.push((*id, self.accounts.get(id).cloned()));
            }
        }
        BankCheckpoint { accounts }
    }

    /// Put every checkpointed account back. Accounts outside the checkpoint
    /// are left alone.
    pub fn restore(&mut self, checkpoint: BankCheckpoint) {
        for (id, prior) in checkpoint.accounts {
            match prior {
                Some(account) => {
                    self.accounts.insert(id, account);
                }
                None => {
                    self.accounts.remove(&id);
                }
            }
        }
    }

    /// Current state of those `ids` that exist, for persisting.
    pub fn accounts_of(&self, ids: &[AccountId]) -> Vec<(AccountId, Account)> {
        ids.iter()
            .filter_map(|id| self.accounts.get(id).map(|a| (*id, a.clone())))
            .collect()
    }

    /// Sum of all balances. `u128` so the sum itself cannot overflow.
    pub fn total_supply(&self) -> u128 {
        self.accounts.values().map(|a| u128::from(a.balance)).sum()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl ValueTransfer for Bank {
    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        let source = self.accounts.get(from).cloned().unwrap_or_default();
        if source.frozen {
            return Err(TransferError::AccountFrozen(*from));
        }
        if self.accounts.get(to).is_some_and(|a| a.frozen) {
            return Err(TransferError::AccountFrozen(*to));
        }
        if source.balance < amount {
            return Err(TransferError::InsufficientFunds {
                account: *from,
                available: source.balance,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }

        let dest_balance = self.balance(to);
        let new_dest = dest_balance
            .checked_add(amount)
            .ok_or(TransferError::Overflow {
                account: *to,
                current: dest_balance,
                credit: amount,
            })?;

        // Every check has passed; both writes below are infallible.
        self.accounts.entry(*from).or_default().balance = source.balance - amount;
        self.accounts.entry(*to).or_default().balance = new_dest;

        tracing::trace!(%from, %to, amount, "transfer applied");
        Ok(())
    }
}
