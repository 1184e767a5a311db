//! # Node Ledger
//!
//! Everything one node mutates, behind one lock: the bank, the campaign
//! processor and the handle to persist both. Calls are applied one at a
//! time in arrival order, which is the serialization the ledger relies on.
//!
//! Each accepted call is already on disk when [`NodeLedger::submit`]
//! returns: the processor commits the campaign and the accounts it touched
//! in one transaction. Faucet grants write the single account they credit.

use std::collections::HashSet;
use std::sync::Arc;

use pledge_contracts::{
    CampaignEvent, CampaignStore, ProcessError, Processor, Receipt, SledStore, StoreError,
};
use pledge_protocol::call::SignedCall;
use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::{Bank, ManualClock, Slot, SlotClock, TransferError};
use pledge_protocol::storage::{DbError, LedgerDb};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("storage error: {0}")]
    Db(#[from] DbError),

    #[error("account {0} is a campaign custody account")]
    CustodyAccount(AccountId),
}

pub struct NodeLedger {
    db: LedgerDb,
    clock: Arc<ManualClock>,
    bank: Bank,
    processor: Processor<SledStore>,
    /// Custody accounts of every known campaign.
    custody: HashSet<AccountId>,
    /// Campaigns not yet finalized.
    open: usize,
}

impl NodeLedger {
    /// Load bank, slot and campaigns from `db`.
    pub fn open(db: LedgerDb) -> Result<Self, StoreError> {
        let slot = db.get_slot()?.unwrap_or(0);
        let bank = db.load_bank()?;
        let processor = Processor::new(SledStore::open(&db)?);
        let campaigns = processor.store().list()?;
        let custody = campaigns.iter().map(|c| c.custody()).collect();
        let open = campaigns.iter().filter(|c| !c.finalized()).count();
        tracing::info!(
            slot,
            accounts = bank.len(),
            campaigns = campaigns.len(),
            open,
            "ledger loaded"
        );
        Ok(Self {
            db,
            clock: Arc::new(ManualClock::new(slot)),
            bank,
            processor,
            custody,
            open,
        })
    }

    /// Shared handle to the slot clock, readable without the ledger lock.
    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::clone(&self.clock)
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    pub fn store(&self) -> &SledStore {
        self.processor.store()
    }

    /// Apply a signed call. A failed commit fails the call and leaves the
    /// bank untouched.
    pub fn submit(&mut self, call: &SignedCall) -> Result<Receipt, ProcessError> {
        let receipt = self.processor.process(call, &*self.clock, &mut self.bank)?;
        for event in &receipt.events {
            match event {
                CampaignEvent::Created { campaign, .. } => {
                    self.custody.insert(campaign.custody());
                    self.open += 1;
                }
                CampaignEvent::Withdrawn { .. } | CampaignEvent::Finalized { .. } => {
                    self.open = self.open.saturating_sub(1);
                }
                _ => {}
            }
        }
        Ok(receipt)
    }

    /// Advance one slot and record it.
    pub fn tick(&mut self) -> Slot {
        let slot = self.clock.advance(1);
        if let Err(e) = self.db.put_slot(slot) {
            tracing::error!(slot, error = %e, "failed to persist slot");
        }
        slot
    }

    /// Dev-node grant. The caller enforces the size limit. Custody accounts
    /// only ever receive value through contributions.
    pub fn faucet(&mut self, account: &AccountId, amount: u64) -> Result<u64, LedgerError> {
        if self.custody.contains(account) {
            return Err(LedgerError::CustodyAccount(*account));
        }
        let checkpoint = self.bank.checkpoint(&[*account]);
        let balance = self.bank.deposit(account, amount)?;
        for (id, state) in self.bank.accounts_of(&[*account]) {
            if let Err(e) = self.db.put_account(&id, &state) {
                self.bank.restore(checkpoint);
                return Err(e.into());
            }
        }
        tracing::info!(%account, amount, balance, "faucet grant");
        Ok(balance)
    }

    /// Campaigns that have not been finalized.
    pub fn open_campaigns(&self) -> usize {
        self.open
    }

    pub fn current_slot(&self) -> Slot {
        self.clock.current_slot()
    }

    pub fn flush(&self) -> Result<(), DbError> {
        self.db.put_slot(self.clock.current_slot())?;
        self.db.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pledge_contracts::Instruction;
    use pledge_protocol::crypto::Keypair;

    fn sign(kp: &Keypair, ledger: &NodeLedger, ix: Instruction) -> SignedCall {
        SignedCall::sign(
            kp,
            ledger.bank().nonce(&kp.account_id()),
            ix.encode().unwrap(),
        )
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let owner = Keypair::generate();
        let backer = Keypair::generate();
        let campaign;
        {
            let mut ledger = NodeLedger::open(LedgerDb::open(dir.path()).unwrap()).unwrap();
            ledger.faucet(&backer.account_id(), 500).unwrap();
            campaign = ledger
                .submit(&sign(
                    &owner,
                    &ledger,
                    Instruction::Create {
                        goal: 100,
                        duration: 3,
                    },
                ))
                .unwrap()
                .campaign;
            ledger
                .submit(&sign(
                    &backer,
                    &ledger,
                    Instruction::Contribute {
                        campaign,
                        amount: 40,
                    },
                ))
                .unwrap();
            ledger.tick();
            ledger.tick();
            ledger.flush().unwrap();
        }

        let ledger = NodeLedger::open(LedgerDb::open(dir.path()).unwrap()).unwrap();
        assert_eq!(ledger.current_slot(), 2);
        assert_eq!(ledger.bank().balance(&backer.account_id()), 460);
        assert_eq!(ledger.bank().nonce(&backer.account_id()), 1);
        let stored = ledger.store().get(&campaign).unwrap().unwrap();
        assert_eq!(stored.total_raised(), 40);
        assert_eq!(ledger.open_campaigns(), 1);
    }

    #[test]
    fn tick_advances_shared_clock() {
        let mut ledger = NodeLedger::open(LedgerDb::open_temporary().unwrap()).unwrap();
        let clock = ledger.clock();
        assert_eq!(ledger.tick(), 1);
        assert_eq!(clock.current_slot(), 1);
    }

    #[test]
    fn accepted_calls_reach_disk_without_flush() {
        let dir = tempfile::tempdir().unwrap();
        let backer = Keypair::generate();
        let campaign;
        {
            let mut ledger = NodeLedger::open(LedgerDb::open(dir.path()).unwrap()).unwrap();
            ledger.faucet(&backer.account_id(), 90).unwrap();
            campaign = ledger
                .submit(&sign(
                    &Keypair::generate(),
                    &ledger,
                    Instruction::Create {
                        goal: 100,
                        duration: 3,
                    },
                ))
                .unwrap()
                .campaign;
            ledger
                .submit(&sign(
                    &backer,
                    &ledger,
                    Instruction::Contribute {
                        campaign,
                        amount: 30,
                    },
                ))
                .unwrap();
        }

        let ledger = NodeLedger::open(LedgerDb::open(dir.path()).unwrap()).unwrap();
        assert_eq!(ledger.bank().balance(&backer.account_id()), 60);
        assert_eq!(ledger.bank().balance(&campaign.custody()), 30);
    }

    #[test]
    fn faucet_refuses_custody_accounts() {
        let mut ledger = NodeLedger::open(LedgerDb::open_temporary().unwrap()).unwrap();
        let campaign = ledger
            .submit(&sign(
                &Keypair::generate(),
                &ledger,
                Instruction::Create {
                    goal: 10,
                    duration: 3,
                },
            ))
            .unwrap()
            .campaign;

        let err = ledger.faucet(&campaign.custody(), 5).unwrap_err();
        assert!(matches!(err, LedgerError::CustodyAccount(id) if id == campaign.custody()));
        assert_eq!(ledger.bank().balance(&campaign.custody()), 0);
    }

    #[test]
    fn open_count_follows_create_and_finalize() {
        let mut ledger = NodeLedger::open(LedgerDb::open_temporary().unwrap()).unwrap();
        let owner = Keypair::generate();
        let campaign = ledger
            .submit(&sign(
                &owner,
                &ledger,
                Instruction::Create {
                    goal: 10,
                    duration: 1,
                },
            ))
            .unwrap()
            .campaign;
        assert_eq!(ledger.open_campaigns(), 1);

        ledger.tick();
        ledger
            .submit(&sign(&owner, &ledger, Instruction::Finalize { campaign }))
            .unwrap();
        assert_eq!(ledger.open_campaigns(), 0);
    }
}
