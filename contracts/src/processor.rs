//! # Call Processor
//!
//! Turns a [`SignedCall`] into a campaign transition:
//!
//! 1. Verify the signature; the recovered caller is the only identity the
//!    ledger ever sees.
//! 2. Require `call.nonce == bank.nonce(caller)` so a call applies once.
//! 3. Decode the [`Instruction`] and load the target campaign.
//! 4. Run the transition against a [`Runtime`] pinned to the current slot.
//! 5. Bump the caller's nonce and commit the campaign together with every
//!    account the call touched.
//!
//! A call only ever moves value between the caller and the campaign's
//! custody account, so those two are checkpointed before step 4. Any
//! failure, including a failed commit, restores them and leaves store,
//! bank and nonce as they were.

use pledge_protocol::call::{CallError, SignedCall};
use pledge_protocol::config::MAX_CAMPAIGN_DURATION_SLOTS;
use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::{Bank, Slot, SlotClock};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::crowdfund::{Campaign, CampaignEvent, CampaignId, CrowdfundError};
use crate::host::Runtime;
use crate::instruction::{Instruction, InstructionError};
use crate::store::{CampaignStore, StoreError};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Call(#[from] CallError),

    #[error(transparent)]
    Decode(#[from] InstructionError),

    #[error("bad nonce: expected {expected}, got {got}")]
    BadNonce { expected: u64, got: u64 },

    #[error("campaign {0} not found")]
    CampaignNotFound(CampaignId),

    #[error(transparent)]
    Crowdfund(#[from] CrowdfundError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// What an accepted call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub call_id: String,
    pub caller: AccountId,
    pub instruction: &'static str,
    pub campaign: CampaignId,
    pub slot: Slot,
    pub events: Vec<CampaignEvent>,
}

pub struct Processor<S> {
    store: S,
}

impl<S: CampaignStore> Processor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError> {
        self.store.get(id)
    }

    fn load(&self, id: &CampaignId) -> Result<Campaign, ProcessError> {
        self.store
            .get(id)?
            .ok_or(ProcessError::CampaignNotFound(*id))
    }

    pub fn process<C: SlotClock + ?Sized>(
        &mut self,
        call: &SignedCall,
        clock: &C,
        bank: &mut Bank,
    ) -> Result<Receipt, ProcessError> {
        let caller = call.verify()?;
        let expected = bank.nonce(&caller);
        if call.nonce != expected {
            debug!(%caller, expected, got = call.nonce, "nonce mismatch");
            return Err(ProcessError::BadNonce {
                expected,
                got: call.nonce,
            });
        }
        let instruction = Instruction::decode(&call.payload)?;
        let name = instruction.name();
        debug!(%caller, instruction = name, campaign = ?instruction.campaign(), "processing call");

        let involved: Vec<AccountId> = std::iter::once(caller)
            .chain(instruction.campaign().map(|id| id.custody()))
            .collect();
        let checkpoint = bank.checkpoint(&involved);
        match self.apply(instruction, caller, clock, bank) {
            Ok((campaign, slot, events)) => {
                bank.bump_nonce(&caller);
                let touched = bank.accounts_of(&[caller, campaign.custody()]);
                if let Err(e) = self.store.commit(&campaign, &touched) {
                    bank.restore(checkpoint);
                    return Err(e.into());
                }
                let receipt = Receipt {
                    call_id: call.id(),
                    caller,
                    instruction: name,
                    campaign: campaign.id(),
                    slot,
                    events,
                };
                info!(
                    call = %receipt.call_id,
                    %caller,
                    instruction = receipt.instruction,
                    campaign = %receipt.campaign,
                    slot,
                    "call applied"
                );
                Ok(receipt)
            }
            Err(e) => {
                bank.restore(checkpoint);
                Err(e)
            }
        }
    }

    /// Run the transition. Leaves the bank partly changed on error; the
    /// caller restores it.
    fn apply<C: SlotClock + ?Sized>(
        &self,
        instruction: Instruction,
        caller: AccountId,
        clock: &C,
        bank: &mut Bank,
    ) -> Result<(Campaign, Slot, Vec<CampaignEvent>), ProcessError> {
        let mut runtime = Runtime::new(clock, bank);
        let slot = runtime.slot();

        let campaign = match instruction {
            Instruction::Create { goal, duration } => {
                if duration > MAX_CAMPAIGN_DURATION_SLOTS {
                    return Err(CrowdfundError::InvalidParameters {
                        reason: "duration exceeds the node's campaign limit",
                    }
                    .into());
                }
                Campaign::create(&mut runtime, caller, goal, duration)?
            }
            Instruction::Contribute { campaign, amount } => {
                let mut c = self.load(&campaign)?;
                c.contribute(&mut runtime, &caller, amount)?;
                c
            }
            Instruction::Withdraw { campaign } => {
                let mut c = self.load(&campaign)?;
                c.withdraw(&mut runtime, &caller)?;
                c
            }
            Instruction::Refund { campaign } => {
                let mut c = self.load(&campaign)?;
                c.refund(&mut runtime, &caller)?;
                c
            }
            Instruction::Finalize { campaign } => {
                let mut c = self.load(&campaign)?;
                c.finalize(&mut runtime)?;
                c
            }
        };
        Ok((campaign, slot, runtime.into_events()))
    }
}
