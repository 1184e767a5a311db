//! # Host Contract
//!
//! What a campaign needs from its environment for the duration of one
//! call: the current slot, a way to move value, and somewhere to report
//! what happened. The caller identity is not here; the processor
//! authenticates it and passes it to each operation explicitly.

use pledge_protocol::crypto::AccountId;
use pledge_protocol::host::{Slot, SlotClock, TransferError, ValueTransfer};

use crate::crowdfund::CampaignEvent;

/// Host environment seen by campaign operations.
pub trait Host {
    /// The current slot. Must return the same value for the whole call.
    fn current_slot(&self) -> Slot;

    /// Move `amount` atomically. On `Err`, no value moved.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: u64)
        -> Result<(), TransferError>;

    fn emit(&mut self, event: CampaignEvent);
}

/// A [`Host`] for one call: the slot is read once at construction, value
/// moves through a borrowed bank, and events are buffered for the caller.
pub struct Runtime<'a, V: ValueTransfer + ?Sized> {
    slot: Slot,
    bank: &'a mut V,
    events: Vec<CampaignEvent>,
}

impl<'a, V: ValueTransfer + ?Sized> Runtime<'a, V> {
    pub fn new<C: SlotClock + ?Sized>(clock: &C, bank: &'a mut V) -> Self {
        Self::at_slot(clock.current_slot(), bank)
    }

    pub fn at_slot(slot: Slot, bank: &'a mut V) -> Self {
        Self {
            slot,
            bank,
            events: Vec::new(),
        }
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn events(&self) -> &[CampaignEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<CampaignEvent> {
        self.events
    }
}

impl<V: ValueTransfer + ?Sized> Host for Runtime<'_, V> {
    fn current_slot(&self) -> Slot {
        self.slot
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TransferError> {
        self.bank.transfer(from, to, amount)
    }

    fn emit(&mut self, event: CampaignEvent) {
        tracing::debug!(event = event.name(), campaign = %event.campaign(), "event emitted");
        self.events.push(event);
    }
}
