//! Integration tests for signed-call processing over sled storage.
//!
//! Drives whole campaigns through `Processor::process` the way a node does:
//! signed calls in, receipts out, state in a `LedgerDb`.

use pledge_contracts::{
    CampaignEvent, CampaignId, CampaignStore, CrowdfundError, Instruction, ProcessError,
    Processor, SledStore,
};
use pledge_protocol::call::SignedCall;
use pledge_protocol::crypto::Keypair;
use pledge_protocol::host::{Bank, ManualClock};
use pledge_protocol::storage::LedgerDb;

fn submit(
    processor: &mut Processor<SledStore>,
    clock: &ManualClock,
    bank: &mut Bank,
    who: &Keypair,
    ix: Instruction,
) -> Result<pledge_contracts::Receipt, ProcessError> {
    let call = SignedCall::sign(who, bank.nonce(&who.account_id()), ix.encode().unwrap());
    processor.process(&call, clock, bank)
}

#[test]
fn failed_campaign_over_signed_calls() {
    let db = LedgerDb::open_temporary().unwrap();
    let mut processor = Processor::new(SledStore::open(&db).unwrap());
    let clock = ManualClock::new(100);
    let mut bank = Bank::new();
    let (owner, x, y) = (Keypair::generate(), Keypair::generate(), Keypair::generate());
    bank.deposit(&x.account_id(), 500).unwrap();
    bank.deposit(&y.account_id(), 500).unwrap();

    let id = submit(
        &mut processor,
        &clock,
        &mut bank,
        &owner,
        Instruction::Create {
            goal: 1_000,
            duration: 20,
        },
    )
    .unwrap()
    .campaign;

    for (who, amount) in [(&x, 100), (&y, 250)] {
        submit(
            &mut processor,
            &clock,
            &mut bank,
            who,
            Instruction::Contribute {
                campaign: id,
                amount,
            },
        )
        .unwrap();
    }

    clock.advance_to(120).unwrap();
    let err = submit(
        &mut processor,
        &clock,
        &mut bank,
        &owner,
        Instruction::Withdraw { campaign: id },
    )
    .unwrap_err();
    assert!(matches!(
        err,
        ProcessError::Crowdfund(CrowdfundError::GoalNotReached { .. })
    ));

    // Anyone may finalize a failed campaign; refunds stay open afterwards.
    submit(
        &mut processor,
        &clock,
        &mut bank,
        &x,
        Instruction::Finalize { campaign: id },
    )
    .unwrap();
    let receipt = submit(
        &mut processor,
        &clock,
        &mut bank,
        &y,
        Instruction::Refund { campaign: id },
    )
    .unwrap();
    assert!(matches!(
        receipt.events.as_slice(),
        [CampaignEvent::Refunded { amount: 250, .. }]
    ));

    let stored = processor.store().get(&id).unwrap().unwrap();
    assert!(stored.finalized());
    assert_eq!(stored.total_refunded(), 250);
    assert_eq!(bank.balance(&y.account_id()), 500);
    assert_eq!(bank.balance(&stored.custody()), 100);
    // owner: create + rejected withdraw (no bump) = 1
    assert_eq!(bank.nonce(&owner.account_id()), 1);
}

#[test]
fn successful_campaign_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let owner = Keypair::generate();
    let backer = Keypair::generate();
    let id: CampaignId;

    {
        let db = LedgerDb::open(dir.path()).unwrap();
        let mut processor = Processor::new(SledStore::open(&db).unwrap());
        let clock = ManualClock::new(0);
        let mut bank = Bank::new();
        bank.deposit(&backer.account_id(), 80).unwrap();

        id = submit(
            &mut processor,
            &clock,
            &mut bank,
            &owner,
            Instruction::Create {
                goal: 80,
                duration: 5,
            },
        )
        .unwrap()
        .campaign;
        let receipt = submit(
            &mut processor,
            &clock,
            &mut bank,
            &backer,
            Instruction::Contribute {
                campaign: id,
                amount: 80,
            },
        )
        .unwrap();
        assert!(receipt
            .events
            .iter()
            .any(|e| matches!(e, CampaignEvent::GoalReached { total_raised: 80, .. })));

        db.put_slot(0).unwrap();
        db.flush().unwrap();
    }

    {
        let db = LedgerDb::open(dir.path()).unwrap();
        let mut processor = Processor::new(SledStore::open(&db).unwrap());
        let clock = ManualClock::new(db.get_slot().unwrap().unwrap_or(0));
        let mut bank = db.load_bank().unwrap();
        assert_eq!(bank.balance(&id.custody()), 80);
        clock.advance(5);

        let receipt = submit(
            &mut processor,
            &clock,
            &mut bank,
            &owner,
            Instruction::Withdraw { campaign: id },
        )
        .unwrap();
        assert_eq!(receipt.slot, 5);
        assert_eq!(bank.balance(&owner.account_id()), 80);

        let refund = submit(
            &mut processor,
            &clock,
            &mut bank,
            &backer,
            Instruction::Refund { campaign: id },
        );
        assert!(matches!(
            refund,
            Err(ProcessError::Crowdfund(CrowdfundError::GoalWasReached))
        ));
        db.flush().unwrap();
    }

    // Nothing but the call commits wrote the withdraw to disk.
    let db = LedgerDb::open(dir.path()).unwrap();
    let bank = db.load_bank().unwrap();
    assert_eq!(bank.balance(&owner.account_id()), 80);
    assert_eq!(bank.nonce(&owner.account_id()), 2);
    assert_eq!(bank.balance(&id.custody()), 0);
    assert_eq!(bank.nonce(&backer.account_id()), 1);
    let campaign = SledStore::open(&db).unwrap().get(&id).unwrap().unwrap();
    assert!(campaign.finalized());
}
