// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Pledge Protocol: Core Library
//!
//! The ground the crowdfunding ledger stands on: who is calling, what time
//! it is, where the money is, and what survives a restart.
//!
//! ## Architecture
//!
//! - **crypto**: Ed25519 identities and BLAKE3 hashing. Don't roll your own.
//! - **call**: Signed, nonce-protected call envelopes.
//! - **host**: The slot clock and the bank, behind traits the ledger
//!   consumes.
//! - **storage**: sled persistence for balances, nonces and the slot.
//! - **config**: Protocol constants and node defaults.
//!
//! Campaign logic itself lives in `pledge-contracts`; this crate knows
//! nothing about goals or deadlines.
//!
//! ## Design Philosophy
//!
//! 1. If it touches money, it uses checked arithmetic.
//! 2. A failed transfer changes nothing.
//! 3. If it touches money, it has tests. Plural.

pub mod call;
pub mod config;
pub mod crypto;
pub mod host;
pub mod storage;
