//! # Cryptographic Primitives
//!
//! Identities, signatures and hashing. Everything here is a thin, typed
//! wrapper around audited implementations (`ed25519-dalek`, `blake3`).
//!
//! - **Ed25519** for caller authentication.
//! - **BLAKE3** for digests and custody-account derivation.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, domain_separated_hash};
pub use keys::{AccountId, KeyError, Keypair, Signature};
