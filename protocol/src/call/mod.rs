//! # Signed Calls
//!
//! A [`SignedCall`] is how an identity reaches the ledger: an opaque
//! instruction payload, the caller's account, a replay-protection nonce and
//! an Ed25519 signature binding the three together.
//!
//! The protocol crate does not interpret the payload. Decoding it into an
//! instruction is the contracts crate's job; this module only answers "who
//! sent this, and did they really".
//!
//! ## Signable Bytes
//!
//! ```text
//! CALL_SIGNING_DOMAIN || 0x00 || caller (32B) || nonce (8B LE)
//!     || payload_len (4B LE) || payload
//! ```
//!
//! A fixed layout rather than serde output, so the signed bytes never depend
//! on which serializer a client happened to use.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::config::{CALL_SIGNING_DOMAIN, MAX_CALL_PAYLOAD_BYTES};
use crate::crypto::{blake3_hash, AccountId, Keypair, Signature};

/// Why a call was rejected before reaching the ledger.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("signature does not match caller {0}")]
    InvalidSignature(AccountId),

    #[error("payload is {size} bytes, limit is {max}")]
    PayloadTooLarge { size: usize, max: usize },
}

/// An authenticated request to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub caller: AccountId,
    pub nonce: u64,
    #[serde(with = "payload_bytes")]
    pub payload: Vec<u8>,
    pub signature: Signature,
}

impl SignedCall {
    /// Build and sign a call in one step.
    pub fn sign(keypair: &Keypair, nonce: u64, payload: Vec<u8>) -> Self {
        let caller = keypair.account_id();
        let signature = keypair.sign(&signable_bytes(&caller, nonce, &payload));
        Self {
            caller,
            nonce,
            payload,
            signature,
        }
    }

    /// The canonical bytes covered by [`SignedCall::signature`].
    pub fn signable_bytes(&self) -> Vec<u8> {
        signable_bytes(&self.caller, self.nonce, &self.payload)
    }

    /// Hex call id: BLAKE3 over the signable bytes. Stable across
    /// re-serialization and independent of the signature.
    pub fn id(&self) -> String {
        hex::encode(blake3_hash(&self.signable_bytes()))
    }

    /// Check the size limit and the signature.
    ///
    /// Returns the authenticated caller on success.
    pub fn verify(&self) -> Result<AccountId, CallError> {
        if self.payload.len() > MAX_CALL_PAYLOAD_BYTES {
            return Err(CallError::PayloadTooLarge {
                size: self.payload.len(),
                max: MAX_CALL_PAYLOAD_BYTES,
            });
        }
        if !self.caller.verify(&self.signable_bytes(), &self.signature) {
            return Err(CallError::InvalidSignature(self.caller));
        }
        Ok(self.caller)
    }
}

fn signable_bytes(caller: &AccountId, nonce: u64, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(CALL_SIGNING_DOMAIN.len() + 45 + payload.len());
    buf.extend_from_slice(CALL_SIGNING_DOMAIN.as_bytes());
    buf.push(0x00);
    buf.extend_from_slice(caller.as_bytes());
    buf.extend_from_slice(&nonce.to_le_bytes());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(payload);
    buf
}

/// Hex in JSON, raw bytes in bincode.
mod payload_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&hex::encode(bytes))
        } else {
            serializer.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            hex::decode(s).map_err(serde::de::Error::custom)
        } else {
            Vec::<u8>::deserialize(deserializer)
        }
    }
}
