//! # Key Management
//!
//! Ed25519 keypairs and the account identities derived from them.
//!
//! Every participant in a Pledge ledger is an [`AccountId`]: the 32 raw
//! bytes of an Ed25519 public key. Campaign custody accounts are also
//! `AccountId`s, but derived with BLAKE3 from the campaign id instead of
//! from a keypair. Nobody holds a signing key for them, so the only way
//! value leaves a custody account is through the ledger's own transitions.
//!
//! ## Encoding
//!
//! - Base58 is the canonical text form (what users paste and what the HTTP
//!   API prints). Hex is available for logs and debugging.
//! - In human-readable serde formats (JSON) an `AccountId` is its base58
//!   string; in binary formats (bincode) it is the raw 32 bytes.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (ed25519-dalek does this for us).
//! - Key generation uses `OsRng`.
//! - Secret key bytes never appear in `Debug` output or logs.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::domain_separated_hash;

/// Errors that can occur during key operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid secret key bytes: expected 32 bytes")]
    InvalidSecretKey,

    #[error("invalid account id: expected 32 bytes")]
    InvalidAccountId,

    #[error("invalid base58 encoding: {0}")]
    InvalidBase58(String),

    #[error("invalid signature bytes: expected 64 bytes")]
    InvalidSignature,
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing keypair.
///
/// `Keypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Exporting a private key should be a deliberate act: use
/// [`secret_key_bytes`](Self::secret_key_bytes) / [`from_hex`](Self::from_hex).
///
/// # Examples
///
/// ```
/// use pledge_protocol::crypto::keys::Keypair;
///
/// let kp = Keypair::generate();
/// let sig = kp.sign(b"pledge 100 to campaign");
/// assert!(kp.account_id().verify(b"pledge 100 to campaign", &sig));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Constructs a keypair deterministically from a 32-byte seed.
    ///
    /// Tests use this to get stable identities. Production keys should come
    /// from [`generate`](Self::generate).
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key, as written by
    /// `pledge-node init`.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str.trim()).map_err(|_| KeyError::InvalidSecretKey)?;
        let arr: [u8; SECRET_KEY_LENGTH] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidSecretKey)?;
        Ok(Self::from_seed(&arr))
    }

    /// The account identity controlled by this keypair.
    pub fn account_id(&self) -> AccountId {
        AccountId {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Sign a message. Ed25519 signatures are deterministic.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            bytes: self.signing_key.sign(message).to_bytes().to_vec(),
        }
    }

    /// Exports the raw 32-byte secret key material.
    ///
    /// Don't log it. Don't send it anywhere.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self::from_seed(&self.signing_key.to_bytes())
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair(account={})", self.account_id())
    }
}

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity of an account holding native value.
///
/// Either an Ed25519 public key (a user who can sign calls) or a derived
/// custody address (see [`AccountId::derive`]). Ordered so it can key a
/// `BTreeMap` with a deterministic iteration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId {
    bytes: [u8; 32],
}

impl AccountId {
    /// Wrap raw bytes. No curve check: derived custody ids are not points.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Derive a program-owned account id from a domain string and seed.
    ///
    /// Uses BLAKE3 in key-derivation mode, so ids derived under different
    /// domains never collide with each other.
    pub fn derive(domain: &str, seed: &[u8]) -> Self {
        Self {
            bytes: domain_separated_hash(domain, seed),
        }
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify an Ed25519 signature made by the key behind this id.
    ///
    /// Returns `false` for malformed signatures and for derived ids that are
    /// not valid curve points.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let Some(sig) = signature.to_dalek_signature() else {
            return false;
        };
        verifying_key.verify_strict(message, &sig).is_ok()
    }

    /// Base58 text form.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }

    /// Hex text form, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded account id.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidAccountId)?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidAccountId)?;
        Ok(Self { bytes })
    }
}

impl FromStr for AccountId {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = bs58::decode(s)
            .into_vec()
            .map_err(|e| KeyError::InvalidBase58(e.to_string()))?;
        let bytes: [u8; 32] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| KeyError::InvalidAccountId)?;
        Ok(Self { bytes })
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b58 = self.to_base58();
        write!(f, "AccountId({}..)", &b58[..b58.len().min(8)])
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_base58())
        } else {
            self.bytes.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <[u8; 32]>::deserialize(deserializer)?;
            Ok(Self { bytes })
        }
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// An Ed25519 signature. Always 64 bytes when produced by [`Keypair::sign`];
/// anything else simply fails verification.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    bytes: Vec<u8>,
}

impl Signature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Convert to the ed25519-dalek type. `None` if not exactly 64 bytes.
    pub fn to_dalek_signature(&self) -> Option<DalekSignature> {
        let arr: [u8; 64] = self.bytes.as_slice().try_into().ok()?;
        Some(DalekSignature::from_bytes(&arr))
    }

    /// Hex-encoded signature, 128 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s).map_err(|_| KeyError::InvalidSignature)?;
        if bytes.len() != 64 {
            return Err(KeyError::InvalidSignature);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "Signature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "Signature({})", hex_str)
        }
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            self.bytes.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            Ok(Self { bytes })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_sign_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"contribute 60");
        assert!(kp.account_id().verify(b"contribute 60", &sig));
        assert!(!kp.account_id().verify(b"contribute 61", &sig));
    }

    #[test]
    fn wrong_key_fails_verification() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        let sig = kp1.sign(b"message");
        assert!(!kp2.account_id().verify(b"message", &sig));
    }

    #[test]
    fn seed_is_deterministic() {
        let a = Keypair::from_seed(&[7u8; 32]);
        let b = Keypair::from_seed(&[7u8; 32]);
        assert_eq!(a.account_id(), b.account_id());
    }

    #[test]
    fn secret_hex_roundtrip() {
        let kp = Keypair::generate();
        let restored = Keypair::from_hex(&hex::encode(kp.secret_key_bytes())).unwrap();
        assert_eq!(kp.account_id(), restored.account_id());
    }

    #[test]
    fn short_secret_hex_rejected() {
        assert_eq!(
            Keypair::from_hex("abcd").unwrap_err(),
            KeyError::InvalidSecretKey
        );
    }

    #[test]
    fn base58_parse_roundtrip() {
        let id = Keypair::generate().account_id();
        let parsed: AccountId = id.to_base58().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn base58_of_wrong_length_rejected() {
        let short = bs58::encode([1u8; 16]).into_string();
        assert_eq!(
            short.parse::<AccountId>().unwrap_err(),
            KeyError::InvalidAccountId
        );
        assert!(matches!(
            "0OIl".parse::<AccountId>(),
            Err(KeyError::InvalidBase58(_))
        ));
    }

    #[test]
    fn derived_ids_are_domain_separated() {
        let a = AccountId::derive("pledge/custody/v1", b"seed");
        let b = AccountId::derive("pledge/other/v1", b"seed");
        let c = AccountId::derive("pledge/custody/v1", b"seed");
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn account_id_json_is_base58_string() {
        let id = Keypair::from_seed(&[1u8; 32]).account_id();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_base58()));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn account_id_bincode_is_raw_bytes() {
        let id = Keypair::from_seed(&[2u8; 32]).account_id();
        let bytes = bincode::serialize(&id).unwrap();
        assert_eq!(bytes.len(), 32);
        let back: AccountId = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn debug_never_prints_secret() {
        let kp = Keypair::from_seed(&[9u8; 32]);
        let debug = format!("{:?}", kp);
        assert!(!debug.contains(&hex::encode(kp.secret_key_bytes())));
    }

    #[test]
    fn truncated_signature_does_not_verify() {
        let kp = Keypair::generate();
        let sig = kp.sign(b"m");
        let truncated = Signature {
            bytes: sig.as_bytes()[..32].to_vec(),
        };
        assert!(!kp.account_id().verify(b"m", &truncated));
    }

    #[test]
    fn derived_custody_id_cannot_sign() {
        let custody = AccountId::derive("pledge/custody/test", b"campaign");
        let forged = Keypair::generate().sign(b"withdraw");
        assert!(!custody.verify(b"withdraw", &forged));
    }
}
