//! # Protocol Configuration & Constants
//!
//! Every magic number in Pledge lives here. Runtime settings (ports, data
//! directory, slot length) are CLI flags on `pledge-node` whose defaults
//! come from this module.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Versioning
// ---------------------------------------------------------------------------

/// Protocol version reported by nodes.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

/// BLAKE3 derivation context for campaign custody accounts.
///
/// Changing this moves every campaign's funds to a different address.
/// Don't.
pub const CUSTODY_DOMAIN: &str = "pledge 2026-01 campaign custody v1";

/// Domain tag prefixed to every signed call, so a signature over a call
/// can never be replayed as a signature over anything else.
pub const CALL_SIGNING_DOMAIN: &str = "pledge 2026-01 signed call v1";

/// Largest encoded instruction a signed call may carry.
pub const MAX_CALL_PAYLOAD_BYTES: usize = 1024;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Default slot length. The slot counter is the only clock the ledger
/// trusts; this only controls how fast a node advances it.
pub const SLOT_TIME: Duration = Duration::from_millis(400);

/// [`SLOT_TIME`] in milliseconds, for CLI defaults.
pub const SLOT_TIME_MS: u64 = 400;

/// Longest campaign a node will accept, in slots (~30 days at 400ms).
pub const MAX_CAMPAIGN_DURATION_SLOTS: u64 = 6_480_000;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port.
pub const DEFAULT_RPC_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Largest single faucet grant on a dev node.
pub const FAUCET_MAX_GRANT: u64 = 1_000_000_000;

/// Broadcast channel capacity for live event streaming.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;
