//! # Storage Module
//!
//! sled-backed persistence for node state. Bincode on disk, JSON only at
//! the API boundary.

pub mod db;

pub use db::{DbError, DbResult, LedgerDb};
