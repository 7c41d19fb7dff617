//! Core types for the lock ledger
//!
//! All types are designed for:
//! - Exact arithmetic (integer base units, checked everywhere)
//! - Memory safety (no unsafe code)
//! - Serializable snapshots of ledger state

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Token quantity in base units.
///
/// Wide enough to hold any fungible-asset supply; all mutations of ledger
/// balances use checked arithmetic.
pub type Amount = u128;

/// Dense, zero-based position identifier assigned in creation order.
pub type PositionId = u64;

/// Release timestamps are absolute seconds since the Unix epoch. Values at
/// or above this cutoff are millisecond-scale by mistake and are rejected.
pub const RELEASE_TIME_LIMIT: i64 = 10_000_000_000;

/// Account identifier (wallet, custody account, etc.)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset contract identifier
///
/// Externally-defined custodied assets arrive with their own identity;
/// freshly instantiated receipt assets get a generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    /// Wrap an existing identifier
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a fresh, unique identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One lock record: a custodied-asset deposit paired with its 1:1 receipt
/// asset and release timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Custodied asset being locked
    pub locked_asset: AssetId,

    /// Receipt asset minted for this position (one per position, never reused)
    pub receipt_asset: AssetId,

    /// Remaining custodied quantity backing outstanding receipts.
    /// Monotonically non-increasing after creation.
    pub locked_amount: Amount,

    /// Timestamp (seconds) before which withdrawal is refused
    pub release_time: i64,

    /// Identity that established the position. Recorded only; release is
    /// gated by receipt-asset ownership, not by creator identity.
    pub creator: AccountId,

    /// Existence flag; positions are never physically removed
    pub exists: bool,
}

impl Position {
    /// Check whether the release gate is open at `now`
    pub fn releasable_at(&self, now: i64) -> bool {
        now >= self.release_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_roundtrip() {
        let account = AccountId::new("alice");
        assert_eq!(account.as_str(), "alice");
        assert_eq!(account.to_string(), "alice");
    }

    #[test]
    fn test_asset_id_unique() {
        let a = AssetId::generate();
        let b = AssetId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_releasable_at() {
        let position = Position {
            locked_asset: AssetId::generate(),
            receipt_asset: AssetId::generate(),
            locked_amount: 1000,
            release_time: 500,
            creator: AccountId::new("alice"),
            exists: true,
        };

        assert!(!position.releasable_at(499));
        assert!(position.releasable_at(500)); // gate opens at exactly release_time
        assert!(position.releasable_at(501));
    }
}
