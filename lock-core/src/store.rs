//! Position store: backing arena plus lookup indexes
//!
//! One append-only arena of position records with two decoupled lookup
//! tables over it. The record itself is never duplicated, so conservation,
//! index immutability, and id density are enforced in one place.
//!
//! # Indexes
//!
//! - `by_locked_asset` - locked asset → position ids (insertion order, append-only)
//! - `by_receipt` - receipt asset → position id (1:1, fixed at creation)

use crate::{
    token::{FungibleAsset, ReceiptToken},
    types::{Amount, AssetId, Position, PositionId},
    Error, Result,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A position together with the capability handles needed to act on it
pub struct PositionRecord {
    /// Ledger-visible position data
    pub position: Position,

    /// Custodied-asset capability (custody transfers)
    pub locked_token: Arc<dyn FungibleAsset>,

    /// Receipt-asset capability (mint/burn, supply queries)
    pub receipt_token: Arc<dyn ReceiptToken>,
}

/// Arena of position records plus the two lookup indexes
#[derive(Default)]
pub struct PositionStore {
    records: Vec<PositionRecord>,
    by_locked_asset: HashMap<AssetId, Vec<PositionId>>,
    by_receipt: HashMap<AssetId, PositionId>,
}

impl PositionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions; also the next id to assign
    pub fn count(&self) -> u64 {
        self.records.len() as u64
    }

    /// Append a record, assigning the next dense id and updating both
    /// indexes. Refused if the receipt asset is already indexed: a receipt
    /// asset identifies exactly one position for its entire lifetime.
    pub fn append(&mut self, record: PositionRecord) -> Result<PositionId> {
        let receipt = record.position.receipt_asset;
        if self.by_receipt.contains_key(&receipt) {
            return Err(Error::InvalidInput(format!(
                "receipt asset {} is already bound to a position",
                receipt
            )));
        }

        let id = self.records.len() as PositionId;
        self.by_locked_asset
            .entry(record.position.locked_asset)
            .or_default()
            .push(id);
        self.by_receipt.insert(receipt, id);
        self.records.push(record);

        Ok(id)
    }

    /// Get a record by id
    pub fn get(&self, id: PositionId) -> Result<&PositionRecord> {
        self.records
            .get(id as usize)
            .ok_or_else(|| Error::PositionNotFound(id.to_string()))
    }

    /// Decrement a position's locked amount. Fails without mutation if
    /// `amount` exceeds the remaining locked amount.
    pub fn debit(&mut self, id: PositionId, amount: Amount) -> Result<()> {
        let record = self
            .records
            .get_mut(id as usize)
            .ok_or_else(|| Error::PositionNotFound(id.to_string()))?;

        record.position.locked_amount = record
            .position
            .locked_amount
            .checked_sub(amount)
            .ok_or_else(|| {
                Error::InsufficientLocked(format!(
                    "position {} holds {} but release asked for {}",
                    id, record.position.locked_amount, amount
                ))
            })?;

        Ok(())
    }

    /// Add back a previously debited amount (rollback path only)
    pub fn credit(&mut self, id: PositionId, amount: Amount) -> Result<()> {
        let record = self
            .records
            .get_mut(id as usize)
            .ok_or_else(|| Error::PositionNotFound(id.to_string()))?;

        record.position.locked_amount = record
            .position
            .locked_amount
            .checked_add(amount)
            .ok_or_else(|| {
                Error::Other(format!("locked amount overflow on position {}", id))
            })?;

        Ok(())
    }

    /// Position ids locking `asset`, in insertion order
    pub fn ids_by_locked_asset(&self, asset: &AssetId) -> Vec<PositionId> {
        self.by_locked_asset
            .get(asset)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolve the position a receipt asset is bound to
    pub fn id_by_receipt(&self, receipt: &AssetId) -> Result<PositionId> {
        self.by_receipt
            .get(receipt)
            .copied()
            .ok_or_else(|| Error::PositionNotFound(format!("receipt asset {}", receipt)))
    }
}
