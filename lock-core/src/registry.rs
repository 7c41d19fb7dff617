//! Position registry: the lock/release ledger
//!
//! Owns the position store and orchestrates the external asset capabilities
//! around it. Conservation is the governing invariant: a position's locked
//! amount always equals the outstanding supply of its receipt asset.
//!
//! # Atomicity and re-entrancy
//!
//! External capability calls are synchronous and may re-enter the registry,
//! so mutation ordering is security-relevant. The store guard is never held
//! across an external call. `lock` issues every external call first and
//! writes registry state last; `release` commits the locked-amount debit
//! before burning and paying out, and rolls the debit back if an external
//! call then fails. Either way a failed operation leaves the position list
//! and both indexes exactly as they were.

use crate::{
    clock::Clock,
    config::Config,
    metrics::Metrics,
    naming::{receipt_name, receipt_symbol},
    store::{PositionRecord, PositionStore},
    token::{FungibleAsset, ReceiptIssuer, ReceiptToken},
    types::{AccountId, Amount, AssetId, Position, PositionId},
    Error, Result,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// The lock/release ledger
pub struct PositionRegistry {
    /// Position arena and indexes, one logical writer at a time
    store: Mutex<PositionStore>,

    /// Receipt-asset factory
    issuer: Arc<dyn ReceiptIssuer>,

    /// Time source for the release gate
    clock: Arc<dyn Clock>,

    /// Identity the registry custodies funds under
    custody: AccountId,

    /// Configuration
    config: Config,

    /// Metrics collector
    metrics: Metrics,
}

impl PositionRegistry {
    /// Create a registry with an empty store
    pub fn new(config: Config, issuer: Arc<dyn ReceiptIssuer>, clock: Arc<dyn Clock>) -> Self {
        let custody = AccountId::new(config.custody_account.clone());

        Self {
            store: Mutex::new(PositionStore::new()),
            issuer,
            clock,
            custody,
            config,
            metrics: Metrics::default(),
        }
    }

    /// Account the registry custodies funds under
    pub fn custody_account(&self) -> &AccountId {
        &self.custody
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Lock `amount` of `asset` from `caller` until `release_time`.
    ///
    /// Pulls the deposit into custody via the caller's allowance,
    /// instantiates a fresh receipt asset for this position, mints `amount`
    /// of it to the caller, and appends the position. Returns the new dense
    /// position id. All-or-nothing: a refused pull or mint aborts with no
    /// registry state mutation.
    pub fn lock(
        &self,
        caller: &AccountId,
        asset: Arc<dyn FungibleAsset>,
        amount: Amount,
        release_time: i64,
    ) -> Result<PositionId> {
        if amount == 0 {
            return Err(Error::InvalidInput("lock amount must be positive".to_string()));
        }
        if release_time < 0 || release_time >= self.config.limits.max_release_time {
            return Err(Error::InvalidInput(format!(
                "release time {} is not a plausible seconds timestamp",
                release_time
            )));
        }

        // Count read for naming only; the id itself is assigned at append
        let index = self.store.lock().count();
        let name = receipt_name(&self.config.naming.name_template, &asset.name(), index);
        let symbol = receipt_symbol(&self.config.naming.symbol_prefix, &asset.symbol(), index);

        let receipt = self.issuer.create(&name, &symbol, &self.custody)?;

        // Pull the deposit; nothing to undo yet if it is refused
        asset.transfer_from(&self.custody, caller, &self.custody, amount)?;

        if let Err(err) = receipt.mint(&self.custody, caller, amount) {
            // Return the pulled deposit before propagating
            if let Err(refund_err) = asset.transfer(&self.custody, caller, amount) {
                tracing::error!(
                    caller = %caller,
                    asset = %asset.asset_id(),
                    amount,
                    error = %refund_err,
                    "Refund after failed mint also failed"
                );
            }
            return Err(err);
        }

        let record = PositionRecord {
            position: Position {
                locked_asset: asset.asset_id(),
                receipt_asset: receipt.asset_id(),
                locked_amount: amount,
                release_time,
                creator: caller.clone(),
                exists: true,
            },
            locked_token: asset,
            receipt_token: receipt,
        };

        let id = self.store.lock().append(record)?;
        self.metrics.record_lock();

        tracing::info!(
            position_id = id,
            caller = %caller,
            amount,
            release_time,
            "Position locked"
        );

        Ok(id)
    }

    /// Release `amount` of custody back to `caller`, burning the same
    /// amount of the receipt asset from the caller's balance.
    ///
    /// Targets exactly one position, resolved by receipt-asset identity.
    /// Release is gated by receipt ownership plus burn allowance, not by
    /// creator identity. Refused strictly before the position's release
    /// time; there is no expiry after it.
    pub fn release(&self, caller: &AccountId, receipt_asset: &AssetId, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Err(Error::InvalidInput(
                "release amount must be positive".to_string(),
            ));
        }

        let now = self.clock.now();

        // Validate and debit under one guard, then call out with the guard
        // released. The committed debit is what a re-entrant release sees.
        let (id, locked_token, receipt_token) = {
            let mut store = self.store.lock();
            let id = store.id_by_receipt(receipt_asset)?;
            let record = store.get(id)?;

            if !record.position.exists {
                return Err(Error::PositionNotSet(id.to_string()));
            }
            if !record.position.releasable_at(now) {
                return Err(Error::NotYetReleasable(format!(
                    "position {} releases at {}, now {}",
                    id, record.position.release_time, now
                )));
            }

            let locked_token = Arc::clone(&record.locked_token);
            let receipt_token = Arc::clone(&record.receipt_token);

            store.debit(id, amount)?;

            (id, locked_token, receipt_token)
        };

        if let Err(err) = receipt_token.burn_from(&self.custody, caller, amount) {
            self.rollback_release(id, amount, None, caller);
            return Err(err);
        }

        if let Err(err) = locked_token.transfer(&self.custody, caller, amount) {
            // The burn must be treated as not committed: mint it back
            self.rollback_release(id, amount, Some(&receipt_token), caller);
            return Err(err);
        }

        let drained = {
            let store = self.store.lock();
            store.get(id).map(|r| r.position.locked_amount == 0).unwrap_or(false)
        };
        self.metrics.record_release(drained);

        tracing::info!(
            position_id = id,
            caller = %caller,
            amount,
            "Position released"
        );

        Ok(())
    }

    /// Undo a committed debit after an external call failed, restoring the
    /// burned receipts when the burn had already gone through.
    fn rollback_release(
        &self,
        id: PositionId,
        amount: Amount,
        burned: Option<&Arc<dyn ReceiptToken>>,
        caller: &AccountId,
    ) {
        if let Err(err) = self.store.lock().credit(id, amount) {
            tracing::error!(position_id = id, amount, error = %err, "Debit rollback failed");
        }

        if let Some(receipt) = burned {
            if let Err(err) = receipt.mint(&self.custody, caller, amount) {
                tracing::error!(
                    position_id = id,
                    amount,
                    error = %err,
                    "Re-mint of burned receipts failed"
                );
            }
        }

        self.metrics.record_rollback();
        tracing::warn!(position_id = id, amount, "Release rolled back");
    }

    /// Fetch a position record by id
    pub fn position(&self, id: PositionId) -> Result<Position> {
        let store = self.store.lock();
        let record = store.get(id)?;
        if !record.position.exists {
            return Err(Error::PositionNotSet(id.to_string()));
        }
        Ok(record.position.clone())
    }

    /// Number of positions created so far; also the next id to assign
    pub fn position_count(&self) -> u64 {
        self.store.lock().count()
    }

    /// Position ids locking `asset`, in creation order
    pub fn positions_by_locked_asset(&self, asset: &AssetId) -> Vec<PositionId> {
        self.store.lock().ids_by_locked_asset(asset)
    }

    /// Resolve a position by its receipt asset
    pub fn position_by_receipt(&self, receipt_asset: &AssetId) -> Result<PositionId> {
        self.store.lock().id_by_receipt(receipt_asset)
    }

    /// Receipt-asset capability for a position (for allowance grants and
    /// balance queries by holders)
    pub fn receipt_token(&self, id: PositionId) -> Result<Arc<dyn ReceiptToken>> {
        Ok(Arc::clone(&self.store.lock().get(id)?.receipt_token))
    }

    /// Verify conservation for one position: the locked amount must equal
    /// the outstanding receipt supply.
    pub fn check_conservation(&self, id: PositionId) -> Result<bool> {
        let store = self.store.lock();
        let record = store.get(id)?;
        Ok(record.position.locked_amount == record.receipt_token.total_supply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::token::{MemoryIssuer, MemoryToken};

    struct Harness {
        registry: PositionRegistry,
        clock: Arc<ManualClock>,
        asset: Arc<MemoryToken>,
        faucet: AccountId,
        alice: AccountId,
    }

    fn setup() -> Harness {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let registry = PositionRegistry::new(
            Config::default(),
            Arc::new(MemoryIssuer::new()),
            clock.clone(),
        );

        let faucet = AccountId::new("faucet");
        let alice = AccountId::new("alice");
        let asset = Arc::new(MemoryToken::new("Gold", "GLD", faucet.clone()));
        asset.mint(&faucet, &alice, 10_000).unwrap();
        asset
            .approve(&alice, registry.custody_account(), 10_000)
            .unwrap();

        Harness {
            registry,
            clock,
            asset,
            faucet,
            alice,
        }
    }

    fn lock(h: &Harness, amount: Amount, release_time: i64) -> PositionId {
        h.registry
            .lock(&h.alice, h.asset.clone(), amount, release_time)
            .unwrap()
    }

    fn grant_burn(h: &Harness, id: PositionId, amount: Amount) {
        h.registry
            .receipt_token(id)
            .unwrap()
            .approve(&h.alice, h.registry.custody_account(), amount)
            .unwrap();
    }

    #[test]
    fn test_lock_assigns_dense_ids() {
        let h = setup();
        let now = h.clock.now();

        assert_eq!(lock(&h, 100, now + 10), 0);
        assert_eq!(lock(&h, 200, now + 20), 1);
        assert_eq!(lock(&h, 300, now + 30), 2);
        assert_eq!(h.registry.position_count(), 3);

        let ids = h.registry.positions_by_locked_asset(&h.asset.asset_id());
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_lock_mints_receipt_to_caller() {
        let h = setup();
        let id = lock(&h, 1_000, h.clock.now() + 100);

        let position = h.registry.position(id).unwrap();
        assert_eq!(position.locked_amount, 1_000);
        assert_eq!(position.creator, h.alice);
        assert!(position.exists);

        let receipt = h.registry.receipt_token(id).unwrap();
        assert_eq!(receipt.balance_of(&h.alice), 1_000);
        assert_eq!(receipt.total_supply(), 1_000);
        assert_eq!(receipt.asset_id(), position.receipt_asset);

        // Deposit moved into custody
        assert_eq!(h.asset.balance_of(&h.alice), 9_000);
        assert_eq!(h.asset.balance_of(h.registry.custody_account()), 1_000);
    }

    #[test]
    fn test_lock_derives_receipt_naming_from_count() {
        let h = setup();
        let id0 = lock(&h, 10, h.clock.now() + 10);
        let id1 = lock(&h, 10, h.clock.now() + 10);

        let r0 = h.registry.receipt_token(id0).unwrap();
        let r1 = h.registry.receipt_token(id1).unwrap();
        assert_eq!(r0.name(), "Gold Lock 0");
        assert_eq!(r0.symbol(), "GLD-L0");
        assert_eq!(r1.name(), "Gold Lock 1");
        assert_eq!(r1.symbol(), "GLD-L1");
    }

    #[test]
    fn test_lock_rejects_zero_amount() {
        let h = setup();
        let result = h
            .registry
            .lock(&h.alice, h.asset.clone(), 0, h.clock.now() + 10);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(h.registry.position_count(), 0);
    }

    #[test]
    fn test_lock_rejects_millisecond_timestamp() {
        let h = setup();
        let result = h
            .registry
            .lock(&h.alice, h.asset.clone(), 100, 20_000_000_000);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        // Exactly at the cutoff is also refused
        let result = h
            .registry
            .lock(&h.alice, h.asset.clone(), 100, 10_000_000_000);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(h.registry.position_count(), 0);
    }

    #[test]
    fn test_lock_without_allowance_leaves_no_state() {
        let h = setup();
        let bob = AccountId::new("bob");
        h.asset.mint(&h.faucet, &bob, 500).unwrap();

        // Bob never approved the registry
        let result = h
            .registry
            .lock(&bob, h.asset.clone(), 500, h.clock.now() + 10);
        assert!(matches!(result, Err(Error::TransferRefused(_))));
        assert_eq!(h.registry.position_count(), 0);
        assert_eq!(h.asset.balance_of(&bob), 500);
    }

    #[test]
    fn test_release_before_gate_fails() {
        let h = setup();
        let now = h.clock.now();
        let id = lock(&h, 1_000, now + 100);
        grant_burn(&h, id, 1_000);
        let receipt = h.registry.position(id).unwrap().receipt_asset;

        let result = h.registry.release(&h.alice, &receipt, 1_000);
        assert!(matches!(result, Err(Error::NotYetReleasable(_))));
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 1_000);

        // One second early is still refused
        h.clock.advance(99);
        let result = h.registry.release(&h.alice, &receipt, 1);
        assert!(matches!(result, Err(Error::NotYetReleasable(_))));

        // At exactly release_time the gate is open
        h.clock.advance(1);
        h.registry.release(&h.alice, &receipt, 1_000).unwrap();
    }

    #[test]
    fn test_release_full_scenario() {
        let h = setup();
        let now = h.clock.now();
        let id = lock(&h, 1_000, now + 100);
        grant_burn(&h, id, 1_000);
        let receipt_id = h.registry.position(id).unwrap().receipt_asset;
        let receipt = h.registry.receipt_token(id).unwrap();

        h.clock.advance(150);
        h.registry.release(&h.alice, &receipt_id, 1_000).unwrap();

        assert_eq!(receipt.balance_of(&h.alice), 0);
        assert_eq!(receipt.total_supply(), 0);
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 0);
        assert_eq!(h.asset.balance_of(&h.alice), 10_000);
        assert_eq!(h.asset.balance_of(h.registry.custody_account()), 0);

        // Drained position remains queryable
        assert_eq!(h.registry.position_by_receipt(&receipt_id).unwrap(), id);
    }

    #[test]
    fn test_release_peg_invariance() {
        let h = setup();
        let now = h.clock.now();
        let id = lock(&h, 1_000, now + 10);
        grant_burn(&h, id, 1_000);
        let receipt = h.registry.position(id).unwrap().receipt_asset;
        h.clock.advance(10);

        h.registry.release(&h.alice, &receipt, 400).unwrap();
        h.registry.release(&h.alice, &receipt, 300).unwrap();
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 300);
        assert!(h.registry.check_conservation(id).unwrap());

        // Over-release fails and leaves state untouched
        let result = h.registry.release(&h.alice, &receipt, 301);
        assert!(matches!(result, Err(Error::InsufficientLocked(_))));
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 300);
        assert!(h.registry.check_conservation(id).unwrap());
    }

    #[test]
    fn test_release_without_burn_allowance_rolls_back() {
        let h = setup();
        let now = h.clock.now();
        let id = lock(&h, 1_000, now + 10);
        let receipt = h.registry.position(id).unwrap().receipt_asset;
        h.clock.advance(10);

        // No burn allowance granted: the external burn is refused and the
        // committed debit is rolled back
        let result = h.registry.release(&h.alice, &receipt, 500);
        assert!(matches!(result, Err(Error::TransferRefused(_))));
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 1_000);
        assert!(h.registry.check_conservation(id).unwrap());
        assert_eq!(h.registry.metrics().release_rollbacks.get(), 1);
    }

    #[test]
    fn test_release_unknown_receipt() {
        let h = setup();
        let result = h.registry.release(&h.alice, &AssetId::generate(), 1);
        assert!(matches!(result, Err(Error::PositionNotFound(_))));
    }

    #[test]
    fn test_release_rejects_zero_amount() {
        let h = setup();
        let id = lock(&h, 100, h.clock.now() + 1);
        let receipt = h.registry.position(id).unwrap().receipt_asset;

        let result = h.registry.release(&h.alice, &receipt, 0);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_any_receipt_holder_may_release() {
        let h = setup();
        let bob = AccountId::new("bob");
        let now = h.clock.now();
        let id = lock(&h, 1_000, now + 10);
        let receipt = h.registry.receipt_token(id).unwrap();

        // Alice hands her receipts to Bob; Bob, not the creator, releases
        receipt.transfer(&h.alice, &bob, 1_000).unwrap();
        receipt
            .approve(&bob, h.registry.custody_account(), 1_000)
            .unwrap();
        h.clock.advance(10);

        h.registry
            .release(&bob, &receipt.asset_id(), 1_000)
            .unwrap();
        assert_eq!(h.asset.balance_of(&bob), 1_000);
        assert_eq!(h.registry.position(id).unwrap().locked_amount, 0);
    }

    #[test]
    fn test_position_not_found() {
        let h = setup();
        assert!(matches!(
            h.registry.position(0),
            Err(Error::PositionNotFound(_))
        ));
    }

    #[test]
    fn test_conservation_across_mixed_operations() {
        let h = setup();
        let now = h.clock.now();

        let a = lock(&h, 2_000, now + 5);
        let b = lock(&h, 3_000, now + 5);
        grant_burn(&h, a, 2_000);
        grant_burn(&h, b, 3_000);
        h.clock.advance(5);

        let receipt_a = h.registry.position(a).unwrap().receipt_asset;
        let receipt_b = h.registry.position(b).unwrap().receipt_asset;

        h.registry.release(&h.alice, &receipt_a, 500).unwrap();
        h.registry.release(&h.alice, &receipt_b, 3_000).unwrap();
        h.registry.release(&h.alice, &receipt_a, 1_500).unwrap();

        assert!(h.registry.check_conservation(a).unwrap());
        assert!(h.registry.check_conservation(b).unwrap());
        assert_eq!(h.registry.metrics().releases.get(), 3);
    }
}
