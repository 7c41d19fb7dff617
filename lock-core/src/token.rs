//! Consumed asset capabilities
//!
//! The registry never reimplements token accounting; it consumes the
//! custodied asset and the receipt asset through the traits below. Caller
//! identity is an explicit parameter on every call since there is no
//! ambient sender.
//!
//! `MemoryToken` and `MemoryIssuer` are the in-process reference
//! implementations, used both as test doubles and as the default in-memory
//! deployment path.

use crate::{
    types::{AccountId, Amount, AssetId},
    Error, Result,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Externally-defined fungible asset (balances, transfers, allowances)
pub trait FungibleAsset: Send + Sync {
    /// Asset contract identity
    fn asset_id(&self) -> AssetId;

    /// Human-readable name (used only for receipt naming)
    fn name(&self) -> String;

    /// Ticker symbol (used only for receipt naming)
    fn symbol(&self) -> String;

    /// Balance of `owner`
    fn balance_of(&self, owner: &AccountId) -> Amount;

    /// Remaining allowance from `owner` to `spender`
    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Set allowance from `owner` to `spender`
    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()>;

    /// Move `amount` from `from` to `to`
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance
    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()>;
}

/// Receipt asset: a fungible asset with minter-gated mint and
/// allowance-gated burn
pub trait ReceiptToken: FungibleAsset {
    /// Total outstanding supply
    fn total_supply(&self) -> Amount;

    /// Mint `amount` to `to`; refused unless `minter` is the authority
    /// fixed at construction
    fn mint(&self, minter: &AccountId, to: &AccountId, amount: Amount) -> Result<()>;

    /// Burn `amount` from `owner`, spending `owner`'s allowance to `spender`
    fn burn_from(&self, spender: &AccountId, owner: &AccountId, amount: Amount) -> Result<()>;
}

/// Factory for receipt assets, one per lock position
pub trait ReceiptIssuer: Send + Sync {
    /// Instantiate a fresh receipt asset with `minter` as its mint authority
    fn create(&self, name: &str, symbol: &str, minter: &AccountId)
        -> Result<Arc<dyn ReceiptToken>>;
}

/// Mutable token books
#[derive(Debug, Default)]
struct TokenState {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_supply: Amount,
}

/// In-memory fungible asset
pub struct MemoryToken {
    id: AssetId,
    name: String,
    symbol: String,
    minter: AccountId,
    state: RwLock<TokenState>,
}

impl MemoryToken {
    /// Create an empty token with `minter` as its mint authority
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, minter: AccountId) -> Self {
        Self {
            id: AssetId::generate(),
            name: name.into(),
            symbol: symbol.into(),
            minter,
            state: RwLock::new(TokenState::default()),
        }
    }
}

impl FungibleAsset for MemoryToken {
    fn asset_id(&self) -> AssetId {
        self.id
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn symbol(&self) -> String {
        self.symbol.clone()
    }

    fn balance_of(&self, owner: &AccountId) -> Amount {
        self.state.read().balances.get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &AccountId, spender: &AccountId) -> Amount {
        self.state
            .read()
            .allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&self, owner: &AccountId, spender: &AccountId, amount: Amount) -> Result<()> {
        self.state
            .write()
            .allowances
            .insert((owner.clone(), spender.clone()), amount);
        Ok(())
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write();
        Self::move_balance(&mut state, from, to, amount)
    }

    fn transfer_from(
        &self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let mut state = self.state.write();

        let key = (from.clone(), spender.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or(0);
        let remaining = allowed.checked_sub(amount).ok_or_else(|| {
            Error::TransferRefused(format!(
                "allowance {} from {} to {} is below {}",
                allowed, from, spender, amount
            ))
        })?;

        Self::move_balance(&mut state, from, to, amount)?;
        state.allowances.insert(key, remaining);

        Ok(())
    }
}

impl MemoryToken {
    fn move_balance(
        state: &mut TokenState,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<()> {
        let from_balance = state.balances.get(from).copied().unwrap_or(0);
        let from_remaining = from_balance.checked_sub(amount).ok_or_else(|| {
            Error::TransferRefused(format!(
                "balance {} of {} is below {}",
                from_balance, from, amount
            ))
        })?;
        let to_balance = state.balances.get(to).copied().unwrap_or(0);
        let to_updated = to_balance
            .checked_add(amount)
            .ok_or_else(|| Error::TransferRefused(format!("balance overflow for {}", to)))?;

        state.balances.insert(from.clone(), from_remaining);
        state.balances.insert(to.clone(), to_updated);

        Ok(())
    }
}

impl ReceiptToken for MemoryToken {
    fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    fn mint(&self, minter: &AccountId, to: &AccountId, amount: Amount) -> Result<()> {
        if *minter != self.minter {
            return Err(Error::TransferRefused(format!(
                "{} is not the mint authority of {}",
                minter, self.id
            )));
        }

        let mut state = self.state.write();
        let supply = state
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| Error::TransferRefused(format!("supply overflow for {}", self.id)))?;
        let balance = state.balances.get(to).copied().unwrap_or(0);
        let updated = balance
            .checked_add(amount)
            .ok_or_else(|| Error::TransferRefused(format!("balance overflow for {}", to)))?;

        state.total_supply = supply;
        state.balances.insert(to.clone(), updated);

        Ok(())
    }

    fn burn_from(&self, spender: &AccountId, owner: &AccountId, amount: Amount) -> Result<()> {
        let mut state = self.state.write();

        let key = (owner.clone(), spender.clone());
        let allowed = state.allowances.get(&key).copied().unwrap_or(0);
        let remaining_allowance = allowed.checked_sub(amount).ok_or_else(|| {
            Error::TransferRefused(format!(
                "burn allowance {} from {} to {} is below {}",
                allowed, owner, spender, amount
            ))
        })?;

        let balance = state.balances.get(owner).copied().unwrap_or(0);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            Error::TransferRefused(format!(
                "balance {} of {} is below burn amount {}",
                balance, owner, amount
            ))
        })?;

        state.balances.insert(owner.clone(), remaining);
        state.allowances.insert(key, remaining_allowance);
        // Supply cannot underflow here: balances never exceed total supply
        state.total_supply -= amount;

        Ok(())
    }
}

/// In-memory receipt-asset factory
#[derive(Debug, Default, Clone)]
pub struct MemoryIssuer;

impl MemoryIssuer {
    /// Create a new issuer
    pub fn new() -> Self {
        Self
    }
}

impl ReceiptIssuer for MemoryIssuer {
    fn create(
        &self,
        name: &str,
        symbol: &str,
        minter: &AccountId,
    ) -> Result<Arc<dyn ReceiptToken>> {
        let token = MemoryToken::new(name, symbol, minter.clone());

        tracing::debug!(
            asset_id = %token.asset_id(),
            name,
            symbol,
            minter = %minter,
            "Receipt asset created"
        );

        Ok(Arc::new(token))
    }
}
