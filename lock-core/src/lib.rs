//! Lock Core
//!
//! Token-locking accounting engine: deposits of an arbitrary fungible asset
//! are held under a time-based release condition, against a tradeable,
//! burnable receipt asset representing a 1:1 claim on the locked balance.
//!
//! # Architecture
//!
//! - **Position Registry**: the ledger of lock positions, indexed by dense
//!   id and by receipt-asset identity
//! - **Consumed capabilities**: the custodied asset and the receipt asset
//!   are external contracts, reached through traits
//! - **One logical writer**: each lock/release executes as one indivisible
//!   transaction; state mutation ordering defends against re-entrant
//!   capability calls
//!
//! # Invariants
//!
//! - Conservation: locked amount == outstanding receipt supply, per position
//! - Receipt binding: a receipt asset identifies exactly one position, forever
//! - Dense ids: zero-based, assigned strictly in creation order
//! - Time gate: release refused strictly before the release time

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod naming;
pub mod registry;
pub mod store;
pub mod token;
pub mod types;

// Re-exports
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use registry::PositionRegistry;
pub use token::{FungibleAsset, MemoryIssuer, MemoryToken, ReceiptIssuer, ReceiptToken};
pub use types::{AccountId, Amount, AssetId, Position, PositionId};
