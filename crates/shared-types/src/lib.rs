//! # Shared Types Crate
//!
//! Domain entities, the transaction envelope and the primitives every
//! OrderStream subsystem agrees on.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: transaction formats live here so the ABCI
//!   application and the stake rebalancer cannot drift apart.
//! - **Deterministic Encoding**: ordered maps and fixed field order
//!   everywhere a value feeds a hash or a consensus transaction.
//!
//! ## Module Structure
//!
//! ```text
//! shared-types/
//! ├── entities.rs     # Address, OrderId, Round, Limit
//! ├── balances.rs     # Stake balance update rule
//! ├── order.rs        # Signed orders, poster recovery
//! ├── transaction.rs  # Envelope and typed transactions
//! ├── codec.rs        # zstd wire codec
//! ├── hashing.rs      # Keccak-256, StateHasher
//! └── errors.rs
//! ```

pub mod balances;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod hashing;
pub mod order;
pub mod serde_hex;
pub mod transaction;

pub use balances::{apply_stake_change, BalanceChange};
pub use entities::*;
pub use errors::*;
pub use hashing::{keccak256, StateHasher};
pub use order::{address_from_key, Order, PosterSignature, TaggedOrder};
pub use transaction::{
    RebalanceProposal, StakeKind, StakeWitness, Transaction, TxEnvelope, TxKind,
};
