//! # Core Domain Entities
//!
//! Identifiers and value types shared by the ABCI application and the
//! stake rebalancer.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `OrderId`, `Hash`
//! - **Periods**: `Round`, `Limit`, `LimitMapping`
//!
//! Addresses travel as lowercase `0x`-prefixed hex strings on the wire, so
//! every node renders the same staker identically in transaction payloads and
//! in the state hash.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::AddressError;

// Re-export U256 from primitive-types for stake amounts
pub use primitive_types::{U256, U512};

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style account address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Take the low 20 bytes of a 32-byte word (ABI-encoded address).
    pub fn from_word(word: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&word[12..]);
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() != 40 {
            return Err(AddressError::InvalidLength(digits.len()));
        }
        let decoded = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Content hash of an order, assigned once at `deliverTx`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct OrderId(pub Hash);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderId({})", self)
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = crate::serde_hex::decode_fixed::<32>(&s).map_err(de::Error::custom)?;
        Ok(OrderId(bytes))
    }
}

// =============================================================================
// STAKING PERIODS
// =============================================================================

/// A staking period over the external chain's block height axis.
///
/// Round 0 is the pre-genesis state; the first accepted rebalance moves the
/// network to round 1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    /// Incremental period counter.
    pub number: u64,
    /// First external block of the period.
    pub starts_at: u64,
    /// External block at which the period ends.
    pub ends_at: u64,
    /// Total orders accepted across all stakers in the period.
    pub limit: u64,
}

impl Round {
    /// Build the round following `number`, starting at `starts_at`.
    pub fn next(number: u64, starts_at: u64, period_length: u64, limit: u64) -> Self {
        Self {
            number: number + 1,
            starts_at,
            ends_at: starts_at.saturating_add(period_length),
            limit,
        }
    }

    /// Number of external blocks covered by the round.
    pub fn length(&self) -> u64 {
        self.ends_at.saturating_sub(self.starts_at)
    }
}

/// Per-staker quota for one period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limit {
    /// Orders the staker may post during the period.
    pub order_limit: u64,
    /// Concurrent order streams; always 1 for now.
    pub stream_limit: u64,
}

/// Staker address to quota mapping, ordered for deterministic encoding.
pub type LimitMapping = BTreeMap<Address, Limit>;

/// Staker address to staked amount, ordered for deterministic encoding.
pub type BalanceMapping = BTreeMap<Address, U256>;
