//! # Transactions
//!
//! All consensus transactions share one envelope, `{ "type": ..., "data": ... }`.
//! Decoding is split in two steps so callers can tell an unknown `type` apart
//! from a payload that does not match its `type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::entities::{Address, LimitMapping, Round, U256};
use crate::errors::EnvelopeError;
use crate::order::Order;

/// Transaction type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TxKind {
    /// User order entering the stream.
    OrderBroadcast,
    /// Witness of an external stake event.
    Stake,
    /// Next period boundaries and quotas.
    Rebalance,
}

impl TxKind {
    /// Wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::OrderBroadcast => "OrderBroadcast",
            TxKind::Stake => "stake",
            TxKind::Rebalance => "rebalance",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OrderBroadcast" => Ok(TxKind::OrderBroadcast),
            "stake" => Ok(TxKind::Stake),
            "rebalance" => Ok(TxKind::Rebalance),
            other => Err(EnvelopeError::UnknownType(other.to_string())),
        }
    }
}

/// Direction of a stake change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeKind {
    /// `StakeMade`
    Add,
    /// `StakeRemoved`
    Remove,
}

/// Witness that a stake event happened on the external chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeWitness {
    /// Staker address.
    pub staker: Address,
    /// Add or remove.
    #[serde(rename = "type")]
    pub kind: StakeKind,
    /// External block the event was recorded in.
    pub block: u64,
    /// Amount staked or unstaked.
    pub amount: U256,
    /// Distinguishes otherwise identical witnesses from different nodes.
    pub nonce: u32,
}

/// Proposal for the next staking period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceProposal {
    /// Next round.
    pub round: Round,
    /// Quotas for the round.
    pub limits: LimitMapping,
}

impl RebalanceProposal {
    /// Sum of all order quotas, saturating.
    pub fn total_order_limit(&self) -> u64 {
        self.limits
            .values()
            .fold(0u64, |acc, l| acc.saturating_add(l.order_limit))
    }
}

/// A typed consensus transaction.
#[derive(Clone, Debug, PartialEq)]
pub enum Transaction {
    /// User order.
    OrderBroadcast(Order),
    /// Stake event witness.
    Stake(StakeWitness),
    /// Period rebalance.
    Rebalance(RebalanceProposal),
}

impl Transaction {
    /// Type tag of this transaction.
    pub fn kind(&self) -> TxKind {
        match self {
            Transaction::OrderBroadcast(_) => TxKind::OrderBroadcast,
            Transaction::Stake(_) => TxKind::Stake,
            Transaction::Rebalance(_) => TxKind::Rebalance,
        }
    }

    /// Wrap into the wire envelope.
    pub fn to_envelope(&self) -> Result<TxEnvelope, serde_json::Error> {
        let data = match self {
            Transaction::OrderBroadcast(order) => serde_json::to_value(order)?,
            Transaction::Stake(witness) => serde_json::to_value(witness)?,
            Transaction::Rebalance(proposal) => serde_json::to_value(proposal)?,
        };
        Ok(TxEnvelope {
            kind: self.kind().as_str().to_string(),
            data,
        })
    }
}

/// Decoded but not yet interpreted wire envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxEnvelope {
    /// Raw type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload.
    #[serde(default)]
    pub data: Value,
}

impl TxEnvelope {
    /// Resolve the type tag.
    pub fn tx_kind(&self) -> Result<TxKind, EnvelopeError> {
        self.kind.parse()
    }

    /// Interpret the payload according to the type tag.
    pub fn into_transaction(self) -> Result<Transaction, EnvelopeError> {
        let kind = self.tx_kind()?;
        let format = |source| EnvelopeError::Format {
            kind: kind.as_str(),
            source,
        };
        match kind {
            TxKind::OrderBroadcast => serde_json::from_value(self.data)
                .map(Transaction::OrderBroadcast)
                .map_err(format),
            TxKind::Stake => serde_json::from_value(self.data)
                .map(Transaction::Stake)
                .map_err(format),
            TxKind::Rebalance => serde_json::from_value(self.data)
                .map(Transaction::Rebalance)
                .map_err(format),
        }
    }
}
