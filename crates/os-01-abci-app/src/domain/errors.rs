//! Transaction rejection reasons.
//!
//! Every rejection carries a stable numeric code reported back to the
//! consensus engine. Code 0 is reserved for acceptance.

use shared_types::Address;
use thiserror::Error;

/// Why a transaction was rejected by `check_tx` or `deliver_tx`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    /// Bytes could not be decompressed or are not an envelope.
    #[error("Bad input (decompression or decoding failed)")]
    Decompress,

    /// Envelope `type` names no known transaction.
    #[error("Unknown transaction type: {0}")]
    UnknownType(String),

    /// Payload does not match the envelope `type`.
    #[error("Malformed {kind} transaction: {detail}")]
    Format {
        /// Transaction type tag.
        kind: &'static str,
        /// Parser message.
        detail: String,
    },

    /// Poster signature missing or unrecoverable.
    #[error("No valid poster signature")]
    NoSigner,

    /// Poster has no quota left in the current period.
    #[error("Poster {0} has no remaining order quota")]
    NoQuota(Address),

    /// Rebalance does not continue the current round.
    #[error("Stale rebalance: expected round {expected}, got {got}")]
    StaleRound {
        /// `current + 1`.
        expected: u64,
        /// Proposed round number.
        got: u64,
    },

    /// Stake event already witnessed.
    #[error("Stake event for {staker} at block {block} already witnessed")]
    DuplicateWitness {
        /// External block of the event.
        block: u64,
        /// Staker of the event.
        staker: Address,
    },

    /// Rebalance window or quotas are inconsistent.
    #[error("Invalid rebalance: {0}")]
    InvalidRebalance(String),
}

impl RejectReason {
    /// Stable response code.
    pub fn code(&self) -> u32 {
        match self {
            RejectReason::Decompress => 1,
            RejectReason::UnknownType(_) => 2,
            RejectReason::Format { .. } => 3,
            RejectReason::NoSigner => 4,
            RejectReason::NoQuota(_) => 5,
            RejectReason::StaleRound { .. } => 6,
            RejectReason::DuplicateWitness { .. } => 7,
            RejectReason::InvalidRebalance(_) => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_and_nonzero() {
        let reasons = [
            RejectReason::Decompress,
            RejectReason::UnknownType("x".into()),
            RejectReason::Format {
                kind: "stake",
                detail: String::new(),
            },
            RejectReason::NoSigner,
            RejectReason::NoQuota(Address::ZERO),
            RejectReason::StaleRound { expected: 1, got: 3 },
            RejectReason::DuplicateWitness {
                block: 1,
                staker: Address::ZERO,
            },
            RejectReason::InvalidRebalance(String::new()),
        ];
        let mut codes: Vec<u32> = reasons.iter().map(RejectReason::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), reasons.len());
        assert!(!codes.contains(&0));
    }
}
