//! # Error Types
//!
//! Errors raised by the shared primitives: address parsing, order signature
//! handling and the transaction codec.

use thiserror::Error;

/// Errors parsing an account address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Wrong number of hex digits.
    #[error("Invalid address length: {0} hex digits, expected 40")]
    InvalidLength(usize),

    /// Not a hex string.
    #[error("Invalid address hex: {0}")]
    InvalidHex(String),
}

/// Errors from order signing and poster recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Order carries no poster signature.
    #[error("Order has no poster signature")]
    MissingSignature,

    /// Recovery ID outside 0, 1, 27 or 28.
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// r/s do not form a valid secp256k1 signature.
    #[error("Malformed poster signature")]
    MalformedSignature,

    /// Public key recovery failed.
    #[error("Failed to recover poster")]
    RecoveryFailed,

    /// Signing with the supplied key failed.
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    /// Canonical encoding of the order failed.
    #[error("Order encoding failed: {0}")]
    Encoding(String),
}

/// Errors from the transaction wire codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Envelope could not be serialized.
    #[error("Failed to serialize envelope: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Compression failed.
    #[error("Compression failed: {0}")]
    Compress(#[source] std::io::Error),

    /// Bytes are not a valid compressed frame (or exceed the size cap).
    #[error("Decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// Decompressed bytes are not an envelope.
    #[error("Malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),
}

/// Errors interpreting a decoded envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The `type` tag names no known transaction.
    #[error("Unknown transaction type: {0}")]
    UnknownType(String),

    /// The `data` payload does not match the tagged type.
    #[error("Malformed {kind} payload: {source}")]
    Format {
        /// Tag of the transaction being parsed.
        kind: &'static str,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
