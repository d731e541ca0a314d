//! # Transaction Codec
//!
//! Wire format: JSON envelope compressed as a single zstd frame.
//!
//! ```text
//! Transaction ──to_envelope──→ {type, data} ──serde_json──→ zstd ──→ bytes
//! ```
//!
//! Decoding stops at the envelope; type dispatch is left to the caller so a
//! decode failure, an unknown type and a malformed payload stay distinct.

use crate::errors::CodecError;
use crate::transaction::{Transaction, TxEnvelope};

/// Upper bound on a decompressed envelope.
pub const MAX_DECODED_TX_BYTES: usize = 1024 * 1024;

/// zstd level used for outgoing transactions.
pub const COMPRESSION_LEVEL: i32 = 3;

/// Encode a transaction for the wire.
pub fn encode(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
    let envelope = tx.to_envelope().map_err(CodecError::Serialize)?;
    encode_envelope(&envelope)
}

/// Encode an already-built envelope.
pub fn encode_envelope(envelope: &TxEnvelope) -> Result<Vec<u8>, CodecError> {
    let json = serde_json::to_vec(envelope).map_err(CodecError::Serialize)?;
    zstd::bulk::compress(&json, COMPRESSION_LEVEL).map_err(CodecError::Compress)
}

/// Decode wire bytes into an envelope.
pub fn decode(bytes: &[u8]) -> Result<TxEnvelope, CodecError> {
    let json =
        zstd::bulk::decompress(bytes, MAX_DECODED_TX_BYTES).map_err(CodecError::Decompress)?;
    serde_json::from_slice(&json).map_err(CodecError::Envelope)
}

/// Decode wire bytes straight into a typed transaction.
///
/// Convenience for tooling; consensus paths use [`decode`] and dispatch
/// themselves.
pub fn decode_transaction(bytes: &[u8]) -> Result<Transaction, DecodeTransactionError> {
    let envelope = decode(bytes)?;
    Ok(envelope.into_transaction()?)
}

/// Either step of [`decode_transaction`] failing.
#[derive(Debug, thiserror::Error)]
pub enum DecodeTransactionError {
    /// Wire bytes were not an envelope.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// Envelope did not hold a known, well-formed transaction.
    #[error(transparent)]
    Envelope(#[from] crate::errors::EnvelopeError),
}
