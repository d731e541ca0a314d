//! # Orders
//!
//! An order is an opaque maker payload plus the poster's secp256k1
//! signature. The poster is recovered Ethereum-style: the signature is over
//! the Keccak-256 digest of the canonical unsigned order, and the address is
//! the last 20 bytes of the Keccak-256 of the uncompressed public key.
//!
//! Canonical encoding is compact JSON with struct fields in declaration
//! order and maker values sorted by key.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entities::{Address, Hash, OrderId};
use crate::errors::OrderError;
use crate::hashing::keccak256;

/// Ethereum-style recoverable signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterSignature {
    /// Recovery byte (27/28, or raw 0/1).
    pub v: u8,
    /// R component.
    #[serde(with = "crate::serde_hex")]
    pub r: [u8; 32],
    /// S component.
    #[serde(with = "crate::serde_hex")]
    pub s: [u8; 32],
}

/// A signed order as submitted by a poster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Settlement contract the order targets.
    pub sub_contract: Address,
    /// Order maker.
    pub maker: Address,
    /// Opaque maker payload; never interpreted by the node.
    #[serde(default)]
    pub maker_values: Map<String, Value>,
    /// Poster signature over the unsigned order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_signature: Option<PosterSignature>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedOrder<'a> {
    sub_contract: &'a Address,
    maker: &'a Address,
    maker_values: &'a Map<String, Value>,
}

impl Order {
    /// New unsigned order.
    pub fn new(sub_contract: Address, maker: Address, maker_values: Map<String, Value>) -> Self {
        Self {
            sub_contract,
            maker,
            maker_values,
            poster_signature: None,
        }
    }

    /// Digest the poster signs.
    pub fn poster_digest(&self) -> Result<Hash, OrderError> {
        let unsigned = UnsignedOrder {
            sub_contract: &self.sub_contract,
            maker: &self.maker,
            maker_values: &self.maker_values,
        };
        let bytes =
            serde_json::to_vec(&unsigned).map_err(|e| OrderError::Encoding(e.to_string()))?;
        Ok(keccak256(&bytes))
    }

    /// Canonical bytes of the full order, signature included.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, OrderError> {
        serde_json::to_vec(self).map_err(|e| OrderError::Encoding(e.to_string()))
    }

    /// Content hash of the order.
    pub fn order_id(&self) -> Result<OrderId, OrderError> {
        Ok(OrderId(keccak256(&self.canonical_bytes()?)))
    }

    /// Sign as poster with `key`, replacing any existing signature.
    pub fn sign(mut self, key: &SigningKey) -> Result<Self, OrderError> {
        let digest = self.poster_digest()?;
        let (sig, recid) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| OrderError::SigningFailed(e.to_string()))?;

        let sig_bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&sig_bytes[..32]);
        s.copy_from_slice(&sig_bytes[32..]);

        self.poster_signature = Some(PosterSignature {
            v: recid.to_byte() + 27,
            r,
            s,
        });
        Ok(self)
    }

    /// Recover the poster's address from the signature.
    pub fn recover_poster(&self) -> Result<Address, OrderError> {
        let signature = self
            .poster_signature
            .as_ref()
            .ok_or(OrderError::MissingSignature)?;
        let digest = self.poster_digest()?;

        let recovery_id = parse_recovery_id(signature.v)?;

        let mut sig_bytes = [0u8; 64];
        sig_bytes[..32].copy_from_slice(&signature.r);
        sig_bytes[32..].copy_from_slice(&signature.s);
        let sig = Signature::from_slice(&sig_bytes).map_err(|_| OrderError::MalformedSignature)?;

        let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
            .map_err(|_| OrderError::RecoveryFailed)?;

        Ok(address_from_key(&key))
    }
}

/// Ethereum address of a public key.
pub fn address_from_key(key: &VerifyingKey) -> Address {
    let encoded = key.to_encoded_point(false);
    // Skip the 0x04 uncompressed-point prefix
    let hash = keccak256(&encoded.as_bytes()[1..]);
    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}

fn parse_recovery_id(v: u8) -> Result<RecoveryId, OrderError> {
    let normalized = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(OrderError::InvalidRecoveryId(v)),
    };
    RecoveryId::from_byte(normalized).ok_or(OrderError::InvalidRecoveryId(v))
}

/// An accepted order tagged with its ID, as handed to subscribers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaggedOrder {
    /// The order as posted.
    #[serde(flatten)]
    pub order: Order,
    /// Content hash assigned at delivery.
    pub id: OrderId,
    /// Recovered poster.
    pub poster: Address,
}
