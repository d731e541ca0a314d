//! Hex (de)serialization for fixed-size byte arrays.
//!
//! Use with `#[serde(with = "shared_types::serde_hex")]` on `[u8; 32]` fields.

use serde::{de, Deserialize, Deserializer, Serializer};

/// Decode a `0x`-prefixed (or bare) hex string into exactly `N` bytes.
pub fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| format!("invalid hex: {}", e))?;
    if bytes.len() != N {
        return Err(format!("expected {} bytes, got {}", N, bytes.len()));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Serialize a byte array as `0x`-prefixed lowercase hex.
pub fn serialize<S: Serializer, const N: usize>(
    bytes: &[u8; N],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

/// Deserialize a byte array from hex.
pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
    deserializer: D,
) -> Result<[u8; N], D::Error> {
    let s = String::deserialize(deserializer)?;
    decode_fixed::<N>(&s).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_fixed_accepts_prefix() {
        let bytes = decode_fixed::<2>("0xbeef").unwrap();
        assert_eq!(bytes, [0xbe, 0xef]);
    }

    #[test]
    fn test_decode_fixed_length_mismatch() {
        assert!(decode_fixed::<4>("beef").is_err());
    }
}
