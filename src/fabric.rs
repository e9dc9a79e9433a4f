//! Compressed fabric identifier derivation
//!
//! A fabric is named on the wire by an 8-byte identifier derived from its
//! root public key and 64-bit fabric id, so that routing and lookup never
//! need the full key. The derivation is pure and deterministic: HKDF-SHA256
//! with the key's 64 coordinate bytes as input key material, the big-endian
//! fabric id as salt and a fixed context string as info, truncated to
//! 8 bytes. There is no independent lifecycle; the value is always
//! recomputed, never persisted as a source of truth.

use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;

/// HKDF info string for compressed-fabric-id derivation
pub const COMPRESSED_FABRIC_INFO: &[u8] = b"CompressedFabric";

/// Errors from compressed-fabric-id derivation
///
/// Both are precondition failures; no cryptography runs before the inputs
/// pass these checks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FabricError {
    /// Fabric id 0 is reserved and never names a real fabric
    #[error("fabric id 0 is reserved")]
    InvalidFabricId,

    /// The key is neither a 65-byte uncompressed point nor a bare 64-byte
    /// coordinate pair
    #[error("invalid root public key: expected 65 bytes with 0x04 prefix, or 64 coordinate bytes")]
    InvalidRootPublicKey,

    /// HKDF expansion failed
    #[error("key derivation failed: {0}")]
    Derivation(String),
}

/// Derive the 8-byte compressed fabric id for `(root_public_key, fabric_id)`
///
/// `root_public_key` is either a 65-byte uncompressed elliptic-curve point
/// (`0x04` prefix + X + Y) or the bare 64-byte coordinate pair; both forms
/// yield the same result.
pub fn compressed_fabric_id(root_public_key: &[u8], fabric_id: u64) -> Result<[u8; 8], FabricError> {
    if fabric_id == 0 {
        return Err(FabricError::InvalidFabricId);
    }
    let coordinates: &[u8] = match root_public_key.len() {
        65 if root_public_key[0] == 0x04 => &root_public_key[1..],
        64 => root_public_key,
        _ => return Err(FabricError::InvalidRootPublicKey),
    };

    let salt = fabric_id.to_be_bytes();
    let hkdf = Hkdf::<Sha256>::new(Some(&salt), coordinates);
    let mut out = [0u8; 8];
    hkdf.expand(COMPRESSED_FABRIC_INFO, &mut out)
        .map_err(|e| FabricError::Derivation(format!("HKDF expansion failed: {}", e)))?;
    Ok(out)
}

/// Same derivation for callers holding a fixed-size uncompressed point,
/// e.g. one pulled out of a root certificate
pub fn compressed_fabric_id_from_cert(
    root_public_key: &[u8; 65],
    fabric_id: u64,
) -> Result<[u8; 8], FabricError> {
    compressed_fabric_id(root_public_key, fabric_id)
}

/// Big-endian integer form of a compressed fabric id, as used in logs and
/// lookup keys
pub fn compressed_fabric_id_u64(id: [u8; 8]) -> u64 {
    u64::from_be_bytes(id)
}
