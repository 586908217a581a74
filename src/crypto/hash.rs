//! Hashing utilities
//!
//! SHA-256 and RIPEMD-160 helpers used to derive deterministic wallet
//! addresses.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
pub fn double_sha256(data: &[u8]) -> Vec<u8> {
    sha256(&sha256(data))
}

/// RIPEMD-160 of SHA-256
pub fn hash160(data: &[u8]) -> Vec<u8> {
    let mut ripemd = Ripemd160::new();
    ripemd.update(sha256(data));
    ripemd.finalize().to_vec()
}

/// Base58Check encoding: `version || payload || checksum`
///
/// The checksum is the first 4 bytes of the double SHA-256 of
/// `version || payload`.
pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() + 5);
    bytes.push(version);
    bytes.extend_from_slice(payload);

    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum[..4]);

    bs58::encode(bytes).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256() {
        let hash = sha256(b"hello");
        assert_eq!(hash.len(), 32);
        assert_eq!(
            hex::encode(&hash),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_hash160_length() {
        assert_eq!(hash160(b"hello").len(), 20);
    }

    #[test]
    fn test_base58check_roundtrip_checksum() {
        let encoded = base58check(0x05, &[0u8; 20]);
        let decoded = bs58::decode(&encoded).into_vec().unwrap();

        assert_eq!(decoded.len(), 25);
        assert_eq!(decoded[0], 0x05);
        let checksum = double_sha256(&decoded[..21]);
        assert_eq!(&decoded[21..], &checksum[..4]);
        // Version 0x05 yields P2SH-style addresses
        assert!(encoded.starts_with('3'));
    }
}
