//! Cryptographic utilities
//!
//! Only hashing lives here; the engine performs no signature verification.

pub mod hash;

pub use hash::{base58check, double_sha256, hash160, sha256};
