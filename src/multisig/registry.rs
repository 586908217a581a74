//! Owner registry
//!
//! Holds the fixed set of owners and the approval threshold. Both are set
//! exactly once and frozen afterwards.

use crate::crypto::{base58check, hash160};
use crate::multisig::error::MultisigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Version byte for wallet addresses (P2SH-style, starts with '3')
const ADDRESS_VERSION: u8 = 0x05;

/// The set of authorized owners and the M-of-N threshold
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OwnerRegistry {
    /// Unique owner identities, sorted
    owners: BTreeSet<String>,
    /// Minimum approvals required (M); zero while uninitialized
    threshold: usize,
}

impl OwnerRegistry {
    /// Create an empty, uninitialized registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owner set and threshold
    ///
    /// Duplicate identities collapse into a single owner and the threshold
    /// is checked against the unique count.
    ///
    /// # Errors
    /// `AlreadyInitialized` on a second call, `InvalidConfig` if the owner
    /// list is empty, contains an empty identity, or the threshold is not
    /// in `1..=owners`. A failed call leaves the registry untouched.
    pub fn initialize(&mut self, owners: &[String], threshold: usize) -> Result<(), MultisigError> {
        if self.is_initialized() {
            return Err(MultisigError::AlreadyInitialized);
        }

        let unique: BTreeSet<String> = owners.iter().cloned().collect();
        check_config(&unique, threshold)?;

        self.owners = unique;
        self.threshold = threshold;
        Ok(())
    }

    /// Re-check the configuration invariants, e.g. after loading from disk
    pub fn validate(&self) -> Result<(), MultisigError> {
        check_config(&self.owners, self.threshold)
    }

    /// Whether `initialize` has succeeded
    pub fn is_initialized(&self) -> bool {
        !self.owners.is_empty()
    }

    /// Check if an identity is a registered owner
    pub fn is_owner(&self, identity: &str) -> bool {
        self.owners.contains(identity)
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Iterate owners in sorted order
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.owners.iter().map(String::as_str)
    }

    /// Get the owner count (N)
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.owners.len())
    }

    /// Deterministic wallet address for this configuration
    ///
    /// Address = Base58Check(0x05 || RIPEMD160(SHA256(threshold || sorted owners)))
    pub fn address(&self) -> String {
        let mut script_data = (self.threshold as u64).to_le_bytes().to_vec();
        for owner in &self.owners {
            script_data.extend_from_slice(owner.as_bytes());
            script_data.push(0);
        }

        base58check(ADDRESS_VERSION, &hash160(&script_data))
    }
}

fn check_config(owners: &BTreeSet<String>, threshold: usize) -> Result<(), MultisigError> {
    if owners.is_empty() {
        return Err(MultisigError::InvalidConfig(
            "owners required".to_string(),
        ));
    }

    if owners.iter().any(|o| o.trim().is_empty()) {
        return Err(MultisigError::InvalidConfig(
            "owner identity must not be empty".to_string(),
        ));
    }

    if threshold == 0 || threshold > owners.len() {
        return Err(MultisigError::InvalidConfig(format!(
            "threshold {} must be between 1 and {}",
            threshold,
            owners.len()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_initialize() {
        let mut registry = OwnerRegistry::new();
        registry.initialize(&owners(&["alice", "bob", "carol"]), 2).unwrap();

        assert!(registry.is_initialized());
        assert_eq!(registry.threshold(), 2);
        assert_eq!(registry.owner_count(), 3);
        assert_eq!(registry.description(), "2-of-3");
        assert!(registry.is_owner("alice"));
        assert!(registry.is_owner("carol"));
        assert!(!registry.is_owner("mallory"));
    }

    #[test]
    fn test_every_valid_threshold_accepted() {
        let list = owners(&["a", "b", "c", "d"]);
        for threshold in 1..=list.len() {
            let mut registry = OwnerRegistry::new();
            assert!(registry.initialize(&list, threshold).is_ok());
            for owner in &list {
                assert!(registry.is_owner(owner));
            }
        }
    }

    #[test]
    fn test_invalid_config_leaves_no_state() {
        let mut registry = OwnerRegistry::new();

        assert!(matches!(
            registry.initialize(&[], 1),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            registry.initialize(&owners(&["a", "b"]), 0),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            registry.initialize(&owners(&["a", "b"]), 3),
            Err(MultisigError::InvalidConfig(_))
        ));
        assert!(matches!(
            registry.initialize(&owners(&["a", ""]), 1),
            Err(MultisigError::InvalidConfig(_))
        ));

        assert!(!registry.is_initialized());
        assert_eq!(registry.threshold(), 0);
        assert!(!registry.is_owner("a"));
    }

    #[test]
    fn test_validate() {
        let mut registry = OwnerRegistry::new();
        assert!(registry.validate().is_err());

        registry.initialize(&owners(&["a", "b"]), 2).unwrap();
        assert!(registry.validate().is_ok());

        registry.threshold = 0;
        assert!(matches!(
            registry.validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
        registry.threshold = 3;
        assert!(matches!(
            registry.validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_duplicates_collapse() {
        let mut registry = OwnerRegistry::new();

        // Two unique owners cannot carry a threshold of three
        assert!(registry.initialize(&owners(&["a", "a", "b"]), 3).is_err());

        registry.initialize(&owners(&["a", "a", "b"]), 2).unwrap();
        assert_eq!(registry.owner_count(), 2);
    }

    #[test]
    fn test_double_initialize() {
        let mut registry = OwnerRegistry::new();
        registry.initialize(&owners(&["a"]), 1).unwrap();

        let result = registry.initialize(&owners(&["b", "c"]), 1);
        assert_eq!(result, Err(MultisigError::AlreadyInitialized));
        assert!(registry.is_owner("a"));
        assert!(!registry.is_owner("b"));
    }

    #[test]
    fn test_address_determinism() {
        let mut first = OwnerRegistry::new();
        first.initialize(&owners(&["alice", "bob", "carol"]), 2).unwrap();

        let mut reordered = OwnerRegistry::new();
        reordered.initialize(&owners(&["carol", "alice", "bob"]), 2).unwrap();

        let mut other_threshold = OwnerRegistry::new();
        other_threshold.initialize(&owners(&["alice", "bob", "carol"]), 3).unwrap();

        assert!(first.address().starts_with('3'));
        assert_eq!(first.address(), reordered.address());
        assert_ne!(first.address(), other_threshold.address());
    }
}
