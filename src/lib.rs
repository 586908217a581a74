//! Multisig Engine: an M-of-N multi-signature authorization engine in Rust
//!
//! This crate provides:
//! - A fixed owner set with an approval threshold
//! - Sequentially numbered transactions with per-owner approval marks
//! - Threshold-gated, at-most-once execution through an injected host
//! - An ordered, timestamped event journal
//! - JSON persistence with rotating backups
//! - CLI and REST/WebSocket hosts
//!
//! # Example
//!
//! ```rust
//! use multisig_engine::multisig::{EngineConfig, LedgerHost, MultisigEngine, MultisigError};
//!
//! let owners = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
//! let mut wallet = MultisigEngine::with_owners(&owners, 2, EngineConfig::default()).unwrap();
//! wallet.receive("funder", 100).unwrap();
//!
//! let id = wallet.submit("alice", "xavier", 100, vec![]).unwrap();
//! wallet.approve("alice", id).unwrap();
//!
//! let mut host = LedgerHost::new();
//! assert!(matches!(
//!     wallet.execute("alice", id, &mut host),
//!     Err(MultisigError::InsufficientApprovals { have: 1, need: 2 })
//! ));
//!
//! wallet.approve("bob", id).unwrap();
//! wallet.execute("alice", id, &mut host).unwrap();
//! assert_eq!(host.balance_of("xavier"), 100);
//! ```

pub mod api;
pub mod cli;
pub mod crypto;
pub mod multisig;
pub mod storage;

// Re-export commonly used types
pub use api::{create_router, ApiState};
pub use multisig::{
    EffectMode, EngineConfig, Event, ExecutionHost, LedgerHost, MultisigEngine, MultisigError,
    Transaction,
};
pub use storage::{Storage, StorageConfig, WalletState};
