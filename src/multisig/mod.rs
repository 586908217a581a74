//! M-of-N multi-signature authorization
//!
//! A fixed set of owners jointly authorizes transactions: any owner may
//! submit, each owner approves or revokes independently, and once the
//! number of approving owners reaches the threshold any owner may execute.
//!
//! # Example
//!
//! ```
//! use multisig_engine::multisig::{EngineConfig, LedgerHost, MultisigEngine};
//!
//! let owners = vec!["alice".to_string(), "bob".to_string(), "carol".to_string()];
//! let mut wallet = MultisigEngine::with_owners(&owners, 2, EngineConfig::default()).unwrap();
//! wallet.receive("funder", 500).unwrap();
//!
//! let id = wallet.submit("alice", "dave", 100, vec![]).unwrap();
//! wallet.approve("alice", id).unwrap();
//! wallet.approve("bob", id).unwrap();
//!
//! let mut host = LedgerHost::new();
//! wallet.execute("carol", id, &mut host).unwrap();
//! assert_eq!(host.balance_of("dave"), 100);
//! ```

pub mod approvals;
pub mod engine;
pub mod error;
pub mod events;
pub mod host;
pub mod ledger;
pub mod registry;

pub use approvals::ApprovalTable;
pub use engine::{EffectMode, EngineConfig, MultisigEngine, TransactionStatus, TxState};
pub use error::MultisigError;
pub use events::{Event, EventLog, EventRecord};
pub use host::{CallRecord, ExecutionHost, HostError, LedgerHost};
pub use ledger::{Transaction, TransactionLedger};
pub use registry::OwnerRegistry;
