//! Authorization engine
//!
//! Orchestrates the owner registry, transaction ledger and approval table.
//! Every operation validates all of its preconditions before touching any
//! store, so a rejected call leaves the wallet exactly as it was.

use crate::multisig::approvals::ApprovalTable;
use crate::multisig::error::MultisigError;
use crate::multisig::events::{Event, EventLog, EventRecord};
use crate::multisig::host::ExecutionHost;
use crate::multisig::ledger::{Transaction, TransactionLedger};
use crate::multisig::registry::OwnerRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entry point invoked on the target in [`EffectMode::Call`]
pub const DEFAULT_CALL_FUNCTION: &str = "receive";

/// How an executed transaction takes effect
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EffectMode {
    /// Move `value` coins to `to`
    #[default]
    Transfer,
    /// Invoke `to` with `data` as argument, forwarding `value`
    Call,
}

impl fmt::Display for EffectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectMode::Transfer => write!(f, "transfer"),
            EffectMode::Call => write!(f, "call"),
        }
    }
}

impl FromStr for EffectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transfer" => Ok(EffectMode::Transfer),
            "call" => Ok(EffectMode::Call),
            other => Err(format!("unknown effect mode '{}' (transfer|call)", other)),
        }
    }
}

/// Deployment configuration of a wallet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Effect performed on execute
    pub effect: EffectMode,
    /// Entry point used in call mode
    pub call_function: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            effect: EffectMode::Transfer,
            call_function: DEFAULT_CALL_FUNCTION.to_string(),
        }
    }
}

/// Lifecycle state of a transaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxState {
    Pending,
    Executed,
}

/// A transaction together with its current approvals
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionStatus {
    pub transaction: Transaction,
    pub state: TxState,
    pub approvals: usize,
    pub threshold: usize,
    pub approved_by: Vec<String>,
}

/// The multisig wallet: three stores plus balance and event journal
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MultisigEngine {
    config: EngineConfig,
    registry: OwnerRegistry,
    ledger: TransactionLedger,
    approvals: ApprovalTable,
    /// Coins held by the wallet
    balance: u64,
    events: EventLog,
}

impl MultisigEngine {
    /// Create an uninitialized wallet
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Create and initialize a wallet in one step
    pub fn with_owners(
        owners: &[String],
        threshold: usize,
        config: EngineConfig,
    ) -> Result<Self, MultisigError> {
        let mut engine = Self::new(config);
        engine.initialize(owners, threshold)?;
        Ok(engine)
    }

    /// Check the invariants of a wallet that was not built through
    /// `initialize`, such as one deserialized from disk
    pub fn validate(&self) -> Result<(), MultisigError> {
        self.registry.validate()?;
        self.ledger.validate()
    }

    /// Set owners and threshold; allowed exactly once
    pub fn initialize(&mut self, owners: &[String], threshold: usize) -> Result<(), MultisigError> {
        self.registry
            .initialize(owners, threshold)
            .inspect_err(|e| log::warn!("Rejected initialize: {}", e))?;

        log::info!(
            "Multisig wallet {} initialized ({}, effect: {})",
            self.registry.address(),
            self.registry.description(),
            self.config.effect
        );
        Ok(())
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Accept incoming coins from anyone
    pub fn receive(&mut self, caller: &str, amount: u64) -> Result<(), MultisigError> {
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(MultisigError::BalanceOverflow(amount))
            .inspect_err(|e| log::warn!("Rejected deposit from {}: {}", caller, e))?;

        self.balance = balance;
        self.events.emit(Event::Deposit {
            caller: caller.to_string(),
            amount,
        });
        log::debug!("Deposit of {} from {}, balance {}", amount, caller, balance);
        Ok(())
    }

    /// Propose a transaction; the submitter does not implicitly approve it
    pub fn submit(
        &mut self,
        caller: &str,
        to: &str,
        value: u64,
        data: Vec<u8>,
    ) -> Result<u64, MultisigError> {
        self.only_owner(caller)
            .inspect_err(|e| log::warn!("Rejected submit: {}", e))?;

        let id = self.ledger.submit(to.to_string(), value, data.clone());
        self.events.emit(Event::Submit {
            id,
            to: to.to_string(),
            value,
            data,
        });

        log::info!("Transaction {} submitted by {}: {} to {}", id, caller, value, to);
        Ok(id)
    }

    /// Record the caller's approval of `id`
    pub fn approve(&mut self, caller: &str, id: u64) -> Result<(), MultisigError> {
        self.check_approve(caller, id)
            .inspect_err(|e| log::warn!("Rejected approve of {} by {}: {}", id, caller, e))?;

        self.approvals.set_approval(id, caller, true);
        self.events.emit(Event::Approve {
            id,
            caller: caller.to_string(),
        });

        log::debug!(
            "Transaction {} approved by {} ({}/{})",
            id,
            caller,
            self.approval_count(id),
            self.registry.threshold()
        );
        Ok(())
    }

    /// Execute `id` once it has enough approvals
    ///
    /// The transaction is marked executed before the host runs the effect,
    /// so a nested execute of the same id from inside the effect fails
    /// with `AlreadyExecuted`. If the host reports an error, this call's
    /// own writes are undone: `id` is pending again and its value is back
    /// in the balance. Operations a nested call committed during the
    /// effect, including other executes, stay committed.
    pub fn execute<H>(&mut self, caller: &str, id: u64, host: &mut H) -> Result<(), MultisigError>
    where
        H: ExecutionHost + ?Sized,
    {
        self.try_execute(caller, id, host)
            .inspect_err(|e| log::warn!("Rejected execute of {} by {}: {}", id, caller, e))
    }

    /// Withdraw the caller's approval of `id`
    pub fn revoke(&mut self, caller: &str, id: u64) -> Result<(), MultisigError> {
        self.check_revoke(caller, id)
            .inspect_err(|e| log::warn!("Rejected revoke of {} by {}: {}", id, caller, e))?;

        self.approvals.set_approval(id, caller, false);
        self.events.emit(Event::Revoke {
            caller: caller.to_string(),
            id,
        });

        log::debug!("Transaction {} approval revoked by {}", id, caller);
        Ok(())
    }

    // ========================================================================
    // Precondition checks
    // ========================================================================

    fn only_owner(&self, caller: &str) -> Result<(), MultisigError> {
        if self.registry.is_owner(caller) {
            Ok(())
        } else {
            Err(MultisigError::Unauthorized(caller.to_string()))
        }
    }

    fn not_executed(&self, id: u64) -> Result<&Transaction, MultisigError> {
        let tx = self.ledger.get(id)?;
        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }
        Ok(tx)
    }

    fn check_approve(&self, caller: &str, id: u64) -> Result<(), MultisigError> {
        self.only_owner(caller)?;
        self.ledger.get(id)?;

        if self.approvals.is_approved(id, caller) {
            return Err(MultisigError::AlreadyApproved {
                id,
                owner: caller.to_string(),
            });
        }

        self.not_executed(id)?;
        Ok(())
    }

    fn check_revoke(&self, caller: &str, id: u64) -> Result<(), MultisigError> {
        self.only_owner(caller)?;
        self.not_executed(id)?;

        if !self.approvals.is_approved(id, caller) {
            return Err(MultisigError::NotApproved {
                id,
                owner: caller.to_string(),
            });
        }
        Ok(())
    }

    fn try_execute<H>(&mut self, caller: &str, id: u64, host: &mut H) -> Result<(), MultisigError>
    where
        H: ExecutionHost + ?Sized,
    {
        self.only_owner(caller)?;
        let value = self.not_executed(id)?.value;

        let have = self.approval_count(id);
        let need = self.registry.threshold();
        if have < need {
            return Err(MultisigError::InsufficientApprovals { have, need });
        }

        if value > self.balance {
            return Err(MultisigError::InsufficientFunds {
                have: self.balance,
                need: value,
            });
        }

        let tx = self.ledger.mark_executed(id)?.clone();
        self.balance -= tx.value;

        let effect = self.config.effect;
        let outcome = match effect {
            EffectMode::Transfer => host.transfer_coins(self, &tx.to, tx.value),
            EffectMode::Call => {
                let function = self.config.call_function.clone();
                host.call(self, &tx.to, &function, &tx.data, tx.value)
            }
        };

        if let Err(e) = outcome {
            self.ledger.revert_executed(id)?;
            self.balance = self.balance.saturating_add(tx.value);
            return Err(MultisigError::EffectFailed(e.to_string()));
        }

        self.events.emit(Event::Execute { id });
        log::info!(
            "Transaction {} executed by {}: {} to {} ({}/{} approvals)",
            id,
            caller,
            tx.value,
            tx.to,
            have,
            need
        );
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Deployment configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Owner set and threshold
    pub fn registry(&self) -> &OwnerRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.registry.is_initialized()
    }

    pub fn is_owner(&self, identity: &str) -> bool {
        self.registry.is_owner(identity)
    }

    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    /// Wallet address derived from the owner configuration
    pub fn address(&self) -> String {
        self.registry.address()
    }

    /// Coins held by the wallet
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Get a transaction by id
    pub fn transaction(&self, id: u64) -> Result<&Transaction, MultisigError> {
        self.ledger.get(id)
    }

    /// All transactions in id order
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.ledger.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.ledger.pending()
    }

    /// Number of transactions ever submitted
    pub fn transaction_count(&self) -> usize {
        self.ledger.next_id() as usize
    }

    /// Owners currently approving `id`, counted over the full owner set
    pub fn approval_count(&self, id: u64) -> usize {
        self.approvals.count_approvals(id, self.registry.owners())
    }

    /// Owners currently approving `id`
    pub fn approvers(&self, id: u64) -> Vec<String> {
        self.approvals.approvers(id, self.registry.owners())
    }

    pub fn is_approved(&self, id: u64, owner: &str) -> bool {
        self.approvals.is_approved(id, owner)
    }

    /// Whether `id` is pending and has reached the threshold
    pub fn is_executable(&self, id: u64) -> bool {
        self.not_executed(id).is_ok() && self.approval_count(id) >= self.registry.threshold()
    }

    /// A transaction with its approval summary
    pub fn status(&self, id: u64) -> Result<TransactionStatus, MultisigError> {
        let transaction = self.ledger.get(id)?.clone();
        let state = if transaction.executed {
            TxState::Executed
        } else {
            TxState::Pending
        };

        Ok(TransactionStatus {
            transaction,
            state,
            approvals: self.approval_count(id),
            threshold: self.registry.threshold(),
            approved_by: self.approvers(id),
        })
    }

    /// Every journaled event
    pub fn events(&self) -> &[EventRecord] {
        self.events.records()
    }

    /// Events with sequence number `>= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.events.since(from)
    }
}
