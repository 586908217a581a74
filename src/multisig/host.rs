//! Execution host
//!
//! The engine never moves coins itself. On execute it hands the effect to
//! an [`ExecutionHost`], which also receives the wallet as a re-entry
//! handle: a callee may call back into the wallet while the effect runs.

use crate::multisig::engine::MultisigEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors reported by an execution host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Transfer to {to} rejected: {reason}")]
    TransferRejected { to: String, reason: String },
    #[error("Call to {to}.{function} failed: {reason}")]
    CallFailed {
        to: String,
        function: String,
        reason: String,
    },
}

/// Capability to perform the external effect of an executed transaction
pub trait ExecutionHost {
    /// Move `amount` coins from the wallet to `to`
    fn transfer_coins(
        &mut self,
        wallet: &mut MultisigEngine,
        to: &str,
        amount: u64,
    ) -> Result<(), HostError>;

    /// Invoke `function` on `to` with `data`, forwarding `coins`
    fn call(
        &mut self,
        wallet: &mut MultisigEngine,
        to: &str,
        function: &str,
        data: &[u8],
        coins: u64,
    ) -> Result<(), HostError>;
}

/// A call performed through [`LedgerHost`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CallRecord {
    pub to: String,
    pub function: String,
    #[serde(with = "hex")]
    pub data: Vec<u8>,
    pub coins: u64,
}

/// In-process host that books payouts into per-address balances
///
/// Used by the CLI and REST hosts; persisted next to the wallet state.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerHost {
    /// Coins received from the wallet, by address
    balances: BTreeMap<String, u64>,
    /// Calls made, in order
    calls: Vec<CallRecord>,
}

impl LedgerHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coins paid out to `address` so far
    pub fn balance_of(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// All payout balances
    pub fn balances(&self) -> &BTreeMap<String, u64> {
        &self.balances
    }

    /// Calls made so far
    pub fn calls(&self) -> &[CallRecord] {
        &self.calls
    }

    fn credit(&mut self, to: &str, amount: u64) -> Result<(), HostError> {
        let balance = self.balances.entry(to.to_string()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| HostError::TransferRejected {
                to: to.to_string(),
                reason: "recipient balance overflow".to_string(),
            })?;
        Ok(())
    }
}

impl ExecutionHost for LedgerHost {
    fn transfer_coins(
        &mut self,
        _wallet: &mut MultisigEngine,
        to: &str,
        amount: u64,
    ) -> Result<(), HostError> {
        if to.trim().is_empty() {
            return Err(HostError::TransferRejected {
                to: to.to_string(),
                reason: "empty recipient".to_string(),
            });
        }

        self.credit(to, amount)?;
        log::info!("Transferred {} coins to {}", amount, to);
        Ok(())
    }

    fn call(
        &mut self,
        _wallet: &mut MultisigEngine,
        to: &str,
        function: &str,
        data: &[u8],
        coins: u64,
    ) -> Result<(), HostError> {
        if to.trim().is_empty() {
            return Err(HostError::CallFailed {
                to: to.to_string(),
                function: function.to_string(),
                reason: "empty target".to_string(),
            });
        }

        self.credit(to, coins).map_err(|e| HostError::CallFailed {
            to: to.to_string(),
            function: function.to_string(),
            reason: e.to_string(),
        })?;
        self.calls.push(CallRecord {
            to: to.to_string(),
            function: function.to_string(),
            data: data.to_vec(),
            coins,
        });
        log::info!(
            "Called {}.{} with {} byte(s) and {} coins",
            to,
            function,
            data.len(),
            coins
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_credits_recipient() {
        let mut host = LedgerHost::new();
        let mut wallet = MultisigEngine::default();

        host.transfer_coins(&mut wallet, "bob", 40).unwrap();
        host.transfer_coins(&mut wallet, "bob", 2).unwrap();

        assert_eq!(host.balance_of("bob"), 42);
        assert_eq!(host.balance_of("carol"), 0);
        assert!(host.calls().is_empty());
    }

    #[test]
    fn test_call_is_recorded() {
        let mut host = LedgerHost::new();
        let mut wallet = MultisigEngine::default();

        host.call(&mut wallet, "dapp", "receive", &[1, 2, 3], 5)
            .unwrap();

        assert_eq!(host.balance_of("dapp"), 5);
        assert_eq!(host.calls().len(), 1);
        assert_eq!(host.calls()[0].function, "receive");
        assert_eq!(host.calls()[0].data, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let mut host = LedgerHost::new();
        let mut wallet = MultisigEngine::default();

        let result = host.transfer_coins(&mut wallet, "", 1);
        assert!(matches!(result, Err(HostError::TransferRejected { .. })));
        assert!(host.balances().is_empty());
    }
}
