//! Transaction ledger
//!
//! Stores submitted transactions keyed by a dense, sequential id. A
//! transaction is never removed; its only state change is the one-way
//! flip of `executed`.

use crate::multisig::error::MultisigError;
use serde::{Deserialize, Serialize};

/// A proposed transfer of value and/or payload to a target
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    /// Sequential id, starting at 0
    pub id: u64,
    /// Destination principal
    pub to: String,
    /// Amount of coins to move
    pub value: u64,
    /// Opaque payload (hex in JSON)
    #[serde(with = "hex")]
    pub data: Vec<u8>,
    /// Set once, on successful execute
    pub executed: bool,
}

/// Registry of every submitted transaction
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionLedger {
    /// Indexed by id; position and id always agree
    transactions: Vec<Transaction>,
}

impl TransactionLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new pending transaction and return its id
    pub fn submit(&mut self, to: String, value: u64, data: Vec<u8>) -> u64 {
        let id = self.next_id();
        self.transactions.push(Transaction {
            id,
            to,
            value,
            data,
            executed: false,
        });
        id
    }

    /// Get a transaction by id
    pub fn get(&self, id: u64) -> Result<&Transaction, MultisigError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get(index))
            .ok_or(MultisigError::NotFound(id))
    }

    /// Flip `executed` to true
    ///
    /// # Errors
    /// `NotFound` for an unknown id, `AlreadyExecuted` if the flag is
    /// already set.
    pub fn mark_executed(&mut self, id: u64) -> Result<&Transaction, MultisigError> {
        let tx = usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get_mut(index))
            .ok_or(MultisigError::NotFound(id))?;

        if tx.executed {
            return Err(MultisigError::AlreadyExecuted(id));
        }

        tx.executed = true;
        Ok(tx)
    }

    /// Clear `executed` again when the execute that set it fails
    pub(crate) fn revert_executed(&mut self, id: u64) -> Result<(), MultisigError> {
        let tx = usize::try_from(id)
            .ok()
            .and_then(|index| self.transactions.get_mut(index))
            .ok_or(MultisigError::NotFound(id))?;

        tx.executed = false;
        Ok(())
    }

    /// Check that every transaction sits at the position of its id
    pub fn validate(&self) -> Result<(), MultisigError> {
        for (index, tx) in self.transactions.iter().enumerate() {
            if tx.id != index as u64 {
                return Err(MultisigError::InvalidConfig(format!(
                    "transaction at position {} carries id {}",
                    index, tx.id
                )));
            }
        }
        Ok(())
    }

    /// Id the next submit will receive
    pub fn next_id(&self) -> u64 {
        self.transactions.len() as u64
    }

    /// All transactions in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Transactions not yet executed
    pub fn pending(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(|tx| !tx.executed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ledger = TransactionLedger::new();

        assert_eq!(ledger.submit("x".to_string(), 100, vec![]), 0);
        assert_eq!(ledger.submit("y".to_string(), 0, vec![1, 2]), 1);
        assert_eq!(ledger.submit("x".to_string(), 5, vec![]), 2);
        assert_eq!(ledger.next_id(), 3);
        assert!(ledger.validate().is_ok());

        let tx = ledger.get(1).unwrap();
        assert_eq!(tx.to, "y");
        assert_eq!(tx.value, 0);
        assert_eq!(tx.data, vec![1, 2]);
        assert!(!tx.executed);
    }

    #[test]
    fn test_get_missing() {
        let ledger = TransactionLedger::new();
        assert_eq!(ledger.get(0), Err(MultisigError::NotFound(0)));
        assert_eq!(ledger.get(u64::MAX), Err(MultisigError::NotFound(u64::MAX)));
    }

    #[test]
    fn test_mark_executed_once() {
        let mut ledger = TransactionLedger::new();
        let id = ledger.submit("x".to_string(), 10, vec![]);

        assert!(ledger.mark_executed(id).unwrap().executed);
        assert_eq!(
            ledger.mark_executed(id),
            Err(MultisigError::AlreadyExecuted(id))
        );
        assert_eq!(ledger.mark_executed(7), Err(MultisigError::NotFound(7)));
    }

    #[test]
    fn test_revert_executed() {
        let mut ledger = TransactionLedger::new();
        let id = ledger.submit("x".to_string(), 10, vec![]);
        ledger.mark_executed(id).unwrap();

        ledger.revert_executed(id).unwrap();
        assert!(!ledger.get(id).unwrap().executed);
        assert!(ledger.mark_executed(id).is_ok());
        assert_eq!(ledger.revert_executed(3), Err(MultisigError::NotFound(3)));
    }

    #[test]
    fn test_validate_rejects_misplaced_ids() {
        let mut ledger = TransactionLedger::new();
        ledger.submit("a".to_string(), 1, vec![]);
        ledger.submit("b".to_string(), 2, vec![]);
        ledger.transactions[1].id = 5;

        assert!(matches!(
            ledger.validate(),
            Err(MultisigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_pending_filter() {
        let mut ledger = TransactionLedger::new();
        ledger.submit("a".to_string(), 1, vec![]);
        ledger.submit("b".to_string(), 2, vec![]);
        ledger.mark_executed(0).unwrap();

        let pending: Vec<u64> = ledger.pending().map(|tx| tx.id).collect();
        assert_eq!(pending, vec![1]);
    }

    #[test]
    fn test_data_serializes_as_hex() {
        let mut ledger = TransactionLedger::new();
        ledger.submit("x".to_string(), 1, vec![0xde, 0xad]);

        let json = serde_json::to_string(ledger.get(0).unwrap()).unwrap();
        assert!(json.contains("\"data\":\"dead\""));
    }
}
