//! Approval table
//!
//! Plain storage of `(transaction id, owner) -> bool` marks. No
//! precondition checks happen here; the engine owns those.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-transaction, per-owner approval marks
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovalTable {
    marks: BTreeMap<u64, BTreeMap<String, bool>>,
}

impl ApprovalTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Write the mark for `(id, owner)`
    pub fn set_approval(&mut self, id: u64, owner: &str, value: bool) {
        self.marks
            .entry(id)
            .or_default()
            .insert(owner.to_string(), value);
    }

    /// Stored mark, or false if absent
    pub fn is_approved(&self, id: u64, owner: &str) -> bool {
        self.marks
            .get(&id)
            .and_then(|by_owner| by_owner.get(owner))
            .copied()
            .unwrap_or(false)
    }

    /// Count the given owners whose mark for `id` is true
    pub fn count_approvals<'a, I>(&self, id: u64, owners: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        owners
            .into_iter()
            .filter(|owner| self.is_approved(id, owner))
            .count()
    }

    /// The given owners whose mark for `id` is true
    pub fn approvers<'a, I>(&self, id: u64, owners: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        owners
            .into_iter()
            .filter(|owner| self.is_approved(id, owner))
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_mark_is_false() {
        let table = ApprovalTable::new();
        assert!(!table.is_approved(0, "alice"));
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut table = ApprovalTable::new();
        table.set_approval(0, "alice", true);
        table.set_approval(0, "alice", true);

        assert!(table.is_approved(0, "alice"));
        assert_eq!(table.count_approvals(0, ["alice", "bob"]), 1);

        table.set_approval(0, "alice", false);
        assert!(!table.is_approved(0, "alice"));
        assert_eq!(table.count_approvals(0, ["alice", "bob"]), 0);
    }

    #[test]
    fn test_count_scopes_to_id_and_owner_set() {
        let mut table = ApprovalTable::new();
        table.set_approval(0, "alice", true);
        table.set_approval(0, "bob", true);
        table.set_approval(1, "carol", true);
        // A mark for someone outside the owner set is not counted
        table.set_approval(0, "mallory", true);

        let owners = ["alice", "bob", "carol"];
        assert_eq!(table.count_approvals(0, owners), 2);
        assert_eq!(table.count_approvals(1, owners), 1);
        assert_eq!(table.count_approvals(2, owners), 0);

        // Iteration order does not matter
        assert_eq!(table.count_approvals(0, ["carol", "bob", "alice"]), 2);
        assert_eq!(table.approvers(0, owners), vec!["alice", "bob"]);
    }
}
