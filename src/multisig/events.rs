//! Domain events emitted by the wallet
//!
//! Events are appended to an ordered journal that audit and monitoring
//! collaborators read back (CLI `events`, REST `/api/events`, WebSocket).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observable wallet event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Event {
    /// Incoming coins not tied to a transaction
    Deposit { caller: String, amount: u64 },
    /// A transaction was submitted
    Submit {
        id: u64,
        to: String,
        value: u64,
        #[serde(with = "hex")]
        data: Vec<u8>,
    },
    /// An owner approved a transaction
    Approve { id: u64, caller: String },
    /// A transaction was executed
    Execute { id: u64 },
    /// An owner withdrew an approval
    Revoke { caller: String, id: u64 },
}

impl Event {
    /// Event name as shown to operators
    pub fn name(&self) -> &'static str {
        match self {
            Event::Deposit { .. } => "Deposit",
            Event::Submit { .. } => "Submit",
            Event::Approve { .. } => "Approve",
            Event::Execute { .. } => "Execute",
            Event::Revoke { .. } => "Revoke",
        }
    }
}

/// A journaled event
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Position in the journal, starting at 0
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

/// Append-only journal of events
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its record
    pub fn emit(&mut self, event: Event) -> &EventRecord {
        let record = EventRecord {
            sequence: self.records.len() as u64,
            timestamp: Utc::now(),
            event,
        };
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// All records in emission order
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Records with `sequence >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_numbers() {
        let mut log = EventLog::new();
        log.emit(Event::Execute { id: 0 });
        log.emit(Event::Execute { id: 1 });

        assert_eq!(log.len(), 2);
        assert_eq!(log.records()[1].sequence, 1);
        assert_eq!(log.since(1).len(), 1);
        assert!(log.since(5).is_empty());
    }

    #[test]
    fn test_event_serialization() {
        let event = Event::Submit {
            id: 4,
            to: "bob".to_string(),
            value: 100,
            data: vec![0xca, 0xfe],
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Submit\""));
        assert!(json.contains("\"data\":\"cafe\""));

        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.name(), "Submit");
    }
}
