use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{BorrowerId, LoanId, LoanStatus};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // application events
    LoanApplied {
        loan_id: LoanId,
        borrower_id: BorrowerId,
        principal: Money,
        tenure_count: u32,
        timestamp: DateTime<Utc>,
    },
    LoanModified {
        loan_id: LoanId,
        principal: Money,
        tenure_count: u32,
        timestamp: DateTime<Utc>,
    },

    // schedule events
    ScheduleGenerated {
        loan_id: LoanId,
        installment_count: u32,
        installment_amount: Money,
        first_due: NaiveDate,
        last_due: NaiveDate,
    },

    // payment events
    PaymentApplied {
        loan_id: LoanId,
        sequence_number: u32,
        amount: Money,
        transaction_id: String,
        remaining_balance: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentRejected {
        loan_id: LoanId,
        amount: Money,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    InstallmentsRedistributed {
        loan_id: LoanId,
        from_sequence: u32,
        count: u32,
        new_amount_due: Money,
    },
    InstallmentsCancelled {
        loan_id: LoanId,
        from_sequence: u32,
        count: u32,
    },
    LoanClosed {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },

    // status change events
    StatusChanged {
        loan_id: LoanId,
        old_status: LoanStatus,
        new_status: LoanStatus,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains_store() {
        let mut store = EventStore::new();
        let loan_id = Uuid::new_v4();

        store.emit(Event::InstallmentsCancelled {
            loan_id,
            from_sequence: 2,
            count: 2,
        });
        assert_eq!(store.events().len(), 1);

        let taken = store.take_events();
        assert_eq!(taken.len(), 1);
        assert!(store.events().is_empty());
    }

    #[test]
    fn test_events_serialize() {
        let event = Event::StatusChanged {
            loan_id: Uuid::nil(),
            old_status: LoanStatus::Pending,
            new_status: LoanStatus::Approved,
            reason: "approved by admin".to_string(),
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"new_status\":\"APPROVED\""));
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
