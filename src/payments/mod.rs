pub mod amortization;
pub mod applier;
pub mod invariants;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{BorrowerId, LoanId};

pub use amortization::{AmortizationStrategy, ScheduleBuilder};
pub use applier::{PaymentApplier, PaymentOutcome};

/// payment request as received from the service layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub borrower_id: BorrowerId,
    pub loan_id: LoanId,
    pub amount: Money,
    /// opaque reference, already checked for idempotency by the caller
    pub transaction_id: String,
}

impl PaymentRequest {
    pub fn new(
        borrower_id: impl Into<BorrowerId>,
        loan_id: LoanId,
        amount: Money,
        transaction_id: impl Into<String>,
    ) -> Self {
        Self {
            borrower_id: borrower_id.into(),
            loan_id,
            amount,
            transaction_id: transaction_id.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        invariants::validate_payment_amount(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LedgerError;
    use uuid::Uuid;

    #[test]
    fn test_payment_request_validation() {
        let loan_id = Uuid::new_v4();

        let ok = PaymentRequest::new("user-1", loan_id, Money::from_major(200), "txn-1");
        assert!(ok.validate().is_ok());
        assert_eq!(ok.borrower_id, "user-1");

        let zero = PaymentRequest::new("user-1", loan_id, Money::ZERO, "txn-2");
        assert!(matches!(
            zero.validate(),
            Err(LedgerError::InvalidPaymentAmount { .. })
        ));
    }
}
