use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentStatus, LoanId};

/// one scheduled repayment of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Installment {
    pub loan_id: LoanId,
    /// loan principal, identical on every installment of the loan
    pub loan_amount: Money,
    /// 1-based processing order
    pub sequence_number: u32,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
    pub due_date: DateTime<Utc>,
    pub transaction_id: Option<String>,
}

impl Installment {
    pub fn new(
        loan_id: LoanId,
        loan_amount: Money,
        sequence_number: u32,
        amount_due: Money,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            loan_id,
            loan_amount,
            sequence_number,
            amount_due,
            amount_paid: Money::ZERO,
            status: InstallmentStatus::Pending,
            due_date,
            transaction_id: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// PAID and CANCELLED never change again
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    pub(crate) fn mark_paid(&mut self, amount: Money, transaction_id: String) {
        self.amount_paid = amount;
        self.status = InstallmentStatus::Paid;
        self.transaction_id = Some(transaction_id);
    }

    /// cancelled installments owe nothing
    pub(crate) fn mark_cancelled(&mut self) {
        self.amount_due = Money::ZERO;
        self.status = InstallmentStatus::Cancelled;
    }
}

/// outstanding principal: loan amount minus everything paid so far
pub fn outstanding_balance(installments: &[Installment]) -> Money {
    match installments.first() {
        Some(first) => {
            let paid: Money = installments.iter().map(|i| i.amount_paid).sum();
            (first.loan_amount - paid).max(Money::ZERO)
        }
        None => Money::ZERO,
    }
}

/// the open installment: lowest sequence number still pending
pub fn next_open(installments: &[Installment]) -> Option<&Installment> {
    installments.iter().find(|i| i.is_pending())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn installment(seq: u32, due: i64) -> Installment {
        Installment::new(
            Uuid::nil(),
            Money::from_major(30_000),
            seq,
            Money::from_major(due),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_new_installment_is_pending_and_unpaid() {
        let inst = installment(1, 10_000);
        assert!(inst.is_pending());
        assert_eq!(inst.amount_paid, Money::ZERO);
        assert_eq!(inst.transaction_id, None);
    }

    #[test]
    fn test_outstanding_and_next_open() {
        let mut plan = vec![installment(1, 10_000), installment(2, 10_000), installment(3, 10_000)];
        plan[0].mark_paid(Money::from_major(10_000), "txn-1".to_string());

        assert_eq!(outstanding_balance(&plan), Money::from_major(20_000));
        assert_eq!(next_open(&plan).map(|i| i.sequence_number), Some(2));

        plan[1].mark_paid(Money::from_major(20_000), "txn-2".to_string());
        plan[2].mark_cancelled();
        assert_eq!(outstanding_balance(&plan), Money::ZERO);
        assert!(next_open(&plan).is_none());
        assert!(plan.iter().all(|i| i.is_settled()));
    }
}
