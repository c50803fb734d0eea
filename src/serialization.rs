/// serialization support for loans and their installment plans
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::installment::Installment;
use crate::loan::Loan;
use crate::types::{InstallmentStatus, LoanId, LoanStatus};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// summary of a loan application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    pub loan_id: LoanId,
    pub borrower_id: String,
    pub amount: Money,
    pub installments: u32,
    pub status: LoanStatus,
    pub created_at: String,
}

impl LoanView {
    pub fn from_loan(loan: &Loan) -> Self {
        Self {
            loan_id: loan.id,
            borrower_id: loan.borrower_id.clone(),
            amount: loan.principal,
            installments: loan.tenure_count,
            status: loan.status,
            created_at: loan.created_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallmentView {
    pub installment_number: u32,
    pub amount_due: Money,
    pub amount_paid: Money,
    pub status: InstallmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub due_date: String,
}

impl InstallmentView {
    pub fn from_installment(installment: &Installment) -> Self {
        Self {
            installment_number: installment.sequence_number,
            amount_due: installment.amount_due,
            amount_paid: installment.amount_paid,
            status: installment.status,
            transaction_id: installment.transaction_id.clone(),
            due_date: installment.due_date.format(DATE_FORMAT).to_string(),
        }
    }
}

/// a loan with its repayment plan and what is still owed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanDetailView {
    pub loan_id: LoanId,
    pub loan_amount: Money,
    pub outstanding_amount: Money,
    pub total_installments: usize,
    pub status: LoanStatus,
    pub installments: Vec<InstallmentView>,
}

impl LoanDetailView {
    pub fn from_parts(loan: &Loan, installments: &[Installment]) -> Self {
        let paid: Money = installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.amount_paid)
            .sum();

        Self {
            loan_id: loan.id,
            loan_amount: loan.principal,
            outstanding_amount: (loan.principal - paid).max(Money::ZERO),
            total_installments: installments.len(),
            status: loan.status,
            installments: installments.iter().map(InstallmentView::from_installment).collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::{PaymentApplier, ScheduleBuilder};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_detail_view_tracks_outstanding() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap();
        let mut loan = Loan::apply("user-1".to_string(), Money::from_major(30_000), 3, now).unwrap();
        loan.transition(LoanStatus::Approved, now).unwrap();

        let plan = ScheduleBuilder::default().build_for(&loan, now).unwrap();
        let plan = PaymentApplier::default()
            .apply(&plan, Money::from_major(15_000), "txn-1")
            .unwrap()
            .installments;

        let view = LoanDetailView::from_parts(&loan, &plan);
        assert_eq!(view.outstanding_amount, Money::from_major(15_000));
        assert_eq!(view.total_installments, 3);
        assert_eq!(view.installments[1].amount_due, Money::from_major(7_500));
        assert_eq!(view.installments[0].due_date, "2024-03-04");
        assert_eq!(view.installments[1].due_date, "2024-03-11");

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"outstandingAmount\": \"15000\""));
        assert!(json.contains("\"transactionId\": \"txn-1\""));
        assert!(json.contains("\"status\": \"APPROVED\""));
    }

    #[test]
    fn test_loan_view() {
        let now = Utc.with_ymd_and_hms(2024, 3, 4, 10, 30, 0).unwrap();
        let loan = Loan::apply("user-1".to_string(), Money::from_major(500), 5, now).unwrap();

        let view = LoanView::from_loan(&loan);
        assert_eq!(view.created_at, "2024-03-04 10:30:00");
        assert_eq!(view.status, LoanStatus::Pending);
        assert_eq!(view.installments, 5);
    }
}
