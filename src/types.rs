use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// opaque identifier of the borrower who owns a loan
pub type BorrowerId = String;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    /// application submitted, awaiting admin decision
    Pending,
    /// approved, repayment schedule exists
    Approved,
    /// declined by admin
    Rejected,
    /// withdrawn by the borrower before a decision
    Cancelled,
    /// balance fully retired
    Paid,
}

impl LoanStatus {
    /// whether `self -> next` is a legal transition
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Pending, Approved) | (Pending, Rejected) | (Pending, Cancelled) | (Approved, Paid)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoanStatus::Rejected | LoanStatus::Cancelled | LoanStatus::Paid
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoanStatus::Pending => "PENDING",
            LoanStatus::Approved => "APPROVED",
            LoanStatus::Rejected => "REJECTED",
            LoanStatus::Cancelled => "CANCELLED",
            LoanStatus::Paid => "PAID",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    /// moot after the loan was paid off early
    Cancelled,
}

impl InstallmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "PENDING",
            InstallmentStatus::Paid => "PAID",
            InstallmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// how a principal is divided into installment amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmortizationMethod {
    /// principal / tenure for every installment, no rounding correction
    EqualSplit,
    /// equal split, last installment absorbs the rounding residue
    EqualSplitLastAdjusted,
}

/// admin decision on a pending loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Reject,
}
