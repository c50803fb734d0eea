use thiserror::Error;

use crate::decimal::Money;
use crate::types::{LoanId, LoanStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("invalid schedule input: principal {principal}, tenure {tenure}")]
    InvalidScheduleInput {
        principal: Money,
        tenure: u32,
    },

    #[error("no installments found for loan")]
    NoInstallmentsFound,

    #[error("loan has no open installment")]
    NoOpenInstallment,

    #[error("insufficient payment: minimum {minimum}, provided {provided}")]
    InsufficientPayment {
        minimum: Money,
        provided: Money,
    },

    #[error("overpayment rejected: outstanding {outstanding}, provided {provided}")]
    OverpaymentRejected {
        outstanding: Money,
        provided: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("inconsistent schedule: {message}")]
    InconsistentSchedule {
        message: String,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidStatusTransition {
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound {
        loan_id: LoanId,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("persistence failure: {message}")]
    Persistence {
        message: String,
    },
}

/// who is responsible for a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// request refused, nothing changed, caller can correct it
    Client,
    /// internal failure, nothing committed
    Server,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::InvalidScheduleInput { .. }
            | LedgerError::InsufficientPayment { .. }
            | LedgerError::OverpaymentRejected { .. }
            | LedgerError::InvalidPaymentAmount { .. }
            | LedgerError::InvalidStatusTransition { .. }
            | LedgerError::NoInstallmentsFound
            | LedgerError::NoOpenInstallment
            | LedgerError::LoanNotFound { .. } => ErrorKind::Client,
            LedgerError::InconsistentSchedule { .. }
            | LedgerError::InvalidConfiguration { .. }
            | LedgerError::Persistence { .. } => ErrorKind::Server,
        }
    }

    /// only transient persistence failures are worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::Persistence { .. })
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
