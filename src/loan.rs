use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::payments::invariants::validate_terms;
use crate::types::{BorrowerId, LoanId, LoanStatus};

/// a loan application and its lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower_id: BorrowerId,
    pub principal: Money,
    pub tenure_count: u32,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// create a pending loan application
    pub fn apply(
        borrower_id: BorrowerId,
        principal: Money,
        tenure_count: u32,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_terms(principal, tenure_count)?;

        Ok(Self {
            id: Uuid::new_v4(),
            borrower_id,
            principal,
            tenure_count,
            status: LoanStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_owned_by(&self, borrower_id: &str) -> bool {
        self.borrower_id == borrower_id
    }

    /// move to `next`, rejecting anything outside the transition table
    pub fn transition(&mut self, next: LoanStatus, now: DateTime<Utc>) -> Result<LoanStatus> {
        if !self.status.can_transition_to(next) {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }

        let old = self.status;
        self.status = next;
        self.updated_at = now;
        Ok(old)
    }

    /// change principal and tenure; only while the application is pending
    pub fn modify_terms(
        &mut self,
        principal: Money,
        tenure_count: u32,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status != LoanStatus::Pending {
            return Err(LedgerError::InvalidStatusTransition {
                from: self.status,
                to: LoanStatus::Pending,
            });
        }
        validate_terms(principal, tenure_count)?;

        self.principal = principal;
        self.tenure_count = tenure_count;
        self.updated_at = now;
        Ok(())
    }
}
