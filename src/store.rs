use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::errors::{LedgerError, Result};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::types::{LoanId, LoanStatus};

/// persistence boundary of the ledger
///
/// Every write is a single unit of work: implementations either apply all of
/// it or none of it. Callers serialize writes per loan.
pub trait LedgerStore {
    fn insert_loan(&mut self, loan: Loan) -> Result<()>;

    fn load_loan(&self, loan_id: LoanId) -> Result<Loan>;

    fn update_loan(&mut self, loan: &Loan) -> Result<()>;

    fn loans_by_borrower(&self, borrower_id: &str) -> Result<Vec<Loan>>;

    fn loans_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>>;

    /// the loan's installments ordered by sequence number
    fn load_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>>;

    /// store a freshly built schedule and move the loan to APPROVED
    fn save_schedule(
        &mut self,
        loan_id: LoanId,
        installments: &[Installment],
        approved_at: DateTime<Utc>,
    ) -> Result<()>;

    /// overwrite the given installments and, if `loan_closed`, move the loan to PAID
    fn save_payment_update(
        &mut self,
        loan_id: LoanId,
        updated: &[Installment],
        loan_closed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
struct LoanRecord {
    loan: Loan,
    installments: Vec<Installment>,
}

/// in-memory store, stages every write and commits only when it is valid
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: HashMap<LoanId, LoanRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, loan_id: LoanId) -> Result<&LoanRecord> {
        self.records
            .get(&loan_id)
            .ok_or(LedgerError::LoanNotFound { loan_id })
    }

    fn collect_loans<F>(&self, predicate: F) -> Vec<Loan>
    where
        F: Fn(&Loan) -> bool,
    {
        let mut loans: Vec<Loan> = self
            .records
            .values()
            .map(|r| &r.loan)
            .filter(|l| predicate(l))
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        loans
    }
}

impl LedgerStore for MemoryStore {
    fn insert_loan(&mut self, loan: Loan) -> Result<()> {
        if self.records.contains_key(&loan.id) {
            return Err(LedgerError::Persistence {
                message: format!("loan {} already exists", loan.id),
            });
        }

        self.records.insert(
            loan.id,
            LoanRecord {
                loan,
                installments: Vec::new(),
            },
        );
        Ok(())
    }

    fn load_loan(&self, loan_id: LoanId) -> Result<Loan> {
        Ok(self.record(loan_id)?.loan.clone())
    }

    fn update_loan(&mut self, loan: &Loan) -> Result<()> {
        let record = self
            .records
            .get_mut(&loan.id)
            .ok_or(LedgerError::LoanNotFound { loan_id: loan.id })?;
        record.loan = loan.clone();
        Ok(())
    }

    fn loans_by_borrower(&self, borrower_id: &str) -> Result<Vec<Loan>> {
        Ok(self.collect_loans(|l| l.is_owned_by(borrower_id)))
    }

    fn loans_by_status(&self, status: LoanStatus) -> Result<Vec<Loan>> {
        Ok(self.collect_loans(|l| l.status == status))
    }

    fn load_installments(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        Ok(self.record(loan_id)?.installments.clone())
    }

    fn save_schedule(
        &mut self,
        loan_id: LoanId,
        installments: &[Installment],
        approved_at: DateTime<Utc>,
    ) -> Result<()> {
        let record = self.record(loan_id)?;

        if !record.installments.is_empty() {
            return Err(LedgerError::Persistence {
                message: format!("loan {} already has a schedule", loan_id),
            });
        }
        if installments.is_empty() {
            return Err(LedgerError::Persistence {
                message: format!("refusing to store an empty schedule for loan {}", loan_id),
            });
        }
        if let Some(stray) = installments.iter().find(|i| i.loan_id != loan_id) {
            return Err(LedgerError::Persistence {
                message: format!(
                    "installment {} belongs to loan {}, not {}",
                    stray.sequence_number, stray.loan_id, loan_id
                ),
            });
        }

        let mut loan = record.loan.clone();
        loan.transition(LoanStatus::Approved, approved_at)?;

        let mut schedule = installments.to_vec();
        schedule.sort_by_key(|i| i.sequence_number);

        self.records.insert(
            loan_id,
            LoanRecord {
                loan,
                installments: schedule,
            },
        );
        Ok(())
    }

    fn save_payment_update(
        &mut self,
        loan_id: LoanId,
        updated: &[Installment],
        loan_closed: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let record = self.record(loan_id)?;
        let mut staged = record.clone();

        for row in updated {
            if row.loan_id != loan_id {
                return Err(LedgerError::Persistence {
                    message: format!(
                        "installment {} belongs to loan {}, not {}",
                        row.sequence_number, row.loan_id, loan_id
                    ),
                });
            }

            let slot = staged
                .installments
                .iter_mut()
                .find(|i| i.sequence_number == row.sequence_number)
                .ok_or_else(|| LedgerError::Persistence {
                    message: format!(
                        "installment {} not found for loan {}",
                        row.sequence_number, loan_id
                    ),
                })?;
            *slot = row.clone();
        }

        if loan_closed {
            staged.loan.transition(LoanStatus::Paid, updated_at)?;
        }

        self.records.insert(loan_id, staged);
        Ok(())
    }
}
