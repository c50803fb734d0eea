use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::fmt;

use crate::config::{LedgerConfig, MAX_TENURE};
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::payments::invariants::validate_terms;
use crate::types::{AmortizationMethod, LoanId};

/// divides a principal into per-installment amounts
///
/// Implementations must return exactly `tenure` amounts. Inputs are already
/// validated (`principal > 0`, `tenure >= 1`) when this is called.
pub trait AmortizationStrategy: fmt::Debug + Send + Sync {
    fn split(&self, principal: Money, tenure: u32) -> Vec<Money>;
}

impl AmortizationStrategy for AmortizationMethod {
    fn split(&self, principal: Money, tenure: u32) -> Vec<Money> {
        let share = principal.split(tenure);

        match self {
            AmortizationMethod::EqualSplit => vec![share; tenure as usize],
            AmortizationMethod::EqualSplitLastAdjusted => {
                let mut amounts = vec![share; tenure as usize];
                let leading = share * Decimal::from(tenure - 1);
                if let Some(last) = amounts.last_mut() {
                    *last = principal - leading;
                }
                amounts
            }
        }
    }
}

/// turns an approved loan into its installment plan
#[derive(Debug)]
pub struct ScheduleBuilder {
    strategy: Box<dyn AmortizationStrategy>,
    cadence: Duration,
    max_tenure: Option<u32>,
}

impl ScheduleBuilder {
    /// weekly cadence with the given split method
    pub fn new(method: AmortizationMethod) -> Self {
        Self {
            strategy: Box::new(method),
            cadence: Duration::days(7),
            max_tenure: None,
        }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self {
            strategy: Box::new(config.amortization_method),
            cadence: Duration::days(config.cadence_days as i64),
            max_tenure: config.max_tenure,
        }
    }

    /// replace the split policy without touching the rest of the builder
    pub fn with_strategy(mut self, strategy: Box<dyn AmortizationStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    /// build `tenure` pending installments, the first due on `base_date`
    pub fn build(
        &self,
        loan_id: LoanId,
        principal: Money,
        tenure: u32,
        base_date: DateTime<Utc>,
    ) -> Result<Vec<Installment>> {
        validate_terms(principal, tenure)?;

        let limit = self.max_tenure.unwrap_or(MAX_TENURE).min(MAX_TENURE);
        if tenure > limit {
            return Err(LedgerError::InvalidScheduleInput { principal, tenure });
        }

        let amounts = self.strategy.split(principal, tenure);
        if amounts.len() != tenure as usize {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "amortization strategy produced {} amounts for tenure {}",
                    amounts.len(),
                    tenure
                ),
            });
        }

        let mut installments = Vec::with_capacity(amounts.len());
        let mut due_date = base_date;
        for (sequence_number, amount_due) in (1..=tenure).zip(amounts) {
            if sequence_number > 1 {
                due_date = due_date
                    .checked_add_signed(self.cadence)
                    .ok_or(LedgerError::InvalidScheduleInput { principal, tenure })?;
            }
            installments.push(Installment::new(
                loan_id,
                principal,
                sequence_number,
                amount_due,
                due_date,
            ));
        }

        tracing::debug!(%loan_id, %principal, tenure, "built installment schedule");

        Ok(installments)
    }

    /// schedule for a loan's current terms
    pub fn build_for(&self, loan: &Loan, base_date: DateTime<Utc>) -> Result<Vec<Installment>> {
        self.build(loan.id, loan.principal, loan.tenure_count, base_date)
    }
}

impl Default for ScheduleBuilder {
    fn default() -> Self {
        Self::new(AmortizationMethod::EqualSplit)
    }
}
