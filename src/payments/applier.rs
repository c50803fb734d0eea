use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::installment::Installment;
use crate::payments::invariants::{settle_dust, validate_payment_amount, validate_sequence};

/// result of applying one payment to a loan's installment plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentOutcome {
    /// the full plan after the payment
    pub installments: Vec<Installment>,
    /// rows the persistence layer must write, in sequence order
    pub changed: Vec<Installment>,
    pub target_sequence: u32,
    pub amount_applied: Money,
    /// principal still owed after this payment
    pub remaining_balance: Money,
    /// new due amount of every later installment, if they were rewritten
    pub redistributed_due: Option<Money>,
    pub cancelled_count: u32,
    pub loan_closed: bool,
}

/// applies payments against an installment plan
///
/// The applier never touches its input: every call works on a copy, so a
/// failed write can be retried by re-reading the plan and applying again.
#[derive(Debug, Clone)]
pub struct PaymentApplier {
    dust_tolerance: Money,
}

impl PaymentApplier {
    pub fn new(dust_tolerance: Money) -> Self {
        Self { dust_tolerance }
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.dust_tolerance)
    }

    /// apply `amount` to the open installment of `installments`
    pub fn apply(
        &self,
        installments: &[Installment],
        amount: Money,
        transaction_id: &str,
    ) -> Result<PaymentOutcome> {
        validate_payment_amount(amount)?;

        if installments.is_empty() {
            return Err(LedgerError::NoInstallmentsFound);
        }
        validate_sequence(installments)?;

        // locate the open installment, summing what was paid up to it
        let mut paid_so_far = Money::ZERO;
        let mut open = None;
        for (idx, installment) in installments.iter().enumerate() {
            paid_so_far += installment.amount_paid;
            if installment.is_pending() {
                open = Some(idx);
                break;
            }
        }
        let idx = open.ok_or(LedgerError::NoOpenInstallment)?;
        let target = &installments[idx];
        let outstanding = installments[0].loan_amount - paid_so_far;

        // rounded dues can overshoot what is left; the balance is always enough
        let minimum = target.amount_due.min(outstanding);
        if amount < minimum {
            return Err(LedgerError::InsufficientPayment {
                minimum,
                provided: amount,
            });
        }

        let raw_remaining = outstanding - amount;
        if raw_remaining < Money::ZERO - self.dust_tolerance {
            return Err(LedgerError::OverpaymentRejected {
                outstanding,
                provided: amount,
            });
        }
        let remaining_balance = settle_dust(raw_remaining, self.dust_tolerance).max(Money::ZERO);

        let later_count = (installments.len() - idx - 1) as u32;
        if later_count == 0 && remaining_balance.is_positive() {
            // nothing left to carry the balance
            return Err(LedgerError::InsufficientPayment {
                minimum: outstanding,
                provided: amount,
            });
        }

        let exact_payoff = amount == target.amount_due;
        let loan_closed = remaining_balance.is_zero();

        let mut updated = installments.to_vec();
        updated[idx].mark_paid(amount, transaction_id.to_string());

        let mut redistributed_due = None;
        let mut cancelled_count = 0;
        if loan_closed {
            for installment in &mut updated[idx + 1..] {
                installment.mark_cancelled();
                cancelled_count += 1;
            }
        } else if !exact_payoff {
            let new_due = remaining_balance.split(later_count);
            for installment in &mut updated[idx + 1..] {
                installment.amount_due = new_due;
            }
            redistributed_due = Some(new_due);
        }

        let changed = if loan_closed || redistributed_due.is_some() {
            updated[idx..].to_vec()
        } else {
            vec![updated[idx].clone()]
        };

        tracing::debug!(
            loan_id = %target.loan_id,
            sequence = target.sequence_number,
            %amount,
            %remaining_balance,
            loan_closed,
            rows = changed.len(),
            "applied payment"
        );

        Ok(PaymentOutcome {
            target_sequence: target.sequence_number,
            installments: updated,
            changed,
            amount_applied: amount,
            remaining_balance,
            redistributed_due,
            cancelled_count,
            loan_closed,
        })
    }
}

impl Default for PaymentApplier {
    fn default() -> Self {
        Self::from_config(&LedgerConfig::default())
    }
}
