use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::installment::Installment;
use crate::types::InstallmentStatus;

/// principal must be positive and tenure at least one installment
pub fn validate_terms(principal: Money, tenure: u32) -> Result<()> {
    if !principal.is_positive() || tenure == 0 {
        return Err(LedgerError::InvalidScheduleInput { principal, tenure });
    }
    Ok(())
}

pub fn validate_payment_amount(amount: Money) -> Result<()> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidPaymentAmount { amount });
    }
    Ok(())
}

/// check that a loaded installment list is one loan's plan in processing order
pub fn validate_sequence(installments: &[Installment]) -> Result<()> {
    let Some(first) = installments.first() else {
        return Ok(());
    };

    let mut seen_pending = false;
    for (idx, inst) in installments.iter().enumerate() {
        let expected = idx as u32 + 1;
        if inst.sequence_number != expected {
            return Err(inconsistent(format!(
                "expected installment {} at position {}, found {}",
                expected, idx, inst.sequence_number
            )));
        }

        if inst.loan_id != first.loan_id {
            return Err(inconsistent(format!(
                "installment {} belongs to loan {}, not {}",
                inst.sequence_number, inst.loan_id, first.loan_id
            )));
        }

        if inst.loan_amount != first.loan_amount {
            return Err(inconsistent(format!(
                "installment {} carries loan amount {}, expected {}",
                inst.sequence_number, inst.loan_amount, first.loan_amount
            )));
        }

        if inst.amount_paid.is_positive() && inst.status != InstallmentStatus::Paid {
            return Err(inconsistent(format!(
                "installment {} has {} paid but status {}",
                inst.sequence_number, inst.amount_paid, inst.status
            )));
        }

        // settled installments form a prefix of the plan
        if inst.is_pending() {
            seen_pending = true;
        } else if seen_pending {
            return Err(inconsistent(format!(
                "installment {} is {} after an open installment",
                inst.sequence_number, inst.status
            )));
        }
    }

    Ok(())
}

/// balances within `tolerance` of zero are zero
pub fn settle_dust(balance: Money, tolerance: Money) -> Money {
    if balance.abs() <= tolerance {
        Money::ZERO
    } else {
        balance
    }
}

/// paid plus still-due equals the loan amount, within `tolerance`
///
/// Every rounded share may be off by half a unit in the eighth place, so the
/// check also allows one `Money::DUST` per installment.
pub fn is_balanced(installments: &[Installment], tolerance: Money) -> bool {
    let Some(first) = installments.first() else {
        return true;
    };
    let allowance = tolerance + Money::DUST * Decimal::from(installments.len() as u64);

    let paid: Money = installments.iter().map(|i| i.amount_paid).sum();
    let due: Money = installments
        .iter()
        .filter(|i| i.is_pending())
        .map(|i| i.amount_due)
        .sum();

    (paid + due).approx_eq(first.loan_amount, allowance)
}

fn inconsistent(message: String) -> LedgerError {
    LedgerError::InconsistentSchedule { message }
}
