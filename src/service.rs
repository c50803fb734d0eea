use hourglass_rs::SafeTimeProvider;

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{Event, EventStore};
use crate::installment::Installment;
use crate::loan::Loan;
use crate::payments::invariants::is_balanced;
use crate::payments::{
    AmortizationStrategy, PaymentApplier, PaymentOutcome, PaymentRequest, ScheduleBuilder,
};
use crate::serialization::LoanDetailView;
use crate::store::LedgerStore;
use crate::types::{Decision, LoanId, LoanStatus};

/// loan servicing: applications, admin decisions and repayments
pub struct LoanService<'a, S: LedgerStore> {
    store: S,
    config: LedgerConfig,
    builder: ScheduleBuilder,
    applier: PaymentApplier,
    time: &'a SafeTimeProvider,
    events: EventStore,
}

impl<'a, S: LedgerStore> LoanService<'a, S> {
    pub fn new(store: S, config: LedgerConfig, time: &'a SafeTimeProvider) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            builder: ScheduleBuilder::from_config(&config),
            applier: PaymentApplier::from_config(&config),
            store,
            config,
            time,
            events: EventStore::new(),
        })
    }

    /// swap the amortization policy used at approval
    pub fn with_strategy(mut self, strategy: Box<dyn AmortizationStrategy>) -> Self {
        self.builder = self.builder.with_strategy(strategy);
        self
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    /// submit a new loan application
    pub fn apply_for_loan(
        &mut self,
        borrower_id: &str,
        principal: Money,
        tenure_count: u32,
    ) -> Result<Loan> {
        let now = self.time.now();
        let loan = Loan::apply(borrower_id.to_string(), principal, tenure_count, now)?;
        self.store.insert_loan(loan.clone())?;

        tracing::info!(loan_id = %loan.id, borrower_id, %principal, tenure_count, "loan application created");
        self.events.emit(Event::LoanApplied {
            loan_id: loan.id,
            borrower_id: loan.borrower_id.clone(),
            principal,
            tenure_count,
            timestamp: now,
        });

        Ok(loan)
    }

    /// change the terms of a pending application
    pub fn modify_loan(
        &mut self,
        borrower_id: &str,
        loan_id: LoanId,
        principal: Money,
        tenure_count: u32,
    ) -> Result<Loan> {
        let now = self.time.now();
        let mut loan = self.owned_loan(borrower_id, loan_id)?;
        loan.modify_terms(principal, tenure_count, now)?;
        self.store.update_loan(&loan)?;

        tracing::info!(%loan_id, %principal, tenure_count, "loan application modified");
        self.events.emit(Event::LoanModified {
            loan_id,
            principal,
            tenure_count,
            timestamp: now,
        });

        Ok(loan)
    }

    /// withdraw a pending application
    pub fn cancel_loan(&mut self, borrower_id: &str, loan_id: LoanId) -> Result<Loan> {
        let loan = self.owned_loan(borrower_id, loan_id)?;
        self.change_status(loan, LoanStatus::Cancelled, "cancelled by borrower")
    }

    pub fn loans_for(&self, borrower_id: &str) -> Result<Vec<Loan>> {
        self.store.loans_by_borrower(borrower_id)
    }

    /// applications waiting for an admin decision
    pub fn pending_loans(&self) -> Result<Vec<Loan>> {
        self.store.loans_by_status(LoanStatus::Pending)
    }

    /// approve or reject a pending application
    ///
    /// Approval builds the schedule (first installment due now) and stores it
    /// together with the APPROVED status in one write.
    pub fn decide(&mut self, loan_id: LoanId, decision: Decision) -> Result<Loan> {
        let loan = self.store.load_loan(loan_id)?;

        match decision {
            Decision::Reject => self.change_status(loan, LoanStatus::Rejected, "rejected by admin"),
            Decision::Approve => {
                if !loan.status.can_transition_to(LoanStatus::Approved) {
                    return Err(LedgerError::InvalidStatusTransition {
                        from: loan.status,
                        to: LoanStatus::Approved,
                    });
                }

                let now = self.time.now();
                let schedule = self.builder.build_for(&loan, now)?;
                self.store.save_schedule(loan_id, &schedule, now).map_err(|e| {
                    tracing::error!(%loan_id, error = %e, "failed to store schedule");
                    e
                })?;

                tracing::info!(
                    %loan_id,
                    installments = schedule.len(),
                    "loan approved and schedule stored"
                );
                self.emit_schedule(&schedule);
                self.events.emit(Event::StatusChanged {
                    loan_id,
                    old_status: loan.status,
                    new_status: LoanStatus::Approved,
                    reason: "approved by admin".to_string(),
                    timestamp: now,
                });

                self.store.load_loan(loan_id)
            }
        }
    }

    /// apply a repayment and persist the result atomically
    pub fn process_payment(&mut self, request: &PaymentRequest) -> Result<PaymentOutcome> {
        request.validate()?;
        let now = self.time.now();
        let loan_id = request.loan_id;

        self.owned_loan(&request.borrower_id, loan_id)?;
        let installments = self.store.load_installments(loan_id)?;

        let outcome = match self
            .applier
            .apply(&installments, request.amount, &request.transaction_id)
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(%loan_id, amount = %request.amount, error = %e, "payment rejected");
                self.events.emit(Event::PaymentRejected {
                    loan_id,
                    amount: request.amount,
                    reason: e.to_string(),
                    timestamp: now,
                });
                return Err(e);
            }
        };

        if !is_balanced(&outcome.installments, self.config.dust_tolerance) {
            tracing::error!(%loan_id, "installment plan does not balance against the loan amount");
            return Err(LedgerError::InconsistentSchedule {
                message: format!("installments of loan {} do not add up to its amount", loan_id),
            });
        }

        self.store
            .save_payment_update(loan_id, &outcome.changed, outcome.loan_closed, now)
            .map_err(|e| {
                tracing::error!(%loan_id, error = %e, "failed to store payment");
                e
            })?;

        tracing::info!(
            %loan_id,
            sequence = outcome.target_sequence,
            amount = %request.amount,
            remaining = %outcome.remaining_balance,
            loan_closed = outcome.loan_closed,
            "payment processed"
        );
        self.emit_payment(request, &outcome, now);

        Ok(outcome)
    }

    /// installment listing for a borrower's loan
    pub fn loan_detail(&self, borrower_id: &str, loan_id: LoanId) -> Result<LoanDetailView> {
        let loan = self.owned_loan(borrower_id, loan_id)?;
        let installments = self.store.load_installments(loan_id)?;
        Ok(LoanDetailView::from_parts(&loan, &installments))
    }

    /// a loan that exists and belongs to `borrower_id`
    fn owned_loan(&self, borrower_id: &str, loan_id: LoanId) -> Result<Loan> {
        let loan = self.store.load_loan(loan_id)?;
        if !loan.is_owned_by(borrower_id) {
            return Err(LedgerError::LoanNotFound { loan_id });
        }
        Ok(loan)
    }

    fn change_status(&mut self, mut loan: Loan, next: LoanStatus, reason: &str) -> Result<Loan> {
        let now = self.time.now();
        let old_status = loan.transition(next, now)?;
        self.store.update_loan(&loan)?;

        tracing::info!(loan_id = %loan.id, %old_status, new_status = %next, reason, "loan status changed");
        self.events.emit(Event::StatusChanged {
            loan_id: loan.id,
            old_status,
            new_status: next,
            reason: reason.to_string(),
            timestamp: now,
        });

        Ok(loan)
    }

    fn emit_schedule(&mut self, schedule: &[Installment]) {
        if let (Some(first), Some(last)) = (schedule.first(), schedule.last()) {
            self.events.emit(Event::ScheduleGenerated {
                loan_id: first.loan_id,
                installment_count: schedule.len() as u32,
                installment_amount: first.amount_due,
                first_due: first.due_date.date_naive(),
                last_due: last.due_date.date_naive(),
            });
        }
    }

    fn emit_payment(
        &mut self,
        request: &PaymentRequest,
        outcome: &PaymentOutcome,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        let loan_id = request.loan_id;
        let later = outcome.installments.len() as u32 - outcome.target_sequence;

        self.events.emit(Event::PaymentApplied {
            loan_id,
            sequence_number: outcome.target_sequence,
            amount: outcome.amount_applied,
            transaction_id: request.transaction_id.clone(),
            remaining_balance: outcome.remaining_balance,
            timestamp: now,
        });

        if let Some(new_amount_due) = outcome.redistributed_due {
            self.events.emit(Event::InstallmentsRedistributed {
                loan_id,
                from_sequence: outcome.target_sequence + 1,
                count: later,
                new_amount_due,
            });
        }

        if outcome.cancelled_count > 0 {
            self.events.emit(Event::InstallmentsCancelled {
                loan_id,
                from_sequence: outcome.target_sequence + 1,
                count: outcome.cancelled_count,
            });
        }

        if outcome.loan_closed {
            self.events.emit(Event::LoanClosed {
                loan_id,
                final_payment: outcome.amount_applied,
                timestamp: now,
            });
            self.events.emit(Event::StatusChanged {
                loan_id,
                old_status: LoanStatus::Approved,
                new_status: LoanStatus::Paid,
                reason: "balance fully repaid".to_string(),
                timestamp: now,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::InstallmentStatus;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;

    fn time() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ))
    }

    #[test]
    fn test_application_to_closure() {
        let time = time();
        let control = time.test_control().unwrap();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();

        let loan = service.apply_for_loan("user-1", Money::from_major(30_000), 3).unwrap();
        assert_eq!(service.pending_loans().unwrap().len(), 1);

        let approved = service.decide(loan.id, Decision::Approve).unwrap();
        assert_eq!(approved.status, LoanStatus::Approved);
        assert!(service.pending_loans().unwrap().is_empty());

        let detail = service.loan_detail("user-1", loan.id).unwrap();
        assert_eq!(detail.total_installments, 3);
        assert_eq!(detail.installments[0].due_date, "2024-01-01");
        assert_eq!(detail.installments[2].due_date, "2024-01-15");

        for (week, txn) in ["txn-1", "txn-2", "txn-3"].iter().enumerate() {
            control.advance(Duration::days(7));
            let request = PaymentRequest::new("user-1", loan.id, Money::from_major(10_000), *txn);
            let outcome = service.process_payment(&request).unwrap();
            assert_eq!(outcome.target_sequence, week as u32 + 1);
        }

        let loan = service.store().load_loan(loan.id).unwrap();
        assert_eq!(loan.status, LoanStatus::Paid);
        assert!(service
            .events()
            .iter()
            .any(|e| matches!(e, Event::LoanClosed { .. })));
    }

    #[test]
    fn test_reject_and_cancel() {
        let time = time();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();

        let rejected = service.apply_for_loan("user-1", Money::from_major(1_000), 4).unwrap();
        let rejected = service.decide(rejected.id, Decision::Reject).unwrap();
        assert_eq!(rejected.status, LoanStatus::Rejected);
        assert!(service.store().load_installments(rejected.id).unwrap().is_empty());

        // decisions are one-way
        assert!(matches!(
            service.decide(rejected.id, Decision::Approve),
            Err(LedgerError::InvalidStatusTransition { .. })
        ));

        let cancelled = service.apply_for_loan("user-1", Money::from_major(2_000), 4).unwrap();
        assert!(matches!(
            service.cancel_loan("user-2", cancelled.id),
            Err(LedgerError::LoanNotFound { .. })
        ));
        let cancelled = service.cancel_loan("user-1", cancelled.id).unwrap();
        assert_eq!(cancelled.status, LoanStatus::Cancelled);
        assert_eq!(service.loans_for("user-1").unwrap().len(), 2);
    }

    #[test]
    fn test_modify_pending_only() {
        let time = time();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();

        let loan = service.apply_for_loan("user-1", Money::from_major(1_000), 4).unwrap();
        let loan = service
            .modify_loan("user-1", loan.id, Money::from_major(1_200), 6)
            .unwrap();
        assert_eq!(loan.tenure_count, 6);

        service.decide(loan.id, Decision::Approve).unwrap();
        assert_eq!(service.store().load_installments(loan.id).unwrap().len(), 6);
        assert!(service
            .modify_loan("user-1", loan.id, Money::from_major(5_000), 2)
            .is_err());
    }

    #[test]
    fn test_rejected_payment_changes_nothing() {
        let time = time();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();
        let loan = service.apply_for_loan("user-1", Money::from_major(30_000), 3).unwrap();
        service.decide(loan.id, Decision::Approve).unwrap();
        let before = service.store().load_installments(loan.id).unwrap();

        let short = PaymentRequest::new("user-1", loan.id, Money::from_major(9_999), "txn-1");
        assert!(matches!(
            service.process_payment(&short),
            Err(LedgerError::InsufficientPayment { .. })
        ));

        let too_much = PaymentRequest::new("user-1", loan.id, Money::from_major(30_001), "txn-2");
        assert!(matches!(
            service.process_payment(&too_much),
            Err(LedgerError::OverpaymentRejected { .. })
        ));

        assert_eq!(service.store().load_installments(loan.id).unwrap(), before);
        let rejections = service
            .events()
            .iter()
            .filter(|e| matches!(e, Event::PaymentRejected { .. }))
            .count();
        assert_eq!(rejections, 2);
    }

    #[test]
    fn test_payment_before_approval() {
        let time = time();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();
        let loan = service.apply_for_loan("user-1", Money::from_major(500), 5).unwrap();

        let request = PaymentRequest::new("user-1", loan.id, Money::from_major(100), "txn-1");
        assert_eq!(
            service.process_payment(&request),
            Err(LedgerError::NoInstallmentsFound)
        );
    }

    #[test]
    fn test_early_payoff_cancels_rest() {
        let time = time();
        let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time).unwrap();
        let loan = service.apply_for_loan("user-1", Money::from_major(30_000), 3).unwrap();
        service.decide(loan.id, Decision::Approve).unwrap();
        service.take_events();

        let request = PaymentRequest::new("user-1", loan.id, Money::from_major(30_000), "txn-1");
        let outcome = service.process_payment(&request).unwrap();
        assert!(outcome.loan_closed);

        let plan = service.store().load_installments(loan.id).unwrap();
        assert_eq!(plan[1].status, InstallmentStatus::Cancelled);
        assert_eq!(plan[2].status, InstallmentStatus::Cancelled);

        let events = service.take_events();
        assert!(events.contains(&Event::InstallmentsCancelled {
            loan_id: loan.id,
            from_sequence: 2,
            count: 2,
        }));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let time = time();
        assert!(matches!(
            LoanService::new(MemoryStore::new(), LedgerConfig::with_cadence(0), &time),
            Err(LedgerError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            LoanService::new(MemoryStore::new(), LedgerConfig::with_cadence(u32::MAX), &time),
            Err(LedgerError::InvalidConfiguration { .. })
        ));
    }
}
