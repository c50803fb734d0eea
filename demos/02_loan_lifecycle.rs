/// full lifecycle through the loan service with controlled time
use chrono::{Duration, TimeZone, Utc};
use installment_ledger_rs::{
    Decision, LedgerConfig, LoanService, MemoryStore, Money, PaymentRequest, SafeTimeProvider,
    TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
    ));
    let control = time.test_control().unwrap();

    let mut service = LoanService::new(MemoryStore::new(), LedgerConfig::weekly(), &time)?;

    // borrower applies, admin approves
    let loan = service.apply_for_loan("borrower-42", Money::from_major(12_000), 4)?;
    println!("pending applications: {}", service.pending_loans()?.len());
    service.decide(loan.id, Decision::Approve)?;

    // weekly payments, the second one early and larger
    let payments = [3_000, 5_000, 2_000, 2_000];
    for (week, amount) in payments.iter().enumerate() {
        let request = PaymentRequest::new(
            "borrower-42",
            loan.id,
            Money::from_major(*amount),
            format!("txn-{}", week + 1),
        );
        let outcome = service.process_payment(&request)?;
        println!(
            "week {}: paid {} into #{}, remaining {}",
            week + 1,
            amount,
            outcome.target_sequence,
            outcome.remaining_balance
        );
        if outcome.loan_closed {
            break;
        }
        control.advance(Duration::days(7));
    }

    println!("{}", service.loan_detail("borrower-42", loan.id)?.to_json_pretty()?);
    for event in service.take_events() {
        println!("{:?}", event);
    }

    Ok(())
}
