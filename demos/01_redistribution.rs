/// overpaying an installment spreads the remainder over the rest of the plan
use installment_ledger_rs::payments::{PaymentApplier, ScheduleBuilder};
use installment_ledger_rs::{chrono::Utc, Money, Uuid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let applier = PaymentApplier::default();
    let plan = ScheduleBuilder::default().build(Uuid::new_v4(), Money::from_major(30_000), 3, Utc::now())?;

    // 15,000 against a 10,000 installment leaves 7,500 for each remaining one
    let outcome = applier.apply(&plan, Money::from_major(15_000), "txn-1")?;
    println!("after first payment:");
    print_plan(&outcome.installments);

    // anything below the open installment is refused
    if let Err(e) = applier.apply(&outcome.installments, Money::from_major(7_000), "txn-2") {
        println!("rejected: {} ({:?})", e, e.kind());
    }

    // paying everything that is left closes the loan
    let closed = applier.apply(&outcome.installments, outcome.remaining_balance, "txn-3")?;
    println!("after payoff (closed = {}):", closed.loan_closed);
    print_plan(&closed.installments);

    Ok(())
}

fn print_plan(plan: &[installment_ledger_rs::Installment]) {
    for i in plan {
        println!(
            "  #{} {:?} due {} paid {}",
            i.sequence_number, i.status, i.amount_due, i.amount_paid
        );
    }
}
