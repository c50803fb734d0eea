/// quick start - build a schedule and make one payment
use installment_ledger_rs::payments::{PaymentApplier, ScheduleBuilder};
use installment_ledger_rs::{chrono::Utc, AmortizationMethod, Money, Uuid};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 30,000 repaid over 3 weekly installments
    let builder = ScheduleBuilder::new(AmortizationMethod::EqualSplit);
    let plan = builder.build(Uuid::new_v4(), Money::from_major(30_000), 3, Utc::now())?;

    for installment in &plan {
        println!(
            "#{} due {} on {}",
            installment.sequence_number,
            installment.amount_due,
            installment.due_date.format("%Y-%m-%d")
        );
    }

    // pay the first installment exactly
    let outcome = PaymentApplier::default().apply(&plan, Money::from_major(10_000), "txn-1")?;
    println!("{}", serde_json::to_string_pretty(&outcome.changed)?);
    println!("remaining balance: {}", outcome.remaining_balance);

    Ok(())
}
