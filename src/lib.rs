pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod installment;
pub mod loan;
pub mod payments;
pub mod serialization;
pub mod service;
pub mod store;
pub mod types;

// re-export key types
pub use config::LedgerConfig;
pub use decimal::Money;
pub use errors::{ErrorKind, LedgerError, Result};
pub use events::{Event, EventStore};
pub use installment::Installment;
pub use loan::Loan;
pub use payments::{
    AmortizationStrategy, PaymentApplier, PaymentOutcome, PaymentRequest, ScheduleBuilder,
};
pub use serialization::{InstallmentView, LoanDetailView, LoanView};
pub use service::LoanService;
pub use store::{LedgerStore, MemoryStore};
pub use types::{
    AmortizationMethod, BorrowerId, Decision, InstallmentStatus, LoanId, LoanStatus,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
