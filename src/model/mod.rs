//! Types that represent the core data model, such as `Transaction`, `Category` and `Period`.
mod amount;
mod category;
mod period;
mod summary;
mod transaction;

pub use amount::{Amount, AmountError};
pub use category::{categories_for, Category};
pub use period::{Period, PeriodCursor};
pub use summary::{CategorySummary, History, MonthlyItem, TransactionSummary};
pub use transaction::{NewTransaction, Transaction, TransactionType};
