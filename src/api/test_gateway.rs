//! Implements the `Gateway` trait using in-memory data for testing purposes.
//!
//! Note: this is compiled even in the "production" version of this app so that we can run the whole
//! app, top-to-bottom, without a finance API server. Delays and failures can be injected per
//! operation so that races between requests can be reproduced deterministically.

use crate::api::{Gateway, ListFilter};
use crate::model::{
    Amount, Category, CategorySummary, MonthlyItem, NewTransaction, Period, Transaction,
    TransactionSummary, TransactionType,
};
use crate::utils::lock;
use crate::Result;
use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{trace, warn};
use uuid::Uuid;

/// The owner of every seeded and created transaction.
pub const TEST_USER_ID: &str = "test-user";

/// The gateway operations, used to target injected delays and failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Summary,
    History,
    Delete,
    Create,
    Categories,
}

#[derive(Debug, Default)]
struct Data {
    categories: Vec<Category>,
    transactions: Vec<Transaction>,
}

/// An implementation of the `Gateway` trait that does not use the network. It holds its data in
/// memory. `Default` starts out empty, while `seeded` fills it with a few months of transactions.
#[derive(Debug, Default)]
pub struct TestGateway {
    data: Mutex<Data>,
    delays: Mutex<HashMap<(Operation, Option<Period>), Duration>>,
    failures: Mutex<HashSet<Operation>>,
}

impl TestGateway {
    pub fn new(categories: Vec<Category>, transactions: Vec<Transaction>) -> Self {
        Self {
            data: Mutex::new(Data {
                categories,
                transactions,
            }),
            delays: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashSet::new()),
        }
    }

    /// Creates a gateway seeded with the module's data, with the most recent seeded month being
    /// `latest`.
    pub fn seeded(latest: Period) -> Self {
        let categories = seed_categories();
        let transactions = seed_transactions(&categories, latest);
        Self::new(categories, transactions)
    }

    /// Seeds the gateway so that its most recent month is the current month.
    pub fn seeded_now() -> Self {
        Self::seeded(Period::current())
    }

    /// Delays every call to `operation` by `delay`.
    pub fn set_delay(&self, operation: Operation, delay: Duration) {
        lock(&self.delays).insert((operation, None), delay);
    }

    /// Delays calls to `operation` for `period` by `delay`. This takes precedence over a delay set
    /// with `set_delay`.
    pub fn set_period_delay(&self, operation: Operation, period: Period, delay: Duration) {
        lock(&self.delays).insert((operation, Some(period)), delay);
    }

    /// Makes every call to `operation` fail until `recover` is called.
    pub fn fail(&self, operation: Operation) {
        lock(&self.failures).insert(operation);
    }

    pub fn recover(&self, operation: Operation) {
        lock(&self.failures).remove(&operation);
    }

    /// A snapshot of all stored transactions.
    pub fn transactions(&self) -> Vec<Transaction> {
        lock(&self.data).transactions.clone()
    }

    pub fn insert(&self, transaction: Transaction) {
        lock(&self.data).transactions.push(transaction);
    }

    /// Waits out the injected delay, then fails if `operation` is marked as failing.
    async fn simulate(&self, operation: Operation, period: Option<Period>) -> Result<()> {
        let delay = {
            let delays = lock(&self.delays);
            period
                .and_then(|p| delays.get(&(operation, Some(p))))
                .or_else(|| delays.get(&(operation, None)))
                .copied()
        };
        if let Some(delay) = delay {
            trace!("Delaying {operation:?} by {delay:?}");
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failures).contains(&operation) {
            bail!("Simulated failure of {operation:?}");
        }
        Ok(())
    }

    fn in_period(&self, period: Period) -> Vec<Transaction> {
        lock(&self.data)
            .transactions
            .iter()
            .filter(|t| period.contains(t.date().date_naive()))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl Gateway for TestGateway {
    async fn list_transactions(&self, filter: &ListFilter) -> Result<Vec<Transaction>> {
        let period = Period::new(filter.month(), filter.year())?;
        self.simulate(Operation::List, Some(period)).await?;
        let mut transactions: Vec<Transaction> = self
            .in_period(period)
            .into_iter()
            .filter(|t| filter.category_id().map_or(true, |c| t.category_id() == c))
            .filter(|t| {
                filter
                    .transaction_type()
                    .map_or(true, |tt| t.transaction_type() == tt)
            })
            .collect();
        // Newest first, like the real API.
        transactions.sort_by(|a, b| b.date().cmp(a.date()));
        Ok(transactions)
    }

    async fn summary(&self, period: Period) -> Result<TransactionSummary> {
        self.simulate(Operation::Summary, Some(period)).await?;
        Ok(summarize(&self.in_period(period)))
    }

    async fn history(&self, period: Period, months: u32) -> Result<Vec<MonthlyItem>> {
        self.simulate(Operation::History, Some(period)).await?;
        let mut periods = vec![period];
        for _ in 1..months {
            if let Some(oldest) = periods.last() {
                periods.push(oldest.previous());
            }
        }
        periods.reverse();
        Ok(periods
            .into_iter()
            .map(|p| {
                let (income, expense) = totals(&self.in_period(p));
                MonthlyItem::new(label(p), income, expense)
            })
            .collect())
    }

    async fn delete_transaction(&self, id: &str) -> Result<()> {
        self.simulate(Operation::Delete, None).await?;
        let mut data = lock(&self.data);
        let before = data.transactions.len();
        data.transactions.retain(|t| t.id() != id);
        if data.transactions.len() == before {
            bail!("Transaction not found: {id}");
        }
        Ok(())
    }

    async fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction> {
        self.simulate(Operation::Create, None).await?;
        let mut data = lock(&self.data);
        let category = data
            .categories
            .iter()
            .find(|c| c.id() == new.category_id())
            .cloned()
            .with_context(|| format!("Category not found: {}", new.category_id()))?;
        let date = new.date().and_time(midday()).and_utc();
        let transaction = Transaction::new(
            Uuid::new_v4().to_string(),
            TEST_USER_ID,
            new.description(),
            new.amount(),
            date,
            category,
        );
        data.transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        self.simulate(Operation::Categories, None).await?;
        Ok(lock(&self.data).categories.clone())
    }
}

fn midday() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default()
}

/// Chart label of a month, e.g. `mar/25`.
fn label(period: Period) -> String {
    let abbr: String = period
        .month_name()
        .to_lowercase()
        .chars()
        .take(3)
        .collect();
    format!("{abbr}/{:02}", period.year().rem_euclid(100))
}

fn totals(transactions: &[Transaction]) -> (Amount, Amount) {
    transactions
        .iter()
        .fold((Amount::ZERO, Amount::ZERO), |(inc, exp), t| {
            match t.transaction_type() {
                TransactionType::Income => (inc + t.amount(), exp),
                TransactionType::Expense => (inc, exp + t.amount()),
            }
        })
}

fn summarize(transactions: &[Transaction]) -> TransactionSummary {
    let (incomes, expenses) = totals(transactions);
    let mut by_category: Vec<CategorySummary> = Vec::new();
    for t in transactions
        .iter()
        .filter(|t| t.transaction_type() == TransactionType::Expense)
    {
        match by_category
            .iter_mut()
            .find(|c| c.category_id() == t.category_id())
        {
            Some(existing) => {
                *existing = CategorySummary::new(
                    existing.category_id(),
                    existing.category_name(),
                    existing.category_color(),
                    existing.amount() + t.amount(),
                );
            }
            None => {
                let (name, color) = t
                    .category()
                    .map(|c| (c.name().to_string(), c.color().to_string()))
                    .unwrap_or_default();
                by_category.push(CategorySummary::new(t.category_id(), name, color, t.amount()));
            }
        }
    }
    by_category.retain(|c| !c.amount().is_zero());
    by_category.sort_by(|a, b| b.amount().cmp(&a.amount()));
    TransactionSummary::new(incomes, expenses, by_category)
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    id: String,
    name: String,
    color: String,
    #[serde(rename = "type")]
    category_type: TransactionType,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    id: String,
    months_ago: u32,
    day: u32,
    description: String,
    amount: String,
    category_id: String,
}

fn seed_categories() -> Vec<Category> {
    read_records::<CategoryRecord>(CATEGORY_DATA)
        .into_iter()
        .map(|r| Category::new(r.id, r.name, r.color, r.category_type))
        .collect()
}

fn seed_transactions(categories: &[Category], latest: Period) -> Vec<Transaction> {
    read_records::<TransactionRecord>(TRANSACTION_DATA)
        .into_iter()
        .filter_map(|r| match seed_transaction(categories, latest, &r) {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("Skipping seed transaction {}: {e:#}", r.id);
                None
            }
        })
        .collect()
}

fn seed_transaction(
    categories: &[Category],
    latest: Period,
    record: &TransactionRecord,
) -> Result<Transaction> {
    let mut period = latest;
    for _ in 0..record.months_ago {
        period = period.previous();
    }
    let date = NaiveDate::from_ymd_opt(period.year(), period.month(), record.day)
        .with_context(|| format!("Invalid day {} in {period}", record.day))?
        .and_time(midday())
        .and_utc();
    let category = categories
        .iter()
        .find(|c| c.id() == record.category_id)
        .cloned()
        .with_context(|| format!("Unknown category {}", record.category_id))?;
    let amount = Amount::from_str(&record.amount)?;
    Ok(Transaction::new(
        &record.id,
        TEST_USER_ID,
        &record.description,
        amount,
        date,
        category,
    ))
}

/// Reads CSV rows with a header into `T`, skipping rows that do not parse.
fn read_records<T>(csv_data: &str) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(csv_data.as_bytes()));
    rdr.deserialize()
        .filter_map(|result| match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping an unreadable seed row: {e}");
                None
            }
        })
        .collect()
}

/// Seed category data.
const CATEGORY_DATA: &str = r##"id,name,color,type
c1,Salário,#22C55E,income
c2,Freelance,#10B981,income
c3,Alimentação,#EF4444,expense
c4,Transporte,#F59E0B,expense
c5,Lazer,#8B5CF6,expense
c6,Moradia,#3B82F6,expense
"##;

/// Seed transaction data. `months_ago` counts back from the most recent seeded month.
const TRANSACTION_DATA: &str = r##"id,months_ago,day,description,amount,category_id
t01,0,5,Salário,5000.00,c1
t02,0,6,Aluguel,1800.00,c6
t03,0,8,Almoço,35.90,c3
t04,0,10,Uber,23.50,c4
t05,0,12,Cinema,60.00,c5
t06,0,15,Supermercado,412.37,c3
t07,0,20,Projeto freelance,1200.00,c2
t08,1,5,Salário,5000.00,c1
t09,1,6,Aluguel,1800.00,c6
t10,1,9,Almoço,42.00,c3
t11,1,18,Gasolina,250.00,c4
t12,2,5,Salário,5000.00,c1
t13,2,6,Aluguel,1800.00,c6
t14,2,22,Show,180.00,c5
t15,3,5,Salário,4800.00,c1
t16,3,6,Aluguel,1750.00,c6
t17,3,14,Feira,95.40,c3
"##;
