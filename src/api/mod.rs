//! The seam between the app and the remote finance API.
//!
//! Everything the app reads or writes goes through the `Gateway` trait. `HttpGateway` talks to the
//! real REST service, while `TestGateway` keeps seeded data in memory so that the whole program
//! can run, top to bottom, without a server.

mod files;
mod http;
mod session;
mod test_gateway;

use crate::model::{
    Category, MonthlyItem, NewTransaction, Period, Transaction, TransactionSummary,
    TransactionType,
};
use crate::{Config, Result};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub(crate) use files::File;
pub use http::HttpGateway;
pub use session::{FileSession, IdentityProvider, SessionState, User};
pub use test_gateway::{Operation, TestGateway};

/// When this environment variable is set and non-empty the app uses the in-memory gateway.
pub const TEST_MODE_ENV: &str = "FINTRACK_IN_TEST_MODE";

/// Which `Gateway` implementation to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Talk to the finance API over HTTP.
    #[default]
    Http,
    /// Use seeded in-memory data.
    Testing,
}

impl Mode {
    /// Returns `Mode::Testing` when `FINTRACK_IN_TEST_MODE` is set and non-empty, otherwise
    /// `Mode::Http`.
    pub fn from_env() -> Self {
        match std::env::var(TEST_MODE_ENV) {
            Ok(value) if !value.is_empty() => Mode::Testing,
            _ => Mode::Http,
        }
    }
}

/// The query of the list endpoint. Only `month` and `year` are required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    month: u32,
    year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    category_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    transaction_type: Option<TransactionType>,
}

impl ListFilter {
    pub fn new(period: Period) -> Self {
        Self {
            month: period.month(),
            year: period.year(),
            category_id: None,
            transaction_type: None,
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn category_id(&self) -> Option<&str> {
        self.category_id.as_deref()
    }

    pub fn transaction_type(&self) -> Option<TransactionType> {
        self.transaction_type
    }
}

/// The remote operations the app depends on. Calls may run concurrently, so implementations take
/// `&self` and must be shareable across tasks.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    /// `GET /transactions`
    async fn list_transactions(&self, filter: &ListFilter) -> Result<Vec<Transaction>>;

    /// `GET /transactions/summary`
    async fn summary(&self, period: Period) -> Result<TransactionSummary>;

    /// `GET /transactions/historical`. Buckets are ordered oldest to newest and end at `period`.
    async fn history(&self, period: Period, months: u32) -> Result<Vec<MonthlyItem>>;

    /// `DELETE /transactions/:id`
    async fn delete_transaction(&self, id: &str) -> Result<()>;

    /// `POST /transactions`
    async fn create_transaction(&self, new: &NewTransaction) -> Result<Transaction>;

    /// `GET /categories`
    async fn categories(&self) -> Result<Vec<Category>>;
}

/// Creates the `Gateway` selected by `mode`. `token` is the bearer token of the signed-in user.
pub fn gateway(config: &Config, token: Option<String>, mode: Mode) -> Result<Arc<dyn Gateway>> {
    match mode {
        Mode::Http => {
            debug!("Using the finance API at {}", config.api_url());
            Ok(Arc::new(HttpGateway::new(config.api_url(), token)?))
        }
        Mode::Testing => {
            debug!("Using the in-memory test gateway");
            Ok(Arc::new(TestGateway::seeded_now()))
        }
    }
}
