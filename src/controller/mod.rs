//! The controllers that sit between the `Gateway` and whatever presents the data.
//!
//! Each controller keeps its state behind a `std::sync::Mutex` that is only held for the short,
//! synchronous moments where state is read or replaced. It is never held across a gateway call,
//! so loads, deletes and navigation can interleave freely. Every load takes a `Generation` token
//! when it is issued, and its result is applied only if no newer load for the same view was
//! issued in the meantime.

mod dashboard;
mod form;
mod list;

use crate::api::Gateway;
use crate::model::{Period, PeriodCursor};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

pub use dashboard::{Dashboard, DashboardView};
pub use form::{TransactionForm, CREATE_SUCCEEDED};
pub use list::{DeleteOutcome, ListView, TransactionList, CONFIRM_DELETE};

/// A monotonically increasing request counter for one view.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Generation(u64);

impl Generation {
    /// Issues a new token. Any token issued before it becomes stale.
    pub(crate) fn issue(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    pub(crate) fn is_current(&self, token: u64) -> bool {
        self.0 == token
    }
}

/// A transient, toast-like message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Success(String),
    Failure(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Success(m) | Notice::Failure(m) => m,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Notice::Failure(_))
    }
}

/// What happened to the result of a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    /// The data was replaced.
    Applied,
    /// The load failed and the error state was set. The previous data is still there.
    Failed,
    /// A newer load was issued while this one was in flight, so its result was dropped.
    Discarded,
}

/// Ties the period cursor to the transaction list and the dashboard: every change of period
/// reloads both, concurrently and independently.
pub struct Tracker {
    cursor: PeriodCursor,
    transactions: Arc<TransactionList>,
    dashboard: Arc<Dashboard>,
}

impl Tracker {
    pub fn new(cursor: PeriodCursor, gateway: Arc<dyn Gateway>, history_months: u32) -> Self {
        Self {
            cursor,
            transactions: Arc::new(TransactionList::new(gateway.clone())),
            dashboard: Arc::new(Dashboard::new(gateway, history_months)),
        }
    }

    pub fn cursor(&self) -> &PeriodCursor {
        &self.cursor
    }

    pub fn period(&self) -> Period {
        self.cursor.period()
    }

    pub fn transactions(&self) -> &Arc<TransactionList> {
        &self.transactions
    }

    pub fn dashboard(&self) -> &Arc<Dashboard> {
        &self.dashboard
    }

    /// Loads the transactions and the dashboard for the current period. The list outcome comes
    /// first, then summary and history.
    pub async fn refresh(&self) -> (LoadOutcome, LoadOutcome, LoadOutcome) {
        let period = self.cursor.period();
        debug!("Refreshing {period}");
        let (list, (summary, history)) =
            tokio::join!(self.transactions.load(period), self.dashboard.load(period));
        (list, summary, history)
    }

    pub async fn advance(&mut self) -> Period {
        let period = self.cursor.advance();
        self.refresh().await;
        period
    }

    pub async fn retreat(&mut self) -> Period {
        let period = self.cursor.retreat();
        self.refresh().await;
        period
    }

    /// Selects `month` in the current year. An invalid month leaves the period and the data as
    /// they were.
    pub async fn set_month(&mut self, month: u32) -> Result<Period> {
        let period = self.cursor.set_month(month)?;
        self.refresh().await;
        Ok(period)
    }

    pub async fn set_year(&mut self, year: i32) -> Period {
        let period = self.cursor.set_year(year);
        self.refresh().await;
        period
    }
}
