use crate::api::Gateway;
use crate::controller::{Generation, LoadOutcome};
use crate::model::{MonthlyItem, Period, TransactionSummary};
use crate::utils::lock;
use crate::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, warn};

const SUMMARY_FAILED: &str = "Erro ao buscar o resumo do mês";
const HISTORY_FAILED: &str = "Erro ao buscar o histórico";

/// The longest history window, ten years of months.
pub const MAX_HISTORY_MONTHS: u32 = 120;

/// A snapshot of the dashboard for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    /// The period of the most recently issued load.
    pub period: Option<Period>,
    pub summary: TransactionSummary,
    pub history: Vec<MonthlyItem>,
    pub summary_error: Option<String>,
    pub history_error: Option<String>,
}

#[derive(Debug, Default)]
struct DashboardState {
    period: Option<Period>,
    summary_generation: Generation,
    history_generation: Generation,
    summary: TransactionSummary,
    history: Vec<MonthlyItem>,
    summary_error: Option<String>,
    history_error: Option<String>,
}

/// Loads the monthly summary and the multi-month history of the dashboard.
///
/// The two views are independent: each has its own request token, each is replaced as a whole
/// when its own request succeeds, and a failure of one leaves the other alone. A failed load
/// keeps the previous data and records a message for the view.
pub struct Dashboard {
    gateway: Arc<dyn Gateway>,
    months: u32,
    state: Mutex<DashboardState>,
}

impl Dashboard {
    /// `months` is the size of the history window, clamped to `1..=MAX_HISTORY_MONTHS`.
    pub fn new(gateway: Arc<dyn Gateway>, months: u32) -> Self {
        Self {
            gateway,
            months: months.clamp(1, MAX_HISTORY_MONTHS),
            state: Mutex::new(DashboardState::default()),
        }
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    /// Loads the summary and the history of `period` concurrently. The outcomes are returned in
    /// that order.
    pub async fn load(&self, period: Period) -> (LoadOutcome, LoadOutcome) {
        lock(&self.state).period = Some(period);
        tokio::join!(self.load_summary(period), self.load_history(period))
    }

    pub async fn load_summary(&self, period: Period) -> LoadOutcome {
        let token = lock(&self.state).summary_generation.issue();
        debug!("Loading the summary of {period} (request {token})");
        let result = self.gateway.summary(period).await;
        self.apply_summary(period, token, result)
    }

    fn apply_summary(
        &self,
        period: Period,
        token: u64,
        result: Result<TransactionSummary>,
    ) -> LoadOutcome {
        let mut state = lock(&self.state);
        if !state.summary_generation.is_current(token) {
            debug!("Discarding the stale summary of {period} (request {token})");
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(summary) => {
                if !summary.is_balanced() {
                    warn!(
                        "The summary of {period} has a balance of {} but incomes minus expenses \
                        is {}",
                        summary.balance(),
                        summary.total_incomes() - summary.total_expenses()
                    );
                }
                state.summary = summary;
                state.summary_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                error!("{SUMMARY_FAILED} {period}: {e:#}");
                state.summary_error = Some(SUMMARY_FAILED.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Loads the `months` buckets ending at `period`.
    pub async fn load_history(&self, period: Period) -> LoadOutcome {
        let token = lock(&self.state).history_generation.issue();
        debug!(
            "Loading {} months of history ending at {period} (request {token})",
            self.months
        );
        let result = self.gateway.history(period, self.months).await;
        self.apply_history(period, token, result)
    }

    fn apply_history(
        &self,
        period: Period,
        token: u64,
        result: Result<Vec<MonthlyItem>>,
    ) -> LoadOutcome {
        let mut state = lock(&self.state);
        if !state.history_generation.is_current(token) {
            debug!("Discarding the stale history of {period} (request {token})");
            return LoadOutcome::Discarded;
        }
        match result {
            Ok(history) => {
                state.history = history;
                state.history_error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                error!("{HISTORY_FAILED} {period}: {e:#}");
                state.history_error = Some(HISTORY_FAILED.to_string());
                LoadOutcome::Failed
            }
        }
    }

    pub fn summary(&self) -> TransactionSummary {
        lock(&self.state).summary.clone()
    }

    pub fn history(&self) -> Vec<MonthlyItem> {
        lock(&self.state).history.clone()
    }

    pub fn view(&self) -> DashboardView {
        let state = lock(&self.state);
        DashboardView {
            period: state.period,
            summary: state.summary.clone(),
            history: state.history.clone(),
            summary_error: state.summary_error.clone(),
            history_error: state.history_error.clone(),
        }
    }
}
