use crate::api::{Gateway, ListFilter};
use crate::controller::{Generation, LoadOutcome, Notice};
use crate::model::{Period, Transaction, TransactionType};
use crate::utils::lock;
use crate::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// The question asked before a transaction is deleted.
pub const CONFIRM_DELETE: &str = "Tem Certeza que deseja deletar essa transação?";

const FETCH_FAILED: &str = "Erro ao buscar transações";
const DELETE_SUCCEEDED: &str = "Sucesso ao deletar transação";
const DELETE_FAILED: &str = "Erro ao deletar transação";

/// What happened to a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// The confirmation was declined, nothing was sent.
    Declined,
    Deleted,
    /// The gateway failed. Both lists are unchanged.
    Failed,
}

/// A snapshot of the list for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListView {
    /// The period of the most recently issued load.
    pub period: Option<Period>,
    pub loading: bool,
    /// Set when the most recent load failed. Presentation shows it with a retry action.
    pub error: Option<String>,
    pub search: String,
    pub visible: Vec<Transaction>,
    /// How many transactions were loaded before filtering.
    pub total: usize,
    pub pending_delete: Option<String>,
}

#[derive(Debug, Default)]
struct ListState {
    generation: Generation,
    last_period: Option<Period>,
    loading: bool,
    error: Option<String>,
    search: String,
    all: Vec<Transaction>,
    visible: Vec<Transaction>,
    pending_delete: Option<String>,
    notices: Vec<Notice>,
}

impl ListState {
    /// Recomputes `visible` as the transactions of `all` that match the search text, in order.
    fn refilter(&mut self) {
        let needle = self.search.to_lowercase();
        self.visible = self
            .all
            .iter()
            .filter(|t| t.description_contains(&needle))
            .cloned()
            .collect();
    }
}

/// Loads the transactions of a period, filters them by description and deletes them.
///
/// Two lists are kept: every loaded transaction, and the ones whose description contains the
/// search text. The second is always exactly the matching subsequence of the first.
pub struct TransactionList {
    gateway: Arc<dyn Gateway>,
    category_id: Option<String>,
    transaction_type: Option<TransactionType>,
    state: Mutex<ListState>,
}

impl TransactionList {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            category_id: None,
            transaction_type: None,
            state: Mutex::new(ListState::default()),
        }
    }

    /// Only loads transactions of the category `category_id`. The server does the filtering.
    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    /// Only loads transactions of `transaction_type`. The server does the filtering.
    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    fn list_filter(&self, period: Period) -> ListFilter {
        let mut filter = ListFilter::new(period);
        if let Some(category_id) = &self.category_id {
            filter = filter.with_category(category_id.clone());
        }
        if let Some(transaction_type) = self.transaction_type {
            filter = filter.with_type(transaction_type);
        }
        filter
    }

    /// Fetches the transactions of `period` and replaces the loaded list with them. The current
    /// search text is applied to the new data. If a newer load is issued before this one
    /// completes, this result is dropped.
    pub async fn load(&self, period: Period) -> LoadOutcome {
        let token = {
            let mut state = lock(&self.state);
            state.last_period = Some(period);
            state.loading = true;
            state.generation.issue()
        };
        debug!("Loading transactions for {period} (request {token})");
        let result = self
            .gateway
            .list_transactions(&self.list_filter(period))
            .await;
        self.apply_load(period, token, result)
    }

    fn apply_load(
        &self,
        period: Period,
        token: u64,
        result: Result<Vec<Transaction>>,
    ) -> LoadOutcome {
        let mut state = lock(&self.state);
        if !state.generation.is_current(token) {
            debug!("Discarding the stale transactions of {period} (request {token})");
            return LoadOutcome::Discarded;
        }
        state.loading = false;
        match result {
            Ok(transactions) => {
                debug!("Loaded {} transactions for {period}", transactions.len());
                state.all = transactions;
                state.refilter();
                state.error = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                error!("{FETCH_FAILED} for {period}: {e:#}");
                state.error = Some(FETCH_FAILED.to_string());
                LoadOutcome::Failed
            }
        }
    }

    /// Loads the period of the last issued load again. Does nothing if there never was a load.
    pub async fn retry(&self) -> LoadOutcome {
        let period = lock(&self.state).last_period;
        match period {
            Some(period) => self.load(period).await,
            None => {
                debug!("Nothing to retry, no load was issued yet");
                LoadOutcome::Discarded
            }
        }
    }

    /// Sets the search text and recomputes the visible list. No request is made.
    pub fn filter(&self, text: &str) {
        let mut state = lock(&self.state);
        state.search = text.to_string();
        state.refilter();
    }

    /// Deletes the transaction `id` after `confirm` agrees to the `CONFIRM_DELETE` question.
    ///
    /// There is a single pending slot: it holds the id of the latest delete in flight, and a
    /// delete that starts while another is running takes the slot over. When the delete succeeds
    /// the id is removed from both lists as they are at that moment, so a reload that completed
    /// in the meantime cannot bring it back.
    pub async fn delete<F>(&self, id: &str, confirm: F) -> DeleteOutcome
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(CONFIRM_DELETE) {
            debug!("Delete of {id} was not confirmed");
            return DeleteOutcome::Declined;
        }
        lock(&self.state).pending_delete = Some(id.to_string());
        debug!("Deleting transaction {id}");
        let result = self.gateway.delete_transaction(id).await;
        self.finish_delete(id, result)
    }

    fn finish_delete(&self, id: &str, result: Result<()>) -> DeleteOutcome {
        let mut state = lock(&self.state);
        if state.pending_delete.as_deref() == Some(id) {
            state.pending_delete = None;
        }
        match result {
            Ok(()) => {
                info!("{DELETE_SUCCEEDED}: {id}");
                state.all.retain(|t| t.id() != id);
                state.visible.retain(|t| t.id() != id);
                state.notices.push(Notice::Success(DELETE_SUCCEEDED.to_string()));
                DeleteOutcome::Deleted
            }
            Err(e) => {
                error!("{DELETE_FAILED} {id}: {e:#}");
                state.notices.push(Notice::Failure(DELETE_FAILED.to_string()));
                DeleteOutcome::Failed
            }
        }
    }

    /// True while a delete of `id` holds the pending slot.
    pub fn is_pending(&self, id: &str) -> bool {
        lock(&self.state).pending_delete.as_deref() == Some(id)
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.state).loading
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    pub fn all(&self) -> Vec<Transaction> {
        lock(&self.state).all.clone()
    }

    pub fn visible(&self) -> Vec<Transaction> {
        lock(&self.state).visible.clone()
    }

    /// Removes and returns the notices emitted since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }

    pub fn view(&self) -> ListView {
        let state = lock(&self.state);
        ListView {
            period: state.last_period,
            loading: state.loading,
            error: state.error.clone(),
            search: state.search.clone(),
            visible: state.visible.clone(),
            total: state.all.len(),
            pending_delete: state.pending_delete.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Operation, TestGateway};
    use crate::model::{Amount, Category};
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn jan() -> Period {
        Period::new(1, 2025).unwrap()
    }

    fn dec() -> Period {
        Period::new(12, 2024).unwrap()
    }

    fn seeded() -> (Arc<TestGateway>, TransactionList) {
        let gateway = Arc::new(TestGateway::seeded(jan()));
        let list = TransactionList::new(gateway.clone());
        (gateway, list)
    }

    fn ids(transactions: &[Transaction]) -> Vec<String> {
        transactions.iter().map(|t| t.id().to_string()).collect()
    }

    /// Checks that `visible` is exactly the matching subsequence of `all`.
    fn assert_consistent(list: &TransactionList) {
        let view = list.view();
        let needle = view.search.to_lowercase();
        let expected: Vec<Transaction> = list
            .all()
            .into_iter()
            .filter(|t| t.description().to_lowercase().contains(&needle))
            .collect();
        assert_eq!(view.visible, expected);
    }

    /// A gateway holding "a" = Almoço and, if `with_salary`, "b" = Salário in January 2025.
    fn small_gateway(with_salary: bool) -> Arc<TestGateway> {
        let salary = Category::new("c1", "Salário", "#00AA00", TransactionType::Income);
        let food = Category::new("c3", "Alimentação", "#FF5733", TransactionType::Expense);
        let date = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        let mut transactions = vec![Transaction::new(
            "a",
            "u1",
            "Almoço",
            Amount::from(Decimal::new(3590, 2)),
            date,
            food.clone(),
        )];
        if with_salary {
            transactions.push(Transaction::new(
                "b",
                "u1",
                "Salário",
                Amount::from(Decimal::new(500000, 2)),
                date,
                salary.clone(),
            ));
        }
        Arc::new(TestGateway::new(vec![salary, food], transactions))
    }

    #[tokio::test]
    async fn test_load_replaces_lists() {
        let (_, list) = seeded();
        assert_eq!(list.load(jan()).await, LoadOutcome::Applied);
        let view = list.view();
        assert_eq!(view.period, Some(jan()));
        assert_eq!(view.total, 7);
        assert_eq!(view.visible.len(), 7);
        assert!(!view.loading);
        assert!(view.error.is_none());

        assert_eq!(list.load(dec()).await, LoadOutcome::Applied);
        assert_eq!(list.all().len(), 4);
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_server_side_filters() {
        let gateway = Arc::new(TestGateway::seeded(jan()));
        let list = TransactionList::new(gateway.clone()).with_category("c3");
        list.load(jan()).await;
        let mut descriptions: Vec<String> =
            list.all().iter().map(|t| t.description().to_string()).collect();
        descriptions.sort();
        assert_eq!(descriptions, vec!["Almoço", "Supermercado"]);

        let list = TransactionList::new(gateway).with_type(TransactionType::Income);
        list.load(jan()).await;
        assert_eq!(list.all().len(), 2);
        assert!(list
            .all()
            .iter()
            .all(|t| t.transaction_type() == TransactionType::Income));
        // The search text still narrows what the server returned.
        list.filter("free");
        assert_eq!(list.visible().len(), 1);
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_filter_is_case_insensitive() {
        let list = TransactionList::new(small_gateway(true));
        list.load(jan()).await;
        list.filter("sal");
        assert_eq!(ids(&list.visible()), vec!["b"]);
        list.filter("SAL");
        assert_eq!(ids(&list.visible()), vec!["b"]);
        list.filter("");
        assert_eq!(ids(&list.visible()), vec!["a", "b"]);
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_filter_is_idempotent() {
        let list = TransactionList::new(small_gateway(true));
        list.load(jan()).await;
        list.filter("al");
        let once = list.view();
        list.filter("al");
        assert_eq!(list.view(), once);
    }

    #[tokio::test]
    async fn test_filter_then_delete_empties_visible() {
        let list = TransactionList::new(small_gateway(false));
        list.load(jan()).await;
        list.filter("al");
        assert_eq!(ids(&list.visible()), vec!["a"]);

        assert_eq!(list.delete("a", |_| true).await, DeleteOutcome::Deleted);
        assert!(list.visible().is_empty());
        assert!(list.all().is_empty());
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_delete_keeps_other_matches_visible() {
        let list = TransactionList::new(small_gateway(true));
        list.load(jan()).await;
        // "Almoço" and "Salário" both contain "al".
        list.filter("al");
        assert_eq!(ids(&list.visible()), vec!["a", "b"]);

        assert_eq!(list.delete("a", |_| true).await, DeleteOutcome::Deleted);
        assert_eq!(ids(&list.visible()), vec!["b"]);
        assert_eq!(ids(&list.all()), vec!["b"]);
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_search_survives_reload() {
        let (_, list) = seeded();
        list.filter("mercado");
        list.load(jan()).await;
        let visible = list.visible();
        assert!(!visible.is_empty());
        assert!(visible
            .iter()
            .all(|t| t.description().to_lowercase().contains("mercado")));
        assert_consistent(&list);
    }

    #[tokio::test]
    async fn test_load_failure_keeps_lists() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        let before = list.all();

        gateway.fail(Operation::List);
        assert_eq!(list.load(dec()).await, LoadOutcome::Failed);
        assert_eq!(list.error().as_deref(), Some(FETCH_FAILED));
        assert_eq!(list.all(), before);
        assert!(!list.is_loading());

        gateway.recover(Operation::List);
        assert_eq!(list.retry().await, LoadOutcome::Applied);
        assert!(list.error().is_none());
        // The retry loads the period that failed.
        assert_eq!(list.all().len(), 4);
    }

    #[tokio::test]
    async fn test_retry_without_load() {
        let (_, list) = seeded();
        assert_eq!(list.retry().await, LoadOutcome::Discarded);
        assert!(list.all().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_is_discarded() {
        let (gateway, list) = seeded();
        gateway.set_period_delay(Operation::List, jan(), Duration::from_millis(200));
        gateway.set_period_delay(Operation::List, dec(), Duration::from_millis(50));

        // January is requested first but answers last.
        let (a, b) = tokio::join!(list.load(jan()), list.load(dec()));
        assert_eq!(a, LoadOutcome::Discarded);
        assert_eq!(b, LoadOutcome::Applied);
        assert_eq!(list.all().len(), 4);
        assert_eq!(list.view().period, Some(dec()));
        assert!(!list.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_is_discarded() {
        let (gateway, list) = seeded();
        list.load(dec()).await;
        gateway.set_delay(Operation::List, Duration::from_millis(100));
        gateway.set_period_delay(Operation::List, dec(), Duration::from_millis(10));

        let first = list.load(jan());
        let second = async {
            // Let the first request get going, then fail it before it answers.
            tokio::time::sleep(Duration::from_millis(20)).await;
            gateway.fail(Operation::List);
            let outcome = list.load(dec()).await;
            gateway.recover(Operation::List);
            outcome
        };
        let (a, b) = tokio::join!(first, second);
        assert_eq!(b, LoadOutcome::Failed);
        // The first load answers after the failure and after recovery, but it is stale.
        assert_eq!(a, LoadOutcome::Discarded);
        assert_eq!(list.error().as_deref(), Some(FETCH_FAILED));
        assert_eq!(list.all().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loading_flag() {
        let (gateway, list) = seeded();
        gateway.set_delay(Operation::List, Duration::from_millis(50));
        let observe = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            list.is_loading()
        };
        let (outcome, loading) = tokio::join!(list.load(jan()), observe);
        assert_eq!(outcome, LoadOutcome::Applied);
        assert!(loading);
        assert!(!list.is_loading());
    }

    #[tokio::test]
    async fn test_delete_declined() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        let mut asked = None;
        let outcome = list
            .delete("t01", |question| {
                asked = Some(question.to_string());
                false
            })
            .await;
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert_eq!(asked.as_deref(), Some(CONFIRM_DELETE));
        assert_eq!(list.all().len(), 7);
        assert!(list.take_notices().is_empty());
        assert!(gateway.transactions().iter().any(|t| t.id() == "t01"));
    }

    #[tokio::test]
    async fn test_delete_removes_only_that_id() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        let before = ids(&list.all());

        assert_eq!(list.delete("t03", |_| true).await, DeleteOutcome::Deleted);
        let after = ids(&list.all());
        let expected: Vec<String> = before.into_iter().filter(|id| id != "t03").collect();
        assert_eq!(after, expected);
        assert!(!ids(&list.visible()).contains(&"t03".to_string()));
        assert!(!list.is_pending("t03"));
        assert_eq!(
            list.take_notices(),
            vec![Notice::Success(DELETE_SUCCEEDED.to_string())]
        );
        assert!(list.take_notices().is_empty());
        assert!(!gateway.transactions().iter().any(|t| t.id() == "t03"));
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_lists() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        list.filter("a");
        let before = list.view();

        gateway.fail(Operation::Delete);
        assert_eq!(list.delete("t01", |_| true).await, DeleteOutcome::Failed);
        let after = list.view();
        assert_eq!(after.visible, before.visible);
        assert_eq!(list.all().len(), 7);
        assert!(after.pending_delete.is_none());
        // A failed delete is a notification, not an error panel.
        assert!(after.error.is_none());
        assert_eq!(
            list.take_notices(),
            vec![Notice::Failure(DELETE_FAILED.to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_slot() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        gateway.set_delay(Operation::Delete, Duration::from_millis(100));

        let deleting = list.delete("t01", |_| true);
        let observe = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            (list.is_pending("t01"), list.is_pending("t02"))
        };
        let (outcome, (pending, other)) = tokio::join!(deleting, observe);
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(pending);
        assert!(!other);
        assert!(!list.is_pending("t01"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_delete_keeps_its_marker() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        gateway.set_delay(Operation::Delete, Duration::from_millis(100));

        let first = list.delete("t01", |_| true);
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let outcome = list.delete("t02", |_| true);
            let observe = async {
                // The first delete finishes at 100ms, the second at 150ms.
                tokio::time::sleep(Duration::from_millis(60)).await;
                list.is_pending("t02")
            };
            tokio::join!(outcome, observe)
        };
        let (a, (b, still_pending)) = tokio::join!(first, second);
        assert_eq!(a, DeleteOutcome::Deleted);
        assert_eq!(b, DeleteOutcome::Deleted);
        assert!(still_pending);
        assert!(list.view().pending_delete.is_none());
        assert_eq!(list.all().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_cannot_resurrect_deleted() {
        let (gateway, list) = seeded();
        list.load(jan()).await;
        gateway.set_delay(Operation::Delete, Duration::from_millis(100));

        let deleting = list.delete("t01", |_| true);
        let reloading = async {
            // This reload answers before the delete reaches the server.
            tokio::time::sleep(Duration::from_millis(10)).await;
            list.load(jan()).await
        };
        let (deleted, reloaded) = tokio::join!(deleting, reloading);
        assert_eq!(reloaded, LoadOutcome::Applied);
        assert_eq!(deleted, DeleteOutcome::Deleted);
        assert!(!ids(&list.all()).contains(&"t01".to_string()));
        assert_eq!(list.all().len(), 6);
        assert_consistent(&list);
    }
}
