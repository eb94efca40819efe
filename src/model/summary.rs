use crate::model::Amount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Total expense of one category within a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    category_id: String,
    category_name: String,
    category_color: String,
    amount: Amount,
}

impl CategorySummary {
    pub fn new(
        category_id: impl Into<String>,
        category_name: impl Into<String>,
        category_color: impl Into<String>,
        amount: Amount,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            category_name: category_name.into(),
            category_color: category_color.into(),
            amount,
        }
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn category_name(&self) -> &str {
        &self.category_name
    }

    pub fn category_color(&self) -> &str {
        &self.category_color
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }
}

/// The point-in-time totals for a period, computed by the server.
///
/// The server guarantees `balance == total_incomes - total_expenses`. The client does not
/// recompute it; `is_balanced` only lets callers notice a malformed response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    total_incomes: Amount,
    total_expenses: Amount,
    balance: Amount,
    #[serde(default)]
    expenses_by_category: Vec<CategorySummary>,
}

impl TransactionSummary {
    pub fn new(
        total_incomes: Amount,
        total_expenses: Amount,
        expenses_by_category: Vec<CategorySummary>,
    ) -> Self {
        Self {
            total_incomes,
            total_expenses,
            balance: total_incomes - total_expenses,
            expenses_by_category,
        }
    }

    pub fn total_incomes(&self) -> Amount {
        self.total_incomes
    }

    pub fn total_expenses(&self) -> Amount {
        self.total_expenses
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn expenses_by_category(&self) -> &[CategorySummary] {
        &self.expenses_by_category
    }

    pub fn is_balanced(&self) -> bool {
        self.balance == self.total_incomes - self.total_expenses
    }

    /// Each category's fraction of the total expenses, in the order the server sent them. All
    /// shares are zero when there are no expenses.
    pub fn category_shares(&self) -> Vec<(&CategorySummary, Decimal)> {
        let total = self.total_expenses.value();
        self.expenses_by_category
            .iter()
            .map(|c| {
                let share = if total.is_zero() {
                    Decimal::ZERO
                } else {
                    c.amount().value() / total
                };
                (c, share)
            })
            .collect()
    }
}

/// One bucket of the monthly history chart.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyItem {
    #[serde(rename = "name")]
    period_label: String,
    income: Amount,
    expense: Amount,
}

impl MonthlyItem {
    pub fn new(period_label: impl Into<String>, income: Amount, expense: Amount) -> Self {
        Self {
            period_label: period_label.into(),
            income,
            expense,
        }
    }

    /// The label of the bucket, e.g. `jan/25`.
    pub fn period_label(&self) -> &str {
        &self.period_label
    }

    pub fn income(&self) -> Amount {
        self.income
    }

    pub fn expense(&self) -> Amount {
        self.expense
    }
}

/// The envelope of the history endpoint's response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    #[serde(default)]
    pub(crate) history: Vec<MonthlyItem>,
}

impl History {
    pub fn new(history: Vec<MonthlyItem>) -> Self {
        Self { history }
    }

    pub fn into_items(self) -> Vec<MonthlyItem> {
        self.history
    }
}
