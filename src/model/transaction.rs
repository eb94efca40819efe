use crate::model::{Amount, Category};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Time-of-day sent with every created transaction. The form only knows a calendar date, and
/// pinning it to midday UTC keeps the server from shifting it into the neighbouring day.
const MIDDAY_UTC: &str = "T12:00:00.000Z";

/// Whether money came in or went out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A transaction as returned by the transactions endpoint.
///
/// `amount` is never negative; the direction of the money is carried by `transaction_type`, which
/// by convention agrees with the type of the transaction's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: String,
    #[serde(rename = "userId")]
    owner_id: String,
    description: String,
    amount: Amount,
    date: DateTime<Utc>,
    category_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<Category>,
    #[serde(rename = "type")]
    transaction_type: TransactionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// Creates a transaction that belongs to `category`, taking its type from the category.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        description: impl Into<String>,
        amount: Amount,
        date: DateTime<Utc>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            description: description.into(),
            amount,
            date,
            category_id: category.id().to_string(),
            transaction_type: category.category_type(),
            category: Some(category),
            created_at: Some(date),
            updated_at: Some(date),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> &DateTime<Utc> {
        &self.date
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn created_at(&self) -> Option<&DateTime<Utc>> {
        self.created_at.as_ref()
    }

    pub fn updated_at(&self) -> Option<&DateTime<Utc>> {
        self.updated_at.as_ref()
    }

    /// True if the description contains `needle`, ignoring case. `needle` must already be
    /// lowercase.
    pub(crate) fn description_contains(&self, needle: &str) -> bool {
        needle.is_empty() || self.description.to_lowercase().contains(needle)
    }
}

/// The body of a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub(crate) description: String,
    pub(crate) amount: Amount,
    #[serde(serialize_with = "serialize_midday")]
    pub(crate) date: NaiveDate,
    #[serde(rename = "type")]
    pub(crate) transaction_type: TransactionType,
    pub(crate) category_id: String,
}

impl NewTransaction {
    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    pub fn category_id(&self) -> &str {
        &self.category_id
    }

    /// The timestamp string that is sent for `date`.
    pub fn wire_date(&self) -> String {
        midday(self.date)
    }
}

fn midday(date: NaiveDate) -> String {
    format!("{}{MIDDAY_UTC}", date.format("%Y-%m-%d"))
}

fn serialize_midday<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&midday(*date))
}
