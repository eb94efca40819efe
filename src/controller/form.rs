use crate::api::Gateway;
use crate::error::{tagged, ErrorType, IntoResult};
use crate::model::{categories_for, Amount, Category, NewTransaction, Transaction, TransactionType};
use crate::Result;
use anyhow::Context;
use chrono::NaiveDate;
use tracing::{debug, error, info};

const MISSING_FIELDS: &str = "Preencha todos os campos";
const NOT_POSITIVE: &str = "O valor deve ser maior que zero";
const UNKNOWN_CATEGORY: &str = "Selecione uma categoria válida";
const TYPE_MISMATCH: &str = "A categoria não corresponde ao tipo da transação";
pub const CREATE_SUCCEEDED: &str = "Transação criada com sucesso!";
const CREATE_FAILED: &str = "Erro ao salvar a transação";

/// The fields of the new-transaction form. Nothing is checked until `validate` or `submit`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionForm {
    description: String,
    amount: Option<Amount>,
    date: Option<NaiveDate>,
    transaction_type: TransactionType,
    category_id: String,
}

impl TransactionForm {
    /// An empty expense form.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = transaction_type;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = category_id.into();
        self
    }

    pub fn transaction_type(&self) -> TransactionType {
        self.transaction_type
    }

    /// The categories the picker offers for the form's current type.
    pub fn categories_for<'a>(&self, categories: &'a [Category]) -> Vec<&'a Category> {
        categories_for(categories, self.transaction_type)
    }

    /// Checks the form and builds the create request. `categories` are the known categories; the
    /// selected one must be among them and must have the same type as the form.
    ///
    /// # Errors
    /// A `ValidationFailed` error carrying the message to show next to the form.
    pub fn validate(&self, categories: &[Category]) -> Result<NewTransaction> {
        let description = self.description.trim();
        let (amount, date) = match (self.amount, self.date) {
            (Some(amount), Some(date))
                if !description.is_empty() && !amount.is_zero() && !self.category_id.is_empty() =>
            {
                (amount, date)
            }
            _ => return Err(tagged(ErrorType::ValidationFailed, MISSING_FIELDS)),
        };
        if !amount.is_positive() {
            return Err(tagged(ErrorType::ValidationFailed, NOT_POSITIVE));
        }
        let category = categories
            .iter()
            .find(|c| c.id() == self.category_id)
            .ok_or_else(|| tagged(ErrorType::ValidationFailed, UNKNOWN_CATEGORY))?;
        if category.category_type() != self.transaction_type {
            return Err(tagged(ErrorType::ValidationFailed, TYPE_MISMATCH));
        }
        Ok(NewTransaction {
            description: description.to_string(),
            amount,
            date,
            transaction_type: self.transaction_type,
            category_id: self.category_id.clone(),
        })
    }

    /// Validates the form and, if it is valid, creates the transaction. A form that does not
    /// validate never reaches the gateway.
    pub async fn submit(
        &self,
        gateway: &dyn Gateway,
        categories: &[Category],
    ) -> Result<Transaction> {
        let new = self.validate(categories)?;
        debug!("Creating transaction dated {}", new.wire_date());
        match gateway.create_transaction(&new).await {
            Ok(created) => {
                info!("{CREATE_SUCCEEDED} ({})", created.id());
                Ok(created)
            }
            Err(e) => {
                error!("{CREATE_FAILED}: {e:#}");
                Err(e).context(CREATE_FAILED).pub_result(ErrorType::CreateFailed)
            }
        }
    }
}
