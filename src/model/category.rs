use crate::model::TransactionType;
use serde::{Deserialize, Serialize};

/// A category as returned by the categories endpoint. Categories are owned by the server and are
/// never modified by this client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    id: String,
    name: String,
    color: String,
    #[serde(rename = "type")]
    category_type: TransactionType,
}

impl Category {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        color: impl Into<String>,
        category_type: TransactionType,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            category_type,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display color, e.g. `#FF5733`.
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn category_type(&self) -> TransactionType {
        self.category_type
    }
}

/// Returns the categories that can be picked for a transaction of type `t`.
pub fn categories_for(categories: &[Category], t: TransactionType) -> Vec<&Category> {
    categories
        .iter()
        .filter(|c| c.category_type() == t)
        .collect()
}
