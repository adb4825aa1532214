//! Feedback item domain model.

use crate::model::category::{Category, CategoryId};
use serde::{Deserialize, Serialize};

/// One free-form feedback entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    /// Storage-assigned document key, or a synthesized `mock-*` id.
    pub id: String,
    pub text: String,
    /// Ordered category references. Order is preserved exactly as written.
    pub categories: Vec<CategoryId>,
    /// Server-assigned creation time in epoch milliseconds. Absent for mock
    /// data and for items created in local mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

/// Resolved view of one category reference held by a feedback item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    Known { id: CategoryId, name: String },
    /// The referenced category no longer exists.
    Removed { id: CategoryId },
}

impl CategoryLabel {
    /// Text to show for this reference.
    pub fn display_name(&self) -> &str {
        match self {
            Self::Known { name, .. } => name,
            Self::Removed { .. } => "category removed",
        }
    }
}

impl FeedbackItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>, categories: Vec<CategoryId>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            categories,
            created_at: None,
        }
    }

    /// Returns whether this item references `category_id`.
    pub fn references(&self, category_id: &str) -> bool {
        self.categories.iter().any(|id| id == category_id)
    }

    /// Resolves every category reference against `known`, keeping order.
    pub fn category_labels(&self, known: &[Category]) -> Vec<CategoryLabel> {
        self.categories
            .iter()
            .map(|id| match known.iter().find(|category| &category.id == id) {
                Some(category) => CategoryLabel::Known {
                    id: id.clone(),
                    name: category.name.clone(),
                },
                None => CategoryLabel::Removed { id: id.clone() },
            })
            .collect()
    }
}
