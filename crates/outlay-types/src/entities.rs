//! Expense and category records.
//!
//! Two forms exist for each entity: the full record as stored remotely
//! (`Expense`, `Category`) and the draft form submitted by callers
//! (`ExpenseDraft`, `CategoryDraft`). Drafts omit server-assigned fields;
//! the gateway fills in `owner_id` (and `currency` for expenses) before
//! submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Currency attached to an expense when the caller does not specify one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// A spending category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Optional display color (e.g. "#4F8A8B").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// A single recorded expense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub title: String,
    pub amount: f64,
    pub currency: String,
    /// `None` means "uncategorized".
    #[serde(default)]
    pub category_id: Option<String>,
    pub occurred_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Receipt image storage paths, if any were attached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied category fields, before owner attribution.
///
/// `id` is set when editing an existing category and left `None` on create
/// (the remote service assigns one).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// Caller-supplied expense fields, before owner attribution and currency
/// defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    pub occurred_on: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ExpenseDraft {
    /// Minimal draft with required fields only.
    pub fn new(title: impl Into<String>, amount: f64, occurred_on: DateTime<Utc>) -> Self {
        Self {
            id: None,
            title: title.into(),
            amount,
            currency: None,
            category_id: None,
            occurred_on,
            notes: None,
            images: None,
        }
    }
}

impl CategoryDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: None,
        }
    }
}
