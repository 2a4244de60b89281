//! Typed per-collection operations against the remote service.

use chrono::SecondsFormat;
use serde_json::{Map, Value};
use tracing::debug;

use outlay_types::{
    Category, CategoryDraft, Collection, Expense, ExpenseDraft, Fault, MonthWindow,
    DEFAULT_CURRENCY,
};

use crate::auth::{AuthClient, SessionStore};
use crate::config::GatewayConfig;
use crate::receipts::ReceiptStore;
use crate::rest::{Order, RestClient};

/// The one component that talks to the remote service.
///
/// Owns the REST, identity, and object-storage clients, which share a
/// session store. Constructed explicitly from a [`GatewayConfig`]; nothing
/// here is global.
pub struct DataGateway {
    rest: RestClient,
    auth: AuthClient,
    receipts: ReceiptStore,
}

impl DataGateway {
    pub fn new(config: GatewayConfig) -> Self {
        let sessions = match &config.session_file {
            Some(path) => SessionStore::with_file(path),
            None => SessionStore::in_memory(),
        };
        Self {
            rest: RestClient::new(&config, sessions.clone()),
            auth: AuthClient::new(&config, sessions.clone()),
            receipts: ReceiptStore::new(&config, sessions),
        }
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    /// The signed-in user's id, if any.
    pub fn current_user_id(&self) -> Option<String> {
        self.auth.sessions().user_id()
    }

    // ==================== Reads ====================

    /// All expenses, newest occurrence first, optionally restricted to one
    /// calendar month.
    pub fn fetch_expenses(&self, window: Option<&MonthWindow>) -> Result<Vec<Expense>, Fault> {
        let filters = month_filters(window);
        let rows = self.rest.select(
            Collection::Expenses.table_name(),
            ("occurred_on", Order::Descending),
            &filters,
        )?;
        parse_rows(Collection::Expenses, rows)
    }

    /// All categories, newest first.
    pub fn fetch_categories(&self) -> Result<Vec<Category>, Fault> {
        let rows = self.rest.select(
            Collection::Categories.table_name(),
            ("created_at", Order::Descending),
            &[],
        )?;
        parse_rows(Collection::Categories, rows)
    }

    /// Raw response body for a collection (change-feed digests).
    pub fn fetch_raw(&self, collection: Collection) -> Result<String, Fault> {
        self.rest
            .select_raw(collection.table_name(), order_for(collection), &[])
    }

    // ==================== Writes ====================

    /// Upsert an expense draft, attaching the acting user as owner and
    /// defaulting the currency.
    pub fn upsert_expense(&self, draft: &ExpenseDraft) -> Result<(), Fault> {
        let payload = serde_json::to_value(draft)
            .map_err(|e| Fault::transient(format!("unserializable expense: {}", e)))?;
        self.upsert_payload(Collection::Expenses, &payload, self.current_user_id().as_deref())
    }

    /// Upsert a category draft, attaching the acting user as owner.
    pub fn upsert_category(&self, draft: &CategoryDraft) -> Result<(), Fault> {
        let payload = serde_json::to_value(draft)
            .map_err(|e| Fault::transient(format!("unserializable category: {}", e)))?;
        self.upsert_payload(Collection::Categories, &payload, self.current_user_id().as_deref())
    }

    /// Upsert raw payload fields (the replay path). Defaults — `owner_id`,
    /// and `currency` for expenses — are merged *under* the payload's own
    /// fields: anything the caller set explicitly wins.
    pub fn upsert_payload(
        &self,
        collection: Collection,
        payload: &Value,
        owner: Option<&str>,
    ) -> Result<(), Fault> {
        let merged = merged_payload(collection, payload, owner);
        debug!(table = %collection, "upserting record");
        self.rest.upsert(collection.table_name(), &merged)
    }

    /// Delete a row by id. Deleting an absent row is a no-op success.
    pub fn delete(&self, collection: Collection, id: &str) -> Result<(), Fault> {
        debug!(table = %collection, id, "deleting record");
        self.rest.delete_by_id(collection.table_name(), id)
    }

    /// Upload receipt bytes, returning the storage path.
    pub fn upload_receipt(&self, original_name: &str, bytes: &[u8]) -> Result<String, Fault> {
        self.receipts.upload(original_name, bytes)
    }

    /// Whether the remote service is currently reachable.
    pub fn probe(&self) -> bool {
        self.rest.probe()
    }
}

fn order_for(collection: Collection) -> (&'static str, Order) {
    match collection {
        Collection::Expenses => ("occurred_on", Order::Descending),
        Collection::Categories => ("created_at", Order::Descending),
    }
}

fn month_filters(window: Option<&MonthWindow>) -> Vec<(String, String)> {
    let Some(window) = window else {
        return Vec::new();
    };
    let fmt = |t: chrono::DateTime<chrono::Utc>| t.to_rfc3339_opts(SecondsFormat::Secs, true);
    vec![
        ("occurred_on".to_string(), format!("gte.{}", fmt(window.start()))),
        ("occurred_on".to_string(), format!("lt.{}", fmt(window.end()))),
    ]
}

/// Merge default fields under the payload's explicit ones.
fn merged_payload(collection: Collection, payload: &Value, owner: Option<&str>) -> Value {
    let mut merged = Map::new();
    if let Some(owner) = owner {
        merged.insert("owner_id".to_string(), Value::String(owner.to_string()));
    }
    if collection == Collection::Expenses {
        merged.insert(
            "currency".to_string(),
            Value::String(DEFAULT_CURRENCY.to_string()),
        );
    }
    if let Some(fields) = payload.as_object() {
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    Value::Object(merged)
}

fn parse_rows<T: serde::de::DeserializeOwned>(
    collection: Collection,
    rows: Vec<Value>,
) -> Result<Vec<T>, Fault> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                Fault::transient(format!("malformed {} row: {}", collection.table_name(), e))
            })
        })
        .collect()
}
