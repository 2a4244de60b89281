//! Read-through collection reads with cache fallback.

use std::sync::Arc;

use tracing::{debug, warn};

use outlay_store::LocalStore;
use outlay_types::{Category, Collection, Expense, MonthWindow};

use crate::ports::RemoteGateway;

/// Wraps collection reads: a successful fetch overwrites the cached
/// snapshot wholesale; a failed fetch falls back to the last snapshot (or
/// an empty list if none exists yet). Read failures never surface to the
/// caller — only possibly-stale data does.
pub struct ReadThrough<G> {
    gateway: Arc<G>,
    store: Arc<LocalStore>,
}

impl<G: RemoteGateway> ReadThrough<G> {
    pub fn new(gateway: Arc<G>, store: Arc<LocalStore>) -> Self {
        Self { gateway, store }
    }

    /// Expenses, optionally restricted to one calendar month.
    ///
    /// Note the single `expenses` snapshot is replaced even by a filtered
    /// fetch; the cache holds whatever was last fetched successfully.
    pub fn expenses(&self, window: Option<&MonthWindow>) -> Vec<Expense> {
        match self.gateway.fetch_expenses(window) {
            Ok(rows) => self.refresh(Collection::Expenses, rows),
            Err(fault) => self.fall_back(Collection::Expenses, fault),
        }
    }

    /// All categories.
    pub fn categories(&self) -> Vec<Category> {
        match self.gateway.fetch_categories() {
            Ok(rows) => self.refresh(Collection::Categories, rows),
            Err(fault) => self.fall_back(Collection::Categories, fault),
        }
    }

    /// Re-fetch a collection after a successful mutation, discarding the
    /// rows (the point is the refreshed snapshot).
    pub fn refresh_collection(&self, collection: Collection) {
        match collection {
            Collection::Expenses => {
                self.expenses(None);
            }
            Collection::Categories => {
                self.categories();
            }
        }
    }

    fn refresh<T: serde::Serialize>(&self, collection: Collection, rows: Vec<T>) -> Vec<T> {
        if let Err(fault) = self.store.cache_set(collection.table_name(), &rows) {
            // The fetch itself succeeded; a stale snapshot is the only cost.
            warn!(table = %collection, "failed to refresh snapshot: {}", fault);
        }
        self.store.metrics().record_cache_refresh();
        rows
    }

    fn fall_back<T: serde::de::DeserializeOwned>(
        &self,
        collection: Collection,
        fault: outlay_types::Fault,
    ) -> Vec<T> {
        debug!(table = %collection, "fetch failed, serving cached snapshot: {}", fault);
        self.store.metrics().record_cache_fallback();
        match self.store.cache_get(collection.table_name()) {
            Ok(Some(rows)) => rows,
            Ok(None) => Vec::new(),
            Err(storage_fault) => {
                warn!(table = %collection, "cached snapshot unreadable: {}", storage_fault);
                Vec::new()
            }
        }
    }
}
