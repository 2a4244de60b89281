//! Low-level client for the tabular REST API.
//!
//! The remote service exposes each collection as a table at
//! `/rest/v1/<table>` with query-parameter filters (`col=gte.<value>`),
//! ordered selects (`order=col.desc`), upsert-by-primary-key (POST with
//! `Prefer: resolution=merge-duplicates`), and delete-by-filter. Deleting a
//! row that no longer exists matches zero rows and succeeds, which is what
//! makes queued deletes idempotent on replay.

use serde_json::Value;

use outlay_types::Fault;

use crate::auth::SessionStore;
use crate::config::GatewayConfig;

/// Sort direction for ordered selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    fn suffix(&self) -> &'static str {
        match self {
            Order::Ascending => "asc",
            Order::Descending => "desc",
        }
    }
}

/// Blocking HTTP client for the tabular API.
pub struct RestClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    sessions: SessionStore,
}

impl RestClient {
    pub fn new(config: &GatewayConfig, sessions: SessionStore) -> Self {
        Self {
            agent: config.build_agent(),
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            sessions,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Bearer token: the signed-in session's token, falling back to the
    /// public API key for anonymous access.
    fn bearer(&self) -> String {
        let token = self
            .sessions
            .current()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.api_key.clone());
        format!("Bearer {}", token)
    }

    fn authed(&self, req: ureq::Request) -> ureq::Request {
        req.set("apikey", &self.api_key)
            .set("Authorization", &self.bearer())
    }

    /// Ordered select with optional column filters, returned as the raw
    /// response body (used for change-feed digests).
    pub fn select_raw(
        &self,
        table: &str,
        order_by: (&str, Order),
        filters: &[(String, String)],
    ) -> Result<String, Fault> {
        let mut req = self
            .authed(self.agent.get(&self.table_url(table)))
            .query("select", "*")
            .query("order", &format!("{}.{}", order_by.0, order_by.1.suffix()));
        for (key, value) in filters {
            req = req.query(key, value);
        }
        req.call()
            .map_err(|e| Fault::transient(format!("select from {} failed: {}", table, e)))?
            .into_string()
            .map_err(|e| Fault::transient(format!("bad response from {}: {}", table, e)))
    }

    /// Ordered select parsed as a JSON array of rows.
    pub fn select(
        &self,
        table: &str,
        order_by: (&str, Order),
        filters: &[(String, String)],
    ) -> Result<Vec<Value>, Fault> {
        let body = self.select_raw(table, order_by, filters)?;
        let rows: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| Fault::transient(format!("unparseable rows from {}: {}", table, e)))?;
        Ok(rows)
    }

    /// Insert-or-update keyed by the table's primary key.
    pub fn upsert(&self, table: &str, payload: &Value) -> Result<(), Fault> {
        self.authed(self.agent.post(&self.table_url(table)))
            .set("Prefer", "resolution=merge-duplicates,return=minimal")
            .send_json(payload)
            .map_err(|e| Fault::transient(format!("upsert into {} failed: {}", table, e)))?;
        Ok(())
    }

    /// Delete the row with the given id. Matching zero rows is a success.
    pub fn delete_by_id(&self, table: &str, id: &str) -> Result<(), Fault> {
        self.authed(self.agent.delete(&self.table_url(table)))
            .set("Prefer", "return=minimal")
            .query("id", &format!("eq.{}", id))
            .call()
            .map_err(|e| Fault::transient(format!("delete from {} failed: {}", table, e)))?;
        Ok(())
    }

    /// Cheap reachability probe against the API root.
    pub fn probe(&self) -> bool {
        let url = format!("{}/rest/v1/", self.base_url);
        match self.authed(self.agent.get(&url)).call() {
            Ok(_) => true,
            // Any HTTP response means the service is reachable; only a
            // transport-level failure counts as offline.
            Err(ureq::Error::Status(_, _)) => true,
            Err(_) => false,
        }
    }
}
