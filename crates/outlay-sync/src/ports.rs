//! The gateway seam between the sync core and the remote service.

use serde_json::Value;

use outlay_remote::DataGateway;
use outlay_types::{Category, Collection, Expense, Fault, MonthWindow};

/// Remote operations the sync core depends on.
///
/// Implemented by [`DataGateway`] for production; tests provide in-memory
/// fakes that fail on demand.
pub trait RemoteGateway: Send + Sync {
    /// The acting user's stable id, if a session exists. Resolved locally;
    /// never a network call, so it works offline.
    fn current_user_id(&self) -> Option<String>;

    fn fetch_expenses(&self, window: Option<&MonthWindow>) -> Result<Vec<Expense>, Fault>;

    fn fetch_categories(&self) -> Result<Vec<Category>, Fault>;

    /// Upsert raw payload fields, merging `owner_id` (and `currency` for
    /// expenses) under anything the payload sets explicitly.
    fn upsert_payload(
        &self,
        collection: Collection,
        payload: &Value,
        owner: Option<&str>,
    ) -> Result<(), Fault>;

    /// Delete a row by id; deleting an absent row succeeds.
    fn delete(&self, collection: Collection, id: &str) -> Result<(), Fault>;

    /// Upload receipt bytes, returning the storage path.
    fn upload_receipt(&self, original_name: &str, bytes: &[u8]) -> Result<String, Fault>;

    /// Whether the remote service is currently reachable.
    fn probe(&self) -> bool;
}

impl RemoteGateway for DataGateway {
    fn current_user_id(&self) -> Option<String> {
        DataGateway::current_user_id(self)
    }

    fn fetch_expenses(&self, window: Option<&MonthWindow>) -> Result<Vec<Expense>, Fault> {
        DataGateway::fetch_expenses(self, window)
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, Fault> {
        DataGateway::fetch_categories(self)
    }

    fn upsert_payload(
        &self,
        collection: Collection,
        payload: &Value,
        owner: Option<&str>,
    ) -> Result<(), Fault> {
        DataGateway::upsert_payload(self, collection, payload, owner)
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), Fault> {
        DataGateway::delete(self, collection, id)
    }

    fn upload_receipt(&self, original_name: &str, bytes: &[u8]) -> Result<String, Fault> {
        DataGateway::upload_receipt(self, original_name, bytes)
    }

    fn probe(&self) -> bool {
        DataGateway::probe(self)
    }
}
