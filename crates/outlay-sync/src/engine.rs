//! The sync orchestrator.
//!
//! Every mutating call follows the same shape: validate, attempt the remote
//! call, and on a transient failure persist the operation to the pending
//! queue and report success anyway — the caller proceeds optimistically and
//! the failure is handled later by [`SyncEngine::try_sync`]. Only
//! validation failures and local-store failures reach the caller.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use outlay_store::LocalStore;
use outlay_types::{
    CategoryDraft, Collection, ExpenseDraft, Fault, OpKind, QueuedOperation,
};

use crate::ports::RemoteGateway;
use crate::read_through::ReadThrough;

/// A receipt file to attach to an expense.
#[derive(Debug, Clone)]
pub struct ReceiptFile {
    /// Original file name; its extension decides the stored name and
    /// content type.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// What a replay pass did.
#[derive(Debug)]
pub enum ReplayReport {
    /// The queue was empty; nothing to do.
    Empty,
    /// Another pass was already running; this trigger was coalesced.
    AlreadyRunning,
    /// Every entry applied remotely; the queue snapshot was cleared.
    Completed { replayed: usize },
    /// Stopped at the first failing entry. The queue is untouched —
    /// including entries that succeeded earlier in this pass, which will
    /// be applied again next time (safe: upsert and delete are idempotent).
    Stopped {
        /// Entries applied remotely before the failure.
        replayed: usize,
        /// Entries still in the queue (the full pass snapshot).
        pending: usize,
        fault: Fault,
    },
}

/// Decides, per operation, whether to apply remotely now or queue locally,
/// and replays the queue when asked.
pub struct SyncEngine<G> {
    gateway: Arc<G>,
    store: Arc<LocalStore>,
    reads: ReadThrough<G>,
    /// Held for the duration of a replay pass; `try_lock` coalesces
    /// concurrent triggers.
    replay_lock: Mutex<()>,
}

impl<G: RemoteGateway> SyncEngine<G> {
    pub fn new(gateway: Arc<G>, store: Arc<LocalStore>) -> Self {
        let reads = ReadThrough::new(gateway.clone(), store.clone());
        Self {
            gateway,
            store,
            reads,
            replay_lock: Mutex::new(()),
        }
    }

    /// Read-through access to the collections.
    pub fn reads(&self) -> &ReadThrough<G> {
        &self.reads
    }

    /// The local store (introspection only; mutations go through the
    /// engine).
    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Whether the remote service is currently reachable.
    pub fn probe(&self) -> bool {
        self.gateway.probe()
    }

    // ==================== Mutations ====================

    /// Save (insert or update) an expense, with an optional best-effort
    /// receipt attachment.
    pub fn save_expense(
        &self,
        mut draft: ExpenseDraft,
        receipt: Option<ReceiptFile>,
    ) -> Result<(), Fault> {
        if draft.title.trim().is_empty() {
            return Err(Fault::validation("title is required"));
        }
        if !draft.amount.is_finite() || draft.amount <= 0.0 {
            return Err(Fault::validation("amount must be a positive number"));
        }

        if let Some(receipt) = receipt {
            match self.gateway.upload_receipt(&receipt.name, &receipt.bytes) {
                Ok(path) => draft.images.get_or_insert_with(Vec::new).push(path),
                // Attachment is best-effort: the expense is still saved,
                // just without the image reference.
                Err(fault) => warn!("receipt not attached: {}", fault),
            }
        }

        let op = if draft.id.is_some() {
            OpKind::Update
        } else {
            OpKind::Insert
        };
        let payload = serde_json::to_value(&draft)
            .map_err(|e| Fault::storage(format!("unserializable expense draft: {}", e)))?;
        self.apply_or_queue(Collection::Expenses, op, payload)
    }

    /// Delete an expense by id.
    pub fn delete_expense(&self, id: &str) -> Result<(), Fault> {
        self.delete_row(Collection::Expenses, id)
    }

    /// Save (insert or update) a category.
    pub fn save_category(&self, draft: CategoryDraft) -> Result<(), Fault> {
        if draft.name.trim().is_empty() {
            return Err(Fault::validation("name is required"));
        }
        let op = if draft.id.is_some() {
            OpKind::Update
        } else {
            OpKind::Insert
        };
        let payload = serde_json::to_value(&draft)
            .map_err(|e| Fault::storage(format!("unserializable category draft: {}", e)))?;
        self.apply_or_queue(Collection::Categories, op, payload)
    }

    /// Delete a category by id.
    pub fn delete_category(&self, id: &str) -> Result<(), Fault> {
        self.delete_row(Collection::Categories, id)
    }

    fn delete_row(&self, collection: Collection, id: &str) -> Result<(), Fault> {
        match self.gateway.delete(collection, id) {
            Ok(()) => {
                self.reads.refresh_collection(collection);
                Ok(())
            }
            Err(fault) if fault.is_transient() => {
                self.enqueue(QueuedOperation::delete(collection, id), fault)
            }
            Err(fault) => Err(fault),
        }
    }

    fn apply_or_queue(
        &self,
        collection: Collection,
        op: OpKind,
        payload: serde_json::Value,
    ) -> Result<(), Fault> {
        let owner = self.gateway.current_user_id();
        match self
            .gateway
            .upsert_payload(collection, &payload, owner.as_deref())
        {
            Ok(()) => {
                self.reads.refresh_collection(collection);
                Ok(())
            }
            Err(fault) if fault.is_transient() => {
                self.enqueue(QueuedOperation::new(collection, op, payload), fault)
            }
            Err(fault) => Err(fault),
        }
    }

    /// Persist a failed mutation for later replay. The caller still sees
    /// success — unless persisting itself fails, which would be silent data
    /// loss and must be surfaced.
    fn enqueue(&self, entry: QueuedOperation, cause: Fault) -> Result<(), Fault> {
        debug!(table = %entry.table, "remote call failed, queueing: {}", cause);
        match self.store.queue_add(&entry) {
            Ok(()) => Ok(()),
            Err(storage_fault) => {
                error!(
                    "could not queue offline mutation, the operation is lost: {}",
                    storage_fault
                );
                Err(storage_fault)
            }
        }
    }

    // ==================== Replay ====================

    /// Replay the pending queue in FIFO order, stopping at the first
    /// failure. Only a full pass clears the queue. Concurrent triggers are
    /// coalesced — a second call while a pass is running does nothing.
    pub fn try_sync(&self) -> Result<ReplayReport, Fault> {
        let Some(_guard) = self.replay_lock.try_lock() else {
            debug!("replay already in progress, coalescing trigger");
            return Ok(ReplayReport::AlreadyRunning);
        };

        // Entries enqueued after this point are not part of the pass; the
        // prune below leaves them in place for the next one.
        let snapshot = self.store.queue_all()?;
        if snapshot.is_empty() {
            return Ok(ReplayReport::Empty);
        }
        info!(entries = snapshot.len(), "replaying pending queue");

        // One identity resolution for the whole batch.
        let owner = self.gateway.current_user_id();

        let mut replayed = 0usize;
        for entry in &snapshot {
            let result = match entry.op {
                OpKind::Insert | OpKind::Update => {
                    self.gateway
                        .upsert_payload(entry.table, &entry.payload, owner.as_deref())
                }
                OpKind::Delete => match entry.delete_target() {
                    Some(id) => self.gateway.delete(entry.table, id),
                    None => {
                        warn!(id = %entry.id, "delete entry has no target id, skipping");
                        Ok(())
                    }
                },
            };
            match result {
                Ok(()) => {
                    self.store.metrics().record_op_replayed();
                    replayed += 1;
                }
                Err(fault) => {
                    self.store.metrics().record_replay_pass_failed();
                    warn!(
                        replayed,
                        remaining = snapshot.len() - replayed,
                        "replay stopped: {}",
                        fault
                    );
                    return Ok(ReplayReport::Stopped {
                        replayed,
                        pending: snapshot.len(),
                        fault,
                    });
                }
            }
        }

        let ids: Vec<String> = snapshot.iter().map(|e| e.id.clone()).collect();
        self.store.queue_prune(&ids)?;
        info!(replayed, "queue replay complete");
        Ok(ReplayReport::Completed { replayed })
    }
}
