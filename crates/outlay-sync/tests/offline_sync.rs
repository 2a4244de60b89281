//! End-to-end offline/online scenarios against an in-memory gateway.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;

use outlay_store::LocalStore;
use outlay_sync::{ReceiptFile, RemoteGateway, ReplayReport, SyncEngine};
use outlay_types::{Category, Collection, Expense, ExpenseDraft, Fault, MonthWindow};

/// In-memory stand-in for the remote service. Rows live in vectors; the
/// `online` flag decides whether calls succeed, and individual upserts can
/// be failed by title to stop a replay pass mid-queue.
struct MockGateway {
    online: AtomicBool,
    user: Mutex<Option<String>>,
    expenses: Mutex<Vec<Expense>>,
    categories: Mutex<Vec<Category>>,
    /// Upserts whose payload title matches fail with a transient fault.
    fail_title: Mutex<Option<String>>,
    allow_uploads: AtomicBool,
    identity_lookups: AtomicUsize,
    upsert_log: Mutex<Vec<(Collection, Value, Option<String>)>>,
    /// When set, upserts signal entry and then block until released.
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl MockGateway {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            user: Mutex::new(Some("u1".to_string())),
            expenses: Mutex::new(Vec::new()),
            categories: Mutex::new(Vec::new()),
            fail_title: Mutex::new(None),
            allow_uploads: AtomicBool::new(true),
            identity_lookups: AtomicUsize::new(0),
            upsert_log: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        })
    }

    fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::Relaxed);
    }

    fn expense_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.expenses.lock().iter().map(|e| e.id.clone()).collect();
        ids.sort();
        ids
    }

    fn offline() -> Fault {
        Fault::transient("connection refused")
    }
}

impl RemoteGateway for MockGateway {
    fn current_user_id(&self) -> Option<String> {
        self.identity_lookups.fetch_add(1, Ordering::Relaxed);
        self.user.lock().clone()
    }

    fn fetch_expenses(&self, window: Option<&MonthWindow>) -> Result<Vec<Expense>, Fault> {
        if !self.online.load(Ordering::Relaxed) {
            return Err(Self::offline());
        }
        let mut rows = self.expenses.lock().clone();
        if let Some(window) = window {
            rows.retain(|e| window.contains(e.occurred_on));
        }
        rows.sort_by(|a, b| b.occurred_on.cmp(&a.occurred_on));
        Ok(rows)
    }

    fn fetch_categories(&self) -> Result<Vec<Category>, Fault> {
        if !self.online.load(Ordering::Relaxed) {
            return Err(Self::offline());
        }
        Ok(self.categories.lock().clone())
    }

    fn upsert_payload(
        &self,
        collection: Collection,
        payload: &Value,
        owner: Option<&str>,
    ) -> Result<(), Fault> {
        if !self.online.load(Ordering::Relaxed) {
            return Err(Self::offline());
        }
        // One-shot: taken out of the mutex so blocking here cannot hold it.
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            entered.send(()).ok();
            release.recv().ok();
        }
        if let Some(fail) = self.fail_title.lock().as_ref() {
            if payload.get("title").and_then(|v| v.as_str()) == Some(fail.as_str()) {
                return Err(Fault::transient("injected upsert failure"));
            }
        }
        self.upsert_log
            .lock()
            .push((collection, payload.clone(), owner.map(String::from)));
        match collection {
            Collection::Expenses => apply_expense(&mut self.expenses.lock(), payload, owner),
            Collection::Categories => {}
        }
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<(), Fault> {
        if !self.online.load(Ordering::Relaxed) {
            return Err(Self::offline());
        }
        match collection {
            Collection::Expenses => self.expenses.lock().retain(|e| e.id != id),
            Collection::Categories => self.categories.lock().retain(|c| c.id != id),
        }
        Ok(())
    }

    fn upload_receipt(&self, original_name: &str, _bytes: &[u8]) -> Result<String, Fault> {
        if self.allow_uploads.load(Ordering::Relaxed) {
            Ok(format!("u1/{}", original_name))
        } else {
            Err(Fault::upload("bucket unavailable"))
        }
    }

    fn probe(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }
}

/// Materialize an upsert the way the real service would: payload fields
/// win, the resolved owner and default currency fill the gaps, and the row
/// replaces any existing row with the same id.
fn apply_expense(rows: &mut Vec<Expense>, payload: &Value, owner: Option<&str>) {
    let id = payload
        .get("id")
        .and_then(|v| v.as_str())
        .expect("mock upserts need an explicit id")
        .to_string();
    let occurred_on: DateTime<Utc> = payload["occurred_on"].as_str().unwrap().parse().unwrap();
    let expense = Expense {
        id: id.clone(),
        title: payload["title"].as_str().unwrap_or_default().to_string(),
        amount: payload["amount"].as_f64().unwrap_or_default(),
        currency: payload
            .get("currency")
            .and_then(|v| v.as_str())
            .unwrap_or("USD")
            .to_string(),
        category_id: payload
            .get("category_id")
            .and_then(|v| v.as_str())
            .map(String::from),
        occurred_on,
        notes: payload.get("notes").and_then(|v| v.as_str()).map(String::from),
        images: payload
            .get("images")
            .and_then(|v| serde_json::from_value(v.clone()).ok()),
        owner_id: payload
            .get("owner_id")
            .and_then(|v| v.as_str())
            .or(owner)
            .unwrap_or_default()
            .to_string(),
        created_at: occurred_on,
    };
    if let Some(existing) = rows.iter_mut().find(|e| e.id == id) {
        *existing = expense;
    } else {
        rows.push(expense);
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn draft(id: &str, title: &str, amount: f64) -> ExpenseDraft {
    let mut draft = ExpenseDraft::new(title, amount, ts("2024-02-10T09:30:00Z"));
    draft.id = Some(id.to_string());
    draft
}

fn engine_with(gateway: Arc<MockGateway>) -> (TempDir, Arc<SyncEngine<MockGateway>>) {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(LocalStore::open(dir.path()).unwrap());
    (dir, Arc::new(SyncEngine::new(gateway, store)))
}

#[test]
fn test_online_save_applies_remotely_and_refreshes_cache() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    engine.save_expense(draft("e1", "coffee", 4.5), None).unwrap();

    assert_eq!(gateway.expense_ids(), vec!["e1"]);
    assert_eq!(engine.store().queue_len().unwrap(), 0);

    // The snapshot was refreshed as part of the save.
    let cached: Vec<Expense> = engine.store().cache_get("expenses").unwrap().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id, "e1");
}

#[test]
fn test_offline_save_queues_and_reports_success() {
    let gateway = MockGateway::new();
    gateway.set_online(false);
    let (_dir, engine) = engine_with(gateway.clone());

    // The caller proceeds optimistically.
    engine.save_expense(draft("e1", "coffee", 4.5), None).unwrap();

    assert!(gateway.expense_ids().is_empty());
    let queued = engine.store().queue_all().unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].table, Collection::Expenses);
}

#[test]
fn test_read_falls_back_to_exact_cached_snapshot() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    engine.save_expense(draft("e1", "coffee", 4.5), None).unwrap();
    engine.save_expense(draft("e2", "lunch", 12.0), None).unwrap();
    let online_view = engine.reads().expenses(None);
    assert_eq!(online_view.len(), 2);

    gateway.set_online(false);
    let offline_view = engine.reads().expenses(None);
    assert_eq!(offline_view, online_view);
}

#[test]
fn test_read_with_no_cache_returns_empty() {
    let gateway = MockGateway::new();
    gateway.set_online(false);
    let (_dir, engine) = engine_with(gateway);

    assert!(engine.reads().expenses(None).is_empty());
    assert!(engine.reads().categories().is_empty());
}

#[test]
fn test_validation_rejects_before_any_interaction() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    let blank_title = engine.save_expense(draft("e1", "   ", 5.0), None);
    assert!(matches!(blank_title, Err(Fault::Validation(_))));

    let zero_amount = engine.save_expense(draft("e2", "ok", 0.0), None);
    assert!(matches!(zero_amount, Err(Fault::Validation(_))));

    let nan_amount = engine.save_expense(draft("e3", "ok", f64::NAN), None);
    assert!(matches!(nan_amount, Err(Fault::Validation(_))));

    assert!(gateway.upsert_log.lock().is_empty());
    assert_eq!(engine.store().queue_len().unwrap(), 0);
}

#[test]
fn test_offline_delete_replays_and_drains_queue() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    engine.save_expense(draft("x", "doomed", 9.0), None).unwrap();
    assert_eq!(gateway.expense_ids(), vec!["x"]);

    gateway.set_online(false);
    engine.delete_expense("x").unwrap();
    assert_eq!(engine.store().queue_len().unwrap(), 1);
    // Still present remotely; the delete is only buffered.
    assert_eq!(gateway.expense_ids(), vec!["x"]);

    gateway.set_online(true);
    let report = engine.try_sync().unwrap();
    assert!(matches!(report, ReplayReport::Completed { replayed: 1 }));

    assert_eq!(engine.store().queue_len().unwrap(), 0);
    assert!(gateway.expense_ids().is_empty());
    assert!(engine.reads().expenses(None).is_empty());
}

#[test]
fn test_replay_stops_at_first_failure_and_queue_is_untouched() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    gateway.set_online(false);
    engine.save_expense(draft("e1", "first", 1.0), None).unwrap();
    engine.save_expense(draft("e2", "second", 2.0), None).unwrap();
    engine.save_expense(draft("e3", "third", 3.0), None).unwrap();

    gateway.set_online(true);
    *gateway.fail_title.lock() = Some("second".to_string());

    let report = engine.try_sync().unwrap();
    match report {
        ReplayReport::Stopped { replayed, pending, .. } => {
            assert_eq!(replayed, 1);
            assert_eq!(pending, 3);
        }
        other => panic!("expected Stopped, got {:?}", other),
    }

    // The first entry reached the remote; the queue still holds all three
    // in their original order.
    assert_eq!(gateway.expense_ids(), vec!["e1"]);
    let queued = engine.store().queue_all().unwrap();
    let titles: Vec<&str> = queued
        .iter()
        .map(|e| e.payload["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["first", "second", "third"]);

    // Next pass re-applies the first entry too; upserts are idempotent by
    // id, so the final state matches a single clean replay.
    *gateway.fail_title.lock() = None;
    let report = engine.try_sync().unwrap();
    assert!(matches!(report, ReplayReport::Completed { replayed: 3 }));
    assert_eq!(gateway.expense_ids(), vec!["e1", "e2", "e3"]);
    assert_eq!(engine.store().queue_len().unwrap(), 0);
}

#[test]
fn test_interleaved_online_offline_calls_all_reach_remote() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    engine.save_expense(draft("e1", "a", 1.0), None).unwrap();
    gateway.set_online(false);
    engine.save_expense(draft("e2", "b", 2.0), None).unwrap();
    engine.save_expense(draft("e3", "c", 3.0), None).unwrap();
    gateway.set_online(true);
    engine.save_expense(draft("e4", "d", 4.0), None).unwrap();

    let report = engine.try_sync().unwrap();
    assert!(matches!(report, ReplayReport::Completed { replayed: 2 }));
    assert_eq!(gateway.expense_ids(), vec!["e1", "e2", "e3", "e4"]);
}

#[test]
fn test_replay_resolves_identity_once_and_merges_owner() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    gateway.set_online(false);
    engine.save_expense(draft("e1", "a", 1.0), None).unwrap();
    engine.save_expense(draft("e2", "b", 2.0), None).unwrap();

    gateway.set_online(true);
    gateway.identity_lookups.store(0, Ordering::Relaxed);
    engine.try_sync().unwrap();

    // One lookup for the whole batch.
    assert_eq!(gateway.identity_lookups.load(Ordering::Relaxed), 1);

    let log = gateway.upsert_log.lock();
    assert_eq!(log.len(), 2);
    for (_, _, owner) in log.iter() {
        assert_eq!(owner.as_deref(), Some("u1"));
    }
    drop(log);

    let rows = gateway.expenses.lock();
    assert!(rows.iter().all(|e| e.owner_id == "u1" && e.currency == "USD"));
}

#[test]
fn test_empty_queue_replay_is_a_no_op() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    let report = engine.try_sync().unwrap();
    assert!(matches!(report, ReplayReport::Empty));
    assert!(gateway.upsert_log.lock().is_empty());
}

#[test]
fn test_receipt_upload_failure_still_saves_expense() {
    let gateway = MockGateway::new();
    gateway.allow_uploads.store(false, Ordering::Relaxed);
    let (_dir, engine) = engine_with(gateway.clone());

    let receipt = ReceiptFile {
        name: "receipt.jpg".to_string(),
        bytes: vec![1, 2, 3],
    };
    engine
        .save_expense(draft("e1", "dinner", 40.0), Some(receipt))
        .unwrap();

    let rows = gateway.expenses.lock();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].images, None);
}

#[test]
fn test_receipt_upload_success_attaches_path() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    let receipt = ReceiptFile {
        name: "receipt.jpg".to_string(),
        bytes: vec![1, 2, 3],
    };
    engine
        .save_expense(draft("e1", "dinner", 40.0), Some(receipt))
        .unwrap();

    let rows = gateway.expenses.lock();
    assert_eq!(rows[0].images, Some(vec!["u1/receipt.jpg".to_string()]));
}

#[test]
fn test_concurrent_replay_triggers_coalesce() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    gateway.set_online(false);
    engine.save_expense(draft("e1", "slow", 1.0), None).unwrap();
    gateway.set_online(true);

    // Make the next upsert block until released.
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    *gateway.gate.lock() = Some((entered_tx, release_rx));

    let background = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.try_sync().unwrap())
    };

    // Wait until the background pass is inside the gateway call, then a
    // second trigger must coalesce instead of running concurrently.
    entered_rx.recv().unwrap();
    let second = engine.try_sync().unwrap();
    assert!(matches!(second, ReplayReport::AlreadyRunning));

    release_tx.send(()).unwrap();
    let first = background.join().unwrap();
    assert!(matches!(first, ReplayReport::Completed { replayed: 1 }));
    assert_eq!(engine.store().queue_len().unwrap(), 0);
}

#[test]
fn test_month_filtered_fetch_uses_half_open_window() {
    let gateway = MockGateway::new();
    let (_dir, engine) = engine_with(gateway.clone());

    let mut on_boundary_start = draft("feb", "on start", 1.0);
    on_boundary_start.occurred_on = ts("2024-02-01T00:00:00Z");
    let mut inside = draft("mid", "mid month", 2.0);
    inside.occurred_on = ts("2024-02-15T12:00:00Z");
    let mut on_boundary_end = draft("mar", "on end", 3.0);
    on_boundary_end.occurred_on = ts("2024-03-01T00:00:00Z");

    engine.save_expense(on_boundary_start, None).unwrap();
    engine.save_expense(inside, None).unwrap();
    engine.save_expense(on_boundary_end, None).unwrap();

    let window = MonthWindow::parse("2024-02").unwrap();
    let rows = engine.reads().expenses(Some(&window));
    let mut ids: Vec<&str> = rows.iter().map(|e| e.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["feb", "mid"]);
}
