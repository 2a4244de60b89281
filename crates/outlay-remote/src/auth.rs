//! Identity boundary: sessions, sign-in/out, and session-changed events.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use outlay_types::Fault;

use crate::config::GatewayConfig;

/// An authenticated session: the bearer token plus the stable user id it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Session lifecycle events delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn { user_id: String },
    SignedOut,
}

type Listener = Box<dyn Fn(&SessionEvent) + Send + Sync>;
type ListenerMap = Mutex<HashMap<u64, Listener>>;

/// Shared session state, optionally persisted to a file so it survives
/// restarts. Cloning shares the underlying state.
#[derive(Clone)]
pub struct SessionStore {
    current: Arc<RwLock<Option<Session>>>,
    file: Option<PathBuf>,
    listeners: Arc<ListenerMap>,
    next_listener_id: Arc<AtomicU64>,
}

impl SessionStore {
    /// In-memory store; the session dies with the process.
    pub fn in_memory() -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            file: None,
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// File-backed store; loads any previously persisted session.
    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let existing = std::fs::read_to_string(&path)
            .ok()
            .and_then(|json| serde_json::from_str::<Session>(&json).ok());
        if existing.is_some() {
            debug!(file = %path.display(), "restored persisted session");
        }
        Self {
            current: Arc::new(RwLock::new(existing)),
            file: Some(path),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// The active session, if any.
    pub fn current(&self) -> Option<Session> {
        self.current.read().clone()
    }

    /// The active user's id, if signed in.
    pub fn user_id(&self) -> Option<String> {
        self.current.read().as_ref().map(|s| s.user_id.clone())
    }

    /// Register a callback for session-changed events. The returned handle
    /// unsubscribes when dropped or when `unsubscribe` is called.
    pub fn subscribe<F>(&self, callback: F) -> SessionSubscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, Box::new(callback));
        SessionSubscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    fn replace(&self, session: Option<Session>) {
        let event = match &session {
            Some(s) => SessionEvent::SignedIn {
                user_id: s.user_id.clone(),
            },
            None => SessionEvent::SignedOut,
        };
        *self.current.write() = session.clone();
        self.persist(&session);
        for listener in self.listeners.lock().values() {
            listener(&event);
        }
    }

    fn persist(&self, session: &Option<Session>) {
        let Some(ref path) = self.file else {
            return;
        };
        let result = match session {
            Some(s) => serde_json::to_vec(s)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
                .and_then(|json| {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(path, json)
                }),
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            warn!(file = %path.display(), "failed to persist session: {}", e);
        }
    }
}

/// Unsubscribe handle for session events. Dropping it unsubscribes.
pub struct SessionSubscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl SessionSubscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().remove(&self.id);
        }
    }
}

/// Client for the identity endpoints.
pub struct AuthClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    sessions: SessionStore,
}

impl AuthClient {
    pub fn new(config: &GatewayConfig, sessions: SessionStore) -> Self {
        Self {
            agent: config.build_agent(),
            base_url: config.base_url().to_string(),
            api_key: config.api_key.clone(),
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Register a new account. The service may require email confirmation
    /// before the first sign-in succeeds.
    pub fn sign_up(&self, email: &str, password: &str) -> Result<(), Fault> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        self.agent
            .post(&url)
            .set("apikey", &self.api_key)
            .send_json(serde_json::json!({ "email": email, "password": password }))
            .map_err(|e| Fault::transient(format!("sign-up failed: {}", e)))?;
        Ok(())
    }

    /// Exchange email/password for a session and make it current.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session, Fault> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        let body: Value = self
            .agent
            .post(&url)
            .set("apikey", &self.api_key)
            .send_json(serde_json::json!({ "email": email, "password": password }))
            .map_err(|e| Fault::transient(format!("sign-in failed: {}", e)))?
            .into_json()
            .map_err(|e| Fault::transient(format!("bad sign-in response: {}", e)))?;

        let access_token = body
            .get("access_token")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Fault::transient("sign-in response missing access_token"))?
            .to_string();
        let user = body.get("user").cloned().unwrap_or(Value::Null);
        let user_id = user
            .get("id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Fault::transient("sign-in response missing user id"))?
            .to_string();
        let email = user
            .get("email")
            .and_then(|v| v.as_str())
            .map(String::from);

        let session = Session {
            access_token,
            user_id,
            email,
        };
        self.sessions.replace(Some(session.clone()));
        Ok(session)
    }

    /// Revoke the current session (best-effort remotely, always locally).
    pub fn sign_out(&self) -> Result<(), Fault> {
        if let Some(session) = self.sessions.current() {
            let url = format!("{}/auth/v1/logout", self.base_url);
            let result = self
                .agent
                .post(&url)
                .set("apikey", &self.api_key)
                .set("Authorization", &format!("Bearer {}", session.access_token))
                .call();
            if let Err(e) = result {
                debug!("remote sign-out failed, clearing local session anyway: {}", e);
            }
        }
        self.sessions.replace(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn session(user: &str) -> Session {
        Session {
            access_token: "tok".to_string(),
            user_id: user.to_string(),
            email: None,
        }
    }

    #[test]
    fn test_subscribe_receives_events() {
        let store = SessionStore::in_memory();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = store.subscribe(move |event| seen_clone.lock().push(event.clone()));

        store.replace(Some(session("u1")));
        store.replace(None);

        let events = seen.lock();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            SessionEvent::SignedIn {
                user_id: "u1".to_string()
            }
        );
        assert_eq!(events[1], SessionEvent::SignedOut);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = SessionStore::in_memory();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        let sub = store.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });

        store.replace(Some(session("u1")));
        drop(sub);
        store.replace(None);

        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_session_persists_across_store_instances() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::with_file(&path);
        store.replace(Some(session("u42")));

        let reopened = SessionStore::with_file(&path);
        assert_eq!(reopened.user_id(), Some("u42".to_string()));

        reopened.replace(None);
        let after_signout = SessionStore::with_file(&path);
        assert_eq!(after_signout.current(), None);
    }
}
