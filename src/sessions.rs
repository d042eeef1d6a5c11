use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session
///
/// A server-tracked handle that lets a client re-prove a prior successful
/// authentication. References exactly one employee; an employee may hold
/// any number of concurrent sessions.
#[derive(Debug, Clone)]
pub struct Session {
    /// The token handed to the client in the session cookie.
    pub id: Uuid,
    pub employee_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// SessionStore
///
/// Contract for session persistence. Swappable behind `Arc<dyn SessionStore>`
/// so handlers and extractors never depend on the concrete store.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Creates a session for `employee_id` valid for `ttl` from now.
    async fn create(&self, employee_id: Uuid, ttl: Duration) -> Session;

    /// Resolves a live session. Expired sessions are evicted and never
    /// returned.
    async fn get(&self, id: Uuid) -> Option<Session>;

    /// Destroys one session. Returns false if it did not exist.
    async fn destroy(&self, id: Uuid) -> bool;

    /// Drops every expired session; returns how many were removed.
    async fn purge_expired(&self) -> usize;
}

/// The shared handle stored in the application state.
pub type SessionState = Arc<dyn SessionStore>;

/// In-process session store. One `RwLock<HashMap>`; session create/destroy
/// are independent per caller, so the write lock is held only for the map
/// mutation itself.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, employee_id: Uuid, ttl: Duration) -> Session {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            employee_id,
            created_at: now,
            expires_at: now + ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        session
    }

    async fn get(&self, id: Uuid) -> Option<Session> {
        let found = self.sessions.read().await.get(&id).cloned();
        match found {
            Some(session) if session.is_expired() => {
                self.sessions.write().await.remove(&id);
                None
            }
            other => other,
        }
    }

    async fn destroy(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired());
        before - sessions.len()
    }
}
