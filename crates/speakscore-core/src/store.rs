//! Keyed session storage
//!
//! Sessions live behind an explicit get/put/delete interface so the backing
//! store can be swapped for a real datastore without touching any evaluation
//! logic. The in-memory implementation is the only one shipped; operations
//! on different sessions never contend beyond the map lock.

use async_trait::async_trait;
use speakscore_types::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Key-value interface over per-interview state
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Option<Session>;
    async fn put(&self, session: Session);
    async fn delete(&self, session_id: &str);
}

/// Process-lifetime session store backed by a hash map
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().await.get(session_id).cloned()
    }

    async fn put(&self, session: Session) {
        self.sessions
            .lock()
            .await
            .insert(session.id.clone(), session);
    }

    async fn delete(&self, session_id: &str) {
        self.sessions.lock().await.remove(session_id);
    }
}
