//! Session lifecycle operations on top of the keyed store

use crate::error::CoreError;
use crate::script;
use crate::store::SessionStore;
use chrono::Utc;
use speakscore_types::{
    InteractionMode, Participant, Session, SessionSummary, TurnRole,
};
use std::sync::Arc;
use tracing::info;

/// start / append / finish operations, injected with the store they mutate
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Create a session with a fresh id and the scripted assistant greeting
    /// as its first turn.
    pub async fn start(
        &self,
        mode: InteractionMode,
        duration_minutes: u32,
        participant: Option<Participant>,
    ) -> Session {
        let mut session = Session::new(mode, duration_minutes, participant);
        session.push_turn(TurnRole::Assistant, script::greeting());
        info!(session_id = %session.id, ?mode, "Session started");
        self.store.put(session.clone()).await;
        session
    }

    pub async fn get(&self, session_id: &str) -> Result<Session, CoreError> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| CoreError::NotFound(session_id.to_string()))
    }

    /// Append one turn to an existing session
    pub async fn append_turn(
        &self,
        session_id: &str,
        role: TurnRole,
        text: impl Into<String>,
    ) -> Result<Session, CoreError> {
        let mut session = self.get(session_id).await?;
        session.push_turn(role, text);
        self.store.put(session.clone()).await;
        Ok(session)
    }

    /// Persist a session mutated by the caller (dialogue driver commit path)
    pub async fn put(&self, session: Session) {
        self.store.put(session).await;
    }

    /// Close the session: word count over user turns, wall-clock duration in
    /// whole seconds. Calling finish twice is a conflict.
    pub async fn finish(&self, session_id: &str) -> Result<SessionSummary, CoreError> {
        let mut session = self.get(session_id).await?;
        if session.is_finished() {
            return Err(CoreError::AlreadyFinished(session_id.to_string()));
        }
        session.ended_at = Some(Utc::now());
        let summary = SessionSummary {
            session_id: session.id.clone(),
            summary: "Conversation completed. Awaiting evaluation.".to_string(),
            word_count: session.word_count(),
            duration_seconds: session.duration_seconds(),
        };
        info!(
            session_id = %session.id,
            word_count = summary.word_count,
            duration_seconds = summary.duration_seconds,
            "Session finished"
        );
        self.store.put(session).await;
        Ok(summary)
    }
}
