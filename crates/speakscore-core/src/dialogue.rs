//! Interview dialogue driver
//!
//! Turns the candidate's message into the next interviewer prompt. With an
//! oracle key configured the reply comes from the model under the fixed
//! interviewer persona; otherwise the scripted prompt banks drive the
//! interview. A failed oracle call records nothing: the user turn is only
//! committed together with the assistant reply, so the caller can retry the
//! same message.

use crate::error::CoreError;
use crate::script;
use crate::sessions::SessionService;
use crate::settings::SharedSettings;
use speakscore_oracle::prompt::dialogue_messages;
use speakscore_types::{ChatResponse, TurnRole};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct DialogueDriver {
    sessions: SessionService,
    settings: SharedSettings,
}

impl DialogueDriver {
    pub fn new(sessions: SessionService, settings: SharedSettings) -> Self {
        Self { sessions, settings }
    }

    /// One chat turn: produce the interviewer's follow-up, then commit both
    /// turns and bump the turn counter.
    pub async fn respond(
        &self,
        session_id: &str,
        user_message: &str,
    ) -> Result<ChatResponse, CoreError> {
        let mut session = self.sessions.get(session_id).await?;

        let oracle = {
            let guard = self.settings.read().await;
            guard.oracle.client()
        };

        let assistant_message = match oracle {
            Some(client) => {
                debug!(session_id, "Requesting interviewer follow-up from oracle");
                client
                    .chat(dialogue_messages(&session.turns, user_message))
                    .await
                    .map_err(|e| {
                        warn!(session_id, error = %e, "Oracle chat call failed; turn not recorded");
                        CoreError::from(e)
                    })?
            }
            None => {
                // Offline mode: walk the scripted banks instead.
                let mut preview = session.turns.clone();
                preview.push(speakscore_types::Turn::new(TurnRole::User, user_message));
                script::next_prompt(&preview).to_string()
            }
        };

        session.push_turn(TurnRole::User, user_message);
        session.push_turn(TurnRole::Assistant, &assistant_message);
        session.turns_completed += 1;
        let turns_completed = session.turns_completed;
        self.sessions.put(session).await;

        Ok(ChatResponse {
            assistant_message,
            turns_completed,
        })
    }
}
