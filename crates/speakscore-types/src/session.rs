use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the participant interacts with the interview client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    #[default]
    Text,
    Voice,
}

/// Speaker of a single transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One transcript entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Participant consent metadata
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Consent {
    pub granted: bool,
    pub granted_at: Option<DateTime<Utc>>,
}

/// Optional participant identity attached to a session
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Participant {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub consent: Consent,
}

/// Per-interview state, keyed by `id` in the session store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub mode: InteractionMode,
    pub duration_minutes: u32,
    pub participant: Option<Participant>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub turns: Vec<Turn>,
    /// Completed user/assistant exchanges, incremented by the dialogue driver
    pub turns_completed: u32,
}

impl Session {
    pub fn new(
        mode: InteractionMode,
        duration_minutes: u32,
        participant: Option<Participant>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            mode,
            duration_minutes,
            participant,
            started_at: Utc::now(),
            ended_at: None,
            turns: Vec::new(),
            turns_completed: 0,
        }
    }

    pub fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    /// Whitespace-delimited token count across all user turns
    pub fn word_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| t.role == TurnRole::User)
            .map(|t| t.text.split_whitespace().count())
            .sum()
    }

    /// Elapsed whole seconds since the session started
    pub fn duration_seconds(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds()
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn user_turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| t.role == TurnRole::User)
    }
}

/// Result of finishing a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub summary: String,
    pub word_count: usize,
    pub duration_seconds: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_count_only_counts_user_turns() {
        let mut session = Session::new(InteractionMode::Text, 10, None);
        session.push_turn(TurnRole::Assistant, "Hello there, please introduce yourself.");
        session.push_turn(TurnRole::User, "I am a software engineer from Ankara.");
        session.push_turn(TurnRole::Assistant, "Tell me more.");
        session.push_turn(TurnRole::User, "I build web services.");

        assert_eq!(session.word_count(), 11);
    }

    #[test]
    fn word_count_matches_eight_turns_of_twenty_words() {
        let mut session = Session::new(InteractionMode::Voice, 10, None);
        let answer = (0..20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        for _ in 0..8 {
            session.push_turn(TurnRole::Assistant, "Next question.");
            session.push_turn(TurnRole::User, answer.clone());
        }

        assert_eq!(session.word_count(), 160);
    }

    #[test]
    fn sessions_get_unique_ids() {
        let a = Session::new(InteractionMode::Text, 10, None);
        let b = Session::new(InteractionMode::Text, 10, None);
        assert_ne!(a.id, b.id);
    }
}
