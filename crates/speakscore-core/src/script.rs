//! Scripted interviewer prompt banks
//!
//! The interview opens with a scripted greeting, and when no oracle key is
//! configured the dialogue driver walks these banks instead of calling out:
//! warmup, behavioral, technical, follow-ups, then closing.

use speakscore_types::{Turn, TurnRole};

pub const WARMUP_PROMPTS: &[&str] = &[
    "Hello! I'm your English interview coach. Could you briefly introduce yourself?",
    "Great to meet you. What motivated you to practice your speaking skills today?",
];

pub const BEHAVIORAL_PROMPTS: &[&str] = &[
    "Tell me about a time when you had to solve a challenging problem at work.",
    "Describe a situation where you collaborated with a team to achieve a goal.",
    "Can you share an example of when you had to learn something quickly?",
];

pub const TECH_PROMPTS: &[&str] = &[
    "Imagine you must explain a complex concept from your field to a new colleague. How would you approach it?",
    "What tools or technologies are essential in your day-to-day work?",
];

pub const FOLLOW_UPS: &[&str] = &[
    "What was the outcome and what did you learn?",
    "How did your colleagues respond?",
    "If you had another chance, what would you do differently?",
];

pub const CLOSING_PROMPTS: &[&str] = &[
    "Thanks for sharing those insights. Do you have any questions for me before we wrap up?",
    "It was great speaking with you today. Ready for your feedback?",
];

/// Greeting used as the first assistant turn of every session
pub fn greeting() -> &'static str {
    WARMUP_PROMPTS[0]
}

/// Pick the next scripted interviewer prompt for the given history.
/// Progression depends on how many user answers have been given so far.
pub fn next_prompt(history: &[Turn]) -> &'static str {
    let user_turns = history.iter().filter(|t| t.role == TurnRole::User).count();
    let assistant_turns = history
        .iter()
        .filter(|t| t.role == TurnRole::Assistant)
        .count();

    if assistant_turns == 0 {
        return WARMUP_PROMPTS[0];
    }

    if user_turns <= 1 && assistant_turns < WARMUP_PROMPTS.len() {
        return WARMUP_PROMPTS[assistant_turns];
    }

    if user_turns <= 3 {
        let index = assistant_turns.saturating_sub(WARMUP_PROMPTS.len()) % BEHAVIORAL_PROMPTS.len();
        return BEHAVIORAL_PROMPTS[index];
    }

    if user_turns == 4 {
        return TECH_PROMPTS[0];
    }

    if user_turns >= 5 && user_turns < 7 {
        return FOLLOW_UPS[(user_turns - 5) % FOLLOW_UPS.len()];
    }

    CLOSING_PROMPTS[assistant_turns.saturating_sub(user_turns) % CLOSING_PROMPTS.len()]
}
