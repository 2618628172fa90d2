//! Prompt construction for the dialogue loop and the per-standard scoring calls

use crate::completion::ChatMessage;
use serde_json::json;
use speakscore_types::{StandardDefinition, TranscriptMetadata, Turn};

/// Fixed interviewer persona for the dialogue loop
const INTERVIEWER_PERSONA: &str = "You are an encouraging English interview coach conducting a \
spoken interview practice session. Ask exactly one follow-up question per turn, keep your \
questions short and conversational, and stay on interview-style topics (experience, teamwork, \
problem solving, day-to-day work). Never correct the candidate's language mid-conversation; \
feedback comes later in a written report.";

/// Chat messages for one dialogue turn: persona, full history, then the
/// not-yet-committed candidate message.
pub fn dialogue_messages(history: &[Turn], user_message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(INTERVIEWER_PERSONA));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::user(user_message));
    messages
}

/// Messages for one standard's evaluation-only scoring call.
///
/// The system prompt embeds the rubric definition (criterion ids, labels,
/// weights, scale bounds) and pins the exact JSON shape the evaluator will
/// decode; the user message carries the transcript and session metadata.
pub fn evaluation_messages(
    standard: &StandardDefinition,
    transcript: &[Turn],
    metadata: &TranscriptMetadata,
) -> Vec<ChatMessage> {
    let criteria_lines: Vec<String> = standard
        .criteria
        .iter()
        .map(|c| {
            format!(
                "  - id: \"{}\", label: \"{}\", weight: {}",
                c.id, c.label, c.weight
            )
        })
        .collect();

    let criteria_schema: Vec<String> = standard
        .criteria
        .iter()
        .map(|c| format!("    \"{}\": {{\"score\": <number>, \"comment\": \"...\"}}", c.id))
        .collect();

    let system = format!(
        "You are an expert English Speaking Assessment Rater with official training in the {label} \
examination system, and you are familiar with CEFR level descriptors.\n\
\n\
Analyze the full transcript of a spoken English interview between a candidate and an \
interviewer, and score the candidate against this rubric:\n\
\n\
Scale: {min} to {max} (scores may use decimals within these bounds).\n\
Criteria:\n{criteria}\n\
\n\
Pay attention to fluency and speech rate, vocabulary range and precision, grammatical accuracy \
and complexity, coherence and logical sequencing, and pronunciation patterns visible in the \
transcript. Identify up to 5 recurrent language errors with a representative example and a \
suggested fix, give 5 personalized one-line study recommendations based on the weaknesses \
detected, and quote up to 3 short passages from the candidate as evidence.\n\
\n\
Return a single valid JSON object exactly in this format:\n\
{{\n\
  \"criteria\": {{\n{schema}\n  }},\n\
  \"common_errors\": [{{\"issue\": \"...\", \"example\": \"...\", \"fix\": \"...\"}}],\n\
  \"recommendations\": [\"...\", \"...\", \"...\", \"...\", \"...\"],\n\
  \"evidence_quotes\": [\"...\"]\n\
}}\n\
\n\
Every criterion id listed above must appear in \"criteria\" with a score inside the scale \
bounds. Use double quotes for all keys and strings.",
        label = standard.label,
        min = standard.scale.min,
        max = standard.scale.max,
        criteria = criteria_lines.join("\n"),
        schema = criteria_schema.join(",\n"),
    );

    let user_payload = json!({
        "transcript": transcript,
        "metadata": metadata,
    });

    vec![
        ChatMessage::system(system),
        ChatMessage::user(user_payload.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use speakscore_types::{toefl_standard, TurnRole};

    #[test]
    fn dialogue_messages_start_with_persona_and_end_with_candidate() {
        let history = vec![
            Turn::new(TurnRole::Assistant, "Please introduce yourself."),
            Turn::new(TurnRole::User, "I'm a nurse."),
        ];
        let messages = dialogue_messages(&history, "I work night shifts.");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "assistant");
        assert_eq!(messages[2].role, "user");
        assert_eq!(messages.last().unwrap().content, "I work night shifts.");
    }

    #[test]
    fn evaluation_prompt_embeds_every_criterion_id() {
        let standard = toefl_standard();
        let transcript = vec![Turn::new(TurnRole::User, "I am agree with that.")];
        let messages = evaluation_messages(&standard, &transcript, &TranscriptMetadata::default());

        assert_eq!(messages.len(), 2);
        let system = &messages[0].content;
        for criterion in &standard.criteria {
            assert!(system.contains(&criterion.id), "missing {}", criterion.id);
        }
        assert!(system.contains("0 to 4"));
        assert!(messages[1].content.contains("I am agree with that."));
    }
}
