//! Prompt templates for the deliberation flow

use crate::session::message::Message;

/// Longest excerpt of a single message quoted back into a prompt
const EXCERPT_LIMIT: usize = 600;

/// Templates for generating prompts at each round
pub struct PromptTemplate;

impl PromptTemplate {
    /// System preamble sent with every round prompt
    pub fn participant_system() -> &'static str {
        r#"You are one voice in a council deliberating together over several rounds.
Speak in your own voice. Build on what others have said when it helps, disagree when you must.
Be concise. Say what you notice about the conversation itself, not only about the topic."#
    }

    /// First round: every participant answers the topic independently
    pub fn opening(topic: &str) -> String {
        format!(
            r#"The council is convened on the following topic:

{}

Offer your opening perspective."#,
            topic
        )
    }

    /// Middle rounds: respond to the transcript so far
    pub fn continuation(topic: &str, round: u32, transcript: &[Message]) -> String {
        let mut prompt = format!("Topic: {}\n\nRound {} of the council.\n", topic, round);
        push_transcript(&mut prompt, transcript);
        prompt.push_str(
            r#"
Respond to what has been said. Where do you agree, where do you differ,
and what is emerging that no single voice said alone?"#,
        );
        prompt
    }

    /// Final permitted round: reflect on the deliberation as a whole
    pub fn reflection(topic: &str, transcript: &[Message]) -> String {
        let mut prompt = format!("Topic: {}\n\nThis is the closing round.\n", topic);
        push_transcript(&mut prompt, transcript);
        prompt.push_str(
            r#"
Reflect on the deliberation as a whole: what did the council arrive at together,
and what remains open?"#,
        );
        prompt
    }

    /// Text spoken by a resonating memory
    pub fn memory_voice(summary: &str, score: f64) -> String {
        format!(
            "[memory resonance {:.2}] A past council speaks: {}",
            score,
            excerpt(summary)
        )
    }
}

fn push_transcript(prompt: &mut String, transcript: &[Message]) {
    if transcript.is_empty() {
        return;
    }
    prompt.push_str("\nRecent contributions:\n");
    for message in transcript {
        prompt.push_str(&format!(
            "\n--- #{} {} ---\n{}\n",
            message.sequence,
            message.author,
            excerpt(&message.content)
        ));
    }
}

/// Cut `text` to the excerpt limit on a UTF-8 boundary, marking the cut
fn excerpt(text: &str) -> String {
    if text.len() <= EXCERPT_LIMIT {
        return text.to_string();
    }
    let mut end = EXCERPT_LIMIT.saturating_sub(3);
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{ParticipantId, SessionId};
    use crate::indicator::IndicatorVector;
    use crate::session::message::{Author, MessageKind};
    use chrono::Utc;

    fn message(seq: u64, content: &str) -> Message {
        Message {
            session_id: SessionId::new("s"),
            round: 1,
            sequence: seq,
            author: Author::Participant(ParticipantId::new("anthropic", "v1")),
            kind: MessageKind::Proposal,
            content: content.to_string(),
            indicators: IndicatorVector::new(),
            memory_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_opening_contains_topic() {
        let prompt = PromptTemplate::opening("What is care?");
        assert!(prompt.contains("What is care?"));
    }

    #[test]
    fn test_continuation_quotes_transcript() {
        let transcript = vec![message(1, "Care is attention."), message(2, "Care is action.")];
        let prompt = PromptTemplate::continuation("What is care?", 2, &transcript);
        assert!(prompt.contains("Round 2"));
        assert!(prompt.contains("#1 anthropic@v1"));
        assert!(prompt.contains("Care is action."));
    }

    #[test]
    fn test_reflection_without_transcript() {
        let prompt = PromptTemplate::reflection("What is care?", &[]);
        assert!(prompt.contains("closing round"));
        assert!(!prompt.contains("Recent contributions"));
    }

    #[test]
    fn test_long_messages_are_cut() {
        let long = "é".repeat(1000);
        let prompt = PromptTemplate::continuation("t", 2, &[message(1, &long)]);
        assert!(prompt.contains("..."));
        assert!(prompt.len() < long.len());
    }

    #[test]
    fn test_memory_voice() {
        let voice = PromptTemplate::memory_voice("We learned to listen.", 0.912);
        assert!(voice.contains("0.91"));
        assert!(voice.contains("We learned to listen."));
    }
}
