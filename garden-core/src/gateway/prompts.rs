//! Prompts for the three gateway operations.

use super::ChatRequest;
use crate::memory::Memory;

pub const SENTIMENT_SYSTEM: &str = "Analyze the emotional sentiment of the given text and respond \
with only one of these emotions: joy, sadness, anger, fear, love, surprise, peace, nostalgia. \
Choose the most dominant emotion.";

pub const COMPLETION_SYSTEM: &str = "Complete the following journal entry in a natural, personal \
way. Keep it authentic and meaningful. Only provide the completion, not the original text.";

pub const RELATED_SYSTEM: &str = "Given a current memory and a list of other memories, identify \
which memories are thematically related. Return only the IDs of related memories as a \
comma-separated list.";

pub fn sentiment(text: &str) -> ChatRequest {
    ChatRequest::new(SENTIMENT_SYSTEM, text)
        .with_temperature(0.3)
        .with_max_tokens(50)
}

pub fn completion(partial: &str) -> ChatRequest {
    ChatRequest::new(COMPLETION_SYSTEM, partial)
        .with_temperature(0.7)
        .with_max_tokens(200)
}

/// Prompt listing every candidate as `id: title - description`.
pub fn related<'a>(subject: &Memory, candidates: impl IntoIterator<Item = &'a Memory>) -> ChatRequest {
    let lines = candidates
        .into_iter()
        .map(Memory::prompt_line)
        .collect::<Vec<_>>()
        .join("\n");
    let user = format!(
        "Current memory: {} - {}\n\nOther memories:\n{}",
        subject.title, subject.description, lines
    );
    ChatRequest::new(RELATED_SYSTEM, user)
        .with_temperature(0.3)
        .with_max_tokens(100)
}
