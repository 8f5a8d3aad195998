//! Offline provider built on keyword extraction.
//!
//! Useful without an API key and in tests. The answer is a numbered list,
//! so it takes the same normalizer path as a real completion.

use std::time::Instant;

use async_trait::async_trait;

use quizprep_core::quiz::parse_user_prompt;
use quizprep_core::text::{extract_key_concepts, sentences_with};
use quizprep_core::traits::{
    CompletionRequest, CompletionResponse, LlmProvider, ModelInfo, TokenUsage,
};

const DEFAULT_COUNT: usize = 5;
const MAX_QUOTE_CHARS: usize = 160;

/// Generates questions from the most frequent words of the note.
#[derive(Debug, Default)]
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }

    /// A numbered list of at most `count` questions about `text`.
    pub fn questions_for(text: &str, count: usize) -> String {
        let concepts: Vec<String> = extract_key_concepts(text, count)
            .into_iter()
            .map(|(word, _)| word)
            .collect();

        concepts
            .iter()
            .enumerate()
            .map(|(i, concept)| {
                let other = &concepts[(i + 1) % concepts.len()];
                format!("{}. {}", i + 1, question(i, concept, other, text))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn question(position: usize, concept: &str, other: &str, text: &str) -> String {
    match position % 5 {
        0 => match sentences_with(text, concept)
            .into_iter()
            .find(|s| s.chars().count() <= MAX_QUOTE_CHARS)
        {
            Some(sentence) => format!("Explain this statement from your notes: \"{sentence}\""),
            None => format!("What do your notes say about {concept}, and why does it matter?"),
        },
        1 => format!("Explain {concept} in your own words."),
        2 if concept != other => format!("How are {concept} and {other} related?"),
        2 => format!("Why is {concept} important?"),
        3 => format!("Give a concrete example that illustrates {concept}."),
        _ => format!("What would change if {concept} were missing or different?"),
    }
}

fn word_count(s: &str) -> u32 {
    s.split_whitespace().count() as u32
}

#[async_trait]
impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<CompletionResponse> {
        let start = Instant::now();
        let (text, count) =
            parse_user_prompt(&request.prompt).unwrap_or((request.prompt.as_str(), DEFAULT_COUNT));

        let content = Self::questions_for(text, count);
        tracing::debug!(count, "generated questions offline");

        let prompt_tokens = word_count(&request.prompt);
        let completion_tokens = word_count(&content);
        Ok(CompletionResponse {
            content,
            model: "local-keywords".into(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "local-keywords".into(),
            name: "Offline keyword questions".into(),
            provider: "local".into(),
            max_context: u32::MAX,
        }]
    }
}
