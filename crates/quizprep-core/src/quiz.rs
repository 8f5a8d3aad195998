//! Quiz generation pipeline.
//!
//! Builds the prompt from a note, asks the provider, and normalizes whatever
//! comes back. Provider failures never reach the caller as errors: after the
//! retries run out the quiz is made of fallback questions and a warning is
//! attached.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ProviderError;
use crate::model::QuestionSet;
use crate::normalize::{Normalizer, RawResponse};
use crate::traits::{CompletionRequest, CompletionResponse, LlmProvider};

/// Upper bound for one retry wait, including server-requested ones.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Model and request tuning for question generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default)]
    pub frequency_penalty: f64,
    #[serde(default)]
    pub presence_penalty: f64,
    /// HTTP timeout for one completion.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Source text beyond this many characters is cut off.
    #[serde(default = "default_max_source_chars")]
    pub max_source_chars: usize,
    /// Language the questions are written in.
    #[serde(default = "default_language")]
    pub language: String,
    /// Retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each attempt.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_model() -> String {
    "deepseek/deepseek-r1-zero:free".to_string()
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    0.9
}
fn default_timeout() -> u64 {
    120
}
fn default_max_source_chars() -> usize {
    4000
}
fn default_language() -> String {
    "English".to_string()
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            timeout_secs: default_timeout(),
            max_source_chars: default_max_source_chars(),
            language: default_language(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// Marker appended to source text that was cut off.
pub const TRUNCATION_MARKER: &str = "...";

/// Keep at most `max_chars` characters of `text`.
pub fn truncate_source(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}{TRUNCATION_MARKER}", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

pub fn system_prompt(count: usize, language: &str) -> String {
    format!(
        "You are an expert educator who helps students prepare quizzes from their notes.\n\
         Your task is to write {count} relevant questions based on the text provided.\n\
         \n\
         Guidelines:\n\
         1. Ask questions that test deep understanding of the concepts, not simple recall\n\
         2. Ask open-ended questions that call for detailed answers\n\
         3. Focus on the key concepts and main ideas of the text\n\
         4. Vary the question types (explanation, comparison, analysis, application)\n\
         5. Return only the numbered list of questions, one per line, with no other text\n\
         6. Write the questions in {language}"
    )
}

pub fn user_prompt(text: &str, count: usize) -> String {
    format!(
        "Here is the text to build a {count}-question quiz from:\n\
         \n\
         {text}\n\
         \n\
         Write exactly {count} relevant questions that assess understanding of this text."
    )
}

/// Recover the source text and question count from a [`user_prompt`].
///
/// Offline providers use this to work on the note itself rather than on the
/// instructions wrapped around it.
pub fn parse_user_prompt(prompt: &str) -> Option<(&str, usize)> {
    let rest = prompt.strip_prefix("Here is the text to build a ")?;
    let (count, rest) = rest.split_once("-question quiz from:\n\n")?;
    let (text, _) = rest.rsplit_once("\n\nWrite exactly ")?;
    Some((text, count.parse().ok()?))
}

/// Questions for one quiz, plus the reason they are synthetic if they are.
#[derive(Debug, Clone)]
pub struct GeneratedQuiz {
    pub questions: QuestionSet,
    pub warning: Option<String>,
}

impl GeneratedQuiz {
    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Generates question sets from note text.
pub struct QuizGenerator {
    provider: Arc<dyn LlmProvider>,
    settings: GenerationSettings,
    normalizer: Normalizer,
}

impl QuizGenerator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        settings: GenerationSettings,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            provider,
            settings,
            normalizer,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// The completion request sent for `text`.
    pub fn build_request(&self, text: &str, count: usize) -> CompletionRequest {
        let source = truncate_source(text, self.settings.max_source_chars);
        CompletionRequest {
            model: self.settings.model.clone(),
            system_prompt: Some(system_prompt(count, &self.settings.language)),
            prompt: user_prompt(&source, count),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
        }
    }

    /// Produce exactly `count` questions about `text`. Never fails.
    #[instrument(skip(self, text), fields(provider = %self.provider.name(), chars = text.len()))]
    pub async fn generate(&self, text: &str, count: usize) -> GeneratedQuiz {
        let request = self.build_request(text, count);
        let start = Instant::now();

        match self.complete_with_retries(&request).await {
            Ok(response) => {
                tracing::info!(
                    model = %response.model,
                    latency_ms = response.latency_ms,
                    tokens = response.token_usage.total_tokens,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "questions generated"
                );
                let raw = RawResponse::from_content(&response.content);
                GeneratedQuiz {
                    questions: self.normalizer.normalize(raw, count),
                    warning: None,
                }
            }
            Err(e) => {
                tracing::warn!("question generation failed, using fallback questions: {e:#}");
                GeneratedQuiz {
                    questions: QuestionSet::synthetic(count),
                    warning: Some(format!("question generation failed: {e:#}")),
                }
            }
        }
    }

    async fn complete_with_retries(
        &self,
        request: &CompletionRequest,
    ) -> anyhow::Result<CompletionResponse> {
        let mut delay = Duration::from_millis(self.settings.retry_delay_ms);
        let mut attempt = 0;

        loop {
            let err = match self.provider.complete(request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            let provider_err = err.downcast_ref::<ProviderError>();
            if provider_err.is_some_and(ProviderError::is_permanent)
                || attempt >= self.settings.max_retries
            {
                return Err(err);
            }
            if let Some(ms) = provider_err.and_then(ProviderError::retry_after_ms) {
                delay = Duration::from_millis(ms);
            }
            delay = delay.min(MAX_RETRY_DELAY);

            attempt += 1;
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying: {err}");
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2).min(MAX_RETRY_DELAY);
        }
    }
}
