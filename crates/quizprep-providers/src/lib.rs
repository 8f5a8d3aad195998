//! quizprep-providers — Configuration and LLM provider integrations.
//!
//! Implements the `LlmProvider` trait for OpenRouter (or any other
//! OpenAI-compatible endpoint) and for an offline keyword generator, and
//! loads the `quizprep.toml` configuration that selects between them.

pub mod config;
pub mod local;
pub mod mock;
pub mod openrouter;

pub use config::{
    create_provider, load_config, load_config_from, ProviderConfig, QuizSettings, QuizprepConfig,
};
pub use quizprep_core::error::ProviderError;
