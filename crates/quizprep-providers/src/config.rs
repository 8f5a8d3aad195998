//! Configuration loading and provider factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use quizprep_core::error::ValidationError;
use quizprep_core::normalize::NormalizerConfig;
use quizprep_core::quiz::GenerationSettings;
use quizprep_core::traits::LlmProvider;

use crate::local::LocalProvider;
use crate::openrouter::OpenRouterProvider;

/// Environment variables that override the OpenRouter API key, in priority order.
pub const API_KEY_VARS: &[&str] = &["QUIZPREP_API_KEY", "OPENROUTER_API_KEY"];

/// Which backend generates questions.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenRouter {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Offline keyword-based questions; no network access.
    Local,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::OpenRouter {
            api_key: String::new(),
            base_url: None,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenRouter {
                api_key,
                base_url,
            } => f
                .debug_struct("OpenRouter")
                .field("api_key", &if api_key.is_empty() { "" } else { "***" })
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Local => f.write_str("Local"),
        }
    }
}

/// Question-count limits and normalizer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSettings {
    #[serde(default = "default_questions")]
    pub default_questions: usize,
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,
    #[serde(default = "default_max_questions")]
    pub max_questions: usize,
    /// See [`NormalizerConfig::fallback_ratio`].
    #[serde(default = "default_fallback_ratio")]
    pub fallback_ratio: f64,
}

fn default_questions() -> usize {
    5
}
fn default_min_questions() -> usize {
    3
}
fn default_max_questions() -> usize {
    10
}
fn default_fallback_ratio() -> f64 {
    NormalizerConfig::default().fallback_ratio
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            default_questions: default_questions(),
            min_questions: default_min_questions(),
            max_questions: default_max_questions(),
            fallback_ratio: default_fallback_ratio(),
        }
    }
}

impl QuizSettings {
    /// Resolve a requested question count against the configured range.
    pub fn question_count(&self, requested: Option<usize>) -> Result<usize, ValidationError> {
        let count = requested.unwrap_or(self.default_questions);
        if count < self.min_questions || count > self.max_questions {
            return Err(ValidationError::QuestionCountOutOfRange {
                count,
                min: self.min_questions,
                max: self.max_questions,
            });
        }
        Ok(count)
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            fallback_ratio: self.fallback_ratio,
        }
    }
}

/// Top-level quizprep configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizprepConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub quiz: QuizSettings,
    /// Root of the `notes/` and `quiz_history/` folders.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for QuizprepConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            generation: GenerationSettings::default(),
            quiz: QuizSettings::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl QuizprepConfig {
    fn validate(&self) -> Result<()> {
        let quiz = &self.quiz;
        if quiz.min_questions == 0 || quiz.min_questions > quiz.max_questions {
            anyhow::bail!(
                "invalid question range {}-{}",
                quiz.min_questions,
                quiz.max_questions
            );
        }
        quiz.question_count(None)
            .context("default_questions is outside the configured range")?;
        if !(0.0..=1.0).contains(&quiz.fallback_ratio) {
            anyhow::bail!("fallback_ratio must lie in 0.0-1.0, got {}", quiz.fallback_ratio);
        }
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenRouter { api_key, base_url } => ProviderConfig::OpenRouter {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::Local => ProviderConfig::Local,
    }
}

/// Replace the OpenRouter key with the first non-empty override found by `lookup`.
fn apply_key_override(config: &mut QuizprepConfig, lookup: impl Fn(&str) -> Option<String>) {
    let ProviderConfig::OpenRouter { api_key, .. } = &mut config.provider else {
        return;
    };
    if let Some(key) = API_KEY_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .find(|k| !k.trim().is_empty())
    {
        *api_key = key;
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizprep.toml` in the current directory
/// 2. `~/.config/quizprep/config.toml`
///
/// Environment variable overrides: `QUIZPREP_API_KEY`, `OPENROUTER_API_KEY`.
pub fn load_config() -> Result<QuizprepConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizprepConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("quizprep.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<QuizprepConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => QuizprepConfig::default(),
    };

    config.provider = resolve_provider_config(&config.provider);
    apply_key_override(&mut config, |var| std::env::var(var).ok());
    config
        .validate()
        .with_context(|| match &config_path {
            Some(path) => format!("invalid config: {}", path.display()),
            None => "invalid default config".to_string(),
        })?;

    tracing::debug!(path = ?config_path, provider = ?config.provider, "config loaded");
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizprep"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig, timeout_secs: u64) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenRouter { api_key, base_url } => Ok(Box::new(
            OpenRouterProvider::new(api_key, base_url.clone(), timeout_secs)?,
        )),
        ProviderConfig::Local => Ok(Box::new(LocalProvider::new())),
    }
}

/// Starter configuration written by `quizprep init`.
pub const SAMPLE_CONFIG: &str = r#"# quizprep configuration

data_dir = "data"

[provider]
type = "openrouter"
api_key = "${OPENROUTER_API_KEY}"
# base_url = "https://openrouter.ai/api"

# Offline alternative, no API key needed:
# [provider]
# type = "local"

[generation]
model = "deepseek/deepseek-r1-zero:free"
max_tokens = 2048
temperature = 0.7
top_p = 0.9
frequency_penalty = 0.0
presence_penalty = 0.0
timeout_secs = 120
max_source_chars = 4000
language = "English"
max_retries = 2
retry_delay_ms = 1000

[quiz]
default_questions = 5
min_questions = 3
max_questions = 10
fallback_ratio = 0.5
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZPREP_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZPREP_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZPREP_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_QUIZPREP_UNSET_VAR}"), "");
        assert_eq!(resolve_env_vars("no refs ${unterminated"), "no refs ${unterminated");
        std::env::remove_var("_QUIZPREP_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = QuizprepConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.generation.model, "deepseek/deepseek-r1-zero:free");
        assert_eq!(config.generation.max_tokens, 2048);
        assert_eq!(config.quiz.default_questions, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sample_config_parses() {
        let config: QuizprepConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert!(matches!(config.provider, ProviderConfig::OpenRouter { .. }));
        assert_eq!(config.generation, GenerationSettings::default());
        assert_eq!(config.quiz, QuizSettings::default());
    }

    #[test]
    fn parse_local_provider() {
        let config: QuizprepConfig = toml::from_str(
            r#"
data_dir = "/tmp/study"

[provider]
type = "local"

[quiz]
max_questions = 8
"#,
        )
        .unwrap();
        assert_eq!(config.provider, ProviderConfig::Local);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/study"));
        assert_eq!(config.quiz.max_questions, 8);
        assert_eq!(config.quiz.min_questions, 3);
    }

    #[test]
    fn debug_masks_api_key() {
        let config = ProviderConfig::OpenRouter {
            api_key: "sk-or-secret".into(),
            base_url: None,
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-or-secret"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn key_override_order() {
        let mut config = QuizprepConfig::default();
        apply_key_override(&mut config, |var| match var {
            "QUIZPREP_API_KEY" => Some(" ".into()),
            "OPENROUTER_API_KEY" => Some("sk-or-env".into()),
            _ => None,
        });
        assert!(matches!(
            config.provider,
            ProviderConfig::OpenRouter { ref api_key, .. } if api_key == "sk-or-env"
        ));

        apply_key_override(&mut config, |var| {
            (var == "QUIZPREP_API_KEY").then(|| "sk-quizprep".to_string())
        });
        assert!(matches!(
            config.provider,
            ProviderConfig::OpenRouter { ref api_key, .. } if api_key == "sk-quizprep"
        ));
    }

    #[test]
    fn key_override_leaves_local_alone() {
        let mut config = QuizprepConfig {
            provider: ProviderConfig::Local,
            ..Default::default()
        };
        apply_key_override(&mut config, |_| Some("sk".into()));
        assert_eq!(config.provider, ProviderConfig::Local);
    }

    #[test]
    fn question_count_range() {
        let quiz = QuizSettings::default();
        assert_eq!(quiz.question_count(None), Ok(5));
        assert_eq!(quiz.question_count(Some(3)), Ok(3));
        assert_eq!(quiz.question_count(Some(10)), Ok(10));
        assert_eq!(
            quiz.question_count(Some(11)),
            Err(ValidationError::QuestionCountOutOfRange {
                count: 11,
                min: 3,
                max: 10
            })
        );
        assert!(quiz.question_count(Some(2)).is_err());
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let mut config = QuizprepConfig::default();
        config.quiz.min_questions = 8;
        config.quiz.max_questions = 4;
        assert!(config.validate().is_err());

        let mut config = QuizprepConfig::default();
        config.quiz.default_questions = 12;
        assert!(config.validate().is_err());

        let mut config = QuizprepConfig::default();
        config.quiz.fallback_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[provider]\ntype = \"local\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.provider, ProviderConfig::Local);

        let err = load_config_from(Some(&dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[provider\n").unwrap();

        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[test]
    fn create_local_provider() {
        let provider = create_provider(&ProviderConfig::Local, 5).unwrap();
        assert_eq!(provider.name(), "local");
    }
}
