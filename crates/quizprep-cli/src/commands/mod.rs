pub mod history;
pub mod init;
pub mod note;
pub mod quiz;
pub mod report;
pub mod stats;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use quizprep_core::model::Note;
use quizprep_core::normalize::Normalizer;
use quizprep_core::quiz::QuizGenerator;
use quizprep_core::store::Library;
use quizprep_providers::{create_provider, load_config_from, QuizprepConfig};

/// Loaded configuration plus the library it points at.
pub struct AppContext {
    pub config: QuizprepConfig,
    pub library: Library,
}

impl AppContext {
    pub fn load(config_path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = load_config_from(config_path)?;
        if let Some(dir) = data_dir {
            config.data_dir = dir;
        }
        let library = Library::open(&config.data_dir);
        Ok(Self { config, library })
    }

    pub fn generator(&self) -> Result<QuizGenerator> {
        let provider = create_provider(&self.config.provider, self.config.generation.timeout_secs)?;
        Ok(QuizGenerator::new(
            Arc::from(provider),
            self.config.generation.clone(),
            Normalizer::new(self.config.quiz.normalizer_config()),
        ))
    }

    /// The note called `title`, or an error pointing at `note list`.
    pub fn note(&self, title: &str) -> Result<Note> {
        self.library
            .note(title)
            .with_context(|| format!("failed to load note '{title}'"))?
            .with_context(|| {
                format!("note not found: '{title}' (run `quizprep note list` to see saved notes)")
            })
    }
}
