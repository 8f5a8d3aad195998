//! The `quizprep init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizprep_core::store::Library;
use quizprep_providers::config::SAMPLE_CONFIG;

pub fn execute(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from("quizprep.toml"));
    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&config_path, SAMPLE_CONFIG)
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("Created {}", config_path.display());
    }

    let data_dir = data_dir.unwrap_or_else(|| PathBuf::from("data"));
    let existed = data_dir.join("notes").is_dir() && data_dir.join("quiz_history").is_dir();
    Library::open(&data_dir).init()?;
    if existed {
        println!("{} already exists, skipping.", data_dir.display());
    } else {
        println!("Created {}", folders(&data_dir));
    }

    println!("\nNext steps:");
    println!("  1. Set OPENROUTER_API_KEY, or switch the provider to type = \"local\"");
    println!("  2. Run: quizprep note add --title \"Cell biology\" --file notes.pdf");
    println!("  3. Run: quizprep quiz take --note \"Cell biology\"");

    Ok(())
}

fn folders(data_dir: &Path) -> String {
    format!(
        "{} and {}",
        data_dir.join("notes").display(),
        data_dir.join("quiz_history").display()
    )
}
