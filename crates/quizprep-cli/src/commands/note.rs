//! The `quizprep note` commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use quizprep_core::extract::extract_text;
use quizprep_core::text::extract_key_concepts;

use super::AppContext;

const KEY_CONCEPTS: usize = 8;

pub async fn add(
    ctx: &AppContext,
    title: Option<String>,
    content: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let (content, default_title) = match (content, &file) {
        (Some(content), _) => (content, None),
        (None, Some(path)) => {
            let timeout = Duration::from_secs(ctx.config.generation.timeout_secs);
            let text = extract_text(path, timeout)
                .await
                .with_context(|| format!("failed to import {}", path.display()))?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().replace('_', " "));
            (text, stem)
        }
        (None, None) => anyhow::bail!("either --content or --file is required"),
    };

    let title = title.or(default_title).unwrap_or_default();
    let note = ctx.library.save_note(&title, &content)?;
    println!(
        "Saved note '{}' ({} characters)",
        note.title,
        note.content.chars().count()
    );
    Ok(())
}

pub fn list(ctx: &AppContext) -> Result<()> {
    let notes = ctx.library.notes()?;
    if notes.is_empty() {
        println!("No notes yet. Add one with `quizprep note add`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Title", "Updated", "Characters"]);
    for note in &notes {
        table.add_row(vec![
            Cell::new(&note.title),
            Cell::new(note.updated_at.format("%Y-%m-%d %H:%M")),
            Cell::new(note.content.chars().count()),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn show(ctx: &AppContext, title: &str) -> Result<()> {
    let note = ctx.note(title)?;

    println!("# {}", note.title);
    println!(
        "Created {} | updated {}",
        note.created_at.format("%Y-%m-%d %H:%M"),
        note.updated_at.format("%Y-%m-%d %H:%M")
    );

    let concepts: Vec<String> = extract_key_concepts(&note.content, KEY_CONCEPTS)
        .into_iter()
        .map(|(word, _)| word)
        .collect();
    if !concepts.is_empty() {
        println!("Key concepts: {}", concepts.join(", "));
    }

    println!("\n{}", note.content.trim_end());
    Ok(())
}
