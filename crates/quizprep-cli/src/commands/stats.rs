//! The `quizprep stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizprep_core::model::MAX_SCORE;
use quizprep_core::statistics::summarize;

use super::AppContext;

pub fn execute(ctx: &AppContext) -> Result<()> {
    let notes = ctx.library.notes()?;
    let records = ctx.library.history()?;
    let summary = summarize(&records);

    println!("Notes: {}", notes.len());
    println!("Quizzes taken: {}", summary.quiz_count);
    if summary.quiz_count == 0 {
        return Ok(());
    }
    println!(
        "Overall average: {:.2} / {MAX_SCORE}",
        summary.overall_average
    );
    if let Some(latest) = summary.latest() {
        println!(
            "Latest quiz: {} on {} ({:.2})",
            latest.note_title,
            latest.date.format("%Y-%m-%d %H:%M"),
            latest.average_score
        );
    }

    let mut table = Table::new();
    table.set_header(vec!["Note", "Attempts", "Average", "Best"]);
    for (title, stats) in &summary.per_note {
        table.add_row(vec![
            Cell::new(title),
            Cell::new(stats.attempts),
            Cell::new(format!("{:.2}", stats.average_score)),
            Cell::new(format!("{:.2}", stats.best_score)),
        ]);
    }
    println!("\n{table}");
    Ok(())
}
