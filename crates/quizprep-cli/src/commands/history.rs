//! The `quizprep history` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizprep_core::model::MAX_SCORE;

use super::AppContext;

pub fn execute(ctx: &AppContext, note: Option<&str>) -> Result<()> {
    let records = match note {
        Some(title) => ctx.library.history_for(title)?,
        None => ctx.library.history()?,
    };

    if records.is_empty() {
        match note {
            Some(title) => println!("No quiz history for '{title}'."),
            None => println!("No quiz history yet. Take a quiz with `quizprep quiz take`."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Note", "Questions", "Average"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.date.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.note_title),
            Cell::new(record.questions.len()),
            Cell::new(format!("{:.2} / {MAX_SCORE}", record.average_score)),
        ]);
    }
    println!("{table}");
    Ok(())
}
