//! The `quizprep report` command.

use std::path::Path;

use anyhow::Result;

use quizprep_core::statistics::summarize;
use quizprep_report::write_html_report;

use super::AppContext;

pub fn execute(ctx: &AppContext, output: &Path) -> Result<()> {
    let records = ctx.library.history()?;
    let summary = summarize(&records);
    write_html_report(&summary, &records, output)?;
    println!(
        "HTML report ({} quizzes): {}",
        summary.quiz_count,
        output.display()
    );
    Ok(())
}
