//! The `quizprep quiz` commands.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use quizprep_core::model::{QuizRecord, MAX_SCORE};
use quizprep_core::quiz::GeneratedQuiz;
use quizprep_core::session::QuizSession;

use super::AppContext;

async fn generate_for(
    ctx: &AppContext,
    note_title: &str,
    count: Option<usize>,
) -> Result<(String, GeneratedQuiz)> {
    let count = ctx.config.quiz.question_count(count)?;
    let note = ctx.note(note_title)?;
    let generator = ctx.generator()?;

    eprintln!(
        "Generating {count} questions for '{}' with {}...",
        note.title, generator.settings().model
    );
    let quiz = generator.generate(&note.content, count).await;
    if let Some(warning) = &quiz.warning {
        eprintln!("Warning: {warning}. Using generic questions instead.");
    }
    Ok((note.title, quiz))
}

pub async fn generate(
    ctx: &AppContext,
    note: &str,
    count: Option<usize>,
    json: bool,
) -> Result<()> {
    let (_, quiz) = generate_for(ctx, note, count).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&quiz.questions)?);
    } else {
        print!("{}", quiz.questions);
    }
    Ok(())
}

pub async fn take(
    ctx: &AppContext,
    note: &str,
    count: Option<usize>,
    no_save: bool,
) -> Result<()> {
    let (title, quiz) = generate_for(ctx, note, count).await?;
    let session = QuizSession::new(title, quiz.questions);

    let record = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        run_session(session, &mut stdin.lock(), &mut stdout.lock())
    })
    .await
    .context("quiz session failed")??;

    println!("\nAverage score: {:.2} / {MAX_SCORE}", record.average_score);
    if no_save {
        println!("Result not saved.");
    } else {
        let key = ctx.library.save_quiz(&record)?;
        println!("Saved quiz result {key}");
    }
    Ok(())
}

/// Ask every question on `out`, reading one answer line and one score line
/// per question from `input`. Invalid scores are asked again.
pub(crate) fn run_session<R: BufRead, W: Write>(
    mut session: QuizSession,
    input: &mut R,
    out: &mut W,
) -> Result<QuizRecord> {
    let total = session.questions().len();
    writeln!(out, "Quiz on '{}': {total} questions", session.note_title())?;

    for i in 0..total {
        writeln!(out, "\nQuestion {}/{total}: {}", i + 1, session.questions()[i])?;
        write!(out, "Your answer: ")?;
        out.flush()?;
        let answer = read_line(input)?;
        session.answer(i, answer.trim())?;

        loop {
            write!(out, "Score yourself (0-{MAX_SCORE}): ")?;
            out.flush()?;
            let line = read_line(input)?;
            match line.trim().parse::<u8>() {
                Ok(score) => match session.score(i, score) {
                    Ok(()) => break,
                    Err(e) => writeln!(out, "{e}")?,
                },
                Err(_) => writeln!(out, "Please enter a whole number from 0 to {MAX_SCORE}.")?,
            }
        }
    }

    Ok(session.finish())
}

fn read_line<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read input")?;
    anyhow::ensure!(read > 0, "input ended before the quiz was finished");
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
