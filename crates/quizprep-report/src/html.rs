//! HTML report generator.
//!
//! One standalone page: overview cards, a per-note progress list, the
//! chronological timeline and every attempt with its answers. The stylesheet
//! is inlined so the file can be opened or mailed on its own.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use quizprep_core::model::{QuizRecord, MAX_SCORE};
use quizprep_core::statistics::HistorySummary;

/// Average at or above which a note counts as mastered.
const MASTERED: f64 = 4.0;
/// Average below which a note needs review.
const NEEDS_REVIEW: f64 = 2.5;

/// Escape a string for safe HTML insertion.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Render the quiz history as a standalone page.
///
/// `records` supply the per-attempt detail; `summary` is expected to have
/// been computed from the same records.
pub fn generate_html(summary: &HistorySummary, records: &[QuizRecord]) -> String {
    let mut page = String::with_capacity(8 * 1024);
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Study progress | quizprep</title>\n<style>{STYLE}</style>\n</head>\n<body>\n"
    );

    let _ = writeln!(
        page,
        "<h1>Study progress</h1>\n<p class=\"muted\">{} quizzes | {} notes | generated {}</p>",
        summary.quiz_count,
        summary.per_note.len(),
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    if summary.quiz_count == 0 {
        page.push_str("<p class=\"muted\">No quiz has been taken yet.</p>\n</body>\n</html>");
        return page;
    }

    overview(&mut page, summary);
    notes(&mut page, summary);
    timeline(&mut page, summary);
    attempts(&mut page, records);

    let json = serde_json::to_string_pretty(summary).unwrap_or_default();
    let _ = writeln!(
        page,
        "<details class=\"raw\">\n<summary>Summary as JSON</summary>\n<pre>{}</pre>\n</details>",
        html_escape(&json)
    );

    page.push_str("</body>\n</html>");
    page
}

/// Write the report to `path`, creating parent directories.
pub fn write_html_report(
    summary: &HistorySummary,
    records: &[QuizRecord],
    path: &Path,
) -> Result<()> {
    let html = generate_html(summary, records);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn overview(page: &mut String, summary: &HistorySummary) {
    page.push_str("<section class=\"cards\">\n");
    card(page, "Quizzes taken", &summary.quiz_count.to_string());
    card(
        page,
        "Overall average",
        &format!("{:.2} / {MAX_SCORE}", summary.overall_average),
    );
    if let Some(latest) = summary.latest() {
        card(
            page,
            "Latest quiz",
            &format!(
                "{} ({:.2})",
                html_escape(&latest.note_title),
                latest.average_score
            ),
        );
    }
    page.push_str("</section>\n");
}

fn card(page: &mut String, label: &str, value: &str) {
    let _ = writeln!(page, "<div class=\"card\"><small>{label}</small><b>{value}</b></div>");
}

/// One row per note with a native meter on the 0-5 scale.
fn notes(page: &mut String, summary: &HistorySummary) {
    page.push_str("<h2>By note</h2>\n<table>\n<tr><th>Note</th><th>Average</th><th></th>\
                   <th>Best</th><th>Attempts</th><th>Last attempt</th></tr>\n");
    for (title, stats) in &summary.per_note {
        let last = stats
            .last_attempt
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        let _ = writeln!(
            page,
            "<tr><td>{title}</td><td>{avg:.2}</td>\
             <td><meter min=\"0\" max=\"{MAX_SCORE}\" low=\"{NEEDS_REVIEW}\" high=\"{MASTERED}\" \
             optimum=\"{MAX_SCORE}\" value=\"{avg:.2}\"></meter> {label}</td>\
             <td>{best:.2}</td><td>{attempts}</td><td>{last}</td></tr>",
            title = html_escape(title),
            avg = stats.average_score,
            label = standing(stats.average_score),
            best = stats.best_score,
            attempts = stats.attempts,
        );
    }
    page.push_str("</table>\n");
}

fn standing(average: f64) -> &'static str {
    if average >= MASTERED {
        "mastered"
    } else if average >= NEEDS_REVIEW {
        "progressing"
    } else {
        "needs review"
    }
}

fn timeline(page: &mut String, summary: &HistorySummary) {
    page.push_str("<h2>Timeline</h2>\n<table>\n\
                   <tr><th>Date</th><th>Note</th><th>Questions</th><th>Average</th></tr>\n");
    for point in &summary.timeline {
        let _ = writeln!(
            page,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
            point.date.format("%Y-%m-%d %H:%M"),
            html_escape(&point.note_title),
            point.question_count,
            point.average_score,
        );
    }
    page.push_str("</table>\n");
}

/// Newest attempt first, each folded into its own disclosure.
fn attempts(page: &mut String, records: &[QuizRecord]) {
    page.push_str("<h2>Attempts</h2>\n");
    for record in records.iter().rev() {
        let _ = writeln!(
            page,
            "<details>\n<summary>{} | {} | {:.2} / {MAX_SCORE}</summary>\n<ol>",
            record.date.format("%Y-%m-%d %H:%M"),
            html_escape(&record.note_title),
            record.average_score,
        );
        for (i, question) in record.questions.iter().enumerate() {
            let answer = match record.answers.get(i).map(|a| a.trim()) {
                Some(answer) if !answer.is_empty() => html_escape(answer),
                _ => "<em>no answer</em>".to_string(),
            };
            let score = record.scores.get(i).copied().unwrap_or(0);
            let _ = writeln!(
                page,
                "<li><b>{}</b><br>{answer}<br><small>{score} / {MAX_SCORE}</small></li>",
                html_escape(question),
            );
        }
        page.push_str("</ol>\n</details>\n");
    }
}

const STYLE: &str = "
body { max-width: 60rem; margin: 2rem auto; padding: 0 1rem; font: 15px/1.5 system-ui, sans-serif; }
h2 { border-bottom: 2px solid #c7d2fe; padding-bottom: .2rem; }
.muted, small { color: #64748b; }
.cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(12rem, 1fr)); gap: .75rem; }
.card { background: #eef2ff; border-radius: 6px; padding: .75rem 1rem; }
.card b { display: block; font-size: 1.3rem; }
table { width: 100%; border-collapse: collapse; }
td, th { padding: .35rem .6rem; border-bottom: 1px solid #e2e8f0; text-align: left; }
meter { width: 8rem; vertical-align: middle; }
details { margin: .5rem 0; }
summary { cursor: pointer; }
li { margin: .4rem 0; }
pre { background: #f8fafc; padding: .75rem; overflow-x: auto; }
";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quizprep_core::statistics::summarize;

    fn two_attempts() -> Vec<QuizRecord> {
        let mut biology = QuizRecord::new(
            "Cell <biology>",
            vec!["What is <b>mitosis</b>?".into(), "Why divide?".into()],
            vec!["Cell division & growth".into(), String::new()],
            vec![4, 2],
        );
        biology.date = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();

        let mut physics =
            QuizRecord::new("Physics", vec!["F = ma?".into()], vec!["yes".into()], vec![5]);
        physics.date = Utc.with_ymd_and_hms(2025, 3, 2, 18, 0, 0).unwrap();

        vec![biology, physics]
    }

    #[test]
    fn escape_covers_quotes_and_ampersands() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn page_shows_overview_notes_and_attempts() {
        let records = two_attempts();
        let html = generate_html(&summarize(&records), &records);

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.ends_with("</html>"));
        assert!(html.contains("2 quizzes | 2 notes"));
        assert!(html.contains("2025-03-01 09:30"));
        assert!(html.contains("4.00 / 5"));
        assert!(html.contains("<em>no answer</em>"));
        assert!(html.contains("value=\"5.00\"></meter> mastered"));
        assert!(html.contains("value=\"3.00\"></meter> progressing"));
    }

    #[test]
    fn standing_follows_thresholds() {
        assert_eq!(standing(5.0), "mastered");
        assert_eq!(standing(4.0), "mastered");
        assert_eq!(standing(2.5), "progressing");
        assert_eq!(standing(2.49), "needs review");
    }

    #[test]
    fn titles_questions_and_answers_are_escaped() {
        let records = two_attempts();
        let html = generate_html(&summarize(&records), &records);

        assert!(html.contains("Cell &lt;biology&gt;"));
        assert!(html.contains("What is &lt;b&gt;mitosis&lt;/b&gt;?"));
        assert!(html.contains("Cell division &amp; growth"));
        assert!(!html.contains("<biology>"));
        assert!(!html.contains("<b>mitosis"));
    }

    #[test]
    fn newest_attempt_comes_first() {
        let records = two_attempts();
        let html = generate_html(&summarize(&records), &records);
        let attempts = &html[html.find("<h2>Attempts</h2>").unwrap()..];
        let physics = attempts.find("Physics").unwrap();
        let biology = attempts.find("Cell &lt;biology&gt;").unwrap();
        assert!(physics < biology);
    }

    #[test]
    fn no_history_yet() {
        let html = generate_html(&summarize(&[]), &[]);
        assert!(html.contains("No quiz has been taken yet."));
        assert!(!html.contains("<table"));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn report_lands_in_new_directory() {
        let records = two_attempts();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&summarize(&records), &records, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
        assert!(content.contains("Physics"));
    }
}
