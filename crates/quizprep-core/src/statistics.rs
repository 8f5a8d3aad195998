//! Aggregate statistics over quiz history.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::QuizRecord;

/// Performance summary across every saved attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySummary {
    /// Number of saved attempts.
    pub quiz_count: usize,
    /// Mean of the per-attempt averages (0 when there is no history).
    pub overall_average: f64,
    /// Per-note statistics keyed by note title.
    pub per_note: BTreeMap<String, NoteStats>,
    /// Attempts in chronological order.
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteStats {
    pub attempts: usize,
    pub average_score: f64,
    pub best_score: f64,
    pub last_attempt: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub note_title: String,
    pub average_score: f64,
    pub question_count: usize,
}

impl HistorySummary {
    /// The most recent attempt, if any.
    pub fn latest(&self) -> Option<&TimelinePoint> {
        self.timeline.last()
    }
}

/// Summarize a quiz history.
pub fn summarize(records: &[QuizRecord]) -> HistorySummary {
    if records.is_empty() {
        return HistorySummary::default();
    }

    let mut timeline: Vec<TimelinePoint> = records
        .iter()
        .map(|r| TimelinePoint {
            date: r.date,
            note_title: r.note_title.clone(),
            average_score: r.average_score,
            question_count: r.questions.len(),
        })
        .collect();
    timeline.sort_by_key(|p| p.date);

    let mut grouped: BTreeMap<String, Vec<&TimelinePoint>> = BTreeMap::new();
    for point in &timeline {
        grouped.entry(point.note_title.clone()).or_default().push(point);
    }

    let per_note = grouped
        .into_iter()
        .map(|(title, points)| {
            let stats = NoteStats {
                attempts: points.len(),
                average_score: mean(points.iter().map(|p| p.average_score)),
                best_score: points
                    .iter()
                    .map(|p| p.average_score)
                    .fold(0.0, f64::max),
                last_attempt: points.last().map(|p| p.date),
            };
            (title, stats)
        })
        .collect();

    HistorySummary {
        quiz_count: records.len(),
        overall_average: mean(records.iter().map(|r| r.average_score)),
        per_note,
        timeline,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}
