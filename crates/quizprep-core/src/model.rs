//! Core data model types for quizprep.
//!
//! Notes are the study material, a [`QuestionSet`] is what gets asked, and a
//! [`QuizRecord`] is the immutable trace of one scored attempt.

use std::fmt;
use std::ops::Index;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A study note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Unique title; also the storage key.
    pub title: String,
    /// Source text the quiz is generated from.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Generic prompts used to pad a question set. Each one is deterministic and
/// points at "a key concept" of the note.
const FALLBACK_QUESTIONS: [&str; 5] = [
    "Summarize a key concept from the text in your own words.",
    "Explain why a key concept from the text matters.",
    "Give a concrete example that illustrates a key concept from the text.",
    "Compare a key concept from the text with a closely related idea.",
    "Describe how you would apply a key concept from the text in practice.",
];

/// The fallback question for a zero-based position in a quiz.
pub fn fallback_question(position: usize) -> &'static str {
    FALLBACK_QUESTIONS[position % FALLBACK_QUESTIONS.len()]
}

/// An ordered list of exactly N cleaned questions.
///
/// Only the normalizer and [`QuestionSet::synthetic`] can build one, so the
/// length always equals the count that was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QuestionSet {
    questions: Vec<String>,
}

impl QuestionSet {
    /// Truncate or pad `questions` to exactly `count` entries.
    pub(crate) fn reconcile(mut questions: Vec<String>, count: usize) -> Self {
        questions.truncate(count);
        while questions.len() < count {
            questions.push(fallback_question(questions.len()).to_string());
        }
        Self { questions }
    }

    /// A set made only of fallback questions.
    pub fn synthetic(count: usize) -> Self {
        Self::reconcile(Vec::new(), count)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.questions.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.questions
    }

    pub fn into_vec(self) -> Vec<String> {
        self.questions
    }
}

impl Index<usize> for QuestionSet {
    type Output = String;

    fn index(&self, index: usize) -> &String {
        &self.questions[index]
    }
}

impl<'a> IntoIterator for &'a QuestionSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

impl fmt::Display for QuestionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, q) in self.questions.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, q)?;
        }
        Ok(())
    }
}

/// Highest self-assessment score.
pub const MAX_SCORE: u8 = 5;

/// One completed quiz attempt. Never modified after it is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRecord {
    pub id: Uuid,
    pub note_title: String,
    pub date: DateTime<Utc>,
    pub questions: Vec<String>,
    /// Free-text answers, aligned with `questions`.
    pub answers: Vec<String>,
    /// Self-scores 0-5, aligned with `questions`.
    pub scores: Vec<u8>,
    /// Mean of `scores`, fixed when the record is built.
    pub average_score: f64,
}

impl QuizRecord {
    pub fn new(
        note_title: impl Into<String>,
        questions: Vec<String>,
        answers: Vec<String>,
        scores: Vec<u8>,
    ) -> Self {
        let average_score = average(&scores);
        Self {
            id: Uuid::new_v4(),
            note_title: note_title.into(),
            date: Utc::now(),
            questions,
            answers,
            scores,
            average_score,
        }
    }

    /// Storage key: sortable timestamp plus a short id suffix so two attempts
    /// in the same second never collide.
    pub fn storage_key(&self) -> String {
        let id = self.id.simple().to_string();
        format!("{}-{}", self.date.format("%Y%m%d-%H%M%S"), &id[..8])
    }
}

fn average(scores: &[u8]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().map(|&s| s as f64).sum::<f64>() / scores.len() as f64
}
