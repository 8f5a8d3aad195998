//! In-progress quiz attempts.

use crate::error::ValidationError;
use crate::model::{QuestionSet, QuizRecord, MAX_SCORE};

/// Answers and self-scores collected while a quiz is being taken.
#[derive(Debug, Clone)]
pub struct QuizSession {
    note_title: String,
    questions: QuestionSet,
    answers: Vec<String>,
    scores: Vec<u8>,
}

impl QuizSession {
    pub fn new(note_title: impl Into<String>, questions: QuestionSet) -> Self {
        let len = questions.len();
        Self {
            note_title: note_title.into(),
            questions,
            answers: vec![String::new(); len],
            scores: vec![0; len],
        }
    }

    pub fn note_title(&self) -> &str {
        &self.note_title
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn answers(&self) -> &[String] {
        &self.answers
    }

    pub fn scores(&self) -> &[u8] {
        &self.scores
    }

    pub fn answer(&mut self, index: usize, text: impl Into<String>) -> Result<(), ValidationError> {
        self.check_index(index)?;
        self.answers[index] = text.into();
        Ok(())
    }

    pub fn score(&mut self, index: usize, score: u8) -> Result<(), ValidationError> {
        self.check_index(index)?;
        if score > MAX_SCORE {
            return Err(ValidationError::ScoreOutOfRange { score });
        }
        self.scores[index] = score;
        Ok(())
    }

    /// Freeze the attempt into a record; the average is computed here.
    pub fn finish(self) -> QuizRecord {
        QuizRecord::new(
            self.note_title,
            self.questions.into_vec(),
            self.answers,
            self.scores,
        )
    }

    fn check_index(&self, index: usize) -> Result<(), ValidationError> {
        if index >= self.questions.len() {
            return Err(ValidationError::QuestionOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        Ok(())
    }
}
