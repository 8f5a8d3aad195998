//! Response normalizer.
//!
//! Turns whatever shape the question generator produced into a
//! [`QuestionSet`] of exactly the requested length. Nothing in here fails:
//! unrecognized formatting degrades to blank-line chunking, and short results
//! are padded with fallback questions.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::QuestionSet;

/// Loosely structured generator output.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Free text holding zero or more questions.
    Text(String),
    /// A list of strings, records, or a mix of anything.
    Sequence(Vec<Value>),
    /// A single record, usually wrapping a `"questions"` list.
    Record(Map<String, Value>),
}

impl RawResponse {
    /// Interpret the content of a completion.
    ///
    /// A JSON array or object (bare, or inside a fenced block) becomes a
    /// structured response; anything else is kept as text. Reasoning blocks
    /// (`<think>...</think>`) some models emit are dropped first.
    pub fn from_content(content: &str) -> Self {
        let content = THINK_BLOCK.replace_all(content, "");
        let content = content.trim();

        let candidate = extract_fenced_json(content).unwrap_or(content);
        match serde_json::from_str::<Value>(candidate.trim()) {
            Ok(value @ (Value::Array(_) | Value::Object(_))) => Self::from(value),
            _ => Self::Text(content.to_string()),
        }
    }
}

impl From<Value> for RawResponse {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Record(map),
            Value::String(s) => Self::Text(s),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawResponse {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawResponse {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for RawResponse {
    fn from(items: Vec<String>) -> Self {
        Self::Sequence(items.into_iter().map(Value::String).collect())
    }
}

/// Tuning for the text heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// When line classification finds fewer than `fallback_ratio * expected`
    /// questions, its result is dropped in favour of blank-line chunking.
    #[serde(default = "default_fallback_ratio")]
    pub fallback_ratio: f64,
}

fn default_fallback_ratio() -> f64 {
    0.5
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fallback_ratio: default_fallback_ratio(),
        }
    }
}

/// Normalize with the default configuration.
pub fn normalize(raw: impl Into<RawResponse>, expected_count: usize) -> QuestionSet {
    Normalizer::default().normalize(raw, expected_count)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Produce exactly `expected_count` clean questions from `raw`.
    pub fn normalize(&self, raw: impl Into<RawResponse>, expected_count: usize) -> QuestionSet {
        let questions = match raw.into() {
            RawResponse::Record(mut map) => match map.remove("questions") {
                Some(Value::Array(items)) => sequence_questions(items),
                Some(Value::String(text)) => self.text_questions(&text, expected_count),
                Some(other) => sequence_questions(vec![other]),
                // A lone question record.
                None if map.contains_key("question") => {
                    sequence_questions(vec![Value::Object(map)])
                }
                None => Vec::new(),
            },
            RawResponse::Sequence(items) => sequence_questions(items),
            RawResponse::Text(text) => self.text_questions(&text, expected_count),
        };

        if questions.len() != expected_count {
            tracing::debug!(
                found = questions.len(),
                expected = expected_count,
                "reconciling question count"
            );
        }
        QuestionSet::reconcile(questions, expected_count)
    }

    fn text_questions(&self, text: &str, expected_count: usize) -> Vec<String> {
        let classified: Vec<String> = text
            .lines()
            .filter_map(|line| {
                let line = clean_markup(line);
                let line = line.trim();
                if line.is_empty() || !QUESTION_LINE.is_match(line) {
                    return None;
                }
                let question = strip_markers(line).trim();
                (!question.is_empty()).then(|| question.to_string())
            })
            .collect();

        let threshold = self.config.fallback_ratio * expected_count as f64;
        if (classified.len() as f64) >= threshold {
            return classified;
        }

        tracing::debug!(
            classified = classified.len(),
            threshold,
            "few list-style questions found, falling back to blank-line chunks"
        );
        BLANK_LINE
            .split(text)
            .filter_map(non_empty_clean)
            .collect()
    }
}

fn sequence_questions(items: Vec<Value>) -> Vec<String> {
    let all_records = items.iter().all(Value::is_object);
    items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut record) if all_records => match record.remove("question") {
                Some(question) => value_text(question),
                None => Value::Object(record).to_string(),
            },
            other => value_text(other),
        })
        .filter_map(|text| non_empty_clean(&text))
        .collect()
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn non_empty_clean(text: &str) -> Option<String> {
    let cleaned = clean_markup(text);
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Remove one list marker, then one "Question N:" label, from the start of a
/// line. Whatever follows belongs to the question, digits included.
fn strip_markers(line: &str) -> &str {
    let line = LIST_MARKER.find(line).map_or(line, |m| &line[m.end()..]);
    QUESTION_LABEL.find(line).map_or(line, |m| &line[m.end()..])
}

/// Convert inline HTML to markdown-safe text.
///
/// Bold and italic tags become `**` and `*`, code-like spans become
/// backticks, and every other tag is dropped with its inner text kept.
/// Applying it twice gives the same result as applying it once.
pub fn clean_markup(text: &str) -> String {
    let text = BOLD_TAG.replace_all(text, "**");
    let text = ITALIC_TAG.replace_all(&text, "*");
    let text = CODE_SPAN.replace_all(&text, "`$inner`");
    let text = SPAN_TAG.replace_all(&text, "");

    // Dropping one tag can join its neighbours into a new one ("<<u>b>").
    let mut text = text.into_owned();
    loop {
        let stripped = ANY_TAG.replace_all(&text, "");
        if stripped.len() == text.len() {
            return text;
        }
        text = stripped.into_owned();
    }
}

/// Prefer a ```json block, then an untagged one.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let mut generic = None;
    let mut rest = content;
    while let Some(start) = rest.find("```") {
        let after = &rest[start + 3..];
        let Some(newline) = after.find('\n') else {
            break;
        };
        let lang = after[..newline].trim().to_lowercase();
        let body = &after[newline + 1..];
        let (block, next) = match body.find("```") {
            Some(end) => (&body[..end], &body[end + 3..]),
            // Truncated output: take what is there.
            None => (body, ""),
        };
        if lang == "json" {
            return Some(block);
        }
        if lang.is_empty() && generic.is_none() {
            generic = Some(block);
        }
        rest = next;
    }
    generic
}

static QUESTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d|Q(?:\d|[[:punct:]]|\s)|[-*#•]|(?i:question))").unwrap()
});

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        // **1.**  **Question 2:**  **Q3**:
        r"\*{1,2}(?:(?i:question)\s*|Q)\d+\s*[.):\-]?\s*\*{1,2}\s*[.):\-]?",
        r"|\*{1,2}\d+\s*(?:[.):\-]\s*\*{1,2}|\*{1,2}\s*[.):\-])",
        r"|Q\d+\s*[.):\-]?",
        r"|Q\s*[.):\-]",
        r"|\d+\s*[.):\-]",
        r"|[-•]+",
        r"|\*\s",
        r"|#+",
        r")\s*"
    ))
    .unwrap()
});

static QUESTION_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:question)\s*(?:\d+\s*[.):\-]?|[.):\-])\s*").unwrap()
});

static BLANK_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n").unwrap());

static BOLD_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:strong|b)(?:\s[^>]*)?>").unwrap());

static ITALIC_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?(?:em|i)(?:\s[^>]*)?>").unwrap());

static CODE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<span\b[^>]*\bclass\s*=\s*["'](?:code|method|attribute|tag)["'][^>]*>(?P<inner>.*?)</span\s*>"#,
    )
    .unwrap()
});

static SPAN_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</?span\b[^>]*>").unwrap());

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:/?[A-Za-z][^>]*|!--[^>]*)>").unwrap());

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").unwrap());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fallback_question;
    use serde_json::json;

    fn questions(set: &QuestionSet) -> Vec<&str> {
        set.iter().map(String::as_str).collect()
    }

    #[test]
    fn clean_bold_and_italic() {
        assert_eq!(clean_markup("<strong>Paris</strong>"), "**Paris**");
        assert_eq!(clean_markup("<b>Paris</b>"), "**Paris**");
        assert_eq!(clean_markup("<em>photosynthèse</em>"), "*photosynthèse*");
        assert_eq!(clean_markup("<i>photosynthèse</i>"), "*photosynthèse*");
    }

    #[test]
    fn clean_code_spans() {
        assert_eq!(
            clean_markup(r#"Call <span class="method">push()</span> on the vector"#),
            "Call `push()` on the vector"
        );
        assert_eq!(
            clean_markup(r#"The <span class='tag'>div</span> element"#),
            "The `div` element"
        );
    }

    #[test]
    fn clean_plain_spans_keep_text() {
        assert_eq!(
            clean_markup(r#"<span style="color:red">Why</span> does it rain?"#),
            "Why does it rain?"
        );
        assert_eq!(
            clean_markup(r#"<span class="code">a</span> and <span>b</span>"#),
            "`a` and b"
        );
    }

    #[test]
    fn clean_other_tags() {
        assert_eq!(clean_markup("<p>What is <u>mitosis</u>?</p>"), "What is mitosis?");
        assert_eq!(clean_markup("line<br/>break"), "linebreak");
        assert_eq!(clean_markup("<!-- note -->Why?"), "Why?");
    }

    #[test]
    fn clean_leaves_comparisons_alone() {
        assert_eq!(clean_markup("Is 3 < 4 and 5 > 2?"), "Is 3 < 4 and 5 > 2?");
        assert_eq!(clean_markup("Plain text."), "Plain text.");
    }

    #[test]
    fn clean_is_idempotent() {
        let inputs = [
            "<strong>Paris</strong>",
            "<<u>b>nested</b>",
            "<<i>b>x</b>",
            r#"<span class="code"><b>x</b></span>"#,
            "a < b > c",
            "<p>unclosed <span class='attribute'>href",
            "<<<>>>",
            "**already** *clean* `text`",
            "",
        ];
        for input in inputs {
            let once = clean_markup(input);
            assert_eq!(clean_markup(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn question_labels_are_stripped() {
        let set = normalize("Question 1: Define X.\n\nQuestion 2: Compare X and Y.", 2);
        assert_eq!(questions(&set), ["Define X.", "Compare X and Y."]);
    }

    #[test]
    fn list_markers_are_stripped() {
        let text = "Here are your questions:\n\
                    1. What is a cell?\n\
                    2) Why do cells divide?\n\
                    - How does mitosis differ from meiosis?\n\
                    * What is a chromosome?\n\
                    Q5: What is DNA made of?\n\
                    ## What role does RNA play?";
        let set = normalize(text, 6);
        assert_eq!(
            questions(&set),
            [
                "What is a cell?",
                "Why do cells divide?",
                "How does mitosis differ from meiosis?",
                "What is a chromosome?",
                "What is DNA made of?",
                "What role does RNA play?",
            ]
        );
    }

    #[test]
    fn bold_numbered_labels() {
        let text = "**1.** What is osmosis?\n**Question 2:** Why does ice float?";
        let set = normalize(text, 2);
        assert_eq!(questions(&set), ["What is osmosis?", "Why does ice float?"]);
    }

    #[test]
    fn numbers_inside_the_question_are_kept() {
        let text = "1. 1984 is a novel by whom?\n2. 3D printing builds objects how?\n\
                    3) 1. Question 3: 42 is the answer to what?\n\
                    1066 was the year of which battle?";
        let set = normalize(text, 4);
        assert_eq!(
            questions(&set),
            [
                "1984 is a novel by whom?",
                "3D printing builds objects how?",
                "1. Question 3: 42 is the answer to what?",
                "1066 was the year of which battle?",
            ]
        );
    }

    #[test]
    fn bold_years_are_not_markers() {
        let text = "**1.** **1984** is a novel by whom?\n**Q2** Why does ice float?";
        let set = normalize(text, 2);
        assert_eq!(
            questions(&set),
            ["**1984** is a novel by whom?", "Why does ice float?"]
        );
    }

    #[test]
    fn marker_then_label() {
        let text = "1. Question 1: Define X.\n- Question 2: Compare X and Y.";
        let set = normalize(text, 2);
        assert_eq!(questions(&set), ["Define X.", "Compare X and Y."]);
    }

    #[test]
    fn words_starting_with_q_are_not_markers() {
        let text = "1. Quelle est la capitale de la France ?\n2. Quand a eu lieu la Révolution ?";
        let set = normalize(text, 2);
        assert_eq!(
            questions(&set),
            [
                "Quelle est la capitale de la France ?",
                "Quand a eu lieu la Révolution ?"
            ]
        );
    }

    #[test]
    fn unmarked_text_falls_back_to_chunks() {
        let text = "What is a cell?\n\nWhy do cells divide?\n\n\nHow do cells die?";
        let set = normalize(text, 3);
        assert_eq!(
            questions(&set),
            ["What is a cell?", "Why do cells divide?", "How do cells die?"]
        );
    }

    #[test]
    fn fallback_ratio_is_configurable() {
        let text = "1. Only marked question\n\nSecond chunk\n\nThird chunk\n\nFourth chunk";

        // One classified line out of four expected is below the default half.
        let default = normalize(text, 4);
        assert_eq!(default[0], "1. Only marked question");
        assert_eq!(default[3], "Fourth chunk");

        let lenient = Normalizer::new(NormalizerConfig {
            fallback_ratio: 0.25,
        });
        let set = lenient.normalize(text, 4);
        assert_eq!(set[0], "Only marked question");
        assert_eq!(set[1], fallback_question(1));
    }

    #[test]
    fn wrapped_questions_are_padded() {
        let set = normalize(json!({"questions": ["A?", "B?"]}), 3);
        assert_eq!(questions(&set), ["A?", "B?", fallback_question(2)]);
    }

    #[test]
    fn wrapped_text_is_parsed() {
        let set = normalize(json!({"questions": "1. A?\n2. B?"}), 2);
        assert_eq!(questions(&set), ["A?", "B?"]);
    }

    #[test]
    fn record_sequence_keeps_order() {
        let set = normalize(
            json!([{"question": "What is X?"}, {"question": "Why Y?"}]),
            2,
        );
        assert_eq!(questions(&set), ["What is X?", "Why Y?"]);
    }

    #[test]
    fn record_without_question_field_uses_string_form() {
        let set = normalize(json!([{"prompt": "Why?"}]), 1);
        assert_eq!(set[0], r#"{"prompt":"Why?"}"#);
    }

    #[test]
    fn single_question_record() {
        let set = normalize(json!({"question": "What is X?", "answer": "Y"}), 1);
        assert_eq!(set[0], "What is X?");

        let set = normalize(json!({"title": "Quiz"}), 1);
        assert_eq!(set[0], fallback_question(0));
    }

    #[test]
    fn mixed_sequence_is_stringified() {
        let set = normalize(json!(["<b>A</b>?", 42, {"question": "kept whole"}, null]), 3);
        assert_eq!(set[0], "**A**?");
        assert_eq!(set[1], "42");
        assert_eq!(set[2], r#"{"question":"kept whole"}"#);
    }

    #[test]
    fn sequence_items_are_cleaned_and_empty_ones_dropped() {
        let set = normalize(vec!["<p> </p>".to_string(), " <em>B</em> ".to_string()], 2);
        assert_eq!(questions(&set), ["*B*", fallback_question(1)]);
    }

    #[test]
    fn excess_questions_are_truncated_in_order() {
        let text = (1..=8)
            .map(|i| format!("{i}. Question number {i}?"))
            .collect::<Vec<_>>()
            .join("\n");
        let set = normalize(text, 5);
        assert_eq!(set.len(), 5);
        assert_eq!(set[0], "Question number 1?");
        assert_eq!(set[4], "Question number 5?");
    }

    #[test]
    fn exact_count_for_well_formed_chunks() {
        for expected in 3..=10 {
            for extra in 0..3 {
                let text = (0..expected + extra)
                    .map(|i| format!("Explain topic {i} in detail."))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                let set = normalize(text.as_str(), expected);
                assert_eq!(set.len(), expected);
                for (i, q) in set.iter().enumerate() {
                    assert_eq!(q, &format!("Explain topic {i} in detail."));
                }
            }
        }
    }

    #[test]
    fn never_short_for_degenerate_inputs() {
        let inputs: Vec<RawResponse> = vec![
            RawResponse::from(""),
            RawResponse::from("   \n\n  "),
            RawResponse::from("<br><br>"),
            RawResponse::from("Network error, please check your API key."),
            RawResponse::Sequence(vec![]),
            RawResponse::Record(Map::new()),
            RawResponse::from(json!({"questions": null})),
            RawResponse::from(json!([null, "", {}])),
        ];
        for raw in inputs {
            for expected in [1, 3, 10] {
                let set = Normalizer::default().normalize(raw.clone(), expected);
                assert_eq!(set.len(), expected, "input: {raw:?}");
                assert!(set.iter().all(|q| !q.trim().is_empty()));
            }
        }
    }

    #[test]
    fn zero_expected_is_empty() {
        assert!(normalize("1. A?\n2. B?", 0).is_empty());
    }

    #[test]
    fn content_as_json_array() {
        let raw = RawResponse::from_content(r#"["What is X?", "Why Y?"]"#);
        assert_eq!(
            raw,
            RawResponse::Sequence(vec![json!("What is X?"), json!("Why Y?")])
        );
    }

    #[test]
    fn content_in_fenced_json_block() {
        let content = "Sure!\n```json\n{\"questions\": [\"A?\", \"B?\"]}\n```\nGood luck.";
        let set = normalize(RawResponse::from_content(content), 2);
        assert_eq!(questions(&set), ["A?", "B?"]);
    }

    #[test]
    fn content_plain_text_stays_text() {
        let raw = RawResponse::from_content("1. A?\n2. B?");
        assert_eq!(raw, RawResponse::Text("1. A?\n2. B?".into()));
    }

    #[test]
    fn content_drops_reasoning_blocks() {
        let content = "<think>\n1. Let me plan.\n2. Draft.\n</think>\n1. What is X?\n2. Why Y?";
        let set = normalize(RawResponse::from_content(content), 2);
        assert_eq!(questions(&set), ["What is X?", "Why Y?"]);
    }

    #[test]
    fn json_scalar_content_is_text() {
        assert_eq!(RawResponse::from_content("42"), RawResponse::Text("42".into()));
    }
}
