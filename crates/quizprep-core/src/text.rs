//! Text cleanup and keyword extraction for note content.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static PAGE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+$\n?").unwrap());
static LONG_DASH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[–—]").unwrap());

/// Flatten text to single-spaced prose with plain hyphens.
pub fn clean_text(text: &str) -> String {
    let text = WHITESPACE.replace_all(text, " ");
    LONG_DASH.replace_all(&text, "-").trim().to_string()
}

/// Tidy text extracted from a PDF.
///
/// Keeps one newline between lines, drops non-printable characters, squeezes
/// horizontal whitespace and removes lines holding only a page number.
pub fn clean_pdf_text(text: &str) -> String {
    let printable: String = text
        .chars()
        .map(|c| if c == '\u{000C}' || c == '\r' { '\n' } else { c })
        .filter(|&c| c == '\n' || !c.is_control())
        .collect();

    let text = SPACES.replace_all(&printable, " ");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    let text = NEWLINES.replace_all(lines.join("\n").as_str(), "\n").into_owned();
    PAGE_NUMBER.replace_all(&text, "").trim().to_string()
}

/// Most frequent content words, most frequent first.
///
/// Words are lowercased, alphanumeric, longer than two characters and not a
/// common English or French stopword. Ties keep first-appearance order.
pub fn extract_key_concepts(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let words = text
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.chars().count() > 2 && !w.chars().all(|c| c.is_numeric()))
        .filter(|w| !is_stopword(w));

    for (position, word) in words.enumerate() {
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, (count, _))| (word, count))
        .collect()
}

/// Sentences of `text` that mention `concept` as a whole word.
pub fn sentences_with(text: &str, concept: &str) -> Vec<String> {
    let Ok(pattern) = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(concept))) else {
        return Vec::new();
    };
    split_sentences(&clean_text(text))
        .into_iter()
        .filter(|s| pattern.is_match(s))
        .map(str::to_string)
        .collect()
}

fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let end = i + c.len_utf8();
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail);
    }
    sentences
}

fn is_stopword(word: &str) -> bool {
    STOPWORDS.binary_search(&word).is_ok()
}

// Sorted for binary search.
const STOPWORDS: &[&str] = &[
    "about", "after", "again", "against", "all", "also", "and", "any", "are", "au", "aux",
    "avec", "because", "been", "before", "being", "between", "both", "but", "can", "ce", "ces",
    "cette", "comme", "dans", "des", "did", "does", "doing", "donc", "dont", "down", "du",
    "during", "each", "elle", "elles", "est", "few", "for", "from", "further", "had", "has",
    "have", "having", "her", "here", "hers", "him", "his", "how", "ils", "into", "its",
    "itself", "les", "leur", "leurs", "lui", "mais", "mes", "more", "most", "nos", "not",
    "notre", "nous", "now", "off", "once", "only", "other", "our", "ours", "out", "over", "own",
    "par", "pas", "peut", "plus", "pour", "qui", "quoi", "same", "sans", "ses", "she", "should",
    "since", "some", "son", "sont", "such", "sur", "than", "that", "the", "their", "theirs",
    "them", "then", "there", "these", "they", "this", "those", "through", "too", "tous", "tout",
    "under", "une", "until", "very", "vos", "votre", "vous", "was", "were", "what", "when",
    "where", "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your",
    "yours", "être",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwords_are_sorted() {
        assert!(STOPWORDS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn clean_text_flattens() {
        assert_eq!(
            clean_text("  Cells\n\n divide — often\tquickly  "),
            "Cells divide - often quickly"
        );
    }

    #[test]
    fn clean_pdf_text_drops_page_numbers_and_noise() {
        let raw = "Chapter 1\n\n\nCells   divide.\u{0007}\n12\nMitosis has phases.\u{000C}13\n";
        assert_eq!(
            clean_pdf_text(raw),
            "Chapter 1\nCells divide.\nMitosis has phases."
        );
    }

    #[test]
    fn key_concepts_by_frequency() {
        let text = "Mitosis splits a cell. The cell copies DNA before mitosis. \
                    Each cell ends with DNA. The cell is small.";
        let concepts = extract_key_concepts(text, 3);
        assert_eq!(
            concepts,
            vec![
                ("cell".to_string(), 4),
                ("mitosis".to_string(), 2),
                ("dna".to_string(), 2)
            ]
        );
    }

    #[test]
    fn key_concepts_skip_stopwords_and_numbers() {
        let concepts = extract_key_concepts("les cellules et the 2024 cellules", 5);
        assert_eq!(concepts, vec![("cellules".to_string(), 2)]);
    }

    #[test]
    fn sentences_mentioning_concept() {
        let text = "Osmosis moves water. Diffusion moves solutes! Is osmosis passive?";
        assert_eq!(
            sentences_with(text, "osmosis"),
            ["Osmosis moves water.", "Is osmosis passive?"]
        );
    }
}
