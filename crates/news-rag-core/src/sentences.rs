//! Sentence extraction from document text.

use crate::tokenize::clean_sentence_text;

/// Fragments shorter than this many characters are dropped by default.
pub const DEFAULT_MIN_SENTENCE_LEN: usize = 8;

/// Lazy iterator over the sentences of one cleaned text.
///
/// Nothing is cached: each call to [`extract_sentences`] recomputes the
/// sequence, and a clone taken before consuming walks it again.
#[derive(Debug, Clone)]
pub struct Sentences {
    cleaned: String,
    pos: usize,
    min_len: usize,
}

impl Iterator for Sentences {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.cleaned.len() {
            let rest = &self.cleaned[self.pos..];
            let end = rest.find(['.', '!', '?']).unwrap_or(rest.len());
            let fragment = rest[..end].trim();
            // Terminators are ASCII, so skipping one byte stays on a char boundary.
            self.pos += (end + 1).min(rest.len());
            if fragment.len() >= self.min_len {
                return Some(fragment.to_string());
            }
        }
        None
    }
}

/// Split `text` into sentences using the sentence-preserving cleanup.
///
/// ```rust
/// use news_rag_core::sentences::extract_sentences;
///
/// let s: Vec<String> = extract_sentences("Sleep matters! Ok. Exercise helps too?", 8).collect();
/// assert_eq!(s, vec!["sleep matters", "exercise helps too"]);
/// ```
pub fn extract_sentences(text: &str, min_len: usize) -> Sentences {
    Sentences {
        cleaned: clean_sentence_text(text),
        pos: 0,
        min_len,
    }
}
