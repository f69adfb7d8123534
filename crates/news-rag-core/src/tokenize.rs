//! Text normalization shared by index building, query scoring, and sentence
//! filtering.
//!
//! [`normalize`] is the single tokenizer used both when the BM25 index is
//! built and when a query is scored. Index scores only line up with query
//! scores when both sides go through it.
//!
//! | Function | Keeps | Stopwords | Min length |
//! |----------|-------|-----------|------------|
//! | [`normalize`] | `[a-z0-9]` words | [`STOPWORDS`] | 3 |
//! | [`clean_sentence_text`] | `[a-z0-9]` + `. ! ?` | none | none |
//! | [`keywords`] | `[a-z0-9]` words | caller-supplied | 2 |
//! | [`word_set`] | `[a-z0-9]` words | none | none |

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// English function words dropped by [`normalize`].
pub const STOPWORDS: &[&str] = &[
    "the", "is", "are", "of", "and", "to", "in", "on", "for", "with", "a", "an", "that", "this",
    "it", "as", "by", "from",
];

/// Tokens shorter than this are dropped by [`normalize`].
pub const MIN_TOKEN_LEN: usize = 3;

/// Tokens shorter than this are dropped by [`keywords`]. Cleaning splits
/// `it's` into `it s`, so single letters are possessive/contraction debris.
pub const MIN_KEYWORD_LEN: usize = 2;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"http\S+").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static NON_SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\s.!?]").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Lower-case, strip URLs, and replace everything `keep` rejects with spaces.
fn clean_with(text: &str, keep: &Regex) -> String {
    let lower = text.to_lowercase();
    let no_urls = URL_RE.replace_all(&lower, " ");
    let stripped = keep.replace_all(&no_urls, " ");
    WHITESPACE_RE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Clean text down to lower-case alphanumeric words separated by single spaces.
pub fn clean_text(text: &str) -> String {
    clean_with(text, &NON_WORD_RE)
}

/// Sentence-preserving cleanup: like [`clean_text`] but keeps `.`, `!` and `?`
/// so the result can still be split into sentences.
pub fn clean_sentence_text(text: &str) -> String {
    clean_with(text, &NON_SENTENCE_RE)
}

/// Tokenize text for BM25 indexing and query scoring.
///
/// Drops [`STOPWORDS`] and tokens shorter than [`MIN_TOKEN_LEN`] characters.
/// No stemming is applied.
///
/// ```rust
/// use news_rag_core::tokenize::normalize;
///
/// assert_eq!(normalize("Sleep Deprivation!"), vec!["sleep", "deprivation"]);
/// assert_eq!(normalize("Read it at https://example.com/a now"), vec!["read", "now"]);
/// ```
pub fn normalize(text: &str) -> Vec<String> {
    clean_text(text)
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !is_stopword(t))
        .map(str::to_string)
        .collect()
}

/// Query keywords for lexical sentence matching.
///
/// The length floor is [`MIN_KEYWORD_LEN`] rather than [`MIN_TOKEN_LEN`], so
/// short topical terms such as `tv` survive while stray letters do not.
/// Duplicates are removed, first occurrence wins.
pub fn keywords(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    clean_text(text)
        .split_whitespace()
        .filter(|t| t.len() >= MIN_KEYWORD_LEN && !stopwords.contains(*t))
        .filter(|t| seen.insert(t.to_string()))
        .map(str::to_string)
        .collect()
}

/// Every cleaned word of `text`, without any filtering.
pub fn word_set(text: &str) -> HashSet<String> {
    clean_text(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
