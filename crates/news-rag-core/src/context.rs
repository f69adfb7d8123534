//! Context assembly: dedup and cap selected sentences.

use std::collections::HashSet;

/// Default cap on the number of sentences in a [`Context`].
pub const DEFAULT_MAX_SENTENCES: usize = 6;

/// Ordered, deduplicated, size-bounded sentences for one query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Context {
    sentences: Vec<String>,
}

impl Context {
    pub fn sentences(&self) -> &[String] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Bullet block embedded in the generation prompt, one `- sentence`
    /// per line.
    pub fn render(&self) -> String {
        self.sentences
            .iter()
            .map(|s| format!("- {}", s))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Keep the first occurrence of each sentence, in order, up to
/// `max_sentences`.
pub fn assemble<I, S>(sentences: I, max_sentences: usize) -> Context
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for s in sentences {
        if kept.len() >= max_sentences {
            break;
        }
        let s: String = s.into();
        if seen.insert(s.clone()) {
            kept.push(s);
        }
    }

    Context { sentences: kept }
}
