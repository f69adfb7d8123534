//! Retrieval-only search: `nrag search "<query>"`.

use anyhow::Result;
use news_rag_core::RetrievedDocument;

use crate::config::Config;
use crate::index::load_index;

/// Excerpt length (characters) shown per document.
const EXCERPT_CHARS: usize = 200;

/// Print ranked documents in the CLI's result format.
pub fn print_documents(docs: &[RetrievedDocument]) {
    if docs.is_empty() {
        println!("No results.");
        return;
    }

    for (i, doc) in docs.iter().enumerate() {
        let headline = if doc.headline.is_empty() {
            "(untitled)"
        } else {
            doc.headline.as_str()
        };
        println!("{}. [{:.2}] {} / {}", i + 1, doc.score, doc.category, headline);
        println!("    excerpt: \"{}\"", excerpt(&doc.text));
        println!("    doc: {}", doc.index);
        println!();
    }
}

fn excerpt(text: &str) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Print the standard warning for a blank query. Returns true if the query
/// was blank.
pub fn warn_if_blank(query: &str) -> bool {
    if query.trim().is_empty() {
        eprintln!("Please enter a question.");
        return true;
    }
    false
}

pub fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if warn_if_blank(query) {
        return Ok(());
    }

    let index = load_index(config)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let docs = index.retrieve(query, top_k);
    print_documents(&docs);
    Ok(())
}
