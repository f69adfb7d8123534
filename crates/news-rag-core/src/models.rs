//! Core data models shared across the pipeline.
//!
//! [`Document`]s are produced once by dataset preparation and never mutated.
//! Everything else here lives for a single query.

use serde::{Deserialize, Serialize};

/// A cleaned news article. Its identity is its position in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub headline: String,
    pub category: String,
    pub text: String,
}

/// A document selected by the retriever, ranked by descending score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedDocument {
    /// Position of the document in the corpus.
    pub index: usize,
    /// BM25 relevance score for the query.
    pub score: f64,
    pub headline: String,
    pub category: String,
    pub text: String,
}

impl RetrievedDocument {
    pub fn from_document(index: usize, score: f64, doc: &Document) -> Self {
        Self {
            index,
            score,
            headline: doc.headline.clone(),
            category: doc.category.clone(),
            text: doc.text.clone(),
        }
    }
}

/// The outcome of answer synthesis for one query.
///
/// Every terminal state of the synthesizer is a distinct variant so callers
/// can tell a grounded answer apart from the fixed fallback messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Answer {
    /// The retriever returned no documents.
    NoDocuments(String),
    /// The category allow-list removed every retrieved document.
    NoCategoryMatch(String),
    /// Topic short-circuit: templated summary of matched topic labels.
    Topics(String),
    /// No relevant sentences survived filtering.
    NotFound(String),
    /// Trimmed output of the generation service.
    Generated(String),
    /// The generation service returned only whitespace.
    EmptyGeneration(String),
}

impl Answer {
    /// The human-readable answer text.
    pub fn text(&self) -> &str {
        match self {
            Answer::NoDocuments(t)
            | Answer::NoCategoryMatch(t)
            | Answer::Topics(t)
            | Answer::NotFound(t)
            | Answer::Generated(t)
            | Answer::EmptyGeneration(t) => t,
        }
    }

    /// Short machine-readable label for the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Answer::NoDocuments(_) => "no_documents",
            Answer::NoCategoryMatch(_) => "no_category_match",
            Answer::Topics(_) => "topics",
            Answer::NotFound(_) => "not_found",
            Answer::Generated(_) => "generated",
            Answer::EmptyGeneration(_) => "empty_generation",
        }
    }

    /// True when the answer came from the generation service with content.
    pub fn is_grounded(&self) -> bool {
        matches!(self, Answer::Generated(_))
    }
}
