//! Top-K document retrieval over the BM25 index.
//!
//! [`NewsIndex`] pairs the corpus with the index fitted over it. The two are
//! only ever constructed together, so score positions always line up with
//! document positions.

use anyhow::{bail, Result};

use crate::bm25::{Bm25Index, Bm25Params};
use crate::models::{Document, RetrievedDocument};
use crate::tokenize::normalize;

/// Default number of documents returned by [`NewsIndex::retrieve`].
pub const DEFAULT_TOP_K: usize = 5;

/// The corpus together with its fitted BM25 index.
#[derive(Debug, Clone)]
pub struct NewsIndex {
    documents: Vec<Document>,
    bm25: Bm25Index,
}

impl NewsIndex {
    /// Tokenize every document with [`normalize`] and fit the index.
    pub fn build(documents: Vec<Document>, params: Bm25Params) -> Self {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| normalize(&d.text)).collect();
        let bm25 = Bm25Index::with_params(&tokenized, params);
        Self { documents, bm25 }
    }

    /// Pair an already-fitted index with its corpus.
    ///
    /// Fails if the sizes disagree, which means the two were not built
    /// from the same document table.
    pub fn from_parts(documents: Vec<Document>, bm25: Bm25Index) -> Result<Self> {
        if documents.len() != bm25.len() {
            bail!(
                "Index covers {} documents but the corpus has {}",
                bm25.len(),
                documents.len()
            );
        }
        Ok(Self { documents, bm25 })
    }

    pub fn into_parts(self) -> (Vec<Document>, Bm25Index) {
        (self.documents, self.bm25)
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn bm25(&self) -> &Bm25Index {
        &self.bm25
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Score every document against `query`, in corpus order.
    pub fn scores(&self, query: &str) -> Vec<f64> {
        self.bm25.score(&normalize(query))
    }

    /// Return the `top_k` highest-scoring documents for `query`.
    ///
    /// Ties keep corpus order. An empty or unmatched query scores every
    /// document zero and therefore yields the first `top_k` documents;
    /// rejecting empty input is the caller's job.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedDocument> {
        let scores = self.scores(query);
        let mut ranked: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();

        // sort_by is stable, so equal scores stay in corpus order.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);

        tracing::debug!(query, top_k, returned = ranked.len(), "retrieved documents");

        ranked
            .into_iter()
            .map(|(idx, score)| RetrievedDocument::from_document(idx, score, &self.documents[idx]))
            .collect()
    }
}
