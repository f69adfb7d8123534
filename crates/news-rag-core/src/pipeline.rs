//! The assembled query pipeline.
//!
//! A [`Pipeline`] owns the loaded [`NewsIndex`], the generation backend, an
//! optional embedding backend, and the synthesis settings. It is built once
//! at startup and then reused for every query.

use anyhow::Result;
use serde::Serialize;

use crate::embedding::Embedder;
use crate::generation::Generator;
use crate::models::{Answer, RetrievedDocument};
use crate::retrieve::NewsIndex;
use crate::synthesize::{synthesize, SynthesisSettings};

/// Result of a full `ask`: the retrieved documents and the answer built
/// from them.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub documents: Vec<RetrievedDocument>,
    pub answer: Answer,
}

pub struct Pipeline {
    index: NewsIndex,
    embedder: Option<Box<dyn Embedder>>,
    generator: Box<dyn Generator>,
    settings: SynthesisSettings,
}

impl Pipeline {
    pub fn new(
        index: NewsIndex,
        generator: Box<dyn Generator>,
        settings: SynthesisSettings,
    ) -> Self {
        Self {
            index,
            embedder: None,
            generator,
            settings,
        }
    }

    /// Attach an embedding backend, enabling the semantic filter stage.
    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn index(&self) -> &NewsIndex {
        &self.index
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }

    /// Top-K documents for `query`.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<RetrievedDocument> {
        self.index.retrieve(query, top_k)
    }

    /// Synthesize an answer for `query` from already-retrieved documents.
    pub async fn answer(&self, query: &str, docs: &[RetrievedDocument]) -> Result<Answer> {
        synthesize(
            query,
            docs,
            self.embedder.as_deref(),
            self.generator.as_ref(),
            &self.settings,
        )
        .await
    }

    /// Retrieve then answer.
    pub async fn ask(&self, query: &str, top_k: usize) -> Result<QueryOutcome> {
        let documents = self.retrieve(query, top_k);
        let answer = self.answer(query, &documents).await?;
        Ok(QueryOutcome { documents, answer })
    }
}
