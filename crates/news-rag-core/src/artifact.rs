//! The persisted index artifact.
//!
//! A single serializable value holding the fitted BM25 index and the full
//! document table it was fitted on. Reading and writing the file is left to
//! the application; this module owns the format and its integrity checks.

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::bm25::{Bm25Index, Bm25Params};
use crate::models::Document;
use crate::retrieve::NewsIndex;

/// Bumped whenever the artifact layout or the tokenizer changes.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexArtifact {
    pub format_version: u32,
    pub built_at: DateTime<Utc>,
    /// SHA-256 over the ordered document table, see [`corpus_fingerprint`].
    pub fingerprint: String,
    pub documents: Vec<Document>,
    pub index: Bm25Index,
}

impl IndexArtifact {
    /// Fit a fresh index over `documents`.
    pub fn build(documents: Vec<Document>, params: Bm25Params) -> Self {
        let fingerprint = corpus_fingerprint(&documents);
        let (documents, index) = NewsIndex::build(documents, params).into_parts();
        Self {
            format_version: FORMAT_VERSION,
            built_at: Utc::now(),
            fingerprint,
            documents,
            index,
        }
    }

    /// Check version, fingerprint, and size alignment.
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            bail!(
                "Unsupported index format version {} (expected {}). Rebuild the index.",
                self.format_version,
                FORMAT_VERSION
            );
        }
        let actual = corpus_fingerprint(&self.documents);
        if actual != self.fingerprint {
            bail!("Index fingerprint mismatch: the document table was modified after the build");
        }
        if self.documents.len() != self.index.len() {
            bail!(
                "Index covers {} documents but the artifact holds {}",
                self.index.len(),
                self.documents.len()
            );
        }
        Ok(())
    }

    /// Validate and convert into a queryable [`NewsIndex`].
    pub fn into_index(self) -> Result<NewsIndex> {
        self.validate()?;
        NewsIndex::from_parts(self.documents, self.index)
    }
}

/// SHA-256 over every document's fields, in corpus order.
///
/// Fields are length-prefixed so that moving text between fields or
/// between documents changes the hash.
pub fn corpus_fingerprint(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    hasher.update((documents.len() as u64).to_le_bytes());
    for doc in documents {
        for field in [&doc.headline, &doc.category, &doc.text] {
            hasher.update((field.len() as u64).to_le_bytes());
            hasher.update(field.as_bytes());
        }
    }
    format!("{:x}", hasher.finalize())
}
