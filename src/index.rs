//! Building, saving, and loading the index artifact.
//!
//! The artifact is a single JSON file (see
//! [`IndexArtifact`](news_rag_core::artifact::IndexArtifact)). Loading it
//! validates the format version, the corpus fingerprint, and index/corpus
//! alignment; any failure is fatal to the calling command.

use anyhow::{Context, Result};
use news_rag_core::artifact::IndexArtifact;
use news_rag_core::retrieve::NewsIndex;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::config::Config;
use crate::corpus::read_corpus;

pub fn save_artifact(path: &Path, artifact: &IndexArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create index file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer(&mut out, artifact)
        .with_context(|| format!("Failed to write index file: {}", path.display()))?;
    out.flush()?;
    Ok(())
}

/// Read and validate an artifact.
pub fn load_artifact(path: &Path) -> Result<IndexArtifact> {
    let file = File::open(path).with_context(|| {
        format!(
            "Failed to open index file: {} (run `nrag build` first)",
            path.display()
        )
    })?;
    let artifact: IndexArtifact = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Malformed index file: {}", path.display()))?;
    artifact
        .validate()
        .with_context(|| format!("Invalid index file: {}", path.display()))?;
    Ok(artifact)
}

/// Load the configured artifact as a queryable index.
pub fn load_index(config: &Config) -> Result<NewsIndex> {
    let path = &config.data.index_path;
    let artifact = load_artifact(path)?;
    let built_at = artifact.built_at;
    let index = artifact.into_index()?;
    tracing::info!(
        path = %path.display(),
        documents = index.len(),
        %built_at,
        "loaded index"
    );
    Ok(index)
}

/// Run `nrag build`: fit BM25 over the corpus and write the artifact.
pub fn run_build(config: &Config, corpus: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let corpus_path = corpus.unwrap_or(&config.data.corpus_path);
    let output_path = output.unwrap_or(&config.data.index_path);

    let documents = read_corpus(corpus_path)?;
    let artifact = IndexArtifact::build(documents, config.bm25_params());
    save_artifact(output_path, &artifact)?;

    tracing::info!(
        corpus = %corpus_path.display(),
        output = %output_path.display(),
        documents = artifact.documents.len(),
        vocabulary = artifact.index.vocabulary_size(),
        "built index"
    );

    println!("Indexed {} documents", artifact.documents.len());
    println!("  index: {}", output_path.display());
    Ok(())
}
