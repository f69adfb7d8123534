//! Index statistics and health overview.
//!
//! Provides a quick summary of what's indexed: document count, vocabulary
//! size, average document length, and a per-category breakdown. Used by
//! `nrag stats` to confirm a build picked up the expected corpus.

use anyhow::Result;
use news_rag_core::artifact::IndexArtifact;
use std::collections::BTreeMap;

use crate::config::Config;
use crate::index::load_artifact;

/// Per-category document counts, largest first, ties by name.
pub fn category_counts(artifact: &IndexArtifact) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &artifact.documents {
        *counts.entry(doc.category.as_str()).or_insert(0) += 1;
    }
    let mut rows: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1));
    rows
}

/// Run the stats command: load the artifact and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    let path = &config.data.index_path;
    let artifact = load_artifact(path)?;

    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("News RAG — Index Stats");
    println!("======================");
    println!();
    println!("  Index:       {}", path.display());
    println!("  Size:        {}", format_bytes(file_size));
    println!(
        "  Built:       {}",
        artifact.built_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("  Fingerprint: {}", &artifact.fingerprint[..12.min(artifact.fingerprint.len())]);
    println!();
    println!("  Documents:   {}", artifact.documents.len());
    println!("  Vocabulary:  {}", artifact.index.vocabulary_size());
    println!("  Avg length:  {:.1} tokens", artifact.index.avg_doc_len());

    let rows = category_counts(&artifact);
    if !rows.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<24} {:>6}", "CATEGORY", "DOCS");
        println!("  {}", "-".repeat(31));
        for (category, count) in &rows {
            let label = if category.is_empty() {
                "(none)"
            } else {
                category.as_str()
            };
            println!("  {:<24} {:>6}", label, count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}
