//! JSON-lines storage for the cleaned document table.
//!
//! One [`Document`] per line, in corpus order. Line order is document
//! identity, so both reader and writer preserve it exactly.

use anyhow::{Context, Result};
use news_rag_core::Document;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Read a corpus file. Blank lines are skipped; any other unparsable line
/// is an error carrying its 1-based line number.
pub fn read_corpus(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open corpus file: {}", path.display()))?;
    parse_corpus(BufReader::new(file))
        .with_context(|| format!("Failed to read corpus file: {}", path.display()))
}

pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("Malformed document on line {}", i + 1))?;
        documents.push(doc);
    }
    Ok(documents)
}

/// Write a corpus file, creating parent directories as needed.
pub fn write_corpus(path: &Path, documents: &[Document]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create corpus file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for doc in documents {
        serde_json::to_writer(&mut out, doc)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
