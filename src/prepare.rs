//! Dataset preparation: raw News Category Dataset → cleaned corpus.
//!
//! Each input line is a JSON article. Headline, short description, and
//! category are joined into one text and cleaned with
//! [`clean_sentence_text`], which keeps sentence punctuation so the
//! relevance filter can split the text later. Fields other than the three
//! used here are ignored.

use anyhow::{Context, Result};
use news_rag_core::tokenize::clean_sentence_text;
use news_rag_core::Document;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::corpus::write_corpus;

/// One line of the raw dataset. Missing fields read as empty.
#[derive(Debug, Deserialize, Default)]
pub struct RawArticle {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawArticle {
    /// `headline. short_description. Category: category`
    pub fn compose_text(&self) -> String {
        format!(
            "{}. {}. Category: {}",
            self.headline.as_deref().unwrap_or(""),
            self.short_description.as_deref().unwrap_or(""),
            self.category.as_deref().unwrap_or("")
        )
    }

    pub fn into_document(self) -> Document {
        let text = clean_sentence_text(&self.compose_text());
        Document {
            headline: self.headline.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            text,
        }
    }
}

/// Convert raw dataset lines into documents, in input order.
///
/// Blank lines are skipped. A malformed line aborts with its line number.
pub fn prepare_documents<R: BufRead>(reader: R) -> Result<Vec<Document>> {
    let mut documents = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let article: RawArticle = serde_json::from_str(&line)
            .with_context(|| format!("Malformed article on line {}", i + 1))?;
        documents.push(article.into_document());
    }
    Ok(documents)
}

/// Run `nrag prepare`: read the dataset, write the cleaned corpus.
pub fn run_prepare(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input)
        .with_context(|| format!("Failed to open dataset: {}", input.display()))?;
    let documents = prepare_documents(BufReader::new(file))
        .with_context(|| format!("Failed to prepare dataset: {}", input.display()))?;

    write_corpus(output, &documents)?;
    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        documents = documents.len(),
        "prepared corpus"
    );

    println!("Prepared {} documents", documents.len());
    println!("  corpus: {}", output.display());
    Ok(())
}
