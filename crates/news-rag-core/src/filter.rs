//! Sentence-level relevance filtering.
//!
//! Two interchangeable strategies pick the sentences that ground an answer:
//!
//! - **Semantic**: embed the query and every candidate sentence, keep the
//!   ones whose cosine similarity is strictly above `threshold`. If none
//!   clears it, fall back to the `fallback_top_k` most similar sentences.
//! - **Lexical**: expand the query keywords through a synonym map and keep
//!   sentences sharing at least one word with the expanded set, capped per
//!   source document by overlap count.
//!
//! In [`FilterStrategy::Auto`] the semantic stage runs first (when an
//! embedder is available) and the lexical stage only runs if it selected
//! nothing.

use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};

use crate::embedding::{cosine_similarity, Embedder};
use crate::models::RetrievedDocument;
use crate::sentences::{extract_sentences, DEFAULT_MIN_SENTENCE_LEN};
use crate::tokenize::{keywords, word_set, STOPWORDS};

/// Which strategy (or fallback chain) to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStrategy {
    /// Semantic first (if an embedder is configured), then lexical.
    #[default]
    Auto,
    Semantic,
    Lexical,
}

impl std::str::FromStr for FilterStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(FilterStrategy::Auto),
            "semantic" => Ok(FilterStrategy::Semantic),
            "lexical" => Ok(FilterStrategy::Lexical),
            other => bail!(
                "Unknown filter strategy: '{}'. Use auto, semantic, or lexical.",
                other
            ),
        }
    }
}

/// The stage that produced a [`Selection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    /// Sentences above the similarity threshold.
    SemanticThreshold,
    /// Top-K by similarity after nothing cleared the threshold.
    SemanticFallback,
    Lexical,
}

/// Sentences chosen for one query and the stage that chose them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selection {
    pub stage: Option<FilterStage>,
    pub sentences: Vec<String>,
}

impl Selection {
    fn from_stage(stage: FilterStage, sentences: Vec<String>) -> Self {
        Self {
            stage: Some(stage),
            sentences,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Query-term expansion table. Terms without an entry pass through as-is.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct SynonymMap(BTreeMap<String, Vec<String>>);

impl SynonymMap {
    /// Build a table from user entries; keys and expansions are lower-cased
    /// to line up with cleaned sentence words.
    pub fn new(entries: BTreeMap<String, Vec<String>>) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| {
                    (
                        k.to_lowercase(),
                        v.into_iter().map(|w| w.to_lowercase()).collect(),
                    )
                })
                .collect(),
        )
    }

    /// The built-in expansion table.
    pub fn builtin() -> Self {
        let entries: &[(&str, &[&str])] = &[
            ("sleep", &["sleep", "sleeping"]),
            ("exercise", &["exercise", "exercising", "workout"]),
            ("stress", &["stress", "stressed", "anxiety"]),
            ("diet", &["diet", "eating", "nutrition"]),
            ("tv", &["tv", "television"]),
            ("effect", &["effect", "effects"]),
        ];
        Self(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        )
    }

    /// The term itself plus any configured synonyms.
    pub fn expand(&self, term: &str) -> Vec<String> {
        let mut out = vec![term.to_string()];
        if let Some(extra) = self.0.get(term) {
            out.extend(extra.iter().filter(|s| s.as_str() != term).cloned());
        }
        out
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Stopwords removed from lexical query keywords by default.
pub fn default_query_stopwords() -> HashSet<String> {
    STOPWORDS
        .iter()
        .chain(["what", "how", "does", "do"].iter())
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticParams {
    /// Keep sentences with similarity strictly above this value.
    pub threshold: f32,
    /// Fallback size when nothing clears the threshold; `0` disables it.
    pub fallback_top_k: usize,
}

impl Default for SemanticParams {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            fallback_top_k: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexicalParams {
    pub synonyms: SynonymMap,
    pub stopwords: HashSet<String>,
    /// Maximum sentences kept per document; `0` means unlimited.
    pub max_per_document: usize,
}

impl Default for LexicalParams {
    fn default() -> Self {
        Self {
            synonyms: SynonymMap::builtin(),
            stopwords: default_query_stopwords(),
            max_per_document: 2,
        }
    }
}

/// All relevance-filter tuning, decoupled from application config.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSettings {
    pub strategy: FilterStrategy,
    pub min_sentence_len: usize,
    pub semantic: SemanticParams,
    pub lexical: LexicalParams,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            strategy: FilterStrategy::Auto,
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
            semantic: SemanticParams::default(),
            lexical: LexicalParams::default(),
        }
    }
}

/// Expanded query term set used by the lexical strategy.
pub fn expand_query(query: &str, params: &LexicalParams) -> HashSet<String> {
    keywords(query, &params.stopwords)
        .iter()
        .flat_map(|term| params.synonyms.expand(term))
        .filter(|term| !params.stopwords.contains(term))
        .collect()
}

/// Lexical strategy: keep sentences whose words intersect the expanded
/// query terms.
///
/// Within a document, sentences are ranked by overlap count (ties keep
/// encounter order) and cut at `max_per_document`. Documents are visited in
/// retrieval order.
pub fn lexical_filter(
    query: &str,
    docs: &[RetrievedDocument],
    min_sentence_len: usize,
    params: &LexicalParams,
) -> Vec<String> {
    let terms = expand_query(query, params);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut selected = Vec::new();
    for doc in docs {
        let mut matches: Vec<(usize, String)> = extract_sentences(&doc.text, min_sentence_len)
            .filter_map(|s| {
                let overlap = word_set(&s).intersection(&terms).count();
                (overlap > 0).then_some((overlap, s))
            })
            .collect();

        matches.sort_by(|a, b| b.0.cmp(&a.0));
        if params.max_per_document > 0 {
            matches.truncate(params.max_per_document);
        }
        selected.extend(matches.into_iter().map(|(_, s)| s));
    }

    selected
}

/// Semantic strategy: threshold on cosine similarity, falling back to the
/// most similar sentences when nothing clears the threshold.
pub async fn semantic_filter(
    embedder: &dyn Embedder,
    query: &str,
    docs: &[RetrievedDocument],
    min_sentence_len: usize,
    params: &SemanticParams,
) -> Result<Selection> {
    let sentences: Vec<String> = docs
        .iter()
        .flat_map(|d| extract_sentences(&d.text, min_sentence_len))
        .collect();

    if sentences.is_empty() {
        return Ok(Selection::default());
    }

    let query_vec = embedder
        .embed(&[query.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Empty embedding response for query"))?;

    let sentence_vecs = embedder.embed(&sentences).await?;
    if sentence_vecs.len() != sentences.len() {
        bail!(
            "Embedding service returned {} vectors for {} sentences",
            sentence_vecs.len(),
            sentences.len()
        );
    }

    let sims: Vec<f32> = sentence_vecs
        .iter()
        .map(|v| cosine_similarity(&query_vec, v))
        .collect();

    let above: Vec<String> = sentences
        .iter()
        .zip(&sims)
        .filter(|(_, sim)| **sim > params.threshold)
        .map(|(s, _)| s.clone())
        .collect();

    if !above.is_empty() {
        return Ok(Selection::from_stage(FilterStage::SemanticThreshold, above));
    }

    if params.fallback_top_k == 0 {
        return Ok(Selection::default());
    }

    let mut ranked: Vec<usize> = (0..sentences.len()).collect();
    ranked.sort_by(|&a, &b| {
        sims[b]
            .partial_cmp(&sims[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(params.fallback_top_k);

    Ok(Selection::from_stage(
        FilterStage::SemanticFallback,
        ranked.into_iter().map(|i| sentences[i].clone()).collect(),
    ))
}

/// Run the configured strategy chain over the retrieved documents.
///
/// An empty [`Selection`] means no grounding was found by any stage.
/// Embedding failures propagate; they do not silently fall through to the
/// lexical stage.
pub async fn select_relevant(
    query: &str,
    docs: &[RetrievedDocument],
    embedder: Option<&dyn Embedder>,
    settings: &FilterSettings,
) -> Result<Selection> {
    let min_len = settings.min_sentence_len;

    if settings.strategy != FilterStrategy::Lexical {
        match embedder {
            Some(embedder) => {
                let selection =
                    semantic_filter(embedder, query, docs, min_len, &settings.semantic).await?;
                tracing::debug!(
                    stage = ?selection.stage,
                    selected = selection.sentences.len(),
                    "semantic filter finished"
                );
                if !selection.is_empty() || settings.strategy == FilterStrategy::Semantic {
                    return Ok(selection);
                }
            }
            None if settings.strategy == FilterStrategy::Semantic => {
                bail!("Filter strategy 'semantic' requires an embedding provider");
            }
            None => {}
        }
    }

    let sentences = lexical_filter(query, docs, min_len, &settings.lexical);
    tracing::debug!(selected = sentences.len(), "lexical filter finished");

    if sentences.is_empty() {
        Ok(Selection::default())
    } else {
        Ok(Selection::from_stage(FilterStage::Lexical, sentences))
    }
}
