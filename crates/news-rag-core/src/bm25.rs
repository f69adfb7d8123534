//! Okapi BM25 index over a tokenized corpus.
//!
//! Term frequencies, document lengths, and inverse document frequencies are
//! computed once at construction time. Scoring a query walks every document,
//! which is fine for the corpus sizes this crate targets.
//!
//! # Scoring
//!
//! ```text
//! idf(t)      = ln(N - df + 0.5) - ln(df + 0.5)
//! score(q, d) = Σ idf(t) · tf · (k1 + 1) / (tf + k1 · (1 - b + b · |d| / avgdl))
//! ```
//!
//! Terms present in more than half of the corpus get a negative raw IDF.
//! Those are floored to `epsilon × mean(idf)` so common terms still add a
//! small positive contribution instead of penalising a match.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    /// Term frequency saturation.
    pub k1: f64,
    /// Document length normalization in `[0, 1]`.
    pub b: f64,
    /// Floor factor applied to negative IDF values.
    pub epsilon: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            epsilon: 0.25,
        }
    }
}

/// A fitted BM25 index. Scores are positionally aligned with the token
/// sequences it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bm25Index {
    params: Bm25Params,
    /// `doc_term_freqs[doc][term]` = occurrences of `term` in `doc`.
    doc_term_freqs: Vec<HashMap<String, u32>>,
    doc_lengths: Vec<usize>,
    avg_doc_len: f64,
    idf: BTreeMap<String, f64>,
}

impl Bm25Index {
    /// Fit an index with default parameters.
    pub fn build(docs: &[Vec<String>]) -> Self {
        Self::with_params(docs, Bm25Params::default())
    }

    /// Fit an index with explicit parameters.
    pub fn with_params(docs: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_term_freqs = Vec::with_capacity(docs.len());
        let mut doc_lengths = Vec::with_capacity(docs.len());
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();

        for tokens in docs {
            let mut term_freq: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
            }
            for term in term_freq.keys() {
                *doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            doc_term_freqs.push(term_freq);
            doc_lengths.push(tokens.len());
        }

        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            doc_lengths.iter().sum::<usize>() as f64 / docs.len() as f64
        };

        let idf = compute_idf(&doc_freq, docs.len(), params.epsilon);

        Self {
            params,
            doc_term_freqs,
            doc_lengths,
            avg_doc_len,
            idf,
        }
    }

    /// Score every document against `query_tokens`.
    ///
    /// The returned vector has one entry per indexed document, in build
    /// order. Repeated query tokens contribute once per occurrence.
    pub fn score(&self, query_tokens: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_term_freqs.len()];
        let Bm25Params { k1, b, .. } = self.params;

        for token in query_tokens {
            let Some(&idf) = self.idf.get(token) else {
                continue;
            };
            for (doc_idx, term_freqs) in self.doc_term_freqs.iter().enumerate() {
                let tf = term_freqs.get(token).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    continue;
                }
                let length_ratio = if self.avg_doc_len > 0.0 {
                    self.doc_lengths[doc_idx] as f64 / self.avg_doc_len
                } else {
                    1.0
                };
                let denominator = tf + k1 * (1.0 - b + b * length_ratio);
                scores[doc_idx] += idf * tf * (k1 + 1.0) / denominator;
            }
        }

        scores
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_term_freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_term_freqs.is_empty()
    }

    /// Number of distinct terms across the corpus.
    pub fn vocabulary_size(&self) -> usize {
        self.idf.len()
    }

    /// Mean document length in tokens.
    pub fn avg_doc_len(&self) -> f64 {
        self.avg_doc_len
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    /// IDF weight of `term`, if it occurs in the corpus.
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }
}

fn compute_idf(
    doc_freq: &BTreeMap<String, usize>,
    corpus_size: usize,
    epsilon: f64,
) -> BTreeMap<String, f64> {
    let n = corpus_size as f64;
    let mut idf = BTreeMap::new();
    let mut idf_sum = 0.0;
    let mut negative = Vec::new();

    for (term, &df) in doc_freq {
        let df = df as f64;
        let value = (n - df + 0.5).ln() - (df + 0.5).ln();
        idf_sum += value;
        if value < 0.0 {
            negative.push(term.clone());
        }
        idf.insert(term.clone(), value);
    }

    if !idf.is_empty() {
        let floor = epsilon * idf_sum / idf.len() as f64;
        for term in negative {
            idf.insert(term, floor);
        }
    }

    idf
}
