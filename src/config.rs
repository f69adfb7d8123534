//! TOML configuration parsing and validation.
//!
//! Every section is optional and falls back to its defaults, so an empty
//! file is a valid configuration (lexical filtering, generation disabled).
//!
//! | Section | Purpose |
//! |---------|---------|
//! | `[data]` | Corpus and index artifact paths |
//! | `[retrieval]` | BM25 parameters and default `top_k` |
//! | `[filter]` | Relevance filter strategy and tuning |
//! | `[synthesis]` | Category gate, topic rules, prompt and messages |
//! | `[embedding]` | Embedding provider for the semantic filter |
//! | `[generation]` | Generation provider for grounded answers |

use anyhow::{Context, Result};
use news_rag_core::bm25::Bm25Params;
use news_rag_core::filter::{
    default_query_stopwords, FilterSettings, FilterStrategy, LexicalParams, SemanticParams,
    SynonymMap,
};
use news_rag_core::synthesize::{
    Messages, SynthesisSettings, DEFAULT_EMPTY_GENERATION_MESSAGE, DEFAULT_NOT_FOUND_MESSAGE,
    DEFAULT_NO_CATEGORY_MESSAGE, DEFAULT_PROMPT_TEMPLATE,
};
use news_rag_core::topics::{default_topic_rules, TopicGate, TopicRule, TopicSettings};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

// ============ Data ============

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            index_path: default_index_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/news_clean.jsonl")
}
fn default_index_path() -> PathBuf {
    PathBuf::from("data/bm25_index.json")
}

// ============ Retrieval ============

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_b")]
    pub b: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            k1: default_k1(),
            b: default_b(),
            epsilon: default_epsilon(),
        }
    }
}

fn default_top_k() -> usize {
    5
}
fn default_k1() -> f64 {
    1.5
}
fn default_b() -> f64 {
    0.75
}
fn default_epsilon() -> f64 {
    0.25
}

// ============ Filter ============

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default)]
    pub strategy: FilterStrategy,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,
    #[serde(default = "default_max_per_document")]
    pub max_per_document: usize,
    #[serde(default = "default_min_sentence_len")]
    pub min_sentence_len: usize,
    /// Replaces the built-in query stopword list when set.
    #[serde(default)]
    pub stopwords: Option<Vec<String>>,
    /// Replaces the built-in synonym table when set.
    #[serde(default)]
    pub synonyms: Option<BTreeMap<String, Vec<String>>>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strategy: FilterStrategy::default(),
            threshold: default_threshold(),
            semantic_top_k: default_semantic_top_k(),
            max_per_document: default_max_per_document(),
            min_sentence_len: default_min_sentence_len(),
            stopwords: None,
            synonyms: None,
        }
    }
}

fn default_threshold() -> f32 {
    0.5
}
fn default_semantic_top_k() -> usize {
    10
}
fn default_max_per_document() -> usize {
    2
}
fn default_min_sentence_len() -> usize {
    8
}

// ============ Synthesis ============

#[derive(Debug, Deserialize, Clone)]
pub struct SynthesisConfig {
    #[serde(default = "default_max_sentences")]
    pub max_sentences: usize,
    #[serde(default)]
    pub category_allow_list: Vec<String>,
    #[serde(default)]
    pub topic_gate: TopicGate,
    #[serde(default = "default_topic_query_triggers")]
    pub topic_query_triggers: Vec<String>,
    #[serde(default = "default_topic_answer_prefix")]
    pub topic_answer_prefix: String,
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    #[serde(default = "default_not_found_message")]
    pub not_found_message: String,
    #[serde(default = "default_no_category_message")]
    pub no_category_message: String,
    #[serde(default = "default_empty_generation_message")]
    pub empty_generation_message: String,
    /// Replaces the built-in topic table when set. An empty list disables
    /// the topic scan.
    #[serde(default)]
    pub topics: Option<Vec<TopicRule>>,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_sentences: default_max_sentences(),
            category_allow_list: Vec::new(),
            topic_gate: TopicGate::default(),
            topic_query_triggers: default_topic_query_triggers(),
            topic_answer_prefix: default_topic_answer_prefix(),
            prompt_template: default_prompt_template(),
            not_found_message: default_not_found_message(),
            no_category_message: default_no_category_message(),
            empty_generation_message: default_empty_generation_message(),
            topics: None,
        }
    }
}

fn default_max_sentences() -> usize {
    6
}
fn default_topic_query_triggers() -> Vec<String> {
    TopicSettings::default().query_triggers
}
fn default_topic_answer_prefix() -> String {
    TopicSettings::default().answer_prefix
}
fn default_prompt_template() -> String {
    DEFAULT_PROMPT_TEMPLATE.to_string()
}
fn default_not_found_message() -> String {
    DEFAULT_NOT_FOUND_MESSAGE.to_string()
}
fn default_no_category_message() -> String {
    DEFAULT_NO_CATEGORY_MESSAGE.to_string()
}
fn default_empty_generation_message() -> String {
    DEFAULT_EMPTY_GENERATION_MESSAGE.to_string()
}

// ============ Embedding ============

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            timeout_secs: default_embedding_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_timeout_secs() -> u64 {
    30
}

// ============ Generation ============

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL for the Ollama provider.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_max_output_length")]
    pub max_output_length: usize,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            max_output_length: default_max_output_length(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_max_output_length() -> usize {
    300
}
fn default_generation_timeout_secs() -> u64 {
    120
}

// ============ Conversions ============

impl Config {
    pub fn bm25_params(&self) -> Bm25Params {
        Bm25Params {
            k1: self.retrieval.k1,
            b: self.retrieval.b,
            epsilon: self.retrieval.epsilon,
        }
    }

    pub fn filter_settings(&self) -> FilterSettings {
        let f = &self.filter;
        FilterSettings {
            strategy: f.strategy,
            min_sentence_len: f.min_sentence_len,
            semantic: SemanticParams {
                threshold: f.threshold,
                fallback_top_k: f.semantic_top_k,
            },
            lexical: LexicalParams {
                synonyms: f
                    .synonyms
                    .clone()
                    .map(SynonymMap::new)
                    .unwrap_or_else(SynonymMap::builtin),
                stopwords: f
                    .stopwords
                    .as_ref()
                    .map(|words| words.iter().map(|w| w.to_lowercase()).collect())
                    .unwrap_or_else(default_query_stopwords),
                max_per_document: f.max_per_document,
            },
        }
    }

    /// Everything the core synthesizer needs, built from config.
    pub fn synthesis_settings(&self) -> SynthesisSettings {
        let s = &self.synthesis;
        SynthesisSettings {
            category_allow_list: s.category_allow_list.clone(),
            topics: TopicSettings {
                rules: s
                    .topics
                    .as_ref()
                    .map(|rules| rules.iter().map(lowercase_rule).collect())
                    .unwrap_or_else(default_topic_rules),
                gate: s.topic_gate,
                query_triggers: s
                    .topic_query_triggers
                    .iter()
                    .map(|w| w.to_lowercase())
                    .collect(),
                answer_prefix: s.topic_answer_prefix.clone(),
            },
            filter: self.filter_settings(),
            max_sentences: s.max_sentences,
            prompt_template: s.prompt_template.clone(),
            max_output_length: self.generation.max_output_length,
            messages: Messages {
                not_found: s.not_found_message.clone(),
                no_category: s.no_category_message.clone(),
                empty_generation: s.empty_generation_message.clone(),
            },
        }
    }
}

/// Topic keywords are matched against lower-cased word sets.
fn lowercase_rule(rule: &TopicRule) -> TopicRule {
    TopicRule {
        label: rule.label.clone(),
        keywords: rule
            .keywords
            .iter()
            .map(|group| group.iter().map(|w| w.to_lowercase()).collect())
            .collect(),
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    // Retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if !(0.0..=1.0).contains(&config.retrieval.b) {
        anyhow::bail!("retrieval.b must be in [0.0, 1.0]");
    }
    if config.retrieval.k1 < 0.0 {
        anyhow::bail!("retrieval.k1 must be >= 0.0");
    }
    if config.retrieval.epsilon < 0.0 {
        anyhow::bail!("retrieval.epsilon must be >= 0.0");
    }

    // Filter
    if !(-1.0..=1.0).contains(&config.filter.threshold) {
        anyhow::bail!("filter.threshold must be in [-1.0, 1.0]");
    }
    if config.filter.strategy == FilterStrategy::Semantic && !config.embedding.is_enabled() {
        anyhow::bail!("filter.strategy = 'semantic' requires an embedding provider");
    }

    // Synthesis
    if config.synthesis.max_sentences < 1 {
        anyhow::bail!("synthesis.max_sentences must be >= 1");
    }
    for placeholder in ["{context}", "{query}"] {
        if !config.synthesis.prompt_template.contains(placeholder) {
            anyhow::bail!(
                "synthesis.prompt_template must contain the {} placeholder",
                placeholder
            );
        }
    }
    if let Some(rules) = &config.synthesis.topics {
        for rule in rules {
            if rule.label.trim().is_empty() {
                anyhow::bail!("synthesis.topics entries must have a non-empty label");
            }
            if rule.keywords.iter().all(|group| group.is_empty()) {
                anyhow::bail!("synthesis.topics '{}' has no keywords", rule.label);
            }
        }
    }

    // Embedding
    match config.embedding.provider.as_str() {
        "disabled" | "local" => {}
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled, openai, ollama, or local.",
            other
        ),
    }
    if config.embedding.dims == Some(0) {
        anyhow::bail!("embedding.dims must be > 0");
    }

    // Generation
    match config.generation.provider.as_str() {
        "disabled" => {}
        "openai" | "ollama" => {
            if config.generation.model.is_none() {
                anyhow::bail!(
                    "generation.model must be specified when provider is '{}'",
                    config.generation.provider
                );
            }
        }
        other => anyhow::bail!(
            "Unknown generation provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }
    if config.generation.max_output_length < 1 {
        anyhow::bail!("generation.max_output_length must be >= 1");
    }

    Ok(())
}
