//! Answer synthesis: the per-query state machine.
//!
//! ```text
//! NO_DOCS ─(category gate)─▶ NO_RELEVANT_DOCS | HAS_DOCS
//! HAS_DOCS ─(topic scan)─▶ TOPIC_MATCHED | NO_TOPIC_MATCH
//! NO_TOPIC_MATCH ─(relevance filter + assemble)─▶ NO_CONTEXT | HAS_CONTEXT
//! HAS_CONTEXT ─(one generation call)─▶ ANSWER
//! ```
//!
//! Every terminal state maps to one [`Answer`] variant. The generation
//! service is only called from `HAS_CONTEXT`, exactly once, with
//! `deterministic = true`. Embedding and generation errors propagate.

use anyhow::Result;

use crate::context::{assemble, DEFAULT_MAX_SENTENCES};
use crate::embedding::Embedder;
use crate::filter::{select_relevant, FilterSettings};
use crate::generation::Generator;
use crate::models::{Answer, RetrievedDocument};
use crate::topics::{scan_topics, topic_answer, TopicSettings};

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Read the following documents and answer the question below.
Use only information stated in the documents.
Do not include unrelated information.
Write a concise answer in complete sentences.

DOCUMENTS:
{context}

QUESTION:
{query}

ANSWER:";

pub const DEFAULT_NOT_FOUND_MESSAGE: &str = "No relevant information was found in the articles.";
pub const DEFAULT_NO_CATEGORY_MESSAGE: &str =
    "No articles in the allowed categories matched the question.";
pub const DEFAULT_EMPTY_GENERATION_MESSAGE: &str =
    "The generation service returned an empty answer.";
pub const DEFAULT_MAX_OUTPUT_LENGTH: usize = 300;

/// Fixed messages for the non-generated terminal states.
#[derive(Debug, Clone, PartialEq)]
pub struct Messages {
    pub not_found: String,
    pub no_category: String,
    pub empty_generation: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_found: DEFAULT_NOT_FOUND_MESSAGE.to_string(),
            no_category: DEFAULT_NO_CATEGORY_MESSAGE.to_string(),
            empty_generation: DEFAULT_EMPTY_GENERATION_MESSAGE.to_string(),
        }
    }
}

/// Everything the synthesizer needs besides the services.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisSettings {
    /// Allowed categories (case-insensitive). Empty disables the gate.
    pub category_allow_list: Vec<String>,
    pub topics: TopicSettings,
    pub filter: FilterSettings,
    pub max_sentences: usize,
    /// Must contain `{context}` and `{query}`.
    pub prompt_template: String,
    pub max_output_length: usize,
    pub messages: Messages,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            category_allow_list: Vec::new(),
            topics: TopicSettings::default(),
            filter: FilterSettings::default(),
            max_sentences: DEFAULT_MAX_SENTENCES,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            max_output_length: DEFAULT_MAX_OUTPUT_LENGTH,
            messages: Messages::default(),
        }
    }
}

/// Keep documents whose category is on the allow-list.
pub fn filter_categories<'a>(
    docs: &'a [RetrievedDocument],
    allow_list: &[String],
) -> Vec<&'a RetrievedDocument> {
    if allow_list.is_empty() {
        return docs.iter().collect();
    }
    docs.iter()
        .filter(|d| {
            allow_list
                .iter()
                .any(|c| c.eq_ignore_ascii_case(d.category.trim()))
        })
        .collect()
}

/// Fill the prompt template with the rendered context and the raw query.
pub fn render_prompt(template: &str, context: &str, query: &str) -> String {
    template
        .replace("{context}", context)
        .replace("{query}", query)
}

/// Run the synthesis state machine over already-retrieved documents.
pub async fn synthesize(
    query: &str,
    docs: &[RetrievedDocument],
    embedder: Option<&dyn Embedder>,
    generator: &dyn Generator,
    settings: &SynthesisSettings,
) -> Result<Answer> {
    if docs.is_empty() {
        tracing::debug!(state = "NO_DOCS", "no documents retrieved");
        return Ok(Answer::NoDocuments(settings.messages.not_found.clone()));
    }

    let allowed: Vec<RetrievedDocument> =
        filter_categories(docs, &settings.category_allow_list)
            .into_iter()
            .cloned()
            .collect();
    if allowed.is_empty() {
        tracing::debug!(state = "NO_RELEVANT_DOCS", "category gate removed every document");
        return Ok(Answer::NoCategoryMatch(
            settings.messages.no_category.clone(),
        ));
    }
    tracing::debug!(state = "HAS_DOCS", docs = allowed.len(), "category gate passed");

    let labels = scan_topics(&settings.topics, query, &allowed);
    if !labels.is_empty() {
        tracing::debug!(state = "TOPIC_MATCHED", topics = ?labels, "topic short-circuit");
        return Ok(Answer::Topics(topic_answer(
            &settings.topics.answer_prefix,
            &labels,
        )));
    }
    tracing::debug!(state = "NO_TOPIC_MATCH", "continuing to relevance filter");

    let selection = select_relevant(query, &allowed, embedder, &settings.filter).await?;
    let context = assemble(selection.sentences, settings.max_sentences);
    if context.is_empty() {
        tracing::debug!(state = "NO_CONTEXT", "no grounding sentences");
        return Ok(Answer::NotFound(settings.messages.not_found.clone()));
    }
    tracing::debug!(
        state = "HAS_CONTEXT",
        stage = ?selection.stage,
        sentences = context.len(),
        "context assembled"
    );

    let prompt = render_prompt(&settings.prompt_template, &context.render(), query);
    let output = generator
        .generate(&prompt, settings.max_output_length, true)
        .await?;

    let trimmed = output.trim();
    if trimmed.is_empty() {
        tracing::debug!(state = "ANSWER", "generation returned empty output");
        return Ok(Answer::EmptyGeneration(
            settings.messages.empty_generation.clone(),
        ));
    }
    tracing::debug!(state = "ANSWER", chars = trimmed.len(), "generated answer");
    Ok(Answer::Generated(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every prompt and replies with a fixed string.
    struct RecordingGenerator {
        reply: String,
        prompts: Mutex<Vec<(String, usize, bool)>>,
    }

    impl RecordingGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, usize, bool)> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "recording"
        }
        async fn generate(
            &self,
            prompt: &str,
            max_output_length: usize,
            deterministic: bool,
        ) -> Result<String> {
            self.prompts.lock().unwrap().push((
                prompt.to_string(),
                max_output_length,
                deterministic,
            ));
            Ok(self.reply.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn model_name(&self) -> &str {
            "failing"
        }
        async fn generate(&self, _: &str, _: usize, _: bool) -> Result<String> {
            bail!("generation service down")
        }
    }

    fn retrieved(category: &str, text: &str) -> RetrievedDocument {
        RetrievedDocument {
            index: 0,
            score: 1.0,
            headline: "headline".to_string(),
            category: category.to_string(),
            text: text.to_string(),
        }
    }

    fn health_settings() -> SynthesisSettings {
        SynthesisSettings {
            category_allow_list: vec!["WELLNESS".into(), "HEALTH".into(), "WOMEN".into()],
            ..SynthesisSettings::default()
        }
    }

    #[tokio::test]
    async fn test_no_docs_never_generates() {
        let gen = RecordingGenerator::new("unused");
        let answer = synthesize("sleep", &[], None, &gen, &SynthesisSettings::default())
            .await
            .unwrap();
        assert_eq!(answer, Answer::NoDocuments(DEFAULT_NOT_FOUND_MESSAGE.into()));
        assert!(gen.calls().is_empty());
    }

    #[tokio::test]
    async fn test_category_gate_excludes_all() {
        let gen = RecordingGenerator::new("unused");
        let docs = vec![retrieved("POLITICS", "The senate debated sleep policy for hours.")];
        let answer = synthesize("sleep policy", &docs, None, &gen, &health_settings())
            .await
            .unwrap();
        assert_eq!(
            answer,
            Answer::NoCategoryMatch(DEFAULT_NO_CATEGORY_MESSAGE.into())
        );
        assert!(gen.calls().is_empty());
    }

    #[test]
    fn test_category_gate_is_case_insensitive() {
        let docs = vec![retrieved("wellness", "Walking daily improves mood.")];
        let kept = filter_categories(&docs, &["WELLNESS".to_string()]);
        assert_eq!(kept.len(), 1);
    }

    #[tokio::test]
    async fn test_mental_health_scenario_topic_answer() {
        let gen = RecordingGenerator::new("unused");
        let docs = vec![retrieved(
            "WELLNESS",
            "Sleep deprivation causes mental health issues.",
        )];
        let answer = synthesize("mental health effects", &docs, None, &gen, &health_settings())
            .await
            .unwrap();
        assert_eq!(
            answer,
            Answer::Topics(
                "The articles discuss the following health and wellness topics: mental health."
                    .into()
            )
        );
        assert!(gen.calls().is_empty());
    }

    #[tokio::test]
    async fn test_grounded_path_calls_generator_once() {
        let gen = RecordingGenerator::new("  Regular walking lowers blood pressure.  \n");
        let docs = vec![retrieved(
            "WELLNESS",
            "Walking every day lowers blood pressure. Stocks rallied on Friday.",
        )];
        let answer = synthesize(
            "does walking lower blood pressure",
            &docs,
            None,
            &gen,
            &health_settings(),
        )
        .await
        .unwrap();

        assert_eq!(
            answer,
            Answer::Generated("Regular walking lowers blood pressure.".into())
        );
        let calls = gen.calls();
        assert_eq!(calls.len(), 1);
        let (prompt, max_len, deterministic) = &calls[0];
        assert!(prompt.contains("- walking every day lowers blood pressure"));
        assert!(prompt.contains("QUESTION:\ndoes walking lower blood pressure"));
        assert!(!prompt.contains("stocks rallied"));
        assert_eq!(*max_len, DEFAULT_MAX_OUTPUT_LENGTH);
        assert!(*deterministic);
    }

    #[tokio::test]
    async fn test_no_trigger_keywords_no_short_circuit() {
        let gen = RecordingGenerator::new("answer");
        let docs = vec![retrieved("WELLNESS", "Yoga classes improve flexibility in adults.")];
        let settings = SynthesisSettings {
            topics: TopicSettings {
                gate: crate::topics::TopicGate::Always,
                ..TopicSettings::default()
            },
            ..SynthesisSettings::default()
        };
        let answer = synthesize("yoga flexibility", &docs, None, &gen, &settings)
            .await
            .unwrap();
        assert!(matches!(answer, Answer::Generated(_)));
        assert_eq!(gen.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_no_matching_sentences_not_found() {
        let gen = RecordingGenerator::new("unused");
        let docs = vec![retrieved("WELLNESS", "Yoga classes improve flexibility in adults.")];
        let answer = synthesize("cryptocurrency regulation", &docs, None, &gen, &health_settings())
            .await
            .unwrap();
        assert_eq!(answer, Answer::NotFound(DEFAULT_NOT_FOUND_MESSAGE.into()));
        assert!(gen.calls().is_empty());
    }

    #[tokio::test]
    async fn test_query_naming_topic_keyword_skips_generation_unless_gate_off() {
        let docs = vec![retrieved(
            "WELLNESS",
            "Sleep deprivation weakens the immune system.",
        )];
        let query = "What are the effects of sleep deprivation?";

        let gen = RecordingGenerator::new("It weakens immunity.");
        let answer = synthesize(query, &docs, None, &gen, &health_settings())
            .await
            .unwrap();
        assert_eq!(
            answer,
            Answer::Topics(
                "The articles discuss the following health and wellness topics: sleep.".into()
            )
        );
        assert!(gen.calls().is_empty());

        let mut settings = health_settings();
        settings.topics.gate = crate::topics::TopicGate::Off;
        let answer = synthesize(query, &docs, None, &gen, &settings).await.unwrap();
        assert_eq!(answer, Answer::Generated("It weakens immunity.".into()));
        assert_eq!(gen.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_possessive_query_does_not_match_contractions() {
        let gen = RecordingGenerator::new("unused");
        let docs = vec![retrieved("WELLNESS", "It's raining in the city today.")];
        let answer = synthesize(
            "children's allergies",
            &docs,
            None,
            &gen,
            &SynthesisSettings::default(),
        )
        .await
        .unwrap();
        assert_eq!(answer, Answer::NotFound(DEFAULT_NOT_FOUND_MESSAGE.into()));
        assert!(gen.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_generation_is_distinct() {
        let gen = RecordingGenerator::new("   \n ");
        let docs = vec![retrieved("WELLNESS", "Yoga classes improve flexibility in adults.")];
        let answer = synthesize("yoga", &docs, None, &gen, &SynthesisSettings::default())
            .await
            .unwrap();
        assert_eq!(
            answer,
            Answer::EmptyGeneration(DEFAULT_EMPTY_GENERATION_MESSAGE.into())
        );
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let docs = vec![retrieved("WELLNESS", "Yoga classes improve flexibility in adults.")];
        let result = synthesize(
            "yoga",
            &docs,
            None,
            &FailingGenerator,
            &SynthesisSettings::default(),
        )
        .await;
        assert!(result.is_err());
    }

    #[test]
    fn test_render_prompt() {
        let p = render_prompt("C:{context}|Q:{query}", "- a\n- b", "why?");
        assert_eq!(p, "C:- a\n- b|Q:why?");
    }
}
