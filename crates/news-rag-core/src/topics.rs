//! Topic short-circuit: keyword rules scanned over document text.
//!
//! A [`TopicRule`] fires for a document when any of its keyword groups has
//! every word present in the document's cleaned word set. Whether fired
//! rules actually produce a templated answer is decided by the
//! [`TopicGate`].

use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

use crate::models::RetrievedDocument;
use crate::tokenize::{clean_text, word_set};

/// Prefix of the templated topic answer.
pub const DEFAULT_TOPIC_PREFIX: &str =
    "The articles discuss the following health and wellness topics:";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicRule {
    /// Label reported in the answer (e.g. `"mental health"`).
    pub label: String,
    /// Alternative keyword groups; a group matches when all its words occur.
    pub keywords: Vec<Vec<String>>,
}

impl TopicRule {
    pub fn new(label: &str, keywords: &[&[&str]]) -> Self {
        Self {
            label: label.to_string(),
            keywords: keywords
                .iter()
                .map(|group| group.iter().map(|w| w.to_string()).collect())
                .collect(),
        }
    }

    /// True when some keyword group is fully contained in `words`.
    pub fn matches(&self, words: &HashSet<String>) -> bool {
        self.keywords
            .iter()
            .any(|group| !group.is_empty() && group.iter().all(|w| words.contains(w)))
    }
}

/// The built-in topic table.
pub fn default_topic_rules() -> Vec<TopicRule> {
    vec![
        TopicRule::new("mental health", &[&["mental", "health"]]),
        TopicRule::new("athlete health", &[&["athlete", "health"]]),
        TopicRule::new("women's health", &[&["women", "health"]]),
        TopicRule::new("sleep", &[&["sleep"]]),
        TopicRule::new("television", &[&["tv"], &["television"]]),
    ]
}

/// When document-matched topic rules may short-circuit synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicGate {
    /// Report a rule only if the query itself satisfies one of its keyword
    /// groups, or report every matched rule for topic-style queries.
    ///
    /// A query that names a rule keyword, such as "effects of sleep
    /// deprivation" against the `sleep` rule, gets the templated topic answer
    /// and never reaches generation. Use [`TopicGate::Off`] to always
    /// generate.
    #[default]
    Query,
    /// Report every rule matched by any document, whatever the query.
    Always,
    /// Never short-circuit.
    Off,
}

/// Topic scan configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicSettings {
    pub rules: Vec<TopicRule>,
    pub gate: TopicGate,
    /// Phrases that mark a query as asking about topics (e.g. `"topics"`).
    pub query_triggers: Vec<String>,
    pub answer_prefix: String,
}

impl Default for TopicSettings {
    fn default() -> Self {
        Self {
            rules: default_topic_rules(),
            gate: TopicGate::Query,
            query_triggers: vec!["topic".to_string(), "topics".to_string()],
            answer_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
        }
    }
}

impl TopicSettings {
    fn is_topic_query(&self, query: &str) -> bool {
        let cleaned = format!(" {} ", clean_text(query));
        self.query_triggers.iter().any(|t| {
            let t = clean_text(t);
            !t.is_empty() && cleaned.contains(&format!(" {} ", t))
        })
    }
}

/// Run the gated topic scan. Returns the sorted labels to report, or an
/// empty set when synthesis should continue down the grounded path.
pub fn scan_topics(
    settings: &TopicSettings,
    query: &str,
    docs: &[RetrievedDocument],
) -> BTreeSet<String> {
    if settings.gate == TopicGate::Off {
        return BTreeSet::new();
    }

    let doc_words: Vec<HashSet<String>> = docs.iter().map(|d| word_set(&d.text)).collect();
    let fired = settings
        .rules
        .iter()
        .filter(|rule| doc_words.iter().any(|words| rule.matches(words)));

    match settings.gate {
        TopicGate::Always => fired.map(|r| r.label.clone()).collect(),
        TopicGate::Query if settings.is_topic_query(query) => {
            fired.map(|r| r.label.clone()).collect()
        }
        TopicGate::Query => {
            let query_words = word_set(query);
            fired
                .filter(|rule| rule.matches(&query_words))
                .map(|r| r.label.clone())
                .collect()
        }
        TopicGate::Off => BTreeSet::new(),
    }
}

/// Render the templated topic answer, labels in alphabetical order.
pub fn topic_answer(prefix: &str, labels: &BTreeSet<String>) -> String {
    let joined = labels.iter().cloned().collect::<Vec<_>>().join(", ");
    format!("{} {}.", prefix, joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(text: &str) -> RetrievedDocument {
        RetrievedDocument {
            index: 0,
            score: 0.0,
            headline: String::new(),
            category: "WELLNESS".to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_rule_requires_all_words_in_group() {
        let rule = TopicRule::new("mental health", &[&["mental", "health"]]);
        assert!(rule.matches(&word_set("Mental health matters")));
        assert!(!rule.matches(&word_set("mental arithmetic")));
    }

    #[test]
    fn test_rule_alternative_groups() {
        let rule = TopicRule::new("television", &[&["tv"], &["television"]]);
        assert!(rule.matches(&word_set("too much TV")));
        assert!(rule.matches(&word_set("television ratings")));
        assert!(!rule.matches(&word_set("tvs on sale")));
    }

    #[test]
    fn test_matched_topics_sorted() {
        let docs = vec![
            retrieved("Women's health and sleep."),
            retrieved("Kids watch TV all day."),
        ];
        let settings = TopicSettings {
            gate: TopicGate::Always,
            ..TopicSettings::default()
        };
        let labels = scan_topics(&settings, "anything", &docs);
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["sleep", "television", "women's health"]);
    }

    #[test]
    fn test_query_gate_limits_to_query_topics() {
        let docs = vec![retrieved("Sleep deprivation causes mental health issues.")];
        let settings = TopicSettings::default();
        let labels = scan_topics(&settings, "mental health effects", &docs);
        assert_eq!(labels.into_iter().collect::<Vec<_>>(), vec!["mental health"]);
    }

    #[test]
    fn test_query_gate_ignores_unrelated_query() {
        let docs = vec![retrieved("Sleep deprivation causes mental health issues.")];
        let settings = TopicSettings::default();
        assert!(scan_topics(&settings, "budget deficit", &docs).is_empty());
    }

    #[test]
    fn test_topic_style_query_reports_all() {
        let docs = vec![retrieved("Sleep deprivation causes mental health issues.")];
        let settings = TopicSettings::default();
        let labels = scan_topics(&settings, "What topics do these articles cover?", &docs);
        assert_eq!(
            labels.into_iter().collect::<Vec<_>>(),
            vec!["mental health", "sleep"]
        );
    }

    #[test]
    fn test_always_gate_ignores_query() {
        let docs = vec![retrieved("Sleep deprivation causes mental health issues.")];
        let settings = TopicSettings {
            gate: TopicGate::Always,
            ..TopicSettings::default()
        };
        assert_eq!(scan_topics(&settings, "budget deficit", &docs).len(), 2);
    }

    #[test]
    fn test_off_gate() {
        let docs = vec![retrieved("Sleep deprivation causes mental health issues.")];
        let settings = TopicSettings {
            gate: TopicGate::Off,
            ..TopicSettings::default()
        };
        assert!(scan_topics(&settings, "mental health", &docs).is_empty());
    }

    #[test]
    fn test_no_trigger_words_no_topics() {
        let docs = vec![retrieved("The senate passed the budget bill.")];
        let settings = TopicSettings {
            gate: TopicGate::Always,
            ..TopicSettings::default()
        };
        assert!(scan_topics(&settings, "mental health", &docs).is_empty());
    }

    #[test]
    fn test_topic_answer_format() {
        let labels: BTreeSet<String> = ["sleep", "mental health"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            topic_answer(DEFAULT_TOPIC_PREFIX, &labels),
            "The articles discuss the following health and wellness topics: mental health, sleep."
        );
    }
}
