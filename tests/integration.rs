use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

fn nrag_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("nrag");
    path
}

const DATASET: &str = r#"{"link": "https://example.com/1", "headline": "Sleep Deprivation Harms The Mind", "category": "WELLNESS", "short_description": "Sleep deprivation causes mental health issues.", "authors": "A", "date": "2022-09-23"}
{"link": "https://example.com/2", "headline": "Senate Passes Budget", "category": "POLITICS", "short_description": "The senate passed the budget bill after a long debate.", "authors": "B", "date": "2022-09-22"}
{"link": "https://example.com/3", "headline": "Yoga For Everyone", "category": "HEALTH", "short_description": "Yoga classes improve flexibility in older adults.", "authors": "C", "date": "2022-09-21"}
{"link": "https://example.com/4", "headline": "Marathon Season Opens", "category": "SPORTS", "short_description": "Record entries for the city marathon this fall.", "authors": "D", "date": "2022-09-20"}
"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let raw_dir = root.join("raw");
    fs::create_dir_all(&raw_dir).unwrap();
    fs::write(raw_dir.join("news.json"), DATASET).unwrap();

    let config_content = format!(
        r#"[data]
corpus_path = "{root}/data/news_clean.jsonl"
index_path = "{root}/data/bm25_index.json"

[filter]
strategy = "lexical"

[synthesis]
category_allow_list = ["WELLNESS", "HEALTH", "WOMEN"]
"#,
        root = root.display()
    );

    let config_path = config_dir.join("nrag.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_nrag(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = nrag_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run nrag binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

/// Prepare the raw dataset and build the index.
fn setup_indexed_env() -> (TempDir, PathBuf) {
    let (tmp, config_path) = setup_test_env();
    let dataset = tmp.path().join("raw/news.json");

    let (stdout, stderr, success) =
        run_nrag(&config_path, &["prepare", dataset.to_str().unwrap()]);
    assert!(success, "prepare failed: stdout={}, stderr={}", stdout, stderr);

    let (stdout, stderr, success) = run_nrag(&config_path, &["build"]);
    assert!(success, "build failed: stdout={}, stderr={}", stdout, stderr);

    (tmp, config_path)
}

#[test]
fn test_prepare_writes_clean_corpus() {
    let (tmp, config_path) = setup_test_env();
    let dataset = tmp.path().join("raw/news.json");

    let (stdout, stderr, success) =
        run_nrag(&config_path, &["prepare", dataset.to_str().unwrap()]);
    assert!(success, "prepare failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Prepared 4 documents"));

    let corpus = fs::read_to_string(tmp.path().join("data/news_clean.jsonl")).unwrap();
    let lines: Vec<&str> = corpus.lines().collect();
    assert_eq!(lines.len(), 4);

    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["headline"], "Sleep Deprivation Harms The Mind");
    assert_eq!(first["category"], "WELLNESS");
    assert_eq!(
        first["text"],
        "sleep deprivation harms the mind. sleep deprivation causes mental health issues.. category wellness"
    );
}

#[test]
fn test_prepare_malformed_line_fails() {
    let (tmp, config_path) = setup_test_env();
    let bad = tmp.path().join("raw/bad.json");
    fs::write(&bad, "{\"headline\": \"ok\"}\n{not json}\n").unwrap();

    let (_, stderr, success) = run_nrag(&config_path, &["prepare", bad.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("line 2"), "stderr={}", stderr);
}

#[test]
fn test_build_and_stats() {
    let (tmp, config_path) = setup_indexed_env();
    assert!(tmp.path().join("data/bm25_index.json").exists());

    let (stdout, stderr, success) = run_nrag(&config_path, &["stats"]);
    assert!(success, "stats failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Documents:   4"));
    assert!(stdout.contains("WELLNESS"));
    assert!(stdout.contains("POLITICS"));
}

#[test]
fn test_build_reports_count() {
    let (tmp, config_path) = setup_test_env();
    let dataset = tmp.path().join("raw/news.json");
    run_nrag(&config_path, &["prepare", dataset.to_str().unwrap()]);

    let (stdout, _, success) = run_nrag(&config_path, &["build"]);
    assert!(success);
    assert!(stdout.contains("Indexed 4 documents"));
}

#[test]
fn test_search_ranks_matching_article_first() {
    let (_tmp, config_path) = setup_indexed_env();

    let (stdout, stderr, success) =
        run_nrag(&config_path, &["search", "sleep deprivation", "--top-k", "2"]);
    assert!(success, "search failed: stdout={}, stderr={}", stdout, stderr);

    let first = stdout
        .lines()
        .find(|l| l.starts_with("1. "))
        .expect("no first result");
    assert!(
        first.contains("WELLNESS / Sleep Deprivation Harms The Mind"),
        "first={}",
        first
    );
    assert!(stdout.lines().any(|l| l.starts_with("2. ")));
    assert!(!stdout.lines().any(|l| l.starts_with("3. ")));
}

#[test]
fn test_search_without_index_fails() {
    let (_tmp, config_path) = setup_test_env();

    let (_, stderr, success) = run_nrag(&config_path, &["search", "sleep"]);
    assert!(!success);
    assert!(stderr.contains("nrag build"), "stderr={}", stderr);
}

#[test]
fn test_zero_top_k_rejected() {
    let (_tmp, config_path) = setup_indexed_env();

    for cmd in ["search", "ask"] {
        let (stdout, stderr, success) =
            run_nrag(&config_path, &[cmd, "sleep deprivation", "--top-k", "0"]);
        assert!(!success, "{} accepted --top-k 0: stdout={}", cmd, stdout);
        assert!(stderr.contains("--top-k"), "stderr={}", stderr);
    }
}

#[test]
fn test_ask_topic_answer() {
    let (_tmp, config_path) = setup_indexed_env();

    let (stdout, stderr, success) = run_nrag(&config_path, &["ask", "mental health effects"]);
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Retrieved documents:"));
    assert!(stdout.contains(
        "The articles discuss the following health and wellness topics: mental health."
    ));
}

#[test]
fn test_ask_outside_allowed_categories() {
    let (_tmp, config_path) = setup_indexed_env();

    let (stdout, stderr, success) =
        run_nrag(&config_path, &["ask", "senate budget", "--top-k", "1"]);
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No articles in the allowed categories matched the question."));
}

#[test]
fn test_ask_no_relevant_sentences() {
    let (_tmp, config_path) = setup_indexed_env();

    // Nothing scores, so the first article is retrieved in corpus order
    // and none of its sentences share a word with the question.
    let (stdout, stderr, success) = run_nrag(
        &config_path,
        &["ask", "cryptocurrency regulation", "--top-k", "1"],
    );
    assert!(success, "ask failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("WELLNESS / Sleep Deprivation Harms The Mind"));
    assert!(stdout.contains("No relevant information was found in the articles."));
}

#[test]
fn test_ask_with_disabled_generation_fails() {
    let (_tmp, config_path) = setup_indexed_env();

    let (_, stderr, success) =
        run_nrag(&config_path, &["ask", "yoga flexibility", "--top-k", "1"]);
    assert!(!success);
    assert!(
        stderr.contains("Generation provider is disabled"),
        "stderr={}",
        stderr
    );
}

#[test]
fn test_ask_blank_query_warns() {
    let (_tmp, config_path) = setup_indexed_env();

    let (stdout, stderr, success) = run_nrag(&config_path, &["ask", "   "]);
    assert!(success);
    assert!(stderr.contains("Please enter a question."));
    assert!(!stdout.contains("Answer:"));
}

#[test]
fn test_ask_semantic_without_embedder_fails() {
    let (_tmp, config_path) = setup_indexed_env();

    let (_, stderr, success) = run_nrag(
        &config_path,
        &["ask", "mental health", "--strategy", "semantic"],
    );
    assert!(!success);
    assert!(stderr.contains("requires an embedding provider"), "stderr={}", stderr);
}

#[test]
fn test_chat_reads_until_quit() {
    let (_tmp, config_path) = setup_indexed_env();

    let mut child = Command::new(nrag_binary())
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"mental health effects\n\nquit\nsenate budget\n")
        .unwrap();

    let output = child.wait_with_output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr={}", stderr);
    assert!(stdout.contains("topics: mental health."));
    assert!(stderr.contains("Please enter a question."));
    assert_eq!(stdout.matches("Answer:").count(), 1);
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, success) = run_nrag(&tmp.path().join("nope.toml"), &["stats"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
