//! Question answering: `nrag ask` and the interactive `nrag chat` loop.
//!
//! Both commands build one [`Pipeline`] at startup (index, providers,
//! synthesis settings) and then run queries through it one at a time:
//! retrieved documents are printed first, then the answer.

use anyhow::{bail, Result};
use news_rag_core::filter::FilterStrategy;
use news_rag_core::pipeline::QueryOutcome;
use news_rag_core::{Answer, Pipeline};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::embedding::create_embedder;
use crate::generation::create_generator;
use crate::index::load_index;
use crate::search::{print_documents, warn_if_blank};

/// Wire the pipeline from config, optionally overriding the filter strategy.
pub fn build_pipeline(config: &Config, strategy: Option<FilterStrategy>) -> Result<Pipeline> {
    let mut settings = config.synthesis_settings();
    if let Some(strategy) = strategy {
        settings.filter.strategy = strategy;
    }

    let embedder = if settings.filter.strategy == FilterStrategy::Lexical {
        None
    } else {
        create_embedder(&config.embedding)?
    };
    if settings.filter.strategy == FilterStrategy::Semantic && embedder.is_none() {
        bail!("Filter strategy 'semantic' requires an embedding provider");
    }

    let index = load_index(config)?;
    let generator = create_generator(&config.generation)?;

    let pipeline = Pipeline::new(index, generator, settings);
    Ok(match embedder {
        Some(embedder) => pipeline.with_embedder(embedder),
        None => pipeline,
    })
}

fn print_answer(answer: &Answer) {
    println!("Answer:");
    println!("{}", answer.text());
}

fn print_outcome(outcome: &QueryOutcome) {
    println!("Retrieved documents:");
    println!();
    print_documents(&outcome.documents);
    print_answer(&outcome.answer);
}

pub async fn run_ask(
    config: &Config,
    query: &str,
    top_k: Option<usize>,
    strategy: Option<FilterStrategy>,
) -> Result<()> {
    if warn_if_blank(query) {
        return Ok(());
    }

    let pipeline = build_pipeline(config, strategy)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let outcome = pipeline.ask(query, top_k).await?;
    tracing::debug!(kind = outcome.answer.kind(), "answered");
    print_outcome(&outcome);
    Ok(())
}

/// Read questions from stdin until `exit`, `quit`, or EOF.
///
/// A failing query is reported on stderr and the loop continues.
pub async fn run_chat(
    config: &Config,
    top_k: Option<usize>,
    strategy: Option<FilterStrategy>,
) -> Result<()> {
    let pipeline = build_pipeline(config, strategy)?;
    let top_k = top_k.unwrap_or(config.retrieval.top_k);
    let interactive = atty::is(atty::Stream::Stdin);

    if interactive {
        println!(
            "News RAG chat: {} documents indexed. Type `exit` to quit.",
            pipeline.index().len()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("> ");
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if matches!(query, "exit" | "quit") {
            break;
        }
        if warn_if_blank(query) {
            continue;
        }

        match pipeline.ask(query, top_k).await {
            Ok(outcome) => print_outcome(&outcome),
            Err(e) => eprintln!("Error: {:#}", e),
        }
        println!();
    }

    Ok(())
}
