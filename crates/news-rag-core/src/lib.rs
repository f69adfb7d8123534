//! # News RAG Core
//!
//! The retrieval-and-answer-synthesis pipeline: tokenizer, BM25 index,
//! retriever, sentence extractor, relevance filter, context assembler, and
//! answer synthesizer.
//!
//! This crate contains no tokio, HTTP, filesystem I/O, or other native-only
//! dependencies. Embedding and generation backends are injected through the
//! [`embedding::Embedder`] and [`generation::Generator`] traits; persisting
//! the [`artifact::IndexArtifact`] is the application's job.
//!
//! ```text
//! query ─▶ retrieve ─▶ category gate ─▶ topic scan ─▶ relevance filter
//!                                           │                │
//!                                           ▼                ▼
//!                                     topic answer    assemble ─▶ generate
//! ```

pub mod artifact;
pub mod bm25;
pub mod context;
pub mod embedding;
pub mod filter;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod retrieve;
pub mod sentences;
pub mod synthesize;
pub mod tokenize;
pub mod topics;

pub use models::{Answer, Document, RetrievedDocument};
pub use pipeline::Pipeline;
