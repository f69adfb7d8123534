//! # News RAG
//!
//! Question answering over a news article corpus: BM25 retrieval, sentence
//! level relevance filtering, and answers grounded in the retrieved text.
//!
//! The pipeline itself lives in [`news_rag_core`]. This crate adds
//! configuration, dataset preparation, the persisted index artifact, HTTP and
//! local model providers, and the `nrag` CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌──────────────┐
//! │   Dataset   │──▶│   Prepare   │──▶│ Corpus JSONL │
//! └─────────────┘   └─────────────┘   └──────┬───────┘
//!                                            ▼
//!                   ┌─────────────┐   ┌──────────────┐
//!                   │  Pipeline   │◀──│ BM25 artifact│
//!                   └──────┬──────┘   └──────────────┘
//!                          │  embed / generate
//!                          ▼
//!                   ┌─────────────┐
//!                   │ OpenAI/Ollama│
//!                   │  fastembed  │
//!                   └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! nrag prepare News_Category_Dataset_v3.json
//! nrag build
//! nrag search "sleep deprivation"
//! nrag ask "Does walking lower blood pressure?"
//! nrag chat
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`corpus`] | Corpus JSON-lines storage |
//! | [`prepare`] | Raw dataset cleaning |
//! | [`index`] | Index artifact build/save/load |
//! | [`embedding`] | Embedding providers |
//! | [`generation`] | Generation providers |
//! | [`search`] | Retrieval-only search |
//! | [`ask`] | Question answering and chat |
//! | [`stats`] | Index statistics |
//! | [`logging`] | Tracing setup |

pub mod ask;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod generation;
pub mod index;
pub mod logging;
pub mod prepare;
pub mod search;
pub mod stats;
