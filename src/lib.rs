//! Recast - transcripts into publishable content
//!
//! A local-first tool that turns the raw transcript of a talk, podcast or
//! livestream into insights, book chapters, blog posts and social media posts,
//! written in the speaker's own voice.
//!
//! # Overview
//!
//! A submitted transcript flows through a staged pipeline:
//!
//! - the text is split into topical segments
//! - insights (key points and recurring themes) are extracted from the segments
//! - chapters, blog posts and social posts are generated concurrently
//! - the result is persisted once, as a single immutable record
//!
//! Optional stages that time out leave their section empty and report a
//! diagnostic instead of failing the whole run.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `transcript` - Input normalization and voice detection
//! - `segmenter` - Topic-boundary segmentation
//! - `analysis` - Keyword scoring shared by the stages
//! - `extractor` - Insight extraction
//! - `synthesizer` - Chapter and blog synthesis
//! - `repurposer` - Social post generation
//! - `generation` - Text generation backends
//! - `pipeline` - Stage orchestration, budgets and run state
//! - `store` - Record persistence
//! - `orchestrator` - Submission, retrieval and stats
//!
//! # Example
//!
//! ```rust,no_run
//! use recast::config::Settings;
//! use recast::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let text = std::fs::read_to_string("talk.txt")?;
//!     let submission = orchestrator.submit(&text, "talk.txt").await?;
//!     println!("Saved as {}", submission.id);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod content;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod openai;
pub mod orchestrator;
pub mod pipeline;
pub mod repurposer;
pub mod segmenter;
pub mod store;
pub mod synthesizer;
pub mod transcript;

pub use error::{RecastError, Result};
