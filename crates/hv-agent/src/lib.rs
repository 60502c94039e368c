//! HearthVoice agent: library crate for the utterance-to-action pipeline.
//!
//! Re-exports all modules so external crates (e.g. `hv-e2e-tests`) can
//! access internal types like `VoicePipeline`, `PlanExtractor`, and
//! `GeminiClient`.

pub mod config;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod llm;
pub mod pipeline;
pub mod planner;
