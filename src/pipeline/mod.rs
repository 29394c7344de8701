//! Pipeline orchestration
//!
//! Sequences ingest, transform, train and predict. Each stage checks that
//! the artifacts it depends on are stored before doing any work.

mod orchestrator;
mod stage;

pub use orchestrator::{Pipeline, PipelineReport};
pub use stage::{PipelineState, Stage};
