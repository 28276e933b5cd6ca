// src/pipeline/mod.rs

pub mod metrics;
pub mod orchestrator;

pub use metrics::RunStats;
pub use orchestrator::{PipelineOrchestrator, StopReason};
