//! Domain types for the pipewatch client.
//!
//! This module contains the data structures exchanged with the service:
//! - Execution: context, result, outcome, watermark
//! - Pipeline: declared and synced pipeline configuration
//! - Lineage: source/target addresses

pub mod execution;
pub mod lineage;
pub mod pipeline;

// Re-export commonly used types
pub use execution::{ExecutionContext, ExecutionOutcome, ExecutionResult, TrackedResult, Watermark};
pub use lineage::{Address, AddressLineage};
pub use pipeline::{DatePart, Pipeline, PipelineConfig, SyncedPipeline, SyncedPipelineConfig};
