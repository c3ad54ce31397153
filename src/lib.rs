//! pipewatch - Execution tracking client for data pipelines
//!
//! An async client SDK that registers pipeline work with a remote watch
//! service, runs it, and reliably reports the outcome: success or failure,
//! row counts, metadata, and watermark movement.
//!
//! # Architecture
//!
//! The crate is built around a small number of layers:
//! - Every HTTP call goes through one transport with retry, backoff, and
//!   jitter baked in
//! - The tracker drives the execution lifecycle (start, run, end) and
//!   guarantees an end report for every started execution
//! - Pipeline definitions are declared in YAML and synced to the service
//!   before the first run
//!
//! # Modules
//!
//! - `adapters`: Orchestrator context detection (Dagster, Airflow)
//! - `client`: The [`WatchClient`] entry point
//! - `core`: Transport, retry policy, recorder, tracker
//! - `domain`: Data structures (Pipeline, ExecutionResult, Watermark)
//! - `orchestration`: High-level sync-and-run wrapper
//!
//! # Usage
//!
//! ```no_run
//! use pipewatch::{ExecutionResult, TrackedPipeline, WatchClient};
//!
//! # async fn demo() -> pipewatch::Result<()> {
//! let client = WatchClient::from_url("https://watch.example.com")?;
//! let pipeline = TrackedPipeline::new(42).with_watermark("2024-01-01");
//!
//! let outcome = client
//!     .track_execution(&pipeline, |_context| async {
//!         // move some rows...
//!         Ok(ExecutionResult::success().with_inserts(100))
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod client;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod orchestration;

// Re-export main types at crate root for convenience
pub use crate::client::WatchClient;
pub use crate::config::ClientConfig;
pub use crate::core::{ChildExecution, RetryPolicy, TrackedPipeline, Tracker};
pub use crate::domain::{
    Address, AddressLineage, DatePart, ExecutionContext, ExecutionOutcome, ExecutionResult,
    Pipeline, PipelineConfig, SyncedPipeline, SyncedPipelineConfig, TrackedResult, Watermark,
};
pub use crate::error::{ApiError, Error, Result};
pub use crate::orchestration::OrchestratedRun;

// Orchestrator integration
pub use crate::adapters::OrchestrationContext;
