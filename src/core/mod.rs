//! Core tracking logic.
//!
//! This module contains:
//! - Transport: resilient HTTP with retry and failure classification
//! - Recorder: stateless mapping from domain operations to service calls
//! - Tracker: the execution lifecycle state machine
//! - RetryPolicy: backoff configuration

pub mod recorder;
pub mod retry;
pub mod tracker;
pub mod transport;

// Re-export commonly used types
pub use recorder::{EndExecution, Recorder, StartExecution};
pub use retry::RetryPolicy;
pub use tracker::{ChildExecution, TrackedPipeline, Tracker};
pub use transport::Transport;
