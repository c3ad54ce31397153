//! Execution-level values: context, result, outcome, watermark.
//!
//! An execution is one recorded run of a pipeline, bounded by a start and
//! end report to the watch service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A caller-defined marker of incremental processing progress.
///
/// Watermarks are opaque to this crate beyond being passed through; the
/// inclusive/exclusive window semantics are a caller contract. The wire
/// form is the bare scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Watermark {
    /// Numeric watermark (e.g. an id or offset).
    Int(i64),

    /// Timestamp watermark, RFC 3339 on the wire.
    Timestamp(DateTime<Utc>),

    /// Free-form string watermark (e.g. a date or partition key).
    Text(String),
}

impl From<i64> for Watermark {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<DateTime<Utc>> for Watermark {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<&str> for Watermark {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Watermark {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Immutable context handed to tracked work.
///
/// Constructed by the tracker immediately after a successful start call and
/// dropped when the work returns. Children spawned by the work receive the
/// `execution_id` as their parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Identifier assigned by the service at start time. Never reused.
    pub execution_id: i64,

    /// Identifier of the pipeline definition being executed.
    pub pipeline_id: i64,

    /// Inclusive lower bound of the current incremental window.
    pub watermark: Option<Watermark>,

    /// Exclusive upper bound of the current incremental window.
    pub next_watermark: Option<Watermark>,
}

/// Outcome of one unit of tracked work, produced by the caller.
///
/// `completed_successfully` is the caller's own success judgment,
/// independent of whether an error occurred. Only the fields declared here
/// are ever transmitted to the service; see [`TrackedResult`] for carrying
/// extra local-only fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the work completed successfully from the caller's view.
    pub completed_successfully: bool,

    /// Rows inserted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserts: Option<u64>,

    /// Rows updated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updates: Option<u64>,

    /// Rows soft-deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soft_deletes: Option<u64>,

    /// Total rows processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_rows: Option<u64>,

    /// Open key-value mapping for arbitrary caller-supplied context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_metadata: Option<Map<String, Value>>,
}

impl ExecutionResult {
    /// A successful result with no counts.
    pub fn success() -> Self {
        Self {
            completed_successfully: true,
            ..Default::default()
        }
    }

    /// A failed result with no counts.
    pub fn failure() -> Self {
        Self {
            completed_successfully: false,
            ..Default::default()
        }
    }

    pub fn with_inserts(mut self, inserts: u64) -> Self {
        self.inserts = Some(inserts);
        self
    }

    pub fn with_updates(mut self, updates: u64) -> Self {
        self.updates = Some(updates);
        self
    }

    pub fn with_soft_deletes(mut self, soft_deletes: u64) -> Self {
        self.soft_deletes = Some(soft_deletes);
        self
    }

    pub fn with_total_rows(mut self, total_rows: u64) -> Self {
        self.total_rows = Some(total_rows);
        self
    }

    /// Add a single metadata entry, creating the mapping if needed.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.execution_metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Merge entries into the metadata mapping. Existing keys win.
    pub fn merge_metadata(&mut self, entries: Map<String, Value>) {
        let metadata = self.execution_metadata.get_or_insert_with(Map::new);
        for (key, value) in entries {
            metadata.entry(key).or_insert(value);
        }
    }
}

/// Capability marker for values the tracker can report.
///
/// Custom result types carry extra fields for local use; only the base
/// [`ExecutionResult`] view is transmitted to the service. Implement this
/// on a wrapper struct to keep per-run data (timings, identifiers) on the
/// returned value without leaking it onto the wire.
pub trait TrackedResult {
    /// The declared fields that get reported.
    fn execution_result(&self) -> &ExecutionResult;

    /// Mutable access, used to merge orchestration metadata.
    fn execution_result_mut(&mut self) -> &mut ExecutionResult;
}

impl TrackedResult for ExecutionResult {
    fn execution_result(&self) -> &ExecutionResult {
        self
    }

    fn execution_result_mut(&mut self) -> &mut ExecutionResult {
        self
    }
}

/// A reported execution paired with the result the caller produced.
///
/// Constructed by the tracker only after the end call succeeded.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome<R> {
    /// Identifier of the execution that was just reported.
    pub execution_id: i64,

    /// The caller's result, returned unmodified (custom fields intact).
    pub result: R,
}
