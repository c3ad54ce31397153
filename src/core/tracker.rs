//! Execution tracking state machine.
//!
//! Wraps a unit of work in a tracked execution:
//! `PENDING -> SKIPPED` when the pipeline is inactive, otherwise
//! `PENDING -> RUNNING -> {SUCCEEDED, FAILED}`. The start call completes
//! strictly before the work begins; the end call is attempted strictly
//! after the work returns or fails. Work failures are reported to the
//! service and then propagated unchanged — reporting never absorbs them.

use std::future::Future;

use tracing::{debug, error, info, warn};

use crate::core::recorder::{EndExecution, Recorder, StartExecution};
use crate::domain::{
    ExecutionContext, ExecutionOutcome, ExecutionResult, SyncedPipelineConfig, TrackedResult,
    Watermark,
};
use crate::error::{Error, Result};

/// Identity and incremental window of a pipeline about to execute.
#[derive(Debug, Clone)]
pub struct TrackedPipeline {
    pub pipeline_id: i64,

    /// Inactive pipelines are skipped without any service calls.
    pub active: bool,

    pub watermark: Option<Watermark>,
    pub next_watermark: Option<Watermark>,

    /// When set, the execution is chained under this parent.
    pub parent_execution_id: Option<i64>,
}

impl TrackedPipeline {
    /// An active pipeline with no window and no parent.
    pub fn new(pipeline_id: i64) -> Self {
        Self {
            pipeline_id,
            active: true,
            watermark: None,
            next_watermark: None,
            parent_execution_id: None,
        }
    }

    /// Carry identity and watermarks over from a synced configuration.
    pub fn from_synced(config: &SyncedPipelineConfig) -> Self {
        Self {
            pipeline_id: config.pipeline.id,
            active: config.pipeline.active,
            watermark: config.watermark.clone(),
            next_watermark: config.next_watermark.clone(),
            parent_execution_id: None,
        }
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_watermark(mut self, watermark: impl Into<Watermark>) -> Self {
        self.watermark = Some(watermark.into());
        self
    }

    pub fn with_next_watermark(mut self, next_watermark: impl Into<Watermark>) -> Self {
        self.next_watermark = Some(next_watermark.into());
        self
    }

    pub fn with_parent(mut self, parent_execution_id: i64) -> Self {
        self.parent_execution_id = Some(parent_execution_id);
        self
    }
}

/// Parameters for running plain work as a child execution.
///
/// Children are always run — the caller already decided to invoke them —
/// so there is no active flag and no skip path.
#[derive(Debug, Clone)]
pub struct ChildExecution {
    pub pipeline_id: i64,
    pub parent_execution_id: i64,
    pub watermark: Option<Watermark>,
    pub next_watermark: Option<Watermark>,
}

impl ChildExecution {
    pub fn new(pipeline_id: i64, parent_execution_id: i64) -> Self {
        Self {
            pipeline_id,
            parent_execution_id,
            watermark: None,
            next_watermark: None,
        }
    }

    pub fn with_watermark(mut self, watermark: impl Into<Watermark>) -> Self {
        self.watermark = Some(watermark.into());
        self
    }

    pub fn with_next_watermark(mut self, next_watermark: impl Into<Watermark>) -> Self {
        self.next_watermark = Some(next_watermark.into());
        self
    }
}

/// Orchestrates the lifecycle of a single execution.
#[derive(Debug, Clone)]
pub struct Tracker {
    recorder: Recorder,
}

impl Tracker {
    pub fn new(recorder: Recorder) -> Self {
        Self { recorder }
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Run `work` as a tracked execution of `pipeline`.
    ///
    /// Returns `Ok(None)` when the pipeline is inactive: the work is never
    /// invoked, no service calls are made, and a warning is emitted. The
    /// work always receives the [`ExecutionContext`]; work that has no use
    /// for it simply ignores the argument.
    ///
    /// A start failure propagates before the work runs. A work failure is
    /// reported (`completed_successfully = false`, error description in the
    /// metadata) and then surfaced as [`Error::Work`] wrapping the original
    /// error. A failed end call after successful work surfaces as
    /// [`Error::EndReport`] with the reported result attached.
    pub async fn run<F, Fut, R>(
        &self,
        pipeline: &TrackedPipeline,
        work: F,
    ) -> Result<Option<ExecutionOutcome<R>>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
        R: TrackedResult,
    {
        if !pipeline.active {
            warn!(
                pipeline_id = pipeline.pipeline_id,
                "pipeline is not active, skipping execution"
            );
            return Ok(None);
        }

        let start = StartExecution::new(pipeline.pipeline_id)
            .with_watermark(pipeline.watermark.clone())
            .with_next_watermark(pipeline.next_watermark.clone())
            .with_parent(pipeline.parent_execution_id);

        let execution_id = self.recorder.start_execution(&start).await?;
        debug!(
            execution_id,
            pipeline_id = pipeline.pipeline_id,
            "execution started"
        );

        let context = ExecutionContext {
            execution_id,
            pipeline_id: pipeline.pipeline_id,
            watermark: pipeline.watermark.clone(),
            next_watermark: pipeline.next_watermark.clone(),
        };

        let worked = work(context).await;
        let outcome = self.finish(execution_id, worked).await?;
        Ok(Some(outcome))
    }

    /// Run plain work as a child execution under `parent_execution_id`.
    ///
    /// Entry is unconditional; the RUNNING transitions and failure handling
    /// are identical to [`run`](Self::run).
    pub async fn run_child<F, Fut, R>(
        &self,
        child: &ChildExecution,
        work: F,
    ) -> Result<ExecutionOutcome<R>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
        R: TrackedResult,
    {
        let start = StartExecution::new(child.pipeline_id)
            .with_watermark(child.watermark.clone())
            .with_next_watermark(child.next_watermark.clone())
            .with_parent(Some(child.parent_execution_id));

        let execution_id = self.recorder.start_execution(&start).await?;
        debug!(
            execution_id,
            pipeline_id = child.pipeline_id,
            parent_execution_id = child.parent_execution_id,
            "child execution started"
        );

        let context = ExecutionContext {
            execution_id,
            pipeline_id: child.pipeline_id,
            watermark: child.watermark.clone(),
            next_watermark: child.next_watermark.clone(),
        };

        let worked = work(context).await;
        self.finish(execution_id, worked).await
    }

    /// Report the end of a running execution and shape the outcome.
    async fn finish<R>(
        &self,
        execution_id: i64,
        worked: anyhow::Result<R>,
    ) -> Result<ExecutionOutcome<R>>
    where
        R: TrackedResult,
    {
        match worked {
            Ok(result) => {
                let end = EndExecution::from_result(execution_id, result.execution_result());
                match self.recorder.end_execution(&end).await {
                    Ok(()) => {
                        info!(execution_id, "execution completed");
                        Ok(ExecutionOutcome {
                            execution_id,
                            result,
                        })
                    }
                    Err(e) => {
                        error!(
                            execution_id,
                            error = %e,
                            "work succeeded but the end report failed"
                        );
                        Err(Error::EndReport {
                            execution_id,
                            result: Box::new(result.execution_result().clone()),
                            source: Box::new(e),
                        })
                    }
                }
            }
            Err(work_error) => {
                let failure = ExecutionResult::failure()
                    .with_metadata("error", format!("{:#}", work_error));
                let end = EndExecution::from_result(execution_id, &failure);

                // The caller's failure always wins; a failed failure-report
                // is logged, never propagated in its place.
                if let Err(report_error) = self.recorder.end_execution(&end).await {
                    error!(
                        execution_id,
                        error = %report_error,
                        "failed to report execution failure"
                    );
                }

                error!(execution_id, error = %work_error, "execution failed");
                Err(Error::Work { source: work_error })
            }
        }
    }
}
