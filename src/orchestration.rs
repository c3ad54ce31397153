//! High-level wrapper for executions launched from an orchestrator.
//!
//! [`OrchestratedRun`] hides the sync-then-track ceremony: it registers the
//! pipeline configuration once (cached for the lifetime of the wrapper),
//! detects the orchestration context, runs the work through the tracker,
//! and folds the adapter metadata into the reported result.

use std::future::Future;

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::warn;

use crate::adapters::OrchestrationContext;
use crate::client::WatchClient;
use crate::core::recorder::{EndExecution, StartExecution};
use crate::core::tracker::TrackedPipeline;
use crate::domain::{
    ExecutionContext, ExecutionOutcome, ExecutionResult, PipelineConfig, SyncedPipelineConfig,
    TrackedResult,
};
use crate::error::Result;

/// Orchestrator-facing execution wrapper for one pipeline configuration.
pub struct OrchestratedRun {
    client: WatchClient,
    config: PipelineConfig,
    synced: OnceCell<SyncedPipelineConfig>,
}

impl OrchestratedRun {
    pub fn new(client: WatchClient, config: PipelineConfig) -> Self {
        Self {
            client,
            config,
            synced: OnceCell::new(),
        }
    }

    /// Sync the configuration on first use; cached afterwards.
    async fn synced(&self) -> Result<&SyncedPipelineConfig> {
        self.synced
            .get_or_try_init(|| self.client.sync_pipeline_config(&self.config))
            .await
    }

    /// Run `work` as a tracked execution of the wrapped pipeline.
    ///
    /// When an orchestration context is supplied, its flat metadata mapping
    /// is merged into the result's `execution_metadata` before the end
    /// report goes out; caller-supplied keys win on conflict. Returns
    /// `Ok(None)` when the synced pipeline is inactive.
    pub async fn execute<F, Fut, R>(
        &self,
        work: F,
        orchestration_context: Option<&Value>,
        parent_execution_id: Option<i64>,
    ) -> Result<Option<ExecutionOutcome<R>>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
        R: TrackedResult,
    {
        let synced = self.synced().await?;

        let mut pipeline = TrackedPipeline::from_synced(synced);
        if let Some(parent) = parent_execution_id {
            pipeline = pipeline.with_parent(parent);
        }

        let detected = orchestration_context.map(OrchestrationContext::detect);

        self.client
            .track_execution(&pipeline, move |context| async move {
                let mut result = work(context).await?;
                if let Some(orchestration) = detected {
                    result
                        .execution_result_mut()
                        .merge_metadata(orchestration.to_metadata());
                }
                Ok(result)
            })
            .await
    }

    /// Start a parent execution without completing it.
    ///
    /// Intended for fan-out workflows: start the parent, run children
    /// against its id, then close it with
    /// [`end_parent_execution`](Self::end_parent_execution). Returns
    /// `Ok(None)` with a warning when the pipeline is inactive.
    pub async fn start_parent_execution(&self) -> Result<Option<i64>> {
        let synced = self.synced().await?;

        if !synced.pipeline.active {
            warn!(
                pipeline_id = synced.pipeline.id,
                "pipeline is not active, aborting parent execution"
            );
            return Ok(None);
        }

        let start = StartExecution::new(synced.pipeline.id)
            .with_watermark(synced.watermark.clone())
            .with_next_watermark(synced.next_watermark.clone());

        let execution_id = self.client.recorder().start_execution(&start).await?;
        Ok(Some(execution_id))
    }

    /// Close a parent execution with the given result.
    pub async fn end_parent_execution(
        &self,
        execution_id: i64,
        result: &ExecutionResult,
    ) -> Result<()> {
        let end = EndExecution::from_result(execution_id, result);
        self.client.recorder().end_execution(&end).await
    }
}
