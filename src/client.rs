//! Client façade wiring transport, recorder, and tracker together.

use std::future::Future;

use crate::config::ClientConfig;
use crate::core::{ChildExecution, Recorder, TrackedPipeline, Tracker, Transport};
use crate::domain::{
    ExecutionContext, ExecutionOutcome, PipelineConfig, SyncedPipelineConfig, TrackedResult,
    Watermark,
};
use crate::error::Result;

/// Client for the watch service.
///
/// One client holds one pooled HTTP connection set; clone it freely, all
/// clones share the pool and are safe to use concurrently.
#[derive(Debug, Clone)]
pub struct WatchClient {
    recorder: Recorder,
    tracker: Tracker,
}

impl WatchClient {
    /// Build a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Transport::new(
            config.base_url,
            config.timeout,
            config.retry,
            config.bearer_token,
        )?;
        let recorder = Recorder::new(transport);
        let tracker = Tracker::new(recorder.clone());

        Ok(Self { recorder, tracker })
    }

    /// Build a client against `base_url` with default configuration.
    pub fn from_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    pub fn base_url(&self) -> &str {
        self.recorder.transport().base_url()
    }

    /// Direct access to the recorder for advanced use (manual parent
    /// bracketing, monitoring triggers).
    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Register a pipeline configuration with the service.
    ///
    /// The lineage is posted only when the pipeline is active, the service
    /// asked for it (`load_lineage`), and the configuration carries one.
    /// Inactive pipelines come back without a watermark.
    pub async fn sync_pipeline_config(
        &self,
        config: &PipelineConfig,
    ) -> Result<SyncedPipelineConfig> {
        config.validate()?;

        let synced = self.recorder.sync_pipeline(&config.pipeline).await?;

        if synced.active && synced.load_lineage {
            if let Some(lineage) = &config.address_lineage {
                self.recorder.sync_address_lineage(synced.id, lineage).await?;
            }
        }

        Ok(SyncedPipelineConfig {
            watermark: synced.watermark.clone(),
            next_watermark: config.pipeline.next_watermark.clone(),
            pipeline: synced,
        })
    }

    /// Run `work` as a tracked execution. See [`Tracker::run`].
    pub async fn track_execution<F, Fut, R>(
        &self,
        pipeline: &TrackedPipeline,
        work: F,
    ) -> Result<Option<ExecutionOutcome<R>>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
        R: TrackedResult,
    {
        self.tracker.run(pipeline, work).await
    }

    /// Run `work` as a child execution. See [`Tracker::run_child`].
    pub async fn track_child_execution<F, Fut, R>(
        &self,
        child: &ChildExecution,
        work: F,
    ) -> Result<ExecutionOutcome<R>>
    where
        F: FnOnce(ExecutionContext) -> Fut,
        Fut: Future<Output = anyhow::Result<R>>,
        R: TrackedResult,
    {
        self.tracker.run_child(child, work).await
    }

    /// Move a pipeline's next-watermark forward.
    pub async fn update_next_watermark(
        &self,
        pipeline_id: i64,
        next_watermark: impl Into<Watermark>,
    ) -> Result<()> {
        self.recorder
            .update_next_watermark(pipeline_id, &next_watermark.into())
            .await
    }

    /// Fire-and-forget monitoring triggers.
    pub async fn trigger_timeliness_check(&self, lookback_minutes: u32) -> Result<()> {
        self.recorder.trigger_timeliness_check(lookback_minutes).await
    }

    pub async fn trigger_freshness_check(&self) -> Result<()> {
        self.recorder.trigger_freshness_check().await
    }

    pub async fn trigger_celery_queue_check(&self) -> Result<()> {
        self.recorder.trigger_celery_queue_check().await
    }
}
