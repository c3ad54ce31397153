//! Stateless façade mapping domain operations to transport calls.
//!
//! The single place where the request/response shapes of the watch service
//! are known. Every operation delegates straight to [`Transport`] and lets
//! its typed errors pass through untouched.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::transport::Transport;
use crate::domain::{AddressLineage, ExecutionResult, Pipeline, SyncedPipeline, Watermark};
use crate::error::Result;

/// Payload for starting an execution.
#[derive(Debug, Clone, Serialize)]
pub struct StartExecution {
    pub pipeline_id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_watermark: Option<Watermark>,

    /// Parent execution for child chaining. Attached verbatim; the service
    /// owns existence and cycle validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
}

impl StartExecution {
    pub fn new(pipeline_id: i64) -> Self {
        Self {
            pipeline_id,
            start_date: Some(Utc::now()),
            watermark: None,
            next_watermark: None,
            parent_id: None,
        }
    }

    pub fn with_watermark(mut self, watermark: Option<Watermark>) -> Self {
        self.watermark = watermark;
        self
    }

    pub fn with_next_watermark(mut self, next_watermark: Option<Watermark>) -> Self {
        self.next_watermark = next_watermark;
        self
    }

    pub fn with_parent(mut self, parent_id: Option<i64>) -> Self {
        self.parent_id = parent_id;
        self
    }
}

/// Payload for ending an execution.
#[derive(Debug, Clone, Serialize)]
pub struct EndExecution {
    pub id: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,

    pub completed_successfully: bool,

    #[serde(flatten)]
    result: ExecutionResultFields,
}

/// The declared result fields that go on the wire. Built from the base
/// [`ExecutionResult`] view only, so custom carrier fields never leak in.
#[derive(Debug, Clone, Serialize)]
struct ExecutionResultFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    inserts: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    updates: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    soft_deletes: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    total_rows: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    execution_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl EndExecution {
    /// Build the end payload for `execution_id` from a result.
    pub fn from_result(execution_id: i64, result: &ExecutionResult) -> Self {
        Self {
            id: execution_id,
            end_date: Some(Utc::now()),
            completed_successfully: result.completed_successfully,
            result: ExecutionResultFields {
                inserts: result.inserts,
                updates: result.updates,
                soft_deletes: result.soft_deletes,
                total_rows: result.total_rows,
                execution_metadata: result.execution_metadata.clone(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct StartExecutionResponse {
    id: i64,
}

/// Thin, stateless recorder over the transport.
#[derive(Debug, Clone)]
pub struct Recorder {
    transport: Transport,
}

impl Recorder {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Register an execution start; returns the server-assigned id.
    pub async fn start_execution(&self, start: &StartExecution) -> Result<i64> {
        let body = serde_json::to_value(start)?;
        let response = self
            .transport
            .request(Method::POST, "/start_pipeline_execution", Some(&body), None)
            .await?;
        let parsed: StartExecutionResponse = serde_json::from_value(response)?;
        Ok(parsed.id)
    }

    /// Report an execution end.
    pub async fn end_execution(&self, end: &EndExecution) -> Result<()> {
        let body = serde_json::to_value(end)?;
        self.transport
            .request(Method::POST, "/end_pipeline_execution", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Move a pipeline's next-watermark forward.
    pub async fn update_next_watermark(
        &self,
        pipeline_id: i64,
        next_watermark: &Watermark,
    ) -> Result<()> {
        let body = json!({
            "pipeline_id": pipeline_id,
            "next_watermark": next_watermark,
        });
        self.transport
            .request(Method::POST, "/update_next_watermark", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Register a pipeline definition; returns the server-side view.
    pub async fn sync_pipeline(&self, pipeline: &Pipeline) -> Result<SyncedPipeline> {
        let body = serde_json::to_value(pipeline)?;
        let response = self
            .transport
            .request(Method::POST, "/pipelines", Some(&body), None)
            .await?;
        let synced: SyncedPipeline = serde_json::from_value(response)?;
        Ok(synced)
    }

    /// Register the address lineage of a pipeline.
    pub async fn sync_address_lineage(
        &self,
        pipeline_id: i64,
        lineage: &AddressLineage,
    ) -> Result<()> {
        let body = json!({
            "pipeline_id": pipeline_id,
            "source_addresses": lineage.source_addresses,
            "target_addresses": lineage.target_addresses,
        });
        self.transport
            .request(Method::POST, "/address_lineage", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Fire-and-forget: ask the service to run its timeliness check.
    pub async fn trigger_timeliness_check(&self, lookback_minutes: u32) -> Result<()> {
        let body = json!({ "lookback_minutes": lookback_minutes });
        self.transport
            .request(Method::POST, "/trigger_timeliness_check", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Fire-and-forget: ask the service to run its freshness check.
    pub async fn trigger_freshness_check(&self) -> Result<()> {
        self.transport
            .request(Method::POST, "/trigger_freshness_check", None, None)
            .await?;
        Ok(())
    }

    /// Fire-and-forget: ask the service to check its celery queue health.
    pub async fn trigger_celery_queue_check(&self) -> Result<()> {
        self.transport
            .request(Method::POST, "/trigger_celery_queue_check", None, None)
            .await?;
        Ok(())
    }
}
