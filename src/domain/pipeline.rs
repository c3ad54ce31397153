//! Pipeline identity and configuration models.
//!
//! A [`PipelineConfig`] is what the caller declares (optionally loaded from
//! YAML); a [`SyncedPipelineConfig`] is what comes back after registering it
//! with the watch service: server-assigned id, active flag, and the current
//! watermark.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::execution::Watermark;
use crate::domain::lineage::AddressLineage;
use crate::error::{Error, Result};

/// Calendar unit for freshness/timeliness thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

/// A named, remotely registered unit of recurring data-movement work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Unique pipeline name.
    pub name: String,

    /// Pipeline classification, e.g. `extraction`, `data-transformation`.
    pub pipeline_type_name: String,

    /// Watermark to seed the pipeline with on first registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_watermark: Option<Watermark>,

    /// Upper bound of the next incremental window, if known up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_watermark: Option<Watermark>,

    /// Arbitrary metadata stored on the pipeline definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_metadata: Option<Value>,

    /// Freshness threshold: how stale the target may get.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_datepart: Option<DatePart>,

    /// Timeliness threshold: how long an execution may take.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeliness_number: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeliness_datepart: Option<DatePart>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, pipeline_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pipeline_type_name: pipeline_type_name.into(),
            default_watermark: None,
            next_watermark: None,
            pipeline_metadata: None,
            freshness_number: None,
            freshness_datepart: None,
            timeliness_number: None,
            timeliness_datepart: None,
        }
    }

    pub fn with_default_watermark(mut self, watermark: impl Into<Watermark>) -> Self {
        self.default_watermark = Some(watermark.into());
        self
    }

    pub fn with_next_watermark(mut self, watermark: impl Into<Watermark>) -> Self {
        self.next_watermark = Some(watermark.into());
        self
    }

    /// Check the identity fields the service requires.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::invalid_usage("pipeline name cannot be empty"));
        }
        if self.pipeline_type_name.is_empty() {
            return Err(Error::invalid_usage("pipeline type name cannot be empty"));
        }
        Ok(())
    }
}

/// Caller-declared pipeline configuration, ready to sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub pipeline: Pipeline,

    /// Lineage to register alongside the pipeline. Posted only when the
    /// service asks for it (`load_lineage` on the sync response).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_lineage: Option<AddressLineage>,
}

impl PipelineConfig {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            address_lineage: None,
        }
    }

    pub fn with_address_lineage(mut self, lineage: AddressLineage) -> Self {
        self.address_lineage = Some(lineage);
        self
    }

    /// Load a configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Validate the pipeline identity and lineage, if present.
    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        if let Some(lineage) = &self.address_lineage {
            lineage.validate()?;
        }
        Ok(())
    }
}

/// Server-side view of a pipeline after registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedPipeline {
    /// Server-assigned pipeline id.
    pub id: i64,

    /// Whether executions of this pipeline should run at all.
    pub active: bool,

    /// Whether the service wants the address lineage posted.
    #[serde(default)]
    pub load_lineage: bool,

    /// Current watermark held by the service. Inactive pipelines have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watermark: Option<Watermark>,
}

/// A declared configuration joined with its server-side registration.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncedPipelineConfig {
    pub pipeline: SyncedPipeline,

    /// Effective watermark for the upcoming execution.
    pub watermark: Option<Watermark>,

    /// Next watermark carried over from the declared configuration.
    pub next_watermark: Option<Watermark>,
}
