//! Adapters for orchestration frameworks.
//!
//! The core never talks to an orchestrator directly: it receives the
//! framework-native context rendered as JSON and extracts a flat metadata
//! mapping from it. Unrecognized context shapes produce a warning and a
//! generic context, never a hard failure.

use serde_json::{Map, Value};
use tracing::warn;

/// Fields the known orchestrators expose, plus a passthrough for the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrchestrationContext {
    /// Which framework produced the context: `dagster`, `airflow`,
    /// `custom`, or `unknown`.
    pub orchestrator: String,

    pub run_id: Option<String>,
    pub execution_date: Option<String>,
    pub partition_key: Option<String>,
    pub dag_id: Option<String>,
    pub task_id: Option<String>,

    /// Context entries beyond the fields above, carried verbatim.
    pub extra: Map<String, Value>,
}

/// Known keys lifted into dedicated fields during detection.
const KNOWN_KEYS: &[&str] = &[
    "run_id",
    "execution_date",
    "partition_key",
    "dag_id",
    "task_id",
];

impl OrchestrationContext {
    pub fn new(orchestrator: impl Into<String>) -> Self {
        Self {
            orchestrator: orchestrator.into(),
            ..Default::default()
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Detect the orchestrator behind a framework-native context value.
    ///
    /// A Dagster context carries `run_id` and `partition_key`; an Airflow
    /// context carries `dag_id` and `task_id`. Anything else yields a
    /// generic context with a warning.
    pub fn detect(context: &Value) -> Self {
        let Some(object) = context.as_object() else {
            warn!(
                context = %context,
                "unknown orchestration context shape, using generic context"
            );
            return Self::new("unknown");
        };

        let orchestrator = if object.contains_key("run_id") && object.contains_key("partition_key")
        {
            "dagster"
        } else if object.contains_key("dag_id") || object.contains_key("task_id") {
            "airflow"
        } else {
            warn!("unrecognized orchestration context keys, using generic context");
            "unknown"
        };

        let field = |name: &str| -> Option<String> {
            object.get(name).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
        };

        let extra: Map<String, Value> = object
            .iter()
            .filter(|(key, _)| !KNOWN_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            orchestrator: orchestrator.to_string(),
            run_id: field("run_id"),
            execution_date: field("execution_date"),
            partition_key: field("partition_key"),
            dag_id: field("dag_id"),
            task_id: field("task_id"),
            extra,
        }
    }

    /// Flatten into the metadata mapping merged into `execution_metadata`.
    pub fn to_metadata(&self) -> Map<String, Value> {
        let mut metadata = Map::new();
        metadata.insert("orchestrator".to_string(), self.orchestrator.clone().into());

        let mut put = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                metadata.insert(key.to_string(), value.clone().into());
            }
        };
        put("run_id", &self.run_id);
        put("execution_date", &self.execution_date);
        put("partition_key", &self.partition_key);
        put("dag_id", &self.dag_id);
        put("task_id", &self.task_id);

        for (key, value) in &self.extra {
            metadata.insert(key.clone(), value.clone());
        }

        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_dagster_context() {
        let context = OrchestrationContext::detect(&json!({
            "run_id": "dagster_run_123",
            "partition_key": "2024-01-01",
        }));

        assert_eq!(context.orchestrator, "dagster");
        assert_eq!(context.run_id.as_deref(), Some("dagster_run_123"));
        assert_eq!(context.partition_key.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_detect_airflow_context() {
        let context = OrchestrationContext::detect(&json!({
            "run_id": "airflow_run_456",
            "execution_date": "2024-01-01T00:00:00Z",
            "dag_id": "test_dag",
            "task_id": "test_task",
        }));

        assert_eq!(context.orchestrator, "airflow");
        assert_eq!(context.run_id.as_deref(), Some("airflow_run_456"));
        assert_eq!(context.dag_id.as_deref(), Some("test_dag"));
        assert_eq!(context.task_id.as_deref(), Some("test_task"));
    }

    #[test]
    fn test_detect_unknown_context() {
        let context = OrchestrationContext::detect(&json!("some_unknown_context"));

        assert_eq!(context.orchestrator, "unknown");
        assert_eq!(context.run_id, None);
        // Only the orchestrator marker, nothing else.
        assert_eq!(context.to_metadata().len(), 1);
    }

    #[test]
    fn test_extra_keys_carried_through() {
        let context = OrchestrationContext::detect(&json!({
            "dag_id": "d",
            "task_id": "t",
            "custom_field": "custom_value",
        }));

        let metadata = context.to_metadata();
        assert_eq!(metadata.get("orchestrator"), Some(&json!("airflow")));
        assert_eq!(metadata.get("custom_field"), Some(&json!("custom_value")));
    }

    #[test]
    fn test_to_metadata_skips_absent_fields() {
        let context = OrchestrationContext::new("custom").with_run_id("custom_run_789");
        let metadata = context.to_metadata();

        assert_eq!(metadata.get("orchestrator"), Some(&json!("custom")));
        assert_eq!(metadata.get("run_id"), Some(&json!("custom_run_789")));
        assert!(!metadata.contains_key("dag_id"));
        assert!(!metadata.contains_key("partition_key"));
    }
}
