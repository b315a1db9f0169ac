//! # Event Ingestion
//!
//! Turns job-state-change events into [`JobRecord`]s and writes them to the
//! record store. Whether earlier states survive depends on the store's write
//! mode: a latest-only store overwrites by job id, a history store keeps one
//! item per job id and timestamp.
//!
//! Identifiers come from the container command line (`--media_id`, `--wuid`,
//! `--task_id`). Assembly jobs carry none of those; their workspace and
//! assembly id are read from the job name instead:
//!
//! ```text
//! assembly-<workspace>-<label>-<assembly id>-zip_package-<duration>
//! ```

use crate::error::{MonitorError, Result};
use crate::fields::{find_object_id, is_assembly_job};
use crate::models::JobRecord;
use crate::store::RecordStore;
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

const UNKNOWN_JOB_ID: &str = "unknown";

/// Explicit `null` reads the same as an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchJobEvent {
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub detail: JobDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_queue: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_definition: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_reason: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub container: ContainerDetail,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerDetail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub command: Vec<String>,
}

impl ContainerDetail {
    /// Value following `flag` in the command line
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.command
            .iter()
            .position(|arg| arg == flag)
            .and_then(|index| self.command.get(index + 1))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

/// Build the stored record for one event
pub fn record_from_event(event: &Value) -> Result<JobRecord> {
    let parsed: BatchJobEvent = serde_json::from_value(event.clone())
        .map_err(|e| MonitorError::ingestion(format!("Malformed job event: {e}")))?;
    let detail = &parsed.detail;

    let job_id = detail
        .job_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| UNKNOWN_JOB_ID.to_string());
    let timestamp = parsed
        .time
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    let mut record = JobRecord::new(job_id, timestamp, detail.status.clone())
        .with_job_name(detail.job_name.clone())
        .with_queue(detail.job_queue.clone())
        .with_definition(detail.job_definition.clone())
        .with_region(parsed.region.clone().unwrap_or_default())
        .with_status_reason(detail.status_reason.clone());
    record.account = parsed.account.clone();
    record.full_event = Some(event.to_string());

    let name_object_id = find_object_id(&detail.job_name).map(str::to_string);

    if is_assembly_job(&detail.job_name) {
        record.workspace_uid = detail
            .job_name
            .split('-')
            .nth(1)
            .filter(|part| !part.is_empty())
            .map(str::to_string);
        record.assembly_id = name_object_id;
    } else {
        let command = &detail.container;
        record.media_id = command
            .flag_value("--media_id")
            .map(str::to_string)
            .or_else(|| name_object_id.clone());
        record.workspace_uid = command.flag_value("--wuid").map(str::to_string);
        record.task_id = command
            .flag_value("--task_id")
            .map(str::to_string)
            .or(name_object_id);
    }

    Ok(record)
}

/// Writes one record per received event
pub struct EventIngestor {
    store: Arc<dyn RecordStore>,
}

impl EventIngestor {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn ingest(&self, event: &Value) -> Result<JobRecord> {
        let record = record_from_event(event)?;
        self.store.put(record.clone()).await?;

        info!(
            job_id = %record.job_id,
            status = %record.status,
            timestamp = %record.timestamp,
            "Job record stored"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryRecordStore, WriteMode};
    use serde_json::json;

    fn event(job_name: &str, command: Vec<&str>) -> Value {
        json!({
            "version": "0",
            "detail-type": "Batch Job State Change",
            "account": "388659957718",
            "time": "2024-12-24T10:00:00Z",
            "region": "eu-west-1",
            "detail": {
                "jobId": "test-job-001",
                "jobName": job_name,
                "status": "RUNNING",
                "jobQueue": "arn:aws:batch:eu-west-1:388659957718:job-queue/orchestrator-standard-pre",
                "jobDefinition": "arn:aws:batch:eu-west-1:388659957718:job-definition/storage-pre-v2:129",
                "statusReason": "Test",
                "container": {"command": command}
            }
        })
    }

    #[test]
    fn test_command_flags_take_precedence() {
        let record = record_from_event(&event(
            "pre-694a9d57b88940a9e5cd3bee-1766497635776",
            vec!["run", "--media_id", "m-1", "--wuid", "pre", "--task_id", "t-1"],
        ))
        .unwrap();

        assert_eq!(record.job_id, "test-job-001");
        assert_eq!(record.timestamp, "2024-12-24T10:00:00Z");
        assert_eq!(record.region, "eu-west-1");
        assert_eq!(record.account.as_deref(), Some("388659957718"));
        assert_eq!(record.media_id.as_deref(), Some("m-1"));
        assert_eq!(record.workspace_uid.as_deref(), Some("pre"));
        assert_eq!(record.task_id.as_deref(), Some("t-1"));
        assert_eq!(record.assembly_id, None);
        assert!(record.full_event.unwrap().contains("Batch Job State Change"));
    }

    #[test]
    fn test_job_name_fallback_without_flags() {
        let record = record_from_event(&event(
            "pre-694a9d57b88940a9e5cd3bee-1766497635776",
            vec!["--media_id"],
        ))
        .unwrap();

        assert_eq!(record.media_id.as_deref(), Some("694a9d57b88940a9e5cd3bee"));
        assert_eq!(record.task_id.as_deref(), Some("694a9d57b88940a9e5cd3bee"));
        assert_eq!(record.workspace_uid, None);
    }

    #[test]
    fn test_assembly_jobs_use_job_name() {
        let record = record_from_event(&event(
            "assembly-pre-06_02_26_10_14_cart-6985b698fa887fdaa7e55c0b-zip_package-400sec",
            vec!["--media_id", "ignored"],
        ))
        .unwrap();

        assert_eq!(record.workspace_uid.as_deref(), Some("pre"));
        assert_eq!(record.assembly_id.as_deref(), Some("6985b698fa887fdaa7e55c0b"));
        assert_eq!(record.media_id, None);
        assert_eq!(record.task_id, None);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let record = record_from_event(&json!({"detail": {"status": "SUBMITTED"}})).unwrap();
        assert_eq!(record.job_id, "unknown");
        assert!(record.parsed_timestamp().is_some());
        assert_eq!(record.region, "");
    }

    #[test]
    fn test_null_fields_are_stored_with_defaults() {
        let mut raw = event("pre-694a9d57b88940a9e5cd3bee-1766497635776", vec![]);
        raw["detail"]["statusReason"] = Value::Null;
        raw["detail"]["container"] = Value::Null;
        raw["detail"]["jobQueue"] = Value::Null;

        let record = record_from_event(&raw).unwrap();
        assert_eq!(record.job_id, "test-job-001");
        assert_eq!(record.status, "RUNNING");
        assert_eq!(record.status_reason, "");
        assert_eq!(record.job_queue, "");
        assert_eq!(record.media_id.as_deref(), Some("694a9d57b88940a9e5cd3bee"));

        let record = record_from_event(&json!({"detail": null, "time": null})).unwrap();
        assert_eq!(record.job_id, "unknown");
        assert_eq!(record.status, "");
    }

    #[test]
    fn test_malformed_event_is_an_ingestion_error() {
        let err = record_from_event(&json!({"detail": "not an object"})).unwrap_err();
        assert!(matches!(err, MonitorError::Ingestion(_)));
    }

    #[tokio::test]
    async fn test_ingest_overwrites_in_latest_only_store() {
        let store = Arc::new(InMemoryRecordStore::new(
            "jobs",
            "eu-west-1",
            WriteMode::LatestOnly,
        ));
        let ingestor = EventIngestor::new(store.clone());

        let mut first = event("pre-694a9d57b88940a9e5cd3bee-1", vec![]);
        ingestor.ingest(&first).await.unwrap();

        first["time"] = json!("2024-12-24T10:05:00Z");
        first["detail"]["status"] = json!("SUCCEEDED");
        ingestor.ingest(&first).await.unwrap();

        assert_eq!(store.len(), 1);
        let current = store.get_by_key("test-job-001").await.unwrap().unwrap();
        assert_eq!(current.status, "SUCCEEDED");
    }
}
