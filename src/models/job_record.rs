//! # Job Record
//!
//! One append-only entry written by the ingester each time a job changes state.
//! Attribute names follow the record store's item layout.

use crate::constants::JobStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Stable job identifier, repeated across the job's lifetime
    #[serde(rename = "jobId", default)]
    pub job_id: String,

    /// ISO-8601 time of the state change; per-job recency key
    #[serde(default)]
    pub timestamp: String,

    #[serde(default)]
    pub status: String,

    /// Queue ARN
    #[serde(rename = "jobQueue", default)]
    pub job_queue: String,

    /// Job definition ARN including its revision
    #[serde(rename = "jobDefinition", default)]
    pub job_definition: String,

    #[serde(rename = "jobName", default)]
    pub job_name: String,

    #[serde(default)]
    pub region: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,

    #[serde(rename = "statusReason", default)]
    pub status_reason: String,

    /// Raw event JSON as received by the ingester
    #[serde(rename = "fullEvent", default, skip_serializing_if = "Option::is_none")]
    pub full_event: Option<String>,

    // Enrichment written by newer ingesters; absent on older records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assembly_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_uid: Option<String>,
}

impl JobRecord {
    pub fn new(
        job_id: impl Into<String>,
        timestamp: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            timestamp: timestamp.into(),
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn with_job_name(mut self, job_name: impl Into<String>) -> Self {
        self.job_name = job_name.into();
        self
    }

    pub fn with_queue(mut self, job_queue: impl Into<String>) -> Self {
        self.job_queue = job_queue.into();
        self
    }

    pub fn with_definition(mut self, job_definition: impl Into<String>) -> Self {
        self.job_definition = job_definition.into();
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_status_reason(mut self, reason: impl Into<String>) -> Self {
        self.status_reason = reason.into();
        self
    }

    pub fn with_media_id(mut self, media_id: impl Into<String>) -> Self {
        self.media_id = Some(media_id.into());
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_assembly_id(mut self, assembly_id: impl Into<String>) -> Self {
        self.assembly_id = Some(assembly_id.into());
        self
    }

    pub fn with_workspace_uid(mut self, workspace_uid: impl Into<String>) -> Self {
        self.workspace_uid = Some(workspace_uid.into());
        self
    }

    /// A record can be placed in a latest-state view only with both keys present
    pub fn is_well_formed(&self) -> bool {
        !self.job_id.is_empty() && !self.timestamp.is_empty()
    }

    /// Whether this record replaces `current` as the job's latest state.
    ///
    /// Timestamps compare as ISO-8601 strings; an equal timestamp replaces,
    /// so the record seen last wins a tie.
    pub fn supersedes(&self, current: &JobRecord) -> bool {
        self.timestamp >= current.timestamp
    }

    pub fn job_status(&self) -> JobStatus {
        JobStatus::parse(&self.status)
    }

    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserializes_store_item_layout() {
        let item = json!({
            "jobId": "job-1",
            "timestamp": "2024-12-24T10:00:00Z",
            "status": "RUNNING",
            "jobQueue": "arn:aws:batch:eu-west-1:1:job-queue/orchestrator-standard-pre",
            "jobDefinition": "arn:aws:batch:eu-west-1:1:job-definition/storage-pre-v2:129",
            "jobName": "pre-694a9d57b88940a9e5cd3bee-1766497635776",
            "region": "eu-west-1",
            "statusReason": "Test",
            "media_id": "694a9d57b88940a9e5cd3bee"
        });

        let record: JobRecord = serde_json::from_value(item).unwrap();
        assert_eq!(record.job_id, "job-1");
        assert_eq!(record.job_status(), JobStatus::Running);
        assert_eq!(record.media_id.as_deref(), Some("694a9d57b88940a9e5cd3bee"));
        assert!(record.task_id.is_none());
        assert!(record.is_well_formed());
    }

    #[test]
    fn test_missing_keys_make_record_malformed() {
        let record: JobRecord = serde_json::from_value(json!({"status": "FAILED"})).unwrap();
        assert!(!record.is_well_formed());

        let no_timestamp = JobRecord::new("job-1", "", "FAILED");
        assert!(!no_timestamp.is_well_formed());
    }

    #[test]
    fn test_supersedes_on_newer_or_equal_timestamp() {
        let older = JobRecord::new("job-1", "2024-12-24T10:00:00Z", "RUNNING");
        let newer = JobRecord::new("job-1", "2024-12-24T10:05:00Z", "SUCCEEDED");
        let twin = JobRecord::new("job-1", "2024-12-24T10:05:00Z", "FAILED");

        assert!(newer.supersedes(&older));
        assert!(!older.supersedes(&newer));
        assert!(twin.supersedes(&newer));
    }

    #[test]
    fn test_enrichment_fields_are_omitted_when_absent() {
        let record = JobRecord::new("job-1", "2024-12-24T10:00:00Z", "RUNNING");
        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("media_id").is_none());
        assert!(value.get("fullEvent").is_none());
        assert_eq!(value["jobId"], "job-1");
    }
}
