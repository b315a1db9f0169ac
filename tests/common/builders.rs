//! Test data builders shared by the integration tests.

#![allow(dead_code)] // Each test binary uses a different subset

use batch_monitor::client::{AmbientConfig, InMemoryClientFactory};
use batch_monitor::config::MonitorConfig;
use batch_monitor::models::JobRecord;
use batch_monitor::registry::RegionClientRegistry;
use batch_monitor::service::MonitoringService;
use batch_monitor::store::{InMemoryRecordStore, RecordStore, WriteMode};
use serde_json::{json, Value};
use std::sync::Arc;

pub const WORKSPACE: &str = "pre";
pub const EU_WEST: &str = "eu-west-1";
pub const US_EAST: &str = "us-east-1";
pub const TASK_ID: &str = "69490f5fc05fb78da7b7380f";
pub const ASSEMBLY_ID: &str = "694916fc74feae014064b737";

/// Builder for job records with realistic queue and definition ARNs
pub struct JobRecordBuilder {
    record: JobRecord,
}

impl JobRecordBuilder {
    pub fn new(job_id: &str, timestamp: &str) -> Self {
        Self {
            record: JobRecord::new(job_id, timestamp, "SUBMITTED").with_region(EU_WEST),
        }
    }

    pub fn status(mut self, status: &str) -> Self {
        self.record.status = status.to_string();
        self
    }

    pub fn job_name(mut self, job_name: &str) -> Self {
        self.record.job_name = job_name.to_string();
        self
    }

    pub fn queue(mut self, queue_name: &str) -> Self {
        self.record.job_queue =
            format!("arn:aws:batch:eu-west-1:388659957718:job-queue/{queue_name}");
        self
    }

    pub fn definition(mut self, definition: &str, revision: u32) -> Self {
        self.record.job_definition =
            format!("arn:aws:batch:eu-west-1:388659957718:job-definition/{definition}:{revision}");
        self
    }

    pub fn task_id(mut self, task_id: &str) -> Self {
        self.record.task_id = Some(task_id.to_string());
        self
    }

    pub fn build(self) -> JobRecord {
        self.record
    }
}

pub async fn seeded_store(
    records: Vec<JobRecord>,
    mode: WriteMode,
    page_size: usize,
) -> Arc<InMemoryRecordStore> {
    let store = Arc::new(
        InMemoryRecordStore::new("MonitoringToolTest", EU_WEST, mode).with_page_size(page_size),
    );
    for record in records {
        store.put(record).await.expect("seed record");
    }
    store
}

/// Factory whose clients bind from the ambient region, sharing `ambient`
pub fn ambient_reading_factory(ambient: &Arc<AmbientConfig>) -> Arc<InMemoryClientFactory> {
    Arc::new(InMemoryClientFactory::new().reading_ambient(ambient.clone()))
}

pub fn registry(
    factory: Arc<InMemoryClientFactory>,
    ambient: Arc<AmbientConfig>,
) -> Arc<RegionClientRegistry> {
    Arc::new(RegionClientRegistry::new(
        Some(WORKSPACE.to_string()),
        factory,
        ambient,
    ))
}

pub fn service(
    store: Arc<InMemoryRecordStore>,
    factory: Arc<InMemoryClientFactory>,
) -> MonitoringService {
    let config = MonitorConfig {
        workspace_uid: Some(WORKSPACE.to_string()),
        ..MonitorConfig::default()
    };
    MonitoringService::from_config_with_ambient(
        &config,
        store,
        factory,
        Arc::new(AmbientConfig::new()),
    )
}

/// A job-state-change event as delivered by the event bus
pub fn batch_event(job_id: &str, time: &str, status: &str, job_name: &str, command: &[&str]) -> Value {
    json!({
        "version": "0",
        "id": format!("event-{job_id}-{time}"),
        "detail-type": "Batch Job State Change",
        "source": "aws.batch",
        "account": "388659957718",
        "time": time,
        "region": EU_WEST,
        "detail": {
            "jobId": job_id,
            "jobName": job_name,
            "status": status,
            "jobQueue": "arn:aws:batch:eu-west-1:388659957718:job-queue/orchestrator-ingest-pre",
            "jobDefinition": "arn:aws:batch:eu-west-1:388659957718:job-definition/ingest-pre:7",
            "statusReason": "",
            "container": {"command": command}
        }
    })
}
