//! # System Constants
//!
//! Sentinels, defaults, ambient configuration keys and the job
//! status vocabulary reported by the job-orchestration service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display sentinel for fields that could not be read or derived
pub const UNKNOWN: &str = "Unknown";

/// Default record store table written by the ingester
pub const DEFAULT_TABLE_NAME: &str = "MonitoringToolTest";

/// Default region for both the record store and remediation calls
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Default deadline for a single remote task-automation call
pub const DEFAULT_REMOTE_CALL_TIMEOUT_MS: u64 = 30_000;

/// Keys of the process-wide configuration surface read by client constructors
pub mod ambient_keys {
    pub const REGION: &str = "AWS_REGION";
    pub const DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
    pub const WORKSPACE_UID: &str = "WORKSPACE_UID";

    /// Every key a client construction overrides
    pub const CONSTRUCTION_KEYS: [&str; 3] = [REGION, DEFAULT_REGION, WORKSPACE_UID];
}

/// Job status as reported by the job-orchestration service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Submitted,
    Pending,
    Runnable,
    Starting,
    Running,
    Succeeded,
    Failed,
    /// Any status string this crate does not model
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "SUBMITTED" => Self::Submitted,
            "PENDING" => Self::Pending,
            "RUNNABLE" => Self::Runnable,
            "STARTING" => Self::Starting,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Pending => "PENDING",
            Self::Runnable => "RUNNABLE",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }

    /// Statuses counted as "running" in job statistics
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Runnable | Self::Starting | Self::Running)
    }
}

impl From<String> for JobStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
