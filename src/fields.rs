//! # Field Extraction
//!
//! Pure functions deriving display fields from raw job records. Nothing here
//! holds state; every function is safe to call from any number of callers.
//!
//! Enrichment fields written by the ingester (`media_id`, `task_id`,
//! `assembly_id`, `workspace_uid`) always win over anything derived from the
//! job name. The name heuristics exist for records written before enrichment.
//!
//! ## Job name heuristics
//!
//! Task-automation identifiers are 24-character hexadecimal object ids embedded
//! as one hyphen-delimited token of the job name:
//!
//! ```text
//! pre-69490f5fc05fb78da7b7380f-1766395755577
//! assembly-pre-no_output_4-694916fc74feae014064b737-zip_package-114sec
//! ```
//!
//! This depends entirely on the submitter's naming convention. A renamed job,
//! a second hex token placed earlier in the name, or an identifier format change
//! silently breaks the derivation; enrichment fields do not have that problem.

use crate::constants::UNKNOWN;
use crate::models::JobRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an object id token
pub const OBJECT_ID_LEN: usize = 24;

/// First-token values that name a task type, never a workspace
pub const NON_WORKSPACE_PREFIXES: [&str; 6] = [
    "assembly",
    "orchestrator",
    "storage",
    "ingest",
    "text",
    "repair",
];

/// Human-readable task category of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    Ingest,
    Assembly,
    TextRecognition,
    Storage,
    /// No rule matched; carries the raw queue or definition name
    Other(String),
    Unknown,
}

impl TaskType {
    pub fn label(&self) -> &str {
        match self {
            Self::Ingest => "Ingest",
            Self::Assembly => "Assembly (Zip Package)",
            Self::TextRecognition => "Text Recognition",
            Self::Storage => "Storage",
            Self::Other(name) => name,
            Self::Unknown => UNKNOWN,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which raw name a rule inspects
#[derive(Debug, Clone, Copy)]
enum RuleSource {
    Queue,
    Definition,
}

struct TaskTypeRule {
    source: RuleSource,
    /// Every fragment must be present
    all_of: &'static [&'static str],
    /// At least one fragment must be present; ignored when empty
    any_of: &'static [&'static str],
    task_type: fn() -> TaskType,
}

impl TaskTypeRule {
    fn matches(&self, haystack: &str) -> bool {
        self.all_of.iter().all(|needle| haystack.contains(needle))
            && (self.any_of.is_empty() || self.any_of.iter().any(|needle| haystack.contains(needle)))
    }
}

// Queue rules come first; first match wins.
const TASK_TYPE_RULES: &[TaskTypeRule] = &[
    TaskTypeRule {
        source: RuleSource::Queue,
        all_of: &["orchestrator", "ingest"],
        any_of: &[],
        task_type: || TaskType::Ingest,
    },
    TaskTypeRule {
        source: RuleSource::Queue,
        all_of: &["assembly"],
        any_of: &[],
        task_type: || TaskType::Assembly,
    },
    TaskTypeRule {
        source: RuleSource::Queue,
        all_of: &[],
        any_of: &["text-recognition", "text_recognition"],
        task_type: || TaskType::TextRecognition,
    },
    TaskTypeRule {
        source: RuleSource::Definition,
        all_of: &["storage"],
        any_of: &[],
        task_type: || TaskType::Storage,
    },
    TaskTypeRule {
        source: RuleSource::Definition,
        all_of: &["assembly"],
        any_of: &[],
        task_type: || TaskType::Assembly,
    },
    TaskTypeRule {
        source: RuleSource::Definition,
        all_of: &["text", "recognition"],
        any_of: &[],
        task_type: || TaskType::TextRecognition,
    },
    TaskTypeRule {
        source: RuleSource::Definition,
        all_of: &[],
        any_of: &["ingest", "orchestrator"],
        task_type: || TaskType::Ingest,
    },
];

fn is_known(name: &str) -> bool {
    !name.is_empty() && name != UNKNOWN
}

/// Classify a job from its queue name and job definition name
pub fn derive_task_type(queue_name: &str, job_definition_name: &str) -> TaskType {
    let queue = queue_name.to_lowercase();
    let definition = job_definition_name.to_lowercase();

    let matched = TASK_TYPE_RULES.iter().find(|rule| match rule.source {
        RuleSource::Queue => rule.matches(&queue),
        RuleSource::Definition => rule.matches(&definition),
    });

    if let Some(rule) = matched {
        return (rule.task_type)();
    }

    if is_known(queue_name) {
        TaskType::Other(queue_name.to_string())
    } else if is_known(job_definition_name) {
        TaskType::Other(job_definition_name.to_string())
    } else {
        TaskType::Unknown
    }
}

/// Queue name from a queue ARN (`arn:...:job-queue/<name>`)
pub fn extract_queue_name(queue_arn: &str) -> String {
    if queue_arn.is_empty() {
        return UNKNOWN.to_string();
    }
    match queue_arn.rsplit_once('/') {
        Some((_, name)) => name.to_string(),
        None => queue_arn.to_string(),
    }
}

/// Definition name from a definition ARN (`arn:...:job-definition/<name>:<revision>`)
pub fn extract_job_definition_name(definition_arn: &str) -> String {
    if definition_arn.is_empty() {
        return UNKNOWN.to_string();
    }
    match definition_arn.rsplit_once('/') {
        Some((_, name_revision)) => name_revision
            .split_once(':')
            .map_or(name_revision, |(name, _)| name)
            .to_string(),
        None => definition_arn.to_string(),
    }
}

/// A 24-character hexadecimal token, case-insensitive
pub fn is_object_id(token: &str) -> bool {
    token.len() == OBJECT_ID_LEN && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// First object-id token in a hyphen-delimited job name
pub fn find_object_id(job_name: &str) -> Option<&str> {
    job_name.split('-').find(|token| is_object_id(token))
}

/// Task id embedded in a job name, see the module docs for the naming assumption
pub fn derive_task_id(job_name: &str) -> Option<String> {
    find_object_id(job_name).map(str::to_string)
}

/// Workspace uid from the first job name token, unless that token names a task type
pub fn derive_workspace_uid(job_name: &str) -> Option<String> {
    let first = job_name.split('-').next()?;
    if first.is_empty() || is_object_id(first) {
        return None;
    }

    let lowered = first.to_lowercase();
    if NON_WORKSPACE_PREFIXES.contains(&lowered.as_str()) {
        return None;
    }

    Some(first.to_string())
}

pub fn is_assembly_job(job_name: &str) -> bool {
    job_name.starts_with("assembly-")
}

/// Display row for one job, ready for a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFields {
    pub job_id: String,
    pub job_name: String,
    pub status: String,
    pub region: String,
    pub timestamp: String,
    pub status_reason: String,
    pub queue: String,
    pub job_definition: String,
    pub task_type: TaskType,
    pub task_id: String,
    pub media_id: String,
    pub workspace_uid: String,
    pub assembly_id: Option<String>,
}

impl JobFields {
    pub fn from_record(record: &JobRecord) -> Self {
        let queue = extract_queue_name(&record.job_queue);
        let job_definition = extract_job_definition_name(&record.job_definition);
        let task_type = derive_task_type(&queue, &job_definition);

        let task_id = non_empty(&record.task_id)
            .map(str::to_string)
            .or_else(|| derive_task_id(&record.job_name))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let media_id = non_empty(&record.media_id)
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN.to_string());

        let workspace_uid = non_empty(&record.workspace_uid)
            .map(str::to_string)
            .or_else(|| derive_workspace_uid(&record.job_name))
            .unwrap_or_else(|| UNKNOWN.to_string());

        let assembly_id = non_empty(&record.assembly_id)
            .map(str::to_string)
            .or_else(|| {
                is_assembly_job(&record.job_name)
                    .then(|| derive_task_id(&record.job_name))
                    .flatten()
            });

        Self {
            job_id: record.job_id.clone(),
            job_name: record.job_name.clone(),
            status: record.status.clone(),
            region: record.region.clone(),
            timestamp: record.timestamp.clone(),
            status_reason: record.status_reason.clone(),
            queue,
            job_definition,
            task_type,
            task_id,
            media_id,
            workspace_uid,
            assembly_id,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
