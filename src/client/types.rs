//! Request and response types exchanged with the task-automation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Explicit construction parameters for a region-bound client
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientSettings {
    pub region: String,
    pub workspace_uid: String,
}

impl ClientSettings {
    pub fn new(region: impl Into<String>, workspace_uid: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            workspace_uid: workspace_uid.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskQueryResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

impl TaskQueryResponse {
    pub fn new(data: Vec<Value>) -> Self {
        Self { data }
    }

    pub fn first(&self) -> Option<&Value> {
        self.data.first()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Query expression selecting one task by id
pub fn task_id_filter(task_id: &str) -> String {
    format!("eq(task_id,{task_id})")
}

/// The parts of a queried task needed to launch it again
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub task_name: String,
    pub language: Option<String>,
    pub profile_uid: Option<String>,
    pub dest_uid: Option<String>,
    pub prompt_uid: Option<String>,
}

impl TaskDefinition {
    /// Parse a query row. `task_name` falls back to `name`; `None` when neither is set.
    pub fn from_row(row: &Value) -> Option<Self> {
        let task_name = string_field(row, "task_name").or_else(|| string_field(row, "name"))?;

        Some(Self {
            task_name,
            language: string_field(row, "language"),
            profile_uid: string_field(row, "profile_uid"),
            dest_uid: string_field(row, "dest_uid"),
            prompt_uid: string_field(row, "prompt_uid"),
        })
    }

    pub fn launch_request(&self, media_id: &str) -> LaunchRequest {
        LaunchRequest {
            task_name: self.task_name.clone(),
            media_id: media_id.to_string(),
            language: self.language.clone(),
            profile_uid: self.profile_uid.clone(),
            dest_uid: self.dest_uid.clone(),
            prompt_uid: self.prompt_uid.clone(),
        }
    }
}

fn string_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub task_name: String,
    pub media_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_uid: Option<String>,
}
