//! # Remediation Types
//!
//! The closed set of remediation actions an operator can trigger, and the
//! result value every action produces. Failures are carried inside
//! `RemediationResult`; nothing here is an error type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Fieldless action name, as selected in an operator UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Abort,
    MarkBroken,
    Restart,
    RestartAndMarkBroken,
    RepairAssembly,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        Self::Abort,
        Self::MarkBroken,
        Self::Restart,
        Self::RestartAndMarkBroken,
        Self::RepairAssembly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abort => "abort",
            Self::MarkBroken => "mark_broken",
            Self::Restart => "restart",
            Self::RestartAndMarkBroken => "restart_and_mark_broken",
            Self::RepairAssembly => "repair_assembly",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "abort" => Ok(Self::Abort),
            "mark_broken" | "mark_as_broken" | "break" => Ok(Self::MarkBroken),
            "restart" | "retry" => Ok(Self::Restart),
            "restart_and_mark_broken" | "restart_and_break" => Ok(Self::RestartAndMarkBroken),
            "repair_assembly" | "repair" => Ok(Self::RepairAssembly),
            _ => Err(format!("Invalid remediation action: {s}")),
        }
    }
}

/// A remediation request with the identifiers the action needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RemediationAction {
    Abort { task_id: String },
    MarkBroken { task_id: String },
    Restart { task_id: String, media_id: String },
    RestartAndMarkBroken { task_id: String, media_id: String },
    RepairAssembly { assembly_id: String },
}

impl RemediationAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Abort { .. } => ActionKind::Abort,
            Self::MarkBroken { .. } => ActionKind::MarkBroken,
            Self::Restart { .. } => ActionKind::Restart,
            Self::RestartAndMarkBroken { .. } => ActionKind::RestartAndMarkBroken,
            Self::RepairAssembly { .. } => ActionKind::RepairAssembly,
        }
    }

    /// The task or assembly the action targets
    pub fn target_id(&self) -> &str {
        match self {
            Self::Abort { task_id }
            | Self::MarkBroken { task_id }
            | Self::Restart { task_id, .. }
            | Self::RestartAndMarkBroken { task_id, .. } => task_id,
            Self::RepairAssembly { assembly_id } => assembly_id,
        }
    }
}

/// One remote call inside an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStep {
    Abort,
    MarkBroken,
    QueryTask,
    Launch,
    RepairAssembly,
}

impl fmt::Display for ActionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Abort => "abort",
            Self::MarkBroken => "mark_broken",
            Self::QueryTask => "query_task",
            Self::Launch => "launch",
            Self::RepairAssembly => "repair_assembly",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step: ActionStep,
    pub success: bool,
    pub payload: Option<Value>,
    pub error_message: Option<String>,
}

impl StepResult {
    pub fn succeeded(step: ActionStep, payload: Value) -> Self {
        Self {
            step,
            success: true,
            payload: Some(payload),
            error_message: None,
        }
    }

    pub fn failed(step: ActionStep, error_message: impl Into<String>) -> Self {
        Self {
            step,
            success: false,
            payload: None,
            error_message: Some(error_message.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemediationOutcome {
    Succeeded,
    /// Nothing was changed remotely, or the only change attempted failed
    Failed,
    /// An earlier step committed a remote change before a later step failed;
    /// the operator may need to follow up by hand
    PartiallyApplied,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationResult {
    pub action: ActionKind,
    pub region: String,
    pub outcome: RemediationOutcome,
    pub success: bool,
    pub payload: Option<Value>,
    pub error_message: Option<String>,
    /// Sub-results in execution order; steps never attempted are absent
    pub step_results: Vec<StepResult>,
}

impl RemediationResult {
    pub fn succeeded(
        action: ActionKind,
        region: impl Into<String>,
        payload: Value,
        step_results: Vec<StepResult>,
    ) -> Self {
        Self {
            action,
            region: region.into(),
            outcome: RemediationOutcome::Succeeded,
            success: true,
            payload: Some(payload),
            error_message: None,
            step_results,
        }
    }

    pub fn failed(
        action: ActionKind,
        region: impl Into<String>,
        error_message: impl Into<String>,
        step_results: Vec<StepResult>,
    ) -> Self {
        Self {
            action,
            region: region.into(),
            outcome: RemediationOutcome::Failed,
            success: false,
            payload: None,
            error_message: Some(error_message.into()),
            step_results,
        }
    }

    pub fn partially_applied(
        action: ActionKind,
        region: impl Into<String>,
        error_message: impl Into<String>,
        step_results: Vec<StepResult>,
    ) -> Self {
        Self {
            outcome: RemediationOutcome::PartiallyApplied,
            ..Self::failed(action, region, error_message, step_results)
        }
    }

    pub fn step(&self, step: ActionStep) -> Option<&StepResult> {
        self.step_results.iter().find(|result| result.step == step)
    }

    pub fn completed_steps(&self) -> impl Iterator<Item = ActionStep> + '_ {
        self.step_results
            .iter()
            .filter(|result| result.success)
            .map(|result| result.step)
    }

    pub fn requires_follow_up(&self) -> bool {
        self.outcome == RemediationOutcome::PartiallyApplied
    }
}
