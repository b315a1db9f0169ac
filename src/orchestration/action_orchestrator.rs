//! # Action Orchestrator
//!
//! Runs remediation actions against the task-automation service of one region.
//!
//! Every operation returns a [`RemediationResult`]; registry and remote
//! failures become failed results instead of errors. Remote calls can carry a
//! deadline, and an elapsed deadline is reported like any other remote failure.
//!
//! `restart_and_mark_broken` is the only composite action. Its break step
//! commits a remote change before the restart runs, so a failed restart after
//! a successful break is reported as [`RemediationOutcome::PartiallyApplied`]
//! with the break step's result attached.
//!
//! [`RemediationOutcome::PartiallyApplied`]: crate::models::RemediationOutcome::PartiallyApplied

use crate::client::{
    task_id_filter, ClientError, ClientResult, TaskAutomationClient, TaskDefinition,
};
use crate::logging::log_remediation_operation;
use crate::models::{ActionKind, ActionStep, RemediationAction, RemediationResult, StepResult};
use crate::registry::RegionClientRegistry;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct ActionOrchestrator {
    registry: Arc<RegionClientRegistry>,
    call_timeout: Option<Duration>,
    default_region: Option<String>,
}

impl ActionOrchestrator {
    pub fn new(registry: Arc<RegionClientRegistry>) -> Self {
        Self {
            registry,
            call_timeout: None,
            default_region: None,
        }
    }

    /// Deadline applied to each remote call; `None` waits indefinitely
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Region used when a caller passes an empty one
    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn registry(&self) -> &Arc<RegionClientRegistry> {
        &self.registry
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    /// Run any action; the single dispatch point for UI-selected actions
    pub async fn execute(&self, region: &str, action: &RemediationAction) -> RemediationResult {
        match action {
            RemediationAction::Abort { task_id } => self.abort(task_id, region).await,
            RemediationAction::MarkBroken { task_id } => self.mark_broken(task_id, region).await,
            RemediationAction::Restart { task_id, media_id } => {
                self.restart(task_id, media_id, region).await
            }
            RemediationAction::RestartAndMarkBroken { task_id, media_id } => {
                self.restart_and_mark_broken(task_id, media_id, region).await
            }
            RemediationAction::RepairAssembly { assembly_id } => {
                self.repair_assembly(assembly_id, region).await
            }
        }
    }

    pub async fn abort(&self, task_id: &str, region: &str) -> RemediationResult {
        self.single_call(ActionKind::Abort, ActionStep::Abort, task_id, region, |client| {
            let task_id = task_id.to_string();
            async move { client.abort_by_id(&task_id).await }
        })
        .await
    }

    pub async fn mark_broken(&self, task_id: &str, region: &str) -> RemediationResult {
        self.single_call(
            ActionKind::MarkBroken,
            ActionStep::MarkBroken,
            task_id,
            region,
            |client| {
                let task_id = task_id.to_string();
                async move { client.mark_broken_by_id(&task_id).await }
            },
        )
        .await
    }

    pub async fn repair_assembly(&self, assembly_id: &str, region: &str) -> RemediationResult {
        self.single_call(
            ActionKind::RepairAssembly,
            ActionStep::RepairAssembly,
            assembly_id,
            region,
            |client| {
                let assembly_id = assembly_id.to_string();
                async move { client.repair_assembly(&assembly_id).await }
            },
        )
        .await
    }

    /// Query the task's definition, then launch it again for `media_id`
    pub async fn restart(&self, task_id: &str, media_id: &str, region: &str) -> RemediationResult {
        let kind = ActionKind::Restart;
        let region = self.resolve_region(region);

        if let Some(result) = self.reject_blank(kind, &region, task_id, "task id") {
            return result;
        }

        let client = match self.client_for(kind, &region).await {
            Ok(client) => client,
            Err(result) => return self.finish(result, task_id),
        };

        let mut steps = Vec::new();
        let result = match self.relaunch(client.as_ref(), task_id, media_id, &mut steps).await {
            Ok(launched) => RemediationResult::succeeded(kind, region, launched, steps),
            Err(message) => RemediationResult::failed(kind, region, message, steps),
        };

        self.finish(result, task_id)
    }

    /// Mark the task broken and, only if that worked, restart it
    pub async fn restart_and_mark_broken(
        &self,
        task_id: &str,
        media_id: &str,
        region: &str,
    ) -> RemediationResult {
        let kind = ActionKind::RestartAndMarkBroken;
        let region = self.resolve_region(region);

        if let Some(result) = self.reject_blank(kind, &region, task_id, "task id") {
            return result;
        }

        let client = match self.client_for(kind, &region).await {
            Ok(client) => client,
            Err(result) => return self.finish(result, task_id),
        };

        let mut steps = Vec::new();

        let broken = match self
            .guarded("mark_broken_by_id", client.mark_broken_by_id(task_id))
            .await
        {
            Ok(payload) => {
                steps.push(StepResult::succeeded(ActionStep::MarkBroken, payload.clone()));
                payload
            }
            Err(error) => {
                steps.push(StepResult::failed(ActionStep::MarkBroken, error.to_string()));
                let result = RemediationResult::failed(
                    kind,
                    region,
                    format!("Mark broken failed for task {task_id}: {error}"),
                    steps,
                );
                return self.finish(result, task_id);
            }
        };

        let result = match self.relaunch(client.as_ref(), task_id, media_id, &mut steps).await {
            Ok(launched) => RemediationResult::succeeded(
                kind,
                region,
                json!({"break": broken, "restart": launched}),
                steps,
            ),
            Err(message) => {
                warn!(
                    task_id = %task_id,
                    region = %region,
                    "Task marked broken but restart failed; manual follow-up required"
                );
                RemediationResult::partially_applied(
                    kind,
                    region,
                    format!("Task {task_id} was marked broken but restart failed: {message}"),
                    steps,
                )
            }
        };

        self.finish(result, task_id)
    }

    async fn relaunch(
        &self,
        client: &dyn TaskAutomationClient,
        task_id: &str,
        media_id: &str,
        steps: &mut Vec<StepResult>,
    ) -> Result<Value, String> {
        let response = match self
            .guarded("query_by_filter", client.query_by_filter(&task_id_filter(task_id)))
            .await
        {
            Ok(response) => response,
            Err(error) => {
                steps.push(StepResult::failed(ActionStep::QueryTask, error.to_string()));
                return Err(format!("Failed to query task {task_id}: {error}"));
            }
        };

        let Some(row) = response.first() else {
            let message = format!("Task {task_id} not found");
            steps.push(StepResult::failed(ActionStep::QueryTask, message.clone()));
            return Err(message);
        };

        let Some(definition) = TaskDefinition::from_row(row) else {
            let message = format!("Task {task_id} is missing task name");
            steps.push(StepResult::failed(ActionStep::QueryTask, message.clone()));
            return Err(message);
        };

        steps.push(StepResult::succeeded(ActionStep::QueryTask, row.clone()));
        debug!(
            task_id = %task_id,
            task_name = %definition.task_name,
            media_id = %media_id,
            "Relaunching task"
        );

        let request = definition.launch_request(media_id);
        match self.guarded("launch", client.launch(&request)).await {
            Ok(launched) => {
                steps.push(StepResult::succeeded(ActionStep::Launch, launched.clone()));
                Ok(launched)
            }
            Err(error) => {
                steps.push(StepResult::failed(ActionStep::Launch, error.to_string()));
                Err(format!(
                    "Failed to launch {} for media {media_id}: {error}",
                    definition.task_name
                ))
            }
        }
    }

    async fn single_call<F, Fut>(
        &self,
        kind: ActionKind,
        step: ActionStep,
        target_id: &str,
        region: &str,
        call: F,
    ) -> RemediationResult
    where
        F: FnOnce(Arc<dyn TaskAutomationClient>) -> Fut,
        Fut: Future<Output = ClientResult<Value>> + Send,
    {
        let region = self.resolve_region(region);

        let label = match step {
            ActionStep::RepairAssembly => "assembly id",
            _ => "task id",
        };
        if let Some(result) = self.reject_blank(kind, &region, target_id, label) {
            return result;
        }

        let client = match self.client_for(kind, &region).await {
            Ok(client) => client,
            Err(result) => return self.finish(result, target_id),
        };

        let result = match self.guarded(&step.to_string(), call(client)).await {
            Ok(payload) => RemediationResult::succeeded(
                kind,
                region,
                payload.clone(),
                vec![StepResult::succeeded(step, payload)],
            ),
            Err(error) => RemediationResult::failed(
                kind,
                region,
                format!("{kind} failed for {target_id}: {error}"),
                vec![StepResult::failed(step, error.to_string())],
            ),
        };

        self.finish(result, target_id)
    }

    /// Apply the configured deadline to one remote call
    async fn guarded<T, Fut>(&self, operation: &str, call: Fut) -> ClientResult<T>
    where
        Fut: Future<Output = ClientResult<T>> + Send,
    {
        match self.call_timeout {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| ClientError::timeout(operation, deadline.as_millis() as u64))?,
            None => call.await,
        }
    }

    async fn client_for(
        &self,
        kind: ActionKind,
        region: &str,
    ) -> Result<Arc<dyn TaskAutomationClient>, RemediationResult> {
        self.registry.get_client(region).await.map_err(|error| {
            RemediationResult::failed(
                kind,
                region,
                format!("Task automation unavailable for region {region}: {error}"),
                Vec::new(),
            )
        })
    }

    fn resolve_region(&self, region: &str) -> String {
        let region = region.trim();
        match (&self.default_region, region.is_empty()) {
            (Some(default_region), true) => default_region.clone(),
            _ => region.to_string(),
        }
    }

    fn reject_blank(
        &self,
        kind: ActionKind,
        region: &str,
        value: &str,
        label: &str,
    ) -> Option<RemediationResult> {
        if !value.trim().is_empty() {
            return None;
        }
        let result =
            RemediationResult::failed(kind, region, format!("{kind} requires a {label}"), Vec::new());
        Some(self.finish(result, value))
    }

    fn finish(&self, result: RemediationResult, target_id: &str) -> RemediationResult {
        let status = if result.success {
            "succeeded"
        } else if result.requires_follow_up() {
            "partially_applied"
        } else {
            "failed"
        };

        log_remediation_operation(
            result.action.as_str(),
            &result.region,
            target_id,
            status,
            result.error_message.as_deref(),
        );

        result
    }
}
