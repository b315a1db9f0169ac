//! # In-Memory Task Automation
//!
//! Process-local task-automation backend. Every client built for a region
//! shares that region's backend state, so tests can seed tasks, script
//! failures and inspect the calls that reached "the service".
//!
//! The factory records what the ambient surface held while each client was
//! being constructed, and can be told to bind its clients from the ambient
//! region the way constructors that read environment state do.

use crate::client::ambient::AmbientConfig;
use crate::client::traits::{ClientFactory, TaskAutomationClient};
use crate::client::types::{ClientSettings, LaunchRequest, TaskQueryResponse};
use crate::client::{ClientError, ClientResult};
use crate::constants::ambient_keys;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const OP_QUERY: &str = "query_by_filter";
pub const OP_ABORT: &str = "abort_by_id";
pub const OP_MARK_BROKEN: &str = "mark_broken_by_id";
pub const OP_LAUNCH: &str = "launch";
pub const OP_REPAIR_ASSEMBLY: &str = "repair_assembly";

/// A call that reached the in-memory service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCall {
    Query { expression: String },
    Abort { task_id: String },
    MarkBroken { task_id: String },
    Launch(LaunchRequest),
    RepairAssembly { assembly_id: String },
}

impl ClientCall {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Query { .. } => OP_QUERY,
            Self::Abort { .. } => OP_ABORT,
            Self::MarkBroken { .. } => OP_MARK_BROKEN,
            Self::Launch(_) => OP_LAUNCH,
            Self::RepairAssembly { .. } => OP_REPAIR_ASSEMBLY,
        }
    }
}

#[derive(Debug, Default)]
struct BackendState {
    tasks: RwLock<HashMap<String, Value>>,
    calls: Mutex<Vec<ClientCall>>,
    failures: RwLock<HashMap<String, String>>,
    unreachable: RwLock<Option<String>>,
    latency: RwLock<Option<Duration>>,
    launched: AtomicU64,
}

/// Client handle over one region's in-memory backend; clones share the backend
#[derive(Debug, Clone)]
pub struct InMemoryTaskAutomation {
    region: String,
    state: Arc<BackendState>,
}

impl InMemoryTaskAutomation {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            state: Arc::new(BackendState::default()),
        }
    }

    /// Another handle on the same backend, bound to `region`
    fn rebind(&self, region: &str) -> Self {
        Self {
            region: region.to_string(),
            state: self.state.clone(),
        }
    }

    /// Register a task so `eq(task_id,<id>)` queries find it
    pub fn seed_task(&self, task_id: &str, row: Value) {
        self.state.tasks.write().insert(task_id.to_string(), row);
    }

    /// Fail every later call of `operation` with `message`
    pub fn fail_operation(&self, operation: &str, message: &str) {
        self.state
            .failures
            .write()
            .insert(operation.to_string(), message.to_string());
    }

    pub fn clear_failure(&self, operation: &str) {
        self.state.failures.write().remove(operation);
    }

    /// Fail every call as if the service could not be reached
    pub fn set_unreachable(&self, reason: Option<&str>) {
        *self.state.unreachable.write() = reason.map(str::to_string);
    }

    /// Delay every call by `latency`
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.state.latency.write() = latency;
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.state.calls.lock().clone()
    }

    pub fn calls_of(&self, operation: &str) -> usize {
        self.state
            .calls
            .lock()
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    async fn enter(&self, call: ClientCall) -> ClientResult<()> {
        let operation = call.operation();
        self.state.calls.lock().push(call);

        let latency = *self.state.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(reason) = self.state.unreachable.read().clone() {
            return Err(ClientError::remote(
                operation,
                format!("{} endpoint unreachable: {reason}", self.region),
            ));
        }

        if let Some(message) = self.state.failures.read().get(operation).cloned() {
            return Err(ClientError::remote(operation, message));
        }

        Ok(())
    }
}

#[async_trait]
impl TaskAutomationClient for InMemoryTaskAutomation {
    fn region(&self) -> &str {
        &self.region
    }

    async fn query_by_filter(&self, expression: &str) -> ClientResult<TaskQueryResponse> {
        self.enter(ClientCall::Query {
            expression: expression.to_string(),
        })
        .await?;

        let task_id = expression
            .strip_prefix("eq(task_id,")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| {
                ClientError::invalid_response(OP_QUERY, format!("unsupported filter {expression}"))
            })?;

        let data = self
            .state
            .tasks
            .read()
            .get(task_id)
            .cloned()
            .into_iter()
            .collect();

        Ok(TaskQueryResponse::new(data))
    }

    async fn abort_by_id(&self, task_id: &str) -> ClientResult<Value> {
        self.enter(ClientCall::Abort {
            task_id: task_id.to_string(),
        })
        .await?;
        Ok(json!({"task_id": task_id, "status": "aborted"}))
    }

    async fn mark_broken_by_id(&self, task_id: &str) -> ClientResult<Value> {
        self.enter(ClientCall::MarkBroken {
            task_id: task_id.to_string(),
        })
        .await?;
        Ok(json!({"task_id": task_id, "status": "broken"}))
    }

    async fn launch(&self, request: &LaunchRequest) -> ClientResult<Value> {
        self.enter(ClientCall::Launch(request.clone())).await?;
        let sequence = self.state.launched.fetch_add(1, Ordering::AcqRel) + 1;
        Ok(json!({
            "task_id": format!("{:024x}", sequence),
            "task_name": request.task_name,
            "media_id": request.media_id,
            "status": "launched",
        }))
    }

    async fn repair_assembly(&self, assembly_id: &str) -> ClientResult<Value> {
        self.enter(ClientCall::RepairAssembly {
            assembly_id: assembly_id.to_string(),
        })
        .await?;
        Ok(json!({"assembly_id": assembly_id, "status": "repair_requested"}))
    }
}

/// What one construction was asked for and what the ambient surface held meanwhile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructionObservation {
    pub requested: ClientSettings,
    pub ambient_region: Option<String>,
    pub ambient_workspace_uid: Option<String>,
    /// The ambient values did not change while construction was in progress
    pub ambient_stable: bool,
}

impl ConstructionObservation {
    pub fn ambient_matches_request(&self) -> bool {
        self.ambient_stable
            && self.ambient_region.as_deref() == Some(self.requested.region.as_str())
            && self.ambient_workspace_uid.as_deref() == Some(self.requested.workspace_uid.as_str())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryClientFactory {
    backends: DashMap<String, InMemoryTaskAutomation>,
    ambient: Option<Arc<AmbientConfig>>,
    construction_delay: Option<Duration>,
    failing_regions: RwLock<HashMap<String, String>>,
    forced_region: RwLock<Option<String>>,
    constructions: AtomicUsize,
    observations: Mutex<Vec<ConstructionObservation>>,
}

impl InMemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe `ambient` during construction and bind clients to its region
    pub fn reading_ambient(mut self, ambient: Arc<AmbientConfig>) -> Self {
        self.ambient = Some(ambient);
        self
    }

    /// Hold every construction open for `delay`
    pub fn with_construction_delay(mut self, delay: Duration) -> Self {
        self.construction_delay = Some(delay);
        self
    }

    /// Backend for `region`, created empty on first use
    pub fn backend(&self, region: &str) -> InMemoryTaskAutomation {
        self.backends
            .entry(region.to_string())
            .or_insert_with(|| InMemoryTaskAutomation::new(region))
            .clone()
    }

    pub fn fail_construction_for(&self, region: &str, message: &str) {
        self.failing_regions
            .write()
            .insert(region.to_string(), message.to_string());
    }

    pub fn clear_construction_failure(&self, region: &str) {
        self.failing_regions.write().remove(region);
    }

    /// Bind every new client to `region` regardless of the request
    pub fn bind_every_client_to(&self, region: Option<&str>) {
        *self.forced_region.write() = region.map(str::to_string);
    }

    /// Completed and failed constructions
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Acquire)
    }

    pub fn observations(&self) -> Vec<ConstructionObservation> {
        self.observations.lock().clone()
    }

    fn ambient_values(&self) -> (Option<String>, Option<String>) {
        match &self.ambient {
            Some(ambient) => (
                ambient.get(ambient_keys::REGION),
                ambient.get(ambient_keys::WORKSPACE_UID),
            ),
            None => (None, None),
        }
    }
}

#[async_trait]
impl ClientFactory for InMemoryClientFactory {
    async fn create_client(
        &self,
        settings: &ClientSettings,
    ) -> ClientResult<Arc<dyn TaskAutomationClient>> {
        self.constructions.fetch_add(1, Ordering::AcqRel);
        let before = self.ambient_values();

        if let Some(delay) = self.construction_delay {
            tokio::time::sleep(delay).await;
        }

        let (ambient_region, ambient_workspace_uid) = self.ambient_values();
        self.observations.lock().push(ConstructionObservation {
            requested: settings.clone(),
            ambient_stable: before == (ambient_region.clone(), ambient_workspace_uid.clone()),
            ambient_region: ambient_region.clone(),
            ambient_workspace_uid,
        });

        if let Some(message) = self.failing_regions.read().get(&settings.region).cloned() {
            return Err(ClientError::construction(&settings.region, message));
        }

        let bound_region = self
            .forced_region
            .read()
            .clone()
            .or(ambient_region)
            .unwrap_or_else(|| settings.region.clone());

        let client = self.backend(&settings.region).rebind(&bound_region);
        Ok(Arc::new(client))
    }
}
