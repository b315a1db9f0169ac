//! # Client Traits
//!
//! Seams between the core and the remote task-automation service.

use crate::client::types::{ClientSettings, LaunchRequest, TaskQueryResponse};
use crate::client::ClientResult;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Handle bound to one region of the task-automation service
///
/// Implementations are shared between concurrent callers once constructed,
/// so every method takes `&self`.
#[async_trait]
pub trait TaskAutomationClient: Send + Sync {
    /// Region this client issues calls against
    fn region(&self) -> &str;

    /// Query tasks with a filter expression such as `eq(task_id,<id>)`
    ///
    /// # Returns
    ///
    /// * `Ok(TaskQueryResponse)` - Matching rows under `data`, possibly none
    /// * `Err` - The remote call failed
    async fn query_by_filter(&self, expression: &str) -> ClientResult<TaskQueryResponse>;

    async fn abort_by_id(&self, task_id: &str) -> ClientResult<Value>;

    async fn mark_broken_by_id(&self, task_id: &str) -> ClientResult<Value>;

    /// Launch a new task of `request.task_name` for a media item
    async fn launch(&self, request: &LaunchRequest) -> ClientResult<Value>;

    async fn repair_assembly(&self, assembly_id: &str) -> ClientResult<Value>;
}

/// Builds region-bound clients
///
/// The registry calls `create_client` while holding the construction lock and
/// with the ambient region and workspace keys overridden to match `settings`.
/// Implementations may read either source.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    async fn create_client(
        &self,
        settings: &ClientSettings,
    ) -> ClientResult<Arc<dyn TaskAutomationClient>>;
}
