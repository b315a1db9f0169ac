//! # Monitoring Service
//!
//! The surface the presentation layer calls: latest-state loads, job history,
//! statistics, a connection test and the remediation actions.
//!
//! Reads return `Result`; remediation always returns a [`RemediationResult`].
//!
//! ```rust
//! use batch_monitor::client::{AmbientConfig, InMemoryClientFactory};
//! use batch_monitor::config::MonitorConfig;
//! use batch_monitor::models::JobRecord;
//! use batch_monitor::service::MonitoringService;
//! use batch_monitor::store::{InMemoryRecordStore, RecordStore, WriteMode};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MonitorConfig {
//!     workspace_uid: Some("pre".to_string()),
//!     ..MonitorConfig::default()
//! };
//! let store = Arc::new(InMemoryRecordStore::new("jobs", "eu-west-1", WriteMode::History));
//! store.put(JobRecord::new("job-1", "2024-12-24T10:00:00Z", "FAILED")).await?;
//!
//! let service = MonitoringService::from_config_with_ambient(
//!     &config,
//!     store,
//!     Arc::new(InMemoryClientFactory::new()),
//!     Arc::new(AmbientConfig::new()),
//! );
//!
//! let view = service.load_latest_jobs().await?;
//! assert_eq!(view.len(), 1);
//! assert!(service.is_actions_available());
//! # Ok(())
//! # }
//! ```

use crate::client::{AmbientConfig, ClientFactory};
use crate::config::MonitorConfig;
use crate::error::Result;
use crate::fields::JobFields;
use crate::models::{
    JobRecord, JobStatistics, LatestJobView, RecordFilter, RemediationAction, RemediationResult,
};
use crate::orchestration::ActionOrchestrator;
use crate::reducer::reduce_store;
use crate::registry::{Availability, RegionClientRegistry};
use crate::store::{RecordStore, StoreHealth};
use std::sync::Arc;
use tracing::info;

pub struct MonitoringService {
    store: Arc<dyn RecordStore>,
    orchestrator: ActionOrchestrator,
}

impl MonitoringService {
    pub fn new(store: Arc<dyn RecordStore>, orchestrator: ActionOrchestrator) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Wire a service sharing the process-wide ambient surface
    pub fn from_config(
        config: &MonitorConfig,
        store: Arc<dyn RecordStore>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        Self::from_config_with_ambient(config, store, factory, AmbientConfig::global())
    }

    pub fn from_config_with_ambient(
        config: &MonitorConfig,
        store: Arc<dyn RecordStore>,
        factory: Arc<dyn ClientFactory>,
        ambient: Arc<AmbientConfig>,
    ) -> Self {
        let registry = Arc::new(RegionClientRegistry::new(
            config.workspace_uid.clone(),
            factory,
            ambient,
        ));

        let orchestrator = ActionOrchestrator::new(registry)
            .with_call_timeout(config.remote_call_timeout())
            .with_default_region(config.default_region.clone());

        info!(
            table_name = %config.table_name,
            store_region = %config.store_region,
            default_region = %config.default_region,
            actions_available = config.workspace_uid.is_some(),
            "Monitoring service configured"
        );

        Self::new(store, orchestrator)
    }

    pub fn registry(&self) -> &Arc<RegionClientRegistry> {
        self.orchestrator.registry()
    }

    pub fn orchestrator(&self) -> &ActionOrchestrator {
        &self.orchestrator
    }

    /// Current state of every job, rebuilt from the full store on each call
    pub async fn load_latest_jobs(&self) -> Result<LatestJobView> {
        Ok(reduce_store(self.store.as_ref(), None).await?)
    }

    /// Latest state of the jobs whose *current* record matches `filter`
    ///
    /// The filter is applied after reduction. Filtering the raw scan instead
    /// would surface an older matching record of a job whose latest state no
    /// longer matches.
    pub async fn load_latest_jobs_matching(&self, filter: &RecordFilter) -> Result<LatestJobView> {
        let view = self.load_latest_jobs().await?;
        if filter.is_empty() {
            return Ok(view);
        }

        let stats = view.stats();
        let jobs = view
            .into_iter()
            .filter(|(_, record)| filter.matches(record))
            .collect();
        Ok(LatestJobView::from_parts(jobs, stats))
    }

    /// Display rows for the latest jobs matching `filter`, newest first
    pub async fn latest_job_rows(&self, filter: &RecordFilter) -> Result<Vec<JobFields>> {
        let view = self.load_latest_jobs_matching(filter).await?;
        Ok(view
            .sorted_by_recency()
            .into_iter()
            .map(JobFields::from_record)
            .collect())
    }

    /// Every stored state of one job, oldest first
    pub async fn get_job_history(&self, job_id: &str) -> Result<Vec<JobRecord>> {
        Ok(self.store.history(job_id).await?)
    }

    pub async fn statistics(&self) -> Result<JobStatistics> {
        let view = self.load_latest_jobs().await?;
        Ok(JobStatistics::from_view(&view))
    }

    pub async fn test_connection(&self) -> Result<StoreHealth> {
        Ok(self.store.ping().await?)
    }

    pub fn actions_availability(&self) -> Availability {
        self.registry().availability()
    }

    pub fn is_actions_available(&self) -> bool {
        self.registry().is_available()
    }

    pub async fn execute(&self, region: &str, action: &RemediationAction) -> RemediationResult {
        self.orchestrator.execute(region, action).await
    }

    pub async fn abort(&self, task_id: &str, region: &str) -> RemediationResult {
        self.orchestrator.abort(task_id, region).await
    }

    pub async fn mark_broken(&self, task_id: &str, region: &str) -> RemediationResult {
        self.orchestrator.mark_broken(task_id, region).await
    }

    pub async fn restart(&self, task_id: &str, media_id: &str, region: &str) -> RemediationResult {
        self.orchestrator.restart(task_id, media_id, region).await
    }

    pub async fn restart_and_mark_broken(
        &self,
        task_id: &str,
        media_id: &str,
        region: &str,
    ) -> RemediationResult {
        self.orchestrator
            .restart_and_mark_broken(task_id, media_id, region)
            .await
    }

    pub async fn repair_assembly(&self, assembly_id: &str, region: &str) -> RemediationResult {
        self.orchestrator.repair_assembly(assembly_id, region).await
    }
}
