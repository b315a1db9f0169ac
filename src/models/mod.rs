//! # Data Model
//!
//! Job records as stored by the ingester, the reduced latest-state view, filters,
//! statistics and remediation result types.

pub mod job_record;
pub mod job_statistics;
pub mod latest_view;
pub mod record_filter;
pub mod remediation;

pub use job_record::JobRecord;
pub use job_statistics::JobStatistics;
pub use latest_view::{LatestJobView, ReductionStats};
pub use record_filter::RecordFilter;
pub use remediation::{
    ActionKind, ActionStep, RemediationAction, RemediationOutcome, RemediationResult, StepResult,
};
