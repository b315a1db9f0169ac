//! # Remediation Orchestration
//!
//! Composes region-bound task-automation clients into the operator-facing
//! remediation actions (abort, mark broken, restart, restart and mark broken,
//! repair assembly).

pub mod action_orchestrator;

pub use action_orchestrator::ActionOrchestrator;
