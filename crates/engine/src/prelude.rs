//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use dca_engine::prelude::*;
//! ```

// Errors
pub use crate::error::EngineError;

// Pipeline
pub use crate::pipeline::{ExecutionPipeline, ExecutionReport, PipelineConfig, Trigger};

// Provisioning
pub use crate::provisioning::{
    PolicyRegistration, ProvisionedStrategy, ProvisionerConfig, StrategyProvisioner,
};

// Reconciler
pub use crate::reconciler::{LedgerReconciler, ReconcileReport};

// Scheduler
pub use crate::scheduler::{SchedulerConfig, SweepScheduler, SweepSummary};
