//! The periodic sweep scheduler.
//!
//! A single cooperative sweep drives all due strategies; there are no
//! per-strategy timers. Each tick loads active strategies whose
//! `next_execution` has passed and pushes each through the pipeline
//! independently. A rejected or downstream-failed attempt leaves
//! `next_execution` untouched, so it is retried on the very next tick
//! rather than waiting out a full cadence period.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use dca_data::store::StrategyStore;

use crate::error::EngineError;
use crate::pipeline::{ExecutionPipeline, ExecutionReport};

/// Configuration for the sweep scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed tick between sweeps.
    pub tick: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(60),
        }
    }
}

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub executed: u32,
    pub rejected: u32,
    pub failed_downstream: u32,
    pub errors: u32,
}

/// Periodic sweep over due strategies.
pub struct SweepScheduler {
    store: Arc<dyn StrategyStore>,
    pipeline: Arc<ExecutionPipeline>,
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
}

impl SweepScheduler {
    pub fn new(
        store: Arc<dyn StrategyStore>,
        pipeline: Arc<ExecutionPipeline>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            pipeline,
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Runs sweep ticks until `stop` is called.
    pub async fn run(&self) {
        self.running.store(true, Ordering::SeqCst);

        info!(
            tick_secs = self.config.tick.as_secs(),
            "starting sweep scheduler"
        );

        let mut ticker = interval(self.config.tick);

        while self.running.load(Ordering::SeqCst) {
            ticker.tick().await;

            match self.sweep(Utc::now()).await {
                Ok(summary) => {
                    if summary != SweepSummary::default() {
                        debug!(
                            executed = summary.executed,
                            rejected = summary.rejected,
                            failed_downstream = summary.failed_downstream,
                            errors = summary.errors,
                            "sweep tick complete"
                        );
                    }
                }
                Err(err) => error!(error = %err, "sweep tick failed"),
            }
        }

        info!("sweep scheduler stopped");
    }

    /// Stops the scheduler after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// One sweep pass over every due strategy.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepSummary, EngineError> {
        let due = self.store.list_due(now).await?;
        let mut summary = SweepSummary::default();

        for strategy in due {
            match self.pipeline.execute_scheduled(strategy.id, now).await {
                Ok(ExecutionReport::Executed { .. }) => summary.executed += 1,
                Ok(ExecutionReport::Rejected { reason }) => {
                    summary.rejected += 1;
                    debug!(strategy = %strategy.id, reason = %reason, "sweep attempt rejected");
                }
                Ok(ExecutionReport::FailedDownstream { detail }) => {
                    summary.failed_downstream += 1;
                    debug!(strategy = %strategy.id, detail = %detail, "sweep attempt failed downstream");
                }
                Err(err) => {
                    summary.errors += 1;
                    warn!(strategy = %strategy.id, error = %err, "sweep attempt errored");
                }
            }
        }

        Ok(summary)
    }
}
