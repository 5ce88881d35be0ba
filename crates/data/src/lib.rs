//! Durable storage for strategies and the execution ledger.
//!
//! This crate provides:
//! - The storage traits the orchestration engine is written against
//! - PostgreSQL repositories for durable operation
//! - In-memory backends for tests and dry-run operation
//!
//! Both backends share the same single-mutation-path semantics for
//! strategy counters; a restart resumes scheduling from the persisted
//! `next_execution`, never from a reset clock.

/// In-memory backends.
pub mod memory;
/// PostgreSQL repositories.
pub mod repositories;
/// Storage traits and errors.
pub mod store;

pub use memory::{MemoryExecutionLedger, MemoryStrategyStore};
pub use repositories::{Database, LedgerRepository, StrategyRepository};
pub use store::{ExecutionLedger, StoreError, StrategyStore};
