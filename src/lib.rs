//! jvmbudget - JVM memory budgets for pipeline tasks
//!
//! Splits the memory granted to a task attempt between JVM heap, metaspace
//! and misc native overhead, and renders the flags that pin those sizes.
//!
//! # Architecture
//!
//! - **budget**: pure heap-only and three-region calculators
//! - **oom**: exit-code correction for out-of-memory failures
//! - **reclaim**: post-success deletion of linked task inputs
//! - **cli** / **telemetry**: configuration, argument parsing and logging for the binary

pub mod errors;
pub mod budget;
pub mod oom;
pub mod reclaim;

// Re-export commonly used types
pub use errors::{BudgetError, BudgetErrorKind, Result};
pub use budget::{calculate_budget, heap_size, BudgetOverrides, BudgetReport, MemoryBudget};

pub mod cli;
pub mod telemetry;
