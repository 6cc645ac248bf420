//! JVM memory budget calculation
//! Splits a task's memory grant into heap, metaspace and misc overhead

pub mod calculator;
pub mod types;

pub use calculator::{calculate_budget, heap_size, heap_size_with_overhead};
pub use types::{
    BudgetAdvisory, BudgetOverrides, BudgetReport, MemoryBudget, Region,
    DEFAULT_METASPACE_SIZE_MB, DEFAULT_OVERHEAD_SIZE_MB, FIXED_OVERHEAD_MB,
    LEGACY_FIXED_OVERHEAD_MB, MIN_HEAP_MB, MIN_METASPACE_MB, MIN_OVERHEAD_MB,
};
