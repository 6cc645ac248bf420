//! Heap and three-region budget calculators
//!
//! Both calculators are pure: no I/O, no logging, no shared state. Advisories
//! are returned in the report and it is up to the caller to surface them.
//!
//! Region sizing for the full calculator:
//!
//! ```text
//! overhead  = max(overhead_size  * attempt, 32)
//! metaspace = max(metaspace_size * attempt, 64)
//! heap      = allocated - overhead - metaspace      (must be >= 16)
//! ```

use crate::budget::types::{
    BudgetAdvisory, BudgetOverrides, BudgetReport, MemoryBudget, Region, FIXED_OVERHEAD_MB,
    MIN_HEAP_MB,
};
use crate::errors::{BudgetError, Result};

/// Heap left after subtracting [`FIXED_OVERHEAD_MB`] from the allocation
pub fn heap_size(allocated_mb: i64) -> Result<u64> {
    heap_size_with_overhead(allocated_mb, FIXED_OVERHEAD_MB)
}

/// Heap left after subtracting an arbitrary fixed overhead
pub fn heap_size_with_overhead(allocated_mb: i64, fixed_overhead_mb: i64) -> Result<u64> {
    ensure_positive("allocated_mb", allocated_mb)?;
    if fixed_overhead_mb < 0 {
        return Err(BudgetError::invalid(
            "fixed_overhead_mb",
            fixed_overhead_mb,
            "must not be negative",
        ));
    }

    let allocated = allocated_mb as u64;
    let fixed_overhead = fixed_overhead_mb as u64;
    let required_mb = fixed_overhead + MIN_HEAP_MB;
    if allocated < required_mb {
        return Err(BudgetError::InsufficientMemory {
            required_mb,
            allocated_mb: allocated,
            overhead_mb: fixed_overhead,
            metaspace_mb: None,
        });
    }

    Ok(allocated - fixed_overhead)
}

/// Split `allocated_mb` into overhead, metaspace and heap for one task attempt
///
/// The overhead and metaspace base sizes are multiplied by `attempt` so that
/// retried tasks, which are usually granted more memory, also get larger
/// fixed-cost regions. Scaling happens before clamping: a base of `0` on
/// attempt 3 yields the floor, not three times the floor.
pub fn calculate_budget(
    allocated_mb: i64,
    attempt: i64,
    overrides: &BudgetOverrides,
) -> Result<BudgetReport> {
    ensure_positive("allocated_mb", allocated_mb)?;
    ensure_positive("attempt", attempt)?;

    let mut advisories = Vec::new();
    let overhead_mb = scaled_region(
        Region::Overhead,
        overrides.overhead_size(),
        attempt,
        &mut advisories,
    )?;
    let metaspace_mb = scaled_region(
        Region::Metaspace,
        overrides.metaspace_size(),
        attempt,
        &mut advisories,
    )?;

    let required_mb = overhead_mb
        .checked_add(metaspace_mb)
        .and_then(|reserved| reserved.checked_add(MIN_HEAP_MB))
        .ok_or_else(|| {
            BudgetError::invalid(
                "allocated_mb",
                allocated_mb,
                format!(
                    "region sizes overflow (overhead {}MB, metaspace {}MB)",
                    overhead_mb, metaspace_mb
                ),
            )
        })?;
    let reserved_mb = required_mb - MIN_HEAP_MB;
    let allocated = allocated_mb as u64;
    if allocated < required_mb {
        return Err(BudgetError::InsufficientMemory {
            required_mb,
            allocated_mb: allocated,
            overhead_mb,
            metaspace_mb: Some(metaspace_mb),
        });
    }

    let heap_mb = allocated - reserved_mb;
    Ok(BudgetReport {
        budget: MemoryBudget::new(allocated, overhead_mb, metaspace_mb, heap_mb),
        advisories,
    })
}

fn scaled_region(
    region: Region,
    configured_mb: i64,
    attempt: i64,
    advisories: &mut Vec<BudgetAdvisory>,
) -> Result<u64> {
    let scaled_mb = configured_mb.checked_mul(attempt).ok_or_else(|| {
        BudgetError::invalid(
            region.setting_name(),
            configured_mb,
            format!("scaling by attempt {} overflows", attempt),
        )
    })?;

    let floor_mb = region.floor_mb();
    if scaled_mb < floor_mb as i64 {
        advisories.push(BudgetAdvisory::ClampedConfiguration {
            region,
            configured_mb,
            attempt,
            scaled_mb,
            floor_mb,
        });
        return Ok(floor_mb);
    }

    Ok(scaled_mb as u64)
}

fn ensure_positive(name: &'static str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(BudgetError::invalid(name, value, "must be greater than 0"));
    }
    Ok(())
}
