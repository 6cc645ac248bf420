//! Budget system type definitions

use crate::errors::{BudgetError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest heap the calculators will ever hand to the JVM
pub const MIN_HEAP_MB: u64 = 16;

/// Floor for the misc overhead region
pub const MIN_OVERHEAD_MB: u64 = 32;

/// Floor for the metaspace region
pub const MIN_METASPACE_MB: u64 = 64;

/// Per-attempt base overhead when `overhead_size` is not configured
pub const DEFAULT_OVERHEAD_SIZE_MB: i64 = 64;

/// Per-attempt base metaspace when `metaspace_size` is not configured
pub const DEFAULT_METASPACE_SIZE_MB: i64 = 128;

/// Fixed overhead subtracted by the basic heap calculator
pub const FIXED_OVERHEAD_MB: i64 = 128;

/// Fixed overhead used by the basic heap calculator before it was raised to 128
pub const LEGACY_FIXED_OVERHEAD_MB: i64 = 64;

/// Named per-attempt base sizes for the scaled regions
///
/// Unset fields fall back to [`DEFAULT_OVERHEAD_SIZE_MB`] and
/// [`DEFAULT_METASPACE_SIZE_MB`]. Zero and negative values are accepted here;
/// the calculator scales them and raises the result to the region floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetOverrides {
    /// Base misc overhead in MB (default: 64)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overhead_size: Option<i64>,

    /// Base metaspace in MB (default: 128)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metaspace_size: Option<i64>,
}

impl BudgetOverrides {
    /// Overrides with every field unset
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base overhead size
    pub fn with_overhead_size(mut self, mb: i64) -> Self {
        self.overhead_size = Some(mb);
        self
    }

    /// Set the base metaspace size
    pub fn with_metaspace_size(mut self, mb: i64) -> Self {
        self.metaspace_size = Some(mb);
        self
    }

    /// Effective base overhead
    pub fn overhead_size(&self) -> i64 {
        self.overhead_size.unwrap_or(DEFAULT_OVERHEAD_SIZE_MB)
    }

    /// Effective base metaspace
    pub fn metaspace_size(&self) -> i64 {
        self.metaspace_size.unwrap_or(DEFAULT_METASPACE_SIZE_MB)
    }

    /// Assign a setting by its region name
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let region = Region::from_setting_name(name).ok_or_else(|| {
            BudgetError::ConfigError(format!(
                "Unknown budget setting '{}' (expected overhead_size or metaspace_size)",
                name
            ))
        })?;

        let mb: i64 = value.trim().parse().map_err(|_| {
            BudgetError::ConfigError(format!(
                "Setting {} must be a whole number of megabytes, got '{}'",
                name, value
            ))
        })?;

        match region {
            Region::Overhead => self.overhead_size = Some(mb),
            Region::Metaspace => self.metaspace_size = Some(mb),
        }
        Ok(())
    }

    /// Build overrides from a name/value lookup such as `key=value` pairs
    pub fn from_lookup<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut overrides = Self::default();
        for (name, value) in pairs {
            overrides.set(name.as_ref(), value.as_ref())?;
        }
        Ok(overrides)
    }

    /// Layer `other` on top of `self`; fields set in `other` win
    pub fn merge(self, other: BudgetOverrides) -> Self {
        Self {
            overhead_size: other.overhead_size.or(self.overhead_size),
            metaspace_size: other.metaspace_size.or(self.metaspace_size),
        }
    }
}

/// A non-heap region whose size scales with the attempt count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Overhead,
    Metaspace,
}

impl Region {
    /// Configuration key for the region's base size
    pub fn setting_name(&self) -> &'static str {
        match self {
            Region::Overhead => "overhead_size",
            Region::Metaspace => "metaspace_size",
        }
    }

    /// Lowest size the region may be given
    pub fn floor_mb(&self) -> u64 {
        match self {
            Region::Overhead => MIN_OVERHEAD_MB,
            Region::Metaspace => MIN_METASPACE_MB,
        }
    }

    fn from_setting_name(name: &str) -> Option<Self> {
        match name.trim() {
            "overhead_size" => Some(Region::Overhead),
            "metaspace_size" => Some(Region::Metaspace),
            _ => None,
        }
    }
}

/// Non-fatal diagnostics raised while computing a budget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetAdvisory {
    /// A scaled region came out below its floor and was raised to it
    ClampedConfiguration {
        region: Region,
        configured_mb: i64,
        attempt: i64,
        scaled_mb: i64,
        floor_mb: u64,
    },
}

impl fmt::Display for BudgetAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetAdvisory::ClampedConfiguration {
                region,
                configured_mb,
                attempt,
                scaled_mb,
                floor_mb,
            } => write!(
                f,
                "{} of {}MB x attempt {} = {}MB is below the {}MB minimum; using {}MB",
                region.setting_name(),
                configured_mb,
                attempt,
                scaled_mb,
                floor_mb,
                floor_mb
            ),
        }
    }
}

/// Validated split of a task's memory grant between JVM regions
///
/// Always satisfies `overhead_mb + metaspace_mb + heap_mb == allocated_mb`.
/// Only the calculator constructs one; the flag string is derived from the
/// sizes and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryBudget {
    allocated_mb: u64,
    overhead_mb: u64,
    metaspace_mb: u64,
    heap_mb: u64,
    jvm_flags: String,
}

impl MemoryBudget {
    pub(crate) fn new(allocated_mb: u64, overhead_mb: u64, metaspace_mb: u64, heap_mb: u64) -> Self {
        debug_assert_eq!(overhead_mb + metaspace_mb + heap_mb, allocated_mb);
        // Heap min and max are pinned so the JVM never grows into the native share.
        let jvm_flags = format!(
            "-XX:MaxMetaspaceSize={}m -Xms{}m -Xmx{}m",
            metaspace_mb, heap_mb, heap_mb
        );
        Self {
            allocated_mb,
            overhead_mb,
            metaspace_mb,
            heap_mb,
            jvm_flags,
        }
    }

    pub fn allocated_mb(&self) -> u64 {
        self.allocated_mb
    }

    pub fn overhead_mb(&self) -> u64 {
        self.overhead_mb
    }

    pub fn metaspace_mb(&self) -> u64 {
        self.metaspace_mb
    }

    pub fn heap_mb(&self) -> u64 {
        self.heap_mb
    }

    /// Space-separated JVM flags, safe to interpolate unquoted into a command line
    pub fn jvm_flags(&self) -> &str {
        &self.jvm_flags
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.jvm_flags)
    }
}

/// Successful outcome of the full calculator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetReport {
    pub budget: MemoryBudget,
    pub advisories: Vec<BudgetAdvisory>,
}

impl BudgetReport {
    /// Whether any region was raised to its floor
    pub fn is_clamped(&self) -> bool {
        !self.advisories.is_empty()
    }

    /// Emit every advisory as a `warn` event
    pub fn log_advisories(&self) {
        for advisory in &self.advisories {
            match advisory {
                BudgetAdvisory::ClampedConfiguration {
                    region,
                    scaled_mb,
                    floor_mb,
                    ..
                } => tracing::warn!(
                    target: "jvmbudget",
                    setting = region.setting_name(),
                    scaled_mb,
                    floor_mb,
                    "{}",
                    advisory
                ),
            }
        }
    }
}
