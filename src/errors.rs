//! Error types for jvmbudget
//!
//! Fatal outcomes of a budget calculation are tagged variants so callers can
//! branch on the kind instead of parsing message text.

use thiserror::Error;

/// Main error type for budget calculation and the task-lifecycle helpers
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Malformed calculator input (non-positive allocation or attempt, overflow)
    #[error("Invalid argument {name} = {value}: {reason}")]
    InvalidArgument {
        name: &'static str,
        value: i64,
        reason: String,
    },

    /// Allocation cannot cover the fixed regions plus the minimum heap
    ///
    /// `metaspace_mb` is `None` for the heap-only calculator, which has no
    /// metaspace region.
    #[error(
        "Insufficient memory: {allocated_mb}MB allocated but at least {required_mb}MB required ({})",
        describe_regions(.overhead_mb, .metaspace_mb)
    )]
    InsufficientMemory {
        required_mb: u64,
        allocated_mb: u64,
        overhead_mb: u64,
        metaspace_mb: Option<u64>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn describe_regions(overhead_mb: &u64, metaspace_mb: &Option<u64>) -> String {
    match metaspace_mb {
        Some(metaspace_mb) => format!("overhead {}MB, metaspace {}MB", overhead_mb, metaspace_mb),
        None => format!("fixed overhead {}MB", overhead_mb),
    }
}

/// Discriminant of [`BudgetError`] without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetErrorKind {
    InvalidArgument,
    InsufficientMemory,
    Config,
    Serialization,
    Io,
}

impl BudgetError {
    /// Build an `InvalidArgument` error
    pub fn invalid(name: &'static str, value: i64, reason: impl Into<String>) -> Self {
        BudgetError::InvalidArgument {
            name,
            value,
            reason: reason.into(),
        }
    }

    /// Kind of this error
    pub fn kind(&self) -> BudgetErrorKind {
        match self {
            BudgetError::InvalidArgument { .. } => BudgetErrorKind::InvalidArgument,
            BudgetError::InsufficientMemory { .. } => BudgetErrorKind::InsufficientMemory,
            BudgetError::ConfigError(_) => BudgetErrorKind::Config,
            BudgetError::SerializationError(_) => BudgetErrorKind::Serialization,
            BudgetError::IoError(_) => BudgetErrorKind::Io,
        }
    }

    /// Minimum allocation that would have succeeded, for `InsufficientMemory`
    pub fn required_mb(&self) -> Option<u64> {
        match self {
            BudgetError::InsufficientMemory { required_mb, .. } => Some(*required_mb),
            _ => None,
        }
    }
}

/// Result type alias for budget operations
pub type Result<T> = std::result::Result<T, BudgetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_memory_display() {
        let err = BudgetError::InsufficientMemory {
            required_mb: 592,
            allocated_mb: 256,
            overhead_mb: 192,
            metaspace_mb: Some(384),
        };
        let msg = err.to_string();
        assert!(msg.contains("592"));
        assert!(msg.contains("256"));
        assert!(msg.contains("metaspace 384MB"));
        assert_eq!(err.required_mb(), Some(592));
        assert_eq!(err.kind(), BudgetErrorKind::InsufficientMemory);
    }

    #[test]
    fn test_heap_only_message_omits_metaspace() {
        let err = BudgetError::InsufficientMemory {
            required_mb: 144,
            allocated_mb: 140,
            overhead_mb: 128,
            metaspace_mb: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("fixed overhead 128MB"));
        assert!(!msg.contains("metaspace"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = BudgetError::invalid("attempt", 0, "must be at least 1");
        assert!(err.to_string().contains("attempt = 0"));
        assert_eq!(err.kind(), BudgetErrorKind::InvalidArgument);
        assert_eq!(err.required_mb(), None);
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BudgetError = io.into();
        assert_eq!(err.kind(), BudgetErrorKind::Io);
    }
}
