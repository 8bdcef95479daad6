//! Error types for the spawn pipeline
//!
//! None of these are fatal. Exhaustion triggers growth, infeasible placement
//! triggers the line-layout fallback, factory failures are logged and the
//! entry skipped, and invariant violations are reported then ignored.

use crate::pool::{PoolHandle, PoolId};

/// Result alias used throughout the crate
pub type SpawnResult<T> = Result<T, SpawnError>;

/// Errors raised by pools, the placement planner and the active set
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SpawnError {
    /// No free entry and growth produced nothing
    #[error("Pool '{pool}' exhausted: {in_use} entries in use, growth produced none")]
    PoolExhausted {
        /// Pool name
        pool: String,
        /// Entries active at the time of the request
        in_use: usize,
    },

    /// Curve layout rejected every candidate slot
    #[error("Placement infeasible: all {candidates} curve candidates overlap an obstacle")]
    PlacementInfeasible {
        /// Number of candidates that were tested
        candidates: usize,
    },

    /// Entity construction failed during pool growth
    #[error("Factory failure in pool '{pool}': {source}")]
    FactoryFailure {
        /// Pool name
        pool: String,
        /// Underlying factory error
        #[source]
        source: FactoryError,
    },

    /// Active set is already at capacity
    #[error("Active set full: {capacity} platforms already active")]
    CapacityReached {
        /// Configured capacity
        capacity: usize,
    },

    /// A programming error, e.g. double release
    #[error("Invariant violation: {0}")]
    InvariantViolation(Violation),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Construction failure reported by an [`EntityFactory`](crate::pool::EntityFactory)
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// The factory has no template to build from
    #[error("missing template '{0}'")]
    MissingTemplate(String),

    /// The template exists but cannot produce a valid entity
    #[error("invalid template '{name}': {reason}")]
    InvalidTemplate {
        /// Template name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Kinds of invariant violation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// Release of a handle whose entry is already inactive
    DoubleRelease(PoolHandle),
    /// Handle generation does not match the entry (entry was reused)
    StaleHandle(PoolHandle),
    /// Handle belongs to another pool or points past the end
    ForeignHandle {
        /// Offending handle
        handle: PoolHandle,
        /// Pool the handle was presented to
        pool: PoolId,
    },
    /// Recycle requested for a platform that is not in the active set
    RecycleInactive(PoolHandle),
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DoubleRelease(handle) => write!(f, "double release of {handle}"),
            Self::StaleHandle(handle) => write!(f, "stale handle {handle}"),
            Self::ForeignHandle { handle, pool } => {
                write!(f, "handle {handle} presented to pool {}", pool.0)
            }
            Self::RecycleInactive(handle) => write!(f, "recycle of inactive platform {handle}"),
        }
    }
}

/// Report an invariant violation
///
/// Debug builds log it at error level so it shows up during development.
/// Release builds only trace it; the caller treats the operation as a no-op
/// either way.
pub fn report_violation(violation: Violation) {
    if cfg!(debug_assertions) {
        log::error!("{}", SpawnError::InvariantViolation(violation));
    } else {
        log::trace!("{}", SpawnError::InvariantViolation(violation));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = SpawnError::PoolExhausted {
            pool: "water".to_string(),
            in_use: 15,
        };
        assert!(format!("{error}").contains("Pool 'water' exhausted: 15"));

        let error = SpawnError::FactoryFailure {
            pool: "stage1/short".to_string(),
            source: FactoryError::MissingTemplate("short".to_string()),
        };
        assert!(format!("{error}").contains("missing template 'short'"));
    }

    #[test]
    fn test_violation_display() {
        let handle = PoolHandle::new(PoolId(2), 4, 7);
        let violation = Violation::DoubleRelease(handle);
        assert_eq!(format!("{violation}"), "double release of #2:4@7");
    }
}
