//! Error types for the core crate
//!
//! Structural problems in the data (missing fields, dangling references)
//! are never errors here; they are the signal the integrity filter prunes
//! on. The only failures the engine can raise are violations of its own
//! algorithmic invariants.

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum CoreError {
    /// The integrity filter failed to reach a fixed point within its pass
    /// bound. Each changing pass must shrink the dataset, so hitting the
    /// bound means the engine itself is broken, not the data.
    #[error(
        "integrity filter did not converge within {max_passes} passes \
         ({records} records, {references} references at start)"
    )]
    NonConvergence {
        /// The exhausted pass bound.
        max_passes: usize,

        /// Record count when filtering started.
        records: usize,

        /// Reference count when filtering started.
        references: usize,
    },

    /// JSON error while normalizing raw rows.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for the core crate
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::NonConvergence {
            max_passes: 12,
            records: 4,
            references: 7,
        };
        assert_eq!(
            err.to_string(),
            "integrity filter did not converge within 12 passes (4 records, 7 references at start)"
        );
    }
}
