//! Error types for the cme-rs crate.

/// Error type for all fallible operations in the cme-rs crate.
///
/// The crate favours fail-fast validation at construction boundaries
/// (reaction parameters, time grids, initial means) and typed failures
/// from the numerics backends. Numerical-quality concerns that the caller
/// can recover from by retrying with a different `dt` or `max_num`
/// (degenerate dominant eigenvalue, Euler step above the stability bound,
/// negative probability entries) are reported through `tracing` warnings
/// instead of this enum.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CmeError {
    /// Returned when two related inputs disagree on a dimension.
    #[error("dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// What was being checked (e.g. "death_rates", "initial means").
        what: &'static str,
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        got: usize,
    },

    /// Returned when a rate entry is negative or non-finite.
    #[error("invalid {name} rate at index {index}: {value} (must be finite and >= 0)")]
    InvalidRate {
        /// Rate vector name ("birth", "death", "interaction").
        name: &'static str,
        /// Offending entry index.
        index: usize,
        /// The invalid value.
        value: f64,
    },

    /// Returned when a network is declared with zero species.
    #[error("reaction network must have at least one species")]
    EmptySpecies,

    /// Returned when the truncated state space does not fit in a usize.
    #[error("state space overflow: ({max_num} + 1)^{num_species} exceeds addressable size")]
    StateSpaceOverflow {
        /// Number of species.
        num_species: usize,
        /// Per-species truncation bound.
        max_num: u32,
    },

    /// Returned when a time grid is unusable for explicit stepping.
    #[error("invalid time grid: {reason}")]
    InvalidTimeGrid {
        /// Description of the problem.
        reason: String,
    },

    /// Returned when an initial mean entry is negative or non-finite.
    #[error("invalid initial mean at index {index}: {value} (must be finite and >= 0)")]
    InvalidInitialMean {
        /// Offending species index.
        index: usize,
        /// The invalid value.
        value: f64,
    },

    /// Returned when the linear-algebra backend cannot produce a
    /// decomposition (singular shifted solve, iteration cap reached).
    #[error("eigen decomposition failed: {message}")]
    EigenFailure {
        /// Backend diagnostic.
        message: String,
    },

    /// Returned when a candidate stationary vector has zero mass and
    /// cannot be normalized.
    #[error("candidate stationary distribution sums to zero")]
    DegenerateDistribution,

    /// Returned when the probability vector picks up NaN or infinity
    /// during forward integration.
    #[error(
        "non-finite probability entries at step {step}; \
         the explicit Euler step is likely too large, retry with a smaller dt"
    )]
    NonFiniteState {
        /// Time-grid index at which the defect was detected.
        step: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_dimension_mismatch() {
        let e = CmeError::DimensionMismatch {
            what: "death_rates",
            expected: 3,
            got: 2,
        };
        assert_eq!(
            e.to_string(),
            "dimension mismatch in death_rates: expected 3, got 2"
        );
    }

    #[test]
    fn error_invalid_rate() {
        let e = CmeError::InvalidRate {
            name: "birth",
            index: 1,
            value: -0.5,
        };
        assert_eq!(
            e.to_string(),
            "invalid birth rate at index 1: -0.5 (must be finite and >= 0)"
        );
    }

    #[test]
    fn error_empty_species() {
        let e = CmeError::EmptySpecies;
        assert_eq!(e.to_string(), "reaction network must have at least one species");
    }

    #[test]
    fn error_state_space_overflow() {
        let e = CmeError::StateSpaceOverflow {
            num_species: 40,
            max_num: 100,
        };
        assert_eq!(
            e.to_string(),
            "state space overflow: (100 + 1)^40 exceeds addressable size"
        );
    }

    #[test]
    fn error_invalid_time_grid() {
        let e = CmeError::InvalidTimeGrid {
            reason: "needs at least 2 points".to_string(),
        };
        assert_eq!(e.to_string(), "invalid time grid: needs at least 2 points");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_impl<T: std::error::Error>() {}
        assert_impl::<CmeError>();
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync>() {}
        assert_impl::<CmeError>();
    }
}
