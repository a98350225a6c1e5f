//! Numerics backends and execution knobs
//!
//! The core pipeline depends on two numerical capabilities it does not
//! implement itself: a dense eigen-decomposition and the Poisson
//! probability mass function. Both sit behind traits so the master-equation
//! logic stays independent of any particular numerics crate and so tests
//! can substitute mock backends:
//!
//! - [`LinearAlgebraProvider`] with the default [`NalgebraProvider`]
//! - [`DistributionProvider`] with the default [`StatrsProvider`]
//!
//! # Module Organization
//!
//! - **`linalg`**: eigen-decomposition seam and the nalgebra-backed default
//! - **`distributions`**: Poisson pmf seam and the statrs-backed default

// =================================================================================================
// Module Declarations
// =================================================================================================

mod distributions;
mod linalg;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Deciding *when* to hand work off to Rayon is an execution concern, not a
// master-equation concern, so the knob lives here rather than next to the
// operator builder that uses it.
//
// The threshold is stored in an AtomicUsize so that it can be changed at
// runtime (useful in benchmarks and tests) without requiring a mutex on
// every matrix operation. Relaxed ordering is sufficient: the value is a
// performance hint, not a synchronisation point.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default state-space size above which generator assembly and
/// matrix-vector products switch to parallel iteration.
///
/// Below the crossover, Rayon's thread-pool dispatch costs more than the
/// per-column arithmetic of the moderate truncations this crate targets.
const DEFAULT_PARALLEL_THRESHOLD: usize = 512;

/// Runtime-configurable parallel-execution threshold.
///
/// Read via [`parallel_threshold()`], written via [`set_parallel_threshold()`].
static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Return the current parallel-execution threshold.
///
/// Generator assembly and [`MasterOperator::apply`](crate::operator::MasterOperator::apply)
/// use sequential iteration when the state space has fewer states than this
/// value, and switch to Rayon when it has more, but only when the crate is
/// compiled with the `parallel` feature.
///
/// # Example
///
/// ```rust
/// use cme_rs::numerics::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold to a new value.
///
/// # Panics
///
/// Panics when `threshold == 0`. A zero threshold would force parallel
/// dispatch even for a single-state space, which is never the intended
/// behaviour.
///
/// # Example
///
/// ```rust
/// use cme_rs::numerics::{parallel_threshold, set_parallel_threshold};
///
/// let previous = parallel_threshold();
/// set_parallel_threshold(2048);
/// assert_eq!(parallel_threshold(), 2048);
///
/// // Restore so other tests are not affected.
/// set_parallel_threshold(previous);
/// ```
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// RAII guard that saves the current threshold on construction and restores
/// it on drop.
///
/// Only compiled in test builds. Prevents one test from leaking a modified
/// threshold value into the next.
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    /// Set the threshold to `new_value` and return a guard that will
    /// restore the previous value on drop.
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        // Bypass the public setter so that restoring to any value never
        // panics.
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use distributions::{DistributionProvider, StatrsProvider};
pub use linalg::{EigenDecomposition, LinearAlgebraProvider, NalgebraProvider};

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold_value() {
        assert_eq!(DEFAULT_PARALLEL_THRESHOLD, 512);
    }

    #[test]
    fn test_get_and_set_threshold() {
        let _guard = ThresholdGuard::save(500);
        assert_eq!(parallel_threshold(), 500);
    }

    #[test]
    #[should_panic(expected = "parallel threshold must be at least 1")]
    fn test_zero_threshold_panics() {
        set_parallel_threshold(0);
    }

    #[test]
    fn test_threshold_guard_restores_previous_value() {
        let before = parallel_threshold();
        {
            let _guard = ThresholdGuard::save(42);
            assert_eq!(parallel_threshold(), 42);
        }
        // Guard dropped: value must be back to what it was before.
        assert_eq!(parallel_threshold(), before);
    }
}
