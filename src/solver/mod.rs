//! Master-equation solvers
//!
//! Two consumers of an assembled [`MasterOperator`](crate::operator::MasterOperator):
//!
//! 1. **[`SteadyStateSolver`]**: WHAT the chain settles into.
//!    Eigen-analysis of the generator: the eigenvector of the eigenvalue
//!    with the largest real part, L1-normalised, is the stationary
//!    distribution; per-species means are read off it.
//!
//! 2. **[`DynamicsIntegrator`]**: HOW the distribution gets there.
//!    Explicit forward-Euler integration of `dP/dt = M · P` on a uniform
//!    [`TimeGrid`], starting from a product-Poisson vector built by
//!    [`InitialDistributionBuilder`], reporting per-species mean copy
//!    numbers at every grid point as a [`Trajectory`].
//!
//! Both go through [`StateSpace::weighted_means`](crate::network::StateSpace::weighted_means)
//! to turn distributions into means, so their outputs share the canonical
//! state ordering by construction.
//!
//! # Numerical caveats
//!
//! - Forward Euler is conditionally stable: `dt` must stay below the
//!   reciprocal of the largest diagonal rate of the generator. The
//!   integrator warns (it does not abort) when the bound is violated;
//!   choosing `dt` is the caller's responsibility.
//! - Truncation drops probability flux across the box boundary, so mass
//!   decays slowly even with exact arithmetic; the bias grows with the
//!   ratio of expected population to `max_num`.

// =================================================================================================
// Module Declarations
// =================================================================================================

mod dynamics;
mod initial;
mod steady_state;

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use dynamics::{DynamicsIntegrator, TimeGrid, Trajectory};
pub use initial::InitialDistributionBuilder;
pub use steady_state::SteadyStateSolver;

// =================================================================================================
// Helper Functions
// =================================================================================================

use nalgebra::DVector;

use crate::error::CmeError;

/// Validate a probability vector for numerical blow-up.
///
/// NaN or infinity in the working vector means the explicit Euler step has
/// diverged (almost always a too-large `dt` relative to the fastest rate
/// in the generator). Caught per step so the error names the first bad
/// step rather than propagating garbage into the trajectory.
pub(crate) fn validate_probability(probability: &DVector<f64>, step: usize) -> Result<(), CmeError> {
    if probability.iter().any(|x| !x.is_finite()) {
        return Err(CmeError::NonFiniteState { step });
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
