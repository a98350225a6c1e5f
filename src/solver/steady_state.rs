//! Stationary distribution via eigen-analysis
//!
//! A valid generator has 0 in its spectrum, and the associated eigenvector
//! (suitably normalised) is a stationary distribution of the chain. The
//! solver asks its [`LinearAlgebraProvider`] for the full decomposition,
//! searches the *unsorted* spectrum for the eigenvalue with the largest
//! real part, and normalises the matching eigenvector.
//!
//! # Numerical policy
//!
//! - Only real parts are compared when selecting the dominant eigenvalue;
//!   truncation and round-off can push it slightly off zero or give it a
//!   tiny imaginary part. Both conditions are reported through
//!   `tracing::warn!`, never as errors.
//! - Raw eigenvector sign/phase is arbitrary, so entries are taken in
//!   absolute value and L1-normalised in place of a true non-negativity
//!   guarantee.
//! - A degenerate top eigenvalue (a second eigenvalue's real part within
//!   tolerance of the first) makes the eigenvector choice backend-
//!   dependent: the chain then has more than one closed communicating
//!   class inside the box. The solver warns and keeps the backend's
//!   vector rather than silently averaging over the eigenspace; see
//!   DESIGN.md for the rationale.
//!
//! # Example
//!
//! ```rust
//! use cme_rs::network::{ReactionParameters, StateSpace};
//! use cme_rs::operator::MasterOperatorBuilder;
//! use cme_rs::solver::SteadyStateSolver;
//! use nalgebra::DVector;
//!
//! // Birth-death network: stationary mean is birth/death
//! let params = ReactionParameters::birth_death(
//!     DVector::from_vec(vec![1.0]),
//!     DVector::from_vec(vec![0.5]),
//! ).unwrap();
//!
//! let space = StateSpace::new(1, 30);
//! let operator = MasterOperatorBuilder::new(params).build(&space).unwrap();
//!
//! let means = SteadyStateSolver::new().solve(&operator, &space).unwrap();
//! assert!((means[0] - 2.0).abs() < 1e-6);
//! ```

use nalgebra::DVector;
use tracing::{debug, warn};

use crate::error::CmeError;
use crate::network::StateSpace;
use crate::numerics::{LinearAlgebraProvider, NalgebraProvider};
use crate::operator::MasterOperator;

/// Tolerance for "essentially zero / essentially equal" checks on the
/// dominant eigenvalue: imaginary part, drift from zero, and the gap to
/// the runner-up real part.
const TOP_EIGENVALUE_TOL: f64 = 1e-9;

// =================================================================================================
// Steady-State Solver
// =================================================================================================

/// Extracts stationary per-species mean copy numbers from a generator.
///
/// Generic over the linear-algebra backend so the selection and
/// normalisation logic can be tested against hand-built decompositions.
#[derive(Debug, Clone)]
pub struct SteadyStateSolver<P = NalgebraProvider> {
    provider: P,
}

impl SteadyStateSolver<NalgebraProvider> {
    /// Solver backed by the default nalgebra provider.
    pub fn new() -> Self {
        Self {
            provider: NalgebraProvider::new(),
        }
    }
}

impl Default for SteadyStateSolver<NalgebraProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: LinearAlgebraProvider> SteadyStateSolver<P> {
    /// Solver with a caller-supplied linear-algebra backend.
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    /// The L1-normalised stationary probability vector, in canonical
    /// state order.
    ///
    /// # Errors
    ///
    /// - [`CmeError::DimensionMismatch`] when operator and state space
    ///   disagree on the state count.
    /// - [`CmeError::EigenFailure`] from the backend.
    /// - [`CmeError::DegenerateDistribution`] when the selected
    ///   eigenvector has zero mass.
    pub fn stationary_distribution(
        &self,
        operator: &MasterOperator,
        space: &StateSpace,
    ) -> Result<DVector<f64>, CmeError> {
        if operator.dim() != space.len() {
            return Err(CmeError::DimensionMismatch {
                what: "generator dimension",
                expected: space.len(),
                got: operator.dim(),
            });
        }

        let decomposition = self.provider.eigen_decomposition(operator.matrix())?;

        // ====== Select the dominant eigenvalue ======

        // The backend returns the spectrum in no particular order; search
        // explicitly instead of assuming any sorting.
        let mut top = 0;
        for k in 1..decomposition.dim() {
            if decomposition.eigenvalues[k].re > decomposition.eigenvalues[top].re {
                top = k;
            }
        }
        let dominant = decomposition.eigenvalues[top];

        debug!(
            eigenvalue_re = dominant.re,
            eigenvalue_im = dominant.im,
            backend = self.provider.name(),
            "selected dominant eigenvalue"
        );

        // ====== Diagnostics (warn, never fail) ======

        if dominant.im.abs() > TOP_EIGENVALUE_TOL {
            warn!(
                im = dominant.im,
                "dominant eigenvalue has a nonzero imaginary part; \
                 only its real part and a real eigenvector are used"
            );
        }
        if dominant.re.abs() > TOP_EIGENVALUE_TOL {
            warn!(
                re = dominant.re,
                "dominant eigenvalue is not numerically zero; \
                 the matrix may not be a valid generator or round-off is large"
            );
        }

        let runner_up = decomposition
            .eigenvalues
            .iter()
            .enumerate()
            .filter(|&(k, _)| k != top)
            .map(|(_, z)| z.re)
            .fold(f64::NEG_INFINITY, f64::max);
        if decomposition.dim() > 1 && (dominant.re - runner_up).abs() < TOP_EIGENVALUE_TOL {
            warn!(
                dominant = dominant.re,
                runner_up,
                "dominant eigenvalue is degenerate; the stationary vector \
                 is backend-dependent (multiple closed communicating classes?)"
            );
        }

        // ====== Normalise ======

        // Sign/phase of a raw eigenvector is arbitrary: take magnitudes
        // and L1-normalise.
        let mut weights = decomposition.eigenvector(top).abs();
        let total = weights.sum();
        if total == 0.0 || !total.is_finite() {
            return Err(CmeError::DegenerateDistribution);
        }
        weights /= total;

        Ok(weights)
    }

    /// Stationary mean copy number per species.
    pub fn solve(
        &self,
        operator: &MasterOperator,
        space: &StateSpace,
    ) -> Result<DVector<f64>, CmeError> {
        let distribution = self.stationary_distribution(operator, space)?;
        Ok(space.weighted_means(&distribution))
    }
}

// =================================================================================================
// Tests
// =================================================================================================
