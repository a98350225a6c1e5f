//! Forward integration of the Kolmogorov forward equation
//!
//! # Mathematical Background
//!
//! The probability vector of the truncated chain obeys
//!
//! ```text
//! dP/dt = M · P
//! ```
//!
//! with `M` the column-oriented generator. The integrator advances `P`
//! with the forward Euler scheme
//!
//! ```text
//! P_{n+1} = P_n + dt · (M · P_n)
//! ```
//!
//! and records the per-species mean copy number at every grid point.
//!
//! # Stability
//!
//! Forward Euler is conditionally stable. For the linear system above the
//! binding constraint comes from the fastest-draining state:
//!
//! ```text
//! dt < 1 / max_i |M_ii|
//! ```
//!
//! Violating the bound lets probability entries go negative and then
//! diverge. Choosing `dt` is the caller's responsibility; the integrator
//! emits a `tracing` warning when the bound is violated and a typed error
//! only once the vector actually turns non-finite.
//!
//! # Example
//!
//! ```rust
//! use cme_rs::network::{ReactionParameters, StateSpace};
//! use cme_rs::operator::MasterOperatorBuilder;
//! use cme_rs::solver::{DynamicsIntegrator, TimeGrid};
//! use nalgebra::DVector;
//!
//! let params = ReactionParameters::birth_death(
//!     DVector::from_vec(vec![1.0]),
//!     DVector::from_vec(vec![0.5]),
//! ).unwrap();
//!
//! let space = StateSpace::new(1, 25);
//! let operator = MasterOperatorBuilder::new(params).build(&space).unwrap();
//!
//! let grid = TimeGrid::uniform(10.0, 1000).unwrap();
//! let x0 = DVector::from_vec(vec![2.0]);
//!
//! let trajectory = DynamicsIntegrator::new()
//!     .integrate(&operator, &space, &grid, &x0)
//!     .unwrap();
//!
//! assert_eq!(trajectory.len(), 1001);
//! assert_eq!(trajectory.mean_at(0)[0], 2.0);   // exact, never recomputed
//! ```

use nalgebra::{DMatrix, DVector};
use tracing::warn;

use crate::error::CmeError;
use crate::network::StateSpace;
use crate::numerics::{DistributionProvider, StatrsProvider};
use crate::operator::MasterOperator;
use crate::solver::{validate_probability, InitialDistributionBuilder};

/// Relative tolerance for grid-uniformity checks in
/// [`TimeGrid::from_points`].
const GRID_UNIFORMITY_TOL: f64 = 1e-9;

// =================================================================================================
// Time Grid
// =================================================================================================

/// A uniform, strictly increasing time grid.
///
/// Explicit Euler assumes equal spacing; both constructors guarantee it.
/// [`TimeGrid::uniform`] computes each point directly as `i * dt` instead
/// of accumulating `t += dt`, so the final point equals the total time to
/// machine precision regardless of grid length.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    points: Vec<f64>,
    dt: f64,
}

impl TimeGrid {
    /// Grid of `steps + 1` points covering `[0, total_time]`.
    ///
    /// # Errors
    ///
    /// Returns [`CmeError::InvalidTimeGrid`] when `total_time` is not a
    /// positive finite number or `steps` is zero.
    pub fn uniform(total_time: f64, steps: usize) -> Result<Self, CmeError> {
        if !total_time.is_finite() || total_time <= 0.0 {
            return Err(CmeError::InvalidTimeGrid {
                reason: format!("total time must be positive and finite, got {}", total_time),
            });
        }
        if steps == 0 {
            return Err(CmeError::InvalidTimeGrid {
                reason: "need at least one step".to_string(),
            });
        }

        let dt = total_time / steps as f64;
        let points = (0..=steps).map(|i| i as f64 * dt).collect();
        Ok(Self { points, dt })
    }

    /// Grid from caller-supplied points.
    ///
    /// # Errors
    ///
    /// Returns [`CmeError::InvalidTimeGrid`] when fewer than two points
    /// are given, any point is non-finite, the sequence is not strictly
    /// increasing, or the spacing is non-uniform beyond a small relative
    /// tolerance.
    pub fn from_points(points: Vec<f64>) -> Result<Self, CmeError> {
        if points.len() < 2 {
            return Err(CmeError::InvalidTimeGrid {
                reason: format!("need at least 2 points, got {}", points.len()),
            });
        }
        if points.iter().any(|t| !t.is_finite()) {
            return Err(CmeError::InvalidTimeGrid {
                reason: "points must be finite".to_string(),
            });
        }

        let dt = points[1] - points[0];
        if dt <= 0.0 {
            return Err(CmeError::InvalidTimeGrid {
                reason: "points must be strictly increasing".to_string(),
            });
        }
        for window in points.windows(2) {
            let spacing = window[1] - window[0];
            if (spacing - dt).abs() > GRID_UNIFORMITY_TOL * dt.abs() {
                return Err(CmeError::InvalidTimeGrid {
                    reason: format!(
                        "non-uniform spacing: {} then {}",
                        dt, spacing
                    ),
                });
            }
        }

        Ok(Self { points, dt })
    }

    /// Step size.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Number of grid points (steps + 1).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A valid grid always has at least two points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The grid points.
    pub fn points(&self) -> &[f64] {
        &self.points
    }
}

// =================================================================================================
// Trajectory
// =================================================================================================

/// Result of a forward integration: the time grid paired with the mean
/// copy number of every species at every grid point.
///
/// Created once per run, immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    /// Grid points × species.
    means: DMatrix<f64>,
}

impl Trajectory {
    /// The time points.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// The full means matrix (grid points × species).
    pub fn means(&self) -> &DMatrix<f64> {
        &self.means
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// A trajectory always covers at least two grid points.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of species.
    pub fn num_species(&self) -> usize {
        self.means.ncols()
    }

    /// Mean copy numbers at grid point `step`.
    pub fn mean_at(&self, step: usize) -> DVector<f64> {
        self.means.row(step).transpose()
    }

    /// The mean trajectory of species `j` across all grid points.
    pub fn species_means(&self, j: usize) -> DVector<f64> {
        self.means.column(j).into_owned()
    }
}

// =================================================================================================
// Dynamics Integrator
// =================================================================================================

/// Explicit-Euler integrator for the truncated master equation.
///
/// Owns an [`InitialDistributionBuilder`] for the product-Poisson start
/// vector; generic over its distribution backend.
#[derive(Debug, Clone)]
pub struct DynamicsIntegrator<D = StatrsProvider> {
    initial: InitialDistributionBuilder<D>,
}

impl DynamicsIntegrator<StatrsProvider> {
    /// Integrator backed by the default statrs provider.
    pub fn new() -> Self {
        Self {
            initial: InitialDistributionBuilder::new(),
        }
    }
}

impl Default for DynamicsIntegrator<StatrsProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DistributionProvider> DynamicsIntegrator<D> {
    /// Integrator with a caller-supplied distribution backend.
    pub fn with_provider(provider: D) -> Self {
        Self {
            initial: InitialDistributionBuilder::with_provider(provider),
        }
    }

    /// Integrate forward over `grid`, starting from the product-Poisson
    /// distribution with means `x0`.
    ///
    /// The first trajectory row is `x0` verbatim: the caller-specified
    /// initial condition is preserved exactly even though the working
    /// distribution is only its product-Poisson approximation in the
    /// truncated box. Every later row is recomputed from the advanced
    /// probability vector.
    ///
    /// # Errors
    ///
    /// - [`CmeError::DimensionMismatch`] when operator, state space and
    ///   `x0` disagree on dimensions.
    /// - [`CmeError::InvalidInitialMean`] for bad `x0` entries.
    /// - [`CmeError::NonFiniteState`] when the probability vector turns
    ///   NaN/infinite mid-run (Euler divergence).
    pub fn integrate(
        &self,
        operator: &MasterOperator,
        space: &StateSpace,
        grid: &TimeGrid,
        x0: &DVector<f64>,
    ) -> Result<Trajectory, CmeError> {
        // ====== Step 1: Validation ======

        if operator.dim() != space.len() {
            return Err(CmeError::DimensionMismatch {
                what: "generator dimension",
                expected: space.len(),
                got: operator.dim(),
            });
        }

        // ====== Step 2: Setup ======

        // Builds the product-Poisson start vector; validates x0 length
        // and entries as a side effect.
        let mut probability = self.initial.build(space, x0)?;

        let dt = grid.dt();
        let stiffest = operator.max_diagonal_rate();
        if stiffest > 0.0 && dt >= 1.0 / stiffest {
            warn!(
                dt,
                stability_bound = 1.0 / stiffest,
                "Euler step exceeds the stability bound; \
                 expect negative or diverging probabilities, reduce dt"
            );
        }

        let mut means = DMatrix::zeros(grid.len(), space.num_species());

        // First row is the caller's x0, not a recomputed mean.
        means.row_mut(0).copy_from(&x0.transpose());

        // ====== Step 3: Time Integration ======

        // Strictly sequential: each step consumes the previous vector.
        // Only the matrix-vector product inside a step may go parallel.
        let mut warned_negative = false;
        for step in 1..grid.len() {
            let flow = operator.apply(&probability);
            probability += flow * dt;

            validate_probability(&probability, step)?;

            if !warned_negative && probability.iter().any(|&x| x < 0.0) {
                warn!(
                    step,
                    "negative probability entries appeared; \
                     the Euler step is marginally too large for this generator"
                );
                warned_negative = true;
            }

            means
                .row_mut(step)
                .copy_from(&space.weighted_means(&probability).transpose());
        }

        // ====== Step 4: Build Result ======

        Ok(Trajectory {
            times: grid.points().to_vec(),
            means,
        })
    }
}

// =================================================================================================
// Tests
// =================================================================================================
