//! cme-rs: Chemical Master Equation Framework
//!
//! A framework for exact master-equation analysis of stochastic chemical
//! reaction networks on truncated state spaces. Built with Rust for
//! performance and safety.
//!
//! # Architecture
//!
//! cme-rs is built on two core principles:
//!
//! 1. **Separation of Network and Numerics**
//!    - The reaction network defines rates and stoichiometry (what to solve)
//!    - Operators and solvers provide the computation (how to solve)
//!
//! 2. **One Canonical Indexing**
//!    - A single mixed-radix bijection between states and indices is used
//!      by the generator, every probability vector and every trajectory,
//!      and is a tested invariant rather than a convention
//!
//! Numerical capabilities the core does not own (eigen-decomposition and
//! the Poisson pmf) sit behind provider traits in [`numerics`], so the
//! pipeline is independent of the backing crates and testable against
//! mock backends.
//!
//! # Pipeline
//!
//! ```text
//! ReactionParameters ──┐
//!                      ├─► MasterOperatorBuilder ─► MasterOperator
//! StateSpace ──────────┘                              │
//!                      ┌──────────────────────────────┤
//!                      │                              │
//!             SteadyStateSolver              DynamicsIntegrator
//!             (stationary means)          (mean trajectory over a
//!                                          uniform time grid)
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use cme_rs::prelude::*;
//! use nalgebra::DVector;
//!
//! # fn main() -> Result<(), cme_rs::CmeError> {
//! // 1. A single-species birth-death network, truncated at 30 copies
//! let params = ReactionParameters::birth_death(
//!     DVector::from_vec(vec![1.0]),   // birth rate
//!     DVector::from_vec(vec![0.5]),   // death rate per molecule
//! )?;
//! let space = StateSpace::new(1, 30);
//!
//! // 2. Assemble the generator
//! let operator = MasterOperatorBuilder::new(params).build(&space)?;
//!
//! // 3. Stationary mean (analytically birth/death = 2.0)
//! let means = SteadyStateSolver::new().solve(&operator, &space)?;
//! assert!((means[0] - 2.0).abs() < 1e-6);
//!
//! // 4. Mean trajectory from an out-of-equilibrium start
//! let grid = TimeGrid::uniform(10.0, 1000)?;
//! let trajectory = DynamicsIntegrator::new()
//!     .integrate(&operator, &space, &grid, &DVector::from_vec(vec![0.5]))?;
//! assert_eq!(trajectory.len(), 1001);
//! # Ok(())
//! # }
//! ```
//!
//! # Truncation
//!
//! The state space is the finite box `[0, max_num]^num_species`.
//! Transitions leaving the box are dropped without renormalisation, so
//! probability leaks across the boundary; the bias grows with
//! the ratio of expected population to `max_num`. Increase `max_num`
//! until results stop moving.
//!
//! # Modules
//!
//! - [`network`]: reaction parameters and the truncated state space
//! - [`operator`]: generator assembly and the matrix-vector kernel
//! - [`solver`]: stationary analysis and forward integration
//! - [`numerics`]: provider traits, default backends, parallelism knobs

// Core modules
pub mod error;
pub mod network;
pub mod numerics;
pub mod operator;
pub mod solver;

pub use error::CmeError;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use cme_rs::prelude::*;
    //! ```
    pub use crate::error::CmeError;
    pub use crate::network::{ReactionParameters, StateSpace};
    pub use crate::numerics::{
        DistributionProvider, LinearAlgebraProvider, NalgebraProvider, StatrsProvider,
    };
    pub use crate::operator::{MasterOperator, MasterOperatorBuilder};
    pub use crate::solver::{
        DynamicsIntegrator, InitialDistributionBuilder, SteadyStateSolver, TimeGrid, Trajectory,
    };
}
