//! Canonical reaction networks for testing
//!
//! These networks have known analytical behaviour, making them ideal for
//! validating the assembled generator and both solvers.

use cme_rs::network::ReactionParameters;
use nalgebra::{DMatrix, DVector};

// =================================================================================================
// Birth-Death: ∅ -> A at rate b,  A -> ∅ at rate d per molecule
// =================================================================================================

/// Single-species linear birth-death network.
///
/// The untruncated chain has a Poisson(b/d) stationary distribution, so
/// the stationary mean is exactly `b/d`, the classic analytic check.
/// The mean relaxes as `m(t) = b/d + (m(0) - b/d) · exp(-d·t)`.
pub struct BirthDeath {
    pub birth: f64,
    pub death: f64,
}

impl BirthDeath {
    pub fn new(birth: f64, death: f64) -> Self {
        Self { birth, death }
    }

    /// The analytic stationary mean of the untruncated chain.
    pub fn stationary_mean(&self) -> f64 {
        self.birth / self.death
    }

    /// Analytic mean at time `t` from initial mean `m0`.
    pub fn mean_at(&self, t: f64, m0: f64) -> f64 {
        let eq = self.stationary_mean();
        eq + (m0 - eq) * (-self.death * t).exp()
    }

    pub fn parameters(&self) -> ReactionParameters {
        ReactionParameters::birth_death(
            DVector::from_vec(vec![self.birth]),
            DVector::from_vec(vec![self.death]),
        )
        .unwrap()
    }
}

/// Shorthand for `BirthDeath::new(birth, death).parameters()`.
pub fn birth_death_network(birth: f64, death: f64) -> ReactionParameters {
    BirthDeath::new(birth, death).parameters()
}

// =================================================================================================
// Dimerisation: ∅ -> A,  A -> ∅,  B -> ∅,  2A -> B
// =================================================================================================

/// Two-species network with one mass-action interaction channel.
///
/// No closed-form stationary mean; used for structural checks (generator
/// validity, multi-species indexing, pipeline smoke runs).
pub fn dimerisation_network(k: f64) -> ReactionParameters {
    ReactionParameters::new(
        DVector::from_vec(vec![1.0, 0.0]),
        DVector::from_vec(vec![0.2, 0.1]),
        DVector::from_vec(vec![k]),
        DMatrix::from_row_slice(1, 2, &[2, 0]),
        DMatrix::from_row_slice(1, 2, &[0, 1]),
    )
    .unwrap()
}
