//! Generator assembly from reaction parameters
//!
//! [`MasterOperatorBuilder`] walks every state of the truncated box and
//! inserts the outgoing transition rates of three reaction classes into
//! the generator:
//!
//! - **Degradation** (per species): mass-action, rate `death[j] * s[j]`,
//!   destination has coordinate `j` decremented.
//! - **Production** (per species): constant rate `birth[j]`, destination
//!   has coordinate `j` incremented.
//! - **Interaction** (per channel): mass-action propensity
//!   `α · k[β] · Π_m s[m]·(s[m]−1)·…·(s[m]−R[β,m]+1)`, destination shifted
//!   by the channel's net stoichiometry.
//!
//! Transitions whose destination leaves the box are dropped without
//! renormalisation. Truncation therefore leaks probability, with a bias
//! that grows with the ratio of expected population to `max_num`.
//!
//! Because state `i` only ever writes into column `i`, columns are
//! independent work units. nalgebra stores matrices column-major, so the
//! assembly hands disjoint column slices to Rayon when the `parallel`
//! feature is enabled and the state space is above the threshold. The
//! diagonal of a column is written once, after all of that column's
//! insertions, as the negated off-diagonal sum, re-establishing the
//! zero-column-sum generator invariant exactly instead of accumulating it
//! through floating-point round-off.
//!
//! # Example
//!
//! ```rust
//! use cme_rs::network::{ReactionParameters, StateSpace};
//! use cme_rs::operator::MasterOperatorBuilder;
//! use nalgebra::DVector;
//!
//! let params = ReactionParameters::birth_death(
//!     DVector::from_vec(vec![1.0]),
//!     DVector::from_vec(vec![0.5]),
//! ).unwrap();
//!
//! let space = StateSpace::new(1, 20);
//! let operator = MasterOperatorBuilder::new(params).build(&space).unwrap();
//!
//! assert_eq!(operator.dim(), 21);
//! assert!(operator.column_sum_defect() < 1e-12);
//! ```

use nalgebra::DMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
use crate::numerics::parallel_threshold;

use crate::error::CmeError;
use crate::network::{ReactionParameters, StateSpace};
use crate::operator::MasterOperator;

// =================================================================================================
// Builder
// =================================================================================================

/// Assembles the [`MasterOperator`] of a reaction network over a truncated
/// state space.
///
/// The Plefka expansion parameter `α` scales interaction-channel rates
/// only (birth and death are unaffected); it defaults to 1.0, the
/// unperturbed network.
#[derive(Debug, Clone)]
pub struct MasterOperatorBuilder {
    parameters: ReactionParameters,
    alpha: f64,
}

impl MasterOperatorBuilder {
    /// Create a builder with `α = 1.0`.
    pub fn new(parameters: ReactionParameters) -> Self {
        Self {
            parameters,
            alpha: 1.0,
        }
    }

    /// Override the Plefka expansion parameter.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Current Plefka expansion parameter.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// The reaction parameters this builder assembles from.
    pub fn parameters(&self) -> &ReactionParameters {
        &self.parameters
    }

    /// Assemble the generator over `space`.
    ///
    /// # Errors
    ///
    /// Returns [`CmeError::DimensionMismatch`] when the state space and
    /// the reaction parameters disagree on the species count. Rate
    /// *semantics* are never validated here: parameters passed through
    /// [`ReactionParameters::new`] are already known to be finite and
    /// non-negative.
    pub fn build(&self, space: &StateSpace) -> Result<MasterOperator, CmeError> {
        if space.num_species() != self.parameters.num_species() {
            return Err(CmeError::DimensionMismatch {
                what: "state space species count",
                expected: self.parameters.num_species(),
                got: space.num_species(),
            });
        }

        let n = space.len();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        // Column-major storage: chunks of n elements are whole columns, so
        // each closure owns the full column of its state and no two
        // threads ever share a slice.
        #[cfg(feature = "parallel")]
        {
            if n >= parallel_threshold() {
                matrix
                    .as_mut_slice()
                    .par_chunks_mut(n)
                    .enumerate()
                    .for_each(|(i, column)| self.fill_column(space, i, column));
                return Ok(MasterOperator::from_matrix(matrix));
            }
        }

        matrix
            .as_mut_slice()
            .chunks_mut(n)
            .enumerate()
            .for_each(|(i, column)| self.fill_column(space, i, column));

        Ok(MasterOperator::from_matrix(matrix))
    }

    /// Insert every outgoing rate of state `i` into its generator column,
    /// then write the diagonal.
    fn fill_column(&self, space: &StateSpace, i: usize, column: &mut [f64]) {
        let state = space.state_at(i);
        let num_species = space.num_species();
        let mut target = state.clone();

        // ====== Degradation: s[j] -> s[j] - 1 at rate death[j] * s[j] ======

        for j in 0..num_species {
            if state[j] >= 1 {
                target[j] = state[j] - 1;
                column[space.index_of(&target)] += self.parameters.death_rate(j) * state[j] as f64;
                target[j] = state[j];
            }
        }

        // ====== Production: s[j] -> s[j] + 1 at rate birth[j] ======

        for j in 0..num_species {
            if state[j] < space.max_num() {
                target[j] = state[j] + 1;
                column[space.index_of(&target)] += self.parameters.birth_rate(j);
                target[j] = state[j];
            }
        }

        // ====== Interaction channels: mass-action propensities ======

        for beta in 0..self.parameters.num_channels() {
            let mut rate = self.alpha * self.parameters.interaction_rate(beta);
            let mut inside = true;

            for m in 0..num_species {
                let shifted = state[m] as i64 + self.parameters.net_change(beta, m);
                if shifted < 0 || shifted > space.max_num() as i64 {
                    // Destination outside the truncation box: drop the
                    // transition, no renormalisation.
                    inside = false;
                    break;
                }
                target[m] = shifted as u32;
                rate *= falling_factorial(state[m], self.parameters.reactant(beta, m));
            }

            if inside && rate != 0.0 {
                column[space.index_of(&target)] += rate;
            }
            target.copy_from_slice(&state);
        }

        // ====== Diagonal: negated off-diagonal column sum, written once ======

        // Overwriting (rather than accumulating during insertion) both
        // enforces the zero-column-sum invariant exactly and discards any
        // self-loop mass from channels with zero net stoichiometry.
        let mut outflow = 0.0;
        for (row, &entry) in column.iter().enumerate() {
            if row != i {
                outflow += entry;
            }
        }
        column[i] = -outflow;
    }
}

/// Falling factorial `s · (s−1) · … · (s−r+1)`: the number of ordered ways
/// to pick `r` reactant molecules out of `s` present.
///
/// Zero when `r > s` (not enough molecules), one when `r == 0`.
#[inline]
fn falling_factorial(s: u32, r: u32) -> f64 {
    if r > s {
        return 0.0;
    }
    let mut product = 1.0;
    for k in 0..r {
        product *= (s - k) as f64;
    }
    product
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DVector;

    fn birth_death_params(birth: f64, death: f64) -> ReactionParameters {
        ReactionParameters::birth_death(
            DVector::from_vec(vec![birth]),
            DVector::from_vec(vec![death]),
        )
        .unwrap()
    }

    /// Dimerisation 2A -> B over two species.
    fn dimerisation_params(k: f64) -> ReactionParameters {
        ReactionParameters::new(
            DVector::from_vec(vec![1.0, 0.0]),
            DVector::from_vec(vec![0.1, 0.05]),
            DVector::from_vec(vec![k]),
            DMatrix::from_row_slice(1, 2, &[2, 0]),
            DMatrix::from_row_slice(1, 2, &[0, 1]),
        )
        .unwrap()
    }

    // ====== Falling factorial ======

    #[test]
    fn test_falling_factorial_values() {
        assert_eq!(falling_factorial(5, 0), 1.0);
        assert_eq!(falling_factorial(5, 1), 5.0);
        assert_eq!(falling_factorial(5, 2), 20.0);
        assert_eq!(falling_factorial(5, 5), 120.0);
        assert_eq!(falling_factorial(3, 4), 0.0);
        assert_eq!(falling_factorial(0, 1), 0.0);
        assert_eq!(falling_factorial(0, 0), 1.0);
    }

    // ====== Generator validity ======

    #[test]
    fn test_columns_sum_to_zero() {
        let space = StateSpace::new(2, 4);
        let operator = MasterOperatorBuilder::new(dimerisation_params(0.3))
            .build(&space)
            .unwrap();
        assert!(
            operator.column_sum_defect() < 1e-12,
            "defect {}",
            operator.column_sum_defect()
        );
    }

    #[test]
    fn test_off_diagonals_non_negative() {
        let space = StateSpace::new(2, 4);
        let operator = MasterOperatorBuilder::new(dimerisation_params(0.3))
            .build(&space)
            .unwrap();
        assert!(operator.min_off_diagonal() >= 0.0);
    }

    // ====== Degradation ======

    #[test]
    fn test_degradation_scales_with_copy_number() {
        let death = 0.7;
        let space = StateSpace::new(1, 10);
        let operator = MasterOperatorBuilder::new(birth_death_params(0.0, death))
            .build(&space)
            .unwrap();

        // Entry (s-1, s) is the degradation rate out of state s
        for s in 1..=10u32 {
            let from = space.index_of(&[s]);
            let to = space.index_of(&[s - 1]);
            let entry = operator.matrix()[(to, from)];
            assert!(
                (entry - death * s as f64).abs() < 1e-14,
                "degradation from s={} is {}, expected {}",
                s,
                entry,
                death * s as f64
            );
        }
    }

    #[test]
    fn test_no_degradation_outflow_at_zero_copies() {
        let space = StateSpace::new(1, 5);
        let operator = MasterOperatorBuilder::new(birth_death_params(0.0, 2.0))
            .build(&space)
            .unwrap();

        // State 0 has no outgoing transitions at all here (no birth), so
        // its entire column is zero.
        let column = operator.matrix().column(space.index_of(&[0]));
        assert!(column.iter().all(|&x| x == 0.0));
    }

    // ====== Production ======

    #[test]
    fn test_production_is_population_independent() {
        let birth = 1.3;
        let space = StateSpace::new(1, 6);
        let operator = MasterOperatorBuilder::new(birth_death_params(birth, 0.0))
            .build(&space)
            .unwrap();

        for s in 0..6u32 {
            let from = space.index_of(&[s]);
            let to = space.index_of(&[s + 1]);
            assert!((operator.matrix()[(to, from)] - birth).abs() < 1e-14);
        }
    }

    #[test]
    fn test_production_dropped_at_truncation_boundary() {
        let space = StateSpace::new(1, 6);
        let operator = MasterOperatorBuilder::new(birth_death_params(1.3, 0.0))
            .build(&space)
            .unwrap();

        // State max_num has no in-box destination for production: its
        // column must be all zero (truncation leakage, no renormalisation).
        let column = operator.matrix().column(space.index_of(&[6]));
        assert!(column.iter().all(|&x| x == 0.0));
    }

    // ====== Interaction channels ======

    #[test]
    fn test_dimerisation_propensity() {
        let k = 0.3;
        let space = StateSpace::new(2, 6);
        let operator = MasterOperatorBuilder::new(dimerisation_params(k))
            .build(&space)
            .unwrap();

        // From (a=3, b=1): propensity k * 3 * 2, destination (1, 2)
        let from = space.index_of(&[3, 1]);
        let to = space.index_of(&[1, 2]);
        assert!((operator.matrix()[(to, from)] - k * 6.0).abs() < 1e-14);

        // From (a=1, b=0): falling factorial of 1 taken 2 is zero
        let from = space.index_of(&[1, 0]);
        let to_candidates: f64 = operator
            .matrix()
            .column(from)
            .iter()
            .enumerate()
            .filter(|&(row, _)| row != from)
            .map(|(_, &x)| x)
            .sum();
        // Only birth of A and death of A remain in that column
        assert!((to_candidates - (1.0 + 0.1)).abs() < 1e-14);
    }

    #[test]
    fn test_alpha_scales_interactions_only() {
        let space = StateSpace::new(2, 5);
        let full = MasterOperatorBuilder::new(dimerisation_params(0.4))
            .build(&space)
            .unwrap();
        let half = MasterOperatorBuilder::new(dimerisation_params(0.4))
            .with_alpha(0.5)
            .build(&space)
            .unwrap();

        let from = space.index_of(&[4, 0]);
        let to = space.index_of(&[2, 1]);
        assert!(
            (half.matrix()[(to, from)] - 0.5 * full.matrix()[(to, from)]).abs() < 1e-14
        );

        // Birth entries are untouched by alpha
        let to_birth = space.index_of(&[5, 0]);
        assert_eq!(
            half.matrix()[(to_birth, from)],
            full.matrix()[(to_birth, from)]
        );
    }

    #[test]
    fn test_out_of_box_interaction_dropped() {
        // Channel B -> A + B (net +1 on A) from a = max_num leaves the box
        let params = ReactionParameters::new(
            DVector::from_vec(vec![0.0, 0.0]),
            DVector::from_vec(vec![0.0, 0.0]),
            DVector::from_vec(vec![1.0]),
            DMatrix::from_row_slice(1, 2, &[0, 1]),
            DMatrix::from_row_slice(1, 2, &[1, 1]),
        )
        .unwrap();

        let space = StateSpace::new(2, 3);
        let operator = MasterOperatorBuilder::new(params).build(&space).unwrap();

        let column = operator.matrix().column(space.index_of(&[3, 2]));
        assert!(column.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_zero_net_change_channel_leaves_diagonal_clean() {
        // Channel A -> A (catalytic no-op): destination equals source, so
        // the overwrite pass must leave a zero column.
        let params = ReactionParameters::new(
            DVector::from_vec(vec![0.0]),
            DVector::from_vec(vec![0.0]),
            DVector::from_vec(vec![2.0]),
            DMatrix::from_row_slice(1, 1, &[1]),
            DMatrix::from_row_slice(1, 1, &[1]),
        )
        .unwrap();

        let space = StateSpace::new(1, 4);
        let operator = MasterOperatorBuilder::new(params).build(&space).unwrap();

        assert_eq!(operator.column_sum_defect(), 0.0);
        for i in 0..space.len() {
            assert_eq!(operator.matrix()[(i, i)], 0.0);
        }
    }

    // ====== Validation ======

    #[test]
    fn test_species_count_mismatch() {
        let space = StateSpace::new(2, 3);
        let result = MasterOperatorBuilder::new(birth_death_params(1.0, 0.5)).build(&space);
        assert!(matches!(
            result,
            Err(CmeError::DimensionMismatch {
                what: "state space species count",
                expected: 1,
                got: 2,
            })
        ));
    }

    // ====== Execution paths ======

    #[test]
    fn test_parallel_and_sequential_paths_agree() {
        let params = dimerisation_params(0.3);
        let space = StateSpace::new(2, 5);

        let sequential = {
            let _guard = crate::numerics::ThresholdGuard::save(usize::MAX);
            MasterOperatorBuilder::new(params.clone())
                .build(&space)
                .unwrap()
        };
        let low_threshold = {
            let _guard = crate::numerics::ThresholdGuard::save(1);
            MasterOperatorBuilder::new(params).build(&space).unwrap()
        };

        assert_eq!(sequential.matrix(), low_threshold.matrix());
    }
}
