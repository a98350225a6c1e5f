//! The master operator (generator matrix)
//!
//! [`MasterOperator`] wraps the dense generator of the truncated chain.
//! The matrix is column-oriented: entry `(row, col)` is the transition
//! rate INTO state `row` FROM state `col`, so the Kolmogorov forward
//! equation reads `dP/dt = M · P` with `P` a column probability vector.
//!
//! # Invariants
//!
//! For a well-formed generator every off-diagonal entry is non-negative
//! and every column sums to zero (the diagonal carries the negative total
//! outflow of its state). The builder re-establishes the column-sum
//! property exactly with a single final pass per column;
//! [`MasterOperator::column_sum_defect`] measures how well a matrix honours
//! it, which the property tests rely on.

use nalgebra::{DMatrix, DVector};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "parallel")]
use crate::numerics::parallel_threshold;

// =================================================================================================
// Master Operator
// =================================================================================================

/// Dense column-oriented generator matrix over a truncated state space.
///
/// Owned value object: the builder produces it, the solvers borrow it
/// read-only. Row/column indices follow the canonical ordering of the
/// [`StateSpace`](crate::network::StateSpace) it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterOperator {
    matrix: DMatrix<f64>,
}

impl MasterOperator {
    /// Wrap an already-assembled generator matrix.
    ///
    /// # Panics
    ///
    /// Panics when the matrix is not square.
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        assert_eq!(
            matrix.nrows(),
            matrix.ncols(),
            "generator must be square, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        );
        Self { matrix }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Number of states (matrix dimension).
    pub fn dim(&self) -> usize {
        self.matrix.nrows()
    }

    /// Dense matrix-vector product `M · p`.
    ///
    /// This is the inner kernel of every Euler step. Above the
    /// [`parallel_threshold`](crate::numerics::parallel_threshold) and with
    /// the `parallel` feature enabled, rows are computed on the Rayon pool;
    /// each row writes a disjoint output entry so no synchronisation is
    /// needed.
    ///
    /// # Panics
    ///
    /// Panics when `probability` does not have one entry per state.
    pub fn apply(&self, probability: &DVector<f64>) -> DVector<f64> {
        let n = self.dim();
        assert_eq!(
            probability.len(),
            n,
            "probability vector has {} entries, generator has {} states",
            probability.len(),
            n
        );

        #[cfg(feature = "parallel")]
        {
            if n >= parallel_threshold() {
                let matrix = &self.matrix;
                let mut out = DVector::zeros(n);
                out.as_mut_slice()
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(row, entry)| {
                        let mut acc = 0.0;
                        for col in 0..n {
                            acc += matrix[(row, col)] * probability[col];
                        }
                        *entry = acc;
                    });
                return out;
            }
        }

        &self.matrix * probability
    }

    /// Largest diagonal magnitude `max_i |M_ii|`.
    ///
    /// The reciprocal bounds the stable explicit-Euler step: the dynamics
    /// integrator warns when `dt` exceeds it.
    pub fn max_diagonal_rate(&self) -> f64 {
        (0..self.dim())
            .map(|i| self.matrix[(i, i)].abs())
            .fold(0.0, f64::max)
    }

    /// Worst absolute column sum `max_i |Σ_r M[r, i]|`.
    ///
    /// For a generator assembled by the builder this is zero up to a
    /// single rounding of the column sum (the diagonal is written as the
    /// negated off-diagonal sum in one pass, but re-summing the column
    /// here visits the entries in a different order). Values well above
    /// machine precision indicate a matrix that is not a generator.
    pub fn column_sum_defect(&self) -> f64 {
        let n = self.dim();
        (0..n)
            .map(|i| self.matrix.column(i).sum().abs())
            .fold(0.0, f64::max)
    }

    /// Smallest off-diagonal entry (negative means the generator property
    /// is violated).
    pub fn min_off_diagonal(&self) -> f64 {
        let n = self.dim();
        let mut min = f64::INFINITY;
        for col in 0..n {
            for row in 0..n {
                if row != col {
                    min = min.min(self.matrix[(row, col)]);
                }
            }
        }
        if min.is_finite() {
            min
        } else {
            0.0
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_generator() -> MasterOperator {
        // Rates: 0 -> 1 at 2.0, 1 -> 0 at 3.0
        MasterOperator::from_matrix(DMatrix::from_row_slice(
            2,
            2,
            &[-2.0, 3.0, 2.0, -3.0],
        ))
    }

    #[test]
    fn test_apply_matches_matrix_product() {
        let operator = two_state_generator();
        let p = DVector::from_vec(vec![0.25, 0.75]);

        let result = operator.apply(&p);
        let expected = operator.matrix() * &p;

        assert!((result - expected).norm() < 1e-14);
    }

    #[test]
    fn test_apply_preserves_total_mass_derivative() {
        // Columns sum to zero, so 1ᵀ (M p) = 0: total probability is
        // conserved by the exact dynamics.
        let operator = two_state_generator();
        let p = DVector::from_vec(vec![0.4, 0.6]);
        let dp = operator.apply(&p);
        assert!(dp.sum().abs() < 1e-14);
    }

    #[test]
    fn test_max_diagonal_rate() {
        let operator = two_state_generator();
        assert_eq!(operator.max_diagonal_rate(), 3.0);
    }

    #[test]
    fn test_column_sum_defect_zero_for_generator() {
        let operator = two_state_generator();
        assert_eq!(operator.column_sum_defect(), 0.0);
    }

    #[test]
    fn test_column_sum_defect_detects_broken_column() {
        let broken = MasterOperator::from_matrix(DMatrix::from_row_slice(
            2,
            2,
            &[-2.0, 3.0, 2.5, -3.0],
        ));
        assert!((broken.column_sum_defect() - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_min_off_diagonal() {
        let operator = two_state_generator();
        assert_eq!(operator.min_off_diagonal(), 2.0);
    }

    #[test]
    #[should_panic(expected = "generator must be square")]
    fn test_non_square_rejected() {
        MasterOperator::from_matrix(DMatrix::zeros(2, 3));
    }

    #[test]
    #[should_panic(expected = "probability vector has")]
    fn test_apply_dimension_mismatch_panics() {
        let operator = two_state_generator();
        operator.apply(&DVector::zeros(3));
    }
}
