//! Eigen-decomposition seam and the nalgebra-backed default
//!
//! The steady-state solver needs the full spectrum of the generator and an
//! eigenvector per eigenvalue. That capability is abstracted behind
//! [`LinearAlgebraProvider`] so the solver logic never touches a concrete
//! linear-algebra crate and tests can swap in hand-built decompositions.
//!
//! # The default backend
//!
//! [`NalgebraProvider`] computes the spectrum with nalgebra's real Schur
//! decomposition and recovers one real eigenvector per eigenvalue by
//! shifted inverse iteration:
//!
//! ```text
//! x_{k+1} = normalize( (A - σI)⁻¹ x_k ),   σ = Re(λ) + ε
//! ```
//!
//! The small diagonal offset ε keeps the LU factorisation nonsingular when
//! σ coincides with an exact eigenvalue. For a complex-conjugate pair the
//! real-shifted iteration cannot single out one member; it settles on a
//! real vector inside the pair's invariant subspace and stops at the
//! iteration cap. That is acceptable here: the consumers of this trait
//! only ever read the eigenvector of the dominant, essentially-real
//! eigenvalue of a generator matrix.
//!
//! Eigenvalues are returned in whatever order the Schur decomposition
//! produces them; callers must search, not assume sorting.

use nalgebra::{Complex, DMatrix, DVector};

use crate::error::CmeError;

/// Iteration cap for shifted inverse iteration.
const MAX_INVERSE_ITERATIONS: usize = 50;

/// Sign-agnostic convergence tolerance on successive iterates.
const INVERSE_ITERATION_TOL: f64 = 1e-13;

// =================================================================================================
// Decomposition Result
// =================================================================================================

/// A full eigen-decomposition of a real square matrix.
///
/// `eigenvectors` column `k` belongs to `eigenvalues[k]`. Eigenvalues are
/// unsorted; eigenvectors are real, unit-norm, and of arbitrary sign
/// (downstream consumers take absolute values before use).
#[derive(Debug, Clone)]
pub struct EigenDecomposition {
    /// The spectrum, in backend order.
    pub eigenvalues: Vec<Complex<f64>>,
    /// One unit-norm real eigenvector per eigenvalue, stored column-wise.
    pub eigenvectors: DMatrix<f64>,
}

impl EigenDecomposition {
    /// Dimension of the decomposed matrix.
    pub fn dim(&self) -> usize {
        self.eigenvalues.len()
    }

    /// The eigenvector belonging to `eigenvalues[k]`.
    pub fn eigenvector(&self, k: usize) -> DVector<f64> {
        self.eigenvectors.column(k).into_owned()
    }
}

// =================================================================================================
// Provider Trait
// =================================================================================================

/// Capability trait for dense eigen-decomposition.
///
/// # Responsibility
///
/// Produces the full spectrum and one real eigenvector per eigenvalue.
/// Does NOT select or order eigenpairs; that policy belongs to the
/// steady-state solver.
///
/// Implementations must be usable from multiple threads (`Send + Sync`);
/// they carry no per-call mutable state.
pub trait LinearAlgebraProvider: Send + Sync {
    /// Decompose a square matrix.
    ///
    /// # Errors
    ///
    /// Returns [`CmeError::EigenFailure`] when the backend cannot produce
    /// a decomposition (for instance a shifted solve that stays singular).
    fn eigen_decomposition(&self, matrix: &DMatrix<f64>) -> Result<EigenDecomposition, CmeError>;

    /// Backend name (used for diagnostics).
    fn name(&self) -> &str;
}

// =================================================================================================
// Default Provider (nalgebra)
// =================================================================================================

/// Default [`LinearAlgebraProvider`] built on nalgebra's Schur
/// decomposition and LU-based inverse iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraProvider;

impl NalgebraProvider {
    /// Create the default provider.
    pub fn new() -> Self {
        Self
    }

    /// One shifted inverse iteration run for eigenvalue real part `shift`.
    fn inverse_iteration(
        matrix: &DMatrix<f64>,
        shift: f64,
        scale: f64,
    ) -> Result<DVector<f64>, CmeError> {
        let n = matrix.nrows();

        // Regularised shift: keeps (A - σI) factorisable when σ is an
        // exact eigenvalue. The offset is far below the spectral spacing
        // of any physically meaningful generator, so the dominant
        // direction is unaffected.
        let mut offset = 1e-10 * scale;

        let lu = loop {
            let mut shifted = matrix.clone();
            for k in 0..n {
                shifted[(k, k)] -= shift + offset;
            }
            let lu = shifted.lu();
            if lu.is_invertible() {
                break lu;
            }
            offset *= 10.0;
            if offset > scale {
                return Err(CmeError::EigenFailure {
                    message: format!(
                        "shifted matrix stays singular near eigenvalue {}",
                        shift
                    ),
                });
            }
        };

        // Deterministic start vector with a mild index gradient so it is
        // not accidentally orthogonal to the target eigenvector.
        let mut x = DVector::from_fn(n, |i, _| 1.0 + 1e-3 * i as f64);
        let start_norm = x.norm();
        x /= start_norm;

        for _ in 0..MAX_INVERSE_ITERATIONS {
            let mut y = match lu.solve(&x) {
                Some(y) => y,
                None => {
                    return Err(CmeError::EigenFailure {
                        message: format!("inverse iteration solve failed at shift {}", shift),
                    })
                }
            };

            let norm = y.norm();
            if norm == 0.0 || !norm.is_finite() {
                return Err(CmeError::EigenFailure {
                    message: format!("inverse iteration collapsed at shift {}", shift),
                });
            }
            y /= norm;

            // Eigenvector sign is arbitrary, compare both orientations.
            let drift = (&y - &x).norm().min((&y + &x).norm());
            x = y;
            if drift < INVERSE_ITERATION_TOL {
                break;
            }
        }

        // Reaching the cap without the tolerance is expected for
        // complex-pair shifts; the last iterate lies in the invariant
        // subspace and is returned as the best real representative.
        Ok(x)
    }
}

impl LinearAlgebraProvider for NalgebraProvider {
    fn eigen_decomposition(&self, matrix: &DMatrix<f64>) -> Result<EigenDecomposition, CmeError> {
        assert_eq!(
            matrix.nrows(),
            matrix.ncols(),
            "eigen decomposition requires a square matrix, got {}x{}",
            matrix.nrows(),
            matrix.ncols()
        );

        let n = matrix.nrows();
        let spectrum = matrix.complex_eigenvalues();
        let scale = 1.0 + matrix.amax();

        let mut eigenvectors = DMatrix::zeros(n, n);
        for k in 0..n {
            let vector = Self::inverse_iteration(matrix, spectrum[k].re, scale)?;
            eigenvectors.set_column(k, &vector);
        }

        Ok(EigenDecomposition {
            eigenvalues: spectrum.iter().copied().collect(),
            eigenvectors,
        })
    }

    fn name(&self) -> &str {
        "nalgebra (Schur + inverse iteration)"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
