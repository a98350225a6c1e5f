//! Product-Poisson initial distributions
//!
//! Forward integration needs a starting probability vector. Given target
//! mean copy numbers `x0`, the builder assigns each state the product of
//! per-species Poisson masses:
//!
//! ```text
//! P[s] = Π_j  pmf_Poisson(x0[j])(s[j])
//! ```
//!
//! No explicit renormalisation is applied: over the untruncated lattice
//! the product is inherently normalised, and over the truncated box the
//! missing mass is exactly the Poisson tail beyond `max_num`. The sum
//! therefore falls below 1 when `x0` is large relative to the truncation
//! bound; callers tolerate this the same way they tolerate truncation
//! leakage in the generator itself.

use nalgebra::DVector;

use crate::error::CmeError;
use crate::network::StateSpace;
use crate::numerics::{DistributionProvider, StatrsProvider};

// =================================================================================================
// Initial Distribution Builder
// =================================================================================================

/// Builds product-Poisson probability vectors over a truncated state
/// space.
///
/// Generic over the [`DistributionProvider`] so tests can substitute
/// exact hand-computed masses.
#[derive(Debug, Clone)]
pub struct InitialDistributionBuilder<D = StatrsProvider> {
    provider: D,
}

impl InitialDistributionBuilder<StatrsProvider> {
    /// Builder backed by the default statrs provider.
    pub fn new() -> Self {
        Self {
            provider: StatrsProvider::new(),
        }
    }
}

impl Default for InitialDistributionBuilder<StatrsProvider> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DistributionProvider> InitialDistributionBuilder<D> {
    /// Builder with a caller-supplied distribution backend.
    pub fn with_provider(provider: D) -> Self {
        Self { provider }
    }

    /// The product-Poisson vector for target means `x0`, in canonical
    /// state order.
    ///
    /// # Errors
    ///
    /// - [`CmeError::DimensionMismatch`] when `x0` does not have one
    ///   entry per species.
    /// - [`CmeError::InvalidInitialMean`] when an entry is negative or
    ///   non-finite.
    pub fn build(
        &self,
        space: &StateSpace,
        x0: &DVector<f64>,
    ) -> Result<DVector<f64>, CmeError> {
        if x0.len() != space.num_species() {
            return Err(CmeError::DimensionMismatch {
                what: "initial means",
                expected: space.num_species(),
                got: x0.len(),
            });
        }
        for (index, &value) in x0.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(CmeError::InvalidInitialMean { index, value });
            }
        }

        // Per-species pmf tables up to max_num, evaluated once instead of
        // once per state.
        let tables: Vec<Vec<f64>> = (0..space.num_species())
            .map(|j| {
                (0..=space.max_num())
                    .map(|count| self.provider.poisson_pmf(x0[j], count))
                    .collect()
            })
            .collect();

        let mut probability = DVector::zeros(space.len());
        for (i, state) in space.states().enumerate() {
            let mut mass = 1.0;
            for (j, &s) in state.iter().enumerate() {
                mass *= tables[j][s as usize];
            }
            probability[i] = mass;
        }

        Ok(probability)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
