//! Poisson pmf seam and the statrs-backed default
//!
//! The initial-distribution builder evaluates the Poisson probability mass
//! function once per (species, copy number) pair. The evaluation sits
//! behind [`DistributionProvider`] so the builder logic does not depend on
//! statrs directly and tests can substitute exact hand-computed masses.

use statrs::distribution::{Discrete, Poisson};

// =================================================================================================
// Provider Trait
// =================================================================================================

/// Capability trait for discrete probability mass functions.
pub trait DistributionProvider: Send + Sync {
    /// Poisson probability mass `P[X = count]` for rate parameter `mean`.
    ///
    /// `mean = 0` is the degenerate point mass at zero: probability 1 for
    /// `count = 0`, probability 0 otherwise.
    ///
    /// # Panics
    ///
    /// May panic when `mean` is negative or non-finite. Callers validate
    /// means before evaluation, so a bad value here is a caller bug.
    fn poisson_pmf(&self, mean: f64, count: u32) -> f64;

    /// Backend name (used for diagnostics).
    fn name(&self) -> &str;
}

// =================================================================================================
// Default Provider (statrs)
// =================================================================================================

/// Default [`DistributionProvider`] bridging [`statrs::distribution::Poisson`].
///
/// statrs parameterises Poisson by a strictly positive λ, so the λ = 0
/// point mass is special-cased before the bridge.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatrsProvider;

impl StatrsProvider {
    /// Create the default provider.
    pub fn new() -> Self {
        Self
    }
}

impl DistributionProvider for StatrsProvider {
    fn poisson_pmf(&self, mean: f64, count: u32) -> f64 {
        assert!(
            mean.is_finite() && mean >= 0.0,
            "Poisson mean must be finite and >= 0, got {}",
            mean
        );

        if mean == 0.0 {
            return if count == 0 { 1.0 } else { 0.0 };
        }

        match Poisson::new(mean) {
            Ok(dist) => dist.pmf(count as u64),
            // Positivity and finiteness are asserted above; statrs has no
            // other failure mode for Poisson.
            Err(e) => unreachable!("Poisson::new({}) rejected a valid mean: {}", mean, e),
        }
    }

    fn name(&self) -> &str {
        "statrs (Poisson)"
    }
}

// =================================================================================================
// Tests
// =================================================================================================
