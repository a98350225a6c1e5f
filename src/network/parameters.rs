//! Reaction-network parameters
//!
//! [`ReactionParameters`] carries the rate constants and stoichiometry of a
//! stochastic chemical reaction network:
//!
//! - a constant birth rate per species (zeroth-order production),
//! - a per-molecule death rate per species (first-order degradation),
//! - one mass-action rate constant per interaction channel, together with
//!   the channel's reactant and product stoichiometry.
//!
//! Construction validates every dimension once, so downstream components
//! (the operator builder above all) can index freely without re-checking.
//! Rate *semantics* are not validated beyond finiteness and sign: a
//! physically questionable network still produces a well-formed generator.
//!
//! # Example
//!
//! ```rust
//! use cme_rs::network::ReactionParameters;
//! use nalgebra::{DMatrix, DVector};
//!
//! // Dimerisation 2A -> B for two species A, B
//! let params = ReactionParameters::new(
//!     DVector::from_vec(vec![1.0, 0.0]),    // birth
//!     DVector::from_vec(vec![0.1, 0.05]),   // death
//!     DVector::from_vec(vec![0.02]),        // channel rates
//!     DMatrix::from_row_slice(1, 2, &[2, 0]),  // reactants
//!     DMatrix::from_row_slice(1, 2, &[0, 1]),  // products
//! ).unwrap();
//!
//! assert_eq!(params.num_species(), 2);
//! assert_eq!(params.num_channels(), 1);
//! ```

use nalgebra::{DMatrix, DVector};

use crate::error::CmeError;

// =================================================================================================
// Reaction Parameters
// =================================================================================================

/// Validated rate constants and stoichiometry for a reaction network.
///
/// Immutable after construction; the operator builder borrows it read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionParameters {
    // ==================== Per-species rates ====================
    /// Constant production rate per species (copies per unit time).
    birth_rates: DVector<f64>,
    /// Per-molecule degradation rate per species.
    death_rates: DVector<f64>,

    // ==================== Interaction channels ====================
    /// Mass-action rate constant per channel.
    interaction_rates: DVector<f64>,
    /// Reactant stoichiometry, channels × species.
    reactants: DMatrix<u32>,
    /// Product stoichiometry, channels × species.
    products: DMatrix<u32>,
}

impl ReactionParameters {
    /// Build a parameter set, validating all dimensions and rate signs.
    ///
    /// The species count is taken from `birth_rates`; everything else must
    /// agree with it. The channel count is taken from `interaction_rates`;
    /// both stoichiometry matrices must be channels × species. A network
    /// with zero channels (pure birth-death) is legal; pass empty
    /// `interaction_rates` and 0 × species matrices.
    pub fn new(
        birth_rates: DVector<f64>,
        death_rates: DVector<f64>,
        interaction_rates: DVector<f64>,
        reactants: DMatrix<u32>,
        products: DMatrix<u32>,
    ) -> Result<Self, CmeError> {
        let num_species = birth_rates.len();
        let num_channels = interaction_rates.len();

        if num_species == 0 {
            return Err(CmeError::EmptySpecies);
        }
        if death_rates.len() != num_species {
            return Err(CmeError::DimensionMismatch {
                what: "death_rates",
                expected: num_species,
                got: death_rates.len(),
            });
        }
        if reactants.nrows() != num_channels {
            return Err(CmeError::DimensionMismatch {
                what: "reactant stoichiometry rows",
                expected: num_channels,
                got: reactants.nrows(),
            });
        }
        if products.nrows() != num_channels {
            return Err(CmeError::DimensionMismatch {
                what: "product stoichiometry rows",
                expected: num_channels,
                got: products.nrows(),
            });
        }
        // A 0 x 0 stoichiometry matrix is accepted for channel-free
        // networks even though the species count is nonzero.
        if num_channels > 0 || reactants.ncols() != 0 {
            if reactants.ncols() != num_species {
                return Err(CmeError::DimensionMismatch {
                    what: "reactant stoichiometry columns",
                    expected: num_species,
                    got: reactants.ncols(),
                });
            }
            if products.ncols() != num_species {
                return Err(CmeError::DimensionMismatch {
                    what: "product stoichiometry columns",
                    expected: num_species,
                    got: products.ncols(),
                });
            }
        }

        Self::check_rates("birth", &birth_rates)?;
        Self::check_rates("death", &death_rates)?;
        Self::check_rates("interaction", &interaction_rates)?;

        Ok(Self {
            birth_rates,
            death_rates,
            interaction_rates,
            reactants,
            products,
        })
    }

    /// Convenience constructor for a pure birth-death network (no
    /// interaction channels).
    pub fn birth_death(
        birth_rates: DVector<f64>,
        death_rates: DVector<f64>,
    ) -> Result<Self, CmeError> {
        let num_species = birth_rates.len();
        Self::new(
            birth_rates,
            death_rates,
            DVector::zeros(0),
            DMatrix::zeros(0, num_species),
            DMatrix::zeros(0, num_species),
        )
    }

    fn check_rates(name: &'static str, rates: &DVector<f64>) -> Result<(), CmeError> {
        for (index, &value) in rates.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(CmeError::InvalidRate { name, index, value });
            }
        }
        Ok(())
    }

    // ==================== Accessors ====================

    /// Number of chemical species.
    pub fn num_species(&self) -> usize {
        self.birth_rates.len()
    }

    /// Number of interaction channels.
    pub fn num_channels(&self) -> usize {
        self.interaction_rates.len()
    }

    /// Constant production rate of species `j`.
    pub fn birth_rate(&self, j: usize) -> f64 {
        self.birth_rates[j]
    }

    /// Per-molecule degradation rate of species `j`.
    pub fn death_rate(&self, j: usize) -> f64 {
        self.death_rates[j]
    }

    /// Mass-action rate constant of channel `beta`.
    pub fn interaction_rate(&self, beta: usize) -> f64 {
        self.interaction_rates[beta]
    }

    /// Reactant stoichiometric coefficient of species `m` in channel `beta`.
    pub fn reactant(&self, beta: usize, m: usize) -> u32 {
        self.reactants[(beta, m)]
    }

    /// Product stoichiometric coefficient of species `m` in channel `beta`.
    pub fn product(&self, beta: usize, m: usize) -> u32 {
        self.products[(beta, m)]
    }

    /// Net stoichiometric change of species `m` under channel `beta`
    /// (products minus reactants, signed).
    pub fn net_change(&self, beta: usize, m: usize) -> i64 {
        self.products[(beta, m)] as i64 - self.reactants[(beta, m)] as i64
    }
}

// =================================================================================================
// Tests
// =================================================================================================
