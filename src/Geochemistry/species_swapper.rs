//! # Basis species swapper
//!
//! ## Aim
//! Replace one basis species of a `ChemicalSystemModel` with one of its equilibrium
//! species and re-express the whole reaction network in the new basis.  A solver does
//! this whenever its current basis choice turns out to be ill-posed (for instance the
//! molality estimate of a basis species has become invalid) and a better-behaved
//! secondary species should take its place.
//!
//! ## How a swap works
//! The swap matrix S is the identity except that the row of the outgoing basis species
//! is replaced with the stoichiometric row of the incoming equilibrium species, so S
//! expresses the new basis in terms of the old one.  S is SVD-factorized; the swap is
//! rejected as non-invertible when any singular value is tiny relative to the L1 norm
//! of all singular values.  The retained inverse then right-multiplies every
//! stoichiometric table (equilibrium, redox, kinetic), the equilibrium constants are
//! corrected with the log10K of the species entering the basis, physical properties
//! are exchanged pairwise, and kinetic rate laws are re-pointed at the new slots.
//! Bulk compositions co-transform with the transposed inverse.
//!
//! ## Key Methods
//! - `check_swap()` / `check_swap_by_name()`: validation only, no mutation
//! - `perform_swap()` and friends: validation followed by the in-place update
//! - `find_best_eqm_swap()`: heuristic choice of the best replacement candidate
//!
//! Validation always completes before any mutation begins, so a failed swap leaves
//! the model exactly as it was; there is no rollback logic because none is needed.

use crate::Geochemistry::chemical_model::ChemicalSystemModel;
use log::{debug, info};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// error types for basis swaps; every failure carries a readable message and
/// leaves the model untouched
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("Cannot remove {0} from the basis")]
    InvalidTarget(String),
    #[error("{index} exceeds the number of {collection} in the problem")]
    OutOfRange {
        index: usize,
        collection: &'static str,
    },
    #[error("{0} is not in the basis, so cannot be removed from the basis")]
    NotInBasis(String),
    #[error("{0} is not an equilibrium species, so cannot be removed from the equilibrium species list")]
    NotEquilibriumSpecies(String),
    #[error("Equilibrium species {0} is involved in surface sorption so cannot be swapped into the basis")]
    IllegalSorptionSwap(String),
    #[error("Matrix is not invertible, which signals an invalid basis swap")]
    NonInvertibleSwap,
    #[error("{vector} has size {found} which differs from the expected size {expected}")]
    SizeMismatch {
        vector: &'static str,
        found: usize,
        expected: usize,
    },
    #[error("SpeciesSwapper constructed with incorrect basis_species size: configured for {configured} but the model holds {model}")]
    ConstructionMismatch { configured: usize, model: usize },
    #[error("Equilibrium species {0} is the redox left-hand side so cannot be swapped into the basis")]
    RedoxLhsSwap(String),
}

/// Performs and validates basis swaps on a `ChemicalSystemModel`.  Stateless with
/// respect to the model; owns only scratch matrices sized to the basis dimension,
/// which are overwritten on every `check_swap`.  Construct one per basis dimension
/// and reuse it serially for as many swaps as needed.  Not reentrant: do not share
/// one swapper (or one model) across threads.
pub struct SpeciesSwapper {
    basis_size: usize,
    /// coefficients with magnitude below this are snapped to zero after
    /// re-expression, and it also sets the SVD invertibility threshold
    stoi_tol: f64,
    /// the swap matrix S of the last successful check ("new basis in terms of old")
    swap_matrix: DMatrix<f64>,
    /// inverse of the swap matrix, built from the SVD factors
    inv_swap_matrix: DMatrix<f64>,
}

impl SpeciesSwapper {
    pub fn new(basis_size: usize, stoi_tol: f64) -> Self {
        Self {
            basis_size,
            stoi_tol,
            swap_matrix: DMatrix::zeros(basis_size, basis_size),
            inv_swap_matrix: DMatrix::zeros(basis_size, basis_size),
        }
    }

    /// Validate the swap that removes basis species `basis_to_remove` and inserts
    /// equilibrium species `eqm_to_insert`, without mutating the model.  On success
    /// the swap matrix and its inverse are retained for `perform_swap`.
    pub fn check_swap(
        &mut self,
        model: &ChemicalSystemModel,
        basis_to_remove: usize,
        eqm_to_insert: usize,
    ) -> Result<(), SwapError> {
        if model.basis_size() != self.basis_size {
            return Err(SwapError::ConstructionMismatch {
                configured: self.basis_size,
                model: model.basis_size(),
            });
        }
        if basis_to_remove == 0 {
            return Err(SwapError::InvalidTarget(model.basis.name_of(0).to_string()));
        }
        if basis_to_remove >= self.basis_size {
            return Err(SwapError::OutOfRange {
                index: basis_to_remove,
                collection: "basis species",
            });
        }
        if eqm_to_insert >= model.num_eqm_species() {
            return Err(SwapError::OutOfRange {
                index: eqm_to_insert,
                collection: "equilibrium species",
            });
        }
        if model.surface_sorption_related[eqm_to_insert] {
            return Err(SwapError::IllegalSorptionSwap(
                model.eqm.name_of(eqm_to_insert).to_string(),
            ));
        }
        // Model construction guarantees the redox left-hand side is never offered
        // for the basis; refuse explicitly rather than guess its swap semantics.
        if !model.redox_lhs.is_empty() && model.eqm.name_of(eqm_to_insert) == model.redox_lhs {
            return Err(SwapError::RedoxLhsSwap(
                model.eqm.name_of(eqm_to_insert).to_string(),
            ));
        }
        self.construct_inverse_swap_matrix(model, basis_to_remove, eqm_to_insert)
    }

    /// name-based variant of `check_swap`; resolves the names and delegates
    pub fn check_swap_by_name(
        &mut self,
        model: &ChemicalSystemModel,
        replace_this: &str,
        with_this: &str,
    ) -> Result<(), SwapError> {
        let (basis_to_remove, eqm_to_insert) = resolve_names(model, replace_this, with_this)?;
        self.check_swap(model, basis_to_remove, eqm_to_insert)
    }

    /// Validate and then perform the swap, mutating the model in place: names and
    /// positions are exchanged, the swap history is extended, every stoichiometric
    /// and log10K table is re-expressed in the new basis, physical properties are
    /// exchanged, and kinetic rate laws are re-pointed.
    pub fn perform_swap(
        &mut self,
        model: &mut ChemicalSystemModel,
        basis_to_remove: usize,
        eqm_to_insert: usize,
    ) -> Result<(), SwapError> {
        self.check_swap(model, basis_to_remove, eqm_to_insert)?;
        info!(
            "swapping {} out of the basis and {} in",
            model.basis.name_of(basis_to_remove),
            model.eqm.name_of(eqm_to_insert)
        );
        self.alter_model(model, basis_to_remove, eqm_to_insert);
        Ok(())
    }

    /// name-based variant of `perform_swap`
    pub fn perform_swap_by_name(
        &mut self,
        model: &mut ChemicalSystemModel,
        replace_this: &str,
        with_this: &str,
    ) -> Result<(), SwapError> {
        let (basis_to_remove, eqm_to_insert) = resolve_names(model, replace_this, with_this)?;
        self.perform_swap(model, basis_to_remove, eqm_to_insert)
    }

    /// Like `perform_swap`, but also co-transforms a caller-owned bulk composition
    /// vector: bulk_new = S^-1^T * bulk_old.  The size check happens before any
    /// mutation, so a mismatched vector leaves both model and vector untouched.
    pub fn perform_swap_with_bulk(
        &mut self,
        model: &mut ChemicalSystemModel,
        bulk_composition: &mut DVector<f64>,
        basis_to_remove: usize,
        eqm_to_insert: usize,
    ) -> Result<(), SwapError> {
        if bulk_composition.len() != self.basis_size {
            return Err(SwapError::SizeMismatch {
                vector: "bulk_composition",
                found: bulk_composition.len(),
                expected: self.basis_size,
            });
        }
        self.perform_swap(model, basis_to_remove, eqm_to_insert)?;
        let transformed = self.inv_swap_matrix.transpose() * &*bulk_composition;
        *bulk_composition = transformed;
        Ok(())
    }

    /// name-based variant of `perform_swap_with_bulk`
    pub fn perform_swap_with_bulk_by_name(
        &mut self,
        model: &mut ChemicalSystemModel,
        bulk_composition: &mut DVector<f64>,
        replace_this: &str,
        with_this: &str,
    ) -> Result<(), SwapError> {
        let (basis_to_remove, eqm_to_insert) = resolve_names(model, replace_this, with_this)?;
        self.perform_swap_with_bulk(model, bulk_composition, basis_to_remove, eqm_to_insert)
    }

    /// Heuristic search for the best equilibrium species to swap in for the given
    /// basis species.  Every equilibrium species with a nonzero stoichiometric
    /// coefficient on `basis_ind` is a candidate unless it is a mineral, gas or
    /// sorption-related species excluded by the corresponding flag.  Candidates are
    /// scored by |coefficient| * molality and the maximum wins, ties going to the
    /// highest index.  Returns `Ok(None)` when nothing passes the filters.
    pub fn find_best_eqm_swap(
        &self,
        basis_ind: usize,
        model: &ChemicalSystemModel,
        eqm_molality: &DVector<f64>,
        minerals_allowed: bool,
        gas_allowed: bool,
        sorption_allowed: bool,
    ) -> Result<Option<usize>, SwapError> {
        if basis_ind >= model.basis_size() {
            return Err(SwapError::OutOfRange {
                index: basis_ind,
                collection: "basis species",
            });
        }
        if eqm_molality.len() != model.num_eqm_species() {
            return Err(SwapError::SizeMismatch {
                vector: "eqm_molality",
                found: eqm_molality.len(),
                expected: model.num_eqm_species(),
            });
        }
        let mut best: Option<usize> = None;
        let mut best_score = 0.0;
        for j in 0..model.num_eqm_species() {
            let coeff = model.eqm_stoichiometry[(j, basis_ind)];
            if coeff == 0.0 {
                continue;
            }
            if model.eqm_species_mineral[j] && !minerals_allowed {
                continue;
            }
            if model.eqm_species_gas[j] && !gas_allowed {
                continue;
            }
            if model.surface_sorption_related[j] && !sorption_allowed {
                continue;
            }
            let score = coeff.abs() * eqm_molality[j];
            if best.is_none() || score >= best_score {
                best = Some(j);
                best_score = score;
            }
        }
        if let Some(j) = best {
            debug!(
                "best swap candidate for basis species {} is {} with score {}",
                model.basis.name_of(basis_ind),
                model.eqm.name_of(j),
                best_score
            );
        }
        Ok(best)
    }

    /// Build the swap matrix (identity with row `basis_to_remove` overwritten by the
    /// stoichiometry of `eqm_to_insert`), SVD-factorize it and keep its inverse.
    /// The invertibility test compares each |singular value| against stoi_tol times
    /// the L1 norm of all singular values.
    fn construct_inverse_swap_matrix(
        &mut self,
        model: &ChemicalSystemModel,
        basis_to_remove: usize,
        eqm_to_insert: usize,
    ) -> Result<(), SwapError> {
        let n = self.basis_size;
        self.swap_matrix = DMatrix::identity(n, n);
        self.swap_matrix
            .set_row(basis_to_remove, &model.eqm_stoichiometry.row(eqm_to_insert));

        let svd = self.swap_matrix.clone().svd(true, true);
        let l1_norm: f64 = svd.singular_values.iter().map(|sv| sv.abs()).sum();
        for sv in svd.singular_values.iter() {
            if sv.abs() / l1_norm < self.stoi_tol {
                debug!(
                    "rejecting swap: singular value {} below tolerance {} of L1 norm {}",
                    sv, self.stoi_tol, l1_norm
                );
                return Err(SwapError::NonInvertibleSwap);
            }
        }
        self.inv_swap_matrix = svd
            .solve(&DMatrix::identity(n, n), 0.0)
            .map_err(|_| SwapError::NonInvertibleSwap)?;
        Ok(())
    }

    /// The in-place update.  Only called after `check_swap` succeeded, so every
    /// index is valid and the retained inverse exists; nothing in here can fail.
    fn alter_model(
        &mut self,
        model: &mut ChemicalSystemModel,
        basis_to_remove: usize,
        eqm_to_insert: usize,
    ) {
        let b = basis_to_remove;
        let e = eqm_to_insert;
        let num_eqm = model.num_eqm_species();
        let num_temperatures = model.num_temperature_nodes();

        // log10K of the species moving into the basis, recorded before the tables
        // are overwritten
        let log10k_of_inserted: Vec<f64> =
            (0..num_temperatures).map(|t| model.eqm_log10K[(e, t)]).collect();

        // exchange the names; both species keep their numeric positions
        let basis_name = model.basis.name_of(b).to_string();
        let eqm_name = model.eqm.name_of(e).to_string();
        model.basis.replace_name_at(b, eqm_name);
        model.eqm.replace_name_at(e, basis_name);

        // accumulate the swap history
        if model.swap_to_original_basis.nrows() == 0 {
            model.swap_to_original_basis = self.swap_matrix.clone();
        } else {
            model.swap_to_original_basis = &self.swap_matrix * &model.swap_to_original_basis;
        }
        model.have_swapped_out_of_basis.push(b);
        model.have_swapped_into_basis.push(e);

        // the outgoing basis species dissociates into exactly 1 mole of the species
        // that replaced it; then every reaction is re-expressed in the new basis
        model.eqm_stoichiometry.row_mut(e).fill(0.0);
        model.eqm_stoichiometry[(e, b)] = 1.0;
        model.eqm_stoichiometry = &model.eqm_stoichiometry * &self.inv_swap_matrix;
        zero_small_entries(&mut model.eqm_stoichiometry, self.stoi_tol);

        if model.redox_stoichiometry.nrows() > 0 {
            model.redox_stoichiometry = &model.redox_stoichiometry * &self.inv_swap_matrix;
            zero_small_entries(&mut model.redox_stoichiometry, self.stoi_tol);
        }

        if model.kin_stoichiometry.nrows() > 0 {
            model.kin_stoichiometry = &model.kin_stoichiometry * &self.inv_swap_matrix;
            zero_small_entries(&mut model.kin_stoichiometry, self.stoi_tol);
        }

        // a species' reaction with itself has log10K = 0; every other equilibrium
        // constant picks up the inserted species' log10K weighted by its coefficient
        // in the already-updated column b
        for t in 0..num_temperatures {
            let log10k = log10k_of_inserted[t];
            model.eqm_log10K[(e, t)] = 0.0;
            for r in 0..num_eqm {
                model.eqm_log10K[(r, t)] -= model.eqm_stoichiometry[(r, b)] * log10k;
            }
            for r in 0..model.redox_log10K.nrows() {
                model.redox_log10K[(r, t)] -= model.redox_stoichiometry[(r, b)] * log10k;
            }
            for r in 0..model.kin_log10K.nrows() {
                model.kin_log10K[(r, t)] -= model.kin_stoichiometry[(r, b)] * log10k;
            }
        }

        // physical properties travel with the species, so a plain pairwise exchange
        std::mem::swap(
            &mut model.basis_species_mineral[b],
            &mut model.eqm_species_mineral[e],
        );
        std::mem::swap(&mut model.basis_species_gas[b], &mut model.eqm_species_gas[e]);
        std::mem::swap(
            &mut model.basis_species_transported[b],
            &mut model.eqm_species_transported[e],
        );
        std::mem::swap(
            &mut model.basis_species_charge[b],
            &mut model.eqm_species_charge[e],
        );
        std::mem::swap(
            &mut model.basis_species_radius[b],
            &mut model.eqm_species_radius[e],
        );
        std::mem::swap(
            &mut model.basis_species_molecular_weight[b],
            &mut model.eqm_species_molecular_weight[e],
        );
        std::mem::swap(
            &mut model.basis_species_molecular_volume[b],
            &mut model.eqm_species_molecular_volume[e],
        );

        // rate laws referencing either species by slot now reference the new slots
        for rate in model.kin_rate.iter_mut() {
            rate.swap_promoting_slots(self.basis_size, b, e);
        }
    }
}

/// resolve a (basis name, equilibrium name) pair to indices
fn resolve_names(
    model: &ChemicalSystemModel,
    replace_this: &str,
    with_this: &str,
) -> Result<(usize, usize), SwapError> {
    let basis_to_remove = model
        .basis
        .index_of(replace_this)
        .ok_or_else(|| SwapError::NotInBasis(replace_this.to_string()))?;
    let eqm_to_insert = model
        .eqm
        .index_of(with_this)
        .ok_or_else(|| SwapError::NotEquilibriumSpecies(with_this.to_string()))?;
    Ok((basis_to_remove, eqm_to_insert))
}

/// snap coefficients that are numerically zero after re-expression to exact zero
fn zero_small_entries(mat: &mut DMatrix<f64>, tol: f64) {
    for entry in mat.iter_mut() {
        if entry.abs() < tol {
            *entry = 0.0;
        }
    }
}
