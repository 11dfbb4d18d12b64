//! # Chemical system model
//!
//! ## Aim
//! This module defines the in-memory representation of a geochemical reaction network:
//! basis (primary) species, equilibrium (secondary) species and kinetically-controlled
//! species, together with their stoichiometric matrices, equilibrium constants tabulated
//! per temperature node, physical properties, redox couples in disequilibrium and kinetic
//! rate descriptions.  The structure is built once (from a thermodynamic database, which
//! is not handled here) and then mutated in place by basis swaps for the lifetime of a
//! reaction-path or equilibrium solve.
//!
//! ## Main Data Structures
//! - `ChemicalSystemModel`: the aggregate itself, all fields public in the style of the
//!   rest of this crate
//! - `SpeciesIndexMap`: bidirectional name <-> index map, so the "name of j-th species"
//!   and "index of species with given name" views can never get out of sync
//! - `KineticRateDefinition`: one rate law attached to a kinetic species, with promoting
//!   coefficients indexed over basis and equilibrium slots
//!
//! ## Conventions
//! - stoichiometry matrices have one row per dependent species and one column per basis
//!   species: row i gives the moles of each basis species produced when 1 mole of
//!   species i dissociates
//! - log10K matrices have one row per dependent species and one column per temperature
//!   node of the database grid
//! - basis index 0 is water; it can never be swapped out

use log::warn;
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// error types for model construction, validation and (de)serialization
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Species {0} appears more than once")]
    DuplicateSpecies(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Bidirectional map between species names and their stable positional indices.
/// Renaming the species that sits at a given position is a single atomic operation,
/// so the two views cannot get out of sync the way parallel hand-maintained
/// containers can.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesIndexMap {
    names: Vec<String>,
    indices: HashMap<String, usize>,
}

impl SpeciesIndexMap {
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            indices: HashMap::new(),
        }
    }

    /// build the map from an ordered name list; names must be unique
    pub fn from_names(names: Vec<String>) -> Result<Self, ModelError> {
        let mut indices = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            if indices.insert(name.clone(), i).is_some() {
                return Err(ModelError::DuplicateSpecies(name.clone()));
            }
        }
        Ok(Self { names, indices })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// name of the species at position i; positions are stable across renames
    pub fn name_of(&self, i: usize) -> &str {
        &self.names[i]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.indices.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// put a new name at position i, returning the name previously held there;
    /// both the vector view and the map view are updated together
    pub fn replace_name_at(&mut self, i: usize, new_name: String) -> String {
        let old_name = std::mem::replace(&mut self.names[i], new_name.clone());
        self.indices.remove(&old_name);
        self.indices.insert(new_name, i);
        old_name
    }
}

/// One rate law attached to a kinetic species.  The promoting vectors are indexed
/// over "basis then equilibrium" slots: slot j < basis_size refers to basis species j,
/// slot basis_size + i refers to equilibrium species i.  `progeny_index` uses the same
/// slot numbering and identifies the species produced by the reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KineticRateDefinition {
    pub kinetic_species_index: usize,
    pub promoting_indices: Vec<f64>,
    pub promoting_monod_indices: Vec<f64>,
    pub promoting_half_saturation: Vec<f64>,
    pub progeny_index: usize,
}

impl KineticRateDefinition {
    /// Relocate every reference this rate holds to the two species exchanged by a
    /// basis swap: the entries at basis slot `basis_ind` and equilibrium slot
    /// `basis_size + eqm_ind` trade places in all three promoting vectors, and the
    /// progeny slot follows the same exchange.
    pub fn swap_promoting_slots(&mut self, basis_size: usize, basis_ind: usize, eqm_ind: usize) {
        let eqm_slot = basis_size + eqm_ind;
        self.promoting_indices.swap(basis_ind, eqm_slot);
        self.promoting_monod_indices.swap(basis_ind, eqm_slot);
        self.promoting_half_saturation.swap(basis_ind, eqm_slot);
        if self.progeny_index == eqm_slot {
            self.progeny_index = basis_ind;
        } else if self.progeny_index == basis_ind {
            self.progeny_index = eqm_slot;
        }
    }
}

/// THE STRUCT ChemicalSystemModel COLLECTS ALL THE INFORMATION ABOUT THE REACTION
/// NETWORK THAT THE SWAP ENGINE AND A SOLVER NEED.
/// The basis species form the minimal independent set; every equilibrium and kinetic
/// species carries a reaction expressing it in terms of the current basis, along with
/// a log10(equilibrium constant) per temperature node.  Physical properties (charge,
/// ionic radius in Angstrom, molecular weight in g/mol, molecular volume in cm^3/mol)
/// live in parallel vectors indexed the same way as the name maps.
///
/// A basis swap exchanges one basis species with one equilibrium species and
/// re-expresses every dependent table in the new basis; the accumulated
/// `swap_to_original_basis` matrix always maps the current basis back to the original
/// one.  The structure is plain data: all behaviour lives in
/// `species_swapper::SpeciesSwapper`.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalSystemModel {
    /// basis (primary) species; index 0 is water and is never swappable
    pub basis: SpeciesIndexMap,
    pub basis_species_mineral: Vec<bool>,
    pub basis_species_gas: Vec<bool>,
    /// true iff the species is transported in reactive-transport simulations
    pub basis_species_transported: Vec<bool>,
    pub basis_species_charge: Vec<f64>,
    pub basis_species_radius: Vec<f64>,
    pub basis_species_molecular_weight: Vec<f64>,
    pub basis_species_molecular_volume: Vec<f64>,

    /// equilibrium (secondary) species, governed by mass action with the basis
    pub eqm: SpeciesIndexMap,
    pub eqm_species_mineral: Vec<bool>,
    pub eqm_species_gas: Vec<bool>,
    pub eqm_species_transported: Vec<bool>,
    pub eqm_species_charge: Vec<f64>,
    pub eqm_species_radius: Vec<f64>,
    pub eqm_species_molecular_weight: Vec<f64>,
    pub eqm_species_molecular_volume: Vec<f64>,
    /// eqm_stoichiometry(i, j) = moles of basis species j produced when 1 mole of
    /// equilibrium species i dissociates
    pub eqm_stoichiometry: DMatrix<f64>,
    /// eqm_log10K(i, t) = log10(equilibrium constant) of equilibrium species i at
    /// temperature node t
    pub eqm_log10K: DMatrix<f64>,
    /// true iff the equilibrium species is involved in surface complexation, which
    /// makes it ineligible for the basis
    pub surface_sorption_related: Vec<bool>,

    /// name of the species on the left-hand side of every redox disequilibrium
    /// equation (an electron proxy).  Empty string means no redox tracking, in which
    /// case the redox matrices have zero rows.  This species never enters the basis.
    pub redox_lhs: String,
    /// redox_stoichiometry(r, j) = coefficient of basis species j in the r-th redox
    /// couple equation, all written with redox_lhs on the left-hand side
    pub redox_stoichiometry: DMatrix<f64>,
    pub redox_log10K: DMatrix<f64>,

    /// kinetically-controlled species; never swapped, but their reactions are
    /// re-expressed whenever the basis changes
    pub kin: SpeciesIndexMap,
    pub kin_species_mineral: Vec<bool>,
    pub kin_species_transported: Vec<bool>,
    pub kin_species_charge: Vec<f64>,
    pub kin_species_molecular_weight: Vec<f64>,
    pub kin_species_molecular_volume: Vec<f64>,
    pub kin_stoichiometry: DMatrix<f64>,
    pub kin_log10K: DMatrix<f64>,
    /// rate laws; a solver loops over these, computes each rate and applies it to
    /// the kin_rate[i].kinetic_species_index species
    pub kin_rate: Vec<KineticRateDefinition>,

    /// basis index of the species removed by each swap performed so far, in order
    pub have_swapped_out_of_basis: Vec<usize>,
    /// equilibrium index of the species inserted by each swap performed so far
    pub have_swapped_into_basis: Vec<usize>,
    /// Composition of all swap matrices performed so far: S_n * S_{n-1} * ... * S_1.
    /// Since bulk_new = S^-1^T * bulk_old on each swap,
    /// bulk_original = swap_to_original_basis^T * bulk_current.
    /// Kept 0x0 until the first swap to avoid paying for it in the common no-swap case.
    pub swap_to_original_basis: DMatrix<f64>,
}

impl ChemicalSystemModel {
    pub fn new() -> Self {
        Self {
            basis: SpeciesIndexMap::new(),
            basis_species_mineral: Vec::new(),
            basis_species_gas: Vec::new(),
            basis_species_transported: Vec::new(),
            basis_species_charge: Vec::new(),
            basis_species_radius: Vec::new(),
            basis_species_molecular_weight: Vec::new(),
            basis_species_molecular_volume: Vec::new(),
            eqm: SpeciesIndexMap::new(),
            eqm_species_mineral: Vec::new(),
            eqm_species_gas: Vec::new(),
            eqm_species_transported: Vec::new(),
            eqm_species_charge: Vec::new(),
            eqm_species_radius: Vec::new(),
            eqm_species_molecular_weight: Vec::new(),
            eqm_species_molecular_volume: Vec::new(),
            eqm_stoichiometry: DMatrix::zeros(0, 0),
            eqm_log10K: DMatrix::zeros(0, 0),
            surface_sorption_related: Vec::new(),
            redox_lhs: String::new(),
            redox_stoichiometry: DMatrix::zeros(0, 0),
            redox_log10K: DMatrix::zeros(0, 0),
            kin: SpeciesIndexMap::new(),
            kin_species_mineral: Vec::new(),
            kin_species_transported: Vec::new(),
            kin_species_charge: Vec::new(),
            kin_species_molecular_weight: Vec::new(),
            kin_species_molecular_volume: Vec::new(),
            kin_stoichiometry: DMatrix::zeros(0, 0),
            kin_log10K: DMatrix::zeros(0, 0),
            kin_rate: Vec::new(),
            have_swapped_out_of_basis: Vec::new(),
            have_swapped_into_basis: Vec::new(),
            swap_to_original_basis: DMatrix::zeros(0, 0),
        }
    }

    pub fn basis_size(&self) -> usize {
        self.basis.len()
    }

    pub fn num_eqm_species(&self) -> usize {
        self.eqm.len()
    }

    pub fn num_kin_species(&self) -> usize {
        self.kin.len()
    }

    /// number of temperature nodes of the log10K grid
    pub fn num_temperature_nodes(&self) -> usize {
        self.eqm_log10K.ncols()
    }

    /// Consistency check meant to be run right after model construction or
    /// deserialization.  Verifies every parallel container against the species
    /// counts, the disjointness of the three name collections, and the redox and
    /// kinetic-rate index ranges.  The swap engine assumes a validated model.
    pub fn validate(&self) -> Result<(), ModelError> {
        let nb = self.basis.len();
        let ne = self.eqm.len();
        let nk = self.kin.len();
        if nb == 0 {
            return Err(ModelError::InvalidModel(
                "the basis contains no species".to_string(),
            ));
        }
        if self.basis.name_of(0) != "H2O" {
            warn!(
                "basis species 0 is {}, not H2O; it will be treated as the unswappable water slot",
                self.basis.name_of(0)
            );
        }
        check_len("basis_species_mineral", self.basis_species_mineral.len(), nb)?;
        check_len("basis_species_gas", self.basis_species_gas.len(), nb)?;
        check_len(
            "basis_species_transported",
            self.basis_species_transported.len(),
            nb,
        )?;
        check_len("basis_species_charge", self.basis_species_charge.len(), nb)?;
        check_len("basis_species_radius", self.basis_species_radius.len(), nb)?;
        check_len(
            "basis_species_molecular_weight",
            self.basis_species_molecular_weight.len(),
            nb,
        )?;
        check_len(
            "basis_species_molecular_volume",
            self.basis_species_molecular_volume.len(),
            nb,
        )?;
        check_len("eqm_species_mineral", self.eqm_species_mineral.len(), ne)?;
        check_len("eqm_species_gas", self.eqm_species_gas.len(), ne)?;
        check_len(
            "eqm_species_transported",
            self.eqm_species_transported.len(),
            ne,
        )?;
        check_len("eqm_species_charge", self.eqm_species_charge.len(), ne)?;
        check_len("eqm_species_radius", self.eqm_species_radius.len(), ne)?;
        check_len(
            "eqm_species_molecular_weight",
            self.eqm_species_molecular_weight.len(),
            ne,
        )?;
        check_len(
            "eqm_species_molecular_volume",
            self.eqm_species_molecular_volume.len(),
            ne,
        )?;
        check_len(
            "surface_sorption_related",
            self.surface_sorption_related.len(),
            ne,
        )?;
        check_len("kin_species_mineral", self.kin_species_mineral.len(), nk)?;
        check_len(
            "kin_species_transported",
            self.kin_species_transported.len(),
            nk,
        )?;
        check_len("kin_species_charge", self.kin_species_charge.len(), nk)?;
        check_len(
            "kin_species_molecular_weight",
            self.kin_species_molecular_weight.len(),
            nk,
        )?;
        check_len(
            "kin_species_molecular_volume",
            self.kin_species_molecular_volume.len(),
            nk,
        )?;

        let nt = self.eqm_log10K.ncols();
        check_dims("eqm_stoichiometry", &self.eqm_stoichiometry, ne, nb)?;
        check_dims("eqm_log10K", &self.eqm_log10K, ne, nt)?;
        check_dims("kin_stoichiometry", &self.kin_stoichiometry, nk, nb)?;
        if nk > 0 {
            check_dims("kin_log10K", &self.kin_log10K, nk, nt)?;
        }
        if self.redox_stoichiometry.nrows() != self.redox_log10K.nrows() {
            return Err(ModelError::InvalidModel(format!(
                "redox_stoichiometry has {} rows but redox_log10K has {}",
                self.redox_stoichiometry.nrows(),
                self.redox_log10K.nrows()
            )));
        }
        if self.redox_stoichiometry.nrows() > 0 {
            if self.redox_lhs.is_empty() {
                return Err(ModelError::InvalidModel(
                    "redox equations are present but redox_lhs is empty".to_string(),
                ));
            }
            check_dims(
                "redox_stoichiometry",
                &self.redox_stoichiometry,
                self.redox_stoichiometry.nrows(),
                nb,
            )?;
            check_dims(
                "redox_log10K",
                &self.redox_log10K,
                self.redox_log10K.nrows(),
                nt,
            )?;
        }
        if !self.redox_lhs.is_empty() && self.basis.contains(&self.redox_lhs) {
            return Err(ModelError::InvalidModel(format!(
                "redox left-hand side {} must never be a basis species",
                self.redox_lhs
            )));
        }

        for name in self.basis.names() {
            if self.eqm.contains(name) || self.kin.contains(name) {
                return Err(ModelError::InvalidModel(format!(
                    "species {} belongs to more than one collection",
                    name
                )));
            }
        }
        for name in self.eqm.names() {
            if self.kin.contains(name) {
                return Err(ModelError::InvalidModel(format!(
                    "species {} belongs to more than one collection",
                    name
                )));
            }
        }

        for rate in &self.kin_rate {
            if rate.kinetic_species_index >= nk {
                return Err(ModelError::InvalidModel(format!(
                    "kinetic rate refers to kinetic species {} but there are only {}",
                    rate.kinetic_species_index, nk
                )));
            }
            let num_slots = nb + ne;
            check_len("promoting_indices", rate.promoting_indices.len(), num_slots)?;
            check_len(
                "promoting_monod_indices",
                rate.promoting_monod_indices.len(),
                num_slots,
            )?;
            check_len(
                "promoting_half_saturation",
                rate.promoting_half_saturation.len(),
                num_slots,
            )?;
            if rate.progeny_index >= num_slots {
                return Err(ModelError::InvalidModel(format!(
                    "kinetic rate progeny slot {} exceeds the {} basis and equilibrium slots",
                    rate.progeny_index, num_slots
                )));
            }
        }

        if self.have_swapped_out_of_basis.len() != self.have_swapped_into_basis.len() {
            return Err(ModelError::InvalidModel(
                "swap history lists have different lengths".to_string(),
            ));
        }

        Ok(())
    }

    /// serialize the whole model to a JSON string
    pub fn to_json_string(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    /// deserialize a model from JSON and validate it before handing it out
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }
}

fn check_len(what: &str, found: usize, expected: usize) -> Result<(), ModelError> {
    if found != expected {
        return Err(ModelError::InvalidModel(format!(
            "{} has length {} but {} was expected",
            what, found, expected
        )));
    }
    Ok(())
}

fn check_dims(
    what: &str,
    mat: &DMatrix<f64>,
    rows: usize,
    cols: usize,
) -> Result<(), ModelError> {
    if mat.nrows() != rows || mat.ncols() != cols {
        return Err(ModelError::InvalidModel(format!(
            "{} is {}x{} but {}x{} was expected",
            what,
            mat.nrows(),
            mat.ncols(),
            rows,
            cols
        )));
    }
    Ok(())
}
