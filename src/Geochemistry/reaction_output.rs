//! # Reaction network reporting
//!
//! ## Aim
//! Human-readable views of a `ChemicalSystemModel`: dissociation reactions rendered as
//! strings, tabulated reaction networks with their equilibrium constants, and the swap
//! history.  Everything here is read-only; nothing mutates the model.

use crate::Geochemistry::chemical_model::ChemicalSystemModel;
use prettytable::{Cell, Row, Table};

/// render a stoichiometric coefficient without a trailing ".0" for whole numbers
fn format_coeff(c: f64) -> String {
    if c == c.trunc() {
        format!("{}", c as i64)
    } else {
        format!("{}", c)
    }
}

/// right-hand side of a dissociation reaction: the nonzero terms of one
/// stoichiometric row, e.g. "1*HCO3- + 1*H+ - 1*H2O"
fn stoichiometry_terms(model: &ChemicalSystemModel, coeffs: impl Iterator<Item = f64>) -> String {
    let mut rhs = String::new();
    for (j, coeff) in coeffs.enumerate() {
        if coeff == 0.0 {
            continue;
        }
        if rhs.is_empty() {
            rhs.push_str(&format_coeff(coeff));
        } else if coeff < 0.0 {
            rhs.push_str(&format!(" - {}", format_coeff(-coeff)));
        } else {
            rhs.push_str(&format!(" + {}", format_coeff(coeff)));
        }
        rhs.push('*');
        rhs.push_str(model.basis.name_of(j));
    }
    if rhs.is_empty() {
        rhs.push('0');
    }
    rhs
}

/// dissociation reaction of equilibrium species `eqm_ind` in the current basis
pub fn reaction_string(model: &ChemicalSystemModel, eqm_ind: usize) -> String {
    let rhs = stoichiometry_terms(model, model.eqm_stoichiometry.row(eqm_ind).iter().copied());
    format!("{} = {}", model.eqm.name_of(eqm_ind), rhs)
}

/// dissociation reaction of kinetic species `kin_ind` in the current basis
pub fn kinetic_reaction_string(model: &ChemicalSystemModel, kin_ind: usize) -> String {
    let rhs = stoichiometry_terms(model, model.kin_stoichiometry.row(kin_ind).iter().copied());
    format!("{} = {}", model.kin.name_of(kin_ind), rhs)
}

/// the `redox_row`-th redox couple equation, written with `redox_lhs` on the left
pub fn redox_reaction_string(model: &ChemicalSystemModel, redox_row: usize) -> String {
    let rhs = stoichiometry_terms(model, model.redox_stoichiometry.row(redox_row).iter().copied());
    format!("{} = {}", model.redox_lhs, rhs)
}

/// every reaction of the network with its log10K at one temperature node:
/// equilibrium species first, then kinetic species, then redox couples
pub fn reaction_table(model: &ChemicalSystemModel, temperature_node: usize) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("species"),
        Cell::new("reaction"),
        Cell::new("log10K"),
    ]));
    for i in 0..model.num_eqm_species() {
        table.add_row(Row::new(vec![
            Cell::new(model.eqm.name_of(i)),
            Cell::new(&reaction_string(model, i)),
            Cell::new(&format!("{:.4}", model.eqm_log10K[(i, temperature_node)])),
        ]));
    }
    for i in 0..model.num_kin_species() {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{} (kinetic)", model.kin.name_of(i))),
            Cell::new(&kinetic_reaction_string(model, i)),
            Cell::new(&format!("{:.4}", model.kin_log10K[(i, temperature_node)])),
        ]));
    }
    for r in 0..model.redox_stoichiometry.nrows() {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{} (redox couple {})", model.redox_lhs, r)),
            Cell::new(&redox_reaction_string(model, r)),
            Cell::new(&format!("{:.4}", model.redox_log10K[(r, temperature_node)])),
        ]));
    }
    table
}

/// The swaps performed so far, oldest first, by species name. The names are read
/// from the positions the species occupy now, so after a swap of the same pair
/// back and forth the earlier steps show the pair's current occupants.
pub fn swap_history_table(model: &ChemicalSystemModel) -> Table {
    let mut table = Table::new();
    table.add_row(Row::new(vec![
        Cell::new("swap"),
        Cell::new("out of the basis"),
        Cell::new("into the basis"),
    ]));
    for (step, (out_of, into)) in model
        .have_swapped_out_of_basis
        .iter()
        .zip(model.have_swapped_into_basis.iter())
        .enumerate()
    {
        table.add_row(Row::new(vec![
            Cell::new(&format!("{}", step + 1)),
            Cell::new(&format!("{} (eqm position {})", model.eqm.name_of(*into), into)),
            Cell::new(&format!("{} (basis position {})", model.basis.name_of(*out_of), out_of)),
        ]));
    }
    table
}

/// print the basis, every reaction and the swap history to stdout
pub fn print_reaction_summary(model: &ChemicalSystemModel, temperature_node: usize) {
    println!("basis species: {}", model.basis.names().join(", "));
    reaction_table(model, temperature_node).printstd();
    if !model.have_swapped_out_of_basis.is_empty() {
        swap_history_table(model).printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Geochemistry::chemical_model::SpeciesIndexMap;
    use nalgebra::DMatrix;

    fn small_model() -> ChemicalSystemModel {
        let mut model = ChemicalSystemModel::new();
        model.basis = SpeciesIndexMap::from_names(vec![
            "H2O".to_string(),
            "H+".to_string(),
            "HCO3-".to_string(),
        ])
        .unwrap();
        model.eqm =
            SpeciesIndexMap::from_names(vec!["CO2(aq)".to_string(), "OH-".to_string()]).unwrap();
        model.eqm_stoichiometry =
            DMatrix::from_row_slice(2, 3, &[-1.0, 1.0, 1.0, 1.0, -1.0, 0.0]);
        model.eqm_log10K =
            DMatrix::from_row_slice(2, 2, &[-6.5570, -6.3660, 14.9325, 13.9868]);
        model.kin = SpeciesIndexMap::from_names(vec!["Quartz".to_string()]).unwrap();
        model.kin_stoichiometry = DMatrix::from_row_slice(1, 3, &[0.0, 0.0, 0.5]);
        model.kin_log10K = DMatrix::from_row_slice(1, 2, &[4.0056, 3.7419]);
        model
    }

    fn small_model_with_redox() -> ChemicalSystemModel {
        let mut model = small_model();
        model.redox_lhs = "e-".to_string();
        model.redox_stoichiometry = DMatrix::from_row_slice(1, 3, &[0.5, -1.0, 0.0]);
        model.redox_log10K = DMatrix::from_row_slice(1, 2, &[-10.0553, -8.4878]);
        model
    }

    #[test]
    fn renders_reaction_with_signs_and_integer_coefficients() {
        let model = small_model();
        assert_eq!(reaction_string(&model, 0), "CO2(aq) = -1*H2O + 1*H+ + 1*HCO3-");
        assert_eq!(reaction_string(&model, 1), "OH- = 1*H2O - 1*H+");
    }

    #[test]
    fn renders_kinetic_reaction_with_fractional_coefficient() {
        let model = small_model();
        assert_eq!(kinetic_reaction_string(&model, 0), "Quartz = 0.5*HCO3-");
    }

    #[test]
    fn renders_zero_row_as_zero() {
        let mut model = small_model();
        model.eqm_stoichiometry.row_mut(0).fill(0.0);
        assert_eq!(reaction_string(&model, 0), "CO2(aq) = 0");
    }

    #[test]
    fn renders_redox_couple_against_its_left_hand_side() {
        let model = small_model_with_redox();
        assert_eq!(redox_reaction_string(&model, 0), "e- = 0.5*H2O - 1*H+");
    }

    #[test]
    fn reaction_table_covers_eqm_kinetic_and_redox_rows() {
        let model = small_model_with_redox();
        let table = reaction_table(&model, 1);
        assert_eq!(
            table.len(),
            1 + model.num_eqm_species() + model.num_kin_species()
                + model.redox_stoichiometry.nrows()
        );
        let rendered = table.to_string();
        assert!(rendered.contains("Quartz (kinetic)"));
        assert!(rendered.contains("3.7419"));
        assert!(rendered.contains("e- (redox couple 0)"));
        assert!(rendered.contains("-8.4878"));
    }

    #[test]
    fn swap_history_table_lists_each_swap_by_name() {
        let mut model = small_model();
        model.have_swapped_out_of_basis = vec![1, 2];
        model.have_swapped_into_basis = vec![0, 1];
        let table = swap_history_table(&model);
        assert_eq!(table.len(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("CO2(aq) (eqm position 0)"));
        assert!(rendered.contains("H+ (basis position 1)"));
        assert!(rendered.contains("OH- (eqm position 1)"));
        assert!(rendered.contains("HCO3- (basis position 2)"));
    }
}
