#[cfg(test)]
mod tests {
    use crate::Geochemistry::chemical_model::{
        ChemicalSystemModel, KineticRateDefinition, ModelError, SpeciesIndexMap,
    };
    use nalgebra::DMatrix;

    fn water_model() -> ChemicalSystemModel {
        let mut model = ChemicalSystemModel::new();
        model.basis = SpeciesIndexMap::from_names(vec![
            "H2O".to_string(),
            "H+".to_string(),
        ])
        .unwrap();
        model.basis_species_mineral = vec![false; 2];
        model.basis_species_gas = vec![false; 2];
        model.basis_species_transported = vec![true; 2];
        model.basis_species_charge = vec![0.0, 1.0];
        model.basis_species_radius = vec![0.0, 9.0];
        model.basis_species_molecular_weight = vec![18.0152, 1.0079];
        model.basis_species_molecular_volume = vec![0.0; 2];
        model.eqm = SpeciesIndexMap::from_names(vec!["OH-".to_string()]).unwrap();
        model.eqm_species_mineral = vec![false];
        model.eqm_species_gas = vec![false];
        model.eqm_species_transported = vec![true];
        model.eqm_species_charge = vec![-1.0];
        model.eqm_species_radius = vec![3.5];
        model.eqm_species_molecular_weight = vec![17.0073];
        model.eqm_species_molecular_volume = vec![0.0];
        model.surface_sorption_related = vec![false];
        model.eqm_stoichiometry = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        model.eqm_log10K = DMatrix::from_row_slice(1, 3, &[14.9325, 13.9868, 13.0199]);
        model
    }

    #[test]
    fn index_map_keeps_both_views_in_sync() {
        let mut map = SpeciesIndexMap::from_names(vec![
            "H2O".to_string(),
            "Ca++".to_string(),
            "HCO3-".to_string(),
        ])
        .unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.name_of(1), "Ca++");
        assert_eq!(map.index_of("HCO3-"), Some(2));
        assert_eq!(map.index_of("Calcite"), None);

        let old = map.replace_name_at(1, "Calcite".to_string());
        assert_eq!(old, "Ca++");
        assert_eq!(map.name_of(1), "Calcite");
        assert_eq!(map.index_of("Calcite"), Some(1));
        assert_eq!(map.index_of("Ca++"), None);
        assert!(!map.contains("Ca++"));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn index_map_rejects_duplicate_names() {
        let err = SpeciesIndexMap::from_names(vec![
            "H2O".to_string(),
            "H+".to_string(),
            "H2O".to_string(),
        ])
        .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateSpecies(name) if name == "H2O"));
    }

    #[test]
    fn rate_definition_remaps_slots_in_both_directions() {
        let mut rate = KineticRateDefinition {
            kinetic_species_index: 0,
            promoting_indices: vec![0.0, 1.0, 0.0, 0.0, 2.0],
            promoting_monod_indices: vec![0.0, 3.0, 0.0, 0.0, 4.0],
            promoting_half_saturation: vec![0.0, 5.0, 0.0, 0.0, 6.0],
            progeny_index: 4,
        };
        // basis size 3, so eqm species 1 lives in slot 4
        rate.swap_promoting_slots(3, 1, 1);
        assert_eq!(rate.promoting_indices, vec![0.0, 2.0, 0.0, 0.0, 1.0]);
        assert_eq!(rate.promoting_monod_indices, vec![0.0, 4.0, 0.0, 0.0, 3.0]);
        assert_eq!(rate.promoting_half_saturation, vec![0.0, 6.0, 0.0, 0.0, 5.0]);
        assert_eq!(rate.progeny_index, 1);
        // swapping again sends the progeny back to the equilibrium slot
        rate.swap_promoting_slots(3, 1, 1);
        assert_eq!(rate.progeny_index, 4);
    }

    #[test]
    fn rate_definition_leaves_unrelated_progeny_alone() {
        let mut rate = KineticRateDefinition {
            kinetic_species_index: 0,
            promoting_indices: vec![0.0; 5],
            promoting_monod_indices: vec![0.0; 5],
            promoting_half_saturation: vec![0.0; 5],
            progeny_index: 2,
        };
        rate.swap_promoting_slots(3, 1, 1);
        assert_eq!(rate.progeny_index, 2);
    }

    #[test]
    fn validates_a_consistent_model() {
        water_model().validate().unwrap();
    }

    #[test]
    fn rejects_mismatched_property_vector() {
        let mut model = water_model();
        model.eqm_species_charge = vec![-1.0, 0.0];
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("eqm_species_charge"));
    }

    #[test]
    fn rejects_wrongly_shaped_stoichiometry() {
        let mut model = water_model();
        model.eqm_stoichiometry = DMatrix::from_row_slice(1, 3, &[1.0, -1.0, 0.0]);
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("eqm_stoichiometry"));
    }

    #[test]
    fn rejects_redox_rows_without_a_left_hand_side() {
        let mut model = water_model();
        model.redox_stoichiometry = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        model.redox_log10K = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("redox_lhs is empty"));
    }

    #[test]
    fn rejects_redox_lhs_inside_the_basis() {
        let mut model = water_model();
        model.redox_lhs = "H+".to_string();
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("must never be a basis species"));
    }

    #[test]
    fn rejects_species_in_two_collections() {
        let mut model = water_model();
        model.kin = SpeciesIndexMap::from_names(vec!["OH-".to_string()]).unwrap();
        model.kin_species_mineral = vec![false];
        model.kin_species_transported = vec![true];
        model.kin_species_charge = vec![-1.0];
        model.kin_species_molecular_weight = vec![17.0073];
        model.kin_species_molecular_volume = vec![0.0];
        model.kin_stoichiometry = DMatrix::from_row_slice(1, 2, &[1.0, -1.0]);
        model.kin_log10K = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("belongs to more than one collection"));
    }

    #[test]
    fn rejects_kinetic_rate_with_out_of_range_progeny() {
        let mut model = water_model();
        model.kin = SpeciesIndexMap::from_names(vec!["Quartz".to_string()]).unwrap();
        model.kin_species_mineral = vec![true];
        model.kin_species_transported = vec![false];
        model.kin_species_charge = vec![0.0];
        model.kin_species_molecular_weight = vec![60.0843];
        model.kin_species_molecular_volume = vec![22.6880];
        model.kin_stoichiometry = DMatrix::from_row_slice(1, 2, &[0.0, 1.0]);
        model.kin_log10K = DMatrix::from_row_slice(1, 3, &[1.0, 2.0, 3.0]);
        model.kin_rate = vec![KineticRateDefinition {
            kinetic_species_index: 0,
            promoting_indices: vec![0.0; 3],
            promoting_monod_indices: vec![0.0; 3],
            promoting_half_saturation: vec![0.0; 3],
            progeny_index: 3,
        }];
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("progeny slot"));
    }

    #[test]
    fn rejects_unbalanced_swap_history() {
        let mut model = water_model();
        model.have_swapped_out_of_basis = vec![1];
        let err = model.validate().unwrap_err();
        assert!(err.to_string().contains("swap history"));
    }

    #[test]
    fn survives_a_json_round_trip() {
        let model = water_model();
        let json = model.to_json_string().unwrap();
        let restored = ChemicalSystemModel::from_json_str(&json).unwrap();
        assert_eq!(restored, model);
    }

    #[test]
    fn deserialization_rejects_an_inconsistent_model() {
        let mut model = water_model();
        model.eqm_species_radius = vec![3.5, 1.0];
        let json = model.to_json_string().unwrap();
        let err = ChemicalSystemModel::from_json_str(&json).unwrap_err();
        assert!(matches!(err, ModelError::InvalidModel(_)));
    }
}
