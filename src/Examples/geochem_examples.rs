use log::LevelFilter;
use simplelog::{Config, SimpleLogger};

#[allow(non_snake_case)]
pub fn geochem_examples(task: usize) {
    let _ = SimpleLogger::init(LevelFilter::Info, Config::default());
    match task {
        0 => {
            // BASIS SWAP IN A CARBONATE SYSTEM
            // The classic calcite problem: water, calcium, bicarbonate and protons in
            // the basis, six secondary species including the mineral Calcite. We swap
            // Ca++ out of the basis and Calcite in, then look at how every reaction
            // got re-expressed and how the equilibrium constants moved.
            use crate::Geochemistry::chemical_model::{ChemicalSystemModel, SpeciesIndexMap};
            use crate::Geochemistry::reaction_output::{
                print_reaction_summary, reaction_string,
            };
            use crate::Geochemistry::species_swapper::SpeciesSwapper;
            use nalgebra::DMatrix;

            let mut model = ChemicalSystemModel::new();
            model.basis = SpeciesIndexMap::from_names(
                ["H2O", "Ca++", "HCO3-", "H+"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
            model.basis_species_mineral = vec![false; 4];
            model.basis_species_gas = vec![false; 4];
            model.basis_species_transported = vec![true; 4];
            model.basis_species_charge = vec![0.0, 2.0, -1.0, 1.0];
            model.basis_species_radius = vec![0.0, 6.0, 4.5, 9.0];
            model.basis_species_molecular_weight = vec![18.0152, 40.0800, 61.0171, 1.0079];
            model.basis_species_molecular_volume = vec![0.0; 4];
            model.eqm = SpeciesIndexMap::from_names(
                ["CO2(aq)", "CO3--", "CaCO3", "CaOH+", "OH-", "Calcite"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
            model.eqm_species_mineral = vec![false, false, false, false, false, true];
            model.eqm_species_gas = vec![false; 6];
            model.eqm_species_transported = vec![true, true, true, true, true, false];
            model.eqm_species_charge = vec![0.0, -2.0, 0.0, 1.0, -1.0, 0.0];
            model.eqm_species_radius = vec![4.0, 4.5, 4.0, 4.0, 3.5, 0.0];
            model.eqm_species_molecular_weight =
                vec![44.0098, 60.0092, 100.0892, 57.0873, 17.0073, 100.0892];
            model.eqm_species_molecular_volume = vec![0.0, 0.0, 0.0, 0.0, 0.0, 36.9340];
            model.surface_sorption_related = vec![false; 6];
            model.eqm_stoichiometry = DMatrix::from_row_slice(
                6,
                4,
                &[
                    -1.0, 0.0, 1.0, 1.0, // CO2(aq)
                    0.0, 0.0, 1.0, -1.0, // CO3--
                    0.0, 1.0, 1.0, -1.0, // CaCO3
                    1.0, 1.0, 0.0, -1.0, // CaOH+
                    1.0, 0.0, 0.0, -1.0, // OH-
                    0.0, 1.0, 1.0, -1.0, // Calcite
                ],
            );
            model.eqm_log10K = DMatrix::from_row_slice(
                6,
                8,
                &[
                    -6.5570, -6.3660, -6.3325, -6.4330, -6.7420, -7.1880, -7.7630, -8.4650,
                    10.6169, 10.3439, 10.2092, 10.2793, 10.5131, 10.8637, 11.2860, 11.6319,
                    7.5520, 7.1280, 6.7340, 6.4350, 6.1810, 5.9320, 5.5640, 4.7890, 13.7095,
                    12.6887, 11.5069, 10.4366, 9.3958, 8.5583, 7.8155, 7.0306, 14.9325, 13.9868,
                    13.0199, 12.2403, 11.5940, 11.2191, 11.0880, 11.2844, 2.0683, 1.7130,
                    1.2133, 0.6871, 0.0762, -0.5349, -1.2301, -2.2107,
                ],
            );
            model.validate().unwrap();

            println!("before the swap:");
            print_reaction_summary(&model, 0);

            let mut swapper = SpeciesSwapper::new(4, 1e-6);
            swapper.perform_swap_by_name(&mut model, "Ca++", "Calcite").unwrap();

            println!("\nafter swapping Ca++ out and Calcite in:");
            print_reaction_summary(&model, 0);

            // the mineral dissolution reaction now reads CaCO3 = 1*Calcite
            assert_eq!(reaction_string(&model, 2), "CaCO3 = 1*Calcite");
            // Ca++ is now a secondary species expressed via the mineral
            assert_eq!(
                reaction_string(&model, 5),
                "Ca++ = 1*Calcite - 1*HCO3- + 1*H+"
            );
            // at the first temperature node: log10K(Ca++) = 0 - 1 * 2.0683
            assert!((model.eqm_log10K[(5, 0)] + 2.0683).abs() < 1e-9);
        }
        1 => {
            // AUTOMATIC BASIS REPAIR
            // When a basis species' molality becomes untrustworthy a solver asks
            // find_best_eqm_swap for the most abundant secondary species involving
            // it, with minerals and gases optionally excluded from the candidates.
            use crate::Geochemistry::chemical_model::{ChemicalSystemModel, SpeciesIndexMap};
            use crate::Geochemistry::species_swapper::SpeciesSwapper;
            use nalgebra::{DMatrix, DVector};

            let mut model = ChemicalSystemModel::new();
            model.basis = SpeciesIndexMap::from_names(
                ["H2O", "Fe++"].iter().map(|s| s.to_string()).collect(),
            )
            .unwrap();
            model.basis_species_mineral = vec![false; 2];
            model.basis_species_gas = vec![false; 2];
            model.basis_species_transported = vec![true; 2];
            model.basis_species_charge = vec![0.0, 2.0];
            model.basis_species_radius = vec![0.0, 6.0];
            model.basis_species_molecular_weight = vec![18.0152, 55.8470];
            model.basis_species_molecular_volume = vec![0.0; 2];
            model.eqm = SpeciesIndexMap::from_names(
                ["FeOH+", "Fe(OH)2", "Hematite"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
            model.eqm_species_mineral = vec![false, false, true];
            model.eqm_species_gas = vec![false; 3];
            model.eqm_species_transported = vec![true, true, false];
            model.eqm_species_charge = vec![1.0, 0.0, 0.0];
            model.eqm_species_radius = vec![4.0, 4.0, 0.0];
            model.eqm_species_molecular_weight = vec![72.8543, 89.8617, 159.6922];
            model.eqm_species_molecular_volume = vec![0.0, 0.0, 30.2740];
            model.surface_sorption_related = vec![false; 3];
            model.eqm_stoichiometry =
                DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 1.0, 3.0, 2.0]);
            model.eqm_log10K = DMatrix::from_row_slice(3, 1, &[9.5, 20.6, -4.0]);
            model.validate().unwrap();

            let swapper = SpeciesSwapper::new(2, 1e-6);
            let molality = DVector::from_vec(vec![1e-6, 1e-3, 5.0]);

            // with minerals excluded Fe(OH)2 wins on |coeff| * molality
            let best = swapper
                .find_best_eqm_swap(1, &model, &molality, false, false, false)
                .unwrap();
            println!("best non-mineral replacement for Fe++: {:?}", best);
            assert_eq!(best, Some(1));

            // allowing minerals lets the abundant Hematite take over
            let best = swapper
                .find_best_eqm_swap(1, &model, &molality, true, false, false)
                .unwrap();
            println!("best replacement with minerals allowed: {:?}", best);
            assert_eq!(best, Some(2));
        }
        2 => {
            // BULK COMPOSITION CO-TRANSFORM AND THE WAY BACK
            // A swap changes what the bulk-composition slots mean, so the vector is
            // transformed alongside the model. swap_to_original_basis remembers the
            // accumulated change and takes the result back to the original basis.
            use crate::Geochemistry::chemical_model::{ChemicalSystemModel, SpeciesIndexMap};
            use crate::Geochemistry::species_swapper::SpeciesSwapper;
            use nalgebra::{DMatrix, DVector};

            let mut model = ChemicalSystemModel::new();
            model.basis = SpeciesIndexMap::from_names(
                ["H2O", "Ca++", "HCO3-", "H+"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
            .unwrap();
            model.basis_species_mineral = vec![false; 4];
            model.basis_species_gas = vec![false; 4];
            model.basis_species_transported = vec![true; 4];
            model.basis_species_charge = vec![0.0, 2.0, -1.0, 1.0];
            model.basis_species_radius = vec![0.0, 6.0, 4.5, 9.0];
            model.basis_species_molecular_weight = vec![18.0152, 40.0800, 61.0171, 1.0079];
            model.basis_species_molecular_volume = vec![0.0; 4];
            model.eqm =
                SpeciesIndexMap::from_names(vec!["Calcite".to_string()]).unwrap();
            model.eqm_species_mineral = vec![true];
            model.eqm_species_gas = vec![false];
            model.eqm_species_transported = vec![false];
            model.eqm_species_charge = vec![0.0];
            model.eqm_species_radius = vec![0.0];
            model.eqm_species_molecular_weight = vec![100.0892];
            model.eqm_species_molecular_volume = vec![36.9340];
            model.surface_sorption_related = vec![false];
            model.eqm_stoichiometry = DMatrix::from_row_slice(1, 4, &[0.0, 1.0, 1.0, -1.0]);
            model.eqm_log10K = DMatrix::from_row_slice(1, 1, &[2.0683]);
            model.validate().unwrap();

            let mut bulk = DVector::from_vec(vec![0.5, 1.0, 2.5, 3.0]);
            let mut swapper = SpeciesSwapper::new(4, 1e-6);
            swapper
                .perform_swap_with_bulk_by_name(&mut model, &mut bulk, "Ca++", "Calcite")
                .unwrap();
            println!("bulk composition in the new basis: {}", bulk);
            let expected = DVector::from_vec(vec![0.5, 1.0, 1.5, 4.0]);
            assert!((&bulk - &expected).norm() < 1e-12);

            // back to the original basis via the accumulated swap matrix
            let recovered = model.swap_to_original_basis.transpose() * &bulk;
            let original = DVector::from_vec(vec![0.5, 1.0, 2.5, 3.0]);
            assert!((&recovered - &original).norm() < 1e-12);
            println!("recovered original bulk composition: {}", recovered);
        }
        3 => {
            // MODEL PERSISTENCE
            // The whole model serializes to JSON and comes back validated.
            use crate::Geochemistry::chemical_model::{ChemicalSystemModel, SpeciesIndexMap};
            use nalgebra::DMatrix;

            let mut model = ChemicalSystemModel::new();
            model.basis = SpeciesIndexMap::from_names(
                ["H2O", "H+"].iter().map(|s| s.to_string()).collect(),
            )
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
            model.eqm_log10K = DMatrix::from_row_slice(1, 2, &[14.9325, 13.9868]);
            model.validate().unwrap();

            let json = model.to_json_string().unwrap();
            println!("{}", json);
            let restored = ChemicalSystemModel::from_json_str(&json).unwrap();
            assert_eq!(restored, model);
        }
        _ => {
            println!("there is no such task!");
        }
    }
}
