/// the in-memory representation of a geochemical reaction network: basis, equilibrium
/// and kinetic species, stoichiometric matrices, log10K tables per temperature node,
/// physical properties, redox couples and kinetic rate laws
pub mod chemical_model;
mod chemical_model_tests;
/// human-readable views of the reaction network: reaction strings, tabulated reactions
/// with equilibrium constants, swap history
pub mod reaction_output;
/// eng
/// The basis swap engine. Takes a ChemicalSystemModel and exchanges one basis species
/// with one equilibrium species, then re-expresses every stoichiometric and log10K
/// table in the new basis. The swap matrix is SVD-factorized to reject singular swaps;
/// its retained inverse also co-transforms caller-owned bulk composition vectors.
/// Also provides a heuristic for choosing the best replacement species.
/// ----------------------------------------------------------------
/// ru
/// Движок замены базиса. Берет ChemicalSystemModel, меняет местами один базисный
/// компонент с одним равновесным, затем перевыражает все стехиометрические матрицы
/// и таблицы log10K в новом базисе. Матрица замены факторизуется через SVD чтобы
/// отбраковать вырожденные замены; сохраненная обратная матрица также преобразует
/// векторы валового состава.
pub mod species_swapper;
