/// runnable numbered walkthroughs of the geochemistry module
pub mod geochem_examples;
