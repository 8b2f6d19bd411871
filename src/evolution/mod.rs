//! Evolution drivers: the generational [`SimpleGa`], the overlapping [`SteadyStateGa`], and
//! what configures them.

pub mod algorithm;
pub mod builder;
pub mod options;
pub mod parameters;
pub mod simple;
pub mod steady_state;
pub mod terminator;

pub use algorithm::{Evolution, EvolutionState, GeneticAlgorithm};
pub use builder::EvolutionBuilder;
pub use options::{EvolutionOptions, EvolutionOptionsBuilder, LogLevel, Objective};
pub use parameters::{Parameter, ParameterList, ParameterValue, ParseOutcome};
pub use simple::SimpleGa;
pub use steady_state::SteadyStateGa;
pub use terminator::{
    upon_convergence, upon_generation, upon_population_convergence, Terminator,
};
