//! # gaforge
//!
//! A genetic algorithm engine. Candidate solutions are [`Genome`]s wrapping a chromosome
//! (bit strings, 2D bit strings, allele arrays, binary-encoded real vectors) together with
//! their cached score and pluggable initialization, mutation, comparison and crossover
//! strategies. A [`Population`] scores, scales, sorts and selects them; a driver
//! ([`SimpleGa`] or [`SteadyStateGa`]) breeds generations until its terminator fires, while
//! [`Statistics`] tracks the run.
//!
//! Non-fatal problems (out-of-range values, precision loss, impossible pairings) are
//! reported through [`error::report`] as `tracing` warnings and absorbed. Only cancellation,
//! signalled by an evaluator returning [`GeneticError::Cancelled`], stops a run.

pub mod allele;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod phenotype;
pub mod population;
pub mod rng;
pub mod scaling;
pub mod selection;
pub mod statistics;

// Re-export commonly used types for convenience
pub use error::{GeneticError, OptionExt, Result, ResultExt};
pub use evolution::{Evolution, EvolutionBuilder, EvolutionOptions, SimpleGa, SteadyStateGa};
pub use genome::{Chromosome, Genome};
pub use population::Population;
pub use rng::RandomNumberGenerator;
pub use statistics::Statistics;
