//! # EvolutionOptions
//!
//! The `EvolutionOptions` struct holds every knob of an evolution driver: how long to run,
//! how to breed, how big the population is, what to record and where, and how loudly to
//! log. [`EvolutionOptions::default()`] gives the standard settings; the builder overrides
//! any subset of them and validates the result.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::evolution::options::{EvolutionOptions, LogLevel, Objective};
//!
//! let options = EvolutionOptions::builder()
//!     .num_generations(50)
//!     .population_size(30)
//!     .mutation_probability(0.02)
//!     .objective(Objective::Minimize)
//!     .log_level(LogLevel::Minimal)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.get_num_generations(), 50);
//! assert_eq!(options.get_crossover_probability(), 0.9);
//!
//! // invalid settings are rejected
//! assert!(EvolutionOptions::builder().population_size(0).build().is_err());
//! ```
//!
//! ## Defaults
//!
//! | knob | default |
//! |------|---------|
//! | `num_generations` | 250 |
//! | `convergence_percentage` | 0.99 |
//! | `generations_to_convergence` | 20 |
//! | `mutation_probability` | 0.01 |
//! | `crossover_probability` | 0.9 |
//! | `population_size` | 50 |
//! | `num_best_genomes` | 1 |
//! | `score_frequency` | 1 (simple), 100 (steady state) |
//! | `flush_frequency` | 0 |
//! | `score_filename` | `generations.dat` |
//! | `select_scores` | maximum |
//! | `record_diversity` | false |
//! | `elitism` | true |
//! | `objective` | maximize |
//! | `replacement_percentage` | 0.5 |
//! | `log_level` | none |

use crate::error::{GeneticError, Result};
use crate::selection::SortOrder;
use crate::statistics::{ScoreFlags, DEFAULT_FLUSH_FREQUENCY, DEFAULT_SCORE_FILENAME};

pub const DEFAULT_NUM_GENERATIONS: usize = 250;
pub const DEFAULT_CONVERGENCE_PERCENTAGE: f32 = 0.99;
pub const DEFAULT_GENERATIONS_TO_CONVERGENCE: usize = 20;
pub const DEFAULT_MUTATION_PROBABILITY: f32 = 0.01;
pub const DEFAULT_CROSSOVER_PROBABILITY: f32 = 0.9;
pub const DEFAULT_POPULATION_SIZE: usize = 50;
pub const DEFAULT_NUM_BEST_GENOMES: usize = 1;
pub const DEFAULT_REPLACEMENT_PERCENTAGE: f32 = 0.5;

/// How much a driver reports per generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// A summary per generation at `info`.
    Verbose,
    /// Start and end of the run at `info`, generations at `debug`.
    Minimal,
    /// Everything at `debug`.
    #[default]
    None,
}

/// Whether higher or lower scores are better.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Objective {
    #[default]
    Maximize,
    Minimize,
}

impl Objective {
    pub fn sort_order(self) -> SortOrder {
        match self {
            Objective::Maximize => SortOrder::HighIsBest,
            Objective::Minimize => SortOrder::LowIsBest,
        }
    }

    /// `1` for maximize, `-1` for minimize.
    pub fn as_int(self) -> i64 {
        match self {
            Objective::Maximize => 1,
            Objective::Minimize => -1,
        }
    }

    /// Negative values minimize, everything else maximizes.
    pub fn from_int(value: i64) -> Self {
        if value < 0 {
            Objective::Minimize
        } else {
            Objective::Maximize
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOptions {
    num_generations: usize,
    convergence_percentage: f32,
    generations_to_convergence: usize,
    mutation_probability: f32,
    crossover_probability: f32,
    population_size: usize,
    num_best_genomes: usize,
    /// `None` lets the driver pick its own default.
    score_frequency: Option<usize>,
    flush_frequency: usize,
    score_filename: String,
    select_scores: ScoreFlags,
    record_diversity: bool,
    elitism: bool,
    objective: Objective,
    replacement_percentage: f32,
    /// Overrides `replacement_percentage` when set.
    replacement_number: Option<usize>,
    log_level: LogLevel,
}

impl EvolutionOptions {
    pub fn get_num_generations(&self) -> usize {
        self.num_generations
    }

    pub fn get_convergence_percentage(&self) -> f32 {
        self.convergence_percentage
    }

    pub fn get_generations_to_convergence(&self) -> usize {
        self.generations_to_convergence
    }

    pub fn get_mutation_probability(&self) -> f32 {
        self.mutation_probability
    }

    pub fn get_crossover_probability(&self) -> f32 {
        self.crossover_probability
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    pub fn get_num_best_genomes(&self) -> usize {
        self.num_best_genomes
    }

    pub fn get_score_frequency(&self) -> Option<usize> {
        self.score_frequency
    }

    pub fn get_flush_frequency(&self) -> usize {
        self.flush_frequency
    }

    pub fn get_score_filename(&self) -> &str {
        &self.score_filename
    }

    pub fn get_select_scores(&self) -> ScoreFlags {
        self.select_scores
    }

    pub fn get_record_diversity(&self) -> bool {
        self.record_diversity
    }

    pub fn get_elitism(&self) -> bool {
        self.elitism
    }

    pub fn get_objective(&self) -> Objective {
        self.objective
    }

    pub fn get_replacement_percentage(&self) -> f32 {
        self.replacement_percentage
    }

    pub fn get_replacement_number(&self) -> Option<usize> {
        self.replacement_number
    }

    pub fn get_log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_num_generations(&mut self, num_generations: usize) {
        self.num_generations = num_generations;
    }

    pub fn set_convergence_percentage(&mut self, value: f32) -> Result<()> {
        self.convergence_percentage = check_unit("convergence_percentage", value)?;
        Ok(())
    }

    /// `0` counts as `1`.
    pub fn set_generations_to_convergence(&mut self, generations: usize) {
        self.generations_to_convergence = generations.max(1);
    }

    pub fn set_mutation_probability(&mut self, value: f32) -> Result<()> {
        self.mutation_probability = check_unit("mutation_probability", value)?;
        Ok(())
    }

    pub fn set_crossover_probability(&mut self, value: f32) -> Result<()> {
        self.crossover_probability = check_unit("crossover_probability", value)?;
        Ok(())
    }

    pub fn set_population_size(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(GeneticError::Configuration(
                "population_size must be at least 1".to_string(),
            ));
        }
        self.population_size = size;
        Ok(())
    }

    pub fn set_num_best_genomes(&mut self, n: usize) {
        self.num_best_genomes = n;
    }

    pub fn set_score_frequency(&mut self, frequency: usize) {
        self.score_frequency = Some(frequency);
    }

    pub fn set_flush_frequency(&mut self, frequency: usize) {
        self.flush_frequency = frequency;
    }

    pub fn set_score_filename(&mut self, name: impl Into<String>) {
        self.score_filename = name.into();
    }

    pub fn set_select_scores(&mut self, columns: ScoreFlags) {
        self.select_scores = columns;
    }

    pub fn set_record_diversity(&mut self, record: bool) {
        self.record_diversity = record;
    }

    pub fn set_elitism(&mut self, elitism: bool) {
        self.elitism = elitism;
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = objective;
    }

    /// A fraction in `(0, 1]`. Clears any explicit replacement number.
    pub fn set_replacement_percentage(&mut self, value: f32) -> Result<()> {
        if !(value > 0.0 && value <= 1.0) {
            return Err(GeneticError::Configuration(format!(
                "replacement_percentage must be in (0, 1], got {}",
                value
            )));
        }
        self.replacement_percentage = value;
        self.replacement_number = None;
        Ok(())
    }

    /// A count in `1..=population_size`.
    pub fn set_replacement_number(&mut self, n: usize) -> Result<()> {
        if n == 0 || n > self.population_size {
            return Err(GeneticError::Configuration(format!(
                "replacement_number must be in 1..={}, got {}",
                self.population_size, n
            )));
        }
        self.replacement_number = Some(n);
        Ok(())
    }

    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    /// Returns a builder for creating an `EvolutionOptions` instance.
    ///
    /// Unset knobs take their defaults.
    pub fn builder() -> EvolutionOptionsBuilder {
        EvolutionOptionsBuilder::default()
    }
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        Self {
            num_generations: DEFAULT_NUM_GENERATIONS,
            convergence_percentage: DEFAULT_CONVERGENCE_PERCENTAGE,
            generations_to_convergence: DEFAULT_GENERATIONS_TO_CONVERGENCE,
            mutation_probability: DEFAULT_MUTATION_PROBABILITY,
            crossover_probability: DEFAULT_CROSSOVER_PROBABILITY,
            population_size: DEFAULT_POPULATION_SIZE,
            num_best_genomes: DEFAULT_NUM_BEST_GENOMES,
            score_frequency: None,
            flush_frequency: DEFAULT_FLUSH_FREQUENCY,
            score_filename: DEFAULT_SCORE_FILENAME.to_string(),
            select_scores: ScoreFlags::default(),
            record_diversity: false,
            elitism: true,
            objective: Objective::default(),
            replacement_percentage: DEFAULT_REPLACEMENT_PERCENTAGE,
            replacement_number: None,
            log_level: LogLevel::default(),
        }
    }
}

fn check_unit(name: &str, value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(GeneticError::Configuration(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )))
    }
}

/// Builder for `EvolutionOptions`.
///
/// Provides a fluent interface for constructing `EvolutionOptions` instances.
#[derive(Debug, Clone, Default)]
pub struct EvolutionOptionsBuilder {
    num_generations: Option<usize>,
    convergence_percentage: Option<f32>,
    generations_to_convergence: Option<usize>,
    mutation_probability: Option<f32>,
    crossover_probability: Option<f32>,
    population_size: Option<usize>,
    num_best_genomes: Option<usize>,
    score_frequency: Option<usize>,
    flush_frequency: Option<usize>,
    score_filename: Option<String>,
    select_scores: Option<ScoreFlags>,
    record_diversity: Option<bool>,
    elitism: Option<bool>,
    objective: Option<Objective>,
    replacement_percentage: Option<f32>,
    replacement_number: Option<usize>,
    log_level: Option<LogLevel>,
}

impl EvolutionOptionsBuilder {
    pub fn num_generations(mut self, value: usize) -> Self {
        self.num_generations = Some(value);
        self
    }

    pub fn convergence_percentage(mut self, value: f32) -> Self {
        self.convergence_percentage = Some(value);
        self
    }

    pub fn generations_to_convergence(mut self, value: usize) -> Self {
        self.generations_to_convergence = Some(value);
        self
    }

    pub fn mutation_probability(mut self, value: f32) -> Self {
        self.mutation_probability = Some(value);
        self
    }

    pub fn crossover_probability(mut self, value: f32) -> Self {
        self.crossover_probability = Some(value);
        self
    }

    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    pub fn num_best_genomes(mut self, value: usize) -> Self {
        self.num_best_genomes = Some(value);
        self
    }

    pub fn score_frequency(mut self, value: usize) -> Self {
        self.score_frequency = Some(value);
        self
    }

    pub fn flush_frequency(mut self, value: usize) -> Self {
        self.flush_frequency = Some(value);
        self
    }

    pub fn score_filename(mut self, value: impl Into<String>) -> Self {
        self.score_filename = Some(value.into());
        self
    }

    pub fn select_scores(mut self, value: ScoreFlags) -> Self {
        self.select_scores = Some(value);
        self
    }

    pub fn record_diversity(mut self, value: bool) -> Self {
        self.record_diversity = Some(value);
        self
    }

    pub fn elitism(mut self, value: bool) -> Self {
        self.elitism = Some(value);
        self
    }

    pub fn objective(mut self, value: Objective) -> Self {
        self.objective = Some(value);
        self
    }

    pub fn replacement_percentage(mut self, value: f32) -> Self {
        self.replacement_percentage = Some(value);
        self
    }

    pub fn replacement_number(mut self, value: usize) -> Self {
        self.replacement_number = Some(value);
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    /// Builds the `EvolutionOptions` instance.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a probability or percentage is out of range, the
    /// population is empty, or the replacement number does not fit the population.
    pub fn build(self) -> Result<EvolutionOptions> {
        let mut options = EvolutionOptions::default();
        if let Some(value) = self.num_generations {
            options.set_num_generations(value);
        }
        if let Some(value) = self.convergence_percentage {
            options.set_convergence_percentage(value)?;
        }
        if let Some(value) = self.generations_to_convergence {
            options.set_generations_to_convergence(value);
        }
        if let Some(value) = self.mutation_probability {
            options.set_mutation_probability(value)?;
        }
        if let Some(value) = self.crossover_probability {
            options.set_crossover_probability(value)?;
        }
        if let Some(value) = self.population_size {
            options.set_population_size(value)?;
        }
        if let Some(value) = self.num_best_genomes {
            options.set_num_best_genomes(value);
        }
        options.score_frequency = self.score_frequency;
        if let Some(value) = self.flush_frequency {
            options.set_flush_frequency(value);
        }
        if let Some(value) = self.score_filename {
            options.set_score_filename(value);
        }
        if let Some(value) = self.select_scores {
            options.set_select_scores(value);
        }
        if let Some(value) = self.record_diversity {
            options.set_record_diversity(value);
        }
        if let Some(value) = self.elitism {
            options.set_elitism(value);
        }
        if let Some(value) = self.objective {
            options.set_objective(value);
        }
        if let Some(value) = self.replacement_percentage {
            options.set_replacement_percentage(value)?;
        }
        if let Some(value) = self.replacement_number {
            options.set_replacement_number(value)?;
        }
        if let Some(value) = self.log_level {
            options.set_log_level(value);
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EvolutionOptions::default();
        assert_eq!(options.get_num_generations(), 250);
        assert_eq!(options.get_convergence_percentage(), 0.99);
        assert_eq!(options.get_generations_to_convergence(), 20);
        assert_eq!(options.get_mutation_probability(), 0.01);
        assert_eq!(options.get_crossover_probability(), 0.9);
        assert_eq!(options.get_population_size(), 50);
        assert_eq!(options.get_num_best_genomes(), 1);
        assert_eq!(options.get_score_frequency(), None);
        assert_eq!(options.get_flush_frequency(), 0);
        assert_eq!(options.get_score_filename(), "generations.dat");
        assert_eq!(options.get_select_scores(), ScoreFlags::MAXIMUM);
        assert!(!options.get_record_diversity());
        assert!(options.get_elitism());
        assert_eq!(options.get_objective(), Objective::Maximize);
        assert_eq!(options.get_replacement_percentage(), 0.5);
        assert_eq!(options.get_log_level(), LogLevel::None);
        assert_eq!(EvolutionOptions::builder().build().unwrap(), options);
    }

    #[test]
    fn test_builder_overrides() {
        let options = EvolutionOptions::builder()
            .num_generations(10)
            .population_size(8)
            .replacement_number(3)
            .generations_to_convergence(0)
            .score_frequency(5)
            .build()
            .unwrap();
        assert_eq!(options.get_num_generations(), 10);
        assert_eq!(options.get_replacement_number(), Some(3));
        assert_eq!(options.get_generations_to_convergence(), 1);
        assert_eq!(options.get_score_frequency(), Some(5));
    }

    #[test]
    fn test_builder_rejects_bad_values() {
        assert!(EvolutionOptions::builder().mutation_probability(1.5).build().is_err());
        assert!(EvolutionOptions::builder().crossover_probability(-0.1).build().is_err());
        assert!(EvolutionOptions::builder().replacement_percentage(0.0).build().is_err());
        assert!(EvolutionOptions::builder()
            .population_size(4)
            .replacement_number(5)
            .build()
            .is_err());
    }

    #[test]
    fn test_rejected_setter_keeps_value() {
        let mut options = EvolutionOptions::default();
        assert!(options.set_mutation_probability(2.0).is_err());
        assert_eq!(options.get_mutation_probability(), 0.01);
        assert!(options.set_population_size(0).is_err());
        assert_eq!(options.get_population_size(), 50);
    }

    #[test]
    fn test_objective_ints() {
        assert_eq!(Objective::from_int(-1), Objective::Minimize);
        assert_eq!(Objective::from_int(1), Objective::Maximize);
        assert_eq!(Objective::Minimize.as_int(), -1);
        assert_eq!(Objective::Minimize.sort_order(), SortOrder::LowIsBest);
    }
}
