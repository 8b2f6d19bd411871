//! # GeneticAlgorithm
//!
//! State shared by every driver: options, population, statistics, random source, terminator
//! and the mating operators. The [`Evolution`] trait is the driver interface; each driver
//! owns a [`GeneticAlgorithm`] and supplies its own `initialize` and `step`.
//!
//! A driver moves through [`EvolutionState`]: it is `Unconfigured` until initialized, then
//! `Initialized`, `Stepping` once a generation has run, and `Terminated` when
//! [`Evolution::evolve`] sees the terminator fire.

use tracing::{debug, info};

use super::options::{EvolutionOptions, LogLevel, Objective};
use super::parameters::{names, ParameterList, ParameterValue, ParseOutcome};
use super::terminator::{upon_generation, Terminator};
use crate::error::{absorb, report, GeneticError, Result};
use crate::genome::{AsexualCrossover, Chromosome, Genome, SexualCrossover};
use crate::population::Population;
use crate::rng::RandomNumberGenerator;
use crate::selection::SortBasis;
use crate::statistics::{ScoreFlags, ScoreLog, Statistics};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionState {
    Unconfigured,
    Initialized,
    Stepping,
    Terminated,
}

pub struct GeneticAlgorithm<C: Chromosome> {
    pub(crate) options: EvolutionOptions,
    pub(crate) population: Population<C>,
    pub(crate) statistics: Statistics<C>,
    pub(crate) rng: RandomNumberGenerator,
    terminator: Terminator<C>,
    sexual: Option<SexualCrossover<C>>,
    asexual: Option<AsexualCrossover<C>>,
    pub(crate) state: EvolutionState,
}

impl<C: Chromosome> GeneticAlgorithm<C> {
    /// Takes over `population`; its first member is the prototype for the mating operators
    /// and the best-of-run archive. The population size option follows the population.
    pub(crate) fn new(
        mut population: Population<C>,
        mut options: EvolutionOptions,
        default_score_frequency: usize,
    ) -> Result<Self> {
        if population.is_empty() {
            return Err(GeneticError::Configuration(
                "an evolution needs at least one individual".to_string(),
            ));
        }
        options.set_population_size(population.len())?;
        population.set_order(options.get_objective().sort_order());

        let prototype = population.individual(0, SortBasis::Raw);
        let sexual = prototype.sexual().cloned();
        let asexual = prototype.asexual().cloned();
        let prototype = prototype.clone_attributes();

        let mut rng = RandomNumberGenerator::new();
        let mut statistics = Statistics::new();
        statistics.set_score_frequency(
            options
                .get_score_frequency()
                .unwrap_or(default_score_frequency),
        );
        statistics.set_flush_frequency(options.get_flush_frequency())?;
        statistics.set_score_filename(options.get_score_filename());
        statistics.set_score_columns(options.get_select_scores());
        statistics.set_record_diversity(options.get_record_diversity());
        statistics.set_convergence_window(options.get_generations_to_convergence());
        statistics.set_best_genomes(&prototype, options.get_num_best_genomes(), &mut rng)?;

        Ok(Self {
            options,
            population,
            statistics,
            rng,
            terminator: upon_generation(),
            sexual,
            asexual,
            state: EvolutionState::Unconfigured,
        })
    }

    pub fn options(&self) -> &EvolutionOptions {
        &self.options
    }

    pub fn state(&self) -> EvolutionState {
        self.state
    }

    /// Generations completed since the last initialization.
    pub fn generation(&self) -> usize {
        self.statistics.generation()
    }

    pub fn convergence(&self) -> f32 {
        self.statistics.convergence()
    }

    pub fn population(&self) -> &Population<C> {
        &self.population
    }

    /// Direct access to the current population. Drivers that keep a second population
    /// pick up changes made here at the next initialization.
    pub fn population_mut(&mut self) -> &mut Population<C> {
        &mut self.population
    }

    pub fn statistics(&self) -> &Statistics<C> {
        &self.statistics
    }

    pub fn statistics_mut(&mut self) -> &mut Statistics<C> {
        &mut self.statistics
    }

    pub fn rng_mut(&mut self) -> &mut RandomNumberGenerator {
        &mut self.rng
    }

    /// Whether the terminator considers the run over.
    pub fn is_done(&self) -> bool {
        (self.terminator)(self)
    }

    pub fn set_terminator(&mut self, terminator: Terminator<C>) {
        self.terminator = terminator;
    }

    pub fn sexual(&self) -> Option<&SexualCrossover<C>> {
        self.sexual.as_ref()
    }

    pub fn set_crossover(&mut self, crossover: SexualCrossover<C>) {
        self.sexual = Some(crossover);
    }

    /// The asexual operator is kept for callers; the built-in steps mate sexually.
    pub fn asexual(&self) -> Option<&AsexualCrossover<C>> {
        self.asexual.as_ref()
    }

    pub fn set_asexual_crossover(&mut self, crossover: AsexualCrossover<C>) {
        self.asexual = Some(crossover);
    }

    pub fn set_score_log(&mut self, log: Box<dyn ScoreLog>) {
        self.statistics.set_score_log(log);
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.options.set_objective(objective);
        self.population.set_order(objective.sort_order());
    }

    pub fn set_num_generations(&mut self, n: usize) {
        self.options.set_num_generations(n);
    }

    pub fn set_convergence_percentage(&mut self, value: f32) -> Result<()> {
        self.options.set_convergence_percentage(value)
    }

    pub fn set_generations_to_convergence(&mut self, n: usize) {
        self.options.set_generations_to_convergence(n);
        self.statistics
            .set_convergence_window(self.options.get_generations_to_convergence());
    }

    pub fn set_mutation_probability(&mut self, value: f32) -> Result<()> {
        self.options.set_mutation_probability(value)
    }

    pub fn set_crossover_probability(&mut self, value: f32) -> Result<()> {
        self.options.set_crossover_probability(value)
    }

    pub fn set_num_best_genomes(&mut self, n: usize) -> Result<()> {
        let prototype = self
            .population
            .individual(0, SortBasis::Raw)
            .clone_attributes();
        self.statistics
            .set_best_genomes(&prototype, n, &mut self.rng)?;
        self.options.set_num_best_genomes(n);
        Ok(())
    }

    pub fn set_score_frequency(&mut self, frequency: usize) {
        self.options.set_score_frequency(frequency);
        self.statistics.set_score_frequency(frequency);
    }

    pub fn set_flush_frequency(&mut self, frequency: usize) -> Result<()> {
        self.statistics.set_flush_frequency(frequency)?;
        self.options.set_flush_frequency(frequency);
        Ok(())
    }

    pub fn set_score_filename(&mut self, name: &str) {
        self.options.set_score_filename(name);
        self.statistics.set_score_filename(name);
    }

    pub fn set_select_scores(&mut self, columns: ScoreFlags) {
        self.options.set_select_scores(columns);
        self.statistics.set_score_columns(columns);
    }

    pub fn set_record_diversity(&mut self, record: bool) {
        self.options.set_record_diversity(record);
        self.statistics.set_record_diversity(record);
    }

    /// Grows or shrinks the current population.
    pub(crate) fn resize_population(&mut self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(GeneticError::Configuration(
                "population_size must be at least 1".to_string(),
            ));
        }
        self.population.set_size(size, &mut self.rng)?;
        self.options.set_population_size(size)
    }

    /// Applies one of the parameters every driver understands.
    pub(crate) fn apply_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<()> {
        let canonical = names::canonical(name)
            .ok_or_else(|| GeneticError::Configuration(format!("unknown parameter '{}'", name)))?;
        match canonical {
            names::MINIMAXI => self.set_objective(Objective::from_int(int_value(name, value)?)),
            names::NUMBER_OF_GENERATIONS => self.set_num_generations(count_value(name, value)?),
            names::CONVERGENCE_PERCENTAGE => {
                self.set_convergence_percentage(float_value(name, value)?)?
            }
            names::GENERATIONS_TO_CONVERGENCE => {
                self.set_generations_to_convergence(count_value(name, value)?)
            }
            names::CROSSOVER_PROBABILITY => {
                self.set_crossover_probability(float_value(name, value)?)?
            }
            names::MUTATION_PROBABILITY => {
                self.set_mutation_probability(float_value(name, value)?)?
            }
            names::POPULATION_SIZE => self.resize_population(count_value(name, value)?)?,
            names::NUMBER_OF_BEST => self.set_num_best_genomes(count_value(name, value)?)?,
            names::SCORE_FREQUENCY => self.set_score_frequency(count_value(name, value)?),
            names::FLUSH_FREQUENCY => self.set_flush_frequency(count_value(name, value)?)?,
            names::SCORE_FILENAME => {
                let text = value.as_text().ok_or_else(|| type_error(name, "text"))?;
                self.set_score_filename(text);
            }
            names::SELECT_SCORES => {
                let bits = u8::try_from(int_value(name, value)?).map_err(|_| {
                    GeneticError::Configuration(format!("{} must fit in 8 bits", name))
                })?;
                self.set_select_scores(ScoreFlags::from_bits(bits));
            }
            names::RECORD_DIVERSITY => self.set_record_diversity(bool_value(name, value)?),
            _ => {
                return Err(GeneticError::Configuration(format!(
                    "parameter '{}' does not apply to this driver",
                    name
                )))
            }
        }
        Ok(())
    }

    /// The parameters every driver understands, with their current values.
    pub(crate) fn common_parameters(&self) -> ParameterList {
        let o = &self.options;
        let mut list = ParameterList::new();
        let entries = [
            (
                names::MINIMAXI,
                names::MINIMAXI_SHORT,
                ParameterValue::Int(o.get_objective().as_int()),
            ),
            (
                names::NUMBER_OF_GENERATIONS,
                names::NUMBER_OF_GENERATIONS_SHORT,
                ParameterValue::Int(o.get_num_generations() as i64),
            ),
            (
                names::CONVERGENCE_PERCENTAGE,
                names::CONVERGENCE_PERCENTAGE_SHORT,
                ParameterValue::Float(o.get_convergence_percentage() as f64),
            ),
            (
                names::GENERATIONS_TO_CONVERGENCE,
                names::GENERATIONS_TO_CONVERGENCE_SHORT,
                ParameterValue::Int(o.get_generations_to_convergence() as i64),
            ),
            (
                names::CROSSOVER_PROBABILITY,
                names::CROSSOVER_PROBABILITY_SHORT,
                ParameterValue::Float(o.get_crossover_probability() as f64),
            ),
            (
                names::MUTATION_PROBABILITY,
                names::MUTATION_PROBABILITY_SHORT,
                ParameterValue::Float(o.get_mutation_probability() as f64),
            ),
            (
                names::POPULATION_SIZE,
                names::POPULATION_SIZE_SHORT,
                ParameterValue::Int(self.population.len() as i64),
            ),
            (
                names::NUMBER_OF_BEST,
                names::NUMBER_OF_BEST_SHORT,
                ParameterValue::Int(self.statistics.n_best_genomes() as i64),
            ),
            (
                names::SCORE_FREQUENCY,
                names::SCORE_FREQUENCY_SHORT,
                ParameterValue::Int(self.statistics.score_frequency() as i64),
            ),
            (
                names::FLUSH_FREQUENCY,
                names::FLUSH_FREQUENCY_SHORT,
                ParameterValue::Int(o.get_flush_frequency() as i64),
            ),
            (
                names::SCORE_FILENAME,
                names::SCORE_FILENAME_SHORT,
                ParameterValue::Text(o.get_score_filename().to_string()),
            ),
            (
                names::SELECT_SCORES,
                names::SELECT_SCORES_SHORT,
                ParameterValue::Int(o.get_select_scores().bits() as i64),
            ),
            (
                names::RECORD_DIVERSITY,
                names::RECORD_DIVERSITY_SHORT,
                ParameterValue::Bool(o.get_record_diversity()),
            ),
        ];
        for (name, short, value) in entries {
            list.add(name, short, value);
        }
        list
    }

    /// Seeds the random source, then initializes, evaluates and records the population.
    pub(crate) fn start(&mut self, seed: u64) -> Result<()> {
        self.rng.seed(seed);
        self.population.initialize(&mut self.rng);
        self.population.evaluate(true)?;
        self.statistics.reset(&mut self.population)?;
        if self.sexual.is_none() {
            report(&GeneticError::OperationUndefined(
                "no sexual crossover; offspring will be copies of their parents".to_string(),
            ));
        }
        self.state = EvolutionState::Initialized;
        let initial = self.statistics.initial();
        match self.options.get_log_level() {
            LogLevel::None => debug!(
                seed = self.rng.current_seed(),
                size = self.population.len(),
                best = initial.max,
                "Evolution initialized"
            ),
            _ => info!(
                seed = self.rng.current_seed(),
                size = self.population.len(),
                best = initial.max,
                "Evolution initialized"
            ),
        }
        Ok(())
    }

    pub(crate) fn ensure_initialized(&self) -> Result<()> {
        if self.state == EvolutionState::Unconfigured {
            return Err(GeneticError::Configuration(
                "initialize the evolution before stepping it".to_string(),
            ));
        }
        Ok(())
    }

    /// Records the generation just bred into `population` and logs its summary.
    pub(crate) fn finish_generation(&mut self) -> Result<()> {
        self.statistics.update(&mut self.population)?;
        self.state = EvolutionState::Stepping;
        let current = self.statistics.current();
        match self.options.get_log_level() {
            LogLevel::Verbose => info!(
                generation = current.generation,
                max = current.max,
                min = current.min,
                mean = current.mean,
                "Generation complete"
            ),
            _ => debug!(
                generation = current.generation,
                max = current.max,
                min = current.min,
                mean = current.mean,
                "Generation complete"
            ),
        }
        Ok(())
    }

    pub(crate) fn finish_run(&mut self) -> Result<()> {
        self.state = EvolutionState::Terminated;
        if self.options.get_flush_frequency() > 0 {
            absorb(self.statistics.flush_scores())?;
        }
        match self.options.get_log_level() {
            LogLevel::None => debug!(
                generations = self.generation(),
                best = self.statistics.max_ever(),
                "Evolution terminated"
            ),
            _ => info!(
                generations = self.generation(),
                best = self.statistics.max_ever(),
                worst = self.statistics.min_ever(),
                "Evolution terminated"
            ),
        }
        Ok(())
    }
}

fn type_error(name: &str, expected: &str) -> GeneticError {
    GeneticError::Configuration(format!("parameter '{}' takes a {}", name, expected))
}

pub(crate) fn int_value(name: &str, value: &ParameterValue) -> Result<i64> {
    value.as_int().ok_or_else(|| type_error(name, "int"))
}

pub(crate) fn count_value(name: &str, value: &ParameterValue) -> Result<usize> {
    usize::try_from(int_value(name, value)?).map_err(|_| {
        GeneticError::Configuration(format!("parameter '{}' must not be negative", name))
    })
}

pub(crate) fn float_value(name: &str, value: &ParameterValue) -> Result<f32> {
    value
        .as_float()
        .map(|v| v as f32)
        .ok_or_else(|| type_error(name, "float"))
}

pub(crate) fn bool_value(name: &str, value: &ParameterValue) -> Result<bool> {
    value.as_bool().ok_or_else(|| type_error(name, "bool"))
}

/// Fills every slot of `children` with offspring of parents selected from `parents`.
///
/// Pairs of slots get two children of one mating, or copies of both parents when the
/// crossover coin says no. A trailing odd slot gets one child, or a copy of one parent.
/// Every child is then mutated.
pub(crate) fn breed<C: Chromosome>(
    parents: &mut Population<C>,
    children: &mut Population<C>,
    sexual: Option<&SexualCrossover<C>>,
    options: &EvolutionOptions,
    rng: &mut RandomNumberGenerator,
    statistics: &mut Statistics<C>,
) -> Result<()> {
    let basis = parents.selector().basis();
    let pcross = options.get_crossover_probability();
    let pmut = options.get_mutation_probability();
    let n = children.len();

    let mut i = 0;
    while i + 1 < n {
        let mom = parents.select_position(rng)?;
        let dad = parents.select_position(rng)?;
        statistics.selections += 2;
        let (mom, dad) = (parents.individual(mom, basis), parents.individual(dad, basis));
        let Some((sis, bro)) = children.pair_mut(i, i + 1, SortBasis::Raw) else {
            break;
        };

        let mut fresh = [false, false];
        match sexual {
            Some(crossover) if rng.flip_coin(pcross) => {
                statistics.crossovers +=
                    crossover(mom, dad, Some(&mut *sis), Some(&mut *bro), rng);
                fresh = [true, true];
            }
            _ => {
                sis.copy_from(mom);
                bro.copy_from(dad);
            }
        }
        for (k, child) in [sis, bro].into_iter().enumerate() {
            let mutations = child.mutate(pmut, rng);
            statistics.mutations += mutations;
            fresh[k] |= mutations > 0;
        }
        statistics.evaluations += fresh.iter().filter(|&&f| f).count();
        i += 2;
    }

    if n % 2 == 1 {
        let mom = parents.select_position(rng)?;
        let dad = parents.select_position(rng)?;
        statistics.selections += 2;
        let (mom, dad) = (parents.individual(mom, basis), parents.individual(dad, basis));
        if let Some(child) = children.individual_mut(n - 1, SortBasis::Raw) {
            let mut fresh = false;
            match sexual {
                Some(crossover) if rng.flip_coin(pcross) => {
                    statistics.crossovers += crossover(mom, dad, Some(&mut *child), None, rng);
                    fresh = true;
                }
                _ => child.copy_from(if rng.random_bit() { mom } else { dad }),
            }
            let mutations = child.mutate(pmut, rng);
            statistics.mutations += mutations;
            if fresh || mutations > 0 {
                statistics.evaluations += 1;
            }
        }
    }
    Ok(())
}

/// The driver interface.
pub trait Evolution<C: Chromosome> {
    fn base(&self) -> &GeneticAlgorithm<C>;

    fn base_mut(&mut self) -> &mut GeneticAlgorithm<C>;

    /// Seeds the random source (`0` keeps the current stream) and builds, evaluates and
    /// records a fresh population.
    fn initialize(&mut self, seed: u64) -> Result<()>;

    /// Runs one generation.
    ///
    /// # Errors
    ///
    /// Fails if the driver has not been initialized, and propagates evaluation errors,
    /// cancellation among them.
    fn step(&mut self) -> Result<()>;

    /// Sets a parameter by full or short name. A rejected value leaves the old one in place.
    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<()>;

    /// Every parameter of this driver with its current value.
    fn parameters(&self) -> ParameterList;

    fn done(&self) -> bool {
        self.base().is_done()
    }

    /// Initializes, steps until the terminator fires, then flushes buffered scores.
    fn evolve(&mut self, seed: u64) -> Result<()> {
        self.initialize(seed)?;
        while !self.done() {
            self.step()?;
        }
        self.base_mut().finish_run()
    }

    /// Reads parameters from a command line and applies the ones that changed. Values the
    /// driver rejects are reported and skipped.
    fn parse_parameters<S: AsRef<str>>(&mut self, argv: &[S], strict: bool) -> Result<ParseOutcome>
    where
        Self: Sized,
    {
        let before = self.parameters();
        let mut list = before.clone();
        let outcome = list.parse(argv, strict);
        for parameter in list.iter() {
            if before.get(&parameter.name) != Some(&parameter.value) {
                absorb(self.set_parameter(&parameter.name, &parameter.value))?;
            }
        }
        Ok(outcome)
    }

    fn generation(&self) -> usize {
        self.base().generation()
    }

    fn population(&self) -> &Population<C> {
        self.base().population()
    }

    fn statistics(&self) -> &Statistics<C> {
        self.base().statistics()
    }

    fn statistics_mut(&mut self) -> &mut Statistics<C> {
        self.base_mut().statistics_mut()
    }

    /// The best genome seen so far.
    fn best(&mut self) -> Result<&Genome<C>> {
        self.base_mut().statistics.best_individual(0)
    }
}
