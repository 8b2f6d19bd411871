//! # SimpleGa
//!
//! The generational driver. Each step breeds a whole new population from the previous
//! one: two buffers are swapped, parents are selected from the old buffer, and the
//! children overwrite the new one. With elitism on, the previous best survives into the
//! new generation whenever it beats the new best.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gaforge::evolution::{Evolution, EvolutionBuilder, EvolutionOptions};
//! use gaforge::genome::{BinaryString, Genome};
//!
//! let prototype = Genome::new(BinaryString::new(20))
//!     .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
//!         Ok(g.chromosome().count_ones() as f32)
//!     }));
//! let options = EvolutionOptions::builder()
//!     .num_generations(30)
//!     .population_size(20)
//!     .build()
//!     .unwrap();
//!
//! let mut ga = EvolutionBuilder::new()
//!     .with_prototype(prototype)
//!     .with_options(options)
//!     .build_simple()
//!     .unwrap();
//! ga.evolve(7).unwrap();
//!
//! assert_eq!(ga.generation(), 30);
//! let initial = ga.statistics().initial().max;
//! assert!(ga.best().unwrap().cached_score() >= initial);
//! ```

use std::mem;

use super::algorithm::{bool_value, breed, count_value, Evolution, GeneticAlgorithm};
use super::options::{EvolutionOptions, Objective};
use super::parameters::{names, ParameterList, ParameterValue};
use crate::error::Result;
use crate::genome::Chromosome;
use crate::population::{Population, Slot};
use crate::scaling::ScalingScheme;
use crate::selection::{SelectionScheme, SortBasis};
use crate::statistics::DEFAULT_SCORE_FREQUENCY;

pub struct SimpleGa<C: Chromosome> {
    base: GeneticAlgorithm<C>,
    previous: Population<C>,
}

impl<C: Chromosome> SimpleGa<C> {
    pub fn new(population: Population<C>, options: EvolutionOptions) -> Result<Self> {
        let base = GeneticAlgorithm::new(population, options, DEFAULT_SCORE_FREQUENCY)?;
        let previous = base.population.clone();
        Ok(Self { base, previous })
    }

    pub fn elitism(&self) -> bool {
        self.base.options.get_elitism()
    }

    pub fn set_elitism(&mut self, elitism: bool) {
        self.base.options.set_elitism(elitism);
    }

    pub fn set_objective(&mut self, objective: Objective) {
        self.base.set_objective(objective);
        self.previous.set_order(objective.sort_order());
    }

    pub fn set_population_size(&mut self, size: usize) -> Result<()> {
        self.base.resize_population(size)?;
        self.previous.set_size(size, &mut self.base.rng)?;
        Ok(())
    }

    /// Sets the scaling scheme of both buffers.
    pub fn set_scaling(&mut self, scaling: Box<dyn ScalingScheme>) {
        self.previous.set_scaling(scaling.clone());
        self.base.population.set_scaling(scaling);
    }

    /// Sets the selection scheme of both buffers.
    pub fn set_selector(&mut self, selector: Box<dyn SelectionScheme>) {
        self.previous.set_selector(selector.clone());
        self.base.population.set_selector(selector);
    }

    /// Puts the previous best in place of the new worst, and the displaced worst in place
    /// of the previous best, when the previous best is strictly better.
    fn keep_elite(&mut self) -> Result<()> {
        let order = self.base.population.order();
        let previous_best = self.previous.best(0, SortBasis::Raw)?;
        let elite = previous_best.clone();
        let current_best = self.base.population.best(0, SortBasis::Raw)?.cached_score();
        if !order.is_better(elite.cached_score(), current_best) {
            return Ok(());
        }
        let rng = &mut self.base.rng;
        if let Some(displaced) =
            self.base
                .population
                .replace(elite, Slot::Worst, SortBasis::Raw, rng)?
        {
            self.previous
                .replace(displaced, Slot::Best, SortBasis::Raw, rng)?;
        }
        Ok(())
    }
}

impl<C: Chromosome> Evolution<C> for SimpleGa<C> {
    fn base(&self) -> &GeneticAlgorithm<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GeneticAlgorithm<C> {
        &mut self.base
    }

    fn initialize(&mut self, seed: u64) -> Result<()> {
        self.base.start(seed)?;
        self.previous = self.base.population.clone();
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.base.ensure_initialized()?;
        mem::swap(&mut self.base.population, &mut self.previous);

        let sexual = self.base.sexual().cloned();
        let GeneticAlgorithm {
            options,
            population,
            statistics,
            rng,
            ..
        } = &mut self.base;
        breed(
            &mut self.previous,
            population,
            sexual.as_ref(),
            options,
            rng,
            statistics,
        )?;
        statistics.replacements += population.len();
        population.evaluate(true)?;

        if self.base.options.get_elitism() {
            self.keep_elite()?;
        }
        self.base.finish_generation()
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<()> {
        match names::canonical(name) {
            Some(names::ELITISM) => self.set_elitism(bool_value(name, value)?),
            Some(names::POPULATION_SIZE) => self.set_population_size(count_value(name, value)?)?,
            Some(names::MINIMAXI) => {
                self.base.apply_parameter(name, value)?;
                self.previous
                    .set_order(self.base.options.get_objective().sort_order());
            }
            _ => self.base.apply_parameter(name, value)?,
        }
        Ok(())
    }

    fn parameters(&self) -> ParameterList {
        let mut list = self.base.common_parameters();
        list.add(
            names::ELITISM,
            names::ELITISM_SHORT,
            ParameterValue::Bool(self.elitism()),
        );
        list
    }
}
