//! # SteadyStateGa
//!
//! The overlapping-population driver. Each step breeds a batch of children into a scratch
//! population, adds them to the main population, and removes as many of the worst
//! individuals (by fitness) again. The population size is the same before and after a step.
//!
//! The batch size is either a fixed number or a fraction of the population; setting one
//! recomputes the other. Score snapshots default to every 100 generations.

use tracing::trace;

use super::algorithm::{breed, count_value, float_value, Evolution, GeneticAlgorithm};
use super::options::EvolutionOptions;
use super::parameters::{names, ParameterList, ParameterValue};
use crate::error::{GeneticError, Result};
use crate::genome::Chromosome;
use crate::population::{Population, Slot};
use crate::selection::SortBasis;
use crate::statistics::DEFAULT_STEADY_STATE_SCORE_FREQUENCY;

pub struct SteadyStateGa<C: Chromosome> {
    base: GeneticAlgorithm<C>,
    scratch: Population<C>,
}

impl<C: Chromosome> SteadyStateGa<C> {
    pub fn new(population: Population<C>, options: EvolutionOptions) -> Result<Self> {
        let base =
            GeneticAlgorithm::new(population, options, DEFAULT_STEADY_STATE_SCORE_FREQUENCY)?;
        let mut ga = Self {
            base,
            scratch: Population::new(),
        };
        ga.resize_scratch();
        Ok(ga)
    }

    /// Children bred per step.
    pub fn replacement_number(&self) -> usize {
        let size = self.base.population.len();
        let n = match self.base.options.get_replacement_number() {
            Some(n) => n,
            None => {
                ((self.base.options.get_replacement_percentage() * size as f32) as usize).max(1)
            }
        };
        n.min(size).max(1)
    }

    /// Children bred per step as a fraction of the population.
    pub fn replacement_percentage(&self) -> f32 {
        match self.base.options.get_replacement_number() {
            Some(n) => n as f32 / self.base.population.len() as f32,
            None => self.base.options.get_replacement_percentage(),
        }
    }

    pub fn set_replacement_percentage(&mut self, value: f32) -> Result<()> {
        self.base.options.set_replacement_percentage(value)?;
        self.resize_scratch();
        Ok(())
    }

    pub fn set_replacement_number(&mut self, n: usize) -> Result<()> {
        self.base.options.set_replacement_number(n)?;
        self.resize_scratch();
        Ok(())
    }

    /// Resizes the population. A fixed replacement number larger than the new size is
    /// clipped to it.
    pub fn set_population_size(&mut self, size: usize) -> Result<()> {
        self.base.resize_population(size)?;
        if let Some(n) = self.base.options.get_replacement_number() {
            if n > size {
                self.base.options.set_replacement_number(size)?;
            }
        }
        self.resize_scratch();
        Ok(())
    }

    fn resize_scratch(&mut self) {
        let prototype = self.base.population.individual(0, SortBasis::Raw);
        self.scratch = Population::with_size(prototype, self.replacement_number());
    }
}

impl<C: Chromosome> Evolution<C> for SteadyStateGa<C> {
    fn base(&self) -> &GeneticAlgorithm<C> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GeneticAlgorithm<C> {
        &mut self.base
    }

    fn initialize(&mut self, seed: u64) -> Result<()> {
        self.base.start(seed)?;
        self.resize_scratch();
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        self.base.ensure_initialized()?;
        let sexual = self.base.sexual().cloned();
        let GeneticAlgorithm {
            options,
            population,
            statistics,
            rng,
            ..
        } = &mut self.base;
        breed(
            population,
            &mut self.scratch,
            sexual.as_ref(),
            options,
            rng,
            statistics,
        )?;

        let n = self.scratch.len();
        for child in self.scratch.iter() {
            population.add(child.clone());
        }
        population.evaluate(false)?;
        population.scale(false)?;

        for i in 0..n {
            let worst = population
                .remove(Slot::Worst, SortBasis::Scaled, rng)?
                .ok_or(GeneticError::EmptyPopulation)?;
            trace!(score = worst.cached_score(), "Removed worst individual");
            self.scratch
                .replace(worst, Slot::Index(i), SortBasis::Raw, rng)?;
        }
        statistics.replacements += n;
        self.base.finish_generation()
    }

    fn set_parameter(&mut self, name: &str, value: &ParameterValue) -> Result<()> {
        match names::canonical(name) {
            Some(names::REPLACEMENT_PERCENTAGE) => {
                self.set_replacement_percentage(float_value(name, value)?)
            }
            Some(names::REPLACEMENT_NUMBER) => {
                self.set_replacement_number(count_value(name, value)?)
            }
            Some(names::POPULATION_SIZE) => self.set_population_size(count_value(name, value)?),
            _ => self.base.apply_parameter(name, value),
        }
    }

    fn parameters(&self) -> ParameterList {
        let mut list = self.base.common_parameters();
        list.add(
            names::REPLACEMENT_PERCENTAGE,
            names::REPLACEMENT_PERCENTAGE_SHORT,
            ParameterValue::Float(self.replacement_percentage() as f64),
        );
        list.add(
            names::REPLACEMENT_NUMBER,
            names::REPLACEMENT_NUMBER_SHORT,
            ParameterValue::Int(self.replacement_number() as i64),
        );
        list
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::genome::{BinaryString, Genome};

    fn ones_population(size: usize) -> Population<BinaryString> {
        let prototype = Genome::new(BinaryString::new(16)).with_evaluator(Arc::new(
            |g: &Genome<BinaryString>| Ok(g.chromosome().count_ones() as f32),
        ));
        Population::with_size(&prototype, size)
    }

    #[test]
    fn test_replacement_defaults_to_half() {
        let ga = SteadyStateGa::new(ones_population(10), EvolutionOptions::default()).unwrap();
        assert_eq!(ga.replacement_number(), 5);
        assert_eq!(ga.replacement_percentage(), 0.5);
        assert_eq!(ga.statistics().score_frequency(), 100);
    }

    #[test]
    fn test_replacement_number_and_percentage_track() {
        let mut ga =
            SteadyStateGa::new(ones_population(10), EvolutionOptions::default()).unwrap();
        ga.set_replacement_number(4).unwrap();
        assert_eq!(ga.replacement_percentage(), 0.4);
        assert!(ga.set_replacement_number(11).is_err());
        assert_eq!(ga.replacement_number(), 4);

        ga.set_replacement_percentage(0.05).unwrap();
        assert_eq!(ga.replacement_number(), 1);
        assert!(ga.set_replacement_percentage(1.5).is_err());
    }

    #[test]
    fn test_shrinking_clips_replacement_number() {
        let mut ga =
            SteadyStateGa::new(ones_population(10), EvolutionOptions::default()).unwrap();
        ga.set_replacement_number(8).unwrap();
        ga.set_population_size(6).unwrap();
        assert_eq!(ga.replacement_number(), 6);
        assert_eq!(ga.population().len(), 6);
    }

    #[test]
    fn test_step_keeps_size() {
        let mut ga =
            SteadyStateGa::new(ones_population(12), EvolutionOptions::default()).unwrap();
        ga.initialize(3).unwrap();
        for _ in 0..10 {
            ga.step().unwrap();
            assert_eq!(ga.population().len(), 12);
        }
        assert_eq!(ga.generation(), 10);
        assert_eq!(ga.statistics().replacements(), 60);
    }

    #[test]
    fn test_step_before_initialize_fails() {
        let mut ga =
            SteadyStateGa::new(ones_population(4), EvolutionOptions::default()).unwrap();
        assert!(matches!(ga.step(), Err(GeneticError::Configuration(_))));
    }
}
