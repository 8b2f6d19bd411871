use crate::{
    error::{GeneticError, Result},
    genome::{Chromosome, Evaluator, Genome, SexualCrossover},
    population::Population,
    scaling::ScalingScheme,
    selection::{SelectionScheme, SortBasis},
    statistics::{ScoreLog, WriterScoreLog},
};

use super::{Evolution, EvolutionOptions, SimpleGa, SteadyStateGa, Terminator};

/// Assembles a driver from a prototype genome (or a ready population), options and
/// optional strategy overrides.
pub struct EvolutionBuilder<C: Chromosome> {
    prototype: Option<Genome<C>>,
    population: Option<Population<C>>,
    options: Option<EvolutionOptions>,
    evaluator: Option<Evaluator<C>>,
    scaling: Option<Box<dyn ScalingScheme>>,
    selector: Option<Box<dyn SelectionScheme>>,
    terminator: Option<Terminator<C>>,
    crossover: Option<SexualCrossover<C>>,
    score_log: Option<Box<dyn ScoreLog>>,
    score_file: bool,
}

impl<C: Chromosome> EvolutionBuilder<C> {
    pub fn new() -> Self {
        Self {
            prototype: None,
            population: None,
            options: None,
            evaluator: None,
            scaling: None,
            selector: None,
            terminator: None,
            crossover: None,
            score_log: None,
            score_file: false,
        }
    }

    /// The population is `population_size` copies of this genome's shape.
    pub fn with_prototype(mut self, prototype: Genome<C>) -> Self {
        self.prototype = Some(prototype);
        self
    }

    /// Takes this population as is; its size overrides `population_size`.
    pub fn with_population(mut self, population: Population<C>) -> Self {
        self.population = Some(population);
        self
    }

    pub fn with_options(mut self, options: EvolutionOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// The objective function, installed on every genome.
    pub fn with_evaluator(mut self, evaluator: Evaluator<C>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_scaling(mut self, scaling: Box<dyn ScalingScheme>) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn SelectionScheme>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_terminator(mut self, terminator: Terminator<C>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    /// Overrides the prototype's own sexual crossover.
    pub fn with_crossover(mut self, crossover: SexualCrossover<C>) -> Self {
        self.crossover = Some(crossover);
        self
    }

    pub fn with_score_log(mut self, log: Box<dyn ScoreLog>) -> Self {
        self.score_log = Some(log);
        self
    }

    /// Writes flushed score records to the options' score file instead of the log.
    pub fn with_score_file(mut self) -> Self {
        self.score_file = true;
        self
    }

    pub fn build_simple(mut self) -> Result<SimpleGa<C>> {
        let (population, options) = self.assemble()?;
        let mut ga = SimpleGa::new(population, options)?;
        self.configure(&mut ga)?;
        Ok(ga)
    }

    pub fn build_steady_state(mut self) -> Result<SteadyStateGa<C>> {
        let (population, options) = self.assemble()?;
        let mut ga = SteadyStateGa::new(population, options)?;
        self.configure(&mut ga)?;
        Ok(ga)
    }

    fn assemble(&mut self) -> Result<(Population<C>, EvolutionOptions)> {
        let options = self.options.take().unwrap_or_default();
        let mut population = match (self.population.take(), self.prototype.take()) {
            (Some(population), _) => population,
            (None, Some(mut prototype)) => {
                if let Some(evaluator) = &self.evaluator {
                    prototype.set_evaluator(evaluator.clone());
                }
                Population::with_size(&prototype, options.get_population_size())
            }
            (None, None) => {
                return Err(GeneticError::Configuration(
                    "Prototype genome or population not specified".to_string(),
                ))
            }
        };
        if let Some(evaluator) = self.evaluator.take() {
            for i in 0..population.len() {
                if let Some(genome) = population.individual_mut(i, SortBasis::Raw) {
                    genome.set_evaluator(evaluator.clone());
                }
            }
        }
        if let Some(scaling) = self.scaling.take() {
            population.set_scaling(scaling);
        }
        if let Some(selector) = self.selector.take() {
            population.set_selector(selector);
        }
        Ok((population, options))
    }

    fn configure<G: Evolution<C>>(self, ga: &mut G) -> Result<()> {
        let base = ga.base_mut();
        if let Some(terminator) = self.terminator {
            base.set_terminator(terminator);
        }
        if let Some(crossover) = self.crossover {
            base.set_crossover(crossover);
        }
        if self.score_file {
            let log = WriterScoreLog::create(base.options().get_score_filename())?;
            base.set_score_log(Box::new(log));
        } else if let Some(log) = self.score_log {
            base.set_score_log(log);
        }
        Ok(())
    }
}

impl<C: Chromosome> Default for EvolutionBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::genome::BinaryString;
    use crate::scaling::NoScaling;
    use crate::selection::RankSelection;

    fn prototype() -> Genome<BinaryString> {
        Genome::new(BinaryString::new(8))
    }

    #[test]
    fn test_missing_prototype_is_configuration_error() {
        let result = EvolutionBuilder::<BinaryString>::new().build_simple();
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_population_size_follows_options() {
        let options = EvolutionOptions::builder()
            .population_size(7)
            .build()
            .unwrap();
        let ga = EvolutionBuilder::new()
            .with_prototype(prototype())
            .with_options(options)
            .build_simple()
            .unwrap();
        assert_eq!(ga.population().len(), 7);
    }

    #[test]
    fn test_given_population_overrides_size() {
        let population = Population::with_size(&prototype(), 3);
        let ga = EvolutionBuilder::new()
            .with_population(population)
            .build_steady_state()
            .unwrap();
        assert_eq!(ga.population().len(), 3);
        assert_eq!(ga.base().options().get_population_size(), 3);
    }

    #[test]
    fn test_strategies_are_installed() {
        let mut ga = EvolutionBuilder::new()
            .with_prototype(prototype())
            .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
                Ok(g.chromosome().count_ones() as f32)
            }))
            .with_scaling(Box::new(NoScaling))
            .with_selector(Box::new(RankSelection::new()))
            .build_simple()
            .unwrap();
        assert!(ga.population().individual(0, SortBasis::Raw).evaluator().is_some());
        assert_eq!(ga.population().selector().basis(), SortBasis::Scaled);
        ga.initialize(5).unwrap();
        ga.step().unwrap();
        assert_eq!(ga.generation(), 1);
    }
}
