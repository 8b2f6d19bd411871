//! # Terminators
//!
//! A terminator decides, after each generation, whether a run is over. It sees the whole
//! driver state through [`GeneticAlgorithm`], so custom terminators can look at anything the
//! built-in ones do.
//!
//! ```rust
//! use std::sync::Arc;
//! use gaforge::evolution::{terminator::Terminator, GeneticAlgorithm};
//! use gaforge::genome::BinaryString;
//!
//! // stop once a perfect 16-bit string has been seen
//! let perfect: Terminator<BinaryString> = Arc::new(|ga: &GeneticAlgorithm<BinaryString>| {
//!     ga.statistics().max_ever() >= 16.0 || ga.generation() >= 1000
//! });
//! ```

use std::sync::Arc;

use super::algorithm::GeneticAlgorithm;
use super::options::Objective;
use crate::genome::Chromosome;

pub type Terminator<C> = Arc<dyn Fn(&GeneticAlgorithm<C>) -> bool + Send + Sync>;

/// Done once the configured number of generations has run. The default.
pub fn upon_generation<C: Chromosome>() -> Terminator<C> {
    Arc::new(|ga: &GeneticAlgorithm<C>| ga.generation() >= ga.options().get_num_generations())
}

/// Done once the best score stops moving: the ratio of the best score
/// `generations_to_convergence` generations ago to the current one reaches
/// `convergence_percentage`. When minimizing the ratio is inverted.
pub fn upon_convergence<C: Chromosome>() -> Terminator<C> {
    Arc::new(|ga: &GeneticAlgorithm<C>| {
        let convergence = ga.convergence();
        let target = ga.options().get_convergence_percentage();
        match ga.options().get_objective() {
            Objective::Maximize => convergence >= target,
            Objective::Minimize => convergence != 0.0 && 1.0 / convergence >= target,
        }
    })
}

/// Done once the population has collapsed onto its best: the ratio of the mean score to the
/// best score reaches `convergence_percentage` (maximizing) or drops to it (minimizing).
/// Never done while the maximum score is `0`.
pub fn upon_population_convergence<C: Chromosome>() -> Terminator<C> {
    Arc::new(|ga: &GeneticAlgorithm<C>| {
        let current = ga.statistics().current();
        if current.max == 0.0 {
            return false;
        }
        let ratio = current.mean / current.max;
        let target = ga.options().get_convergence_percentage();
        match ga.options().get_objective() {
            Objective::Maximize => ratio >= target,
            Objective::Minimize => ratio <= target,
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::evolution::{Evolution, EvolutionOptions, SimpleGa};
    use crate::genome::{BinaryString, Genome};
    use crate::population::Population;

    fn uniform_ga(objective: Objective) -> SimpleGa<BinaryString> {
        let prototype = Genome::new(BinaryString::new(4))
            .with_evaluator(Arc::new(|_: &Genome<BinaryString>| Ok(3.0)));
        let options = EvolutionOptions::builder()
            .num_generations(2)
            .objective(objective)
            .build()
            .unwrap();
        SimpleGa::new(Population::with_size(&prototype, 6), options).unwrap()
    }

    #[test]
    fn test_generation_limit() {
        let mut ga = uniform_ga(Objective::Maximize);
        let done = upon_generation::<BinaryString>();
        ga.initialize(1).unwrap();
        assert!(!done(ga.base()));
        ga.step().unwrap();
        ga.step().unwrap();
        assert!(done(ga.base()));
    }

    #[test]
    fn test_population_convergence_direction() {
        // every genome scores the same, so mean / max is exactly 1
        let mut ga = uniform_ga(Objective::Maximize);
        ga.initialize(2).unwrap();
        assert!(upon_population_convergence::<BinaryString>()(ga.base()));

        let mut ga = uniform_ga(Objective::Minimize);
        ga.initialize(2).unwrap();
        assert!(!upon_population_convergence::<BinaryString>()(ga.base()));
    }
}
