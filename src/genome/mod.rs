//! # Genomes
//!
//! A [`Genome`] couples a representation (its [`Chromosome`]) with everything the engine
//! needs to evolve it: the memoized objective score, the fitness assigned by scaling, an
//! evaluation counter, the objective function, and the strategies used to initialize,
//! mutate, compare and mate it.
//!
//! Representations shipped with the crate:
//!
//! - [`BinaryString`]: a 1D bit string, fixed or variable length.
//! - [`BinaryString2D`]: a row-major 2D bit string with per-axis resize bounds.
//! - [`GeneArray`]: a 1D array of arbitrary values.
//! - [`AlleleArray`]: a 1D array whose positions draw from allele sets.
//! - [`Bin2Dec`]: a bit string read through a phenotype map as floating values.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gaforge::genome::{BinaryString, Genome};
//! use gaforge::rng::RandomNumberGenerator;
//!
//! let mut genome = Genome::new(BinaryString::new(16))
//!     .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
//!         Ok(g.chromosome().count_ones() as f32)
//!     }));
//!
//! let mut rng = RandomNumberGenerator::from_seed(3);
//! genome.initialize(&mut rng);
//! let score = genome.score().unwrap();
//! assert_eq!(score, genome.chromosome().count_ones() as f32);
//! assert_eq!(genome.nevals(), 1);
//!
//! // memoized until the payload changes
//! genome.score().unwrap();
//! assert_eq!(genome.nevals(), 1);
//! ```

pub mod array;
pub mod bin2dec;
pub mod binary;
pub mod binary2d;
pub mod operators;

pub use array::{AlleleArray, AsGeneArray, GeneArray};
pub use bin2dec::Bin2Dec;
pub use binary::BinaryString;
pub use binary2d::BinaryString2D;

use std::any::Any;
use std::fmt::{self, Debug};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{report, GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// Objective function. Return [`GeneticError::Cancelled`] to abort the run.
pub type Evaluator<C> = Arc<dyn Fn(&Genome<C>) -> Result<f32> + Send + Sync>;
/// Fills a genome with initial content.
pub type Initializer<C> = Arc<dyn Fn(&mut Genome<C>, &mut RandomNumberGenerator) + Send + Sync>;
/// Mutates a genome with the given probability and returns the mutation count.
pub type Mutator<C> =
    Arc<dyn Fn(&mut Genome<C>, f32, &mut RandomNumberGenerator) -> usize + Send + Sync>;
/// Returns the dissimilarity of two genomes in `[0, 1]`, or `-1` if they are incomparable.
pub type Comparator<C> = Arc<dyn Fn(&Genome<C>, &Genome<C>) -> f32 + Send + Sync>;
/// Mates two parents into up to two children and returns how many children were produced.
pub type SexualCrossover<C> = Arc<
    dyn Fn(
            &Genome<C>,
            &Genome<C>,
            Option<&mut Genome<C>>,
            Option<&mut Genome<C>>,
            &mut RandomNumberGenerator,
        ) -> usize
        + Send
        + Sync,
>;
/// Derives one child from one parent and returns how many children were produced.
pub type AsexualCrossover<C> =
    Arc<dyn Fn(&Genome<C>, &mut Genome<C>, &mut RandomNumberGenerator) -> usize + Send + Sync>;

static NEXT_IDENTITY: AtomicU64 = AtomicU64::new(1);

fn fresh_identity() -> u64 {
    NEXT_IDENTITY.fetch_add(1, Ordering::Relaxed)
}

/// A genome representation.
pub trait Chromosome: Clone + Debug + Send + Sync + 'static {
    /// A chromosome of the same shape and configuration but default content.
    fn clone_attributes(&self) -> Self;

    /// The strategies a freshly constructed genome of this representation uses.
    fn default_operators() -> Operators<Self>;
}

/// Per-genome data made available to the objective function.
pub trait EvalData: Debug + Send + Sync {
    fn box_clone(&self) -> Box<dyn EvalData>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> EvalData for T
where
    T: Clone + Debug + Send + Sync + 'static,
{
    fn box_clone(&self) -> Box<dyn EvalData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The strategy slots of a genome.
pub struct Operators<C: Chromosome> {
    pub initializer: Option<Initializer<C>>,
    pub mutator: Option<Mutator<C>>,
    pub comparator: Option<Comparator<C>>,
    pub sexual: Option<SexualCrossover<C>>,
    pub asexual: Option<AsexualCrossover<C>>,
}

impl<C: Chromosome> Operators<C> {
    pub fn none() -> Self {
        Self {
            initializer: None,
            mutator: None,
            comparator: None,
            sexual: None,
            asexual: None,
        }
    }
}

impl<C: Chromosome> Clone for Operators<C> {
    fn clone(&self) -> Self {
        Self {
            initializer: self.initializer.clone(),
            mutator: self.mutator.clone(),
            comparator: self.comparator.clone(),
            sexual: self.sexual.clone(),
            asexual: self.asexual.clone(),
        }
    }
}

impl<C: Chromosome> Debug for Operators<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operators")
            .field("initializer", &self.initializer.is_some())
            .field("mutator", &self.mutator.is_some())
            .field("comparator", &self.comparator.is_some())
            .field("sexual", &self.sexual.is_some())
            .field("asexual", &self.asexual.is_some())
            .finish()
    }
}

/// Lower and upper length bounds of a variable-length representation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeBounds {
    pub min: usize,
    pub max: usize,
}

impl SizeBounds {
    pub fn fixed(len: usize) -> Self {
        Self { min: len, max: len }
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    /// Applies the resize rule to a requested length.
    ///
    /// A fixed representation follows the request and stays fixed at the new length; a
    /// variable one clamps the request into its bounds.
    pub(crate) fn settle(&mut self, requested: usize) -> usize {
        if self.is_fixed() {
            self.min = requested;
            self.max = requested;
            requested
        } else {
            requested.clamp(self.min, self.max)
        }
    }

    pub(crate) fn validate(lower: usize, upper: usize) -> Result<Self> {
        if upper < lower {
            return Err(GeneticError::Configuration(format!(
                "resize upper bound {} is below lower bound {}",
                upper, lower
            )));
        }
        Ok(Self {
            min: lower,
            max: upper,
        })
    }
}

/// A representation laid out as a single sequence of genes.
///
/// The generic crossovers, mutators and initializers in [`operators`] work on any type
/// implementing this trait.
pub trait LinearChromosome: Chromosome {
    type Gene: Clone + PartialEq + Debug + Send + Sync;

    fn genes(&self) -> &[Self::Gene];
    fn genes_mut(&mut self) -> &mut [Self::Gene];

    /// Direct access to the backing storage for resizing.
    fn storage_mut(&mut self) -> &mut Vec<Self::Gene>;

    fn bounds(&self) -> SizeBounds;
    fn bounds_mut(&mut self) -> &mut SizeBounds;

    /// A new value for `position`, used to fill positions created by growth.
    fn fresh_gene(&self, position: usize, rng: &mut RandomNumberGenerator) -> Self::Gene;

    fn len(&self) -> usize {
        self.genes().len()
    }

    fn is_empty(&self) -> bool {
        self.genes().is_empty()
    }

    fn is_fixed(&self) -> bool {
        self.bounds().is_fixed()
    }

    /// Resizes to `requested` positions under the resize rule and returns the new length.
    fn resize(&mut self, requested: usize, rng: &mut RandomNumberGenerator) -> usize {
        let len = self.bounds_mut().settle(requested);
        let old = self.len();
        if len < old {
            self.storage_mut().truncate(len);
        } else if len > old {
            let fresh: Vec<Self::Gene> = (old..len).map(|i| self.fresh_gene(i, rng)).collect();
            self.storage_mut().extend(fresh);
        }
        len
    }

    /// Resizes to a uniformly random length within the bounds.
    fn resize_any(&mut self, rng: &mut RandomNumberGenerator) -> usize {
        let bounds = self.bounds();
        let len = rng.random_int(bounds.min, bounds.max);
        self.resize(len, rng)
    }

    /// Sets new length bounds and pulls the current length into them.
    ///
    /// # Errors
    ///
    /// Returns a configuration error and keeps the old bounds when `upper < lower`.
    fn set_resize_behaviour(
        &mut self,
        lower: usize,
        upper: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        let bounds = SizeBounds::validate(lower, upper)?;
        *self.bounds_mut() = bounds;
        let len = self.len();
        if len > upper {
            self.resize(upper, rng);
        }
        if len < lower {
            self.resize(lower, rng);
        }
        Ok(())
    }

    /// Copies `len` genes of `src` starting at `from` into this chromosome starting at `to`,
    /// clipped to both sequences.
    fn copy_segment(&mut self, src: &Self, to: usize, from: usize, len: usize) {
        if len == 0 || from >= src.len() || to >= self.len() {
            return;
        }
        let len = len.min(src.len() - from).min(self.len() - to);
        self.genes_mut()[to..to + len].clone_from_slice(&src.genes()[from..from + len]);
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.genes_mut().swap(a, b);
    }
}

/// A candidate solution together with its cached evaluation state and strategies.
pub struct Genome<C: Chromosome> {
    chromosome: C,
    score: f32,
    fitness: f32,
    evaluated: bool,
    neval: usize,
    identity: u64,
    operators: Operators<C>,
    evaluator: Option<Evaluator<C>>,
    eval_data: Option<Box<dyn EvalData>>,
    user_data: Option<Arc<dyn Any + Send + Sync>>,
}

impl<C: Chromosome> Genome<C> {
    /// Wraps a chromosome with its representation's default strategies.
    pub fn new(chromosome: C) -> Self {
        Self {
            chromosome,
            score: 0.0,
            fitness: 0.0,
            evaluated: false,
            neval: 0,
            identity: fresh_identity(),
            operators: C::default_operators(),
            evaluator: None,
            eval_data: None,
            user_data: None,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator<C>) -> Self {
        self.set_evaluator(evaluator);
        self
    }

    pub fn with_initializer(mut self, initializer: Initializer<C>) -> Self {
        self.operators.initializer = Some(initializer);
        self
    }

    pub fn with_mutator(mut self, mutator: Mutator<C>) -> Self {
        self.operators.mutator = Some(mutator);
        self
    }

    pub fn with_comparator(mut self, comparator: Comparator<C>) -> Self {
        self.operators.comparator = Some(comparator);
        self
    }

    pub fn with_crossover(mut self, crossover: SexualCrossover<C>) -> Self {
        self.operators.sexual = Some(crossover);
        self
    }

    pub fn with_asexual_crossover(mut self, crossover: AsexualCrossover<C>) -> Self {
        self.operators.asexual = Some(crossover);
        self
    }

    pub fn with_user_data(mut self, data: Arc<dyn Any + Send + Sync>) -> Self {
        self.user_data = Some(data);
        self
    }

    pub fn with_eval_data<T>(mut self, data: T) -> Self
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        self.eval_data = Some(Box::new(data));
        self
    }

    pub fn chromosome(&self) -> &C {
        &self.chromosome
    }

    /// Mutable access to the payload. The genome is marked as needing evaluation.
    pub fn chromosome_mut(&mut self) -> &mut C {
        self.touch();
        &mut self.chromosome
    }

    /// Runs `change` on the payload and marks the genome as needing evaluation only when
    /// it reports a non-zero number of changes.
    pub fn modify<F>(&mut self, change: F) -> usize
    where
        F: FnOnce(&mut C) -> usize,
    {
        let changed = change(&mut self.chromosome);
        if changed > 0 {
            self.touch();
        }
        changed
    }

    fn touch(&mut self) {
        self.evaluated = false;
        self.identity = fresh_identity();
    }

    /// Token shared by genomes holding the same unmodified payload. Copies inherit it, any
    /// change to the payload replaces it.
    pub fn identity(&self) -> u64 {
        self.identity
    }

    /// The objective score, evaluating first if the cached value is stale.
    pub fn score(&mut self) -> Result<f32> {
        if !self.evaluated {
            self.evaluate(false)?;
        }
        Ok(self.score)
    }

    /// The cached score, whether or not it is current.
    pub fn cached_score(&self) -> f32 {
        self.score
    }

    /// Sets the score directly and marks the genome as evaluated.
    pub fn set_score(&mut self, score: f32) {
        self.score = score;
        self.evaluated = true;
    }

    /// Runs the objective function if the score is stale or `force` is set.
    ///
    /// Without an objective function the score is left as it is and the genome counts as
    /// evaluated.
    pub fn evaluate(&mut self, force: bool) -> Result<f32> {
        if !self.evaluated || force {
            if let Some(evaluator) = self.evaluator.clone() {
                let score = evaluator(self)?;
                self.neval += 1;
                self.score = score;
            }
            self.evaluated = true;
        }
        Ok(self.score)
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn nevals(&self) -> usize {
        self.neval
    }

    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Resets the evaluation state and runs the initializer.
    pub fn initialize(&mut self, rng: &mut RandomNumberGenerator) {
        self.evaluated = false;
        self.neval = 0;
        self.identity = fresh_identity();
        if let Some(initializer) = self.operators.initializer.clone() {
            initializer(self, rng);
        }
    }

    /// Runs the mutator and returns the number of mutations it reports.
    pub fn mutate(&mut self, probability: f32, rng: &mut RandomNumberGenerator) -> usize {
        match self.operators.mutator.clone() {
            Some(mutator) => mutator(self, probability, rng),
            None => 0,
        }
    }

    /// Dissimilarity to `other` in `[0, 1]`, or `-1` when no comparator is set or the
    /// genomes cannot be compared.
    pub fn compare(&self, other: &Self) -> f32 {
        match &self.operators.comparator {
            Some(comparator) => comparator(self, other),
            None => {
                report(&GeneticError::OperationUndefined(
                    "genome has no comparator".to_string(),
                ));
                -1.0
            }
        }
    }

    /// Becomes a copy of `other`: payload, score, fitness, evaluation state, strategies and
    /// evaluation data. The evaluation counter restarts at zero.
    pub fn copy_from(&mut self, other: &Self) {
        self.chromosome.clone_from(&other.chromosome);
        self.score = other.score;
        self.fitness = other.fitness;
        self.evaluated = other.evaluated;
        self.neval = 0;
        self.identity = other.identity;
        self.operators = other.operators.clone();
        self.evaluator = other.evaluator.clone();
        self.eval_data = other.eval_data.as_ref().map(|d| (**d).box_clone());
        self.user_data = other.user_data.clone();
    }

    /// A genome of the same shape and configuration with default content.
    pub fn clone_attributes(&self) -> Self {
        Self {
            chromosome: self.chromosome.clone_attributes(),
            score: 0.0,
            fitness: 0.0,
            evaluated: false,
            neval: 0,
            identity: fresh_identity(),
            operators: self.operators.clone(),
            evaluator: self.evaluator.clone(),
            eval_data: self.eval_data.as_ref().map(|d| (**d).box_clone()),
            user_data: self.user_data.clone(),
        }
    }

    pub fn operators(&self) -> &Operators<C> {
        &self.operators
    }

    pub fn set_operators(&mut self, operators: Operators<C>) {
        self.operators = operators;
    }

    pub fn evaluator(&self) -> Option<&Evaluator<C>> {
        self.evaluator.as_ref()
    }

    /// Installs a new objective function; the cached score becomes stale.
    pub fn set_evaluator(&mut self, evaluator: Evaluator<C>) {
        self.evaluator = Some(evaluator);
        self.evaluated = false;
    }

    pub fn set_initializer(&mut self, initializer: Initializer<C>) {
        self.operators.initializer = Some(initializer);
    }

    pub fn set_mutator(&mut self, mutator: Mutator<C>) {
        self.operators.mutator = Some(mutator);
    }

    pub fn set_comparator(&mut self, comparator: Comparator<C>) {
        self.operators.comparator = Some(comparator);
    }

    pub fn set_crossover(&mut self, crossover: SexualCrossover<C>) {
        self.operators.sexual = Some(crossover);
    }

    pub fn set_asexual_crossover(&mut self, crossover: AsexualCrossover<C>) {
        self.operators.asexual = Some(crossover);
    }

    pub fn sexual(&self) -> Option<&SexualCrossover<C>> {
        self.operators.sexual.as_ref()
    }

    pub fn asexual(&self) -> Option<&AsexualCrossover<C>> {
        self.operators.asexual.as_ref()
    }

    pub fn user_data(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.user_data.as_ref()
    }

    pub fn set_user_data(&mut self, data: Arc<dyn Any + Send + Sync>) {
        self.user_data = Some(data);
    }

    /// Typed access to the evaluation data.
    pub fn eval_data<T: 'static>(&self) -> Option<&T> {
        self.eval_data.as_deref()?.as_any().downcast_ref::<T>()
    }

    pub fn eval_data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.eval_data.as_mut()?.as_any_mut().downcast_mut::<T>()
    }

    pub fn set_eval_data<T>(&mut self, data: T)
    where
        T: Clone + Debug + Send + Sync + 'static,
    {
        self.eval_data = Some(Box::new(data));
    }
}

impl<C: Chromosome> Clone for Genome<C> {
    fn clone(&self) -> Self {
        Self {
            chromosome: self.chromosome.clone(),
            score: self.score,
            fitness: self.fitness,
            evaluated: self.evaluated,
            neval: self.neval,
            identity: self.identity,
            operators: self.operators.clone(),
            evaluator: self.evaluator.clone(),
            eval_data: self.eval_data.as_ref().map(|d| (**d).box_clone()),
            user_data: self.user_data.clone(),
        }
    }
}

impl<C: Chromosome> Debug for Genome<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Genome")
            .field("chromosome", &self.chromosome)
            .field("score", &self.score)
            .field("fitness", &self.fitness)
            .field("evaluated", &self.evaluated)
            .field("neval", &self.neval)
            .field("operators", &self.operators)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_genome() -> Genome<BinaryString> {
        Genome::new(BinaryString::new(8)).with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
            Ok(g.chromosome().count_ones() as f32)
        }))
    }

    #[test]
    fn test_score_is_memoized() {
        let mut genome = counting_genome();
        assert_eq!(genome.score().unwrap(), 0.0);
        genome.score().unwrap();
        assert_eq!(genome.nevals(), 1);
        genome.evaluate(true).unwrap();
        assert_eq!(genome.nevals(), 2);
    }

    #[test]
    fn test_payload_change_invalidates_score() {
        let mut genome = counting_genome();
        genome.score().unwrap();
        genome.chromosome_mut().set_bit(0, true);
        assert!(!genome.is_evaluated());
        assert_eq!(genome.score().unwrap(), 1.0);
    }

    #[test]
    fn test_modify_without_changes_keeps_score() {
        let mut genome = counting_genome();
        genome.score().unwrap();
        let identity = genome.identity();
        assert_eq!(genome.modify(|_| 0), 0);
        assert!(genome.is_evaluated());
        assert_eq!(genome.identity(), identity);
    }

    #[test]
    fn test_no_evaluator_marks_evaluated() {
        let mut genome = Genome::new(BinaryString::new(4));
        genome.set_score(3.0);
        genome.chromosome_mut();
        assert_eq!(genome.evaluate(false).unwrap(), 3.0);
        assert!(genome.is_evaluated());
        assert_eq!(genome.nevals(), 0);
    }

    #[test]
    fn test_cancellation_propagates() {
        let mut genome = Genome::new(BinaryString::new(4)).with_evaluator(Arc::new(
            |_: &Genome<BinaryString>| Err(GeneticError::Cancelled("stop".into())),
        ));
        assert!(matches!(genome.score(), Err(GeneticError::Cancelled(_))));
        assert!(!genome.is_evaluated());
    }

    #[test]
    fn test_copy_from_resets_counter_and_keeps_identity() {
        let mut source = counting_genome();
        source.chromosome_mut().set_bit(2, true);
        source.score().unwrap();
        source.evaluate(true).unwrap();

        let mut target = Genome::new(BinaryString::new(8));
        target.copy_from(&source);
        assert_eq!(target.nevals(), 0);
        assert!(target.is_evaluated());
        assert_eq!(target.cached_score(), 1.0);
        assert_eq!(target.identity(), source.identity());
        assert!(target.evaluator().is_some());
    }

    #[test]
    fn test_clone_attributes_keeps_shape_only() {
        let mut rng = RandomNumberGenerator::from_seed(6);
        let mut genome = counting_genome().with_eval_data(41u32);
        genome.initialize(&mut rng);
        genome.score().unwrap();
        let blank = genome.clone_attributes();
        assert_eq!(blank.chromosome().len(), 8);
        assert_eq!(blank.chromosome().count_ones(), 0);
        assert!(!blank.is_evaluated());
        assert_ne!(blank.identity(), genome.identity());
        assert_eq!(blank.eval_data::<u32>(), Some(&41));
    }

    #[test]
    fn test_initialize_resets_counters() {
        let mut rng = RandomNumberGenerator::from_seed(2);
        let mut genome = counting_genome();
        genome.score().unwrap();
        genome.initialize(&mut rng);
        assert_eq!(genome.nevals(), 0);
        assert!(!genome.is_evaluated());
    }

    #[test]
    fn test_compare_without_comparator() {
        let mut genome = Genome::new(BinaryString::new(2));
        genome.set_operators(Operators::none());
        let other = genome.clone();
        assert_eq!(genome.compare(&other), -1.0);
    }

    #[test]
    fn test_size_bounds_settle() {
        let mut fixed = SizeBounds::fixed(4);
        assert_eq!(fixed.settle(7), 7);
        assert_eq!(fixed, SizeBounds::fixed(7));

        let mut ranged = SizeBounds { min: 2, max: 5 };
        assert_eq!(ranged.settle(9), 5);
        assert_eq!(ranged.settle(0), 2);
        assert!(SizeBounds::validate(5, 2).is_err());
    }
}
