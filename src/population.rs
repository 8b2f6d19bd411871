//! # Population
//!
//! A [`Population`] owns its genomes and keeps two orderings of them: the raw view,
//! sorted by objective score, and the scaled view, sorted by fitness. Both views are
//! permutations of the same storage. Everything derived from the genomes (sortedness,
//! score and fitness aggregates, the diversity matrix, the selector's wheel) is computed
//! on demand and cached until something invalidates it.
//!
//! Position `0` of a sorted view is the best individual and position `len() - 1` the
//! worst, under the population's [`SortOrder`].
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gaforge::genome::{BinaryString, Genome};
//! use gaforge::population::Population;
//! use gaforge::rng::RandomNumberGenerator;
//! use gaforge::selection::SortBasis;
//!
//! let prototype = Genome::new(BinaryString::new(12))
//!     .with_evaluator(Arc::new(|g: &Genome<BinaryString>| {
//!         Ok(g.chromosome().count_ones() as f32)
//!     }));
//!
//! let mut rng = RandomNumberGenerator::from_seed(17);
//! let mut population = Population::with_size(&prototype, 10);
//! population.initialize(&mut rng);
//! population.evaluate(false).unwrap();
//!
//! let stats = population.raw_stats().unwrap();
//! let best = population.best(0, SortBasis::Raw).unwrap().cached_score();
//! assert_eq!(best, stats.max);
//! ```

use std::fmt;
use std::mem;
use std::sync::Arc;

use crate::error::{absorb, report, GeneticError, Result};
use crate::genome::{Chromosome, Genome};
use crate::rng::RandomNumberGenerator;
use crate::scaling::{LinearScaling, ScalingScheme};
use crate::selection::{
    RouletteWheelSelection, SelectionDistribution, SelectionScheme, SortBasis, SortOrder,
};

/// Evaluates a whole population. The default evaluates each stale genome in turn.
pub type PopulationEvaluator<C> = Arc<dyn Fn(&mut Population<C>) -> Result<()> + Send + Sync>;
/// Initializes a whole population. The default initializes each genome in turn.
pub type PopulationInitializer<C> =
    Arc<dyn Fn(&mut Population<C>, &mut RandomNumberGenerator) + Send + Sync>;

/// Sum, mean, sample variance, standard deviation and extremes of a set of values.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aggregates {
    pub sum: f32,
    pub ave: f32,
    pub var: f32,
    pub dev: f32,
    pub max: f32,
    pub min: f32,
}

impl Aggregates {
    /// Aggregates of `values`. The variance divides by `n - 1` and is zero for fewer than
    /// two values; every field is zero for no values.
    pub fn of(values: &[f32]) -> Self {
        let Some((&first, rest)) = values.split_first() else {
            return Self::default();
        };
        let (mut sum, mut max, mut min) = (first, first, first);
        for &v in rest {
            sum += v;
            max = max.max(v);
            min = min.min(v);
        }
        let n = values.len();
        let ave = sum / n as f32;
        let var = if n > 1 {
            values.iter().map(|&v| (v - ave) * (v - ave)).sum::<f32>() / (n - 1) as f32
        } else {
            0.0
        };
        Self {
            sum,
            ave,
            var,
            dev: var.sqrt(),
            max,
            min,
        }
    }
}

/// The individual a [`remove`](Population::remove) or [`replace`](Population::replace)
/// acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A position in the chosen view.
    Index(usize),
    Best,
    Worst,
    Random,
}

/// An ordered collection of genomes with raw and scaled views.
pub struct Population<C: Chromosome> {
    storage: Vec<Genome<C>>,
    raw: Vec<usize>,
    scaled: Vec<usize>,
    order: SortOrder,

    rsorted: bool,
    ssorted: bool,
    is_scaled: bool,
    statted: bool,
    divved: bool,
    select_ready: bool,
    evaluated: bool,

    neval: usize,
    raw_stats: Aggregates,
    fitness_stats: Aggregates,
    ind_div: Vec<f32>,
    pop_div: f32,

    scaling: Box<dyn ScalingScheme>,
    selector: Box<dyn SelectionScheme>,
    evaluator: Option<PopulationEvaluator<C>>,
    initializer: Option<PopulationInitializer<C>>,
}

impl<C: Chromosome> Population<C> {
    /// An empty population with linear scaling and roulette wheel selection.
    pub fn new() -> Self {
        Self::from_genomes(Vec::new())
    }

    /// A population holding `genomes`, in order.
    pub fn from_genomes(genomes: Vec<Genome<C>>) -> Self {
        let n = genomes.len();
        Self {
            storage: genomes,
            raw: (0..n).collect(),
            scaled: (0..n).collect(),
            order: SortOrder::default(),
            rsorted: false,
            ssorted: false,
            is_scaled: false,
            statted: false,
            divved: false,
            select_ready: false,
            evaluated: false,
            neval: 0,
            raw_stats: Aggregates::default(),
            fitness_stats: Aggregates::default(),
            ind_div: Vec::new(),
            pop_div: 0.0,
            scaling: Box::new(LinearScaling::default()),
            selector: Box::new(RouletteWheelSelection::new()),
            evaluator: None,
            initializer: None,
        }
    }

    /// `size` genomes shaped like `prototype`, with default content.
    pub fn with_size(prototype: &Genome<C>, size: usize) -> Self {
        Self::from_genomes((0..size).map(|_| prototype.clone_attributes()).collect())
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    fn view(&self, basis: SortBasis) -> &[usize] {
        match basis {
            SortBasis::Raw => &self.raw,
            SortBasis::Scaled => &self.scaled,
        }
    }

    /// The individual at position `i` of the chosen view, without sorting.
    ///
    /// # Panics
    ///
    /// Panics if `i >= len()`.
    pub fn individual(&self, i: usize, basis: SortBasis) -> &Genome<C> {
        &self.storage[self.view(basis)[i]]
    }

    pub fn get(&self, i: usize, basis: SortBasis) -> Option<&Genome<C>> {
        self.view(basis).get(i).map(|&id| &self.storage[id])
    }

    /// Mutable access to the individual at position `i` of the chosen view. Every cached
    /// property of the population is invalidated.
    pub fn individual_mut(&mut self, i: usize, basis: SortBasis) -> Option<&mut Genome<C>> {
        let id = *self.view(basis).get(i)?;
        self.touch();
        Some(&mut self.storage[id])
    }

    /// Mutable access to two distinct individuals at once. `None` when either position is
    /// out of range or both name the same individual. Invalidates like
    /// [`individual_mut`](Population::individual_mut).
    pub fn pair_mut(
        &mut self,
        i: usize,
        j: usize,
        basis: SortBasis,
    ) -> Option<(&mut Genome<C>, &mut Genome<C>)> {
        let view = self.view(basis);
        let (a, b) = (*view.get(i)?, *view.get(j)?);
        if a == b {
            return None;
        }
        self.touch();
        if a < b {
            let (low, high) = self.storage.split_at_mut(b);
            Some((&mut low[a], &mut high[0]))
        } else {
            let (low, high) = self.storage.split_at_mut(a);
            Some((&mut high[0], &mut low[b]))
        }
    }

    /// Genomes in raw-view order.
    pub fn iter(&self) -> impl Iterator<Item = &Genome<C>> + '_ {
        self.raw.iter().map(move |&id| &self.storage[id])
    }

    /// Marks every cached property as stale.
    pub fn touch(&mut self) {
        self.rsorted = false;
        self.ssorted = false;
        self.select_ready = false;
        self.divved = false;
        self.statted = false;
        self.is_scaled = false;
        self.evaluated = false;
    }

    pub fn order(&self) -> SortOrder {
        self.order
    }

    pub fn set_order(&mut self, order: SortOrder) {
        if order != self.order {
            self.order = order;
            self.rsorted = false;
            self.ssorted = false;
            self.select_ready = false;
        }
    }

    /// Number of population evaluations since the last initialization.
    pub fn nevals(&self) -> usize {
        self.neval
    }

    pub fn is_evaluated(&self) -> bool {
        self.evaluated
    }

    pub fn scaling(&self) -> &dyn ScalingScheme {
        self.scaling.as_ref()
    }

    pub fn set_scaling(&mut self, scaling: Box<dyn ScalingScheme>) {
        self.scaling = scaling;
        self.is_scaled = false;
        self.select_ready = false;
    }

    pub fn selector(&self) -> &dyn SelectionScheme {
        self.selector.as_ref()
    }

    pub fn set_selector(&mut self, selector: Box<dyn SelectionScheme>) {
        self.selector = selector;
        self.select_ready = false;
    }

    /// Installs a population-level evaluator; the population needs re-evaluation.
    pub fn set_evaluator(&mut self, evaluator: PopulationEvaluator<C>) {
        self.evaluator = Some(evaluator);
        self.evaluated = false;
    }

    pub fn set_initializer(&mut self, initializer: PopulationInitializer<C>) {
        self.initializer = Some(initializer);
    }

    /// Runs the initializer and marks everything stale.
    pub fn initialize(&mut self, rng: &mut RandomNumberGenerator) {
        self.neval = 0;
        match self.initializer.clone() {
            Some(initializer) => initializer(self, rng),
            None => self.storage.iter_mut().for_each(|g| g.initialize(rng)),
        }
        self.touch();
    }

    /// Evaluates the population if it is stale or `force` is set.
    ///
    /// # Errors
    ///
    /// Propagates the evaluator's error, which is how cancellation leaves the population.
    pub fn evaluate(&mut self, force: bool) -> Result<()> {
        if !self.evaluated || force {
            match self.evaluator.clone() {
                Some(evaluator) => evaluator(self)?,
                None => {
                    for genome in &mut self.storage {
                        genome.evaluate(false)?;
                    }
                }
            }
            self.neval += 1;
            self.is_scaled = false;
            self.statted = false;
            self.divved = false;
            self.rsorted = false;
            self.ssorted = false;
            self.select_ready = false;
        }
        self.evaluated = true;
        Ok(())
    }

    /// Sorts the chosen view best first, if it is not already sorted or `force` is set.
    ///
    /// Sorting the raw view evaluates any stale genome.
    pub fn sort(&mut self, force: bool, basis: SortBasis) -> Result<()> {
        let sorted = match basis {
            SortBasis::Raw => self.rsorted,
            SortBasis::Scaled => self.ssorted,
        };
        if !sorted || force {
            let keys = match basis {
                SortBasis::Raw => self
                    .storage
                    .iter_mut()
                    .map(|g| g.score())
                    .collect::<Result<Vec<f32>>>()?,
                SortBasis::Scaled => self.storage.iter().map(|g| g.fitness()).collect(),
            };
            let perm = match basis {
                SortBasis::Raw => &mut self.raw,
                SortBasis::Scaled => &mut self.scaled,
            };
            let last = perm.len() as isize - 1;
            quicksort(perm, &keys, self.order, 0, last);
            self.select_ready = false;
            tracing::trace!(?basis, size = keys.len(), "sorted population view");
        }
        match basis {
            SortBasis::Raw => self.rsorted = true,
            SortBasis::Scaled => self.ssorted = true,
        }
        Ok(())
    }

    /// Aggregates of the objective scores.
    pub fn raw_stats(&mut self) -> Result<Aggregates> {
        if !self.statted {
            let mut scores = Vec::with_capacity(self.raw.len());
            for &id in &self.raw {
                scores.push(self.storage[id].score()?);
            }
            self.raw_stats = Aggregates::of(&scores);
            self.statted = true;
        }
        Ok(self.raw_stats)
    }

    /// Aggregates of the fitness values, scaling first if needed.
    pub fn fitness_stats(&mut self) -> Result<Aggregates> {
        self.scale(false)?;
        Ok(self.fitness_stats)
    }

    /// Assigns fitness to every genome with the scaling scheme, if the fitness values are
    /// stale or `force` is set.
    pub fn scale(&mut self, force: bool) -> Result<()> {
        if self.is_scaled && !force {
            return Ok(());
        }
        if self.is_empty() {
            self.fitness_stats = Aggregates::default();
        } else {
            let stats = self.raw_stats()?;
            let mut scores = Vec::with_capacity(self.raw.len());
            for &id in &self.raw {
                scores.push(self.storage[id].score()?);
            }
            let fitness = self.scaling.evaluate(&scores, &stats);
            for (&id, f) in self.raw.iter().zip(fitness) {
                self.storage[id].set_fitness(f);
            }
            let fitness: Vec<f32> = self
                .scaled
                .iter()
                .map(|&id| self.storage[id].fitness())
                .collect();
            self.fitness_stats = Aggregates::of(&fitness);
            tracing::debug!(
                fit_ave = self.fitness_stats.ave,
                fit_max = self.fitness_stats.max,
                "scaled population"
            );
        }
        self.is_scaled = true;
        self.ssorted = false;
        Ok(())
    }

    fn compute_diversity(&mut self) {
        if self.divved {
            return;
        }
        let n = self.len();
        if n > 1 {
            let mut matrix = vec![0.0; n * n];
            let mut total = 0.0;
            for i in 0..n {
                for j in i + 1..n {
                    let (a, b) = (self.raw[i], self.raw[j]);
                    let d = self.storage[a].compare(&self.storage[b]);
                    matrix[a * n + b] = d;
                    matrix[b * n + a] = d;
                    total += d;
                }
            }
            self.ind_div = matrix;
            self.pop_div = total / (n * (n - 1) / 2) as f32;
        } else {
            self.ind_div = vec![0.0; n];
            self.pop_div = 0.0;
        }
        self.divved = true;
    }

    /// Mean pairwise dissimilarity over all distinct pairs; `0` for fewer than two
    /// individuals.
    pub fn diversity(&mut self) -> f32 {
        self.compute_diversity();
        self.pop_div
    }

    /// Dissimilarity between positions `i` and `j` of the raw view.
    pub fn diversity_between(&mut self, i: usize, j: usize) -> Option<f32> {
        let (a, b) = (*self.raw.get(i)?, *self.raw.get(j)?);
        self.compute_diversity();
        if a == b {
            return Some(0.0);
        }
        self.ind_div.get(a * self.len() + b).copied()
    }

    /// The `i`-th best individual of the chosen view, sorting (and scaling) on demand.
    pub fn best(&mut self, i: usize, basis: SortBasis) -> Result<&Genome<C>> {
        let n = self.len();
        if n == 0 {
            return Err(GeneticError::EmptyPopulation);
        }
        if basis == SortBasis::Scaled {
            self.scale(false)?;
        }
        self.sort(false, basis)?;
        self.get(i, basis).ok_or_else(|| {
            GeneticError::OutOfBounds(format!("rank {} in a population of {}", i, n))
        })
    }

    /// The `i`-th worst individual of the chosen view, sorting (and scaling) on demand.
    pub fn worst(&mut self, i: usize, basis: SortBasis) -> Result<&Genome<C>> {
        let n = self.len();
        let rank = n.checked_sub(i + 1).ok_or_else(|| {
            GeneticError::OutOfBounds(format!("rank {} from the bottom of {}", i, n))
        })?;
        self.best(rank, basis)
    }

    /// Appends a genome. Nothing is evaluated or sorted.
    pub fn add(&mut self, genome: Genome<C>) {
        let id = self.storage.len();
        self.storage.push(genome);
        self.raw.push(id);
        self.scaled.push(id);
        self.touch();
    }

    fn resolve(
        &mut self,
        slot: Slot,
        basis: SortBasis,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Option<usize>> {
        let n = self.len();
        if n == 0 {
            return Ok(None);
        }
        Ok(match slot {
            Slot::Best => {
                self.sort(false, basis)?;
                Some(0)
            }
            Slot::Worst => {
                self.sort(false, basis)?;
                Some(n - 1)
            }
            Slot::Random => Some(rng.random_int(0, n - 1)),
            Slot::Index(i) if i < n => Some(i),
            Slot::Index(_) => None,
        })
    }

    /// Removes an individual and returns it, or `None` when the slot names nobody.
    ///
    /// The acted-on view keeps its order; the other view becomes a copy of it.
    pub fn remove(
        &mut self,
        slot: Slot,
        basis: SortBasis,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Option<Genome<C>>> {
        let Some(i) = self.resolve(slot, basis, rng)? else {
            return Ok(None);
        };
        let last = self.len() - 1;
        let id = match basis {
            SortBasis::Raw => {
                let id = self.raw.remove(i);
                self.scaled.clone_from(&self.raw);
                self.ssorted = false;
                id
            }
            SortBasis::Scaled => {
                let id = self.scaled.remove(i);
                self.raw.clone_from(&self.scaled);
                self.rsorted = false;
                id
            }
        };
        let removed = self.storage.swap_remove(id);
        if id != last {
            for p in self.raw.iter_mut().chain(self.scaled.iter_mut()) {
                if *p == last {
                    *p = id;
                }
            }
        }
        self.evaluated = false;
        self.is_scaled = false;
        self.statted = false;
        self.divved = false;
        self.select_ready = false;
        Ok(Some(removed))
    }

    /// Puts `replacement` where the slot points and returns the genome it displaced, or
    /// `None` (dropping `replacement`) when the slot names nobody.
    pub fn replace(
        &mut self,
        replacement: Genome<C>,
        slot: Slot,
        basis: SortBasis,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Option<Genome<C>>> {
        let Some(i) = self.resolve(slot, basis, rng)? else {
            report(&GeneticError::OutOfBounds(format!(
                "no individual at {:?} in a population of {}",
                slot,
                self.len()
            )));
            return Ok(None);
        };
        let id = self.view(basis)[i];
        let displaced = mem::replace(&mut self.storage[id], replacement);
        match basis {
            SortBasis::Raw => self.scaled.clone_from(&self.raw),
            SortBasis::Scaled => self.raw.clone_from(&self.scaled),
        }
        self.touch();
        Ok(Some(displaced))
    }

    /// Grows or shrinks the population to `size` and returns the new size.
    ///
    /// New individuals are copies of randomly chosen existing ones. Shrinking drops the
    /// tail of the raw view, so a sorted population keeps its best. If the population was
    /// evaluated it is evaluated again.
    ///
    /// # Errors
    ///
    /// Growing an empty population is a configuration error.
    pub fn set_size(&mut self, size: usize, rng: &mut RandomNumberGenerator) -> Result<usize> {
        let current = self.len();
        if size == current {
            return Ok(size);
        }
        if size > current {
            if current == 0 {
                return Err(GeneticError::Configuration(
                    "cannot grow an empty population".to_string(),
                ));
            }
            for id in current..size {
                let source = &self.storage[self.raw[rng.random_int(0, current - 1)]];
                let mut copy = source.clone_attributes();
                copy.copy_from(source);
                self.storage.push(copy);
                self.raw.push(id);
            }
            self.rsorted = false;
        } else {
            let mut slots: Vec<Option<Genome<C>>> =
                mem::take(&mut self.storage).into_iter().map(Some).collect();
            self.storage = self.raw[..size]
                .iter()
                .filter_map(|&id| slots[id].take())
                .collect();
            self.raw = (0..size).collect();
        }
        self.scaled.clone_from(&self.raw);
        self.ssorted = false;
        self.is_scaled = false;
        self.statted = false;
        self.divved = false;
        self.select_ready = false;
        if self.evaluated {
            self.evaluate(true)?;
        }
        Ok(size)
    }

    fn prepare_selection(&mut self) -> Result<()> {
        let basis = self.selector.basis();
        let stats = match basis {
            SortBasis::Raw => self.raw_stats()?,
            SortBasis::Scaled => self.fitness_stats()?,
        };
        self.sort(false, basis)?;
        let values: Vec<f32> = self
            .view(basis)
            .iter()
            .map(|&id| match basis {
                SortBasis::Raw => self.storage[id].cached_score(),
                SortBasis::Scaled => self.storage[id].fitness(),
            })
            .collect();
        let distribution = SelectionDistribution {
            order: self.order,
            values: &values,
            max: stats.max,
            min: stats.min,
        };
        absorb(self.selector.update(&distribution))?;
        self.select_ready = true;
        Ok(())
    }

    /// Picks an individual with the selection scheme and returns its position in the
    /// scheme's view (see [`SelectionScheme::basis`]).
    pub fn select_position(&mut self, rng: &mut RandomNumberGenerator) -> Result<usize> {
        if self.is_empty() {
            return Err(GeneticError::EmptyPopulation);
        }
        if !self.select_ready {
            self.prepare_selection()?;
        }
        Ok(self.selector.select(rng).min(self.len() - 1))
    }

    /// Picks an individual with the selection scheme.
    pub fn select(&mut self, rng: &mut RandomNumberGenerator) -> Result<&Genome<C>> {
        let position = self.select_position(rng)?;
        Ok(self.individual(position, self.selector.basis()))
    }
}

/// Quicksort of `perm[l..=r]` by `keys[perm[_]]`, best first. The pivot is the last
/// element of the range.
fn quicksort(perm: &mut [usize], keys: &[f32], order: SortOrder, l: isize, r: isize) {
    if r <= l {
        return;
    }
    let key = |perm: &[usize], k: isize| keys[perm[k as usize]];
    let v = key(perm, r);
    let mut i = l - 1;
    let mut j = r;
    loop {
        loop {
            i += 1;
            if !(i < r && order.is_better(key(perm, i), v)) {
                break;
            }
        }
        loop {
            j -= 1;
            if !(j > 0 && order.is_better(v, key(perm, j))) {
                break;
            }
        }
        if i >= j {
            break;
        }
        perm.swap(i as usize, j as usize);
    }
    perm.swap(i as usize, r as usize);
    quicksort(perm, keys, order, l, i - 1);
    quicksort(perm, keys, order, i + 1, r);
}

impl<C: Chromosome> Default for Population<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Chromosome> Clone for Population<C> {
    /// A full copy whose evaluation counter restarts at zero.
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            raw: self.raw.clone(),
            scaled: self.scaled.clone(),
            order: self.order,
            rsorted: self.rsorted,
            ssorted: false,
            is_scaled: self.is_scaled,
            statted: self.statted,
            divved: self.divved,
            select_ready: false,
            evaluated: self.evaluated,
            neval: 0,
            raw_stats: self.raw_stats,
            fitness_stats: self.fitness_stats,
            ind_div: self.ind_div.clone(),
            pop_div: self.pop_div,
            scaling: self.scaling.clone(),
            selector: self.selector.clone(),
            evaluator: self.evaluator.clone(),
            initializer: self.initializer.clone(),
        }
    }
}

impl<C: Chromosome> fmt::Debug for Population<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Population")
            .field("size", &self.len())
            .field("order", &self.order)
            .field("evaluated", &self.evaluated)
            .field("neval", &self.neval)
            .field("scaling", &self.scaling)
            .field("selector", &self.selector)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::BinaryString;
    use crate::scaling::NoScaling;

    fn scored(scores: &[f32]) -> Population<BinaryString> {
        Population::from_genomes(
            scores
                .iter()
                .map(|&s| {
                    let mut g = Genome::new(BinaryString::new(4));
                    g.set_score(s);
                    g
                })
                .collect(),
        )
    }

    fn raw_scores(population: &Population<BinaryString>, basis: SortBasis) -> Vec<f32> {
        (0..population.len())
            .map(|i| population.individual(i, basis).cached_score())
            .collect()
    }

    fn assert_views_agree(population: &Population<BinaryString>) {
        let mut raw = population.raw.clone();
        let mut scaled = population.scaled.clone();
        raw.sort_unstable();
        scaled.sort_unstable();
        let all: Vec<usize> = (0..population.len()).collect();
        assert_eq!(raw, all);
        assert_eq!(scaled, all);
    }

    #[test]
    fn test_aggregates() {
        let stats = Aggregates::of(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats.sum, 10.0);
        assert_eq!(stats.ave, 2.5);
        assert!((stats.var - 5.0 / 3.0).abs() < 1e-6);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(Aggregates::of(&[7.0]).var, 0.0);
        assert_eq!(Aggregates::of(&[]), Aggregates::default());
    }

    #[test]
    fn test_sort_high_and_low() {
        let mut population = scored(&[3.0, 9.0, 1.0, 9.0, 4.0, 0.0]);
        population.sort(false, SortBasis::Raw).unwrap();
        assert_eq!(
            raw_scores(&population, SortBasis::Raw),
            vec![9.0, 9.0, 4.0, 3.0, 1.0, 0.0]
        );
        population.set_order(SortOrder::LowIsBest);
        population.sort(false, SortBasis::Raw).unwrap();
        assert_eq!(
            raw_scores(&population, SortBasis::Raw),
            vec![0.0, 1.0, 3.0, 4.0, 9.0, 9.0]
        );
    }

    #[test]
    fn test_best_and_worst() {
        let mut population = scored(&[2.0, 8.0, 5.0]);
        assert_eq!(population.best(0, SortBasis::Raw).unwrap().cached_score(), 8.0);
        assert_eq!(population.worst(0, SortBasis::Raw).unwrap().cached_score(), 2.0);
        assert_eq!(population.worst(1, SortBasis::Raw).unwrap().cached_score(), 5.0);
        assert!(population.best(3, SortBasis::Raw).is_err());
        assert!(population.worst(3, SortBasis::Raw).is_err());
        assert!(matches!(
            Population::<BinaryString>::new().best(0, SortBasis::Raw),
            Err(GeneticError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_remove_keeps_views_consistent() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = scored(&[2.0, 8.0, 5.0, 1.0]);
        let best = population
            .remove(Slot::Best, SortBasis::Raw, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(best.cached_score(), 8.0);
        assert_eq!(population.len(), 3);
        assert_views_agree(&population);
        assert_eq!(raw_scores(&population, SortBasis::Raw), vec![5.0, 2.0, 1.0]);
        assert_eq!(raw_scores(&population, SortBasis::Scaled), vec![5.0, 2.0, 1.0]);

        assert!(population
            .remove(Slot::Index(7), SortBasis::Raw, &mut rng)
            .unwrap()
            .is_none());
        population
            .remove(Slot::Random, SortBasis::Scaled, &mut rng)
            .unwrap();
        assert_eq!(population.len(), 2);
        assert_views_agree(&population);
    }

    #[test]
    fn test_replace_worst() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let mut population = scored(&[2.0, 8.0, 5.0]);
        let mut better = Genome::new(BinaryString::new(4));
        better.set_score(10.0);
        let displaced = population
            .replace(better, Slot::Worst, SortBasis::Raw, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(displaced.cached_score(), 2.0);
        assert_eq!(population.raw_stats().unwrap().max, 10.0);
        assert_views_agree(&population);
    }

    #[test]
    fn test_add_invalidates() {
        let mut population = scored(&[1.0]);
        assert_eq!(population.raw_stats().unwrap().max, 1.0);
        let mut g = Genome::new(BinaryString::new(4));
        g.set_score(6.0);
        population.add(g);
        assert_eq!(population.raw_stats().unwrap().max, 6.0);
        assert_views_agree(&population);
    }

    #[test]
    fn test_set_size() {
        let mut rng = RandomNumberGenerator::from_seed(4);
        let mut population = scored(&[1.0, 2.0, 3.0]);
        population.set_size(7, &mut rng).unwrap();
        assert_eq!(population.len(), 7);
        assert!(population.iter().all(|g| [1.0, 2.0, 3.0].contains(&g.cached_score())));
        assert_views_agree(&population);

        population.sort(false, SortBasis::Raw).unwrap();
        population.set_size(2, &mut rng).unwrap();
        assert_eq!(population.len(), 2);
        assert_eq!(population.best(0, SortBasis::Raw).unwrap().cached_score(), 3.0);
        assert_views_agree(&population);

        let mut empty = Population::<BinaryString>::new();
        assert!(empty.set_size(3, &mut rng).is_err());
    }

    #[test]
    fn test_evaluate_counts_and_propagates_cancel() {
        let prototype = Genome::new(BinaryString::new(6)).with_evaluator(Arc::new(
            |g: &Genome<BinaryString>| Ok(g.chromosome().count_ones() as f32),
        ));
        let mut population = Population::with_size(&prototype, 4);
        population.evaluate(false).unwrap();
        population.evaluate(false).unwrap();
        assert_eq!(population.nevals(), 1);
        population.evaluate(true).unwrap();
        assert_eq!(population.nevals(), 2);

        population.set_evaluator(Arc::new(|_: &mut Population<BinaryString>| {
            Err(GeneticError::Cancelled("stop".into()))
        }));
        assert!(matches!(
            population.evaluate(false),
            Err(GeneticError::Cancelled(_))
        ));
    }

    #[test]
    fn test_diversity() {
        let mut population = scored(&[1.0, 2.0, 3.0]);
        assert_eq!(population.diversity(), 0.0);

        let mut rng = RandomNumberGenerator::from_seed(3);
        population
            .individual_mut(0, SortBasis::Raw)
            .unwrap()
            .chromosome_mut()
            .set_range(0, 4);
        // one genome differs from the two others in every bit
        assert!((population.diversity() - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(population.diversity_between(0, 0), Some(0.0));
        assert_eq!(population.diversity_between(1, 2), Some(0.0));
        assert_eq!(population.diversity_between(0, 9), None);

        population.set_size(1, &mut rng).unwrap();
        assert_eq!(population.diversity(), 0.0);
    }

    #[test]
    fn test_scale_sets_fitness() {
        let mut population = scored(&[1.0, 3.0]);
        population.set_scaling(Box::new(NoScaling));
        let stats = population.fitness_stats().unwrap();
        assert_eq!(stats.max, 3.0);
        assert_eq!(stats.sum, 4.0);
        assert_eq!(
            population.best(0, SortBasis::Scaled).unwrap().fitness(),
            3.0
        );
    }

    #[test]
    fn test_dominant_individual_is_selected() {
        let mut population = scored(&[0.0, 0.0, 100.0, 0.0]);
        population.set_scaling(Box::new(NoScaling));
        let mut rng = RandomNumberGenerator::from_seed(5);
        for _ in 0..100 {
            assert_eq!(population.select(&mut rng).unwrap().cached_score(), 100.0);
        }
    }

    #[test]
    fn test_mixed_signs_still_select_in_range() {
        let mut population = scored(&[-1.0, 2.0, 3.0]);
        population.set_scaling(Box::new(NoScaling));
        let mut rng = RandomNumberGenerator::from_seed(6);
        for _ in 0..20 {
            assert!(population.select_position(&mut rng).unwrap() < 3);
        }
        assert!(matches!(
            Population::<BinaryString>::new().select_position(&mut rng),
            Err(GeneticError::EmptyPopulation)
        ));
    }

    #[test]
    fn test_clone_resets_counter() {
        let mut population = scored(&[1.0, 2.0]);
        population.evaluate(true).unwrap();
        let copy = population.clone();
        assert_eq!(copy.nevals(), 0);
        assert_eq!(copy.len(), 2);
    }
    #[test]
    fn test_pair_mut_borrows_two() {
        let mut population = scored(&[1.0, 2.0, 3.0]);
        {
            let (a, b) = population.pair_mut(2, 0, SortBasis::Raw).unwrap();
            assert_eq!(a.cached_score(), 3.0);
            assert_eq!(b.cached_score(), 1.0);
            a.set_score(7.0);
            b.set_score(8.0);
        }
        assert!(population.pair_mut(1, 1, SortBasis::Raw).is_none());
        assert!(population.pair_mut(0, 3, SortBasis::Raw).is_none());
        assert_eq!(population.best(0, SortBasis::Raw).unwrap().cached_score(), 8.0);
    }
}
