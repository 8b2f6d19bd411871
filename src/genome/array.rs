//! # Array genomes
//!
//! [`GeneArray`] is a plain 1D array of values. [`AlleleArray`] is a 1D array whose
//! position `i` draws its legal values from allele set `i % n` of an [`AlleleSetArray`].
//! Both support the partial-match crossover through [`AsGeneArray`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::allele::{Allele, AlleleKind, AlleleSet, AlleleSetArray};
use crate::rng::RandomNumberGenerator;

use super::operators::{element_comparator, mutate_at_rate, one_point_crossover, swap_mutator};
use super::{Chromosome, Genome, Initializer, LinearChromosome, Mutator, Operators, SizeBounds};

/// Marker for array representations that support order-preserving crossovers.
pub trait AsGeneArray: LinearChromosome {}

/// A 1D array of arbitrary values.
///
/// There is no default initializer; the default mutator swaps positions.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GeneArray<T> {
    genes: Vec<T>,
    bounds: SizeBounds,
}

impl<T> GeneArray<T>
where
    T: Clone + PartialEq + Debug + Default + Send + Sync + 'static,
{
    /// A fixed-length array of default values.
    pub fn new(len: usize) -> Self {
        Self {
            genes: vec![T::default(); len],
            bounds: SizeBounds::fixed(len),
        }
    }

    /// A fixed-length array holding `genes`.
    pub fn from_vec(genes: Vec<T>) -> Self {
        let bounds = SizeBounds::fixed(genes.len());
        Self { genes, bounds }
    }

    pub fn gene(&self, i: usize) -> &T {
        &self.genes[i]
    }

    pub fn set_gene(&mut self, i: usize, value: T) {
        self.genes[i] = value;
    }
}

impl<T> Chromosome for GeneArray<T>
where
    T: Clone + PartialEq + Debug + Default + Send + Sync + 'static,
{
    fn clone_attributes(&self) -> Self {
        Self {
            genes: vec![T::default(); self.genes.len()],
            bounds: self.bounds,
        }
    }

    fn default_operators() -> Operators<Self> {
        Operators {
            initializer: None,
            mutator: Some(swap_mutator()),
            comparator: Some(element_comparator()),
            sexual: Some(one_point_crossover()),
            asexual: None,
        }
    }
}

impl<T> LinearChromosome for GeneArray<T>
where
    T: Clone + PartialEq + Debug + Default + Send + Sync + 'static,
{
    type Gene = T;

    fn genes(&self) -> &[T] {
        &self.genes
    }

    fn genes_mut(&mut self) -> &mut [T] {
        &mut self.genes
    }

    fn storage_mut(&mut self) -> &mut Vec<T> {
        &mut self.genes
    }

    fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    fn bounds_mut(&mut self) -> &mut SizeBounds {
        &mut self.bounds
    }

    fn fresh_gene(&self, _position: usize, _rng: &mut RandomNumberGenerator) -> T {
        T::default()
    }
}

impl<T> AsGeneArray for GeneArray<T> where
    T: Clone + PartialEq + Debug + Default + Send + Sync + 'static
{
}

/// A 1D array drawing its values from allele sets.
///
/// Cloning links the clone's allele sets to this array's sets.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleArray<T: Allele> {
    genes: Vec<T>,
    bounds: SizeBounds,
    sets: AlleleSetArray<T>,
}

impl<T: Allele> AlleleArray<T> {
    /// A fixed-length array of `len` positions sharing one allele set.
    pub fn new(len: usize, set: AlleleSet<T>) -> Self {
        Self {
            genes: vec![T::default(); len],
            bounds: SizeBounds::fixed(len),
            sets: AlleleSetArray::from_set(set),
        }
    }

    /// A fixed-length array with one position per allele set.
    pub fn from_sets(sets: AlleleSetArray<T>) -> Self {
        let len = sets.len();
        Self {
            genes: vec![T::default(); len],
            bounds: SizeBounds::fixed(len),
            sets,
        }
    }

    /// The allele set governing position `i`.
    pub fn allele_set(&self, i: usize) -> Option<&AlleleSet<T>> {
        self.sets.set_for(i)
    }

    pub fn allele_sets(&self) -> &AlleleSetArray<T> {
        &self.sets
    }

    /// Replaces the allele sets. The new sets are unlinked from any previous holder.
    pub fn set_allele_sets(&mut self, sets: AlleleSetArray<T>) {
        let mut own = AlleleSetArray::new();
        for set in sets.iter() {
            let mut set = set.clone();
            set.unlink();
            own.add(set);
        }
        self.sets = own;
    }

    pub fn gene(&self, i: usize) -> &T {
        &self.genes[i]
    }

    pub fn set_gene(&mut self, i: usize, value: T) {
        self.genes[i] = value;
    }

    fn sample(&self, i: usize, rng: &mut RandomNumberGenerator) -> T {
        match self.sets.set_for(i) {
            Some(set) => set.allele(rng),
            None => T::default(),
        }
    }
}

impl<T: Allele> Chromosome for AlleleArray<T> {
    fn clone_attributes(&self) -> Self {
        Self {
            genes: vec![T::default(); self.genes.len()],
            bounds: self.bounds,
            sets: self.sets.clone(),
        }
    }

    fn default_operators() -> Operators<Self> {
        Operators {
            initializer: Some(uniform_allele_initializer()),
            mutator: Some(allele_flip_mutator()),
            comparator: Some(element_comparator()),
            sexual: Some(one_point_crossover()),
            asexual: None,
        }
    }
}

impl<T: Allele> LinearChromosome for AlleleArray<T> {
    type Gene = T;

    fn genes(&self) -> &[T] {
        &self.genes
    }

    fn genes_mut(&mut self) -> &mut [T] {
        &mut self.genes
    }

    fn storage_mut(&mut self) -> &mut Vec<T> {
        &mut self.genes
    }

    fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    fn bounds_mut(&mut self) -> &mut SizeBounds {
        &mut self.bounds
    }

    fn fresh_gene(&self, position: usize, rng: &mut RandomNumberGenerator) -> T {
        self.sample(position, rng)
    }
}

impl<T: Allele> AsGeneArray for AlleleArray<T> {}

/// Picks a random length within the bounds and samples every position from its set.
pub fn uniform_allele_initializer<T: Allele>() -> Initializer<AlleleArray<T>> {
    Arc::new(|genome: &mut Genome<AlleleArray<T>>, rng: &mut RandomNumberGenerator| {
        let array = genome.chromosome_mut();
        array.resize_any(rng);
        for i in (0..array.len()).rev() {
            array.genes[i] = array.sample(i, rng);
        }
    })
}

/// Fills the array with the values of the first allele set in order, cycling as needed,
/// then shuffles. Useful for permutation problems.
pub fn ordered_allele_initializer<T: Allele>() -> Initializer<AlleleArray<T>> {
    Arc::new(|genome: &mut Genome<AlleleArray<T>>, rng: &mut RandomNumberGenerator| {
        let array = genome.chromosome_mut();
        array.resize_any(rng);
        let Some(set) = array.sets.set(0).cloned() else {
            return;
        };
        let len = array.len();
        for (n, i) in (0..len).rev().enumerate() {
            let index = if set.is_empty() { 0 } else { n % set.len() };
            array.genes[i] = set.allele_at(index);
        }
        for i in (0..len).rev() {
            let j = rng.random_index(len);
            array.genes.swap(i, j);
        }
    })
}

/// Replaces mutated positions with a fresh sample of their allele set.
pub fn allele_flip_mutator<T: Allele>() -> Mutator<AlleleArray<T>> {
    Arc::new(|genome: &mut Genome<AlleleArray<T>>, p: f32, rng: &mut RandomNumberGenerator| {
        genome.modify(|array| {
            let len = array.len();
            mutate_at_rate(array, len, p, rng, |array, i, rng| {
                array.genes[i] = array.sample(i, rng);
            })
        })
    })
}

/// Numeric allele types that can be perturbed by a Gaussian deviate.
pub trait NumericAllele: Allele + Copy + PartialOrd {
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
}

macro_rules! numeric_allele {
    ($($t:ty),*) => {
        $(
            impl NumericAllele for $t {
                fn to_f64(self) -> f64 {
                    self as f64
                }

                fn from_f64(value: f64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

numeric_allele!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

/// Adds a normal deviate with standard deviation `dev` to mutated positions and clamps the
/// result into the position's bounded set. Positions governed by other kinds of sets are
/// resampled instead.
pub fn gaussian_mutator<T: NumericAllele>(dev: f64) -> Mutator<AlleleArray<T>> {
    Arc::new(
        move |genome: &mut Genome<AlleleArray<T>>, p: f32, rng: &mut RandomNumberGenerator| {
            genome.modify(|array| {
                let len = array.len();
                mutate_at_rate(array, len, p, rng, |array, i, rng| {
                    let bounded = array
                        .sets
                        .set_for(i)
                        .filter(|s| s.kind() == AlleleKind::Bounded)
                        .and_then(|s| Some((*s.lower()?, *s.upper()?)));
                    array.genes[i] = match bounded {
                        Some((lower, upper)) => {
                            let moved = T::from_f64(array.genes[i].to_f64() + rng.gaussian(dev));
                            if moved < lower {
                                lower
                            } else if moved > upper {
                                upper
                            } else {
                                moved
                            }
                        }
                        None => array.sample(i, rng),
                    };
                })
            })
        },
    )
}
