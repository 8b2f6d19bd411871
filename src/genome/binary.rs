//! # BinaryString
//!
//! A one-dimensional string of bits. Fixed length by default; call
//! [`set_resize_behaviour`](LinearChromosome::set_resize_behaviour) to let crossover and
//! initialization vary the length within bounds.
//!
//! Default strategies: random-bit initializer, flip mutator, element comparator and
//! one-point crossover.

use crate::rng::RandomNumberGenerator;

use super::operators::{
    element_comparator, flip_mutator, one_point_crossover, uniform_bits_initializer,
};
use super::{Chromosome, LinearChromosome, Operators, SizeBounds};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryString {
    bits: Vec<bool>,
    bounds: SizeBounds,
}

impl BinaryString {
    /// A fixed-length string of `len` cleared bits.
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![false; len],
            bounds: SizeBounds::fixed(len),
        }
    }

    /// A fixed-length string holding `bits`.
    pub fn from_bits(bits: Vec<bool>) -> Self {
        let bounds = SizeBounds::fixed(bits.len());
        Self { bits, bounds }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn bit(&self, i: usize) -> bool {
        self.bits[i]
    }

    pub fn set_bit(&mut self, i: usize, value: bool) {
        self.bits[i] = value;
    }

    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Sets `len` bits starting at `from`, clipped to the string.
    pub fn set_range(&mut self, from: usize, len: usize) {
        self.fill_range(from, len, |_| true);
    }

    /// Clears `len` bits starting at `from`, clipped to the string.
    pub fn unset_range(&mut self, from: usize, len: usize) {
        self.fill_range(from, len, |_| false);
    }

    /// Randomizes `len` bits starting at `from`, clipped to the string.
    pub fn randomize_range(&mut self, from: usize, len: usize, rng: &mut RandomNumberGenerator) {
        self.fill_range(from, len, |_| rng.random_bit());
    }

    fn fill_range<F: FnMut(usize) -> bool>(&mut self, from: usize, len: usize, mut value: F) {
        let end = from.saturating_add(len).min(self.bits.len());
        for i in from.min(end)..end {
            self.bits[i] = value(i);
        }
    }

    /// `true` when `len` bits of `self` starting at `dest` equal those of `other` starting
    /// at `src`. Ranges running past either string compare unequal.
    pub fn equal_range(&self, other: &Self, dest: usize, src: usize, len: usize) -> bool {
        match (self.bits.get(dest..dest + len), other.bits.get(src..src + len)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl Chromosome for BinaryString {
    fn clone_attributes(&self) -> Self {
        Self {
            bits: vec![false; self.bits.len()],
            bounds: self.bounds,
        }
    }

    fn default_operators() -> Operators<Self> {
        Operators {
            initializer: Some(uniform_bits_initializer()),
            mutator: Some(flip_mutator()),
            comparator: Some(element_comparator()),
            sexual: Some(one_point_crossover()),
            asexual: None,
        }
    }
}

impl LinearChromosome for BinaryString {
    type Gene = bool;

    fn genes(&self) -> &[bool] {
        &self.bits
    }

    fn genes_mut(&mut self) -> &mut [bool] {
        &mut self.bits
    }

    fn storage_mut(&mut self) -> &mut Vec<bool> {
        &mut self.bits
    }

    fn bounds(&self) -> SizeBounds {
        self.bounds
    }

    fn bounds_mut(&mut self) -> &mut SizeBounds {
        &mut self.bounds
    }

    fn fresh_gene(&self, _position: usize, rng: &mut RandomNumberGenerator) -> bool {
        rng.random_bit()
    }
}
