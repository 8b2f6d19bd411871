//! # Bin2Dec
//!
//! A bit string read as a list of floating point phenotypes. A [`PhenotypeMap`] says where
//! each phenotype lives in the string and which range it covers; a [`BinaryCodec`] does the
//! conversion.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::genome::{Bin2Dec, LinearChromosome};
//! use gaforge::phenotype::PhenotypeMap;
//!
//! let mut map = PhenotypeMap::new();
//! map.add(8, 0.0, 255.0);
//! map.add(10, -1.0, 1.0);
//!
//! let mut genome = Bin2Dec::new(map);
//! assert_eq!(genome.len(), 18);
//! assert_eq!(genome.set_phenotype(0, 100.0), 100.0);
//! assert_eq!(genome.phenotype(0), 100.0);
//!
//! // out of range: clamped to the nearer bound
//! assert_eq!(genome.set_phenotype(1, 4.0), 1.0);
//! ```

use std::sync::Arc;

use crate::error::{report, GeneticError, Result};
use crate::phenotype::{BinaryCodec, PhenotypeMap, StandardBinary};
use crate::rng::RandomNumberGenerator;

use super::binary::BinaryString;
use super::operators::{
    element_comparator, flip_mutator, one_point_crossover, uniform_bits_initializer,
};
use super::{Chromosome, LinearChromosome, Operators, SizeBounds};

#[derive(Debug, Clone)]
pub struct Bin2Dec {
    bits: BinaryString,
    map: PhenotypeMap,
    codec: Arc<dyn BinaryCodec>,
}

impl Bin2Dec {
    /// A fixed-length genome sized to `map`, using plain binary.
    pub fn new(map: PhenotypeMap) -> Self {
        Self {
            bits: BinaryString::new(map.size()),
            map,
            codec: Arc::new(StandardBinary),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn BinaryCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn bits(&self) -> &BinaryString {
        &self.bits
    }

    pub fn phenotype_map(&self) -> &PhenotypeMap {
        &self.map
    }

    /// Installs a new map and resizes the string to fit it.
    pub fn set_phenotype_map(&mut self, map: PhenotypeMap, rng: &mut RandomNumberGenerator) {
        self.map = map;
        self.bits.resize(self.map.size(), rng);
    }

    pub fn n_phenotypes(&self) -> usize {
        self.map.len()
    }

    /// Decodes phenotype `n`.
    ///
    /// # Errors
    ///
    /// Returns an error when `n` is not a phenotype of the map or its field lies outside
    /// the string.
    pub fn try_phenotype(&self, n: usize) -> Result<f32> {
        let segment = self.map.segment(n).copied().ok_or_else(|| {
            GeneticError::OutOfBounds(format!("phenotype {} of {}", n, self.map.len()))
        })?;
        let field = self
            .bits
            .bits()
            .get(segment.offset..segment.offset + segment.bits)
            .ok_or_else(|| {
                GeneticError::OutOfBounds(format!("phenotype {} runs past the bit string", n))
            })?;
        let decoding = self.codec.decode(field, segment.min, segment.max)?;
        if decoding.truncated {
            report(&GeneticError::PrecisionLoss(format!(
                "phenotype {} is wider than the codec supports",
                n
            )));
        }
        Ok(decoding.value)
    }

    /// Decodes phenotype `n`, reporting failures and returning `0`.
    pub fn phenotype(&self, n: usize) -> f32 {
        self.try_phenotype(n).unwrap_or_else(|err| {
            report(&err);
            0.0
        })
    }

    /// All phenotypes in map order.
    pub fn phenotypes(&self) -> Vec<f32> {
        (0..self.map.len()).map(|n| self.phenotype(n)).collect()
    }

    /// Encodes `value` into phenotype `n` and returns the value actually stored.
    ///
    /// A value outside the phenotype's range is reported and replaced by the nearer bound.
    /// A value the field cannot represent exactly is reported as a precision loss and
    /// stored as the nearest representable value below it. An unknown phenotype is
    /// reported and leaves the string untouched.
    pub fn set_phenotype(&mut self, n: usize, value: f32) -> f32 {
        let Some(segment) = self.map.segment(n).copied() else {
            report(&GeneticError::OutOfBounds(format!(
                "phenotype {} of {}",
                n,
                self.map.len()
            )));
            return value;
        };

        let mut value = value;
        if value < segment.min || value > segment.max {
            report(&GeneticError::OutOfBounds(format!(
                "phenotype {} value {} is outside [{}, {}]",
                n, value, segment.min, segment.max
            )));
            value = if value < segment.min {
                segment.min
            } else {
                segment.max
            };
        }

        let codec = Arc::clone(&self.codec);
        let Some(field) = self
            .bits
            .genes_mut()
            .get_mut(segment.offset..segment.offset + segment.bits)
        else {
            report(&GeneticError::OutOfBounds(format!(
                "phenotype {} runs past the bit string",
                n
            )));
            return value;
        };

        match codec.encode(value, field, segment.min, segment.max) {
            Ok(encoding) => {
                if !encoding.exact || encoding.truncated {
                    report(&GeneticError::PrecisionLoss(format!(
                        "phenotype {} stored {} for {}",
                        n, encoding.value, value
                    )));
                }
                encoding.value
            }
            Err(err) => {
                report(&err);
                value
            }
        }
    }
}

impl PartialEq for Bin2Dec {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits && self.map == other.map
    }
}

impl Chromosome for Bin2Dec {
    fn clone_attributes(&self) -> Self {
        Self {
            bits: self.bits.clone_attributes(),
            map: self.map.clone(),
            codec: Arc::clone(&self.codec),
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

impl LinearChromosome for Bin2Dec {
    type Gene = bool;

    fn genes(&self) -> &[bool] {
        self.bits.genes()
    }

    fn genes_mut(&mut self) -> &mut [bool] {
        self.bits.genes_mut()
    }

    fn storage_mut(&mut self) -> &mut Vec<bool> {
        self.bits.storage_mut()
    }

    fn bounds(&self) -> SizeBounds {
        self.bits.bounds()
    }

    fn bounds_mut(&mut self) -> &mut SizeBounds {
        self.bits.bounds_mut()
    }

    fn fresh_gene(&self, position: usize, rng: &mut RandomNumberGenerator) -> bool {
        self.bits.fresh_gene(position, rng)
    }
}
