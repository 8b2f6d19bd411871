//! # Phenotype Map
//!
//! A [`PhenotypeMap`] lays out floating point phenotypes inside a bit string. Each
//! [`Segment`] owns `bits` consecutive positions starting at `offset` and maps the unsigned
//! integer stored there linearly onto `[min, max]`.
//!
//! The conversion itself is done by a [`BinaryCodec`]. [`StandardBinary`] writes the
//! integer most significant bit first and quantizes by truncation toward `min`, so
//! `decode(encode(v))` never exceeds `v` and is within one step
//! `(max - min) / (2^bits - 1)` of it.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::phenotype::{BinaryCodec, PhenotypeMap, StandardBinary};
//!
//! let mut map = PhenotypeMap::new();
//! map.add(8, 0.0, 255.0);
//! map.add(4, -1.0, 1.0);
//! assert_eq!(map.size(), 12);
//! assert_eq!(map.segment(1).unwrap().offset, 8);
//!
//! let mut field = vec![false; 8];
//! let encoding = StandardBinary.encode(37.0, &mut field, 0.0, 255.0).unwrap();
//! assert!(encoding.exact);
//! assert_eq!(StandardBinary.decode(&field, 0.0, 255.0).unwrap().value, 37.0);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{GeneticError, Result};

/// Width of the integer word used for conversion. Fields are limited to `MAX_BITS - 1` bits.
pub const MAX_BITS: usize = 32;

/// One encoded phenotype: `bits` positions starting at `offset`, mapped onto `[min, max]`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub bits: usize,
    pub offset: usize,
    pub min: f32,
    pub max: f32,
}

/// Outcome of encoding a value into a bit field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encoding {
    /// The value the field now represents.
    pub value: f32,
    /// `true` when `value` equals the requested value.
    pub exact: bool,
    /// `true` when the field was wider than the codec supports and only its leading
    /// `MAX_BITS - 1` positions carry data.
    pub truncated: bool,
}

/// Outcome of decoding a bit field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoding {
    pub value: f32,
    pub truncated: bool,
}

/// Converts between floating values and fixed-width bit fields.
pub trait BinaryCodec: Debug + Send + Sync {
    /// Writes `value` into `field`, returning what the field now represents.
    ///
    /// # Errors
    ///
    /// Returns an error when `field` is empty or `value` lies outside `[min, max]`.
    fn encode(&self, value: f32, field: &mut [bool], min: f32, max: f32) -> Result<Encoding>;

    /// Reads `field` back into a value in `[min, max]`.
    fn decode(&self, field: &[bool], min: f32, max: f32) -> Result<Decoding>;
}

/// Plain unsigned binary, most significant bit first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardBinary;

fn usable_width(len: usize) -> (usize, bool) {
    if len >= MAX_BITS {
        (MAX_BITS - 1, true)
    } else {
        (len, false)
    }
}

fn grid(min: f32, max: f32, k: u64, intervals: u64) -> f32 {
    (min as f64 + (max as f64 - min as f64) * k as f64 / intervals as f64) as f32
}

impl BinaryCodec for StandardBinary {
    fn encode(&self, value: f32, field: &mut [bool], min: f32, max: f32) -> Result<Encoding> {
        if field.is_empty() {
            return Err(GeneticError::Configuration(
                "cannot encode into an empty bit field".to_string(),
            ));
        }
        if value < min || max < value || value.is_nan() {
            return Err(GeneticError::OutOfBounds(format!(
                "{} is outside [{}, {}]",
                value, min, max
            )));
        }

        let (width, truncated) = usable_width(field.len());
        let intervals: u64 = (1u64 << width) - 1;

        let mut k: u64 = 0;
        if max > min {
            let interval = (max as f64 - min as f64) / intervals as f64;
            k = (((value as f64 - min as f64) / interval).floor() as u64).min(intervals);
            // Settle k against f32 rounding so the grid value never exceeds the request.
            while k > 0 && grid(min, max, k, intervals) > value {
                k -= 1;
            }
            while k < intervals && grid(min, max, k + 1, intervals) <= value {
                k += 1;
            }
        }

        field.fill(false);
        for (i, bit) in field[..width].iter_mut().enumerate() {
            *bit = (k >> (width - 1 - i)) & 1 == 1;
        }

        let achieved = grid(min, max, k, intervals);
        Ok(Encoding {
            value: achieved,
            exact: achieved == value,
            truncated,
        })
    }

    fn decode(&self, field: &[bool], min: f32, max: f32) -> Result<Decoding> {
        if field.is_empty() {
            return Err(GeneticError::Configuration(
                "cannot decode an empty bit field".to_string(),
            ));
        }
        let (width, truncated) = usable_width(field.len());
        let intervals: u64 = (1u64 << width) - 1;
        let raw = field[..width]
            .iter()
            .fold(0u64, |acc, &bit| (acc << 1) | bit as u64);
        Ok(Decoding {
            value: grid(min, max, raw, intervals),
            truncated,
        })
    }
}

/// An ordered, shared list of phenotype segments.
///
/// Cloning links the clone to the same segment list; the first structural change through
/// either handle gives it a private copy.
#[derive(Debug, Clone, Default)]
pub struct PhenotypeMap {
    segments: Arc<Vec<Segment>>,
}

impl PhenotypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a segment of `bits` positions mapped onto `[min, max]`.
    pub fn add(&mut self, bits: usize, min: f32, max: f32) {
        let offset = self.size();
        Arc::make_mut(&mut self.segments).push(Segment {
            bits,
            offset,
            min,
            max,
        });
    }

    /// Removes segment `index` and shifts the offsets of the segments after it.
    pub fn remove(&mut self, index: usize) -> Result<Segment> {
        if index >= self.segments.len() {
            return Err(GeneticError::OutOfBounds(format!(
                "phenotype {} of {}",
                index,
                self.segments.len()
            )));
        }
        let segments = Arc::make_mut(&mut self.segments);
        let removed = segments.remove(index);
        let mut offset = 0;
        for segment in segments.iter_mut() {
            segment.offset = offset;
            offset += segment.bits;
        }
        Ok(removed)
    }

    /// Number of phenotypes.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of bits across all segments.
    pub fn size(&self) -> usize {
        self.segments.iter().map(|s| s.bits).sum()
    }

    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.segments)
    }

    pub fn is_linked_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.segments, &other.segments)
    }

    pub fn link(&mut self, other: &Self) {
        if !self.is_linked_to(other) {
            self.segments = Arc::clone(&other.segments);
        }
    }

    pub fn unlink(&mut self) {
        if Arc::strong_count(&self.segments) > 1 {
            self.segments = Arc::new((*self.segments).clone());
        }
    }
}

impl PartialEq for PhenotypeMap {
    fn eq(&self, other: &Self) -> bool {
        self.is_linked_to(other) || *self.segments == *other.segments
    }
}
