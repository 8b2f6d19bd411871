//! # Allele Sets
//!
//! An [`AlleleSet`] describes the values a gene may legally take. There are three kinds:
//!
//! - **Enumerated**: an explicit list of values. Sampling is uniform over the list and
//!   indexed access wraps around.
//! - **Bounded**: a `[lower, upper]` range whose ends may each be inclusive or exclusive.
//!   Sampling is implemented for the numeric types through the [`Allele`] trait.
//! - **Discretized**: a range with a step. Sampling and indexed access are not defined.
//!
//! Sets are shared. Cloning an `AlleleSet` links the clone to the same descriptor, and the
//! first mutating call through any holder gives that holder its own copy.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::allele::AlleleSet;
//! use gaforge::rng::RandomNumberGenerator;
//!
//! let digits = AlleleSet::enumerated((0..10).collect::<Vec<i32>>());
//! let mut linked = digits.clone();
//! assert_eq!(digits.ref_count(), 2);
//!
//! linked.add(10).unwrap();
//! assert_eq!(digits.len(), 10);
//! assert_eq!(linked.len(), 11);
//! assert_eq!(digits.ref_count(), 1);
//!
//! let mut rng = RandomNumberGenerator::from_seed(1);
//! let value = digits.allele(&mut rng);
//! assert!((0..10).contains(&value));
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{report, GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// The three kinds of allele set.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlleleKind {
    Enumerated,
    Bounded,
    Discretized,
}

/// How an end of a bounded range is treated.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundType {
    None,
    #[default]
    Inclusive,
    Exclusive,
}

/// A value that can sit in an allele set.
///
/// `sample_between` draws a value from a bounded range. The default implementation returns
/// `None`, which the set reports as an undefined operation.
pub trait Allele: Clone + PartialEq + Debug + Default + Send + Sync + 'static {
    fn sample_between(
        _lower: &Self,
        _upper: &Self,
        _lower_bound: BoundType,
        _upper_bound: BoundType,
        _rng: &mut RandomNumberGenerator,
    ) -> Option<Self> {
        None
    }
}

macro_rules! integer_allele {
    ($($t:ty),*) => {
        $(
            impl Allele for $t {
                fn sample_between(
                    lower: &Self,
                    upper: &Self,
                    lower_bound: BoundType,
                    upper_bound: BoundType,
                    rng: &mut RandomNumberGenerator,
                ) -> Option<Self> {
                    let low = if lower_bound == BoundType::Exclusive {
                        lower.checked_add(1)?
                    } else {
                        *lower
                    };
                    let high = if upper_bound == BoundType::Exclusive {
                        upper.checked_sub(1)?
                    } else {
                        *upper
                    };
                    if high < low {
                        return None;
                    }
                    Some(rng.random_int(low, high))
                }
            }
        )*
    };
}

macro_rules! float_allele {
    ($($t:ty),*) => {
        $(
            impl Allele for $t {
                fn sample_between(
                    lower: &Self,
                    upper: &Self,
                    lower_bound: BoundType,
                    upper_bound: BoundType,
                    rng: &mut RandomNumberGenerator,
                ) -> Option<Self> {
                    if upper < lower {
                        return None;
                    }
                    if upper == lower {
                        let closed = lower_bound != BoundType::Exclusive
                            && upper_bound != BoundType::Exclusive;
                        return closed.then_some(*lower);
                    }
                    let span = (*upper - *lower) as f64;
                    loop {
                        let value = *lower + (rng.random_double() * span) as $t;
                        if lower_bound == BoundType::Exclusive && value <= *lower {
                            continue;
                        }
                        if upper_bound == BoundType::Exclusive && value >= *upper {
                            continue;
                        }
                        return Some(value.min(*upper));
                    }
                }
            }
        )*
    };
}

integer_allele!(i8, i16, i32, i64, u8, u16, u32, u64, usize);
float_allele!(f32, f64);

impl Allele for bool {}
impl Allele for char {}
impl Allele for String {}

#[derive(Debug, Clone, PartialEq)]
struct AlleleCore<T> {
    kind: AlleleKind,
    values: Vec<T>,
    lower_bound: BoundType,
    upper_bound: BoundType,
}

/// A shared, copy-on-write descriptor of legal gene values.
#[derive(Debug, Clone)]
pub struct AlleleSet<T: Allele> {
    core: Arc<AlleleCore<T>>,
}

impl<T: Allele> AlleleSet<T> {
    /// Creates an empty enumerated set.
    pub fn new() -> Self {
        Self::enumerated(Vec::new())
    }

    /// Creates an enumerated set from a list of values.
    pub fn enumerated(values: Vec<T>) -> Self {
        Self::from_core(AlleleKind::Enumerated, values, BoundType::None, BoundType::None)
    }

    /// Creates a bounded set `lower..upper` with the given bound types.
    pub fn bounded(lower: T, upper: T, lower_bound: BoundType, upper_bound: BoundType) -> Self {
        Self::from_core(AlleleKind::Bounded, vec![lower, upper], lower_bound, upper_bound)
    }

    /// Creates a discretized set `lower..upper` stepping by `increment`.
    pub fn discretized(
        lower: T,
        upper: T,
        increment: T,
        lower_bound: BoundType,
        upper_bound: BoundType,
    ) -> Self {
        Self::from_core(
            AlleleKind::Discretized,
            vec![lower, upper, increment],
            lower_bound,
            upper_bound,
        )
    }

    fn from_core(
        kind: AlleleKind,
        values: Vec<T>,
        lower_bound: BoundType,
        upper_bound: BoundType,
    ) -> Self {
        Self {
            core: Arc::new(AlleleCore {
                kind,
                values,
                lower_bound,
                upper_bound,
            }),
        }
    }

    pub fn kind(&self) -> AlleleKind {
        self.core.kind
    }

    /// Number of values in an enumerated set. For the other kinds this is the number of
    /// stored range parameters.
    pub fn len(&self) -> usize {
        self.core.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.values.is_empty()
    }

    pub fn values(&self) -> &[T] {
        &self.core.values
    }

    pub fn lower(&self) -> Option<&T> {
        match self.core.kind {
            AlleleKind::Enumerated => None,
            _ => self.core.values.first(),
        }
    }

    pub fn upper(&self) -> Option<&T> {
        match self.core.kind {
            AlleleKind::Enumerated => None,
            _ => self.core.values.get(1),
        }
    }

    pub fn increment(&self) -> Option<&T> {
        match self.core.kind {
            AlleleKind::Discretized => self.core.values.get(2),
            _ => None,
        }
    }

    pub fn lower_bound_type(&self) -> BoundType {
        self.core.lower_bound
    }

    pub fn upper_bound_type(&self) -> BoundType {
        self.core.upper_bound
    }

    /// Number of holders currently linked to this descriptor.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.core)
    }

    /// Returns `true` when both handles point at the same descriptor.
    pub fn is_linked_to(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.core, &other.core)
    }

    /// Drops the current descriptor and shares `other`'s instead.
    pub fn link(&mut self, other: &Self) {
        if !self.is_linked_to(other) {
            self.core = Arc::clone(&other.core);
        }
    }

    /// Gives this holder a private copy of the descriptor if it is shared.
    pub fn unlink(&mut self) {
        if Arc::strong_count(&self.core) > 1 {
            self.core = Arc::new((*self.core).clone());
        }
    }

    fn require_enumerated(&self, operation: &str) -> Result<()> {
        if self.core.kind != AlleleKind::Enumerated {
            return Err(GeneticError::OperationUndefined(format!(
                "{} on a {:?} allele set",
                operation, self.core.kind
            )));
        }
        Ok(())
    }

    /// Appends a value. Only enumerated sets can grow.
    pub fn add(&mut self, value: T) -> Result<()> {
        self.require_enumerated("add")?;
        Arc::make_mut(&mut self.core).values.push(value);
        Ok(())
    }

    /// Removes the first occurrence of `value`. Missing values are ignored.
    pub fn remove(&mut self, value: &T) -> Result<()> {
        self.require_enumerated("remove")?;
        if let Some(position) = self.core.values.iter().position(|v| v == value) {
            Arc::make_mut(&mut self.core).values.remove(position);
        }
        Ok(())
    }

    /// Removes the value stored at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<()> {
        self.require_enumerated("remove")?;
        if index >= self.core.values.len() {
            return Err(GeneticError::OutOfBounds(format!(
                "allele index {} in a set of {}",
                index,
                self.core.values.len()
            )));
        }
        Arc::make_mut(&mut self.core).values.remove(index);
        Ok(())
    }

    /// Draws a uniform legal value.
    ///
    /// # Errors
    ///
    /// Returns [`GeneticError::OperationUndefined`] for discretized sets, for bounded sets of
    /// non-numeric types, and for empty or inverted ranges.
    pub fn try_allele(&self, rng: &mut RandomNumberGenerator) -> Result<T> {
        let core = &self.core;
        match core.kind {
            AlleleKind::Enumerated => {
                if core.values.is_empty() {
                    return Err(GeneticError::OperationUndefined(
                        "sampling an empty allele set".to_string(),
                    ));
                }
                Ok(core.values[rng.random_index(core.values.len())].clone())
            }
            AlleleKind::Bounded => T::sample_between(
                &core.values[0],
                &core.values[1],
                core.lower_bound,
                core.upper_bound,
                rng,
            )
            .ok_or_else(|| {
                GeneticError::OperationUndefined(format!(
                    "sampling a bounded allele set of {:?}..{:?}",
                    core.values[0], core.values[1]
                ))
            }),
            AlleleKind::Discretized => Err(GeneticError::OperationUndefined(
                "sampling a discretized allele set".to_string(),
            )),
        }
    }

    /// Draws a uniform legal value, reporting failures and falling back to the first
    /// stored value (or `T::default()` for an empty set).
    pub fn allele(&self, rng: &mut RandomNumberGenerator) -> T {
        self.try_allele(rng).unwrap_or_else(|err| {
            report(&err);
            self.fallback()
        })
    }

    /// Returns the value at `index`, wrapping around the list.
    ///
    /// # Errors
    ///
    /// Indexed access is only defined for non-empty enumerated sets.
    pub fn try_allele_at(&self, index: usize) -> Result<T> {
        let core = &self.core;
        match core.kind {
            AlleleKind::Enumerated if !core.values.is_empty() => {
                Ok(core.values[index % core.values.len()].clone())
            }
            AlleleKind::Enumerated => Err(GeneticError::OperationUndefined(
                "indexing an empty allele set".to_string(),
            )),
            AlleleKind::Bounded => Err(GeneticError::OperationUndefined(
                "bounded allele sets have no index".to_string(),
            )),
            AlleleKind::Discretized => Err(GeneticError::OperationUndefined(
                "indexing a discretized allele set".to_string(),
            )),
        }
    }

    /// Like [`try_allele_at`](Self::try_allele_at), reporting failures and falling back to
    /// the first stored value.
    pub fn allele_at(&self, index: usize) -> T {
        self.try_allele_at(index).unwrap_or_else(|err| {
            report(&err);
            self.fallback()
        })
    }

    fn fallback(&self) -> T {
        self.core.values.first().cloned().unwrap_or_default()
    }
}

impl<T: Allele> Default for AlleleSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Allele> PartialEq for AlleleSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.is_linked_to(other) || *self.core == *other.core
    }
}

/// An ordered list of allele sets. Position `i` of an allele genome uses set `i % len`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlleleSetArray<T: Allele> {
    sets: Vec<AlleleSet<T>>,
}

impl<T: Allele> AlleleSetArray<T> {
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    pub fn from_set(set: AlleleSet<T>) -> Self {
        Self { sets: vec![set] }
    }

    pub fn add(&mut self, set: AlleleSet<T>) {
        self.sets.push(set);
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn set(&self, i: usize) -> Option<&AlleleSet<T>> {
        self.sets.get(i)
    }

    /// The set governing gene position `position`.
    pub fn set_for(&self, position: usize) -> Option<&AlleleSet<T>> {
        if self.sets.is_empty() {
            None
        } else {
            self.sets.get(position % self.sets.len())
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AlleleSet<T>> {
        self.sets.iter()
    }
}

impl<T: Allele> From<Vec<AlleleSet<T>>> for AlleleSetArray<T> {
    fn from(sets: Vec<AlleleSet<T>>) -> Self {
        Self { sets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerated_sampling_only_yields_members() {
        let set = AlleleSet::enumerated(vec![3, 5, 7]);
        let mut rng = RandomNumberGenerator::from_seed(4);
        for _ in 0..100 {
            assert!([3, 5, 7].contains(&set.allele(&mut rng)));
        }
    }

    #[test]
    fn test_indexed_access_wraps() {
        let set = AlleleSet::enumerated(vec!['a', 'b', 'c']);
        assert_eq!(set.allele_at(0), 'a');
        assert_eq!(set.allele_at(4), 'b');
    }

    #[test]
    fn test_reference_count_tracks_holders() {
        let set = AlleleSet::enumerated(vec![1, 2]);
        assert_eq!(set.ref_count(), 1);
        let a = set.clone();
        let mut b = set.clone();
        assert_eq!(set.ref_count(), 3);
        b.unlink();
        assert_eq!(set.ref_count(), 2);
        assert_eq!(b.ref_count(), 1);
        drop(a);
        assert_eq!(set.ref_count(), 1);
    }

    #[test]
    fn test_link_shares_descriptor() {
        let a = AlleleSet::enumerated(vec![1]);
        let mut b = AlleleSet::enumerated(vec![9, 8]);
        b.link(&a);
        assert!(b.is_linked_to(&a));
        assert_eq!(b.values(), &[1]);
        assert_eq!(a.ref_count(), 2);
    }

    #[test]
    fn test_add_is_copy_on_write() {
        let a = AlleleSet::enumerated(vec![1, 2]);
        let mut b = a.clone();
        b.add(3).unwrap();
        assert_eq!(a.values(), &[1, 2]);
        assert_eq!(b.values(), &[1, 2, 3]);
        assert!(!a.is_linked_to(&b));
    }

    #[test]
    fn test_remove_only_on_enumerated() {
        let mut e = AlleleSet::enumerated(vec![1, 2, 3]);
        e.remove(&2).unwrap();
        assert_eq!(e.values(), &[1, 3]);
        e.remove(&42).unwrap();
        assert_eq!(e.values(), &[1, 3]);
        assert!(e.remove_at(5).is_err());

        let mut b = AlleleSet::bounded(0, 10, BoundType::Inclusive, BoundType::Inclusive);
        assert!(matches!(b.add(4), Err(GeneticError::OperationUndefined(_))));
        assert!(b.remove(&0).is_err());
    }

    #[test]
    fn test_bounded_integer_respects_bound_types() {
        let set = AlleleSet::bounded(0, 3, BoundType::Exclusive, BoundType::Exclusive);
        let mut rng = RandomNumberGenerator::from_seed(12);
        for _ in 0..200 {
            let v = set.try_allele(&mut rng).unwrap();
            assert!(v == 1 || v == 2);
        }
    }

    #[test]
    fn test_bounded_float_in_range() {
        let set = AlleleSet::bounded(-1.0f64, 1.0, BoundType::Inclusive, BoundType::Exclusive);
        let mut rng = RandomNumberGenerator::from_seed(12);
        for _ in 0..200 {
            let v = set.try_allele(&mut rng).unwrap();
            assert!((-1.0..1.0).contains(&v));
        }
    }

    #[test]
    fn test_undefined_operations() {
        let mut rng = RandomNumberGenerator::from_seed(1);
        let d = AlleleSet::discretized(0, 10, 2, BoundType::Inclusive, BoundType::Inclusive);
        assert!(matches!(
            d.try_allele(&mut rng),
            Err(GeneticError::OperationUndefined(_))
        ));
        assert_eq!(d.allele(&mut rng), 0);
        assert!(d.try_allele_at(1).is_err());

        let b = AlleleSet::bounded(0, 10, BoundType::Inclusive, BoundType::Inclusive);
        assert!(b.try_allele_at(1).is_err());

        let s = AlleleSet::bounded(
            "a".to_string(),
            "z".to_string(),
            BoundType::Inclusive,
            BoundType::Inclusive,
        );
        assert!(s.try_allele(&mut rng).is_err());
        assert_eq!(s.allele(&mut rng), "a");
    }

    #[test]
    fn test_set_array_cycles_positions() {
        let mut sets = AlleleSetArray::from_set(AlleleSet::enumerated(vec![0]));
        sets.add(AlleleSet::enumerated(vec![1]));
        assert_eq!(sets.set_for(0).unwrap().values(), &[0]);
        assert_eq!(sets.set_for(3).unwrap().values(), &[1]);
        assert!(AlleleSetArray::<i32>::new().set_for(0).is_none());
    }
}
