//! # Selection
//!
//! A selection scheme picks one individual of a population per call. Before the first
//! pick after a change, the population sorts itself on the scheme's [`SortBasis`] and
//! hands the scheme a [`SelectionDistribution`]: the scores of that view, best first.
//! The scheme answers every later [`select`](SelectionScheme::select) with a position in
//! that view.
//!
//! - [`RouletteWheelSelection`]: fitness-proportionate, the default.
//! - [`TournamentSelection`]: two roulette draws, the better one wins.
//! - [`RankSelection`]: always the best, ties broken uniformly.

pub mod rank;
pub mod roulette;
pub mod tournament;

pub use rank::RankSelection;
pub use roulette::RouletteWheelSelection;
pub use tournament::TournamentSelection;

use std::fmt::Debug;

use crate::error::Result;
use crate::rng::RandomNumberGenerator;

/// Which score a population view is ordered by.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortBasis {
    /// The objective score.
    Raw,
    /// The fitness assigned by scaling.
    #[default]
    Scaled,
}

/// Whether a high or a low score marks the better individual.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    LowIsBest,
    #[default]
    HighIsBest,
}

impl SortOrder {
    /// `true` when `a` is strictly better than `b` under this order.
    pub fn is_better(self, a: f32, b: f32) -> bool {
        match self {
            SortOrder::HighIsBest => a > b,
            SortOrder::LowIsBest => a < b,
        }
    }
}

/// The scores a selection scheme draws from.
#[derive(Debug, Clone, Copy)]
pub struct SelectionDistribution<'a> {
    pub order: SortOrder,
    /// Scores of the selected view, best first.
    pub values: &'a [f32],
    pub max: f32,
    pub min: f32,
}

/// A strategy for picking individuals out of a population.
pub trait SelectionScheme: Debug + Send + Sync {
    /// The view this scheme selects from.
    fn basis(&self) -> SortBasis;

    /// Rebuilds the scheme's internal state from a fresh distribution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the scores cannot be used by this scheme. The
    /// scheme stays usable and keeps returning in-range positions.
    fn update(&mut self, distribution: &SelectionDistribution<'_>) -> Result<()>;

    /// A position in the view last passed to [`update`](SelectionScheme::update).
    fn select(&self, rng: &mut RandomNumberGenerator) -> usize;

    fn box_clone(&self) -> Box<dyn SelectionScheme>;
}

impl Clone for Box<dyn SelectionScheme> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_order_is_strict() {
        assert!(SortOrder::HighIsBest.is_better(2.0, 1.0));
        assert!(!SortOrder::HighIsBest.is_better(1.0, 1.0));
        assert!(SortOrder::LowIsBest.is_better(1.0, 2.0));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SortBasis::default(), SortBasis::Scaled);
        assert_eq!(SortOrder::default(), SortOrder::HighIsBest);
    }
}
