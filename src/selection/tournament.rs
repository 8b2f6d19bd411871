use crate::error::Result;
use crate::rng::RandomNumberGenerator;

use super::{RouletteWheelSelection, SelectionDistribution, SelectionScheme, SortBasis, SortOrder};

/// Two roulette draws; the better of the pair is selected.
///
/// The wheel is built the same way as [`RouletteWheelSelection`]'s, so the pressure toward
/// good individuals is stronger than a single proportional draw.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    wheel: RouletteWheelSelection,
    order: SortOrder,
    values: Vec<f32>,
}

impl TournamentSelection {
    pub fn new() -> Self {
        Self::with_basis(SortBasis::Scaled)
    }

    pub fn with_basis(basis: SortBasis) -> Self {
        Self {
            wheel: RouletteWheelSelection::with_basis(basis),
            order: SortOrder::default(),
            values: Vec::new(),
        }
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionScheme for TournamentSelection {
    fn basis(&self) -> SortBasis {
        self.wheel.basis()
    }

    fn update(&mut self, distribution: &SelectionDistribution<'_>) -> Result<()> {
        self.order = distribution.order;
        self.values.clear();
        self.values.extend_from_slice(distribution.values);
        self.wheel.update(distribution)
    }

    fn select(&self, rng: &mut RandomNumberGenerator) -> usize {
        let first = self.wheel.select(rng);
        let second = self.wheel.select(rng);
        match (self.values.get(first), self.values.get(second)) {
            (Some(&a), Some(&b)) if self.order.is_better(b, a) => second,
            _ => first,
        }
    }

    fn box_clone(&self) -> Box<dyn SelectionScheme> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_favours_the_best() {
        let values = [4.0, 3.0, 2.0, 1.0];
        let mut scheme = TournamentSelection::new();
        scheme
            .update(&SelectionDistribution {
                order: SortOrder::HighIsBest,
                values: &values,
                max: 4.0,
                min: 1.0,
            })
            .unwrap();

        let mut rng = RandomNumberGenerator::from_seed(13);
        let mut counts = [0usize; 4];
        for _ in 0..2000 {
            counts[scheme.select(&mut rng)] += 1;
        }
        // one roulette draw picks position 0 with probability 0.4; the better of two draws
        // picks it with probability 1 - 0.6^2
        assert!(counts[0] > 1100);
        assert!(counts[0] > counts[3]);
    }

    #[test]
    fn test_low_is_best_tournament() {
        let values = [1.0, 5.0];
        let mut scheme = TournamentSelection::with_basis(SortBasis::Raw);
        scheme
            .update(&SelectionDistribution {
                order: SortOrder::LowIsBest,
                values: &values,
                max: 5.0,
                min: 1.0,
            })
            .unwrap();
        assert_eq!(scheme.basis(), SortBasis::Raw);
        let mut rng = RandomNumberGenerator::from_seed(2);
        let firsts = (0..500).filter(|_| scheme.select(&mut rng) == 0).count();
        assert!(firsts > 400);
    }
}
