use crate::error::Result;
use crate::rng::RandomNumberGenerator;

use super::{SelectionDistribution, SelectionScheme, SortBasis};

/// Always selects the best individual of the view. When several share the best score,
/// one of them is chosen uniformly.
#[derive(Debug, Clone)]
pub struct RankSelection {
    basis: SortBasis,
    ties: usize,
}

impl RankSelection {
    pub fn new() -> Self {
        Self::with_basis(SortBasis::Scaled)
    }

    pub fn with_basis(basis: SortBasis) -> Self {
        Self { basis, ties: 0 }
    }
}

impl Default for RankSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionScheme for RankSelection {
    fn basis(&self) -> SortBasis {
        self.basis
    }

    fn update(&mut self, distribution: &SelectionDistribution<'_>) -> Result<()> {
        self.ties = match distribution.values.first() {
            Some(&best) => distribution
                .values
                .iter()
                .take_while(|&&v| v == best)
                .count(),
            None => 0,
        };
        Ok(())
    }

    fn select(&self, rng: &mut RandomNumberGenerator) -> usize {
        if self.ties <= 1 {
            0
        } else {
            rng.random_index(self.ties)
        }
    }

    fn box_clone(&self) -> Box<dyn SelectionScheme> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SortOrder;

    fn ranked(values: &[f32]) -> RankSelection {
        let mut scheme = RankSelection::new();
        scheme
            .update(&SelectionDistribution {
                order: SortOrder::HighIsBest,
                values,
                max: values.first().copied().unwrap_or(0.0),
                min: values.last().copied().unwrap_or(0.0),
            })
            .unwrap();
        scheme
    }

    #[test]
    fn test_single_best() {
        let scheme = ranked(&[5.0, 4.0, 4.0]);
        let mut rng = RandomNumberGenerator::from_seed(1);
        assert!((0..50).all(|_| scheme.select(&mut rng) == 0));
    }

    #[test]
    fn test_ties_are_shared() {
        let scheme = ranked(&[5.0, 5.0, 5.0, 1.0]);
        let mut rng = RandomNumberGenerator::from_seed(3);
        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[scheme.select(&mut rng)] = true;
        }
        assert_eq!(seen, [true, true, true, false]);
    }
}
