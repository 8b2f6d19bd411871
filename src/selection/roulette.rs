use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

use super::{SelectionDistribution, SelectionScheme, SortBasis, SortOrder};

/// Fitness-proportionate selection.
///
/// The wheel is the normalized cumulative sum of the view's scores, best first. With
/// `HighIsBest` each individual's slice is its score; with `LowIsBest` it is
/// `max + min - score`, so the lowest score gets the widest slice. A population whose
/// scores are all equal gets equal slices.
///
/// Scores must not change sign across the population. When they do, `update` reports a
/// configuration error and the wheel is zeroed, which makes every draw land on the last
/// position.
///
/// # Examples
///
/// ```
/// use gaforge::rng::RandomNumberGenerator;
/// use gaforge::selection::{
///     RouletteWheelSelection, SelectionDistribution, SelectionScheme, SortOrder,
/// };
///
/// let mut wheel = RouletteWheelSelection::new();
/// let values = [9.0, 1.0, 0.0];
/// wheel
///     .update(&SelectionDistribution {
///         order: SortOrder::HighIsBest,
///         values: &values,
///         max: 9.0,
///         min: 0.0,
///     })
///     .unwrap();
///
/// let mut rng = RandomNumberGenerator::from_seed(5);
/// let picks = (0..1000).filter(|_| wheel.select(&mut rng) == 0).count();
/// assert!(picks > 800);
/// ```
#[derive(Debug, Clone)]
pub struct RouletteWheelSelection {
    basis: SortBasis,
    psum: Vec<f32>,
}

impl RouletteWheelSelection {
    /// A wheel over the scaled view.
    pub fn new() -> Self {
        Self::with_basis(SortBasis::Scaled)
    }

    pub fn with_basis(basis: SortBasis) -> Self {
        Self {
            basis,
            psum: Vec::new(),
        }
    }

    /// The cumulative, normalized slice boundaries.
    pub fn wheel(&self) -> &[f32] {
        &self.psum
    }
}

impl Default for RouletteWheelSelection {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionScheme for RouletteWheelSelection {
    fn basis(&self) -> SortBasis {
        self.basis
    }

    fn update(&mut self, distribution: &SelectionDistribution<'_>) -> Result<()> {
        let values = distribution.values;
        let n = values.len();
        if self.psum.len() != n {
            self.psum = vec![0.0; n];
        }
        if n == 0 {
            return Ok(());
        }

        let (max, min) = (distribution.max, distribution.min);
        if max == min {
            for (i, p) in self.psum.iter_mut().enumerate() {
                *p = (i + 1) as f32 / n as f32;
            }
            return Ok(());
        }

        if !((max > 0.0 && min >= 0.0) || (max <= 0.0 && min < 0.0)) {
            self.psum.iter_mut().for_each(|p| *p = 0.0);
            return Err(GeneticError::Configuration(format!(
                "roulette wheel needs scores of one sign, got [{}, {}]",
                min, max
            )));
        }

        let mut running = 0.0;
        for (p, &v) in self.psum.iter_mut().zip(values) {
            running += match distribution.order {
                SortOrder::HighIsBest => v,
                SortOrder::LowIsBest => max + min - v,
            };
            *p = running;
        }
        let total = self.psum[n - 1];
        if total == 0.0 {
            for (i, p) in self.psum.iter_mut().enumerate() {
                *p = (i + 1) as f32 / n as f32;
            }
        } else {
            self.psum.iter_mut().for_each(|p| *p /= total);
        }
        Ok(())
    }

    fn select(&self, rng: &mut RandomNumberGenerator) -> usize {
        let n = self.psum.len();
        if n == 0 {
            return 0;
        }
        let cutoff = rng.random_float();
        let mut lower: isize = 0;
        let mut upper: isize = n as isize - 1;
        while upper >= lower {
            let i = lower + (upper - lower) / 2;
            if self.psum[i as usize] > cutoff {
                upper = i - 1;
            } else {
                lower = i + 1;
            }
        }
        (lower.max(0) as usize).min(n - 1)
    }

    fn box_clone(&self) -> Box<dyn SelectionScheme> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updated(order: SortOrder, values: &[f32]) -> (RouletteWheelSelection, Result<()>) {
        let max = values.iter().copied().fold(f32::MIN, f32::max);
        let min = values.iter().copied().fold(f32::MAX, f32::min);
        let mut wheel = RouletteWheelSelection::new();
        let result = wheel.update(&SelectionDistribution {
            order,
            values,
            max,
            min,
        });
        (wheel, result)
    }

    #[test]
    fn test_equal_scores_give_equal_slices() {
        let (wheel, result) = updated(SortOrder::HighIsBest, &[2.0, 2.0, 2.0, 2.0]);
        assert!(result.is_ok());
        assert_eq!(wheel.wheel(), &[0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_high_is_best_wheel() {
        let (wheel, _) = updated(SortOrder::HighIsBest, &[3.0, 1.0, 0.0]);
        assert_eq!(wheel.wheel(), &[0.75, 1.0, 1.0]);
    }

    #[test]
    fn test_low_is_best_wheel() {
        let (wheel, _) = updated(SortOrder::LowIsBest, &[0.0, 1.0, 3.0]);
        // slices: 3, 2, 0
        assert_eq!(wheel.wheel(), &[0.6, 1.0, 1.0]);
    }

    #[test]
    fn test_mixed_signs_zero_the_wheel() {
        let (wheel, result) = updated(SortOrder::HighIsBest, &[2.0, -1.0]);
        assert!(matches!(result, Err(GeneticError::Configuration(_))));
        assert_eq!(wheel.wheel(), &[0.0, 0.0]);
        let mut rng = RandomNumberGenerator::from_seed(4);
        for _ in 0..20 {
            assert_eq!(wheel.select(&mut rng), 1);
        }
    }

    #[test]
    fn test_select_stays_in_range() {
        let (wheel, _) = updated(SortOrder::HighIsBest, &[5.0, 4.0, 3.0, 2.0, 1.0]);
        let mut rng = RandomNumberGenerator::from_seed(8);
        for _ in 0..500 {
            assert!(wheel.select(&mut rng) < 5);
        }
    }

    #[test]
    fn test_zero_slice_never_drawn() {
        let (wheel, _) = updated(SortOrder::HighIsBest, &[1.0, 1.0, 0.0]);
        let mut rng = RandomNumberGenerator::from_seed(21);
        for _ in 0..500 {
            assert_ne!(wheel.select(&mut rng), 2);
        }
    }

    #[test]
    fn test_empty_wheel() {
        let (wheel, result) = updated(SortOrder::HighIsBest, &[]);
        assert!(result.is_ok());
        let mut rng = RandomNumberGenerator::from_seed(1);
        assert_eq!(wheel.select(&mut rng), 0);
    }
}
