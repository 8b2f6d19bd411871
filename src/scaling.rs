//! # Fitness scaling
//!
//! A scaling scheme turns the objective scores of a population into non-negative fitness
//! values for selection. Schemes are pure: they receive the scores and their aggregates
//! and return one fitness per score, in the same order. The population stores the result
//! and recomputes its fitness aggregates.
//!
//! ```rust
//! use gaforge::population::Aggregates;
//! use gaforge::scaling::{LinearScaling, ScalingScheme};
//!
//! let scores = [1.0, 2.0, 3.0, 10.0];
//! let stats = Aggregates::of(&scores);
//! let fitness = LinearScaling::default().evaluate(&scores, &stats);
//!
//! assert!(fitness.iter().all(|&f| f >= 0.0));
//! // the best individual gets `multiplier` times the average
//! assert!((fitness[3] - 1.2 * stats.ave).abs() < 1e-4);
//! ```

use std::fmt::Debug;

use crate::error::{report, GeneticError, Result};
use crate::population::Aggregates;

pub const DEFAULT_LINEAR_MULTIPLIER: f32 = 1.2;
pub const DEFAULT_SIGMA_MULTIPLIER: f32 = 2.0;

/// Maps objective scores to fitness.
pub trait ScalingScheme: Debug + Send + Sync {
    /// One fitness value per score. `stats` are the aggregates of `scores`.
    fn evaluate(&self, scores: &[f32], stats: &Aggregates) -> Vec<f32>;

    fn box_clone(&self) -> Box<dyn ScalingScheme>;
}

impl Clone for Box<dyn ScalingScheme> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Fitness equals the objective score.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScaling;

impl ScalingScheme for NoScaling {
    fn evaluate(&self, scores: &[f32], _stats: &Aggregates) -> Vec<f32> {
        scores.to_vec()
    }

    fn box_clone(&self) -> Box<dyn ScalingScheme> {
        Box::new(*self)
    }
}

/// Linear scaling `f = a * score + b`.
///
/// The coefficients map the average score onto itself and the best score onto
/// `multiplier` times the average. When that would push the worst score below zero, the
/// line is stretched so the worst score maps to zero instead. Scores must be
/// non-negative: a negative score is reported and every fitness becomes zero.
#[derive(Debug, Clone, Copy)]
pub struct LinearScaling {
    multiplier: f32,
}

impl LinearScaling {
    /// # Errors
    ///
    /// Returns a configuration error when `multiplier <= 1`.
    pub fn new(multiplier: f32) -> Result<Self> {
        let mut scaling = Self::default();
        scaling.set_multiplier(multiplier)?;
        Ok(scaling)
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Sets the multiplier, keeping the old one when `multiplier <= 1`.
    pub fn set_multiplier(&mut self, multiplier: f32) -> Result<()> {
        if multiplier <= 1.0 || multiplier.is_nan() {
            return Err(GeneticError::Configuration(format!(
                "linear scaling multiplier must be greater than 1, got {}",
                multiplier
            )));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    fn coefficients(&self, stats: &Aggregates) -> (f64, f64) {
        let c = self.multiplier as f64;
        let (min, max, ave) = (stats.min as f64, stats.max as f64, stats.ave as f64);
        if ave == max {
            (1.0, 0.0)
        } else if min > (c * ave - max) / (c - 1.0) {
            let delta = max - ave;
            ((c - 1.0) * ave / delta, ave * (max - c * ave) / delta)
        } else {
            let delta = ave - min;
            (ave / delta, -min * ave / delta)
        }
    }
}

impl Default for LinearScaling {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_LINEAR_MULTIPLIER,
        }
    }
}

impl ScalingScheme for LinearScaling {
    fn evaluate(&self, scores: &[f32], stats: &Aggregates) -> Vec<f32> {
        if let Some(negative) = scores.iter().find(|&&s| s < 0.0) {
            report(&GeneticError::Configuration(format!(
                "linear scaling needs non-negative scores, got {}",
                negative
            )));
            return vec![0.0; scores.len()];
        }
        let (a, b) = self.coefficients(stats);
        scores
            .iter()
            .map(|&s| (s as f64 * a + b).max(0.0) as f32)
            .collect()
    }

    fn box_clone(&self) -> Box<dyn ScalingScheme> {
        Box::new(*self)
    }
}

/// Sigma truncation: `f = max(0, score - ave + multiplier * dev)`.
#[derive(Debug, Clone, Copy)]
pub struct SigmaTruncationScaling {
    multiplier: f32,
}

impl SigmaTruncationScaling {
    /// # Errors
    ///
    /// Returns a configuration error when `multiplier < 0`.
    pub fn new(multiplier: f32) -> Result<Self> {
        let mut scaling = Self::default();
        scaling.set_multiplier(multiplier)?;
        Ok(scaling)
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: f32) -> Result<()> {
        if multiplier < 0.0 || multiplier.is_nan() {
            return Err(GeneticError::Configuration(format!(
                "sigma truncation multiplier must not be negative, got {}",
                multiplier
            )));
        }
        self.multiplier = multiplier;
        Ok(())
    }
}

impl Default for SigmaTruncationScaling {
    fn default() -> Self {
        Self {
            multiplier: DEFAULT_SIGMA_MULTIPLIER,
        }
    }
}

impl ScalingScheme for SigmaTruncationScaling {
    fn evaluate(&self, scores: &[f32], stats: &Aggregates) -> Vec<f32> {
        let offset = self.multiplier as f64 * stats.dev as f64 - stats.ave as f64;
        scores
            .iter()
            .map(|&s| (s as f64 + offset).max(0.0) as f32)
            .collect()
    }

    fn box_clone(&self) -> Box<dyn ScalingScheme> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_identity_when_uniform() {
        let scores = [3.0, 3.0, 3.0];
        let fitness = LinearScaling::default().evaluate(&scores, &Aggregates::of(&scores));
        assert_eq!(fitness, vec![3.0, 3.0, 3.0]);
    }

    #[test]
    fn test_linear_keeps_average() {
        let scores = [4.0, 5.0, 6.0];
        let stats = Aggregates::of(&scores);
        let fitness = LinearScaling::default().evaluate(&scores, &stats);
        let ave: f32 = fitness.iter().sum::<f32>() / 3.0;
        assert!((ave - stats.ave).abs() < 1e-4);
        assert!((fitness[2] - 1.2 * stats.ave).abs() < 1e-4);
    }

    #[test]
    fn test_linear_stretches_to_zero() {
        let scores = [0.0, 10.0, 10.0, 10.0];
        let stats = Aggregates::of(&scores);
        let fitness = LinearScaling::new(3.0)
            .unwrap()
            .evaluate(&scores, &stats);
        assert!(fitness[0].abs() < 1e-4);
        assert!(fitness.iter().all(|&f| f >= 0.0));
    }

    #[test]
    fn test_linear_negative_scores_zero_fitness() {
        let scores = [-1.0, 2.0];
        let fitness = LinearScaling::default().evaluate(&scores, &Aggregates::of(&scores));
        assert_eq!(fitness, vec![0.0, 0.0]);
    }

    #[test]
    fn test_bad_multipliers_keep_old_value() {
        let mut linear = LinearScaling::default();
        assert!(linear.set_multiplier(1.0).is_err());
        assert_eq!(linear.multiplier(), 1.2);
        assert!(LinearScaling::new(0.5).is_err());

        let mut sigma = SigmaTruncationScaling::default();
        assert!(sigma.set_multiplier(-0.1).is_err());
        assert_eq!(sigma.multiplier(), 2.0);
        assert!(SigmaTruncationScaling::new(0.0).is_ok());
    }

    #[test]
    fn test_sigma_truncates_at_zero() {
        let scores = [-10.0, 0.0, 10.0];
        let stats = Aggregates::of(&scores);
        let fitness = SigmaTruncationScaling::new(0.0)
            .unwrap()
            .evaluate(&scores, &stats);
        assert_eq!(fitness, vec![0.0, 0.0, 10.0]);

        let fitness = SigmaTruncationScaling::default().evaluate(&scores, &stats);
        assert!((fitness[0] - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_no_scaling_passes_scores() {
        let scores = [-2.0, 7.0];
        assert_eq!(
            NoScaling.evaluate(&scores, &Aggregates::of(&scores)),
            vec![-2.0, 7.0]
        );
    }
}
