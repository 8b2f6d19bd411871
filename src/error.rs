//! # Error Types
//!
//! This module defines the error type shared by every part of the engine, together with
//! the non-fatal reporting sink.
//!
//! Most problems an evolution run can hit are recoverable: a crossover asked to mate
//! parents of different lengths, a probability outside `[0, 1]`, a phenotype value that
//! cannot be represented exactly. Those are handed to [`report`], which logs them through
//! `tracing`, and the operation falls back to a safe default. Only
//! [`GeneticError::Cancelled`] is fatal: it is raised by a user evaluator and travels up
//! through `?` until it leaves `evolve()`.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use gaforge::error::{GeneticError, Result};
//!
//! fn checked_probability(p: f32) -> Result<f32> {
//!     if !(0.0..=1.0).contains(&p) {
//!         return Err(GeneticError::Configuration(format!(
//!             "probability {} is outside [0, 1]",
//!             p
//!         )));
//!     }
//!     Ok(p)
//! }
//!
//! assert!(checked_probability(0.3).is_ok());
//! assert!(checked_probability(1.3).is_err());
//! ```
//!
//! Reporting a recoverable error and carrying on:
//!
//! ```rust
//! use gaforge::error::{report, GeneticError};
//!
//! let err = GeneticError::OperationUndefined("indexed access on a bounded allele set".into());
//! assert!(!err.is_fatal());
//! report(&err);
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use gaforge::error::{GeneticError, OptionExt};
//!
//! fn first_score(scores: &[f32]) -> gaforge::error::Result<f32> {
//!     scores.first().copied().ok_or_else_genetic(|| GeneticError::EmptyPopulation)
//! }
//!
//! assert!(first_score(&[]).is_err());
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur in the genetic algorithm engine.
#[derive(Error, Debug)]
pub enum GeneticError {
    /// An invalid parameter, bound, probability or operator pairing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An operation needed at least one individual and found none.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// The operation is not defined for this kind of allele set or genome.
    #[error("Operation undefined: {0}")]
    OperationUndefined(String),

    /// A value could not be represented exactly and was clamped.
    #[error("Precision loss: {0}")]
    PrecisionLoss(String),

    /// A value or index is outside its valid range.
    #[error("Bounds error: {0}")]
    OutOfBounds(String),

    /// Two parents (or a parent and a child) cannot be mated by the chosen operator.
    #[error("Incompatible parents: {0}")]
    IncompatibleParents(String),

    /// The objective function failed for a reason other than cancellation.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// The user asked the run to stop. This is the only fatal error.
    #[error("Evolution cancelled: {0}")]
    Cancelled(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

impl GeneticError {
    /// Returns `true` when the error must abort the current evolution run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GeneticError::Cancelled(_))
    }
}

/// A specialized Result type for genetic algorithm operations.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Reports a non-fatal error.
///
/// This is the single sink for configuration and precision problems that the engine
/// absorbs locally. The event is emitted at `warn` level under the `gaforge::error` target.
pub fn report(err: &GeneticError) {
    tracing::warn!(target: "gaforge::error", error = %err, "non-fatal genetic error");
}

/// Reports the error if there is one and hands back the success value.
///
/// Fatal errors are passed through untouched so that `?` can still propagate them.
pub(crate) fn absorb<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            report(&err);
            Ok(None)
        }
    }
}

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use gaforge::error::ResultExt;
/// use std::fs::File;
///
/// fn open_log(path: &str) -> gaforge::error::Result<()> {
///     File::open(path).context("Failed to open score log")?;
///     Ok(())
/// }
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a `GeneticError` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| GeneticError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, GeneticError>` using `err_fn` for `None`.
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError,
    {
        self.ok_or_else(err_fn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_cancellation_is_fatal() {
        assert!(GeneticError::Cancelled("user".into()).is_fatal());
        assert!(!GeneticError::Configuration("x".into()).is_fatal());
        assert!(!GeneticError::PrecisionLoss("x".into()).is_fatal());
        assert!(!GeneticError::EmptyPopulation.is_fatal());
    }

    #[test]
    fn test_absorb_passes_fatal_errors_through() {
        let fatal: Result<u8> = Err(GeneticError::Cancelled("stop".into()));
        assert!(matches!(absorb(fatal), Err(GeneticError::Cancelled(_))));

        let soft: Result<u8> = Err(GeneticError::Configuration("bad".into()));
        assert!(matches!(absorb(soft), Ok(None)));

        assert!(matches!(absorb(Ok(3u8)), Ok(Some(3))));
    }

    #[test]
    fn test_context_wraps_message() {
        let io: std::result::Result<(), std::io::Error> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        let err = io.context("opening scores").unwrap_err();
        assert_eq!(err.to_string(), "opening scores: missing");
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(GeneticError::Io(_))));
    }
}
