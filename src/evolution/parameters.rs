//! # Parameters
//!
//! Driver knobs addressed by name. Each parameter has a full name, a short name and a typed
//! value; [`ParameterList::parse`] reads `name value` pairs from a command line.
//!
//! ## Example
//!
//! ```rust
//! use gaforge::evolution::parameters::{names, ParameterList, ParameterValue};
//!
//! let mut list = ParameterList::new();
//! list.add(names::POPULATION_SIZE, names::POPULATION_SIZE_SHORT, ParameterValue::Int(50));
//! list.add(names::ELITISM, names::ELITISM_SHORT, ParameterValue::Bool(true));
//!
//! let argv = ["prog", "popsize", "80", "el", "f", "--verbose"];
//! let outcome = list.parse(&argv, false);
//! assert_eq!(outcome.found, 2);
//! assert_eq!(outcome.leftover, vec!["prog".to_string(), "--verbose".to_string()]);
//! assert_eq!(list.get("population_size"), Some(&ParameterValue::Int(80)));
//! assert_eq!(list.get("el"), Some(&ParameterValue::Bool(false)));
//! ```

use std::fmt;

use crate::error::{report, GeneticError, Result};

/// Full and short names of the driver parameters.
pub mod names {
    pub const MINIMAXI: &str = "minimaxi";
    pub const MINIMAXI_SHORT: &str = "mm";
    pub const NUMBER_OF_GENERATIONS: &str = "number_of_generations";
    pub const NUMBER_OF_GENERATIONS_SHORT: &str = "ngen";
    pub const CONVERGENCE_PERCENTAGE: &str = "convergence_percentage";
    pub const CONVERGENCE_PERCENTAGE_SHORT: &str = "pconv";
    pub const GENERATIONS_TO_CONVERGENCE: &str = "generations_to_convergence";
    pub const GENERATIONS_TO_CONVERGENCE_SHORT: &str = "nconv";
    pub const CROSSOVER_PROBABILITY: &str = "crossover_probability";
    pub const CROSSOVER_PROBABILITY_SHORT: &str = "pcross";
    pub const MUTATION_PROBABILITY: &str = "mutation_probability";
    pub const MUTATION_PROBABILITY_SHORT: &str = "pmut";
    pub const POPULATION_SIZE: &str = "population_size";
    pub const POPULATION_SIZE_SHORT: &str = "popsize";
    pub const REPLACEMENT_PERCENTAGE: &str = "replacement_percentage";
    pub const REPLACEMENT_PERCENTAGE_SHORT: &str = "prepl";
    pub const REPLACEMENT_NUMBER: &str = "replacement_number";
    pub const REPLACEMENT_NUMBER_SHORT: &str = "nrepl";
    pub const NUMBER_OF_BEST: &str = "number_of_best";
    pub const NUMBER_OF_BEST_SHORT: &str = "nbest";
    pub const SCORE_FREQUENCY: &str = "score_frequency";
    pub const SCORE_FREQUENCY_SHORT: &str = "sfreq";
    pub const FLUSH_FREQUENCY: &str = "flush_frequency";
    pub const FLUSH_FREQUENCY_SHORT: &str = "ffreq";
    pub const SCORE_FILENAME: &str = "score_filename";
    pub const SCORE_FILENAME_SHORT: &str = "sfile";
    pub const SELECT_SCORES: &str = "select_scores";
    pub const SELECT_SCORES_SHORT: &str = "sscores";
    pub const ELITISM: &str = "elitism";
    pub const ELITISM_SHORT: &str = "el";
    pub const RECORD_DIVERSITY: &str = "record_diversity";
    pub const RECORD_DIVERSITY_SHORT: &str = "recdiv";

    pub(crate) const ALL: &[(&str, &str)] = &[
        (MINIMAXI, MINIMAXI_SHORT),
        (NUMBER_OF_GENERATIONS, NUMBER_OF_GENERATIONS_SHORT),
        (CONVERGENCE_PERCENTAGE, CONVERGENCE_PERCENTAGE_SHORT),
        (GENERATIONS_TO_CONVERGENCE, GENERATIONS_TO_CONVERGENCE_SHORT),
        (CROSSOVER_PROBABILITY, CROSSOVER_PROBABILITY_SHORT),
        (MUTATION_PROBABILITY, MUTATION_PROBABILITY_SHORT),
        (POPULATION_SIZE, POPULATION_SIZE_SHORT),
        (REPLACEMENT_PERCENTAGE, REPLACEMENT_PERCENTAGE_SHORT),
        (REPLACEMENT_NUMBER, REPLACEMENT_NUMBER_SHORT),
        (NUMBER_OF_BEST, NUMBER_OF_BEST_SHORT),
        (SCORE_FREQUENCY, SCORE_FREQUENCY_SHORT),
        (FLUSH_FREQUENCY, FLUSH_FREQUENCY_SHORT),
        (SCORE_FILENAME, SCORE_FILENAME_SHORT),
        (SELECT_SCORES, SELECT_SCORES_SHORT),
        (ELITISM, ELITISM_SHORT),
        (RECORD_DIVERSITY, RECORD_DIVERSITY_SHORT),
    ];

    /// The full name for a full or short parameter name.
    pub fn canonical(name: &str) -> Option<&'static str> {
        ALL.iter()
            .find(|(full, short)| *full == name || *short == name)
            .map(|(full, _)| *full)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParameterValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParameterValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(f) => Some(*f),
            ParameterValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ParameterValue::Bool(_) => "bool",
            ParameterValue::Int(_) => "int",
            ParameterValue::Float(_) => "float",
            ParameterValue::Text(_) => "text",
        }
    }

    /// Parses `text` as a value of the same type as `self`.
    fn parse_like(&self, text: &str) -> Result<ParameterValue> {
        let bad = || GeneticError::Configuration(format!("'{}' is not a valid {}", text, self.kind()));
        Ok(match self {
            ParameterValue::Bool(_) => {
                ParameterValue::Bool(matches!(text, "true" | "True" | "TRUE" | "t" | "T"))
            }
            ParameterValue::Int(_) => ParameterValue::Int(text.parse().map_err(|_| bad())?),
            ParameterValue::Float(_) => ParameterValue::Float(text.parse().map_err(|_| bad())?),
            ParameterValue::Text(_) => ParameterValue::Text(text.to_string()),
        })
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Bool(b) => write!(f, "{}", b),
            ParameterValue::Int(i) => write!(f, "{}", i),
            ParameterValue::Float(x) => write!(f, "{}", x),
            ParameterValue::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub short_name: String,
    pub value: ParameterValue,
}

/// What [`ParameterList::parse`] made of a command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    /// Number of parameters whose values were read.
    pub found: usize,
    /// Arguments that named no parameter, in order.
    pub leftover: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterList {
    parameters: Vec<Parameter>,
}

impl ParameterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.parameters
            .iter()
            .position(|p| p.name == name || p.short_name == name)
    }

    /// Adds a parameter. Returns `false`, leaving the list alone, if either name is taken.
    pub fn add(&mut self, name: &str, short_name: &str, value: ParameterValue) -> bool {
        if self.position(name).is_some() || self.position(short_name).is_some() {
            return false;
        }
        self.parameters.push(Parameter {
            name: name.to_string(),
            short_name: short_name.to_string(),
            value,
        });
        true
    }

    /// The value of the parameter with this full or short name.
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.position(name).map(|i| &self.parameters[i].value)
    }

    /// Sets a parameter's value. The new value must have the parameter's type; an integer
    /// may stand in for a float.
    pub fn set(&mut self, name: &str, value: ParameterValue) -> Result<()> {
        let i = self
            .position(name)
            .ok_or_else(|| GeneticError::Configuration(format!("unknown parameter '{}'", name)))?;
        let slot = &mut self.parameters[i].value;
        let value = match (&*slot, value) {
            (ParameterValue::Float(_), ParameterValue::Int(v)) => ParameterValue::Float(v as f64),
            (current, value) if current.kind() == value.kind() => value,
            (current, value) => {
                return Err(GeneticError::Configuration(format!(
                    "parameter '{}' takes a {}, got a {}",
                    name,
                    current.kind(),
                    value.kind()
                )))
            }
        };
        *slot = value;
        Ok(())
    }

    /// Reads `name value` pairs from `argv`.
    ///
    /// Any argument naming a parameter consumes the next one as its value. Arguments that
    /// name nothing are kept as leftovers; in strict mode each one after the first (the
    /// program name) is also reported. A name without a value, or a value of the wrong
    /// type, is reported and skipped.
    pub fn parse<S: AsRef<str>>(&mut self, argv: &[S], strict: bool) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();
        let mut i = 0;
        while i < argv.len() {
            let arg = argv[i].as_ref();
            let Some(index) = self.position(arg) else {
                if strict && i != 0 {
                    report(&GeneticError::Configuration(format!(
                        "unrecognized argument '{}'",
                        arg
                    )));
                }
                outcome.leftover.push(arg.to_string());
                i += 1;
                continue;
            };
            let Some(text) = argv.get(i + 1) else {
                report(&GeneticError::Configuration(format!(
                    "parameter '{}' has no value",
                    arg
                )));
                break;
            };
            match self.parameters[index].value.parse_like(text.as_ref()) {
                Ok(value) => {
                    self.parameters[index].value = value;
                    outcome.found += 1;
                }
                Err(err) => report(&err),
            }
            i += 2;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ParameterList {
        let mut list = ParameterList::new();
        list.add("number_of_generations", "ngen", ParameterValue::Int(250));
        list.add("mutation_probability", "pmut", ParameterValue::Float(0.01));
        list.add("elitism", "el", ParameterValue::Bool(true));
        list.add("score_filename", "sfile", ParameterValue::Text("g.dat".into()));
        list
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut list = sample();
        assert!(!list.add("ngen", "x", ParameterValue::Int(1)));
        assert!(!list.add("y", "elitism", ParameterValue::Int(1)));
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_set_checks_type() {
        let mut list = sample();
        list.set("pmut", ParameterValue::Int(1)).unwrap();
        assert_eq!(list.get("mutation_probability"), Some(&ParameterValue::Float(1.0)));
        assert!(list.set("ngen", ParameterValue::Text("x".into())).is_err());
        assert_eq!(list.get("ngen"), Some(&ParameterValue::Int(250)));
        assert!(list.set("unknown", ParameterValue::Int(1)).is_err());
    }

    #[test]
    fn test_parse_reads_pairs() {
        let mut list = sample();
        let argv = ["prog", "ngen", "40", "pmut", "0.2", "sfile", "out.dat", "el", "TRUE"];
        let outcome = list.parse(&argv, true);
        assert_eq!(outcome.found, 4);
        assert_eq!(outcome.leftover, vec!["prog".to_string()]);
        assert_eq!(list.get("ngen"), Some(&ParameterValue::Int(40)));
        assert_eq!(list.get("pmut"), Some(&ParameterValue::Float(0.2)));
        assert_eq!(list.get("sfile"), Some(&ParameterValue::Text("out.dat".into())));
        assert_eq!(list.get("el"), Some(&ParameterValue::Bool(true)));
    }

    #[test]
    fn test_parse_skips_bad_values() {
        let mut list = sample();
        let outcome = list.parse(&["ngen", "many", "extra", "pmut"], false);
        assert_eq!(outcome.found, 0);
        assert_eq!(outcome.leftover, vec!["extra".to_string()]);
        assert_eq!(list.get("ngen"), Some(&ParameterValue::Int(250)));
    }

    #[test]
    fn test_bool_spellings() {
        let mut list = sample();
        for (text, expected) in [("t", true), ("True", true), ("yes", false), ("0", false)] {
            list.parse(&["el", text], false);
            assert_eq!(list.get("el"), Some(&ParameterValue::Bool(expected)));
        }
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(names::canonical("popsize"), Some(names::POPULATION_SIZE));
        assert_eq!(names::canonical("elitism"), Some(names::ELITISM));
        assert_eq!(names::canonical("nope"), None);
    }
}
