//! Typed access to the open hyperparameter mapping.
//!
//! Each model variant declares the keys it understands; [`ParamReader`]
//! pulls them out with type and range checks and refuses any key the
//! variant did not ask for.

use std::collections::BTreeSet;

use super::schema::{Hyperparameters, ParamValue};
use crate::error::{PipelineError, Result};

/// Reads typed values for one model variant
pub struct ParamReader<'a> {
    model: &'static str,
    params: &'a Hyperparameters,
    seen: BTreeSet<&'a str>,
}

impl<'a> ParamReader<'a> {
    pub fn new(model: &'static str, params: &'a Hyperparameters) -> Self {
        Self {
            model,
            params,
            seen: BTreeSet::new(),
        }
    }

    fn invalid(&self, name: &str, reason: impl Into<String>) -> PipelineError {
        PipelineError::InvalidHyperparameter {
            model: self.model,
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    fn get(&mut self, name: &'a str) -> Option<&'a ParamValue> {
        self.seen.insert(name);
        self.params.get(name)
    }

    /// Float parameter; integers are widened
    pub fn float(&mut self, name: &'a str, default: f64, valid: impl Fn(f64) -> bool, rule: &str) -> Result<f64> {
        let value = match self.get(name) {
            None => return Ok(default),
            Some(ParamValue::Float(x)) => *x,
            Some(ParamValue::Int(i)) => *i as f64,
            Some(other) => return Err(self.invalid(name, format!("expected a number, got {}", other))),
        };
        if valid(value) {
            Ok(value)
        } else {
            Err(self.invalid(name, format!("{} must be {}", value, rule)))
        }
    }

    /// Non-negative integer parameter with a lower bound
    pub fn usize_at_least(&mut self, name: &'a str, default: usize, min: usize) -> Result<usize> {
        Ok(self.optional_usize_at_least(name, min)?.unwrap_or(default))
    }

    /// Integer parameter without a default (absent means unbounded)
    pub fn optional_usize_at_least(&mut self, name: &'a str, min: usize) -> Result<Option<usize>> {
        let value = match self.get(name) {
            None => return Ok(None),
            Some(ParamValue::Int(i)) => *i,
            Some(other) => return Err(self.invalid(name, format!("expected an integer, got {}", other))),
        };
        if value < min as i64 {
            return Err(self.invalid(name, format!("{} must be >= {}", value, min)));
        }
        Ok(Some(value as usize))
    }

    pub fn boolean(&mut self, name: &'a str, default: bool) -> Result<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Bool(b)) => Ok(*b),
            Some(other) => Err(self.invalid(name, format!("expected a boolean, got {}", other))),
        }
    }

    /// String parameter restricted to a fixed set of choices
    pub fn choice(&mut self, name: &'a str, default: &'static str, allowed: &[&'static str]) -> Result<&'static str> {
        match self.get(name) {
            None => Ok(default),
            Some(ParamValue::Str(s)) => allowed
                .iter()
                .copied()
                .find(|a| a == s)
                .ok_or_else(|| self.invalid(name, format!("'{}' is not one of {}", s, allowed.join(", ")))),
            Some(other) => Err(self.invalid(name, format!("expected a string, got {}", other))),
        }
    }

    /// Fail on any key no accessor asked for
    pub fn finish(self) -> Result<()> {
        match self.params.keys().find(|k| !self.seen.contains(k.as_str())) {
            Some(unknown) => Err(self.invalid(unknown, "unknown parameter")),
            None => Ok(()),
        }
    }
}
