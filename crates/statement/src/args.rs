//! Argument checking for dynamically invoked builder methods.

use fluentdb_core::{Document, Error, Result, Value};

/// Positional arguments of one dynamic call.
pub(crate) struct Args<'a> {
    function: String,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub(crate) fn new(function: String, values: &'a [Value]) -> Self {
        Self { function, values }
    }

    pub(crate) fn function(&self) -> &str {
        &self.function
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn all(&self) -> &'a [Value] {
        self.values
    }

    /// Exactly `n` arguments.
    pub(crate) fn exactly(&self, n: usize) -> Result<()> {
        if self.values.len() == n {
            Ok(())
        } else {
            Err(Error::argument_count(&self.function, n, self.values.len()))
        }
    }

    /// Between `min` and `max` arguments inclusive.
    pub(crate) fn between(&self, min: usize, max: usize) -> Result<()> {
        let n = self.values.len();
        if (min..=max).contains(&n) {
            Ok(())
        } else {
            Err(Error::argument_count(
                &self.function,
                format!("{} to {}", min, max),
                n,
            ))
        }
    }

    /// At least `min` arguments.
    pub(crate) fn at_least(&self, min: usize) -> Result<()> {
        let n = self.values.len();
        if n >= min {
            Ok(())
        } else {
            Err(Error::argument_count(
                &self.function,
                format!("at least {}", min),
                n,
            ))
        }
    }

    pub(crate) fn value(&self, index: usize) -> Result<&'a Value> {
        self.values
            .get(index)
            .ok_or_else(|| Error::argument_count(&self.function, index + 1, self.values.len()))
    }

    fn mismatch(&self, index: usize, expected: &str) -> Error {
        Error::type_mismatch(&self.function, index + 1, expected)
    }

    pub(crate) fn string(&self, index: usize) -> Result<&'a str> {
        self.value(index)?
            .as_str()
            .ok_or_else(|| self.mismatch(index, "a string"))
    }

    pub(crate) fn boolean(&self, index: usize) -> Result<bool> {
        self.value(index)?
            .as_bool()
            .ok_or_else(|| self.mismatch(index, "a bool"))
    }

    pub(crate) fn unsigned(&self, index: usize) -> Result<u64> {
        match self.value(index)? {
            Value::Int(i) if *i >= 0 => Ok(*i as u64),
            Value::Float(f) if *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64 => {
                Ok(*f as u64)
            }
            _ => Err(self.mismatch(index, "an unsigned int")),
        }
    }

    pub(crate) fn array(&self, index: usize) -> Result<&'a [Value]> {
        self.value(index)?
            .as_array()
            .ok_or_else(|| self.mismatch(index, "an array"))
    }

    pub(crate) fn document(&self, index: usize) -> Result<&'a Document> {
        self.value(index)?
            .as_object()
            .ok_or_else(|| self.mismatch(index, "a document"))
    }

    /// Array argument whose elements are all strings.
    pub(crate) fn string_array(&self, index: usize) -> Result<Vec<String>> {
        self.array(index)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.mismatch(index, "a string array"))
            })
            .collect()
    }

    /// Either one array of strings or every argument a string.
    pub(crate) fn names(&self) -> Result<Vec<String>> {
        if let [Value::Array(_)] = self.values {
            return self.string_array(0);
        }
        (0..self.values.len())
            .map(|i| {
                self.values[i]
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.mismatch(i, "a string or a list of strings"))
            })
            .collect()
    }
}
