//! Named placeholder bindings.

use std::collections::BTreeMap;

use fluentdb_core::{Error, Result, Value};

/// Placeholders referenced by a statement and the values bound to them.
#[derive(Debug, Clone, Default)]
pub struct BindTable {
    placeholders: Vec<String>,
    values: BTreeMap<String, Value>,
}

impl BindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record placeholder names, keeping first-appearance order.
    pub fn register<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let name = name.as_ref();
            if !self.placeholders.iter().any(|p| p == name) {
                self.placeholders.push(name.to_string());
            }
        }
    }

    /// Placeholder names in first-appearance order.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Bind `value` to `name`, replacing any earlier value.
    pub fn bind(&mut self, function: &str, name: &str, value: Value) -> Result<()> {
        if !self.placeholders.iter().any(|p| p == name) {
            return Err(Error::invalid_argument(
                function,
                format!("Unable to bind value for unexisting placeholder: {}", name),
            ));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Currently bound value of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Unbound placeholders in first-appearance order.
    pub fn missing(&self) -> Vec<String> {
        self.placeholders
            .iter()
            .filter(|p| !self.values.contains_key(*p))
            .cloned()
            .collect()
    }

    /// Every placeholder with its value, or `MissingBinding`.
    pub fn resolve(&self, function: &str) -> Result<BTreeMap<String, Value>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(Error::MissingBinding {
                function: function.to_string(),
                placeholders: missing,
            });
        }
        Ok(self.values.clone())
    }
}
