//! Raw execution results returned by a session collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::Value;

/// Severity of a collaborator warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningLevel {
    Note,
    Warning,
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningLevel::Note => write!(f, "Note"),
            WarningLevel::Warning => write!(f, "Warning"),
        }
    }
}

/// Warning attached to an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub level: WarningLevel,
    pub code: u32,
    pub message: String,
}

impl Warning {
    /// Warning-level entry
    pub fn warning(code: u32, message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Warning,
            code,
            message: message.into(),
        }
    }

    /// Note-level entry
    pub fn note(code: u32, message: impl Into<String>) -> Self {
        Self {
            level: WarningLevel::Note,
            code,
            message: message.into(),
        }
    }
}

/// Records produced by an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum RawData {
    /// Write statements
    #[default]
    None,
    /// Collection reads
    Documents(Vec<Value>),
    /// Table reads and SQL
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

/// Outcome of [`Session::run_statement`](crate::Session::run_statement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawResult {
    pub affected_items: u64,
    pub auto_increment: Option<u64>,
    pub data: RawData,
    pub warnings: Vec<Warning>,
}

impl RawResult {
    /// Write outcome touching `affected_items` records.
    pub fn affected(affected_items: u64) -> Self {
        Self {
            affected_items,
            ..Self::default()
        }
    }

    /// Document read outcome.
    pub fn documents(docs: Vec<Value>) -> Self {
        Self {
            data: RawData::Documents(docs),
            ..Self::default()
        }
    }

    /// Row read outcome.
    pub fn rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            data: RawData::Rows { columns, rows },
            ..Self::default()
        }
    }

    /// Attach warnings.
    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }
}
