//! Declarative computed functions.
//!
//! A [`FunctionDefinition`] reads its input from the call, or from the row
//! when called as `~name~`, then applies its operations in order:
//!
//! ```json
//! {
//!   "source": "locale",
//!   "operations": [{"type": "trim"}, {"type": "substring", "start": 0, "length": 2}],
//!   "default": "en"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::operations::Operation;
use super::{Argument, Computation};
use crate::error::{FunctionResult, ScriptError, ScriptResult};

/// Input selection plus an operation chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Column read when called with the whole row
    #[serde(default)]
    pub source: Option<String>,

    /// Columns concatenated when called with the whole row
    #[serde(default)]
    pub sources: Option<Vec<String>>,

    /// Separator for `sources` (default: " ")
    #[serde(default = "default_concat_separator")]
    pub concat_separator: String,

    /// Fixed input when called with the whole row
    #[serde(default)]
    pub constant: Option<String>,

    /// Ordered list of operations to apply
    #[serde(default)]
    pub operations: Vec<Operation>,

    /// Value used when the input or the result is empty
    #[serde(default)]
    pub default: Option<String>,

    /// Shown by `csvfill list`
    #[serde(default)]
    pub description: String,
}

fn default_concat_separator() -> String {
    " ".to_string()
}

impl FunctionDefinition {
    /// Read a single column.
    pub fn from_source(source: &str) -> Self {
        Self {
            source: Some(source.to_string()),
            ..Self::empty()
        }
    }

    /// Concatenate several columns, skipping empty ones.
    pub fn from_sources(sources: Vec<String>, separator: &str) -> Self {
        Self {
            sources: Some(sources),
            concat_separator: separator.to_string(),
            ..Self::empty()
        }
    }

    /// Start from a fixed value.
    pub fn from_constant(value: &str) -> Self {
        Self {
            constant: Some(value.to_string()),
            ..Self::empty()
        }
    }

    fn empty() -> Self {
        Self {
            source: None,
            sources: None,
            concat_separator: default_concat_separator(),
            constant: None,
            operations: Vec::new(),
            default: None,
            description: String::new(),
        }
    }

    /// Add an operation to the chain
    pub fn with_operation(mut self, op: Operation) -> Self {
        self.operations.push(op);
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    /// Check every operation of the chain.
    pub fn validate(&self, name: &str) -> ScriptResult<()> {
        for op in &self.operations {
            op.validate().map_err(|message| ScriptError::InvalidOperation {
                function: name.to_string(),
                message,
            })?;
        }
        Ok(())
    }

    /// Evaluate the function.
    pub fn evaluate(&self, argument: Argument<'_>) -> String {
        let input = match argument {
            Argument::Value(value) => value.map(str::to_string),
            Argument::Row(row) => {
                if let Some(source) = &self.source {
                    row.get(source).map(str::to_string)
                } else if let Some(sources) = &self.sources {
                    let parts: Vec<&str> = sources
                        .iter()
                        .filter_map(|s| row.get(s))
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .collect();
                    if parts.is_empty() {
                        None
                    } else {
                        Some(parts.join(&self.concat_separator))
                    }
                } else {
                    self.constant.clone()
                }
            }
        };

        let input = match input {
            Some(v) if !v.trim().is_empty() => v,
            _ => match &self.default {
                Some(default) => default.clone(),
                None => String::new(),
            },
        };

        let result = self
            .operations
            .iter()
            .fold(input, |value, op| op.apply(&value));

        match &self.default {
            Some(default) if result.trim().is_empty() => default.clone(),
            _ => result,
        }
    }

    /// Wrap into a registry computation.
    pub fn into_computation(self) -> Computation {
        Arc::new(move |argument: Argument<'_>| -> FunctionResult<String> {
            Ok(self.evaluate(argument))
        })
    }
}
