//! JSON script documents.
//!
//! A document carries a conversion model plus declarative functions:
//!
//! ```json
//! {
//!   "name": "people",
//!   "model": {
//!     "files": [{"input": "people.csv", "output": "people.xml"}],
//!     "prefix": "<people>",
//!     "statements": ["<person lang=\"~language~\">~name~</person>"],
//!     "suffix": "</people>"
//!   },
//!   "functions": {
//!     "language": {"source": "locale", "operations": [{"type": "substring", "start": 0, "length": 2}]}
//!   },
//!   "required_columns": ["name", "locale"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::ConversionScript;
use crate::error::{ConfigError, ConfigResult, FunctionError, ScriptError, ScriptResult};
use crate::functions::{FunctionDefinition, FunctionRegistry, Operation};
use crate::models::ConversionModel;
use crate::transform::Marker;

/// Header hook registered by documents declaring `required_columns`.
pub const REQUIRE_COLUMNS_HOOK: &str = "require_columns";

/// A conversion script loaded from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptDocument {
    /// Script name; defaults to the file stem when loaded from disk.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Placeholder marker, `~` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<char>,

    pub model: ConversionModel,

    /// Computed functions: name → definition.
    #[serde(default)]
    pub functions: BTreeMap<String, FunctionDefinition>,

    /// Columns every input must have.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_columns: Vec<String>,
}

impl ScriptDocument {
    /// Parse and validate a document.
    pub fn from_json(json: &str) -> ScriptResult<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.validate()?;
        Ok(document)
    }

    /// Load a document from a file.
    pub fn load(path: impl AsRef<Path>) -> ScriptResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut document: Self = serde_json::from_str(&content).map_err(|source| ScriptError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        if document.name.trim().is_empty() {
            document.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default()
                .to_string();
        }

        document.validate()?;
        Ok(document)
    }

    /// Check the marker and every function's operations.
    pub fn validate(&self) -> ScriptResult<()> {
        if let Some(c) = self.marker {
            Marker::new(c)?;
        }
        for (name, function) in &self.functions {
            function.validate(name)?;
        }
        Ok(())
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl ConversionScript for ScriptDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn marker(&self) -> ConfigResult<Marker> {
        self.marker.map_or(Ok(Marker::DEFAULT), Marker::new)
    }

    /// The declared model; `required_columns` installs the column check as
    /// header hook. A hook named by the model runs after the check.
    fn model(&self) -> ConversionModel {
        let model = self.model.clone();
        if self.required_columns.is_empty() {
            model
        } else {
            model.with_header_hook(REQUIRE_COLUMNS_HOOK)
        }
    }

    fn register(&self, registry: &mut FunctionRegistry) -> ScriptResult<()> {
        for (name, function) in &self.functions {
            registry.register_computation(name.clone(), function.clone().into_computation())?;
        }

        if !self.required_columns.is_empty() {
            let required = self.required_columns.clone();
            let chained = match self.model.header_hook() {
                Some(name) if name != REQUIRE_COLUMNS_HOOK => Some(
                    registry
                        .hook(name)
                        .cloned()
                        .ok_or_else(|| ConfigError::UnknownHeaderHook(name.to_string()))?,
                ),
                _ => None,
            };

            registry.register_hook(REQUIRE_COLUMNS_HOOK, move |headers: &[String], model: &ConversionModel| {
                let missing: Vec<&str> = required
                    .iter()
                    .filter(|column| !headers.contains(column))
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    return Err(FunctionError::HeaderRejected(format!(
                        "missing columns: {}",
                        missing.join(", ")
                    )));
                }
                match &chained {
                    Some(hook) => hook(headers, model),
                    None => Ok(()),
                }
            })?;
        }

        Ok(())
    }
}

/// Example document, printed by `csvfill example-script`.
pub fn example_script() -> ScriptDocument {
    let mut functions = BTreeMap::new();
    functions.insert(
        "language".to_string(),
        FunctionDefinition {
            description: "First two letters of the locale".to_string(),
            ..FunctionDefinition::from_source("locale")
                .with_operation(Operation::Trim)
                .with_operation(Operation::Substring { start: 0, length: Some(2) })
                .with_operation(Operation::Lowercase)
        },
    );
    functions.insert(
        "enLocale".to_string(),
        FunctionDefinition {
            description: "English locale for the row's country".to_string(),
            ..FunctionDefinition::from_source("locale")
                .with_operation(Operation::Uppercase)
                .with_operation(Operation::EnsurePrefix { value: "en_".to_string() })
        },
    );

    let model = ConversionModel::builder()
        .files("samplexml.csv", "samplexml.xml")
        .prefix("<things>")
        .statement(concat!(
            "<thing>",
            "<name>~name~</name>",
            "<country>~locale~</country>",
            "<language>~language~</language>",
            "<territory>~upper:locale~</territory>",
            "<created>~iso8601:created_at~</created>",
            "<updated_at>~datetime~</updated_at>",
            "<locale>~enLocale~</locale>",
            "</thing>",
        ))
        .suffix("</things>")
        .build();

    ScriptDocument {
        name: "sampleJson".to_string(),
        description: "Rows of samplexml.csv as <thing> elements".to_string(),
        marker: None,
        model,
        functions,
        required_columns: vec!["name".to_string(), "locale".to_string(), "created_at".to_string()],
    }
}
