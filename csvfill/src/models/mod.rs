//! Conversion model: what a script asks the engine to produce.
//!
//! - [`FilePair`] - one input CSV and the document it becomes
//! - [`ConversionModel`] - immutable description of a conversion
//! - [`ModelBuilder`] - fluent builder returning a [`ConversionModel`]
//!
//! Models are built once per run and never change after expansion starts.
//! Validation is deferred to [`ConversionModel::validate`], which the
//! expander calls before opening any file.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// File Pairs
// =============================================================================

/// An input CSV file and the output document it is expanded into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePair {
    /// Input file name, relative to the input directory.
    #[serde(default)]
    pub input: String,
    /// Output file name, relative to the output directory.
    #[serde(default)]
    pub output: String,
}

impl FilePair {
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self { input: input.into(), output: output.into() }
    }

    /// Apply command-line style overrides to this pair.
    pub fn with_overrides(&self, input: Option<&str>, output: Option<&str>) -> Self {
        Self {
            input: input.map(str::to_string).unwrap_or_else(|| self.input.clone()),
            output: output.map(str::to_string).unwrap_or_else(|| self.output.clone()),
        }
    }
}

// =============================================================================
// Conversion Model
// =============================================================================

/// Immutable description of a conversion.
///
/// The output of a run is
/// `prefix + glue-joined expanded statements + suffix`,
/// where every emitted unit is followed by the line terminator when
/// `newline` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionModel {
    #[serde(default)]
    files: Vec<FilePair>,
    #[serde(default)]
    prefix: String,
    #[serde(default)]
    suffix: String,
    #[serde(default)]
    glue: String,
    #[serde(default = "default_newline")]
    newline: bool,
    #[serde(default)]
    statements: Vec<String>,
    #[serde(default)]
    header_hook: Option<String>,
}

fn default_newline() -> bool {
    true
}

impl ConversionModel {
    /// Start building a model.
    pub fn builder() -> ModelBuilder {
        ModelBuilder::new()
    }

    pub fn files(&self) -> &[FilePair] {
        &self.files
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn glue(&self) -> &str {
        &self.glue
    }

    pub fn newline(&self) -> bool {
        self.newline
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn header_hook(&self) -> Option<&str> {
        self.header_hook.as_deref()
    }

    /// Same model with `name` as header hook.
    pub fn with_header_hook(mut self, name: impl Into<String>) -> Self {
        self.header_hook = Some(name.into());
        self
    }

    /// Check the model is complete enough to run.
    ///
    /// Input and output overrides replace the names declared in every
    /// pair, so a pair missing a name is accepted when an override fills it.
    pub fn validate(&self, input_override: Option<&str>, output_override: Option<&str>) -> ConfigResult<()> {
        if self.files.is_empty() {
            return Err(ConfigError::NoFiles);
        }

        for (i, pair) in self.files.iter().enumerate() {
            let pair = pair.with_overrides(input_override, output_override);
            if pair.input.trim().is_empty() {
                return Err(ConfigError::MissingInput(i + 1));
            }
            if pair.output.trim().is_empty() {
                return Err(ConfigError::MissingOutput(i + 1));
            }
        }

        if self.statements.is_empty() {
            return Err(ConfigError::NoStatements);
        }

        Ok(())
    }
}

impl Default for ConversionModel {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            prefix: String::new(),
            suffix: String::new(),
            glue: String::new(),
            newline: default_newline(),
            statements: Vec::new(),
            header_hook: None,
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent builder for [`ConversionModel`].
///
/// ```
/// use csvfill::ConversionModel;
///
/// let model = ConversionModel::builder()
///     .files("people.csv", "people.xml")
///     .prefix("<people>")
///     .statement("<person>~name~</person>")
///     .suffix("</people>")
///     .build();
///
/// assert_eq!(model.statements().len(), 1);
/// assert!(model.newline());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    model: ConversionModel,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one input/output pair.
    pub fn files(mut self, input: impl Into<String>, output: impl Into<String>) -> Self {
        self.model.files.push(FilePair::new(input, output));
        self
    }

    /// Add several input/output pairs.
    pub fn file_pairs<I>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = FilePair>,
    {
        self.model.files.extend(pairs);
        self
    }

    /// Append a statement template.
    pub fn statement(mut self, template: impl Into<String>) -> Self {
        self.model.statements.push(template.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.model.prefix = prefix.into();
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.model.suffix = suffix.into();
        self
    }

    pub fn glue(mut self, glue: impl Into<String>) -> Self {
        self.model.glue = glue.into();
        self
    }

    pub fn newline(mut self, newline: bool) -> Self {
        self.model.newline = newline;
        self
    }

    pub fn no_newline(self) -> Self {
        self.newline(false)
    }

    /// Name a header hook to call with the header record of every input.
    pub fn header_hook(mut self, name: impl Into<String>) -> Self {
        self.model.header_hook = Some(name.into());
        self
    }

    pub fn build(self) -> ConversionModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chaining() {
        let model = ConversionModel::builder()
            .files("a.csv", "a.xml")
            .file_pairs(vec![FilePair::new("b.csv", "b.xml")])
            .prefix("<r>")
            .suffix("</r>")
            .glue(",")
            .statement("~a~")
            .statement("~b~")
            .no_newline()
            .header_hook("log_headers")
            .build();

        assert_eq!(model.files().len(), 2);
        assert_eq!(model.files()[1].input, "b.csv");
        assert_eq!(model.prefix(), "<r>");
        assert_eq!(model.suffix(), "</r>");
        assert_eq!(model.glue(), ",");
        assert_eq!(model.statements(), ["~a~", "~b~"]);
        assert!(!model.newline());
        assert_eq!(model.header_hook(), Some("log_headers"));
    }

    #[test]
    fn test_validate_missing_parts() {
        let empty = ConversionModel::builder().statement("x").build();
        assert!(matches!(empty.validate(None, None), Err(ConfigError::NoFiles)));

        let no_output = ConversionModel::builder().files("a.csv", "").statement("x").build();
        assert!(matches!(no_output.validate(None, None), Err(ConfigError::MissingOutput(1))));

        let no_statements = ConversionModel::builder().files("a.csv", "a.txt").build();
        assert!(matches!(no_statements.validate(None, None), Err(ConfigError::NoStatements)));
    }

    #[test]
    fn test_validate_override_fills_pair() {
        let model = ConversionModel::builder().files("", "a.txt").statement("x").build();
        assert!(model.validate(None, None).is_err());
        assert!(model.validate(Some("other.csv"), None).is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let model: ConversionModel = serde_json::from_str(
            r#"{"files": [{"input": "a.csv", "output": "a.txt"}], "statements": ["~x~"]}"#,
        )
        .unwrap();
        assert!(model.newline());
        assert_eq!(model.glue(), "");
        assert_eq!(model.header_hook(), None);
    }
}
