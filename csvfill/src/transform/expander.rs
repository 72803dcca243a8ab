//! Row expansion: drives a conversion model over its file pairs.
//!
//! For every file pair the expander reads the header record, runs the
//! header hook, writes the prefix, expands every statement for every row,
//! then writes the suffix. Each written unit is
//! `(glue unless first of the run) + text + terminator`.
//!
//! Output is written as it is produced; a failure part way through leaves
//! what was already written in place.

use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::num::NonZeroUsize;

use super::placeholder::{Marker, PlaceholderResolver};
use crate::error::{ConfigError, ResourceResult, RunError, RunResult};
use crate::functions::FunctionRegistry;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::{ConversionModel, FilePair};
use crate::parser::CsvInput;

// =============================================================================
// Resources
// =============================================================================

/// Input reader and output writer opened for one file pair.
pub struct OpenedPair {
    pub input: Box<dyn Read>,
    /// Field delimiter of the input.
    pub delimiter: char,
    pub output: Box<dyn Write>,
}

/// Opens the resources of a file pair.
///
/// Resources are dropped, and thereby closed, when the expander is done
/// with the pair.
pub trait ResourceProvider {
    fn open(&mut self, pair: &FilePair) -> ResourceResult<OpenedPair>;
}

// =============================================================================
// Options & Summary
// =============================================================================

/// Run-time settings that are not part of the model.
#[derive(Debug, Clone, Default)]
pub struct ExpandOptions {
    pub marker: Marker,
    /// Stop after this many statements.
    pub sample: Option<NonZeroUsize>,
    /// Forces the newline policy, overriding the model.
    pub newline_override: Option<bool>,
    /// Replaces the input name of every file pair.
    pub input_override: Option<String>,
    /// Replaces the output name of every file pair.
    pub output_override: Option<String>,
}

/// What a run produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub files_processed: usize,
    pub rows_read: usize,
    pub statements_emitted: usize,
    /// Columns referenced by a placeholder but missing from the input.
    pub absent_columns: BTreeSet<String>,
    /// The sample limit stopped the run.
    pub sample_reached: bool,
}

// =============================================================================
// Expander
// =============================================================================

/// Writes one unit at a time, appending the line terminator.
struct Emitter<'t> {
    writer: Box<dyn Write>,
    terminator: &'t str,
}

impl Emitter<'_> {
    fn emit(&mut self, glue: &str, text: &str) -> std::io::Result<()> {
        self.writer.write_all(glue.as_bytes())?;
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(self.terminator.as_bytes())
    }

    fn finish(mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

/// Expands a [`ConversionModel`] into its output documents.
pub struct RowExpander<'a> {
    model: &'a ConversionModel,
    registry: &'a FunctionRegistry,
    options: ExpandOptions,
}

impl<'a> RowExpander<'a> {
    pub fn new(model: &'a ConversionModel, registry: &'a FunctionRegistry, options: ExpandOptions) -> Self {
        Self { model, registry, options }
    }

    fn terminator(&self) -> &'static str {
        if self.options.newline_override.unwrap_or(self.model.newline()) {
            "\n"
        } else {
            ""
        }
    }

    fn sample_reached(&self, emitted: usize) -> bool {
        self.options.sample.is_some_and(|n| emitted >= n.get())
    }

    /// Run the conversion over every file pair.
    ///
    /// Once the sample limit is reached the current file is finished (suffix
    /// written) and no further file pair is opened.
    pub fn run<P>(&self, provider: &mut P) -> RunResult<RunSummary>
    where
        P: ResourceProvider + ?Sized,
    {
        let input_override = self.options.input_override.as_deref();
        let output_override = self.options.output_override.as_deref();
        self.model.validate(input_override, output_override)?;

        let hook = match self.model.header_hook() {
            Some(name) => Some((
                name,
                self.registry
                    .hook(name)
                    .ok_or_else(|| ConfigError::UnknownHeaderHook(name.to_string()))?,
            )),
            None => None,
        };

        let resolver = PlaceholderResolver::new(self.options.marker, self.registry);
        let mut summary = RunSummary::default();

        for declared in self.model.files() {
            if summary.sample_reached {
                break;
            }

            let pair = declared.with_overrides(input_override, output_override);
            log_info(format!("Converting {} to {}", pair.input, pair.output));

            let opened = provider.open(&pair)?;
            let mut input = CsvInput::new(opened.input, opened.delimiter)?;
            let mut emitter = Emitter {
                writer: opened.output,
                terminator: self.terminator(),
            };

            if let Some((name, hook)) = hook {
                hook(input.headers().names(), self.model).map_err(|source| RunError::HeaderHook {
                    hook: name.to_string(),
                    file: pair.input.clone(),
                    source,
                })?;
            }

            emitter.emit("", self.model.prefix())?;

            'rows: while let Some(row) = input.next_row()? {
                for (index, statement) in self.model.statements().iter().enumerate() {
                    let resolved = resolver.resolve(statement, &row).map_err(|source| RunError::Resolve {
                        file: pair.input.clone(),
                        row: input.rows_read(),
                        statement: index + 1,
                        source,
                    })?;

                    for column in resolved.absent_columns {
                        if !summary.absent_columns.contains(&column) {
                            log_warning(format!("Column '{}' not found in {}, using empty value", column, pair.input));
                            summary.absent_columns.insert(column);
                        }
                    }

                    let glue = if summary.statements_emitted == 0 { "" } else { self.model.glue() };
                    emitter.emit(glue, &resolved.text)?;
                    summary.statements_emitted += 1;

                    if self.sample_reached(summary.statements_emitted) {
                        summary.sample_reached = true;
                        break 'rows;
                    }
                }
            }

            emitter.emit("", self.model.suffix())?;
            emitter.finish()?;

            summary.rows_read += input.rows_read();
            summary.files_processed += 1;
            log_success(format!("{} rows read from {}", input.rows_read(), pair.input));
        }

        Ok(summary)
    }
}
