//! Error types for the csvfill conversion engine.
//!
//! The hierarchy mirrors the stages of a run:
//!
//! - [`ConfigError`] - invalid model, marker or registry configuration
//! - [`ResourceError`] - input/output files and CSV decoding
//! - [`FunctionError`] - a computed function or header hook failed
//! - [`ResolveError`] - placeholder resolution inside a statement
//! - [`ScriptError`] - locating and loading conversion scripts
//! - [`RunError`] - top-level orchestration errors
//!
//! Conversion is automatic via `From` implementations, so `?` works across
//! error boundaries.

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Fatal configuration problems, detected before or at expansion start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The model declares no file pairs.
    #[error("No input/output file pairs declared")]
    NoFiles,

    /// A file pair has no input file name.
    #[error("No input file specified for file pair {0}")]
    MissingInput(usize),

    /// A file pair has no output file name.
    #[error("No output file specified for file pair {0}")]
    MissingOutput(usize),

    /// The model has no statement templates.
    #[error("No statements declared")]
    NoStatements,

    /// A computed function or hook name was registered twice.
    #[error("Function '{0}' is already registered")]
    DuplicateFunction(String),

    /// The model names a header hook that was never registered.
    #[error("Unknown header hook '{0}'")]
    UnknownHeaderHook(String),

    /// The placeholder marker is unusable.
    #[error("Invalid placeholder marker {0:?}: {1}")]
    InvalidMarker(String, &'static str),

    /// The sample size is not a positive integer.
    #[error("Invalid sample size '{0}'")]
    InvalidSample(String),
}

// =============================================================================
// Resource Errors
// =============================================================================

/// Errors opening, reading or writing the paired input/output resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The input file does not exist.
    #[error("Could not find input file {}", .0.display())]
    InputNotFound(PathBuf),

    /// Failed to open a file.
    #[error("Cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read or write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV record.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input has no header record.
    #[error("Input has no header record")]
    NoHeaders,

    /// Bytes could not be decoded.
    #[error("Failed to decode input: {0}")]
    Encoding(String),
}

// =============================================================================
// Function Errors
// =============================================================================

/// A computed function or header hook failed.
#[derive(Debug, Error)]
pub enum FunctionError {
    /// The input could not be read as a date/time expression.
    #[error("Cannot parse '{0}' as a date/time")]
    InvalidDate(String),

    /// A header hook rejected the input file.
    #[error("Header check failed: {0}")]
    HeaderRejected(String),

    /// Free-form failure raised by a script function.
    #[error("{0}")]
    Failed(String),
}

// =============================================================================
// Resolution Errors
// =============================================================================

/// Errors while resolving placeholders in a statement.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Odd number of markers: a token has no closing marker.
    #[error("Unterminated placeholder starting at byte {position}: {fragment:?}")]
    Unterminated { position: usize, fragment: String },

    /// A substituted value contains the marker and would be rescanned.
    #[error("Value for placeholder '{placeholder}' contains the marker '{marker}'")]
    MarkerInValue { placeholder: String, marker: char },

    /// A computed function invocation failed.
    #[error("Function '{name}' failed: {source}")]
    Function {
        name: String,
        #[source]
        source: FunctionError,
    },
}

// =============================================================================
// Script Errors
// =============================================================================

/// Errors locating or loading conversion scripts.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No script with this name.
    #[error("Could not find script '{0}'")]
    NotFound(String),

    /// Two scripts share a name.
    #[error("Script '{0}' already exists")]
    Duplicate(String),

    /// Script document is not valid JSON for the expected shape.
    #[error("Invalid script {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A declarative operation is malformed.
    #[error("Invalid operation in function '{function}': {message}")]
    InvalidOperation { function: String, message: String },

    /// Registering the script's functions failed.
    #[error("Script configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error while reading scripts.
    #[error("Script IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Script JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Run Errors (top-level)
// =============================================================================

/// Top-level conversion errors.
///
/// This is the error returned by [`crate::transform::RowExpander::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resource error.
    #[error("Resource error: {0}")]
    Resource(#[from] ResourceError),

    /// Script error.
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Placeholder resolution failed for a statement.
    #[error("{file}, row {row}, statement {statement}: {source}")]
    Resolve {
        file: String,
        row: usize,
        statement: usize,
        #[source]
        source: ResolveError,
    },

    /// A header hook failed.
    #[error("Header hook '{hook}' failed on {file}: {source}")]
    HeaderHook {
        hook: String,
        file: String,
        #[source]
        source: FunctionError,
    },
}

impl From<std::io::Error> for RunError {
    fn from(err: std::io::Error) -> Self {
        RunError::Resource(ResourceError::Io(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Result type returned by computed functions and hooks.
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Result type for placeholder resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for script operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Result type for a conversion run.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let config_err = ConfigError::NoFiles;
        let run_err: RunError = config_err.into();
        assert!(run_err.to_string().contains("No input/output"));

        let resource_err = ResourceError::InputNotFound(PathBuf::from("input/a.csv"));
        let run_err: RunError = resource_err.into();
        assert!(run_err.to_string().contains("input/a.csv"));
    }

    #[test]
    fn test_resolve_error_context() {
        let err = RunError::Resolve {
            file: "people.csv".into(),
            row: 3,
            statement: 1,
            source: ResolveError::Unterminated {
                position: 4,
                fragment: "~name".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("people.csv"));
        assert!(msg.contains("row 3"));
        assert!(msg.contains("Unterminated"));
    }
}
