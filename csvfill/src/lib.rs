//! # csvfill - expand CSV rows into text documents
//!
//! csvfill converts CSV files into arbitrary text (XML, SQL, fixed-width,
//! ...) by expanding statement templates once per row. Placeholders in a
//! template are replaced by a column value or by the result of a computed
//! function.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Script    │────▶│    Model    │────▶│  Expander   │────▶│   Output    │
//! │ (Rust/JSON) │     │ + functions │     │ (per row)   │     │ (file/tty)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use csvfill::{ConversionModel, ExpandOptions, FunctionRegistry, MemoryResources, RowExpander};
//!
//! let model = ConversionModel::builder()
//!     .files("people.csv", "people.xml")
//!     .prefix("<r>")
//!     .statement("<n>~name~</n><l>~upper:locale~</l>")
//!     .suffix("</r>")
//!     .no_newline()
//!     .build();
//!
//! let registry = FunctionRegistry::new();
//! let mut resources = MemoryResources::new().with_input("people.csv", "name,locale\nAnn,se\n");
//! RowExpander::new(&model, &registry, ExpandOptions::default()).run(&mut resources).unwrap();
//!
//! assert_eq!(resources.output("people.xml").unwrap(), "<r><n>Ann</n><l>SE</l></r>");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Conversion model and builder
//! - [`parser`] - CSV reading with encoding and delimiter detection
//! - [`functions`] - Computed function registry, built-ins, declarative functions
//! - [`transform`] - Placeholder resolution, row expansion, resources
//! - [`script`] - Conversion scripts and the script catalog
//! - [`config`] - Run configuration
//! - [`logs`] - Console logging

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Functions
pub mod functions;

// Transformation
pub mod transform;

// Scripts
pub mod script;

// Configuration & logging
pub mod config;
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    ResourceError,
    FunctionError,
    ResolveError,
    ScriptError,
    RunError,
    RunResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ConversionModel, FilePair, ModelBuilder};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    CsvInput,
    Headers,
    Row,
    detect_encoding,
    detect_delimiter,
    decode_content,
};

// =============================================================================
// Re-exports - Functions
// =============================================================================

pub use functions::{
    Argument,
    Clock,
    Computation,
    FunctionDefinition,
    FunctionRegistry,
    HeaderHook,
    Operation,
    builtin_descriptions,
    operations_description,
    BUILTIN_FUNCTIONS,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    ExpandOptions,
    FsResources,
    Marker,
    MemoryResources,
    OutputMode,
    PlaceholderResolver,
    ResourceProvider,
    RowExpander,
    RunSummary,
    prepare_script,
    run_script,
    run_script_with,
};

// =============================================================================
// Re-exports - Scripts & Config
// =============================================================================

pub use script::{
    ConversionScript,
    ScriptCatalog,
    ScriptDocument,
    ScriptInfo,
    ScriptSource,
    example_script,
};

pub use config::{parse_sample, RunConfig};
