//! Transformation module.
//!
//! This module turns CSV rows into output documents:
//! - Placeholder: marker, token scanning and substitution
//! - Expander: the per-file, per-row, per-statement loop
//! - Resources: filesystem and in-memory input/output
//! - Pipeline: running a conversion script end to end

pub mod expander;
pub mod pipeline;
pub mod placeholder;
pub mod resources;

pub use expander::{ExpandOptions, OpenedPair, ResourceProvider, RowExpander, RunSummary};
pub use pipeline::{prepare_script, run_script, run_script_with};
pub use placeholder::{find_token, Marker, PlaceholderResolver, Resolved, Substitution, Token};
pub use resources::{FsResources, MemoryResources, OutputMode};
