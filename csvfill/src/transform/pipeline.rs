//! High-level API: run a conversion script.
//!
//! # Example
//!
//! ```rust,no_run
//! use csvfill::{run_script, RunConfig, ScriptCatalog};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::from_env();
//!     let catalog = ScriptCatalog::with_dir(&config.scripts_dir);
//!     let summary = run_script(catalog.get("sampleXml")?, &config)?;
//!
//!     println!("{} statements written", summary.statements_emitted);
//!     Ok(())
//! }
//! ```

use super::expander::{ExpandOptions, ResourceProvider, RowExpander, RunSummary};
use crate::config::RunConfig;
use crate::error::{RunResult, ScriptResult};
use crate::functions::FunctionRegistry;
use crate::logs::{log_info, log_success, log_warning};
use crate::models::ConversionModel;
use crate::script::ConversionScript;

/// Build the script's model and register its functions into `registry`.
pub fn prepare_script(
    script: &dyn ConversionScript,
    mut registry: FunctionRegistry,
) -> ScriptResult<(ConversionModel, FunctionRegistry)> {
    script.register(&mut registry)?;
    Ok((script.model(), registry))
}

/// Run `script` against the configured directories.
pub fn run_script(script: &dyn ConversionScript, config: &RunConfig) -> RunResult<RunSummary> {
    let options = config.expand_options(script.marker()?);
    let mut resources = config.resources();
    run_script_with(script, FunctionRegistry::new(), options, &mut resources)
}

/// Run `script` with an explicit registry and resource provider.
pub fn run_script_with<P>(
    script: &dyn ConversionScript,
    registry: FunctionRegistry,
    options: ExpandOptions,
    provider: &mut P,
) -> RunResult<RunSummary>
where
    P: ResourceProvider + ?Sized,
{
    log_info(format!("Running script {}", script.name()));
    let (model, registry) = prepare_script(script, registry)?;

    let summary = RowExpander::new(&model, &registry, options).run(provider)?;

    if !summary.absent_columns.is_empty() {
        let columns: Vec<&str> = summary.absent_columns.iter().map(String::as_str).collect();
        log_warning(format!("Columns missing from input: {}", columns.join(", ")));
    }
    if summary.sample_reached {
        log_info("Sample complete");
    }
    log_success(format!(
        "{} statements from {} rows in {} file(s)",
        summary.statements_emitted, summary.rows_read, summary.files_processed
    ));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{RunError, ScriptError};
    use crate::script::{example_script, SampleXml, ScriptDocument};
    use crate::transform::MemoryResources;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn fixed_registry() -> FunctionRegistry {
        FunctionRegistry::with_clock(Arc::new(|| Utc.with_ymd_and_hms(2024, 3, 15, 12, 30, 45).unwrap()))
    }

    const SAMPLE_CSV: &str = "name,locale,created_at\nAnn,SE,2021-01-05 10:11:12\n";

    #[test]
    fn test_builtin_sample_script() {
        let mut resources = MemoryResources::new().with_input("samplexml.csv", SAMPLE_CSV);
        let summary =
            run_script_with(&SampleXml, fixed_registry(), ExpandOptions::default(), &mut resources).unwrap();

        let xml = resources.output("samplexml.xml").unwrap();
        assert!(xml.starts_with("<things>\n<thing>"));
        assert!(xml.contains("<language>SE</language>"));
        assert!(xml.contains("<created>2021-01-05T10:11:12.000Z</created>"));
        assert!(xml.ends_with("</things>\n"));
        assert_eq!(summary.statements_emitted, 1);
    }

    #[test]
    fn test_example_document_script() {
        let mut resources = MemoryResources::new().with_input("samplexml.csv", SAMPLE_CSV);
        let script = example_script();
        run_script_with(&script, fixed_registry(), ExpandOptions::default(), &mut resources).unwrap();

        let xml = resources.output("samplexml.xml").unwrap();
        assert!(xml.contains("<language>se</language>"));
        assert!(xml.contains("<locale>en_SE</locale>"));
        assert!(xml.contains("<updated_at>"));
    }

    #[test]
    fn test_required_columns_abort_run() {
        let mut resources = MemoryResources::new().with_input("samplexml.csv", "name\nAnn\n");
        let err = run_script_with(&example_script(), fixed_registry(), ExpandOptions::default(), &mut resources)
            .unwrap_err();
        assert!(matches!(err, RunError::HeaderHook { .. }));
    }

    #[test]
    fn test_required_columns_checked_with_model_hook() {
        let script = ScriptDocument::from_json(
            r#"{"model": {"files": [{"input": "a.csv", "output": "a.txt"}], "statements": ["~id~"],
                          "header_hook": "log_headers"},
                "required_columns": ["id", "name"]}"#,
        )
        .unwrap();
        let mut resources = MemoryResources::new().with_input("a.csv", "other\n1\n");

        let err = run_script_with(&script, FunctionRegistry::new(), ExpandOptions::default(), &mut resources)
            .unwrap_err();
        assert!(matches!(err, RunError::HeaderHook { .. }));
        assert!(err.to_string().contains("id, name"));
    }

    #[test]
    fn test_script_registration_error_surfaces() {
        let script = ScriptDocument::from_json(
            r#"{"model": {"files": [{"input": "a.csv", "output": "a.txt"}], "statements": ["x"]},
                "functions": {"lower": {"source": "a"}}}"#,
        )
        .unwrap();
        let mut resources = MemoryResources::new().with_input("a.csv", "a\n1\n");

        let err = run_script_with(&script, FunctionRegistry::new(), ExpandOptions::default(), &mut resources)
            .unwrap_err();
        assert!(matches!(err, RunError::Script(ScriptError::Config(_))));
        assert!(resources.opened().is_empty());
    }
}
