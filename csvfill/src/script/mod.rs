//! Conversion scripts and where to find them.
//!
//! A script supplies a [`ConversionModel`] and registers its computed
//! functions explicitly. Scripts are either Rust types implementing
//! [`ConversionScript`] or JSON [`ScriptDocument`]s read from the scripts
//! directory. The [`ScriptCatalog`] holds both.

pub mod document;
pub mod sample;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigResult, ScriptError, ScriptResult};
use crate::functions::FunctionRegistry;
use crate::logs::log_warning;
use crate::models::ConversionModel;
use crate::transform::Marker;

pub use document::{example_script, ScriptDocument, REQUIRE_COLUMNS_HOOK};
pub use sample::SampleXml;

/// Sub-directory of the scripts directory holding examples, never listed.
const EXAMPLE_DIR: &str = "example";

/// What a conversion script provides.
pub trait ConversionScript {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Placeholder marker; an invalid marker fails the run before any file is opened.
    fn marker(&self) -> ConfigResult<Marker> {
        Ok(Marker::DEFAULT)
    }

    /// Build the conversion model.
    fn model(&self) -> ConversionModel;

    /// Register the script's computed functions and header hooks.
    fn register(&self, _registry: &mut FunctionRegistry) -> ScriptResult<()> {
        Ok(())
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Where a catalog script came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Builtin,
    File(PathBuf),
}

/// Catalog listing entry.
#[derive(Debug, Clone)]
pub struct ScriptInfo {
    pub name: String,
    pub description: String,
    pub source: ScriptSource,
}

struct CatalogEntry {
    script: Box<dyn ConversionScript>,
    source: ScriptSource,
}

/// Scripts available to a run, looked up case-insensitively by name.
pub struct ScriptCatalog {
    scripts: BTreeMap<String, CatalogEntry>,
}

impl ScriptCatalog {
    /// Catalog of the built-in scripts.
    pub fn new() -> Self {
        let mut catalog = Self { scripts: BTreeMap::new() };
        catalog.insert(Box::new(SampleXml), ScriptSource::Builtin);
        catalog
    }

    /// Built-in scripts plus every JSON document under `dir`.
    ///
    /// Sub-directories are searched too, except `example`. Documents that
    /// fail to load are reported and skipped.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let mut catalog = Self::new();
        catalog.load_dir(dir.as_ref());
        catalog
    }

    fn load_dir(&mut self, dir: &Path) {
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();

        for path in paths {
            let hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if hidden {
                continue;
            }

            if path.is_dir() {
                if !path.ends_with(EXAMPLE_DIR) {
                    self.load_dir(&path);
                }
            } else if path.extension().is_some_and(|e| e == "json") {
                match ScriptDocument::load(&path) {
                    Ok(document) => {
                        if self.contains(document.name()) {
                            log_warning(format!(
                                "Script '{}' in {} ignored: name already in use",
                                document.name(),
                                path.display()
                            ));
                        } else {
                            self.insert(Box::new(document), ScriptSource::File(path));
                        }
                    }
                    Err(e) => log_warning(format!("Skipping {}: {}", path.display(), e)),
                }
            }
        }
    }

    fn insert(&mut self, script: Box<dyn ConversionScript>, source: ScriptSource) {
        self.scripts
            .insert(script.name().to_lowercase(), CatalogEntry { script, source });
    }

    /// Add a script; fails if its name is taken.
    pub fn add(&mut self, script: Box<dyn ConversionScript>) -> ScriptResult<()> {
        if self.contains(script.name()) {
            return Err(ScriptError::Duplicate(script.name().to_string()));
        }
        self.insert(script, ScriptSource::Builtin);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.scripts.contains_key(&name.to_lowercase())
    }

    /// Look up a script by name.
    pub fn get(&self, name: &str) -> ScriptResult<&dyn ConversionScript> {
        self.scripts
            .get(&name.to_lowercase())
            .map(|entry| entry.script.as_ref())
            .ok_or_else(|| ScriptError::NotFound(name.to_string()))
    }

    /// Look up a script by name, or load it from a JSON file path.
    pub fn resolve(&mut self, name: &str) -> ScriptResult<&dyn ConversionScript> {
        let path = Path::new(name);
        if !self.contains(name) && path.extension().is_some_and(|e| e == "json") && path.is_file() {
            let document = ScriptDocument::load(path)?;
            let key = document.name().to_lowercase();
            self.scripts.insert(
                key.clone(),
                CatalogEntry { script: Box::new(document), source: ScriptSource::File(path.to_path_buf()) },
            );
            return self.get(&key);
        }
        self.get(name)
    }

    /// All scripts, sorted by name.
    pub fn list(&self) -> Vec<ScriptInfo> {
        self.scripts
            .values()
            .map(|entry| ScriptInfo {
                name: entry.script.name().to_string(),
                description: entry.script.description().to_string(),
                source: entry.source.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

impl Default for ScriptCatalog {
    fn default() -> Self {
        Self::new()
    }
}
