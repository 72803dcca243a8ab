//! Computed functions available to placeholders.
//!
//! - [`FunctionRegistry`] - name → callable dispatch table, plus header hooks
//! - `builtins` - string, locale and date functions every script gets
//! - [`definition`] - declarative functions for JSON scripts
//! - [`operations`] - the string operations declarative functions chain
//!
//! A placeholder `~name~` calls a function with the whole row, while
//! `~name:column~` calls it with the single value of `column`. Every
//! function therefore takes an [`Argument`] and returns a string.

mod builtins;
mod dates;
pub mod definition;
pub mod operations;

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult, FunctionResult};
use crate::models::ConversionModel;
use crate::parser::Row;

pub use builtins::{builtin_descriptions, BUILTIN_FUNCTIONS};
pub use definition::FunctionDefinition;
pub use operations::{operations_description, Operation};

/// What a computed function receives.
#[derive(Debug, Clone, Copy)]
pub enum Argument<'a> {
    /// `~name~`: the whole current row.
    Row(&'a Row),
    /// `~name:column~`: the column's value, `None` if the column is absent.
    Value(Option<&'a str>),
}

impl<'a> Argument<'a> {
    /// The single value, if the function was called with one.
    pub fn value(&self) -> Option<&'a str> {
        match self {
            Argument::Value(v) => *v,
            Argument::Row(_) => None,
        }
    }

    pub fn row(&self) -> Option<&'a Row> {
        match self {
            Argument::Row(row) => Some(row),
            Argument::Value(_) => None,
        }
    }
}

/// A computed function.
pub type Computation = Arc<dyn Fn(Argument<'_>) -> FunctionResult<String> + Send + Sync>;

/// A header hook, called once per input file with its header record.
pub type HeaderHook = Arc<dyn Fn(&[String], &ConversionModel) -> FunctionResult<()> + Send + Sync>;

/// Source of "now" for the date functions.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Name → callable dispatch table.
///
/// Built-in functions are registered on construction. Names are unique:
/// registering a name that already exists, built-in or not, is a
/// configuration error.
pub struct FunctionRegistry {
    functions: BTreeMap<String, Computation>,
    hooks: BTreeMap<String, HeaderHook>,
}

impl FunctionRegistry {
    /// Registry with the built-in functions, using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Registry with the built-in functions, using `clock` for "now".
    pub fn with_clock(clock: Clock) -> Self {
        let mut registry = Self::empty();
        builtins::register_builtins(&mut registry, clock);
        registry
    }

    /// Registry without any function.
    pub fn empty() -> Self {
        Self {
            functions: BTreeMap::new(),
            hooks: BTreeMap::new(),
        }
    }

    /// Register a computed function.
    pub fn register<F>(&mut self, name: impl Into<String>, function: F) -> ConfigResult<()>
    where
        F: Fn(Argument<'_>) -> FunctionResult<String> + Send + Sync + 'static,
    {
        self.register_computation(name, Arc::new(function))
    }

    /// Register an already boxed computation.
    pub fn register_computation(&mut self, name: impl Into<String>, function: Computation) -> ConfigResult<()> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(ConfigError::DuplicateFunction(name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Register a header hook.
    pub fn register_hook<F>(&mut self, name: impl Into<String>, hook: F) -> ConfigResult<()>
    where
        F: Fn(&[String], &ConversionModel) -> FunctionResult<()> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.hooks.contains_key(&name) {
            return Err(ConfigError::DuplicateFunction(name));
        }
        self.hooks.insert(name, Arc::new(hook));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Computation> {
        self.functions.get(name)
    }

    /// Call a function by name; `None` if it is not registered.
    pub fn call(&self, name: &str, argument: Argument<'_>) -> Option<FunctionResult<String>> {
        self.functions.get(name).map(|f| f(argument))
    }

    pub fn hook(&self, name: &str) -> Option<&HeaderHook> {
        self.hooks.get(name)
    }

    /// Registered hook names, sorted.
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.keys().map(String::as_str)
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
