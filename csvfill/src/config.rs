//! Run configuration.
//!
//! [`RunConfig`] gathers everything a run needs besides the script:
//! command-line switches and the input, output and scripts directories.
//! Directories default to `input`, `output` and `scripts` and can be set
//! through the environment (a `.env` file is honoured by the binary):
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CSVFILL_INPUT_DIR` | `input` |
//! | `CSVFILL_OUTPUT_DIR` | `output` |
//! | `CSVFILL_SCRIPTS_DIR` | `scripts` |

use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::error::{ConfigError, ConfigResult};
use crate::transform::{ExpandOptions, FsResources, Marker, OutputMode};

pub const INPUT_DIR_VAR: &str = "CSVFILL_INPUT_DIR";
pub const OUTPUT_DIR_VAR: &str = "CSVFILL_OUTPUT_DIR";
pub const SCRIPTS_DIR_VAR: &str = "CSVFILL_SCRIPTS_DIR";

const DEFAULT_INPUT_DIR: &str = "input";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Overrides the script's placeholder marker.
    pub marker: Option<Marker>,
    /// Emit only this many statements, to stdout.
    pub sample: Option<NonZeroUsize>,
    /// Mirror the output to stdout.
    pub verbose: bool,
    /// Append to existing output files.
    pub append: bool,
    /// Overrides the model's newline policy.
    pub newline_override: Option<bool>,
    pub input_override: Option<String>,
    pub output_override: Option<String>,
    /// Fixed input delimiter; detected per file when `None`.
    pub delimiter: Option<char>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub scripts_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            marker: None,
            sample: None,
            verbose: false,
            append: false,
            newline_override: None,
            input_override: None,
            output_override: None,
            delimiter: None,
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
        }
    }
}

impl RunConfig {
    /// Defaults, with directories taken from the environment when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let dir = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Self {
            input_dir: dir(INPUT_DIR_VAR, DEFAULT_INPUT_DIR),
            output_dir: dir(OUTPUT_DIR_VAR, DEFAULT_OUTPUT_DIR),
            scripts_dir: dir(SCRIPTS_DIR_VAR, DEFAULT_SCRIPTS_DIR),
            ..Self::default()
        }
    }

    /// Expansion options for a script using `script_marker`.
    pub fn expand_options(&self, script_marker: Marker) -> ExpandOptions {
        ExpandOptions {
            marker: self.marker.unwrap_or(script_marker),
            sample: self.sample,
            newline_override: self.newline_override,
            input_override: self.input_override.clone(),
            output_override: self.output_override.clone(),
        }
    }

    /// Where output goes: stdout only when sampling, file and stdout when
    /// verbose, the file otherwise.
    pub fn output_mode(&self) -> OutputMode {
        if self.sample.is_some() {
            OutputMode::Stdout
        } else if self.verbose {
            OutputMode::FileAndStdout
        } else {
            OutputMode::File
        }
    }

    pub fn resources(&self) -> FsResources {
        FsResources::new(&self.input_dir, &self.output_dir)
            .append(self.append)
            .delimiter(self.delimiter)
            .mode(self.output_mode())
    }
}

/// Parse a sample size; must be a positive integer.
pub fn parse_sample(value: &str) -> ConfigResult<NonZeroUsize> {
    value
        .trim()
        .parse::<NonZeroUsize>()
        .map_err(|_| ConfigError::InvalidSample(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.input_dir, PathBuf::from("input"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.scripts_dir, PathBuf::from("scripts"));
        assert_eq!(config.output_mode(), OutputMode::File);
    }

    #[test]
    fn test_env_lookup() {
        let vars: HashMap<&str, &str> = [(INPUT_DIR_VAR, "/data/in"), (SCRIPTS_DIR_VAR, "  ")].into_iter().collect();
        let config = RunConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.input_dir, PathBuf::from("/data/in"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.scripts_dir, PathBuf::from("scripts"));
    }

    #[test]
    fn test_parse_sample() {
        assert_eq!(parse_sample("3").unwrap().get(), 3);
        assert!(matches!(parse_sample("0"), Err(ConfigError::InvalidSample(_))));
        assert!(parse_sample("-1").is_err());
        assert!(parse_sample("many").is_err());
    }

    #[test]
    fn test_marker_override_and_modes() {
        let mut config = RunConfig::default();
        assert_eq!(config.expand_options(Marker::new('%').unwrap()).marker.as_char(), '%');

        config.marker = Some(Marker::new('#').unwrap());
        config.verbose = true;
        assert_eq!(config.expand_options(Marker::DEFAULT).marker.as_char(), '#');
        assert_eq!(config.output_mode(), OutputMode::FileAndStdout);

        config.sample = NonZeroUsize::new(1);
        assert_eq!(config.output_mode(), OutputMode::Stdout);
    }
}
