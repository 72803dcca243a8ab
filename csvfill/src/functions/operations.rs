//! String operations for declarative script functions.
//!
//! A JSON script defines a function as a source value followed by an
//! ordered list of these operations.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// All available string operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Pad string at start to reach target length
    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Pad string at end to reach target length
    PadEnd {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Extract year (4 digits) from a date string
    ExtractYear,

    /// Ensure string starts with given prefix
    EnsurePrefix {
        value: String,
    },

    /// Ensure string ends with given suffix
    EnsureSuffix {
        value: String,
    },

    /// Map values using a lookup table
    Map {
        mapping: HashMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        /// Value to use when no mapping matches (none = empty string)
        #[serde(default)]
        default_unmapped: Option<String>,
    },

    /// Take a character range
    Substring {
        start: usize,
        #[serde(default)]
        length: Option<usize>,
    },

    /// Remove all non-alphanumeric characters
    Alphanumeric,

    /// Remove all non-digit characters
    DigitsOnly,
}

fn default_pad_char() -> String {
    "0".to_string()
}

impl Operation {
    /// Apply this operation to a value
    pub fn apply(&self, value: &str) -> String {
        match self {
            Operation::Trim => value.trim().to_string(),
            Operation::Uppercase => value.to_uppercase(),
            Operation::Lowercase => value.to_lowercase(),
            Operation::Replace { pattern, value: replacement } => {
                Self::apply_replace(value, pattern, replacement)
            }
            Operation::PadStart { length, char } => Self::apply_pad(value, *length, char, true),
            Operation::PadEnd { length, char } => Self::apply_pad(value, *length, char, false),
            Operation::ExtractYear => Self::apply_extract_year(value),
            Operation::EnsurePrefix { value: prefix } => {
                if value.starts_with(prefix.as_str()) {
                    value.to_string()
                } else {
                    format!("{}{}", prefix, value)
                }
            }
            Operation::EnsureSuffix { value: suffix } => {
                if value.ends_with(suffix.as_str()) {
                    value.to_string()
                } else {
                    format!("{}{}", value, suffix)
                }
            }
            Operation::Map { mapping, case_insensitive, default_unmapped } => {
                Self::apply_map(value, mapping, *case_insensitive, default_unmapped.as_deref())
            }
            Operation::Substring { start, length } => {
                let chars = value.chars().skip(*start);
                match length {
                    Some(l) => chars.take(*l).collect(),
                    None => chars.collect(),
                }
            }
            Operation::Alphanumeric => value.chars().filter(|c| c.is_alphanumeric()).collect(),
            Operation::DigitsOnly => value.chars().filter(|c| c.is_ascii_digit()).collect(),
        }
    }

    /// Check the operation's parameters, returning a description of the
    /// first problem found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Operation::Replace { pattern, .. } => Regex::new(pattern)
                .map(|_| ())
                .map_err(|e| format!("invalid pattern '{}': {}", pattern, e)),
            Operation::PadStart { char, .. } | Operation::PadEnd { char, .. } if char.is_empty() => {
                Err("pad character must not be empty".to_string())
            }
            _ => Ok(()),
        }
    }

    fn apply_replace(value: &str, pattern: &str, replacement: &str) -> String {
        Regex::new(pattern)
            .map(|re| re.replace_all(value, replacement).into_owned())
            .unwrap_or_else(|_| value.to_string())
    }

    fn apply_pad(value: &str, length: usize, pad_char: &str, at_start: bool) -> String {
        let current = value.chars().count();
        if current >= length {
            return value.to_string();
        }
        let pad = pad_char.chars().next().unwrap_or('0');
        let padding: String = std::iter::repeat_n(pad, length - current).collect();
        if at_start {
            format!("{}{}", padding, value)
        } else {
            format!("{}{}", value, padding)
        }
    }

    fn apply_extract_year(value: &str) -> String {
        Regex::new(r"\d{4}")
            .ok()
            .and_then(|re| re.find(value).map(|m| m.as_str().to_string()))
            .unwrap_or_default()
    }

    fn apply_map(
        value: &str,
        mapping: &HashMap<String, String>,
        case_insensitive: bool,
        default_unmapped: Option<&str>,
    ) -> String {
        let found = if case_insensitive {
            let key = value.to_lowercase();
            mapping.iter().find(|(k, _)| k.to_lowercase() == key).map(|(_, v)| v)
        } else {
            mapping.get(value)
        };

        match found {
            Some(v) => v.clone(),
            None => default_unmapped.unwrap_or_default().to_string(),
        }
    }
}

/// Get a description of all available operations
pub fn operations_description() -> String {
    r#"Available operations for script functions:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| replace | Regex pattern replacement | pattern: regex, value: replacement |
| pad_start | Pad string at start | length: target length, char: pad character (default "0") |
| pad_end | Pad string at end | length: target length, char: pad character (default "0") |
| extract_year | Extract 4-digit year from date | - |
| ensure_prefix | Add prefix if not present | value: prefix string |
| ensure_suffix | Add suffix if not present | value: suffix string |
| map | Map values using lookup table | mapping: {source: target}, case_insensitive: bool, default_unmapped: string |
| substring | Extract characters | start: start index, length: optional length |
| alphanumeric | Keep only alphanumeric chars | - |
| digits_only | Keep only digits | - |

Example operations in JSON:
[
  {"type": "trim"},
  {"type": "replace", "pattern": "[-. ]", "value": ""},
  {"type": "map", "mapping": {"SE": "Sweden", "DE": "Germany"}, "case_insensitive": true},
  {"type": "substring", "start": 0, "length": 2}
]"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_case() {
        assert_eq!(Operation::Trim.apply("  hello  "), "hello");
        assert_eq!(Operation::Uppercase.apply("se"), "SE");
        assert_eq!(Operation::Lowercase.apply("SE"), "se");
    }

    #[test]
    fn test_map() {
        let mut mapping = HashMap::new();
        mapping.insert("SE".to_string(), "Sweden".to_string());
        mapping.insert("DE".to_string(), "Germany".to_string());

        let op = Operation::Map { mapping: mapping.clone(), case_insensitive: true, default_unmapped: None };
        assert_eq!(op.apply("se"), "Sweden");
        assert_eq!(op.apply("xx"), "");

        let op_with_default = Operation::Map { mapping, case_insensitive: false, default_unmapped: Some("Other".to_string()) };
        assert_eq!(op_with_default.apply("se"), "Other");
        assert_eq!(op_with_default.apply("DE"), "Germany");
    }

    #[test]
    fn test_replace_and_validate() {
        let op = Operation::Replace { pattern: "[-. ]".to_string(), value: String::new() };
        assert_eq!(op.apply("T-123.456 7"), "T1234567");
        assert!(op.validate().is_ok());

        let bad = Operation::Replace { pattern: "(".to_string(), value: String::new() };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_padding_counts_chars() {
        let op = Operation::PadStart { length: 5, char: "0".to_string() };
        assert_eq!(op.apply("42"), "00042");
        assert_eq!(op.apply("123456"), "123456");

        let op = Operation::PadEnd { length: 4, char: "·".to_string() };
        assert_eq!(op.apply("é"), "é···");
    }

    #[test]
    fn test_substring() {
        let op = Operation::Substring { start: 0, length: Some(2) };
        assert_eq!(op.apply("sv_SE"), "sv");
        assert_eq!(Operation::Substring { start: 3, length: None }.apply("sv_SE"), "SE");
        assert_eq!(Operation::Substring { start: 10, length: None }.apply("short"), "");
    }

    #[test]
    fn test_extract_year_and_filters() {
        assert_eq!(Operation::ExtractYear.apply("15/03/2024"), "2024");
        assert_eq!(Operation::ExtractYear.apply("no year"), "");
        assert_eq!(Operation::DigitsOnly.apply("123-456"), "123456");
        assert_eq!(Operation::Alphanumeric.apply("a-b c!"), "abc");
    }

    #[test]
    fn test_ensure_prefix_suffix() {
        let op = Operation::EnsurePrefix { value: "T".to_string() };
        assert_eq!(op.apply("123"), "T123");
        assert_eq!(op.apply("T123"), "T123");
        let op = Operation::EnsureSuffix { value: ".xml".to_string() };
        assert_eq!(op.apply("doc"), "doc.xml");
    }

    #[test]
    fn test_deserialize_tagged() {
        let ops: Vec<Operation> = serde_json::from_str(
            r#"[{"type": "trim"}, {"type": "substring", "start": 0, "length": 2}]"#,
        )
        .unwrap();
        assert_eq!(ops[0], Operation::Trim);
        assert_eq!(ops[1], Operation::Substring { start: 0, length: Some(2) });
    }
}
