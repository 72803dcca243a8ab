//! Placeholder scanning and substitution.
//!
//! A placeholder is the text between two marker characters:
//!
//! ```text
//! ~name~            column `name`, or function `name` called with the row
//! ~upper:country~   function `upper` called with the value of `country`
//! ```
//!
//! [`PlaceholderResolver::resolve_step`] substitutes the first placeholder
//! of a template; [`PlaceholderResolver::resolve`] repeats until none is
//! left. Markers cannot be escaped.

use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult, ResolveError, ResolveResult};
use crate::functions::{Argument, FunctionRegistry};
use crate::parser::Row;

/// Characters removed from every substituted value.
const STRIPPED_CHARS: &[char] = &['\u{a0}', '\u{fffd}'];

// =============================================================================
// Marker
// =============================================================================

/// The single character delimiting placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(char);

impl Marker {
    pub const DEFAULT: Marker = Marker('~');

    pub fn new(c: char) -> ConfigResult<Self> {
        let reason = if c == ':' {
            "':' separates function and column names"
        } else if c.is_whitespace() {
            "whitespace cannot delimit placeholders"
        } else if c.is_control() {
            "control characters cannot delimit placeholders"
        } else {
            return Ok(Marker(c));
        };
        Err(ConfigError::InvalidMarker(c.to_string(), reason))
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Marker {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Marker::new(c),
            _ => Err(ConfigError::InvalidMarker(s.to_string(), "must be exactly one character")),
        }
    }
}

// =============================================================================
// Tokens
// =============================================================================

/// A placeholder located in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Byte offset of the opening marker.
    pub position: usize,
    /// The placeholder including both markers.
    pub span: String,
    /// Function or column name.
    pub name: String,
    /// Column after `:`, if any.
    pub column: Option<String>,
}

/// Find the first placeholder of `template`.
///
/// Returns `Ok(None)` when the template contains no marker.
pub fn find_token(template: &str, marker: Marker) -> ResolveResult<Option<Token>> {
    let m = marker.as_char();
    let Some(start) = template.find(m) else {
        return Ok(None);
    };

    let body_start = start + m.len_utf8();
    let Some(body_len) = template[body_start..].find(m) else {
        return Err(ResolveError::Unterminated {
            position: start,
            fragment: template[start..].chars().take(40).collect(),
        });
    };

    let body_end = body_start + body_len;
    let body = &template[body_start..body_end];
    let (name, column) = match body.split_once(':') {
        Some((name, column)) => (name, Some(column.to_string())),
        None => (body, None),
    };

    Ok(Some(Token {
        position: start,
        span: template[start..body_end + m.len_utf8()].to_string(),
        name: name.to_string(),
        column,
    }))
}

// =============================================================================
// Resolver
// =============================================================================

/// One performed substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    /// The replaced placeholder, markers included.
    pub placeholder: String,
    /// The function dispatched, `None` for a direct column lookup.
    pub function: Option<String>,
    /// The substituted text.
    pub value: String,
    /// The referenced column, when it is not present in the row.
    pub absent_column: Option<String>,
}

/// A fully resolved template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub text: String,
    /// Number of substitution steps performed.
    pub steps: usize,
    /// Columns referenced but absent from the row, in order of appearance.
    pub absent_columns: Vec<String>,
}

/// Substitutes placeholders using a row and a function registry.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderResolver<'r> {
    marker: Marker,
    registry: &'r FunctionRegistry,
}

impl<'r> PlaceholderResolver<'r> {
    pub fn new(marker: Marker, registry: &'r FunctionRegistry) -> Self {
        Self { marker, registry }
    }

    pub fn marker(&self) -> Marker {
        self.marker
    }

    /// Substitute the first placeholder of `template`.
    ///
    /// Every occurrence of the same placeholder text is replaced. Returns
    /// `Ok(None)` once no marker is left.
    pub fn resolve_step(&self, template: &mut String, row: &Row) -> ResolveResult<Option<Substitution>> {
        let Some(token) = find_token(template, self.marker)? else {
            return Ok(None);
        };

        let argument = match &token.column {
            Some(column) => Argument::Value(row.get(column)),
            None => Argument::Row(row),
        };

        let (function, raw, absent_column) = match self.registry.call(&token.name, argument) {
            Some(result) => {
                let value = result.map_err(|source| ResolveError::Function {
                    name: token.name.clone(),
                    source,
                })?;
                let absent = token.column.clone().filter(|c| !row.contains(c));
                (Some(token.name.clone()), value, absent)
            }
            None => match row.get(&token.name) {
                Some(value) => (None, value.trim().to_string(), None),
                None => (None, String::new(), Some(token.name.clone())),
            },
        };

        let value = clean_value(&raw);
        if value.contains(self.marker.as_char()) {
            return Err(ResolveError::MarkerInValue {
                placeholder: token.span,
                marker: self.marker.as_char(),
            });
        }

        *template = template.replace(&token.span, &value);

        Ok(Some(Substitution {
            placeholder: token.span,
            function,
            value,
            absent_column,
        }))
    }

    /// Substitute placeholders until none is left.
    pub fn resolve(&self, template: &str, row: &Row) -> ResolveResult<Resolved> {
        let mut text = template.to_string();
        let mut steps = 0;
        let mut absent_columns = Vec::new();

        while let Some(substitution) = self.resolve_step(&mut text, row)? {
            steps += 1;
            if let Some(column) = substitution.absent_column {
                absent_columns.push(column);
            }
        }

        Ok(Resolved { text, steps, absent_columns })
    }
}

/// Strip no-break spaces and replacement characters, then trim.
fn clean_value(value: &str) -> String {
    value.replace(STRIPPED_CHARS, "").trim().to_string()
}
