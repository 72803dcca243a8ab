//! CSV input: encoding and delimiter detection, header record, rows.
//!
//! A [`Row`] is an ordered column-name → value mapping built from the
//! header record and one data record. Rows share their [`Headers`].

use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

use crate::error::{ResourceError, ResourceResult};

// =============================================================================
// Headers & Rows
// =============================================================================

/// Column names of an input file, with a name → position index.
#[derive(Debug, Clone, PartialEq)]
pub struct Headers {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Headers {
    pub fn new(names: Vec<String>) -> Self {
        // Later columns win on duplicate names
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One data record keyed by the header names.
///
/// A record shorter than the header leaves the trailing columns absent;
/// cells beyond the header are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    headers: Arc<Headers>,
    values: Vec<String>,
}

impl Row {
    pub fn new(headers: Arc<Headers>, mut values: Vec<String>) -> Self {
        values.truncate(headers.len());
        Self { headers, values }
    }

    /// Build a row from `(column, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<String>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).unzip();
        Self::new(Arc::new(Headers::new(names)), values)
    }

    /// Value of a column, `None` when the column is absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .position(column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Present `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .names()
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

// =============================================================================
// Encoding & Delimiter Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// A leading UTF-8 byte order mark is dropped so it does not end up in
/// the first column name.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ResourceResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => String::from_utf8_lossy(bytes).into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // Unknown labels fall back to lossy UTF-8
        other => match encoding_rs::Encoding::for_label(other.as_bytes()) {
            Some(label) => label.decode(bytes).0.into_owned(),
            None => String::from_utf8_lossy(bytes).into_owned(),
        },
    };

    Ok(decoded.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(decoded))
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Falls back to `,` when no candidate appears.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

// =============================================================================
// Record Stream
// =============================================================================

/// Streams [`Row`]s from a delimited text reader.
///
/// The header record is read on construction. Iteration yields one row per
/// data record; empty lines are skipped.
pub struct CsvInput<R: Read> {
    reader: csv::Reader<R>,
    headers: Arc<Headers>,
    record: csv::StringRecord,
    rows_read: usize,
}

impl<R: Read> CsvInput<R> {
    pub fn new(reader: R, delimiter: char) -> ResourceResult<Self> {
        let delimiter = u8::try_from(delimiter).map_err(|_| {
            ResourceError::Encoding(format!("delimiter {:?} is not a single byte", delimiter))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let names: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if names.is_empty() || names.iter().all(|n| n.is_empty()) {
            return Err(ResourceError::NoHeaders);
        }

        Ok(Self {
            reader,
            headers: Arc::new(Headers::new(names)),
            record: csv::StringRecord::new(),
            rows_read: 0,
        })
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Number of data records read so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Read the next row, `None` at end of input.
    pub fn next_row(&mut self) -> ResourceResult<Option<Row>> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(None);
        }
        self.rows_read += 1;
        let values = self.record.iter().map(str::to_string).collect();
        Ok(Some(Row::new(Arc::clone(&self.headers), values)))
    }
}

impl<R: Read> Iterator for CsvInput<R> {
    type Item = ResourceResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
