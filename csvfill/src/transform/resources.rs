//! Resource providers: where input rows come from and output goes to.
//!
//! - [`FsResources`] - input/output directories on disk, used by the CLI
//! - [`MemoryResources`] - in-memory inputs and outputs, for embedding and tests

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::expander::{OpenedPair, ResourceProvider};
use crate::error::{ResourceError, ResourceResult};
use crate::logs::log_info_indent;
use crate::models::FilePair;
use crate::parser::{decode_content, detect_delimiter, detect_encoding, format_delimiter};

// =============================================================================
// Output Mode
// =============================================================================

/// Where expanded text is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Write the output file only.
    #[default]
    File,
    /// Write the output file and mirror everything to stdout.
    FileAndStdout,
    /// Write to stdout only; no output file is opened.
    Stdout,
}

/// Writes to a primary writer and mirrors what was accepted to a second one.
struct Tee<A: Write, B: Write> {
    primary: A,
    mirror: B,
}

impl<A: Write, B: Write> Write for Tee<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        self.mirror.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.mirror.flush()
    }
}

// =============================================================================
// Filesystem
// =============================================================================

/// Opens file pairs relative to an input and an output directory.
///
/// Inputs are read whole, their encoding detected and decoded to UTF-8.
/// The output directory is created on first use.
#[derive(Debug, Clone)]
pub struct FsResources {
    input_dir: PathBuf,
    output_dir: PathBuf,
    append: bool,
    delimiter: Option<char>,
    mode: OutputMode,
}

impl FsResources {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            append: false,
            delimiter: None,
            mode: OutputMode::File,
        }
    }

    /// Append to existing output files instead of truncating them.
    pub fn append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Use a fixed delimiter instead of detecting one per input.
    pub fn delimiter(mut self, delimiter: Option<char>) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn open_input(&self, name: &str) -> ResourceResult<(Cursor<Vec<u8>>, char)> {
        let path = self.input_dir.join(name);
        if !path.is_file() {
            return Err(ResourceError::InputNotFound(path));
        }

        let bytes = fs::read(&path).map_err(|source| ResourceError::Open { path: path.clone(), source })?;
        let encoding = detect_encoding(&bytes);
        let content = decode_content(&bytes, &encoding)?;
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(&content));

        log_info_indent(format!("Encoding: {}", encoding), 1);
        log_info_indent(
            format!(
                "Delimiter: '{}'{}",
                format_delimiter(delimiter),
                if self.delimiter.is_none() { " (auto-detected)" } else { "" }
            ),
            1,
        );

        Ok((Cursor::new(content.into_bytes()), delimiter))
    }

    fn open_output(&self, name: &str) -> ResourceResult<Box<dyn Write>> {
        if self.mode == OutputMode::Stdout {
            return Ok(Box::new(io::stdout()));
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| ResourceError::Open {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(self.append)
            .truncate(!self.append)
            .open(&path)
            .map_err(|source| ResourceError::Open { path, source })?;
        let file = BufWriter::new(file);

        Ok(match self.mode {
            OutputMode::FileAndStdout => Box::new(Tee { primary: file, mirror: io::stdout() }),
            _ => Box::new(file),
        })
    }
}

impl ResourceProvider for FsResources {
    fn open(&mut self, pair: &FilePair) -> ResourceResult<OpenedPair> {
        let (input, delimiter) = self.open_input(&pair.input)?;
        let output = self.open_output(&pair.output)?;
        Ok(OpenedPair { input: Box::new(input), delimiter, output })
    }
}

// =============================================================================
// In-memory
// =============================================================================

/// An output buffer shared between the provider and the writer it hands out.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Inputs and outputs held in memory, keyed by file name.
///
/// Opening an output that already exists truncates it unless appending.
#[derive(Default)]
pub struct MemoryResources {
    inputs: BTreeMap<String, String>,
    outputs: BTreeMap<String, SharedBuffer>,
    delimiter: Option<char>,
    append: bool,
    opened: Vec<FilePair>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), content.into());
        self
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_append(mut self, append: bool) -> Self {
        self.append = append;
        self
    }

    /// Text written to an output, `None` if it was never opened.
    pub fn output(&self, name: &str) -> Option<String> {
        self.outputs
            .get(name)
            .map(|buffer| String::from_utf8_lossy(&buffer.0.borrow()).into_owned())
    }

    /// File pairs opened so far, in order.
    pub fn opened(&self) -> &[FilePair] {
        &self.opened
    }
}

impl ResourceProvider for MemoryResources {
    fn open(&mut self, pair: &FilePair) -> ResourceResult<OpenedPair> {
        let content = self
            .inputs
            .get(&pair.input)
            .ok_or_else(|| ResourceError::InputNotFound(PathBuf::from(&pair.input)))?;
        let delimiter = self.delimiter.unwrap_or_else(|| detect_delimiter(content));
        let input = Cursor::new(content.clone().into_bytes());

        let buffer = self.outputs.entry(pair.output.clone()).or_default();
        if !self.append {
            buffer.0.borrow_mut().clear();
        }
        let output = buffer.clone();

        self.opened.push(pair.clone());
        Ok(OpenedPair { input: Box::new(input), delimiter, output: Box::new(output) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn read_all(mut opened: OpenedPair) -> String {
        let mut text = String::new();
        opened.input.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_fs_missing_input() {
        let dir = TempDir::new().unwrap();
        let mut resources = FsResources::new(dir.path().join("input"), dir.path().join("output"));

        let err = resources.open(&FilePair::new("nope.csv", "out.txt")).err().unwrap();
        assert!(matches!(err, ResourceError::InputNotFound(_)));
    }

    #[test]
    fn test_fs_creates_output_dir_and_detects_delimiter() {
        let dir = TempDir::new().unwrap();
        let input_dir = dir.path().join("input");
        fs::create_dir_all(&input_dir).unwrap();
        fs::write(input_dir.join("in.csv"), "a;b;c\n1;2;3\n").unwrap();

        let output_dir = dir.path().join("nested").join("output");
        let mut resources = FsResources::new(&input_dir, &output_dir);

        let mut opened = resources.open(&FilePair::new("in.csv", "out.txt")).unwrap();
        assert_eq!(opened.delimiter, ';');
        opened.output.write_all(b"hello").unwrap();
        opened.output.flush().unwrap();
        drop(opened);

        assert_eq!(fs::read_to_string(output_dir.join("out.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_fs_decodes_latin1_input() {
        let dir = TempDir::new().unwrap();
        // "name\nJosé Müller\n" in ISO-8859-1
        let bytes: Vec<u8> = b"name\nJos\xe9 M\xfcller\n".to_vec();
        fs::write(dir.path().join("in.csv"), bytes).unwrap();

        let mut resources = FsResources::new(dir.path(), dir.path().join("out"));
        let opened = resources.open(&FilePair::new("in.csv", "out.txt")).unwrap();
        assert!(read_all(opened).contains("Jos"));
    }

    #[test]
    fn test_fs_append_vs_truncate() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("in.csv"), "a\n1\n").unwrap();
        let out = dir.path().join("out");
        let pair = FilePair::new("in.csv", "out.txt");

        for append in [false, true] {
            let mut resources = FsResources::new(dir.path(), &out).append(append);
            let mut opened = resources.open(&pair).unwrap();
            opened.output.write_all(b"x").unwrap();
            opened.output.flush().unwrap();
        }
        assert_eq!(fs::read_to_string(out.join("out.txt")).unwrap(), "xx");

        let mut resources = FsResources::new(dir.path(), &out);
        let mut opened = resources.open(&pair).unwrap();
        opened.output.write_all(b"y").unwrap();
        opened.output.flush().unwrap();
        drop(opened);
        assert_eq!(fs::read_to_string(out.join("out.txt")).unwrap(), "y");
    }

    #[test]
    fn test_fs_stdout_mode_opens_no_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("in.csv"), "a\n1\n").unwrap();
        let out = dir.path().join("out");

        let mut resources = FsResources::new(dir.path(), &out).mode(OutputMode::Stdout);
        resources.open(&FilePair::new("in.csv", "out.txt")).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn test_memory_fixed_delimiter_wins() {
        let mut resources = MemoryResources::new()
            .with_input("a.csv", "a,b;c\n1,2;3\n")
            .with_delimiter(';');
        let opened = resources.open(&FilePair::new("a.csv", "a.txt")).unwrap();
        assert_eq!(opened.delimiter, ';');

        let opened = MemoryResources::new()
            .with_input("a.csv", "a,b;c\n1,2;3\n")
            .open(&FilePair::new("a.csv", "a.txt"))
            .unwrap();
        assert_eq!(opened.delimiter, ',');
    }

    #[test]
    fn test_fixed_delimiter_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("in.csv"), "a;b\n1;2\n").unwrap();

        let mut resources = FsResources::new(dir.path(), dir.path().join("out")).delimiter(Some('|'));
        let opened = resources.open(&FilePair::new("in.csv", "out.txt")).unwrap();
        assert_eq!(opened.delimiter, '|');
    }

    #[test]
    fn test_memory_append() {
        let mut resources = MemoryResources::new().with_input("in.csv", "a\n1\n").with_append(true);
        let pair = FilePair::new("in.csv", "out.txt");

        for text in ["one", "two"] {
            let mut opened = resources.open(&pair).unwrap();
            opened.output.write_all(text.as_bytes()).unwrap();
        }
        assert_eq!(resources.output("out.txt").unwrap(), "onetwo");
        assert_eq!(resources.opened().len(), 2);
    }
}
