//! The loaded TOML document that variables are read from.
//!
//! A [`Document`] is a parsed `toml::Table` addressed by dotted paths
//! (`"server.port"` walks into the `server` table and reads `port`). The
//! registry never interprets a path itself; it hands the path to
//! [`Document::lookup`] and works with whatever node comes back.
//!
//! Only four node shapes are meaningful to the built-in adapters: booleans,
//! 64-bit integers, floats and strings. Arrays, tables and datetimes are still
//! returned by `lookup`, and every built-in adapter rejects them as the wrong
//! shape.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::TomlVarError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    table: toml::Table,
}

impl Document {
    /// Parse a document from TOML source text.
    pub fn parse(content: &str) -> Result<Self, TomlVarError> {
        let table = content.parse::<toml::Table>()?;
        Ok(Self { table })
    }

    /// Read and parse the file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TomlVarError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| TomlVarError::Io {
            path: Some(path.to_path_buf()),
            source,
        })?;
        Self::parse(&content)
    }

    /// Drain `reader` to the end and parse what it produced.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, TomlVarError> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|source| TomlVarError::Io { path: None, source })?;
        Self::parse(&content)
    }

    /// Find the node at a dotted path (e.g. `"database.url"`).
    ///
    /// A segment may be quoted, as in TOML itself, to reach a key that
    /// contains dots: `servers."eu.west".port`. Returns `None` when any
    /// segment is missing or an intermediate segment is not a table.
    pub fn lookup(&self, dotted_path: &str) -> Option<&toml::Value> {
        let segments = split_path(dotted_path);
        let (leaf, parents) = segments.split_last()?;

        let mut current = &self.table;
        for segment in parents {
            current = current.get(segment.as_str())?.as_table()?;
        }
        current.get(leaf.as_str())
    }

    /// The whole parsed table.
    pub fn table(&self) -> &toml::Table {
        &self.table
    }
}

impl FromStr for Document {
    type Err = TomlVarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<toml::Table> for Document {
    fn from(table: toml::Table) -> Self {
        Self { table }
    }
}

/// Split a dotted path into keys. Dots inside `"..."` or `'...'` belong to
/// the key; the quotes themselves are dropped.
fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote = None;

    for c in path.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '"' | '\'' => quote = Some(c),
                '.' => segments.push(std::mem::take(&mut current)),
                _ => current.push(c),
            },
        }
    }
    segments.push(current);
    segments
}

/// The TOML name of a node's shape, used in conversion errors.
pub(crate) fn shape_name(value: &toml::Value) -> &'static str {
    match value {
        toml::Value::String(_) => "string",
        toml::Value::Integer(_) => "integer",
        toml::Value::Float(_) => "float",
        toml::Value::Boolean(_) => "boolean",
        toml::Value::Datetime(_) => "datetime",
        toml::Value::Array(_) => "array",
        toml::Value::Table(_) => "table",
    }
}

/// Format a node for display, without quoting strings. Arrays and tables
/// use their inline TOML form.
pub(crate) fn format_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        compound => compound.to_string(),
    }
}
