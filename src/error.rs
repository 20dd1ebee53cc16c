use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TomlVarError {
    #[error("Failed to parse toml document: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read {}: {source}", display_origin(.path))]
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },

    #[error("No such toml var: {0}")]
    UnknownVar(String),

    #[error("Invalid value for toml var '{path}': {source}")]
    InvalidValue {
        path: String,
        source: ConversionError,
    },
}

fn display_origin(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => p.display().to_string(),
        None => "<reader>".into(),
    }
}

/// Why a document node could not be written into a variable.
///
/// Meant for humans: each variant carries the raw value and enough shape
/// information to find the offending entry in the document.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversionError {
    #[error("can't convert \"{value}\" ({found}) to {expected}")]
    Mismatch {
        value: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("value {value} out of range for {expected}")]
    OutOfRange { value: i64, expected: &'static str },

    #[error(transparent)]
    Duration(#[from] DurationError),

    #[error("can't deserialize \"{value}\" ({found}): {reason}")]
    Deserialize {
        value: String,
        found: &'static str,
        reason: String,
    },

    #[error("{0}")]
    Custom(String),
}

impl ConversionError {
    /// Build a free-form error for user-defined adapters.
    pub fn custom(reason: impl Into<String>) -> Self {
        ConversionError::Custom(reason.into())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration \"\"")]
    Empty,

    #[error("invalid duration \"{0}\"")]
    Invalid(String),

    #[error("missing unit in duration \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in duration \"{literal}\"")]
    UnknownUnit { unit: String, literal: String },

    #[error("negative duration \"{0}\" is not representable")]
    Negative(String),

    #[error("duration \"{0}\" overflows")]
    Overflow(String),
}
