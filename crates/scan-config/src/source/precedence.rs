use crate::error::ConfigurationError;
use std::{fmt, str::FromStr};

/// One of the three ways scan material can be supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    File,
    Directory,
    Inline,
}

impl FromStr for SourceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(SourceField::File),
            "directory" | "dir" => Ok(SourceField::Directory),
            "inline" | "str" | "string" => Ok(SourceField::Inline),
            other => Err(format!("Unknown source field: {other}")),
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceField::File => write!(f, "file"),
            SourceField::Directory => write!(f, "directory"),
            SourceField::Inline => write!(f, "inline"),
        }
    }
}

/// Order in which the fields of a source are considered when more than one is set.
///
/// The default is file, then directory, then inline text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence([SourceField; 3]);

impl Precedence {
    pub fn new(order: [SourceField; 3]) -> Result<Self, ConfigurationError> {
        let [a, b, c] = order;
        if a == b || a == c || b == c {
            return Err(ConfigurationError::InvalidPrecedence(format!(
                "each of file, directory and inline must appear exactly once, got {a},{b},{c}"
            )));
        }
        Ok(Self(order))
    }

    pub fn order(&self) -> &[SourceField] {
        &self.0
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Self([SourceField::File, SourceField::Directory, SourceField::Inline])
    }
}

impl FromStr for Precedence {
    type Err = ConfigurationError;

    /// Parses a comma separated order such as `inline,file,directory`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split(',')
            .map(SourceField::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ConfigurationError::InvalidPrecedence)?;

        let order: [SourceField; 3] = fields.try_into().map_err(|fields: Vec<SourceField>| {
            ConfigurationError::InvalidPrecedence(format!(
                "expected 3 fields, got {}",
                fields.len()
            ))
        })?;

        Self::new(order)
    }
}
