use std::error::Error;
use std::fmt;

/// Crate error type for GeoPackage optimization runs.
#[derive(Debug)]
pub enum OptimizerError {
    /// Wraps errors returned by `rusqlite`.
    Sql(rusqlite::Error),
    /// Wraps errors returned by the `wkb` crate.
    Wkb(wkb::error::WkbError),
    /// The inline JSON configuration could not be decoded.
    ConfigDecode(serde_json::Error),
    /// Two configured index specifications share the same name.
    DuplicateIndexName {
        name: String,
    },
    /// A configured index specification has an empty column list.
    EmptyIndexColumns {
        name: String,
    },
    /// A table, column, or index name failed the identifier allow-list.
    InvalidIdentifier {
        name: String,
    },
    /// A referenced column does not exist in the target table.
    MissingColumn {
        table: String,
        column: String,
    },
    /// Invalid GeoPackage geometry flags byte.
    InvalidGeometryFlags(u8),
    /// GeoPackage geometry blob is too short for its declared layout.
    InvalidGeometryLength {
        len: usize,
        minimum: usize,
    },
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sql(err) => write!(f, "{err}"),
            Self::Wkb(err) => write!(f, "{err}"),
            Self::ConfigDecode(err) => write!(f, "cannot decode config: {err}"),
            Self::DuplicateIndexName { name } => {
                write!(f, "index name '{name}' was found more than once")
            }
            Self::EmptyIndexColumns { name } => {
                write!(f, "index '{name}' has an empty column list")
            }
            Self::InvalidIdentifier { name } => {
                write!(f, "invalid identifier: '{name}'")
            }
            Self::MissingColumn { table, column } => {
                write!(f, "column '{column}' does not exist in table '{table}'")
            }
            Self::InvalidGeometryFlags(flags) => {
                write!(f, "invalid gpkg geometry flags: {flags:#04x}")
            }
            Self::InvalidGeometryLength { len, minimum } => {
                write!(
                    f,
                    "invalid gpkg geometry length: got {len} bytes, expected at least {minimum}"
                )
            }
        }
    }
}

impl Error for OptimizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sql(err) => Some(err),
            Self::Wkb(err) => Some(err),
            Self::ConfigDecode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for OptimizerError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sql(err)
    }
}

impl From<wkb::error::WkbError> for OptimizerError {
    fn from(err: wkb::error::WkbError) -> Self {
        Self::Wkb(err)
    }
}

impl From<serde_json::Error> for OptimizerError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigDecode(err)
    }
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
