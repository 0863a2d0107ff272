use std::fmt::Display;

/// Errors raised while compiling a nested projection, resolving column paths
/// against the in-memory store, or decoding rows.
#[derive(Debug, Clone, PartialEq)]
pub enum NestedValuesError {
    UnknownCollection(String),
    UnknownColumn { path: String, segment: String },
    /// The discriminator of a nested level names no field of that level.
    UnknownDiscriminator(String),
    /// A compiled index points past the end of the row it is decoding.
    RowTooShort { index: usize, len: usize },
    InvalidLookup(String),
    LockPoisoned,
    Io(String),
    Other(String),
}

impl Display for NestedValuesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NestedValuesError::UnknownCollection(name) => write!(f, "unknown collection '{name}'"),
            NestedValuesError::UnknownColumn { path, segment } =>
                write!(f, "cannot resolve '{segment}' in column path '{path}'"),
            NestedValuesError::UnknownDiscriminator(key) =>
                write!(f, "discriminator '{key}' is not an output key of its level"),
            NestedValuesError::RowTooShort { index, len } =>
                write!(f, "row has {len} values but index {index} was requested"),
            NestedValuesError::InvalidLookup(message) => write!(f, "invalid lookup: {message}"),
            NestedValuesError::LockPoisoned => f.write_str("collection lock poisoned"),
            NestedValuesError::Io(message) => write!(f, "io error: {message}"),
            NestedValuesError::Other(message) => f.write_str(message),
        }
    }
}

impl std::error::Error for NestedValuesError {}

impl<T> From<std::sync::PoisonError<T>> for NestedValuesError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        NestedValuesError::LockPoisoned
    }
}

impl From<regex::Error> for NestedValuesError {
    fn from(value: regex::Error) -> Self {
        NestedValuesError::InvalidLookup(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NestedValuesError>;
