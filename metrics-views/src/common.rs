use thiserror::Error as ThisError;

/// Errors that could occur while building a [`ViewDescriptor`](crate::ViewDescriptor).
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum BuildError {
    /// No measure was given.
    #[error("view descriptor has no measure")]
    MissingMeasure,

    /// No aggregation was given.
    #[error("view descriptor has no aggregation")]
    MissingAggregation,

    /// An interval window was given a zero duration.
    #[error("interval aggregation window must be longer than zero")]
    ZeroWindow,

    /// The same column was listed more than once.
    #[error("column '{0}' is listed more than once")]
    DuplicateColumn(String),
}

/// Errors that could occur while registering a measure.
#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum RegisterError {
    /// Measures must be named.
    #[error("measure name must not be empty")]
    EmptyName,

    /// A measure with the same name already exists.
    #[error("measure '{0}' is already registered")]
    AlreadyRegistered(String),
}
