//! Error taxonomy for the engine's load-time failure surfaces.
//!
//! Only the handful of failures that must reach a caller are represented
//! here. Runtime out-of-bounds access is `Option`, not `Result` (see
//! `Map::cell`); logic-invariant violations (self-chain, redundant
//! activation) are silently rejected at the call site.

use thiserror::Error;

/// Failures raised while building a [`crate::map::Map`] from a text layout.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapLayoutError {
    #[error("map layout has no 'S' start cell")]
    MissingStart,

    #[error("map layout has no 'E' exit cell")]
    MissingEnd,

    #[error("row {row} has width {width}, exceeding the layout's first row width {max_width}")]
    RowTooLong {
        row: usize,
        width: usize,
        max_width: usize,
    },
}

/// Raised when code asks a [`crate::config::Value`] for a concrete type it
/// does not hold.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: &'static str, found: &'static str },
}
