//! Error types reported by `LazyTable` and its collaborators.

use thiserror::Error;

/// Failures reported by [`LazyTable`](crate::LazyTable) operations.
///
/// Every failing operation is a no-op: the table is left exactly as it was.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The key is already present; the existing entry is untouched.
    #[error("key already present in table")]
    DuplicateKey,

    /// Lookup of a key that is not present.
    #[error("key not present in table")]
    OutOfRange,

    /// The slot behind a proxy has been tombstoned.
    #[error("slot has been removed")]
    InvalidState,
}

/// Formatting into a [`FixedString`](crate::FixedString) failed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FixedStringError {
    /// A formatting trait implementation returned `fmt::Error`.
    #[error("formatting failed")]
    Format,
}

/// Failures parsing or generating a [`Uuid`](crate::Uuid).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UuidError {
    #[error("invalid uuid length: expected 36 characters, found {0}")]
    Length(usize),

    #[error("invalid uuid format: expected '-' at byte {0}")]
    MissingHyphen(usize),

    #[error("invalid hex digit at byte {0}")]
    InvalidHex(usize),

    /// The operating system entropy source failed.
    #[error("entropy source failed: {0}")]
    Entropy(String),
}
