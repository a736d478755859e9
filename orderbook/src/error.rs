//! Error kinds raised by the engine.
//!
//! All variants are data errors detected by validating a message before any
//! mutation is applied; the engine never panics on malformed input outside
//! of internal invariants it has already established itself (see the
//! `expect`s on arena handles, which can only dangle if the engine's own
//! bookkeeping is broken).

use thiserror::Error;

/// Errors the engine can raise while applying a message or record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A side character outside `{A, B}` where a concrete side was required.
    #[error("invalid side character '{0}'")]
    InvalidSide(char),

    /// An action character outside the alphabet the book variant accepts.
    #[error("invalid action character '{0}' for this book variant")]
    InvalidAction(char),

    /// `F_TOB` sent to a full-depth book, or a top-of-book add missing `F_TOB`.
    #[error("flag misuse: {0}")]
    FlagMisuse(String),

    /// `Add` referenced an `order_id` already resting in the book.
    #[error("duplicate order id {0}")]
    DuplicateOrder(u64),

    /// `Cancel`/`Modify` referenced an `order_id` not resting in the book.
    #[error("unknown order id {0}")]
    UnknownOrder(u64),

    /// A structural precondition was violated (side switch on modify, add at
    /// `UNDEF_PRICE`, or a cancel/remove amount exceeding the resting size).
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// `Market::apply` received a record shape it does not handle.
    #[error("unsupported record: {0}")]
    UnsupportedRecord(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EngineError>;
