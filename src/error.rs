use thiserror::Error;

/// Errors returned by [`crate::Dict`] operations. Each failure mode
/// gets its own variant rather than a shared catch-all code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    #[error("key not found")]
    KeyNotFound,

    #[error("key and value are identical to the existing entry")]
    DuplicateInsert,

    #[error("requested capacity overflows usize")]
    CapacityOverflow,

    #[error("source dictionary was mutated while `update` was walking it")]
    ConcurrentMutation,
}

pub type Result<T> = std::result::Result<T, DictError>;
