//! Error types shared by the commitment and accumulator layers.

use thiserror::Error;

/// Raised when caller-supplied bytes cannot be interpreted as a field element.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedInputError {
    #[error("field element must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("value is not a canonical field element (>= modulus)")]
    OutOfRange,
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("{0} must not be zero")]
    Zero(&'static str),
}

/// Errors raised by the Merkle accumulator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccumulatorError {
    #[error("accumulator is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },
    #[error("leaf {index} has not been inserted (tree holds {len} leaves)")]
    LeafNotFound { index: u64, len: u64 },
    #[error("the zero element is reserved for padding and cannot be inserted")]
    ZeroLeaf,
    #[error("tree depth must be between 1 and {max}, got {depth}")]
    InvalidDepth { depth: usize, max: usize },
}
