//! Error type shared by the object model, the patch interpreter and the CLI.

use thiserror::Error;

use crate::patch::Opcode;
use crate::value::ValueType;

/// Every failure aborts the whole patch application; there is no partial
/// result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MendozaError {
    // ── Decode errors ─────────────────────────────────────────────────────
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    #[error("missing operand for {0:?}")]
    MissingOperand(Opcode),
    #[error("invalid operand for {opcode:?}: expected {expected}")]
    InvalidOperand { opcode: Opcode, expected: &'static str },
    #[error("stack underflow in {0:?}")]
    StackUnderflow(Opcode),
    #[error("invalid patch: {0}")]
    InvalidPatch(String),
    #[error("blank entry finalized without being written")]
    UnwrittenBlank,

    // ── Bounds errors ─────────────────────────────────────────────────────
    #[error("key index {index} out of range ({len} keys)")]
    KeyIndexOutOfRange { index: usize, len: usize },
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("element index {index} out of range (length {len})")]
    ElementOutOfRange { index: usize, len: usize },
    #[error("slice [{left}, {right}) out of range (length {len})")]
    SliceOutOfRange { left: usize, right: usize, len: usize },
    #[error("splitting string out of bounds")]
    StringOutOfBounds,
    #[error("byte offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    // ── Shape errors ──────────────────────────────────────────────────────
    #[error("expected {expected}, found {actual}")]
    ShapeMismatch { expected: ValueType, actual: ValueType },

    // ── Internal consistency ──────────────────────────────────────────────
    #[error("bug: mismatch between string parts and use")]
    BrokenPartUse,

    #[error("{0:?} is not supported")]
    Unsupported(Opcode),
}

pub type Result<T, E = MendozaError> = std::result::Result<T, E>;
