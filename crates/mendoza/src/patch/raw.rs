//! The raw instruction tape and its forward-only reader.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::opcode::Opcode;
use crate::error::{MendozaError, Result};

/// A flat sequence of opcodes interleaved with their operands, as produced by
/// the encoder. Serialized as a plain JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPatch(Vec<Json>);

impl RawPatch {
    pub fn new(tape: Vec<Json>) -> Self {
        Self(tape)
    }

    /// Parses a patch from its JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| MendozaError::InvalidPatch(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Json] {
        &self.0
    }

    pub fn reader(&self) -> PatchReader<'_> {
        PatchReader { tape: &self.0, pos: 0 }
    }
}

impl From<Vec<Json>> for RawPatch {
    fn from(tape: Vec<Json>) -> Self {
        Self(tape)
    }
}

/// Single forward cursor over a [`RawPatch`].
#[derive(Debug)]
pub struct PatchReader<'a> {
    tape: &'a [Json],
    pos: usize,
}

impl<'a> PatchReader<'a> {
    pub fn is_eof(&self) -> bool {
        self.pos >= self.tape.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn next(&mut self) -> Option<&'a Json> {
        let item = self.tape.get(self.pos)?;
        self.pos += 1;
        Some(item)
    }

    pub fn read_opcode(&mut self) -> Result<Opcode> {
        let item = self
            .next()
            .ok_or_else(|| MendozaError::InvalidPatch("unexpected end of tape".into()))?;
        item.as_u64()
            .and_then(Opcode::from_u64)
            .ok_or_else(|| MendozaError::UnknownOpcode(item.to_string()))
    }

    fn operand(&mut self, opcode: Opcode) -> Result<&'a Json> {
        self.next().ok_or(MendozaError::MissingOperand(opcode))
    }

    /// Reads a non-negative integer operand (key index, element index or
    /// slice bound).
    pub fn read_index(&mut self, opcode: Opcode) -> Result<usize> {
        self.operand(opcode)?
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or(MendozaError::InvalidOperand { opcode, expected: "a non-negative integer" })
    }

    pub fn read_key(&mut self, opcode: Opcode) -> Result<&'a str> {
        self.operand(opcode)?
            .as_str()
            .ok_or(MendozaError::InvalidOperand { opcode, expected: "a string" })
    }

    pub fn read_literal(&mut self, opcode: Opcode) -> Result<Json> {
        self.operand(opcode).cloned()
    }
}
