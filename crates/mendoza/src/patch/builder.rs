//! [`PatchBuilder`]: fluent builder for assembling [`RawPatch`] tapes.
//!
//! Each method appends one opcode and its operands in wire order. The builder
//! does not check that the resulting program is meaningful.

use serde_json::{json, Value as Json};

use super::opcode::Opcode;
use super::raw::RawPatch;

/// Utility for constructing a [`RawPatch`] instruction by instruction.
#[derive(Debug, Default)]
pub struct PatchBuilder {
    tape: Vec<Json>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tape built so far and resets the builder.
    pub fn flush(&mut self) -> RawPatch {
        RawPatch::new(std::mem::take(&mut self.tape))
    }

    fn op(&mut self, opcode: Opcode) -> &mut Self {
        self.tape.push(json!(opcode.code()));
        self
    }

    fn arg(&mut self, operand: Json) -> &mut Self {
        self.tape.push(operand);
        self
    }

    // ── Stack primitives ─────────────────────────────────────────────────

    pub fn value(&mut self, literal: Json) -> &mut Self {
        self.op(Opcode::Value).arg(literal)
    }

    pub fn copy(&mut self) -> &mut Self {
        self.op(Opcode::Copy)
    }

    pub fn blank(&mut self) -> &mut Self {
        self.op(Opcode::Blank)
    }

    pub fn return_into_array(&mut self) -> &mut Self {
        self.op(Opcode::ReturnIntoArray)
    }

    pub fn return_into_object(&mut self, key: &str) -> &mut Self {
        self.op(Opcode::ReturnIntoObject).arg(json!(key))
    }

    pub fn return_into_object_same_key(&mut self) -> &mut Self {
        self.op(Opcode::ReturnIntoObjectSameKey)
    }

    pub fn push_field(&mut self, key_index: usize) -> &mut Self {
        self.op(Opcode::PushField).arg(json!(key_index))
    }

    pub fn push_element(&mut self, index: usize) -> &mut Self {
        self.op(Opcode::PushElement).arg(json!(index))
    }

    pub fn push_parent(&mut self) -> &mut Self {
        self.op(Opcode::PushParent)
    }

    pub fn pop(&mut self) -> &mut Self {
        self.op(Opcode::Pop)
    }

    // ── Composite instructions ───────────────────────────────────────────

    pub fn push_field_copy(&mut self, key_index: usize) -> &mut Self {
        self.op(Opcode::PushFieldCopy).arg(json!(key_index))
    }

    pub fn push_field_blank(&mut self, key_index: usize) -> &mut Self {
        self.op(Opcode::PushFieldBlank).arg(json!(key_index))
    }

    pub fn push_element_copy(&mut self, index: usize) -> &mut Self {
        self.op(Opcode::PushElementCopy).arg(json!(index))
    }

    pub fn push_element_blank(&mut self, index: usize) -> &mut Self {
        self.op(Opcode::PushElementBlank).arg(json!(index))
    }

    pub fn return_into_object_pop(&mut self, key: &str) -> &mut Self {
        self.op(Opcode::ReturnIntoObjectPop).arg(json!(key))
    }

    pub fn return_into_object_same_key_pop(&mut self) -> &mut Self {
        self.op(Opcode::ReturnIntoObjectSameKeyPop)
    }

    pub fn return_into_array_pop(&mut self) -> &mut Self {
        self.op(Opcode::ReturnIntoArrayPop)
    }

    // ── Content instructions ─────────────────────────────────────────────

    /// Encoded as `literal, key` (the value operand comes first on the wire).
    pub fn object_set_field_value(&mut self, key: &str, literal: Json) -> &mut Self {
        self.op(Opcode::ObjectSetFieldValue).arg(literal).arg(json!(key))
    }

    pub fn object_copy_field(&mut self, key_index: usize) -> &mut Self {
        self.op(Opcode::ObjectCopyField).arg(json!(key_index))
    }

    pub fn object_delete_field(&mut self, key_index: usize) -> &mut Self {
        self.op(Opcode::ObjectDeleteField).arg(json!(key_index))
    }

    pub fn array_append_value(&mut self, literal: Json) -> &mut Self {
        self.op(Opcode::ArrayAppendValue).arg(literal)
    }

    pub fn array_append_slice(&mut self, left: usize, right: usize) -> &mut Self {
        self.op(Opcode::ArrayAppendSlice).arg(json!(left)).arg(json!(right))
    }

    pub fn string_append_string(&mut self, literal: &str) -> &mut Self {
        self.op(Opcode::StringAppendString).arg(json!(literal))
    }

    pub fn string_append_slice(&mut self, left: usize, right: usize) -> &mut Self {
        self.op(Opcode::StringAppendSlice).arg(json!(left)).arg(json!(right))
    }
}
