//! The patch interpreter.
//!
//! A stack machine with two parallel stacks:
//!
//! - the **input stack** is a cursor into the tree being patched;
//! - the **output stack** holds the values under construction. An entry is
//!   either a pass-through reference to an existing value, or a builder that
//!   is created on the first write (seeded from the pass-through value, or
//!   empty for blank entries).
//!
//! Both stacks start with the input root. When the tape is exhausted the top
//! output entry is finalized and returned. Any error aborts the whole run.

use tracing::{debug, trace, warn};

use crate::error::{MendozaError, Result};
use crate::object_model::ObjectModel;
use crate::patch::{Opcode, PatchReader, RawPatch};
use crate::value::ValueType;

// ── Stack entries ─────────────────────────────────────────────────────────

struct InputEntry<V> {
    value: V,
    /// Key the node was reached by, for field descents.
    key: Option<String>,
    /// Sorted keys, computed on the first field reference by index.
    keys: Option<Vec<String>>,
}

impl<V> InputEntry<V> {
    fn root(value: V) -> Self {
        Self { value, key: None, keys: None }
    }
}

enum Builder<M: ObjectModel> {
    String(M::Str),
    Object(M::Obj),
    Array(M::Arr),
}

impl<M: ObjectModel> Builder<M> {
    fn value_type(&self) -> ValueType {
        match self {
            Builder::String(_) => ValueType::String,
            Builder::Object(_) => ValueType::Object,
            Builder::Array(_) => ValueType::Array,
        }
    }
}

struct OutputEntry<M: ObjectModel> {
    value: Option<M::Value>,
    write: Option<Builder<M>>,
    /// Key to return into when the entry is popped without an explicit key.
    key: Option<String>,
}

fn builder_mismatch<M: ObjectModel>(
    expected: ValueType,
    found: Option<&mut Builder<M>>,
) -> MendozaError {
    let actual = found.map(|b| b.value_type()).unwrap_or(ValueType::Null);
    MendozaError::ShapeMismatch { expected, actual }
}

// ── Patcher ───────────────────────────────────────────────────────────────

/// Applies one patch to one input root through an [`ObjectModel`].
pub struct Patcher<'a, M: ObjectModel> {
    model: &'a M,
    reader: PatchReader<'a>,
    input: Vec<InputEntry<M::Value>>,
    output: Vec<OutputEntry<M>>,
}

impl<'a, M: ObjectModel> Patcher<'a, M> {
    pub fn new(model: &'a M, root: &M::Value, patch: &'a RawPatch) -> Self {
        Self {
            model,
            reader: patch.reader(),
            input: vec![InputEntry::root(root.clone())],
            output: vec![OutputEntry { value: Some(root.clone()), write: None, key: None }],
        }
    }

    /// Runs the tape to completion and returns the finalized output root.
    pub fn process(mut self) -> Result<M::Value> {
        while !self.reader.is_eof() {
            let position = self.reader.position();
            let step = self.reader.read_opcode().and_then(|opcode| {
                trace!(position, ?opcode, "dispatch");
                self.step(opcode)
            });
            if let Err(err) = step {
                warn!(position, error = %err, "patch aborted");
                return Err(err);
            }
        }

        let entry = self
            .output
            .pop()
            .ok_or_else(|| MendozaError::InvalidPatch("empty output stack".into()))?;
        debug!(depth = self.output.len(), "patch applied");
        self.finalize(entry)
    }

    fn step(&mut self, opcode: Opcode) -> Result<()> {
        match opcode {
            Opcode::Value => self.push_value(opcode),
            Opcode::Copy => self.push_copy(opcode),
            Opcode::Blank => self.push_blank(),
            Opcode::ReturnIntoArray => self.return_into_array(opcode),
            Opcode::ReturnIntoObject => self.return_into_object(opcode),
            Opcode::ReturnIntoObjectSameKey => self.return_into_object_same_key(opcode),
            Opcode::PushField => self.push_field(opcode),
            Opcode::PushElement => self.push_element(opcode),
            Opcode::PushParent => Err(MendozaError::Unsupported(opcode)),
            Opcode::Pop => self.pop(opcode),
            Opcode::PushFieldCopy => {
                self.push_field(opcode)?;
                self.push_copy(opcode)
            }
            Opcode::PushFieldBlank => {
                self.push_field(opcode)?;
                self.push_blank()
            }
            Opcode::PushElementCopy => {
                self.push_element(opcode)?;
                self.push_copy(opcode)
            }
            Opcode::PushElementBlank => {
                self.push_element(opcode)?;
                self.push_blank()
            }
            Opcode::ReturnIntoObjectPop => {
                self.return_into_object(opcode)?;
                self.pop(opcode)
            }
            Opcode::ReturnIntoObjectSameKeyPop => {
                self.return_into_object_same_key(opcode)?;
                self.pop(opcode)
            }
            Opcode::ReturnIntoArrayPop => {
                self.return_into_array(opcode)?;
                self.pop(opcode)
            }
            Opcode::ObjectSetFieldValue => {
                self.push_value(opcode)?;
                self.return_into_object(opcode)
            }
            Opcode::ObjectCopyField => {
                self.push_field(opcode)?;
                self.push_copy(opcode)?;
                self.return_into_object_same_key(opcode)?;
                self.pop(opcode)
            }
            Opcode::ObjectDeleteField => self.object_delete_field(opcode),
            Opcode::ArrayAppendValue => self.array_append_value(opcode),
            Opcode::ArrayAppendSlice => self.array_append_slice(opcode),
            Opcode::StringAppendString => self.string_append_string(opcode),
            Opcode::StringAppendSlice => self.string_append_slice(opcode),
        }
    }

    // ── Stack access ─────────────────────────────────────────────────────

    fn input_entry(&self, opcode: Opcode) -> Result<&InputEntry<M::Value>> {
        self.input.last().ok_or(MendozaError::StackUnderflow(opcode))
    }

    /// Resolves `index` in the sorted key list of the current input node.
    fn input_key(&mut self, opcode: Opcode, index: usize) -> Result<String> {
        let model = self.model;
        let entry = self.input.last_mut().ok_or(MendozaError::StackUnderflow(opcode))?;
        if entry.keys.is_none() {
            let mut keys = model.object_get_keys(&entry.value)?;
            keys.sort();
            entry.keys = Some(keys);
        }
        let keys = entry.keys.as_deref().unwrap_or_default();
        keys.get(index)
            .cloned()
            .ok_or(MendozaError::KeyIndexOutOfRange { index, len: keys.len() })
    }

    fn pop_output(&mut self, opcode: Opcode) -> Result<OutputEntry<M>> {
        self.output.pop().ok_or(MendozaError::StackUnderflow(opcode))
    }

    fn top_output(&mut self, opcode: Opcode) -> Result<&mut OutputEntry<M>> {
        self.output.last_mut().ok_or(MendozaError::StackUnderflow(opcode))
    }

    fn output_object(&mut self, opcode: Opcode) -> Result<&mut M::Obj> {
        let model = self.model;
        let entry = self.top_output(opcode)?;
        if entry.write.is_none() {
            entry.write = Some(Builder::Object(model.copy_object(entry.value.as_ref())?));
        }
        match entry.write.as_mut() {
            Some(Builder::Object(obj)) => Ok(obj),
            other => Err(builder_mismatch(ValueType::Object, other)),
        }
    }

    fn output_array(&mut self, opcode: Opcode) -> Result<&mut M::Arr> {
        let model = self.model;
        let entry = self.top_output(opcode)?;
        if entry.write.is_none() {
            entry.write = Some(Builder::Array(model.copy_array(entry.value.as_ref())?));
        }
        match entry.write.as_mut() {
            Some(Builder::Array(arr)) => Ok(arr),
            other => Err(builder_mismatch(ValueType::Array, other)),
        }
    }

    fn output_string(&mut self, opcode: Opcode) -> Result<&mut M::Str> {
        let model = self.model;
        let entry = self.top_output(opcode)?;
        if entry.write.is_none() {
            entry.write = Some(Builder::String(model.copy_string(entry.value.as_ref())?));
        }
        match entry.write.as_mut() {
            Some(Builder::String(str)) => Ok(str),
            other => Err(builder_mismatch(ValueType::String, other)),
        }
    }

    fn finalize(&self, entry: OutputEntry<M>) -> Result<M::Value> {
        match entry.write {
            Some(Builder::String(str)) => Ok(self.model.finalize_string(str)),
            Some(Builder::Object(obj)) => Ok(self.model.finalize_object(obj)),
            Some(Builder::Array(arr)) => Ok(self.model.finalize_array(arr)),
            None => entry.value.ok_or(MendozaError::UnwrittenBlank),
        }
    }

    // ── Primitives ───────────────────────────────────────────────────────

    fn push_value(&mut self, opcode: Opcode) -> Result<()> {
        let value = self.model.wrap(self.reader.read_literal(opcode)?);
        self.output.push(OutputEntry { value: Some(value), write: None, key: None });
        Ok(())
    }

    fn push_copy(&mut self, opcode: Opcode) -> Result<()> {
        let input = self.input_entry(opcode)?;
        let entry = OutputEntry {
            value: Some(input.value.clone()),
            write: None,
            key: input.key.clone(),
        };
        self.output.push(entry);
        Ok(())
    }

    fn push_blank(&mut self) -> Result<()> {
        let key = self.input.last().and_then(|input| input.key.clone());
        self.output.push(OutputEntry { value: None, write: None, key });
        Ok(())
    }

    fn return_into_array(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let entry = self.pop_output(opcode)?;
        let result = self.finalize(entry)?;
        let arr = self.output_array(opcode)?;
        model.array_append_value(arr, result);
        Ok(())
    }

    fn return_into_object(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let key = self.reader.read_key(opcode)?;
        let entry = self.pop_output(opcode)?;
        let result = model.mark_changed(self.finalize(entry)?);
        let obj = self.output_object(opcode)?;
        model.object_set_field(obj, key.to_string(), result);
        Ok(())
    }

    fn return_into_object_same_key(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let entry = self.pop_output(opcode)?;
        let key = entry
            .key
            .clone()
            .or_else(|| self.input.last().and_then(|input| input.key.clone()))
            .ok_or(MendozaError::MissingOperand(opcode))?;
        let result = self.finalize(entry)?;
        let obj = self.output_object(opcode)?;
        model.object_set_field(obj, key, result);
        Ok(())
    }

    fn push_field(&mut self, opcode: Opcode) -> Result<()> {
        let index = self.reader.read_index(opcode)?;
        let key = self.input_key(opcode, index)?;
        let value = self.model.object_get_field(&self.input_entry(opcode)?.value, &key)?;
        self.input.push(InputEntry { value, key: Some(key), keys: None });
        Ok(())
    }

    fn push_element(&mut self, opcode: Opcode) -> Result<()> {
        let index = self.reader.read_index(opcode)?;
        let value = self.model.array_get_element(&self.input_entry(opcode)?.value, index)?;
        self.input.push(InputEntry { value, key: None, keys: None });
        Ok(())
    }

    fn pop(&mut self, opcode: Opcode) -> Result<()> {
        self.input.pop().map(drop).ok_or(MendozaError::StackUnderflow(opcode))
    }

    // ── Content writes ───────────────────────────────────────────────────

    fn object_delete_field(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let index = self.reader.read_index(opcode)?;
        let key = self.input_key(opcode, index)?;
        let obj = self.output_object(opcode)?;
        model.object_delete_field(obj, &key);
        Ok(())
    }

    fn array_append_value(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let value = model.wrap(self.reader.read_literal(opcode)?);
        let arr = self.output_array(opcode)?;
        model.array_append_value(arr, value);
        Ok(())
    }

    fn array_append_slice(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let left = self.reader.read_index(opcode)?;
        let right = self.reader.read_index(opcode)?;
        let source = self.input_entry(opcode)?.value.clone();
        let arr = self.output_array(opcode)?;
        model.array_append_slice(arr, &source, left, right)
    }

    fn string_append_string(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let value = model.wrap(self.reader.read_literal(opcode)?);
        let str = self.output_string(opcode)?;
        model.string_append_value(str, &value)
    }

    fn string_append_slice(&mut self, opcode: Opcode) -> Result<()> {
        let model = self.model;
        let left = self.reader.read_index(opcode)?;
        let right = self.reader.read_index(opcode)?;
        let source = self.input_entry(opcode)?.value.clone();
        let str = self.output_string(opcode)?;
        model.string_append_slice(str, &source, left, right)
    }
}

/// Applies `patch` to `root` using `model` for every read and write.
pub fn apply_patch_to_model<M: ObjectModel>(
    model: &M,
    root: &M::Value,
    patch: &RawPatch,
) -> Result<M::Value> {
    debug!(tape_len = patch.len(), "applying patch");
    Patcher::new(model, root, patch).process()
}
