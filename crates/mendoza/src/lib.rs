//! mendoza: applies mendoza patches to JSON trees.
//!
//! A mendoza patch is a compact instruction tape that rebuilds a new tree from
//! an old one. Applying it yields a tree that shares every unchanged subtree
//! (and every unchanged string fragment) with the input.
//!
//! ```
//! use mendoza::{apply_patch, unwrap, wrap, RawPatch};
//! use serde_json::json;
//!
//! let input = wrap(json!({"a": 1, "b": "hello"}), "v1");
//! // PushField 0 ("a"), Value 2, ReturnIntoObjectSameKeyPop
//! let patch = RawPatch::from_json("[6, 0, 0, 2, 15]").unwrap();
//! let output = apply_patch(&input, &patch, "v2").unwrap();
//! assert_eq!(unwrap(&output), &json!({"a": 2, "b": "hello"}));
//! ```
//!
//! Modules:
//! - [`value`]: the in-memory tree ([`Value`], [`Content`], string fragments)
//! - [`object_model`]: the capability trait the interpreter is written against
//! - [`model`]: its implementation for [`Value`]
//! - [`patch`]: tapes, opcodes and the [`PatchBuilder`]
//! - [`patcher`]: the interpreter
//! - [`rebase`]: structural-sharing maximizer

pub mod cli;
pub mod error;
pub mod model;
pub mod object_model;
pub mod patch;
pub mod patcher;
pub mod rebase;
pub mod value;

use serde_json::Value as Json;

pub use error::{MendozaError, Result};
pub use model::Model;
pub use object_model::ObjectModel;
pub use patch::{Opcode, PatchBuilder, RawPatch};
pub use patcher::{apply_patch_to_model, Patcher};
pub use rebase::rebase_value;
pub use value::{
    ArrayContent, Content, ObjectContent, StringContent, StringFragment, Value, ValueType,
};

/// Turns plain JSON into a [`Value`] with the given origin.
pub fn wrap<O: Clone>(data: Json, origin: O) -> Value<O> {
    Value::new(data, origin)
}

/// Returns the plain JSON form of a value. Computed once and cached.
pub fn unwrap<O: Clone>(value: &Value<O>) -> &Json {
    value.to_json()
}

pub fn get_type<O: Clone>(value: &Value<O>) -> ValueType {
    value.value_type()
}

/// Applies `patch` to `input`. Every value written by the patch is tagged
/// with `origin`; values carried over keep their own.
pub fn apply_patch<O: Clone>(input: &Value<O>, patch: &RawPatch, origin: O) -> Result<Value<O>> {
    let model = Model::new(origin);
    apply_patch_to_model(&model, input, patch)
}
