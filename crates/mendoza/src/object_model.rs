//! The capability contract between the patcher and a tree representation.
//!
//! The patcher only ever talks to an [`ObjectModel`]; it never sees how values
//! are stored. [`crate::model::Model`] is the in-memory implementation.
//!
//! No operation may change what a previously finalized value represents.
//! Builders returned by the `copy_*` methods are independent of their source.

use serde_json::Value as Json;

use crate::error::Result;

pub trait ObjectModel {
    /// Caller-defined provenance tag attached to every value.
    type Origin: Clone;
    type Value: Clone;
    /// String builder.
    type Str;
    /// Object builder.
    type Obj;
    /// Array builder.
    type Arr;

    fn wrap(&self, data: Json) -> Self::Value;
    fn wrap_with_origin(&self, data: Json, origin: Self::Origin) -> Self::Value;

    fn as_object<'v>(&self, value: &'v Self::Value) -> Result<&'v Self::Obj>;
    fn as_array<'v>(&self, value: &'v Self::Value) -> Result<&'v Self::Arr>;
    fn as_string<'v>(&self, value: &'v Self::Value) -> Result<&'v Self::Str>;

    /// Keys of an object value. Repeated calls yield the same order.
    fn object_get_keys(&self, value: &Self::Value) -> Result<Vec<String>>;
    fn object_get_field(&self, value: &Self::Value, key: &str) -> Result<Self::Value>;
    fn array_get_element(&self, value: &Self::Value, index: usize) -> Result<Self::Value>;

    fn copy_string(&self, value: Option<&Self::Value>) -> Result<Self::Str>;
    fn copy_object(&self, value: Option<&Self::Value>) -> Result<Self::Obj>;
    fn copy_array(&self, value: Option<&Self::Value>) -> Result<Self::Arr>;

    fn object_set_field(&self, target: &mut Self::Obj, key: String, value: Self::Value);
    fn object_delete_field(&self, target: &mut Self::Obj, key: &str);
    fn array_append_value(&self, target: &mut Self::Arr, value: Self::Value);
    /// Appends the elements `[left, right)` of `source`.
    fn array_append_slice(
        &self,
        target: &mut Self::Arr,
        source: &Self::Value,
        left: usize,
        right: usize,
    ) -> Result<()>;
    fn string_append_value(&self, target: &mut Self::Str, source: &Self::Value) -> Result<()>;
    /// Appends the UTF-8 bytes `[left, right)` of `source`.
    fn string_append_slice(
        &self,
        target: &mut Self::Str,
        source: &Self::Value,
        left: usize,
        right: usize,
    ) -> Result<()>;

    fn finalize_string(&self, content: Self::Str) -> Self::Value;
    fn finalize_object(&self, content: Self::Obj) -> Self::Value;
    fn finalize_array(&self, content: Self::Arr) -> Self::Value;

    /// Hook for models that track which subtrees were rewritten.
    fn mark_changed(&self, value: Self::Value) -> Self::Value {
        value
    }
}
