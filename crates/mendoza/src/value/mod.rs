//! In-memory tree values.
//!
//! A [`Value`] is a shared handle to a node that starts out either as plain
//! JSON ("data") or as structural [`Content`] built by the patcher. The other
//! form is computed on first use and cached, so repeated access always yields
//! the same instance:
//!
//! | access               | computes            | cache     |
//! |----------------------|---------------------|-----------|
//! | `as_object` & co.    | `Content` from data | `content` |
//! | `to_json` (`unwrap`) | data from `Content` | `data`    |
//!
//! Nodes are never rewritten once constructed. Sharing a `Value` between
//! several parents (and between several trees) is therefore safe.

pub mod string;

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value as Json};

use crate::error::{MendozaError, Result};

pub use string::{StringContent, StringFragment};

// ── ValueType ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Array,
    Object,
    String,
    Number,
    Boolean,
    Null,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Null => "null",
        }
    }

    /// Returns the type of a plain JSON value.
    pub fn of_json(data: &Json) -> Self {
        match data {
            Json::Null => ValueType::Null,
            Json::Bool(_) => ValueType::Boolean,
            Json::Number(_) => ValueType::Number,
            Json::String(_) => ValueType::String,
            Json::Array(_) => ValueType::Array,
            Json::Object(_) => ValueType::Object,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Content ───────────────────────────────────────────────────────────────

/// Structural form of a container or string value.
pub enum Content<O> {
    Object(ObjectContent<O>),
    Array(ArrayContent<O>),
    String(StringContent<O>),
}

impl<O: Clone> Content<O> {
    /// Builds content for `data`, wrapping children with `origin`. Children
    /// point into the same document. Scalars have no structural form and
    /// yield `None`.
    fn from_data(data: &JsonRef, origin: &O) -> Option<Self> {
        match data.get() {
            Json::Object(map) => Some(Content::Object(ObjectContent::from_data(data, map, origin))),
            Json::Array(items) => {
                Some(Content::Array(ArrayContent::from_data(data, items.len(), origin)))
            }
            Json::String(text) => Some(Content::String(StringContent::from_text(
                text.clone(),
                origin.clone(),
            ))),
            _ => None,
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Content::Object(_) => ValueType::Object,
            Content::Array(_) => ValueType::Array,
            Content::String(_) => ValueType::String,
        }
    }

    fn to_json(&self) -> Json {
        match self {
            Content::Object(obj) => Json::Object(
                obj.iter()
                    .map(|(key, val)| (key.clone(), val.to_json().clone()))
                    .collect::<Map<String, Json>>(),
            ),
            Content::Array(arr) => {
                Json::Array(arr.iter().map(|val| val.to_json().clone()).collect())
            }
            Content::String(str) => Json::String(str.to_text()),
        }
    }
}

// ── ObjectContent ─────────────────────────────────────────────────────────

/// Object fields. Cloning shares the child values.
#[derive(Clone)]
pub struct ObjectContent<O> {
    fields: IndexMap<String, Value<O>>,
}

impl<O: Clone> ObjectContent<O> {
    pub fn new() -> Self {
        Self { fields: IndexMap::new() }
    }

    fn from_data(parent: &JsonRef, map: &Map<String, Json>, origin: &O) -> Self {
        let fields = map
            .keys()
            .map(|key| {
                let child = parent.child(Step::Key(key.clone()));
                (key.clone(), Value::from_data(child, origin.clone()))
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value<O>> {
        self.fields.get(key)
    }

    pub fn insert(&mut self, key: String, value: Value<O>) {
        self.fields.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value<O>> {
        self.fields.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value<O>)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<O: Clone> Default for ObjectContent<O> {
    fn default() -> Self {
        Self::new()
    }
}

// ── ArrayContent ──────────────────────────────────────────────────────────

/// Array elements. Cloning shares the child values.
#[derive(Clone)]
pub struct ArrayContent<O> {
    elements: Vec<Value<O>>,
}

impl<O: Clone> ArrayContent<O> {
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    fn from_data(parent: &JsonRef, len: usize, origin: &O) -> Self {
        let elements = (0..len)
            .map(|index| Value::from_data(parent.child(Step::Index(index)), origin.clone()))
            .collect();
        Self { elements }
    }

    pub fn get(&self, index: usize) -> Option<&Value<O>> {
        self.elements.get(index)
    }

    pub fn push(&mut self, value: Value<O>) {
        self.elements.push(value);
    }

    /// Appends clones of the handles in `[left, right)` of `other`.
    pub fn extend_from_slice(
        &mut self,
        other: &ArrayContent<O>,
        left: usize,
        right: usize,
    ) -> Result<()> {
        let slice = other.elements.get(left..right).ok_or(MendozaError::SliceOutOfRange {
            left,
            right,
            len: other.len(),
        })?;
        self.elements.extend_from_slice(slice);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value<O>> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<O: Clone> Default for ArrayContent<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Clone> FromIterator<Value<O>> for ArrayContent<O> {
    fn from_iter<I: IntoIterator<Item = Value<O>>>(iter: I) -> Self {
        Self { elements: iter.into_iter().collect() }
    }
}

impl<O: Clone> FromIterator<(String, Value<O>)> for ObjectContent<O> {
    fn from_iter<I: IntoIterator<Item = (String, Value<O>)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().collect() }
    }
}

// ── Shared documents ──────────────────────────────────────────────────────

enum Step {
    Key(String),
    Index(usize),
}

/// Steps from the document root, innermost last.
struct JsonPath {
    parent: Option<Rc<JsonPath>>,
    step: Step,
}

static MISSING: Json = Json::Null;

/// A subtree of a shared JSON document.
///
/// Children of a wrapped document keep a handle to the same root plus their
/// path, so materializing a node never copies the subtrees below it.
#[derive(Clone)]
struct JsonRef {
    root: Rc<Json>,
    path: Option<Rc<JsonPath>>,
}

impl JsonRef {
    fn owned(data: Json) -> Self {
        Self { root: Rc::new(data), path: None }
    }

    fn child(&self, step: Step) -> Self {
        let path = JsonPath { parent: self.path.clone(), step };
        Self { root: Rc::clone(&self.root), path: Some(Rc::new(path)) }
    }

    /// Resolves the subtree, one lookup per level.
    fn get(&self) -> &Json {
        let mut steps = Vec::new();
        let mut cursor = self.path.as_deref();
        while let Some(path) = cursor {
            steps.push(&path.step);
            cursor = path.parent.as_deref();
        }
        // The root is never mutated, so every recorded step resolves.
        steps
            .iter()
            .rev()
            .try_fold(&*self.root, |node, step| match (node, step) {
                (Json::Object(map), Step::Key(key)) => map.get(key),
                (Json::Array(items), Step::Index(index)) => items.get(*index),
                _ => None,
            })
            .unwrap_or(&MISSING)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

struct Node<O> {
    data: OnceCell<JsonRef>,
    content: OnceCell<Content<O>>,
    origin: O,
}

/// A node of a tree, tagged with a caller-defined origin `O`.
///
/// Cloning a `Value` clones the handle, not the node.
pub struct Value<O>(Rc<Node<O>>);

impl<O> Clone for Value<O> {
    fn clone(&self) -> Self {
        Value(Rc::clone(&self.0))
    }
}

impl<O: Clone> Value<O> {
    /// Wraps plain JSON. Nothing is materialized until first access.
    pub fn new(data: Json, origin: O) -> Self {
        Self::from_data(JsonRef::owned(data), origin)
    }

    fn from_data(data: JsonRef, origin: O) -> Self {
        let node = Node { data: OnceCell::from(data), content: OnceCell::new(), origin };
        Value(Rc::new(node))
    }

    pub(crate) fn from_content(content: Content<O>, origin: O) -> Self {
        let node = Node { data: OnceCell::new(), content: OnceCell::from(content), origin };
        Value(Rc::new(node))
    }

    pub fn origin(&self) -> &O {
        &self.0.origin
    }

    /// Returns true when both handles point at the same node.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// The cached structural form, if it has been computed.
    pub fn content(&self) -> Option<&Content<O>> {
        self.0.content.get()
    }

    pub fn value_type(&self) -> ValueType {
        if let Some(content) = self.0.content.get() {
            return content.value_type();
        }
        self.0
            .data
            .get()
            .map(|data| ValueType::of_json(data.get()))
            .unwrap_or(ValueType::Null)
    }

    /// Returns the plain JSON form, computing and caching it on first call.
    pub fn to_json(&self) -> &Json {
        self.0
            .data
            .get_or_init(|| {
                JsonRef::owned(self.0.content.get().map(Content::to_json).unwrap_or(Json::Null))
            })
            .get()
    }

    fn mismatch(&self, expected: ValueType) -> MendozaError {
        MendozaError::ShapeMismatch { expected, actual: self.value_type() }
    }

    fn materialize(&self, expected: ValueType) -> Result<&Content<O>> {
        let content = match self.0.content.get() {
            Some(content) => content,
            None => {
                let built = self
                    .0
                    .data
                    .get()
                    .and_then(|data| Content::from_data(data, &self.0.origin))
                    .ok_or_else(|| self.mismatch(expected))?;
                self.0.content.get_or_init(|| built)
            }
        };
        if content.value_type() == expected {
            Ok(content)
        } else {
            Err(self.mismatch(expected))
        }
    }

    pub fn as_object(&self) -> Result<&ObjectContent<O>> {
        match self.materialize(ValueType::Object)? {
            Content::Object(obj) => Ok(obj),
            _ => Err(self.mismatch(ValueType::Object)),
        }
    }

    pub fn as_array(&self) -> Result<&ArrayContent<O>> {
        match self.materialize(ValueType::Array)? {
            Content::Array(arr) => Ok(arr),
            _ => Err(self.mismatch(ValueType::Array)),
        }
    }

    pub fn as_string(&self) -> Result<&StringContent<O>> {
        match self.materialize(ValueType::String)? {
            Content::String(str) => Ok(str),
            _ => Err(self.mismatch(ValueType::String)),
        }
    }

    /// Keys of an object value without materializing its fields.
    pub fn object_keys(&self) -> Result<Vec<String>> {
        if let Some(content) = self.0.content.get() {
            return match content {
                Content::Object(obj) => Ok(obj.keys().cloned().collect()),
                _ => Err(self.mismatch(ValueType::Object)),
            };
        }
        match self.0.data.get().map(JsonRef::get) {
            Some(Json::Object(map)) => Ok(map.keys().cloned().collect()),
            _ => Err(self.mismatch(ValueType::Object)),
        }
    }

    /// Text and origin of every fragment of a string value, in order.
    ///
    /// Fragments taken over from earlier versions keep the origin they were
    /// first written with.
    pub fn string_fragments(&self) -> Result<Vec<StringFragment<O>>> {
        Ok(self.as_string()?.fragments())
    }
}

impl<O: Clone + fmt::Debug> fmt::Debug for Value<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("data", self.to_json())
            .field("origin", &self.0.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn materialization_is_memoized() {
        let value = Value::new(json!({"a": [1, 2]}), "v1");
        let first = value.as_object().unwrap() as *const ObjectContent<&str>;
        let second = value.as_object().unwrap() as *const ObjectContent<&str>;
        assert_eq!(first, second);

        let a1 = value.as_object().unwrap().get("a").unwrap().clone();
        let a2 = value.as_object().unwrap().get("a").unwrap().clone();
        assert!(Value::ptr_eq(&a1, &a2));
        assert_eq!(*a1.origin(), "v1");
    }

    #[test]
    fn to_json_is_cached() {
        let mut obj = ObjectContent::new();
        obj.insert("x".into(), Value::new(json!(1), ()));
        let value = Value::from_content(Content::Object(obj), ());
        let first = value.to_json() as *const Json;
        let second = value.to_json() as *const Json;
        assert_eq!(first, second);
        assert_eq!(value.to_json(), &json!({"x": 1}));
    }

    #[test]
    fn children_point_into_the_wrapped_document() {
        let value = Value::new(json!({"a": {"b": [1, {"c": "deep"}]}, "d": [true, false]}), ());
        let a = value.as_object().unwrap().get("a").unwrap().clone();
        assert!(std::ptr::eq(a.to_json(), &value.to_json()["a"]));

        let b = a.as_object().unwrap().get("b").unwrap().clone();
        let c = b.as_array().unwrap().get(1).unwrap().clone();
        assert!(std::ptr::eq(c.to_json(), &value.to_json()["a"]["b"][1]));
        assert_eq!(c.object_keys().unwrap(), vec!["c".to_string()]);
        assert_eq!(c.value_type(), ValueType::Object);
        assert!(c.content().is_none());
    }

    #[test]
    fn shape_mismatch_reports_both_types() {
        let value = Value::new(json!([1]), ());
        let err = value.as_object().err().unwrap();
        assert_eq!(
            err,
            MendozaError::ShapeMismatch { expected: ValueType::Object, actual: ValueType::Array }
        );
        // The array content computed on the way is still usable.
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert!(Value::new(json!(3), ()).as_string().is_err());
    }

    #[test]
    fn value_type_prefers_content() {
        assert_eq!(Value::new(json!(null), ()).value_type(), ValueType::Null);
        assert_eq!(Value::new(json!(true), ()).value_type(), ValueType::Boolean);
        assert_eq!(Value::new(json!(1.5), ()).value_type(), ValueType::Number);
        let built = Value::<()>::from_content(Content::Array(ArrayContent::new()), ());
        assert_eq!(built.value_type(), ValueType::Array);
        assert_eq!(built.to_json(), &json!([]));
    }

    #[test]
    fn object_keys_without_materializing() {
        let value = Value::new(json!({"b": 1, "a": 2}), ());
        assert_eq!(value.object_keys().unwrap(), vec!["b".to_string(), "a".to_string()]);
        assert!(value.content().is_none());
    }

    #[test]
    fn extend_from_slice_checks_range() {
        let src: ArrayContent<()> = (0..3).map(|i| Value::new(json!(i), ())).collect();
        let mut dst = ArrayContent::new();
        dst.extend_from_slice(&src, 1, 3).unwrap();
        assert_eq!(dst.len(), 2);
        assert!(Value::ptr_eq(dst.get(0).unwrap(), src.get(1).unwrap()));
        assert_eq!(
            dst.extend_from_slice(&src, 2, 4),
            Err(MendozaError::SliceOutOfRange { left: 2, right: 4, len: 3 })
        );
        assert!(dst.extend_from_slice(&src, 2, 1).is_err());
    }
}
