//! [`ObjectModel`] implementation for in-memory [`Value`] trees.

use serde_json::Value as Json;

use crate::error::{MendozaError, Result};
use crate::object_model::ObjectModel;
use crate::value::{ArrayContent, Content, ObjectContent, StringContent, Value};

/// Builds values tagged with a fixed origin.
#[derive(Debug, Clone)]
pub struct Model<O> {
    origin: O,
}

impl<O: Clone> Model<O> {
    pub fn new(origin: O) -> Self {
        Self { origin }
    }

    pub fn origin(&self) -> &O {
        &self.origin
    }
}

impl<O: Clone> ObjectModel for Model<O> {
    type Origin = O;
    type Value = Value<O>;
    type Str = StringContent<O>;
    type Obj = ObjectContent<O>;
    type Arr = ArrayContent<O>;

    fn wrap(&self, data: Json) -> Value<O> {
        Value::new(data, self.origin.clone())
    }

    fn wrap_with_origin(&self, data: Json, origin: O) -> Value<O> {
        Value::new(data, origin)
    }

    fn as_object<'v>(&self, value: &'v Value<O>) -> Result<&'v ObjectContent<O>> {
        value.as_object()
    }

    fn as_array<'v>(&self, value: &'v Value<O>) -> Result<&'v ArrayContent<O>> {
        value.as_array()
    }

    fn as_string<'v>(&self, value: &'v Value<O>) -> Result<&'v StringContent<O>> {
        value.as_string()
    }

    fn object_get_keys(&self, value: &Value<O>) -> Result<Vec<String>> {
        value.object_keys()
    }

    fn object_get_field(&self, value: &Value<O>, key: &str) -> Result<Value<O>> {
        value
            .as_object()?
            .get(key)
            .cloned()
            .ok_or_else(|| MendozaError::MissingField(key.to_string()))
    }

    fn array_get_element(&self, value: &Value<O>, index: usize) -> Result<Value<O>> {
        let arr = value.as_array()?;
        arr.get(index)
            .cloned()
            .ok_or(MendozaError::ElementOutOfRange { index, len: arr.len() })
    }

    fn copy_string(&self, value: Option<&Value<O>>) -> Result<StringContent<O>> {
        match value {
            Some(value) => Ok(value.as_string()?.copy()),
            None => Ok(StringContent::empty()),
        }
    }

    fn copy_object(&self, value: Option<&Value<O>>) -> Result<ObjectContent<O>> {
        match value {
            Some(value) => Ok(value.as_object()?.clone()),
            None => Ok(ObjectContent::new()),
        }
    }

    fn copy_array(&self, value: Option<&Value<O>>) -> Result<ArrayContent<O>> {
        match value {
            Some(value) => Ok(value.as_array()?.clone()),
            None => Ok(ArrayContent::new()),
        }
    }

    fn object_set_field(&self, target: &mut ObjectContent<O>, key: String, value: Value<O>) {
        target.insert(key, value);
    }

    fn object_delete_field(&self, target: &mut ObjectContent<O>, key: &str) {
        target.remove(key);
    }

    fn array_append_value(&self, target: &mut ArrayContent<O>, value: Value<O>) {
        target.push(value);
    }

    fn array_append_slice(
        &self,
        target: &mut ArrayContent<O>,
        source: &Value<O>,
        left: usize,
        right: usize,
    ) -> Result<()> {
        target.extend_from_slice(source.as_array()?, left, right)
    }

    fn string_append_value(&self, target: &mut StringContent<O>, source: &Value<O>) -> Result<()> {
        target.append(source.as_string()?);
        Ok(())
    }

    fn string_append_slice(
        &self,
        target: &mut StringContent<O>,
        source: &Value<O>,
        left: usize,
        right: usize,
    ) -> Result<()> {
        target.append_slice(source.as_string()?, left, right)
    }

    fn finalize_string(&self, content: StringContent<O>) -> Value<O> {
        Value::from_content(Content::String(content), self.origin.clone())
    }

    fn finalize_object(&self, content: ObjectContent<O>) -> Value<O> {
        Value::from_content(Content::Object(content), self.origin.clone())
    }

    fn finalize_array(&self, content: ArrayContent<O>) -> Value<O> {
        Value::from_content(Content::Array(content), self.origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn copies_are_shallow_and_independent() {
        let model = Model::new("new");
        let source = Value::new(json!({"a": {"deep": true}, "b": 2}), "old");

        let mut obj = model.copy_object(Some(&source)).unwrap();
        model.object_delete_field(&mut obj, "b");
        model.object_set_field(&mut obj, "c".into(), model.wrap(json!(3)));
        let out = model.finalize_object(obj);

        assert_eq!(out.to_json(), &json!({"a": {"deep": true}, "c": 3}));
        assert_eq!(source.to_json(), &json!({"a": {"deep": true}, "b": 2}));
        let a_in = model.object_get_field(&source, "a").unwrap();
        let a_out = model.object_get_field(&out, "a").unwrap();
        assert!(Value::ptr_eq(&a_in, &a_out));
        assert_eq!(*a_out.origin(), "old");
        assert_eq!(*out.origin(), "new");
    }

    #[test]
    fn array_copy_does_not_alias_source() {
        let model = Model::new(());
        let source = Value::new(json!([1, 2]), ());
        let mut arr = model.copy_array(Some(&source)).unwrap();
        model.array_append_value(&mut arr, model.wrap(json!(3)));
        assert_eq!(model.finalize_array(arr).to_json(), &json!([1, 2, 3]));
        assert_eq!(source.as_array().unwrap().len(), 2);
    }

    #[test]
    fn string_copy_shares_parts() {
        let model = Model::new(0);
        let source = Value::new(json!("shared"), 7);
        let mut str = model.copy_string(Some(&source)).unwrap();
        model.string_append_value(&mut str, &model.wrap(json!("!"))).unwrap();
        let out = model.finalize_string(str);
        assert_eq!(out.to_json(), &json!("shared!"));
        let origins: Vec<i32> =
            out.string_fragments().unwrap().into_iter().map(|f| f.origin).collect();
        assert_eq!(origins, vec![7, 0]);
    }

    #[test]
    fn wrap_with_explicit_origin() {
        let model = Model::new("patch");
        let value = model.wrap_with_origin(json!({"k": ["x"]}), "base");
        assert_eq!(*value.origin(), "base");
        assert_eq!(*model.wrap(json!(null)).origin(), *model.origin());

        let arr = model.as_object(&value).unwrap().get("k").unwrap().clone();
        assert_eq!(*arr.origin(), "base");
        let text = model.as_array(&arr).unwrap().get(0).unwrap().clone();
        assert_eq!(model.as_string(&text).unwrap().to_text(), "x");
        assert!(model.as_array(&value).is_err());
    }

    #[test]
    fn lookups_report_bounds() {
        let model = Model::new(());
        let arr = Value::new(json!([1]), ());
        assert_eq!(
            model.array_get_element(&arr, 1).err(),
            Some(MendozaError::ElementOutOfRange { index: 1, len: 1 })
        );
        let obj = Value::new(json!({"a": 1}), ());
        assert_eq!(
            model.object_get_field(&obj, "b").err(),
            Some(MendozaError::MissingField("b".into()))
        );
        assert!(model.copy_string(Some(&obj)).is_err());
    }
}
