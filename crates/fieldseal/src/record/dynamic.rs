//! [`DynamicRecord`]: a record whose shape is a runtime [`RecordSchema`].

use std::sync::Arc;

use serde_json::{Map, Value as Json};

use crate::codec::{CodecError, Value};
use crate::error::SealError;
use crate::schema::{FieldSpec, RecordSchema};

use super::Record;

/// Field values laid out by a shared [`RecordSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicRecord {
    schema: Arc<RecordSchema>,
    values: Vec<Value>,
}

impl DynamicRecord {
    /// A record of `schema` with every field set to its zero value.
    pub fn zeroed(schema: Arc<RecordSchema>) -> Self {
        let values = schema.fields.iter().map(|f| Value::zero(f.type_tag)).collect();
        Self { schema, values }
    }

    /// Build a record from a JSON object keyed by source field name.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::SchemaMismatch`] if `json` is not an object, lacks
    /// a declared field, or carries an undeclared one, and a field-scoped
    /// codec error if a value does not fit its declared type.
    pub fn from_json(schema: Arc<RecordSchema>, json: &Json) -> Result<Self, SealError> {
        let object = json.as_object().ok_or_else(|| {
            SealError::SchemaMismatch(format!("`{}` payload must be a JSON object", schema.name))
        })?;

        if let Some(extra) = object.keys().find(|k| schema.field(k).is_none()) {
            return Err(SealError::SchemaMismatch(format!(
                "`{}` has no field `{extra}`",
                schema.name
            )));
        }

        let values = schema
            .fields
            .iter()
            .map(|spec| {
                let raw = object.get(&spec.name).ok_or_else(|| {
                    SealError::SchemaMismatch(format!("payload is missing field `{}`", spec.name))
                })?;
                Value::from_json(raw, spec.type_tag).map_err(|e| SealError::field(&spec.name, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { schema, values })
    }

    /// Render the record as a JSON object keyed by source field name.
    pub fn to_json(&self) -> Json {
        let object: Map<String, Json> = self
            .schema
            .fields
            .iter()
            .zip(&self.values)
            .map(|(spec, value)| (spec.name.clone(), value.to_json()))
            .collect();
        Json::Object(object)
    }

    /// The shape of this record.
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// Value of the field declared as `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.fields.iter().position(|f| f.name == name)?;
        self.values.get(index)
    }
}

impl Record for DynamicRecord {
    fn field_specs(&self) -> Vec<FieldSpec> {
        self.schema.fields.clone()
    }

    fn field_value(&self, index: usize) -> Option<Value> {
        self.values.get(index).cloned()
    }

    fn set_field_value(&mut self, index: usize, value: Value) -> Result<(), CodecError> {
        let spec = self
            .schema
            .fields
            .get(index)
            .ok_or(CodecError::NoSuchField(index))?;
        if value.type_tag() != spec.type_tag {
            return Err(CodecError::TypeMismatch {
                expected: spec.type_tag,
                found: value.type_tag(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    fn blank(&self) -> Self {
        DynamicRecord::zeroed(Arc::clone(&self.schema))
    }
}
