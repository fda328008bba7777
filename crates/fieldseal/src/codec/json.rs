//! Bridging between [`Value`] and `serde_json::Value` for JSON-facing callers.

use serde_json::{Number, Value as Json};

use super::{text, CodecError, TypeTag, Value};

impl Value {
    /// Convert a JSON value into a value of type `tag`.
    ///
    /// JSON strings go through the canonical text decoder, so `"64"` is a
    /// valid `int64`. JSON numbers are range-checked into the target width.
    /// Byte sequences accept an array of numbers; string sequences an array
    /// of strings.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ParseFailure`] if the JSON value cannot represent
    /// a `tag` value.
    pub fn from_json(json: &Json, tag: TypeTag) -> Result<Self, CodecError> {
        match (json, tag) {
            (Json::String(s), _) => text::decode(s, tag),
            (Json::Bool(b), TypeTag::Bool) => Ok(Value::Bool(*b)),
            (Json::Number(n), TypeTag::Float32) => {
                let narrowed = number_as_f64(n, tag)? as f32;
                if narrowed.is_infinite() {
                    return Err(mismatch(tag, "number out of float32 range"));
                }
                Ok(Value::Float32(narrowed))
            }
            (Json::Number(n), TypeTag::Float64) => Ok(Value::Float64(number_as_f64(n, tag)?)),
            // Integers take the exact decimal text of the number, so `1.5`
            // and `1e3` are rejected rather than truncated.
            (Json::Number(n), _) if is_integer(tag) => text::decode(&n.to_string(), tag),
            (Json::Array(items), TypeTag::Bytes) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| mismatch(tag, "array element is not a byte"))
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Value::Bytes),
            (Json::Array(items), TypeTag::Strings) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or_else(|| mismatch(tag, "array element is not a string"))
                })
                .collect::<Result<Vec<String>, _>>()
                .map(Value::Strings),
            (Json::Null, _) => Err(mismatch(tag, "null")),
            (other, _) => Err(mismatch(tag, json_kind(other))),
        }
    }

    /// Render the value as JSON.
    ///
    /// Non-finite floats become `null`. `f32` values are widened through
    /// their shortest text, so `64.64f32` renders as `64.64`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Int8(v) => Json::from(*v),
            Value::Int16(v) => Json::from(*v),
            Value::Int32(v) => Json::from(*v),
            Value::Int64(v) => Json::from(*v),
            Value::Int(v) => Json::from(*v as i64),
            Value::Uint8(v) => Json::from(*v),
            Value::Uint16(v) => Json::from(*v),
            Value::Uint32(v) => Json::from(*v),
            Value::Uint64(v) => Json::from(*v),
            Value::Uint(v) | Value::Uintptr(v) => Json::from(*v as u64),
            Value::Float32(v) => {
                let widened = v.to_string().parse::<f64>().unwrap_or(f64::from(*v));
                Number::from_f64(widened).map_or(Json::Null, Json::Number)
            }
            Value::Float64(v) => Number::from_f64(*v).map_or(Json::Null, Json::Number),
            Value::String(v) => Json::from(v.as_str()),
            Value::Bool(v) => Json::from(*v),
            Value::Bytes(v) => Json::from(v.clone()),
            Value::Strings(v) => Json::from(v.clone()),
        }
    }
}

fn is_integer(tag: TypeTag) -> bool {
    !matches!(
        tag,
        TypeTag::Float32
            | TypeTag::Float64
            | TypeTag::String
            | TypeTag::Bool
            | TypeTag::Bytes
            | TypeTag::Strings
    )
}

fn number_as_f64(n: &Number, tag: TypeTag) -> Result<f64, CodecError> {
    n.as_f64().ok_or_else(|| mismatch(tag, "number is not representable"))
}

fn mismatch(tag: TypeTag, reason: &str) -> CodecError {
    CodecError::ParseFailure {
        type_tag: tag,
        reason: reason.to_owned(),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "JSON boolean",
        Json::Number(_) => "JSON number",
        Json::String(_) => "JSON string",
        Json::Array(_) => "JSON array",
        Json::Object(_) => "JSON object",
    }
}
