//! Canonical string form of a [`Value`].
//!
//! `decode(&encode(v), v.type_tag()) == v` for every value, with two caveats
//! exercised in the tests below: float text is the shortest form that
//! round-trips at the value's own width, and a string sequence whose
//! elements contain [`STRING_SEPARATOR`] (or that is a single empty string)
//! does not survive the round trip.

use std::{fmt::Display, str::FromStr};

use super::{CodecError, TypeTag, Value};

/// Separator placed between string-sequence elements.
pub const STRING_SEPARATOR: char = '°';

/// Render `value` in its canonical textual form.
///
/// Byte sequences are written as `[5 4 3 2 1]`; string sequences are joined
/// with [`STRING_SEPARATOR`]; everything else uses its `Display` form.
pub fn encode(value: &Value) -> String {
    match value {
        Value::Int8(v) => v.to_string(),
        Value::Int16(v) => v.to_string(),
        Value::Int32(v) => v.to_string(),
        Value::Int64(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::Uint8(v) => v.to_string(),
        Value::Uint16(v) => v.to_string(),
        Value::Uint32(v) => v.to_string(),
        Value::Uint64(v) => v.to_string(),
        Value::Uint(v) | Value::Uintptr(v) => v.to_string(),
        Value::Float32(v) => v.to_string(),
        Value::Float64(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bool(v) => v.to_string(),
        Value::Bytes(bytes) => {
            let digits: Vec<String> = bytes.iter().map(u8::to_string).collect();
            format!("[{}]", digits.join(" "))
        }
        Value::Strings(items) => {
            let sep = STRING_SEPARATOR.to_string();
            items.join(sep.as_str())
        }
    }
}

/// Parse `text` as a value of type `tag`.
///
/// # Errors
///
/// Returns [`CodecError::ParseFailure`] if `text` is not a valid rendering of
/// a `tag` value (non-numeric, out of range, non-canonical boolean, or a byte
/// token outside `0..=255`).
pub fn decode(text: &str, tag: TypeTag) -> Result<Value, CodecError> {
    let value = match tag {
        TypeTag::Int8 => Value::Int8(parse(text, tag)?),
        TypeTag::Int16 => Value::Int16(parse(text, tag)?),
        TypeTag::Int32 => Value::Int32(parse(text, tag)?),
        TypeTag::Int64 => Value::Int64(parse(text, tag)?),
        TypeTag::Int => Value::Int(parse(text, tag)?),
        TypeTag::Uint8 => Value::Uint8(parse(text, tag)?),
        TypeTag::Uint16 => Value::Uint16(parse(text, tag)?),
        TypeTag::Uint32 => Value::Uint32(parse(text, tag)?),
        TypeTag::Uint64 => Value::Uint64(parse(text, tag)?),
        TypeTag::Uint => Value::Uint(parse(text, tag)?),
        TypeTag::Uintptr => Value::Uintptr(parse(text, tag)?),
        TypeTag::Float32 => Value::Float32(parse_float(text, tag)?),
        TypeTag::Float64 => Value::Float64(parse_float(text, tag)?),
        TypeTag::String => Value::String(text.to_owned()),
        TypeTag::Bool => Value::Bool(parse(text, tag)?),
        TypeTag::Bytes => Value::Bytes(decode_bytes(text)?),
        TypeTag::Strings => Value::Strings(decode_strings(text)),
    };
    Ok(value)
}

fn parse<T>(text: &str, tag: TypeTag) -> Result<T, CodecError>
where
    T: FromStr,
    T::Err: Display,
{
    text.parse::<T>().map_err(|e| CodecError::ParseFailure {
        type_tag: tag,
        reason: e.to_string(),
    })
}

/// Like [`parse`], but a finite literal that overflows the target width is a
/// range error rather than an infinity. Only `inf`/`infinity` spell infinity.
fn parse_float<T>(text: &str, tag: TypeTag) -> Result<T, CodecError>
where
    T: FromStr + Into<f64> + Copy,
    T::Err: Display,
{
    let value: T = parse(text, tag)?;
    if Into::<f64>::into(value).is_infinite() {
        let magnitude = text.trim().trim_start_matches(['+', '-']);
        let spelled = magnitude.eq_ignore_ascii_case("inf") || magnitude.eq_ignore_ascii_case("infinity");
        if !spelled {
            return Err(CodecError::ParseFailure {
                type_tag: tag,
                reason: "value out of range".into(),
            });
        }
    }
    Ok(value)
}

/// Brackets and whitespace are separators; every remaining token is one byte.
fn decode_bytes(text: &str) -> Result<Vec<u8>, CodecError> {
    text.split(|c: char| c == '[' || c == ']' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<u8>().map_err(|e| CodecError::ParseFailure {
                type_tag: TypeTag::Bytes,
                reason: format!("byte token {token:?}: {e}"),
            })
        })
        .collect()
}

fn decode_strings(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(STRING_SEPARATOR).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(value: Value) {
        let text = encode(&value);
        let decoded = decode(&text, value.type_tag()).unwrap();
        assert_eq!(decoded, value, "text was {text:?}");
    }

    #[test]
    fn every_scalar_round_trips() {
        round_trip(Value::Int8(-128));
        round_trip(Value::Int8(8));
        round_trip(Value::Int16(i16::MAX));
        round_trip(Value::Int32(-32));
        round_trip(Value::Int64(i64::MIN));
        round_trip(Value::Int(64));
        round_trip(Value::Uint8(u8::MAX));
        round_trip(Value::Uint16(16));
        round_trip(Value::Uint32(u32::MAX));
        round_trip(Value::Uint64(u64::MAX));
        round_trip(Value::Uint(64));
        round_trip(Value::Uintptr(usize::MAX));
        round_trip(Value::Float32(32.2));
        round_trip(Value::Float64(64.4));
        round_trip(Value::Float64(-1.5e-300));
        round_trip(Value::String("test met iets anders".into()));
        round_trip(Value::String(String::new()));
        round_trip(Value::Bool(true));
        round_trip(Value::Bool(false));
    }

    #[test]
    fn float32_is_exact_at_its_own_width() {
        let text = encode(&Value::Float32(32.2));
        assert_eq!(text, "32.2");
        assert_eq!(decode(&text, TypeTag::Float32).unwrap(), Value::Float32(32.2f32));
        // The same text read at 64 bits is not the widened f32.
        assert_ne!(f64::from(32.2f32), 32.2f64);
    }

    #[test]
    fn infinities_round_trip() {
        round_trip(Value::Float64(f64::INFINITY));
        round_trip(Value::Float32(f32::NEG_INFINITY));
    }

    #[test]
    fn bytes_encode_as_bracketed_list() {
        assert_eq!(encode(&Value::Bytes(vec![5, 4, 3, 2, 1])), "[5 4 3 2 1]");
        assert_eq!(encode(&Value::Bytes(vec![])), "[]");
    }

    #[test]
    fn bytes_decode_from_bracketed_list() {
        assert_eq!(
            decode("[5 4 3 2 1]", TypeTag::Bytes).unwrap(),
            Value::Bytes(vec![5, 4, 3, 2, 1])
        );
        assert_eq!(decode("[]", TypeTag::Bytes).unwrap(), Value::Bytes(vec![]));
        assert_eq!(decode("", TypeTag::Bytes).unwrap(), Value::Bytes(vec![]));
    }

    #[test]
    fn bytes_above_nine_round_trip() {
        // Multi-digit bytes are whole tokens, not one digit per byte.
        round_trip(Value::Bytes(vec![0, 9, 10, 99, 100, 255]));
        assert_eq!(
            decode("[10 255]", TypeTag::Bytes).unwrap(),
            Value::Bytes(vec![10, 255])
        );
    }

    #[test]
    fn bytes_reject_out_of_range_and_garbage_tokens() {
        assert!(matches!(
            decode("[1 256]", TypeTag::Bytes),
            Err(CodecError::ParseFailure { type_tag: TypeTag::Bytes, .. })
        ));
        assert!(decode("[1 x 3]", TypeTag::Bytes).is_err());
        assert!(decode("[-1]", TypeTag::Bytes).is_err());
    }

    #[test]
    fn packed_digits_are_one_token_not_one_byte_each() {
        assert!(decode("[54321]", TypeTag::Bytes).is_err());
        assert_eq!(
            decode("[123]", TypeTag::Bytes).unwrap(),
            Value::Bytes(vec![123])
        );
        round_trip(Value::Bytes(vec![255, 0, 17]));
        assert_eq!(encode(&Value::Bytes(vec![255, 0, 17])), "[255 0 17]");
    }

    #[test]
    fn strings_join_with_separator() {
        let value = Value::Strings(vec!["test".into(), "test met iets anders".into()]);
        assert_eq!(encode(&value), "test°test met iets anders");
        round_trip(value);
        round_trip(Value::Strings(vec![]));
        round_trip(Value::Strings(vec!["a".into(), String::new(), "c".into()]));
    }

    #[test]
    fn strings_containing_separator_are_corrupted() {
        let value = Value::Strings(vec!["20°C".into(), "dry".into()]);
        let decoded = decode(&encode(&value), TypeTag::Strings).unwrap();
        assert_eq!(
            decoded,
            Value::Strings(vec!["20".into(), "C".into(), "dry".into()])
        );
        assert_ne!(decoded, value);
    }

    #[test]
    fn single_empty_string_decodes_as_empty_sequence() {
        let value = Value::Strings(vec![String::new()]);
        assert_eq!(
            decode(&encode(&value), TypeTag::Strings).unwrap(),
            Value::Strings(vec![])
        );
    }

    #[test]
    fn integers_reject_out_of_range() {
        assert!(decode("128", TypeTag::Int8).is_err());
        assert!(decode("256", TypeTag::Uint8).is_err());
        assert!(decode("70000", TypeTag::Int16).is_err());
        assert!(decode("-1", TypeTag::Uint64).is_err());
        assert!(decode("18446744073709551616", TypeTag::Uint64).is_err());
        // Widths above 8 bits accept values above 8 bits.
        assert_eq!(decode("300", TypeTag::Int16).unwrap(), Value::Int16(300));
        assert_eq!(decode("70000", TypeTag::Int32).unwrap(), Value::Int32(70000));
    }

    #[test]
    fn integers_reject_non_numeric() {
        let err = decode("eight", TypeTag::Int32).unwrap_err();
        assert!(matches!(err, CodecError::ParseFailure { type_tag: TypeTag::Int32, .. }));
        assert!(decode("", TypeTag::Int64).is_err());
        assert!(decode("1.5", TypeTag::Int64).is_err());
    }

    #[test]
    fn floats_reject_non_numeric() {
        assert!(decode("sixty", TypeTag::Float64).is_err());
        assert!(decode("", TypeTag::Float32).is_err());
    }

    #[test]
    fn floats_reject_out_of_range_literals() {
        assert!(matches!(
            decode("1e39", TypeTag::Float32),
            Err(CodecError::ParseFailure { .. })
        ));
        assert!(decode("-1e39", TypeTag::Float32).is_err());
        assert!(decode("1e400", TypeTag::Float64).is_err());
        assert_eq!(decode("3.4e38", TypeTag::Float32).unwrap(), Value::Float32(3.4e38));
        assert_eq!(decode("-Infinity", TypeTag::Float64).unwrap(), Value::Float64(f64::NEG_INFINITY));
    }

    #[test]
    fn bool_accepts_only_canonical_forms() {
        assert_eq!(decode("true", TypeTag::Bool).unwrap(), Value::Bool(true));
        assert_eq!(decode("false", TypeTag::Bool).unwrap(), Value::Bool(false));
        for text in ["1", "0", "t", "TRUE", "True", "yes", ""] {
            assert!(decode(text, TypeTag::Bool).is_err(), "{text:?} accepted");
        }
    }

    #[test]
    fn string_decode_is_verbatim() {
        assert_eq!(
            decode(" padded ", TypeTag::String).unwrap(),
            Value::String(" padded ".into())
        );
    }
}
