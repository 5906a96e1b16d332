//! Value Coercion Unit: normalizes raw container values.
//!
//! Raw dataset reads surface byte strings, native numeric scalars, and
//! fixed-size arrays. [`coerce`] converts them into plain JSON values so that
//! no container-native type survives into the output document. Rules, in
//! order:
//!
//! 1. Byte strings decode as UTF-8.
//! 2. Numeric scalars (including zero-dimensional arrays) unwrap to plain
//!    int/float.
//! 3. Single-element arrays unwrap to their scalar; multi-element arrays map
//!    each element through rules 1-2. A mapped list of length one collapses
//!    to its sole element (kept for output compatibility with existing
//!    archives).
//! 4. Decoded strings get a numeric promotion attempt: integer parse first,
//!    then float. Failure keeps the string unchanged and is never an error.

use serde_json::Value;

use crate::container::RawValue;

/// Errors raised by value coercion.
///
/// Failed numeric promotion is not an error; only undecodable byte strings
/// are.
#[derive(Debug, thiserror::Error)]
pub enum CoerceError {
    /// A byte string was not valid UTF-8.
    #[error("Invalid UTF-8 in byte string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Normalize a raw container value into a plain JSON value.
pub fn coerce(raw: RawValue) -> Result<Value, CoerceError> {
    match raw {
        RawValue::Bytes(bytes) => Ok(promote(String::from_utf8(bytes)?)),
        RawValue::Text(text) => Ok(promote(text)),
        RawValue::Int(value) => Ok(Value::from(value)),
        RawValue::Float(value) => Ok(Value::from(value)),
        RawValue::Bool(value) => Ok(Value::from(value)),
        RawValue::BytesList(items) => {
            let values = items
                .into_iter()
                .map(|bytes| Ok(promote(String::from_utf8(bytes)?)))
                .collect::<Result<Vec<_>, CoerceError>>()?;
            Ok(collapse(values))
        }
        RawValue::TextList(items) => Ok(collapse(items.into_iter().map(promote).collect())),
        RawValue::IntList(items) => Ok(collapse(items.into_iter().map(Value::from).collect())),
        RawValue::FloatList(items) => Ok(collapse(items.into_iter().map(Value::from).collect())),
    }
}

/// Decode a raw value into a display string, formatting numerics as text.
///
/// Used for identity fields (sample ids, user names) that are occasionally
/// written as numbers instead of strings.
pub fn display_string(raw: RawValue) -> Result<Option<String>, CoerceError> {
    match raw {
        RawValue::Bytes(bytes) => Ok(Some(String::from_utf8(bytes)?)),
        RawValue::Text(text) => Ok(Some(text)),
        RawValue::Int(value) => Ok(Some(value.to_string())),
        RawValue::Float(value) => Ok(Some(value.to_string())),
        RawValue::Bool(value) => Ok(Some(value.to_string())),
        // Array-shaped identity fields are malformed; callers fall back.
        _ => Ok(None),
    }
}

/// Decode a raw value into a list of strings without numeric promotion.
///
/// Scalars read as single-element lists; tag lists are the main consumer.
pub fn string_list(raw: RawValue) -> Result<Vec<String>, CoerceError> {
    match raw {
        RawValue::Bytes(bytes) => Ok(vec![String::from_utf8(bytes)?]),
        RawValue::Text(text) => Ok(vec![text]),
        RawValue::Int(value) => Ok(vec![value.to_string()]),
        RawValue::Float(value) => Ok(vec![value.to_string()]),
        RawValue::Bool(value) => Ok(vec![value.to_string()]),
        RawValue::BytesList(items) => items
            .into_iter()
            .map(|bytes| Ok(String::from_utf8(bytes)?))
            .collect(),
        RawValue::TextList(items) => Ok(items),
        RawValue::IntList(items) => Ok(items.into_iter().map(|v| v.to_string()).collect()),
        RawValue::FloatList(items) => Ok(items.into_iter().map(|v| v.to_string()).collect()),
    }
}

/// Attempt numeric promotion of a decoded string.
///
/// Integer parse wins over float parse; a non-numeric string is returned
/// unchanged. Non-finite promotions (`"nan"`, `"inf"`) keep the string, as
/// JSON numbers cannot carry them.
pub fn promote(text: String) -> Value {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Value::from(value);
    }
    if let Ok(value) = trimmed.parse::<f64>() {
        if value.is_finite() {
            return Value::from(value);
        }
    }
    Value::String(text)
}

// Single-element list collapse, see module docs rule 3.
fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn byte_string_decodes_to_text() {
        let value = coerce(RawValue::Bytes(b"demo instrument".to_vec())).unwrap();
        assert_eq!(value, Value::String("demo instrument".to_owned()));
    }

    #[test]
    fn integer_string_promotes_to_int() {
        let value = coerce(RawValue::Text("42".to_owned())).unwrap();
        assert_eq!(value, Value::from(42));
    }

    #[test]
    fn float_string_promotes_to_float() {
        let value = coerce(RawValue::Text("2.5".to_owned())).unwrap();
        assert_eq!(value, Value::from(2.5));
    }

    #[test]
    fn non_numeric_string_is_kept_unchanged() {
        let value = coerce(RawValue::Text("linear".to_owned())).unwrap();
        assert_eq!(value, Value::String("linear".to_owned()));
    }

    #[test]
    fn non_finite_promotion_keeps_string() {
        let value = coerce(RawValue::Text("nan".to_owned())).unwrap();
        assert_eq!(value, Value::String("nan".to_owned()));
    }

    #[test]
    fn numeric_scalars_unwrap() {
        assert_eq!(coerce(RawValue::Int(7)).unwrap(), Value::from(7));
        assert_eq!(coerce(RawValue::Float(1.5)).unwrap(), Value::from(1.5));
    }

    #[test]
    fn multi_element_array_maps_elements() {
        let value = coerce(RawValue::FloatList(vec![1.0, 2.0, 27.0])).unwrap();
        assert_eq!(value, serde_json::json!([1.0, 2.0, 27.0]));
    }

    #[test]
    fn single_element_list_collapses() {
        let value = coerce(RawValue::TextList(vec!["only".to_owned()])).unwrap();
        assert_eq!(value, Value::String("only".to_owned()));
    }

    #[test]
    fn numeric_strings_in_arrays_promote() {
        let value = coerce(RawValue::TextList(vec!["1".to_owned(), "x".to_owned()])).unwrap();
        assert_eq!(value, serde_json::json!([1, "x"]));
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        assert!(coerce(RawValue::Bytes(vec![0xff, 0xfe])).is_err());
    }

    #[test]
    fn display_string_formats_numerics() {
        assert_eq!(
            display_string(RawValue::Int(123)).unwrap(),
            Some("123".to_owned())
        );
        assert_eq!(
            display_string(RawValue::FloatList(vec![1.0])).unwrap(),
            None
        );
    }

    proptest! {
        // Round-trip law: any integer-valued string coerces to that integer.
        #[test]
        fn integer_round_trip(n in any::<i64>()) {
            let value = coerce(RawValue::Text(n.to_string())).unwrap();
            prop_assert_eq!(value, Value::from(n));
        }

        // Identity law: strings with no leading digit, sign, dot, or
        // whitespace never promote.
        #[test]
        fn non_numeric_identity(s in "[a-zA-Z_][a-zA-Z0-9 _]*") {
            prop_assume!(s.trim().parse::<f64>().is_err());
            let value = coerce(RawValue::Text(s.clone())).unwrap();
            prop_assert_eq!(value, Value::String(s));
        }
    }
}
