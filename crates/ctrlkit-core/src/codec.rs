/*!
 * String normalization helpers.
 *
 * Device backends hand back text either as native strings or as raw byte
 * buffers. These conversions are total: they never fail and never panic.
 */
use crate::types::Value;

/// Values accepted as `true` by [`str2bool`] for textual input
const TRUTHY_STRINGS: [&str; 4] = ["yes", "true", "t", "1"];

/// Returns a native string regardless of whether the input is text or bytes.
///
/// Bytes are decoded as ASCII; anything outside the ASCII range becomes
/// U+FFFD. Values that are neither text nor bytes are stringified.
pub fn to_native_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Binary(bytes) => bytes
            .iter()
            .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
            .collect(),
        other => other.to_string(),
    }
}

/// Returns the input as a byte sequence.
///
/// Text is UTF-8 encoded and bytes are copied. An array whose items are all
/// integers in `0..=255` is taken as the bytes themselves; any other value is
/// encoded through its textual representation.
pub fn to_binary_str(value: &Value) -> Vec<u8> {
    match value {
        Value::String(s) => s.as_bytes().to_vec(),
        Value::Binary(bytes) => bytes.clone(),
        Value::Array(items) => byte_array(items).unwrap_or_else(|| value.to_string().into_bytes()),
        other => other.to_string().into_bytes(),
    }
}

fn byte_array(items: &[Value]) -> Option<Vec<u8>> {
    items
        .iter()
        .map(|item| match item {
            Value::Integer(i) => u8::try_from(*i).ok(),
            _ => None,
        })
        .collect()
}

/// Decodes binary input as UTF-8; any other value is returned unchanged.
pub fn to_utf8_str(value: &Value) -> Value {
    match value {
        Value::Binary(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        other => other.clone(),
    }
}

/// Interprets a value as a boolean.
///
/// Text is matched case-insensitively against `yes`, `true`, `t` and `1`;
/// anything else is `false`. Non-text values use their natural truthiness:
/// null is false, numbers are true when non-zero, bytes and arrays are true
/// when non-empty.
pub fn str2bool(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            let lowered = s.to_lowercase();
            TRUTHY_STRINGS.contains(&lowered.as_str())
        }
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Binary(bytes) => !bytes.is_empty(),
        Value::Array(items) => !items.is_empty(),
    }
}
