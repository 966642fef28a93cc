// JSON -> wire model decoding. Pure: no I/O, no caching.
//
// Payloads are parsed to `serde_json::Value` first, then deserialized through
// `serde_path_to_error` so every data error carries the JSON path of the field
// that failed (e.g. `[2].State` or `Mounts[0].Type`).

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Prefix serde uses for enum values outside the accepted set.
const UNKNOWN_VARIANT_PREFIX: &str = "unknown variant `";

/// Field-level decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Enum field holding a value outside its recognized set.
    #[error("unrecognized value {value:?} at `{field}`")]
    UnrecognizedValue { field: String, value: String },

    /// Missing required field, wrong type, out-of-range number, bad timestamp.
    #[error("invalid data at `{field}`: {message}")]
    Invalid { field: String, message: String },

    /// Payload is not JSON at all (or is truncated).
    #[error("malformed JSON: {message}")]
    Syntax { message: String },
}

impl DecodeError {
    /// JSON path of the failing field (`.` for the document root); `None` for syntax errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            DecodeError::UnrecognizedValue { field, .. } | DecodeError::Invalid { field, .. } => {
                Some(field)
            }
            DecodeError::Syntax { .. } => None,
        }
    }

    fn from_path_error(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let field = err.path().to_string();
        let message = err.into_inner().to_string();
        match unknown_variant_value(&message) {
            Some(value) => DecodeError::UnrecognizedValue {
                field,
                value: value.to_string(),
            },
            None => DecodeError::Invalid { field, message },
        }
    }

    /// Prefixes the field path with a list index, e.g. `State` -> `[3].State`.
    fn at_index(self, index: usize) -> Self {
        let prefix = |field: String| {
            if field == "." {
                format!("[{index}]")
            } else if field.starts_with('[') {
                format!("[{index}]{field}")
            } else {
                format!("[{index}].{field}")
            }
        };
        match self {
            DecodeError::UnrecognizedValue { field, value } => DecodeError::UnrecognizedValue {
                field: prefix(field),
                value,
            },
            DecodeError::Invalid { field, message } => DecodeError::Invalid {
                field: prefix(field),
                message,
            },
            syntax @ DecodeError::Syntax { .. } => syntax,
        }
    }
}

/// Extracts `zombie` from "unknown variant `zombie`, expected one of ...".
fn unknown_variant_value(message: &str) -> Option<&str> {
    message
        .strip_prefix(UNKNOWN_VARIANT_PREFIX)
        .and_then(|rest| rest.split_once('`'))
        .map(|(value, _)| value)
}

fn parse(bytes: &[u8]) -> Result<Value, DecodeError> {
    serde_json::from_slice(bytes).map_err(|e| DecodeError::Syntax {
        message: e.to_string(),
    })
}

/// Decodes a single record from raw response bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    decode_value(parse(bytes)?)
}

/// Decodes a single record from an already-parsed JSON value.
pub fn decode_value<T: DeserializeOwned>(value: Value) -> Result<T, DecodeError> {
    serde_path_to_error::deserialize(value).map_err(DecodeError::from_path_error)
}

/// What to do when one element of a list response fails to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListPolicy {
    /// Fail the whole response on the first bad element.
    Abort,
    /// Drop bad elements and report them in [`DecodedList::skipped`].
    #[default]
    SkipInvalid,
}

/// Element dropped under [`ListPolicy::SkipInvalid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedElement {
    pub index: usize,
    pub error: DecodeError,
}

/// Result of decoding a list response.
#[derive(Debug, Clone)]
pub struct DecodedList<T> {
    pub items: Vec<T>,
    pub skipped: Vec<SkippedElement>,
}

impl<T> DecodedList<T> {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Decodes a JSON array element by element under the given policy.
///
/// A payload that is not an array fails regardless of policy. A bad nested
/// element (one malformed mount inside a container) fails its enclosing
/// top-level element, which the policy then drops or aborts on.
pub fn decode_list<T: DeserializeOwned>(
    bytes: &[u8],
    policy: ListPolicy,
) -> Result<DecodedList<T>, DecodeError> {
    let elements = match parse(bytes)? {
        Value::Array(elements) => elements,
        other => {
            return Err(DecodeError::Invalid {
                field: ".".into(),
                message: format!("expected a JSON array, found {}", json_kind(&other)),
            });
        }
    };

    let mut items = Vec::with_capacity(elements.len());
    let mut skipped = Vec::new();
    for (index, element) in elements.into_iter().enumerate() {
        match decode_value(element) {
            Ok(item) => items.push(item),
            Err(e) => {
                let error = e.at_index(index);
                match policy {
                    ListPolicy::Abort => return Err(error),
                    ListPolicy::SkipInvalid => skipped.push(SkippedElement { index, error }),
                }
            }
        }
    }
    Ok(DecodedList { items, skipped })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
