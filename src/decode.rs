//! Decoder
//!
//! Checks an untyped JSON value against a [`Schema`] and yields either the
//! decoded value or every path-addressed [`DecodeError`] found.
//!
//! - Atomic schemas stop at the first failing check (base type first, then
//!   constraints in attachment order) and report one error with an empty path.
//! - Struct schemas decode every member; errors from each member are prefixed
//!   with the member name. Keys not declared by the struct are dropped.
//! - Optional schemas accept an absent or null value and contribute nothing.
//!
//! Decoding is a pure function of `(schema, input)`; the same schema may be
//! decoded from many threads at once.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SchemaError};
use crate::schema::{messages, Schema, StructSchema};

/// One step of an error path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single path-addressed validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeError {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl DecodeError {
    /// Error with an empty path
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    pub fn at<I, S>(path: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Same error, one level deeper
    pub fn prefixed(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// First path segment when it names a field
    pub fn field(&self) -> Option<&str> {
        self.path.first().and_then(PathSegment::as_key)
    }

    /// Whether this error belongs to the top-level field `name`
    pub fn is_for(&self, name: &str) -> bool {
        self.field() == Some(name)
    }

    /// Dot-joined path, e.g. `address.city`
    pub fn path_string(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path_string(), self.message)
        }
    }
}

/// `Ok(None)` means the input was absent and accepted without a value
type Outcome = std::result::Result<Option<Value>, Vec<DecodeError>>;

/// Decode `input` against any schema
pub fn decode(schema: &Schema, input: &Value) -> Result<Value> {
    match decode_node(schema, Some(input))? {
        Ok(value) => Ok(value.unwrap_or(Value::Null)),
        Err(errors) => {
            tracing::trace!(errors = errors.len(), "input rejected");
            Err(SchemaError::Validation(errors))
        }
    }
}

/// Decode and deserialise the output into `T`
pub fn decode_as<T: DeserializeOwned>(schema: &Schema, input: &Value) -> Result<T> {
    let value = decode(schema, input)?;
    Ok(serde_json::from_value(value)?)
}

/// Whole-document decode: every member of `schema` is evaluated
pub fn validate(schema: &StructSchema, input: &Value) -> Result<Map<String, Value>> {
    match decode_struct(schema, Some(input))? {
        Ok(map) => Ok(map),
        Err(errors) => {
            tracing::trace!(errors = errors.len(), "document rejected");
            Err(SchemaError::Validation(errors))
        }
    }
}

/// Single-field decode
///
/// Builds a struct holding only `name` and decodes `{name: value}`, so rules
/// spanning several fields are not evaluated here. Returns the decoded member
/// value, or `None` if an optional member was absent.
pub fn validate_field(
    schema: &StructSchema,
    name: &str,
    value: Option<&Value>,
) -> Result<Option<Value>> {
    let picked = schema.pick(name).ok_or_else(|| schema.unknown_field(name))?;

    let mut input = Map::new();
    if let Some(value) = value {
        input.insert(name.to_string(), value.clone());
    }

    let mut decoded = validate(&picked, &Value::Object(input))?;
    Ok(decoded.remove(name))
}

/// Flatten a failure into reportable errors
///
/// Validation failures yield their collected errors; anything else becomes a
/// single path-less error carrying `generic_message`.
pub fn failure_errors(error: SchemaError, generic_message: &str) -> Vec<DecodeError> {
    match error {
        SchemaError::Validation(errors) => errors,
        other => {
            tracing::warn!(error = %other, "validation aborted");
            vec![DecodeError::new(generic_message)]
        }
    }
}

/// Flatten a [`validate_field`] failure into errors addressed to `name`
///
/// Unknown fields keep their "did you mean" text. Path-less generic errors
/// are moved under `name` so callers can merge them with per-field errors.
pub fn field_failure_errors(
    name: &str,
    error: SchemaError,
    generic_message: &str,
) -> Vec<DecodeError> {
    match error {
        SchemaError::UnknownField { .. } => {
            tracing::warn!(field = name, error = %error, "field is not declared by the schema");
            vec![DecodeError::at([name], error.to_string())]
        }
        other => failure_errors(other, generic_message)
            .into_iter()
            .map(|e| if e.path.is_empty() { e.prefixed(name) } else { e })
            .filter(|e| e.is_for(name))
            .collect(),
    }
}

fn decode_node(schema: &Schema, input: Option<&Value>) -> Result<Outcome> {
    match schema {
        Schema::Optional(inner) => match input {
            None | Some(Value::Null) => Ok(Ok(None)),
            Some(_) => decode_node(inner, input),
        },
        Schema::Unknown => Ok(Ok(input.cloned())),
        Schema::Atomic(atomic) => {
            let Some(value) = input else {
                return Ok(Err(vec![DecodeError::new(messages::REQUIRED)]));
            };
            match atomic.first_violation(value)? {
                Some(message) => Ok(Err(vec![DecodeError::new(message)])),
                None => Ok(Ok(Some(value.clone()))),
            }
        }
        Schema::Struct(fields) => {
            Ok(decode_struct(fields, input)?.map(|map| Some(Value::Object(map))))
        }
    }
}

fn decode_struct(
    schema: &StructSchema,
    input: Option<&Value>,
) -> Result<std::result::Result<Map<String, Value>, Vec<DecodeError>>> {
    let object = match input {
        None => return Ok(Err(vec![DecodeError::new(messages::REQUIRED)])),
        Some(Value::Object(object)) => object,
        Some(_) => return Ok(Err(vec![DecodeError::new(messages::OBJECT)])),
    };

    let mut output = Map::new();
    let mut errors = Vec::new();

    for (name, member) in schema.fields() {
        match decode_node(member, object.get(name))? {
            Ok(Some(value)) => {
                output.insert(name.to_string(), value);
            }
            Ok(None) => {}
            Err(member_errors) => {
                errors.extend(member_errors.into_iter().map(|e| e.prefixed(name)));
            }
        }
    }

    if errors.is_empty() {
        Ok(Ok(output))
    } else {
        Ok(Err(errors))
    }
}
