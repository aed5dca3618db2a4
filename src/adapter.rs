//! Standard schema adapter
//!
//! Form layers and other consumers depend on [`StandardSchema`] only: a
//! synchronous `parse` and an asynchronous `safe_parse`, both returning a
//! [`ParseResult`] shaped `{success, data?, errors?}` and neither ever
//! failing. The two calls produce identical results for identical input.
//!
//! [`form_schema`] wraps anything schema-like; values that already implement
//! the contract are passed through unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decode::{self, DecodeError};
use crate::error::Result;
use crate::schema::{messages, Schema, StructSchema};

/// Outcome of a parse
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<DecodeError>>,
}

impl ParseResult {
    pub fn success(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            errors: None,
        }
    }

    pub fn failure(errors: Vec<DecodeError>) -> Self {
        Self {
            success: false,
            data: None,
            errors: Some(errors),
        }
    }

    /// Convert a decode outcome; non-validation failures become one generic error
    pub fn from_decode(result: Result<Value>, generic_message: &str) -> Self {
        match result {
            Ok(data) => Self::success(data),
            Err(error) => Self::failure(decode::failure_errors(error, generic_message)),
        }
    }

    pub fn into_result(self) -> std::result::Result<Value, Vec<DecodeError>> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(self.errors.unwrap_or_default())
        }
    }
}

/// Schema-implementation-agnostic validation contract
#[async_trait]
pub trait StandardSchema: Send + Sync {
    fn parse(&self, input: &Value) -> ParseResult;

    async fn safe_parse(&self, input: &Value) -> ParseResult;
}

/// [`StandardSchema`] over a compiled [`Schema`]
#[derive(Debug, Clone)]
pub struct SchemaAdapter {
    schema: Arc<Schema>,
    generic_message: String,
}

impl SchemaAdapter {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            generic_message: messages::GENERIC.to_string(),
        }
    }

    pub fn with_generic_message(mut self, message: impl Into<String>) -> Self {
        self.generic_message = message.into();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

#[async_trait]
impl StandardSchema for SchemaAdapter {
    fn parse(&self, input: &Value) -> ParseResult {
        ParseResult::from_decode(decode::decode(&self.schema, input), &self.generic_message)
    }

    async fn safe_parse(&self, input: &Value) -> ParseResult {
        self.parse(input)
    }
}

/// Conversion into the shared contract
pub trait IntoStandardSchema {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema>;
}

impl IntoStandardSchema for Schema {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema> {
        Arc::new(SchemaAdapter::new(self))
    }
}

impl IntoStandardSchema for StructSchema {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema> {
        Schema::from(self).into_standard_schema()
    }
}

impl IntoStandardSchema for Arc<Schema> {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema> {
        Arc::new(SchemaAdapter::new(self))
    }
}

impl IntoStandardSchema for SchemaAdapter {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema> {
        Arc::new(self)
    }
}

impl IntoStandardSchema for Arc<dyn StandardSchema> {
    fn into_standard_schema(self) -> Arc<dyn StandardSchema> {
        self
    }
}

/// Schema usable by form components
pub fn form_schema(schema: impl IntoStandardSchema) -> Arc<dyn StandardSchema> {
    schema.into_standard_schema()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::PathSegment;
    use serde_json::json;

    fn schema() -> StructSchema {
        StructSchema::new()
            .field("email", Schema::string(None).email(Some("Bad address".to_string())))
            .field("age", Schema::number(None).range(18.0, 99.0, None).optional())
    }

    #[test]
    fn test_parse_success() {
        let adapter = form_schema(schema());
        let result = adapter.parse(&json!({"email": "a@b.co", "age": 30}));
        assert!(result.success);
        assert_eq!(result.data, Some(json!({"email": "a@b.co", "age": 30})));
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_parse_failure_shape() {
        let adapter = form_schema(schema());
        let result = adapter.parse(&json!({"email": "nope", "age": 5}));
        assert!(!result.success);

        let wire = serde_json::to_value(&result).unwrap();
        assert_eq!(
            wire,
            json!({
                "success": false,
                "errors": [
                    {"path": ["email"], "message": "Bad address"},
                    {"path": ["age"], "message": "Must be between 18 and 99"}
                ]
            })
        );
    }

    #[tokio::test]
    async fn test_sync_and_async_agree() {
        let adapter = form_schema(schema());
        for input in [json!({"email": "x"}), json!({"email": "a@b.co"}), json!("text")] {
            assert_eq!(adapter.parse(&input), adapter.safe_parse(&input).await);
        }
    }

    #[test]
    fn test_wrapping_is_idempotent() {
        let wrapped = form_schema(schema());
        let again = form_schema(wrapped.clone());
        assert!(Arc::ptr_eq(&wrapped, &again));
    }

    #[test]
    fn test_unexpected_failure_becomes_generic_error() {
        let adapter = SchemaAdapter::new(Schema::string(None).pattern("(", None))
            .with_generic_message("Unavailable");
        let result = adapter.parse(&json!("x"));
        assert_eq!(result.into_result(), Err(vec![DecodeError::new("Unavailable")]));
    }

    #[test]
    fn test_non_object_input() {
        let result = form_schema(schema()).parse(&json!(42));
        let errors = result.into_result().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, Vec::<PathSegment>::new());
        assert_eq!(errors[0].message, messages::OBJECT);
    }
}
