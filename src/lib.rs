//! Familiar Validation
//!
//! A metadata-driven schema compiler and validation engine for model forms.
//! Model metadata (field names, primitive types, validation rules, edit
//! rules) is compiled into an immutable schema; the schema decodes untrusted
//! JSON into either a clean value or a list of field-addressed errors that
//! any form renderer can display.
//!
//! ## Features
//!
//! - **Primitive Schemas**: string, number, boolean, literal-set and opaque
//!   schemas with composable length, range, pattern, email and url constraints
//! - **Rule Folding**: declarative rules applied in order; rules that do not
//!   fit a field's type are skipped rather than failing the compile
//! - **Total Compilation**: every model compiles; unknown types degrade to strings
//! - **Structured Errors**: every failing field is reported with its path
//! - **Form Sessions**: whole-form and per-field validation with dirty/valid tracking
//! - **Standard Schema Adapter**: a two-call `parse` / `safe_parse` contract
//!
//! ## Data Flow
//!
//! ```text
//! ModelMetadata ──compile──▶ StructSchema ──decode──▶ Ok(value) | Err([DecodeError])
//!                                 │                          │
//!                                 ├──▶ FormValidationState ◀─┘
//!                                 └──▶ SchemaAdapter (StandardSchema)
//! ```
//!
//! ## Example
//!
//! ```
//! use familiar_validation::{compile, decode, FieldDataType, FieldMetadata, ModelMetadata};
//! use familiar_validation::{RuleValue, ValidationRule, ValidationRuleType};
//! use serde_json::json;
//!
//! let model = ModelMetadata::new("Person")
//!     .field(
//!         FieldMetadata::new("name", FieldDataType::String)
//!             .required()
//!             .rule(ValidationRule::with_value(
//!                 ValidationRuleType::MinLength,
//!                 RuleValue::Number(2.0),
//!             )),
//!     )
//!     .field(
//!         FieldMetadata::new("age", FieldDataType::Number)
//!             .required()
//!             .rule(ValidationRule::with_value(ValidationRuleType::Min, RuleValue::Number(0.0))),
//!     );
//!
//! let schema = compile(&model);
//! let err = decode::validate(&schema, &json!({"name": "A", "age": -1})).unwrap_err();
//! let paths: Vec<String> = err.decode_errors().unwrap().iter().map(|e| e.path_string()).collect();
//! assert_eq!(paths, vec!["name", "age"]);
//! ```

pub mod adapter;
pub mod compiler;
pub mod config;
pub mod decode;
pub mod error;
pub mod form;
pub mod metadata;
pub mod predicates;
pub mod rules;
pub mod schema;

pub use adapter::{form_schema, IntoStandardSchema, ParseResult, SchemaAdapter, StandardSchema};
pub use compiler::{compile, compile_field, SchemaCompiler};
pub use config::ValidatorConfig;
pub use decode::{DecodeError, PathSegment};
pub use error::{Result, SchemaError};
pub use form::{FormData, FormStatus, FormValidationState};
pub use metadata::{
    EditRuleConfig, FieldDataType, FieldMetadata, FieldTypeConfig, ModelMetadata, RuleValue,
    ValidationRule, ValidationRuleType,
};
pub use rules::CustomRules;
pub use schema::{Constraint, CustomCheck, Pattern, Schema, StructSchema};
