//! Metadata compiler
//!
//! Turns [`ModelMetadata`] into a [`StructSchema`] whose members mirror the
//! model's fields in declared order. For each field the atomic schema is
//! chosen from the field's data type, the field's rules are folded onto it
//! (see [`rules`](crate::rules)), and the result is wrapped in `optional`
//! unless the edit rule marks the field required.
//!
//! Compilation is total. Unrecognised data types fall back to a plain string
//! schema, and rules that do not fit a field's type are skipped.

use crate::adapter::SchemaAdapter;
use crate::config::{MessageConfig, ValidatorConfig};
use crate::form::{FormData, FormValidationState};
use crate::metadata::{FieldDataType, FieldMetadata, FieldTypeConfig, ModelMetadata};
use crate::rules::{apply_rules, CustomRules};
use crate::schema::{Schema, StructSchema};

/// Compiles model metadata into schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaCompiler {
    messages: MessageConfig,
    custom: CustomRules,
}

impl SchemaCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiler using the message overrides from `config`
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new().with_messages(config.messages.clone())
    }

    pub fn with_messages(mut self, messages: MessageConfig) -> Self {
        self.messages = messages;
        self
    }

    /// Checks available to `custom` rules
    pub fn with_custom_rules(mut self, custom: CustomRules) -> Self {
        self.custom = custom;
        self
    }

    /// Message reported when validation aborts for a reason other than bad input
    pub fn generic_message(&self) -> &str {
        &self.messages.generic
    }

    /// Adapter over `schema` carrying this compiler's generic message
    pub fn adapter(&self, schema: StructSchema) -> SchemaAdapter {
        SchemaAdapter::new(Schema::from(schema)).with_generic_message(self.generic_message())
    }

    /// Form session over `schema` carrying this compiler's generic message
    pub fn form(&self, schema: StructSchema, initial: FormData) -> FormValidationState {
        FormValidationState::new(schema, initial).with_generic_message(self.generic_message())
    }

    /// Compile a whole model
    pub fn compile(&self, model: &ModelMetadata) -> StructSchema {
        let mut schema = StructSchema::new();

        for field in &model.fields {
            if schema.insert(field.name.as_str(), self.compile_field(field)).is_some() {
                tracing::warn!(
                    model = %model.name,
                    field = %field.name,
                    "duplicate field name; later definition replaces the earlier one"
                );
            }
        }

        tracing::debug!(model = %model.name, fields = schema.len(), "compiled model schema");
        schema
    }

    /// Compile a single field: base schema, folded rules, optionality
    pub fn compile_field(&self, field: &FieldMetadata) -> Schema {
        let base = self.base_schema(&field.field_type);
        let schema = apply_rules(base, field.rules(), &self.custom);

        if field.edit_rule.required {
            schema
        } else {
            schema.optional()
        }
    }

    /// Atomic schema for a field type, before any rules
    pub fn base_schema(&self, field_type: &FieldTypeConfig) -> Schema {
        match field_type.data_type {
            FieldDataType::String
            | FieldDataType::Text
            | FieldDataType::Email
            | FieldDataType::Url => {
                self.string()
            }
            FieldDataType::Number => Schema::number(self.messages.number.clone()),
            FieldDataType::Boolean => Schema::boolean(self.messages.boolean.clone()),
            // Temporal values stay strings at this layer
            FieldDataType::Date | FieldDataType::Datetime | FieldDataType::Time => self.string(),
            FieldDataType::Json => Schema::unknown(),
            FieldDataType::Enum => match &field_type.enum_values {
                Some(values) => {
                    Schema::literal(values.iter().cloned(), self.messages.enumeration.clone())
                }
                None => self.string(),
            },
            // Relation keys and unrecognised types are carried as plain strings
            FieldDataType::Relation | FieldDataType::Unknown => self.string(),
        }
    }

    fn string(&self) -> Schema {
        Schema::string(self.messages.string.clone())
    }
}

/// Compile a model with default messages and no custom checks
pub fn compile(model: &ModelMetadata) -> StructSchema {
    SchemaCompiler::default().compile(model)
}

/// Compile one field with default messages and no custom checks
pub fn compile_field(field: &FieldMetadata) -> Schema {
    SchemaCompiler::default().compile_field(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StandardSchema;
    use crate::metadata::{RuleValue, ValidationRule, ValidationRuleType};
    use crate::schema::AtomicKind;

    fn model() -> ModelMetadata {
        ModelMetadata::new("Profile")
            .field(
                FieldMetadata::new("name", FieldDataType::String)
                    .required()
                    .rule(ValidationRule::with_value(
                        ValidationRuleType::MinLength,
                        RuleValue::Number(2.0),
                    )),
            )
            .field(
                FieldMetadata::new("age", FieldDataType::Number)
                    .required()
                    .rule(ValidationRule::with_value(
                        ValidationRuleType::Min,
                        RuleValue::Number(0.0),
                    )),
            )
            .field(FieldMetadata::new("bio", FieldDataType::Text))
            .field(FieldMetadata::new("active", FieldDataType::Boolean))
            .field(FieldMetadata::new("born", FieldDataType::Date))
            .field(FieldMetadata::new("extra", FieldDataType::Json))
            .field(FieldMetadata::with_type(
                "role",
                FieldTypeConfig::enumeration(["admin", "member"]),
            ))
            .field(FieldMetadata::new("tier", FieldDataType::Enum))
            .field(FieldMetadata::new("owner", FieldDataType::Relation))
            .field(FieldMetadata::new("blob", FieldDataType::Unknown))
    }

    #[test]
    fn test_field_set_matches_model_order() {
        let model = model();
        let schema = compile(&model);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), model.field_names());
    }

    #[test]
    fn test_type_mapping() {
        let schema = compile(&model());
        let kind = |name: &str| schema.get(name).and_then(Schema::atomic_kind).cloned();

        assert_eq!(kind("name"), Some(AtomicKind::String));
        assert_eq!(kind("age"), Some(AtomicKind::Number));
        assert_eq!(kind("bio"), Some(AtomicKind::String));
        assert_eq!(kind("active"), Some(AtomicKind::Boolean));
        assert_eq!(kind("born"), Some(AtomicKind::String));
        assert_eq!(kind("role"), Some(AtomicKind::Literal(vec!["admin".into(), "member".into()])));
        assert_eq!(kind("tier"), Some(AtomicKind::String));
        assert_eq!(kind("owner"), Some(AtomicKind::String));
        assert_eq!(kind("blob"), Some(AtomicKind::String));
        assert!(matches!(
            schema.get("extra"),
            Some(Schema::Optional(inner)) if matches!(**inner, Schema::Unknown)
        ));
    }

    #[test]
    fn test_optionality_follows_edit_rule() {
        let schema = compile(&model());
        assert!(!schema.get("name").unwrap().is_optional());
        assert!(!schema.get("age").unwrap().is_optional());
        assert!(schema.get("bio").unwrap().is_optional());
        assert_eq!(schema.get("name").unwrap().constraints().len(), 1);
    }

    #[test]
    fn test_duplicate_fields_last_wins_in_place() {
        let model = ModelMetadata::new("Dup")
            .field(FieldMetadata::new("a", FieldDataType::String))
            .field(FieldMetadata::new("b", FieldDataType::String))
            .field(FieldMetadata::new("a", FieldDataType::Number));
        let schema = compile(&model);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(schema.get("a").unwrap().is_number());
    }

    #[test]
    fn test_message_overrides() {
        let messages = MessageConfig {
            number: Some("Numbers only".to_string()),
            ..MessageConfig::default()
        };
        let compiler = SchemaCompiler::new().with_messages(messages);
        let schema = compiler.compile(&model());
        let Some(Schema::Atomic(age)) = schema.get("age") else { panic!("expected atomic age") };
        assert_eq!(age.type_message(), "Numbers only");
    }

    #[test]
    fn test_generic_message_reaches_adapter_and_form() {
        let messages = MessageConfig {
            generic: "Service unavailable".to_string(),
            ..MessageConfig::default()
        };
        let compiler = SchemaCompiler::new().with_messages(messages);
        let model = ModelMetadata::new("Broken").field(
            FieldMetadata::new("code", FieldDataType::String)
                .required()
                .rule(ValidationRule::with_value(
                    ValidationRuleType::Pattern,
                    RuleValue::Text("(".into()),
                )),
        );
        let schema = compiler.compile(&model);
        let input = serde_json::json!({"code": "x"});

        let result = compiler.adapter(schema.clone()).parse(&input);
        assert_eq!(result.into_result(), Err(vec![crate::DecodeError::new("Service unavailable")]));

        let mut form = compiler.form(schema, input.as_object().cloned().unwrap_or_default());
        assert!(!form.validate());
        assert_eq!(form.errors(), &[crate::DecodeError::new("Service unavailable")]);
    }

    #[test]
    fn test_empty_model() {
        assert!(compile(&ModelMetadata::new("Empty")).is_empty());
    }
}
