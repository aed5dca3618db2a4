//! Model metadata types
//!
//! Declarative descriptions of a data model as delivered by the metadata
//! service: an ordered list of fields, each with a primitive type, a list of
//! validation rules and an edit rule. These values are immutable input to the
//! [`compiler`](crate::compiler); nothing here executes validation.
//!
//! JSON on the wire is camelCase:
//!
//! ```json
//! {
//!   "id": "user",
//!   "name": "User",
//!   "displayName": "User",
//!   "createdAt": "2024-01-01T00:00:00Z",
//!   "fields": [
//!     {
//!       "name": "email",
//!       "type": { "type": "email" },
//!       "validation": [{ "type": "email", "message": "Bad address" }],
//!       "editRule": { "editable": true, "required": true }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Primitive data type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldDataType {
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    Time,
    Email,
    Url,
    Text,
    Json,
    Enum,
    Relation,
    /// Any type string this crate does not recognise
    #[serde(other)]
    Unknown,
}

impl FieldDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldDataType::String => "string",
            FieldDataType::Number => "number",
            FieldDataType::Boolean => "boolean",
            FieldDataType::Date => "date",
            FieldDataType::Datetime => "datetime",
            FieldDataType::Time => "time",
            FieldDataType::Email => "email",
            FieldDataType::Url => "url",
            FieldDataType::Text => "text",
            FieldDataType::Json => "json",
            FieldDataType::Enum => "enum",
            FieldDataType::Relation => "relation",
            FieldDataType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a declarative validation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationRuleType {
    Required,
    Min,
    Max,
    MinLength,
    MaxLength,
    Pattern,
    Email,
    Url,
    Custom,
}

/// Rule argument: either a number (bounds) or a string (pattern, custom name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RuleValue::Number(n) => Some(*n),
            RuleValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RuleValue::Text(s) => Some(s),
            RuleValue::Number(_) => None,
        }
    }
}

/// A single validation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(rename = "type")]
    pub rule_type: ValidationRuleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(rule_type: ValidationRuleType) -> Self {
        Self {
            rule_type,
            value: None,
            message: None,
        }
    }

    pub fn with_value(rule_type: ValidationRuleType, value: RuleValue) -> Self {
        Self {
            rule_type,
            value: Some(value),
            message: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn number(&self) -> Option<f64> {
        self.value.as_ref().and_then(RuleValue::as_number)
    }

    pub fn text(&self) -> Option<&str> {
        self.value.as_ref().and_then(RuleValue::as_text)
    }
}

/// Field type configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldTypeConfig {
    #[serde(rename = "type")]
    pub data_type: FieldDataType,
    /// Rules declared alongside the type; folded before field-level rules
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FieldTypeConfig {
    pub fn new(data_type: FieldDataType) -> Self {
        Self {
            data_type,
            validation: Vec::new(),
            default_value: None,
            enum_values: None,
        }
    }

    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::new(FieldDataType::Enum)
        }
    }
}

/// How a field is shown on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Conditional override of an edit rule
///
/// Carried for renderers; the engine never evaluates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    pub field: String,
    pub value: serde_json::Value,
    pub then: serde_json::Value,
}

/// Edit rule for a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRuleConfig {
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub readonly: bool,
    /// Absence is rejected only when this is set
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub hidden: bool,
    /// Declared cross-field dependencies. Not evaluated by the decoder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_rules: Vec<ConditionalRule>,
}

impl EditRuleConfig {
    pub fn required() -> Self {
        Self {
            editable: true,
            required: true,
            ..Default::default()
        }
    }

    pub fn optional() -> Self {
        Self {
            editable: true,
            ..Default::default()
        }
    }
}

/// Field level permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPermissionConfig {
    pub view: bool,
    pub edit: bool,
    pub create: bool,
    pub delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Cardinality of a relation field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Target of a relation field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub model: String,
    pub field: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
}

/// Metadata for one addressable field of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldTypeConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    #[serde(default)]
    pub edit_rule: EditRuleConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<FieldPermissionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationConfig>,
}

impl FieldMetadata {
    pub fn new(name: impl Into<String>, data_type: FieldDataType) -> Self {
        Self::with_type(name, FieldTypeConfig::new(data_type))
    }

    pub fn with_type(name: impl Into<String>, field_type: FieldTypeConfig) -> Self {
        Self {
            name: name.into(),
            field_type,
            validation: Vec::new(),
            edit_rule: EditRuleConfig::optional(),
            display: None,
            permission: None,
            relation: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.edit_rule.required = true;
        self
    }

    /// Append a validation rule
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// All rules in fold order: type-level first, then field-level
    pub fn rules(&self) -> impl Iterator<Item = &ValidationRule> {
        self.field_type.validation.iter().chain(self.validation.iter())
    }
}

/// Model level permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPermissions {
    pub view: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

/// Metadata for a whole model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ModelPermissions>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ModelMetadata {
    /// Create an empty model
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase(),
            display_name: name.clone(),
            name,
            description: None,
            fields: Vec::new(),
            permissions: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Append a field
    pub fn field(mut self, field: FieldMetadata) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    pub fn get_field(&self, name: &str) -> Option<&FieldMetadata> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declared order
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    /// Reject models whose field names are not unique
    pub fn ensure_unique_fields(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    model: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Parse a model from JSON and check its field names
    pub fn from_json_str(content: &str) -> Result<Self> {
        let model: ModelMetadata = serde_json::from_str(content)?;
        model.ensure_unique_fields()?;
        Ok(model)
    }

    /// Load a model from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }
}

/// Load every `*.json` model below a directory, sorted by path
pub fn load_models_dir(dir: impl AsRef<Path>) -> Result<Vec<ModelMetadata>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SchemaError::InvalidModel(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|x| x == "json").unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    paths.sort();

    let mut models = Vec::with_capacity(paths.len());
    for path in paths {
        tracing::debug!(path = %path.display(), "loading model metadata");
        models.push(ModelMetadata::from_path(&path)?);
    }
    Ok(models)
}

fn default_true() -> bool {
    true
}
