//! Form validation state
//!
//! A [`FormValidationState`] binds one compiled [`StructSchema`] to one
//! mutable JSON object and tracks the errors and status a form renderer
//! needs. Validation only happens when [`validate`](FormValidationState::validate)
//! or [`validate_field`](FormValidationState::validate_field) is called;
//! callers re-read `data`, `errors`, `is_valid` and `is_dirty` afterwards.
//!
//! A session is single-owner state. Mutators take `&mut self`, so concurrent
//! use has to be serialised by the caller (e.g. behind a `Mutex`).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::decode::{self, DecodeError};
use crate::schema::{messages, StructSchema};

/// Form data: one JSON object keyed by field name
pub type FormData = Map<String, Value>;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormStatus {
    /// Matches the initial snapshot; nothing validated yet
    Clean,
    /// Data written since the last validation or reset
    Dirty,
    /// Held only for the duration of a `validate` / `validate_field` call.
    /// Those calls take `&mut self` and always leave `Valid`, `Invalid` or
    /// the previous state behind, so no caller observes it.
    Validating,
    Valid,
    Invalid,
}

/// A validation session over one form
#[derive(Debug, Clone)]
pub struct FormValidationState {
    schema: Arc<StructSchema>,
    initial: FormData,
    data: FormData,
    errors: Vec<DecodeError>,
    status: FormStatus,
    dirty: bool,
    generic_message: String,
}

impl FormValidationState {
    pub fn new(schema: impl Into<Arc<StructSchema>>, initial: FormData) -> Self {
        Self {
            schema: schema.into(),
            data: initial.clone(),
            initial,
            errors: Vec::new(),
            status: FormStatus::Clean,
            dirty: false,
            generic_message: messages::GENERIC.to_string(),
        }
    }

    /// Message used when validation aborts for a reason other than bad input
    pub fn with_generic_message(mut self, message: impl Into<String>) -> Self {
        self.generic_message = message.into();
        self
    }

    pub fn schema(&self) -> &StructSchema {
        &self.schema
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.data.get(name)
    }

    pub fn errors(&self) -> &[DecodeError] {
        &self.errors
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status == FormStatus::Valid
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write one field
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) {
        self.data.insert(name.into(), value);
        self.mark_dirty();
    }

    /// Remove one field so it reads as absent
    pub fn remove_field(&mut self, name: &str) -> Option<Value> {
        let removed = self.data.remove(name);
        self.mark_dirty();
        removed
    }

    /// Arbitrary in-place edit of the data
    pub fn update<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut FormData),
    {
        edit(&mut self.data);
        self.mark_dirty();
    }

    /// Validate the whole form
    ///
    /// On success the data is replaced with the decoded value (undeclared keys
    /// dropped) and the errors are cleared. On failure the data is left as-is
    /// and the errors are replaced.
    pub fn validate(&mut self) -> bool {
        self.status = FormStatus::Validating;

        match decode::validate(&self.schema, &Value::Object(self.data.clone())) {
            Ok(decoded) => {
                self.data = decoded;
                self.errors.clear();
                self.status = FormStatus::Valid;
                true
            }
            Err(error) => {
                self.errors = decode::failure_errors(error, &self.generic_message);
                self.status = FormStatus::Invalid;
                false
            }
        }
    }

    /// Validate one field without re-validating the others
    ///
    /// Errors for other fields are never touched. On success this field's
    /// errors are removed and the form turns valid only if no errors remain.
    pub fn validate_field(&mut self, name: &str) -> bool {
        let previous = self.status;
        self.status = FormStatus::Validating;

        match decode::validate_field(&self.schema, name, self.data.get(name)) {
            Ok(_) => {
                self.clear_field_errors(name);
                self.status = if self.errors.is_empty() {
                    FormStatus::Valid
                } else {
                    previous
                };
                true
            }
            Err(error) => {
                let field_errors = decode::field_failure_errors(name, error, &self.generic_message);
                self.clear_field_errors(name);
                self.errors.extend(field_errors);
                self.status = FormStatus::Invalid;
                false
            }
        }
    }

    /// Restore the initial snapshot and clear all errors
    pub fn reset(&mut self) {
        self.data = self.initial.clone();
        self.errors.clear();
        self.status = FormStatus::Clean;
        self.dirty = false;
    }

    /// Restore one field from the initial snapshot and drop its errors
    pub fn reset_field(&mut self, name: &str) {
        match self.initial.get(name) {
            Some(value) => {
                self.data.insert(name.to_string(), value.clone());
            }
            None => {
                self.data.remove(name);
            }
        }
        self.clear_field_errors(name);
    }

    /// Errors whose first path segment is `name`
    pub fn errors_for<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DecodeError> + 'a {
        self.errors.iter().filter(move |e| e.is_for(name))
    }

    /// First message for `name`, if the field is currently invalid
    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.is_for(name))
            .map(|e| e.message.as_str())
    }

    /// Messages grouped by first path segment; path-less errors under `""`
    pub fn error_map(&self) -> BTreeMap<String, Vec<String>> {
        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for error in &self.errors {
            let key = error.field().unwrap_or_default().to_string();
            map.entry(key).or_default().push(error.message.clone());
        }
        map
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.status = FormStatus::Dirty;
    }

    fn clear_field_errors(&mut self, name: &str) {
        self.errors.retain(|e| !e.is_for(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn schema() -> StructSchema {
        StructSchema::new()
            .field("name", Schema::string(None).min_length(2, None))
            .field("age", Schema::number(None).min(0.0, None))
            .field("note", Schema::string(None).optional())
    }

    fn data(value: Value) -> FormData {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_starts_clean() {
        let form = FormValidationState::new(schema(), data(json!({"name": "Ann", "age": 5})));
        assert_eq!(form.status(), FormStatus::Clean);
        assert!(!form.is_valid());
        assert!(!form.is_dirty());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_validate_reports_every_field() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "A", "age": -1})));
        assert!(!form.validate());
        assert_eq!(form.status(), FormStatus::Invalid);
        assert_eq!(form.errors().len(), 2);
        assert_eq!(form.field_error("name"), Some("Must be at least 2 characters"));
        assert_eq!(form.field_error("age"), Some("Must be greater than or equal to 0"));
        assert_eq!(form.data(), &data(json!({"name": "A", "age": -1})));
    }

    #[test]
    fn test_validate_success_replaces_data() {
        let initial = data(json!({"name": "Ann", "age": 5, "stray": 1}));
        let mut form = FormValidationState::new(schema(), initial);
        assert!(form.validate());
        assert!(form.is_valid());
        assert!(form.errors().is_empty());
        assert_eq!(form.data(), &data(json!({"name": "Ann", "age": 5})));
    }

    #[test]
    fn test_writes_mark_dirty() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "Ann", "age": 5})));
        form.validate();
        form.set_field("age", json!(6));
        assert!(form.is_dirty());
        assert_eq!(form.status(), FormStatus::Dirty);

        form.validate();
        assert!(form.is_dirty());
        assert!(form.is_valid());

        form.update(|d| {
            d.insert("note".into(), json!("hi"));
        });
        assert_eq!(form.status(), FormStatus::Dirty);
        assert_eq!(form.remove_field("note"), Some(json!("hi")));
    }

    #[test]
    fn test_validate_field_keeps_other_errors() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "A", "age": -1})));
        form.validate();

        assert!(!form.validate_field("age"));
        assert!(!form.validate_field("age"));
        assert_eq!(form.errors_for("age").count(), 1);
        assert_eq!(form.errors_for("name").count(), 1);
        assert_eq!(form.errors().len(), 2);
    }

    #[test]
    fn test_validate_field_success_flips_valid_only_when_empty() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "A", "age": -1})));
        form.validate();

        form.set_field("age", json!(3));
        assert!(form.validate_field("age"));
        assert_eq!(form.errors().len(), 1);
        assert!(!form.is_valid());

        form.set_field("name", json!("Ann"));
        assert!(form.validate_field("name"));
        assert!(form.errors().is_empty());
        assert!(form.is_valid());
    }

    #[test]
    fn test_validate_field_unknown_name() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "Ann", "age": 5})));
        assert!(!form.validate_field("agee"));
        assert_eq!(form.field_error("agee"), Some("Unknown field 'agee'"));
        assert_eq!(form.status(), FormStatus::Invalid);

        assert!(!form.validate_field("nme"));
        assert_eq!(form.field_error("nme"), Some("Unknown field 'nme' (did you mean 'name'?)"));
    }

    #[test]
    fn test_validating_is_never_left_behind() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "A", "age": 5})));
        form.validate();
        assert_eq!(form.status(), FormStatus::Invalid);

        form.set_field("name", json!("Ann"));
        form.validate_field("name");
        assert_eq!(form.status(), FormStatus::Valid);

        form.set_field("age", json!(6));
        form.validate_field("age");
        assert_ne!(form.status(), FormStatus::Validating);
    }

    #[test]
    fn test_invalid_pattern_becomes_generic_error() {
        let schema = StructSchema::new().field("code", Schema::string(None).pattern("(", None));
        let mut form = FormValidationState::new(schema, data(json!({"code": "x"})))
            .with_generic_message("Try again later");

        assert!(!form.validate());
        assert_eq!(form.errors(), &[DecodeError::new("Try again later")]);

        assert!(!form.validate_field("code"));
        assert_eq!(form.field_error("code"), Some("Try again later"));
    }

    #[test]
    fn test_reset_then_validate_original() {
        let initial = data(json!({"name": "Ann", "age": 5}));
        let mut form = FormValidationState::new(schema(), initial.clone());
        form.set_field("age", json!(-4));
        form.validate();
        assert!(!form.is_valid());

        form.reset();
        assert_eq!(form.status(), FormStatus::Clean);
        assert!(!form.is_dirty());
        assert_eq!(form.data(), &initial);

        assert!(form.validate());
        assert!(form.is_valid());
        assert!(form.errors().is_empty());
    }

    #[test]
    fn test_reset_field_restores_only_that_field() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": "Ann", "age": 5})));
        form.set_field("name", json!("B"));
        form.set_field("age", json!(-1));
        form.set_field("note", json!("added"));
        form.validate();

        form.reset_field("age");
        form.reset_field("note");
        assert_eq!(form.get("age"), Some(&json!(5)));
        assert_eq!(form.get("note"), None);
        assert_eq!(form.get("name"), Some(&json!("B")));
        assert_eq!(form.errors_for("age").count(), 0);
        assert_eq!(form.errors_for("name").count(), 1);
    }

    #[test]
    fn test_error_map_groups_by_field() {
        let mut form = FormValidationState::new(schema(), data(json!({"name": 1})));
        form.validate();
        let map = form.error_map();
        assert_eq!(map.get("name"), Some(&vec![messages::STRING.to_string()]));
        assert_eq!(map.get("age"), Some(&vec![messages::REQUIRED.to_string()]));
        assert!(!map.contains_key("note"));
    }
}
