//! Rule applier
//!
//! Folds declarative [`ValidationRule`]s onto an atomic schema. Rules are
//! applied in order and only ever add constraints. A rule that does not fit
//! the schema it lands on (a length bound on a number, a numeric bound on a
//! string, a missing or mistyped rule value) is skipped, never an error, so
//! one misconfigured field cannot break the compile of a whole model.
//!
//! `required` is not handled here; the compiler decides optionality once all
//! rules are folded.

use std::collections::HashMap;

use serde_json::Value;

use crate::metadata::{ValidationRule, ValidationRuleType};
use crate::schema::{CustomCheck, Schema};

/// Named checks that `custom` rules may refer to by their `value`
#[derive(Debug, Clone, Default)]
pub struct CustomRules {
    checks: HashMap<String, CustomCheck>,
}

impl CustomRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `name`
    pub fn register<F>(mut self, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let name = name.into();
        self.checks.insert(name.clone(), CustomCheck::new(name, check));
        self
    }

    pub fn get(&self, name: &str) -> Option<&CustomCheck> {
        self.checks.get(name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Fold `rules` onto `schema` in order
pub fn apply_rules<'r, I>(schema: Schema, rules: I, custom: &CustomRules) -> Schema
where
    I: IntoIterator<Item = &'r ValidationRule>,
{
    rules
        .into_iter()
        .fold(schema, |schema, rule| apply_rule(schema, rule, custom))
}

/// Apply one rule, or return `schema` unchanged if the rule does not fit
pub fn apply_rule(schema: Schema, rule: &ValidationRule, custom: &CustomRules) -> Schema {
    let message = rule.message.clone();

    match rule.rule_type {
        ValidationRuleType::Required => schema,

        ValidationRuleType::MinLength => match rule.number().and_then(lower_length_bound) {
            Some(min) if schema.is_string() => schema.min_length(min, message),
            _ => skipped(schema, rule),
        },

        ValidationRuleType::MaxLength => match rule.number().and_then(upper_length_bound) {
            Some(max) if schema.is_string() => schema.max_length(max, message),
            _ => skipped(schema, rule),
        },

        ValidationRuleType::Min => match rule.number().filter(|n| n.is_finite()) {
            Some(min) if schema.is_number() => schema.min(min, message),
            _ => skipped(schema, rule),
        },

        ValidationRuleType::Max => match rule.number().filter(|n| n.is_finite()) {
            Some(max) if schema.is_number() => schema.max(max, message),
            _ => skipped(schema, rule),
        },

        ValidationRuleType::Pattern => match rule.text() {
            Some(source) if schema.is_string() => schema.pattern(source, message),
            _ => skipped(schema, rule),
        },

        ValidationRuleType::Email if schema.is_string() => schema.email(message),

        ValidationRuleType::Url if schema.is_string() => schema.url(message),

        ValidationRuleType::Custom => match rule.text().and_then(|name| custom.get(name)) {
            Some(check) => schema.custom(check.clone(), message),
            None => {
                tracing::debug!(
                    name = ?rule.text(),
                    "no custom check registered; rule accepted as-is"
                );
                schema
            }
        },

        ValidationRuleType::Email | ValidationRuleType::Url => skipped(schema, rule),
    }
}

fn skipped(schema: Schema, rule: &ValidationRule) -> Schema {
    tracing::debug!(
        rule = ?rule.rule_type,
        value = ?rule.value,
        "rule does not apply to field type; skipped"
    );
    schema
}

/// `len >= v` for fractional `v` is `len >= ceil(v)`
fn lower_length_bound(value: f64) -> Option<usize> {
    value.is_finite().then(|| value.max(0.0).ceil() as usize)
}

/// `len <= v` for fractional `v` is `len <= floor(v)`; negative bounds are rejected
fn upper_length_bound(value: f64) -> Option<usize> {
    (value.is_finite() && value >= 0.0).then(|| value.floor() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RuleValue;
    use crate::schema::{AtomicKind, Constraint};

    fn rule(rule_type: ValidationRuleType, value: RuleValue) -> ValidationRule {
        ValidationRule::with_value(rule_type, value)
    }

    #[test]
    fn test_string_rules_fold_in_order() {
        let rules = vec![
            rule(ValidationRuleType::MinLength, RuleValue::Number(2.0)),
            rule(ValidationRuleType::MaxLength, RuleValue::Number(10.0)),
            rule(ValidationRuleType::Pattern, RuleValue::Text("^[a-z]+$".into())),
            ValidationRule::new(ValidationRuleType::Email).message("Bad email"),
        ];
        let schema = apply_rules(Schema::string(None), &rules, &CustomRules::new());
        let constraints = schema.constraints();
        assert_eq!(constraints.len(), 4);
        assert!(matches!(constraints[0], Constraint::MinLength { min: 2, .. }));
        assert!(matches!(constraints[1], Constraint::MaxLength { max: 10, .. }));
        assert!(matches!(constraints[2], Constraint::Pattern { .. }));
        assert_eq!(constraints[3].message(), "Bad email");
    }

    #[test]
    fn test_required_is_noop() {
        let schema = apply_rule(
            Schema::string(None),
            &ValidationRule::new(ValidationRuleType::Required),
            &CustomRules::new(),
        );
        assert!(schema.constraints().is_empty());
        assert!(!schema.is_optional());
    }

    #[test]
    fn test_incompatible_rules_are_skipped() {
        let custom = CustomRules::new();
        let on_number = apply_rules(
            Schema::number(None),
            &[
                rule(ValidationRuleType::MinLength, RuleValue::Number(2.0)),
                rule(ValidationRuleType::Pattern, RuleValue::Text("x".into())),
                ValidationRule::new(ValidationRuleType::Email),
                ValidationRule::new(ValidationRuleType::Url),
            ],
            &custom,
        );
        assert!(on_number.constraints().is_empty());

        let on_string = apply_rules(
            Schema::string(None),
            &[
                rule(ValidationRuleType::Min, RuleValue::Number(0.0)),
                rule(ValidationRuleType::Max, RuleValue::Number(9.0)),
            ],
            &custom,
        );
        assert!(on_string.constraints().is_empty());

        let on_enum = apply_rule(
            Schema::literal(["a", "b"], None),
            &rule(ValidationRuleType::MaxLength, RuleValue::Number(1.0)),
            &custom,
        );
        assert!(on_enum.constraints().is_empty());
        assert_eq!(on_enum.atomic_kind(), Some(&AtomicKind::Literal(vec!["a".into(), "b".into()])));
    }

    #[test]
    fn test_mistyped_values_are_skipped() {
        let custom = CustomRules::new();
        let schema = apply_rules(
            Schema::string(None),
            &[
                rule(ValidationRuleType::MinLength, RuleValue::Text("2".into())),
                rule(ValidationRuleType::Pattern, RuleValue::Number(1.0)),
                ValidationRule::new(ValidationRuleType::MaxLength),
                rule(ValidationRuleType::MaxLength, RuleValue::Number(-1.0)),
            ],
            &custom,
        );
        assert!(schema.constraints().is_empty());
    }

    #[test]
    fn test_fractional_length_bounds() {
        assert_eq!(lower_length_bound(2.5), Some(3));
        assert_eq!(lower_length_bound(-4.0), Some(0));
        assert_eq!(upper_length_bound(2.5), Some(2));
        assert_eq!(upper_length_bound(-1.0), None);
    }

    #[test]
    fn test_custom_rules() {
        let custom = CustomRules::new().register("no_spaces", |v| {
            v.as_str().map(|s| !s.contains(' ')).unwrap_or(true)
        });
        assert_eq!(custom.len(), 1);

        let registered = apply_rule(
            Schema::string(None),
            &rule(ValidationRuleType::Custom, RuleValue::Text("no_spaces".into())),
            &custom,
        );
        assert_eq!(registered.constraints().len(), 1);

        let unregistered = apply_rule(
            Schema::string(None),
            &rule(ValidationRuleType::Custom, RuleValue::Text("other".into())),
            &custom,
        );
        assert!(unregistered.constraints().is_empty());
    }
}
