//! Primitive schema library
//!
//! A [`Schema`] is an immutable validator value: an atomic type (string,
//! number, boolean, literal set) with zero or more attached constraints, an
//! opaque `unknown`, a struct of named member schemas, or an `optional`
//! wrapper. Combinators consume a schema and return a new one with the extra
//! constraint appended; existing constraints are never replaced.
//!
//! ```
//! use familiar_validation::Schema;
//!
//! let name = Schema::string(None).min_length(2, None).max_length(40, None);
//! let age = Schema::number(None).min(0.0, None).optional();
//! assert!(name.is_string());
//! assert!(age.is_optional());
//! ```
//!
//! Schemas hold no interior mutability and are `Send + Sync`, so one compiled
//! schema can back any number of concurrent decodes.

use std::fmt;
use std::sync::Arc;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use regex::Regex;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::predicates;

/// Built-in messages used when no override is configured
pub mod messages {
    pub const STRING: &str = "Expected a string";
    pub const NUMBER: &str = "Expected a number";
    pub const BOOLEAN: &str = "Expected a boolean";
    pub const REQUIRED: &str = "This field is required";
    pub const OBJECT: &str = "Expected an object";
    pub const EMAIL: &str = "Invalid email address";
    pub const URL: &str = "Invalid URL";
    pub const GENERIC: &str = "Validation failed";

    pub fn literal(values: &[String]) -> String {
        format!("Expected one of: {}", values.join(", "))
    }

    pub fn min_length(min: usize) -> String {
        format!("Must be at least {} characters", min)
    }

    pub fn max_length(max: usize) -> String {
        format!("Must be at most {} characters", max)
    }

    pub fn range(min: f64, max: f64) -> String {
        format!("Must be between {} and {}", min, max)
    }

    pub fn min(min: f64) -> String {
        format!("Must be greater than or equal to {}", min)
    }

    pub fn max(max: f64) -> String {
        format!("Must be less than or equal to {}", max)
    }

    pub fn pattern(source: &str) -> String {
        format!("Must match the pattern {}", source)
    }

    pub fn custom(name: &str) -> String {
        format!("Failed check '{}'", name)
    }
}

/// A regular expression constraint source
///
/// Compilation happens when the constraint is built. A pattern that does not
/// compile is kept and surfaces as [`SchemaError::InvalidPattern`] when a
/// value is checked against it.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: std::result::Result<Regex, regex::Error>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&source);
        Self { source, compiled }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    fn is_match(&self, value: &str) -> Result<bool> {
        match &self.compiled {
            Ok(re) => Ok(re.is_match(value)),
            Err(e) => Err(SchemaError::InvalidPattern {
                pattern: self.source.clone(),
                source: e.clone(),
            }),
        }
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<Regex> for Pattern {
    fn from(re: Regex) -> Self {
        Self {
            source: re.as_str().to_string(),
            compiled: Ok(re),
        }
    }
}

type CheckFn = dyn Fn(&Value) -> bool + Send + Sync;

/// A named user-supplied predicate
#[derive(Clone)]
pub struct CustomCheck {
    name: String,
    check: Arc<CheckFn>,
}

impl CustomCheck {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passes(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for CustomCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCheck").field("name", &self.name).finish()
    }
}

/// A constraint attached to an atomic schema
#[derive(Debug, Clone)]
pub enum Constraint {
    MinLength { min: usize, message: Option<String> },
    MaxLength { max: usize, message: Option<String> },
    Range { min: f64, max: f64, message: Option<String> },
    Min { min: f64, message: Option<String> },
    Max { max: f64, message: Option<String> },
    Pattern { pattern: Pattern, message: Option<String> },
    Email { message: Option<String> },
    Url { message: Option<String> },
    Custom { check: CustomCheck, message: Option<String> },
}

impl Constraint {
    /// Check a type-correct value; `Ok(Some(message))` on violation
    pub(crate) fn violation(&self, value: &Value) -> Result<Option<String>> {
        let failed = match self {
            Constraint::MinLength { min, .. } => {
                text_fails(value, |s| predicates::utf16_len(s) < *min)
            }
            Constraint::MaxLength { max, .. } => {
                text_fails(value, |s| predicates::utf16_len(s) > *max)
            }
            Constraint::Range { min, max, .. } => number_fails(value, |n| n < *min || n > *max),
            Constraint::Min { min, .. } => number_fails(value, |n| n < *min),
            Constraint::Max { max, .. } => number_fails(value, |n| n > *max),
            Constraint::Pattern { pattern, .. } => match value.as_str() {
                Some(s) => !pattern.is_match(s)?,
                None => false,
            },
            Constraint::Email { .. } => text_fails(value, |s| !predicates::is_valid_email(s)),
            Constraint::Url { .. } => text_fails(value, |s| !predicates::is_valid_url(s)),
            Constraint::Custom { check, .. } => !check.passes(value),
        };

        Ok(failed.then(|| self.message()))
    }

    /// Configured message, or the default for this constraint
    pub fn message(&self) -> String {
        match self {
            Constraint::MinLength { min, message } => {
                message.clone().unwrap_or_else(|| messages::min_length(*min))
            }
            Constraint::MaxLength { max, message } => {
                message.clone().unwrap_or_else(|| messages::max_length(*max))
            }
            Constraint::Range { min, max, message } => {
                message.clone().unwrap_or_else(|| messages::range(*min, *max))
            }
            Constraint::Min { min, message } => {
                message.clone().unwrap_or_else(|| messages::min(*min))
            }
            Constraint::Max { max, message } => {
                message.clone().unwrap_or_else(|| messages::max(*max))
            }
            Constraint::Pattern { pattern, message } => {
                message.clone().unwrap_or_else(|| messages::pattern(pattern.as_str()))
            }
            Constraint::Email { message } => {
                message.clone().unwrap_or_else(|| messages::EMAIL.to_string())
            }
            Constraint::Url { message } => {
                message.clone().unwrap_or_else(|| messages::URL.to_string())
            }
            Constraint::Custom { check, message } => {
                message.clone().unwrap_or_else(|| messages::custom(check.name()))
            }
        }
    }
}

fn text_fails(value: &Value, fails: impl Fn(&str) -> bool) -> bool {
    value.as_str().map(fails).unwrap_or(false)
}

fn number_fails(value: &Value, fails: impl Fn(f64) -> bool) -> bool {
    value.as_f64().map(fails).unwrap_or(false)
}

/// Base domain of an atomic schema
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicKind {
    String,
    Number,
    Boolean,
    /// One of a fixed set of strings
    Literal(Vec<String>),
}

impl AtomicKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            AtomicKind::String => value.is_string(),
            AtomicKind::Number => value.is_number(),
            AtomicKind::Boolean => value.is_boolean(),
            AtomicKind::Literal(values) => value
                .as_str()
                .map(|s| values.iter().any(|v| v == s))
                .unwrap_or(false),
        }
    }

    fn default_message(&self) -> String {
        match self {
            AtomicKind::String => messages::STRING.to_string(),
            AtomicKind::Number => messages::NUMBER.to_string(),
            AtomicKind::Boolean => messages::BOOLEAN.to_string(),
            AtomicKind::Literal(values) => messages::literal(values),
        }
    }
}

/// An atomic type plus its constraints, in attachment order
#[derive(Debug, Clone)]
pub struct AtomicSchema {
    kind: AtomicKind,
    message: Option<String>,
    constraints: Vec<Constraint>,
}

impl AtomicSchema {
    fn new(kind: AtomicKind, message: Option<String>) -> Self {
        Self {
            kind,
            message,
            constraints: Vec::new(),
        }
    }

    pub fn kind(&self) -> &AtomicKind {
        &self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Message reported when a value falls outside the base domain
    pub fn type_message(&self) -> String {
        self.message.clone().unwrap_or_else(|| self.kind.default_message())
    }

    /// First failure for `value`: the base type, then each constraint in order
    pub(crate) fn first_violation(&self, value: &Value) -> Result<Option<String>> {
        if !self.kind.accepts(value) {
            return Ok(Some(self.type_message()));
        }
        for constraint in &self.constraints {
            if let Some(message) = constraint.violation(value)? {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }
}

/// Named member schemas in declared order
#[derive(Debug, Clone, Default)]
pub struct StructSchema {
    fields: Vec<(String, Schema)>,
}

impl StructSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, replacing an existing member of the same name in place
    pub fn field(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.insert(name, schema);
        self
    }

    /// Insert a member; returns the replaced schema if the name existed
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) -> Option<Schema> {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, schema)),
            None => {
                self.fields.push((name, schema));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Schema)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A struct holding only `name`, or `None` if it is not a member
    pub fn pick(&self, name: &str) -> Option<StructSchema> {
        self.get(name).map(|schema| StructSchema {
            fields: vec![(name.to_string(), schema.clone())],
        })
    }

    /// Closest member name to `name`, for "did you mean" hints
    pub fn suggest(&self, name: &str) -> Option<&str> {
        let matcher = SkimMatcherV2::default();
        self.field_names()
            .filter_map(|candidate| {
                matcher
                    .fuzzy_match(candidate, name)
                    .map(|score| (score, candidate))
            })
            .max_by_key(|(score, _)| *score)
            .map(|(_, candidate)| candidate)
    }

    /// [`SchemaError::UnknownField`] for `name`, with a suggestion if one exists
    pub fn unknown_field(&self, name: &str) -> SchemaError {
        SchemaError::UnknownField {
            name: name.to_string(),
            suggestion: self.suggest(name).map(str::to_string),
        }
    }
}

/// A composable, immutable validator
#[derive(Debug, Clone)]
pub enum Schema {
    Atomic(AtomicSchema),
    /// Accepts any value, including an absent one
    Unknown,
    Struct(StructSchema),
    /// Also satisfied by an absent or null value
    Optional(Box<Schema>),
}

impl Schema {
    pub fn string(message: Option<String>) -> Self {
        Schema::Atomic(AtomicSchema::new(AtomicKind::String, message))
    }

    pub fn number(message: Option<String>) -> Self {
        Schema::Atomic(AtomicSchema::new(AtomicKind::Number, message))
    }

    pub fn boolean(message: Option<String>) -> Self {
        Schema::Atomic(AtomicSchema::new(AtomicKind::Boolean, message))
    }

    pub fn literal<I, S>(values: I, message: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        Schema::Atomic(AtomicSchema::new(AtomicKind::Literal(values), message))
    }

    pub fn unknown() -> Self {
        Schema::Unknown
    }

    pub fn structure(fields: StructSchema) -> Self {
        Schema::Struct(fields)
    }

    pub fn min_length(self, min: usize, message: Option<String>) -> Self {
        self.constrain(is_string_kind, Constraint::MinLength { min, message })
    }

    pub fn max_length(self, max: usize, message: Option<String>) -> Self {
        self.constrain(is_string_kind, Constraint::MaxLength { max, message })
    }

    /// Inclusive numeric bounds
    pub fn range(self, min: f64, max: f64, message: Option<String>) -> Self {
        self.constrain(is_number_kind, Constraint::Range { min, max, message })
    }

    pub fn min(self, min: f64, message: Option<String>) -> Self {
        self.constrain(is_number_kind, Constraint::Min { min, message })
    }

    pub fn max(self, max: f64, message: Option<String>) -> Self {
        self.constrain(is_number_kind, Constraint::Max { max, message })
    }

    pub fn pattern(self, pattern: impl Into<Pattern>, message: Option<String>) -> Self {
        let pattern = pattern.into();
        if !pattern.is_valid() {
            tracing::debug!(pattern = pattern.as_str(), "attaching pattern that does not compile");
        }
        self.constrain(is_string_kind, Constraint::Pattern { pattern, message })
    }

    pub fn email(self, message: Option<String>) -> Self {
        self.constrain(is_string_kind, Constraint::Email { message })
    }

    pub fn url(self, message: Option<String>) -> Self {
        self.constrain(is_string_kind, Constraint::Url { message })
    }

    /// Attach a custom predicate; applies to any atomic kind
    pub fn custom(self, check: CustomCheck, message: Option<String>) -> Self {
        self.constrain(|_| true, Constraint::Custom { check, message })
    }

    /// Also accept an absent or null value
    pub fn optional(self) -> Self {
        match self {
            Schema::Optional(_) => self,
            other => Schema::Optional(Box::new(other)),
        }
    }

    pub fn is_string(&self) -> bool {
        self.atomic_kind().map(is_string_kind).unwrap_or(false)
    }

    pub fn is_number(&self) -> bool {
        self.atomic_kind().map(is_number_kind).unwrap_or(false)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Schema::Optional(_))
    }

    /// Kind of the atomic schema, looking through `optional`
    pub fn atomic_kind(&self) -> Option<&AtomicKind> {
        match self {
            Schema::Atomic(atomic) => Some(atomic.kind()),
            Schema::Optional(inner) => inner.atomic_kind(),
            _ => None,
        }
    }

    /// Constraints of the atomic schema, looking through `optional`
    pub fn constraints(&self) -> &[Constraint] {
        match self {
            Schema::Atomic(atomic) => atomic.constraints(),
            Schema::Optional(inner) => inner.constraints(),
            _ => &[],
        }
    }

    pub fn as_struct(&self) -> Option<&StructSchema> {
        match self {
            Schema::Struct(s) => Some(s),
            _ => None,
        }
    }

    fn constrain(self, applies: fn(&AtomicKind) -> bool, constraint: Constraint) -> Self {
        match self {
            Schema::Atomic(mut atomic) if applies(&atomic.kind) => {
                atomic.constraints.push(constraint);
                Schema::Atomic(atomic)
            }
            Schema::Optional(inner) => {
                Schema::Optional(Box::new(inner.constrain(applies, constraint)))
            }
            other => {
                tracing::trace!(?constraint, "constraint does not apply to schema kind; skipped");
                other
            }
        }
    }
}

impl From<StructSchema> for Schema {
    fn from(fields: StructSchema) -> Self {
        Schema::Struct(fields)
    }
}

fn is_string_kind(kind: &AtomicKind) -> bool {
    matches!(kind, AtomicKind::String)
}

fn is_number_kind(kind: &AtomicKind) -> bool {
    matches!(kind, AtomicKind::Number)
}
