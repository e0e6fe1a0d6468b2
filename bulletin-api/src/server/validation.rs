//! Field validation failures and the messages clients see for them.

use bulletin_common::model::post::TextFieldError;
use std::collections::BTreeMap;
use thiserror::Error;

/// User-facing message per rule name. Rules missing here fall back to
/// [`UNKNOWN_RULE_MESSAGE`].
pub const RULE_MESSAGES: &[(&str, &str)] = &[
    ("required", "field is required"),
    ("max", "maximum allowed characters exceeded"),
    ("uuid", "invalid ID"),
];

pub const UNKNOWN_RULE_MESSAGE: &str = "unknown validation error";

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Rule(&'static str);

impl Rule {
    pub const REQUIRED: Self = Self::new("required");
    pub const MAX: Self = Self::new("max");
    pub const UUID: Self = Self::new("uuid");

    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        RULE_MESSAGES
            .iter()
            .find(|(name, _)| *name == self.0)
            .map_or(UNKNOWN_RULE_MESSAGE, |&(_, message)| message)
    }
}

impl From<TextFieldError> for Rule {
    fn from(value: TextFieldError) -> Self {
        match value {
            TextFieldError::Empty => Self::REQUIRED,
            TextFieldError::TooLong { .. } => Self::MAX,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule: Rule,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
#[error("{message}: {} field(s) failed validation", .violations.len())]
pub struct ValidationErrors {
    message: &'static str,
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new(message: &'static str) -> Self {
        Self {
            message,
            violations: Vec::new(),
        }
    }

    #[must_use]
    pub fn single(message: &'static str, field: &'static str, rule: Rule) -> Self {
        let mut errors = Self::new(message);
        errors.push(field, rule);
        errors
    }

    pub fn push(&mut self, field: &'static str, rule: Rule) {
        self.violations.push(FieldViolation { field, rule });
    }

    /// Records a violation for `field` if `result` failed.
    pub fn check<T, E: Into<Rule>>(
        &mut self,
        field: &'static str,
        result: Result<T, E>,
    ) -> Option<T> {
        result.map_err(|err| self.push(field, err.into())).ok()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// Field name to user-facing reason. The first violation per field wins.
    #[must_use]
    pub fn field_messages(&self) -> BTreeMap<&'static str, &'static str> {
        let mut messages = BTreeMap::new();
        for violation in &self.violations {
            messages
                .entry(violation.field)
                .or_insert_with(|| violation.rule.message());
        }
        messages
    }
}
