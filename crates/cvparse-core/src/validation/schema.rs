//! Structural validation of a candidate record against the canonical shape.
//!
//! Unlike deserialization, which stops at the first mismatch, this walks the
//! whole value and reports every violation with its path.

use serde_json::{Map, Value};

use crate::error::SchemaViolation;

use super::rules::is_valid_email;

/// Optional fields may be absent or null; required ones must be present.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
}

struct Checker {
    violations: Vec<SchemaViolation>,
}

impl Checker {
    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(SchemaViolation {
            path: path.into(),
            reason: reason.into(),
        });
    }

    /// Returns the field when it is present and non-null.
    fn field<'a>(&mut self, obj: &'a Map<String, Value>, path: &str, key: &str, presence: Presence) -> Option<&'a Value> {
        match obj.get(key) {
            None if presence == Presence::Required => {
                self.push(join(path, key), "field required");
                None
            }
            Some(Value::Null) if presence == Presence::Required => {
                self.push(join(path, key), "must not be null");
                None
            }
            None | Some(Value::Null) => None,
            Some(value) => Some(value),
        }
    }

    fn string<'a>(&mut self, obj: &'a Map<String, Value>, path: &str, key: &str, presence: Presence) -> Option<&'a str> {
        let value = self.field(obj, path, key, presence)?;
        match value.as_str() {
            Some(s) => Some(s),
            None => {
                self.push(join(path, key), format!("expected string, got {}", kind(value)));
                None
            }
        }
    }

    fn string_list(&mut self, obj: &Map<String, Value>, key: &str, presence: Presence) {
        let Some(items) = self.list(obj, key, presence) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            if !item.is_string() {
                self.push(format!("{}[{}]", key, i), format!("expected string, got {}", kind(item)));
            }
        }
    }

    fn list<'a>(&mut self, obj: &'a Map<String, Value>, key: &str, presence: Presence) -> Option<&'a Vec<Value>> {
        let value = self.field(obj, "", key, presence)?;
        match value.as_array() {
            Some(items) => Some(items),
            None => {
                self.push(key, format!("expected list, got {}", kind(value)));
                None
            }
        }
    }

    fn object_list(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        presence: Presence,
        check_item: fn(&mut Checker, &Map<String, Value>, &str),
    ) {
        let Some(items) = self.list(obj, key, presence) else {
            return;
        };
        for (i, item) in items.iter().enumerate() {
            let path = format!("{}[{}]", key, i);
            match item.as_object() {
                Some(fields) => check_item(self, fields, &path),
                None => self.push(path, format!("expected object, got {}", kind(item))),
            }
        }
    }
}

fn check_education(checker: &mut Checker, item: &Map<String, Value>, path: &str) {
    checker.string(item, path, "degree", Presence::Required);
    checker.string(item, path, "institution", Presence::Optional);
    checker.string(item, path, "graduation_year", Presence::Optional);
}

fn check_experience(checker: &mut Checker, item: &Map<String, Value>, path: &str) {
    checker.string(item, path, "job_title", Presence::Required);
    checker.string(item, path, "company_name", Presence::Required);
    checker.string(item, path, "years_worked", Presence::Optional);
    checker.string(item, path, "description", Presence::Optional);
}

/// Every way `candidate` deviates from the canonical record shape.
pub fn schema_violations(candidate: &Value) -> Vec<SchemaViolation> {
    let mut checker = Checker {
        violations: Vec::new(),
    };

    let Some(obj) = candidate.as_object() else {
        checker.push("$", format!("expected object, got {}", kind(candidate)));
        return checker.violations;
    };

    checker.string(obj, "", "Name", Presence::Optional);
    if let Some(email) = checker.string(obj, "", "Email", Presence::Optional) {
        if !is_valid_email(email) {
            checker.push("Email", "value is not a valid email address");
        }
    }
    checker.string(obj, "", "Phone", Presence::Optional);
    checker.string_list(obj, "Skills", Presence::Required);
    checker.object_list(obj, "Education", Presence::Required, check_education);
    checker.object_list(obj, "Experience", Presence::Optional, check_experience);
    checker.string_list(obj, "Certification", Presence::Optional);
    checker.string_list(obj, "Languages", Presence::Optional);

    checker.violations
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
