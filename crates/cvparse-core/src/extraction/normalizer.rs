//! Coercion of raw extraction output into the canonical record.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::models::record::{format_certification, CanonicalRecord, UnvalidatedRecord, SENTINEL_EMAIL};
use crate::validation::schema::schema_violations;

/// Canonical record with its serialized form.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub record: CanonicalRecord,
    pub json: String,
}

/// Coerce types, fill defaults, then enforce the strict schema.
///
/// Numeric years become strings, a missing email becomes
/// [`SENTINEL_EMAIL`], missing `Skills`/`Education` become empty lists and
/// certification objects are rendered as `"Name (Year)"`. Anything still off
/// after that is a [`NormalizeError::Schema`].
pub fn normalize(raw: UnvalidatedRecord) -> Result<Normalized, NormalizeError> {
    let mut obj = Map::new();

    obj.insert("Name".into(), raw.name.unwrap_or(Value::Null));
    obj.insert("Email".into(), normalize_email(raw.email));
    obj.insert("Phone".into(), raw.phone.unwrap_or(Value::Null));
    obj.insert("Skills".into(), raw.skills.unwrap_or_else(|| Value::Array(Vec::new())));
    obj.insert(
        "Education".into(),
        map_items(raw.education.unwrap_or_else(|| Value::Array(Vec::new())), |item| {
            stringify_number(item, "graduation_year")
        }),
    );
    obj.insert(
        "Experience".into(),
        map_items(raw.experience.unwrap_or(Value::Null), |item| {
            stringify_number(item, "years_worked")
        }),
    );
    obj.insert(
        "Certification".into(),
        normalize_certifications(raw.certification.unwrap_or(Value::Null)),
    );
    obj.insert("Languages".into(), raw.languages.unwrap_or(Value::Null));

    let value = Value::Object(obj);
    let violations = schema_violations(&value);
    if !violations.is_empty() {
        warn!("Normalized record has {} schema violations", violations.len());
        return Err(NormalizeError::Schema(violations));
    }

    let record: CanonicalRecord = serde_json::from_value(value)?;
    let json = record.to_pretty_json()?;
    debug!(
        "Normalized record: {} skills, {} education entries",
        record.skills.len(),
        record.education.len()
    );
    Ok(Normalized { record, json })
}

fn normalize_email(email: Option<Value>) -> Value {
    match email {
        Some(Value::String(s)) if !s.trim().is_empty() => Value::String(s.trim().to_string()),
        _ => {
            debug!("No usable email extracted, using placeholder");
            Value::String(SENTINEL_EMAIL.to_string())
        }
    }
}

/// Apply `f` to every object in a list; other shapes pass through untouched
/// for the schema check to report.
fn map_items(value: Value, f: impl Fn(&mut Map<String, Value>)) -> Value {
    match value {
        Value::Array(mut items) => {
            for item in items.iter_mut() {
                if let Value::Object(fields) = item {
                    f(fields);
                }
            }
            Value::Array(items)
        }
        other => other,
    }
}

fn stringify_number(item: &mut Map<String, Value>, key: &str) {
    let text = match item.get(key) {
        Some(Value::Number(n)) => n.to_string(),
        _ => return,
    };
    item.insert(key.to_string(), Value::String(text));
}

fn normalize_certifications(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(certification_item).collect()),
        other => other,
    }
}

fn certification_item(item: Value) -> Value {
    let formatted = item.as_object().and_then(|fields| {
        let name = fields.get("name")?.as_str()?;
        let year = match fields.get("year") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(format_certification(name, year.as_deref()))
    });
    formatted.map(Value::String).unwrap_or(item)
}
