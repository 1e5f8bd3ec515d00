//! Resume record types.
//!
//! [`UnvalidatedRecord`] is what the field extraction service hands back:
//! every field optional and loosely typed. [`CanonicalRecord`] is the strict
//! schema produced by the normalizer. Field order here is the serialized
//! output order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder stored when the extraction has no usable email.
pub const SENTINEL_EMAIL: &str = "sample_email@sample.com";

/// Fully normalized resume record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Full name of the candidate.
    #[serde(rename = "Name")]
    pub name: Option<String>,

    /// Contact email.
    #[serde(rename = "Email")]
    pub email: Option<String>,

    /// Phone number, country code included when present in the source.
    #[serde(rename = "Phone")]
    pub phone: Option<String>,

    /// Technical and professional skills.
    #[serde(rename = "Skills")]
    pub skills: Vec<String>,

    /// Education history.
    #[serde(rename = "Education")]
    pub education: Vec<EducationItem>,

    /// Work history.
    #[serde(rename = "Experience")]
    pub experience: Option<Vec<ExperienceItem>>,

    /// Certifications as `"Name (Year)"` or `"Name"`.
    #[serde(rename = "Certification")]
    pub certification: Option<Vec<String>>,

    /// Spoken or written languages.
    #[serde(rename = "Languages")]
    pub languages: Option<Vec<String>>,
}

/// One education entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationItem {
    pub degree: String,
    pub institution: Option<String>,
    /// Kept as text: "2020", "expected 2025", "Present".
    pub graduation_year: Option<String>,
}

/// One job entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceItem {
    pub job_title: String,
    pub company_name: String,
    /// Kept as text: "2 years", "2019 - Present".
    pub years_worked: Option<String>,
    pub description: Option<String>,
}

impl CanonicalRecord {
    /// Serialize with stable field order and two-space indentation.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Whether the email is the placeholder inserted by normalization.
    pub fn has_sentinel_email(&self) -> bool {
        self.email.as_deref() == Some(SENTINEL_EMAIL)
    }
}

/// Raw output of the field extraction service, before normalization.
///
/// Values keep whatever JSON type the model produced. Unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnvalidatedRecord {
    #[serde(rename = "Name", default)]
    pub name: Option<Value>,

    #[serde(rename = "Email", default)]
    pub email: Option<Value>,

    #[serde(rename = "Phone", default)]
    pub phone: Option<Value>,

    #[serde(rename = "Skills", default)]
    pub skills: Option<Value>,

    #[serde(rename = "Education", default)]
    pub education: Option<Value>,

    #[serde(rename = "Experience", default)]
    pub experience: Option<Value>,

    #[serde(rename = "Certification", default)]
    pub certification: Option<Value>,

    #[serde(rename = "Languages", default)]
    pub languages: Option<Value>,
}

impl UnvalidatedRecord {
    /// Build from a JSON object.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Loosen a canonical record back into raw form.
    pub fn from_canonical(record: &CanonicalRecord) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::to_value(record)?)
    }
}

/// Render a certification as `"Name (Year)"`, or just `"Name"` without a year.
pub fn format_certification(name: &str, year: Option<&str>) -> String {
    let name = name.trim();
    match year.map(str::trim).filter(|y| !y.is_empty()) {
        Some(year) => format!("{} ({})", name, year),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_certification_with_year() {
        assert_eq!(
            format_certification("AWS Certified", Some("2021")),
            "AWS Certified (2021)"
        );
    }

    #[test]
    fn test_certification_without_year() {
        assert_eq!(format_certification("AWS Certified", None), "AWS Certified");
        assert_eq!(format_certification("AWS Certified", Some("  ")), "AWS Certified");
    }

    #[test]
    fn test_field_order_in_json() {
        let record = CanonicalRecord {
            name: Some("Jane Doe".to_string()),
            email: Some("jane@x.com".to_string()),
            education: vec![EducationItem {
                degree: "BSc".to_string(),
                institution: None,
                graduation_year: Some("2020".to_string()),
            }],
            ..Default::default()
        };

        let json = record.to_pretty_json().unwrap();
        let keys = [
            "\"Name\"",
            "\"Email\"",
            "\"Phone\"",
            "\"Skills\"",
            "\"Education\"",
            "\"degree\"",
            "\"institution\"",
            "\"graduation_year\"",
            "\"Experience\"",
            "\"Certification\"",
            "\"Languages\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(json.contains("\n  \"Name\": \"Jane Doe\""));
    }

    #[test]
    fn test_unvalidated_ignores_unknown_keys() {
        let raw = UnvalidatedRecord::from_value(serde_json::json!({
            "Name": "Jane",
            "Hobbies": ["chess"]
        }))
        .unwrap();
        assert_eq!(raw.name, Some(Value::from("Jane")));
        assert_eq!(raw.skills, None);
    }
}
