//! Validation of canonical records.
//!
//! Three independent checks (schema, email, phone) plus a model-backed
//! semantic cross-check. [`ResultValidator::run_validation`] chains email,
//! phone and semantic with short-circuiting; the schema check is standalone.
//! A failed check is a normal [`ValidationOutcome`], never an error.

pub mod rules;
pub mod schema;
mod semantic;

pub use semantic::{parse_verdict, Verdict};

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::llm::{prompts, GenerativeModel};
use crate::models::record::CanonicalRecord;

use self::rules::{is_valid_email, is_valid_phone};
use self::schema::schema_violations;

/// Result of one validation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub passed: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.passed { "passed" } else { "failed" };
        write!(f, "{}: {}", status, self.message)
    }
}

/// Outcome of every check, for reporting. Unlike `run_validation` nothing is
/// skipped except the semantic check when it is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub schema: ValidationOutcome,
    pub email: ValidationOutcome,
    pub phone: ValidationOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic: Option<ValidationOutcome>,
}

impl ValidationReport {
    /// Whether every check that ran passed.
    pub fn passed(&self) -> bool {
        self.schema.passed
            && self.email.passed
            && self.phone.passed
            && self.semantic.as_ref().is_none_or(|s| s.passed)
    }

    /// Named outcomes in check order.
    pub fn checks(&self) -> Vec<(&'static str, &ValidationOutcome)> {
        let mut checks = vec![
            ("schema", &self.schema),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        if let Some(semantic) = &self.semantic {
            checks.push(("semantic", semantic));
        }
        checks
    }
}

/// Validator for canonical records.
pub struct ResultValidator {
    model: Option<Arc<dyn GenerativeModel>>,
}

impl ResultValidator {
    /// Validator whose semantic check calls `model`.
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model: Some(model) }
    }

    /// Validator with the semantic check disabled; it always passes.
    pub fn without_semantic() -> Self {
        Self { model: None }
    }

    /// Structural check of an arbitrary candidate value, reporting every
    /// violated field.
    pub fn schema_check(&self, candidate: &Value) -> ValidationOutcome {
        let violations = schema_violations(candidate);
        if violations.is_empty() {
            return ValidationOutcome::pass("Schema validation passed");
        }

        warn!("Schema validation found {} violations", violations.len());
        let details = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        ValidationOutcome::fail(format!("Schema validation failed: {}", details))
    }

    /// Schema check of a typed record, via its JSON form.
    pub fn schema_check_record(&self, record: &CanonicalRecord) -> ValidationOutcome {
        match serde_json::to_value(record) {
            Ok(value) => self.schema_check(&value),
            Err(e) => ValidationOutcome::fail(format!("Schema validation failed: {}", e)),
        }
    }

    pub fn check_email(&self, record: &CanonicalRecord) -> ValidationOutcome {
        match record.email.as_deref() {
            None => ValidationOutcome::fail("Email is missing"),
            Some(email) if is_valid_email(email) => ValidationOutcome::pass("Valid Email"),
            Some(_) => ValidationOutcome::fail("Invalid Email Format"),
        }
    }

    pub fn check_phone(&self, record: &CanonicalRecord) -> ValidationOutcome {
        match record.phone.as_deref() {
            None => ValidationOutcome::fail("Phone number is missing"),
            Some(phone) if is_valid_phone(phone) => ValidationOutcome::pass("Valid Phone"),
            Some(_) => ValidationOutcome::fail("Invalid Phone Format"),
        }
    }

    /// Ask the model whether `record` faithfully represents `raw_text`.
    ///
    /// The verdict is advisory. Model failures and unreadable replies are
    /// reported as failed outcomes rather than errors.
    pub fn semantic_check(&self, raw_text: &str, record: &CanonicalRecord) -> ValidationOutcome {
        let Some(model) = &self.model else {
            return ValidationOutcome::pass("Semantic check skipped");
        };

        let reply = match model.generate(&prompts::validation_prompt(raw_text, record)) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Semantic check call failed: {}", e);
                return ValidationOutcome::fail(format!("Semantic check unavailable: {}", e));
            }
        };

        match parse_verdict(&reply) {
            Some(Verdict { passed: true, diagnostic }) if diagnostic.is_empty() => {
                ValidationOutcome::pass("Extracted fields match the document")
            }
            Some(Verdict { passed: false, diagnostic }) if diagnostic.is_empty() => {
                ValidationOutcome::fail("Semantic check failed without details")
            }
            Some(Verdict { passed, diagnostic }) => ValidationOutcome {
                passed,
                message: diagnostic,
            },
            None => {
                debug!("Unrecognized semantic verdict: {:?}", reply);
                ValidationOutcome::fail(reply.trim().to_string())
            }
        }
    }

    /// Email, then phone, then semantic; stops at the first failure.
    pub fn run_validation(&self, record: &CanonicalRecord, raw_text: &str) -> ValidationOutcome {
        if !self.check_email(record).passed {
            info!("Validation stopped at email check");
            return ValidationOutcome::fail("Email validation failed");
        }
        if !self.check_phone(record).passed {
            info!("Validation stopped at phone check");
            return ValidationOutcome::fail("Phone validation failed");
        }

        let semantic = self.semantic_check(raw_text, record);
        if !semantic.passed {
            info!("Validation stopped at semantic check");
            return semantic;
        }
        ValidationOutcome::pass("All validations passed")
    }

    /// Run every check without short-circuiting.
    pub fn validate_all(&self, record: &CanonicalRecord, raw_text: &str) -> ValidationReport {
        ValidationReport {
            schema: self.schema_check_record(record),
            email: self.check_email(record),
            phone: self.check_phone(record),
            semantic: self
                .model
                .is_some()
                .then(|| self.semantic_check(raw_text, record)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModel {
        reply: &'static str,
        calls: AtomicUsize,
    }

    impl CountingModel {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl GenerativeModel for CountingModel {
        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.to_string())
        }
    }

    struct Unreachable;

    impl GenerativeModel for Unreachable {
        fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            })
        }
    }

    fn record(email: Option<&str>, phone: Option<&str>) -> CanonicalRecord {
        CanonicalRecord {
            name: Some("Jane Doe".to_string()),
            email: email.map(String::from),
            phone: phone.map(String::from),
            skills: vec!["Go".to_string(), "Rust".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_check_email() {
        let validator = ResultValidator::without_semantic();
        assert!(validator.check_email(&record(Some("jane.doe@example.com"), None)).passed);
        assert_eq!(
            validator.check_email(&record(Some("jane.doe@@example"), None)),
            ValidationOutcome::fail("Invalid Email Format")
        );
        assert_eq!(
            validator.check_email(&record(None, None)),
            ValidationOutcome::fail("Email is missing")
        );
    }

    #[test]
    fn test_check_phone() {
        let validator = ResultValidator::without_semantic();
        assert!(validator.check_phone(&record(None, Some("+14155552671"))).passed);
        assert_eq!(
            validator.check_phone(&record(None, Some("0123"))),
            ValidationOutcome::fail("Invalid Phone Format")
        );
        assert_eq!(
            validator.check_phone(&record(None, None)),
            ValidationOutcome::fail("Phone number is missing")
        );
    }

    #[test]
    fn test_schema_check_reports_all_fields() {
        let validator = ResultValidator::without_semantic();
        let outcome = validator.schema_check(&json!({"Name": 1, "Education": "none"}));
        assert!(!outcome.passed);
        assert_eq!(
            outcome.message,
            "Schema validation failed: Name: expected string, got number; \
             Skills: field required; Education: expected list, got string"
        );

        assert!(validator
            .schema_check_record(&record(Some("jane@x.com"), None))
            .passed);
    }

    #[test]
    fn test_invalid_email_short_circuits() {
        let model = CountingModel::new("True");
        let validator = ResultValidator::new(model.clone());

        let outcome = validator.run_validation(&record(Some("jane.doe@@example"), Some("+14155552671")), "cv");
        assert_eq!(outcome, ValidationOutcome::fail("Email validation failed"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_phone_short_circuits() {
        let model = CountingModel::new("True");
        let validator = ResultValidator::new(model.clone());

        let outcome = validator.run_validation(&record(Some("jane@x.com"), None), "cv");
        assert_eq!(outcome, ValidationOutcome::fail("Phone validation failed"));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_semantic_failure_returns_diagnostic() {
        let model = CountingModel::new("False\nSkills are missing Python.");
        let validator = ResultValidator::new(model.clone());

        let outcome = validator.run_validation(&record(Some("jane@x.com"), Some("+15551234567")), "cv");
        assert_eq!(outcome, ValidationOutcome::fail("Skills are missing Python."));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_all_checks_pass() {
        let validator = ResultValidator::new(CountingModel::new("True"));
        let outcome = validator.run_validation(&record(Some("jane@x.com"), Some("+15551234567")), "cv");
        assert_eq!(outcome, ValidationOutcome::pass("All validations passed"));
    }

    #[test]
    fn test_semantic_model_error_is_failed_outcome() {
        let validator = ResultValidator::new(Arc::new(Unreachable));
        let outcome = validator.semantic_check("cv", &record(None, None));
        assert!(!outcome.passed);
        assert!(outcome.message.contains("overloaded"));
    }

    #[test]
    fn test_unparseable_verdict_fails_with_reply() {
        let validator = ResultValidator::new(CountingModel::new("Looks good to me"));
        assert_eq!(
            validator.semantic_check("cv", &record(None, None)),
            ValidationOutcome::fail("Looks good to me")
        );
    }

    #[test]
    fn test_validate_all_runs_every_check() {
        let model = CountingModel::new("True");
        let validator = ResultValidator::new(model.clone());

        let report = validator.validate_all(&record(Some("bad"), None), "cv");
        assert!(!report.schema.passed);
        assert!(!report.email.passed);
        assert!(!report.phone.passed);
        assert_eq!(report.semantic.as_ref().map(|s| s.passed), Some(true));
        assert!(!report.passed());
        assert_eq!(report.checks().len(), 4);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);

        let report = ResultValidator::without_semantic()
            .validate_all(&record(Some("jane@x.com"), Some("+15551234567")), "cv");
        assert_eq!(report.semantic, None);
        assert!(report.passed());
    }
}
