//! Prompt templates for the generative model.

use crate::models::record::CanonicalRecord;

/// Shape the extraction reply must follow.
const OUTPUT_FORMAT: &str = r#"{
  "Name": string or null,
  "Email": string or null,
  "Phone": string or null,
  "Skills": [string],
  "Education": [{"degree": string, "institution": string or null, "graduation_year": string or null}],
  "Experience": [{"job_title": string, "company_name": string, "years_worked": string or null, "description": string or null}],
  "Certification": [string],
  "Languages": [string]
}"#;

const EXTRACT_TEMPLATE: &str = "\
You are an expert HR recruiter. Given a raw CV/resume text, extract the following fields:

- Name: Full name of the candidate.
- Email: Valid email address.
- Phone: Phone number including country code if available.
- Skills: List of technical and professional skills. Is a list of strings.
- Education: List with degree, institution name, graduation year. With the format:
-- 'degree': degree name (e.g., Bachelor of Science in Computer Science)
-- 'institution': institution name (e.g., University of Technology). If not mentioned, return null.
-- 'graduation_year': graduation year as a string (e.g., \"2020\"). If not mentioned, return null.
- Experience: List of jobs with job title, company name, years worked, and short description. With the format:
-- 'job_title': job title (e.g., Software Engineer)
-- 'company_name': company name (e.g., Tech Solutions Inc.)
-- 'years_worked': years worked as a string (e.g., \"2 years\"). If not mentioned, return null.
-- 'description': short description of the job. If not mentioned, return null.
- Certification: List of certifications. With the format: 'Certification Name (Year)'. If year is not mentioned, return only the certification name.
- Languages: Languages the candidate can speak or write. If not mentioned, return the language used in the CV, always return as a list.

Return ONLY a valid JSON object with exactly these keys, no markdown and no commentary:
{format}

CV TEXT:
{cv_text}
";

const VALIDATE_TEMPLATE: &str = "\
You are an expert HR recruiter. Given a raw CV/resume text and a JSON object with extracted fields, analyze whether any field is incorrect or missing.
If any field is incorrect or missing information, answer False on the first line, then point out the missing and incorrect information. Otherwise answer True, and no further information.

raw CV/resume text:
{raw_cv_text}

Extracted CV JSON:
{record}
";

/// Fill `{name}` placeholders in one pass. Substituted text is never
/// scanned again, so values may contain placeholder-like text.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values.iter().find(|(name, _)| {
            tail.strip_prefix(*name)
                .is_some_and(|after| after.starts_with('}'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Prompt asking the model to extract the eight record fields from `cv_text`.
pub fn extraction_prompt(cv_text: &str) -> String {
    render(
        EXTRACT_TEMPLATE,
        &[("format", OUTPUT_FORMAT), ("cv_text", cv_text)],
    )
}

/// Prompt asking the model to judge `record` against the source text.
pub fn validation_prompt(raw_cv_text: &str, record: &CanonicalRecord) -> String {
    let record_json = record
        .to_pretty_json()
        .unwrap_or_else(|_| format!("{:?}", record));
    render(
        VALIDATE_TEMPLATE,
        &[("raw_cv_text", raw_cv_text), ("record", &record_json)],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_prompt_embeds_text_and_fields() {
        let prompt = extraction_prompt("Name: Jane Doe");
        assert!(prompt.ends_with("CV TEXT:\nName: Jane Doe\n"));
        for key in ["\"Name\"", "\"Certification\"", "\"graduation_year\"", "\"years_worked\""] {
            assert!(prompt.contains(key), "missing {}", key);
        }
        assert!(!prompt.contains("{format}"));
    }

    #[test]
    fn test_validation_prompt_embeds_record() {
        let record = CanonicalRecord {
            name: Some("Jane Doe".to_string()),
            ..Default::default()
        };
        let prompt = validation_prompt("raw text", &record);
        assert!(prompt.contains("\"Name\": \"Jane Doe\""));
        assert!(prompt.contains("raw text"));
    }

    #[test]
    fn test_placeholder_text_in_values_is_kept() {
        let record = CanonicalRecord {
            name: Some("{raw_cv_text}".to_string()),
            ..Default::default()
        };
        let prompt = validation_prompt("mentions {record} literally", &record);
        assert!(prompt.contains("\"Name\": \"{raw_cv_text}\""));
        assert!(prompt.contains("mentions {record} literally"));
        assert_eq!(prompt.matches("mentions").count(), 1);
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        assert_eq!(render("{a} {b} {", &[("a", "1")]), "1 {b} {");
    }
}
