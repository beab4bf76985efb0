//! Prompt templates for every tailoring use case, and the builder that fills them.
//!
//! Slots are `{name}` with `name` made of `[a-z_]`. Any other brace is literal
//! template text, so JSON examples inside templates need no escaping. Filling is
//! single-pass: inserted user text is never scanned for slots again.

use std::collections::HashMap;

use thiserror::Error;

/// Rewrite prompt. Replace: {resume}, {jd}
pub const TAILOR_PROMPT: &str = "You are an expert resume writer.
Rewrite the RESUME to better match the JOB DESCRIPTION, optimizing for ATS keywords, while keeping it strictly truthful and concise.
Return only the new resume text, no explanations.

RESUME:
{resume}

JOB DESCRIPTION:
{jd}
";

/// Keyword extraction prompt. Replace: {jd}
pub const KEYWORDS_PROMPT: &str = r#"Extract 20–30 key skills/phrases from the JOB DESCRIPTION that ATS would likely scan for.
Return ONLY a JSON array of strings, e.g. ["Java","Spring Boot","Microservices"].

JOB DESCRIPTION:
{jd}
"#;

/// Company identification prompt. Replace: {jd}
pub const COMPANY_PROMPT: &str = "From the JOB DESCRIPTION below, identify the hiring company name in a few words.
Return ONLY the company name as plain text.

JOB DESCRIPTION:
{jd}
";

/// ATS gap analysis prompt. Replace: {resume}, {jd}
pub const ATS_ANALYSIS_PROMPT: &str = r#"You are an applicant tracking system (ATS) reviewing a RESUME against a JOB DESCRIPTION.
List the requirements, skills and qualifications from the JOB DESCRIPTION that the RESUME does not demonstrate.
Only list gaps that are actually missing; do not list anything the RESUME already covers.
Return ONLY a JSON array of short strings, e.g. ["Kubernetes","5+ years of backend experience"].
Return [] if nothing is missing.

RESUME:
{resume}

JOB DESCRIPTION:
{jd}
"#;

/// Structured resume parsing prompt. Replace: {resume}
pub const RESUME_PARSING_PROMPT: &str = r#"Split the RESUME below into sections.
Return ONLY a JSON object with EXACTLY these keys, each value a plain string (not a list or object):
{
  "profile": "name and contact details",
  "summary": "professional summary",
  "education": "degrees, schools, dates",
  "skills": "technical and soft skills",
  "work_experience": "roles, companies, dates and bullet points",
  "projects": "projects and what they achieved"
}
Copy text from the RESUME verbatim. Use "" for any section the RESUME does not have.
Do NOT use markdown code fences. Do NOT include explanations.

RESUME:
{resume}
"#;

/// One template per use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateId {
    Tailor,
    Keywords,
    Company,
    AtsAnalysis,
    ResumeParsing,
}

impl TemplateId {
    pub fn template(self) -> &'static str {
        match self {
            TemplateId::Tailor => TAILOR_PROMPT,
            TemplateId::Keywords => KEYWORDS_PROMPT,
            TemplateId::Company => COMPANY_PROMPT,
            TemplateId::AtsAnalysis => ATS_ANALYSIS_PROMPT,
            TemplateId::ResumeParsing => RESUME_PARSING_PROMPT,
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            TemplateId::Tailor | TemplateId::AtsAnalysis => &["resume", "jd"],
            TemplateId::Keywords | TemplateId::Company => &["jd"],
            TemplateId::ResumeParsing => &["resume"],
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("{0} is missing")]
    MissingField(&'static str),

    #[error("{0} is empty")]
    EmptyField(&'static str),

    #[error("Prompt template error: {0}")]
    Template(String),
}

/// Fills `id`'s template from `fields`. Required fields must be present and
/// non-blank; values are inserted verbatim.
pub fn build_prompt(id: TemplateId, fields: &HashMap<&str, &str>) -> Result<String, PromptError> {
    for &name in id.required_fields() {
        match fields.get(name) {
            None => return Err(PromptError::MissingField(name)),
            Some(value) if value.trim().is_empty() => return Err(PromptError::EmptyField(name)),
            Some(_) => {}
        }
    }
    render(id.template(), fields)
}

fn render(template: &str, fields: &HashMap<&str, &str>) -> Result<String, PromptError> {
    let extra: usize = fields.values().map(|v| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match slot_name(after) {
            Some(name) => {
                let value = fields.get(name).ok_or_else(|| {
                    PromptError::Template(format!("no value supplied for slot '{{{name}}}'"))
                })?;
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

/// `Some(name)` if `text` starts with `name}` and `name` is a slot identifier.
fn slot_name(text: &str) -> Option<&str> {
    let end = text.find('}')?;
    let name = &text[..end];
    let valid = !name.is_empty() && name.bytes().all(|b| b.is_ascii_lowercase() || b == b'_');
    valid.then_some(name)
}
