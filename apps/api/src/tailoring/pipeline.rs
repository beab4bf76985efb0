//! Tailoring use cases — one function per caller-facing operation.
//!
//! Flow: build prompt (validates input) → one generation call → normalize.
//! Validation failures return before anything is sent upstream.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::InferenceBackend;
use crate::tailoring::matcher::find_missing;
use crate::tailoring::normalizer::{
    as_single_line, as_string_list, as_structured_resume, StructuredResume,
};
use crate::tailoring::prompts::{build_prompt, TemplateId};

#[derive(Debug, Clone, Serialize)]
pub struct TailorResult {
    pub tailored: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordReport {
    pub keywords: Vec<String>,
    pub missing: Vec<String>,
}

/// Rewrites `resume_text` towards `jd_text`.
pub async fn tailor(
    llm: &dyn InferenceBackend,
    resume_text: &str,
    jd_text: &str,
) -> Result<TailorResult, AppError> {
    let prompt = build_prompt(
        TemplateId::Tailor,
        &HashMap::from([("resume", resume_text), ("jd", jd_text)]),
    )?;
    info!(
        resume_len = resume_text.len(),
        jd_len = jd_text.len(),
        "tailor"
    );

    let tailored = llm.generate(llm.model(), &prompt).await?;
    Ok(TailorResult {
        tailored,
        model: llm.model().to_string(),
    })
}

/// Skills and phrases an ATS would scan for, in the order the model gave them.
pub async fn extract_keywords(
    llm: &dyn InferenceBackend,
    jd_text: &str,
) -> Result<Vec<String>, AppError> {
    let prompt = build_prompt(TemplateId::Keywords, &HashMap::from([("jd", jd_text)]))?;
    let raw = llm.generate(llm.model(), &prompt).await?;

    let normalized = as_string_list(&raw);
    info!(path = normalized.path(), "keywords normalized");
    Ok(normalized.into_inner())
}

/// Extracts keywords from `jd_text` and reports which ones `resume_text` lacks.
pub async fn keyword_report(
    llm: &dyn InferenceBackend,
    resume_text: &str,
    jd_text: &str,
) -> Result<KeywordReport, AppError> {
    let keywords = extract_keywords(llm, jd_text).await?;
    let missing = find_missing(resume_text, &keywords);
    info!(
        keywords = keywords.len(),
        missing = missing.len(),
        "keyword report"
    );
    Ok(KeywordReport { keywords, missing })
}

/// Hiring company named in `jd_text`.
pub async fn infer_company(llm: &dyn InferenceBackend, jd_text: &str) -> Result<String, AppError> {
    let prompt = build_prompt(TemplateId::Company, &HashMap::from([("jd", jd_text)]))?;
    let raw = llm.generate(llm.model(), &prompt).await?;
    Ok(as_single_line(&raw))
}

/// Splits `resume_text` into the six named sections.
pub async fn parse_structured_resume(
    llm: &dyn InferenceBackend,
    resume_text: &str,
) -> Result<StructuredResume, AppError> {
    let prompt = build_prompt(
        TemplateId::ResumeParsing,
        &HashMap::from([("resume", resume_text)]),
    )?;
    info!(resume_len = resume_text.len(), "parse structured resume");

    let raw = llm.generate(llm.model(), &prompt).await?;
    Ok(as_structured_resume(&raw)?)
}

/// Job requirements the resume does not demonstrate, per the model.
pub async fn analyze_ats_gaps(
    llm: &dyn InferenceBackend,
    resume_text: &str,
    jd_text: &str,
) -> Result<Vec<String>, AppError> {
    let prompt = build_prompt(
        TemplateId::AtsAnalysis,
        &HashMap::from([("resume", resume_text), ("jd", jd_text)]),
    )?;
    let raw = llm.generate(llm.model(), &prompt).await?;

    let normalized = as_string_list(&raw);
    info!(path = normalized.path(), "ATS gaps normalized");
    Ok(normalized.into_inner())
}
