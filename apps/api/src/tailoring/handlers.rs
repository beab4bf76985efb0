//! Axum route handlers for the tailoring API.

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::tailoring::matcher::find_missing;
use crate::tailoring::normalizer::StructuredResume;
use crate::tailoring::pipeline::{
    analyze_ats_gaps, infer_company, keyword_report, parse_structured_resume, tailor,
    KeywordReport, TailorResult,
};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Shared body for every endpoint that compares a resume with a job description.
#[derive(Debug, Deserialize)]
pub struct ResumeJdRequest {
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ResumeRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
pub struct MissingKeywordsRequest {
    pub resume_text: String,
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MissingKeywordsResponse {
    pub missing: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyForm {
    pub jd_text: String,
}

#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub company: String,
}

#[derive(Debug, Serialize)]
pub struct AtsCheckResponse {
    pub missing_requirements: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /tailor
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<ResumeJdRequest>,
) -> Result<Json<TailorResult>, AppError> {
    let result = tailor(state.llm.as_ref(), &request.resume_text, &request.jd_text).await?;
    Ok(Json(result))
}

/// POST /keywords
///
/// Extracts JD keywords and reports which ones the resume lacks.
pub async fn handle_keywords(
    State(state): State<AppState>,
    Json(request): Json<ResumeJdRequest>,
) -> Result<Json<KeywordReport>, AppError> {
    let report =
        keyword_report(state.llm.as_ref(), &request.resume_text, &request.jd_text).await?;
    Ok(Json(report))
}

/// POST /keywords/missing
///
/// Pure matching against a caller-supplied keyword list; no model call.
pub async fn handle_missing_keywords(
    Json(request): Json<MissingKeywordsRequest>,
) -> Json<MissingKeywordsResponse> {
    Json(MissingKeywordsResponse {
        missing: find_missing(&request.resume_text, &request.keywords),
    })
}

/// POST /infer-company (form-encoded `jd_text`)
pub async fn handle_infer_company(
    State(state): State<AppState>,
    Form(form): Form<CompanyForm>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = infer_company(state.llm.as_ref(), &form.jd_text).await?;
    Ok(Json(CompanyResponse { company }))
}

/// POST /parse-structured-resume
pub async fn handle_parse_structured_resume(
    State(state): State<AppState>,
    Json(request): Json<ResumeRequest>,
) -> Result<Json<StructuredResume>, AppError> {
    let resume = parse_structured_resume(state.llm.as_ref(), &request.resume_text).await?;
    Ok(Json(resume))
}

/// POST /ats-check
pub async fn handle_ats_check(
    State(state): State<AppState>,
    Json(request): Json<ResumeJdRequest>,
) -> Result<Json<AtsCheckResponse>, AppError> {
    let missing_requirements =
        analyze_ats_gaps(state.llm.as_ref(), &request.resume_text, &request.jd_text).await?;
    Ok(Json(AtsCheckResponse {
        missing_requirements,
    }))
}
