use std::collections::BTreeMap;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::checklist::FieldStatus;
use crate::errors::AppError;
use crate::extraction::pipeline::{run_turn, TurnRequest, TurnStatus};
use crate::models::resume::{ResumeDocument, Section};
use crate::state::AppState;
use crate::style::{style_hint, DEFAULT_STYLE_HINT};

/// Longest raw statement accepted per turn, in characters.
pub const MAX_RAW_INPUT_CHARS: usize = 2000;

#[derive(Deserialize)]
pub struct GenerateSectionRequest {
    pub session_id: Uuid,
    pub raw_input: String,
    /// Section name, or omitted/"auto" to classify from the text.
    #[serde(default)]
    pub section_name: Option<String>,
    #[serde(default)]
    pub template_style_hint: Option<String>,
}

#[derive(Serialize)]
pub struct GenerateSectionResponse {
    pub status: TurnStatus,
    pub section: String,
    pub json_resume: ResumeDocument,
    pub quality_checklist: BTreeMap<String, FieldStatus>,
    pub quality_score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_issues: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation_warnings: Vec<String>,
}

#[derive(Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub resume_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    let handle = state.store.create_session().await?;
    Ok(Json(CreateSessionResponse {
        session_id: handle.session_id,
        resume_id: handle.resume_id,
        expires_at: handle.expires_at,
    }))
}

/// POST /api/v1/sections/generate
pub async fn handle_generate_section(
    State(state): State<AppState>,
    Json(req): Json<GenerateSectionRequest>,
) -> Result<Json<GenerateSectionResponse>, AppError> {
    let raw_input = req.raw_input.trim();
    if raw_input.is_empty() {
        return Err(AppError::Validation(
            "raw_input must not be empty".to_string(),
        ));
    }
    if raw_input.chars().count() > MAX_RAW_INPUT_CHARS {
        return Err(AppError::Validation(format!(
            "raw_input exceeds {MAX_RAW_INPUT_CHARS} characters"
        )));
    }

    let section = resolve_section(req.section_name.as_deref())?;
    let hint = req
        .template_style_hint
        .as_deref()
        .map(style_hint)
        .unwrap_or(DEFAULT_STYLE_HINT);

    let outcome = run_turn(
        state.store.as_ref(),
        &state.gateway,
        &state.merge_policy,
        state.config.llm_classifier_enabled,
        TurnRequest {
            session_id: req.session_id,
            section,
            raw_input,
            style_hint: hint,
        },
    )
    .await?;

    Ok(Json(GenerateSectionResponse {
        status: outcome.status,
        section: outcome.section.key().to_string(),
        json_resume: outcome.document,
        quality_checklist: outcome.quality_checklist,
        quality_score: outcome.quality_score,
        validation_issues: outcome.validation.issues,
        validation_warnings: outcome.validation.warnings,
    }))
}

/// `None`, blank, and "auto" all mean classify; anything else must be one of
/// the eleven section names.
fn resolve_section(name: Option<&str>) -> Result<Option<Section>, AppError> {
    match name.map(str::trim) {
        None => Ok(None),
        Some(n) if n.is_empty() || n.eq_ignore_ascii_case("auto") => Ok(None),
        Some(n) => Section::parse(n)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("unknown section: {n}"))),
    }
}
