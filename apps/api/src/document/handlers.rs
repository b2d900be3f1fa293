use std::collections::{BTreeMap, BTreeSet};

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::document::checklist::{build_checklist, FieldStatus};
use crate::document::guidance::{build_guidance, GuidanceReport};
use crate::document::validation::{validate_document, ValidationReport};
use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ResumeSnapshotResponse {
    pub session_id: Uuid,
    pub revision: i32,
    pub json_resume: ResumeDocument,
    pub quality_checklist: BTreeMap<String, FieldStatus>,
    pub completeness_percent: u32,
}

/// GET /api/v1/sessions/:id/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ResumeSnapshotResponse>, AppError> {
    let stored = state.store.load_document(session_id).await?;
    let guidance = build_guidance(&stored.document);
    // Skip intent is a per-utterance signal; a bare snapshot carries none.
    let quality_checklist = build_checklist(&stored.document, &BTreeSet::new());
    Ok(Json(ResumeSnapshotResponse {
        session_id,
        revision: stored.revision,
        json_resume: stored.document,
        quality_checklist,
        completeness_percent: guidance.completeness_percent,
    }))
}

/// GET /api/v1/sessions/:id/guidance
pub async fn handle_get_guidance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GuidanceReport>, AppError> {
    let stored = state.store.load_document(session_id).await?;
    Ok(Json(build_guidance(&stored.document)))
}

/// POST /api/v1/resumes/validate
pub async fn handle_validate_resume(
    Json(document): Json<ResumeDocument>,
) -> Result<Json<ValidationReport>, AppError> {
    Ok(Json(validate_document(&document)))
}
