// Turn pipeline. One call covers a full conversational turn: load the
// session's resume, resolve the target section, attempt LLM extraction with
// provider failover, rescue with the rule-based extractor when that yields
// nothing, merge additively, persist, audit, and report the checklist.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::document::checklist::{build_checklist, detect_skip_signals, FieldStatus};
use crate::document::merge::{merge_documents, MergePolicy};
use crate::document::normalize::{is_empty_candidate, normalize_candidate};
use crate::document::validation::{validate_document, ValidationReport};
use crate::errors::AppError;
use crate::extraction::classifier::{classify_keywords, classify_with_llm};
use crate::extraction::fallback;
use crate::extraction::prompts::build_extraction_prompt;
use crate::extraction::sanitizer::extract_json;
use crate::llm_client::LlmGateway;
use crate::models::resume::{ResumeDocument, Section};
use crate::storage::{AuditRecord, ResumeStore};

/// Quality attributed to a turn whose data came from the LLM path.
pub const LLM_QUALITY_SCORE: f64 = 0.8;
/// Quality attributed to a turn rescued by the rule-based extractor.
pub const FALLBACK_QUALITY_SCORE: f64 = 0.6;
/// Quality attributed to a turn that produced nothing usable.
pub const ERROR_QUALITY_SCORE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    Success,
    FallbackSuccess,
    Error,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Success => "success",
            TurnStatus::FallbackSuccess => "fallback_success",
            TurnStatus::Error => "error",
        }
    }
}

/// One turn's input. `section` of `None` means classify from the text.
pub struct TurnRequest<'a> {
    pub session_id: Uuid,
    pub section: Option<Section>,
    pub raw_input: &'a str,
    pub style_hint: &'a str,
}

/// What a turn produced, shaped for the orchestrator.
#[derive(Debug)]
pub struct TurnOutcome {
    pub status: TurnStatus,
    pub section: Section,
    pub document: ResumeDocument,
    pub quality_checklist: BTreeMap<String, FieldStatus>,
    pub validation: ValidationReport,
    pub quality_score: f64,
}

pub async fn run_turn(
    store: &dyn ResumeStore,
    gateway: &LlmGateway,
    policy: &MergePolicy,
    llm_classifier_enabled: bool,
    req: TurnRequest<'_>,
) -> Result<TurnOutcome, AppError> {
    let stored = store.load_document(req.session_id).await?;
    let mut document = stored.document;

    let section = match req.section {
        Some(section) => section,
        None if llm_classifier_enabled && !gateway.is_empty() => {
            classify_with_llm(gateway, req.raw_input, &document).await
        }
        None => classify_keywords(req.raw_input),
    };
    debug!(session = %req.session_id, section = %section, "turn started");

    let llm_candidate = if gateway.is_empty() {
        None
    } else {
        let prompt = build_extraction_prompt(section, req.raw_input, req.style_hint, &document);
        match gateway.generate(&prompt, |raw| extract_json(raw).ok()).await {
            Ok(generated) => {
                debug!(
                    provider = generated.provider,
                    "extraction candidate accepted"
                );
                Some(generated.output)
            }
            Err(e) => {
                warn!("LLM extraction unavailable ({e}); trying rule-based extraction");
                None
            }
        }
    };

    let mut status = TurnStatus::Error;
    let mut extracted = json!({});
    let mut merged: Option<ResumeDocument> = None;

    if let Some(candidate) = llm_candidate {
        let normalized = normalize_candidate(candidate, section);
        if !is_empty_candidate(&normalized) {
            match merge_documents(&document, &normalized, policy) {
                Ok(doc) => {
                    status = TurnStatus::Success;
                    extracted = normalized;
                    merged = Some(doc);
                }
                Err(e) => {
                    warn!("merging LLM candidate failed ({e}); trying rule-based extraction");
                }
            }
        }
    }

    if merged.is_none() {
        let normalized = normalize_candidate(fallback::extract(section, req.raw_input), section);
        if !is_empty_candidate(&normalized) {
            match merge_documents(&document, &normalized, policy) {
                Ok(doc) => {
                    status = TurnStatus::FallbackSuccess;
                    extracted = normalized;
                    merged = Some(doc);
                }
                Err(e) => {
                    warn!("merging rule-based candidate failed: {e}");
                }
            }
        }
    }

    let quality_score = match status {
        TurnStatus::Success => LLM_QUALITY_SCORE,
        TurnStatus::FallbackSuccess => FALLBACK_QUALITY_SCORE,
        TurnStatus::Error => ERROR_QUALITY_SCORE,
    };

    if let Some(doc) = merged {
        let revision = store
            .save_document(req.session_id, &doc, stored.revision)
            .await?;
        info!(
            "Saved resume revision {revision} for session {} ({} turn, section {section})",
            req.session_id,
            status.as_str()
        );
        document = doc;
    }

    // Every turn is audited, including ones that changed nothing.
    store
        .append_audit(&AuditRecord {
            session_id: req.session_id,
            section,
            raw_input: req.raw_input,
            extracted: &extracted,
            status: status.as_str(),
            quality_score,
        })
        .await?;

    let validation = validate_document(&document);
    let skips = detect_skip_signals(req.raw_input);
    let quality_checklist = build_checklist(&document, &skips);

    Ok(TurnOutcome {
        status,
        section,
        document,
        quality_checklist,
        validation,
        quality_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmError, StubProvider};
    use crate::storage::memory::MemoryStore;
    use crate::style::DEFAULT_STYLE_HINT;
    use std::sync::Arc;

    fn gateway_with(replies: Vec<Result<String, LlmError>>) -> LlmGateway {
        LlmGateway::new(vec![Arc::new(StubProvider::new(replies))])
    }

    fn empty_gateway() -> LlmGateway {
        LlmGateway::new(Vec::new())
    }

    async fn turn(
        store: &MemoryStore,
        gateway: &LlmGateway,
        session_id: Uuid,
        raw_input: &str,
    ) -> TurnOutcome {
        run_turn(
            store,
            gateway,
            &MergePolicy::default(),
            false,
            TurnRequest {
                session_id,
                section: None,
                raw_input,
                style_hint: DEFAULT_STYLE_HINT,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_llm_extraction_merges_and_persists() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        let reply = concat!(
            "```json\n",
            "{\"work\": [{\"name\": \"Acme Corp\", \"position\": \"Software Engineer\", ",
            "\"startDate\": \"2021-03\", \"summary\": \"Built the billing backend.\"}]}\n",
            "```"
        );
        let gateway = gateway_with(vec![Ok(reply.to_string())]);

        let outcome = turn(
            &store,
            &gateway,
            session.session_id,
            "I work at Acme Corp as a software engineer",
        )
        .await;

        assert_eq!(outcome.status, TurnStatus::Success);
        assert_eq!(outcome.section, Section::Work);
        assert_eq!(outcome.quality_score, LLM_QUALITY_SCORE);
        assert_eq!(outcome.document.work[0].name.as_deref(), Some("Acme Corp"));

        assert_eq!(
            outcome.quality_checklist.get("work[0].name"),
            Some(&FieldStatus::Ok)
        );
        assert_eq!(
            outcome.quality_checklist.get("work[0].highlights"),
            Some(&FieldStatus::Missing)
        );

        let stored = store.load_document(session.session_id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(stored.document.work[0].name.as_deref(), Some("Acme Corp"));

        let audit = store.audit_entries();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].status, "success");
        assert_eq!(audit[0].section, "work");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back_to_rules() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        let gateway = gateway_with(vec![Err(LlmError::Api {
            status: 500,
            message: "upstream unavailable".to_string(),
        })]);

        let outcome = turn(
            &store,
            &gateway,
            session.session_id,
            "I worked as a barista at Blue Bottle since 2019",
        )
        .await;

        assert_eq!(outcome.status, TurnStatus::FallbackSuccess);
        assert_eq!(outcome.quality_score, FALLBACK_QUALITY_SCORE);
        assert_eq!(
            outcome.document.work[0].name.as_deref(),
            Some("Blue Bottle")
        );
        assert_eq!(outcome.document.work[0].position.as_deref(), Some("Barista"));

        let audit = store.audit_entries();
        assert_eq!(audit[0].status, "fallback_success");
    }

    #[tokio::test]
    async fn test_unusable_llm_output_falls_back_to_rules() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        let gateway = gateway_with(vec![Ok(
            "I'm sorry, I can't produce JSON for that request.".to_string()
        )]);

        let outcome = turn(
            &store,
            &gateway,
            session.session_id,
            "I worked as a nurse at Mercy Hospital from 2015 to 2020",
        )
        .await;

        assert_eq!(outcome.status, TurnStatus::FallbackSuccess);
        assert_eq!(
            outcome.document.work[0].name.as_deref(),
            Some("Mercy Hospital")
        );
    }

    #[tokio::test]
    async fn test_small_talk_changes_nothing_and_is_audited() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();

        let outcome = turn(&store, &empty_gateway(), session.session_id, "I like coffee").await;

        assert_eq!(outcome.status, TurnStatus::Error);
        assert_eq!(outcome.quality_score, ERROR_QUALITY_SCORE);
        assert_eq!(outcome.document, ResumeDocument::default());

        let stored = store.load_document(session.session_id).await.unwrap();
        assert_eq!(stored.revision, 0);

        let audit = store.audit_entries();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].status, "error");
        assert_eq!(audit[0].quality_score, 0.0);
    }

    #[tokio::test]
    async fn test_skip_intent_marks_checklist_without_fabricating() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();

        let outcome = turn(
            &store,
            &empty_gateway(),
            session.session_id,
            "Let's skip the phone number for now",
        )
        .await;

        assert_eq!(
            outcome.quality_checklist.get("basics.phone"),
            Some(&FieldStatus::Skipped)
        );
        assert!(outcome
            .document
            .basics
            .as_ref()
            .and_then(|b| b.phone.as_ref())
            .is_none());
    }

    #[tokio::test]
    async fn test_explicit_section_overrides_classifier() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();

        let outcome = run_turn(
            &store,
            &empty_gateway(),
            &MergePolicy::default(),
            false,
            TurnRequest {
                session_id: session.session_id,
                section: Some(Section::Skills),
                raw_input: "Python, Django and Flask",
                style_hint: DEFAULT_STYLE_HINT,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.section, Section::Skills);
        assert_eq!(outcome.status, TurnStatus::FallbackSuccess);
        assert_eq!(outcome.document.skills[0].name.as_deref(), Some("Python"));
    }

    #[tokio::test]
    async fn test_llm_classifier_consumes_first_reply() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        let gateway = gateway_with(vec![
            Ok("education".to_string()),
            Ok(r#"{"education": [{"institution": "Oberlin College", "studyType": "Bachelor's", "area": "History"}]}"#.to_string()),
        ]);

        let outcome = run_turn(
            &store,
            &gateway,
            &MergePolicy::default(),
            true,
            TurnRequest {
                session_id: session.session_id,
                section: None,
                raw_input: "Oberlin, class of 2012, history",
                style_hint: DEFAULT_STYLE_HINT,
            },
        )
        .await
        .unwrap();

        assert_eq!(outcome.section, Section::Education);
        assert_eq!(outcome.status, TurnStatus::Success);
        assert_eq!(
            outcome.document.education[0].institution.as_deref(),
            Some("Oberlin College")
        );
    }

    #[tokio::test]
    async fn test_auto_section_work_statement_end_to_end() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();

        let outcome = turn(
            &store,
            &empty_gateway(),
            session.session_id,
            "I worked as a Senior Engineer at Acme Corp from 2020 to 2022",
        )
        .await;

        assert_eq!(outcome.section, Section::Work);
        let entry = &outcome.document.work[0];
        assert_eq!(entry.name.as_deref(), Some("Acme Corp"));
        assert_eq!(entry.position.as_deref(), Some("Senior Engineer"));
        assert_eq!(entry.start_date.as_deref(), Some("2020"));
        assert_eq!(entry.end_date.as_deref(), Some("2022"));
        assert_eq!(
            outcome.quality_checklist.get("work[0].highlights"),
            Some(&FieldStatus::Missing)
        );
    }

    #[tokio::test]
    async fn test_repeated_statement_does_not_duplicate_entries() {
        let store = MemoryStore::new();
        let session = store.create_session().await.unwrap();
        let gateway = empty_gateway();
        let statement = "I worked as a barista at Blue Bottle since 2019";

        turn(&store, &gateway, session.session_id, statement).await;
        let outcome = turn(&store, &gateway, session.session_id, statement).await;

        assert_eq!(outcome.document.work.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_an_app_error() {
        let store = MemoryStore::new();
        let err = run_turn(
            &store,
            &empty_gateway(),
            &MergePolicy::default(),
            false,
            TurnRequest {
                session_id: Uuid::new_v4(),
                section: None,
                raw_input: "I work at Acme",
                style_hint: DEFAULT_STYLE_HINT,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
