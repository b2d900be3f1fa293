// Persistence layer: sessions, resume documents, and the extraction audit
// trail. The pipeline talks to the `ResumeStore` trait so tests can swap in
// the in-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{ResumeDocument, Section};

pub mod postgres;

#[cfg(test)]
pub mod memory;

/// Sessions are short-lived; expired ones refuse further turns.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),

    #[error("session {0} has expired")]
    SessionExpired(Uuid),

    #[error("resume for session {0} was modified concurrently")]
    RevisionConflict(Uuid),

    #[error("stored document could not be decoded: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Handle returned on session creation.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub session_id: Uuid,
    pub resume_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A loaded document together with the revision to hand back on save.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub resume_id: Uuid,
    pub document: ResumeDocument,
    pub revision: i32,
}

/// One extraction turn, recorded whether or not the turn changed the resume.
pub struct AuditRecord<'a> {
    pub session_id: Uuid,
    pub section: Section,
    pub raw_input: &'a str,
    pub extracted: &'a Value,
    pub status: &'a str,
    pub quality_score: f64,
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Creates a session with an empty resume attached.
    async fn create_session(&self) -> Result<SessionHandle, StoreError>;

    /// Loads the resume for a session, rejecting unknown and expired sessions.
    async fn load_document(&self, session_id: Uuid) -> Result<StoredDocument, StoreError>;

    /// Compare-and-swap save: succeeds only while `expected_revision` still
    /// matches the stored row. Returns the new revision.
    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
        expected_revision: i32,
    ) -> Result<i32, StoreError>;

    async fn append_audit(&self, record: &AuditRecord<'_>) -> Result<(), StoreError>;
}
