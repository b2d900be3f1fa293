// In-memory store for pipeline and handler tests. Honors the same
// compare-and-swap contract as the Postgres store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::models::resume::ResumeDocument;

use super::{
    AuditRecord, ResumeStore, SessionHandle, StoreError, StoredDocument, SESSION_TTL_HOURS,
};

/// Owned copy of an audit record, inspectable from tests.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub session_id: Uuid,
    pub section: String,
    pub raw_input: String,
    pub status: String,
    pub quality_score: f64,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<Uuid, SessionHandle>,
    resumes: HashMap<Uuid, (ResumeDocument, i32)>,
    audit: Vec<AuditEntry>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdates a session so expiry paths can be exercised.
    pub fn expire_session(&self, session_id: Uuid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(handle) = inner.sessions.get_mut(&session_id) {
            handle.expires_at = Utc::now() - Duration::hours(1);
        }
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.inner.lock().unwrap().audit.clone()
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn create_session(&self) -> Result<SessionHandle, StoreError> {
        let handle = SessionHandle {
            session_id: Uuid::new_v4(),
            resume_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
        };
        let mut inner = self.inner.lock().unwrap();
        inner
            .resumes
            .insert(handle.resume_id, (ResumeDocument::default(), 0));
        inner.sessions.insert(handle.session_id, handle.clone());
        Ok(handle)
    }

    async fn load_document(&self, session_id: Uuid) -> Result<StoredDocument, StoreError> {
        let inner = self.inner.lock().unwrap();
        let handle = inner
            .sessions
            .get(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        if handle.expires_at < Utc::now() {
            return Err(StoreError::SessionExpired(session_id));
        }
        let (document, revision) = inner
            .resumes
            .get(&handle.resume_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        Ok(StoredDocument {
            resume_id: handle.resume_id,
            document: document.clone(),
            revision: *revision,
        })
    }

    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
        expected_revision: i32,
    ) -> Result<i32, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let resume_id = {
            let handle = inner
                .sessions
                .get(&session_id)
                .ok_or(StoreError::SessionNotFound(session_id))?;
            if handle.expires_at < Utc::now() {
                return Err(StoreError::SessionExpired(session_id));
            }
            handle.resume_id
        };
        let slot = inner
            .resumes
            .get_mut(&resume_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        if slot.1 != expected_revision {
            return Err(StoreError::RevisionConflict(session_id));
        }
        slot.0 = document.clone();
        slot.1 += 1;
        Ok(slot.1)
    }

    async fn append_audit(&self, record: &AuditRecord<'_>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.audit.push(AuditEntry {
            session_id: record.session_id,
            section: record.section.key().to_string(),
            raw_input: record.raw_input.to_string(),
            status: record.status.to_string(),
            quality_score: record.quality_score,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Basics, Section};
    use serde_json::json;

    fn named_doc(name: &str) -> ResumeDocument {
        ResumeDocument {
            basics: Some(Basics {
                name: Some(name.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_session_starts_with_empty_resume() {
        let store = MemoryStore::new();
        let handle = store.create_session().await.unwrap();

        let stored = store.load_document(handle.session_id).await.unwrap();
        assert_eq!(stored.resume_id, handle.resume_id);
        assert_eq!(stored.revision, 0);
        assert_eq!(stored.document, ResumeDocument::default());
    }

    #[tokio::test]
    async fn test_save_bumps_revision_and_persists() {
        let store = MemoryStore::new();
        let handle = store.create_session().await.unwrap();

        let next = store
            .save_document(handle.session_id, &named_doc("Ada Lovelace"), 0)
            .await
            .unwrap();
        assert_eq!(next, 1);

        let stored = store.load_document(handle.session_id).await.unwrap();
        assert_eq!(stored.revision, 1);
        assert_eq!(
            stored.document.basics.unwrap().name.as_deref(),
            Some("Ada Lovelace")
        );
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected() {
        let store = MemoryStore::new();
        let handle = store.create_session().await.unwrap();

        store
            .save_document(handle.session_id, &named_doc("First"), 0)
            .await
            .unwrap();
        let err = store
            .save_document(handle.session_id, &named_doc("Second"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RevisionConflict(_)));

        let stored = store.load_document(handle.session_id).await.unwrap();
        assert_eq!(stored.document.basics.unwrap().name.as_deref(), Some("First"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = MemoryStore::new();
        let err = store.load_document(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_session_refuses_load_and_save() {
        let store = MemoryStore::new();
        let handle = store.create_session().await.unwrap();
        store.expire_session(handle.session_id);

        let err = store.load_document(handle.session_id).await.unwrap_err();
        assert!(matches!(err, StoreError::SessionExpired(_)));

        let err = store
            .save_document(handle.session_id, &named_doc("Late"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::SessionExpired(_)));
    }

    #[tokio::test]
    async fn test_audit_entries_accumulate() {
        let store = MemoryStore::new();
        let handle = store.create_session().await.unwrap();

        let extracted = json!({"work": [{"name": "Acme"}]});
        store
            .append_audit(&AuditRecord {
                session_id: handle.session_id,
                section: Section::Work,
                raw_input: "I work at Acme",
                extracted: &extracted,
                status: "success",
                quality_score: 0.8,
            })
            .await
            .unwrap();

        let entries = store.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, "work");
        assert_eq!(entries[0].status, "success");
    }
}
