// Postgres-backed store. Resume documents live as a single jsonb column with
// a revision counter; saves are compare-and-swap on that revision so two
// concurrent turns cannot silently overwrite each other.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::models::resume::ResumeDocument;

use super::{
    AuditRecord, ResumeStore, SessionHandle, StoreError, StoredDocument, SESSION_TTL_HOURS,
};

/// Idempotent DDL, executed once at startup.
const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS resumes (
    id          UUID PRIMARY KEY,
    data        JSONB NOT NULL DEFAULT '{}'::jsonb,
    revision    INTEGER NOT NULL DEFAULT 0,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS app_sessions (
    id          UUID PRIMARY KEY,
    resume_id   UUID NOT NULL REFERENCES resumes(id),
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at  TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS extraction_audit (
    id            UUID PRIMARY KEY,
    session_id    UUID NOT NULL REFERENCES app_sessions(id),
    section       TEXT NOT NULL,
    raw_input     TEXT NOT NULL,
    extracted     JSONB NOT NULL,
    status        TEXT NOT NULL,
    quality_score DOUBLE PRECISION NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS extraction_audit_session_idx
    ON extraction_audit(session_id);
";

#[derive(FromRow)]
struct SessionRow {
    resume_id: Uuid,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ResumeRow {
    id: Uuid,
    data: Value,
    revision: i32,
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects the pool and ensures the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        pool.execute(SCHEMA).await?;
        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    async fn find_session(&self, session_id: Uuid) -> Result<SessionRow, StoreError> {
        let session: Option<SessionRow> =
            sqlx::query_as("SELECT resume_id, expires_at FROM app_sessions WHERE id = $1")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await?;
        let session = session.ok_or(StoreError::SessionNotFound(session_id))?;
        if session.expires_at < Utc::now() {
            return Err(StoreError::SessionExpired(session_id));
        }
        Ok(session)
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn create_session(&self) -> Result<SessionHandle, StoreError> {
        let session_id = Uuid::new_v4();
        let resume_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        sqlx::query("INSERT INTO resumes (id, data, revision) VALUES ($1, '{}'::jsonb, 0)")
            .bind(resume_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO app_sessions (id, resume_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(resume_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        info!("Created session {session_id} with resume {resume_id}");
        Ok(SessionHandle {
            session_id,
            resume_id,
            expires_at,
        })
    }

    async fn load_document(&self, session_id: Uuid) -> Result<StoredDocument, StoreError> {
        let session = self.find_session(session_id).await?;

        let row: Option<ResumeRow> =
            sqlx::query_as("SELECT id, data, revision FROM resumes WHERE id = $1")
                .bind(session.resume_id)
                .fetch_optional(&self.pool)
                .await?;
        let row = row.ok_or(StoreError::SessionNotFound(session_id))?;

        let document: ResumeDocument = serde_json::from_value(row.data)?;
        Ok(StoredDocument {
            resume_id: row.id,
            document,
            revision: row.revision,
        })
    }

    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
        expected_revision: i32,
    ) -> Result<i32, StoreError> {
        let session = self.find_session(session_id).await?;
        let data = serde_json::to_value(document)?;

        let updated = sqlx::query(
            r#"
            UPDATE resumes
            SET data = $1, revision = revision + 1, updated_at = now()
            WHERE id = $2 AND revision = $3
            "#,
        )
        .bind(data)
        .bind(session.resume_id)
        .bind(expected_revision)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::RevisionConflict(session_id));
        }
        Ok(expected_revision + 1)
    }

    async fn append_audit(&self, record: &AuditRecord<'_>) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO extraction_audit
                (id, session_id, section, raw_input, extracted, status, quality_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(record.session_id)
        .bind(record.section.key())
        .bind(record.raw_input)
        .bind(record.extracted)
        .bind(record.status)
        .bind(record.quality_score)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
