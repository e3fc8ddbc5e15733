//! PostgreSQL Session Store

use chrono::Utc;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::domain::entity::session::{SessionData, SessionId, SessionRecord};
use crate::domain::repository::SessionStore;
use crate::error::AuthResult;

/// PostgreSQL-backed session store
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Clean up expired sessions
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let now = Utc::now().timestamp();

        let deleted = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired auth sessions");

        Ok(deleted)
    }
}

// ============================================================================
// Session Store Implementation
// ============================================================================

impl SessionStore for PgSessionStore {
    async fn load(&self, id: &SessionId) -> AuthResult<Option<SessionRecord>> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, data, expires_at
            FROM auth_sessions
            WHERE session_id = $1 AND expires_at > $2
            "#,
        )
        .bind(id.as_str())
        .bind(Utc::now().timestamp())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(SessionRow::into_record))
    }

    async fn save(&self, record: &SessionRecord) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (session_id, data, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_id)
            DO UPDATE SET data = EXCLUDED.data, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(record.id.as_str())
        .bind(Json(&record.data))
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> AuthResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE session_id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn cleanup_expired(&self) -> AuthResult<u64> {
        self.cleanup_expired().await
    }
}

// ============================================================================
// Row Types for sqlx mapping
// ============================================================================

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    data: Json<SessionData>,
    expires_at: i64,
}

impl SessionRow {
    fn into_record(self) -> Option<SessionRecord> {
        let Some(id) = SessionId::parse(&self.session_id) else {
            tracing::warn!("Discarding auth_sessions row with malformed session_id");
            return None;
        };

        Some(SessionRecord {
            id,
            data: self.data.0,
            expires_at: self.expires_at,
        })
    }
}
