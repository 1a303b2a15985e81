use crate::db::{format_timestamp, Database};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use pastime_types::Viewer;
use uuid::Uuid;

/// Default lifetime of a login session
pub const DEFAULT_SESSION_TTL_DAYS: i64 = 30;

/// Database-backed session manager
///
/// Sessions are keyed by an opaque UUID v4 token carried in the
/// `X-Session-Token` header and resolve to the viewer's id and email.
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self::with_ttl_days(db, DEFAULT_SESSION_TTL_DAYS)
    }

    pub fn with_ttl_days(db: Database, ttl_days: i64) -> Self {
        Self {
            db,
            ttl: Duration::days(ttl_days),
        }
    }

    /// Create a new session for a user and return its token
    pub fn create_session(&self, user_id: Uuid, email: &str) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + self.ttl;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, email, created_at, expires_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                token,
                user_id.to_string(),
                email,
                format_timestamp(&created_at),
                format_timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the viewer it belongs to
    ///
    /// An expired session is deleted and reported as an error.
    pub fn validate_session(&self, token: &str) -> Result<Viewer> {
        let conn = self.db.connection()?;

        let (user_id_str, email, expires_at_str): (String, String, String) = conn
            .query_row(
                "SELECT user_id, email, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .context("Session not found")?;

        let expires_at = expires_at_str
            .parse::<DateTime<Utc>>()
            .context("Failed to parse expiry time")?;

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        let user_id = Uuid::parse_str(&user_id_str).context("Failed to parse user ID")?;

        Ok(Viewer { user_id, email })
    }

    /// Delete a session (logout). Unknown tokens are ignored.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove all sessions past their expiry time
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = format_timestamp(&Utc::now());

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}
