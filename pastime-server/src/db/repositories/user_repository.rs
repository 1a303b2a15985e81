use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use pastime_types::{RegisterRequest, User, UserSummary};

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DbPool};

/// Whether an error from [`UserRepository::create`] is a duplicate email or
/// username rather than a store failure
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<rusqlite::Error>(),
            Some(rusqlite::Error::SqliteFailure(code, _))
                if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    })
}

const USER_COLUMNS: &str =
    "id, username, first_name, last_name, email, city, state, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        username: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        city: row.get(5)?,
        state: row.get(6)?,
        created_at: parse_timestamp(7, &row.get::<_, String>(7)?)?,
    })
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user from a registration form and an already-hashed
    /// credential. The stored row is read back so the returned timestamp has
    /// the stored precision.
    ///
    /// A duplicate email or username fails with a UNIQUE constraint error,
    /// see [`is_unique_violation`].
    pub fn create(&self, form: &RegisterRequest, password_hash: &str) -> Result<User> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();

        conn.execute(
            "INSERT INTO users (id, username, first_name, last_name, email, password_hash, city, state, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                form.username.trim(),
                form.first_name.trim(),
                form.last_name.trim(),
                form.email.trim(),
                password_hash,
                form.city.trim(),
                form.state.trim(),
                format_timestamp(&Utc::now()),
            ),
        )
        .context("Failed to create user")?;

        self.get_by_id(&id)?
            .context("Created user could not be read back")
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id.to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user together with the stored credential hash (login only)
    pub fn get_with_credential(&self, email: &str) -> Result<Option<(User, String)>> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                &format!(
                    "SELECT {}, password_hash FROM users WHERE email = ?",
                    USER_COLUMNS
                ),
                [email],
                |row| Ok((map_user(row)?, row.get::<_, String>(8)?)),
            )
            .optional()?;
        Ok(found)
    }

    /// Check whether an email or username is already registered
    pub fn email_or_username_taken(&self, email: &str, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ? OR username = ?",
            [email.trim(), username.trim()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Case-insensitive username substring search
    pub fn search(&self, term: &str) -> Result<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, username, city, state
             FROM users
             WHERE instr(casefold(username), casefold(?)) > 0
             ORDER BY username",
        )?;

        let users = stmt
            .query_map([term], |row| {
                Ok(UserSummary {
                    id: parse_uuid(0, &row.get::<_, String>(0)?)?,
                    username: row.get(1)?,
                    city: row.get(2)?,
                    state: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Every user id with its stored credential, oldest account first
    pub fn list_credentials(&self) -> Result<Vec<(Uuid, String)>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, password_hash FROM users ORDER BY created_at")?;
        let rows = stmt
            .query_map([], |row| {
                Ok((parse_uuid(0, &row.get::<_, String>(0)?)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Replace a user's stored credential
    pub fn update_password_hash(&self, user_id: &Uuid, password_hash: &str) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE users SET password_hash = ? WHERE id = ?",
            [password_hash, &user_id.to_string()],
        )
        .context("Failed to update password hash")?;
        Ok(())
    }
}
