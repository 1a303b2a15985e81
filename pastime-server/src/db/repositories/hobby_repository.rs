use anyhow::{Context, Result};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use pastime_types::Hobby;

use crate::db::{parse_uuid, DbPool};

pub struct HobbyRepository {
    pool: DbPool,
}

impl HobbyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Hobbies linked to a user, ordered by name
    pub fn get_for_user(&self, user_id: &Uuid) -> Result<Vec<Hobby>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT h.id, h.name
             FROM hobbies h
             JOIN user_hobbies uh ON uh.hobby_id = h.id
             WHERE uh.user_id = ?
             ORDER BY h.name COLLATE NOCASE",
        )?;

        let hobbies = stmt
            .query_map([user_id.to_string()], |row| {
                Ok(Hobby {
                    id: parse_uuid(0, &row.get::<_, String>(0)?)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(hobbies)
    }

    /// Hobby names only, for feed matching
    pub fn get_names_for_user(&self, user_id: &Uuid) -> Result<Vec<String>> {
        Ok(self
            .get_for_user(user_id)?
            .into_iter()
            .map(|hobby| hobby.name)
            .collect())
    }

    /// Find a hobby by name (case-insensitive) or create it, then link it to
    /// the user. Both steps run in one transaction.
    ///
    /// Returns whether a new link was made.
    pub fn add_for_user(&self, user_id: &Uuid, name: &str) -> Result<bool> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO hobbies (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
            [Uuid::new_v4().to_string(), name.to_string()],
        )
        .context("Failed to create hobby")?;

        let hobby_id: String = tx
            .query_row("SELECT id FROM hobbies WHERE name = ?", [name], |row| row.get(0))
            .optional()?
            .context("Hobby missing after insert")?;

        let linked = tx
            .execute(
                "INSERT INTO user_hobbies (user_id, hobby_id) VALUES (?, ?)
                 ON CONFLICT(user_id, hobby_id) DO NOTHING",
                [user_id.to_string(), hobby_id],
            )
            .context("Failed to link hobby")?;

        tx.commit()?;
        Ok(linked > 0)
    }

    /// Unlink a hobby from a user. Returns whether a link was removed.
    pub fn remove_for_user(&self, user_id: &Uuid, hobby_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM user_hobbies WHERE user_id = ? AND hobby_id = ?",
                [user_id.to_string(), hobby_id.to_string()],
            )
            .context("Failed to remove hobby")?;
        Ok(rows > 0)
    }
}
