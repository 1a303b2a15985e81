use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use pastime_types::UserSummary;

use crate::db::{format_timestamp, parse_uuid, DbPool};

/// Directed follow edges: `user_id` follows `friend_id`
pub struct FriendRepository {
    pool: DbPool,
}

impl FriendRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if user A is following user B
    pub fn is_following(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM friends WHERE user_id = ? AND friend_id = ?",
            (follower_id.to_string(), followee_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Follow a user. Returns whether a new edge was inserted.
    pub fn follow(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)
                 ON CONFLICT(user_id, friend_id) DO NOTHING",
                (
                    follower_id.to_string(),
                    followee_id.to_string(),
                    format_timestamp(&Utc::now()),
                ),
            )
            .context("Failed to follow user")?;
        Ok(rows > 0)
    }

    /// Unfollow a user. Returns whether an edge was removed.
    pub fn unfollow(&self, follower_id: &Uuid, followee_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM friends WHERE user_id = ? AND friend_id = ?",
                (follower_id.to_string(), followee_id.to_string()),
            )
            .context("Failed to unfollow user")?;
        Ok(rows > 0)
    }

    /// IDs of users that this user follows
    pub fn get_following_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT friend_id FROM friends WHERE user_id = ? ORDER BY created_at DESC",
        )?;

        let following = stmt
            .query_map([user_id.to_string()], |row| {
                parse_uuid(0, &row.get::<_, String>(0)?)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(following)
    }

    /// Users that this user follows, ordered by username
    pub fn get_following(&self, user_id: &Uuid) -> Result<Vec<UserSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.city, u.state
             FROM friends f
             JOIN users u ON u.id = f.friend_id
             WHERE f.user_id = ?
             ORDER BY u.username",
        )?;

        let users = stmt
            .query_map([user_id.to_string()], |row| {
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
}
