use anyhow::{Context, Result};
use chrono::Utc;
use uuid::Uuid;

use crate::db::{format_timestamp, DbPool};

/// Bookmark edges between users and posts. Reading saved posts goes through
/// `PostRepository::get_saved`.
pub struct SavedPostRepository {
    pool: DbPool,
}

impl SavedPostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Save a post. Returns whether a new bookmark was inserted.
    pub fn save(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT INTO saved_posts (user_id, post_id, saved_at) VALUES (?, ?, ?)
                 ON CONFLICT(user_id, post_id) DO NOTHING",
                (
                    user_id.to_string(),
                    post_id.to_string(),
                    format_timestamp(&Utc::now()),
                ),
            )
            .context("Failed to save post")?;
        Ok(rows > 0)
    }

    /// Remove a bookmark. Returns whether one was removed.
    pub fn unsave(&self, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM saved_posts WHERE user_id = ? AND post_id = ?",
                [user_id.to_string(), post_id.to_string()],
            )
            .context("Failed to unsave post")?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::PostRepository;
    use crate::db::test_support::*;

    #[test]
    fn test_save_twice_leaves_one_edge() {
        let db = test_db();
        let repo = SavedPostRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let post = insert_post(&db, alice, "p", "x", "Austin", "TX", None, 1);

        assert!(repo.save(&alice, &post).unwrap());
        assert!(!repo.save(&alice, &post).unwrap());

        let saved = PostRepository::new(db.pool.clone()).get_saved(&alice).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].id, post);
    }

    #[test]
    fn test_unsave_and_cascade() {
        let db = test_db();
        let repo = SavedPostRepository::new(db.pool.clone());
        let posts = PostRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let first = insert_post(&db, alice, "a", "x", "Austin", "TX", None, 1);
        let second = insert_post(&db, alice, "b", "x", "Austin", "TX", None, 2);
        repo.save(&alice, &first).unwrap();
        repo.save(&alice, &second).unwrap();

        assert!(repo.unsave(&alice, &first).unwrap());
        assert!(!repo.unsave(&alice, &first).unwrap());

        posts.delete(&second).unwrap();
        assert!(posts.get_saved(&alice).unwrap().is_empty());
    }

    #[test]
    fn test_saving_missing_post_fails() {
        let db = test_db();
        let repo = SavedPostRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        assert!(repo.save(&alice, &Uuid::new_v4()).is_err());
    }
}
