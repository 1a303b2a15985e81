use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use pastime_types::{Post, PostForm};

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DbPool};

/// Post read model: author username and group name joined in
const POST_SELECT: &str =
    "SELECT p.id, p.author_id, u.username, p.caption, p.content, p.contact_method,
            p.city, p.state, p.group_id, g.name, p.created_at
     FROM posts p
     JOIN users u ON p.author_id = u.id
     LEFT JOIN \"groups\" g ON p.group_id = g.id";

/// Newest first; equal timestamps fall back to id so ordering is reproducible
const NEWEST_FIRST: &str = "ORDER BY p.created_at DESC, p.id DESC";

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    let group_id = match row.get::<_, Option<String>>(8)? {
        Some(raw) => Some(parse_uuid(8, &raw)?),
        None => None,
    };
    Ok(Post {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        author_id: parse_uuid(1, &row.get::<_, String>(1)?)?,
        author_username: row.get(2)?,
        caption: row.get(3)?,
        content: row.get(4)?,
        contact_method: row.get(5)?,
        city: row.get(6)?,
        state: row.get(7)?,
        group_id,
        group_name: row.get(9)?,
        created_at: parse_timestamp(10, &row.get::<_, String>(10)?)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn query_posts<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let posts = stmt
            .query_map(params, map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Create a new post and return its read model
    pub fn create(&self, author_id: &Uuid, form: &PostForm) -> Result<Post> {
        let id = Uuid::new_v4();
        {
            let conn = self.pool.get()?;
            conn.execute(
                "INSERT INTO posts (id, author_id, caption, content, contact_method, city, state, group_id, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    id.to_string(),
                    author_id.to_string(),
                    form.caption.trim(),
                    form.content.trim(),
                    form.contact_method.trim(),
                    form.city.trim(),
                    form.state.trim(),
                    form.group_id.map(|g| g.to_string()),
                    format_timestamp(&Utc::now()),
                ),
            )
            .context("Failed to create post")?;
        }

        self.get_by_id(&id)?
            .context("Created post could not be read back")
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("{} WHERE p.id = ?", POST_SELECT),
                [post_id.to_string()],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    /// Replace the editable fields of a post. Returns false if it does not exist.
    pub fn update(&self, post_id: &Uuid, form: &PostForm) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts
                 SET caption = ?, content = ?, contact_method = ?, city = ?, state = ?, group_id = ?
                 WHERE id = ?",
                (
                    form.caption.trim(),
                    form.content.trim(),
                    form.contact_method.trim(),
                    form.city.trim(),
                    form.state.trim(),
                    form.group_id.map(|g| g.to_string()),
                    post_id.to_string(),
                ),
            )
            .context("Failed to update post")?;
        Ok(rows > 0)
    }

    /// Delete a post (saved-post edges cascade)
    pub fn delete(&self, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(rows > 0)
    }

    /// Posts written by one user, newest first
    pub fn get_by_author(&self, author_id: &Uuid) -> Result<Vec<Post>> {
        self.query_posts(
            &format!("{} WHERE p.author_id = ? {}", POST_SELECT, NEWEST_FIRST),
            [author_id.to_string()],
        )
    }

    /// Most recent posts system-wide
    pub fn get_recent(&self, limit: i64) -> Result<Vec<Post>> {
        self.query_posts(&format!("{} {} LIMIT ?", POST_SELECT, NEWEST_FIRST), [limit])
    }

    /// Posts in the viewer's city, or in the viewer's state when the caption
    /// or content contains one of the interests (case-insensitive, literal).
    pub fn get_personalized(
        &self,
        city: &str,
        state: &str,
        interests: &[String],
    ) -> Result<Vec<Post>> {
        let mut params: Vec<String> = vec![city.to_string()];
        let mut filter = String::from("p.city = ?");

        if !interests.is_empty() {
            let matches = interests
                .iter()
                .map(|_| {
                    "instr(casefold(p.caption), casefold(?)) > 0 OR instr(casefold(p.content), casefold(?)) > 0"
                })
                .collect::<Vec<_>>()
                .join(" OR ");
            filter.push_str(&format!(" OR (p.state = ? AND ({}))", matches));

            params.push(state.to_string());
            for interest in interests {
                params.push(interest.clone());
                params.push(interest.clone());
            }
        }

        self.query_posts(
            &format!("{} WHERE {} {}", POST_SELECT, filter, NEWEST_FIRST),
            params_from_iter(params),
        )
    }

    /// Posts belonging to any of the given groups
    pub fn get_by_groups(&self, group_ids: &[Uuid]) -> Result<Vec<Post>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_posts(
            &format!(
                "{} WHERE p.group_id IN ({}) {}",
                POST_SELECT,
                placeholders(group_ids.len()),
                NEWEST_FIRST
            ),
            params_from_iter(group_ids.iter().map(|id| id.to_string())),
        )
    }

    /// Posts written by any of the given authors
    pub fn get_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.query_posts(
            &format!(
                "{} WHERE p.author_id IN ({}) {}",
                POST_SELECT,
                placeholders(author_ids.len()),
                NEWEST_FIRST
            ),
            params_from_iter(author_ids.iter().map(|id| id.to_string())),
        )
    }

    /// Posts bookmarked by a user
    pub fn get_saved(&self, user_id: &Uuid) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "{} JOIN saved_posts s ON s.post_id = p.id WHERE s.user_id = ? {}",
                POST_SELECT, NEWEST_FIRST
            ),
            [user_id.to_string()],
        )
    }

    /// Case-insensitive substring search over caption and content
    pub fn search(&self, term: &str) -> Result<Vec<Post>> {
        self.query_posts(
            &format!(
                "{} WHERE instr(casefold(p.caption), casefold(?1)) > 0 OR instr(casefold(p.content), casefold(?1)) > 0 {}",
                POST_SELECT, NEWEST_FIRST
            ),
            [term],
        )
    }

    /// Detach a post from a group. Only touches a post currently in that group.
    pub fn remove_from_group(&self, group_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET group_id = NULL WHERE id = ? AND group_id = ?",
                [post_id.to_string(), group_id.to_string()],
            )
            .context("Failed to remove post from group")?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    fn form(caption: &str, group_id: Option<Uuid>) -> PostForm {
        PostForm {
            caption: caption.to_string(),
            content: "Some content".to_string(),
            contact_method: "email".to_string(),
            city: "Austin".to_string(),
            state: "TX".to_string(),
            group_id,
        }
    }

    #[test]
    fn test_create_and_get_post() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        let group = insert_group(&db, "Chess Club", author);

        let post = repo.create(&author, &form("  Blitz night ", Some(group))).unwrap();
        assert_eq!(post.caption, "Blitz night");
        assert_eq!(post.author_username, "alice");
        assert_eq!(post.group_name.as_deref(), Some("Chess Club"));

        let fetched = repo.get_by_id(&post.id).unwrap().expect("post exists");
        assert_eq!(fetched, post);
    }

    #[test]
    fn test_create_with_unknown_group_fails() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");

        assert!(repo.create(&author, &form("Orphan", Some(Uuid::new_v4()))).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        let post = repo.create(&author, &form("Before", None)).unwrap();

        assert!(repo.update(&post.id, &form("After", None)).unwrap());
        assert_eq!(repo.get_by_id(&post.id).unwrap().unwrap().caption, "After");

        assert!(repo.delete(&post.id).unwrap());
        assert!(repo.get_by_id(&post.id).unwrap().is_none());
        assert!(!repo.delete(&post.id).unwrap());
        assert!(!repo.update(&post.id, &form("Gone", None)).unwrap());
    }

    #[test]
    fn test_recent_is_newest_first_and_limited() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        for minute in 0..5 {
            insert_post(&db, author, &format!("post {}", minute), "x", "Austin", "TX", None, minute);
        }

        let recent = repo.get_recent(3).unwrap();
        let captions: Vec<_> = recent.iter().map(|p| p.caption.as_str()).collect();
        assert_eq!(captions, vec!["post 4", "post 3", "post 2"]);
    }

    #[test]
    fn test_equal_timestamps_tie_break_on_id() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        let a = insert_post(&db, author, "a", "x", "Austin", "TX", None, 0);
        let b = insert_post(&db, author, "b", "x", "Austin", "TX", None, 0);

        let posts = repo.get_by_author(&author).unwrap();
        let mut expected = vec![a, b];
        expected.sort();
        expected.reverse();
        assert_eq!(posts.iter().map(|p| p.id).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_personalized_selection() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "poster", "Elsewhere", "ZZ");

        let p1 = insert_post(&db, author, "Hi", "hello", "Austin", "TX", None, 1);
        let p2 = insert_post(&db, author, "Club", "I love CHESS club", "Dallas", "TX", None, 2);
        let p3 = insert_post(&db, author, "Nope", "no match", "Dallas", "OK", None, 3);
        let p4 = insert_post(&db, author, "Other", "nothing here", "Dallas", "TX", None, 4);

        let posts = repo
            .get_personalized("Austin", "TX", &["chess".to_string()])
            .unwrap();
        let ids: Vec<_> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![p2, p1]);
        assert!(!ids.contains(&p3));
        assert!(!ids.contains(&p4));
    }

    #[test]
    fn test_personalized_interest_is_literal() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "poster", "Elsewhere", "ZZ");
        insert_post(&db, author, "Anything", "whatever", "Dallas", "TX", None, 1);

        let posts = repo.get_personalized("Austin", "TX", &["%".to_string()]).unwrap();
        assert!(posts.is_empty());
    }

    #[test]
    fn test_by_groups_and_authors() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let bob = insert_user(&db, "bob", "Dallas", "TX");
        let group = insert_group(&db, "Chess", alice);

        let in_group = insert_post(&db, bob, "g", "x", "Dallas", "TX", Some(group), 1);
        let by_alice = insert_post(&db, alice, "a", "x", "Austin", "TX", None, 2);

        assert_eq!(
            repo.get_by_groups(&[group]).unwrap().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![in_group]
        );
        assert_eq!(
            repo.get_by_authors(&[alice]).unwrap().iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![by_alice]
        );
        assert!(repo.get_by_groups(&[]).unwrap().is_empty());
        assert!(repo.get_by_authors(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_search_matches_caption_or_content() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        insert_post(&db, author, "Chess night", "x", "Austin", "TX", None, 1);
        insert_post(&db, author, "Games", "bring a CHESS board", "Austin", "TX", None, 2);
        insert_post(&db, author, "Hike", "trail", "Austin", "TX", None, 3);

        let found = repo.search("chess").unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].caption, "Games");
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let author = insert_user(&db, "alice", "Austin", "TX");
        insert_post(&db, author, "Straße", "ÜBUNG im Park", "Austin", "TX", None, 1);

        assert_eq!(repo.search("übung").unwrap().len(), 1);
        assert_eq!(repo.search("STRASSE").unwrap().len(), 0);
        assert_eq!(repo.search("straße").unwrap().len(), 1);
    }

    #[test]
    fn test_remove_from_group_clears_reference() {
        let db = test_db();
        let repo = PostRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let group = insert_group(&db, "Chess", alice);
        let other = insert_group(&db, "Hiking", alice);
        let post = insert_post(&db, alice, "g", "x", "Austin", "TX", Some(group), 1);

        assert!(!repo.remove_from_group(&other, &post).unwrap());
        assert!(repo.remove_from_group(&group, &post).unwrap());

        let detached = repo.get_by_id(&post).unwrap().expect("post survives");
        assert_eq!(detached.group_id, None);
        assert_eq!(detached.group_name, None);
    }
}
