use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use pastime_types::Group;

use crate::db::{format_timestamp, parse_timestamp, parse_uuid, DbPool};

const GROUP_SELECT: &str =
    "SELECT g.id, g.name, g.description, g.owner_id, u.username, g.created_at
     FROM \"groups\" g
     JOIN users u ON g.owner_id = u.id";

fn map_group(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: parse_uuid(0, &row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        owner_id: parse_uuid(3, &row.get::<_, String>(3)?)?,
        owner_username: row.get(4)?,
        created_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
    })
}

pub struct GroupRepository {
    pool: DbPool,
}

impl GroupRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn query_groups<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<Group>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let groups = stmt
            .query_map(params, map_group)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(groups)
    }

    /// Create a group owned by `owner_id`; the owner also becomes a member
    pub fn create(&self, owner_id: &Uuid, name: &str, description: &str) -> Result<Group> {
        let id = Uuid::new_v4();
        let now = format_timestamp(&Utc::now());
        {
            let mut conn = self.pool.get()?;
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO \"groups\" (id, name, description, owner_id, created_at) VALUES (?, ?, ?, ?, ?)",
                (id.to_string(), name.trim(), description.trim(), owner_id.to_string(), &now),
            )
            .context("Failed to create group")?;
            tx.execute(
                "INSERT INTO group_details (group_id, user_id, joined_at) VALUES (?, ?, ?)",
                (id.to_string(), owner_id.to_string(), &now),
            )
            .context("Failed to add owner membership")?;
            tx.commit()?;
        }

        self.get_by_id(&id)?
            .context("Created group could not be read back")
    }

    /// Get group by ID
    pub fn get_by_id(&self, group_id: &Uuid) -> Result<Option<Group>> {
        let conn = self.pool.get()?;
        let group = conn
            .query_row(
                &format!("{} WHERE g.id = ?", GROUP_SELECT),
                [group_id.to_string()],
                map_group,
            )
            .optional()?;
        Ok(group)
    }

    pub fn exists(&self, group_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM \"groups\" WHERE id = ?",
            [group_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// All groups, ordered by name
    pub fn list(&self) -> Result<Vec<Group>> {
        self.query_groups(&format!("{} ORDER BY g.name COLLATE NOCASE", GROUP_SELECT), [])
    }

    /// Groups a user belongs to, ordered by name
    pub fn get_for_member(&self, user_id: &Uuid) -> Result<Vec<Group>> {
        self.query_groups(
            &format!(
                "{} JOIN group_details gd ON gd.group_id = g.id
                 WHERE gd.user_id = ?
                 ORDER BY g.name COLLATE NOCASE",
                GROUP_SELECT
            ),
            [user_id.to_string()],
        )
    }

    /// IDs of the groups a user belongs to
    pub fn get_member_group_ids(&self, user_id: &Uuid) -> Result<Vec<Uuid>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT group_id FROM group_details WHERE user_id = ? ORDER BY joined_at",
        )?;
        let ids = stmt
            .query_map([user_id.to_string()], |row| {
                parse_uuid(0, &row.get::<_, String>(0)?)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub fn is_member(&self, group_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM group_details WHERE group_id = ? AND user_id = ?",
            [group_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Join a group. Returns whether a new membership was inserted.
    pub fn join(&self, group_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT INTO group_details (group_id, user_id, joined_at) VALUES (?, ?, ?)
                 ON CONFLICT(group_id, user_id) DO NOTHING",
                (
                    group_id.to_string(),
                    user_id.to_string(),
                    format_timestamp(&Utc::now()),
                ),
            )
            .context("Failed to join group")?;
        Ok(rows > 0)
    }

    /// Leave a group. Returns whether a membership was removed.
    pub fn leave(&self, group_id: &Uuid, user_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM group_details WHERE group_id = ? AND user_id = ?",
                [group_id.to_string(), user_id.to_string()],
            )
            .context("Failed to leave group")?;
        Ok(rows > 0)
    }

    /// Case-insensitive substring search over name and description
    pub fn search(&self, term: &str) -> Result<Vec<Group>> {
        self.query_groups(
            &format!(
                "{} WHERE instr(casefold(g.name), casefold(?1)) > 0 OR instr(casefold(g.description), casefold(?1)) > 0
                 ORDER BY g.name COLLATE NOCASE",
                GROUP_SELECT
            ),
            [term],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_create_makes_owner_a_member() {
        let db = test_db();
        let repo = GroupRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");

        let group = repo.create(&alice, " Chess Club ", "Weekly games").unwrap();
        assert_eq!(group.name, "Chess Club");
        assert_eq!(group.owner_id, alice);
        assert_eq!(group.owner_username, "alice");
        assert!(repo.is_member(&group.id, &alice).unwrap());
        assert!(repo.exists(&group.id).unwrap());
        assert!(!repo.exists(&Uuid::new_v4()).unwrap());
    }

    #[test]
    fn test_join_twice_leaves_one_membership() {
        let db = test_db();
        let repo = GroupRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let bob = insert_user(&db, "bob", "Dallas", "TX");
        let group = repo.create(&alice, "Chess", "games").unwrap();

        assert!(repo.join(&group.id, &bob).unwrap());
        assert!(!repo.join(&group.id, &bob).unwrap());

        let conn = db.connection().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM group_details WHERE group_id = ? AND user_id = ?",
                [group.id.to_string(), bob.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(repo.get_member_group_ids(&bob).unwrap(), vec![group.id]);
    }

    #[test]
    fn test_leave() {
        let db = test_db();
        let repo = GroupRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let bob = insert_user(&db, "bob", "Dallas", "TX");
        let group = repo.create(&alice, "Chess", "games").unwrap();
        repo.join(&group.id, &bob).unwrap();

        assert!(repo.leave(&group.id, &bob).unwrap());
        assert!(!repo.leave(&group.id, &bob).unwrap());
        assert!(!repo.is_member(&group.id, &bob).unwrap());
    }

    #[test]
    fn test_list_and_member_groups_ordered_by_name() {
        let db = test_db();
        let repo = GroupRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        let bob = insert_user(&db, "bob", "Dallas", "TX");
        repo.create(&alice, "hiking", "trails").unwrap();
        let chess = repo.create(&bob, "Chess", "games").unwrap();

        let names: Vec<_> = repo.list().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Chess", "hiking"]);

        let bobs: Vec<_> = repo.get_for_member(&bob).unwrap().into_iter().map(|g| g.id).collect();
        assert_eq!(bobs, vec![chess.id]);
    }

    #[test]
    fn test_search_name_or_description() {
        let db = test_db();
        let repo = GroupRepository::new(db.pool.clone());
        let alice = insert_user(&db, "alice", "Austin", "TX");
        repo.create(&alice, "Chess Club", "games").unwrap();
        repo.create(&alice, "Board Games", "chess and more").unwrap();
        repo.create(&alice, "Hiking", "trails").unwrap();

        assert_eq!(repo.search("CHESS").unwrap().len(), 2);
        assert!(repo.search("swimming").unwrap().is_empty());
    }
}
