//! Row fixtures for unit tests. Rows are written with raw SQL so tests do
//! not pay for password hashing.

use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use super::{format_timestamp, Database};

pub fn test_db() -> Database {
    let db = Database::in_memory().expect("Failed to create test database");
    db.initialize().expect("Failed to initialize database");
    db
}

pub fn insert_user(db: &Database, username: &str, city: &str, state: &str) -> Uuid {
    let id = Uuid::new_v4();
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO users (id, username, first_name, last_name, email, password_hash, city, state, created_at)
         VALUES (?, ?, 'Test', 'User', ?, 'x', ?, ?, ?)",
        (
            id.to_string(),
            username,
            format!("{}@example.com", username),
            city,
            state,
            format_timestamp(&Utc::now()),
        ),
    )
    .expect("insert user");
    id
}

/// Insert a post whose creation time is `minute` minutes after a fixed epoch
#[allow(clippy::too_many_arguments)]
pub fn insert_post(
    db: &Database,
    author: Uuid,
    caption: &str,
    content: &str,
    city: &str,
    state: &str,
    group: Option<Uuid>,
    minute: i64,
) -> Uuid {
    let id = Uuid::new_v4();
    let created = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minute);
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO posts (id, author_id, caption, content, contact_method, city, state, group_id, created_at)
         VALUES (?, ?, ?, ?, 'dm me', ?, ?, ?, ?)",
        (
            id.to_string(),
            author.to_string(),
            caption,
            content,
            city,
            state,
            group.map(|g| g.to_string()),
            format_timestamp(&created),
        ),
    )
    .expect("insert post");
    id
}

pub fn insert_group(db: &Database, name: &str, owner: Uuid) -> Uuid {
    let id = Uuid::new_v4();
    let now = format_timestamp(&Utc::now());
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO \"groups\" (id, name, description, owner_id, created_at) VALUES (?, ?, 'test group', ?, ?)",
        (id.to_string(), name, owner.to_string(), &now),
    )
    .expect("insert group");
    conn.execute(
        "INSERT INTO group_details (group_id, user_id, joined_at) VALUES (?, ?, ?)",
        (id.to_string(), owner.to_string(), &now),
    )
    .expect("insert owner membership");
    id
}

pub fn add_member(db: &Database, group: Uuid, user: Uuid) {
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO group_details (group_id, user_id, joined_at) VALUES (?, ?, ?)",
        (group.to_string(), user.to_string(), format_timestamp(&Utc::now())),
    )
    .expect("insert membership");
}

pub fn add_follow(db: &Database, follower: Uuid, followee: Uuid) {
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO friends (user_id, friend_id, created_at) VALUES (?, ?, ?)",
        (follower.to_string(), followee.to_string(), format_timestamp(&Utc::now())),
    )
    .expect("insert follow");
}

pub fn add_hobby(db: &Database, user: Uuid, name: &str) {
    let conn = db.connection().expect("connection");
    conn.execute(
        "INSERT INTO hobbies (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING",
        (Uuid::new_v4().to_string(), name),
    )
    .expect("insert hobby");
    conn.execute(
        "INSERT OR IGNORE INTO user_hobbies (user_id, hobby_id) SELECT ?, id FROM hobbies WHERE name = ?",
        (user.to_string(), name),
    )
    .expect("link hobby");
}
