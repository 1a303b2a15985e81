/// SQL schema for the PasTime database
/// Creates all tables with proper constraints, foreign keys, and indexes
///
/// Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix) so
/// that ordering by the text column is chronological.
pub const SCHEMA: &str = r#"
-- Users table
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT UNIQUE NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Groups table (quoted: GROUPS is an SQL keyword)
CREATE TABLE IF NOT EXISTS "groups" (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    owner_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (owner_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_groups_name ON "groups"(name);

-- Posts table; removing a post from its group clears group_id
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    caption TEXT NOT NULL,
    content TEXT NOT NULL,
    contact_method TEXT NOT NULL,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    group_id TEXT,
    created_at TEXT NOT NULL,
    FOREIGN KEY (author_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (group_id) REFERENCES "groups"(id) ON DELETE SET NULL
);

-- Indexes for the feed selections
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id);
CREATE INDEX IF NOT EXISTS idx_posts_city ON posts(city);
CREATE INDEX IF NOT EXISTS idx_posts_state ON posts(state);

-- Hobbies table; names are unique regardless of letter case
CREATE TABLE IF NOT EXISTS hobbies (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

-- User-hobby junction table
CREATE TABLE IF NOT EXISTS user_hobbies (
    user_id TEXT NOT NULL,
    hobby_id TEXT NOT NULL,
    PRIMARY KEY (user_id, hobby_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (hobby_id) REFERENCES hobbies(id) ON DELETE CASCADE
);

-- Follow edges (one-way: user_id follows friend_id)
CREATE TABLE IF NOT EXISTS friends (
    user_id TEXT NOT NULL,
    friend_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (user_id, friend_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (friend_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_friends_friend ON friends(friend_id);

-- Group memberships
CREATE TABLE IF NOT EXISTS group_details (
    group_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    joined_at TEXT NOT NULL,
    PRIMARY KEY (group_id, user_id),
    FOREIGN KEY (group_id) REFERENCES "groups"(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_group_details_user ON group_details(user_id);

-- Saved posts (bookmarks)
CREATE TABLE IF NOT EXISTS saved_posts (
    user_id TEXT NOT NULL,
    post_id TEXT NOT NULL,
    saved_at TEXT NOT NULL,
    PRIMARY KEY (user_id, post_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

-- Sessions table for authentication
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;

/// Password shared by every demo account
pub const DEMO_PASSWORD: &str = "pastime-demo";

/// Marker stored in `password_hash` until the demo password is hashed in
pub const DEMO_PASSWORD_PLACEHOLDER: &str = "!demo";

/// Demo data for development and testing
/// - 4 users (alice and dave in Austin, bob in Dallas, carol in Provo)
/// - hobbies: alice {chess, hiking}, bob {chess}, carol {climbing}, dave none
/// - 1 group (Austin Chess Club, owned by alice, bob is a member)
/// - 6 posts, one of them in the group
/// - follows: bob -> alice, carol -> bob
pub const DEMO_DATA: &str = r#"
-- ============================================================================
-- USERS
-- ============================================================================
INSERT OR IGNORE INTO users (id, username, first_name, last_name, email, password_hash, city, state, created_at) VALUES
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', 'alice', 'Alice', 'Nguyen', 'alice@example.com', '!demo', 'Austin', 'TX', '2024-01-05T10:00:00.000000Z'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', 'bob', 'Bob', 'Martinez', 'bob@example.com', '!demo', 'Dallas', 'TX', '2024-01-06T10:00:00.000000Z'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e03', 'carol', 'Carol', 'Jensen', 'carol@example.com', '!demo', 'Provo', 'UT', '2024-01-07T10:00:00.000000Z'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e04', 'dave', 'Dave', 'Okafor', 'dave@example.com', '!demo', 'Austin', 'TX', '2024-01-08T10:00:00.000000Z');

-- ============================================================================
-- HOBBIES
-- ============================================================================
INSERT OR IGNORE INTO hobbies (id, name) VALUES
('8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c01', 'chess'),
('8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c02', 'hiking'),
('8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c03', 'climbing');

INSERT OR IGNORE INTO user_hobbies (user_id, hobby_id) VALUES
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', '8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c01'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', '8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c02'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', '8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c01'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e03', '8a7b6c5d-1e2f-4a3b-8c4d-5e6f7a8b9c03');

-- ============================================================================
-- GROUPS
-- ============================================================================
INSERT OR IGNORE INTO "groups" (id, name, description, owner_id, created_at) VALUES
('3d2c1b0a-9f8e-4d7c-8b6a-594837261501', 'Austin Chess Club', 'Weekly casual games downtown', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', '2024-01-10T18:00:00.000000Z');

INSERT OR IGNORE INTO group_details (group_id, user_id, joined_at) VALUES
('3d2c1b0a-9f8e-4d7c-8b6a-594837261501', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', '2024-01-10T18:00:00.000000Z'),
('3d2c1b0a-9f8e-4d7c-8b6a-594837261501', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', '2024-01-11T18:00:00.000000Z');

-- ============================================================================
-- POSTS
-- ============================================================================
INSERT OR IGNORE INTO posts (id, author_id, caption, content, contact_method, city, state, group_id, created_at) VALUES
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c01', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', 'Saturday blitz', 'Blitz tournament at the library, all levels welcome', 'alice@example.com', 'Austin', 'TX', '3d2c1b0a-9f8e-4d7c-8b6a-594837261501', '2024-02-01T09:00:00.000000Z'),
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c02', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', 'Chess in Dallas', 'Looking for a weeknight chess partner', 'bob@example.com', 'Dallas', 'TX', NULL, '2024-02-02T09:00:00.000000Z'),
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c03', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', 'Pickup basketball', 'Running a pickup game Sunday morning', 'bob@example.com', 'Dallas', 'TX', NULL, '2024-02-03T09:00:00.000000Z'),
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c04', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e03', 'Bouldering buddies', 'Anyone climbing at the gym Thursday?', 'carol@example.com', 'Provo', 'UT', NULL, '2024-02-04T09:00:00.000000Z'),
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c05', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e04', 'Greenbelt hike', 'Easy hiking loop this weekend', 'dave@example.com', 'Austin', 'TX', NULL, '2024-02-05T09:00:00.000000Z'),
('b1a2c3d4-e5f6-4a7b-8c9d-0e1f2a3b4c06', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e03', 'Chess by mail', 'Correspondence chess, any state', 'carol@example.com', 'Provo', 'UT', NULL, '2024-02-06T09:00:00.000000Z');

-- ============================================================================
-- FOLLOWS
-- ============================================================================
INSERT OR IGNORE INTO friends (user_id, friend_id, created_at) VALUES
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e01', '2024-01-12T12:00:00.000000Z'),
('6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e03', '6f1c2a4e-0b7d-4c1e-9a51-1a2b3c4d5e02', '2024-01-13T12:00:00.000000Z');
"#;
