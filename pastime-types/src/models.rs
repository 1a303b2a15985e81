use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::enums::{Advisory, FeedVariant};

// Custom serde module for DateTime to ensure RFC3339 string format
mod datetime_format {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = date.to_rfc3339();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// A registered account. The credential hash never leaves the server and is
/// not part of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: String,
    pub state: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

/// Compact user row used by follow lists and search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_username: String,
    pub caption: String,
    pub content: String,
    pub contact_method: String,
    pub city: String,
    pub state: String,
    /// Group the post is published in; `None` once a group owner removes it
    #[serde(default)]
    pub group_id: Option<Uuid>,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub owner_id: Uuid,
    pub owner_username: String,
    #[serde(with = "datetime_format")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hobby {
    pub id: Uuid,
    pub name: String,
}

/// Result of one feed composition.
///
/// An empty `posts` list is always accompanied by an advisory when the
/// emptiness has an explanation the viewer can act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPage {
    pub variant: FeedVariant,
    pub posts: Vec<Post>,
    /// Viewer's interest names (personalized feed only)
    #[serde(default)]
    pub hobbies: Vec<String>,
    #[serde(default)]
    pub advisory: Option<Advisory>,
    /// Human-readable text for `advisory`
    #[serde(default)]
    pub message: Option<String>,
}

impl FeedPage {
    pub fn new(variant: FeedVariant, posts: Vec<Post>) -> Self {
        Self {
            variant,
            posts,
            hobbies: Vec::new(),
            advisory: None,
            message: None,
        }
    }

    /// Empty page explained by an advisory
    pub fn with_advisory(variant: FeedVariant, advisory: Advisory) -> Self {
        Self {
            variant,
            posts: Vec::new(),
            hobbies: Vec::new(),
            advisory: Some(advisory),
            message: Some(advisory.message().to_string()),
        }
    }

    pub fn hobbies(mut self, hobbies: Vec<String>) -> Self {
        self.hobbies = hobbies;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

// Request/Response types for API
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub session_token: String,
}

/// Body of both the create and the edit post forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub contact_method: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub group_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddHobbyRequest {
    #[serde(default)]
    pub hobby_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub group_description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LandingResponse {
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
    pub is_following: bool,
    pub is_own_profile: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserPostsResponse {
    pub user: User,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EditPostResponse {
    pub post: Post,
    pub groups: Vec<Group>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupPageResponse {
    pub group: Group,
    pub posts: Vec<Post>,
    pub is_member: bool,
}

/// Outcome of an idempotent edge write (follow, join, save, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeUpdate {
    /// Whether the edge exists after the call
    pub active: bool,
    /// Whether this call changed anything
    pub changed: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub search_query: String,
    pub posts: Vec<Post>,
    pub users: Vec<UserSummary>,
    pub groups: Vec<Group>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}
