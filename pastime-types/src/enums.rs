use serde::{Deserialize, Serialize};

/// Which selection rule a feed request uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedVariant {
    Personalized,
    GroupOnly,
    FriendsOnly,
    LandingPreview,
}

impl FeedVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedVariant::Personalized => "personalized",
            FeedVariant::GroupOnly => "group_only",
            FeedVariant::FriendsOnly => "friends_only",
            FeedVariant::LandingPreview => "landing_preview",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "personalized" => Some(FeedVariant::Personalized),
            "group_only" => Some(FeedVariant::GroupOnly),
            "friends_only" => Some(FeedVariant::FriendsOnly),
            "landing_preview" => Some(FeedVariant::LandingPreview),
            _ => None,
        }
    }
}

/// Non-fatal note explaining why a feed came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    NeedsInterests,
    NoGroups,
    NotFollowingAnyone,
    ViewerNotFound,
    Unavailable,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::NeedsInterests => "Add hobbies to see posts related to your interests.",
            Advisory::NoGroups => "You are not a member of any groups yet.",
            Advisory::NotFollowingAnyone => "You are not following anyone yet.",
            Advisory::ViewerNotFound => "User not found.",
            Advisory::Unavailable => "Unable to load posts. Please try again.",
        }
    }
}
