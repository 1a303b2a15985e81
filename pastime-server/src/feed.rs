//! Feed composition.
//!
//! Each feed variant is a short pipeline of lookups: resolve the viewer, load
//! the viewer's interests / memberships / follows, then select posts. Every
//! step runs its SQLite work on the blocking pool and a failed step stops the
//! pipeline. Public operations never fail: errors are logged and turned into
//! an empty page carrying an advisory.

use anyhow::anyhow;
use thiserror::Error;
use uuid::Uuid;

use pastime_types::{Advisory, FeedPage, FeedVariant, Post};

use crate::db::repositories::{
    FriendRepository, GroupRepository, HobbyRepository, PostRepository, UserRepository,
};
use crate::db::{Database, DbPool};

/// Number of posts on the public landing page
pub const LANDING_PREVIEW_LIMIT: i64 = 3;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("viewer {0} not found")]
    ViewerNotFound(Uuid),
    #[error("data access failed: {0:#}")]
    DataAccess(#[from] anyhow::Error),
}

/// The parts of the viewer's record that feed rules depend on
#[derive(Debug, Clone)]
struct ViewerRecord {
    id: Uuid,
    city: String,
    state: String,
}

#[derive(Debug, Clone)]
struct InterestSet(Vec<String>);

#[derive(Debug, Clone)]
struct MembershipSet(Vec<Uuid>);

#[derive(Debug, Clone)]
struct FollowSet(Vec<Uuid>);

/// Whether a post belongs in the personalized feed of a viewer living in
/// `city`/`state` with the given interests.
///
/// Matches the SQL selection used by the composer: exact city match, or exact
/// state match plus a case-insensitive (Unicode lowercase) literal substring
/// match of any interest in the caption or content.
pub fn personalized_rule_admits(post: &Post, city: &str, state: &str, interests: &[String]) -> bool {
    if post.city == city {
        return true;
    }
    post.state == state
        && interests
            .iter()
            .any(|interest| contains_folded(&post.caption, interest) || contains_folded(&post.content, interest))
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Clone)]
pub struct FeedComposer {
    db: Database,
}

impl FeedComposer {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run a repository call on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> Result<T, FeedError>
    where
        F: FnOnce(DbPool) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.db.pool.clone();
        tokio::task::spawn_blocking(move || f(pool))
            .await
            .map_err(|e| FeedError::DataAccess(anyhow!("feed query task failed: {e}")))?
            .map_err(FeedError::from)
    }

    async fn resolve_viewer(&self, user_id: Uuid) -> Result<ViewerRecord, FeedError> {
        let user = self
            .blocking(move |pool| UserRepository::new(pool).get_by_id(&user_id))
            .await?
            .ok_or(FeedError::ViewerNotFound(user_id))?;

        Ok(ViewerRecord {
            id: user.id,
            city: user.city,
            state: user.state,
        })
    }

    async fn interests(&self, viewer: &ViewerRecord) -> Result<InterestSet, FeedError> {
        let id = viewer.id;
        let names = self
            .blocking(move |pool| HobbyRepository::new(pool).get_names_for_user(&id))
            .await?;
        Ok(InterestSet(names))
    }

    async fn memberships(&self, viewer: &ViewerRecord) -> Result<MembershipSet, FeedError> {
        let id = viewer.id;
        let groups = self
            .blocking(move |pool| GroupRepository::new(pool).get_member_group_ids(&id))
            .await?;
        Ok(MembershipSet(groups))
    }

    async fn follows(&self, viewer: &ViewerRecord) -> Result<FollowSet, FeedError> {
        let id = viewer.id;
        let followees = self
            .blocking(move |pool| FriendRepository::new(pool).get_following_ids(&id))
            .await?;
        Ok(FollowSet(followees))
    }

    async fn try_personalized(&self, user_id: Uuid) -> Result<FeedPage, FeedError> {
        let viewer = self.resolve_viewer(user_id).await?;
        let InterestSet(interests) = self.interests(&viewer).await?;
        if interests.is_empty() {
            return Ok(FeedPage::with_advisory(
                FeedVariant::Personalized,
                Advisory::NeedsInterests,
            ));
        }

        let query_interests = interests.clone();
        let posts = self
            .blocking(move |pool| {
                PostRepository::new(pool).get_personalized(&viewer.city, &viewer.state, &query_interests)
            })
            .await?;

        Ok(FeedPage::new(FeedVariant::Personalized, posts).hobbies(interests))
    }

    async fn try_group_only(&self, user_id: Uuid) -> Result<FeedPage, FeedError> {
        let viewer = self.resolve_viewer(user_id).await?;
        let MembershipSet(groups) = self.memberships(&viewer).await?;
        if groups.is_empty() {
            return Ok(FeedPage::with_advisory(FeedVariant::GroupOnly, Advisory::NoGroups));
        }

        let posts = self
            .blocking(move |pool| PostRepository::new(pool).get_by_groups(&groups))
            .await?;
        Ok(FeedPage::new(FeedVariant::GroupOnly, posts))
    }

    async fn try_friends_only(&self, user_id: Uuid) -> Result<FeedPage, FeedError> {
        let viewer = self.resolve_viewer(user_id).await?;
        let FollowSet(followees) = self.follows(&viewer).await?;
        if followees.is_empty() {
            return Ok(FeedPage::with_advisory(
                FeedVariant::FriendsOnly,
                Advisory::NotFollowingAnyone,
            ));
        }

        let posts = self
            .blocking(move |pool| PostRepository::new(pool).get_by_authors(&followees))
            .await?;
        Ok(FeedPage::new(FeedVariant::FriendsOnly, posts))
    }

    fn degrade(variant: FeedVariant, user_id: Uuid, err: FeedError) -> FeedPage {
        match err {
            FeedError::ViewerNotFound(_) => {
                tracing::warn!("{} feed requested for missing user {}", variant.as_str(), user_id);
                FeedPage::with_advisory(variant, Advisory::ViewerNotFound)
            }
            FeedError::DataAccess(e) => {
                tracing::error!("Failed to build {} feed for {}: {:#}", variant.as_str(), user_id, e);
                FeedPage::with_advisory(variant, Advisory::Unavailable)
            }
        }
    }

    /// Posts from the viewer's city, or from the viewer's state that mention
    /// one of the viewer's hobbies
    pub async fn personalized(&self, user_id: Uuid) -> FeedPage {
        self.try_personalized(user_id)
            .await
            .unwrap_or_else(|e| Self::degrade(FeedVariant::Personalized, user_id, e))
    }

    /// Posts in the groups the viewer belongs to
    pub async fn group_only(&self, user_id: Uuid) -> FeedPage {
        self.try_group_only(user_id)
            .await
            .unwrap_or_else(|e| Self::degrade(FeedVariant::GroupOnly, user_id, e))
    }

    /// Posts written by users the viewer follows
    pub async fn friends_only(&self, user_id: Uuid) -> FeedPage {
        self.try_friends_only(user_id)
            .await
            .unwrap_or_else(|e| Self::degrade(FeedVariant::FriendsOnly, user_id, e))
    }

    /// Newest posts system-wide. Degrades to an empty list without an advisory.
    pub async fn landing_preview(&self) -> FeedPage {
        let posts = self
            .blocking(|pool| PostRepository::new(pool).get_recent(LANDING_PREVIEW_LIMIT))
            .await
            .unwrap_or_else(|e| {
                tracing::error!("Failed to load landing preview: {}", e);
                Vec::new()
            });
        FeedPage::new(FeedVariant::LandingPreview, posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use proptest::prelude::*;

    fn ids(page: &FeedPage) -> Vec<Uuid> {
        page.posts.iter().map(|p| p.id).collect()
    }

    fn assert_newest_first(posts: &[Post]) {
        for pair in posts.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at, "feed out of order");
        }
    }

    #[tokio::test]
    async fn test_personalized_scenario() {
        let db = test_db();
        let viewer = insert_user(&db, "viewer", "Austin", "TX");
        let author = insert_user(&db, "author", "Somewhere", "NM");
        add_hobby(&db, viewer, "chess");

        let p1 = insert_post(&db, author, "Hi", "hello", "Austin", "TX", None, 1);
        let p2 = insert_post(&db, author, "Club", "I love chess club", "Dallas", "TX", None, 2);
        let p3 = insert_post(&db, author, "Nope", "no match", "Dallas", "OK", None, 3);

        let page = FeedComposer::new(db).personalized(viewer).await;
        assert_eq!(page.variant, FeedVariant::Personalized);
        assert_eq!(page.advisory, None);
        assert_eq!(page.hobbies, vec!["chess".to_string()]);
        assert_eq!(ids(&page), vec![p2, p1]);
        assert!(!ids(&page).contains(&p3));
    }

    #[tokio::test]
    async fn test_personalized_folds_non_ascii_case() {
        let db = test_db();
        let viewer = insert_user(&db, "viewer", "Austin", "TX");
        let author = insert_user(&db, "author", "Somewhere", "NM");
        add_hobby(&db, viewer, "échecs");

        let tonight = insert_post(&db, author, "Club", "ÉCHECS ce soir", "Dallas", "TX", None, 1);
        insert_post(&db, author, "Club", "ÉCHECS ce soir", "Dallas", "OK", None, 2);

        let page = FeedComposer::new(db).personalized(viewer).await;
        assert_eq!(ids(&page), vec![tonight]);
        assert!(personalized_rule_admits(&page.posts[0], "Austin", "TX", &page.hobbies));
    }

    #[tokio::test]
    async fn test_personalized_without_interests() {
        let db = test_db();
        let viewer = insert_user(&db, "viewer", "Austin", "TX");
        insert_post(&db, viewer, "Hi", "hello", "Austin", "TX", None, 1);

        let page = FeedComposer::new(db).personalized(viewer).await;
        assert!(page.is_empty());
        assert_eq!(page.advisory, Some(Advisory::NeedsInterests));
        assert_eq!(page.message.as_deref(), Some(Advisory::NeedsInterests.message()));
    }

    #[tokio::test]
    async fn test_missing_viewer_degrades() {
        let db = test_db();
        let composer = FeedComposer::new(db);
        let ghost = Uuid::new_v4();

        for page in [
            composer.personalized(ghost).await,
            composer.group_only(ghost).await,
            composer.friends_only(ghost).await,
        ] {
            assert!(page.is_empty());
            assert_eq!(page.advisory, Some(Advisory::ViewerNotFound));
        }
    }

    #[tokio::test]
    async fn test_data_access_failure_degrades() {
        // Schema never created, so every query fails
        let db = Database::in_memory().unwrap();
        let composer = FeedComposer::new(db);

        let page = composer.personalized(Uuid::new_v4()).await;
        assert!(page.is_empty());
        assert_eq!(page.advisory, Some(Advisory::Unavailable));

        let landing = composer.landing_preview().await;
        assert!(landing.is_empty());
        assert_eq!(landing.advisory, None);
    }

    #[tokio::test]
    async fn test_group_only_feed() {
        let db = test_db();
        let viewer = insert_user(&db, "viewer", "Austin", "TX");
        let owner = insert_user(&db, "owner", "Austin", "TX");
        let composer = FeedComposer::new(db.clone());

        let page = composer.group_only(viewer).await;
        assert_eq!(page.advisory, Some(Advisory::NoGroups));

        let joined = insert_group(&db, "Chess", owner);
        let other = insert_group(&db, "Hiking", owner);
        add_member(&db, joined, viewer);
        let in_joined = insert_post(&db, owner, "a", "x", "Austin", "TX", Some(joined), 1);
        let later = insert_post(&db, owner, "b", "x", "Austin", "TX", Some(joined), 2);
        insert_post(&db, owner, "c", "x", "Austin", "TX", Some(other), 3);
        insert_post(&db, owner, "d", "x", "Austin", "TX", None, 4);

        let page = composer.group_only(viewer).await;
        assert_eq!(page.advisory, None);
        assert_eq!(ids(&page), vec![later, in_joined]);
    }

    #[tokio::test]
    async fn test_friends_only_feed() {
        let db = test_db();
        let viewer = insert_user(&db, "viewer", "Austin", "TX");
        let friend = insert_user(&db, "friend", "Provo", "UT");
        let stranger = insert_user(&db, "stranger", "Austin", "TX");
        let composer = FeedComposer::new(db.clone());

        let page = composer.friends_only(viewer).await;
        assert_eq!(page.advisory, Some(Advisory::NotFollowingAnyone));

        add_follow(&db, viewer, friend);
        let by_friend = insert_post(&db, friend, "a", "x", "Provo", "UT", None, 1);
        insert_post(&db, stranger, "b", "x", "Austin", "TX", None, 2);

        let page = composer.friends_only(viewer).await;
        assert_eq!(ids(&page), vec![by_friend]);
    }

    #[tokio::test]
    async fn test_landing_preview_limit() {
        let db = test_db();
        let author = insert_user(&db, "author", "Austin", "TX");
        let composer = FeedComposer::new(db.clone());

        assert!(composer.landing_preview().await.is_empty());

        let mut created = Vec::new();
        for minute in 0..5 {
            created.push(insert_post(&db, author, "p", "x", "Austin", "TX", None, minute));
        }

        let page = composer.landing_preview().await;
        assert_eq!(page.variant, FeedVariant::LandingPreview);
        assert_eq!(ids(&page), vec![created[4], created[3], created[2]]);
    }

    #[test]
    fn test_rule_helper() {
        let db = test_db();
        let author = insert_user(&db, "author", "Somewhere", "NM");
        insert_post(&db, author, "Club", "I love CHESS club", "Dallas", "TX", None, 1);
        let post = PostRepository::new(db.pool.clone()).get_by_author(&author).unwrap().remove(0);

        let chess = vec!["chess".to_string()];
        assert!(personalized_rule_admits(&post, "Austin", "TX", &chess));
        assert!(!personalized_rule_admits(&post, "Austin", "OK", &chess));
        assert!(personalized_rule_admits(&post, "Dallas", "OK", &[]));
        assert!(!personalized_rule_admits(&post, "Austin", "TX", &[]));
    }

    const CITIES: [&str; 3] = ["Austin", "Dallas", "Provo"];
    const STATES: [&str; 2] = ["TX", "UT"];
    const WORDS: [&str; 6] = ["chess", "Chess night", "hiking trip", "CLIMB", "ÉCHECS ce soir", "nothing"];

    fn post_shape() -> impl Strategy<Value = (usize, usize, usize, usize, i64)> {
        (0..CITIES.len(), 0..STATES.len(), 0..WORDS.len(), 0..WORDS.len(), 0i64..20)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_personalized_matches_rule_and_order(
            viewer_city in 0..CITIES.len(),
            viewer_state in 0..STATES.len(),
            interests in prop::collection::vec(prop::sample::select(vec!["chess", "hik", "climb", "échecs"]), 0..3),
            posts in prop::collection::vec(post_shape(), 0..12),
        ) {
            let db = test_db();
            let viewer = insert_user(&db, "viewer", CITIES[viewer_city], STATES[viewer_state]);
            let author = insert_user(&db, "author", "Nowhere", "ZZ");
            for interest in &interests {
                add_hobby(&db, viewer, interest);
            }
            for (city, state, caption, content, minute) in &posts {
                insert_post(&db, author, WORDS[*caption], WORDS[*content], CITIES[*city], STATES[*state], None, *minute);
            }

            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let page = rt.block_on(FeedComposer::new(db.clone()).personalized(viewer));

            if interests.is_empty() {
                prop_assert!(page.is_empty());
                prop_assert_eq!(page.advisory, Some(Advisory::NeedsInterests));
            } else {
                let all = PostRepository::new(db.pool.clone()).get_by_author(&author).unwrap();
                let expected: Vec<Uuid> = all
                    .iter()
                    .filter(|p| personalized_rule_admits(p, CITIES[viewer_city], STATES[viewer_state], &page.hobbies))
                    .map(|p| p.id)
                    .collect();
                prop_assert_eq!(ids(&page), expected);
                assert_newest_first(&page.posts);
            }
        }
    }
}
