use axum::{extract::State, Json};

use crate::middleware::CurrentViewer;
use crate::state::AppState;
use pastime_types::{FeedPage, LandingResponse};

/// GET / - Newest posts for the landing page, logged in or not
pub async fn landing(State(state): State<AppState>) -> Json<LandingResponse> {
    let page = state.feeds().landing_preview().await;
    Json(LandingResponse { posts: page.posts })
}

/// GET /feed - Posts near the viewer or about the viewer's hobbies
pub async fn personalized_feed(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Json<FeedPage> {
    Json(state.feeds().personalized(viewer.user_id).await)
}

/// GET /groupFeed - Posts from the viewer's groups
pub async fn group_feed(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Json<FeedPage> {
    Json(state.feeds().group_only(viewer.user_id).await)
}

/// GET /friendsFeed - Posts from users the viewer follows
pub async fn friends_feed(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> Json<FeedPage> {
    Json(state.feeds().friends_only(viewer.user_id).await)
}
