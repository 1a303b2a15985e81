use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, ApiError, ApiResult};
use crate::db::repositories::{FriendRepository, UserRepository};
use crate::middleware::CurrentViewer;
use crate::state::AppState;
use pastime_types::{EdgeUpdate, UserSummary};

/// POST /follow/:id - Follow a user
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(user_id_str): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let followee_id = parse_id(&user_id_str, "user")?;

    if viewer.user_id == followee_id {
        return Err(ApiError::BadRequest("Cannot follow yourself".to_string()));
    }

    UserRepository::new(state.db.pool.clone())
        .get_by_id(&followee_id)
        .map_err(|e| ApiError::InternalError(format!("Failed to find user: {:#}", e)))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let changed = FriendRepository::new(state.db.pool.clone())
        .follow(&viewer.user_id, &followee_id)
        .map_err(|e| ApiError::InternalError(format!("Failed to follow user: {:#}", e)))?;

    Ok(Json(EdgeUpdate {
        active: true,
        changed,
    }))
}

/// POST /unfollow/:id - Stop following a user
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(user_id_str): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let followee_id = parse_id(&user_id_str, "user")?;

    let changed = FriendRepository::new(state.db.pool.clone())
        .unfollow(&viewer.user_id, &followee_id)
        .map_err(|e| ApiError::InternalError(format!("Failed to unfollow user: {:#}", e)))?;

    Ok(Json(EdgeUpdate {
        active: false,
        changed,
    }))
}

/// GET /friends - Users the viewer follows
pub async fn following_list(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ApiResult<Json<Vec<UserSummary>>> {
    let users = FriendRepository::new(state.db.pool.clone()).get_following(&viewer.user_id)?;
    Ok(Json(users))
}
