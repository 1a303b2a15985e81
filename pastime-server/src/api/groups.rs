use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::{parse_id, ApiError, ApiResult};
use crate::db::repositories::{GroupRepository, PostRepository};
use crate::middleware::CurrentViewer;
use crate::state::AppState;
use pastime_types::{CreateGroupRequest, EdgeUpdate, Group, GroupPageResponse};

fn load_group(repo: &GroupRepository, group_id: &Uuid) -> Result<Group, ApiError> {
    repo.get_by_id(group_id)?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

/// GET /groups - Every group
pub async fn list_groups(State(state): State<AppState>) -> ApiResult<Json<Vec<Group>>> {
    let groups = GroupRepository::new(state.db.pool.clone()).list()?;
    Ok(Json(groups))
}

/// GET /groups/:id - A group, its posts and whether the viewer is a member
pub async fn get_group(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(group_id): Path<String>,
) -> ApiResult<Json<GroupPageResponse>> {
    let group_id = parse_id(&group_id, "group")?;
    let repo = GroupRepository::new(state.db.pool.clone());

    let group = load_group(&repo, &group_id)?;
    let is_member = repo.is_member(&group_id, &viewer.user_id)?;
    let posts = PostRepository::new(state.db.pool.clone()).get_by_groups(&[group_id])?;

    Ok(Json(GroupPageResponse {
        group,
        posts,
        is_member,
    }))
}

/// POST /groups/create - Create a group owned by the viewer
pub async fn create_group(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(payload): Json<CreateGroupRequest>,
) -> ApiResult<Json<Group>> {
    if payload.group_name.trim().is_empty() || payload.group_description.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Group name and description are required.".to_string(),
        ));
    }

    let group = GroupRepository::new(state.db.pool.clone())
        .create(&viewer.user_id, &payload.group_name, &payload.group_description)
        .map_err(|e| ApiError::InternalError(format!("Failed to create group: {:#}", e)))?;

    tracing::info!("User {} created group {}", viewer.user_id, group.id);
    Ok(Json(group))
}

/// POST /groups/:id/join - Join a group
pub async fn join_group(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(group_id): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let group_id = parse_id(&group_id, "group")?;
    let repo = GroupRepository::new(state.db.pool.clone());

    load_group(&repo, &group_id)?;
    let changed = repo.join(&group_id, &viewer.user_id)?;

    Ok(Json(EdgeUpdate {
        active: true,
        changed,
    }))
}

/// POST /groups/:id/leave - Leave a group (not allowed for its owner)
pub async fn leave_group(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(group_id): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let group_id = parse_id(&group_id, "group")?;
    let repo = GroupRepository::new(state.db.pool.clone());

    let group = load_group(&repo, &group_id)?;
    if group.owner_id == viewer.user_id {
        return Err(ApiError::Forbidden(
            "Group owners cannot leave their own group.".to_string(),
        ));
    }

    let changed = repo.leave(&group_id, &viewer.user_id)?;
    Ok(Json(EdgeUpdate {
        active: false,
        changed,
    }))
}

/// POST /groups/:id/removePost/:postId - Detach a post from a group
/// (owner only). The post itself is kept.
pub async fn remove_group_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path((group_id, post_id)): Path<(String, String)>,
) -> ApiResult<Json<serde_json::Value>> {
    let group_id = parse_id(&group_id, "group")?;
    let post_id = parse_id(&post_id, "post")?;

    let group = load_group(&GroupRepository::new(state.db.pool.clone()), &group_id)?;
    if group.owner_id != viewer.user_id {
        return Err(ApiError::Forbidden(
            "Only the group owner can remove posts.".to_string(),
        ));
    }

    let removed = PostRepository::new(state.db.pool.clone()).remove_from_group(&group_id, &post_id)?;
    if !removed {
        return Err(ApiError::NotFound("Post not found in this group".to_string()));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Post removed from group",
        "post_id": post_id
    })))
}
