use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use super::{parse_id, ApiError, ApiResult};
use crate::db::repositories::{GroupRepository, PostRepository, SavedPostRepository, UserRepository};
use crate::middleware::CurrentViewer;
use crate::state::AppState;
use pastime_types::{EdgeUpdate, EditPostResponse, Group, Post, PostForm, UserPostsResponse};

/// Check required fields and that the chosen group exists
fn validate_post_form(state: &AppState, form: &PostForm) -> Result<(), ApiError> {
    let required = [
        &form.caption,
        &form.content,
        &form.contact_method,
        &form.city,
        &form.state,
    ];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "All fields except group are required.".to_string(),
        ));
    }

    if let Some(group_id) = form.group_id {
        let groups = GroupRepository::new(state.db.pool.clone());
        if !groups.exists(&group_id)? {
            return Err(ApiError::BadRequest("Selected group does not exist.".to_string()));
        }
    }

    Ok(())
}

fn load_post(state: &AppState, post_id: &Uuid) -> Result<Post, ApiError> {
    PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id)
        .map_err(|e| ApiError::InternalError(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
}

/// GET /makePost - Groups the viewer can post into
pub async fn new_post_form(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ApiResult<Json<Vec<Group>>> {
    let groups = GroupRepository::new(state.db.pool.clone()).get_for_member(&viewer.user_id)?;
    Ok(Json(groups))
}

/// POST /makePost - Create a post
pub async fn create_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(payload): Json<PostForm>,
) -> ApiResult<Json<Post>> {
    validate_post_form(&state, &payload)?;

    let post = PostRepository::new(state.db.pool.clone())
        .create(&viewer.user_id, &payload)
        .map_err(|e| ApiError::InternalError(format!("Failed to create post: {:#}", e)))?;

    tracing::debug!("User {} created post {}", viewer.user_id, post.id);
    Ok(Json(post))
}

/// GET /posts/:id - Get a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&post_id, "post")?;
    Ok(Json(load_post(&state, &post_id)?))
}

/// GET /posts/:id/edit - A post and the groups it may be moved to
pub async fn edit_post_form(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<String>,
) -> ApiResult<Json<EditPostResponse>> {
    let post_id = parse_id(&post_id, "post")?;
    let post = load_post(&state, &post_id)?;

    if post.author_id != viewer.user_id {
        return Err(ApiError::Forbidden("You can only edit your own posts.".to_string()));
    }

    let groups = GroupRepository::new(state.db.pool.clone()).get_for_member(&viewer.user_id)?;
    Ok(Json(EditPostResponse { post, groups }))
}

/// POST /posts/:id/edit - Update a post (author only)
pub async fn update_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<String>,
    Json(payload): Json<PostForm>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&post_id, "post")?;
    let post = load_post(&state, &post_id)?;

    if post.author_id != viewer.user_id {
        return Err(ApiError::Forbidden("You can only edit your own posts.".to_string()));
    }

    validate_post_form(&state, &payload)?;

    PostRepository::new(state.db.pool.clone()).update(&post_id, &payload)?;
    Ok(Json(load_post(&state, &post_id)?))
}

/// POST /posts/:id/delete - Delete a post (author only)
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let post_id = parse_id(&post_id, "post")?;
    let post = load_post(&state, &post_id)?;

    if post.author_id != viewer.user_id {
        return Err(ApiError::Forbidden("You can only delete your own posts.".to_string()));
    }

    PostRepository::new(state.db.pool.clone()).delete(&post_id)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Post deleted successfully",
        "post_id": post_id
    })))
}

/// POST /posts/:id/save - Bookmark a post
pub async fn save_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let post_id = parse_id(&post_id, "post")?;
    load_post(&state, &post_id)?;

    let changed = SavedPostRepository::new(state.db.pool.clone()).save(&viewer.user_id, &post_id)?;
    Ok(Json(EdgeUpdate {
        active: true,
        changed,
    }))
}

/// POST /posts/:id/unsave - Remove a bookmark
pub async fn unsave_post(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(post_id): Path<String>,
) -> ApiResult<Json<EdgeUpdate>> {
    let post_id = parse_id(&post_id, "post")?;

    let changed =
        SavedPostRepository::new(state.db.pool.clone()).unsave(&viewer.user_id, &post_id)?;
    Ok(Json(EdgeUpdate {
        active: false,
        changed,
    }))
}

/// GET /saved - The viewer's bookmarked posts
pub async fn saved_posts(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ApiResult<Json<Vec<Post>>> {
    let posts = PostRepository::new(state.db.pool.clone()).get_saved(&viewer.user_id)?;
    Ok(Json(posts))
}

/// GET /userPosts/:id - A user and everything they have posted
pub async fn user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserPostsResponse>> {
    let user_id = parse_id(&user_id, "user")?;

    let user = UserRepository::new(state.db.pool.clone())
        .get_by_id(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    let posts = PostRepository::new(state.db.pool.clone()).get_by_author(&user_id)?;

    Ok(Json(UserPostsResponse { user, posts }))
}
