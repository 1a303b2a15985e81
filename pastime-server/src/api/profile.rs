use axum::{
    extract::{Path, State},
    Json,
};

use super::{parse_id, ApiError, ApiResult};
use crate::db::repositories::{FriendRepository, HobbyRepository, UserRepository};
use crate::middleware::CurrentViewer;
use crate::state::AppState;
use pastime_types::{AddHobbyRequest, Hobby, ProfileResponse, User};

fn load_user(state: &AppState, user_id: &uuid::Uuid) -> Result<User, ApiError> {
    UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// GET /viewProfile - The viewer's own profile
pub async fn view_own_profile(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ApiResult<Json<ProfileResponse>> {
    let user = load_user(&state, &viewer.user_id)?;
    Ok(Json(ProfileResponse {
        user,
        is_following: false,
        is_own_profile: true,
    }))
}

/// GET /profile/:id - Another user's profile and whether the viewer follows them
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ProfileResponse>> {
    let user_id = parse_id(&user_id, "user")?;
    let user = load_user(&state, &user_id)?;

    let is_own_profile = user.id == viewer.user_id;
    let is_following = !is_own_profile
        && FriendRepository::new(state.db.pool.clone()).is_following(&viewer.user_id, &user.id)?;

    Ok(Json(ProfileResponse {
        user,
        is_following,
        is_own_profile,
    }))
}

/// GET /editHobbies - The viewer's hobbies
pub async fn list_hobbies(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
) -> ApiResult<Json<Vec<Hobby>>> {
    let hobbies = HobbyRepository::new(state.db.pool.clone()).get_for_user(&viewer.user_id)?;
    Ok(Json(hobbies))
}

/// POST /editHobbies/add - Link a hobby, creating it if nobody has it yet.
/// A blank name changes nothing.
pub async fn add_hobby(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Json(payload): Json<AddHobbyRequest>,
) -> ApiResult<Json<Vec<Hobby>>> {
    let repo = HobbyRepository::new(state.db.pool.clone());

    let name = payload.hobby_name.trim();
    if !name.is_empty() {
        repo.add_for_user(&viewer.user_id, name)
            .map_err(|e| ApiError::InternalError(format!("Failed to add hobby: {:#}", e)))?;
    }

    Ok(Json(repo.get_for_user(&viewer.user_id)?))
}

/// POST /editHobbies/delete/:hobbyId - Unlink a hobby
pub async fn remove_hobby(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Path(hobby_id): Path<String>,
) -> ApiResult<Json<Vec<Hobby>>> {
    let hobby_id = parse_id(&hobby_id, "hobby")?;
    let repo = HobbyRepository::new(state.db.pool.clone());

    repo.remove_for_user(&viewer.user_id, &hobby_id)?;
    Ok(Json(repo.get_for_user(&viewer.user_id)?))
}
