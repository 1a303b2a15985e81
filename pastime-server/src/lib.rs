// Library exports for pastime-server
// The binary, the maintenance CLI and the integration tests all build on these

pub mod api;
pub mod config;
pub mod db;
pub mod feed;
pub mod middleware;
pub mod password;
pub mod session;
pub mod state;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use state::AppState;

/// Build the application router. Every route sits behind the authorization
/// gate, which decides per route pattern whether a login is needed.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(api::feed::landing))
        .route("/health", get(health_check))
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .route("/logout", post(api::auth::logout))
        // Feeds
        .route("/feed", get(api::feed::personalized_feed))
        .route("/groupFeed", get(api::feed::group_feed))
        .route("/friendsFeed", get(api::feed::friends_feed))
        // Posts
        .route(
            "/makePost",
            get(api::posts::new_post_form).post(api::posts::create_post),
        )
        .route("/posts/:id", get(api::posts::get_post))
        .route(
            "/posts/:id/edit",
            get(api::posts::edit_post_form).post(api::posts::update_post),
        )
        .route("/posts/:id/delete", post(api::posts::delete_post))
        .route("/posts/:id/save", post(api::posts::save_post))
        .route("/posts/:id/unsave", post(api::posts::unsave_post))
        .route("/saved", get(api::posts::saved_posts))
        .route("/userPosts/:id", get(api::posts::user_posts))
        // Profiles and hobbies
        .route("/viewProfile", get(api::profile::view_own_profile))
        .route("/profile/:id", get(api::profile::get_profile))
        .route("/editHobbies", get(api::profile::list_hobbies))
        .route("/editHobbies/add", post(api::profile::add_hobby))
        .route("/editHobbies/delete/:hobbyId", post(api::profile::remove_hobby))
        // Follows
        .route("/follow/:id", post(api::friends::follow_user))
        .route("/unfollow/:id", post(api::friends::unfollow_user))
        .route("/friends", get(api::friends::following_list))
        // Groups
        .route("/groups", get(api::groups::list_groups))
        .route("/groups/create", post(api::groups::create_group))
        .route("/groups/:id", get(api::groups::get_group))
        .route("/groups/:id/join", post(api::groups::join_group))
        .route("/groups/:id/leave", post(api::groups::leave_group))
        .route(
            "/groups/:id/removePost/:postId",
            post(api::groups::remove_group_post),
        )
        // Search
        .route("/search/results", get(api::search::search))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::authorization_gate,
        ))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
