use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, MatchedPath, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::ApiError;
use crate::state::AppState;
use pastime_types::{SessionContext, Viewer};

/// Header carrying the session token
pub const SESSION_HEADER: &str = "X-Session-Token";

pub const LOGIN_REQUIRED: &str = "Please log in to access this page";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Authenticated,
}

/// Access class of every registered route pattern
pub const ROUTE_ACCESS: &[(&str, RouteAccess)] = &[
    ("/", RouteAccess::Public),
    ("/health", RouteAccess::Public),
    ("/register", RouteAccess::Public),
    ("/login", RouteAccess::Public),
    ("/logout", RouteAccess::Public),
    ("/feed", RouteAccess::Authenticated),
    ("/groupFeed", RouteAccess::Authenticated),
    ("/friendsFeed", RouteAccess::Authenticated),
    ("/makePost", RouteAccess::Authenticated),
    ("/posts/:id", RouteAccess::Authenticated),
    ("/posts/:id/edit", RouteAccess::Authenticated),
    ("/posts/:id/delete", RouteAccess::Authenticated),
    ("/posts/:id/save", RouteAccess::Authenticated),
    ("/posts/:id/unsave", RouteAccess::Authenticated),
    ("/saved", RouteAccess::Authenticated),
    ("/userPosts/:id", RouteAccess::Authenticated),
    ("/viewProfile", RouteAccess::Authenticated),
    ("/profile/:id", RouteAccess::Authenticated),
    ("/editHobbies", RouteAccess::Authenticated),
    ("/editHobbies/add", RouteAccess::Authenticated),
    ("/editHobbies/delete/:hobbyId", RouteAccess::Authenticated),
    ("/follow/:id", RouteAccess::Authenticated),
    ("/unfollow/:id", RouteAccess::Authenticated),
    ("/friends", RouteAccess::Authenticated),
    ("/groups", RouteAccess::Authenticated),
    ("/groups/create", RouteAccess::Authenticated),
    ("/groups/:id", RouteAccess::Authenticated),
    ("/groups/:id/join", RouteAccess::Authenticated),
    ("/groups/:id/leave", RouteAccess::Authenticated),
    ("/groups/:id/removePost/:postId", RouteAccess::Authenticated),
    ("/search/results", RouteAccess::Authenticated),
];

/// Look up a matched route pattern. Anything not listed needs a login.
pub fn classify(route: Option<&str>) -> RouteAccess {
    route
        .and_then(|pattern| {
            ROUTE_ACCESS
                .iter()
                .find(|(known, _)| *known == pattern)
                .map(|(_, access)| *access)
        })
        .unwrap_or(RouteAccess::Authenticated)
}

pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|token| !token.is_empty())
}

/// Resolve the session, attach it to the request, and turn away logged-out
/// requests to protected routes.
pub async fn authorization_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let context = match session_token(request.headers()) {
        Some(token) => match state.session_manager.validate_session(token) {
            Ok(viewer) => SessionContext::logged_in(viewer),
            Err(e) => {
                tracing::debug!("Ignoring session token: {:#}", e);
                SessionContext::anonymous()
            }
        },
        None => SessionContext::anonymous(),
    };

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_string());
    let access = classify(route.as_deref());

    if access == RouteAccess::Authenticated && !context.is_logged_in {
        tracing::debug!("Rejected logged-out request to {:?}", route);
        return ApiError::Unauthorized(LOGIN_REQUIRED.to_string()).into_response();
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// The logged-in viewer, as resolved by [`authorization_gate`]
#[derive(Debug, Clone)]
pub struct CurrentViewer(pub Viewer);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .and_then(|context| context.viewer().cloned())
            .map(CurrentViewer)
            .ok_or_else(|| ApiError::Unauthorized(LOGIN_REQUIRED.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_public_routes() {
        for route in ["/", "/health", "/login", "/logout", "/register"] {
            assert_eq!(classify(Some(route)), RouteAccess::Public, "{}", route);
        }
    }

    #[test]
    fn test_everything_else_requires_login() {
        let protected = ROUTE_ACCESS
            .iter()
            .filter(|(_, access)| *access == RouteAccess::Authenticated)
            .count();
        assert_eq!(protected, ROUTE_ACCESS.len() - 5);

        assert_eq!(classify(Some("/feed")), RouteAccess::Authenticated);
        assert_eq!(classify(Some("/admin")), RouteAccess::Authenticated);
        assert_eq!(classify(None), RouteAccess::Authenticated);
    }

    #[test]
    fn test_route_table_has_no_duplicates() {
        let mut patterns: Vec<_> = ROUTE_ACCESS.iter().map(|(p, _)| *p).collect();
        patterns.sort();
        patterns.dedup();
        assert_eq!(patterns.len(), ROUTE_ACCESS.len());
    }

    #[test]
    fn test_session_token_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static(""));
        assert_eq!(session_token(&headers), None);

        headers.insert(SESSION_HEADER, HeaderValue::from_static("abc"));
        assert_eq!(session_token(&headers), Some("abc"));
    }
}
