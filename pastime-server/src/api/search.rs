use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::repositories::{GroupRepository, PostRepository, UserRepository};
use crate::db::DbPool;
use crate::state::AppState;
use pastime_types::SearchResults;

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
}

fn run_search(pool: DbPool, term: &str) -> anyhow::Result<SearchResults> {
    Ok(SearchResults {
        search_query: term.to_string(),
        posts: PostRepository::new(pool.clone()).search(term)?,
        users: UserRepository::new(pool.clone()).search(term)?,
        groups: GroupRepository::new(pool).search(term)?,
        error_message: None,
    })
}

/// GET /search/results?query= - Posts, users and groups matching a term.
///
/// Never fails: a blank term or a store error yields empty results with a
/// message.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResults> {
    let term = params.query.trim();
    if term.is_empty() {
        return Json(SearchResults {
            error_message: Some("Please enter a search term.".to_string()),
            ..SearchResults::default()
        });
    }

    match run_search(state.db.pool.clone(), term) {
        Ok(results) => Json(results),
        Err(e) => {
            tracing::error!("Search for {:?} failed: {:#}", term, e);
            Json(SearchResults {
                search_query: term.to_string(),
                error_message: Some("Error performing search.".to_string()),
                ..SearchResults::default()
            })
        }
    }
}
