use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AppState;
use crate::storage::{with_storage, PostRecord};

pub const DEFAULT_LIMIT: u32 = 10;
pub const DEFAULT_PAGE: u32 = 1;

/// Raw query string of `/api/posts`
///
/// Kept as strings so a malformed value produces our own error body instead
/// of the extractor's plain-text rejection.
#[derive(Debug, Default, Deserialize)]
pub struct PostsQuery {
    pub limit: Option<String>,
    pub page: Option<String>,
}

/// Response body of `/api/posts`
#[derive(Debug, Serialize, Deserialize)]
pub struct PostsPage {
    /// Total number of stored posts, not the length of `posts`
    pub post_count: u64,
    pub page: u32,
    pub limit: u32,
    pub posts: Vec<PostRecord>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

fn positive_param(name: &str, raw: Option<&str>, default: u32) -> Result<u32, Response> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("{} must be a positive integer, got {:?}", name, raw),
        )),
    }
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PostsQuery>,
) -> Response {
    let limit = match positive_param("limit", params.limit.as_deref(), DEFAULT_LIMIT) {
        Ok(limit) => limit,
        Err(response) => return response,
    };
    let page = match positive_param("page", params.page.as_deref(), DEFAULT_PAGE) {
        Ok(page) => page,
        Err(response) => return response,
    };

    let result = with_storage(&state.storage, move |storage| {
        let total = storage.count_posts()?;
        let posts = storage.query_page(limit, page)?;
        Ok((total, posts))
    })
    .await;

    match result {
        Ok((post_count, posts)) => Json(PostsPage {
            post_count,
            page,
            limit,
            posts,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, limit, page, "Failed to load posts");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}
