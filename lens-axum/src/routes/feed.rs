use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::routes::map_query_rejection;
use crate::{LensAxumError, LensAxumState};

pub const HAS_MORE_HEADER: &str = "x-hasmore";

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<i64>,
}

async fn feed(
    State(state): State<LensAxumState>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Response, LensAxumError> {
    let Query(query) = query.map_err(map_query_rejection)?;
    let page_number = usize::try_from(query.page.unwrap_or(1).max(1)).unwrap_or(1);

    let page = state.feed.build_page(page_number).await?;
    let has_more = if page.has_more { "1" } else { "0" };
    Ok(([(HAS_MORE_HEADER, has_more)], Json(page)).into_response())
}

pub fn router() -> Router<LensAxumState> {
    Router::new().route("/feed", get(feed))
}
