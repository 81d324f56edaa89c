use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::models::{PageQuery, Quote, QuotePage, QueryPairs, RandomQuery, parse_quote_id};
use crate::response::PrettyJson;
use crate::state::AppState;

// GET /api/quotes?page=&perPage=
pub async fn list_quotes(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<PrettyJson<QuotePage>, ApiError> {
    let Query(pairs) = query?;
    let request = PageQuery::from_pairs(&pairs)?.parse()?;
    let page = state.quotes.page(request.page, request.per_page)?;
    Ok(PrettyJson(page))
}

// GET /api/quotes/{id}
pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<PrettyJson<Quote>, ApiError> {
    let id = parse_quote_id(&raw_id)?;
    state
        .quotes
        .get_by_id(id)
        .cloned()
        .map(PrettyJson)
        .ok_or_else(|| ApiError::quote_not_found(id))
}

// GET /api/quotes/random?author=&lang=
pub async fn random_quote(
    State(state): State<Arc<AppState>>,
    query: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<PrettyJson<Quote>, ApiError> {
    let Query(pairs) = query?;
    let filters = RandomQuery::from_pairs(&pairs).filters();
    debug!(authors = ?filters.authors, langs = ?filters.langs, "Random quote requested");

    state
        .quotes
        .random(&filters)
        .cloned()
        .map(PrettyJson)
        .ok_or_else(ApiError::no_match)
}
