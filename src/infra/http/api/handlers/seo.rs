use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use folio_api_types::{PageMetadata, StructuredDataQuery};
use serde_json::Value;

use crate::application::seo;

use super::super::error::ApiError;
use super::super::middleware::Caller;
use super::super::state::ApiState;
use super::listing_to_api;

/// JSON-LD blocks for a page; `slug` adds the article and breadcrumb trail.
pub async fn structured_data(
    State(state): State<ApiState>,
    caller: Caller,
    query: Result<Query<StructuredDataQuery>, QueryRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Query(query) = query
        .map_err(|err| ApiError::bad_request("Invalid query parameters", Some(err.body_text())))?;

    let post = match query.slug.as_deref().map(str::trim) {
        Some(slug) if !slug.is_empty() => Some(
            state
                .listing
                .find_by_slug(slug, caller.admin)
                .await
                .map_err(listing_to_api)?,
        ),
        _ => None,
    };

    Ok(Json(seo::structured_data(
        query.kind,
        post.as_ref(),
        &state.site,
    )))
}

pub async fn post_metadata(
    State(state): State<ApiState>,
    caller: Caller,
    Path(slug): Path<String>,
) -> Result<Json<PageMetadata>, ApiError> {
    let post = state
        .listing
        .find_by_slug(&slug, caller.admin)
        .await
        .map_err(listing_to_api)?;
    Ok(Json(seo::page_metadata(&post, &state.site)))
}
