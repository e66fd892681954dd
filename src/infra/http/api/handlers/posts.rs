use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use folio_api_types::{
    BlogListResponse, BlogPost, BlogPostInput, BlogPostPatch, DeleteResponse, RelatedQuery,
    RelatedResponse, TagsResponse,
};
use serde::Deserialize;

use crate::application::listing::ListingQuery;

use super::super::error::ApiError;
use super::super::middleware::Caller;
use super::super::state::ApiState;
use super::{admin_post_to_api, listing_to_api};

/// `GET /api/blogs` parameters, kept as text so malformed numbers fall back
/// to defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    page: Option<String>,
    limit: Option<String>,
    tag: Option<String>,
    search: Option<String>,
    published: Option<String>,
}

impl ListParams {
    fn into_query(self, caller: Caller) -> ListingQuery {
        let published_only = !caller.admin || parse_flag(self.published.as_deref());
        ListingQuery {
            page: parse_number(self.page.as_deref()),
            limit: parse_number(self.limit.as_deref()),
            tag: self.tag,
            search: self.search,
            published_only,
        }
    }
}

/// `GET /api/blogs/tags` parameters; `published` is read like the listing flag.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TagsParams {
    published: Option<String>,
}

impl TagsParams {
    fn published_only(&self, caller: Caller) -> bool {
        !caller.admin || parse_flag(self.published.as_deref())
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

fn parse_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|value| matches!(value.trim(), "true" | "1"))
}

fn query_rejection(err: QueryRejection) -> ApiError {
    ApiError::bad_request("Invalid query parameters", Some(err.body_text()))
}

fn json_rejection(err: JsonRejection) -> ApiError {
    ApiError::bad_request("Invalid request body", Some(err.body_text()))
}

pub async fn list_posts(
    State(state): State<ApiState>,
    caller: Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<BlogListResponse>, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let page = state
        .listing
        .list(&params.into_query(caller))
        .await
        .map_err(listing_to_api)?;

    Ok(Json(BlogListResponse {
        total: page.total,
        page: page.page,
        limit: page.limit,
        total_pages: page.total_pages,
        posts: page.items.into_iter().map(BlogPost::from).collect(),
    }))
}

pub async fn list_tags(
    State(state): State<ApiState>,
    caller: Caller,
    params: Result<Query<TagsParams>, QueryRejection>,
) -> Result<Json<TagsResponse>, ApiError> {
    let Query(params) = params.map_err(query_rejection)?;
    let published_only = params.published_only(caller);
    let tags = state
        .listing
        .tags(published_only)
        .await
        .map_err(listing_to_api)?;
    Ok(Json(TagsResponse { tags }))
}

pub async fn get_post(
    State(state): State<ApiState>,
    caller: Caller,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    let post = state
        .listing
        .find_by_slug(&slug, caller.admin)
        .await
        .map_err(listing_to_api)?;
    Ok(Json(post.into()))
}

pub async fn related_posts(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    query: Result<Query<RelatedQuery>, QueryRejection>,
) -> Result<Json<RelatedResponse>, ApiError> {
    let Query(query) = query.map_err(query_rejection)?;
    let posts = state
        .listing
        .related(&slug, query.limit)
        .await
        .map_err(listing_to_api)?;
    Ok(Json(RelatedResponse {
        posts: posts.into_iter().map(BlogPost::from).collect(),
    }))
}

pub async fn create_post(
    State(state): State<ApiState>,
    payload: Result<Json<BlogPostInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(json_rejection)?;
    let record = state
        .posts
        .create_post(input)
        .await
        .map_err(admin_post_to_api)?;
    Ok((StatusCode::CREATED, Json(BlogPost::from(record))))
}

/// Accepts a full `BlogPostInput` or any subset of its fields.
pub async fn update_post(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
    payload: Result<Json<BlogPostPatch>, JsonRejection>,
) -> Result<Json<BlogPost>, ApiError> {
    let Json(patch) = payload.map_err(json_rejection)?;
    let record = state
        .posts
        .update_post(&slug, patch)
        .await
        .map_err(admin_post_to_api)?;
    Ok(Json(record.into()))
}

pub async fn delete_post(
    State(state): State<ApiState>,
    Path(slug): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .posts
        .delete_post(&slug)
        .await
        .map_err(admin_post_to_api)?;
    Ok(Json(DeleteResponse {
        message: "Blog post deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_numbers_are_dropped() {
        let params = ListParams {
            page: Some("two".to_string()),
            limit: Some(" 12 ".to_string()),
            ..ListParams::default()
        };
        let query = params.into_query(Caller { admin: false });
        assert_eq!(query.page, None);
        assert_eq!(query.limit, Some(12));
    }

    #[test]
    fn only_admins_may_see_drafts_in_listings() {
        let public = ListParams {
            published: Some("false".to_string()),
            ..ListParams::default()
        };
        assert!(public.into_query(Caller { admin: false }).published_only);

        let admin_all = ListParams::default().into_query(Caller { admin: true });
        assert!(!admin_all.published_only);

        let admin_published = ListParams {
            published: Some("true".to_string()),
            ..ListParams::default()
        };
        assert!(admin_published.into_query(Caller { admin: true }).published_only);
    }

    #[test]
    fn tag_flag_accepts_the_same_spellings_as_listings() {
        let numeric = TagsParams {
            published: Some("1".to_string()),
        };
        assert!(numeric.published_only(Caller { admin: true }));

        let off = TagsParams {
            published: Some("0".to_string()),
        };
        assert!(!off.published_only(Caller { admin: true }));
        assert!(off.published_only(Caller { admin: false }));
        assert!(!TagsParams::default().published_only(Caller { admin: true }));
    }
}
