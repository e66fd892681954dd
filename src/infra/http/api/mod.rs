pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod state;

pub use state::{AdminKey, ApiState};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};

use crate::infra::http::RouterState;
use crate::infra::http::middleware::log_responses;

/// Room for multipart boundaries and headers around the file itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_api_router(state: RouterState) -> Router<RouterState> {
    let auth_state = state.clone();
    let rate_state = state.clone();
    let upload_body_limit = usize::try_from(state.api.uploads.max_file_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/api/blogs",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/blogs/tags", get(handlers::list_tags))
        .route(
            "/api/blogs/{slug}",
            get(handlers::get_post)
                .put(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/api/blogs/{slug}/related", get(handlers::related_posts))
        .route("/api/blogs/{slug}/metadata", get(handlers::post_metadata))
        .route("/api/structured-data", get(handlers::structured_data))
        .route(
            "/api/upload",
            post(handlers::upload_image).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::admin_rate_limit,
        ))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::admin_auth,
        ))
        .layer(axum_middleware::from_fn(log_responses))
}
