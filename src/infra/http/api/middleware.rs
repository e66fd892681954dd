use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{FromRequestParts, MatchedPath, State};
use axum::http::request::Parts;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use folio_api_types::ADMIN_KEY_HEADER;
use metrics::counter;
use tracing::warn;

use super::error::ApiError;
use super::state::{AdminCheck, ApiState};

/// Marker inserted into request and response extensions once the admin key
/// has been verified.
#[derive(Debug, Clone, Copy)]
pub struct AdminPrincipal;

/// Whether the current request carries a valid admin key.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub admin: bool,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self {
            admin: parts.extensions.get::<AdminPrincipal>().is_some(),
        })
    }
}

fn is_mutation(method: &Method) -> bool {
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Mutations require a valid key; reads only use it to unlock drafts.
pub async fn admin_auth(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let check = state.admin_key.check(presented);
    let mutation = is_mutation(request.method());

    if check != AdminCheck::Granted {
        if mutation {
            counter!("folio_admin_auth_rejected_total").increment(1);
            warn!(
                target = "folio::api::auth",
                method = %request.method(),
                path = %request.uri().path(),
                outcome = ?check,
                "admin request rejected"
            );
            return ApiError::unauthorized().into_response();
        }
        return next.run(request).await;
    }

    request.extensions_mut().insert(AdminPrincipal);
    let mut response = next.run(request).await;
    response.extensions_mut().insert(AdminPrincipal);
    response
}

pub async fn admin_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !is_mutation(request.method()) || request.extensions().get::<AdminPrincipal>().is_none() {
        return next.run(request).await;
    }

    // One bucket per route template, not per slug.
    let template = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);
    let route = format!("{} {template}", request.method());
    let (allowed, _remaining) = state.rate_limiter.allow(&route);
    if !allowed {
        counter!("folio_admin_rate_limited_total").increment(1);
        warn!(
            target = "folio::api::ratelimit",
            route = %route,
            limit = state.rate_limiter.limit(),
            "admin rate limit exceeded"
        );
        return ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    next.run(request).await
}
