use std::borrow::Cow;

use axum::Json;
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use folio_api_types::ErrorBody;

use crate::application::error::ErrorReport;

/// JSON error for the `/api` surface: `{"error": "<message>"}`.
///
/// `detail` never reaches the client; it is attached to the response as an
/// [`ErrorReport`] for the logging middleware.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: Cow<'static, str>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        message: impl Into<Cow<'static, str>>,
        detail: Option<String>,
    ) -> Self {
        Self {
            status,
            message: message.into(),
            detail,
        }
    }

    pub fn bad_request(message: impl Into<Cow<'static, str>>, detail: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", None)
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, None)
    }

    pub fn conflict(message: &'static str, detail: Option<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message, detail)
    }

    pub fn internal(message: &'static str, detail: String) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message, Some(detail))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let mut response = Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "Too many requests",
            Some(format!("rate_limited: retry_after={retry_after}")),
        )
        .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert(RETRY_AFTER, value);
        }
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self
            .detail
            .clone()
            .unwrap_or_else(|| self.message.to_string());
        let body = ErrorBody {
            error: self.message.into_owned(),
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api", self.status, detail).attach(&mut response);
        response
    }
}
