mod posts;
mod seo;
mod uploads;

pub use posts::{create_post, delete_post, get_post, list_posts, list_tags, related_posts, update_post};
pub use seo::{post_metadata, structured_data};
pub use uploads::upload_image;

use axum::http::StatusCode;

use crate::application::admin::posts::AdminPostError;
use crate::application::listing::ListingError;
use crate::application::repos::RepoError;
use crate::application::uploads::UploadError;
use crate::domain::error::DomainError;

use super::error::ApiError;

const POST_NOT_FOUND: &str = "Blog post not found";

fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::conflict(
            "A blog post with this slug already exists",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found(POST_NOT_FOUND),
        RepoError::InvalidInput { message } => {
            ApiError::bad_request("Invalid input", Some(message))
        }
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::internal("Persistence error", message),
    }
}

fn listing_to_api(err: ListingError) -> ApiError {
    match err {
        ListingError::NotFound => ApiError::not_found(POST_NOT_FOUND),
        ListingError::Repo(err) => repo_to_api(err),
    }
}

fn admin_post_to_api(err: AdminPostError) -> ApiError {
    match err {
        AdminPostError::ConstraintViolation { .. } => ApiError::bad_request(err.to_string(), None),
        AdminPostError::NotFound => ApiError::not_found(POST_NOT_FOUND),
        AdminPostError::Content(DomainError::Validation { field, message }) => {
            ApiError::bad_request(format!("{field} {message}"), None)
        }
        AdminPostError::Repo(err) => repo_to_api(err),
    }
}

fn upload_to_api(err: UploadError) -> ApiError {
    match err {
        UploadError::Rejected(reason) => ApiError::bad_request(reason.to_string(), None),
        UploadError::Storage(err) => ApiError::internal("Upload failed", err.to_string()),
    }
}
