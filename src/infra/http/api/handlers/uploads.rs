use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use folio_api_types::UploadResponse;
use futures::TryStreamExt;

use crate::application::uploads::UploadError;
use crate::domain::uploads::UploadRejection;
use crate::infra::uploads::UploadStorageError;

use super::super::error::ApiError;
use super::super::state::ApiState;
use super::upload_to_api;

const FILE_FIELD: &str = "file";

/// `POST /api/upload`: stores the multipart field `file`.
pub async fn upload_image(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.uploads.max_file_bytes();

    while let Some(field) = multipart.next_field().await.map_err(|err| {
        ApiError::bad_request("Invalid multipart payload", Some(err.body_text()))
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| {
                mime_guess::from_path(&filename)
                    .first_or_octet_stream()
                    .to_string()
            });

        let body = field.map_err(move |err| {
            if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
                UploadStorageError::PayloadTooLarge { limit }
            } else {
                UploadStorageError::stream(err.body_text())
            }
        });

        let image = state
            .uploads
            .accept_image(&filename, &content_type, None, body)
            .await
            .map_err(upload_to_api)?;

        let response = UploadResponse {
            url: image.url,
            filename: image.filename,
            size: image.size,
            content_type: image.content_type,
        };
        return Ok((StatusCode::CREATED, Json(response)));
    }

    Err(upload_to_api(UploadError::Rejected(UploadRejection::Empty)))
}
