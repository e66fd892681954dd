//! Image uploads with the same checks the server applies, run before any
//! bytes leave the machine.

#![deny(clippy::all, clippy::pedantic)]

use std::path::Path;

use folio_api_types::{ALLOWED_IMAGE_TYPES, MAX_IMAGE_BYTES, UploadResponse};
use reqwest::multipart::{Form, Part};

use crate::client::{CliError, Ctx};

/// Where an uploaded image lands in the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Featured,
    Gallery,
}

pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn validate_image(content_type: &str, size: u64) -> Result<(), CliError> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(CliError::InvalidInput(
            "Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.".into(),
        ));
    }
    if size > MAX_IMAGE_BYTES {
        return Err(CliError::InvalidInput(
            "File size too large. Maximum size is 5MB.".into(),
        ));
    }
    Ok(())
}

pub async fn upload_image(ctx: &Ctx, file: &Path) -> Result<UploadResponse, CliError> {
    ctx.require_admin()?;
    let input_error = |source| CliError::InputFile {
        path: file.display().to_string(),
        source,
    };

    let content_type = content_type_for(file);
    let size = tokio::fs::metadata(file).await.map_err(input_error)?.len();
    validate_image(&content_type, size)?;

    let data = tokio::fs::read(file).await.map_err(input_error)?;
    let name = file
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("upload.bin")
        .to_string();
    let part = Part::bytes(data)
        .file_name(name)
        .mime_str(&content_type)?;
    let form = Form::new().part("file", part);
    ctx.send_multipart("api/upload", form).await
}
