//! Upload invariants: which images are accepted and how large they may be.

use folio_api_types::ALLOWED_IMAGE_TYPES;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed.")]
    UnsupportedType { content_type: String },
    #[error("File size too large. Maximum size is {}.", display_size(.limit))]
    TooLarge { size: u64, limit: u64 },
    #[error("No file uploaded")]
    Empty,
}

/// `5242880` reads as `5MB`; limits that are not whole megabytes or
/// kilobytes are given in bytes.
fn display_size(bytes: &u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    match *bytes {
        n if n >= MIB && n % MIB == 0 => format!("{}MB", n / MIB),
        n if n >= KIB && n % KIB == 0 => format!("{}KB", n / KIB),
        n => format!("{n} bytes"),
    }
}

/// Lower-cased essence of a MIME type, without parameters.
pub fn mime_essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_allowed_image_type(content_type: &str) -> bool {
    let essence = mime_essence(content_type);
    ALLOWED_IMAGE_TYPES.contains(&essence.as_str())
}

pub fn check_content_type(content_type: &str) -> Result<(), UploadRejection> {
    if is_allowed_image_type(content_type) {
        Ok(())
    } else {
        Err(UploadRejection::UnsupportedType {
            content_type: content_type.to_string(),
        })
    }
}

pub fn check_size(size: u64, limit: u64) -> Result<(), UploadRejection> {
    match size {
        0 => Err(UploadRejection::Empty),
        size if size > limit => Err(UploadRejection::TooLarge { size, limit }),
        _ => Ok(()),
    }
}
