//! Image upload acceptance: validation, storage and public URL assignment.

use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use metrics::counter;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::uploads::{UploadRejection, check_content_type, check_size, mime_essence};
use crate::infra::uploads::{StoredUpload, UploadStorage, UploadStorageError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Rejected(#[from] UploadRejection),
    #[error(transparent)]
    Storage(UploadStorageError),
}

impl From<UploadStorageError> for UploadError {
    fn from(err: UploadStorageError) -> Self {
        match err {
            UploadStorageError::PayloadTooLarge { limit } => {
                UploadError::Rejected(UploadRejection::TooLarge {
                    size: limit.saturating_add(1),
                    limit,
                })
            }
            UploadStorageError::EmptyPayload => UploadError::Rejected(UploadRejection::Empty),
            other => UploadError::Storage(other),
        }
    }
}

/// An accepted image and where it is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedImage {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub content_type: String,
    pub checksum: String,
}

#[derive(Clone)]
pub struct UploadService {
    storage: Arc<UploadStorage>,
    max_file_bytes: u64,
    public_prefix: String,
}

impl UploadService {
    pub fn new(storage: Arc<UploadStorage>, max_file_bytes: u64, public_prefix: &str) -> Self {
        Self {
            storage,
            max_file_bytes,
            public_prefix: public_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_bytes
    }

    /// Validate and store an image arriving as a byte stream.
    ///
    /// `declared_size`, when the caller knows it up front, is checked before
    /// anything touches the disk; the stream itself is capped regardless.
    pub async fn accept_image<S>(
        &self,
        original_name: &str,
        content_type: &str,
        declared_size: Option<u64>,
        stream: S,
    ) -> Result<AcceptedImage, UploadError>
    where
        S: Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let result = self
            .store_checked(original_name, content_type, declared_size, stream)
            .await;

        match &result {
            Ok(image) => {
                counter!("folio_uploads_stored_total").increment(1);
                info!(
                    target = "folio::uploads",
                    url = %image.url,
                    size = image.size,
                    content_type = %image.content_type,
                    "image stored"
                );
            }
            Err(UploadError::Rejected(reason)) => {
                counter!("folio_uploads_rejected_total").increment(1);
                warn!(
                    target = "folio::uploads",
                    filename = original_name,
                    content_type,
                    reason = %reason,
                    "image rejected"
                );
            }
            Err(UploadError::Storage(_)) => {}
        }

        result
    }

    async fn store_checked<S>(
        &self,
        original_name: &str,
        content_type: &str,
        declared_size: Option<u64>,
        stream: S,
    ) -> Result<AcceptedImage, UploadError>
    where
        S: Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        check_content_type(content_type)?;
        if let Some(size) = declared_size {
            check_size(size, self.max_file_bytes)?;
        }

        let essence = mime_essence(content_type);
        let stored = self
            .storage
            .store_stream(original_name, &essence, self.max_file_bytes, stream)
            .await?;

        Ok(self.accepted(stored, essence))
    }

    fn accepted(&self, stored: StoredUpload, content_type: String) -> AcceptedImage {
        AcceptedImage {
            url: format!("{}/{}", self.public_prefix, stored.stored_path),
            filename: stored.file_name().to_string(),
            size: stored.size_bytes,
            content_type,
            checksum: stored.checksum,
        }
    }
}
