//! Filesystem storage for uploaded images.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use sha2::{Digest, Sha256};
use slug::slugify;
use thiserror::Error;
use tokio::{
    fs,
    io::{AsyncWrite, AsyncWriteExt},
};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum UploadStorageError {
    #[error("invalid stored path")]
    InvalidPath,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("uploaded file exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: u64 },
    #[error("uploaded file stream failed: {message}")]
    PayloadStream { message: String },
    #[error("uploaded file is empty")]
    EmptyPayload,
}

impl UploadStorageError {
    pub fn stream(err: impl std::fmt::Display) -> Self {
        Self::PayloadStream {
            message: err.to_string(),
        }
    }
}

/// What was written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    /// Path relative to the storage root, `YYYY/MM/DD/<uuid>-<name>.<ext>`.
    pub stored_path: String,
    pub checksum: String,
    pub size_bytes: u64,
}

impl StoredUpload {
    pub fn file_name(&self) -> &str {
        self.stored_path
            .rsplit('/')
            .next()
            .unwrap_or(self.stored_path.as_str())
    }
}

#[derive(Debug)]
pub struct UploadStorage {
    root: PathBuf,
}

impl UploadStorage {
    /// Storage rooted at `root`, created if missing.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Stream a payload to disk, aborting once it grows past `max_bytes`.
    ///
    /// Partially written files are removed on every failure path.
    pub async fn store_stream<S>(
        &self,
        original_name: &str,
        content_type: &str,
        max_bytes: u64,
        stream: S,
    ) -> Result<StoredUpload, UploadStorageError>
    where
        S: Stream<Item = Result<Bytes, UploadStorageError>>,
    {
        let stored_path = build_stored_path(original_name, content_type);
        let absolute = self.resolve(&stored_path)?;

        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        let written = write_payload(&mut file, stream, max_bytes).await;
        drop(file);

        match written {
            Ok((size_bytes, checksum)) => Ok(StoredUpload {
                stored_path,
                checksum,
                size_bytes,
            }),
            Err(err) => {
                let _ = fs::remove_file(&absolute).await;
                Err(err)
            }
        }
    }

    pub async fn read(&self, stored_path: &str) -> Result<Bytes, UploadStorageError> {
        let absolute = self.resolve(stored_path)?;
        let data = fs::read(absolute).await?;
        Ok(Bytes::from(data))
    }

    fn resolve(&self, stored_path: &str) -> Result<PathBuf, UploadStorageError> {
        let relative = Path::new(stored_path);
        if stored_path.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|component| matches!(component, Component::ParentDir | Component::Prefix(_)))
        {
            return Err(UploadStorageError::InvalidPath);
        }

        Ok(self.root.join(relative))
    }
}

/// Copy `stream` into `sink`, returning the byte count and sha256 hex digest.
async fn write_payload<W, S>(
    sink: &mut W,
    stream: S,
    max_bytes: u64,
) -> Result<(u64, String), UploadStorageError>
where
    W: AsyncWrite + Unpin,
    S: Stream<Item = Result<Bytes, UploadStorageError>>,
{
    let mut hasher = Sha256::new();
    let mut total_bytes: u64 = 0;

    pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        total_bytes = total_bytes.saturating_add(chunk.len() as u64);
        if total_bytes > max_bytes {
            return Err(UploadStorageError::PayloadTooLarge { limit: max_bytes });
        }

        sink.write_all(&chunk).await?;
        hasher.update(&chunk);
    }

    sink.flush().await?;

    if total_bytes == 0 {
        return Err(UploadStorageError::EmptyPayload);
    }

    Ok((total_bytes, hex::encode(hasher.finalize())))
}

fn build_stored_path(original_name: &str, content_type: &str) -> String {
    let (year, month, day) = time::OffsetDateTime::now_utc().to_calendar_date();
    let directory = format!("{year}/{:02}/{:02}", month as u8, day);
    let identifier = Uuid::new_v4();
    let filename = sanitize_filename(original_name, content_type);
    format!("{directory}/{identifier}-{filename}")
}

/// Slugified stem plus a lower-case extension, taken from the original name
/// or, failing that, from the MIME type.
fn sanitize_filename(original: &str, content_type: &str) -> String {
    let path = Path::new(original);
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("upload");
    let mut base = slugify(stem);
    if base.is_empty() {
        base = "upload".to_string();
    }

    let extension = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.trim_matches('.').to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .or_else(|| extension_for(content_type));

    match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base,
    }
}

fn extension_for(content_type: &str) -> Option<String> {
    let essence = crate::domain::uploads::mime_essence(content_type);
    let ext = match essence.as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        other => mime_guess::get_mime_extensions_str(other)?.first().copied()?,
    };
    Some(ext.to_string())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::stream;

    use super::*;

    /// Sink that refuses every write, like a full disk.
    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &[u8],
        ) -> Poll<io::Result<usize>> {
            Poll::Ready(Err(io::Error::other("no space left on device")))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    #[test]
    fn sanitize_filename_slugifies_stem_and_keeps_extension() {
        assert_eq!(
            sanitize_filename("My Holiday Photo.JPG", "image/jpeg"),
            "my-holiday-photo.jpg"
        );
        assert_eq!(sanitize_filename("???.png", "image/png"), "upload.png");
    }

    #[test]
    fn sanitize_filename_falls_back_to_mime_extension() {
        let name = sanitize_filename("screenshot", "image/png");
        assert_eq!(name, "screenshot.png");
    }

    #[tokio::test]
    async fn store_then_read_round_trip_and_checksum() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let body = stream::iter(vec![
            Ok(Bytes::from_static(b"png-")),
            Ok(Bytes::from_static(b"bytes")),
        ]);
        let stored = storage
            .store_stream("cover.png", "image/png", 1024, body)
            .await
            .expect("stored");

        assert!(stored.stored_path.ends_with("-cover.png"));
        assert_eq!(stored.size_bytes, 9);
        assert_eq!(stored.checksum.len(), 64);
        let read = storage.read(&stored.stored_path).await.expect("read");
        assert_eq!(read.as_ref(), b"png-bytes");
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_and_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let chunks = vec![
            Ok(Bytes::from_static(b"12345")),
            Ok(Bytes::from_static(b"67890")),
        ];
        let err = storage
            .store_stream("big.gif", "image/gif", 8, stream::iter(chunks))
            .await
            .expect_err("too large");
        assert!(matches!(
            err,
            UploadStorageError::PayloadTooLarge { limit: 8 }
        ));

        let leftovers = walk(dir.path());
        assert!(leftovers.is_empty(), "partial file left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn write_failures_surface_as_io_errors() {
        let body = stream::iter(vec![Ok(Bytes::from_static(b"png-bytes"))]);
        let err = write_payload(&mut FullDisk, body, 1024)
            .await
            .expect_err("write fails");
        assert!(matches!(err, UploadStorageError::Io(_)));
    }

    #[tokio::test]
    async fn failed_stream_leaves_no_partial_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        let chunks = vec![
            Ok(Bytes::from_static(b"first")),
            Err(UploadStorageError::stream("connection reset")),
        ];
        let err = storage
            .store_stream("cut.webp", "image/webp", 1024, stream::iter(chunks))
            .await
            .expect_err("stream fails");
        assert!(matches!(err, UploadStorageError::PayloadStream { .. }));

        let leftovers = walk(dir.path());
        assert!(leftovers.is_empty(), "partial file left behind: {leftovers:?}");
    }

    #[tokio::test]
    async fn traversal_paths_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = UploadStorage::new(dir.path().to_path_buf()).expect("storage");

        assert!(matches!(
            storage.read("../etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
        assert!(matches!(
            storage.read("/etc/passwd").await,
            Err(UploadStorageError::InvalidPath)
        ));
    }

    fn walk(root: &Path) -> Vec<PathBuf> {
        let mut out = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir).expect("read_dir").flatten() {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                } else {
                    out.push(path);
                }
            }
        }
        out
    }
}
