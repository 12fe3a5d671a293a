use gdrive_core::DriveFile;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::store::FileUpload;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload session returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Streams file bodies into resumable upload sessions.
#[derive(Clone, Default)]
pub struct TransferClient {
    http: Client,
}

impl TransferClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sends the whole file in a single `PUT` and returns the resulting object.
    pub async fn upload(&self, session: Url, upload: FileUpload) -> Result<DriveFile, TransferError> {
        let FileUpload {
            file,
            len,
            mime_type,
            ..
        } = upload;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let mut request = self.http.put(session).header(CONTENT_LENGTH, len).body(body);
        if let Some(mime_type) = mime_type.as_deref() {
            request = request.header(CONTENT_TYPE, mime_type);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(TransferError::Rejected { status, body });
        }
        Ok(response.json::<DriveFile>().await?)
    }
}
