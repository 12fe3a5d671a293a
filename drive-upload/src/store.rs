use async_trait::async_trait;
use gdrive_core::{AuthError, DriveError, DriveFile};
use thiserror::Error;

use crate::transfer::TransferError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("drive api error: {0}")]
    Api(#[from] DriveError),
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Any,
    Folder,
}

/// Metadata of an object in the remote store as returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
    pub parents: Vec<String>,
    pub created_time: Option<String>,
}

impl RemoteFile {
    pub fn contains_parent(&self, folder_id: &str) -> bool {
        self.parents.iter().any(|parent| parent == folder_id)
    }
}

impl From<DriveFile> for RemoteFile {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            parents: file.parents,
            created_time: file.created_time,
        }
    }
}

/// An opened local file ready to be streamed. The handle is dropped by the
/// store call that consumes it.
#[derive(Debug)]
pub struct FileUpload {
    pub name: String,
    pub mime_type: Option<String>,
    pub file: tokio::fs::File,
    pub len: u64,
}

/// The remote operations the upload logic needs. Containment filtering by
/// parent happens in memory on top of `search_by_name`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DriveStore: Send + Sync {
    async fn search_by_name(
        &self,
        name: &str,
        kind: SearchKind,
    ) -> Result<Vec<RemoteFile>, StoreError>;

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError>;

    async fn create_file(&self, upload: FileUpload, parent_id: &str)
    -> Result<String, StoreError>;

    async fn update_file(
        &self,
        file_id: &str,
        upload: FileUpload,
        add_parent_id: &str,
    ) -> Result<String, StoreError>;
}
