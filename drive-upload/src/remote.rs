use async_trait::async_trait;
use gdrive_core::{DriveClient, FileMetadata, QueryKind};
use tokio::sync::Mutex;

use crate::store::{DriveStore, FileUpload, RemoteFile, SearchKind, StoreError};
use crate::token_provider::TokenProvider;
use crate::transfer::TransferClient;

/// [`DriveStore`] backed by the Drive v3 REST API.
pub struct DriveRemote {
    client: DriveClient,
    transfer: TransferClient,
    tokens: Mutex<TokenProvider>,
}

impl DriveRemote {
    pub fn new(client: DriveClient, tokens: TokenProvider) -> Self {
        Self {
            client,
            transfer: TransferClient::new(),
            tokens: Mutex::new(tokens),
        }
    }

    /// Fails early when the credentials cannot be exchanged for a token.
    pub async fn authenticate(&self) -> Result<(), StoreError> {
        self.client().await.map(|_| ())
    }

    async fn client(&self) -> Result<DriveClient, StoreError> {
        let token = self.tokens.lock().await.valid_access_token().await?;
        Ok(self.client.with_token(token))
    }
}

#[async_trait]
impl DriveStore for DriveRemote {
    async fn search_by_name(
        &self,
        name: &str,
        kind: SearchKind,
    ) -> Result<Vec<RemoteFile>, StoreError> {
        let kind = match kind {
            SearchKind::Any => QueryKind::Any,
            SearchKind::Folder => QueryKind::Folder,
        };
        let files = self.client().await?.find_by_name(name, kind).await?;
        Ok(files.into_iter().map(RemoteFile::from).collect())
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError> {
        let folder = self.client().await?.create_folder(name, parent_id).await?;
        Ok(folder.id)
    }

    async fn create_file(
        &self,
        upload: FileUpload,
        parent_id: &str,
    ) -> Result<String, StoreError> {
        let metadata = FileMetadata {
            name: upload.name.clone(),
            mime_type: upload.mime_type.clone(),
            parents: vec![parent_id.to_string()],
        };
        let session = self
            .client()
            .await?
            .start_create_upload(&metadata, upload.len)
            .await?;
        let file = self.transfer.upload(session, upload).await?;
        Ok(file.id)
    }

    async fn update_file(
        &self,
        file_id: &str,
        upload: FileUpload,
        add_parent_id: &str,
    ) -> Result<String, StoreError> {
        let metadata = FileMetadata {
            name: upload.name.clone(),
            mime_type: upload.mime_type.clone(),
            parents: Vec::new(),
        };
        let session = self
            .client()
            .await?
            .start_update_upload(file_id, &metadata, Some(add_parent_id), upload.len)
            .await?;
        let file = self.transfer.upload(session, upload).await?;
        Ok(file.id)
    }
}
