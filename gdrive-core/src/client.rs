use reqwest::header::LOCATION;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::query::{QueryKind, name_query};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const FILE_FIELDS: &str = "id,name,mimeType,parents,createdTime";
const PAGE_SIZE: u32 = 100;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("upload session response is missing a Location header")]
    MissingUploadSession,
}

#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl DriveClient {
    pub fn new(token: impl Into<String>) -> Result<Self, DriveError> {
        Self::with_base_url(DEFAULT_BASE_URL, token)
    }

    pub fn with_base_url(base_url: &str, token: impl Into<String>) -> Result<Self, DriveError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            token: token.into(),
        })
    }

    /// Returns a client sharing this one's connection pool but sending `token`.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: token.into(),
        }
    }

    pub async fn list_files(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FileList, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("fields", &format!("nextPageToken,files({FILE_FIELDS})"));
            pairs.append_pair("pageSize", &PAGE_SIZE.to_string());
            pairs.append_pair("corpora", "allDrives");
            pairs.append_pair("includeItemsFromAllDrives", "true");
            pairs.append_pair("supportsAllDrives", "true");
            if let Some(page_token) = page_token {
                pairs.append_pair("pageToken", page_token);
            }
        }
        let response = self.http.get(url).bearer_auth(&self.token).send().await?;
        Self::handle_response(response).await
    }

    pub async fn list_files_all(&self, query: &str) -> Result<Vec<DriveFile>, DriveError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self.list_files(query, page_token.as_deref()).await?;
            items.extend(page.files);
            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        Ok(items)
    }

    pub async fn find_by_name(
        &self,
        name: &str,
        kind: QueryKind,
    ) -> Result<Vec<DriveFile>, DriveError> {
        self.list_files_all(&name_query(name, kind)).await
    }

    pub async fn create_folder(&self, name: &str, parent_id: &str) -> Result<DriveFile, DriveError> {
        let mut url = self.endpoint("/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("fields", FILE_FIELDS)
            .append_pair("supportsAllDrives", "true");
        let metadata = FileMetadata {
            name: name.to_string(),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: vec![parent_id.to_string()],
        };
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&metadata)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Opens a resumable session that creates a new object; returns the session URL.
    pub async fn start_create_upload(
        &self,
        metadata: &FileMetadata,
        content_length: u64,
    ) -> Result<Url, DriveError> {
        let mut url = self.endpoint("/upload/drive/v3/files")?;
        url.query_pairs_mut()
            .append_pair("uploadType", "resumable")
            .append_pair("fields", FILE_FIELDS)
            .append_pair("supportsAllDrives", "true");
        let request = self.http.post(url);
        self.open_upload_session(request, metadata, content_length)
            .await
    }

    /// Opens a resumable session that replaces the content of `file_id`.
    pub async fn start_update_upload(
        &self,
        file_id: &str,
        metadata: &FileMetadata,
        add_parent: Option<&str>,
        content_length: u64,
    ) -> Result<Url, DriveError> {
        let mut url = self.endpoint(&format!("/upload/drive/v3/files/{file_id}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("uploadType", "resumable");
            pairs.append_pair("fields", FILE_FIELDS);
            pairs.append_pair("supportsAllDrives", "true");
            if let Some(parent) = add_parent {
                pairs.append_pair("addParents", parent);
            }
        }
        let request = self.http.patch(url);
        self.open_upload_session(request, metadata, content_length)
            .await
    }

    async fn open_upload_session(
        &self,
        request: RequestBuilder,
        metadata: &FileMetadata,
        content_length: u64,
    ) -> Result<Url, DriveError> {
        let mut request = request
            .bearer_auth(&self.token)
            .header("X-Upload-Content-Length", content_length)
            .json(metadata);
        if let Some(mime_type) = metadata.mime_type.as_deref() {
            request = request.header("X-Upload-Content-Type", mime_type);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::Api { status, body });
        }
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(DriveError::MissingUploadSession)?;
        Ok(Url::parse(location)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DriveError> {
        Ok(self.base_url.join(path)?)
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DriveError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(DriveError::Api { status, body })
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub parents: Vec<String>,
    #[serde(default)]
    pub created_time: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Metadata body for create/update requests. Empty fields are omitted.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}
