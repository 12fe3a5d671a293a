//! In-memory [`DriveStore`] used by unit tests. Records every call.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use gdrive_core::{DriveError, FOLDER_MIME_TYPE};
use reqwest::StatusCode;
use tokio::io::AsyncReadExt;

use crate::store::{DriveStore, FileUpload, RemoteFile, SearchKind, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Search { name: String, kind: SearchKind },
    CreateFolder { name: String, parent: String },
    CreateFile { name: String, parent: String },
    UpdateFile { id: String, name: String, add_parent: String },
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    objects: Vec<RemoteFile>,
    contents: HashMap<String, Vec<u8>>,
    calls: Vec<Call>,
    next_id: u32,
    fail_uploads: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: Vec<RemoteFile>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().objects = objects;
        store
    }

    pub fn failing_uploads() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().fail_uploads = true;
        store
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn object(&self, id: &str) -> Option<RemoteFile> {
        let state = self.state.lock().unwrap();
        state.objects.iter().find(|o| o.id == id).cloned()
    }

    pub fn objects_named(&self, name: &str) -> Vec<RemoteFile> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .iter()
            .filter(|o| o.name == name)
            .cloned()
            .collect()
    }

    pub fn content(&self, id: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().contents.get(id).cloned()
    }

    fn insert(&self, name: &str, mime_type: Option<String>, parent: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("id-{}", state.next_id);
        let created_time = format!("2024-06-01T00:00:{:02}.000Z", state.next_id % 60);
        state.objects.push(RemoteFile {
            id: id.clone(),
            name: name.to_string(),
            mime_type,
            parents: vec![parent.to_string()],
            created_time: Some(created_time),
        });
        id
    }
}

pub fn folder(id: &str, name: &str, parent: &str, created_time: &str) -> RemoteFile {
    RemoteFile {
        id: id.into(),
        name: name.into(),
        mime_type: Some(FOLDER_MIME_TYPE.into()),
        parents: vec![parent.into()],
        created_time: Some(created_time.into()),
    }
}

pub fn file(id: &str, name: &str, parents: &[&str]) -> RemoteFile {
    RemoteFile {
        id: id.into(),
        name: name.into(),
        mime_type: Some("application/octet-stream".into()),
        parents: parents.iter().map(|p| p.to_string()).collect(),
        created_time: None,
    }
}

fn injected_failure() -> StoreError {
    StoreError::Api(DriveError::Api {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "backend error".into(),
    })
}

async fn read_all(upload: &mut FileUpload) -> Vec<u8> {
    let mut bytes = Vec::new();
    upload.file.read_to_end(&mut bytes).await.unwrap();
    bytes
}

#[async_trait]
impl DriveStore for MemoryStore {
    async fn search_by_name(
        &self,
        name: &str,
        kind: SearchKind,
    ) -> Result<Vec<RemoteFile>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Search {
            name: name.to_string(),
            kind,
        });
        Ok(state
            .objects
            .iter()
            .filter(|o| o.name == name)
            .filter(|o| {
                kind == SearchKind::Any || o.mime_type.as_deref() == Some(FOLDER_MIME_TYPE)
            })
            .cloned()
            .collect())
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, StoreError> {
        self.state.lock().unwrap().calls.push(Call::CreateFolder {
            name: name.to_string(),
            parent: parent_id.to_string(),
        });
        Ok(self.insert(name, Some(FOLDER_MIME_TYPE.to_string()), parent_id))
    }

    async fn create_file(
        &self,
        mut upload: FileUpload,
        parent_id: &str,
    ) -> Result<String, StoreError> {
        let bytes = read_all(&mut upload).await;
        {
            let mut state = self.state.lock().unwrap();
            state.calls.push(Call::CreateFile {
                name: upload.name.clone(),
                parent: parent_id.to_string(),
            });
            if state.fail_uploads {
                return Err(injected_failure());
            }
        }
        let id = self.insert(&upload.name, upload.mime_type.clone(), parent_id);
        self.state.lock().unwrap().contents.insert(id.clone(), bytes);
        Ok(id)
    }

    async fn update_file(
        &self,
        file_id: &str,
        mut upload: FileUpload,
        add_parent_id: &str,
    ) -> Result<String, StoreError> {
        let bytes = read_all(&mut upload).await;
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateFile {
            id: file_id.to_string(),
            name: upload.name.clone(),
            add_parent: add_parent_id.to_string(),
        });
        if state.fail_uploads {
            return Err(injected_failure());
        }
        let object = state
            .objects
            .iter_mut()
            .find(|o| o.id == file_id)
            .ok_or_else(|| {
                StoreError::Api(DriveError::Api {
                    status: StatusCode::NOT_FOUND,
                    body: format!("file not found: {file_id}"),
                })
            })?;
        object.name = upload.name.clone();
        if upload.mime_type.is_some() {
            object.mime_type = upload.mime_type.clone();
        }
        if !object.contains_parent(add_parent_id) {
            object.parents.push(add_parent_id.to_string());
        }
        state.contents.insert(file_id.to_string(), bytes);
        Ok(file_id.to_string())
    }
}
