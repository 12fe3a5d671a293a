use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::store::{DriveStore, FileUpload, RemoteFile, SearchKind, StoreError};

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("creating directory {segment} failed: {source}")]
    Folder { segment: String, source: StoreError },
    #[error("unable to retrieve files named {name}: {source}")]
    Search { name: String, source: StoreError },
    #[error("unable to stat file {}: {source}", .path.display())]
    Stat { path: PathBuf, source: io::Error },
    #[error("opening file {} failed: {source}", .path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("uploading file {} failed: {source}", .path.display())]
    Upload { path: PathBuf, source: StoreError },
    #[error("could not discover target file name for {}", .0.display())]
    EmptyTargetName(PathBuf),
}

/// Where and how a single local file is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub name: String,
    pub folder_id: String,
    pub mime_type: Option<String>,
    pub overwrite: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created { id: String },
    Updated { id: String },
    SkippedDirectory,
}

pub struct UploadEngine<'a> {
    store: &'a dyn DriveStore,
}

impl<'a> UploadEngine<'a> {
    pub fn new(store: &'a dyn DriveStore) -> Self {
        Self { store }
    }

    /// Creates a new object, or with `overwrite` replaces the object with the
    /// same name already attached to the target folder.
    pub async fn upload_file(
        &self,
        local: &Path,
        target: &UploadTarget,
    ) -> Result<UploadOutcome, UploadError> {
        let metadata = tokio::fs::metadata(local)
            .await
            .map_err(|source| UploadError::Stat {
                path: local.to_path_buf(),
                source,
            })?;
        if metadata.is_dir() {
            info!(path = %local.display(), "path is a directory, skipping upload");
            return Ok(UploadOutcome::SkippedDirectory);
        }

        info!(name = %target.name, folder_id = %target.folder_id, "target file name");
        if !target.overwrite {
            return self.transfer(local, target, None).await;
        }

        match self.locate(&target.name, &target.folder_id).await? {
            Some(existing) => {
                info!(name = %existing.name, id = %existing.id, "overwriting file");
                self.transfer(local, target, Some(&existing.id)).await
            }
            None => {
                info!(name = %target.name, "no similar files found, creating a new file");
                self.transfer(local, target, None).await
            }
        }
    }

    /// Finds the first object named `name` whose parents contain `folder_id`.
    pub async fn locate(
        &self,
        name: &str,
        folder_id: &str,
    ) -> Result<Option<RemoteFile>, UploadError> {
        let files = self
            .store
            .search_by_name(name, SearchKind::Any)
            .await
            .map_err(|source| UploadError::Search {
                name: name.to_string(),
                source,
            })?;
        info!(count = files.len(), name, "files with matching name");

        let mut elsewhere: Option<String> = None;
        for file in files {
            if file.name != name {
                continue;
            }
            if file.contains_parent(folder_id) {
                debug!(id = %file.id, "file found in expected folder");
                return Ok(Some(file));
            }
            elsewhere.get_or_insert(file.id);
        }
        if let Some(id) = elsewhere {
            debug!(%id, folder_id, "file with same name exists outside the target folder");
        }
        Ok(None)
    }

    async fn transfer(
        &self,
        local: &Path,
        target: &UploadTarget,
        existing_id: Option<&str>,
    ) -> Result<UploadOutcome, UploadError> {
        let file = tokio::fs::File::open(local)
            .await
            .map_err(|source| UploadError::Open {
                path: local.to_path_buf(),
                source,
            })?;
        let len = file
            .metadata()
            .await
            .map_err(|source| UploadError::Stat {
                path: local.to_path_buf(),
                source,
            })?
            .len();
        let upload = FileUpload {
            name: target.name.clone(),
            mime_type: target.mime_type.clone(),
            file,
            len,
        };

        let result = match existing_id {
            Some(id) => self
                .store
                .update_file(id, upload, &target.folder_id)
                .await
                .map(|id| UploadOutcome::Updated { id }),
            None => self
                .store
                .create_file(upload, &target.folder_id)
                .await
                .map(|id| UploadOutcome::Created { id }),
        };
        let outcome = result.map_err(|source| UploadError::Upload {
            path: local.to_path_buf(),
            source,
        })?;
        debug!(?outcome, "uploaded/updated file");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::{Call, MemoryStore, file};
    use crate::store::MockDriveStore;
    use tempfile::tempdir;

    fn target(name: &str, folder_id: &str, overwrite: bool) -> UploadTarget {
        UploadTarget {
            name: name.into(),
            folder_id: folder_id.into(),
            mime_type: Some("text/plain".into()),
            overwrite,
        }
    }

    fn local_file(dir: &Path, name: &str, body: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn create_only_never_searches() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "report.txt", b"v2");

        let mut store = MockDriveStore::new();
        store.expect_search_by_name().never();
        store.expect_update_file().never();
        store
            .expect_create_file()
            .withf(|upload, parent| {
                upload.name == "report.txt" && upload.len == 2 && parent == "folder-1"
            })
            .times(1)
            .returning(|_, _| Ok("new-id".to_string()));

        let outcome = UploadEngine::new(&store)
            .upload_file(&local, &target("report.txt", "folder-1", false))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Created { id: "new-id".into() });
    }

    #[tokio::test]
    async fn create_only_duplicates_existing_name() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "report.txt", b"v2");
        let store = MemoryStore::with_objects(vec![file("old", "report.txt", &["folder-1"])]);

        UploadEngine::new(&store)
            .upload_file(&local, &target("report.txt", "folder-1", false))
            .await
            .unwrap();

        assert_eq!(store.objects_named("report.txt").len(), 2);
        assert!(
            !store
                .calls()
                .iter()
                .any(|c| matches!(c, Call::Search { .. }))
        );
    }

    #[tokio::test]
    async fn overwrite_without_any_match_creates() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "report.txt", b"v1");
        let store = MemoryStore::new();

        let outcome = UploadEngine::new(&store)
            .upload_file(&local, &target("report.txt", "folder-1", true))
            .await
            .unwrap();

        let UploadOutcome::Created { id } = outcome else {
            panic!("expected create, got {outcome:?}");
        };
        assert_eq!(
            store.calls(),
            vec![
                Call::Search {
                    name: "report.txt".into(),
                    kind: SearchKind::Any
                },
                Call::CreateFile {
                    name: "report.txt".into(),
                    parent: "folder-1".into()
                },
            ]
        );
        assert_eq!(store.content(&id).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn overwrite_ignores_same_name_in_other_folder() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "report.txt", b"v2");
        let store = MemoryStore::with_objects(vec![file("elsewhere", "report.txt", &["folder-9"])]);

        let outcome = UploadEngine::new(&store)
            .upload_file(&local, &target("report.txt", "folder-1", true))
            .await
            .unwrap();

        assert!(matches!(outcome, UploadOutcome::Created { .. }));
        assert_eq!(
            store.object("elsewhere").unwrap().parents,
            vec!["folder-9".to_string()]
        );
        assert_eq!(store.content("elsewhere"), None);
    }

    #[tokio::test]
    async fn overwrite_updates_match_and_keeps_other_parents() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "report.txt", b"fresh");
        let store = MemoryStore::with_objects(vec![
            file("elsewhere", "report.txt", &["folder-9"]),
            file("existing", "report.txt", &["folder-0", "folder-1"]),
        ]);

        let outcome = UploadEngine::new(&store)
            .upload_file(&local, &target("report.txt", "folder-1", true))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            UploadOutcome::Updated {
                id: "existing".into()
            }
        );
        let updated = store.object("existing").unwrap();
        assert_eq!(updated.parents, vec!["folder-0", "folder-1"]);
        assert_eq!(updated.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(store.content("existing").unwrap(), b"fresh");
        assert_eq!(store.objects_named("report.txt").len(), 2);
    }

    #[tokio::test]
    async fn update_passes_target_folder_as_added_parent() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "a.bin", b"1");

        let mut store = MockDriveStore::new();
        store
            .expect_search_by_name()
            .returning(|_, _| Ok(vec![file("match", "a.bin", &["folder-1"])]));
        store.expect_create_file().never();
        store
            .expect_update_file()
            .withf(|id, upload, parent| id == "match" && upload.name == "a.bin" && parent == "folder-1")
            .times(1)
            .returning(|id, _, _| Ok(id.to_string()));

        let outcome = UploadEngine::new(&store)
            .upload_file(&local, &target("a.bin", "folder-1", true))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::Updated { id: "match".into() });
    }

    #[tokio::test]
    async fn locate_returns_first_match_in_folder() {
        let store = MemoryStore::with_objects(vec![
            file("first", "a.txt", &["folder-1"]),
            file("second", "a.txt", &["folder-1"]),
        ]);

        let found = UploadEngine::new(&store)
            .locate("a.txt", "folder-1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, "first");
    }

    #[tokio::test]
    async fn directories_are_skipped_without_remote_calls() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let store = MemoryStore::new();

        let outcome = UploadEngine::new(&store)
            .upload_file(&nested, &target("nested", "folder-1", true))
            .await
            .unwrap();

        assert_eq!(outcome, UploadOutcome::SkippedDirectory);
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_local_file_is_fatal() {
        let dir = tempdir().unwrap();
        let store = MemoryStore::new();

        let err = UploadEngine::new(&store)
            .upload_file(&dir.path().join("gone.txt"), &target("gone.txt", "f", false))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Stat { .. }));
    }

    #[tokio::test]
    async fn store_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let local = local_file(dir.path(), "a.txt", b"x");
        let store = MemoryStore::failing_uploads();

        let err = UploadEngine::new(&store)
            .upload_file(&local, &target("a.txt", "folder-1", false))
            .await
            .unwrap_err();

        assert!(matches!(err, UploadError::Upload { .. }));
    }
}
