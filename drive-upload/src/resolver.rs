use std::cmp::Ordering;

use tracing::{info, warn};

use crate::engine::UploadError;
use crate::store::{DriveStore, RemoteFile, SearchKind};

/// Finds or creates remote folders one path segment at a time.
pub struct DirectoryResolver<'a> {
    store: &'a dyn DriveStore,
}

impl<'a> DirectoryResolver<'a> {
    pub fn new(store: &'a dyn DriveStore) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, parent_id: &str, segment: &str) -> Result<String, UploadError> {
        let folder_error = |source| UploadError::Folder {
            segment: segment.to_string(),
            source,
        };

        info!(folder = segment, "checking for existing folder");
        let candidates = self
            .store
            .search_by_name(segment, SearchKind::Folder)
            .await
            .map_err(folder_error)?;

        if let Some(existing) = oldest_in_parent(candidates, segment, parent_id) {
            info!(folder = segment, id = %existing.id, "found existing folder");
            return Ok(existing.id);
        }

        info!(folder = segment, parent_id, "creating folder");
        self.store
            .create_folder(segment, parent_id)
            .await
            .map_err(folder_error)
    }

    /// Resolves `segments` in order, each one inside the previous result.
    pub async fn resolve_chain<S: AsRef<str>>(
        &self,
        root_id: &str,
        segments: &[S],
    ) -> Result<String, UploadError> {
        let mut folder_id = root_id.to_string();
        for segment in segments {
            folder_id = self.resolve(&folder_id, segment.as_ref()).await?;
        }
        Ok(folder_id)
    }
}

/// Duplicates under one parent resolve to the oldest folder, then the lowest id.
fn oldest_in_parent(
    candidates: Vec<RemoteFile>,
    segment: &str,
    parent_id: &str,
) -> Option<RemoteFile> {
    let matches: Vec<RemoteFile> = candidates
        .into_iter()
        .filter(|folder| folder.name == segment && folder.contains_parent(parent_id))
        .collect();
    if matches.len() > 1 {
        warn!(
            folder = segment,
            count = matches.len(),
            "multiple folders share this name, using the oldest"
        );
    }
    matches.into_iter().min_by(by_age)
}

fn by_age(a: &RemoteFile, b: &RemoteFile) -> Ordering {
    let created = match (&a.created_time, &b.created_time) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    created.then_with(|| a.id.cmp(&b.id))
}
